// Copyright 2025 The Shelf Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Response types, content negotiation, and record presentation.
//!
//! Read endpoints honor the `Accept` header: `application/json` (also the
//! default) renders records as JSON, `text/plain` renders the schema's text
//! line format, and any unrecognized value is rejected with 406 and an empty
//! body.
//!
//! Presentation is also where internal record keys stop: the stored
//! attachment filename is replaced by a `photo_url` link for schemas that
//! carry attachments.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{extract::FromRequestParts, http::request::Parts};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use super::error::ApiError;
use crate::schema::{Record, Schema, ATTACHMENT_FIELD};

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status of the server
    pub status: String,
    /// Current server timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// One entry in the collection listing
#[derive(Serialize, ToSchema)]
pub struct CollectionListItem {
    /// Collection name as it appears in request paths
    pub name: String,
    /// Singular entity noun
    pub entity: String,
    /// Number of records currently held
    pub count: usize,
}

/// Representation chosen by the `Accept` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptFormat {
    Json,
    Text,
}

impl AcceptFormat {
    /// Pick a representation from an `Accept` header value, or `None` when
    /// nothing offered is supported.
    pub fn negotiate(value: &str) -> Option<Self> {
        for offer in value.split(',') {
            let mime = offer.split(';').next().unwrap_or_default().trim();
            match mime {
                "" | "*/*" | "application/*" | "application/json" => {
                    return Some(AcceptFormat::Json)
                }
                "text/*" | "text/plain" => return Some(AcceptFormat::Text),
                _ => {}
            }
        }
        None
    }
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AcceptFormat {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = match parts.headers.get(header::ACCEPT) {
            None => return Ok(AcceptFormat::Json),
            Some(value) => value,
        };
        let value = header.to_str().map_err(|_| ApiError::NotAcceptable)?;
        Self::negotiate(value).ok_or(ApiError::NotAcceptable)
    }
}

/// Project a stored record into its wire shape.
///
/// For attachment-carrying schemas the stored filename is withheld and a
/// `photo_url` is offered instead (null when no photo has been uploaded).
pub fn present(schema: &Schema, collection: &str, record: &Record) -> Record {
    let mut presented = record.clone();
    if schema.attachments {
        let stored = presented.remove(ATTACHMENT_FIELD);
        let url = match (stored, record.get("id")) {
            (Some(Value::String(_)), Some(id)) => {
                Value::String(format!("/api/{collection}/{}/photo", id_segment(id)))
            }
            _ => Value::Null,
        };
        presented.insert("photo_url".to_string(), url);
    }
    presented
}

fn id_segment(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render a single record in the negotiated representation.
pub fn one_record(
    format: AcceptFormat,
    schema: &Schema,
    collection: &str,
    record: &Record,
    status: StatusCode,
) -> Response {
    match format {
        AcceptFormat::Json => {
            let body = Value::Object(present(schema, collection, record));
            (status, axum::Json(body)).into_response()
        }
        AcceptFormat::Text => (
            status,
            [(header::CONTENT_TYPE, "text/plain")],
            schema.render_text(record),
        )
            .into_response(),
    }
}

/// Render a record sequence in the negotiated representation.
pub fn many_records(
    format: AcceptFormat,
    schema: &Schema,
    collection: &str,
    records: &[Record],
) -> Response {
    match format {
        AcceptFormat::Json => {
            let body = Value::Array(
                records
                    .iter()
                    .map(|r| Value::Object(present(schema, collection, r)))
                    .collect(),
            );
            axum::Json(body).into_response()
        }
        AcceptFormat::Text => {
            let body = records
                .iter()
                .map(|r| schema.render_text(r))
                .collect::<Vec<_>>()
                .join("\n");
            ([(header::CONTENT_TYPE, "text/plain")], body).into_response()
        }
    }
}
