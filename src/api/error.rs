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

//! API error taxonomy and the wire error body.
//!
//! Every failure is classified at the request boundary and rendered as
//! `{ message, timestamp, code }`, where `code` repeats the HTTP status.
//! The one exception is 406, which carries an empty body. None of these are
//! retried and none are fatal to the process.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::collection::CollectionError;
use crate::uploads::UploadError;

/// Wire shape of an error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Human-readable error message
    pub message: String,
    /// Server time the error was produced, RFC 3339 UTC
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// HTTP status code, repeated for clients that drop the status line
    pub code: u16,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>, code: StatusCode) -> Self {
        Self {
            message: message.into(),
            timestamp: chrono::Utc::now(),
            code: code.as_u16(),
        }
    }
}

/// Request-boundary error classification.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or incomplete input (400).
    #[error("{0}")]
    Validation(String),

    /// Missing or invalid credential (401).
    #[error("{0}")]
    Auth(String),

    /// Unresolvable collection, record, or attachment (404).
    #[error("{0}")]
    NotFound(String),

    /// Unrecognized `Accept` value (406, empty body).
    #[error("requested representation is not available")]
    NotAcceptable,

    /// Uniqueness violation (409).
    #[error("{0}")]
    Conflict(String),

    /// Client exceeded the request budget (429).
    #[error("{0}")]
    RateLimited(String),

    /// Backing store failure (500), distinct from programming errors.
    #[error("{0}")]
    StoreUnavailable(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::StoreUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            // 406 is defined to have an empty body
            ApiError::NotAcceptable => status.into_response(),
            other => (status, Json(ErrorBody::new(other.to_string(), status))).into_response(),
        }
    }
}

impl From<CollectionError> for ApiError {
    fn from(err: CollectionError) -> Self {
        match err {
            CollectionError::Validation(message) => ApiError::Validation(message),
            CollectionError::Conflict { .. } => ApiError::Conflict(err.to_string()),
            CollectionError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            CollectionError::Store(e) => ApiError::StoreUnavailable(e.to_string()),
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::DisallowedType | UploadError::TooLarge => {
                ApiError::Validation(err.to_string())
            }
            UploadError::Io(e) => ApiError::StoreUnavailable(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;

    #[test]
    fn status_mapping_covers_the_taxonomy() {
        assert_eq!(
            ApiError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::Auth("x".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::NotAcceptable.status(), StatusCode::NOT_ACCEPTABLE);
        assert_eq!(ApiError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::RateLimited("x".into()).status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::StoreUnavailable("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn error_body_repeats_the_status_code() {
        let body = ErrorBody::new("missing fields: name", StatusCode::BAD_REQUEST);
        assert_eq!(body.code, 400);
        assert_eq!(body.message, "missing fields: name");
    }

    #[test]
    fn error_body_serializes_all_three_fields() {
        let body = ErrorBody::new("boom", StatusCode::CONFLICT);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["message"], "boom");
        assert_eq!(json["code"], 409);
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn collection_errors_translate_with_their_messages() {
        let conflict: ApiError = CollectionError::Conflict {
            field: "email".into(),
            value: "vinod@vinod.co".into(),
        }
        .into();
        assert_eq!(conflict.status(), StatusCode::CONFLICT);
        assert_eq!(
            conflict.to_string(),
            "email already exists - vinod@vinod.co"
        );

        let not_found: ApiError = CollectionError::NotFound {
            entity: "customer",
            id: "missing".into(),
        }
        .into();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let store: ApiError = CollectionError::Store(StoreError::Corrupt("bad".into())).into();
        assert_eq!(store.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
