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

//! Request handlers with OpenAPI documentation.
//!
//! One handler per (method, path) pair in the route table. Handlers stay
//! thin: argument parsing and representation choice happen here, the
//! validate-mutate-persist cycle lives in the collection manager.

use std::sync::Arc;

use axum::extract::{Extension, Multipart, Path, Query};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use super::error::{ApiError, ErrorBody};
use super::responses::{self, AcceptFormat, CollectionListItem, HealthResponse};
use crate::collection::CollectionManager;
use crate::registry::CollectionRegistry;
use crate::schema::Record;
use crate::uploads::AttachmentStore;

/// Pagination arguments, taken raw so that non-integer values produce the
/// documented validation error instead of a bare rejection.
#[derive(Debug, Default, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<String>,
    pub size: Option<String>,
}

const DEFAULT_PAGE_SIZE: usize = 10;

fn parse_pagination(query: &PaginationQuery) -> Result<(usize, usize), ApiError> {
    let parse = |raw: &Option<String>, default: i64| -> Result<i64, ApiError> {
        match raw {
            None => Ok(default),
            Some(s) => s
                .parse::<i64>()
                .map_err(|_| ApiError::Validation("page/size must be integers".to_string())),
        }
    };

    let page = parse(&query.page, 1)?;
    let size = parse(&query.size, DEFAULT_PAGE_SIZE as i64)?;
    if page < 1 || size < 1 {
        return Err(ApiError::Validation(
            "page/size must be more than 0".to_string(),
        ));
    }
    Ok((page as usize, size as usize))
}

fn lookup(
    registry: &CollectionRegistry,
    collection: &str,
) -> Result<Arc<CollectionManager>, ApiError> {
    registry
        .get(collection)
        .ok_or_else(|| ApiError::NotFound(format!("collection '{collection}' not found")))
}

fn require_object(body: Value) -> Result<Record, ApiError> {
    body.as_object()
        .cloned()
        .ok_or_else(|| ApiError::Validation("request body must be a JSON object".to_string()))
}

/// Check server health
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Server is healthy", body = HealthResponse),
    ),
    tag = "Health"
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// List the collections this server manages
#[utoipa::path(
    get,
    path = "/api/collections",
    responses(
        (status = 200, description = "Collection names and record counts", body = [CollectionListItem]),
    ),
    tag = "Collections"
)]
pub async fn list_collections(
    Extension(registry): Extension<CollectionRegistry>,
) -> Json<Vec<CollectionListItem>> {
    let mut items = Vec::new();
    for (name, manager) in registry.list() {
        items.push(CollectionListItem {
            name,
            entity: manager.schema().entity.to_string(),
            count: manager.count().await,
        });
    }
    Json(items)
}

/// List records, paginated
///
/// Returns the requested page slice in collection order. Out-of-range pages
/// return an empty sequence, not an error.
#[utoipa::path(
    get,
    path = "/api/{collection}",
    params(
        ("collection" = String, Path, description = "Collection name"),
        ("page" = Option<u64>, Query, description = "Page number, 1-based (default 1)"),
        ("size" = Option<u64>, Query, description = "Page size (default 10)")
    ),
    responses(
        (status = 200, description = "One page of records"),
        (status = 400, description = "Invalid pagination arguments", body = ErrorBody),
        (status = 404, description = "Unknown collection", body = ErrorBody),
        (status = 406, description = "Unsupported Accept value"),
    ),
    tag = "Records"
)]
pub async fn list_records(
    Extension(registry): Extension<CollectionRegistry>,
    Path(collection): Path<String>,
    Query(query): Query<PaginationQuery>,
    format: AcceptFormat,
) -> Result<Response, ApiError> {
    let manager = lookup(&registry, &collection)?;
    let (page, size) = parse_pagination(&query)?;
    let records = manager.list(page, size).await;
    Ok(responses::many_records(
        format,
        manager.schema(),
        &collection,
        &records,
    ))
}

/// Get one record by id
#[utoipa::path(
    get,
    path = "/api/{collection}/{id}",
    params(
        ("collection" = String, Path, description = "Collection name"),
        ("id" = String, Path, description = "Record id")
    ),
    responses(
        (status = 200, description = "Record found"),
        (status = 404, description = "Record or collection not found", body = ErrorBody),
        (status = 406, description = "Unsupported Accept value"),
    ),
    tag = "Records"
)]
pub async fn get_record(
    Extension(registry): Extension<CollectionRegistry>,
    Path((collection, id)): Path<(String, String)>,
    format: AcceptFormat,
) -> Result<Response, ApiError> {
    let manager = lookup(&registry, &collection)?;
    let record = manager.get(&id).await?;
    Ok(responses::one_record(
        format,
        manager.schema(),
        &collection,
        &record,
        StatusCode::OK,
    ))
}

/// Create a record
///
/// The body is validated (required fields, declared formats, unique fields)
/// and projected onto the schema's whitelist; client-supplied `id` values are
/// dropped and a fresh identity is assigned.
#[utoipa::path(
    post,
    path = "/api/{collection}",
    params(
        ("collection" = String, Path, description = "Collection name")
    ),
    responses(
        (status = 201, description = "Record created, returned with its assigned id"),
        (status = 400, description = "Validation failure", body = ErrorBody),
        (status = 404, description = "Unknown collection", body = ErrorBody),
        (status = 409, description = "Unique-field duplicate", body = ErrorBody),
    ),
    tag = "Records"
)]
pub async fn create_record(
    Extension(registry): Extension<CollectionRegistry>,
    Path(collection): Path<String>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let manager = lookup(&registry, &collection)?;
    let created = manager.create(require_object(body)?).await?;
    let presented = responses::present(manager.schema(), &collection, &created);
    Ok((StatusCode::CREATED, Json(Value::Object(presented))).into_response())
}

/// Replace a record
///
/// Every mutable field is set from the body; fields absent from the body are
/// cleared. The identity is immutable.
#[utoipa::path(
    put,
    path = "/api/{collection}/{id}",
    params(
        ("collection" = String, Path, description = "Collection name"),
        ("id" = String, Path, description = "Record id")
    ),
    responses(
        (status = 200, description = "Record replaced"),
        (status = 404, description = "Record or collection not found", body = ErrorBody),
        (status = 409, description = "Unique-field duplicate", body = ErrorBody),
    ),
    tag = "Records"
)]
pub async fn update_record(
    Extension(registry): Extension<CollectionRegistry>,
    Path((collection, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let manager = lookup(&registry, &collection)?;
    let updated = manager.update(&id, require_object(body)?).await?;
    let presented = responses::present(manager.schema(), &collection, &updated);
    Ok(Json(Value::Object(presented)))
}

/// Partially update a record
///
/// Only fields present and non-null in the body are overwritten.
#[utoipa::path(
    patch,
    path = "/api/{collection}/{id}",
    params(
        ("collection" = String, Path, description = "Collection name"),
        ("id" = String, Path, description = "Record id")
    ),
    responses(
        (status = 200, description = "Record updated"),
        (status = 404, description = "Record or collection not found", body = ErrorBody),
        (status = 409, description = "Unique-field duplicate", body = ErrorBody),
    ),
    tag = "Records"
)]
pub async fn patch_record(
    Extension(registry): Extension<CollectionRegistry>,
    Path((collection, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let manager = lookup(&registry, &collection)?;
    let patched = manager.patch(&id, require_object(body)?).await?;
    let presented = responses::present(manager.schema(), &collection, &patched);
    Ok(Json(Value::Object(presented)))
}

/// Delete a record
///
/// Removes the record and releases any photo attachment it owned. The id is
/// never reassigned.
#[utoipa::path(
    delete,
    path = "/api/{collection}/{id}",
    params(
        ("collection" = String, Path, description = "Collection name"),
        ("id" = String, Path, description = "Record id")
    ),
    responses(
        (status = 204, description = "Record deleted"),
        (status = 404, description = "Record or collection not found", body = ErrorBody),
    ),
    tag = "Records"
)]
pub async fn delete_record(
    Extension(registry): Extension<CollectionRegistry>,
    Extension(attachments): Extension<AttachmentStore>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let manager = lookup(&registry, &collection)?;
    let removed = manager.delete(&id).await?;

    if let Some(stored) = removed
        .get(crate::schema::ATTACHMENT_FIELD)
        .and_then(Value::as_str)
    {
        attachments.remove(stored);
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Upload or replace a record's photo
///
/// Multipart form with a single `photo` file field (png, jpg, jpeg or gif,
/// at most 2 MiB). A replaced photo's previous file is released.
#[utoipa::path(
    put,
    path = "/api/{collection}/{id}/photo",
    params(
        ("collection" = String, Path, description = "Collection name"),
        ("id" = String, Path, description = "Record id")
    ),
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Photo stored, record returned"),
        (status = 400, description = "Missing, oversized, or disallowed file", body = ErrorBody),
        (status = 404, description = "Record or collection not found", body = ErrorBody),
    ),
    tag = "Photos"
)]
pub async fn upload_photo(
    Extension(registry): Extension<CollectionRegistry>,
    Extension(attachments): Extension<AttachmentStore>,
    Path((collection, id)): Path<(String, String)>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let manager = lookup(&registry, &collection)?;
    if !manager.schema().attachments {
        return Err(ApiError::Validation(format!(
            "collection '{collection}' does not support photo attachments"
        )));
    }
    // resolve the record before accepting the upload
    manager.get(&id).await?;

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("malformed multipart body: {e}")))?
    {
        if field.name() == Some("photo") {
            let file_name = field
                .file_name()
                .map(String::from)
                .ok_or_else(|| ApiError::Validation("photo field must be a file".to_string()))?;
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::Validation(format!("failed to read upload: {e}")))?;
            upload = Some((file_name, bytes.to_vec()));
        }
    }
    let (file_name, bytes) =
        upload.ok_or_else(|| ApiError::Validation("multipart field 'photo' is required".to_string()))?;

    let stored = attachments.save(&file_name, &bytes)?;
    let previous = match manager.set_attachment(&id, Some(stored.clone())).await {
        Ok(previous) => previous,
        Err(e) => {
            // record vanished or flush failed; do not leave the new file behind
            attachments.remove(&stored);
            return Err(e.into());
        }
    };
    if let Some(old) = previous {
        attachments.remove(&old);
    }

    let record = manager.get(&id).await?;
    let presented = responses::present(manager.schema(), &collection, &record);
    Ok(Json(Value::Object(presented)))
}

/// Download a record's photo
#[utoipa::path(
    get,
    path = "/api/{collection}/{id}/photo",
    params(
        ("collection" = String, Path, description = "Collection name"),
        ("id" = String, Path, description = "Record id")
    ),
    responses(
        (status = 200, description = "Photo bytes"),
        (status = 404, description = "Record, collection, or photo not found", body = ErrorBody),
    ),
    tag = "Photos"
)]
pub async fn get_photo(
    Extension(registry): Extension<CollectionRegistry>,
    Extension(attachments): Extension<AttachmentStore>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let manager = lookup(&registry, &collection)?;
    let entity = manager.schema().entity;
    let stored = manager
        .attachment(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no photo found for this {entity}")))?;

    let (bytes, content_type) = attachments.read(&stored).map_err(|e| match e {
        crate::uploads::UploadError::Io(ref io) if io.kind() == std::io::ErrorKind::NotFound => {
            ApiError::NotFound(format!("no photo found for this {entity}"))
        }
        other => other.into(),
    })?;

    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}
