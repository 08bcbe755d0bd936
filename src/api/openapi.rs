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

//! OpenAPI documentation for the record API.

use utoipa::OpenApi;

use super::error::ErrorBody;
use super::handlers;
use super::responses::{CollectionListItem, HealthResponse};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Shelf Server API",
        description = "CRUD over schema-validated record collections",
        version = "0.1.0",
    ),
    paths(
        handlers::health_check,
        handlers::list_collections,
        handlers::list_records,
        handlers::get_record,
        handlers::create_record,
        handlers::update_record,
        handlers::patch_record,
        handlers::delete_record,
        handlers::upload_photo,
        handlers::get_photo,
    ),
    components(schemas(ErrorBody, HealthResponse, CollectionListItem)),
    tags(
        (name = "Health", description = "Operational endpoints"),
        (name = "Collections", description = "Collection inventory"),
        (name = "Records", description = "Record CRUD"),
        (name = "Photos", description = "Photo attachments"),
    )
)]
pub struct ApiDoc;
