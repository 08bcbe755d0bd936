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

//! REST API implementation for Shelf Server.
//!
//! ## Endpoint structure
//!
//! ```text
//! /health                          - Health check
//! /api/collections                 - Collection inventory
//! /api/{collection}                - List (paginated) and create
//! /api/{collection}/{id}           - Get, replace, patch, delete
//! /api/{collection}/{id}/photo     - Photo attachment upload/download
//! /api/docs                        - Swagger UI over the OpenAPI document
//! ```
//!
//! ## Module organization
//!
//! - `error` - error taxonomy and the `{message, timestamp, code}` wire body
//! - `responses` - response types, content negotiation, record presentation
//! - `handlers` - one handler per route, with OpenAPI annotations
//! - `routes` - the route-registration table
//! - `auth` - opaque write-capability check
//! - `rate_limit` - fixed-window per-client limiting
//! - `openapi` - OpenAPI document assembly

pub mod auth;
pub mod error;
pub mod handlers;
pub mod openapi;
pub mod rate_limit;
pub mod responses;
pub mod routes;

pub use auth::ApiToken;
pub use error::{ApiError, ErrorBody};
pub use openapi::ApiDoc;
pub use rate_limit::RateLimiter;
pub use responses::{AcceptFormat, CollectionListItem, HealthResponse};
pub use routes::build_router;
