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

//! Route registration.
//!
//! The one table mapping (method, path) to handler. Handlers receive their
//! dependencies through `Extension` layers; the middleware stack runs rate
//! limiting first, then the write-capability check, then the handler.

use axum::middleware;
use axum::routing::get;
use axum::{Extension, Router};

use super::auth::{self, ApiToken};
use super::handlers;
use super::rate_limit::{self, RateLimiter};
use crate::registry::CollectionRegistry;
use crate::uploads::AttachmentStore;

/// Build the application router over a fixed set of collections.
pub fn build_router(
    registry: CollectionRegistry,
    attachments: AttachmentStore,
    api_token: ApiToken,
    rate_limiter: Option<RateLimiter>,
) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/collections", get(handlers::list_collections))
        .route(
            "/api/:collection",
            get(handlers::list_records).post(handlers::create_record),
        )
        .route(
            "/api/:collection/:id",
            get(handlers::get_record)
                .put(handlers::update_record)
                .patch(handlers::patch_record)
                .delete(handlers::delete_record),
        )
        .route(
            "/api/:collection/:id/photo",
            get(handlers::get_photo).put(handlers::upload_photo),
        )
        .layer(middleware::from_fn(auth::require_capability))
        .layer(Extension(api_token))
        .layer(Extension(registry))
        .layer(Extension(attachments));

    if let Some(limiter) = rate_limiter {
        router = router
            .layer(middleware::from_fn(rate_limit::enforce))
            .layer(Extension(limiter));
    }

    router
}
