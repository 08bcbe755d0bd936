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

//! Opaque write-capability check.
//!
//! When an API token is configured, mutating requests must present it as
//! `Authorization: Bearer <token>`; reads stay open. Token issuance and
//! anything beyond exact comparison is out of scope here.

use std::sync::Arc;

use axum::extract::Request;
use axum::http::{header, HeaderMap, Method};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Extension;

use super::error::ApiError;

/// Shared token configuration; `None` disables the check entirely.
#[derive(Clone, Default)]
pub struct ApiToken(Option<Arc<String>>);

impl ApiToken {
    pub fn new(token: Option<String>) -> Self {
        Self(token.map(Arc::new))
    }
}

fn is_mutating(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Middleware guarding mutating methods behind the configured token.
pub async fn require_capability(
    Extension(token): Extension<ApiToken>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(expected) = token.0.as_deref() {
        if is_mutating(request.method()) {
            match bearer(request.headers()) {
                Some(presented) if presented == expected.as_str() => {}
                _ => {
                    return ApiError::Auth("missing or invalid bearer token".to_string())
                        .into_response()
                }
            }
        }
    }
    next.run(request).await
}
