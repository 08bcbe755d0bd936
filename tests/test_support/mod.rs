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

//! Shared helpers for router-level integration tests.

#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use shelf_server::config::{
    CollectionConfig, RateLimitConfig, ShelfServerConfig, StoreConfig,
};
use shelf_server::{server, SchemaKind};

/// A router wired to stores under a temp directory that lives as long as the
/// test does.
pub struct TestServer {
    pub router: Router,
    pub config: ShelfServerConfig,
    pub dir: TempDir,
}

/// Configuration serving all four builtin collections out of a temp dir.
pub fn test_config(dir: &TempDir) -> ShelfServerConfig {
    let path = |name: &str| dir.path().join(format!("{name}.json"));
    ShelfServerConfig {
        host: "127.0.0.1".to_string(),
        port: 8080,
        log_level: "info".to_string(),
        api_token: None,
        uploads_dir: dir.path().join("uploads"),
        rate_limit: None,
        collections: vec![
            CollectionConfig {
                name: "customers".to_string(),
                schema: SchemaKind::Customers,
                store: StoreConfig::JsonFile {
                    path: path("customers"),
                },
            },
            CollectionConfig {
                name: "employees".to_string(),
                schema: SchemaKind::Employees,
                store: StoreConfig::JsonFile {
                    path: path("employees"),
                },
            },
            CollectionConfig {
                name: "books".to_string(),
                schema: SchemaKind::Books,
                store: StoreConfig::JsonFile { path: path("books") },
            },
            CollectionConfig {
                name: "products".to_string(),
                schema: SchemaKind::Products,
                store: StoreConfig::Memory {
                    seed: seed_products(),
                },
            },
        ],
    }
}

pub fn seed_products() -> Vec<shelf_server::Record> {
    [
        serde_json::json!({"id": 1, "name": "Laptop", "price": 50000, "category": "electronics"}),
        serde_json::json!({"id": 2, "name": "Mobile", "price": 20000, "category": "electronics"}),
    ]
    .iter()
    .filter_map(|v| v.as_object().cloned())
    .collect()
}

/// Build a test server over the default test configuration.
pub async fn test_server() -> TestServer {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = test_config(&dir);
    build(dir, config).await
}

/// Build a test server over a caller-adjusted configuration.
pub async fn test_server_with<F>(adjust: F) -> TestServer
where
    F: FnOnce(&mut ShelfServerConfig),
{
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = test_config(&dir);
    adjust(&mut config);
    build(dir, config).await
}

async fn build(dir: TempDir, config: ShelfServerConfig) -> TestServer {
    let registry = server::build_registry(&config)
        .await
        .expect("Failed to load collections");
    let router = server::build_app(&config, registry).expect("Failed to build app");
    TestServer {
        router,
        config,
        dir,
    }
}

/// Convenience: a rate limit config usable in tests.
pub fn small_rate_limit(max_requests: u32) -> RateLimitConfig {
    RateLimitConfig {
        max_requests,
        window_secs: 60,
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    }
}

/// Send a request with no body; returns status and parsed JSON (null when
/// the body is empty or not JSON).
pub async fn send(router: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

/// Send a JSON body.
pub async fn send_json(
    router: &Router,
    method: &str,
    uri: &str,
    body: Value,
) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

/// Send a request with arbitrary extra headers and no body.
pub async fn send_with_headers(
    router: &Router,
    method: &str,
    uri: &str,
    headers: &[(&str, &str)],
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let response = router
        .clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

/// Multipart upload with a single `photo` file field.
pub async fn send_photo(
    router: &Router,
    method: &str,
    uri: &str,
    file_name: &str,
    bytes: &[u8],
) -> (StatusCode, Value) {
    let boundary = "shelf-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"photo\"; filename=\"{file_name}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

/// The §8 scenario customer.
pub fn vinod() -> Value {
    serde_json::json!({
        "name": "Vinod",
        "city": "Bangalore",
        "email": "vinod@vinod.co",
        "phone": "9731424784"
    })
}
