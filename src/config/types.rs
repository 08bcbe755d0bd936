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

//! Type-safe configuration structures.
//!
//! Field names are camelCase on the wire. Every field has a default so a
//! partial file (or none at all) still yields a runnable server; `validate`
//! catches the combinations serde cannot.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::schema::{Record, SchemaKind};

/// Top-level server configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ShelfServerConfig {
    /// Address to bind ("0.0.0.0" for all interfaces).
    pub host: String,
    pub port: u16,
    /// Default log level when RUST_LOG is not set.
    pub log_level: String,
    /// Write-capability token; mutations are open when unset or empty
    /// (empty supports the `${SHELF_API_TOKEN:-}` interpolation pattern).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    /// Directory for photo attachment files.
    pub uploads_dir: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimitConfig>,
    pub collections: Vec<CollectionConfig>,
}

/// One served collection: its path name, schema, and backing store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CollectionConfig {
    pub name: String,
    pub schema: SchemaKind,
    pub store: StoreConfig,
}

/// Backing store selection, tagged by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StoreConfig {
    /// Flat JSON array file, rewritten atomically on every mutation.
    #[serde(rename_all = "camelCase")]
    JsonFile { path: PathBuf },
    /// Process-memory store; contents are lost on restart.
    #[serde(rename_all = "camelCase")]
    Memory {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        seed: Vec<Record>,
    },
}

/// Fixed-window per-client request budget.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_secs: u64,
}

impl Default for ShelfServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            api_token: None,
            uploads_dir: PathBuf::from("./data/uploads"),
            rate_limit: None,
            collections: default_collections(),
        }
    }
}

fn default_collections() -> Vec<CollectionConfig> {
    let seed_products: Vec<Record> = [
        serde_json::json!({"id": 1, "name": "Laptop", "price": 50000, "category": "electronics"}),
        serde_json::json!({"id": 2, "name": "Mobile", "price": 20000, "category": "electronics"}),
    ]
    .iter()
    .filter_map(|v| v.as_object().cloned())
    .collect();

    vec![
        CollectionConfig {
            name: "customers".to_string(),
            schema: SchemaKind::Customers,
            store: StoreConfig::JsonFile {
                path: PathBuf::from("./data/customers.json"),
            },
        },
        CollectionConfig {
            name: "employees".to_string(),
            schema: SchemaKind::Employees,
            store: StoreConfig::JsonFile {
                path: PathBuf::from("./data/employees.json"),
            },
        },
        CollectionConfig {
            name: "books".to_string(),
            schema: SchemaKind::Books,
            store: StoreConfig::JsonFile {
                path: PathBuf::from("./data/books.json"),
            },
        },
        CollectionConfig {
            name: "products".to_string(),
            schema: SchemaKind::Products,
            store: StoreConfig::Memory {
                seed: seed_products,
            },
        },
    ]
}

const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Collection names that would shadow fixed API routes.
const RESERVED_COLLECTION_NAMES: &[&str] = &["collections", "docs"];

impl ShelfServerConfig {
    /// Cross-field validation beyond what serde can express.
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut errors: Vec<String> = Vec::new();

        if self.port == 0 {
            errors.push("port must be non-zero".to_string());
        }
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            errors.push(format!(
                "logLevel '{}' is not one of {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            ));
        }
        if let Some(limit) = &self.rate_limit {
            if limit.max_requests == 0 {
                errors.push("rateLimit.maxRequests must be at least 1".to_string());
            }
            if limit.window_secs == 0 {
                errors.push("rateLimit.windowSecs must be at least 1".to_string());
            }
        }
        let mut seen_names = std::collections::HashSet::new();
        let mut seen_paths = std::collections::HashSet::new();
        for collection in &self.collections {
            let name = collection.name.as_str();
            if name.is_empty()
                || !name
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
            {
                errors.push(format!(
                    "collection name '{name}' must be non-empty lowercase [a-z0-9_-]"
                ));
            }
            if RESERVED_COLLECTION_NAMES.contains(&name) {
                errors.push(format!("collection name '{name}' is reserved"));
            }
            if !seen_names.insert(name) {
                errors.push(format!("duplicate collection name '{name}'"));
            }
            if let StoreConfig::JsonFile { path } = &collection.store {
                if path.as_os_str().is_empty() {
                    errors.push(format!("collection '{name}' has an empty store path"));
                }
                if !seen_paths.insert(path.clone()) {
                    errors.push(format!(
                        "store path '{}' is used by more than one collection",
                        path.display()
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!("invalid configuration:\n  {}", errors.join("\n  "))
        }
    }
}
