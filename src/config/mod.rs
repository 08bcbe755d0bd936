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

//! Configuration management for Shelf Server.
//!
//! This module provides:
//! - Type-safe configuration structures
//! - Automatic environment variable interpolation
//! - YAML and JSON file loading
//! - Unknown-field and cross-field validation
//!
//! # Environment Variable Interpolation
//!
//! All config loading functions interpolate environment variables using
//! POSIX-style syntax:
//! - `${VAR_NAME}` - Required variable
//! - `${VAR_NAME:-default}` - Variable with default value
//!
//! # Configuration File Example
//!
//! ```yaml
//! host: "${SHELF_HOST:-0.0.0.0}"
//! port: "${SHELF_PORT:-8080}"
//! logLevel: info
//! apiToken: "${SHELF_API_TOKEN:-}"
//! uploadsDir: ./data/uploads
//! rateLimit:
//!   maxRequests: 100
//!   windowSecs: 3600
//! collections:
//!   - name: customers
//!     schema: customers
//!     store:
//!       kind: jsonFile
//!       path: ./data/customers.json
//! ```

pub mod env_interpolation;
pub mod loader;
pub mod types;
pub mod validation;

pub use loader::{
    from_json_str, from_yaml_str, load_config_file, save_config_file, ConfigError,
};
pub use types::{CollectionConfig, RateLimitConfig, ShelfServerConfig, StoreConfig};
