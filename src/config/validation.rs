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

//! Configuration field validation.
//!
//! Serde defaults make every field optional, which also means a typo like
//! `colections:` would be silently ignored. This pass walks the raw document
//! and rejects unknown fields before deserialization, naming the valid ones.

use serde_yaml::Value;

/// Validation error for unknown configuration fields.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("unknown field '{field}' in {context}. Valid fields are: {valid_fields}")]
    UnknownField {
        field: String,
        context: String,
        valid_fields: String,
    },

    #[error("multiple validation errors:\n{}", .0.join("\n"))]
    Multiple(Vec<String>),
}

const SERVER_FIELDS: &[&str] = &[
    "host",
    "port",
    "logLevel",
    "apiToken",
    "uploadsDir",
    "rateLimit",
    "collections",
];

const COLLECTION_FIELDS: &[&str] = &["name", "schema", "store"];

const STORE_FIELDS: &[&str] = &["kind", "path", "seed"];

const RATE_LIMIT_FIELDS: &[&str] = &["maxRequests", "windowSecs"];

/// Reject unknown fields anywhere in the configuration document.
pub fn check_unknown_fields(value: &Value) -> Result<(), ValidationError> {
    let mut errors = Vec::new();

    if let Some(map) = value.as_mapping() {
        collect_unknown(map, SERVER_FIELDS, "server configuration", &mut errors);

        if let Some(limit) = map.get("rateLimit").and_then(Value::as_mapping) {
            collect_unknown(limit, RATE_LIMIT_FIELDS, "rateLimit", &mut errors);
        }

        if let Some(collections) = map.get("collections").and_then(Value::as_sequence) {
            for (i, entry) in collections.iter().enumerate() {
                let context = format!("collections[{i}]");
                if let Some(entry_map) = entry.as_mapping() {
                    collect_unknown(entry_map, COLLECTION_FIELDS, &context, &mut errors);
                    if let Some(store) = entry_map.get("store").and_then(Value::as_mapping) {
                        let store_context = format!("{context}.store");
                        collect_unknown(store, STORE_FIELDS, &store_context, &mut errors);
                    }
                }
            }
        }
    }

    match errors.pop() {
        None => Ok(()),
        Some(only) if errors.is_empty() => Err(only),
        Some(last) => {
            let mut messages: Vec<String> = errors.into_iter().map(|e| e.to_string()).collect();
            messages.push(last.to_string());
            Err(ValidationError::Multiple(messages))
        }
    }
}

fn collect_unknown(
    map: &serde_yaml::Mapping,
    valid: &[&str],
    context: &str,
    errors: &mut Vec<ValidationError>,
) {
    for key in map.keys() {
        if let Some(field) = key.as_str() {
            if !valid.contains(&field) {
                errors.push(ValidationError::UnknownField {
                    field: field.to_string(),
                    context: context.to_string(),
                    valid_fields: valid.join(", "),
                });
            }
        }
    }
}
