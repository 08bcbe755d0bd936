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

//! Configuration failure modes observed through the public loading API.

#![allow(clippy::unwrap_used)]

use serial_test::serial;
use shelf_server::config::ConfigError;
use shelf_server::load_config_file;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(file.path(), content).unwrap();
    file
}

#[test]
#[serial]
fn missing_file_is_an_io_error() {
    let result = load_config_file("/definitely/not/here/server.yaml");
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
#[serial]
fn misspelled_top_level_field_is_rejected_with_the_valid_set() {
    let file = write_config("prot: 9999\n");

    let err = load_config_file(file.path()).unwrap_err().to_string();
    assert!(err.contains("prot"), "{err}");
    assert!(err.contains("port"), "{err}");
}

#[test]
#[serial]
fn unknown_schema_kind_fails_deserialization() {
    let file = write_config(
        r#"
collections:
  - name: invoices
    schema: invoices
    store: { kind: jsonFile, path: ./invoices.json }
"#,
    );

    let err = load_config_file(file.path()).unwrap_err().to_string();
    assert!(err.contains("invoices") || err.contains("unknown variant"), "{err}");
}

#[test]
#[serial]
fn unknown_store_kind_fails_deserialization() {
    let file = write_config(
        r#"
collections:
  - name: books
    schema: books
    store: { kind: postgres, path: ./books.json }
"#,
    );

    assert!(load_config_file(file.path()).is_err());
}

#[test]
#[serial]
fn reserved_collection_names_fail_validation() {
    let file = write_config(
        r#"
collections:
  - name: docs
    schema: books
    store: { kind: jsonFile, path: ./docs.json }
"#,
    );

    let err = load_config_file(file.path()).unwrap_err().to_string();
    assert!(err.contains("reserved"), "{err}");
}

#[test]
#[serial]
fn collections_sharing_a_store_file_fail_validation() {
    let file = write_config(
        r#"
collections:
  - name: books
    schema: books
    store: { kind: jsonFile, path: ./shared.json }
  - name: archive
    schema: books
    store: { kind: jsonFile, path: ./shared.json }
"#,
    );

    let err = load_config_file(file.path()).unwrap_err().to_string();
    assert!(err.contains("used by more than one collection"), "{err}");
}

#[test]
#[serial]
fn zero_port_fails_validation() {
    let file = write_config("port: 0\n");

    let err = load_config_file(file.path()).unwrap_err().to_string();
    assert!(err.contains("port must be non-zero"), "{err}");
}

#[test]
#[serial]
fn memory_seed_rows_are_accepted() {
    let file = write_config(
        r#"
collections:
  - name: products
    schema: products
    store:
      kind: memory
      seed:
        - { id: 1, name: "Laptop", price: 50000 }
"#,
    );

    let config = load_config_file(file.path()).unwrap();
    assert_eq!(config.collections.len(), 1);
}
