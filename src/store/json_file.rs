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

//! Flat-file JSON store.
//!
//! The whole collection lives in one JSON array file. Every flush rewrites
//! the entire file using a temp-file + rename cycle, so a crash mid-flush
//! leaves the previous contents intact rather than a truncated array.
//! Serialization of writers is the caller's responsibility; two processes
//! sharing one file can still overwrite each other's flushes.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{debug, error};

use super::{CollectionStore, StoreError};
use crate::schema::Record;

pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CollectionStore for JsonFileStore {
    async fn load(&self) -> Result<Vec<Record>, StoreError> {
        if !self.path.exists() {
            debug!("Store file {} not found, loading empty", self.path.display());
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content)
            .map_err(|e| StoreError::Corrupt(format!("{}: {e}", self.path.display())))
    }

    async fn flush(&self, records: &[Record]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(records)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        // Atomic write: temp file in the same directory, then rename.
        let temp_path = self.path.with_extension("tmp");
        std::fs::write(&temp_path, content)?;
        std::fs::rename(&temp_path, &self.path).map_err(|e| {
            error!(
                "Failed to rename {} to {}: {e}",
                temp_path.display(),
                self.path.display()
            );
            let _ = std::fs::remove_file(&temp_path);
            e
        })?;

        debug!(
            "Flushed {} record(s) to {}",
            records.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("books.json"));

        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn flush_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("books.json"));

        let records = vec![
            record(json!({"id": 1, "title": "Dune"})),
            record(json!({"id": 2, "title": "Emma"})),
        ];
        store.flush(&records).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, records);
    }

    #[tokio::test]
    async fn flush_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("data").join("books.json"));

        store.flush(&[]).await.unwrap();
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn flush_leaves_no_temp_file_behind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("books.json");
        let store = JsonFileStore::new(&path);

        store
            .flush(&[record(json!({"id": 1, "title": "Dune"}))])
            .await
            .unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn flush_replaces_previous_contents() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("books.json"));

        store
            .flush(&[record(json!({"id": 1, "title": "Dune"}))])
            .await
            .unwrap();
        store
            .flush(&[record(json!({"id": 2, "title": "Emma"}))])
            .await
            .unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].get("title"), Some(&json!("Emma")));
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error_not_a_panic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("books.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = JsonFileStore::new(&path);

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }

    #[tokio::test]
    async fn empty_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("books.json");
        std::fs::write(&path, "").unwrap();
        let store = JsonFileStore::new(&path);

        assert!(store.load().await.unwrap().is_empty());
    }
}
