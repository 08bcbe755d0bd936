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

//! In-memory store.
//!
//! Holds the collection in process memory only: mutations survive for the
//! life of the server and vanish on restart. Used for seeded demo
//! collections and in tests.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CollectionStore, StoreError};
use crate::schema::Record;

#[derive(Default)]
pub struct MemoryStore {
    rows: RwLock<Vec<Record>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `seed` rows.
    pub fn seeded(seed: Vec<Record>) -> Self {
        Self {
            rows: RwLock::new(seed),
        }
    }
}

#[async_trait]
impl CollectionStore for MemoryStore {
    async fn load(&self) -> Result<Vec<Record>, StoreError> {
        Ok(self.rows.read().await.clone())
    }

    async fn flush(&self, records: &[Record]) -> Result<(), StoreError> {
        *self.rows.write().await = records.to_vec();
        Ok(())
    }
}
