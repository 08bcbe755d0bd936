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

//! Backing stores for record collections.
//!
//! A store is an opaque persistence medium behind the [`CollectionStore`]
//! trait: the collection manager loads the full record sequence once at
//! startup and flushes it back after every mutation. Store failures are a
//! distinct error class (they surface as HTTP 500, never as a panic).

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use crate::schema::Record;
use async_trait::async_trait;

/// Failure talking to a backing store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Io(#[from] std::io::Error),

    #[error("store content is corrupt: {0}")]
    Corrupt(String),
}

/// Opaque persistence medium mirroring one collection.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Read the full record sequence, in stored order. A store that has never
    /// been written loads as empty.
    async fn load(&self) -> Result<Vec<Record>, StoreError>;

    /// Replace the stored sequence with `records`.
    async fn flush(&self, records: &[Record]) -> Result<(), StoreError>;
}
