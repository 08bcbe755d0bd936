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

//! Registry of collection managers.
//!
//! The registry maps collection names to their managers and is the one shared
//! handle request handlers receive (via axum `Extension`). The set of
//! collections is fixed at startup; insertion order is preserved so listings
//! match the configuration file.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::collection::CollectionManager;

#[derive(Clone, Default)]
pub struct CollectionRegistry {
    managers: Arc<IndexMap<String, Arc<CollectionManager>>>,
}

impl CollectionRegistry {
    pub fn from_map(managers: IndexMap<String, Arc<CollectionManager>>) -> Self {
        Self {
            managers: Arc::new(managers),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<CollectionManager>> {
        self.managers.get(name).cloned()
    }

    /// All managers in configuration order.
    pub fn list(&self) -> Vec<(String, Arc<CollectionManager>)> {
        self.managers
            .iter()
            .map(|(name, manager)| (name.clone(), manager.clone()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.managers.is_empty()
    }
}
