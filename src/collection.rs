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

//! Collection manager.
//!
//! A [`CollectionManager`] owns one homogeneous record collection: the
//! in-memory record sequence, its schema, and the backing-store handle. It is
//! constructed once at startup and shared with request handlers by reference;
//! there is no ambient global state.
//!
//! Every mutation runs under the manager's write lock for its whole
//! validate-mutate-flush cycle, so concurrent writers in this process cannot
//! interleave on the read-modify-rewrite step and drop records. A flush
//! failure rolls the in-memory change back before the error is returned, so a
//! retried request does not duplicate. The lock does not reach across
//! processes: two servers sharing one store file can still overwrite each
//! other.

use log::{debug, info};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::schema::{Record, Schema, ATTACHMENT_FIELD};
use crate::store::{CollectionStore, StoreError};

/// Failure of a collection operation, classified for the request boundary.
#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    /// Malformed or incomplete input.
    #[error("{0}")]
    Validation(String),

    /// Unique-field duplicate.
    #[error("{field} already exists - {value}")]
    Conflict { field: String, value: String },

    /// The id does not resolve. Absence is a normal outcome, not corruption.
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// The backing store failed; surfaced as a server-side error.
    #[error(transparent)]
    Store(#[from] StoreError),
}

struct CollectionState {
    records: Vec<Record>,
    next_serial: i64,
}

pub struct CollectionManager {
    name: String,
    schema: Schema,
    store: Box<dyn CollectionStore>,
    state: RwLock<CollectionState>,
}

impl CollectionManager {
    /// Load the collection from its store (read-through at process start).
    pub async fn open(
        name: impl Into<String>,
        schema: Schema,
        store: Box<dyn CollectionStore>,
    ) -> Result<Self, StoreError> {
        let name = name.into();
        let records = store.load().await?;
        let next_serial = 1 + records
            .iter()
            .filter_map(|r| r.get("id").and_then(Value::as_i64))
            .max()
            .unwrap_or(0);

        info!(
            "Loaded collection '{name}' with {} record(s)",
            records.len()
        );

        Ok(Self {
            name,
            schema,
            store,
            state: RwLock::new(CollectionState {
                records,
                next_serial,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub async fn count(&self) -> usize {
        self.state.read().await.records.len()
    }

    /// Return the `[(page-1)*size, (page-1)*size + size)` slice of the
    /// collection in its current order. Out-of-range slices are empty, not an
    /// error. Pagination arguments are validated at the request boundary.
    pub async fn list(&self, page: usize, size: usize) -> Vec<Record> {
        let state = self.state.read().await;
        let start = page.saturating_sub(1).saturating_mul(size);
        state
            .records
            .iter()
            .skip(start)
            .take(size)
            .cloned()
            .collect()
    }

    pub async fn get(&self, raw_id: &str) -> Result<Record, CollectionError> {
        let id = self.parse_id(raw_id)?;
        let state = self.state.read().await;
        state
            .records
            .iter()
            .find(|r| r.get("id") == Some(&id))
            .cloned()
            .ok_or_else(|| self.not_found(raw_id))
    }

    /// Create a record from untrusted candidate fields.
    ///
    /// The validation pipeline runs in order and short-circuits: presence
    /// (all missing fields reported at once), declared formats, then
    /// uniqueness. On success the candidate is projected onto the field
    /// whitelist, given a fresh identity, appended, and the collection is
    /// flushed before the stored record is returned.
    pub async fn create(&self, body: Record) -> Result<Record, CollectionError> {
        let mut state = self.state.write().await;

        let missing = self.schema.missing_required(&body);
        if !missing.is_empty() {
            return Err(CollectionError::Validation(format!(
                "missing fields: {}",
                missing.join(", ")
            )));
        }

        if let Err((field, reason)) = self.schema.check_formats(&body) {
            return Err(CollectionError::Validation(format!("{field}: {reason}")));
        }

        let candidate = self.schema.project(&body);
        if let Some((field, value)) = duplicate_field(&state.records, &self.schema, &candidate, None)
        {
            return Err(CollectionError::Conflict { field, value });
        }

        let mut record = candidate;
        let id = self.schema.generate_id(state.next_serial);
        record.insert("id".to_string(), id);

        state.records.push(record.clone());
        if let Err(e) = self.store.flush(&state.records).await {
            state.records.pop();
            return Err(e.into());
        }
        state.next_serial += 1;

        debug!("Created record in '{}'", self.name);
        Ok(record)
    }

    /// Replace every mutable field unconditionally: fields absent from the
    /// request are cleared to null. Uniqueness is re-checked against all
    /// *other* records, so writing a record's own value back is not a
    /// conflict. The identity is immutable and survives the replacement.
    pub async fn update(&self, raw_id: &str, body: Record) -> Result<Record, CollectionError> {
        let id = self.parse_id(raw_id)?;
        let mut state = self.state.write().await;

        let index = position_of(&state.records, &id).ok_or_else(|| self.not_found(raw_id))?;

        let mut replacement = self.schema.project(&body);
        replacement.insert("id".to_string(), id);
        // the attachment is owned by the record, not the request body
        if let Some(attachment) = state.records[index].get(ATTACHMENT_FIELD) {
            replacement.insert(ATTACHMENT_FIELD.to_string(), attachment.clone());
        }

        if let Some((field, value)) =
            duplicate_field(&state.records, &self.schema, &replacement, Some(index))
        {
            return Err(CollectionError::Conflict { field, value });
        }

        let previous = std::mem::replace(&mut state.records[index], replacement.clone());
        if let Err(e) = self.store.flush(&state.records).await {
            state.records[index] = previous;
            return Err(e.into());
        }

        Ok(replacement)
    }

    /// Overwrite only the fields present and non-null in the request; all
    /// other fields keep their current values.
    pub async fn patch(&self, raw_id: &str, body: Record) -> Result<Record, CollectionError> {
        let id = self.parse_id(raw_id)?;
        let mut state = self.state.write().await;

        let index = position_of(&state.records, &id).ok_or_else(|| self.not_found(raw_id))?;

        let mut patched = state.records[index].clone();
        for field in &self.schema.fields {
            if let Some(value) = body.get(field.name) {
                if !value.is_null() {
                    patched.insert(field.name.to_string(), value.clone());
                }
            }
        }

        if let Some((field, value)) =
            duplicate_field(&state.records, &self.schema, &patched, Some(index))
        {
            return Err(CollectionError::Conflict { field, value });
        }

        let previous = std::mem::replace(&mut state.records[index], patched.clone());
        if let Err(e) = self.store.flush(&state.records).await {
            state.records[index] = previous;
            return Err(e.into());
        }

        Ok(patched)
    }

    /// Remove the record and flush. Returns the removed record so the caller
    /// can release side-stored resources it owned (e.g. an uploaded photo).
    /// The id is never reassigned.
    pub async fn delete(&self, raw_id: &str) -> Result<Record, CollectionError> {
        let id = self.parse_id(raw_id)?;
        let mut state = self.state.write().await;

        let index = position_of(&state.records, &id).ok_or_else(|| self.not_found(raw_id))?;

        let removed = state.records.remove(index);
        if let Err(e) = self.store.flush(&state.records).await {
            state.records.insert(index, removed);
            return Err(e.into());
        }

        debug!("Deleted record {raw_id} from '{}'", self.name);
        Ok(removed)
    }

    /// Stored attachment filename owned by a record, if any.
    pub async fn attachment(&self, raw_id: &str) -> Result<Option<String>, CollectionError> {
        let record = self.get(raw_id).await?;
        Ok(record
            .get(ATTACHMENT_FIELD)
            .and_then(Value::as_str)
            .map(String::from))
    }

    /// Point the record at a new stored attachment, or clear it with `None`.
    /// Returns the previously stored filename so the caller can release it.
    pub async fn set_attachment(
        &self,
        raw_id: &str,
        stored: Option<String>,
    ) -> Result<Option<String>, CollectionError> {
        let id = self.parse_id(raw_id)?;
        let mut state = self.state.write().await;

        let index = position_of(&state.records, &id).ok_or_else(|| self.not_found(raw_id))?;
        let previous = state.records[index]
            .get(ATTACHMENT_FIELD)
            .and_then(Value::as_str)
            .map(String::from);

        let mut updated = state.records[index].clone();
        match stored {
            Some(name) => {
                updated.insert(ATTACHMENT_FIELD.to_string(), Value::String(name));
            }
            None => {
                updated.remove(ATTACHMENT_FIELD);
            }
        }

        let rollback = std::mem::replace(&mut state.records[index], updated);
        if let Err(e) = self.store.flush(&state.records).await {
            state.records[index] = rollback;
            return Err(e.into());
        }

        Ok(previous)
    }

    fn parse_id(&self, raw: &str) -> Result<Value, CollectionError> {
        self.schema
            .parse_id(raw)
            .ok_or_else(|| self.not_found(raw))
    }

    fn not_found(&self, raw_id: &str) -> CollectionError {
        CollectionError::NotFound {
            entity: self.schema.entity,
            id: raw_id.to_string(),
        }
    }
}

fn position_of(records: &[Record], id: &Value) -> Option<usize> {
    records.iter().position(|r| r.get("id") == Some(id))
}

/// First unique-field value in `candidate` already held by another record.
/// `skip` excludes the record being updated from the scan.
fn duplicate_field(
    records: &[Record],
    schema: &Schema,
    candidate: &Record,
    skip: Option<usize>,
) -> Option<(String, String)> {
    for field in schema.fields.iter().filter(|f| f.unique) {
        let value = match candidate.get(field.name) {
            Some(v) if !v.is_null() => v,
            _ => continue,
        };
        let taken = records
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != skip)
            .any(|(_, r)| r.get(field.name) == Some(value));
        if taken {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return Some((field.name.to_string(), rendered));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaKind;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    async fn customers() -> CollectionManager {
        CollectionManager::open(
            "customers",
            SchemaKind::Customers.schema(),
            Box::new(MemoryStore::new()),
        )
        .await
        .unwrap()
    }

    async fn employees() -> CollectionManager {
        CollectionManager::open(
            "employees",
            SchemaKind::Employees.schema(),
            Box::new(MemoryStore::new()),
        )
        .await
        .unwrap()
    }

    fn body(value: serde_json::Value) -> Record {
        value.as_object().unwrap().clone()
    }

    fn vinod() -> Record {
        body(json!({
            "name": "Vinod",
            "email": "vinod@vinod.co",
            "phone": "9731424784"
        }))
    }

    #[tokio::test]
    async fn create_assigns_id_and_get_returns_equal_record() {
        let manager = customers().await;

        let created = manager.create(vinod()).await.unwrap();
        let id = created.get("id").unwrap().as_str().unwrap().to_string();

        let fetched = manager.get(&id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.get("name"), Some(&json!("Vinod")));
        // optional whitelisted fields come back as explicit nulls
        assert_eq!(fetched.get("city"), Some(&Value::Null));
    }

    #[tokio::test]
    async fn create_drops_fields_outside_the_whitelist() {
        let manager = customers().await;
        let mut candidate = vinod();
        candidate.insert("id".to_string(), json!("attacker-chosen"));
        candidate.insert("admin".to_string(), json!(true));

        let created = manager.create(candidate).await.unwrap();
        assert_ne!(created.get("id"), Some(&json!("attacker-chosen")));
        assert!(created.get("admin").is_none());
    }

    #[tokio::test]
    async fn create_reports_all_missing_fields_at_once() {
        let manager = customers().await;

        let err = manager
            .create(body(json!({"name": "Vinod"})))
            .await
            .unwrap_err();
        match err {
            CollectionError::Validation(message) => {
                assert_eq!(message, "missing fields: email, phone");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_rejects_bad_email_before_uniqueness() {
        let manager = customers().await;
        let mut candidate = vinod();
        candidate.insert("email".to_string(), json!("not-an-email"));

        let err = manager.create(candidate).await.unwrap_err();
        assert!(matches!(err, CollectionError::Validation(_)));
    }

    #[tokio::test]
    async fn duplicate_email_conflicts_and_size_grows_by_one() {
        let manager = customers().await;
        manager.create(vinod()).await.unwrap();

        let mut second = vinod();
        second.insert("phone".to_string(), json!("9000000000"));
        let err = manager.create(second).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "email already exists - vinod@vinod.co"
        );
        assert_eq!(manager.count().await, 1);
    }

    #[tokio::test]
    async fn duplicate_phone_conflicts() {
        let manager = customers().await;
        manager.create(vinod()).await.unwrap();

        let mut second = vinod();
        second.insert("email".to_string(), json!("other@vinod.co"));
        let err = manager.create(second).await.unwrap_err();

        assert_eq!(err.to_string(), "phone already exists - 9731424784");
    }

    #[tokio::test]
    async fn serial_ids_increase_and_survive_reload() {
        let seed = vec![
            body(json!({"id": 1, "name": "a", "salary": 1})),
            body(json!({"id": 7, "name": "b", "salary": 2})),
        ];
        let manager = CollectionManager::open(
            "employees",
            SchemaKind::Employees.schema(),
            Box::new(MemoryStore::seeded(seed)),
        )
        .await
        .unwrap();

        let created = manager
            .create(body(json!({"name": "c", "salary": 3})))
            .await
            .unwrap();
        assert_eq!(created.get("id"), Some(&json!(8)));
    }

    #[tokio::test]
    async fn deleted_serial_ids_are_not_reused() {
        let manager = employees().await;
        let first = manager
            .create(body(json!({"name": "a", "salary": 1})))
            .await
            .unwrap();
        let id = first.get("id").unwrap().to_string();

        manager.delete(&id).await.unwrap();
        let second = manager
            .create(body(json!({"name": "b", "salary": 2})))
            .await
            .unwrap();

        assert_eq!(second.get("id"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn list_paginates_and_out_of_range_is_empty() {
        let manager = employees().await;
        for i in 0..15 {
            manager
                .create(body(json!({"name": format!("e{i}"), "salary": i})))
                .await
                .unwrap();
        }

        let page2 = manager.list(2, 10).await;
        assert_eq!(page2.len(), 5);
        assert_eq!(page2[0].get("name"), Some(&json!("e10")));
        assert_eq!(page2[4].get("name"), Some(&json!("e14")));

        assert!(manager.list(3, 10).await.is_empty());
    }

    #[tokio::test]
    async fn update_clears_absent_fields() {
        let manager = employees().await;
        let created = manager
            .create(body(json!({
                "name": "John",
                "salary": 50000,
                "department": "R&D"
            })))
            .await
            .unwrap();
        let id = created.get("id").unwrap().to_string();

        let updated = manager
            .update(&id, body(json!({"name": "John", "salary": 60000})))
            .await
            .unwrap();

        assert_eq!(updated.get("salary"), Some(&json!(60000)));
        assert_eq!(updated.get("department"), Some(&Value::Null));
        assert_eq!(updated.get("id"), created.get("id"));
    }

    #[tokio::test]
    async fn patch_with_null_leaves_field_unchanged() {
        let manager = employees().await;
        let created = manager
            .create(body(json!({
                "name": "John",
                "salary": 50000,
                "department": "R&D"
            })))
            .await
            .unwrap();
        let id = created.get("id").unwrap().to_string();

        let patched = manager
            .patch(&id, body(json!({"department": null, "salary": 55000})))
            .await
            .unwrap();

        assert_eq!(patched.get("department"), Some(&json!("R&D")));
        assert_eq!(patched.get("salary"), Some(&json!(55000)));
    }

    #[tokio::test]
    async fn update_rejects_value_taken_by_another_record() {
        let manager = customers().await;
        manager.create(vinod()).await.unwrap();
        let other = manager
            .create(body(json!({
                "name": "John",
                "email": "john@example.com",
                "phone": "9812345678"
            })))
            .await
            .unwrap();
        let id = other.get("id").unwrap().as_str().unwrap().to_string();

        let err = manager
            .update(
                &id,
                body(json!({
                    "name": "John",
                    "email": "vinod@vinod.co",
                    "phone": "9812345678"
                })),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CollectionError::Conflict { .. }));
    }

    #[tokio::test]
    async fn update_accepts_own_unique_values() {
        let manager = customers().await;
        let created = manager.create(vinod()).await.unwrap();
        let id = created.get("id").unwrap().as_str().unwrap().to_string();

        let updated = manager.update(&id, vinod()).await.unwrap();
        assert_eq!(updated.get("email"), Some(&json!("vinod@vinod.co")));
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found_and_delete_twice_fails() {
        let manager = customers().await;
        let created = manager.create(vinod()).await.unwrap();
        let id = created.get("id").unwrap().as_str().unwrap().to_string();

        manager.delete(&id).await.unwrap();
        assert!(matches!(
            manager.get(&id).await,
            Err(CollectionError::NotFound { .. })
        ));
        assert!(matches!(
            manager.delete(&id).await,
            Err(CollectionError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn unparseable_serial_id_is_not_found() {
        let manager = employees().await;
        let err = manager.get("not-a-number").await.unwrap_err();
        assert!(matches!(err, CollectionError::NotFound { .. }));
    }

    #[tokio::test]
    async fn update_preserves_the_attachment() {
        let manager = customers().await;
        let created = manager.create(vinod()).await.unwrap();
        let id = created.get("id").unwrap().as_str().unwrap().to_string();

        manager
            .set_attachment(&id, Some("abc123.png".to_string()))
            .await
            .unwrap();
        manager.update(&id, vinod()).await.unwrap();

        assert_eq!(
            manager.attachment(&id).await.unwrap(),
            Some("abc123.png".to_string())
        );
    }

    #[tokio::test]
    async fn replacing_an_attachment_returns_the_previous_name() {
        let manager = customers().await;
        let created = manager.create(vinod()).await.unwrap();
        let id = created.get("id").unwrap().as_str().unwrap().to_string();

        assert_eq!(
            manager
                .set_attachment(&id, Some("first.png".to_string()))
                .await
                .unwrap(),
            None
        );
        assert_eq!(
            manager
                .set_attachment(&id, Some("second.png".to_string()))
                .await
                .unwrap(),
            Some("first.png".to_string())
        );
    }

    #[tokio::test]
    async fn concurrent_creates_are_both_kept() {
        let manager = std::sync::Arc::new(employees().await);

        let a = manager.clone();
        let b = manager.clone();
        let (ra, rb) = tokio::join!(
            a.create(body(json!({"name": "a", "salary": 1}))),
            b.create(body(json!({"name": "b", "salary": 2})))
        );
        ra.unwrap();
        rb.unwrap();

        assert_eq!(manager.count().await, 2);
    }
}
