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

//! Statically declared record schemas.
//!
//! A [`Schema`] names the fields a collection accepts, which of them are
//! required on creation, which must be unique across the collection, and how
//! record identities are generated. Untrusted request bodies never reach a
//! store directly: they are projected onto the schema's field whitelist first,
//! so client-supplied `id` values and unexpected fields are dropped.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entity instance as a field-name to scalar-value mapping.
pub type Record = Map<String, Value>;

/// Reserved record key holding the stored filename of a photo attachment.
/// Not part of any field whitelist, so clients can never set it directly.
pub const ATTACHMENT_FIELD: &str = "photo_filename";

/// Scalar type accepted for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
}

/// Syntactic format constraint checked on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldFormat {
    Email,
}

/// Declaration of a single record field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Must be present and non-null on creation.
    pub required: bool,
    /// No two records in a collection may share a value for this field.
    pub unique: bool,
    pub format: Option<FieldFormat>,
}

impl FieldSpec {
    const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
            required: false,
            unique: false,
            format: None,
        }
    }

    const fn number(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Number,
            required: false,
            unique: false,
            format: None,
        }
    }

    const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    const fn email(mut self) -> Self {
        self.format = Some(FieldFormat::Email);
        self
    }
}

/// How record identities are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    /// Monotonically increasing integer, `1 + max(existing ids)`, never reused.
    Serial,
    /// Random 128-bit opaque token (UUID v4).
    Uuid,
}

/// Static description of one collection's record shape.
#[derive(Debug, Clone)]
pub struct Schema {
    /// Singular noun used in messages and text rendering ("customer").
    pub entity: &'static str,
    pub id_kind: IdKind,
    pub fields: Vec<FieldSpec>,
    /// Whether records may own a side-stored photo attachment.
    pub attachments: bool,
}

/// Builtin schema selector, referenced by name from the server configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SchemaKind {
    Customers,
    Employees,
    Books,
    Products,
}

impl SchemaKind {
    /// Resolve the selector to its compiled-in schema.
    pub fn schema(self) -> Schema {
        match self {
            SchemaKind::Customers => Schema {
                entity: "customer",
                id_kind: IdKind::Uuid,
                fields: vec![
                    FieldSpec::text("name").required(),
                    FieldSpec::text("gender"),
                    FieldSpec::text("email").required().unique().email(),
                    FieldSpec::text("phone").required().unique(),
                    FieldSpec::text("address"),
                    FieldSpec::text("city"),
                    FieldSpec::text("country"),
                ],
                attachments: true,
            },
            SchemaKind::Employees => Schema {
                entity: "employee",
                id_kind: IdKind::Serial,
                fields: vec![
                    FieldSpec::text("name").required(),
                    FieldSpec::text("department"),
                    FieldSpec::number("salary").required(),
                    FieldSpec::text("job_title"),
                ],
                attachments: false,
            },
            SchemaKind::Books => Schema {
                entity: "book",
                id_kind: IdKind::Serial,
                fields: vec![
                    FieldSpec::text("title").required(),
                    FieldSpec::text("author"),
                    FieldSpec::text("publisher"),
                    FieldSpec::number("price"),
                ],
                attachments: false,
            },
            SchemaKind::Products => Schema {
                entity: "product",
                id_kind: IdKind::Serial,
                fields: vec![
                    FieldSpec::text("name").required(),
                    FieldSpec::number("price").required(),
                    FieldSpec::text("category"),
                ],
                attachments: false,
            },
        }
    }
}

impl Schema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Required fields absent or null in `body`, in declaration order.
    pub fn missing_required(&self, body: &Record) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .filter(|f| body.get(f.name).map_or(true, Value::is_null))
            .map(|f| f.name)
            .collect()
    }

    /// Project `body` onto the declared field whitelist.
    ///
    /// Every declared field appears in the result; fields absent from `body`
    /// come out as null. Undeclared fields (including `id`) are dropped.
    pub fn project(&self, body: &Record) -> Record {
        let mut record = Record::new();
        for field in &self.fields {
            let value = body.get(field.name).cloned().unwrap_or(Value::Null);
            record.insert(field.name.to_string(), value);
        }
        record
    }

    /// Check declared kinds and formats for every non-null field in `body`.
    ///
    /// Returns the first offending field with a human-readable reason.
    pub fn check_formats(&self, body: &Record) -> Result<(), (String, String)> {
        for field in &self.fields {
            let value = match body.get(field.name) {
                Some(v) if !v.is_null() => v,
                _ => continue,
            };
            match field.kind {
                FieldKind::Text if !value.is_string() => {
                    return Err((field.name.to_string(), "must be a string".to_string()));
                }
                FieldKind::Number if !value.is_number() => {
                    return Err((field.name.to_string(), "must be a number".to_string()));
                }
                _ => {}
            }
            if let (Some(FieldFormat::Email), Some(s)) = (field.format, value.as_str()) {
                if let Err(reason) = validate_email(s) {
                    return Err((field.name.to_string(), reason.to_string()));
                }
            }
        }
        Ok(())
    }

    /// Parse a path segment into an id value of this schema's identity kind.
    ///
    /// Returns `None` when the segment cannot be an id of this collection,
    /// which callers treat as "not found" (the id space is not dense).
    pub fn parse_id(&self, raw: &str) -> Option<Value> {
        match self.id_kind {
            IdKind::Serial => raw.parse::<i64>().ok().map(Value::from),
            IdKind::Uuid => {
                if raw.is_empty() {
                    None
                } else {
                    Some(Value::String(raw.to_string()))
                }
            }
        }
    }

    /// Generate a fresh identity. `next_serial` is the collection's counter
    /// value and is only consulted for [`IdKind::Serial`] schemas.
    pub fn generate_id(&self, next_serial: i64) -> Value {
        match self.id_kind {
            IdKind::Serial => Value::from(next_serial),
            IdKind::Uuid => Value::String(uuid::Uuid::new_v4().to_string()),
        }
    }

    /// Render a record as a single text line, `Entity(field=value, ...)`,
    /// with fields in declaration order and the id first.
    pub fn render_text(&self, record: &Record) -> String {
        let mut parts = Vec::with_capacity(self.fields.len() + 1);
        let id = record.get("id").cloned().unwrap_or(Value::Null);
        parts.push(format!("id={}", scalar_to_text(&id)));
        for field in &self.fields {
            let value = record.get(field.name).cloned().unwrap_or(Value::Null);
            parts.push(format!("{}={}", field.name, scalar_to_text(&value)));
        }
        let entity = capitalize(self.entity);
        format!("{}({})", entity, parts.join(", "))
    }
}

fn scalar_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Syntactic email validation.
///
/// Covers the checks the API relies on (single `@`, non-empty local part,
/// dotted domain, no whitespace). Deliverability is a network concern and is
/// not checked here.
pub fn validate_email(address: &str) -> Result<(), &'static str> {
    if address.chars().any(char::is_whitespace) {
        return Err("email address must not contain whitespace");
    }
    let mut parts = address.splitn(2, '@');
    let local = parts.next().unwrap_or_default();
    let domain = match parts.next() {
        Some(d) => d,
        None => return Err("email address must contain an @-sign"),
    };
    if local.is_empty() {
        return Err("email address has an empty local part");
    }
    if domain.contains('@') {
        return Err("email address must contain exactly one @-sign");
    }
    if domain.is_empty() || !domain.contains('.') {
        return Err("email address domain is not valid");
    }
    if domain.starts_with('.') || domain.ends_with('.') || domain.contains("..") {
        return Err("email address domain is not valid");
    }
    Ok(())
}
