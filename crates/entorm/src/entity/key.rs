//! Primary keys and the policy deciding when a key is complete.

use super::EntityDef;
use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A fully specified primary key.
///
/// Each part is stored in canonical text form so `Int(1)` and `Text("1")`
/// address the same row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimaryKey(Vec<String>);

impl PrimaryKey {
    /// Build a key from values. Fails if any part is NULL, a list or raw SQL.
    pub fn from_values<'a>(
        entity: &str,
        values: impl IntoIterator<Item = &'a Value>,
    ) -> OrmResult<Self> {
        let mut parts = Vec::new();
        for value in values {
            match value.key_text() {
                Some(text) => parts.push(text),
                None => {
                    return Err(OrmError::incomplete_key(format!(
                        "{entity}: key part {} is not a scalar value",
                        parts.len()
                    )));
                }
            }
        }
        if parts.is_empty() {
            return Err(OrmError::incomplete_key(format!(
                "{entity}: no primary key fields"
            )));
        }
        Ok(Self(parts))
    }

    /// Key parts in key field order.
    pub fn parts(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(","))
    }
}

/// Decides which columns form the primary key and whether a key is complete.
pub trait PrimaryKeyPolicy: Send + Sync {
    /// Storage columns forming the key of `def`.
    fn key_columns(&self, def: &EntityDef) -> Vec<String>;

    /// Extract the key from column data, failing with `IncompletePrimaryKey`
    /// if any key column is absent or NULL.
    fn key_of(&self, def: &EntityDef, data: &BTreeMap<String, Value>) -> OrmResult<PrimaryKey> {
        let columns = self.key_columns(def);
        let mut values = Vec::with_capacity(columns.len());
        for column in &columns {
            match data.get(column) {
                Some(value) if !value.is_null() => values.push(value),
                _ => {
                    return Err(OrmError::incomplete_key(format!(
                        "{}: missing value for {column}",
                        def.name
                    )));
                }
            }
        }
        PrimaryKey::from_values(&def.name, values)
    }

    /// Build a key from caller-supplied values (one per key column).
    fn key_from(&self, def: &EntityDef, values: &[Value]) -> OrmResult<PrimaryKey> {
        let expected = self.key_columns(def).len();
        if values.len() != expected {
            return Err(OrmError::incomplete_key(format!(
                "{}: expected {expected} key values, got {}",
                def.name,
                values.len()
            )));
        }
        PrimaryKey::from_values(&def.name, values)
    }
}

/// Key columns come from the entity definition's primary key fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultKeyPolicy;

impl PrimaryKeyPolicy for DefaultKeyPolicy {
    fn key_columns(&self, def: &EntityDef) -> Vec<String> {
        def.primary_key
            .iter()
            .map(|field| def.column_name(field))
            .collect()
    }
}
