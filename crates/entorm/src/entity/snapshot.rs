//! Current vs. original field state of one entity.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A field assignment that actually changed the current value.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    /// Column name of the changed field.
    pub column: String,
    /// Previous current value (`None` if the field was absent).
    pub old: Option<Value>,
    /// New current value.
    pub new: Value,
}

/// Tracks the `current` and `original` data of an entity, keyed by column
/// name.
///
/// `original` is what storage last reported; `current` is what the
/// application sees. A column is dirty when its value (or presence) differs
/// between the two maps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    current: BTreeMap<String, Value>,
    original: BTreeMap<String, Value>,
}

impl Snapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a snapshot whose current and original data are both `data`.
    pub fn from_data(data: BTreeMap<String, Value>) -> Self {
        Self {
            current: data.clone(),
            original: data,
        }
    }

    /// Current data.
    pub fn current(&self) -> &BTreeMap<String, Value> {
        &self.current
    }

    /// Original data.
    pub fn original(&self) -> &BTreeMap<String, Value> {
        &self.original
    }

    /// Whether the column was seen in either map.
    pub fn knows(&self, column: &str) -> bool {
        self.current.contains_key(column) || self.original.contains_key(column)
    }

    /// Current value of a column.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.current.get(column)
    }

    /// Original value of a column.
    pub fn get_original(&self, column: &str) -> Option<&Value> {
        self.original.get(column)
    }

    /// Write `value` to `current`.
    ///
    /// Returns the change when the value differs from the prior current value
    /// (absent to present counts as a change), `None` otherwise. Values are
    /// compared with [`Value::same_as`].
    pub fn set(&mut self, column: impl Into<String>, value: Value) -> Option<FieldChange> {
        let column = column.into();
        if self.current.get(&column).is_some_and(|old| old.same_as(&value)) {
            return None;
        }
        let old = self.current.insert(column.clone(), value.clone());
        Some(FieldChange {
            column,
            old,
            new: value,
        })
    }

    /// Whether any column of either map is dirty.
    pub fn is_dirty(&self) -> bool {
        self.columns().any(|column| self.is_dirty_column(column))
    }

    /// Whether one column differs in value or presence between `current`
    /// and `original`.
    pub fn is_dirty_column(&self, column: &str) -> bool {
        match (self.current.get(column), self.original.get(column)) {
            (Some(current), Some(original)) => !current.same_as(original),
            (None, None) => false,
            _ => true,
        }
    }

    /// Columns that differ.
    pub fn dirty_columns(&self) -> Vec<String> {
        self.columns()
            .filter(|column| self.is_dirty_column(column))
            .cloned()
            .collect()
    }

    /// Minimal diff: the current value of every dirty column.
    ///
    /// Columns missing from `current` have nothing to write and are left out.
    pub fn changes(&self) -> BTreeMap<String, Value> {
        self.current
            .iter()
            .filter(|(column, _)| self.is_dirty_column(column))
            .map(|(column, value)| (column.clone(), value.clone()))
            .collect()
    }

    /// Overwrite all of `current` with `original`.
    pub fn reset(&mut self) {
        self.current = self.original.clone();
    }

    /// Overwrite one column with its original value, or remove it from
    /// `current` if it has no original value.
    pub fn reset_column(&mut self, column: &str) {
        match self.original.get(column) {
            Some(value) => {
                self.current.insert(column.to_string(), value.clone());
            }
            None => {
                self.current.remove(column);
            }
        }
    }

    /// Replace `original` wholesale; `current` is untouched.
    pub fn set_original_data(&mut self, data: BTreeMap<String, Value>) {
        self.original = data;
    }

    /// Merge a freshly fetched row.
    ///
    /// Columns edited locally (current differs from the old original) keep
    /// their current value. Every other column present in `row` takes the row
    /// value. Columns missing from `row` stay in `current`. Finally `row`
    /// becomes the new original.
    pub fn merge_fetched(&mut self, row: BTreeMap<String, Value>) {
        for (column, value) in &row {
            if !self.is_edited(column) {
                self.current.insert(column.clone(), value.clone());
            }
        }
        self.original = row;
    }

    /// Columns of `current`, then those only in `original`.
    fn columns(&self) -> impl Iterator<Item = &String> {
        self.current
            .keys()
            .chain(self.original.keys().filter(move |c| !self.current.contains_key(*c)))
    }

    /// Whether `current` holds a value for the column that storage does not.
    fn is_edited(&self, column: &str) -> bool {
        self.current.contains_key(column) && self.is_dirty_column(column)
    }
}
