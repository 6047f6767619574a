//! Entities: definitions, tracked data and lifecycle hooks.
//!
//! An [`Entity`] is a key-value store over one row. Field names are
//! translated to storage column names by the owning [`EntityDef`] before they
//! reach the [`Snapshot`], so `entity.set("someVar", ..)` and a fetched row
//! column `some_var` address the same slot.
//!
//! ```ignore
//! use entorm::{Entity, EntityType};
//!
//! #[derive(Entity)]
//! #[orm(table = "contact_phone")]
//! struct ContactPhone;
//!
//! let mut phone = ContactPhone::create();
//! phone.set("number", "+49 151 1234");
//! assert!(phone.is_dirty_field("number"));
//! ```

mod key;
mod snapshot;

pub use key::{DefaultKeyPolicy, PrimaryKey, PrimaryKeyPolicy};
pub use snapshot::{FieldChange, Snapshot};

use crate::error::{OrmError, OrmResult};
use crate::naming::NamingScheme;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Static description of an entity type.
#[derive(Clone)]
pub struct EntityDef {
    /// Stable type identifier used in `Name::field` references.
    pub name: String,
    /// Storage table.
    pub table: String,
    /// Primary key field names.
    pub primary_key: Vec<String>,
    /// Prefix prepended to every translated column name.
    pub column_prefix: Option<String>,
    /// Explicit field to column mapping, bypassing naming and prefix.
    pub column_aliases: BTreeMap<String, String>,
    /// Naming scheme translating field names to column names.
    pub naming: NamingScheme,
    /// Whether storage generates the primary key on insert.
    pub auto_increment: bool,
    /// Lifecycle hooks.
    pub hooks: Option<Arc<dyn EntityHooks>>,
}

impl fmt::Debug for EntityDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityDef")
            .field("name", &self.name)
            .field("table", &self.table)
            .field("primary_key", &self.primary_key)
            .field("column_prefix", &self.column_prefix)
            .field("column_aliases", &self.column_aliases)
            .field("naming", &self.naming)
            .field("auto_increment", &self.auto_increment)
            .field("hooks", &self.hooks.is_some())
            .finish()
    }
}

impl EntityDef {
    /// Create a definition with an auto-increment `id` key.
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            primary_key: vec!["id".to_string()],
            column_prefix: None,
            column_aliases: BTreeMap::new(),
            naming: NamingScheme::default(),
            auto_increment: true,
            hooks: None,
        }
    }

    /// Set the primary key fields.
    pub fn primary_key<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Set the column prefix.
    pub fn column_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.column_prefix = Some(prefix.into());
        self
    }

    /// Map a field to an explicit column name.
    pub fn column_alias(mut self, field: impl Into<String>, column: impl Into<String>) -> Self {
        self.column_aliases.insert(field.into(), column.into());
        self
    }

    /// Set the naming scheme for columns.
    pub fn naming(mut self, naming: NamingScheme) -> Self {
        self.naming = naming;
        self
    }

    /// Set whether the key is generated by storage.
    pub fn auto_increment(mut self, auto_increment: bool) -> Self {
        self.auto_increment = auto_increment;
        self
    }

    /// Attach lifecycle hooks.
    pub fn hooks(mut self, hooks: impl EntityHooks + 'static) -> Self {
        self.hooks = Some(Arc::new(hooks));
        self
    }

    /// Storage column name for a field.
    pub fn column_name(&self, field: &str) -> String {
        if let Some(column) = self.column_aliases.get(field) {
            return column.clone();
        }
        let name = self.naming.apply(field);
        match &self.column_prefix {
            Some(prefix) if !name.starts_with(prefix.as_str()) => format!("{prefix}{name}"),
            _ => name,
        }
    }
}

/// Compile-time binding between a Rust type and its [`EntityDef`].
///
/// Usually derived with `#[derive(Entity)]`.
pub trait EntityType: 'static {
    /// Stable type identifier.
    const NAME: &'static str;

    /// Build the definition.
    fn definition() -> EntityDef;

    /// A `Name::field` reference usable in conditions of entity-bound
    /// builders.
    fn field(field: &str) -> String {
        format!("{}::{}", Self::NAME, field)
    }

    /// Create an empty entity of this type.
    fn create() -> Entity {
        Entity::new(Arc::new(Self::definition()))
    }

    /// Create an entity from initial column data.
    fn create_with<I, K, V>(data: I) -> Entity
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Entity::from_data(Arc::new(Self::definition()), data)
    }
}

/// Lifecycle callbacks for an entity type. Every method defaults to a no-op.
pub trait EntityHooks: Send + Sync {
    /// A field changed value through [`Entity::set`].
    fn on_change(&self, entity: &mut Entity, change: &FieldChange) {
        let _ = (entity, change);
    }

    /// Before an insert.
    fn pre_persist(&self, entity: &mut Entity) -> OrmResult<()> {
        let _ = entity;
        Ok(())
    }

    /// After an insert.
    fn post_persist(&self, entity: &mut Entity) -> OrmResult<()> {
        let _ = entity;
        Ok(())
    }

    /// Before an update.
    fn pre_update(&self, entity: &mut Entity) -> OrmResult<()> {
        let _ = entity;
        Ok(())
    }

    /// After an update.
    fn post_update(&self, entity: &mut Entity) -> OrmResult<()> {
        let _ = entity;
        Ok(())
    }
}

/// One entity instance with tracked data.
#[derive(Debug, Clone)]
pub struct Entity {
    def: Arc<EntityDef>,
    snapshot: Snapshot,
}

impl Entity {
    /// Create an entity without data.
    pub fn new(def: Arc<EntityDef>) -> Self {
        Self {
            def,
            snapshot: Snapshot::new(),
        }
    }

    /// Create an entity whose current and original data are `data`
    /// (column-keyed). It is not dirty afterwards.
    pub fn from_data<I, K, V>(def: Arc<EntityDef>, data: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let data = data
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            def,
            snapshot: Snapshot::from_data(data),
        }
    }

    /// The entity's definition.
    pub fn def(&self) -> &Arc<EntityDef> {
        &self.def
    }

    /// Type identifier.
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Tracked state.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Current value of a field.
    ///
    /// Fails with `UnknownField` if the field was never seen in either the
    /// current or the original data. A field only present in the original
    /// data reads as `Null`.
    pub fn get(&self, field: &str) -> OrmResult<Value> {
        let column = self.known_column(field)?;
        Ok(self.snapshot.get(&column).cloned().unwrap_or_default())
    }

    /// Original value of a field. Same failure rule as [`Entity::get`].
    pub fn original(&self, field: &str) -> OrmResult<Value> {
        let column = self.known_column(field)?;
        Ok(self.snapshot.get_original(&column).cloned().unwrap_or_default())
    }

    /// All current data, column-keyed.
    pub fn data(&self) -> &BTreeMap<String, Value> {
        self.snapshot.current()
    }

    /// All original data, column-keyed.
    pub fn original_data(&self) -> &BTreeMap<String, Value> {
        self.snapshot.original()
    }

    /// Assign a field. Returns whether the value changed; `on_change` fires
    /// only in that case.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> bool {
        let column = self.def.column_name(field);
        let Some(change) = self.snapshot.set(column, value.into()) else {
            return false;
        };
        if let Some(hooks) = self.def.hooks.clone() {
            hooks.on_change(self, &change);
        }
        true
    }

    /// Whether any field is dirty.
    pub fn is_dirty(&self) -> bool {
        self.snapshot.is_dirty()
    }

    /// Whether one field is dirty. Unknown fields are never dirty.
    pub fn is_dirty_field(&self, field: &str) -> bool {
        self.snapshot.is_dirty_column(&self.def.column_name(field))
    }

    /// Dirty columns.
    pub fn dirty_fields(&self) -> Vec<String> {
        self.snapshot.dirty_columns()
    }

    /// Current values of all dirty columns.
    pub fn changes(&self) -> BTreeMap<String, Value> {
        self.snapshot.changes()
    }

    /// Restore all fields to their original values.
    pub fn reset(&mut self) {
        self.snapshot.reset();
    }

    /// Restore one field, removing it if it has no original value.
    pub fn reset_field(&mut self, field: &str) {
        let column = self.def.column_name(field);
        self.snapshot.reset_column(&column);
    }

    /// Replace the original data (column-keyed); current data is untouched.
    pub fn set_original_data(&mut self, data: BTreeMap<String, Value>) {
        self.snapshot.set_original_data(data);
    }

    /// Merge a freshly fetched row, keeping local edits.
    pub fn merge_fetched(&mut self, row: BTreeMap<String, Value>) {
        self.snapshot.merge_fetched(row);
    }

    /// Write a storage column directly, without naming translation or hooks.
    pub(crate) fn set_column(&mut self, column: impl Into<String>, value: Value) {
        self.snapshot.set(column, value);
    }

    /// Primary key under the default policy.
    pub fn primary_key(&self) -> OrmResult<PrimaryKey> {
        self.key_with(&DefaultKeyPolicy)
    }

    /// Primary key under `policy`.
    pub fn key_with(&self, policy: &dyn PrimaryKeyPolicy) -> OrmResult<PrimaryKey> {
        policy.key_of(&self.def, self.snapshot.current())
    }

    /// Serializable state for caching.
    pub fn state(&self) -> EntityState {
        EntityState {
            entity: self.def.name.clone(),
            snapshot: self.snapshot.clone(),
        }
    }

    /// Restore an entity from cached state.
    pub fn from_state(def: Arc<EntityDef>, state: EntityState) -> OrmResult<Self> {
        if state.entity != def.name {
            return Err(OrmError::Serialization(format!(
                "state of {} cannot restore {}",
                state.entity, def.name
            )));
        }
        Ok(Self {
            def,
            snapshot: state.snapshot,
        })
    }

    /// Serialize the state to JSON.
    pub fn to_json(&self) -> OrmResult<String> {
        Ok(serde_json::to_string(&self.state())?)
    }

    /// Restore an entity from JSON produced by [`Entity::to_json`].
    pub fn from_json(def: Arc<EntityDef>, json: &str) -> OrmResult<Self> {
        let state: EntityState = serde_json::from_str(json)?;
        Self::from_state(def, state)
    }

    fn known_column(&self, field: &str) -> OrmResult<String> {
        let column = self.def.column_name(field);
        if self.snapshot.knows(&column) {
            Ok(column)
        } else {
            Err(OrmError::unknown_field(&self.def.name, field))
        }
    }
}

/// Cached form of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    /// Type identifier.
    pub entity: String,
    /// Tracked data.
    pub snapshot: Snapshot,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn studly() -> Arc<EntityDef> {
        Arc::new(EntityDef::new("StudlyCaps", "studly_caps"))
    }

    #[test]
    fn column_names() {
        let def = EntityDef::new("StaticTableName", "my_table")
            .column_prefix("stn_")
            .column_alias("legacy", "LEGACY_COL");
        assert_eq!(def.column_name("id"), "stn_id");
        assert_eq!(def.column_name("stn_id"), "stn_id");
        assert_eq!(def.column_name("someVar"), "stn_some_var");
        assert_eq!(def.column_name("legacy"), "LEGACY_COL");
    }

    #[test]
    fn field_names_are_translated() {
        let mut entity = Entity::from_data(studly(), [("id", Value::Int(42)), ("some_var", "foobar".into())]);
        assert_eq!(entity.get("someVar").unwrap(), Value::from("foobar"));
        assert!(!entity.is_dirty());

        entity.set("someVar", "foobaz");
        entity.set("newVar", "foobar");
        assert!(entity.is_dirty_field("someVar"));
        assert!(entity.is_dirty_field("newVar"));
        assert!(!entity.is_dirty_field("id"));
        assert!(!entity.is_dirty_field("nonExistingVar"));
    }

    #[test]
    fn unknown_field_fails() {
        let entity = Entity::new(studly());
        let err = entity.get("nope").unwrap_err();
        assert!(err.is_unknown_field());
        assert!(entity.original("nope").is_err());
    }

    #[test]
    fn field_only_in_original_reads_null() {
        let mut entity = Entity::from_data(studly(), [("id", Value::Int(1))]);
        entity.set_original_data(BTreeMap::from([
            ("id".to_string(), Value::Int(1)),
            ("gone".to_string(), Value::from("x")),
        ]));
        assert_eq!(entity.get("gone").unwrap(), Value::Null);
        assert_eq!(entity.original("gone").unwrap(), Value::from("x"));
        assert!(entity.is_dirty());
        assert!(entity.is_dirty_field("gone"));
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl EntityHooks for Arc<Recorder> {
        fn on_change(&self, _entity: &mut Entity, change: &FieldChange) {
            self.0.lock().expect("recorder poisoned").push(change.column.clone());
        }
    }

    #[test]
    fn on_change_fires_only_on_change() {
        let recorder = Arc::new(Recorder::default());
        let def = Arc::new(EntityDef::new("StudlyCaps", "studly_caps").hooks(recorder.clone()));
        let mut entity = Entity::from_data(def, [("some_var", "foobar")]);

        assert!(!entity.set("someVar", "foobar"));
        assert!(entity.set("someVar", "foobaz"));
        assert_eq!(*recorder.0.lock().unwrap(), vec!["some_var".to_string()]);
    }

    #[test]
    fn state_round_trip() {
        let mut entity = Entity::from_data(studly(), [("id", Value::Int(1))]);
        entity.set("name", "changed");
        let json = entity.to_json().unwrap();
        let restored = Entity::from_json(studly(), &json).unwrap();
        assert!(restored.is_dirty_field("name"));
        assert_eq!(restored.get("id").unwrap(), Value::Int(1));

        let other = Arc::new(EntityDef::new("Other", "other"));
        assert!(Entity::from_json(other, &json).is_err());
    }
}
