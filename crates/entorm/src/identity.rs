//! Identity map: one live instance per (entity type, primary key).

use crate::entity::{DefaultKeyPolicy, Entity, PrimaryKey, PrimaryKeyPolicy};
use crate::error::{OrmError, OrmResult};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared handle to a live entity.
///
/// Every holder of a handle for the same (type, key) sees the same instance.
#[derive(Debug, Clone)]
pub struct EntityRef(Arc<Mutex<Entity>>);

impl EntityRef {
    /// Wrap an entity.
    pub fn new(entity: Entity) -> Self {
        Self(Arc::new(Mutex::new(entity)))
    }

    /// Lock the entity for reading or writing.
    pub fn lock(&self) -> MutexGuard<'_, Entity> {
        self.0.lock().expect("entity mutex poisoned")
    }

    /// Whether two handles point to the same instance.
    pub fn ptr_eq(&self, other: &EntityRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Copy of the entity as it is now.
    pub fn snapshot(&self) -> Entity {
        self.lock().clone()
    }
}

impl From<Entity> for EntityRef {
    fn from(entity: Entity) -> Self {
        Self::new(entity)
    }
}

/// Cache of live entities keyed by type name and primary key.
///
/// Entries are never evicted on their own; use [`IdentityMap::remove`] or
/// [`IdentityMap::clear`] to end an instance's lifecycle.
pub struct IdentityMap {
    entries: HashMap<(String, PrimaryKey), EntityRef>,
    policy: Arc<dyn PrimaryKeyPolicy>,
}

impl Default for IdentityMap {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for IdentityMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityMap")
            .field("len", &self.entries.len())
            .finish()
    }
}

impl IdentityMap {
    /// Create an empty map using [`DefaultKeyPolicy`].
    pub fn new() -> Self {
        Self::with_policy(Arc::new(DefaultKeyPolicy))
    }

    /// Create an empty map with a custom key policy.
    pub fn with_policy(policy: Arc<dyn PrimaryKeyPolicy>) -> Self {
        Self {
            entries: HashMap::new(),
            policy,
        }
    }

    /// The key policy in use.
    pub fn policy(&self) -> &Arc<dyn PrimaryKeyPolicy> {
        &self.policy
    }

    /// Register an entity or merge it into the existing instance.
    ///
    /// If the key is complete and an instance already exists, the argument's
    /// original data is merged into it (keeping local edits) and the existing
    /// handle is returned. Otherwise the argument is registered (complete
    /// key) or passed through untouched (incomplete key).
    pub fn map(&mut self, entity: impl Into<EntityRef>) -> EntityRef {
        let entity = entity.into();
        let (name, key, original) = {
            let guard = entity.lock();
            let key = match guard.key_with(self.policy.as_ref()) {
                Ok(key) => key,
                Err(_) => return entity.clone(),
            };
            (guard.name().to_string(), key, guard.original_data().clone())
        };

        match self.entries.get(&(name.clone(), key.clone())) {
            Some(existing) if existing.ptr_eq(&entity) => existing.clone(),
            Some(existing) => {
                tracing::trace!(target: "entorm.identity", entity = %name, key = %key, "merge");
                existing.lock().merge_fetched(original);
                existing.clone()
            }
            None => {
                tracing::trace!(target: "entorm.identity", entity = %name, key = %key, "register");
                self.entries.insert((name, key), entity.clone());
                entity
            }
        }
    }

    /// Register `entity` under its key.
    ///
    /// Registering the same instance again is a no-op. Fails with
    /// `IdentityConflict` when a different instance holds the key, and with
    /// `IncompletePrimaryKey` when the key cannot be built.
    pub fn register(&mut self, entity: &EntityRef) -> OrmResult<()> {
        let (name, key) = {
            let guard = entity.lock();
            (guard.name().to_string(), guard.key_with(self.policy.as_ref())?)
        };
        match self.entries.entry((name, key)) {
            Entry::Occupied(slot) if slot.get().ptr_eq(entity) => Ok(()),
            Entry::Occupied(slot) => {
                let (name, key) = slot.key();
                Err(OrmError::identity_conflict(format!(
                    "another {name} instance is mapped under key {key}"
                )))
            }
            Entry::Vacant(slot) => {
                let (name, key) = slot.key();
                tracing::trace!(target: "entorm.identity", entity = %name, key = %key, "register");
                slot.insert(entity.clone());
                Ok(())
            }
        }
    }

    /// Cached instance for a key, if any. Never touches storage.
    pub fn fetch_by_key(&self, entity: &str, key: &PrimaryKey) -> Option<EntityRef> {
        self.entries
            .get(&(entity.to_string(), key.clone()))
            .cloned()
    }

    /// Key of an entity under this map's policy.
    pub fn key_of(&self, entity: &Entity) -> OrmResult<PrimaryKey> {
        entity.key_with(self.policy.as_ref())
    }

    /// Forget an instance.
    pub fn remove(&mut self, entity: &str, key: &PrimaryKey) -> Option<EntityRef> {
        self.entries.remove(&(entity.to_string(), key.clone()))
    }

    /// Number of registered instances.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no instance is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget every instance.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityDef;
    use crate::value::Value;

    fn def() -> Arc<EntityDef> {
        Arc::new(EntityDef::new("ContactPhone", "contact_phone"))
    }

    #[test]
    fn second_map_returns_first_instance() {
        let mut map = IdentityMap::new();
        let first = map.map(Entity::from_data(def(), [("id", Value::Int(42))]));
        let second = map.map(Entity::from_data(def(), [("id", Value::from("42"))]));
        assert!(first.ptr_eq(&second));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn merge_updates_original_and_keeps_edits() {
        let mut map = IdentityMap::new();
        let live = map.map(Entity::from_data(
            def(),
            [("id", Value::Int(42)), ("number", "+1".into()), ("name", "mobile".into())],
        ));
        live.lock().set("number", "+2");

        map.map(Entity::from_data(
            def(),
            [("id", Value::Int(42)), ("number", "+3".into()), ("name", "home".into())],
        ));

        let entity = live.lock();
        assert_eq!(entity.get("number").unwrap(), Value::from("+2"));
        assert_eq!(entity.get("name").unwrap(), Value::from("home"));
        assert_eq!(entity.original("number").unwrap(), Value::from("+3"));
        assert!(entity.is_dirty_field("number"));
        assert!(!entity.is_dirty_field("name"));
    }

    #[test]
    fn register_refuses_a_second_instance() {
        let mut map = IdentityMap::new();
        let live = map.map(Entity::from_data(def(), [("id", 42)]));
        map.register(&live).unwrap();

        let other = EntityRef::from(Entity::from_data(def(), [("id", 42)]));
        assert!(map.register(&other).unwrap_err().is_identity_conflict());

        let key = PrimaryKey::from_values("ContactPhone", [&Value::Int(42)]).unwrap();
        assert!(map.fetch_by_key("ContactPhone", &key).unwrap().ptr_eq(&live));
    }

    #[test]
    fn incomplete_key_passes_through() {
        let mut map = IdentityMap::new();
        let fresh = Entity::new(def());
        let mapped = map.map(fresh);
        assert!(map.is_empty());
        assert!(mapped.lock().data().is_empty());
    }

    #[test]
    fn fetch_and_remove() {
        let mut map = IdentityMap::new();
        let live = map.map(Entity::from_data(def(), [("id", 7)]));
        let key = PrimaryKey::from_values("ContactPhone", [&Value::Int(7)]).unwrap();
        assert!(map.fetch_by_key("ContactPhone", &key).unwrap().ptr_eq(&live));
        assert!(map.fetch_by_key("Other", &key).is_none());
        map.remove("ContactPhone", &key);
        assert!(map.fetch_by_key("ContactPhone", &key).is_none());
    }
}
