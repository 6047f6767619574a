//! Session: executor, identity map and the save workflow.

use crate::client::StatementExecutor;
use crate::config::SessionConfig;
use crate::entity::{Entity, EntityDef, EntityHooks, EntityType, PrimaryKeyPolicy};
use crate::error::{OrmError, OrmResult};
use crate::fetcher::EntityFetcher;
use crate::identity::{EntityRef, IdentityMap};
use crate::qb::{Conditions, DeleteQb, InsertQb, UpdateQb};
use crate::row::Row;
use crate::value::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// What [`Session::save`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The entity was not persisted yet and got inserted.
    Inserted,
    /// The entity differed from storage and got updated.
    Updated,
    /// Storage already matched the entity.
    Unchanged,
}

/// Statement kind, logged with every executed statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Other,
}

impl StatementKind {
    fn detect(sql: &str) -> Self {
        let keyword = sql
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_uppercase();
        match keyword.as_str() {
            "SELECT" | "WITH" => StatementKind::Select,
            "INSERT" => StatementKind::Insert,
            "UPDATE" => StatementKind::Update,
            "DELETE" => StatementKind::Delete,
            _ => StatementKind::Other,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            StatementKind::Select => "SELECT",
            StatementKind::Insert => "INSERT",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
            StatementKind::Other => "OTHER",
        }
    }
}

fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

/// Entity manager over one [`StatementExecutor`].
///
/// The session owns the identity map, so every entity it hands out for a
/// given (type, key) is the same [`EntityRef`]. Entity handles are plain
/// `Arc<Mutex<_>>`; the session never keeps a lock across an await point.
///
/// ```ignore
/// let mut session = Session::new(client);
///
/// let phone = ContactPhone::create_with([("name", "mobile"), ("number", "+49 151")]);
/// let phone = EntityRef::from(phone);
/// session.save(&phone).await?;           // INSERT, then re-read
///
/// phone.lock().set("number", "+41 160");
/// session.save(&phone).await?;           // UPDATE of `number` only
/// ```
pub struct Session<E: StatementExecutor> {
    executor: E,
    config: SessionConfig,
    identity: IdentityMap,
    definitions: HashMap<&'static str, Arc<EntityDef>>,
}

impl<E: StatementExecutor> std::fmt::Debug for Session<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("identity", &self.identity)
            .field("definitions", &self.definitions.len())
            .finish_non_exhaustive()
    }
}

impl<E: StatementExecutor> Session<E> {
    /// Create a session with the default configuration.
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            config: SessionConfig::default(),
            identity: IdentityMap::new(),
            definitions: HashMap::new(),
        }
    }

    /// Create a session with a validated configuration.
    pub fn with_config(executor: E, config: SessionConfig) -> OrmResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new(executor)
        })
    }

    /// Use a custom primary key policy. Clears the identity map.
    pub fn with_key_policy(mut self, policy: Arc<dyn PrimaryKeyPolicy>) -> Self {
        self.identity = IdentityMap::with_policy(policy);
        self
    }

    /// The configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The underlying executor.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// The identity map.
    pub fn identity_map(&self) -> &IdentityMap {
        &self.identity
    }

    /// The identity map, mutably.
    pub fn identity_map_mut(&mut self) -> &mut IdentityMap {
        &mut self.identity
    }

    /// Shared definition of `T`, built once per session.
    pub fn definition<T: EntityType>(&mut self) -> Arc<EntityDef> {
        self.definitions
            .entry(T::NAME)
            .or_insert_with(|| Arc::new(T::definition()))
            .clone()
    }

    /// Start an entity-bound query for `T`.
    pub fn fetch<T: EntityType>(&mut self) -> EntityFetcher<'_, E> {
        let def = self.definition::<T>();
        EntityFetcher::new(self, def)
    }

    /// Start an entity-bound query for a definition built at runtime.
    pub fn fetch_definition(&mut self, def: Arc<EntityDef>) -> EntityFetcher<'_, E> {
        EntityFetcher::new(self, def)
    }

    /// Register an entity in the identity map, see [`IdentityMap::map`].
    pub fn map(&mut self, entity: impl Into<EntityRef>) -> EntityRef {
        self.identity.map(entity)
    }

    /// Find `T` by primary key.
    ///
    /// A list value is a composite key, one item per key column. The
    /// identity map is consulted first; storage only on a miss.
    pub async fn find<T: EntityType>(&mut self, key: impl Into<Value>) -> OrmResult<Option<EntityRef>> {
        let def = self.definition::<T>();
        self.find_definition(def, key.into().into_args()).await
    }

    /// Find an entity of `def` by key values.
    pub async fn find_definition(
        &mut self,
        def: Arc<EntityDef>,
        key: Vec<Value>,
    ) -> OrmResult<Option<EntityRef>> {
        let policy = self.identity.policy().clone();
        let primary_key = policy.key_from(&def, &key)?;
        if let Some(entity) = self.identity.fetch_by_key(&def.name, &primary_key) {
            return Ok(Some(entity));
        }

        let columns = policy.key_columns(&def);
        let mut fetcher = self.fetch_definition(def);
        for (column, value) in columns.iter().zip(key) {
            fetcher = fetcher.where_column(column, value)?;
        }
        fetcher.one().await
    }

    /// Execute a statement, logging it under the `entorm.sql` target.
    pub async fn execute(&self, sql: &str) -> OrmResult<Vec<Row>> {
        let kind = StatementKind::detect(sql);
        let logged = match self.config.max_logged_sql {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        };
        tracing::debug!(target: "entorm.sql", kind = kind.as_str(), sql = %logged, "execute");
        let rows = self.executor.execute(sql).await?;
        tracing::trace!(target: "entorm.sql", rows = rows.len(), "result");
        Ok(rows)
    }

    /// Re-read an entity from storage.
    ///
    /// The fetched row becomes the entity's original data; with `reset` it
    /// also replaces the current data. The entity is registered in the
    /// identity map under its key. Returns whether a row was found.
    ///
    /// Fails with `IncompletePrimaryKey` when the entity has no complete key.
    pub async fn sync(&mut self, entity: &EntityRef, reset: bool) -> OrmResult<bool> {
        let (def, key) = {
            let guard = entity.lock();
            (guard.def().clone(), self.key_values(&guard)?)
        };
        self.identity.register(entity)?;

        let mut fetcher = self.fetch_definition(def);
        for (column, value) in key {
            fetcher = fetcher.where_column(&column, value)?;
        }
        let sql = fetcher.sql();
        let Some(row) = self.execute(&sql).await?.into_iter().next() else {
            return Ok(false);
        };

        let mut guard = entity.lock();
        guard.set_original_data(row.into_map());
        if reset {
            guard.reset();
        }
        Ok(true)
    }

    /// Persist an entity.
    ///
    /// An entity without a complete key is inserted when its type uses an
    /// auto-increment key; otherwise the key error is returned. An entity
    /// with a key is re-read first: missing rows are inserted, entities with
    /// locally changed columns updated, the rest left alone. After a write
    /// the entity is re-read and reset to the stored row.
    pub async fn save(&mut self, entity: &EntityRef) -> OrmResult<SaveOutcome> {
        let (hooks, auto_increment, name) = {
            let guard = entity.lock();
            let def = guard.def();
            (def.hooks.clone(), def.auto_increment, def.name.clone())
        };

        let synced = self.sync(entity, false).await;
        let outcome = match synced {
            Ok(true) => {
                let changed = !entity.lock().changes().is_empty();
                if changed {
                    run_hook(entity, &hooks, |h, e| h.pre_update(e))?;
                    self.update(entity).await?;
                    SaveOutcome::Updated
                } else {
                    SaveOutcome::Unchanged
                }
            }
            Ok(false) => {
                run_hook(entity, &hooks, |h, e| h.pre_persist(e))?;
                self.insert(entity, false).await?;
                SaveOutcome::Inserted
            }
            Err(err) if err.is_incomplete_key() && auto_increment => {
                run_hook(entity, &hooks, |h, e| h.pre_persist(e))?;
                self.insert(entity, true).await?;
                SaveOutcome::Inserted
            }
            Err(err) => return Err(err),
        };
        tracing::debug!(target: "entorm.session", entity = %name, outcome = ?outcome, "save");

        match outcome {
            SaveOutcome::Inserted => run_hook(entity, &hooks, |h, e| h.post_persist(e))?,
            SaveOutcome::Updated => run_hook(entity, &hooks, |h, e| h.post_update(e))?,
            SaveOutcome::Unchanged => return Ok(outcome),
        }
        self.sync(entity, true).await?;
        Ok(outcome)
    }

    /// Insert an entity's current data.
    ///
    /// With `auto_increment` the generated key is read back (`RETURNING *`,
    /// or `LAST_INSERT_ID()` on MySQL) and written into the entity.
    pub async fn insert(&mut self, entity: &EntityRef, auto_increment: bool) -> OrmResult<()> {
        let (table, mut data, key_columns) = {
            let guard = entity.lock();
            let def = guard.def();
            (
                def.table.clone(),
                guard.data().clone(),
                self.identity.policy().key_columns(def),
            )
        };
        if auto_increment {
            // Let storage generate the key.
            data.retain(|column, value| !(value.is_null() && key_columns.contains(column)));
        }
        let dialect = self.config.dialect;
        let sql = InsertQb::new(table)
            .dialect(dialect)
            .values(data)?
            .returning(auto_increment)
            .to_sql();
        let rows = self.execute(&sql).await?;
        if !auto_increment {
            return Ok(());
        }

        let generated: BTreeMap<String, Value> = if dialect.supports_returning() {
            let row = rows
                .into_iter()
                .next()
                .ok_or_else(|| OrmError::not_found("INSERT returned no row"))?;
            key_columns
                .iter()
                .filter_map(|column| row.get(column).map(|v| (column.clone(), v.clone())))
                .collect()
        } else {
            let [column] = key_columns.as_slice() else {
                return Err(OrmError::incomplete_key(
                    "LAST_INSERT_ID() can only fill a single key column",
                ));
            };
            let row = self
                .execute("SELECT LAST_INSERT_ID() AS last_id")
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| OrmError::not_found("LAST_INSERT_ID() returned no row"))?;
            let id = row.get("last_id").cloned().unwrap_or_default();
            BTreeMap::from([(column.clone(), id)])
        };

        let mut guard = entity.lock();
        for (column, value) in generated {
            guard.set_column(column, value);
        }
        Ok(())
    }

    /// Write the dirty columns of an entity. Does nothing when clean.
    pub async fn update(&mut self, entity: &EntityRef) -> OrmResult<()> {
        let (table, changes, key) = {
            let guard = entity.lock();
            (
                guard.def().table.clone(),
                guard.changes(),
                self.key_values(&guard)?,
            )
        };
        if changes.is_empty() {
            return Ok(());
        }

        let mut qb = UpdateQb::new(table).dialect(self.config.dialect);
        for (column, value) in changes {
            qb = qb.set(column, value)?;
        }
        for (column, value) in key {
            qb = qb.where_((column, value))?;
        }
        self.execute(&qb.to_sql()?).await?;
        Ok(())
    }

    /// Delete an entity's row and forget the instance.
    ///
    /// The entity keeps its data but loses its original data, so a later
    /// [`Session::save`] inserts it again.
    pub async fn delete(&mut self, entity: &EntityRef) -> OrmResult<()> {
        let (table, name, key, primary_key) = {
            let guard = entity.lock();
            (
                guard.def().table.clone(),
                guard.name().to_string(),
                self.key_values(&guard)?,
                self.identity.key_of(&guard)?,
            )
        };

        let mut qb = DeleteQb::new(table).dialect(self.config.dialect);
        for (column, value) in key {
            qb = qb.where_((column, value))?;
        }
        self.execute(&qb.to_sql()).await?;

        self.identity.remove(&name, &primary_key);
        entity.lock().set_original_data(BTreeMap::new());
        Ok(())
    }

    /// Key columns and their current values.
    fn key_values(&self, entity: &Entity) -> OrmResult<Vec<(String, Value)>> {
        // Validates completeness.
        self.identity.key_of(entity)?;
        let data = entity.data();
        Ok(self
            .identity
            .policy()
            .key_columns(entity.def())
            .into_iter()
            .map(|column| {
                let value = data.get(&column).cloned().unwrap_or_default();
                (column, value)
            })
            .collect())
    }
}

fn run_hook(
    entity: &EntityRef,
    hooks: &Option<Arc<dyn EntityHooks>>,
    hook: impl FnOnce(&dyn EntityHooks, &mut Entity) -> OrmResult<()>,
) -> OrmResult<()> {
    match hooks {
        Some(hooks) => hook(hooks.as_ref(), &mut entity.lock()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statement_kind() {
        assert_eq!(StatementKind::detect("select 1"), StatementKind::Select);
        assert_eq!(
            StatementKind::detect("  INSERT INTO t DEFAULT VALUES"),
            StatementKind::Insert
        );
        assert_eq!(StatementKind::detect(""), StatementKind::Other);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_sql_bytes("SELECT 1", 100), "SELECT 1");
        assert_eq!(truncate_sql_bytes("SELECT 'äö'", 9), "SELECT '");
    }
}
