//! Entity-bound SELECT execution.

use crate::client::StatementExecutor;
use crate::entity::{Entity, EntityDef};
use crate::error::OrmResult;
use crate::identity::EntityRef;
use crate::qb::{
    Condition, ConditionNode, Conditions, Connector, ParenthesisGroup, QueryBuilder, ROOT_ALIAS,
    SelectQuery,
};
use crate::row::Row;
use crate::session::Session;
use crate::value::Value;
use std::collections::VecDeque;
use std::sync::Arc;

/// Query builder bound to one entity type that yields mapped entities.
///
/// Created by [`Session::fetch`]. The root table is aliased `t0`, the
/// column list is locked at `t0.*`, and every row is passed through the
/// session's identity map, so a row for an already loaded entity returns that
/// instance with the fetched data merged in.
///
/// The statement runs once, on the first call to [`EntityFetcher::one`] or
/// [`EntityFetcher::all`]; later calls walk the remaining rows.
///
/// ```ignore
/// let mut fetcher = session
///     .fetch::<ContactPhone>()
///     .where_(("name", "mobile"))?
///     .order_by("id", Direction::Asc, vec![])?;
/// while let Some(phone) = fetcher.one().await? {
///     println!("{:?}", phone.lock().get("number")?);
/// }
/// ```
pub struct EntityFetcher<'s, E: StatementExecutor> {
    session: &'s mut Session<E>,
    def: Arc<EntityDef>,
    qb: QueryBuilder,
    query: Option<String>,
    rows: Option<VecDeque<Row>>,
}

impl<'s, E: StatementExecutor> EntityFetcher<'s, E> {
    pub(crate) fn new(session: &'s mut Session<E>, def: Arc<EntityDef>) -> Self {
        let config = session.config();
        let mut qb = QueryBuilder::for_entity(def.clone());
        qb.set_dialect(config.dialect);
        qb.set_modifier_policy(config.modifier_policy());
        Self {
            session,
            def,
            qb,
            query: None,
            rows: None,
        }
    }

    /// The entity definition rows are mapped to.
    pub fn definition(&self) -> &Arc<EntityDef> {
        &self.def
    }

    /// Replace the generated statement with `sql`, filling `?` placeholders
    /// from `args`.
    pub fn set_query(mut self, sql: &str, args: Vec<Value>) -> OrmResult<Self> {
        let sql = self.session.config().dialect.substitute(sql, &args)?;
        self.query = Some(sql);
        Ok(self)
    }

    /// `t0.<column> = value` for a storage column, without field translation.
    pub(crate) fn where_column(mut self, column: &str, value: Value) -> OrmResult<Self> {
        let node = Condition::eq(format!("{ROOT_ALIAS}.{column}"), value).into_node()?;
        self.group_mut().add_condition(Connector::And, node);
        Ok(self)
    }

    /// The statement that runs: the custom query if set, else the builder's.
    pub fn sql(&self) -> String {
        match &self.query {
            Some(sql) => sql.clone(),
            None => self.qb.render(),
        }
    }

    /// Next entity, or `None` when the result is exhausted.
    pub async fn one(&mut self) -> OrmResult<Option<EntityRef>> {
        if self.rows.is_none() {
            let rows = self.session.execute(&self.sql()).await?;
            self.rows = Some(rows.into());
        }
        let Some(row) = self.rows.as_mut().and_then(VecDeque::pop_front) else {
            return Ok(None);
        };
        let entity = Entity::from_data(self.def.clone(), row);
        Ok(Some(self.session.map(entity)))
    }

    /// Remaining entities, at most `limit`.
    ///
    /// A `limit` of 0 means the session's row cap, or every row when no cap
    /// is configured.
    pub async fn all(&mut self, limit: usize) -> OrmResult<Vec<EntityRef>> {
        let limit = match limit {
            0 => self.session.config().row_cap,
            n => Some(n),
        };
        let mut entities = Vec::new();
        while limit.is_none_or(|max| entities.len() < max) {
            match self.one().await? {
                Some(entity) => entities.push(entity),
                None => break,
            }
        }
        Ok(entities)
    }
}

impl<E: StatementExecutor> Conditions for EntityFetcher<'_, E> {
    fn resolve(&self, condition: Condition) -> OrmResult<ConditionNode> {
        self.qb.resolve_condition(condition, true)
    }

    fn group_mut(&mut self) -> &mut ParenthesisGroup {
        self.qb.group_mut()
    }
}

impl<E: StatementExecutor> SelectQuery for EntityFetcher<'_, E> {
    fn builder(&self) -> &QueryBuilder {
        &self.qb
    }

    fn builder_mut(&mut self) -> &mut QueryBuilder {
        &mut self.qb
    }
}
