//! SELECT query builder.

use super::alias::AliasTable;
use super::condition::{Condition, ConditionNode};
use super::parenthesis::ParenthesisGroup;
use super::traits::{Conditions, SelectQuery};
use crate::config::ModifierPolicy;
use crate::dialect::{Dialect, check_placeholders};
use crate::entity::{EntityDef, EntityType};
use crate::error::OrmResult;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Alias of the root table in entity-bound builders.
pub const ROOT_ALIAS: &str = "t0";

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Join kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
}

impl JoinKind {
    /// SQL keyword.
    pub fn keyword(&self) -> &'static str {
        match self {
            JoinKind::Inner => "JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Full => "FULL JOIN",
        }
    }
}

/// What to join: a table name or an entity type, with an optional alias.
#[derive(Debug, Clone)]
pub struct JoinTarget {
    table: String,
    def: Option<Arc<EntityDef>>,
    alias: Option<String>,
}

impl JoinTarget {
    /// Join a table by name.
    pub fn table(name: impl Into<String>) -> Self {
        Self {
            table: name.into(),
            def: None,
            alias: None,
        }
    }

    /// Join the table of an entity type.
    pub fn entity<T: EntityType>() -> Self {
        Self::definition(Arc::new(T::definition()))
    }

    /// Join the table of an entity definition.
    pub fn definition(def: Arc<EntityDef>) -> Self {
        Self {
            table: def.table.clone(),
            def: Some(def),
            alias: None,
        }
    }

    /// Use an explicit alias instead of a generated one.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

impl From<&str> for JoinTarget {
    fn from(table: &str) -> Self {
        JoinTarget::table(table)
    }
}

impl From<String> for JoinTarget {
    fn from(table: String) -> Self {
        JoinTarget::table(table)
    }
}

impl From<Arc<EntityDef>> for JoinTarget {
    fn from(def: Arc<EntityDef>) -> Self {
        JoinTarget::definition(def)
    }
}

/// SQL text with `?` placeholders and their (validated) arguments.
#[derive(Debug, Clone, PartialEq)]
struct Fragment {
    sql: String,
    args: Vec<Value>,
}

impl Fragment {
    fn plain(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            args: Vec::new(),
        }
    }

    fn render(&self, dialect: Dialect) -> String {
        if self.args.is_empty() {
            self.sql.clone()
        } else {
            dialect.substitute_unchecked(&self.sql, &self.args)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum JoinClause {
    None,
    Expr(Fragment),
    Group(ParenthesisGroup),
}

#[derive(Debug, Clone, PartialEq)]
struct Join {
    kind: JoinKind,
    table: String,
    alias: Option<String>,
    on: JoinClause,
}

/// SELECT query builder.
///
/// Plain builders (`QueryBuilder::new("foobar")`) pass column references
/// through as written. Entity-bound builders alias the root table `t0`,
/// number joins `t1`, `t2`, ... and qualify every column reference.
///
/// ```ignore
/// use entorm::prelude::*;
///
/// let sql = QueryBuilder::new("foobar")
///     .where_(("name", ["John Doe", "Jane Doe"]))?
///     .order_by("name", Direction::Asc, vec![])?
///     .limit(10)
///     .get_query();
/// assert_eq!(
///     sql,
///     "SELECT * FROM foobar WHERE name IN ('John Doe','Jane Doe') ORDER BY name ASC LIMIT 10"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    table: String,
    alias: Option<String>,
    dialect: Dialect,
    policy: ModifierPolicy,
    modifiers: Vec<String>,
    columns: Vec<Fragment>,
    columns_locked: bool,
    joins: Vec<Join>,
    aliases: AliasTable,
    where_group: ParenthesisGroup,
    group_by: Vec<Fragment>,
    order_by: Vec<(Fragment, Direction)>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
}

impl QueryBuilder {
    /// Create a builder for a table.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            alias: None,
            dialect: Dialect::default(),
            policy: ModifierPolicy::default(),
            modifiers: Vec::new(),
            columns: Vec::new(),
            columns_locked: false,
            joins: Vec::new(),
            aliases: AliasTable::plain(),
            where_group: ParenthesisGroup::new(),
            group_by: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Create a builder bound to an entity: root alias `t0`, columns locked
    /// at `t0.*`.
    pub fn for_entity(def: Arc<EntityDef>) -> Self {
        let mut qb = Self::new(def.table.clone());
        qb.alias = Some(ROOT_ALIAS.to_string());
        qb.aliases = AliasTable::for_entity(def, ROOT_ALIAS);
        qb.columns = vec![Fragment::plain(format!("{ROOT_ALIAS}.*"))];
        qb.columns_locked = true;
        qb
    }

    /// Alias the root table.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        self.aliases.set_root(&alias, &self.table);
        self.alias = Some(alias);
        self
    }

    /// Quote values for `dialect`.
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Restrict accepted modifiers.
    pub fn modifier_policy(mut self, policy: ModifierPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub(crate) fn set_dialect(&mut self, dialect: Dialect) {
        self.dialect = dialect;
    }

    pub(crate) fn set_modifier_policy(&mut self, policy: ModifierPolicy) {
        self.policy = policy;
    }

    /// Root table.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Whether the column list can no longer change.
    pub fn columns_locked(&self) -> bool {
        self.columns_locked
    }

    /// Table registered under an alias.
    pub fn table_of(&self, alias: &str) -> Option<&str> {
        self.aliases.table_of(alias)
    }

    /// Validate a condition and resolve its columns. `leading` treats an
    /// identifier starting a raw expression as a root column.
    pub(crate) fn resolve_condition(
        &self,
        condition: Condition,
        leading: bool,
    ) -> OrmResult<ConditionNode> {
        match condition.into_node()? {
            ConditionNode::Raw { expression, args } => Ok(ConditionNode::Raw {
                expression: self.aliases.translate(&expression, leading),
                args,
            }),
            ConditionNode::Compare {
                column,
                operator,
                value,
            } => Ok(ConditionNode::Compare {
                column: self.aliases.resolve_column(&column)?,
                operator,
                value,
            }),
        }
    }

    fn fragment(&self, expression: &str, args: Vec<Value>) -> OrmResult<Fragment> {
        check_placeholders(expression, &args)?;
        Ok(Fragment {
            sql: self.aliases.resolve_column(expression)?,
            args,
        })
    }

    pub(crate) fn set_columns<I, S>(&mut self, columns: I) -> OrmResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.columns_locked {
            return Ok(());
        }
        let columns = columns
            .into_iter()
            .map(|column| self.fragment(column.as_ref(), Vec::new()))
            .collect::<OrmResult<Vec<_>>>()?;
        self.columns = columns;
        self.columns_locked = true;
        Ok(())
    }

    pub(crate) fn add_column(
        &mut self,
        expression: &str,
        args: Vec<Value>,
        alias: Option<&str>,
    ) -> OrmResult<()> {
        if self.columns_locked {
            return Ok(());
        }
        let mut fragment = self.fragment(expression, args)?;
        if let Some(alias) = alias.filter(|a| !a.is_empty()) {
            fragment.sql = format!("{} AS {alias}", fragment.sql);
        }
        self.columns.push(fragment);
        Ok(())
    }

    /// Register a join and its alias. Returns the join index.
    ///
    /// Generated aliases take the lowest free `t<N>`, so unaliased table
    /// joins of plain builders and explicit aliases never collide with them.
    pub(crate) fn push_join(&mut self, kind: JoinKind, target: JoinTarget) -> usize {
        let JoinTarget { table, def, alias } = target;
        let alias = alias.or_else(|| {
            (def.is_some() || self.aliases.is_entity_bound()).then(|| self.aliases.next_free())
        });
        if let Some(alias) = &alias {
            self.aliases.register(alias, table.clone(), def);
        }
        self.joins.push(Join {
            kind,
            table,
            alias,
            on: JoinClause::None,
        });
        self.joins.len() - 1
    }

    pub(crate) fn push_join_expr(
        &mut self,
        kind: JoinKind,
        target: JoinTarget,
        expression: &str,
        args: Vec<Value>,
    ) -> OrmResult<()> {
        check_placeholders(expression, &args)?;
        let index = self.push_join(kind, target);
        // Translated after registration so the expression can use the new alias.
        let sql = self.aliases.translate(expression, false);
        self.joins[index].on = JoinClause::Expr(Fragment { sql, args });
        Ok(())
    }

    pub(crate) fn set_join_on(&mut self, index: usize, group: ParenthesisGroup) {
        if let Some(join) = self.joins.get_mut(index) {
            join.on = JoinClause::Group(group);
        }
    }

    pub(crate) fn add_group_by(&mut self, expression: &str, args: Vec<Value>) -> OrmResult<()> {
        let fragment = self.fragment(expression, args)?;
        self.group_by.push(fragment);
        Ok(())
    }

    pub(crate) fn add_order_by(
        &mut self,
        expression: &str,
        direction: Direction,
        args: Vec<Value>,
    ) -> OrmResult<()> {
        let fragment = self.fragment(expression, args)?;
        self.order_by.push((fragment, direction));
        Ok(())
    }

    pub(crate) fn add_modifier(&mut self, modifier: &str) -> OrmResult<()> {
        self.policy.check(modifier)?;
        self.modifiers.push(modifier.trim().to_string());
        Ok(())
    }

    /// Render the statement. Pure: rendering twice gives the same text.
    pub fn render(&self) -> String {
        let dialect = self.dialect;
        let mut sql = String::from("SELECT ");

        for modifier in &self.modifiers {
            sql.push_str(modifier);
            sql.push(' ');
        }

        if self.columns.is_empty() {
            match &self.alias {
                Some(alias) => {
                    sql.push_str(alias);
                    sql.push_str(".*");
                }
                None => sql.push('*'),
            }
        } else {
            let columns: Vec<String> = self.columns.iter().map(|c| c.render(dialect)).collect();
            sql.push_str(&columns.join(", "));
        }

        sql.push_str(" FROM ");
        sql.push_str(&self.table);
        if let Some(alias) = &self.alias {
            sql.push_str(" AS ");
            sql.push_str(alias);
        }

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join.kind.keyword());
            sql.push(' ');
            sql.push_str(&join.table);
            if let Some(alias) = &join.alias {
                sql.push_str(" AS ");
                sql.push_str(alias);
            }
            let on = match &join.on {
                JoinClause::None => String::new(),
                JoinClause::Expr(fragment) => fragment.render(dialect),
                JoinClause::Group(group) => group.render(dialect),
            };
            if !on.is_empty() {
                sql.push_str(" ON ");
                sql.push_str(&on);
            }
        }

        let where_sql = self.where_group.render(dialect);
        if !where_sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
        }

        if !self.group_by.is_empty() {
            let parts: Vec<String> = self.group_by.iter().map(|g| g.render(dialect)).collect();
            sql.push_str(" GROUP BY ");
            sql.push_str(&parts.join(", "));
        }

        if !self.order_by.is_empty() {
            let parts: Vec<String> = self
                .order_by
                .iter()
                .map(|(fragment, direction)| format!("{} {direction}", fragment.render(dialect)))
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&parts.join(", "));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        sql
    }

    /// Alias for [`QueryBuilder::render`].
    pub fn to_sql(&self) -> String {
        self.render()
    }
}

impl fmt::Display for QueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl Conditions for QueryBuilder {
    fn resolve(&self, condition: Condition) -> OrmResult<ConditionNode> {
        self.resolve_condition(condition, true)
    }

    fn group_mut(&mut self) -> &mut ParenthesisGroup {
        &mut self.where_group
    }
}

impl SelectQuery for QueryBuilder {
    fn builder(&self) -> &QueryBuilder {
        self
    }

    fn builder_mut(&mut self) -> &mut QueryBuilder {
        self
    }
}

/// Open ON clause of a join.
///
/// The join and its alias are registered when the handle is created, so
/// conditions here may reference the joined table. [`JoinOn::close`] returns
/// the builder.
#[must_use = "an open ON clause has to be closed to get the builder back"]
#[derive(Debug)]
pub struct JoinOn<P: SelectQuery> {
    parent: P,
    index: usize,
    group: ParenthesisGroup,
}

impl<P: SelectQuery> JoinOn<P> {
    pub(crate) fn open(mut parent: P, kind: JoinKind, target: JoinTarget) -> Self {
        let index = parent.builder_mut().push_join(kind, target);
        Self {
            parent,
            index,
            group: ParenthesisGroup::new(),
        }
    }

    /// Close the ON clause and return to the builder.
    pub fn close(self) -> P {
        let mut parent = self.parent;
        parent.builder_mut().set_join_on(self.index, self.group);
        parent
    }
}

impl<P: SelectQuery> Conditions for JoinOn<P> {
    fn resolve(&self, condition: Condition) -> OrmResult<ConditionNode> {
        self.parent.builder().resolve_condition(condition, false)
    }

    fn group_mut(&mut self) -> &mut ParenthesisGroup {
        &mut self.group
    }
}
