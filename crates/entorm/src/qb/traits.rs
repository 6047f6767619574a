//! Trait definitions for query builders.

use super::condition::{Condition, ConditionNode};
use super::parenthesis::{ConditionTree, Connector, Parenthesis, ParenthesisGroup};
use super::select::{Direction, JoinKind, JoinOn, JoinTarget, QueryBuilder};
use crate::error::OrmResult;
use crate::value::Value;

/// Anything that collects conditions into a parenthesis group.
///
/// Implemented by [`QueryBuilder`], the entity fetcher, open parentheses and
/// join ON clauses. Each call consumes the receiver and hands it back, so
/// calls chain:
///
/// ```ignore
/// let qb = QueryBuilder::new("foobar")
///     .where_("a = b")?
///     .or_parenthesis()
///         .where_(("name", "LIKE", "% Doe"))?
///         .and_where(("age", ">", 18))?
///     .close();
/// ```
pub trait Conditions: Sized {
    /// Validate a condition and resolve its column references.
    fn resolve(&self, condition: Condition) -> OrmResult<ConditionNode>;

    /// The group new conditions are added to.
    fn group_mut(&mut self) -> &mut ParenthesisGroup;

    /// Add a condition (AND).
    fn where_(self, condition: impl Into<Condition>) -> OrmResult<Self> {
        self.and_where(condition)
    }

    /// Add a condition with AND.
    fn and_where(mut self, condition: impl Into<Condition>) -> OrmResult<Self> {
        let node = self.resolve(condition.into())?;
        self.group_mut().add_condition(Connector::And, node);
        Ok(self)
    }

    /// Add a condition with OR.
    fn or_where(mut self, condition: impl Into<Condition>) -> OrmResult<Self> {
        let node = self.resolve(condition.into())?;
        self.group_mut().add_condition(Connector::Or, node);
        Ok(self)
    }

    /// Open a parenthesis (AND).
    fn parenthesis(self) -> Parenthesis<Self> {
        self.and_parenthesis()
    }

    /// Open a parenthesis connected with AND.
    fn and_parenthesis(self) -> Parenthesis<Self> {
        Parenthesis::open(self, Connector::And)
    }

    /// Open a parenthesis connected with OR.
    fn or_parenthesis(self) -> Parenthesis<Self> {
        Parenthesis::open(self, Connector::Or)
    }

    /// Attach a runtime-built condition tree.
    ///
    /// Fails with `NoOpenParenthesis` if the tree still has open groups.
    fn where_tree(mut self, tree: ConditionTree) -> OrmResult<Self> {
        let resolved = tree.resolve(&self)?;
        resolved.replay_into(self.group_mut());
        Ok(self)
    }
}

/// SELECT builder operations shared by [`QueryBuilder`] and the entity
/// fetcher.
pub trait SelectQuery: Conditions {
    /// The underlying builder.
    fn builder(&self) -> &QueryBuilder;

    /// The underlying builder, mutably.
    fn builder_mut(&mut self) -> &mut QueryBuilder;

    /// Replace the column list. The first call wins; later calls to
    /// `columns` and `column` are ignored.
    fn columns<I, S>(mut self, columns: I) -> OrmResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.builder_mut().set_columns(columns)?;
        Ok(self)
    }

    /// Append one column expression with placeholder substitution and an
    /// optional `AS` alias. Ignored once the column list is locked.
    fn column(mut self, expression: &str, args: Vec<Value>, alias: Option<&str>) -> OrmResult<Self> {
        self.builder_mut().add_column(expression, args, alias)?;
        Ok(self)
    }

    /// `JOIN target ON (...)`: returns the ON clause to fill and close.
    fn join(self, target: impl Into<JoinTarget>) -> JoinOn<Self> {
        JoinOn::open(self, JoinKind::Inner, target.into())
    }

    /// `JOIN target ON expression`.
    fn join_expr(self, target: impl Into<JoinTarget>, expression: &str, args: Vec<Value>) -> OrmResult<Self> {
        self.join_with(JoinKind::Inner, target.into(), expression, args)
    }

    /// `JOIN target` without an ON clause.
    fn join_empty(mut self, target: impl Into<JoinTarget>) -> Self {
        self.builder_mut().push_join(JoinKind::Inner, target.into());
        self
    }

    /// `LEFT JOIN target ON (...)`.
    fn left_join(self, target: impl Into<JoinTarget>) -> JoinOn<Self> {
        JoinOn::open(self, JoinKind::Left, target.into())
    }

    /// `LEFT JOIN target ON expression`.
    fn left_join_expr(self, target: impl Into<JoinTarget>, expression: &str, args: Vec<Value>) -> OrmResult<Self> {
        self.join_with(JoinKind::Left, target.into(), expression, args)
    }

    /// `LEFT JOIN target` without an ON clause.
    fn left_join_empty(mut self, target: impl Into<JoinTarget>) -> Self {
        self.builder_mut().push_join(JoinKind::Left, target.into());
        self
    }

    /// `RIGHT JOIN target ON (...)`.
    fn right_join(self, target: impl Into<JoinTarget>) -> JoinOn<Self> {
        JoinOn::open(self, JoinKind::Right, target.into())
    }

    /// `RIGHT JOIN target ON expression`.
    fn right_join_expr(self, target: impl Into<JoinTarget>, expression: &str, args: Vec<Value>) -> OrmResult<Self> {
        self.join_with(JoinKind::Right, target.into(), expression, args)
    }

    /// `RIGHT JOIN target` without an ON clause.
    fn right_join_empty(mut self, target: impl Into<JoinTarget>) -> Self {
        self.builder_mut().push_join(JoinKind::Right, target.into());
        self
    }

    /// `FULL JOIN target` without an ON clause.
    ///
    /// Unlike the other join kinds, a full join is empty by default; use
    /// [`SelectQuery::full_join_on`] for an ON clause.
    fn full_join(mut self, target: impl Into<JoinTarget>) -> Self {
        self.builder_mut().push_join(JoinKind::Full, target.into());
        self
    }

    /// `FULL JOIN target ON expression`.
    fn full_join_expr(self, target: impl Into<JoinTarget>, expression: &str, args: Vec<Value>) -> OrmResult<Self> {
        self.join_with(JoinKind::Full, target.into(), expression, args)
    }

    /// `FULL JOIN target ON (...)`.
    fn full_join_on(self, target: impl Into<JoinTarget>) -> JoinOn<Self> {
        JoinOn::open(self, JoinKind::Full, target.into())
    }

    #[doc(hidden)]
    fn join_with(mut self, kind: JoinKind, target: JoinTarget, expression: &str, args: Vec<Value>) -> OrmResult<Self> {
        self.builder_mut().push_join_expr(kind, target, expression, args)?;
        Ok(self)
    }

    /// Add a GROUP BY column or expression.
    fn group_by(mut self, expression: &str, args: Vec<Value>) -> OrmResult<Self> {
        self.builder_mut().add_group_by(expression, args)?;
        Ok(self)
    }

    /// Add an ORDER BY column or expression.
    fn order_by(mut self, expression: &str, direction: Direction, args: Vec<Value>) -> OrmResult<Self> {
        self.builder_mut().add_order_by(expression, direction, args)?;
        Ok(self)
    }

    /// Set LIMIT.
    fn limit(mut self, limit: u64) -> Self {
        self.builder_mut().limit = Some(limit);
        self
    }

    /// Set OFFSET.
    fn offset(mut self, offset: u64) -> Self {
        self.builder_mut().offset = Some(offset);
        self
    }

    /// Add a SELECT modifier such as `DISTINCT`.
    fn modifier(mut self, modifier: &str) -> OrmResult<Self> {
        self.builder_mut().add_modifier(modifier)?;
        Ok(self)
    }

    /// Render the statement.
    fn get_query(&self) -> String {
        self.builder().render()
    }
}
