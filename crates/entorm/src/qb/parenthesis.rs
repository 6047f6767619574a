//! Nested AND/OR condition groups.
//!
//! Two ways to build a group:
//!
//! * the typed handle [`Parenthesis`], which owns its parent and hands it back
//!   on [`Parenthesis::close`], so an unclosed group cannot reach `render()`;
//! * [`ConditionTree`], a recorder for filters composed at runtime, which
//!   checks balance when it is attached.

use super::condition::{Condition, ConditionNode};
use super::traits::Conditions;
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};

/// Boolean connector in front of a group entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connector {
    /// First entry of a group.
    #[default]
    None,
    And,
    Or,
}

impl Connector {
    fn keyword(self) -> &'static str {
        match self {
            Connector::None => "",
            Connector::And => " AND ",
            Connector::Or => " OR ",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Entry {
    Node(ConditionNode),
    Group(ParenthesisGroup),
}

/// Ordered sequence of conditions and nested groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParenthesisGroup {
    entries: Vec<(Connector, Entry)>,
}

impl ParenthesisGroup {
    /// Create an empty group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the group renders to nothing (no entries, or only empty
    /// nested groups).
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|(_, entry)| match entry {
            Entry::Node(_) => false,
            Entry::Group(group) => group.is_empty(),
        })
    }

    /// Append a condition.
    pub fn add_condition(&mut self, connector: Connector, node: ConditionNode) {
        self.push(connector, Entry::Node(node));
    }

    /// Append a finished nested group.
    pub fn add_group(&mut self, connector: Connector, group: ParenthesisGroup) {
        self.push(connector, Entry::Group(group));
    }

    /// Append an empty nested group and return it for filling.
    pub fn open_nested(&mut self, connector: Connector) -> &mut ParenthesisGroup {
        self.push(connector, Entry::Group(ParenthesisGroup::new()));
        match self.entries.last_mut() {
            Some((_, Entry::Group(group))) => group,
            _ => unreachable!("a group was just pushed"),
        }
    }

    fn push(&mut self, connector: Connector, entry: Entry) {
        let connector = if self.entries.is_empty() {
            Connector::None
        } else {
            connector
        };
        self.entries.push((connector, entry));
    }

    /// Render the group without surrounding parentheses.
    ///
    /// Empty nested groups are dropped together with their connector, and the
    /// first rendered entry never carries one.
    pub fn render(&self, dialect: Dialect) -> String {
        let mut out = String::new();
        for (connector, entry) in &self.entries {
            let sql = match entry {
                Entry::Node(node) => node.render(dialect),
                Entry::Group(group) => {
                    let inner = group.render(dialect);
                    if inner.is_empty() {
                        continue;
                    }
                    format!("({inner})")
                }
            };
            if !out.is_empty() {
                let keyword = match connector {
                    Connector::None => Connector::And.keyword(),
                    other => other.keyword(),
                };
                out.push_str(keyword);
            }
            out.push_str(&sql);
        }
        out
    }
}

/// An open parenthesis owning its parent.
///
/// Conditions added here land inside `( ... )`; [`Parenthesis::close`] seals
/// the group into the parent and returns the parent.
#[must_use = "an open parenthesis has to be closed to get its parent back"]
#[derive(Debug)]
pub struct Parenthesis<P: Conditions> {
    parent: P,
    connector: Connector,
    group: ParenthesisGroup,
}

impl<P: Conditions> Parenthesis<P> {
    pub(crate) fn open(parent: P, connector: Connector) -> Self {
        Self {
            parent,
            connector,
            group: ParenthesisGroup::new(),
        }
    }

    /// Close the group and return to the parent.
    pub fn close(self) -> P {
        let mut parent = self.parent;
        parent.group_mut().add_group(self.connector, self.group);
        parent
    }
}

impl<P: Conditions> Conditions for Parenthesis<P> {
    fn resolve(&self, condition: Condition) -> OrmResult<ConditionNode> {
        self.parent.resolve(condition)
    }

    fn group_mut(&mut self) -> &mut ParenthesisGroup {
        &mut self.group
    }
}

#[derive(Debug, Clone, PartialEq)]
enum TreeOp {
    Add(Connector, Condition),
    Open(Connector),
    Close,
}

/// Resolved form of a [`TreeOp`].
enum Step {
    Add(Connector, ConditionNode),
    Open(Connector),
    Close,
}

/// Records conditions and parentheses for later attachment.
///
/// Useful when the shape of a filter is decided at runtime:
///
/// ```ignore
/// let mut tree = ConditionTree::new();
/// tree.where_(("status", "active"));
/// if let Some(term) = search {
///     tree.and_parenthesis()
///         .where_(("name", "LIKE", format!("%{term}%")))
///         .or_where(("email", "LIKE", format!("%{term}%")))
///         .close()?;
/// }
/// let qb = QueryBuilder::new("users").where_tree(tree)?;
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionTree {
    ops: Vec<TreeOp>,
    depth: usize,
}

impl ConditionTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition with AND.
    pub fn where_(&mut self, condition: impl Into<Condition>) -> &mut Self {
        self.and_where(condition)
    }

    /// Add a condition with AND.
    pub fn and_where(&mut self, condition: impl Into<Condition>) -> &mut Self {
        self.ops.push(TreeOp::Add(Connector::And, condition.into()));
        self
    }

    /// Add a condition with OR.
    pub fn or_where(&mut self, condition: impl Into<Condition>) -> &mut Self {
        self.ops.push(TreeOp::Add(Connector::Or, condition.into()));
        self
    }

    /// Open a group connected with AND.
    pub fn parenthesis(&mut self) -> &mut Self {
        self.and_parenthesis()
    }

    /// Open a group connected with AND.
    pub fn and_parenthesis(&mut self) -> &mut Self {
        self.open(Connector::And)
    }

    /// Open a group connected with OR.
    pub fn or_parenthesis(&mut self) -> &mut Self {
        self.open(Connector::Or)
    }

    fn open(&mut self, connector: Connector) -> &mut Self {
        self.ops.push(TreeOp::Open(connector));
        self.depth += 1;
        self
    }

    /// Close the innermost open group.
    pub fn close(&mut self) -> OrmResult<&mut Self> {
        if self.depth == 0 {
            return Err(OrmError::NoOpenParenthesis(
                "close() called without an open parenthesis".to_string(),
            ));
        }
        self.depth -= 1;
        self.ops.push(TreeOp::Close);
        Ok(self)
    }

    /// Check that every group is closed and hand the tree back.
    pub fn finish(self) -> OrmResult<Self> {
        if self.depth != 0 {
            return Err(OrmError::NoOpenParenthesis(format!(
                "{} parenthesis left unclosed",
                self.depth
            )));
        }
        Ok(self)
    }

    /// Number of groups still open.
    pub fn open_groups(&self) -> usize {
        self.depth
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Resolve every condition against `owner`. Fails if a group is still
    /// open.
    pub(crate) fn resolve<C: Conditions>(self, owner: &C) -> OrmResult<ResolvedTree> {
        let steps = self
            .finish()?
            .ops
            .into_iter()
            .map(|op| {
                Ok(match op {
                    TreeOp::Add(connector, condition) => {
                        Step::Add(connector, owner.resolve(condition)?)
                    }
                    TreeOp::Open(connector) => Step::Open(connector),
                    TreeOp::Close => Step::Close,
                })
            })
            .collect::<OrmResult<Vec<_>>>()?;
        Ok(ResolvedTree(steps))
    }
}

/// A balanced tree whose conditions are resolved.
pub(crate) struct ResolvedTree(Vec<Step>);

impl ResolvedTree {
    /// Replay the recorded steps into `group`.
    pub(crate) fn replay_into(self, group: &mut ParenthesisGroup) {
        replay(group, &mut self.0.into_iter());
    }
}

fn replay(group: &mut ParenthesisGroup, steps: &mut impl Iterator<Item = Step>) {
    while let Some(step) = steps.next() {
        match step {
            Step::Add(connector, node) => group.add_condition(connector, node),
            Step::Open(connector) => replay(group.open_nested(connector), steps),
            Step::Close => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn raw(sql: &str) -> ConditionNode {
        ConditionNode::Raw {
            expression: sql.to_string(),
            args: Vec::new(),
        }
    }

    #[test]
    fn connectors() {
        let mut group = ParenthesisGroup::new();
        group.add_condition(Connector::Or, raw("a = b"));
        group.add_condition(Connector::And, raw("c = d"));
        group.add_condition(Connector::Or, raw("e = f"));
        assert_eq!(group.render(Dialect::Postgres), "a = b AND c = d OR e = f");
    }

    #[test]
    fn nested_groups_are_wrapped() {
        let mut group = ParenthesisGroup::new();
        group.add_condition(Connector::None, raw("a = b"));
        let nested = group.open_nested(Connector::Or);
        nested.add_condition(Connector::And, raw("c = d"));
        nested.add_condition(Connector::And, raw("e = f"));
        assert_eq!(group.render(Dialect::Postgres), "a = b OR (c = d AND e = f)");
    }

    #[test]
    fn empty_groups_vanish_at_any_depth() {
        let mut group = ParenthesisGroup::new();
        group.open_nested(Connector::And).open_nested(Connector::Or);
        assert!(group.is_empty());
        assert_eq!(group.render(Dialect::Postgres), "");

        group.add_condition(Connector::Or, raw("a = b"));
        group.open_nested(Connector::And);
        assert_eq!(group.render(Dialect::Postgres), "a = b");
    }

    #[test]
    fn first_rendered_entry_has_no_connector() {
        let mut group = ParenthesisGroup::new();
        group.open_nested(Connector::None);
        group.add_condition(Connector::Or, raw("a = b"));
        assert_eq!(group.render(Dialect::Postgres), "a = b");
    }

    #[test]
    fn tree_close_without_open_fails() {
        let mut tree = ConditionTree::new();
        tree.where_(("id", Value::Int(1)));
        let err = tree.close().unwrap_err();
        assert!(matches!(err, OrmError::NoOpenParenthesis(_)));
        tree.parenthesis();
        assert_eq!(tree.open_groups(), 1);
        assert!(tree.clone().finish().is_err());
        assert!(tree.close().is_ok());
        assert!(tree.finish().is_ok());
    }
}
