//! DELETE statement builder.

use super::condition::{Condition, ConditionNode};
use super::parenthesis::ParenthesisGroup;
use super::traits::Conditions;
use crate::dialect::Dialect;
use crate::error::OrmResult;

/// DELETE statement with inline values.
///
/// Without conditions the statement renders `WHERE 1=0` and deletes nothing,
/// unless [`DeleteQb::allow_delete_all`] was enabled.
#[derive(Clone, Debug)]
pub struct DeleteQb {
    table: String,
    dialect: Dialect,
    where_group: ParenthesisGroup,
    allow_delete_all: bool,
}

impl DeleteQb {
    /// Create a new DELETE builder.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            dialect: Dialect::default(),
            where_group: ParenthesisGroup::new(),
            allow_delete_all: false,
        }
    }

    /// Quote values for `dialect`.
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Allow DELETE without conditions.
    pub fn allow_delete_all(mut self, allow: bool) -> Self {
        self.allow_delete_all = allow;
        self
    }

    /// Render the statement.
    pub fn to_sql(&self) -> String {
        let where_sql = self.where_group.render(self.dialect);
        if where_sql.is_empty() {
            if self.allow_delete_all {
                return format!("DELETE FROM {}", self.table);
            }
            return format!("DELETE FROM {} WHERE 1=0", self.table);
        }
        format!("DELETE FROM {} WHERE {where_sql}", self.table)
    }
}

impl Conditions for DeleteQb {
    fn resolve(&self, condition: Condition) -> OrmResult<ConditionNode> {
        condition.into_node()
    }

    fn group_mut(&mut self) -> &mut ParenthesisGroup {
        &mut self.where_group
    }
}
