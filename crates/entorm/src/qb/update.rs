//! UPDATE statement builder.

use super::condition::{Condition, ConditionNode};
use super::parenthesis::ParenthesisGroup;
use super::traits::Conditions;
use crate::dialect::{Dialect, check_quotable};
use crate::error::{OrmError, OrmResult};
use crate::value::Value;

/// UPDATE statement with inline values.
///
/// Conditions come from [`Conditions`], so `where_`, `or_where` and
/// parentheses work the same as on a SELECT builder. Column names are used as
/// written.
#[derive(Clone, Debug)]
pub struct UpdateQb {
    table: String,
    dialect: Dialect,
    set_fields: Vec<(String, Value)>,
    where_group: ParenthesisGroup,
}

impl UpdateQb {
    /// Create a new UPDATE builder.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            dialect: Dialect::default(),
            set_fields: Vec::new(),
            where_group: ParenthesisGroup::new(),
        }
    }

    /// Quote values for `dialect`.
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// `SET column = value`. A column set twice keeps the last value.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> OrmResult<Self> {
        let column = column.into();
        let value = value.into();
        check_quotable(&value)?;
        match self.set_fields.iter_mut().find(|(c, _)| *c == column) {
            Some((_, slot)) => *slot = value,
            None => self.set_fields.push((column, value)),
        }
        Ok(self)
    }

    /// Number of SET columns.
    pub fn len(&self) -> usize {
        self.set_fields.len()
    }

    /// Whether no SET column was given.
    pub fn is_empty(&self) -> bool {
        self.set_fields.is_empty()
    }

    /// Render the statement.
    ///
    /// Fails when nothing is set. Without conditions every row is updated.
    pub fn to_sql(&self) -> OrmResult<String> {
        if self.set_fields.is_empty() {
            return Err(OrmError::unsupported(format!(
                "UPDATE {} without columns to set",
                self.table
            )));
        }

        let set_parts: Vec<String> = self
            .set_fields
            .iter()
            .map(|(column, value)| format!("{column} = {}", self.dialect.literal(value)))
            .collect();
        let mut sql = format!("UPDATE {} SET {}", self.table, set_parts.join(", "));

        let where_sql = self.where_group.render(self.dialect);
        if !where_sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
        }

        Ok(sql)
    }
}

impl Conditions for UpdateQb {
    fn resolve(&self, condition: Condition) -> OrmResult<ConditionNode> {
        condition.into_node()
    }

    fn group_mut(&mut self) -> &mut ParenthesisGroup {
        &mut self.where_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_set_and_where() {
        let sql = UpdateQb::new("users")
            .set("name", "bob")
            .unwrap()
            .set("active", false)
            .unwrap()
            .where_(("id", 42))
            .unwrap()
            .to_sql()
            .unwrap();
        assert_eq!(
            sql,
            "UPDATE users SET name = 'bob', active = FALSE WHERE id = 42"
        );
    }

    #[test]
    fn last_value_wins() {
        let qb = UpdateQb::new("users")
            .set("name", "a")
            .unwrap()
            .set("name", Value::Null)
            .unwrap();
        assert_eq!(qb.len(), 1);
        assert_eq!(qb.to_sql().unwrap(), "UPDATE users SET name = NULL");
    }

    #[test]
    fn nothing_to_set_fails() {
        let err = UpdateQb::new("users").where_(("id", 1)).unwrap().to_sql();
        assert!(matches!(err, Err(OrmError::UnsupportedType(_))));
    }

    #[test]
    fn composite_key_with_parenthesis() {
        let sql = UpdateQb::new("memberships")
            .dialect(Dialect::Sqlite)
            .set("admin", true)
            .unwrap()
            .where_(("user_id", 1))
            .unwrap()
            .and_parenthesis()
            .where_(("group_id", 2))
            .unwrap()
            .or_where(("group_id", 3))
            .unwrap()
            .close()
            .to_sql()
            .unwrap();
        assert_eq!(
            sql,
            "UPDATE memberships SET admin = 1 WHERE user_id = 1 AND (group_id = 2 OR group_id = 3)"
        );
    }
}
