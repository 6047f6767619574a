//! INSERT statement builder.

use crate::dialect::{Dialect, check_quotable};
use crate::error::OrmResult;
use crate::value::Value;

/// INSERT statement with inline values.
///
/// ```ignore
/// let sql = qb::insert("users")
///     .set("name", "alice")?
///     .set("age", 30)?
///     .returning(true)
///     .to_sql();
/// assert_eq!(sql, "INSERT INTO users (name, age) VALUES ('alice', 30) RETURNING *");
/// ```
#[derive(Clone, Debug)]
pub struct InsertQb {
    table: String,
    dialect: Dialect,
    columns: Vec<String>,
    values: Vec<Value>,
    returning: bool,
}

impl InsertQb {
    /// Create a new INSERT builder.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            dialect: Dialect::default(),
            columns: Vec::new(),
            values: Vec::new(),
            returning: false,
        }
    }

    /// Quote values for `dialect`.
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Set a column value. A column set twice keeps the last value.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> OrmResult<Self> {
        let column = column.into();
        let value = value.into();
        check_quotable(&value)?;
        match self.columns.iter().position(|c| *c == column) {
            Some(i) => self.values[i] = value,
            None => {
                self.columns.push(column);
                self.values.push(value);
            }
        }
        Ok(self)
    }

    /// Set several columns at once.
    pub fn values<I, K, V>(self, values: I) -> OrmResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        values
            .into_iter()
            .try_fold(self, |qb, (column, value)| qb.set(column, value))
    }

    /// Append `RETURNING *` where the dialect supports it.
    pub fn returning(mut self, returning: bool) -> Self {
        self.returning = returning;
        self
    }

    /// Number of columns set.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether no column is set.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Render the statement.
    ///
    /// Without columns the row is inserted with defaults only.
    pub fn to_sql(&self) -> String {
        let mut sql = format!("INSERT INTO {}", self.table);

        if self.columns.is_empty() {
            match self.dialect {
                Dialect::Mysql => sql.push_str(" () VALUES ()"),
                _ => sql.push_str(" DEFAULT VALUES"),
            }
        } else {
            let values: Vec<String> = self
                .values
                .iter()
                .map(|v| self.dialect.literal(v))
                .collect();
            sql.push_str(&format!(
                " ({}) VALUES ({})",
                self.columns.join(", "),
                values.join(", ")
            ));
        }

        if self.returning && self.dialect.supports_returning() {
            sql.push_str(" RETURNING *");
        }

        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_columns_in_call_order() {
        let sql = InsertQb::new("users")
            .set("name", "O'Brien")
            .unwrap()
            .set("age", 30)
            .unwrap()
            .to_sql();
        assert_eq!(sql, "INSERT INTO users (name, age) VALUES ('O''Brien', 30)");
    }

    #[test]
    fn last_value_wins() {
        let qb = InsertQb::new("users")
            .values([("name", "a"), ("name", "b")])
            .unwrap();
        assert_eq!(qb.len(), 1);
        assert_eq!(qb.to_sql(), "INSERT INTO users (name) VALUES ('b')");
    }

    #[test]
    fn returning_depends_on_dialect() {
        let qb = InsertQb::new("users").set("id", 1).unwrap().returning(true);
        assert_eq!(qb.to_sql(), "INSERT INTO users (id) VALUES (1) RETURNING *");
        let qb = qb.dialect(Dialect::Mysql);
        assert_eq!(qb.to_sql(), "INSERT INTO users (id) VALUES (1)");
    }

    #[test]
    fn empty_insert_uses_defaults() {
        assert_eq!(
            InsertQb::new("users").to_sql(),
            "INSERT INTO users DEFAULT VALUES"
        );
        assert_eq!(
            InsertQb::new("users").dialect(Dialect::Mysql).to_sql(),
            "INSERT INTO users () VALUES ()"
        );
    }

    #[test]
    fn rejects_nested_lists() {
        let nested = Value::List(vec![Value::from(vec![1])]);
        assert!(InsertQb::new("users").set("tags", nested).is_err());
    }
}
