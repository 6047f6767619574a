//! Condition input and resolved condition nodes.

use crate::dialect::{Dialect, check_placeholders, check_quotable};
use crate::error::OrmResult;
use crate::value::Value;

/// A condition as the caller writes it.
///
/// Tuples convert the same way the builder methods are usually called:
///
/// ```ignore
/// qb.where_("firstname = lastname")?                     // raw
///   .where_(("name", "John Doe"))?                       // name = 'John Doe'
///   .where_(("name", ["John Doe", "Jane Doe"]))?         // name IN (...)
///   .where_(("name", "LIKE", "% Doe"))?                  // explicit operator
///   .where_(("MATCH(name) AGAINST (?)", "doe"))?;        // raw with args
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Expression with `?` placeholders filled from `args`.
    Raw { expression: String, args: Vec<Value> },
    /// `column operator value`; the operator is inferred when `None`.
    Compare {
        column: String,
        operator: Option<String>,
        value: Value,
    },
}

impl Condition {
    /// Raw expression without arguments.
    pub fn raw(expression: impl Into<String>) -> Self {
        Condition::Raw {
            expression: expression.into(),
            args: Vec::new(),
        }
    }

    /// Raw expression with one argument per placeholder.
    pub fn raw_with(expression: impl Into<String>, args: Vec<Value>) -> Self {
        Condition::Raw {
            expression: expression.into(),
            args,
        }
    }

    /// `column = value` (or `IN`/`IS NULL` depending on the value).
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Compare {
            column: column.into(),
            operator: None,
            value: value.into(),
        }
    }

    /// `column operator value`.
    pub fn cmp(
        column: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Condition::Compare {
            column: column.into(),
            operator: Some(operator.into()),
            value: value.into(),
        }
    }

    /// `column LIKE pattern`.
    pub fn like(column: impl Into<String>, pattern: impl Into<Value>) -> Self {
        Self::cmp(column, "LIKE", pattern)
    }

    /// `column NOT IN (values)`.
    pub fn not_in(column: impl Into<String>, values: impl Into<Value>) -> Self {
        Self::cmp(column, "NOT IN", values)
    }

    /// `column IS NULL`.
    pub fn is_null(column: impl Into<String>) -> Self {
        Self::eq(column, Value::Null)
    }

    /// Validate placeholders and values, keeping column names as written.
    pub(crate) fn into_node(self) -> OrmResult<ConditionNode> {
        match self {
            Condition::Raw { expression, args } => {
                check_placeholders(&expression, &args)?;
                Ok(ConditionNode::Raw { expression, args })
            }
            Condition::Compare {
                column,
                operator,
                value,
            } => {
                check_quotable(&value)?;
                Ok(ConditionNode::Compare {
                    column,
                    operator,
                    value,
                })
            }
        }
    }
}

impl From<&str> for Condition {
    fn from(expression: &str) -> Self {
        Condition::raw(expression)
    }
}

impl From<String> for Condition {
    fn from(expression: String) -> Self {
        Condition::raw(expression)
    }
}

impl<K: Into<String>, V: Into<Value>> From<(K, V)> for Condition {
    fn from((column, value): (K, V)) -> Self {
        let column = column.into();
        if column.contains('?') {
            Condition::raw_with(column, value.into().into_args())
        } else {
            Condition::eq(column, value)
        }
    }
}

impl<K: Into<String>, O: Into<String>, V: Into<Value>> From<(K, O, V)> for Condition {
    fn from((column, operator, value): (K, O, V)) -> Self {
        Condition::cmp(column, operator, value)
    }
}

/// A validated condition stored in a parenthesis group.
///
/// Columns are already resolved and placeholder counts checked, so rendering
/// cannot fail.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionNode {
    /// Raw expression and its arguments.
    Raw { expression: String, args: Vec<Value> },
    /// Comparison against a resolved column.
    Compare {
        column: String,
        operator: Option<String>,
        value: Value,
    },
}

impl ConditionNode {
    /// Render the node with values quoted for `dialect`.
    pub fn render(&self, dialect: Dialect) -> String {
        match self {
            ConditionNode::Raw { expression, args } => {
                dialect.substitute_unchecked(expression, args)
            }
            ConditionNode::Compare {
                column,
                operator: None,
                value,
            } => match value {
                Value::List(items) if items.is_empty() => "1=0".to_string(),
                Value::List(_) => format!("{column} IN ({})", dialect.literal(value)),
                Value::Null => format!("{column} IS NULL"),
                _ => format!("{column} = {}", dialect.literal(value)),
            },
            ConditionNode::Compare {
                column,
                operator: Some(operator),
                value,
            } => match value {
                Value::List(items) if items.is_empty() => {
                    // Never emit `IN ()`.
                    if is_negated_in(operator) {
                        "1=1".to_string()
                    } else {
                        "1=0".to_string()
                    }
                }
                Value::List(_) => format!("{column} {operator} ({})", dialect.literal(value)),
                _ => format!("{column} {operator} {}", dialect.literal(value)),
            },
        }
    }
}

fn is_negated_in(operator: &str) -> bool {
    let mut words = operator.split_whitespace();
    matches!(
        (words.next(), words.next(), words.next()),
        (Some(not), Some(op), None) if not.eq_ignore_ascii_case("not") && op.eq_ignore_ascii_case("in")
    )
}
