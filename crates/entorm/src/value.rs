//! Values used in conditions and entity data.
//!
//! A [`Value`] is either a scalar, an ordered list of scalars, or a raw SQL
//! fragment that is emitted verbatim. Values are rendered inline by a
//! [`Dialect`](crate::Dialect); nothing is sent as a bind parameter.

use serde::{Deserialize, Serialize};

/// A scalar, list or raw SQL value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL NULL.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Ordered list of scalars (rendered comma separated).
    List(Vec<Value>),
    /// Literal SQL, never quoted.
    #[serde(skip_deserializing)]
    Raw(String),
}

impl Value {
    /// Create a literal SQL marker, e.g. `Value::raw("NOW()")`.
    pub fn raw(sql: impl Into<String>) -> Self {
        Value::Raw(sql.into())
    }

    /// Check if the value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if the value is a list.
    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    /// Borrow the text content, if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Integer content, parsing text values (text protocols return strings).
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Flatten into placeholder arguments: a list yields its items, anything
    /// else yields itself.
    pub fn into_args(self) -> Vec<Value> {
        match self {
            Value::List(items) => items,
            other => vec![other],
        }
    }

    /// Canonical text used for identity comparisons (`1` and `"1"` are equal).
    ///
    /// Returns `None` for NULL, lists and raw fragments.
    pub fn key_text(&self) -> Option<String> {
        match self {
            Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
            Value::Int(n) => Some(n.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Text(s) => Some(s.clone()),
            Value::Null | Value::List(_) | Value::Raw(_) => None,
        }
    }

    /// Loose equality: equal values, or scalars with the same canonical text.
    ///
    /// Text protocols return every column as a string, so a stored `42`
    /// comes back as `"42"` and a stored `TRUE` as `"t"` on PostgreSQL.
    pub fn same_as(&self, other: &Value) -> bool {
        if self == other {
            return true;
        }
        match (self, other) {
            (Value::Bool(b), Value::Text(s)) | (Value::Text(s), Value::Bool(b)) => {
                parse_bool_text(s) == Some(*b)
            }
            _ => match (self.key_text(), other.key_text()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

fn parse_bool_text(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "t" | "true" | "1" => Some(true),
        "f" | "false" | "0" => Some(false),
        _ => None,
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(v: [T; N]) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl From<chrono::NaiveDate> for Value {
    fn from(v: chrono::NaiveDate) -> Self {
        Value::Text(v.format("%Y-%m-%d").to_string())
    }
}

impl From<chrono::NaiveDateTime> for Value {
    fn from(v: chrono::NaiveDateTime) -> Self {
        Value::Text(v.format("%Y-%m-%d %H:%M:%S%.f").to_string())
    }
}

impl From<chrono::DateTime<chrono::Utc>> for Value {
    fn from(v: chrono::DateTime<chrono::Utc>) -> Self {
        Value::Text(v.to_rfc3339())
    }
}

impl From<uuid::Uuid> for Value {
    fn from(v: uuid::Uuid) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            // Objects have no scalar form; keep them as JSON text.
            obj @ serde_json::Value::Object(_) => Value::Text(obj.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions() {
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(42_i32), Value::Int(42));
        assert_eq!(Value::from(2.5_f64), Value::Float(2.5));
        assert_eq!(Value::from("hello"), Value::Text("hello".into()));
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some(7_u8)), Value::Int(7));
        assert_eq!(
            Value::from(["a", "b"]),
            Value::List(vec![Value::from("a"), Value::from("b")])
        );
    }

    #[test]
    fn key_text_normalizes_numbers_and_strings() {
        assert_eq!(Value::Int(1).key_text(), Value::from("1").key_text());
        assert_eq!(Value::Null.key_text(), None);
    }

    #[test]
    fn same_as_ignores_text_protocol_types() {
        assert!(Value::Int(42).same_as(&Value::from("42")));
        assert!(!Value::Int(42).same_as(&Value::from("43")));
        assert!(!Value::Null.same_as(&Value::from("")));
        assert!(Value::Null.same_as(&Value::Null));
    }

    #[test]
    fn same_as_reads_boolean_text() {
        assert!(Value::Bool(true).same_as(&Value::from("t")));
        assert!(Value::from("f").same_as(&Value::Bool(false)));
        assert!(Value::Bool(true).same_as(&Value::from("TRUE")));
        assert!(Value::Bool(false).same_as(&Value::from("0")));
        assert!(!Value::Bool(true).same_as(&Value::from("f")));
        assert!(!Value::Bool(true).same_as(&Value::from("yes")));
    }

    #[test]
    fn into_args_flattens_lists() {
        assert_eq!(Value::from(vec![1, 2]).into_args().len(), 2);
        assert_eq!(Value::from("doe").into_args(), vec![Value::from("doe")]);
    }

    #[test]
    fn json_round_trip_of_entity_data() {
        let data = vec![Value::Int(42), Value::from("mobile"), Value::Null];
        let json = serde_json::to_string(&data).unwrap();
        assert_eq!(json, r#"[42,"mobile",null]"#);
        let back: Vec<Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, data);
    }
}
