//! Dialect-aware value quoting.
//!
//! All values are rendered inline: the statement handed to a
//! [`StatementExecutor`](crate::StatementExecutor) carries no bind parameters.

use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// SQL dialect used to render literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// PostgreSQL (`standard_conforming_strings = on`).
    #[default]
    Postgres,
    /// SQLite.
    Sqlite,
    /// MySQL / MariaDB.
    Mysql,
}

impl Dialect {
    /// Quote a value as a SQL literal (or comma separated list of literals).
    ///
    /// Lists are rendered without surrounding parentheses; the caller adds
    /// them. Nested lists and non-finite floats fail with `UnsupportedType`.
    pub fn quote(&self, value: &Value) -> OrmResult<String> {
        check_quotable(value)?;
        Ok(self.literal(value))
    }

    /// Quote a string literal.
    pub fn quote_str(&self, s: &str) -> String {
        let mut out = String::with_capacity(s.len() + 2);
        self.write_str(&mut out, s);
        out
    }

    /// Literal for `true`/`false`.
    pub fn boolean(&self, value: bool) -> &'static str {
        match (self, value) {
            (Dialect::Postgres, true) => "TRUE",
            (Dialect::Postgres, false) => "FALSE",
            (_, true) => "1",
            (_, false) => "0",
        }
    }

    /// Whether `INSERT ... RETURNING *` is available.
    pub fn supports_returning(&self) -> bool {
        !matches!(self, Dialect::Mysql)
    }

    /// Replace each `?` in `expression` with the quoted argument at the same
    /// position. Question marks inside single-quoted literals are left alone.
    pub fn substitute(&self, expression: &str, args: &[Value]) -> OrmResult<String> {
        check_placeholders(expression, args)?;
        Ok(self.substitute_unchecked(expression, args))
    }

    /// Render a validated value. Never fails; callers validate with
    /// [`check_quotable`] first.
    pub(crate) fn literal(&self, value: &Value) -> String {
        let mut out = String::new();
        self.write_literal(&mut out, value);
        out
    }

    pub(crate) fn write_literal(&self, out: &mut String, value: &Value) {
        match value {
            Value::Null => out.push_str("NULL"),
            Value::Bool(b) => out.push_str(self.boolean(*b)),
            Value::Int(n) => out.push_str(&n.to_string()),
            Value::Float(f) => out.push_str(&f.to_string()),
            Value::Text(s) => self.write_str(out, s),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    self.write_literal(out, item);
                }
            }
            Value::Raw(sql) => out.push_str(sql),
        }
    }

    fn write_str(&self, out: &mut String, s: &str) {
        out.push('\'');
        for ch in s.chars() {
            match ch {
                '\'' => out.push_str("''"),
                '\\' if *self == Dialect::Mysql => out.push_str("\\\\"),
                _ => out.push(ch),
            }
        }
        out.push('\'');
    }

    /// Substitution for arguments already validated by [`check_placeholders`].
    pub(crate) fn substitute_unchecked(&self, expression: &str, args: &[Value]) -> String {
        let mut out = String::with_capacity(expression.len());
        let mut args = args.iter();
        let mut quote = None;
        for ch in expression.chars() {
            match ch {
                '?' if quote.is_none() => match args.next() {
                    Some(arg) => self.write_literal(&mut out, arg),
                    None => out.push(ch),
                },
                _ => {
                    quote = track_quote(quote, ch);
                    out.push(ch);
                }
            }
        }
        out
    }
}

/// Fail with `UnsupportedType` for values that have no literal form.
pub(crate) fn check_quotable(value: &Value) -> OrmResult<()> {
    match value {
        Value::Float(f) if !f.is_finite() => Err(OrmError::unsupported(format!(
            "non-finite float {f} has no SQL literal"
        ))),
        Value::List(items) => {
            for item in items {
                match item {
                    Value::List(_) => {
                        return Err(OrmError::unsupported("nested lists cannot be flattened"));
                    }
                    other => check_quotable(other)?,
                }
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Quote state after `ch`: entering or leaving a `'...'` literal or a
/// `"..."` identifier. A doubled quote leaves and re-enters.
fn track_quote(quote: Option<char>, ch: char) -> Option<char> {
    match (quote, ch) {
        (None, '\'' | '"') => Some(ch),
        (Some(q), c) if q == c => None,
        (state, _) => state,
    }
}

/// Count `?` placeholders outside quoted literals and identifiers.
pub(crate) fn count_placeholders(expression: &str) -> usize {
    let mut quote = None;
    let mut count = 0;
    for ch in expression.chars() {
        if ch == '?' && quote.is_none() {
            count += 1;
        } else {
            quote = track_quote(quote, ch);
        }
    }
    count
}

/// Validate that `args` fill every placeholder of `expression` exactly.
pub(crate) fn check_placeholders(expression: &str, args: &[Value]) -> OrmResult<()> {
    let expected = count_placeholders(expression);
    if expected != args.len() {
        return Err(OrmError::PlaceholderCountMismatch {
            expression: expression.to_string(),
            expected,
            got: args.len(),
        });
    }
    args.iter().try_for_each(check_quotable)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_scalars() {
        let d = Dialect::Postgres;
        assert_eq!(d.quote(&Value::Null).unwrap(), "NULL");
        assert_eq!(d.quote(&Value::Bool(true)).unwrap(), "TRUE");
        assert_eq!(d.quote(&Value::Int(-100)).unwrap(), "-100");
        assert_eq!(d.quote(&Value::Float(2.5)).unwrap(), "2.5");
        assert_eq!(d.quote(&Value::from("hello")).unwrap(), "'hello'");
        assert_eq!(d.quote(&Value::raw("NOW()")).unwrap(), "NOW()");
    }

    #[test]
    fn booleans_per_dialect() {
        assert_eq!(Dialect::Sqlite.quote(&Value::Bool(false)).unwrap(), "0");
        assert_eq!(Dialect::Mysql.quote(&Value::Bool(true)).unwrap(), "1");
    }

    #[test]
    fn quote_escapes_single_quotes() {
        let quoted = Dialect::Postgres.quote(&Value::from("O'Brien")).unwrap();
        assert_eq!(quoted, "'O''Brien'");
        // Strip the outer quotes and undo the doubling to get the input back.
        let inner = &quoted[1..quoted.len() - 1];
        assert_eq!(inner.replace("''", "'"), "O'Brien");
    }

    #[test]
    fn injection_attempt_stays_inside_literal() {
        let quoted = Dialect::Postgres
            .quote(&Value::from("'; DROP TABLE users; --"))
            .unwrap();
        assert_eq!(quoted, "'''; DROP TABLE users; --'");
    }

    #[test]
    fn mysql_escapes_backslashes() {
        assert_eq!(Dialect::Mysql.quote_str(r"a\b'c"), r"'a\\b''c'");
        assert_eq!(Dialect::Postgres.quote_str(r"a\b"), r"'a\b'");
    }

    #[test]
    fn lists_have_no_parentheses() {
        let list = Value::from(["John Doe", "Jane Doe"]);
        assert_eq!(
            Dialect::Postgres.quote(&list).unwrap(),
            "'John Doe','Jane Doe'"
        );
    }

    #[test]
    fn nested_lists_are_unsupported() {
        let nested = Value::List(vec![Value::from(vec![1, 2])]);
        let err = Dialect::Postgres.quote(&nested).unwrap_err();
        assert!(matches!(err, OrmError::UnsupportedType(_)));
        assert!(Dialect::Postgres.quote(&Value::Float(f64::NAN)).is_err());
    }

    #[test]
    fn substitute_placeholders() {
        let sql = Dialect::Postgres
            .substitute(
                "MATCH(name) AGAINST (? IN NATURAL LANGUAGE MODE)",
                &[Value::from("doe")],
            )
            .unwrap();
        assert_eq!(sql, "MATCH(name) AGAINST ('doe' IN NATURAL LANGUAGE MODE)");
    }

    #[test]
    fn substitute_skips_question_marks_in_literals() {
        let sql = Dialect::Postgres
            .substitute("note = 'why?' AND id = ?", &[Value::Int(3)])
            .unwrap();
        assert_eq!(sql, "note = 'why?' AND id = 3");
    }

    #[test]
    fn substitute_skips_question_marks_in_identifiers() {
        assert_eq!(count_placeholders(r#""why?" = ? AND note = 'it''s?'"#), 1);
        let sql = Dialect::Postgres
            .substitute(r#""why?" = ?"#, &[Value::from("yes")])
            .unwrap();
        assert_eq!(sql, r#""why?" = 'yes'"#);
    }

    #[test]
    fn substitute_count_mismatch() {
        let err = Dialect::Postgres
            .substitute("a = ? AND b = ?", &[Value::Int(1)])
            .unwrap_err();
        match err {
            OrmError::PlaceholderCountMismatch { expected, got, .. } => {
                assert_eq!((expected, got), (2, 1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
