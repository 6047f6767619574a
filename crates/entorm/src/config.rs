//! Session configuration.

use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use serde::Deserialize;

/// Modifiers accepted by [`SelectQuery::modifier`](crate::SelectQuery::modifier)
/// when modifier validation is enabled.
pub const DEFAULT_MODIFIERS: &[&str] = &[
    "DISTINCT",
    "ALL",
    "DISTINCTROW",
    "HIGH_PRIORITY",
    "STRAIGHT_JOIN",
    "SQL_SMALL_RESULT",
    "SQL_BIG_RESULT",
    "SQL_BUFFER_RESULT",
    "SQL_NO_CACHE",
    "SQL_CALC_FOUND_ROWS",
];

/// Configuration for a [`Session`](crate::Session).
///
/// Loading this from a file is left to the application; the struct
/// deserializes with every field optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Dialect used to quote values.
    pub dialect: Dialect,
    /// Reject modifiers that are not in the allow-list.
    pub validate_modifiers: bool,
    /// Extra modifiers accepted on top of [`DEFAULT_MODIFIERS`].
    pub extra_modifiers: Vec<String>,
    /// Upper bound for `EntityFetcher::all(0)`. `None` means unbounded.
    pub row_cap: Option<usize>,
    /// Truncate logged SQL (in bytes). `None` means no truncation.
    pub max_logged_sql: Option<usize>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::Postgres,
            validate_modifiers: false,
            extra_modifiers: Vec::new(),
            row_cap: None,
            max_logged_sql: Some(200),
        }
    }
}

impl SessionConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the dialect.
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Enable modifier validation.
    pub fn validate_modifiers(mut self, enabled: bool) -> Self {
        self.validate_modifiers = enabled;
        self
    }

    /// Accept an additional modifier keyword.
    pub fn allow_modifier(mut self, modifier: impl Into<String>) -> Self {
        self.extra_modifiers.push(modifier.into());
        self
    }

    /// Cap the number of rows `all(0)` returns.
    pub fn row_cap(mut self, cap: usize) -> Self {
        self.row_cap = Some(cap);
        self
    }

    /// Set maximum SQL length to log.
    pub fn max_logged_sql(mut self, len: usize) -> Self {
        self.max_logged_sql = Some(len);
        self
    }

    /// Disable SQL truncation in logs.
    pub fn no_truncate(mut self) -> Self {
        self.max_logged_sql = None;
        self
    }

    /// Modifier policy derived from this configuration.
    pub fn modifier_policy(&self) -> ModifierPolicy {
        if !self.validate_modifiers {
            return ModifierPolicy::Any;
        }
        let mut allowed: Vec<String> = DEFAULT_MODIFIERS.iter().map(|m| m.to_string()).collect();
        allowed.extend(self.extra_modifiers.iter().map(|m| m.to_uppercase()));
        ModifierPolicy::AllowList(allowed)
    }

    /// Check the configuration for contradictions.
    pub fn validate(&self) -> OrmResult<()> {
        if self.row_cap == Some(0) {
            return Err(OrmError::InvalidConfiguration(
                "row_cap must be greater than zero".to_string(),
            ));
        }
        if self.max_logged_sql == Some(0) {
            return Err(OrmError::InvalidConfiguration(
                "max_logged_sql must be greater than zero (use no_truncate to disable)".to_string(),
            ));
        }
        if let Some(bad) = self
            .extra_modifiers
            .iter()
            .find(|m| m.is_empty() || m.chars().any(|c| !(c.is_ascii_alphanumeric() || c == '_')))
        {
            return Err(OrmError::InvalidConfiguration(format!(
                "modifier '{bad}' is not a keyword"
            )));
        }
        Ok(())
    }
}

/// Which modifiers a query builder accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ModifierPolicy {
    /// Accept any modifier verbatim.
    #[default]
    Any,
    /// Accept only these keywords (upper case).
    AllowList(Vec<String>),
}

impl ModifierPolicy {
    /// Check a modifier against the policy.
    pub fn check(&self, modifier: &str) -> OrmResult<()> {
        match self {
            ModifierPolicy::Any => Ok(()),
            ModifierPolicy::AllowList(allowed) => {
                let upper = modifier.trim().to_uppercase();
                if allowed.iter().any(|m| *m == upper) {
                    Ok(())
                } else {
                    Err(OrmError::InvalidModifier(modifier.to_string()))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(SessionConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_row_cap_is_rejected() {
        let err = SessionConfig::new().row_cap(0).validate().unwrap_err();
        assert!(matches!(err, OrmError::InvalidConfiguration(_)));
    }

    #[test]
    fn deserializes_partial_config() {
        let cfg: SessionConfig =
            serde_json::from_str(r#"{"dialect":"sqlite","validate_modifiers":true}"#).unwrap();
        assert_eq!(cfg.dialect, Dialect::Sqlite);
        assert!(cfg.validate_modifiers);
        assert_eq!(cfg.max_logged_sql, Some(200));
    }

    #[test]
    fn modifier_policy() {
        let policy = SessionConfig::new()
            .validate_modifiers(true)
            .allow_modifier("sql_cache")
            .modifier_policy();
        assert!(policy.check("distinct").is_ok());
        assert!(policy.check("SQL_CACHE").is_ok());
        assert!(matches!(
            policy.check("DROP"),
            Err(OrmError::InvalidModifier(_))
        ));
        assert!(ModifierPolicy::Any.check("anything").is_ok());
    }
}
