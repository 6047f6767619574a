//! Error types for entorm

use thiserror::Error;

/// Result type alias for entorm operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for query building, entity tracking and execution.
#[derive(Debug, Error)]
pub enum OrmError {
    /// A `Class::field` or `alias.field` reference could not be resolved
    #[error("{0}")]
    NotJoined(String),

    /// Number of `?` placeholders does not match the number of arguments
    #[error("Placeholder count mismatch in '{expression}': expected {expected} arguments, got {got}")]
    PlaceholderCountMismatch {
        expression: String,
        expected: usize,
        got: usize,
    },

    /// `close()` without an open parenthesis, or an unclosed parenthesis
    #[error("No open parenthesis: {0}")]
    NoOpenParenthesis(String),

    /// A value that cannot be rendered as a SQL literal
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// The primary key of an entity is not fully known
    #[error("Incomplete primary key: {0}")]
    IncompletePrimaryKey(String),

    /// Field never seen in either the current or the original data
    #[error("Unknown field '{field}' on {entity}")]
    UnknownField { entity: String, field: String },

    /// Modifier rejected by the modifier allow-list
    #[error("Invalid modifier: {0}")]
    InvalidModifier(String),

    /// Invalid session configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A different instance is already mapped under the same key
    #[error("Identity conflict: {0}")]
    IdentityConflict(String),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Error reported by a non-postgres statement executor
    #[error("Executor error: {0}")]
    Executor(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl OrmError {
    /// Create a not-joined error for an unknown alias
    pub fn unknown_alias(alias: impl AsRef<str>) -> Self {
        Self::NotJoined(format!("Alias {} unknown", alias.as_ref()))
    }

    /// Create a not-joined error for an entity that is not part of the query
    pub fn class_not_joined(class: impl AsRef<str>) -> Self {
        Self::NotJoined(format!("Class {} not joined", class.as_ref()))
    }

    /// Create an unknown field error
    pub fn unknown_field(entity: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            entity: entity.into(),
            field: field.into(),
        }
    }

    /// Create an incomplete primary key error
    pub fn incomplete_key(message: impl Into<String>) -> Self {
        Self::IncompletePrimaryKey(message.into())
    }

    /// Create an unsupported type error
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedType(message.into())
    }

    /// Create an identity conflict error
    pub fn identity_conflict(message: impl Into<String>) -> Self {
        Self::IdentityConflict(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create an executor error
    pub fn executor(message: impl Into<String>) -> Self {
        Self::Executor(message.into())
    }

    /// Check if this is a not-joined error
    pub fn is_not_joined(&self) -> bool {
        matches!(self, Self::NotJoined(_))
    }

    /// Check if this is an incomplete primary key error
    pub fn is_incomplete_key(&self) -> bool {
        matches!(self, Self::IncompletePrimaryKey(_))
    }

    /// Check if this is an unknown field error
    pub fn is_unknown_field(&self) -> bool {
        matches!(self, Self::UnknownField { .. })
    }

    /// Check if this is an identity conflict error
    pub fn is_identity_conflict(&self) -> bool {
        matches!(self, Self::IdentityConflict(_))
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<serde_json::Error> for OrmError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
