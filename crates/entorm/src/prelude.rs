//! Convenient imports for typical `entorm` usage.
//!
//! ```ignore
//! use entorm::prelude::*;
//! ```

pub use crate::qb;
pub use crate::{
    Condition, ConditionTree, Conditions, Dialect, Direction, EntityDef, EntityRef, EntityType,
    JoinTarget, OrmError, OrmResult, QueryBuilder, SelectQuery, Session, SessionConfig,
    StatementExecutor, Value,
};

#[cfg(feature = "derive")]
pub use crate::Entity;
