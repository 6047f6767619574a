//! Query builders.
//!
//! [`QueryBuilder`] renders SELECT statements with nested AND/OR groups,
//! joins, grouping, ordering and limits. Values are quoted inline by the
//! builder's [`Dialect`](crate::Dialect), so the rendered statement needs no
//! bind parameters.
//!
//! # Usage
//!
//! ```ignore
//! use entorm::prelude::*;
//! use entorm::qb;
//!
//! // SELECT
//! let sql = qb::select("foobar")
//!     .where_("a = b")?
//!     .or_parenthesis()
//!         .where_(("name", "LIKE", "% Doe"))?
//!         .and_where(("age", ">", 18))?
//!     .close()
//!     .get_query();
//! // SELECT * FROM foobar WHERE a = b OR (name LIKE '% Doe' AND age > 18)
//!
//! // INSERT
//! let sql = qb::insert("users").set("name", "alice")?.to_sql();
//!
//! // UPDATE
//! let sql = qb::update("users").set("name", "bob")?.where_(("id", 1))?.to_sql()?;
//!
//! // DELETE
//! let sql = qb::delete("users").where_(("id", 1))?.to_sql();
//! ```

mod alias;
mod condition;
mod delete;
mod insert;
mod parenthesis;
mod select;
mod traits;
mod update;

pub use condition::{Condition, ConditionNode};
pub use delete::DeleteQb;
pub use insert::InsertQb;
pub use parenthesis::{ConditionTree, Connector, Parenthesis, ParenthesisGroup};
pub use select::{Direction, JoinKind, JoinOn, JoinTarget, QueryBuilder, ROOT_ALIAS};
pub use traits::{Conditions, SelectQuery};
pub use update::UpdateQb;

/// Create a SELECT builder for the given table.
pub fn select(table: &str) -> QueryBuilder {
    QueryBuilder::new(table)
}

/// Create an INSERT builder for the given table.
pub fn insert(table: &str) -> InsertQb {
    InsertQb::new(table)
}

/// Create an UPDATE builder for the given table.
pub fn update(table: &str) -> UpdateQb {
    UpdateQb::new(table)
}

/// Create a DELETE builder for the given table.
///
/// Without conditions the statement renders `WHERE 1=0` (no-op); use
/// [`DeleteQb::allow_delete_all`] to delete every row.
pub fn delete(table: &str) -> DeleteQb {
    DeleteQb::new(table)
}
