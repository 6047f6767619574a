//! # entorm
//!
//! A query builder and entity tracker for relational databases.
//!
//! ## Features
//!
//! - **Query builder**: SELECT with nested AND/OR parentheses, joins,
//!   grouping, ordering and limits, rendered with inline quoted values
//! - **Alias resolution**: `Name::field`, `alias.field` and bare fields are
//!   qualified and translated to column names in entity-bound queries
//! - **Dirty tracking**: entities remember the stored row, so only changed
//!   columns are written back
//! - **Identity map**: one live instance per entity type and primary key
//! - **Safe defaults**: DELETE without conditions deletes nothing
//!
//! ## Query Builder (qb)
//!
//! ```ignore
//! use entorm::prelude::*;
//!
//! let sql = qb::select("foobar")
//!     .where_(("name", ["John Doe", "Jane Doe"]))?
//!     .or_parenthesis()
//!         .where_(("age", ">", 18))?
//!         .and_where("deleted_at IS NULL")?
//!     .close()
//!     .get_query();
//! // SELECT * FROM foobar WHERE name IN ('John Doe','Jane Doe') OR (age > 18 AND deleted_at IS NULL)
//! ```
//!
//! ## Entities
//!
//! ```ignore
//! use entorm::prelude::*;
//!
//! #[derive(Entity)]
//! #[orm(table = "contact_phone")]
//! struct ContactPhone;
//!
//! let mut session = Session::new(client);
//! let mut phones = session
//!     .fetch::<ContactPhone>()
//!     .where_(("name", "mobile"))?;
//! for phone in phones.all(0).await? {
//!     phone.lock().set("number", "+49 151 00000000");
//!     session.save(&phone).await?;
//! }
//! ```

pub mod client;
pub mod config;
pub mod dialect;
pub mod entity;
pub mod error;
pub mod fetcher;
pub mod identity;
pub mod naming;
pub mod prelude;
pub mod qb;
pub mod row;
pub mod session;
pub mod value;

pub use client::StatementExecutor;
pub use config::{DEFAULT_MODIFIERS, ModifierPolicy, SessionConfig};
pub use dialect::Dialect;
pub use entity::{
    DefaultKeyPolicy, Entity, EntityDef, EntityHooks, EntityState, EntityType, FieldChange,
    PrimaryKey, PrimaryKeyPolicy, Snapshot,
};
pub use error::{OrmError, OrmResult};
pub use fetcher::EntityFetcher;
pub use identity::{EntityRef, IdentityMap};
pub use naming::NamingScheme;
pub use row::Row;
pub use session::{SaveOutcome, Session};
pub use value::Value;

// Re-export qb module for easy access
pub use qb::{
    Condition, ConditionTree, Conditions, Direction, JoinTarget, QueryBuilder, SelectQuery,
    delete, insert, select, update,
};

#[cfg(feature = "derive")]
pub use entorm_derive::Entity;
