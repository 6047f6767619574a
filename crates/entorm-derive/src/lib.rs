//! Derive macros for entorm
//!
//! Provides `#[derive(Entity)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod attrs;
mod entity;

/// Derive `EntityType` for a struct.
///
/// # Example
///
/// ```ignore
/// use entorm::{Entity, EntityType};
///
/// #[derive(Entity)]
/// #[orm(table = "my_table", column_prefix = "stn_")]
/// struct StaticTableName;
///
/// assert_eq!(StaticTableName::field("id"), "StaticTableName::id");
/// ```
///
/// # Attributes
///
/// - `#[orm(table = "name")]` - Table name (default: snake_case type name)
/// - `#[orm(primary_key = "a, b")]` - Primary key fields (default: `id`)
/// - `#[orm(column_prefix = "p_")]` - Prefix for every column name
/// - `#[orm(naming = "snake_lower")]` - Field to column naming scheme
/// - `#[orm(auto_increment = false)]` - Key is not generated by storage
/// - `#[orm(alias(field = "COLUMN"))]` - Explicit column for a field
/// - `#[orm(hooks = Path)]` - `EntityHooks` implementation (built with `Default`)
#[proc_macro_derive(Entity, attributes(orm))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    entity::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
