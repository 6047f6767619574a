//! Attribute parsing for the Entity derive macro.
//!
//! Handles struct-level `#[orm(...)]` attributes.

use heck::ToSnakeCase;
use syn::{DeriveInput, Result};

/// Parsed struct-level attributes.
#[derive(Default)]
pub(crate) struct EntityAttrs {
    pub table: Option<String>,
    pub primary_key: Option<Vec<String>>,
    pub column_prefix: Option<String>,
    pub naming: Option<(String, proc_macro2::Span)>,
    pub auto_increment: Option<bool>,
    pub aliases: Vec<(String, String)>,
    pub hooks: Option<syn::Path>,
}

impl syn::parse::Parse for EntityAttrs {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut attrs = EntityAttrs::default();

        // Comma-separated `key = value` pairs and `alias(field = "column", ...)`
        loop {
            if input.is_empty() {
                break;
            }

            let ident: syn::Ident = input.parse()?;
            if ident == "alias" {
                let content;
                syn::parenthesized!(content in input);
                while !content.is_empty() {
                    let field: syn::Ident = content.parse()?;
                    let _: syn::Token![=] = content.parse()?;
                    let column: syn::LitStr = content.parse()?;
                    attrs.aliases.push((field.to_string(), column.value()));
                    if content.peek(syn::Token![,]) {
                        let _: syn::Token![,] = content.parse()?;
                    }
                }
            } else {
                let _: syn::Token![=] = input.parse()?;
                match ident.to_string().as_str() {
                    "table" => attrs.table = Some(input.parse::<syn::LitStr>()?.value()),
                    "primary_key" => {
                        let lit: syn::LitStr = input.parse()?;
                        let fields: Vec<String> = lit
                            .value()
                            .split(',')
                            .map(|s| s.trim().to_string())
                            .filter(|s| !s.is_empty())
                            .collect();
                        if fields.is_empty() {
                            return Err(syn::Error::new_spanned(lit, "primary_key must name at least one field"));
                        }
                        attrs.primary_key = Some(fields);
                    }
                    "column_prefix" => {
                        attrs.column_prefix = Some(input.parse::<syn::LitStr>()?.value())
                    }
                    "naming" => {
                        let lit: syn::LitStr = input.parse()?;
                        attrs.naming = Some((lit.value(), lit.span()));
                    }
                    "auto_increment" => {
                        attrs.auto_increment = Some(input.parse::<syn::LitBool>()?.value)
                    }
                    "hooks" => attrs.hooks = Some(input.parse()?),
                    _ => {
                        return Err(syn::Error::new_spanned(
                            &ident,
                            format!("unknown orm attribute `{ident}`"),
                        ));
                    }
                }
            }

            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }

        Ok(attrs)
    }
}

impl EntityAttrs {
    /// Merge every `#[orm(...)]` attribute on the struct.
    pub(crate) fn from_input(input: &DeriveInput) -> Result<Self> {
        let mut merged = EntityAttrs::default();
        for attr in &input.attrs {
            if !attr.path().is_ident("orm") {
                continue;
            }
            let parsed: EntityAttrs = attr.parse_args()?;
            merged.table = parsed.table.or(merged.table);
            merged.primary_key = parsed.primary_key.or(merged.primary_key);
            merged.column_prefix = parsed.column_prefix.or(merged.column_prefix);
            merged.naming = parsed.naming.or(merged.naming);
            merged.auto_increment = parsed.auto_increment.or(merged.auto_increment);
            merged.hooks = parsed.hooks.or(merged.hooks);
            merged.aliases.extend(parsed.aliases);
        }
        Ok(merged)
    }

    /// Table name: explicit, or the snake_case type name.
    pub(crate) fn table_name(&self, ident: &syn::Ident) -> String {
        self.table
            .clone()
            .unwrap_or_else(|| ident.to_string().to_snake_case())
    }
}

/// Map a naming scheme name to its `NamingScheme` variant.
pub(crate) fn naming_variant(name: &str, span: proc_macro2::Span) -> Result<syn::Ident> {
    let variant = match name {
        "snake_lower" | "snake_case" => "SnakeLower",
        "SNAKE_UPPER" => "SnakeUpper",
        "Snake_Ucfirst" => "SnakeUcfirst",
        "camelCase" => "CamelCase",
        "StudlyCaps" => "StudlyCaps",
        "lower" => "Lower",
        "UPPER" => "Upper",
        "nochange" => "NoChange",
        _ => {
            return Err(syn::Error::new(
                span,
                format!("unknown naming scheme `{name}`"),
            ));
        }
    };
    Ok(syn::Ident::new(variant, span))
}
