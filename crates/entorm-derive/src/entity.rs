//! Entity derive macro implementation.

use crate::attrs::{EntityAttrs, naming_variant};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Result};

pub(crate) fn expand(input: DeriveInput) -> Result<TokenStream> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Entity cannot be derived for generic types",
        ));
    }

    let attrs = EntityAttrs::from_input(&input)?;
    let ident = &input.ident;
    let name = ident.to_string();
    let table = attrs.table_name(ident);

    let primary_key = attrs.primary_key.as_ref().map(|fields| {
        quote! { .primary_key([#(#fields),*]) }
    });
    let column_prefix = attrs.column_prefix.as_ref().map(|prefix| {
        quote! { .column_prefix(#prefix) }
    });
    let naming = match &attrs.naming {
        Some((scheme, span)) => {
            let variant = naming_variant(scheme, *span)?;
            Some(quote! { .naming(::entorm::NamingScheme::#variant) })
        }
        None => None,
    };
    let auto_increment = attrs.auto_increment.map(|enabled| {
        quote! { .auto_increment(#enabled) }
    });
    let aliases = attrs.aliases.iter().map(|(field, column)| {
        quote! { .column_alias(#field, #column) }
    });
    let hooks = attrs.hooks.as_ref().map(|path| {
        quote! { .hooks(<#path as ::core::default::Default>::default()) }
    });

    Ok(quote! {
        impl ::entorm::EntityType for #ident {
            const NAME: &'static str = #name;

            fn definition() -> ::entorm::EntityDef {
                ::entorm::EntityDef::new(#name, #table)
                    #primary_key
                    #column_prefix
                    #naming
                    #auto_increment
                    #(#aliases)*
                    #hooks
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_definition() {
        let input: DeriveInput = syn::parse_quote! {
            #[orm(table = "my_table", column_prefix = "stn_", naming = "snake_lower")]
            struct StaticTableName;
        };
        let tokens = expand(input).unwrap().to_string();
        assert!(tokens.contains("impl :: entorm :: EntityType for StaticTableName"));
        assert!(tokens.contains("\"my_table\""));
        assert!(tokens.contains(". column_prefix (\"stn_\")"));
        assert!(tokens.contains("NamingScheme :: SnakeLower"));
    }

    #[test]
    fn rejects_generics() {
        let input: DeriveInput = syn::parse_quote! {
            struct Wrapper<T>(T);
        };
        assert!(expand(input).is_err());
    }
}
