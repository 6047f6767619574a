//! Naming schemes translating entity field names to storage names.

use heck::{ToLowerCamelCase, ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::OrmError;

/// A pure string transform applied to field and table names.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub enum NamingScheme {
    /// `some_var`
    #[default]
    #[serde(rename = "snake_lower", alias = "snake_case")]
    SnakeLower,
    /// `SOME_VAR`
    #[serde(rename = "SNAKE_UPPER")]
    SnakeUpper,
    /// `Some_Var`
    #[serde(rename = "Snake_Ucfirst")]
    SnakeUcfirst,
    /// `someVar`
    #[serde(rename = "camelCase")]
    CamelCase,
    /// `SomeVar`
    #[serde(rename = "StudlyCaps")]
    StudlyCaps,
    /// `somevar`
    #[serde(rename = "lower")]
    Lower,
    /// `SOMEVAR`
    #[serde(rename = "UPPER")]
    Upper,
    /// Leave the name untouched.
    #[serde(rename = "nochange")]
    NoChange,
    /// Caller supplied transform.
    #[serde(skip)]
    Custom(fn(&str) -> String),
}

impl NamingScheme {
    /// Apply the scheme to `name`.
    pub fn apply(&self, name: &str) -> String {
        match self {
            NamingScheme::SnakeLower => name.to_snake_case(),
            NamingScheme::SnakeUpper => name.to_shouty_snake_case(),
            NamingScheme::SnakeUcfirst => name
                .to_snake_case()
                .split('_')
                .map(ucfirst)
                .collect::<Vec<_>>()
                .join("_"),
            NamingScheme::CamelCase => name.to_lower_camel_case(),
            NamingScheme::StudlyCaps => name.to_upper_camel_case(),
            NamingScheme::Lower => name.to_lowercase(),
            NamingScheme::Upper => name.to_uppercase(),
            NamingScheme::NoChange => name.to_string(),
            NamingScheme::Custom(f) => f(name),
        }
    }
}

fn ucfirst(part: &str) -> String {
    let mut chars = part.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl FromStr for NamingScheme {
    type Err = OrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "snake_lower" | "snake_case" => NamingScheme::SnakeLower,
            "SNAKE_UPPER" => NamingScheme::SnakeUpper,
            "Snake_Ucfirst" => NamingScheme::SnakeUcfirst,
            "camelCase" => NamingScheme::CamelCase,
            "StudlyCaps" | "studly" => NamingScheme::StudlyCaps,
            "lower" => NamingScheme::Lower,
            "UPPER" => NamingScheme::Upper,
            "nochange" => NamingScheme::NoChange,
            other => {
                return Err(OrmError::InvalidConfiguration(format!(
                    "Unknown naming scheme '{other}'"
                )));
            }
        })
    }
}
