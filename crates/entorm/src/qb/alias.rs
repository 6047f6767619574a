//! Alias table and column reference resolution.
//!
//! Entity-bound builders qualify every column reference with a table alias:
//!
//! * `Name::field` resolves through the alias `Name` was first joined under,
//! * `alias.field` resolves through a registered alias,
//! * a bare `field` resolves to the root alias.
//!
//! Field names are translated to column names by the owning entity
//! definition. Plain builders pass references through untouched, except for
//! `Name::field` references to entities joined into them.

use crate::entity::EntityDef;
use crate::error::{OrmError, OrmResult};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct AliasEntry {
    table: String,
    def: Option<Arc<EntityDef>>,
}

/// Registered aliases of one builder.
#[derive(Debug, Clone, Default)]
pub(crate) struct AliasTable {
    root: Option<String>,
    entity_bound: bool,
    aliases: HashMap<String, AliasEntry>,
    classes: HashMap<String, String>,
}

/// Words that may start a WHERE expression without being a column.
const LEADING_KEYWORDS: &[&str] = &[
    "NOT",
    "EXISTS",
    "CASE",
    "NULL",
    "TRUE",
    "FALSE",
    "SELECT",
    "WITH",
    "INTERVAL",
    "CAST",
    "CURRENT_DATE",
    "CURRENT_TIME",
    "CURRENT_TIMESTAMP",
    "CURRENT_USER",
    "SESSION_USER",
    "LOCALTIME",
    "LOCALTIMESTAMP",
    "DATE",
    "TIME",
    "TIMESTAMP",
    "ARRAY",
    "ROW",
];

impl AliasTable {
    /// Table for a plain builder.
    pub(crate) fn plain() -> Self {
        Self::default()
    }

    /// Table for a builder bound to `def` under `alias`.
    pub(crate) fn for_entity(def: Arc<EntityDef>, alias: &str) -> Self {
        let mut table = Self {
            root: Some(alias.to_string()),
            entity_bound: true,
            ..Self::default()
        };
        table.register(alias, def.table.clone(), Some(def));
        table
    }

    /// Whether column references are qualified.
    pub(crate) fn is_entity_bound(&self) -> bool {
        self.entity_bound
    }

    /// Set the root alias of a plain builder.
    pub(crate) fn set_root(&mut self, alias: &str, table: &str) {
        self.root = Some(alias.to_string());
        self.register(alias, table.to_string(), None);
    }

    /// Register an alias. An entity keeps the first alias it was joined under.
    pub(crate) fn register(&mut self, alias: &str, table: String, def: Option<Arc<EntityDef>>) {
        if let Some(def) = &def {
            self.classes
                .entry(def.name.clone())
                .or_insert_with(|| alias.to_string());
        }
        self.aliases
            .insert(alias.to_string(), AliasEntry { table, def });
    }

    /// Lowest `t<N>` (N >= 1) not registered yet.
    pub(crate) fn next_free(&self) -> String {
        let mut n = 1;
        while self.aliases.contains_key(&format!("t{n}")) {
            n += 1;
        }
        format!("t{n}")
    }

    /// Table registered under `alias`.
    pub(crate) fn table_of(&self, alias: &str) -> Option<&str> {
        self.aliases.get(alias).map(|entry| entry.table.as_str())
    }

    /// Resolve a column reference or, for anything that is not a plain
    /// reference, translate the references inside the expression.
    pub(crate) fn resolve_column(&self, reference: &str) -> OrmResult<String> {
        let reference = reference.trim();
        if let Some((class, field)) = split_class_ref(reference) {
            return self.qualify_class(class, field);
        }
        if !self.entity_bound {
            return Ok(self.translate(reference, false));
        }
        if let Some((alias, field)) = split_alias_ref(reference) {
            return self.qualify_alias(alias, field);
        }
        if is_identifier(reference) {
            return Ok(self.qualify_root(reference));
        }
        Ok(self.translate(reference, false))
    }

    /// Translate `Name::field` and `alias.field` references inside a raw
    /// expression. With `leading`, an identifier starting the expression is
    /// treated as a root column (`id = 23` becomes `t0.id = 23`).
    ///
    /// Unknown names are left as written: `::` doubles as a cast operator and
    /// dotted names may be schema-qualified.
    pub(crate) fn translate(&self, expression: &str, leading: bool) -> String {
        if self.classes.is_empty() && !self.entity_bound {
            return expression.to_string();
        }
        let chars: Vec<char> = expression.chars().collect();
        let mut out = String::with_capacity(expression.len() + 8);
        let mut i = 0;
        let mut first_token = true;

        while i < chars.len() {
            let ch = chars[i];
            if ch == '\'' || ch == '"' {
                let end = skip_quoted(&chars, i);
                out.extend(&chars[i..end]);
                i = end;
                first_token = false;
                continue;
            }
            if ch.is_ascii_digit() {
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '.') {
                    out.push(chars[i]);
                    i += 1;
                }
                first_token = false;
                continue;
            }
            if !is_ident_start(ch) {
                out.push(ch);
                if !ch.is_whitespace() {
                    first_token = false;
                }
                i += 1;
                continue;
            }

            let start = i;
            while i < chars.len() && is_ident_char(chars[i]) {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            let was_first = first_token;
            first_token = false;

            // Name::field
            if chars.get(i) == Some(&':') && chars.get(i + 1) == Some(&':') {
                let field_start = i + 2;
                let mut end = field_start;
                while end < chars.len() && is_ident_char(chars[end]) {
                    end += 1;
                }
                let field: String = chars[field_start..end].iter().collect();
                if !field.is_empty() {
                    if let Ok(column) = self.qualify_class(&word, &field) {
                        out.push_str(&column);
                        i = end;
                        continue;
                    }
                }
                out.push_str(&word);
                continue;
            }

            // alias.field / alias.*
            if chars.get(i) == Some(&'.') && self.entity_bound {
                let field_start = i + 1;
                let mut end = field_start;
                if chars.get(field_start) == Some(&'*') {
                    end += 1;
                } else {
                    while end < chars.len() && is_ident_char(chars[end]) {
                        end += 1;
                    }
                }
                let field: String = chars[field_start..end].iter().collect();
                if !field.is_empty() {
                    if let Ok(column) = self.qualify_alias(&word, &field) {
                        out.push_str(&column);
                        i = end;
                        continue;
                    }
                }
                out.push_str(&word);
                continue;
            }

            let next = chars[i..].iter().find(|c| !c.is_whitespace());
            if leading
                && was_first
                && self.entity_bound
                && next != Some(&'(')
                && next != Some(&'.')
                && !LEADING_KEYWORDS
                    .iter()
                    .any(|kw| kw.eq_ignore_ascii_case(&word))
            {
                out.push_str(&self.qualify_root(&word));
                continue;
            }
            out.push_str(&word);
        }
        out
    }

    fn qualify_class(&self, class: &str, field: &str) -> OrmResult<String> {
        let alias = self
            .classes
            .get(class)
            .ok_or_else(|| OrmError::class_not_joined(class))?;
        self.qualify_alias(alias, field)
    }

    fn qualify_alias(&self, alias: &str, field: &str) -> OrmResult<String> {
        let entry = self
            .aliases
            .get(alias)
            .ok_or_else(|| OrmError::unknown_alias(alias))?;
        let column = match (&entry.def, field) {
            (_, "*") => "*".to_string(),
            (Some(def), field) => def.column_name(field),
            (None, field) => field.to_string(),
        };
        Ok(format!("{alias}.{column}"))
    }

    fn qualify_root(&self, field: &str) -> String {
        match &self.root {
            Some(root) => match self.qualify_alias(root, field) {
                Ok(column) => column,
                Err(_) => format!("{root}.{field}"),
            },
            None => field.to_string(),
        }
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if is_ident_start(c)) && chars.all(is_ident_char)
}

fn split_class_ref(reference: &str) -> Option<(&str, &str)> {
    let (class, field) = reference.split_once("::")?;
    (is_identifier(class) && is_identifier(field)).then_some((class, field))
}

fn split_alias_ref(reference: &str) -> Option<(&str, &str)> {
    let (alias, field) = reference.split_once('.')?;
    (is_identifier(alias) && (field == "*" || is_identifier(field))).then_some((alias, field))
}

/// Index just past the closing quote (doubled quotes are escapes).
fn skip_quoted(chars: &[char], start: usize) -> usize {
    let quote = chars[start];
    let mut i = start + 1;
    while i < chars.len() {
        if chars[i] == quote {
            if chars.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    chars.len()
}
