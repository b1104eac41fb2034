//! # Alias Map
//!
//! Renames document keys between local aliases and canonical field names.
//!
//! An alias map is a plain `{ localAlias: canonicalKey }` table. Keys are
//! matched through the standardizer, so `Mood Score`, `mood_score` and
//! `moodScore` all hit the same alias. Aliasing works on JSON documents
//! above the engine and never touches logical identity.

use crate::standardize::standardize;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A bidirectional key-rename table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasMap {
    aliases: BTreeMap<String, String>,
}

impl AliasMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `alias` to `canonical`, replacing any alias that standardizes
    /// the same way.
    pub fn insert(&mut self, alias: impl Into<String>, canonical: impl Into<String>) {
        let alias = alias.into();
        let key = standardize(&alias);
        self.aliases.retain(|existing, _| standardize(existing) != key);
        self.aliases.insert(alias, canonical.into());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// The canonical name for a local key, or the key itself.
    #[must_use]
    pub fn canonical<'a>(&'a self, key: &'a str) -> &'a str {
        let wanted = standardize(key);
        self.aliases
            .iter()
            .find(|(alias, _)| standardize(alias) == wanted)
            .map(|(_, canonical)| canonical.as_str())
            .unwrap_or(key)
    }

    /// The local alias for a canonical key, or the key itself.
    #[must_use]
    pub fn local<'a>(&'a self, key: &'a str) -> &'a str {
        let wanted = standardize(key);
        self.aliases
            .iter()
            .find(|(_, canonical)| standardize(canonical) == wanted)
            .map(|(alias, _)| alias.as_str())
            .unwrap_or(key)
    }

    /// Rename every object key of `doc` from local aliases to canonical keys.
    #[must_use]
    pub fn to_canonical(&self, doc: &Value) -> Value {
        rename(doc, &|key| self.canonical(key).to_string())
    }

    /// Rename every object key of `doc` from canonical keys to local aliases.
    #[must_use]
    pub fn to_local(&self, doc: &Value) -> Value {
        rename(doc, &|key| self.local(key).to_string())
    }
}

impl<A: Into<String>, C: Into<String>> FromIterator<(A, C)> for AliasMap {
    fn from_iter<I: IntoIterator<Item = (A, C)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (alias, canonical) in iter {
            map.insert(alias, canonical);
        }
        map
    }
}

fn rename(doc: &Value, rename_key: &dyn Fn(&str) -> String) -> Value {
    match doc {
        Value::Object(fields) => {
            let renamed: Map<String, Value> = fields
                .iter()
                .map(|(key, value)| (rename_key(key), rename(value, rename_key)))
                .collect();
            Value::Object(renamed)
        }
        Value::Array(items) => Value::Array(items.iter().map(|v| rename(v, rename_key)).collect()),
        other => other.clone(),
    }
}
