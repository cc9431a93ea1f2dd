//! Artist alias resolution: known misspellings → canonical spelling.

use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

use crate::grammar::{self, ARTIST_LIST_SEPARATOR, FILLER};
use crate::rules::RulesError;

/// Case-insensitive alias lookup.
///
/// Keys and values are kept in on-disk form (spaces as filler) so they line
/// up with tokens taken from a normalized filename. Several keys may point at
/// the same canonical spelling.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    entries: FxHashMap<String, String>,
}

/// Lookup key for a token: lowercase, spaces as filler.
fn alias_key(token: &str) -> String {
    token.trim().to_lowercase().replace(' ', &FILLER.to_string())
}

impl AliasTable {
    pub fn new(aliases: &BTreeMap<String, String>) -> Result<Self, RulesError> {
        let mut entries = FxHashMap::default();
        for (key, value) in aliases {
            let key = alias_key(key);
            if key.is_empty() {
                return Err(RulesError::EmptyEntry { table: "aliases" });
            }
            let canonical = value.trim().replace(' ', &FILLER.to_string());
            if !grammar::is_artist_token(&canonical) {
                return Err(RulesError::InvalidAlias {
                    key,
                    value: value.clone(),
                });
            }
            entries.insert(key, canonical);
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Canonical spelling for one artist token, or the token unchanged.
    pub fn resolve_token<'a>(&'a self, token: &'a str) -> &'a str {
        self.entries
            .get(&alias_key(token))
            .map(String::as_str)
            .unwrap_or(token)
    }

    /// Resolves every artist in a `", "`-separated artist segment. Order and
    /// duplicates are preserved.
    pub fn resolve(&self, artist_segment: &str) -> String {
        artist_segment
            .split(ARTIST_LIST_SEPARATOR)
            .map(|token| self.resolve_token(token))
            .collect::<Vec<_>>()
            .join(ARTIST_LIST_SEPARATOR)
    }
}
