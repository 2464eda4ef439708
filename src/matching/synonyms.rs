//! Alias → canonical commodity table.
//!
//! The table is an explicit value owned by whoever resolves prices; there is no
//! global registry. Keys are stored normalized, so lookups take the output of
//! [`normalize`](crate::matching::normalize) directly.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use crate::error::AppError;
use crate::matching::normalize;

/// Colloquial names seen in requests, mapped to the names used in the dataset.
const DEFAULT_SYNONYMS: [(&str, &str); 12] = [
    ("paddy", "rice"),
    ("brinjal", "eggplant"),
    ("ladyfinger", "okra"),
    ("bhindi", "okra"),
    ("chilli", "dry chillies"),
    ("chillies", "dry chillies"),
    ("chili", "dry chillies"),
    ("groundnut", "peanut"),
    ("arhar", "pigeon pea"),
    ("arhar dal", "pigeon pea"),
    ("bengal gram", "chana"),
    ("green gram", "moong"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynonymTable {
    aliases: HashMap<String, String>,
}

impl SynonymTable {
    /// An empty table: every lookup returns its input.
    pub fn empty() -> Self {
        Self {
            aliases: HashMap::new(),
        }
    }

    /// Build a table from `(alias, canonical)` pairs.
    ///
    /// Both sides are normalized; pairs whose alias normalizes to the empty string
    /// are dropped. Later pairs override earlier ones.
    pub fn from_pairs<I, A, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, C)>,
        A: AsRef<str>,
        C: AsRef<str>,
    {
        let mut table = Self::empty();
        table.extend(pairs);
        table
    }

    pub fn extend<I, A, C>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (A, C)>,
        A: AsRef<str>,
        C: AsRef<str>,
    {
        for (alias, canonical) in pairs {
            let alias = normalize(alias.as_ref());
            if alias.is_empty() {
                continue;
            }
            self.aliases.insert(alias, normalize(canonical.as_ref()));
        }
    }

    /// Built-in defaults extended (and overridden) by a JSON object file
    /// of the form `{ "alias": "canonical", ... }`.
    pub fn with_overrides_from(path: &Path) -> Result<Self, AppError> {
        let file = File::open(path).map_err(|e| {
            AppError::new(
                2,
                format!("Failed to open synonyms file '{}': {e}", path.display()),
            )
        })?;
        let overrides: HashMap<String, String> = serde_json::from_reader(file).map_err(|e| {
            AppError::new(
                2,
                format!("Invalid synonyms file '{}': {e}", path.display()),
            )
        })?;

        let mut table = Self::default();
        table.extend(overrides);
        Ok(table)
    }

    /// Resolve an already-normalized commodity label.
    ///
    /// Exact lookup only; unknown labels come back unchanged.
    pub fn resolve<'a>(&'a self, normalized: &'a str) -> &'a str {
        self.aliases
            .get(normalized)
            .map(String::as_str)
            .unwrap_or(normalized)
    }
}

impl Default for SynonymTable {
    fn default() -> Self {
        Self::from_pairs(DEFAULT_SYNONYMS)
    }
}
