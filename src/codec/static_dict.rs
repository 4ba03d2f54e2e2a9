//! Static dictionary catalogues.
//!
//! A static dictionary is a pre-shared set of `(pattern, meta-token)`
//! bindings applied before dynamic discovery. Its meta-tokens are reserved
//! inside the meta range before dynamic allocation begins, and the same
//! catalogue must be supplied to decompress the artifact: static bindings
//! are never emitted into the stream's dictionary section.

use std::collections::{HashMap, HashSet};

use super::types::{DictionaryEntry, Token};
use crate::config::CompressionConfig;
use crate::error::{CompressError, Result};

/// Named catalogue of pre-shared pattern bindings.
#[derive(Debug, Clone)]
pub struct StaticDictionary {
    id: String,
    /// Bindings sorted longest pattern first; ties break on pattern
    /// contents so matching is deterministic.
    entries: Vec<DictionaryEntry>,
    by_meta: HashMap<Token, usize>,
}

impl StaticDictionary {
    /// Build a catalogue from `(pattern, meta_token)` bindings.
    pub fn new(id: impl Into<String>, bindings: Vec<(Vec<Token>, Token)>) -> Result<Self> {
        let mut entries: Vec<DictionaryEntry> = Vec::with_capacity(bindings.len());
        let mut by_meta = HashMap::with_capacity(bindings.len());

        for (pattern, meta_token) in bindings {
            if pattern.is_empty() {
                return Err(CompressError::ConfigInvalid(format!(
                    "static binding for 0x{meta_token:08X} has an empty pattern"
                )));
            }
            if by_meta.contains_key(&meta_token) {
                return Err(CompressError::ConfigInvalid(format!(
                    "duplicate static binding for meta-token 0x{meta_token:08X}"
                )));
            }
            by_meta.insert(meta_token, entries.len());
            entries.push(DictionaryEntry {
                meta_token,
                definition: pattern,
            });
        }

        let mut dict = Self {
            id: id.into(),
            entries,
            by_meta,
        };
        dict.sort_for_matching();
        Ok(dict)
    }

    fn sort_for_matching(&mut self) {
        self.entries.sort_by(|a, b| {
            b.definition
                .len()
                .cmp(&a.definition.len())
                .then_with(|| a.definition.cmp(&b.definition))
        });
        self.by_meta = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.meta_token, i))
            .collect();
    }

    /// Catalogue identifier recorded in compression results.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalogue holds no bindings.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Definition bound to `meta`, if any.
    pub fn definition(&self, meta: Token) -> Option<&[Token]> {
        self.by_meta
            .get(&meta)
            .map(|&i| self.entries[i].definition.as_slice())
    }

    /// The reserved meta-tokens.
    pub fn meta_tokens(&self) -> HashSet<Token> {
        self.by_meta.keys().copied().collect()
    }

    /// Highest reserved meta-token; dynamic allocation starts past it.
    pub fn max_meta(&self) -> Option<Token> {
        self.by_meta.keys().copied().max()
    }

    /// Check the catalogue against a configuration's token ranges.
    pub fn validate_against(&self, config: &CompressionConfig) -> Result<()> {
        for entry in &self.entries {
            if !config.is_meta(entry.meta_token) {
                return Err(CompressError::ConfigInvalid(format!(
                    "static meta-token 0x{:08X} outside the meta range",
                    entry.meta_token
                )));
            }
            for &token in &entry.definition {
                if !config.is_ordinary(token) {
                    return Err(CompressError::ConfigInvalid(format!(
                        "static pattern for 0x{:08X} contains reserved token 0x{token:08X}",
                        entry.meta_token
                    )));
                }
            }
        }
        Ok(())
    }

    /// Replace catalogue patterns in `tokens`, longest match first.
    pub fn apply(&self, tokens: &[Token]) -> Vec<Token> {
        let mut output = Vec::with_capacity(tokens.len());
        let mut i = 0;

        while i < tokens.len() {
            let remaining = &tokens[i..];
            let mut matched = false;

            for entry in &self.entries {
                if remaining.starts_with(&entry.definition) {
                    output.push(entry.meta_token);
                    i += entry.definition.len();
                    matched = true;
                    break;
                }
            }

            if !matched {
                output.push(tokens[i]);
                i += 1;
            }
        }

        output
    }
}
