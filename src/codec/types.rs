//! Shared data model: tokens, candidates, occurrences, dictionary entries
//! and compression results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A token is a 32-bit unsigned integer ID.
pub type Token = u32;

/// Net token savings of defining a pattern of `length` tokens and replacing
/// `count` occurrences with references.
///
/// Original cost: `length * count` tokens. Compressed cost: `length`
/// definition tokens plus `count` references. Negative values mean the
/// replacement would grow the stream.
pub fn raw_savings(length: usize, count: usize) -> i64 {
    (length * count) as i64 - (length + count) as i64
}

/// Discovery gate: a pattern is worth reporting as a candidate only when
/// replacing its occurrences could shrink the stream, i.e. when
/// `length * count > length + count`.
pub fn is_compressible(length: usize, count: usize) -> bool {
    raw_savings(length, count) > 0
}

/// Net savings of a *selected* pattern: each replaced occurrence frees
/// `length - 1` tokens, the definition re-spends `length`.
///
/// Zero means break-even before framing; selection keeps break-even patterns
/// so that degenerate inputs (a single short pattern appearing exactly
/// twice) still compress.
pub fn selected_savings(length: usize, count: usize) -> i64 {
    ((length - 1) * count) as i64 - length as i64
}

/// A repeated pattern reported by discovery.
///
/// `positions` is the canonical occurrence list: start positions filtered to
/// a maximal non-overlapping subset, ascending. `count` is its length.
/// `frequency` is the unfiltered number of appearances in the input;
/// `raw_savings` is computed from it and drives the discovery ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Pattern contents (element values, not positions).
    pub pattern: Vec<Token>,
    /// Non-overlapping start positions, ascending.
    pub positions: Vec<usize>,
    /// Pattern length in tokens.
    pub length: usize,
    /// Number of non-overlapping occurrences.
    pub count: usize,
    /// Unfiltered appearance count.
    pub frequency: usize,
    /// `length * frequency - (length + frequency)`.
    pub raw_savings: i64,
    /// Externally assigned priority in `[0, 1]`; 0 when no scorer is set.
    pub priority: f64,
}

impl Candidate {
    /// Build a candidate from a pattern and its filtered occurrence list.
    pub fn new(pattern: Vec<Token>, positions: Vec<usize>, frequency: usize) -> Self {
        let length = pattern.len();
        let count = positions.len();
        Self {
            pattern,
            positions,
            length,
            count,
            frequency,
            raw_savings: raw_savings(length, frequency),
            priority: 0.0,
        }
    }
}

/// A concrete placement of a pattern in the input.
///
/// `pattern` indexes into the owning [`Selection`](crate::codec::Selection)'s
/// pattern table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    /// Start index in the input sequence.
    pub start: usize,
    /// Length in tokens.
    pub length: usize,
    /// Index of the pattern this occurrence instantiates.
    pub pattern: usize,
}

impl Occurrence {
    /// Exclusive end index.
    pub fn end(&self) -> usize {
        self.start + self.length
    }
}

/// One `(meta_token, definition)` pair of the emitted dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    /// The meta-token standing for the definition.
    pub meta_token: Token,
    /// The replaced subsequence. May reference earlier meta-tokens.
    pub definition: Vec<Token>,
}

/// Counters describing a single compression call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompressionMetrics {
    /// Candidates reported by discovery, summed over passes.
    pub candidates_discovered: usize,
    /// Distinct patterns that received a meta-token.
    pub patterns_selected: usize,
    /// Occurrences replaced in the body, summed over passes.
    pub occurrences_replaced: usize,
    /// Hierarchical passes that produced at least one entry.
    pub passes: usize,
    /// Body tokens saved by each productive pass.
    pub tokens_saved_per_pass: Vec<usize>,
}

/// Result of a compression call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionResult {
    /// Full serialized token stream (dictionary section + body).
    pub stream: Vec<Token>,
    /// Dictionary section including the framing control tokens; empty when
    /// nothing was selected.
    pub dictionary_tokens: Vec<Token>,
    /// Body section: the input with selected occurrences replaced.
    pub body_tokens: Vec<Token>,
    /// Dictionary entries in emitted (topological) order.
    pub dictionary: Vec<DictionaryEntry>,
    /// Input length in tokens.
    pub original_length: usize,
    /// `stream` length in tokens.
    pub compressed_length: usize,
    /// Identifier of the static dictionary applied, if any.
    pub static_dictionary_id: Option<String>,
    /// Per-call counters, present when metrics collection is enabled.
    pub metrics: Option<CompressionMetrics>,
}

impl CompressionResult {
    /// Compressed-to-original size ratio; 0.0 for empty input.
    pub fn ratio(&self) -> f64 {
        if self.original_length == 0 {
            0.0
        } else {
            self.compressed_length as f64 / self.original_length as f64
        }
    }

    /// Tokens saved by compression; negative when framing overhead won.
    pub fn tokens_saved(&self) -> i64 {
        self.original_length as i64 - self.compressed_length as i64
    }

    /// Whether the output is strictly shorter than the input.
    pub fn is_beneficial(&self) -> bool {
        self.compressed_length < self.original_length
    }

    /// The dictionary as a meta-token lookup map.
    pub fn dictionary_map(&self) -> HashMap<Token, Vec<Token>> {
        self.dictionary
            .iter()
            .map(|entry| (entry.meta_token, entry.definition.clone()))
            .collect()
    }
}
