//! Token-sequence compression pipeline.
//!
//! The pipeline has five stages, leaves first:
//!
//! | Stage         | Module          | Role                                   |
//! |---------------|-----------------|----------------------------------------|
//! | Suffix index  | [`suffix`]      | Suffix array + LCP over the buffer     |
//! | Discovery     | [`discovery`]   | Repeated-pattern candidates            |
//! | Selection     | [`selection`]   | Non-overlapping occurrence choice      |
//! | Serialization | [`serialize`]   | Dictionary + body wire emission        |
//! | Expansion     | [`deserialize`] | Stream parsing and meta expansion      |
//!
//! The [`hierarchical`] driver loops the first four stages, treating each
//! pass's meta-tokens as ordinary input for the next. [`engine`] ties the
//! pipeline together behind [`CompressionEngine`]; [`streaming`] adds a
//! chunk-accumulating driver and [`static_dict`] the pre-shared catalogues.
//!
//! # Wire Format
//!
//! A compressed stream is a sequence of 32-bit token IDs, never bytes:
//!
//! ```text
//! [ DICT_START ]
//! [ meta_token ] [ def_len ] [ def tokens... ]     (repeated)
//! [ DICT_END ]
//! [ body tokens... ]
//! ```
//!
//! A stream of purely ordinary tokens carries no framing and decompresses
//! to itself.

pub mod deserialize;
pub mod discovery;
pub mod engine;
pub mod hierarchical;
pub mod selection;
pub mod serialize;
pub mod static_dict;
pub mod streaming;
pub mod suffix;
pub mod types;

pub use deserialize::{deserialize, deserialize_with};
pub use discovery::discover_candidates;
pub use engine::CompressionEngine;
pub use selection::{
    select_occurrences, AllowAll, IdentityScorer, PriorityScorer, RegionFilter, Selection,
    SelectionStrategy,
};
pub use static_dict::StaticDictionary;
pub use streaming::StreamingCompressor;
pub use types::{
    Candidate, CompressionMetrics, CompressionResult, DictionaryEntry, Occurrence, Token,
};

use crate::config::CompressionConfig;
use crate::error::Result;

/// Whether `stream` carries a dictionary section under `config`'s token
/// boundaries.
pub fn is_compressed_stream(stream: &[Token], config: &CompressionConfig) -> bool {
    stream.contains(&config.dict_start_token)
}

/// Compress `tokens` with a one-off engine.
pub fn compress(tokens: &[Token], config: &CompressionConfig) -> Result<CompressionResult> {
    CompressionEngine::new(config.clone()).compress(tokens)
}

/// Decompress `stream` with a one-off engine.
pub fn decompress(stream: &[Token], config: &CompressionConfig) -> Result<Vec<Token>> {
    CompressionEngine::new(config.clone()).decompress(stream)
}

/// Enumerate candidates with explicit length bounds and default settings
/// otherwise.
pub fn discover(tokens: &[Token], min_len: usize, max_len: usize) -> Result<Vec<Candidate>> {
    CompressionEngine::default().discover(tokens, min_len, max_len)
}
