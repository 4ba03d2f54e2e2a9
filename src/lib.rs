//! # metatok - Lossless Token-Sequence Compression
//!
//! Dictionary compression for integer token sequences headed into large
//! language models. Repeated multi-token subsequences are replaced with
//! reserved *meta-tokens*, and the output stream is prefixed with a
//! self-describing dictionary that maps each meta-token back to its
//! subsequence. The guarantee is exact round-trip:
//! `decompress(compress(tokens)) == tokens`.
//!
//! ## Pipeline
//!
//! ```text
//! tokens ──> suffix array + LCP ──> discovery ──> selection ──> serializer ──> stream
//!                                        ^                          │
//!                                        └── hierarchical passes ───┘
//! ```
//!
//! Each hierarchical pass treats the previous pass's meta-tokens as
//! ordinary input, so nested structure keeps folding until a pass stops
//! paying for itself.
//!
//! ## Token Space
//!
//! | Range    | Default values                      | Meaning              |
//! |----------|-------------------------------------|----------------------|
//! | ordinary | `0 .. 0xFFFF0000`                   | application tokens   |
//! | meta     | `0xFFFF0000 .. 0xFFFFFFF0`          | allocated to patterns|
//! | control  | `0xFFFFFFF0`, `0xFFFFFFF1`          | dictionary framing   |
//!
//! Input containing meta or control values is rejected with
//! [`CompressError::TokenRangeCollision`].
//!
//! ## Quick Start
//!
//! ```rust
//! use metatok::{compress, decompress, CompressionConfig};
//!
//! let config = CompressionConfig::default();
//! let tokens = vec![1, 2, 3, 1, 2, 3, 1, 2, 3];
//!
//! let result = compress(&tokens, &config).unwrap();
//! println!(
//!     "{} -> {} tokens ({:.0}%)",
//!     result.original_length,
//!     result.compressed_length,
//!     result.ratio() * 100.0
//! );
//!
//! let restored = decompress(&result.stream, &config).unwrap();
//! assert_eq!(restored, tokens);
//! ```
//!
//! ### Selection Modes
//!
//! ```rust
//! use metatok::{CompressionConfig, CompressionEngine, SelectionMode};
//!
//! let engine = CompressionEngine::new(CompressionConfig {
//!     selection_mode: SelectionMode::Optimal,
//!     ..Default::default()
//! });
//! let result = engine.compress(&[1, 2, 1, 2, 1, 2, 1, 2]).unwrap();
//! assert_eq!(engine.decompress(&result.stream).unwrap(), vec![1, 2, 1, 2, 1, 2, 1, 2]);
//! ```
//!
//! ## Modules
//!
//! - [`codec`]: the compression pipeline and engine
//! - [`config`]: configuration structs, TOML and env loading
//! - [`error`]: error taxonomy and result alias

pub mod codec;
pub mod config;
pub mod error;

// Re-exports for convenience
pub use codec::{
    compress, decompress, discover, is_compressed_stream, Candidate, CompressionEngine,
    CompressionMetrics, CompressionResult, DictionaryEntry, Occurrence, PriorityScorer,
    RegionFilter, Selection, StaticDictionary, StreamingCompressor, Token,
};
pub use config::{CompressionConfig, SelectionMode};
pub use error::{CompressError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
