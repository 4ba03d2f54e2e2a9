//! Error types for compression and decompression.

use thiserror::Error;

/// Errors raised by the compression engine.
///
/// Every variant is fatal for the call that raised it: there is no retry and
/// no partial result. Stream-shape errors carry the token offset at which the
/// defect was detected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompressError {
    // === Configuration Errors ===
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    // === Compression Errors ===
    #[error("Input token 0x{token:08X} at index {index} lies in the reserved meta/control range")]
    TokenRangeCollision { token: u32, index: usize },

    #[error("Estimated working memory {estimated_mb} MB exceeds the configured cap of {cap_mb} MB")]
    MemoryExceeded { estimated_mb: usize, cap_mb: usize },

    // === Decompression Errors ===
    #[error("Malformed stream at offset {offset}: {reason}")]
    MalformedStream { offset: usize, reason: String },

    #[error("Undefined meta-token 0x{token:08X} referenced at offset {offset}")]
    UndefinedMetaToken { token: u32, offset: usize },

    #[error("Cycle in dictionary definitions involving meta-token 0x{token:08X}")]
    Cycle { token: u32 },

    #[error("Truncated stream at offset {offset}: {reason}")]
    Truncated { offset: usize, reason: String },

    // === Verification Errors ===
    #[error("Round-trip verification failed at offset {offset}")]
    VerificationFailure { offset: usize },
}

/// Result type alias for compression operations.
pub type Result<T> = std::result::Result<T, CompressError>;

impl From<toml::de::Error> for CompressError {
    fn from(err: toml::de::Error) -> Self {
        CompressError::ConfigInvalid(err.to_string())
    }
}
