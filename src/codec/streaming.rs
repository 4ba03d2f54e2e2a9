//! Chunk-accumulating streaming driver.
//!
//! Callers that receive token sequences in pieces (proxy buffers, staged
//! generation) feed chunks into a [`StreamingCompressor`] and call
//! [`finish`](StreamingCompressor::finish) once the sequence is complete.
//! The driver accumulates and invokes the engine exactly once; it does not
//! attempt true single-pass streaming, so patterns spanning chunk
//! boundaries compress exactly as they would in a single call.

use super::engine::CompressionEngine;
use super::types::{CompressionResult, Token};
use crate::config::CompressionConfig;
use crate::error::Result;

/// Accumulates token chunks and compresses them in one shot.
#[derive(Default)]
pub struct StreamingCompressor {
    engine: CompressionEngine,
    buffer: Vec<Token>,
    chunks_processed: usize,
}

impl StreamingCompressor {
    /// Create a driver with a fresh engine for `config`.
    pub fn new(config: CompressionConfig) -> Self {
        Self::with_engine(CompressionEngine::new(config))
    }

    /// Create a driver around an existing engine, keeping its hooks and
    /// static dictionary.
    pub fn with_engine(engine: CompressionEngine) -> Self {
        Self {
            engine,
            buffer: Vec::new(),
            chunks_processed: 0,
        }
    }

    /// Append a chunk to the pending sequence.
    pub fn push_chunk(&mut self, chunk: &[Token]) {
        self.buffer.extend_from_slice(chunk);
        self.chunks_processed += 1;
    }

    /// Tokens buffered so far.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Chunks accepted so far.
    pub fn chunks_processed(&self) -> usize {
        self.chunks_processed
    }

    /// Whether no tokens have been buffered.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Compress the accumulated sequence.
    pub fn finish(self) -> Result<CompressionResult> {
        self.engine.compress(&self.buffer)
    }
}
