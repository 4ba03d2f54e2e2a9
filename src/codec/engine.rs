//! Compression engine facade.
//!
//! [`CompressionEngine`] owns the configuration and the collaborator hooks
//! and drives the full pipeline: input validation, static dictionary
//! application, the hierarchical pass loop, serialization and the optional
//! round-trip verification. The engine is a pure function over its inputs;
//! a call holds no shared mutable state and may run on any thread.

use std::collections::HashSet;

use super::deserialize::deserialize_with;
use super::discovery::discover_candidates;
use super::hierarchical::run_passes;
use super::selection::{AllowAll, IdentityScorer, PriorityScorer, RegionFilter};
use super::serialize::emit_stream;
use super::static_dict::StaticDictionary;
use super::types::{Candidate, CompressionMetrics, CompressionResult, Token};
use crate::config::CompressionConfig;
use crate::error::{CompressError, Result};

/// Rough bytes of working memory per input token: the token buffer plus the
/// suffix-array, rank and LCP arrays.
const WORKING_BYTES_PER_TOKEN: usize = 48;

/// Compression engine with configurable hooks.
pub struct CompressionEngine {
    config: CompressionConfig,
    scorer: Box<dyn PriorityScorer + Send + Sync>,
    filter: Box<dyn RegionFilter + Send + Sync>,
    static_dict: Option<StaticDictionary>,
}

impl Default for CompressionEngine {
    fn default() -> Self {
        Self::new(CompressionConfig::default())
    }
}

impl CompressionEngine {
    /// Create an engine with the identity scorer and allow-all filter.
    pub fn new(config: CompressionConfig) -> Self {
        Self {
            config,
            scorer: Box::new(IdentityScorer),
            filter: Box::new(AllowAll),
            static_dict: None,
        }
    }

    /// Set an external priority scorer.
    pub fn with_scorer(mut self, scorer: Box<dyn PriorityScorer + Send + Sync>) -> Self {
        self.scorer = scorer;
        self
    }

    /// Set a region filter vetoing candidates in protected spans.
    pub fn with_region_filter(mut self, filter: Box<dyn RegionFilter + Send + Sync>) -> Self {
        self.filter = filter;
        self
    }

    /// Attach a static dictionary applied before dynamic discovery.
    pub fn with_static_dictionary(mut self, dict: StaticDictionary) -> Self {
        self.static_dict = Some(dict);
        self
    }

    /// The engine's configuration.
    pub fn config(&self) -> &CompressionConfig {
        &self.config
    }

    /// Compress `tokens` into a self-describing stream.
    pub fn compress(&self, tokens: &[Token]) -> Result<CompressionResult> {
        self.config.validate()?;

        for (index, &token) in tokens.iter().enumerate() {
            if !self.config.is_ordinary(token) {
                return Err(CompressError::TokenRangeCollision { token, index });
            }
        }

        let estimated_mb = (tokens.len() * WORKING_BYTES_PER_TOKEN) >> 20;
        if estimated_mb > self.config.max_memory_mb {
            return Err(CompressError::MemoryExceeded {
                estimated_mb,
                cap_mb: self.config.max_memory_mb,
            });
        }

        let mut meta_cursor = self.config.next_meta_token;
        let mut static_metas: HashSet<Token> = HashSet::new();
        let working: Vec<Token> = match &self.static_dict {
            Some(dict) => {
                dict.validate_against(&self.config)?;
                static_metas = dict.meta_tokens();
                // Reserve the catalogue's sub-range before dynamic
                // allocation begins.
                if let Some(max) = dict.max_meta() {
                    meta_cursor = meta_cursor.max(max + 1);
                }
                dict.apply(tokens)
            }
            None => tokens.to_vec(),
        };

        let outcome = run_passes(
            &working,
            &self.config,
            self.scorer.as_ref(),
            self.filter.as_ref(),
            &mut meta_cursor,
        )?;

        let stream = emit_stream(&outcome.body, &outcome.entries, &self.config, &static_metas)?;
        let dictionary_tokens = stream[..stream.len() - outcome.body.len()].to_vec();

        let metrics = self.config.collect_metrics.then(|| CompressionMetrics {
            candidates_discovered: outcome.candidates_discovered,
            patterns_selected: outcome.entries.len(),
            occurrences_replaced: outcome.occurrences_replaced,
            passes: outcome.tokens_saved_per_pass.len(),
            tokens_saved_per_pass: outcome.tokens_saved_per_pass,
        });

        let result = CompressionResult {
            compressed_length: stream.len(),
            original_length: tokens.len(),
            dictionary_tokens,
            body_tokens: outcome.body,
            dictionary: outcome.entries,
            static_dictionary_id: self.static_dict.as_ref().map(|d| d.id().to_string()),
            metrics,
            stream,
        };

        if self.config.verify {
            let restored =
                deserialize_with(&result.stream, &self.config, self.static_dict.as_ref())?;
            if restored != tokens {
                let offset = restored
                    .iter()
                    .zip(tokens.iter())
                    .position(|(a, b)| a != b)
                    .unwrap_or_else(|| restored.len().min(tokens.len()));
                tracing::error!(offset, "round-trip verification failed");
                return Err(CompressError::VerificationFailure { offset });
            }
        }

        Ok(result)
    }

    /// Reconstruct the original sequence from `stream`.
    pub fn decompress(&self, stream: &[Token]) -> Result<Vec<Token>> {
        self.config.validate()?;
        deserialize_with(stream, &self.config, self.static_dict.as_ref())
    }

    /// Enumerate candidates for `tokens` with explicit length bounds.
    pub fn discover(
        &self,
        tokens: &[Token],
        min_len: usize,
        max_len: usize,
    ) -> Result<Vec<Candidate>> {
        let config = CompressionConfig {
            min_subsequence_length: min_len,
            max_subsequence_length: max_len,
            ..self.config.clone()
        };
        config.validate()?;
        Ok(discover_candidates(tokens, &config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SelectionMode;

    const DS: Token = 0xFFFF_FFF0;
    const DE: Token = 0xFFFF_FFF1;
    const M0: Token = 0xFFFF_0000;

    fn engine() -> CompressionEngine {
        CompressionEngine::default()
    }

    #[test]
    fn test_period_three_stream_layout() {
        let result = engine().compress(&[1, 2, 3, 1, 2, 3, 1, 2, 3]).unwrap();
        assert_eq!(result.stream, vec![DS, M0, 3, 1, 2, 3, DE, M0, M0, M0]);
        assert_eq!(result.body_tokens, vec![M0, M0, M0]);
        assert_eq!(result.dictionary_tokens, vec![DS, M0, 3, 1, 2, 3, DE]);
        assert_eq!(result.original_length, 9);
        assert_eq!(result.compressed_length, 10);
        assert_eq!(result.dictionary.len(), 1);
        assert_eq!(result.dictionary_map()[&M0], vec![1, 2, 3]);
    }

    #[test]
    fn test_token_run_compresses() {
        let result = engine().compress(&[7, 7, 7, 7]).unwrap();
        assert_eq!(result.dictionary.len(), 1);
        assert_eq!(result.dictionary[0].definition, vec![7, 7]);
        assert_eq!(result.body_tokens, vec![M0, M0]);
    }

    #[test]
    fn test_unprofitable_input_passes_through() {
        let tokens = vec![1, 2, 3, 4, 5];
        let result = engine().compress(&tokens).unwrap();
        assert_eq!(result.stream, tokens);
        assert!(result.dictionary.is_empty());
        assert!(result.dictionary_tokens.is_empty());
    }

    #[test]
    fn test_empty_input() {
        let result = engine().compress(&[]).unwrap();
        assert!(result.stream.is_empty());
        assert_eq!(result.original_length, 0);
        assert_eq!(result.ratio(), 0.0);
    }

    #[test]
    fn test_control_token_in_input_rejected() {
        let err = engine().compress(&[1, 2, DS]).unwrap_err();
        assert_eq!(
            err,
            CompressError::TokenRangeCollision {
                token: DS,
                index: 2,
            }
        );
    }

    #[test]
    fn test_meta_range_token_rejected_even_unallocated() {
        // Strict reading: any value at or above next_meta_token collides,
        // whether or not a meta-token was ever allocated.
        let err = engine().compress(&[1, 0xFFFF_0005, 2]).unwrap_err();
        assert!(matches!(
            err,
            CompressError::TokenRangeCollision { index: 1, .. }
        ));
    }

    #[test]
    fn test_roundtrip_with_verify_enabled() {
        let config = CompressionConfig {
            verify: true,
            ..Default::default()
        };
        let tokens: Vec<Token> = (0..40).map(|i| i % 7).collect();
        let engine = CompressionEngine::new(config);
        let result = engine.compress(&tokens).unwrap();
        assert_eq!(engine.decompress(&result.stream).unwrap(), tokens);
    }

    #[test]
    fn test_memory_cap_enforced() {
        let config = CompressionConfig {
            max_memory_mb: 0,
            ..Default::default()
        };
        let tokens = vec![0u32; 1 << 16];
        let err = CompressionEngine::new(config).compress(&tokens).unwrap_err();
        assert!(matches!(err, CompressError::MemoryExceeded { .. }));
    }

    #[test]
    fn test_metrics_collection() {
        let config = CompressionConfig {
            collect_metrics: true,
            ..Default::default()
        };
        let result = CompressionEngine::new(config)
            .compress(&[1, 2, 3, 1, 2, 3, 1, 2, 3])
            .unwrap();
        let metrics = result.metrics.unwrap();
        assert_eq!(metrics.patterns_selected, 1);
        assert_eq!(metrics.occurrences_replaced, 3);
        assert_eq!(metrics.passes, 1);
        assert_eq!(metrics.tokens_saved_per_pass, vec![6]);
    }

    #[test]
    fn test_static_dictionary_roundtrip() {
        let dict =
            StaticDictionary::new("catalogue-1", vec![(vec![10, 11, 12], 0xFFFF_0000)]).unwrap();
        let engine = CompressionEngine::default().with_static_dictionary(dict);

        let tokens = vec![10, 11, 12, 5, 10, 11, 12, 6];
        let result = engine.compress(&tokens).unwrap();
        assert_eq!(result.static_dictionary_id.as_deref(), Some("catalogue-1"));
        // Static metas never get an in-stream definition.
        assert!(result.dictionary.iter().all(|e| e.meta_token != 0xFFFF_0000));

        assert_eq!(engine.decompress(&result.stream).unwrap(), tokens);
    }

    #[test]
    fn test_static_reservation_shifts_dynamic_allocation() {
        let dict = StaticDictionary::new("c", vec![(vec![10, 11], 0xFFFF_0003)]).unwrap();
        let engine = CompressionEngine::default().with_static_dictionary(dict);

        // Dynamic pattern [1,2,3] must allocate past the reserved 0xFFFF0003.
        let tokens = vec![1, 2, 3, 1, 2, 3, 1, 2, 3];
        let result = engine.compress(&tokens).unwrap();
        assert_eq!(result.dictionary[0].meta_token, 0xFFFF_0004);
        assert_eq!(engine.decompress(&result.stream).unwrap(), tokens);
    }

    #[test]
    fn test_discover_api() {
        let candidates = engine()
            .discover(&[1, 2, 3, 1, 2, 3, 1, 2, 3], 2, 8)
            .unwrap();
        assert!(candidates.iter().any(|c| c.pattern == vec![1, 2, 3]));

        let err = engine().discover(&[1, 2, 3], 5, 2).unwrap_err();
        assert!(matches!(err, CompressError::ConfigInvalid(_)));
    }

    #[test]
    fn test_all_modes_roundtrip() {
        let tokens: Vec<Token> = (0..120).map(|i| (i * i) % 9).collect();
        for mode in [
            SelectionMode::Greedy,
            SelectionMode::Optimal,
            SelectionMode::Beam,
            SelectionMode::Ilp,
        ] {
            let config = CompressionConfig {
                selection_mode: mode,
                ..Default::default()
            };
            let engine = CompressionEngine::new(config);
            let result = engine.compress(&tokens).unwrap();
            assert_eq!(
                engine.decompress(&result.stream).unwrap(),
                tokens,
                "mode {mode}"
            );
        }
    }

    #[test]
    fn test_deterministic_output() {
        let tokens: Vec<Token> = (0..150).map(|i| i % 10).collect();
        let a = engine().compress(&tokens).unwrap();
        let b = engine().compress(&tokens).unwrap();
        assert_eq!(a.stream, b.stream);

        let parallel = CompressionEngine::new(CompressionConfig {
            parallel_discovery: true,
            ..Default::default()
        });
        let c = parallel.compress(&tokens).unwrap();
        assert_eq!(a.stream, c.stream);
    }
}
