//! End-to-end compression scenarios.
//!
//! These tests drive the full pipeline through the public API and pin down
//! the exact wire layout for the canonical inputs, beyond the unit test
//! level.

use metatok::{
    compress, decompress, CompressError, CompressionConfig, CompressionEngine, SelectionMode,
    StaticDictionary, StreamingCompressor, Token,
};

const DS: Token = 0xFFFF_FFF0;
const DE: Token = 0xFFFF_FFF1;
const M0: Token = 0xFFFF_0000;

fn defaults() -> CompressionConfig {
    CompressionConfig::default()
}

/// A repeated period-3 sequence folds into a single dictionary entry.
#[test]
fn test_period_three_exact_stream() {
    let tokens = vec![1, 2, 3, 1, 2, 3, 1, 2, 3];
    let result = compress(&tokens, &defaults()).unwrap();

    assert_eq!(result.stream, vec![DS, M0, 3, 1, 2, 3, DE, M0, M0, M0]);
    assert_eq!(decompress(&result.stream, &defaults()).unwrap(), tokens);
}

/// A run of one distinct token pairs up into a two-token definition.
#[test]
fn test_single_token_run() {
    let tokens = vec![7, 7, 7, 7];
    let result = compress(&tokens, &defaults()).unwrap();

    assert_eq!(result.dictionary.len(), 1);
    assert_eq!(result.dictionary[0].definition, vec![7, 7]);
    assert_eq!(result.body_tokens, vec![M0, M0]);
    assert_eq!(decompress(&result.stream, &defaults()).unwrap(), tokens);
}

/// A run of length n yields n/2 applications of the pair definition.
#[test]
fn test_long_run_applies_pair_n_over_two_times() {
    let config = CompressionConfig {
        max_subsequence_length: 2,
        hierarchical_enabled: false,
        ..Default::default()
    };
    let tokens = vec![3u32; 20];
    let result = compress(&tokens, &config).unwrap();

    assert_eq!(result.dictionary.len(), 1);
    assert_eq!(result.dictionary[0].definition, vec![3, 3]);
    assert_eq!(result.body_tokens, vec![M0; 10]);
    assert_eq!(decompress(&result.stream, &config).unwrap(), tokens);
}

/// No profitable patterns: the stream is the input, with no framing.
#[test]
fn test_unique_tokens_pass_through() {
    let tokens = vec![1, 2, 3, 4, 5];
    let result = compress(&tokens, &defaults()).unwrap();

    assert_eq!(result.stream, tokens);
    assert!(result.dictionary.is_empty());
    assert_eq!(decompress(&result.stream, &defaults()).unwrap(), tokens);
}

/// Reserved values in the input are rejected up front.
#[test]
fn test_reserved_input_token_collides() {
    let err = compress(&[1, 2, DS, 4], &defaults()).unwrap_err();
    assert_eq!(
        err,
        CompressError::TokenRangeCollision {
            token: DS,
            index: 2,
        }
    );
}

/// The empty sequence compresses to the empty stream.
#[test]
fn test_empty_sequence() {
    let result = compress(&[], &defaults()).unwrap();
    assert!(result.stream.is_empty());
    assert_eq!(decompress(&[], &defaults()).unwrap(), Vec::<Token>::new());
}

/// Optimal selection never saves less than greedy, and both round-trip.
#[test]
fn test_optimal_at_least_as_good_as_greedy() {
    let inputs: Vec<Vec<Token>> = vec![
        vec![1, 2, 1, 2, 1, 2, 1, 2],
        (0..90).map(|i| i % 6).collect(),
        (0..200).map(|i| (i * 7) % 13).collect(),
    ];

    for tokens in inputs {
        let greedy = compress(&tokens, &defaults()).unwrap();
        let optimal = compress(
            &tokens,
            &CompressionConfig {
                selection_mode: SelectionMode::Optimal,
                ..Default::default()
            },
        )
        .unwrap();

        assert!(
            optimal.compressed_length <= greedy.compressed_length,
            "optimal {} > greedy {} on {} tokens",
            optimal.compressed_length,
            greedy.compressed_length,
            tokens.len()
        );
        assert_eq!(decompress(&greedy.stream, &defaults()).unwrap(), tokens);
        assert_eq!(decompress(&optimal.stream, &defaults()).unwrap(), tokens);
    }
}

/// With a single pass, the multiset of meta-tokens in the body matches the
/// per-entry selected occurrence counts exactly.
#[test]
fn test_body_meta_multiset_matches_dictionary() {
    let tokens: Vec<Token> = (0..120).map(|i| i % 8).collect();
    let config = CompressionConfig {
        hierarchical_enabled: false,
        collect_metrics: true,
        ..Default::default()
    };
    let result = compress(&tokens, &config).unwrap();
    assert!(!result.dictionary.is_empty());

    let mut replaced = 0;
    for entry in &result.dictionary {
        let references = result
            .body_tokens
            .iter()
            .filter(|&&t| t == entry.meta_token)
            .count();
        assert!(references >= 2, "entry 0x{:08X}", entry.meta_token);
        replaced += references;
    }
    assert_eq!(replaced, result.metrics.unwrap().occurrences_replaced);
}

/// Hierarchical compression folds nested structure and still round-trips.
#[test]
fn test_hierarchical_nested_structure() {
    let tokens: Vec<Token> = (0..24).flat_map(|_| vec![5, 6, 9]).collect();
    let result = compress(&tokens, &defaults()).unwrap();

    assert!(result.compressed_length < tokens.len());
    assert_eq!(decompress(&result.stream, &defaults()).unwrap(), tokens);

    // Defined-before-use holds across the emitted dictionary.
    let mut seen: Vec<Token> = Vec::new();
    let config = defaults();
    for entry in &result.dictionary {
        for &t in &entry.definition {
            if config.is_meta(t) {
                assert!(seen.contains(&t), "forward reference to 0x{t:08X}");
            }
        }
        seen.push(entry.meta_token);
    }
}

/// Disabling the hierarchy caps the work at a single pass.
#[test]
fn test_hierarchy_disabled_single_pass() {
    let tokens: Vec<Token> = (0..24).flat_map(|_| vec![5, 6, 9]).collect();
    let config = CompressionConfig {
        hierarchical_enabled: false,
        collect_metrics: true,
        ..Default::default()
    };
    let result = compress(&tokens, &config).unwrap();
    assert!(result.metrics.unwrap().passes <= 1);
    assert_eq!(decompress(&result.stream, &config).unwrap(), tokens);
}

/// Re-compressing an already-compressed stream is legal with the hierarchy
/// off, and the two decompressions compose back to the original.
#[test]
fn test_double_compression_composes() {
    let tokens: Vec<Token> = (0..60).map(|i| i % 4).collect();
    let config = CompressionConfig {
        hierarchical_enabled: false,
        ..Default::default()
    };

    let first = compress(&tokens, &config).unwrap();

    // The first stream contains meta and control tokens, so the second
    // application must shift its reserved ranges above them.
    let outer = CompressionConfig {
        next_meta_token: 0xFFFF_FFF8,
        dict_start_token: 0xFFFF_FFFC,
        dict_end_token: 0xFFFF_FFFD,
        hierarchical_enabled: false,
        ..Default::default()
    };
    let second = compress(&first.stream, &outer).unwrap();

    let middle = decompress(&second.stream, &outer).unwrap();
    assert_eq!(middle, first.stream);
    assert_eq!(decompress(&middle, &config).unwrap(), tokens);
}

/// Verification mode accepts every stream the engine emits.
#[test]
fn test_verify_mode_passes_on_engine_output() {
    let config = CompressionConfig {
        verify: true,
        ..Default::default()
    };
    for tokens in [
        vec![],
        vec![9],
        vec![7, 7, 7, 7],
        (0..300).map(|i| i % 12).collect::<Vec<Token>>(),
    ] {
        compress(&tokens, &config).unwrap();
    }
}

/// Static dictionary bindings apply before discovery and survive the
/// round-trip when the decompressor holds the same catalogue.
#[test]
fn test_static_dictionary_end_to_end() {
    let dict = StaticDictionary::new(
        "chat-preamble",
        vec![(vec![100, 101, 102], M0), (vec![200, 201], 0xFFFF_0001)],
    )
    .unwrap();

    let tokens = vec![100, 101, 102, 7, 200, 201, 7, 100, 101, 102];
    let engine = CompressionEngine::default().with_static_dictionary(dict.clone());

    let result = engine.compress(&tokens).unwrap();
    assert_eq!(result.static_dictionary_id.as_deref(), Some("chat-preamble"));
    assert_eq!(engine.decompress(&result.stream).unwrap(), tokens);

    // Without the catalogue the stream does not reconstruct the original.
    let bare = CompressionEngine::default().decompress(&result.stream);
    assert!(bare.is_err() || bare.unwrap() != tokens);
}

/// The streaming driver matches the one-shot engine exactly.
#[test]
fn test_streaming_driver_matches_one_shot() {
    let tokens: Vec<Token> = (0..250).map(|i| (i / 3) % 9).collect();

    let mut streaming = StreamingCompressor::new(defaults());
    for chunk in tokens.chunks(32) {
        streaming.push_chunk(chunk);
    }
    let chunked = streaming.finish().unwrap();
    let single = compress(&tokens, &defaults()).unwrap();

    assert_eq!(chunked.stream, single.stream);
}

/// Beam and ilp configurations round-trip on structured input.
#[test]
fn test_beam_and_ilp_roundtrip() {
    let tokens: Vec<Token> = (0..150).map(|i| (i * i + i) % 10).collect();
    for mode in [SelectionMode::Beam, SelectionMode::Ilp] {
        let config = CompressionConfig {
            selection_mode: mode,
            beam_width: 4,
            ..Default::default()
        };
        let result = compress(&tokens, &config).unwrap();
        assert_eq!(
            decompress(&result.stream, &config).unwrap(),
            tokens,
            "mode {mode}"
        );
    }
}
