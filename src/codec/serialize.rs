//! Wire-format emission.
//!
//! Layout of a compressed stream:
//!
//! ```text
//! [ DICT_START ]
//! [ meta_token_0 ] [ length_0 ] [ def_0 tokens... ]
//! [ meta_token_1 ] [ length_1 ] [ def_1 tokens... ]
//! ...
//! [ DICT_END ]
//! [ body tokens... ]
//! ```
//!
//! The dictionary is emitted so that every meta-token referenced inside a
//! definition is defined earlier in the stream. An empty selection emits the
//! body alone, with no framing.

use std::collections::HashSet;

use petgraph::algo::toposort;
use petgraph::graph::DiGraph;

use super::selection::Selection;
use super::types::{DictionaryEntry, Token};
use crate::config::CompressionConfig;
use crate::error::{CompressError, Result};

/// Replace every selected occurrence with its pattern's meta-token.
///
/// `metas[i]` is the meta-token assigned to `selection.patterns[i]`.
/// Occurrences must be sorted by start and pairwise disjoint, which
/// selection guarantees.
pub fn build_body(tokens: &[Token], selection: &Selection, metas: &[Token]) -> Vec<Token> {
    let mut body = Vec::with_capacity(tokens.len());
    let mut cursor = 0usize;
    for occ in &selection.occurrences {
        body.extend_from_slice(&tokens[cursor..occ.start]);
        body.push(metas[occ.pattern]);
        cursor = occ.end();
    }
    body.extend_from_slice(&tokens[cursor..]);
    body
}

/// Emit the final stream for `body` and `entries`.
///
/// `static_metas` are meta-tokens pre-shared out of band; references to them
/// are legal without an in-stream definition.
///
/// Before any token is emitted the entry graph is checked for cycles, every
/// entry key is checked against the meta range, and every reference is
/// checked to resolve to an earlier entry or a static binding. On error no
/// partial output escapes.
pub fn emit_stream(
    body: &[Token],
    entries: &[DictionaryEntry],
    config: &CompressionConfig,
    static_metas: &HashSet<Token>,
) -> Result<Vec<Token>> {
    if entries.is_empty() {
        return Ok(body.to_vec());
    }

    let ordered = order_entries(entries, config, static_metas)?;

    let dict_len: usize = 2 + ordered.iter().map(|e| 2 + e.definition.len()).sum::<usize>();
    let mut stream = Vec::with_capacity(dict_len + body.len());
    let mut defined: HashSet<Token> = static_metas.clone();

    stream.push(config.dict_start_token);
    for entry in &ordered {
        stream.push(entry.meta_token);
        stream.push(entry.definition.len() as Token);
        for &token in &entry.definition {
            if config.is_control(token) {
                return Err(CompressError::TokenRangeCollision {
                    token,
                    index: stream.len(),
                });
            }
            if config.is_meta(token) && !defined.contains(&token) {
                return Err(CompressError::UndefinedMetaToken {
                    token,
                    offset: stream.len(),
                });
            }
            stream.push(token);
        }
        defined.insert(entry.meta_token);
    }
    stream.push(config.dict_end_token);

    for &token in body {
        if config.is_control(token) {
            return Err(CompressError::TokenRangeCollision {
                token,
                index: stream.len(),
            });
        }
        if config.is_meta(token) && !defined.contains(&token) {
            return Err(CompressError::UndefinedMetaToken {
                token,
                offset: stream.len(),
            });
        }
        stream.push(token);
    }

    Ok(stream)
}

/// Validate entry keys, reject definition cycles, and produce the emission
/// order.
///
/// Entries are kept in ascending meta-token order (the allocation order)
/// whenever that order already satisfies defined-before-use, which holds for
/// everything the pipeline produces; otherwise the topological order is
/// used.
fn order_entries(
    entries: &[DictionaryEntry],
    config: &CompressionConfig,
    static_metas: &HashSet<Token>,
) -> Result<Vec<DictionaryEntry>> {
    let mut sorted: Vec<DictionaryEntry> = entries.to_vec();
    sorted.sort_by_key(|entry| entry.meta_token);

    for pair in sorted.windows(2) {
        if pair[0].meta_token == pair[1].meta_token {
            return Err(CompressError::ConfigInvalid(format!(
                "duplicate dictionary entry for meta-token 0x{:08X}",
                pair[0].meta_token
            )));
        }
    }
    for entry in &sorted {
        if !config.is_meta(entry.meta_token) {
            return Err(CompressError::ConfigInvalid(format!(
                "dictionary key 0x{:08X} outside the meta range",
                entry.meta_token
            )));
        }
        if entry.definition.is_empty() {
            return Err(CompressError::ConfigInvalid(format!(
                "empty definition for meta-token 0x{:08X}",
                entry.meta_token
            )));
        }
    }
    if entries.len() > config.meta_capacity() {
        return Err(CompressError::ConfigInvalid(format!(
            "dictionary of {} entries exceeds meta capacity {}",
            entries.len(),
            config.meta_capacity()
        )));
    }

    // Edge A -> B when B's definition references A's meta-token: toposort
    // then yields definitions before their uses.
    let mut graph = DiGraph::<usize, ()>::with_capacity(sorted.len(), sorted.len());
    let nodes: Vec<_> = (0..sorted.len()).map(|i| graph.add_node(i)).collect();
    let index_of = |meta: Token| sorted.binary_search_by_key(&meta, |e| e.meta_token).ok();

    for (i, entry) in sorted.iter().enumerate() {
        for &token in &entry.definition {
            if config.is_meta(token) && !static_metas.contains(&token) {
                if let Some(dep) = index_of(token) {
                    graph.add_edge(nodes[dep], nodes[i], ());
                }
                // Unresolvable references are reported with their stream
                // offset during emission.
            }
        }
    }

    match toposort(&graph, None) {
        Ok(order) => {
            let ascending_ok = sorted.iter().enumerate().all(|(i, entry)| {
                entry.definition.iter().all(|&token| {
                    !config.is_meta(token)
                        || static_metas.contains(&token)
                        || index_of(token).map_or(true, |dep| dep < i)
                })
            });
            if ascending_ok {
                Ok(sorted)
            } else {
                Ok(order
                    .into_iter()
                    .map(|node| sorted[graph[node]].clone())
                    .collect())
            }
        }
        Err(cycle) => Err(CompressError::Cycle {
            token: sorted[graph[cycle.node_id()]].meta_token,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::types::Occurrence;

    fn config() -> CompressionConfig {
        CompressionConfig::default()
    }

    const M0: Token = 0xFFFF_0000;
    const M1: Token = 0xFFFF_0001;

    #[test]
    fn test_build_body() {
        let selection = Selection {
            occurrences: vec![
                Occurrence {
                    start: 0,
                    length: 3,
                    pattern: 0,
                },
                Occurrence {
                    start: 3,
                    length: 3,
                    pattern: 0,
                },
                Occurrence {
                    start: 6,
                    length: 3,
                    pattern: 0,
                },
            ],
            patterns: vec![vec![1, 2, 3]],
        };
        let body = build_body(&[1, 2, 3, 1, 2, 3, 1, 2, 3], &selection, &[M0]);
        assert_eq!(body, vec![M0, M0, M0]);
    }

    #[test]
    fn test_build_body_with_gaps() {
        let selection = Selection {
            occurrences: vec![Occurrence {
                start: 2,
                length: 2,
                pattern: 0,
            }],
            patterns: vec![vec![5, 6]],
        };
        let body = build_body(&[9, 9, 5, 6, 7], &selection, &[M0]);
        assert_eq!(body, vec![9, 9, M0, 7]);
    }

    #[test]
    fn test_emit_stream_layout() {
        let entries = vec![DictionaryEntry {
            meta_token: M0,
            definition: vec![1, 2, 3],
        }];
        let stream = emit_stream(&[M0, M0, M0], &entries, &config(), &HashSet::new()).unwrap();
        assert_eq!(
            stream,
            vec![0xFFFF_FFF0, M0, 3, 1, 2, 3, 0xFFFF_FFF1, M0, M0, M0]
        );
    }

    #[test]
    fn test_empty_selection_has_no_framing() {
        let stream = emit_stream(&[4, 5, 6], &[], &config(), &HashSet::new()).unwrap();
        assert_eq!(stream, vec![4, 5, 6]);
    }

    #[test]
    fn test_nested_definitions_ordered() {
        // M1's definition references M0; M0 must be emitted first.
        let entries = vec![
            DictionaryEntry {
                meta_token: M1,
                definition: vec![M0, 9],
            },
            DictionaryEntry {
                meta_token: M0,
                definition: vec![1, 2],
            },
        ];
        let stream = emit_stream(&[M1], &entries, &config(), &HashSet::new()).unwrap();
        let m0_pos = stream.iter().position(|&t| t == M0).unwrap();
        let m1_pos = stream.iter().position(|&t| t == M1).unwrap();
        assert!(m0_pos < m1_pos);
    }

    #[test]
    fn test_cycle_rejected() {
        let entries = vec![
            DictionaryEntry {
                meta_token: M0,
                definition: vec![M1],
            },
            DictionaryEntry {
                meta_token: M1,
                definition: vec![M0],
            },
        ];
        let err = emit_stream(&[M0], &entries, &config(), &HashSet::new()).unwrap_err();
        assert!(matches!(err, CompressError::Cycle { .. }));
    }

    #[test]
    fn test_undefined_reference_rejected() {
        let entries = vec![DictionaryEntry {
            meta_token: M0,
            definition: vec![M1, 1],
        }];
        let err = emit_stream(&[M0], &entries, &config(), &HashSet::new()).unwrap_err();
        assert!(matches!(err, CompressError::UndefinedMetaToken { .. }));
    }

    #[test]
    fn test_static_reference_allowed() {
        let statics: HashSet<Token> = [M0].into_iter().collect();
        let entries = vec![DictionaryEntry {
            meta_token: M1,
            definition: vec![M0, 1],
        }];
        let stream = emit_stream(&[M1], &entries, &config(), &statics).unwrap();
        assert_eq!(stream[1], M1);
    }
}
