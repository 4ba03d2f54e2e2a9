//! Stream parsing and meta-token expansion.
//!
//! Decompression is the inverse of [`emit_stream`](super::serialize): parse
//! the dictionary section, then walk the body and recursively expand every
//! meta-token. Expansion is memoized per meta-token, so the work is linear
//! in the output length, and a color-marking depth-first walk rejects cyclic
//! definitions. The parser is safe for arbitrary input; every defect is
//! reported with the offset at which it was detected.

use std::collections::{HashMap, HashSet};

use super::static_dict::StaticDictionary;
use super::types::Token;
use crate::config::CompressionConfig;
use crate::error::{CompressError, Result};

/// Parsed dictionary entry: definition tokens plus the stream offset where
/// the definition begins, used for error reporting.
struct ParsedEntry {
    definition: Vec<Token>,
    offset: usize,
}

/// Reconstruct the original sequence from `stream`.
pub fn deserialize(stream: &[Token], config: &CompressionConfig) -> Result<Vec<Token>> {
    deserialize_with(stream, config, None)
}

/// Reconstruct the original sequence, seeding the expansion map from a
/// static dictionary when one was used to compress.
pub fn deserialize_with(
    stream: &[Token],
    config: &CompressionConfig,
    static_dict: Option<&StaticDictionary>,
) -> Result<Vec<Token>> {
    let Some(ds) = stream.iter().position(|&t| t == config.dict_start_token) else {
        // No dictionary section. Without a static catalogue the stream is
        // an uncompressed sequence and decompresses to itself.
        return match static_dict {
            None => Ok(stream.to_vec()),
            Some(dict) => Ok(expand_static_only(stream, dict)),
        };
    };

    let mut entries: HashMap<Token, ParsedEntry> = HashMap::new();
    let mut i = ds + 1;

    loop {
        if i >= stream.len() {
            return Err(CompressError::Truncated {
                offset: stream.len(),
                reason: "dictionary section not terminated".to_string(),
            });
        }
        let token = stream[i];
        if token == config.dict_end_token {
            i += 1;
            break;
        }

        let meta = token;
        if !config.is_meta(meta) {
            return Err(CompressError::MalformedStream {
                offset: i,
                reason: format!("dictionary key 0x{meta:08X} outside the meta range"),
            });
        }
        if entries.contains_key(&meta) {
            return Err(CompressError::MalformedStream {
                offset: i,
                reason: format!("duplicate dictionary entry for meta-token 0x{meta:08X}"),
            });
        }
        i += 1;

        if i >= stream.len() {
            return Err(CompressError::Truncated {
                offset: stream.len(),
                reason: "entry ends before its length field".to_string(),
            });
        }
        let length = stream[i] as usize;
        if length == 0 {
            return Err(CompressError::MalformedStream {
                offset: i,
                reason: "zero-length definition".to_string(),
            });
        }
        i += 1;

        let offset = i;
        let mut definition = Vec::with_capacity(length.min(stream.len() - i));
        for _ in 0..length {
            if i >= stream.len() {
                return Err(CompressError::Truncated {
                    offset: stream.len(),
                    reason: "definition runs past the end of the stream".to_string(),
                });
            }
            let t = stream[i];
            if t == config.dict_end_token {
                return Err(CompressError::Truncated {
                    offset: i,
                    reason: "definition cut short by dictionary end".to_string(),
                });
            }
            if t == config.dict_start_token {
                return Err(CompressError::MalformedStream {
                    offset: i,
                    reason: "nested dictionary start inside a definition".to_string(),
                });
            }
            definition.push(t);
            i += 1;
        }

        entries.insert(meta, ParsedEntry { definition, offset });
    }

    // Tokens before the dictionary section pass through unchanged; streams
    // produced by this engine never have any.
    let mut output: Vec<Token> = stream[..ds].to_vec();
    let mut memo: HashMap<Token, Vec<Token>> = HashMap::new();

    for (j, &token) in stream[i..].iter().enumerate() {
        let offset = i + j;
        if config.is_control(token) {
            return Err(CompressError::MalformedStream {
                offset,
                reason: "control token in body".to_string(),
            });
        }
        if config.is_meta(token) {
            expand_meta(token, offset, &entries, static_dict, config, &mut memo)?;
            output.extend_from_slice(&memo[&token]);
        } else {
            output.push(token);
        }
    }

    Ok(output)
}

/// Ensure `memo[root]` holds the full expansion of `root`.
///
/// Iterative depth-first walk with color marks: a meta-token on the gray set
/// that is reached again is a back-edge, i.e. a definition cycle.
fn expand_meta(
    root: Token,
    root_offset: usize,
    entries: &HashMap<Token, ParsedEntry>,
    static_dict: Option<&StaticDictionary>,
    config: &CompressionConfig,
    memo: &mut HashMap<Token, Vec<Token>>,
) -> Result<()> {
    if memo.contains_key(&root) {
        return Ok(());
    }
    if !entries.contains_key(&root) {
        if let Some(def) = static_dict.and_then(|d| d.definition(root)) {
            memo.insert(root, def.to_vec());
            return Ok(());
        }
        return Err(CompressError::UndefinedMetaToken {
            token: root,
            offset: root_offset,
        });
    }

    let mut gray: HashSet<Token> = HashSet::new();
    let mut stack: Vec<Token> = vec![root];

    while let Some(&current) = stack.last() {
        if memo.contains_key(&current) {
            stack.pop();
            continue;
        }

        // Only entry-defined metas are ever pushed; static bindings are
        // memoized at push time.
        let Some(entry) = entries.get(&current) else {
            stack.pop();
            continue;
        };

        if gray.contains(&current) {
            // All dependencies are memoized; build the expansion.
            let mut expanded = Vec::with_capacity(entry.definition.len());
            for &t in &entry.definition {
                if config.is_meta(t) {
                    expanded.extend_from_slice(&memo[&t]);
                } else {
                    expanded.push(t);
                }
            }
            memo.insert(current, expanded);
            gray.remove(&current);
            stack.pop();
            continue;
        }

        gray.insert(current);
        for (k, &t) in entry.definition.iter().enumerate() {
            if !config.is_meta(t) || memo.contains_key(&t) {
                continue;
            }
            if gray.contains(&t) {
                return Err(CompressError::Cycle { token: t });
            }
            if entries.contains_key(&t) {
                stack.push(t);
            } else if let Some(def) = static_dict.and_then(|d| d.definition(t)) {
                memo.insert(t, def.to_vec());
            } else {
                return Err(CompressError::UndefinedMetaToken {
                    token: t,
                    offset: entry.offset + k,
                });
            }
        }
    }

    Ok(())
}

/// Expand catalogue bindings in a stream that carries no dictionary
/// section. Meta-range tokens without a binding pass through unchanged.
fn expand_static_only(stream: &[Token], dict: &StaticDictionary) -> Vec<Token> {
    let mut output = Vec::with_capacity(stream.len());
    for &token in stream {
        match dict.definition(token) {
            Some(def) => output.extend_from_slice(def),
            None => output.push(token),
        }
    }
    output
}
