//! Candidate discovery over the suffix/LCP index.
//!
//! For each pattern length `L` in the configured bounds, every maximal run
//! of the LCP array with `lcp >= L` marks a group of suffixes sharing the
//! same first `L` tokens. Each group becomes one candidate: the shared
//! pattern, its occurrence positions filtered to a maximal non-overlapping
//! subset, and the savings metrics driving selection.
//!
//! Discovery across distinct lengths is independent, so the parallel mode
//! fans lengths out to rayon workers and re-sorts the merged union; the
//! output is identical to the serial mode.

use rayon::prelude::*;

use super::suffix::{build_lcp, build_suffix_array, repeat_groups};
use super::types::{is_compressible, Candidate, Token};
use crate::config::CompressionConfig;

/// Enumerate compressible candidates in canonical order.
///
/// Canonical order: `raw_savings` descending, then pattern length
/// descending, then lexicographic pattern contents. The order is the input
/// contract of selection and is independent of discovery parallelism.
pub fn discover_candidates(tokens: &[Token], config: &CompressionConfig) -> Vec<Candidate> {
    let min_len = config.min_subsequence_length;
    let max_len = config
        .max_subsequence_length
        .min(tokens.len().saturating_sub(1));
    if tokens.len() < 2 || max_len < min_len {
        return Vec::new();
    }

    let sa = build_suffix_array(tokens);
    let lcp = build_lcp(tokens, &sa);

    let mut candidates = if config.parallel_discovery {
        (min_len..=max_len)
            .into_par_iter()
            .map(|length| candidates_for_length(tokens, &sa, &lcp, length))
            .reduce(Vec::new, |mut acc, mut part| {
                acc.append(&mut part);
                acc
            })
    } else {
        let mut acc = Vec::new();
        for length in min_len..=max_len {
            acc.extend(candidates_for_length(tokens, &sa, &lcp, length));
        }
        acc
    };

    sort_canonical(&mut candidates);
    candidates
}

/// Candidates of exactly `length` tokens.
///
/// Maximal LCP runs at a given length have pairwise distinct patterns, so
/// no cross-run merging is needed; identical contents always land in the
/// same run.
fn candidates_for_length(
    tokens: &[Token],
    sa: &[usize],
    lcp: &[usize],
    length: usize,
) -> Vec<Candidate> {
    let mut found = Vec::new();

    for (a, b) in repeat_groups(lcp, length) {
        let mut positions: Vec<usize> = sa[a..=b].to_vec();
        positions.sort_unstable();

        let frequency = positions.len();
        if !is_compressible(length, frequency) {
            continue;
        }

        let pattern = tokens[positions[0]..positions[0] + length].to_vec();

        // Maximal non-overlapping subset: ascending starts, accept a
        // position only once the previous accepted occurrence has ended.
        let mut filtered = Vec::with_capacity(frequency);
        let mut next_free = 0usize;
        for &pos in &positions {
            if filtered.is_empty() || pos >= next_free {
                filtered.push(pos);
                next_free = pos + length;
            }
        }

        // A pattern that survives overlap filtering with a single
        // occurrence can never pay for its definition.
        if filtered.len() < 2 {
            continue;
        }

        found.push(Candidate::new(pattern, filtered, frequency));
    }

    found
}

fn sort_canonical(candidates: &mut [Candidate]) {
    candidates.sort_unstable_by(|a, b| {
        b.raw_savings
            .cmp(&a.raw_savings)
            .then_with(|| b.length.cmp(&a.length))
            .then_with(|| a.pattern.cmp(&b.pattern))
    });
}
