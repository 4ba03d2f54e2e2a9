//! Suffix array and LCP construction over token sequences.
//!
//! The suffix array orders suffixes of the token buffer lexicographically
//! over full 32-bit token values; the LCP array gives the longest common
//! prefix between lexicographically adjacent suffixes. Discovery walks runs
//! of the LCP array to find repeated subsequences.

use super::types::Token;

/// Build the suffix array of `tokens` by prefix doubling.
///
/// Returns a permutation of `[0, n)` such that the suffixes
/// `tokens[sa[i]..]` are in ascending lexicographic order. Comparisons use
/// the full token value; there is no modular reduction.
pub fn build_suffix_array(tokens: &[Token]) -> Vec<usize> {
    let n = tokens.len();
    if n == 0 {
        return Vec::new();
    }

    let mut sa: Vec<usize> = (0..n).collect();
    let mut rank: Vec<u64> = tokens.iter().map(|&t| t as u64).collect();
    let mut next_rank = vec![0u64; n];

    let mut k = 1;
    loop {
        // Rank pair (rank[i], rank[i + k]); suffixes shorter than k sort
        // before any continuation, encoded by offsetting the second
        // component by one.
        let pair = |i: usize| {
            let second = if i + k < n { rank[i + k] + 1 } else { 0 };
            (rank[i], second)
        };

        sa.sort_unstable_by_key(|&i| pair(i));

        next_rank[sa[0]] = 0;
        for w in 1..n {
            let bump = u64::from(pair(sa[w - 1]) != pair(sa[w]));
            next_rank[sa[w]] = next_rank[sa[w - 1]] + bump;
        }
        rank.copy_from_slice(&next_rank);

        if rank[sa[n - 1]] as usize == n - 1 {
            break;
        }
        k <<= 1;
    }

    sa
}

/// Compute the LCP array with Kasai's algorithm.
///
/// `lcp[i]` is the length of the longest common prefix of
/// `tokens[sa[i - 1]..]` and `tokens[sa[i]..]`; `lcp[0] = 0`.
pub fn build_lcp(tokens: &[Token], sa: &[usize]) -> Vec<usize> {
    let n = tokens.len();
    let mut lcp = vec![0usize; n];
    if n == 0 {
        return lcp;
    }

    let mut inv = vec![0usize; n];
    for (pos, &suffix) in sa.iter().enumerate() {
        inv[suffix] = pos;
    }

    let mut h = 0usize;
    for i in 0..n {
        if inv[i] == 0 {
            h = 0;
            continue;
        }
        let j = sa[inv[i] - 1];
        while i + h < n && j + h < n && tokens[i + h] == tokens[j + h] {
            h += 1;
        }
        lcp[inv[i]] = h;
        h = h.saturating_sub(1);
    }

    lcp
}

/// Enumerate maximal suffix-array ranges sharing a prefix of at least
/// `min_shared` tokens.
///
/// Each returned `(a, b)` is an inclusive range of suffix-array indices with
/// `b > a`; every suffix in the range agrees with its neighbors on the first
/// `min_shared` tokens.
pub fn repeat_groups(lcp: &[usize], min_shared: usize) -> Vec<(usize, usize)> {
    let mut groups = Vec::new();
    let mut run_start: Option<usize> = None;

    for (i, &shared) in lcp.iter().enumerate().skip(1) {
        if shared >= min_shared {
            if run_start.is_none() {
                run_start = Some(i - 1);
            }
        } else if let Some(start) = run_start.take() {
            groups.push((start, i - 1));
        }
    }
    if let Some(start) = run_start {
        groups.push((start, lcp.len() - 1));
    }

    groups
}
