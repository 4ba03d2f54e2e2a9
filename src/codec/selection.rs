//! Occurrence selection strategies.
//!
//! Selection turns the candidate list into a set of non-overlapping
//! occurrences, each bound to the pattern whose meta-token will replace it.
//! Four strategies share one contract:
//!
//! | Mode      | Approach                                           |
//! |-----------|----------------------------------------------------|
//! | `greedy`  | Savings-density sweep over candidates              |
//! | `optimal` | Weighted interval scheduling over occurrences      |
//! | `beam`    | Top-k partial selections over candidate decisions  |
//! | `ilp`     | 0/1 program; degrades to `optimal` without a solver|
//!
//! Every mode applies the same tie-break rules so the output is
//! deterministic: longer pattern, higher occurrence count, lex-smaller
//! pattern contents, smaller first occurrence position.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::types::{selected_savings, Candidate, Occurrence, Token};
use crate::config::{CompressionConfig, SelectionMode};

/// External importance signal consumed by selection.
///
/// Priorities bias the ordering of candidates; they never loosen the
/// non-overlap or net-savings invariants.
pub trait PriorityScorer {
    /// Priority of `candidate` in `[0, 1]`.
    fn score_candidate(&self, candidate: &Candidate, tokens: &[Token]) -> f64;
}

/// Default scorer: every candidate gets priority 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityScorer;

impl PriorityScorer for IdentityScorer {
    fn score_candidate(&self, _candidate: &Candidate, _tokens: &[Token]) -> f64 {
        0.0
    }
}

/// Veto hook for candidates whose occurrences fall in protected spans.
pub trait RegionFilter {
    /// Whether the candidate may participate in selection.
    fn allows(&self, candidate: &Candidate) -> bool;
}

/// Default filter: allows every candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl RegionFilter for AllowAll {
    fn allows(&self, _candidate: &Candidate) -> bool {
        true
    }
}

/// Strategy dispatch as a closed sum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStrategy {
    Greedy,
    Optimal,
    Beam { width: usize },
    Ilp,
}

impl SelectionStrategy {
    /// Resolve the strategy from configuration.
    pub fn from_config(config: &CompressionConfig) -> Self {
        match config.selection_mode {
            SelectionMode::Greedy => SelectionStrategy::Greedy,
            SelectionMode::Optimal => SelectionStrategy::Optimal,
            SelectionMode::Beam => SelectionStrategy::Beam {
                width: config.beam_width.max(1),
            },
            SelectionMode::Ilp => SelectionStrategy::Ilp,
        }
    }
}

/// Output of selection.
///
/// `patterns` lists the distinct selected patterns in meta-token assignment
/// order; `occurrences` are sorted by start position and reference patterns
/// by index.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub occurrences: Vec<Occurrence>,
    pub patterns: Vec<Vec<Token>>,
}

impl Selection {
    /// Whether nothing was selected.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Net body-token savings of the selection, before framing.
    pub fn net_savings(&self) -> i64 {
        let mut per_pattern = vec![0usize; self.patterns.len()];
        for occ in &self.occurrences {
            per_pattern[occ.pattern] += 1;
        }
        self.patterns
            .iter()
            .zip(per_pattern)
            .map(|(pattern, count)| selected_savings(pattern.len(), count))
            .sum()
    }
}

/// Select non-overlapping occurrences from `candidates`.
///
/// `candidates` must already carry priorities and have passed the region
/// filter; the engine applies both hooks before calling in.
pub fn select_occurrences(candidates: &[Candidate], config: &CompressionConfig) -> Selection {
    if candidates.is_empty() {
        return Selection::default();
    }

    match SelectionStrategy::from_config(config) {
        SelectionStrategy::Greedy => select_greedy(candidates, config),
        SelectionStrategy::Optimal => select_optimal(candidates, config),
        SelectionStrategy::Beam { width } => select_beam(candidates, config, width),
        SelectionStrategy::Ilp => {
            tracing::debug!("no ILP solver present; falling back to optimal selection");
            select_optimal(candidates, config)
        }
    }
}

/// Priority multiplier applied to every savings value used for ordering.
fn adjusted(savings: f64, priority: f64, config: &CompressionConfig) -> f64 {
    savings * (1.0 + config.priority_alpha * priority)
}

/// Deterministic tie-break: longer pattern, higher count, lex-smaller
/// contents, smaller first occurrence.
fn tie_break(a: &Candidate, b: &Candidate) -> Ordering {
    b.length
        .cmp(&a.length)
        .then_with(|| b.count.cmp(&a.count))
        .then_with(|| a.pattern.cmp(&b.pattern))
        .then_with(|| a.positions.first().cmp(&b.positions.first()))
}

/// Disjoint half-open intervals keyed by start position.
#[derive(Debug, Clone, Default)]
struct IntervalSet {
    map: BTreeMap<usize, usize>,
}

impl IntervalSet {
    fn is_free(&self, start: usize, end: usize) -> bool {
        if let Some((_, &prev_end)) = self.map.range(..=start).next_back() {
            if prev_end > start {
                return false;
            }
        }
        if let Some((&next_start, _)) = self.map.range(start..).next() {
            if next_start < end {
                return false;
            }
        }
        true
    }

    fn insert(&mut self, start: usize, end: usize) {
        self.map.insert(start, end);
    }
}

/// Per-candidate picks in acceptance order, turned into a [`Selection`].
fn build_selection(candidates: &[Candidate], chosen: Vec<(usize, Vec<usize>)>) -> Selection {
    let mut patterns = Vec::with_capacity(chosen.len());
    let mut occurrences = Vec::new();

    for (slot, (cand_idx, positions)) in chosen.into_iter().enumerate() {
        let candidate = &candidates[cand_idx];
        for pos in positions {
            occurrences.push(Occurrence {
                start: pos,
                length: candidate.length,
                pattern: slot,
            });
        }
        patterns.push(candidate.pattern.clone());
    }

    occurrences.sort_unstable_by_key(|occ| occ.start);
    Selection {
        occurrences,
        patterns,
    }
}

// === Greedy ===

fn select_greedy(candidates: &[Candidate], config: &CompressionConfig) -> Selection {
    let density = |c: &Candidate| {
        let raw = ((c.length - 1) * c.count) as f64 / (c.length + c.count) as f64;
        adjusted(raw, c.priority, config)
    };

    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&i, &j| {
        density(&candidates[j])
            .total_cmp(&density(&candidates[i]))
            .then_with(|| tie_break(&candidates[i], &candidates[j]))
    });

    let mut intervals = IntervalSet::default();
    let mut chosen: Vec<(usize, Vec<usize>)> = Vec::new();

    for idx in order {
        let candidate = &candidates[idx];
        let mut accepted = Vec::new();
        for &pos in &candidate.positions {
            if intervals.is_free(pos, pos + candidate.length) {
                intervals.insert(pos, pos + candidate.length);
                accepted.push(pos);
            }
        }
        if !accepted.is_empty() {
            chosen.push((idx, accepted));
        }
    }

    // Patterns whose surviving occurrence count cannot pay for their
    // definition are dropped; their intervals stay consumed, which keeps
    // the sweep a single pass.
    chosen.retain(|(idx, accepted)| {
        selected_savings(candidates[*idx].length, accepted.len()) >= 0
    });

    build_selection(candidates, chosen)
}

// === Optimal (weighted interval scheduling) ===

struct ScheduledOcc {
    start: usize,
    end: usize,
    candidate: usize,
    weight: f64,
}

fn select_optimal(candidates: &[Candidate], config: &CompressionConfig) -> Selection {
    // One interval per occurrence; the weight is the per-occurrence gain
    // minus an amortized share of the definition cost.
    let mut occs: Vec<ScheduledOcc> = Vec::new();
    for (cand_idx, candidate) in candidates.iter().enumerate() {
        let amortized = candidate.length as f64 / candidate.count as f64;
        let base = (candidate.length - 1) as f64 - amortized;
        let weight = adjusted(base.max(0.0), candidate.priority, config);
        if weight <= 0.0 {
            continue;
        }
        for &pos in &candidate.positions {
            occs.push(ScheduledOcc {
                start: pos,
                end: pos + candidate.length,
                candidate: cand_idx,
                weight,
            });
        }
    }
    if occs.is_empty() {
        return Selection::default();
    }

    occs.sort_unstable_by(|a, b| {
        a.end
            .cmp(&b.end)
            .then_with(|| a.start.cmp(&b.start))
            .then_with(|| a.candidate.cmp(&b.candidate))
    });

    // p[i]: rightmost occurrence ending at or before occs[i].start.
    let ends: Vec<usize> = occs.iter().map(|o| o.end).collect();
    let pred: Vec<Option<usize>> = occs
        .iter()
        .map(|occ| {
            let idx = ends.partition_point(|&end| end <= occ.start);
            idx.checked_sub(1)
        })
        .collect();

    let mut dp = vec![0.0f64; occs.len()];
    let mut take = vec![false; occs.len()];
    for i in 0..occs.len() {
        let gain = occs[i].weight + pred[i].map_or(0.0, |p| dp[p]);
        let skip = if i > 0 { dp[i - 1] } else { 0.0 };
        if gain > skip {
            dp[i] = gain;
            take[i] = true;
        } else {
            dp[i] = skip;
        }
    }

    let mut picked: Vec<usize> = Vec::new();
    let mut i = occs.len();
    while i > 0 {
        let idx = i - 1;
        if take[idx] {
            picked.push(idx);
            i = pred[idx].map_or(0, |p| p + 1);
        } else {
            i = idx;
        }
    }

    // Group picks per candidate; drop groups that no longer pay for their
    // definition after the schedule thinned them out.
    let mut per_candidate: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for idx in picked {
        per_candidate
            .entry(occs[idx].candidate)
            .or_default()
            .push(occs[idx].start);
    }

    let mut groups: Vec<(usize, Vec<usize>)> = per_candidate
        .into_iter()
        .filter(|(cand_idx, positions)| {
            selected_savings(candidates[*cand_idx].length, positions.len()) >= 0
        })
        .collect();

    // Meta-token assignment order: adjusted net savings, then tie-breaks.
    groups.sort_by(|(ai, apos), (bi, bpos)| {
        let a = &candidates[*ai];
        let b = &candidates[*bi];
        let sa = adjusted(
            selected_savings(a.length, apos.len()) as f64,
            a.priority,
            config,
        );
        let sb = adjusted(
            selected_savings(b.length, bpos.len()) as f64,
            b.priority,
            config,
        );
        sb.total_cmp(&sa).then_with(|| tie_break(a, b))
    });

    for (_, positions) in groups.iter_mut() {
        positions.sort_unstable();
    }

    build_selection(candidates, groups)
}

// === Beam ===

#[derive(Debug, Clone, Default)]
struct BeamState {
    score: f64,
    intervals: IntervalSet,
    chosen: Vec<(usize, Vec<usize>)>,
}

impl BeamState {
    /// Candidate indices only, for deterministic state ordering.
    fn key(&self) -> Vec<usize> {
        self.chosen.iter().map(|(idx, _)| *idx).collect()
    }
}

fn select_beam(candidates: &[Candidate], config: &CompressionConfig, width: usize) -> Selection {
    let score_of = |c: &Candidate| {
        adjusted(
            selected_savings(c.length, c.count) as f64,
            c.priority,
            config,
        )
    };

    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&i, &j| {
        score_of(&candidates[j])
            .total_cmp(&score_of(&candidates[i]))
            .then_with(|| tie_break(&candidates[i], &candidates[j]))
    });

    let mut states = vec![BeamState::default()];

    for idx in order {
        let candidate = &candidates[idx];
        let mut expanded: Vec<BeamState> = Vec::with_capacity(states.len() * 2);

        for state in states {
            // Option 1: include, if enough occurrences still fit.
            let mut accepted = Vec::new();
            let mut probe = state.intervals.clone();
            for &pos in &candidate.positions {
                if probe.is_free(pos, pos + candidate.length) {
                    probe.insert(pos, pos + candidate.length);
                    accepted.push(pos);
                }
            }
            let gain = selected_savings(candidate.length, accepted.len());
            if accepted.len() >= 2 && gain >= 0 {
                let mut included = state.clone();
                included.score += adjusted(gain as f64, candidate.priority, config);
                included.intervals = probe;
                included.chosen.push((idx, accepted));
                expanded.push(included);
            }

            // Option 2: skip.
            expanded.push(state);
        }

        expanded.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.key().cmp(&b.key())));
        expanded.truncate(width.max(1));
        states = expanded;
    }

    let best = states.into_iter().next().unwrap_or_default();
    build_selection(candidates, best.chosen)
}
