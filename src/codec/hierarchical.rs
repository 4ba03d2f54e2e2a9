//! Multi-pass compression driver.
//!
//! Each pass runs discovery and selection over the previous pass's body,
//! treating earlier meta-tokens as ordinary input, and appends its entries
//! to one shared dictionary. The meta cursor advances monotonically, so
//! every pass allocates from a disjoint sub-range and later definitions can
//! only reference earlier meta-tokens. Passes are sequential; the driver
//! stops at the configured depth or at the first pass that selects nothing,
//! which is normal termination rather than an error.

use super::discovery::discover_candidates;
use super::selection::{select_occurrences, PriorityScorer, RegionFilter};
use super::serialize::build_body;
use super::types::{DictionaryEntry, Token};
use crate::config::CompressionConfig;
use crate::error::{CompressError, Result};

/// Accumulated output of the pass loop.
#[derive(Debug, Default)]
pub(crate) struct DriverOutcome {
    /// Final body after the last productive pass.
    pub body: Vec<Token>,
    /// Dictionary entries in allocation order.
    pub entries: Vec<DictionaryEntry>,
    /// Candidates reported by discovery, summed over passes.
    pub candidates_discovered: usize,
    /// Occurrences replaced, summed over passes.
    pub occurrences_replaced: usize,
    /// Body tokens saved by each productive pass.
    pub tokens_saved_per_pass: Vec<usize>,
}

/// Run up to the configured number of passes over `tokens`.
///
/// `meta_cursor` is the next free meta-token; it is advanced past every
/// allocation so callers can layer static reservations underneath.
pub(crate) fn run_passes(
    tokens: &[Token],
    config: &CompressionConfig,
    scorer: &dyn PriorityScorer,
    filter: &dyn RegionFilter,
    meta_cursor: &mut Token,
) -> Result<DriverOutcome> {
    let mut outcome = DriverOutcome {
        body: tokens.to_vec(),
        ..Default::default()
    };

    let depth = if config.hierarchical_enabled {
        config.hierarchical_max_depth
    } else {
        1
    };

    for pass in 0..depth {
        let mut candidates = discover_candidates(&outcome.body, config);
        outcome.candidates_discovered += candidates.len();
        if candidates.is_empty() {
            tracing::debug!(pass, "no candidates; stopping");
            break;
        }

        for candidate in &mut candidates {
            candidate.priority = scorer
                .score_candidate(candidate, &outcome.body)
                .clamp(0.0, 1.0);
        }
        candidates.retain(|candidate| filter.allows(candidate));

        let selection = select_occurrences(&candidates, config);
        if selection.is_empty() {
            tracing::debug!(pass, "nothing selected; stopping");
            break;
        }

        let needed = selection.patterns.len();
        let available = (config.dict_start_token - *meta_cursor) as usize;
        if needed > available {
            return Err(CompressError::ConfigInvalid(format!(
                "meta-token range exhausted: pass {pass} needs {needed} values, {available} left"
            )));
        }

        // Selection order is the allocation order: the k-th selected
        // pattern gets cursor + k.
        let metas: Vec<Token> = (0..needed as Token).map(|k| *meta_cursor + k).collect();
        *meta_cursor += needed as Token;

        let new_body = build_body(&outcome.body, &selection, &metas);
        let saved = outcome.body.len() - new_body.len();

        outcome.entries.extend(
            selection
                .patterns
                .into_iter()
                .zip(metas)
                .map(|(pattern, meta_token)| DictionaryEntry {
                    meta_token,
                    definition: pattern,
                }),
        );
        outcome.occurrences_replaced += selection.occurrences.len();
        outcome.tokens_saved_per_pass.push(saved);

        tracing::debug!(pass, patterns = needed, saved, "pass complete");
        outcome.body = new_body;
    }

    Ok(outcome)
}
