//! Configuration management.
//!
//! Supports configuration from:
//! - TOML config files
//! - Environment variables (`METATOK_*`)
//! - Direct construction with [`CompressionConfig::default`]

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CompressError, Result};

/// Selection strategy for choosing pattern occurrences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Savings-density greedy sweep. Fast, near-optimal on typical inputs.
    #[default]
    Greedy,
    /// Weighted interval scheduling over occurrences. Exact for the
    /// amortized-cost objective.
    Optimal,
    /// Beam search over candidate include/exclude decisions.
    Beam,
    /// 0/1 integer program over candidate indicators. No solver is bundled,
    /// so this mode degrades to `optimal`.
    Ilp,
}

impl SelectionMode {
    /// Human-readable name as accepted in config files and CLI flags.
    pub fn name(&self) -> &'static str {
        match self {
            SelectionMode::Greedy => "greedy",
            SelectionMode::Optimal => "optimal",
            SelectionMode::Beam => "beam",
            SelectionMode::Ilp => "ilp",
        }
    }
}

impl FromStr for SelectionMode {
    type Err = CompressError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "greedy" => Ok(SelectionMode::Greedy),
            "optimal" => Ok(SelectionMode::Optimal),
            "beam" => Ok(SelectionMode::Beam),
            "ilp" => Ok(SelectionMode::Ilp),
            other => Err(CompressError::ConfigInvalid(format!(
                "Unknown selection mode: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Compression configuration.
///
/// The token space is partitioned into three disjoint ranges:
///
/// | Range    | Values                                  |
/// |----------|-----------------------------------------|
/// | ordinary | `[0, next_meta_token)`                  |
/// | meta     | `[next_meta_token, dict_start_token)`   |
/// | control  | `dict_start_token`, `dict_end_token`    |
///
/// The same boundaries must be used to decompress an artifact that was
/// produced with them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Lower bound on candidate pattern length.
    pub min_subsequence_length: usize,

    /// Upper bound on candidate pattern length. Discovery cost grows
    /// linearly with this value.
    pub max_subsequence_length: usize,

    /// Occurrence selection strategy.
    pub selection_mode: SelectionMode,

    /// Number of partial selections kept alive in `beam` mode.
    pub beam_width: usize,

    /// Enable multi-pass compression over the previous pass's body.
    pub hierarchical_enabled: bool,

    /// Maximum passes before halting.
    pub hierarchical_max_depth: usize,

    /// After emitting, decompress and compare against the input.
    pub verify: bool,

    /// Control token opening the dictionary section.
    pub dict_start_token: u32,

    /// Control token closing the dictionary section.
    pub dict_end_token: u32,

    /// First meta-token available for allocation.
    pub next_meta_token: u32,

    /// Run discovery for distinct pattern lengths on parallel workers.
    /// Output is identical to the serial mode.
    pub parallel_discovery: bool,

    /// Weight of externally supplied candidate priorities: savings used for
    /// ordering are multiplied by `1 + priority_alpha * priority`.
    pub priority_alpha: f64,

    /// Cap on estimated working memory for the suffix structures, in MB.
    pub max_memory_mb: usize,

    /// Attach [`CompressionMetrics`](crate::codec::CompressionMetrics) to
    /// results.
    pub collect_metrics: bool,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            min_subsequence_length: 2,
            max_subsequence_length: 8,
            selection_mode: SelectionMode::Greedy,
            beam_width: 8,
            hierarchical_enabled: true,
            hierarchical_max_depth: 3,
            verify: false,
            dict_start_token: 0xFFFF_FFF0,
            dict_end_token: 0xFFFF_FFF1,
            next_meta_token: 0xFFFF_0000,
            parallel_discovery: false,
            priority_alpha: 0.5,
            max_memory_mb: 256,
            collect_metrics: false,
        }
    }
}

impl CompressionConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| CompressError::ConfigInvalid(format!("Failed to read config file: {e}")))?;

        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration overrides from `METATOK_*` environment variables.
    ///
    /// Unset or unparsable variables leave the default in place.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("METATOK_MIN_LEN") {
            if let Ok(val) = val.parse() {
                config.min_subsequence_length = val;
            }
        }
        if let Ok(val) = std::env::var("METATOK_MAX_LEN") {
            if let Ok(val) = val.parse() {
                config.max_subsequence_length = val;
            }
        }
        if let Ok(val) = std::env::var("METATOK_SELECTION_MODE") {
            if let Ok(mode) = val.parse() {
                config.selection_mode = mode;
            }
        }
        if let Ok(val) = std::env::var("METATOK_MAX_DEPTH") {
            if let Ok(val) = val.parse() {
                config.hierarchical_max_depth = val;
            }
        }
        if let Ok(val) = std::env::var("METATOK_MAX_MEMORY_MB") {
            if let Ok(val) = val.parse() {
                config.max_memory_mb = val;
            }
        }

        config
    }

    /// Check internal consistency. Called by the engine before every
    /// compression; exposed for callers that build configs by hand.
    pub fn validate(&self) -> Result<()> {
        if self.min_subsequence_length < 2 {
            return Err(CompressError::ConfigInvalid(
                "min_subsequence_length must be at least 2".to_string(),
            ));
        }
        if self.max_subsequence_length < self.min_subsequence_length {
            return Err(CompressError::ConfigInvalid(format!(
                "max_subsequence_length ({}) is below min_subsequence_length ({})",
                self.max_subsequence_length, self.min_subsequence_length
            )));
        }
        if self.selection_mode == SelectionMode::Beam && self.beam_width == 0 {
            return Err(CompressError::ConfigInvalid(
                "beam_width must be at least 1 in beam mode".to_string(),
            ));
        }
        if self.hierarchical_enabled && self.hierarchical_max_depth == 0 {
            return Err(CompressError::ConfigInvalid(
                "hierarchical_max_depth must be at least 1".to_string(),
            ));
        }
        if self.next_meta_token >= self.dict_start_token {
            return Err(CompressError::ConfigInvalid(format!(
                "meta range is empty: next_meta_token 0x{:08X} >= dict_start_token 0x{:08X}",
                self.next_meta_token, self.dict_start_token
            )));
        }
        if self.dict_end_token == self.dict_start_token {
            return Err(CompressError::ConfigInvalid(
                "dict_start_token and dict_end_token must differ".to_string(),
            ));
        }
        if self.dict_end_token < self.dict_start_token {
            return Err(CompressError::ConfigInvalid(format!(
                "dict_end_token 0x{:08X} falls in the ordinary or meta range",
                self.dict_end_token
            )));
        }
        if !(0.0..=1.0).contains(&self.priority_alpha) {
            return Err(CompressError::ConfigInvalid(format!(
                "priority_alpha must lie in [0, 1], got {}",
                self.priority_alpha
            )));
        }
        Ok(())
    }

    /// Whether `token` is an ordinary application token.
    pub fn is_ordinary(&self, token: u32) -> bool {
        token < self.next_meta_token
    }

    /// Whether `token` lies in the meta range.
    pub fn is_meta(&self, token: u32) -> bool {
        token >= self.next_meta_token && token < self.dict_start_token
    }

    /// Whether `token` is one of the two control tokens.
    pub fn is_control(&self, token: u32) -> bool {
        token == self.dict_start_token || token == self.dict_end_token
    }

    /// Number of meta-token values available for allocation.
    pub fn meta_capacity(&self) -> usize {
        (self.dict_start_token - self.next_meta_token) as usize
    }
}
