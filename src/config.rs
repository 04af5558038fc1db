//! Detection configuration consumed by the core pipeline.
//!
//! Supplied by the external config/CLI layer, validated up front: a bad
//! threshold silently produces meaningless groups rather than an obvious
//! crash, so validation failures abort the run before any extraction.

use crate::core::errors::{Error, Result};
use serde::{Deserialize, Serialize};

/// Tolerance when checking that the similarity weights sum to 1.0.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectionConfig {
    /// Minimum node count for an extracted pattern. Blocks below this are
    /// never emitted; the default excludes trivial one-line bodies.
    pub min_pattern_size: usize,
    /// Pairwise similarity cutoff for grouping.
    pub similarity_threshold: f64,
    /// Weight of the structural sub-score. Must sum to 1.0 with
    /// `token_weight`.
    pub structural_weight: f64,
    /// Weight of the token sub-score.
    pub token_weight: f64,
    /// Node-count ratio beyond which a pair short-circuits to similarity 0.
    pub max_size_ratio: f64,
    /// When set, categories larger than this are sharded into size-range
    /// buckets before pairwise comparison.
    pub category_shard_cap: Option<usize>,
    /// Run extraction and pairwise scoring on the rayon pool.
    pub parallel: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_pattern_size: 3,
            similarity_threshold: 0.8,
            structural_weight: 0.6,
            token_weight: 0.4,
            max_size_ratio: 3.0,
            category_shard_cap: None,
            parallel: true,
        }
    }
}

impl DetectionConfig {
    /// Validate the configuration. Runs before any extraction begins.
    pub fn validate(&self) -> Result<()> {
        if self.min_pattern_size == 0 {
            return Err(Error::configuration("min_pattern_size must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(Error::configuration(format!(
                "similarity_threshold must be within [0, 1], got {}",
                self.similarity_threshold
            )));
        }
        for (name, weight) in [
            ("structural_weight", self.structural_weight),
            ("token_weight", self.token_weight),
        ] {
            if !(0.0..=1.0).contains(&weight) {
                return Err(Error::configuration(format!(
                    "{name} must be within [0, 1], got {weight}"
                )));
            }
        }
        let weight_sum = self.structural_weight + self.token_weight;
        if (weight_sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(Error::configuration(format!(
                "structural_weight and token_weight must sum to 1.0, got {weight_sum}"
            )));
        }
        if self.max_size_ratio < 1.0 || !self.max_size_ratio.is_finite() {
            return Err(Error::configuration(format!(
                "max_size_ratio must be a finite value >= 1.0, got {}",
                self.max_size_ratio
            )));
        }
        Ok(())
    }

    /// Parse a configuration from TOML, e.g. a `.dupscan.toml` file.
    /// Unknown keys are rejected so typos do not silently fall back to
    /// defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: DetectionConfig = toml::from_str(content)
            .map_err(|e| Error::configuration(format!("invalid config file: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}
