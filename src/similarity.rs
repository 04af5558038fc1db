//! Pairwise similarity between patterns.
//!
//! Combines a structural signal (positional shape agreement) with a token
//! signal (longest-common-subsequence ratio over the normalized token
//! sequences). Cross-category comparisons are skipped by the callers
//! entirely; this module only ever sees same-category pairs.

use crate::config::DetectionConfig;
use crate::core::{Pattern, SimilarityScore, Token};

pub struct SimilarityCalculator<'a> {
    config: &'a DetectionConfig,
}

impl<'a> SimilarityCalculator<'a> {
    pub fn new(config: &'a DetectionConfig) -> Self {
        Self { config }
    }

    /// Score two same-category patterns.
    ///
    /// Symmetric in its arguments. Pairs whose node counts differ by more
    /// than `max_size_ratio` short-circuit to exactly 0 without any token
    /// comparison: a 3-line accessor and a 90-line transform are never a
    /// meaningful duplicate regardless of token overlap.
    pub fn score(&self, a: &Pattern, b: &Pattern) -> SimilarityScore {
        if size_ratio_exceeded(a.node_count, b.node_count, self.config.max_size_ratio) {
            return SimilarityScore::zero();
        }

        let structural = structural_similarity(&a.tokens, &b.tokens);
        let token = token_similarity(&a.tokens, &b.tokens);
        let value = (self.config.structural_weight * structural
            + self.config.token_weight * token)
            .clamp(0.0, 1.0);

        SimilarityScore {
            value,
            structural,
            token,
        }
    }
}

/// Whether the larger pattern exceeds `max_ratio` times the smaller one.
pub fn size_ratio_exceeded(a: usize, b: usize, max_ratio: f64) -> bool {
    let (small, large) = if a <= b { (a, b) } else { (b, a) };
    if small == 0 {
        return large > 0;
    }
    large as f64 > small as f64 * max_ratio
}

/// Fraction of matching structural positions between the two shape
/// sequences. Order-sensitive: these are normalized token sequences, not
/// sets.
fn structural_similarity(a: &[Token], b: &[Token]) -> f64 {
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 1.0;
    }
    let matching = a
        .iter()
        .zip(b.iter())
        .filter(|(x, y)| x.kind() == y.kind())
        .count();
    matching as f64 / max_len as f64
}

/// LCS ratio over the full normalized token sequences. Placeholder indices
/// and retained words participate here, so differing call or operator
/// choices lower the score even when the shape agrees.
fn token_similarity(a: &[Token], b: &[Token]) -> f64 {
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 1.0;
    }
    lcs_length(a, b) as f64 / max_len as f64
}

/// Two-row dynamic-programming LCS.
fn lcs_length(a: &[Token], b: &[Token]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];
    for x in a {
        for (j, y) in b.iter().enumerate() {
            current[j + 1] = if x == y {
                prev[j] + 1
            } else {
                prev[j + 1].max(current[j])
            };
        }
        std::mem::swap(&mut prev, &mut current);
    }
    prev[b.len()]
}
