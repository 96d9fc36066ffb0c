//! # Similarity Module
//!
//! Scores photo pairs with single-scale structural similarity (SSIM) over
//! the luma channel and enumerates the pairs worth scoring.
//!
//! ```text
//! C1 = (0.01 · 255)²   C2 = (0.03 · 255)²
//! ssim = (2·μa·μb + C1)(2·σab + C2) / ((μa² + μb² + C1)(σa² + σb² + C2))
//! ```
//!
//! ## Score Guide
//! | Score       | Meaning                               |
//! |-------------|---------------------------------------|
//! | 1.0         | Identical after normalization         |
//! | 0.98 - 1.0  | Re-encoded or resized copy            |
//! | 0.94 - 0.98 | Likely duplicate (light edits)        |
//! | below 0.9   | Usually a different photo             |

mod pairs;
mod threshold;

pub use pairs::{candidate_pair_count, candidate_pairs, score_pairs};
pub use threshold::SimilarityThreshold;

use crate::core::features::FeatureRecord;

const K1: f64 = 0.01;
const K2: f64 = 0.03;
const DYNAMIC_RANGE: f64 = 255.0;
const C1: f64 = (K1 * DYNAMIC_RANGE) * (K1 * DYNAMIC_RANGE);
const C2: f64 = (K2 * DYNAMIC_RANGE) * (K2 * DYNAMIC_RANGE);

/// Structural similarity of two feature records.
///
/// Pure and symmetric: `structural_similarity(a, b) == structural_similarity(b, a)`
/// bit for bit, and a record scores 1.0 against itself.
///
/// # Panics
/// If the records hold different numbers of lumas. Extraction always
/// produces the same length, so this is a defect rather than bad input.
pub fn structural_similarity(a: &FeatureRecord, b: &FeatureRecord) -> f64 {
    let lumas_a = a.centered_lumas();
    let lumas_b = b.centered_lumas();
    assert_eq!(
        lumas_a.len(),
        lumas_b.len(),
        "feature length mismatch between {} and {}",
        a.path().display(),
        b.path().display()
    );

    let n = lumas_a.len().max(1) as f32;
    let covariance = lumas_a
        .iter()
        .zip(lumas_b)
        .map(|(x, y)| x * y)
        .sum::<f32>()
        / n;

    let mean_a = f64::from(a.average_luma());
    let mean_b = f64::from(b.average_luma());
    let variance_a = f64::from(a.variance_luma());
    let variance_b = f64::from(b.variance_luma());
    let covariance = f64::from(covariance);

    // Every term is written symmetrically in a and b
    let luminance = (2.0 * (mean_a * mean_b) + C1) / (mean_a * mean_a + mean_b * mean_b + C1);
    let structure = (2.0 * covariance + C2) / (variance_a + variance_b + C2);
    luminance * structure
}

/// Two records and their similarity score
#[derive(Debug, Clone, Copy)]
pub struct ScoredPair<'a> {
    first: &'a FeatureRecord,
    second: &'a FeatureRecord,
    score: f64,
}

impl<'a> ScoredPair<'a> {
    /// Score a pair of records
    pub fn new(first: &'a FeatureRecord, second: &'a FeatureRecord) -> Self {
        Self {
            first,
            second,
            score: structural_similarity(first, second),
        }
    }

    /// Pair with a precomputed score
    pub fn with_score(first: &'a FeatureRecord, second: &'a FeatureRecord, score: f64) -> Self {
        Self {
            first,
            second,
            score,
        }
    }

    /// The first-named side
    pub fn first(&self) -> &'a FeatureRecord {
        self.first
    }

    pub fn second(&self) -> &'a FeatureRecord {
        self.second
    }

    pub fn score(&self) -> f64 {
        self.score
    }
}
