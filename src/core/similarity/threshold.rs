//! Similarity threshold that decides which pairs reach the resolver.

use crate::error::ResolveError;

/// Minimum score for a pair to count as a duplicate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityThreshold {
    value: f64,
}

impl SimilarityThreshold {
    /// Create a threshold; must be finite and within `[0, 1]`.
    ///
    /// Recommended values:
    /// - 1.0: only copies that are identical after normalization
    /// - 0.94: re-encodes, resizes and light edits (balanced)
    /// - 0.90: permissive, expect some false positives
    pub fn new(value: f64) -> Result<Self, ResolveError> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(ResolveError::InvalidThreshold { value });
        }
        Ok(Self { value })
    }

    pub fn exact() -> Self {
        Self { value: 1.0 }
    }

    pub fn balanced() -> Self {
        Self { value: 0.94 }
    }

    pub fn permissive() -> Self {
        Self { value: 0.90 }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Whether a score is at or above the threshold
    pub fn is_match(&self, score: f64) -> bool {
        score >= self.value
    }
}

impl Default for SimilarityThreshold {
    fn default() -> Self {
        Self::exact()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_inclusive() {
        let threshold = SimilarityThreshold::new(0.94).unwrap();

        assert!(threshold.is_match(0.95));
        assert!(threshold.is_match(0.94));
        assert!(!threshold.is_match(0.9399));
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(SimilarityThreshold::new(-0.1).is_err());
        assert!(SimilarityThreshold::new(1.01).is_err());
        assert!(SimilarityThreshold::new(f64::NAN).is_err());
        assert!(SimilarityThreshold::new(0.0).is_ok());
        assert!(SimilarityThreshold::new(1.0).is_ok());
    }

    #[test]
    fn presets() {
        assert_eq!(SimilarityThreshold::default().value(), 1.0);
        assert_eq!(SimilarityThreshold::balanced().value(), 0.94);
        assert_eq!(SimilarityThreshold::permissive().value(), 0.90);
    }
}
