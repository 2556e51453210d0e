//! Import engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Minimum composite similarity score at which a candidate is treated as a
/// duplicate of an archive record.
pub const DEFAULT_DUPLICATE_THRESHOLD: f64 = 0.7;
pub const MIN_DUPLICATE_THRESHOLD: f64 = 0.0;
/// Upper sanity bound; tag contributions are uncapped so scores above 1.0
/// are legitimate, but a threshold above this is a configuration mistake.
pub const MAX_DUPLICATE_THRESHOLD: f64 = 2.0;

/// Radius of the spatial candidate search. Wider than the 50 m scoring decay
/// so true duplicates near the edge of the decay curve are still found.
pub const DEFAULT_SEARCH_RADIUS_METERS: f64 = 100.0;

/// Score-difference window within which two competing matches are treated as
/// equally plausible.
pub const DEFAULT_TIE_BAND_WIDTH: f64 = 0.05;

/// Consecutive collaborator failures after which the rest of the batch is
/// abandoned.
pub const DEFAULT_MAX_CONSECUTIVE_ERRORS: u32 = 3;

/// Options consumed by the batch orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOptions {
    pub threshold: f64,
    pub search_radius_meters: f64,
    pub tie_band_width: f64,
    /// Skip candidates whose source id was already imported in a prior run,
    /// without re-scoring.
    pub idempotent: bool,
    pub max_consecutive_errors: u32,
    /// Resolve and report only; no submissions, patches, or photo calls.
    pub dry_run: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_DUPLICATE_THRESHOLD,
            search_radius_meters: DEFAULT_SEARCH_RADIUS_METERS,
            tie_band_width: DEFAULT_TIE_BAND_WIDTH,
            idempotent: true,
            max_consecutive_errors: DEFAULT_MAX_CONSECUTIVE_ERRORS,
            dry_run: false,
        }
    }
}

impl ImportOptions {
    /// Validate option ranges before a run starts.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.threshold.is_finite()
            || !(MIN_DUPLICATE_THRESHOLD..=MAX_DUPLICATE_THRESHOLD).contains(&self.threshold)
        {
            return Err(CoreError::Validation(format!(
                "Duplicate threshold must be between {MIN_DUPLICATE_THRESHOLD} and {MAX_DUPLICATE_THRESHOLD}, got {}",
                self.threshold
            )));
        }
        if !self.search_radius_meters.is_finite() || self.search_radius_meters <= 0.0 {
            return Err(CoreError::Validation(format!(
                "Search radius must be positive, got {}",
                self.search_radius_meters
            )));
        }
        if !self.tie_band_width.is_finite() || self.tie_band_width < 0.0 {
            return Err(CoreError::Validation(format!(
                "Tie band width must be non-negative, got {}",
                self.tie_band_width
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn defaults_validate() {
        assert!(ImportOptions::default().validate().is_ok());
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let mut options = ImportOptions::default();
        options.threshold = 2.5;
        assert_matches!(options.validate(), Err(CoreError::Validation(_)));

        options.threshold = -0.1;
        assert_matches!(options.validate(), Err(CoreError::Validation(_)));

        options.threshold = f64::NAN;
        assert_matches!(options.validate(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn non_positive_radius_is_rejected() {
        let mut options = ImportOptions::default();
        options.search_radius_meters = 0.0;
        assert_matches!(options.validate(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn negative_tie_band_is_rejected() {
        let mut options = ImportOptions::default();
        options.tie_band_width = -0.01;
        assert_matches!(options.validate(), Err(CoreError::Validation(_)));
    }
}
