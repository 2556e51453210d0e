//! Composite similarity scoring between an import candidate and an archive
//! record.
//!
//! The score is the unweighted sum of four components: title edit-distance
//! similarity, artist token overlap, geographic proximity, and matching
//! tags. Each component is clamped to its configured maximum contribution
//! except tags, which are uncapped per tag-merge policy. Missing or malformed
//! data on either side is always a neutral zero contribution, never an error.

use serde::{Deserialize, Serialize};
use strsim::normalized_levenshtein;

use crate::artwork::ArtworkRecord;
use crate::candidate::ImportCandidate;
use crate::geo::haversine_meters;
use crate::normalize::{normalize_artist_entries, normalize_text};
use crate::types::DbId;

/// Distance at which the location contribution decays to zero. Tighter than
/// the 100 m candidate-search radius, so near-edge matches are still found
/// but score low.
pub const LOCATION_DECAY_METERS: f64 = 50.0;

/// Per-component maximum contributions and thresholds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Maximum contribution of title similarity.
    pub title_max: f64,
    /// Contribution awarded when any artist token pair fuzzy-matches.
    pub artist_max: f64,
    /// Maximum contribution of geographic proximity, awarded at 0 m.
    pub location_max: f64,
    /// Contribution per tag present on both sides with an equal normalized
    /// value. The total is uncapped; a record with many overlapping tags may
    /// push the composite score past 1.0.
    pub per_tag: f64,
    /// Minimum edit-distance similarity for two artist tokens to count as
    /// the same artist.
    pub artist_token_threshold: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            title_max: 0.2,
            artist_max: 0.2,
            location_max: 0.3,
            per_tag: 0.05,
            artist_token_threshold: 0.8,
        }
    }
}

/// Per-component sub-scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilarityBreakdown {
    pub title: f64,
    pub artist: f64,
    pub location: f64,
    pub tags: f64,
}

/// The result of scoring one candidate against one archive record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityResult {
    /// Unweighted sum of the breakdown components.
    pub score: f64,
    pub breakdown: SimilarityBreakdown,
    /// Whether `score` met the duplicate threshold (inclusive).
    pub is_duplicate: bool,
    pub matched_record_id: Option<DbId>,
}

/// Score `candidate` against `existing`.
///
/// Total over partial data: absent titles, artists, coordinates, or tags on
/// either side contribute zero. Malformed coordinates (NaN, out of range)
/// are treated as absent rather than propagating NaN into the sum.
pub fn score(
    candidate: &ImportCandidate,
    existing: &ArtworkRecord,
    weights: &ScoringWeights,
    threshold: f64,
) -> SimilarityResult {
    let breakdown = SimilarityBreakdown {
        title: title_score(candidate, existing, weights),
        artist: artist_score(candidate, existing, weights),
        location: location_score(candidate, existing, weights),
        tags: tag_score(candidate, existing, weights),
    };

    let total = breakdown.title + breakdown.artist + breakdown.location + breakdown.tags;

    SimilarityResult {
        score: total,
        breakdown,
        is_duplicate: total >= threshold,
        matched_record_id: Some(existing.id),
    }
}

/// Normalized edit-distance similarity between titles, scaled to
/// `title_max`. An empty title on either side contributes zero.
fn title_score(
    candidate: &ImportCandidate,
    existing: &ArtworkRecord,
    weights: &ScoringWeights,
) -> f64 {
    let a = candidate.trimmed_title().map(normalize_text).unwrap_or_default();
    let b = existing
        .title
        .as_deref()
        .map(normalize_text)
        .unwrap_or_default();

    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    (normalized_levenshtein(&a, &b) * weights.title_max).clamp(0.0, weights.title_max)
}

/// Full `artist_max` if any token from one side fuzzy-matches any token from
/// the other; zero otherwise. Missing attribution on either side neither
/// penalizes nor rewards.
fn artist_score(
    candidate: &ImportCandidate,
    existing: &ArtworkRecord,
    weights: &ScoringWeights,
) -> f64 {
    let candidate_tokens = candidate.raw_artists.tokens();
    let existing_tokens = normalize_artist_entries(&existing.artists);

    if candidate_tokens.is_empty() || existing_tokens.is_empty() {
        return 0.0;
    }

    let matched = candidate_tokens.iter().any(|a| {
        existing_tokens
            .iter()
            .any(|b| normalized_levenshtein(a, b) >= weights.artist_token_threshold)
    });

    if matched {
        weights.artist_max
    } else {
        0.0
    }
}

/// Linear decay from `location_max` at 0 m to zero at
/// [`LOCATION_DECAY_METERS`]. Missing or malformed coordinates on either
/// side contribute zero.
fn location_score(
    candidate: &ImportCandidate,
    existing: &ArtworkRecord,
    weights: &ScoringWeights,
) -> f64 {
    let (Some(a), Some(b)) = (candidate.valid_location(), existing.valid_location()) else {
        return 0.0;
    };

    let distance = haversine_meters(a, b);
    (weights.location_max * (1.0 - distance / LOCATION_DECAY_METERS)).max(0.0)
}

/// `per_tag` for each key present on both sides with an equal normalized
/// value; the total carries no cap.
fn tag_score(
    candidate: &ImportCandidate,
    existing: &ArtworkRecord,
    weights: &ScoringWeights,
) -> f64 {
    let matching = candidate
        .raw_tags
        .iter()
        .filter(|(key, value)| {
            existing
                .tags
                .get(key.as_str())
                .is_some_and(|existing_value| {
                    normalize_text(existing_value) == normalize_text(value)
                })
        })
        .count();

    matching as f64 * weights.per_tag
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
