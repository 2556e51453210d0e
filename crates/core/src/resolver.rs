//! The duplicate-resolution decision policy.
//!
//! Pure over a list of already-scored matches; the async plumbing that
//! produces those scores (spatial query plus scorer) lives in
//! `plinth-importer`. Deterministic given the same inputs: ordering is
//! stable, with exact score ties broken by ascending record id.

use serde::{Deserialize, Serialize};

use crate::similarity::SimilarityResult;
use crate::types::DbId;

/// One archive record scored against the candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredMatch {
    pub target_id: DbId,
    pub similarity: SimilarityResult,
}

/// The decision for a single incoming candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resolution {
    /// No archive record qualified; the candidate is a new artwork.
    New,
    /// Exactly one best match above the threshold.
    Duplicate {
        target_id: DbId,
        similarity: SimilarityResult,
    },
    /// Two or more near-equal matches above the threshold. Never resolved by
    /// guessing; all contenders are surfaced for manual review.
    Ambiguous { candidates: Vec<ScoredMatch> },
}

impl Resolution {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Duplicate { .. } => "duplicate",
            Self::Ambiguous { .. } => "ambiguous",
        }
    }
}

/// Decide between new, duplicate, and ambiguous from scored matches.
///
/// Matches with `score >= threshold` (inclusive) qualify. Zero qualifiers
/// resolves `New`; one resolves `Duplicate`. With several, the result is
/// `Ambiguous` only when the two highest scores differ by less than
/// `tie_band`; otherwise the single highest-scoring match wins.
pub fn resolve_matches(scored: Vec<ScoredMatch>, threshold: f64, tie_band: f64) -> Resolution {
    let mut qualifying: Vec<ScoredMatch> = scored
        .into_iter()
        .filter(|m| m.similarity.score >= threshold)
        .collect();

    // Highest score first; equal scores ordered by ascending id so the
    // decision is stable across runs.
    qualifying.sort_by(|a, b| {
        b.similarity
            .score
            .partial_cmp(&a.similarity.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.target_id.cmp(&b.target_id))
    });

    match qualifying.len() {
        0 => Resolution::New,
        1 => {
            let top = qualifying.remove(0);
            Resolution::Duplicate {
                target_id: top.target_id,
                similarity: top.similarity,
            }
        }
        _ => {
            let gap = qualifying[0].similarity.score - qualifying[1].similarity.score;
            if gap < tie_band {
                Resolution::Ambiguous {
                    candidates: qualifying,
                }
            } else {
                let top = qualifying.remove(0);
                Resolution::Duplicate {
                    target_id: top.target_id,
                    similarity: top.similarity,
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
