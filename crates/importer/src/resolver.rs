//! Duplicate resolution for a single candidate: spatial search, scoring,
//! and the tie-band decision policy.

use plinth_core::artwork::ArtworkRecord;
use plinth_core::candidate::ImportCandidate;
use plinth_core::config::ImportOptions;
use plinth_core::resolver::{resolve_matches, Resolution, ScoredMatch};
use plinth_core::similarity::{score, ScoringWeights, SimilarityResult};

use crate::finder::SpatialCandidateFinder;
use crate::gateway::{ArchiveIndex, GatewayError};

/// A resolution carrying the matched record itself, so the orchestrator can
/// merge tags without a second archive round trip.
#[derive(Debug, Clone)]
pub enum Resolved {
    New,
    Duplicate {
        target: Box<ArtworkRecord>,
        similarity: SimilarityResult,
    },
    Ambiguous {
        candidates: Vec<ScoredMatch>,
    },
}

impl Resolved {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Duplicate { .. } => "duplicate",
            Self::Ambiguous { .. } => "ambiguous",
        }
    }
}

/// Decides, for one candidate, between new artwork, duplicate of an archive
/// record, and ambiguous. Deterministic given the same archive state and
/// options.
pub struct DuplicateResolver<'a> {
    index: &'a dyn ArchiveIndex,
    weights: ScoringWeights,
}

impl<'a> DuplicateResolver<'a> {
    pub fn new(index: &'a dyn ArchiveIndex) -> Self {
        Self {
            index,
            weights: ScoringWeights::default(),
        }
    }

    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Resolve a candidate against the archive.
    ///
    /// Candidates without usable coordinates skip the spatial search and
    /// resolve `New`: with no geographic candidates there is nothing to
    /// compare against, and that is a degraded path, not an error.
    pub async fn resolve(
        &self,
        candidate: &ImportCandidate,
        options: &ImportOptions,
    ) -> Result<Resolved, GatewayError> {
        let Some(center) = candidate.valid_location() else {
            tracing::debug!(
                source_id = %candidate.source_id,
                "candidate has no usable coordinates, skipping spatial search"
            );
            return Ok(Resolved::New);
        };

        let nearby = SpatialCandidateFinder::new(self.index)
            .find_candidates(center, options.search_radius_meters)
            .await?;

        let scored: Vec<ScoredMatch> = nearby
            .iter()
            .map(|n| ScoredMatch {
                target_id: n.record.id,
                similarity: score(candidate, &n.record, &self.weights, options.threshold),
            })
            .collect();

        let resolution = resolve_matches(scored, options.threshold, options.tie_band_width);

        Ok(match resolution {
            Resolution::New => Resolved::New,
            Resolution::Duplicate {
                target_id,
                similarity,
            } => {
                let target = nearby
                    .into_iter()
                    .find(|n| n.record.id == target_id)
                    .map(|n| Box::new(n.record))
                    .ok_or_else(|| {
                        // The id came out of `nearby` moments ago; missing it
                        // would be a logic bug, not a collaborator failure.
                        GatewayError::Rejected(format!(
                            "matched record {target_id} disappeared from the candidate list"
                        ))
                    })?;
                Resolved::Duplicate { target, similarity }
            }
            Resolution::Ambiguous { candidates } => Resolved::Ambiguous { candidates },
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use plinth_core::artwork::PublicationStatus;
    use plinth_core::candidate::ArtistField;
    use plinth_core::geo::LatLon;
    use plinth_core::tags::TagMap;

    struct FixedIndex {
        records: Vec<ArtworkRecord>,
    }

    #[async_trait]
    impl ArchiveIndex for FixedIndex {
        async fn query_near(
            &self,
            _center: LatLon,
            _radius_meters: f64,
            _status: Option<PublicationStatus>,
        ) -> Result<Vec<ArtworkRecord>, GatewayError> {
            Ok(self.records.clone())
        }
    }

    fn candidate(title: &str, artist: &str, location: Option<LatLon>) -> ImportCandidate {
        ImportCandidate {
            source_id: "src-1".to_string(),
            title: Some(title.to_string()),
            raw_artists: ArtistField::One(artist.to_string()),
            location,
            raw_tags: TagMap::new(),
            photo_urls: vec![],
            source_name: "test".to_string(),
            source_url: None,
            import_batch_id: "batch-1".to_string(),
        }
    }

    fn record(id: i64, title: &str, artist: &str, lat: f64, lon: f64) -> ArtworkRecord {
        ArtworkRecord {
            id,
            title: Some(title.to_string()),
            location: Some(LatLon::new(lat, lon)),
            artists: if artist.is_empty() {
                vec![]
            } else {
                vec![artist.to_string()]
            },
            tags: TagMap::new(),
            photos: vec![],
            status: PublicationStatus::Approved,
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn exact_match_resolves_duplicate_with_target_record() {
        let index = FixedIndex {
            records: vec![record(
                7,
                "Arc de Triomphe",
                "Jacques Huet",
                49.278845,
                -122.915511,
            )],
        };
        let resolver = DuplicateResolver::new(&index);
        let c = candidate(
            "Arc de Triomphe",
            "Jacques Huet",
            Some(LatLon::new(49.278845, -122.915511)),
        );

        let resolved = resolver
            .resolve(&c, &ImportOptions::default())
            .await
            .expect("resolve succeeds");

        let Resolved::Duplicate { target, similarity } = resolved else {
            panic!("expected duplicate");
        };
        assert_eq!(target.id, 7);
        assert!(similarity.is_duplicate);
    }

    #[tokio::test]
    async fn candidate_without_coordinates_resolves_new() {
        let index = FixedIndex {
            records: vec![record(1, "Untitled", "", 49.0, -123.0)],
        };
        let resolver = DuplicateResolver::new(&index);
        let c = candidate("Untitled", "", None);

        let resolved = resolver
            .resolve(&c, &ImportOptions::default())
            .await
            .expect("resolve succeeds");
        assert_matches!(resolved, Resolved::New);
    }

    #[tokio::test]
    async fn far_away_same_name_resolves_new() {
        // Identical title and artist, 5 km away: location contributes zero
        // and 0.4 stays under the 0.7 threshold.
        let index = FixedIndex {
            records: vec![record(1, "Spinning Chandelier", "Rodney Graham", 49.3230, -123.1000)],
        };
        let resolver = DuplicateResolver::new(&index);
        let c = candidate(
            "Spinning Chandelier",
            "Rodney Graham",
            Some(LatLon::new(49.2780, -123.1000)),
        );

        let resolved = resolver
            .resolve(&c, &ImportOptions::default())
            .await
            .expect("resolve succeeds");
        assert_matches!(resolved, Resolved::New);
    }

    #[tokio::test]
    async fn two_near_equal_matches_resolve_ambiguous() {
        // Two untitled murals ~10 m apart, candidate at the midpoint. With a
        // lowered threshold both qualify at nearly the same score.
        let index = FixedIndex {
            records: vec![
                record(1, "Untitled Mural", "", 49.27800, -123.10000),
                record(2, "Untitled Mural", "", 49.27809, -123.10000),
            ],
        };
        let resolver = DuplicateResolver::new(&index);
        let c = candidate(
            "Untitled Mural",
            "",
            Some(LatLon::new(49.278045, -123.10000)),
        );

        let mut options = ImportOptions::default();
        options.threshold = 0.4;

        let resolved = resolver.resolve(&c, &options).await.expect("resolve succeeds");
        let Resolved::Ambiguous { candidates } = resolved else {
            panic!("expected ambiguous");
        };
        let ids: Vec<i64> = candidates.iter().map(|m| m.target_id).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&1) && ids.contains(&2));
    }

    #[tokio::test]
    async fn index_failure_propagates_to_the_caller() {
        struct FailingIndex;

        #[async_trait]
        impl ArchiveIndex for FailingIndex {
            async fn query_near(
                &self,
                _center: LatLon,
                _radius_meters: f64,
                _status: Option<PublicationStatus>,
            ) -> Result<Vec<ArtworkRecord>, GatewayError> {
                Err(GatewayError::Timeout)
            }
        }

        let resolver = DuplicateResolver::new(&FailingIndex);
        let c = candidate("Anything", "", Some(LatLon::new(49.0, -123.0)));

        let result = resolver.resolve(&c, &ImportOptions::default()).await;
        assert_matches!(result, Err(GatewayError::Timeout));
    }
}
