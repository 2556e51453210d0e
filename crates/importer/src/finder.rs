//! Spatial candidate search: a short list of plausible duplicates near a
//! candidate's coordinates, instead of an O(n²) sweep of the archive.

use plinth_core::artwork::ArtworkRecord;
use plinth_core::geo::{haversine_meters, LatLon};

use crate::gateway::{ArchiveIndex, GatewayError};

/// An archive record with its exact distance from the search center.
#[derive(Debug, Clone)]
pub struct NearbyArtwork {
    pub record: ArtworkRecord,
    pub distance_meters: f64,
}

/// Finds archive records within a radius of a point, nearest first.
pub struct SpatialCandidateFinder<'a> {
    index: &'a dyn ArchiveIndex,
}

impl<'a> SpatialCandidateFinder<'a> {
    pub fn new(index: &'a dyn ArchiveIndex) -> Self {
        Self { index }
    }

    /// All archive records within `radius_meters` of `center`, regardless of
    /// publication status, ordered by distance ascending. The index may
    /// over-approximate with a bounding box; results are refined here by
    /// exact great-circle distance. Records without usable coordinates
    /// cannot be within any radius and are dropped.
    pub async fn find_candidates(
        &self,
        center: LatLon,
        radius_meters: f64,
    ) -> Result<Vec<NearbyArtwork>, GatewayError> {
        let records = self.index.query_near(center, radius_meters, None).await?;

        let mut nearby: Vec<NearbyArtwork> = records
            .into_iter()
            .filter_map(|record| {
                let location = record.valid_location()?;
                let distance_meters = haversine_meters(center, location);
                (distance_meters <= radius_meters).then_some(NearbyArtwork {
                    record,
                    distance_meters,
                })
            })
            .collect();

        nearby.sort_by(|a, b| {
            a.distance_meters
                .partial_cmp(&b.distance_meters)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.record.id.cmp(&b.record.id))
        });

        Ok(nearby)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use plinth_core::artwork::PublicationStatus;
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

    fn record(id: i64, location: Option<LatLon>) -> ArtworkRecord {
        ArtworkRecord {
            id,
            title: None,
            location,
            artists: vec![],
            tags: TagMap::new(),
            photos: vec![],
            status: PublicationStatus::Approved,
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn results_are_sorted_by_distance_and_filtered_to_radius() {
        let center = LatLon::new(49.2780, -122.9155);
        let index = FixedIndex {
            records: vec![
                // ~44 m east.
                record(1, Some(LatLon::new(49.2780, -122.9149))),
                // ~15 m east.
                record(2, Some(LatLon::new(49.2780, -122.9153))),
                // ~5 km north; inside a sloppy prefilter, outside the radius.
                record(3, Some(LatLon::new(49.3230, -122.9155))),
            ],
        };

        let finder = SpatialCandidateFinder::new(&index);
        let nearby = finder
            .find_candidates(center, 100.0)
            .await
            .expect("query succeeds");

        let ids: Vec<i64> = nearby.iter().map(|n| n.record.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert!(nearby[0].distance_meters < nearby[1].distance_meters);
    }

    #[tokio::test]
    async fn records_without_coordinates_are_dropped() {
        let center = LatLon::new(49.2780, -122.9155);
        let index = FixedIndex {
            records: vec![
                record(1, None),
                record(2, Some(LatLon::new(f64::NAN, -122.9155))),
                record(3, Some(center)),
            ],
        };

        let finder = SpatialCandidateFinder::new(&index);
        let nearby = finder
            .find_candidates(center, 100.0)
            .await
            .expect("query succeeds");

        let ids: Vec<i64> = nearby.iter().map(|n| n.record.id).collect();
        assert_eq!(ids, vec![3]);
    }

    #[tokio::test]
    async fn empty_archive_yields_empty_list() {
        let index = FixedIndex { records: vec![] };
        let finder = SpatialCandidateFinder::new(&index);
        let nearby = finder
            .find_candidates(LatLon::new(0.0, 0.0), 100.0)
            .await
            .expect("query succeeds");
        assert!(nearby.is_empty());
    }
}
