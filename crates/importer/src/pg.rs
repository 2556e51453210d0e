//! Postgres-backed collaborator implementations over `plinth-db`.
//!
//! This is the production wiring: the archive index runs the bounding-box
//! prefilter query, and the artwork gateway writes through the same
//! repositories the submission API uses. Photo storage here records the
//! source URL as a photo row; the actual download and thumbnailing pipeline
//! picks rows up from there and fills in `photo_ref`.

use async_trait::async_trait;

use plinth_core::artwork::{ArtworkRecord, PublicationStatus};
use plinth_core::candidate::ImportCandidate;
use plinth_core::geo::{BoundingBox, LatLon};
use plinth_core::tags::TagMap;
use plinth_core::types::DbId;
use plinth_db::models::artwork::CreateArtwork;
use plinth_db::repositories::{ArtworkRepo, ImportRunRepo};
use plinth_db::DbPool;

use crate::gateway::{
    ArchiveIndex, ArtworkGateway, GatewayError, PhotoStore, StoredPhoto,
};

/// Archive access over a Postgres pool.
#[derive(Clone)]
pub struct PgArchiveGateway {
    pool: DbPool,
}

impl PgArchiveGateway {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Source ids already imported for a source, for seeding the
    /// orchestrator's idempotency set.
    pub async fn imported_source_ids(
        &self,
        source_name: &str,
    ) -> Result<std::collections::HashSet<String>, GatewayError> {
        let ids = ImportRunRepo::imported_source_ids(&self.pool, source_name).await?;
        Ok(ids.into_iter().collect())
    }

    /// Record the source-id-to-artwork mapping for a finished candidate.
    pub async fn record_imported_source(
        &self,
        source_name: &str,
        source_id: &str,
        artwork_id: Option<DbId>,
    ) -> Result<(), GatewayError> {
        ImportRunRepo::record_imported_source(&self.pool, source_name, source_id, artwork_id)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ArchiveIndex for PgArchiveGateway {
    async fn query_near(
        &self,
        center: LatLon,
        radius_meters: f64,
        status: Option<PublicationStatus>,
    ) -> Result<Vec<ArtworkRecord>, GatewayError> {
        let bbox = BoundingBox::around(center, radius_meters);
        let rows =
            ArtworkRepo::find_in_bbox(&self.pool, &bbox, status.map(|s| s.as_str())).await?;

        rows.into_iter()
            .map(|row| {
                row.into_record()
                    .map_err(|e| GatewayError::Rejected(e.to_string()))
            })
            .collect()
    }
}

#[async_trait]
impl ArtworkGateway for PgArchiveGateway {
    async fn submit_artwork(&self, candidate: &ImportCandidate) -> Result<DbId, GatewayError> {
        let location = candidate.valid_location();
        let input = CreateArtwork {
            title: candidate.trimmed_title().map(str::to_string),
            lat: location.map(|l| l.lat),
            lon: location.map(|l| l.lon),
            artists: candidate.raw_artists.tokens(),
            tags: serde_json::json!(candidate.raw_tags),
            status: PublicationStatus::Pending.as_str().to_string(),
            source_name: Some(candidate.source_name.clone()),
            source_url: candidate.source_url.clone(),
        };

        let row = ArtworkRepo::create(&self.pool, &input).await?;
        Ok(row.id)
    }

    async fn patch_artwork_tags(
        &self,
        artwork_id: DbId,
        added: &TagMap,
    ) -> Result<(), GatewayError> {
        let patched =
            ArtworkRepo::merge_missing_tags(&self.pool, artwork_id, &serde_json::json!(added))
                .await?;

        match patched {
            Some(_) => Ok(()),
            None => Err(GatewayError::Rejected(format!(
                "artwork {artwork_id} does not exist"
            ))),
        }
    }
}

#[async_trait]
impl PhotoStore for PgArchiveGateway {
    async fn store_photo(&self, artwork_id: DbId, url: &str) -> Result<StoredPhoto, GatewayError> {
        let row = ArtworkRepo::add_photo(&self.pool, artwork_id, url, None).await?;
        Ok(StoredPhoto {
            photo_ref: format!("photo:{}", row.id),
        })
    }
}
