//! Collaborator contracts consumed by the import engine.
//!
//! Implementations of these traits are the only places the engine performs
//! I/O. Production wiring lives in [`crate::pg`]; tests substitute in-memory
//! fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use plinth_core::artwork::{ArtworkRecord, PublicationStatus};
use plinth_core::candidate::ImportCandidate;
use plinth_core::geo::LatLon;
use plinth_core::tags::TagMap;
use plinth_core::types::DbId;

/// A failure from an external collaborator. Caught at exactly one place, the
/// orchestrator's per-candidate boundary, and converted into an error
/// outcome there.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Network(String),

    #[error("collaborator returned status {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("request timed out")]
    Timeout,

    #[error("collaborator rejected the request: {0}")]
    Rejected(String),
}

impl From<sqlx::Error> for GatewayError {
    fn from(e: sqlx::Error) -> Self {
        GatewayError::Network(e.to_string())
    }
}

/// A stored photo reference returned by the photo pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredPhoto {
    pub photo_ref: String,
}

/// Reverse-geocoding result used to enrich new submissions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationInfo {
    pub display_name: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country_code: Option<String>,
}

/// Spatial query capability over the archive.
#[async_trait]
pub trait ArchiveIndex: Send + Sync {
    /// All archive records within `radius_meters` of `center`, in any
    /// publication status unless one is requested. An empty result is not an
    /// error. Implementations may over-approximate (bounding box); the
    /// finder refines by exact distance.
    async fn query_near(
        &self,
        center: LatLon,
        radius_meters: f64,
        status: Option<PublicationStatus>,
    ) -> Result<Vec<ArtworkRecord>, GatewayError>;
}

/// The submission/edit API that owns all archive mutation.
#[async_trait]
pub trait ArtworkGateway: Send + Sync {
    /// Create a new pending artwork from a candidate, returning its id.
    async fn submit_artwork(&self, candidate: &ImportCandidate) -> Result<DbId, GatewayError>;

    /// Apply the `added` entries of a tag merge delta. Only ever receives
    /// keys absent from the existing record.
    async fn patch_artwork_tags(
        &self,
        artwork_id: DbId,
        added: &TagMap,
    ) -> Result<(), GatewayError>;
}

/// The photo download/storage pipeline.
#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// Store one photo for an artwork. Failures are per-photo; the caller
    /// records them without rolling back anything else.
    async fn store_photo(&self, artwork_id: DbId, url: &str) -> Result<StoredPhoto, GatewayError>;
}

/// Optional location enrichment for new submissions.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// Returns `None` when the position cannot be resolved; callers must
    /// tolerate that as a non-error.
    async fn reverse_geocode(&self, location: LatLon)
        -> Result<Option<LocationInfo>, GatewayError>;
}
