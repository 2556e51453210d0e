//! Row models for artworks and photos, plus conversion into the core
//! domain type.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use plinth_core::artwork::{ArtworkRecord, PublicationStatus};
use plinth_core::error::CoreError;
use plinth_core::geo::LatLon;
use plinth_core::tags::parse_tag_map;
use plinth_core::types::{DbId, Timestamp};

/// One row of `artworks`. Artists and tags are JSONB columns; tags are
/// validated into a typed map on conversion.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ArtworkRow {
    pub id: DbId,
    pub title: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub artists: serde_json::Value,
    pub tags: serde_json::Value,
    pub status: String,
    pub source_name: Option<String>,
    pub source_url: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ArtworkRow {
    /// Convert into the core domain record. Fails only on rows whose JSONB
    /// columns violate the schema the boundary enforces on write.
    pub fn into_record(self) -> Result<ArtworkRecord, CoreError> {
        let location = match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(LatLon::new(lat, lon)),
            _ => None,
        };

        let artists: Vec<String> = serde_json::from_value(self.artists).map_err(|e| {
            CoreError::Internal(format!("Artwork {} has malformed artists column: {e}", self.id))
        })?;

        let tags = parse_tag_map(&self.tags)?;

        let status = PublicationStatus::from_str(&self.status).ok_or_else(|| {
            CoreError::Internal(format!(
                "Artwork {} has unknown status '{}'",
                self.id, self.status
            ))
        })?;

        Ok(ArtworkRecord {
            id: self.id,
            title: self.title,
            location,
            artists,
            tags,
            photos: vec![],
            status,
            created_at: self.created_at,
        })
    }
}

/// Input for inserting a new pending artwork.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateArtwork {
    pub title: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub artists: Vec<String>,
    pub tags: serde_json::Value,
    pub status: String,
    pub source_name: Option<String>,
    pub source_url: Option<String>,
}

/// One row of `artwork_photos`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ArtworkPhotoRow {
    pub id: DbId,
    pub artwork_id: DbId,
    pub url: String,
    pub photo_ref: Option<String>,
    pub created_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> ArtworkRow {
        ArtworkRow {
            id: 12,
            title: Some("Digital Orca".to_string()),
            lat: Some(49.2888),
            lon: Some(-123.1111),
            artists: serde_json::json!(["Douglas Coupland"]),
            tags: serde_json::json!({"material": "fiberglass"}),
            status: "approved".to_string(),
            source_name: Some("vanartgallery".to_string()),
            source_url: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn row_converts_into_domain_record() {
        let record = row().into_record().expect("valid row");
        assert_eq!(record.id, 12);
        assert_eq!(record.artists, vec!["Douglas Coupland"]);
        assert_eq!(record.tags.get("material").map(String::as_str), Some("fiberglass"));
        assert_eq!(record.status, PublicationStatus::Approved);
        assert!(record.location.expect("has location").is_valid());
    }

    #[test]
    fn missing_longitude_means_no_location() {
        let mut r = row();
        r.lon = None;
        let record = r.into_record().expect("valid row");
        assert!(record.location.is_none());
    }

    #[test]
    fn unknown_status_is_an_internal_error() {
        let mut r = row();
        r.status = "rejected".to_string();
        assert!(r.into_record().is_err());
    }
}
