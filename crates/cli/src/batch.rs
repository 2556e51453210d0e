//! Boundary parsing of batch files into import candidates.
//!
//! The generic format is a JSON array of flat records. Everything
//! loosely-typed about external data is rejected or normalized here; past
//! this point the engine works on validated candidates only.

use serde::Deserialize;
use validator::Validate;

use plinth_core::candidate::{ArtistField, ImportCandidate};
use plinth_core::error::CoreError;
use plinth_core::geo::LatLon;
use plinth_core::tags::parse_tag_map;
use plinth_importer::source::DataSourceMapper;

/// One record of the generic JSON batch format.
#[derive(Debug, Deserialize, Validate)]
pub struct RawBatchRecord {
    #[validate(length(min = 1, message = "source_id must be non-empty"))]
    pub source_id: String,
    pub title: Option<String>,
    pub artists: Option<ArtistField>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    #[serde(default)]
    pub tags: serde_json::Value,
    #[serde(default)]
    pub photos: Vec<String>,
    pub source_url: Option<String>,
}

/// Mapper for the generic JSON array format. The source name is supplied by
/// the operator, so one mapper serves any portal that exports this shape.
pub struct GenericJsonMapper {
    source_name: String,
}

impl GenericJsonMapper {
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
        }
    }
}

impl DataSourceMapper for GenericJsonMapper {
    fn name(&self) -> &str {
        &self.source_name
    }

    fn map_data(
        &self,
        raw: &serde_json::Value,
        batch_id: &str,
    ) -> Result<Vec<ImportCandidate>, CoreError> {
        let records: Vec<RawBatchRecord> = serde_json::from_value(raw.clone())
            .map_err(|e| CoreError::Validation(format!("Batch payload is not a record array: {e}")))?;

        records
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                record.validate().map_err(|e| {
                    CoreError::Validation(format!("Record {index} failed validation: {e}"))
                })?;

                let raw_tags = parse_tag_map(&record.tags).map_err(|e| {
                    CoreError::Validation(format!("Record {index} ('{}'): {e}", record.source_id))
                })?;

                let location = match (record.lat, record.lon) {
                    (Some(lat), Some(lon)) => Some(LatLon::new(lat, lon)),
                    _ => None,
                };

                Ok(ImportCandidate {
                    source_id: record.source_id,
                    title: record.title,
                    raw_artists: record.artists.unwrap_or_default(),
                    location,
                    raw_tags,
                    photo_urls: record.photos,
                    source_name: self.source_name.clone(),
                    source_url: record.source_url,
                    import_batch_id: batch_id.to_string(),
                })
            })
            .collect()
    }

    fn generate_import_id(&self, raw: &serde_json::Value) -> Option<String> {
        raw.get("source_id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn mapper() -> GenericJsonMapper {
        GenericJsonMapper::new("burnaby-open-data")
    }

    #[test]
    fn maps_a_complete_record() {
        let raw = serde_json::json!([{
            "source_id": "PA-042",
            "title": "Arc de Triomphe",
            "artists": "Jacques Huet",
            "lat": 49.278845,
            "lon": -122.915511,
            "tags": {"material": "aluminum"},
            "photos": ["https://example.org/arc.jpg"],
            "source_url": "https://data.example.org/PA-042"
        }]);

        let candidates = mapper().map_data(&raw, "batch-9").expect("maps cleanly");
        assert_eq!(candidates.len(), 1);

        let c = &candidates[0];
        assert_eq!(c.source_id, "PA-042");
        assert_eq!(c.source_name, "burnaby-open-data");
        assert_eq!(c.import_batch_id, "batch-9");
        assert!(c.valid_location().is_some());
        assert_eq!(c.raw_tags.get("material").map(String::as_str), Some("aluminum"));
        assert_eq!(c.photo_urls.len(), 1);
    }

    #[test]
    fn missing_optional_fields_default() {
        let raw = serde_json::json!([{"source_id": "PA-001", "title": "Cenotaph"}]);
        let candidates = mapper().map_data(&raw, "b").expect("maps cleanly");
        assert!(candidates[0].location.is_none());
        assert!(candidates[0].raw_tags.is_empty());
        assert!(candidates[0].photo_urls.is_empty());
    }

    #[test]
    fn non_string_tag_values_are_rejected_with_the_record_index() {
        let raw = serde_json::json!([
            {"source_id": "PA-001", "title": "Cenotaph"},
            {"source_id": "PA-002", "title": "Obelisk", "tags": {"height": 12}}
        ]);

        let err = mapper().map_data(&raw, "b").expect_err("must reject");
        assert_matches!(err, CoreError::Validation(_));
        assert!(err.to_string().contains("Record 1"), "got: {err}");
    }

    #[test]
    fn empty_source_id_is_rejected() {
        let raw = serde_json::json!([{"source_id": "", "title": "Cenotaph"}]);
        assert_matches!(
            mapper().map_data(&raw, "b"),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn non_array_payload_is_rejected() {
        let raw = serde_json::json!({"source_id": "PA-001"});
        assert_matches!(
            mapper().map_data(&raw, "b"),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn import_id_is_derived_from_the_raw_record() {
        let raw = serde_json::json!({"source_id": "PA-042"});
        assert_eq!(mapper().generate_import_id(&raw), Some("PA-042".to_string()));
        assert_eq!(mapper().generate_import_id(&serde_json::json!({})), None);
    }
}
