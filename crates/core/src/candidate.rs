//! Incoming records from external data sources, one per input row of a
//! batch. Candidates are transient: they exist between batch parsing and the
//! orchestrator's per-record outcome and are never persisted themselves.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::geo::LatLon;
use crate::normalize::{normalize_artist_entries, split_artists};
use crate::tags::TagMap;

/// Artist attribution as delivered by a source: either a single compound
/// credit string or an already-split list of names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArtistField {
    One(String),
    Many(Vec<String>),
}

impl ArtistField {
    /// Normalized artist name tokens, empties dropped.
    pub fn tokens(&self) -> Vec<String> {
        match self {
            Self::One(raw) => split_artists(raw),
            Self::Many(entries) => normalize_artist_entries(entries),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens().is_empty()
    }
}

impl Default for ArtistField {
    fn default() -> Self {
        Self::One(String::new())
    }
}

/// One incoming record awaiting duplicate resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportCandidate {
    /// Stable external identifier, used for idempotent re-import detection.
    pub source_id: String,
    pub title: Option<String>,
    #[serde(default)]
    pub raw_artists: ArtistField,
    pub location: Option<LatLon>,
    /// Already validated at the batch-parsing boundary; see
    /// [`crate::tags::parse_tag_map`].
    #[serde(default)]
    pub raw_tags: TagMap,
    #[serde(default)]
    pub photo_urls: Vec<String>,
    pub source_name: String,
    pub source_url: Option<String>,
    pub import_batch_id: String,
}

impl ImportCandidate {
    /// The candidate's coordinates, if present and usable for distance math.
    pub fn valid_location(&self) -> Option<LatLon> {
        self.location.filter(LatLon::is_valid)
    }

    /// Title trimmed to `None` when blank.
    pub fn trimmed_title(&self) -> Option<&str> {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// Structural validation run before a candidate reaches the resolver.
///
/// A candidate with no title, no usable coordinates, and no tags carries
/// nothing the engine could match or merge on; it is rejected here and
/// recorded as an error outcome without touching any collaborator.
pub fn validate_candidate(candidate: &ImportCandidate) -> Result<(), CoreError> {
    if candidate.source_id.trim().is_empty() {
        return Err(CoreError::Validation(
            "Candidate has no source_id".to_string(),
        ));
    }

    let has_title = candidate.trimmed_title().is_some();
    let has_location = candidate.valid_location().is_some();
    let has_tags = !candidate.raw_tags.is_empty();

    if !has_title && !has_location && !has_tags {
        return Err(CoreError::Validation(format!(
            "Candidate '{}' has no title, no coordinates, and no tags",
            candidate.source_id
        )));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn minimal_candidate() -> ImportCandidate {
        ImportCandidate {
            source_id: "osm-1234".to_string(),
            title: Some("Digital Orca".to_string()),
            raw_artists: ArtistField::One("Douglas Coupland".to_string()),
            location: Some(LatLon::new(49.2888, -123.1111)),
            raw_tags: TagMap::new(),
            photo_urls: vec![],
            source_name: "openstreetmap".to_string(),
            source_url: None,
            import_batch_id: "batch-1".to_string(),
        }
    }

    // -- ArtistField ---------------------------------------------------------

    #[test]
    fn string_field_splits_into_tokens() {
        let field = ArtistField::One("Douglas Coupland & Ken Lum".to_string());
        assert_eq!(field.tokens(), vec!["douglas coupland", "ken lum"]);
    }

    #[test]
    fn list_field_passes_through_normalized() {
        let field = ArtistField::Many(vec!["Ken LUM".to_string(), "".to_string()]);
        assert_eq!(field.tokens(), vec!["ken lum"]);
    }

    #[test]
    fn artist_field_deserializes_from_string_or_list() {
        let one: ArtistField = serde_json::from_value(serde_json::json!("Ken Lum")).unwrap();
        assert_eq!(one.tokens(), vec!["ken lum"]);

        let many: ArtistField =
            serde_json::from_value(serde_json::json!(["Ken Lum", "Bill Reid"])).unwrap();
        assert_eq!(many.tokens(), vec!["ken lum", "bill reid"]);
    }

    // -- validate_candidate --------------------------------------------------

    #[test]
    fn candidate_with_title_passes() {
        assert!(validate_candidate(&minimal_candidate()).is_ok());
    }

    #[test]
    fn candidate_with_only_tags_passes() {
        let mut candidate = minimal_candidate();
        candidate.title = None;
        candidate.location = None;
        candidate
            .raw_tags
            .insert("material".to_string(), "bronze".to_string());
        assert!(validate_candidate(&candidate).is_ok());
    }

    #[test]
    fn structurally_empty_candidate_is_rejected() {
        let mut candidate = minimal_candidate();
        candidate.title = Some("   ".to_string());
        candidate.location = Some(LatLon::new(f64::NAN, 0.0));
        candidate.raw_tags.clear();
        assert_matches!(
            validate_candidate(&candidate),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn missing_source_id_is_rejected() {
        let mut candidate = minimal_candidate();
        candidate.source_id = " ".to_string();
        assert_matches!(
            validate_candidate(&candidate),
            Err(CoreError::Validation(_))
        );
    }
}
