//! Structured tag maps and the non-destructive tag merge engine.
//!
//! Tags arrive from external sources as loosely-typed JSON blobs. That
//! behavior is confined to [`parse_tag_map`], the single boundary where
//! non-string values are rejected; everything past it works on a
//! strongly-typed ordered map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::normalize::normalize_text;

/// Ordered mapping from tag key to tag value. Keys are unique by
/// construction.
pub type TagMap = BTreeMap<String, String>;

/// Parse a JSON value into a [`TagMap`].
///
/// `null` parses as the empty map. Any other non-object, and any object with
/// a non-string value, is rejected rather than silently stringified.
pub fn parse_tag_map(value: &serde_json::Value) -> Result<TagMap, CoreError> {
    match value {
        serde_json::Value::Null => Ok(TagMap::new()),
        serde_json::Value::Object(entries) => {
            let mut tags = TagMap::new();
            for (key, val) in entries {
                match val.as_str() {
                    Some(s) => {
                        tags.insert(key.clone(), s.to_string());
                    }
                    None => {
                        return Err(CoreError::Validation(format!(
                            "Tag '{key}' has a non-string value: {val}"
                        )));
                    }
                }
            }
            Ok(tags)
        }
        other => Err(CoreError::Validation(format!(
            "Tags must be a JSON object, got: {other}"
        ))),
    }
}

/// The outcome of merging an incoming tag set into an existing one.
///
/// Every key of the incoming set lands in exactly one bucket. The existing
/// record's tag set never loses a key through a merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagMergeDelta {
    /// Present in the incoming data, absent from the existing record. These
    /// are the only entries ever written back to the archive.
    pub added: TagMap,
    /// Key exists on both sides with different values; the existing value is
    /// authoritative and is kept. Maps key to the surviving existing value.
    pub kept_existing: TagMap,
    /// Identical (after normalization) on both sides.
    pub unchanged: TagMap,
}

impl TagMergeDelta {
    /// Whether applying this delta would change the archive record at all.
    pub fn is_noop(&self) -> bool {
        self.added.is_empty()
    }
}

/// Compute the non-destructive merge of `incoming` into `existing`.
///
/// Values are compared after [`normalize_text`], so re-imports that differ
/// only in casing, punctuation, or diacritics count as unchanged. The stored
/// spelling of an existing value is kept either way; import data never
/// overwrites an existing key.
pub fn merge_tags(existing: &TagMap, incoming: &TagMap) -> TagMergeDelta {
    let mut delta = TagMergeDelta::default();

    for (key, incoming_value) in incoming {
        match existing.get(key) {
            None => {
                delta.added.insert(key.clone(), incoming_value.clone());
            }
            Some(existing_value) => {
                if normalize_text(existing_value) == normalize_text(incoming_value) {
                    delta.unchanged.insert(key.clone(), existing_value.clone());
                } else {
                    delta
                        .kept_existing
                        .insert(key.clone(), existing_value.clone());
                }
            }
        }
    }

    delta
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn tags(pairs: &[(&str, &str)]) -> TagMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    // -- parse_tag_map -------------------------------------------------------

    #[test]
    fn parses_string_valued_object() {
        let value = serde_json::json!({"material": "aluminum", "type": "sculpture"});
        let parsed = parse_tag_map(&value).expect("valid tag object");
        assert_eq!(parsed, tags(&[("material", "aluminum"), ("type", "sculpture")]));
    }

    #[test]
    fn null_parses_as_empty_map() {
        let parsed = parse_tag_map(&serde_json::Value::Null).expect("null is allowed");
        assert!(parsed.is_empty());
    }

    #[test]
    fn rejects_non_string_values() {
        let value = serde_json::json!({"height": 3.5});
        assert_matches!(parse_tag_map(&value), Err(CoreError::Validation(_)));

        let nested = serde_json::json!({"dims": {"h": "3"}});
        assert_matches!(parse_tag_map(&nested), Err(CoreError::Validation(_)));
    }

    #[test]
    fn rejects_non_object_roots() {
        assert_matches!(
            parse_tag_map(&serde_json::json!(["material"])),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            parse_tag_map(&serde_json::json!("material")),
            Err(CoreError::Validation(_))
        );
    }

    // -- merge_tags ----------------------------------------------------------

    #[test]
    fn new_keys_land_in_added() {
        let existing = tags(&[("material", "aluminum")]);
        let incoming = tags(&[("technique", "metal fabrication")]);

        let delta = merge_tags(&existing, &incoming);
        assert_eq!(delta.added, tags(&[("technique", "metal fabrication")]));
        assert!(delta.kept_existing.is_empty());
        assert!(delta.unchanged.is_empty());
    }

    #[test]
    fn identical_values_land_in_unchanged() {
        let existing = tags(&[("material", "aluminum")]);
        let incoming = tags(&[("material", "aluminum")]);

        let delta = merge_tags(&existing, &incoming);
        assert!(delta.added.is_empty());
        assert!(delta.kept_existing.is_empty());
        assert_eq!(delta.unchanged, tags(&[("material", "aluminum")]));
    }

    #[test]
    fn conflicting_values_keep_the_existing_one() {
        let existing = tags(&[("material", "aluminum")]);
        let incoming = tags(&[("material", "bronze")]);

        let delta = merge_tags(&existing, &incoming);
        assert!(delta.added.is_empty());
        assert_eq!(delta.kept_existing, tags(&[("material", "aluminum")]));
        assert!(delta.unchanged.is_empty());
    }

    #[test]
    fn values_equal_after_normalization_are_unchanged() {
        let existing = tags(&[("material", "Aluminum")]);
        let incoming = tags(&[("material", "  aluminum ")]);

        let delta = merge_tags(&existing, &incoming);
        assert!(delta.kept_existing.is_empty());
        // The stored spelling survives.
        assert_eq!(delta.unchanged, tags(&[("material", "Aluminum")]));
    }

    #[test]
    fn every_incoming_key_lands_in_exactly_one_bucket() {
        let existing = tags(&[("material", "aluminum"), ("type", "sculpture")]);
        let incoming = tags(&[
            ("material", "bronze"),
            ("type", "sculpture"),
            ("technique", "welding"),
        ]);

        let delta = merge_tags(&existing, &incoming);
        let mut seen: Vec<&String> = delta
            .added
            .keys()
            .chain(delta.kept_existing.keys())
            .chain(delta.unchanged.keys())
            .collect();
        seen.sort();
        let mut expected: Vec<&String> = incoming.keys().collect();
        expected.sort();
        assert_eq!(seen, expected);
    }

    #[test]
    fn merge_never_loses_existing_keys() {
        let existing = tags(&[("material", "aluminum"), ("artist_note", "curated")]);
        let incoming = tags(&[("material", "bronze")]);

        let delta = merge_tags(&existing, &incoming);

        // Simulate applying the delta the way the gateway does: only `added`
        // entries are written on top of the existing map.
        let mut merged = existing.clone();
        merged.extend(delta.added.clone());

        for key in existing.keys() {
            assert_eq!(merged.get(key), existing.get(key));
        }
    }

    #[test]
    fn empty_incoming_set_is_a_noop() {
        let existing = tags(&[("material", "aluminum")]);
        let delta = merge_tags(&existing, &TagMap::new());
        assert!(delta.is_noop());
        assert!(delta.unchanged.is_empty());
        assert!(delta.kept_existing.is_empty());
    }
}
