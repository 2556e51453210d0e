//! Archive-resident artwork records as seen by the import engine.
//!
//! The engine only reads these and proposes patches through the submission
//! gateway. It never mutates or deletes archive rows directly.

use serde::{Deserialize, Serialize};

use crate::geo::LatLon;
use crate::tags::TagMap;
use crate::types::{DbId, Timestamp};

/// Publication state of an archive record. Duplicate search deliberately
/// spans both states, since a duplicate may exist only as a not-yet-reviewed
/// submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicationStatus {
    Pending,
    Approved,
}

impl PublicationStatus {
    /// Return the status name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
        }
    }

    /// Parse a status string. Returns `None` for unknown values.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            _ => None,
        }
    }

    /// All valid status values.
    pub const ALL: &'static [&'static str] = &["pending", "approved"];
}

impl std::fmt::Display for PublicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An artwork already stored in the archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtworkRecord {
    pub id: DbId,
    pub title: Option<String>,
    pub location: Option<LatLon>,
    /// Ordered list of artist names. May be empty when the source had no
    /// attribution.
    pub artists: Vec<String>,
    pub tags: TagMap,
    /// Stored photo references. Not hydrated by the spatial query; matching
    /// and merging never read them.
    pub photos: Vec<String>,
    pub status: PublicationStatus,
    pub created_at: Timestamp,
}

impl ArtworkRecord {
    /// The record's coordinates, if present and usable for distance math.
    pub fn valid_location(&self) -> Option<LatLon> {
        self.location.filter(LatLon::is_valid)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
