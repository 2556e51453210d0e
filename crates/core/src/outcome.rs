//! Per-candidate import outcomes and the aggregated batch report.

use serde::{Deserialize, Serialize};

use crate::similarity::SimilarityResult;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Outcome status
// ---------------------------------------------------------------------------

/// Terminal status of one candidate within a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportOutcomeStatus {
    /// Submitted as a new artwork (or would be, in a dry run).
    Imported,
    /// Matched an existing artwork; new tags and photos were merged in.
    MergedDuplicate,
    /// Skipped without re-scoring because the source id was already imported.
    SkippedDuplicate,
    /// Validation failure, ambiguous match, or collaborator failure.
    Error,
    /// Never processed because the circuit breaker aborted the batch first.
    NotAttempted,
}

impl ImportOutcomeStatus {
    /// Return the status name as stored in reports and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Imported => "imported",
            Self::MergedDuplicate => "merged_duplicate",
            Self::SkippedDuplicate => "skipped_duplicate",
            Self::Error => "error",
            Self::NotAttempted => "not_attempted",
        }
    }

    /// Parse a status string. Returns `None` for unknown values.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "imported" => Some(Self::Imported),
            "merged_duplicate" => Some(Self::MergedDuplicate),
            "skipped_duplicate" => Some(Self::SkippedDuplicate),
            "error" => Some(Self::Error),
            "not_attempted" => Some(Self::NotAttempted),
            _ => None,
        }
    }

    /// All valid status values.
    pub const ALL: &'static [&'static str] = &[
        "imported",
        "merged_duplicate",
        "skipped_duplicate",
        "error",
        "not_attempted",
    ];
}

impl std::fmt::Display for ImportOutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Run status
// ---------------------------------------------------------------------------

/// Overall status of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportRunStatus {
    /// Every candidate reached a non-error terminal status.
    Completed,
    /// The full batch was processed but some candidates errored.
    Partial,
    /// The circuit breaker stopped the run before the end of the batch.
    Aborted,
}

impl ImportRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Partial => "partial",
            Self::Aborted => "aborted",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(Self::Completed),
            "partial" => Some(Self::Partial),
            "aborted" => Some(Self::Aborted),
            _ => None,
        }
    }

    pub const ALL: &'static [&'static str] = &["completed", "partial", "aborted"];
}

impl std::fmt::Display for ImportRunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Per-candidate outcome
// ---------------------------------------------------------------------------

/// The outcome of one candidate. Created once the candidate finishes
/// processing and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub source_id: String,
    /// Candidate title, carried so an operator can identify the record in
    /// the report without the source file at hand.
    pub title: Option<String>,
    pub status: ImportOutcomeStatus,
    pub target_artwork_id: Option<DbId>,
    /// The similarity result that produced the decision, when one did.
    pub similarity: Option<SimilarityResult>,
    pub error_detail: Option<String>,
}

// ---------------------------------------------------------------------------
// Batch report
// ---------------------------------------------------------------------------

/// Summary counts per outcome status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub total: u64,
    pub imported: u64,
    pub merged_duplicate: u64,
    pub skipped_duplicate: u64,
    pub errors: u64,
    pub not_attempted: u64,
}

impl ImportSummary {
    pub fn from_outcomes(outcomes: &[ImportOutcome]) -> Self {
        let mut summary = Self {
            total: outcomes.len() as u64,
            ..Self::default()
        };
        for outcome in outcomes {
            match outcome.status {
                ImportOutcomeStatus::Imported => summary.imported += 1,
                ImportOutcomeStatus::MergedDuplicate => summary.merged_duplicate += 1,
                ImportOutcomeStatus::SkippedDuplicate => summary.skipped_duplicate += 1,
                ImportOutcomeStatus::Error => summary.errors += 1,
                ImportOutcomeStatus::NotAttempted => summary.not_attempted += 1,
            }
        }
        summary
    }
}

/// The full result of one batch run. Per-candidate outcomes preserve the
/// batch input order, which is what makes dry-run and real-run reports
/// directly diffable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub batch_id: String,
    pub source_name: String,
    pub status: ImportRunStatus,
    pub summary: ImportSummary,
    pub outcomes: Vec<ImportOutcome>,
    pub dry_run: bool,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
}

impl ImportReport {
    /// Run status implied by a finished outcome list: `Aborted` when the
    /// breaker left candidates unattempted, `Partial` when any errored,
    /// `Completed` otherwise.
    pub fn status_for(outcomes: &[ImportOutcome]) -> ImportRunStatus {
        let summary = ImportSummary::from_outcomes(outcomes);
        if summary.not_attempted > 0 {
            ImportRunStatus::Aborted
        } else if summary.errors > 0 {
            ImportRunStatus::Partial
        } else {
            ImportRunStatus::Completed
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
