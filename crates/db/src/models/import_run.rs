//! Row models for import runs and the imported-source ledger.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use plinth_core::types::{DbId, Timestamp};

/// One row of `import_runs`: the persisted record of a batch run, with the
/// full report kept as JSONB alongside the summary counts.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ImportRunRow {
    pub id: DbId,
    pub batch_id: String,
    pub source_name: String,
    pub status: String,
    pub dry_run: bool,
    pub total_records: i64,
    pub imported: i64,
    pub merged_duplicate: i64,
    pub skipped_duplicate: i64,
    pub errors: i64,
    pub not_attempted: i64,
    pub report_data: serde_json::Value,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
    pub created_at: Timestamp,
}

/// Input for recording a finished batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateImportRun {
    pub batch_id: String,
    pub source_name: String,
    pub status: String,
    pub dry_run: bool,
    pub total_records: i64,
    pub imported: i64,
    pub merged_duplicate: i64,
    pub skipped_duplicate: i64,
    pub errors: i64,
    pub not_attempted: i64,
    pub report_data: serde_json::Value,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
}

/// One row of `imported_sources`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ImportedSourceRow {
    pub source_name: String,
    pub source_id: String,
    pub artwork_id: Option<DbId>,
    pub created_at: Timestamp,
}
