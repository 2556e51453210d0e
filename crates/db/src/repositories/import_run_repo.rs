//! Repository for import runs and the cross-run idempotency ledger.

use sqlx::PgPool;

use plinth_core::types::DbId;

use crate::models::import_run::{CreateImportRun, ImportRunRow, ImportedSourceRow};

/// Column list for `import_runs` queries.
const RUN_COLUMNS: &str =
    "id, batch_id, source_name, status, dry_run, total_records, imported, \
     merged_duplicate, skipped_duplicate, errors, not_attempted, report_data, \
     started_at, finished_at, created_at";

/// Column list for `imported_sources` queries.
const SOURCE_COLUMNS: &str = "source_name, source_id, artwork_id, created_at";

/// Provides CRUD operations for import runs and the imported-source ledger.
pub struct ImportRunRepo;

impl ImportRunRepo {
    /// Record a finished batch run, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateImportRun,
    ) -> Result<ImportRunRow, sqlx::Error> {
        let sql = format!(
            "INSERT INTO import_runs \
                (batch_id, source_name, status, dry_run, total_records, imported, \
                 merged_duplicate, skipped_duplicate, errors, not_attempted, \
                 report_data, started_at, finished_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {RUN_COLUMNS}"
        );
        sqlx::query_as::<_, ImportRunRow>(&sql)
            .bind(&input.batch_id)
            .bind(&input.source_name)
            .bind(&input.status)
            .bind(input.dry_run)
            .bind(input.total_records)
            .bind(input.imported)
            .bind(input.merged_duplicate)
            .bind(input.skipped_duplicate)
            .bind(input.errors)
            .bind(input.not_attempted)
            .bind(&input.report_data)
            .bind(input.started_at)
            .bind(input.finished_at)
            .fetch_one(pool)
            .await
    }

    /// Find a run by its internal ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ImportRunRow>, sqlx::Error> {
        let sql = format!("SELECT {RUN_COLUMNS} FROM import_runs WHERE id = $1");
        sqlx::query_as::<_, ImportRunRow>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List runs for a source, newest first.
    pub async fn list_by_source(
        pool: &PgPool,
        source_name: &str,
        limit: i64,
    ) -> Result<Vec<ImportRunRow>, sqlx::Error> {
        let sql = format!(
            "SELECT {RUN_COLUMNS} FROM import_runs \
             WHERE source_name = $1 \
             ORDER BY created_at DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, ImportRunRow>(&sql)
            .bind(source_name)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    // ── Imported-source ledger ───────────────────────────────────────

    /// All source ids ever imported or merged for `source_name`. Seeds the
    /// orchestrator's in-memory idempotency set.
    pub async fn imported_source_ids(
        pool: &PgPool,
        source_name: &str,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT source_id FROM imported_sources WHERE source_name = $1",
        )
        .bind(source_name)
        .fetch_all(pool)
        .await
    }

    /// Record that an external source id now maps to an archive artwork.
    /// Re-recording the same pair is a no-op.
    pub async fn record_imported_source(
        pool: &PgPool,
        source_name: &str,
        source_id: &str,
        artwork_id: Option<DbId>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO imported_sources (source_name, source_id, artwork_id) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (source_name, source_id) DO NOTHING",
        )
        .bind(source_name)
        .bind(source_id)
        .bind(artwork_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Look up a single ledger entry.
    pub async fn find_imported_source(
        pool: &PgPool,
        source_name: &str,
        source_id: &str,
    ) -> Result<Option<ImportedSourceRow>, sqlx::Error> {
        let sql = format!(
            "SELECT {SOURCE_COLUMNS} FROM imported_sources \
             WHERE source_name = $1 AND source_id = $2"
        );
        sqlx::query_as::<_, ImportedSourceRow>(&sql)
            .bind(source_name)
            .bind(source_id)
            .fetch_optional(pool)
            .await
    }
}
