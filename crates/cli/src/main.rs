//! `mass-import`: batch import of artwork records from an external data
//! source into the plinth archive.
//!
//! Thin ops wrapper around `plinth-importer`: argument and env handling,
//! batch file parsing, run persistence, and report writing.

mod batch;
mod report;

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use plinth_core::config::ImportOptions;
use plinth_core::outcome::{ImportOutcomeStatus, ImportRunStatus};
use plinth_db::models::import_run::CreateImportRun;
use plinth_db::repositories::ImportRunRepo;
use plinth_importer::orchestrator::BatchImporter;
use plinth_importer::pg::PgArchiveGateway;
use plinth_importer::source::MapperRegistry;

use batch::GenericJsonMapper;

const USAGE: &str = "\
Usage: mass-import [OPTIONS] --source <NAME> <BATCH_FILE>

Options:
  --source <NAME>       Data source name (stamped on candidates and the run)
  --report-dir <DIR>    Directory for the JSON report (default: reports)
  --threshold <SCORE>   Duplicate threshold (default: 0.7)
  --radius <METERS>     Candidate search radius (default: 100)
  --dry-run             Resolve and report without writing anything
  --no-idempotent       Re-score candidates even if previously imported
  --help                Show this message
";

struct Args {
    batch_file: PathBuf,
    source_name: String,
    report_dir: PathBuf,
    options: ImportOptions,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut batch_file: Option<PathBuf> = None;
    let mut source_name: Option<String> = None;
    let mut report_dir = PathBuf::from("reports");
    let mut options = ImportOptions::default();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--source" => {
                source_name = Some(args.next().context("--source requires a value")?);
            }
            "--report-dir" => {
                report_dir = PathBuf::from(args.next().context("--report-dir requires a value")?);
            }
            "--threshold" => {
                options.threshold = args
                    .next()
                    .context("--threshold requires a value")?
                    .parse()
                    .context("--threshold must be a number")?;
            }
            "--radius" => {
                options.search_radius_meters = args
                    .next()
                    .context("--radius requires a value")?
                    .parse()
                    .context("--radius must be a number")?;
            }
            "--dry-run" => options.dry_run = true,
            "--no-idempotent" => options.idempotent = false,
            "--help" => {
                print!("{USAGE}");
                std::process::exit(0);
            }
            other if other.starts_with('-') => {
                anyhow::bail!("unknown option '{other}'\n\n{USAGE}");
            }
            other => {
                if batch_file.replace(PathBuf::from(other)).is_some() {
                    anyhow::bail!("only one batch file may be given\n\n{USAGE}");
                }
            }
        }
    }

    Ok(Args {
        batch_file: batch_file.with_context(|| format!("missing batch file\n\n{USAGE}"))?,
        source_name: source_name.with_context(|| format!("missing --source\n\n{USAGE}"))?,
        report_dir,
        options,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mass_import=info,plinth_importer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = parse_args()?;

    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = plinth_db::create_pool(&database_url)
        .await
        .context("connecting to the archive database")?;
    plinth_db::run_migrations(&pool)
        .await
        .context("running schema migrations")?;

    let gateway = PgArchiveGateway::new(pool.clone());

    let mut registry = MapperRegistry::new();
    registry.register(Arc::new(GenericJsonMapper::new(args.source_name.clone())));
    let mapper = registry
        .get(&args.source_name)
        .context("no mapper registered for the source")?;

    let raw = std::fs::read_to_string(&args.batch_file)
        .with_context(|| format!("reading {}", args.batch_file.display()))?;
    let payload: serde_json::Value =
        serde_json::from_str(&raw).context("batch file is not valid JSON")?;

    let batch_id = uuid::Uuid::now_v7().to_string();
    let candidates = mapper
        .map_data(&payload, &batch_id)
        .context("mapping batch records")?;

    let seeded: HashSet<String> = if args.options.idempotent {
        gateway.imported_source_ids(&args.source_name).await?
    } else {
        HashSet::new()
    };

    let mut importer = BatchImporter::new(&gateway, &gateway, &gateway, args.options.clone())?
        .with_imported_source_ids(seeded);

    let report = importer.run(&args.source_name, &candidates).await;

    if !args.options.dry_run {
        for outcome in &report.outcomes {
            let finished = matches!(
                outcome.status,
                ImportOutcomeStatus::Imported | ImportOutcomeStatus::MergedDuplicate
            );
            if !finished {
                continue;
            }
            if let Err(e) = gateway
                .record_imported_source(
                    &args.source_name,
                    &outcome.source_id,
                    outcome.target_artwork_id,
                )
                .await
            {
                tracing::warn!(
                    source_id = %outcome.source_id,
                    error = %e,
                    "failed to record source id in the idempotency ledger"
                );
            }
        }

        ImportRunRepo::create(
            &pool,
            &CreateImportRun {
                batch_id: report.batch_id.clone(),
                source_name: report.source_name.clone(),
                status: report.status.as_str().to_string(),
                dry_run: report.dry_run,
                total_records: report.summary.total as i64,
                imported: report.summary.imported as i64,
                merged_duplicate: report.summary.merged_duplicate as i64,
                skipped_duplicate: report.summary.skipped_duplicate as i64,
                errors: report.summary.errors as i64,
                not_attempted: report.summary.not_attempted as i64,
                report_data: serde_json::to_value(&report)?,
                started_at: report.started_at,
                finished_at: report.finished_at,
            },
        )
        .await
        .context("persisting the import run")?;
    }

    let report_path = report::write_report(&args.report_dir, &report)?;
    tracing::info!(report = %report_path.display(), "report written");

    if report.summary.errors > 0 {
        tracing::warn!(
            errors = report.summary.errors,
            "some candidates failed; see the report for source ids and reasons"
        );
    }

    if report.status == ImportRunStatus::Aborted {
        tracing::error!("batch aborted by the circuit breaker");
        std::process::exit(1);
    }

    Ok(())
}
