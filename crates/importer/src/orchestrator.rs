//! The batch import orchestrator.
//!
//! Drives a batch of candidates end to end, strictly in input order: a later
//! candidate may duplicate an artwork imported earlier in the same run, and
//! sequential processing keeps the archive view consistent without locking.
//! All collaborator failures are caught at this layer's per-candidate
//! boundary; the only batch-level exit is the consecutive-error circuit
//! breaker, and even that returns a complete report.

use std::collections::HashSet;

use plinth_core::artwork::ArtworkRecord;
use plinth_core::candidate::{validate_candidate, ImportCandidate};
use plinth_core::config::ImportOptions;
use plinth_core::error::CoreError;
use plinth_core::outcome::{
    ImportOutcome, ImportOutcomeStatus, ImportReport, ImportSummary,
};
use plinth_core::resolver::ScoredMatch;
use plinth_core::similarity::{ScoringWeights, SimilarityResult};
use plinth_core::tags::merge_tags;
use plinth_core::types::DbId;

use crate::gateway::{ArchiveIndex, ArtworkGateway, PhotoStore, ReverseGeocoder};
use crate::resolver::{DuplicateResolver, Resolved};

/// Orchestrates one batch run against a set of collaborators.
///
/// Owns the in-memory idempotency set for the duration of the run; seed it
/// from the imported-source ledger with [`with_imported_source_ids`] before
/// running, and read it back afterwards to persist newly imported ids.
///
/// [`with_imported_source_ids`]: BatchImporter::with_imported_source_ids
pub struct BatchImporter<'a> {
    index: &'a dyn ArchiveIndex,
    gateway: &'a dyn ArtworkGateway,
    photos: &'a dyn PhotoStore,
    geocoder: Option<&'a dyn ReverseGeocoder>,
    options: ImportOptions,
    weights: ScoringWeights,
    imported_source_ids: HashSet<String>,
}

impl<'a> BatchImporter<'a> {
    pub fn new(
        index: &'a dyn ArchiveIndex,
        gateway: &'a dyn ArtworkGateway,
        photos: &'a dyn PhotoStore,
        options: ImportOptions,
    ) -> Result<Self, CoreError> {
        options.validate()?;
        Ok(Self {
            index,
            gateway,
            photos,
            geocoder: None,
            options,
            weights: ScoringWeights::default(),
            imported_source_ids: HashSet::new(),
        })
    }

    pub fn with_geocoder(mut self, geocoder: &'a dyn ReverseGeocoder) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Seed the idempotency set with source ids imported by prior runs.
    pub fn with_imported_source_ids(mut self, ids: HashSet<String>) -> Self {
        self.imported_source_ids = ids;
        self
    }

    /// The idempotency set after a run: prior ids plus everything imported
    /// or merged during the run.
    pub fn imported_source_ids(&self) -> &HashSet<String> {
        &self.imported_source_ids
    }

    /// Process a batch, returning a complete report with one outcome per
    /// candidate in input order. Never fails for a well-formed batch.
    pub async fn run(&mut self, source_name: &str, batch: &[ImportCandidate]) -> ImportReport {
        let started_at = chrono::Utc::now();
        let batch_id = batch
            .first()
            .map(|c| c.import_batch_id.clone())
            .unwrap_or_else(|| uuid::Uuid::now_v7().to_string());

        tracing::info!(
            batch_id = %batch_id,
            source_name,
            total = batch.len(),
            dry_run = self.options.dry_run,
            "starting import batch"
        );

        let mut outcomes: Vec<ImportOutcome> = Vec::with_capacity(batch.len());
        let mut consecutive_errors: u32 = 0;
        let mut breaker_tripped = false;

        for candidate in batch {
            if breaker_tripped {
                outcomes.push(outcome(
                    candidate,
                    ImportOutcomeStatus::NotAttempted,
                    None,
                    None,
                    Some("not attempted: batch aborted by circuit breaker".to_string()),
                ));
                continue;
            }

            let (result, collaborator_error) = self.process_candidate(candidate).await;

            if collaborator_error {
                consecutive_errors += 1;
                if consecutive_errors >= self.options.max_consecutive_errors {
                    breaker_tripped = true;
                    tracing::error!(
                        batch_id = %batch_id,
                        consecutive_errors,
                        "circuit breaker tripped, abandoning the rest of the batch"
                    );
                }
            } else {
                consecutive_errors = 0;
            }

            match result.status {
                ImportOutcomeStatus::Error => tracing::warn!(
                    source_id = %result.source_id,
                    detail = result.error_detail.as_deref().unwrap_or(""),
                    "candidate failed"
                ),
                status => tracing::info!(
                    source_id = %result.source_id,
                    status = %status,
                    target_artwork_id = result.target_artwork_id,
                    "candidate processed"
                ),
            }

            outcomes.push(result);
        }

        let status = ImportReport::status_for(&outcomes);
        let summary = ImportSummary::from_outcomes(&outcomes);

        tracing::info!(
            batch_id = %batch_id,
            status = %status,
            imported = summary.imported,
            merged_duplicate = summary.merged_duplicate,
            skipped_duplicate = summary.skipped_duplicate,
            errors = summary.errors,
            not_attempted = summary.not_attempted,
            "import batch finished"
        );

        ImportReport {
            batch_id,
            source_name: source_name.to_string(),
            status,
            summary,
            outcomes,
            dry_run: self.options.dry_run,
            started_at,
            finished_at: chrono::Utc::now(),
        }
    }

    /// Process one candidate. The second element reports whether the failure
    /// (if any) came from a collaborator and should count toward the circuit
    /// breaker; validation failures and ambiguous matches do not.
    async fn process_candidate(&mut self, candidate: &ImportCandidate) -> (ImportOutcome, bool) {
        if let Err(e) = validate_candidate(candidate) {
            return (
                outcome(
                    candidate,
                    ImportOutcomeStatus::Error,
                    None,
                    None,
                    Some(e.to_string()),
                ),
                false,
            );
        }

        if self.options.idempotent && self.imported_source_ids.contains(&candidate.source_id) {
            return (
                outcome(
                    candidate,
                    ImportOutcomeStatus::SkippedDuplicate,
                    None,
                    None,
                    None,
                ),
                false,
            );
        }

        let resolver = DuplicateResolver::new(self.index).with_weights(self.weights);
        let resolved = match resolver.resolve(candidate, &self.options).await {
            Ok(resolved) => resolved,
            Err(e) => {
                return (
                    outcome(
                        candidate,
                        ImportOutcomeStatus::Error,
                        None,
                        None,
                        Some(format!("duplicate resolution failed: {e}")),
                    ),
                    true,
                );
            }
        };

        match resolved {
            Resolved::New => self.import_new(candidate).await,
            Resolved::Duplicate { target, similarity } => {
                self.merge_into_existing(candidate, *target, similarity).await
            }
            Resolved::Ambiguous { candidates } => (ambiguous_outcome(candidate, candidates), false),
        }
    }

    /// Submit the candidate as a new pending artwork.
    async fn import_new(&mut self, candidate: &ImportCandidate) -> (ImportOutcome, bool) {
        if self.options.dry_run {
            self.mark_imported(candidate);
            return (
                outcome(candidate, ImportOutcomeStatus::Imported, None, None, None),
                false,
            );
        }

        let submission = self.enriched(candidate).await;

        let artwork_id = match self.gateway.submit_artwork(&submission).await {
            Ok(id) => id,
            Err(e) => {
                return (
                    outcome(
                        candidate,
                        ImportOutcomeStatus::Error,
                        None,
                        None,
                        Some(format!("artwork submission failed: {e}")),
                    ),
                    true,
                );
            }
        };

        let photo_detail = self.store_photos(artwork_id, candidate).await;
        self.mark_imported(candidate);

        (
            outcome(
                candidate,
                ImportOutcomeStatus::Imported,
                Some(artwork_id),
                None,
                photo_detail,
            ),
            false,
        )
    }

    /// Merge the candidate's new tags and photos into a matched artwork.
    async fn merge_into_existing(
        &mut self,
        candidate: &ImportCandidate,
        target: ArtworkRecord,
        similarity: SimilarityResult,
    ) -> (ImportOutcome, bool) {
        let delta = merge_tags(&target.tags, &candidate.raw_tags);

        // Conflicting values are dropped in favor of the existing record;
        // log them so the operator can audit what was discarded.
        if !delta.kept_existing.is_empty() {
            tracing::warn!(
                source_id = %candidate.source_id,
                artwork_id = target.id,
                conflicting_keys = ?delta.kept_existing.keys().collect::<Vec<_>>(),
                "incoming tag values conflict with curated data, existing values kept"
            );
        }

        if self.options.dry_run {
            self.mark_imported(candidate);
            return (
                outcome(
                    candidate,
                    ImportOutcomeStatus::MergedDuplicate,
                    Some(target.id),
                    Some(similarity),
                    None,
                ),
                false,
            );
        }

        if !delta.added.is_empty() {
            if let Err(e) = self.gateway.patch_artwork_tags(target.id, &delta.added).await {
                return (
                    outcome(
                        candidate,
                        ImportOutcomeStatus::Error,
                        Some(target.id),
                        Some(similarity),
                        Some(format!("tag merge failed: {e}")),
                    ),
                    true,
                );
            }
        }

        // Photos are forwarded even when the tag delta was empty. A photo
        // failure does not roll back an applied tag patch; the two
        // collaborators share no transaction.
        let photo_detail = self.store_photos(target.id, candidate).await;
        self.mark_imported(candidate);

        (
            outcome(
                candidate,
                ImportOutcomeStatus::MergedDuplicate,
                Some(target.id),
                Some(similarity),
                photo_detail,
            ),
            false,
        )
    }

    /// Forward candidate photos to the photo pipeline one by one. Returns a
    /// detail string describing any per-photo failures, or `None` when all
    /// succeeded.
    async fn store_photos(&self, artwork_id: DbId, candidate: &ImportCandidate) -> Option<String> {
        let mut failures: Vec<String> = Vec::new();

        for url in &candidate.photo_urls {
            if let Err(e) = self.photos.store_photo(artwork_id, url).await {
                tracing::warn!(
                    source_id = %candidate.source_id,
                    artwork_id,
                    url = %url,
                    error = %e,
                    "photo store failed"
                );
                failures.push(format!("{url}: {e}"));
            }
        }

        if failures.is_empty() {
            None
        } else {
            Some(format!(
                "{} of {} photos failed: {}",
                failures.len(),
                candidate.photo_urls.len(),
                failures.join("; ")
            ))
        }
    }

    /// Reverse-geocode enrichment for new submissions: adds locality tags
    /// the candidate does not already carry. Geocoder absence, a `None`
    /// result, and outright failure all leave the candidate unchanged.
    async fn enriched(&self, candidate: &ImportCandidate) -> ImportCandidate {
        let (Some(geocoder), Some(location)) = (self.geocoder, candidate.valid_location()) else {
            return candidate.clone();
        };

        let info = match geocoder.reverse_geocode(location).await {
            Ok(Some(info)) => info,
            Ok(None) => return candidate.clone(),
            Err(e) => {
                tracing::warn!(
                    source_id = %candidate.source_id,
                    error = %e,
                    "reverse geocode failed, submitting without enrichment"
                );
                return candidate.clone();
            }
        };

        let mut enriched = candidate.clone();
        let locality_tags = [
            ("city", info.city),
            ("region", info.region),
            ("country", info.country_code),
        ];
        for (key, value) in locality_tags {
            if let Some(value) = value {
                enriched
                    .raw_tags
                    .entry(key.to_string())
                    .or_insert(value);
            }
        }
        enriched
    }

    fn mark_imported(&mut self, candidate: &ImportCandidate) {
        self.imported_source_ids
            .insert(candidate.source_id.clone());
    }
}

/// Build an outcome for a candidate.
fn outcome(
    candidate: &ImportCandidate,
    status: ImportOutcomeStatus,
    target_artwork_id: Option<DbId>,
    similarity: Option<SimilarityResult>,
    error_detail: Option<String>,
) -> ImportOutcome {
    ImportOutcome {
        source_id: candidate.source_id.clone(),
        title: candidate.trimmed_title().map(str::to_string),
        status,
        target_artwork_id,
        similarity,
        error_detail,
    }
}

/// An ambiguous match is an error outcome listing every contender, never an
/// auto-pick.
fn ambiguous_outcome(candidate: &ImportCandidate, candidates: Vec<ScoredMatch>) -> ImportOutcome {
    let contenders = candidates
        .iter()
        .map(|m| format!("{} (score {:.3})", m.target_id, m.similarity.score))
        .collect::<Vec<_>>()
        .join(", ");

    outcome(
        candidate,
        ImportOutcomeStatus::Error,
        None,
        None,
        Some(format!(
            "ambiguous match, manual review required: candidates {contenders}"
        )),
    )
}
