//! Ingestion pipeline.
//!
//! One logical transaction per batch: the ScanRun, every finding with its
//! classification and review state, the per-asset stat recomputation, and
//! the final status transition commit atomically or not at all. Dropping
//! the transaction un-committed (error or panic) rolls everything back.
//! Graph sync is enqueued strictly after commit and never rolls the
//! catalog back.

use crate::asset_manager::AssetManager;
use crate::payload::{CandidateFinding, IngestBatch};
use crate::stable_id::{asset_display_name, compute_stable_id, parse_db_locator};
use catalog_store::{
    AssetRepo, CatalogPool, ClassificationRepo, FindingInsert, FindingRepo, PatternRepo,
    ReviewRepo, ScanRunRepo,
};
use classification::rules::classification_for;
use classification::{
    aggregate_asset_risk, enrichment_score, infer_environment, validate_locked_type,
    ClassificationInput, Classifier, Enricher, EnrichmentContext,
};
use lineage_graph::SyncHandle;
use privguard_core::config::IngestConfig;
use privguard_core::types::{ClassificationType, ConfidenceTier, ReviewStatus, ScanStatus};
use privguard_core::utils::{current_timestamp, generate_uuid, normalize_match_value, strip_nul};
use privguard_core::{
    Classification, EntityId, Error, Finding, IngestSummary, Result, ReviewState, ScanRun,
    TenantContext,
};
use sqlx::PgConnection;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Transactional driver from scanner batch to catalog rows
pub struct IngestionPipeline {
    pool: CatalogPool,
    classifier: Arc<Classifier>,
    enricher: Arc<Enricher>,
    assets: Arc<AssetManager>,
    sync: SyncHandle,
    config: IngestConfig,
}

/// Counters accumulated over one batch
#[derive(Debug, Default)]
struct BatchOutcome {
    inserted: i64,
    rejected: i64,
    duplicates: i64,
    suppressed: i64,
    nul_stripped: i64,
    assets_created: i64,
    patterns: BTreeSet<String>,
    touched: BTreeSet<EntityId>,
}

impl IngestionPipeline {
    pub fn new(
        pool: CatalogPool,
        classifier: Arc<Classifier>,
        enricher: Arc<Enricher>,
        assets: Arc<AssetManager>,
        sync: SyncHandle,
        config: IngestConfig,
    ) -> Self {
        Self {
            pool,
            classifier,
            enricher,
            assets,
            sync,
            config,
        }
    }

    /// Ingest a batch under a fresh ScanRun
    pub async fn ingest(&self, batch: IngestBatch) -> Result<IngestSummary> {
        if batch.candidates.is_empty() {
            return Err(Error::validation("no findings in batch"));
        }

        let now = current_timestamp();
        let run = ScanRun {
            id: generate_uuid(),
            tenant_id: batch.tenant.tenant_id,
            profile_name: batch.profile_name.clone(),
            host: batch
                .candidates
                .first()
                .map(|c| c.host.clone())
                .unwrap_or_default(),
            status: ScanStatus::Running,
            started_at: now,
            completed_at: None,
            total_findings: 0,
            total_assets: 0,
            metadata: batch.metadata.clone(),
            cancelled_at: None,
            cancelled_by: None,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.pool.begin().await?;
        ScanRunRepo::insert(&mut *tx, &run).await?;
        let outcome = self.run_batch(&mut *tx, &run, &batch).await?;
        tx.commit().await?;

        self.after_commit(&run, &outcome);
        Ok(summary_of(run.id, &outcome))
    }

    /// Ingest a batch into a pre-created ScanRun (workflow activity path).
    /// A scan already in a terminal state is observed and returned without
    /// side effects, so retries are safe.
    pub async fn ingest_into(
        &self,
        scan_id: EntityId,
        batch: IngestBatch,
    ) -> Result<IngestSummary> {
        if batch.candidates.is_empty() {
            return Err(Error::validation("no findings in batch"));
        }

        let mut tx = self.pool.begin().await?;
        let run = ScanRunRepo::get(&mut *tx, batch.tenant, scan_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("scan run {scan_id}")))?;

        if run.status.is_terminal() {
            info!(scan_id = %scan_id, status = %run.status, "scan already terminal, skipping ingest");
            return Ok(summary_of(scan_id, &BatchOutcome::default()));
        }
        if run.status == ScanStatus::Pending {
            ScanRunRepo::transition(&mut *tx, scan_id, ScanStatus::Pending, ScanStatus::Running, None)
                .await?;
        }

        let outcome = self.run_batch(&mut *tx, &run, &batch).await?;
        tx.commit().await?;

        self.after_commit(&run, &outcome);
        Ok(summary_of(scan_id, &outcome))
    }

    /// The per-batch loop, bound to one open transaction
    async fn run_batch(
        &self,
        conn: &mut PgConnection,
        run: &ScanRun,
        batch: &IngestBatch,
    ) -> Result<BatchOutcome> {
        let mut outcome = BatchOutcome::default();
        let allowlist = &self.classifier.config().locked_types;

        for candidate in &batch.candidates {
            let Some(canonical) = validate_locked_type(&candidate.pattern_name, allowlist) else {
                outcome.rejected += 1;
                warn!(
                    pattern = %candidate.pattern_name,
                    "candidate rejected: pattern outside locked type scope"
                );
                continue;
            };

            self.process_candidate(conn, run, batch.tenant, candidate, &canonical, &mut outcome)
                .await?;
        }

        // Recount and re-score every touched asset inside the transaction
        for asset_id in outcome.touched.clone() {
            let stats = AssetRepo::finding_stats(&mut *conn, asset_id).await?;
            let risk = aggregate_asset_risk(&stats);
            self.assets
                .update_stats(&mut *conn, asset_id, risk, stats.total_findings)
                .await?;
        }

        ScanRunRepo::merge_metadata(
            &mut *conn,
            run.id,
            &serde_json::json!({
                "nul_bytes_stripped": outcome.nul_stripped,
                "rejected_candidates": outcome.rejected,
                "duplicates_skipped": outcome.duplicates,
                "suppressed": outcome.suppressed,
            }),
        )
        .await?;
        ScanRunRepo::update_totals(
            &mut *conn,
            run.id,
            outcome.inserted,
            outcome.touched.len() as i64,
        )
        .await?;
        // A concurrent cancellation wins this CAS and the whole batch
        // rolls back, leaving no findings from the cancelled scan.
        ScanRunRepo::transition(
            &mut *conn,
            run.id,
            ScanStatus::Running,
            ScanStatus::Completed,
            None,
        )
        .await?;

        Ok(outcome)
    }

    async fn process_candidate(
        &self,
        conn: &mut PgConnection,
        run: &ScanRun,
        tenant: TenantContext,
        candidate: &CandidateFinding,
        canonical: &str,
        outcome: &mut BatchOutcome,
    ) -> Result<()> {
        let stable_id = compute_stable_id(
            candidate.source_type,
            &candidate.data_source,
            &candidate.host,
            &candidate.locator,
        );
        let database_name = if candidate.source_type.is_relational() {
            parse_db_locator(&candidate.locator).connection
        } else {
            None
        };
        let environment = infer_environment(
            candidate.environment_hint.as_deref(),
            &candidate.locator,
            database_name.as_deref(),
        );

        let asset_type = if candidate.source_type.is_relational() {
            "table"
        } else {
            "file"
        };
        let (asset_id, is_new) = self
            .assets
            .create_or_update(
                &mut *conn,
                tenant,
                privguard_core::NewAsset {
                    tenant_id: tenant.tenant_id,
                    stable_id: Some(stable_id),
                    asset_type: asset_type.to_string(),
                    name: asset_display_name(candidate.source_type, &candidate.locator),
                    path: candidate.locator.clone(),
                    data_source: candidate.data_source.clone(),
                    host: candidate.host.clone(),
                    environment,
                    owner: None,
                    source_system: Some(candidate.data_source.clone()),
                    metadata: candidate.metadata.clone(),
                },
            )
            .await?;
        if is_new {
            outcome.assets_created += 1;
        }
        outcome.touched.insert(asset_id);

        let (classification_type, _) = classification_for(canonical);
        let pattern = PatternRepo::resolve_or_insert(
            &mut *conn,
            tenant,
            canonical,
            classification_type.as_str(),
        )
        .await?;
        outcome.patterns.insert(pattern.name.clone());

        // Sanitize scanner text: NUL bytes are stripped and counted
        let mut matches = Vec::with_capacity(candidate.matches.len());
        for raw in &candidate.matches {
            let (clean, removed) = strip_nul(raw);
            outcome.nul_stripped += removed as i64;
            matches.push(clean);
        }
        let sample_text = candidate.sample_text.as_deref().map(|s| {
            let (clean, removed) = strip_nul(s);
            outcome.nul_stripped += removed as i64;
            clean
        });

        let first_match = matches.first().cloned().unwrap_or_default();
        let normalized = normalize_match_value(&first_match);

        let signals = self.enricher.enrich(&EnrichmentContext {
            asset_path: &candidate.locator,
            normalized_value: &normalized,
            pattern_name: canonical,
            asset_type,
            column_name: candidate.column_name.as_deref(),
            explicit_environment: candidate.environment_hint.as_deref(),
            database_name: database_name.as_deref(),
        });
        let enrich_score = enrichment_score(&signals);

        let decision = self.classifier.classify(&ClassificationInput {
            canonical_pattern: canonical,
            column_name: candidate.column_name.as_deref(),
            asset_path: &candidate.locator,
            external_confidence: candidate.confidence,
            signals: &signals,
        });

        if self.config.drop_non_pii && decision.classification_type == ClassificationType::NonPii {
            outcome.suppressed += 1;
            return Ok(());
        }
        if self.config.drop_discard && decision.tier == ConfidenceTier::Discard {
            outcome.suppressed += 1;
            return Ok(());
        }

        let now = current_timestamp();
        let finding = Finding {
            id: generate_uuid(),
            tenant_id: tenant.tenant_id,
            scan_run_id: run.id,
            asset_id,
            pattern_id: pattern.id,
            pattern_name: canonical.to_string(),
            occurrence_count: matches.len() as i32,
            matches,
            sample_text,
            severity: decision.severity,
            confidence_score: decision.final_score,
            enrichment_score: enrich_score,
            enrichment_signals: serde_json::to_value(&signals)?,
            enrichment_failed: signals.enrichment_failed,
            context: serde_json::json!({
                "column_name": candidate.column_name,
                "scanner_severity": candidate.scanner_severity,
                "scanner_confidence": candidate.confidence,
                "source_type": candidate.source_type,
            }),
            masked_value: None,
            normalized_value_hash: signals.value_hash.clone(),
            risk_score: decision.risk_score,
            deleted_at: None,
            created_at: now,
        };

        match FindingRepo::insert(&mut *conn, &finding).await? {
            FindingInsert::Duplicate => {
                // Dedup unique index hit: logged and skipped, not an error
                debug!(
                    asset_id = %asset_id,
                    pattern = %canonical,
                    "duplicate finding skipped by dedup index"
                );
                outcome.duplicates += 1;
                return Ok(());
            }
            FindingInsert::Inserted => {}
        }
        outcome.inserted += 1;

        ClassificationRepo::insert(
            &mut *conn,
            &Classification {
                id: generate_uuid(),
                finding_id: finding.id,
                classification_type: decision.classification_type,
                sub_category: Some(decision.sub_category.clone()),
                confidence_score: decision.final_score,
                tier: decision.tier,
                justification: decision.justification.clone(),
                dpdpa_category: decision.dpdpa_category.clone(),
                requires_consent: decision.requires_consent,
                retention_period: decision.retention_period.clone(),
                classifier_version: decision.classifier_version.clone(),
                classified_at: now,
            },
        )
        .await?;

        ReviewRepo::insert(
            &mut *conn,
            &ReviewState {
                id: generate_uuid(),
                finding_id: finding.id,
                status: ReviewStatus::Pending,
                reviewed_by: None,
                reviewed_at: None,
                comments: None,
            },
        )
        .await?;

        Ok(())
    }

    /// Post-commit effects: graph sync per touched asset. Failures here
    /// are recoverable by the resync sweep, never by rolling back.
    fn after_commit(&self, run: &ScanRun, outcome: &BatchOutcome) {
        for asset_id in &outcome.touched {
            self.sync.enqueue_asset(*asset_id);
        }
        info!(
            scan_id = %run.id,
            findings = outcome.inserted,
            assets = outcome.touched.len(),
            rejected = outcome.rejected,
            duplicates = outcome.duplicates,
            "batch committed"
        );
    }
}

fn summary_of(scan_run_id: EntityId, outcome: &BatchOutcome) -> IngestSummary {
    IngestSummary {
        scan_run_id,
        total_findings: outcome.inserted,
        total_assets: outcome.touched.len() as i64,
        assets_created: outcome.assets_created,
        patterns_found: outcome.patterns.len() as i64,
        rejected_candidates: outcome.rejected,
        duplicates_skipped: outcome.duplicates,
    }
}
