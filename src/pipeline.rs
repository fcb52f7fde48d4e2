// 🏭 Pipeline Orchestrator - one run, start to finish
// The stage machine is strictly linear; FAILED is reachable from anywhere.
// Nothing escapes run(): every input, however broken, yields a RunSummary,
// and a failed run still leaves a best-effort analytics snapshot behind.

use crate::aggregate::Aggregator;
use crate::audit::AuditLogger;
use crate::dedup::DuplicateResolver;
use crate::exceptions::{ExceptionCategorizer, STAGE_DEDUPLICATION, STAGE_VALIDATION};
use crate::ingest;
use crate::record::RawBatch;
use crate::store::RunStore;
use crate::transform::Transformer;
use crate::validator::{RecordValidator, ValidationOutcome, ValidationStatus};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Lifecycle of one run. Transitions are linear; each one emits exactly one
/// audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Ingested,
    Validated,
    ExceptionsHandled,
    Transformed,
    Aggregated,
    Done,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunStatus {
    Success,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "SUCCESS",
            RunStatus::Failed => "FAILED",
        }
    }
}

/// Terminal artifact of a run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub status: RunStatus,
    pub total_records: usize,
    /// Kept after deduplication
    pub clean_records: usize,
    /// Rejected by the rule set
    pub invalid_records: usize,
    /// Dropped as non-first duplicates
    pub duplicate_records: usize,
    /// FAILED validation rows per rule name; every flagged duplicate
    /// occurrence counts here, the kept representative included
    pub failure_breakdown: BTreeMap<String, usize>,
    pub error: Option<String>,
}

pub struct SalesPipeline<'a> {
    run_id: String,
    store: &'a dyn RunStore,
}

impl<'a> SalesPipeline<'a> {
    pub fn new(store: &'a dyn RunStore) -> Self {
        // Short run ids, as dashboards show them
        let run_id = Uuid::new_v4().simple().to_string()[..8].to_string();
        SalesPipeline { run_id, store }
    }

    /// Target an explicit run id (re-runs overwrite their replace-semantics
    /// tables while append-only tables accumulate history).
    pub fn with_run_id(store: &'a dyn RunStore, run_id: &str) -> Self {
        SalesPipeline {
            run_id: run_id.to_string(),
            store,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Ingest a CSV file and run the pipeline over it. Ingestion failures
    /// produce the same FAILED summary shape as any other stage failure;
    /// the audit trail still opens with a start event.
    pub fn run_from_csv(&self, path: &Path) -> RunSummary {
        let audit = AuditLogger::new(&self.run_id, self.store);
        audit.pipeline_start();

        match ingest::read_csv(path) {
            Ok(batch) => self.execute(batch, &audit),
            Err(e) => {
                self.fail_with_audit(&audit, 0, &format!("Data ingestion failed: {}", e))
            }
        }
    }

    /// Execute the full pipeline over one batch. Never returns an error and
    /// never panics on data; all failures convert into the summary.
    pub fn run(&self, batch: RawBatch) -> RunSummary {
        let audit = AuditLogger::new(&self.run_id, self.store);
        audit.pipeline_start();
        self.execute(batch, &audit)
    }

    fn execute(&self, batch: RawBatch, audit: &AuditLogger) -> RunSummary {
        let total = batch.records.len();
        let mut stage = Stage::Start;

        // Ingestion: archive the raw batch (append-only, best-effort)
        if let Err(e) = self.store.append_raw(&self.run_id, &batch) {
            warn!(run_id = %self.run_id, "Failed to archive raw batch: {}", e);
        }
        audit.ingestion(total, &batch.source, batch.checksum.as_deref());
        advance(&mut stage, Stage::Ingested);

        // Schema precondition: a miss aborts before any per-record work
        let validator = RecordValidator::new();
        if let Err(e) = validator.check_schema(&batch) {
            return self.fail_with_audit(audit, total, &e.to_string());
        }

        // Validation + duplicate resolution
        let split = validator.validate_batch(&batch.records);
        let dedup = DuplicateResolver::new().resolve(split.accepted);
        audit.validation_summary(dedup.kept.len(), split.rejected.len() + dedup.dropped.len());
        advance(&mut stage, Stage::Validated);

        let mut outcomes: Vec<ValidationOutcome> = split.outcomes;
        outcomes.extend(dedup.outcomes);
        if let Err(e) = self.store.append_outcomes(&self.run_id, &outcomes) {
            warn!(run_id = %self.run_id, "Failed to persist validation outcomes: {}", e);
        }

        // Exception handling: rule rejects, then duplicate drops
        let categorizer = ExceptionCategorizer::new();
        let mut exceptions = categorizer.build_batch(&split.rejected, STAGE_VALIDATION);
        exceptions.extend(categorizer.build_batch(&dedup.dropped, STAGE_DEDUPLICATION));
        if let Err(e) = self.store.append_exceptions(&self.run_id, &exceptions) {
            warn!(run_id = %self.run_id, "Failed to persist exception records: {}", e);
        }
        audit.exception_handling(exceptions.len());
        advance(&mut stage, Stage::ExceptionsHandled);

        // Transformation. A precondition breach here is an internal defect
        // and fails the run.
        let transformed = match Transformer::new().transform(&dedup.kept) {
            Ok(transformed) => transformed,
            Err(e) => return self.fail_with_audit(audit, total, &e.to_string()),
        };

        // The transformed dataset is the primary artifact: its write failure
        // flips the run to FAILED, but the remaining stages still execute.
        let mut primary_error = None;
        if let Err(e) = self.store.replace_clean(&self.run_id, &transformed) {
            warn!(run_id = %self.run_id, "Failed to persist clean dataset: {}", e);
            primary_error = Some(format!("Failed to persist clean dataset: {}", e));
        }
        audit.transformation(transformed.len());
        advance(&mut stage, Stage::Transformed);

        // Aggregation. Zero clean records is a successful no-op: nothing to
        // summarize, no rows written.
        let mut summary_count = 0;
        if !transformed.is_empty() {
            let summaries = Aggregator::new().aggregate(&transformed);
            summary_count = summaries.len();
            if let Err(e) = self.store.replace_summaries(&self.run_id, &summaries) {
                warn!(run_id = %self.run_id, "Failed to persist analytics summaries: {}", e);
            }
        }
        audit.aggregation(summary_count);
        advance(&mut stage, Stage::Aggregated);

        audit.pipeline_end(total);
        advance(&mut stage, Stage::Done);

        let (status, error) = match primary_error {
            Some(error) => (RunStatus::Failed, Some(error)),
            None => (RunStatus::Success, None),
        };

        info!(
            run_id = %self.run_id,
            status = status.as_str(),
            stage = ?stage,
            total,
            clean = dedup.kept.len(),
            invalid = split.rejected.len(),
            duplicates = dedup.dropped.len(),
            "Run complete"
        );

        RunSummary {
            run_id: self.run_id.clone(),
            status,
            total_records: total,
            clean_records: dedup.kept.len(),
            invalid_records: split.rejected.len(),
            duplicate_records: dedup.dropped.len(),
            failure_breakdown: failure_breakdown(&outcomes),
            error,
        }
    }

    fn fail_with_audit(&self, audit: &AuditLogger, total: usize, message: &str) -> RunSummary {
        debug!(run_id = %self.run_id, to = ?Stage::Failed, "Stage transition");
        audit.system_error(message);

        // Best-effort snapshot so the dashboard always has rows to show for
        // this run; its own failure is swallowed.
        let snapshot = Aggregator::new().aggregate(&[]);
        if let Err(e) = self.store.replace_summaries(&self.run_id, &snapshot) {
            warn!(run_id = %self.run_id, "Best-effort aggregation failed: {}", e);
        }

        RunSummary {
            run_id: self.run_id.clone(),
            status: RunStatus::Failed,
            total_records: total,
            clean_records: 0,
            invalid_records: 0,
            duplicate_records: 0,
            failure_breakdown: BTreeMap::new(),
            error: Some(message.to_string()),
        }
    }
}

fn advance(stage: &mut Stage, next: Stage) {
    let from = *stage;
    debug!(from = ?from, to = ?next, "Stage transition");
    *stage = next;
}

fn failure_breakdown(outcomes: &[ValidationOutcome]) -> BTreeMap<String, usize> {
    let mut breakdown = BTreeMap::new();
    for outcome in outcomes {
        if outcome.status == ValidationStatus::Failed {
            for violation in &outcome.violations {
                *breakdown.entry(violation.rule.name().to_string()).or_insert(0) += 1;
            }
        }
    }
    breakdown
}

// ============================================================================
// TESTS
// ============================================================================
