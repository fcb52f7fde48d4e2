// 📋 Audit Trail - one structured event per pipeline lifecycle transition
// Events go to the console log and the audit_log table; a storage failure
// downgrades to a warning because audit is observability, not correctness

use crate::store::RunStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

// Event types, one per lifecycle transition
pub const PIPELINE_START: &str = "PIPELINE_START";
pub const DATA_INGESTION: &str = "DATA_INGESTION";
pub const VALIDATION_SUMMARY: &str = "VALIDATION_SUMMARY";
pub const EXCEPTION_HANDLING: &str = "EXCEPTION_HANDLING";
pub const DATA_TRANSFORMATION: &str = "DATA_TRANSFORMATION";
pub const ANALYTICS_AGGREGATION: &str = "ANALYTICS_AGGREGATION";
pub const PIPELINE_END: &str = "PIPELINE_END";
pub const SYSTEM_ERROR: &str = "SYSTEM_ERROR";

/// One audit event as persisted
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub run_id: String,
    pub event_type: String,
    pub description: String,
    pub record_count: i64,
    pub timestamp: DateTime<Utc>,
}

/// Emits audit events for one run. Every event is logged via `tracing` and
/// appended to the store best-effort.
pub struct AuditLogger<'a> {
    run_id: String,
    store: &'a dyn RunStore,
}

impl<'a> AuditLogger<'a> {
    pub fn new(run_id: &str, store: &'a dyn RunStore) -> Self {
        AuditLogger {
            run_id: run_id.to_string(),
            store,
        }
    }

    pub fn pipeline_start(&self) {
        self.emit(
            PIPELINE_START,
            format!("Pipeline started - Run ID: {}", self.run_id),
            0,
        );
    }

    pub fn ingestion(&self, record_count: usize, source: &str, checksum: Option<&str>) {
        let description = match checksum {
            Some(checksum) => format!(
                "Data ingested from {} - {} records (sha256 {})",
                source, record_count, checksum
            ),
            None => format!("Data ingested from {} - {} records", source, record_count),
        };
        self.emit(DATA_INGESTION, description, record_count as i64);
    }

    pub fn validation_summary(&self, passed: usize, failed: usize) {
        self.emit(
            VALIDATION_SUMMARY,
            format!("Validation completed - Passed: {}, Failed: {}", passed, failed),
            (passed + failed) as i64,
        );
    }

    pub fn exception_handling(&self, exception_count: usize) {
        self.emit(
            EXCEPTION_HANDLING,
            format!("Processed {} exception records", exception_count),
            exception_count as i64,
        );
    }

    pub fn transformation(&self, record_count: usize) {
        self.emit(
            DATA_TRANSFORMATION,
            format!(
                "Data transformation completed - {} records processed",
                record_count
            ),
            record_count as i64,
        );
    }

    pub fn aggregation(&self, summary_count: usize) {
        self.emit(
            ANALYTICS_AGGREGATION,
            format!("Analytics aggregation completed - {} summary rows", summary_count),
            summary_count as i64,
        );
    }

    pub fn pipeline_end(&self, total_records: usize) {
        self.emit(
            PIPELINE_END,
            format!(
                "Pipeline completed - Run ID: {}, Total records: {}",
                self.run_id, total_records
            ),
            total_records as i64,
        );
    }

    pub fn system_error(&self, message: &str) {
        error!(run_id = %self.run_id, "{}", message);
        self.append(AuditEvent {
            run_id: self.run_id.clone(),
            event_type: SYSTEM_ERROR.to_string(),
            description: format!("Exception occurred: {}", message),
            record_count: 0,
            timestamp: Utc::now(),
        });
    }

    fn emit(&self, event_type: &str, description: String, record_count: i64) {
        info!(run_id = %self.run_id, event = event_type, "{}", description);
        self.append(AuditEvent {
            run_id: self.run_id.clone(),
            event_type: event_type.to_string(),
            description,
            record_count,
            timestamp: Utc::now(),
        });
    }

    fn append(&self, event: AuditEvent) {
        if let Err(e) = self.store.append_audit(&event) {
            warn!(run_id = %self.run_id, "Failed to write audit event: {}", e);
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
