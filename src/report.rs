// 📈 Run Report - read-only assembly of what the dashboard renders
// Pulls every run-scoped artifact back out of the store; computes the
// per-rule breakdown in memory from the flattened outcome rows

use crate::audit::AuditEvent;
use crate::error::Result;
use crate::record::AggregateSummary;
use crate::store::RunStore;
use std::collections::BTreeMap;

/// Passed/failed counts for one control type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleBreakdown {
    pub passed: usize,
    pub failed: usize,
}

#[derive(Debug)]
pub struct RunReport {
    pub run_id: String,
    pub summaries: Vec<AggregateSummary>,
    /// Control type -> passed/failed counts (PASSED rows land under the
    /// synthetic "PASSED" control, as they are persisted)
    pub validation: BTreeMap<String, RuleBreakdown>,
    /// Error category -> quarantined record count
    pub exception_counts: BTreeMap<String, usize>,
    pub audit_trail: Vec<AuditEvent>,
}

impl RunReport {
    /// Assemble the report for one run. Strictly read-only.
    pub fn load(store: &dyn RunStore, run_id: &str) -> Result<Self> {
        let mut validation: BTreeMap<String, RuleBreakdown> = BTreeMap::new();
        for outcome in store.outcomes(run_id)? {
            let entry = validation.entry(outcome.control_type).or_default();
            if outcome.status == "FAILED" {
                entry.failed += 1;
            } else {
                entry.passed += 1;
            }
        }

        let mut exception_counts: BTreeMap<String, usize> = BTreeMap::new();
        for exception in store.exceptions(run_id)? {
            *exception_counts
                .entry(exception.category.as_str().to_string())
                .or_insert(0) += 1;
        }

        Ok(RunReport {
            run_id: run_id.to_string(),
            summaries: store.summaries(run_id)?,
            validation,
            exception_counts,
            audit_trail: store.audit_events(run_id)?,
        })
    }

    /// The most recent run on record, if any
    pub fn latest_run(store: &dyn RunStore) -> Result<Option<String>> {
        Ok(store.list_runs()?.pop())
    }
}

// ============================================================================
// TESTS
// ============================================================================
