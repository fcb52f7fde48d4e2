// 🔍 Duplicate Resolver - first occurrence of an order id wins
// Every occurrence of a duplicated id is logged for transparency, but only
// the non-first ones are dropped

use crate::record::SalesRecord;
use crate::validator::{RejectedRecord, Rule, RuleViolation, ValidationOutcome};
use std::collections::{HashMap, HashSet};

/// Result of the duplicate pass over an accepted batch
#[derive(Debug)]
pub struct DedupOutcome {
    /// Survivors, in original batch order
    pub kept: Vec<SalesRecord>,
    /// Non-first occurrences of duplicated ids, in original batch order
    pub dropped: Vec<RejectedRecord>,
    /// Failed duplicate-check outcomes for all occurrences, kept included
    pub outcomes: Vec<ValidationOutcome>,
}

pub struct DuplicateResolver;

impl DuplicateResolver {
    pub fn new() -> Self {
        DuplicateResolver
    }

    /// Resolve duplicated order ids. The first occurrence in batch order is
    /// the one that survives into transformation; this tie-break is part of
    /// the pipeline contract, not an accident of iteration order.
    pub fn resolve(&self, records: Vec<SalesRecord>) -> DedupOutcome {
        let mut occurrences: HashMap<String, usize> = HashMap::new();
        for record in &records {
            *occurrences.entry(record.order_id.clone()).or_insert(0) += 1;
        }

        let mut seen: HashSet<String> = HashSet::new();
        let mut result = DedupOutcome {
            kept: Vec::new(),
            dropped: Vec::new(),
            outcomes: Vec::new(),
        };

        for record in records {
            let duplicated = occurrences.get(&record.order_id).copied().unwrap_or(0) > 1;

            if duplicated {
                let violation = RuleViolation::new(
                    Rule::DuplicateOrderId,
                    format!("Duplicate order ID: {}", record.order_id),
                );
                result.outcomes.push(ValidationOutcome::failed(
                    record.row,
                    &record.order_id,
                    vec![violation.clone()],
                ));

                if seen.contains(&record.order_id) {
                    result.dropped.push(RejectedRecord {
                        record,
                        violations: vec![violation],
                    });
                    continue;
                }
            }

            seen.insert(record.order_id.clone());
            result.kept.push(record);
        }

        result
    }
}

impl Default for DuplicateResolver {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
