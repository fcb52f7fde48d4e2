// ✅ Record Validator - business rule checks for raw sales records
// Every applicable rule runs on every record; failures never short-circuit,
// so the violation list is always complete

use crate::error::{PipelineError, Result};
use crate::record::{
    parse_order_date, RawBatch, SalesRecord, INVALID_DATE_SENTINEL, REGIONS, REQUIRED_COLUMNS,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

// ============================================================================
// RULES
// ============================================================================

/// The closed rule set. Each rule knows the validation stage it belongs to
/// and the control type recorded in the outcome log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rule {
    MissingOrderId,
    MissingRegion,
    MissingQuantity,
    MissingRevenue,
    MissingDate,
    InvalidDateFormat,
    DateParseError,
    NegativeRevenue,
    InvalidQuantity,
    InvalidRegion,
    DuplicateOrderId,
}

impl Rule {
    pub fn name(&self) -> &'static str {
        match self {
            Rule::MissingOrderId => "MISSING_ORDER_ID",
            Rule::MissingRegion => "MISSING_REGION",
            Rule::MissingQuantity => "MISSING_QUANTITY",
            Rule::MissingRevenue => "MISSING_REVENUE",
            Rule::MissingDate => "MISSING_DATE",
            Rule::InvalidDateFormat => "INVALID_FORMAT",
            Rule::DateParseError => "PARSE_ERROR",
            Rule::NegativeRevenue => "NEGATIVE_REVENUE",
            Rule::InvalidQuantity => "INVALID_QUANTITY",
            Rule::InvalidRegion => "INVALID_REGION",
            Rule::DuplicateOrderId => "DUPLICATE_ORDER_ID",
        }
    }

    pub fn stage(&self) -> &'static str {
        match self {
            Rule::MissingOrderId
            | Rule::MissingRegion
            | Rule::MissingQuantity
            | Rule::MissingRevenue => "NULL_CHECK",
            Rule::MissingDate | Rule::InvalidDateFormat | Rule::DateParseError => {
                "DATE_VALIDATION"
            }
            Rule::NegativeRevenue | Rule::InvalidQuantity | Rule::InvalidRegion => "BUSINESS_RULE",
            Rule::DuplicateOrderId => "DUPLICATE_CHECK",
        }
    }
}

/// One failed rule with its human-readable reason
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleViolation {
    pub rule: Rule,
    pub reason: String,
}

impl RuleViolation {
    pub fn new(rule: Rule, reason: impl Into<String>) -> Self {
        RuleViolation {
            rule,
            reason: reason.into(),
        }
    }
}

// ============================================================================
// VALIDATION OUTCOMES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationStatus {
    Passed,
    Failed,
}

impl ValidationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStatus::Passed => "PASSED",
            ValidationStatus::Failed => "FAILED",
        }
    }
}

/// Outcome of one validation pass over one record. Appended to the
/// run-scoped log for every record, accepted or not; never mutated.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub row: usize,
    pub order_id: String,
    pub status: ValidationStatus,
    pub violations: Vec<RuleViolation>,
}

impl ValidationOutcome {
    pub fn passed(row: usize, order_id: &str) -> Self {
        ValidationOutcome {
            row,
            order_id: order_id.to_string(),
            status: ValidationStatus::Passed,
            violations: Vec::new(),
        }
    }

    pub fn failed(row: usize, order_id: &str, violations: Vec<RuleViolation>) -> Self {
        ValidationOutcome {
            row,
            order_id: order_id.to_string(),
            status: ValidationStatus::Failed,
            violations,
        }
    }
}

/// A record that failed validation, with everything the exception path needs
#[derive(Debug, Clone)]
pub struct RejectedRecord {
    pub record: SalesRecord,
    pub violations: Vec<RuleViolation>,
}

/// Result of validating a full batch
#[derive(Debug)]
pub struct ValidationSplit {
    pub accepted: Vec<SalesRecord>,
    pub rejected: Vec<RejectedRecord>,
    pub outcomes: Vec<ValidationOutcome>,
}

// ============================================================================
// RECORD VALIDATOR
// ============================================================================

pub struct RecordValidator;

impl RecordValidator {
    pub fn new() -> Self {
        RecordValidator
    }

    /// Schema precondition: all six expected columns must exist in the
    /// source. Runs before any per-record work; a miss aborts the run.
    pub fn check_schema(&self, batch: &RawBatch) -> Result<()> {
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|col| !batch.columns.iter().any(|c| c == *col))
            .map(|col| col.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(PipelineError::Schema { missing });
        }

        let extra: Vec<&str> = batch
            .columns
            .iter()
            .map(|c| c.as_str())
            .filter(|c| !REQUIRED_COLUMNS.contains(c))
            .collect();
        if !extra.is_empty() {
            warn!("Extra columns found in source: {:?}", extra);
        }

        Ok(())
    }

    /// Run the full rule set against one record. Returns every violation,
    /// not just the first.
    pub fn evaluate(&self, record: &SalesRecord) -> Vec<RuleViolation> {
        let mut violations = Vec::new();

        // Null checks
        if record.order_id.trim().is_empty() {
            violations.push(RuleViolation::new(
                Rule::MissingOrderId,
                "Order ID is null or empty",
            ));
        }

        if record.region.as_deref().map_or(true, |r| r.is_empty()) {
            violations.push(RuleViolation::new(
                Rule::MissingRegion,
                "Region is null or empty",
            ));
        }

        // Date validation
        if let Some(violation) = self.check_date(record) {
            violations.push(violation);
        }

        // Business rules. A blank or unparseable numeric cell arrives here
        // as None and is rejected too: the transformer relies on quantity
        // and revenue being present on every accepted record.
        match record.revenue {
            Some(revenue) if revenue < 0.0 => {
                violations.push(RuleViolation::new(
                    Rule::NegativeRevenue,
                    format!("Revenue is negative: {}", revenue),
                ));
            }
            None => {
                violations.push(RuleViolation::new(
                    Rule::MissingRevenue,
                    "Revenue is null or not numeric",
                ));
            }
            _ => {}
        }

        match record.quantity {
            Some(quantity) if quantity <= 0 => {
                violations.push(RuleViolation::new(
                    Rule::InvalidQuantity,
                    format!("Quantity is zero or negative: {}", quantity),
                ));
            }
            None => {
                violations.push(RuleViolation::new(
                    Rule::MissingQuantity,
                    "Quantity is null or not numeric",
                ));
            }
            _ => {}
        }

        // Region membership (case-sensitive, closed set)
        if let Some(region) = record.region.as_deref() {
            if !region.is_empty() && !REGIONS.contains(&region) {
                violations.push(RuleViolation::new(
                    Rule::InvalidRegion,
                    format!("Invalid region: {}", region),
                ));
            }
        }

        violations
    }

    fn check_date(&self, record: &SalesRecord) -> Option<RuleViolation> {
        let raw = match record.order_date.as_deref() {
            Some(raw) if !raw.is_empty() => raw,
            _ => {
                return Some(RuleViolation::new(
                    Rule::MissingDate,
                    "Order date is missing",
                ))
            }
        };

        if raw == INVALID_DATE_SENTINEL {
            return Some(RuleViolation::new(
                Rule::InvalidDateFormat,
                format!("Invalid date format: {}", raw),
            ));
        }

        if parse_order_date(raw).is_none() {
            return Some(RuleViolation::new(
                Rule::DateParseError,
                format!("Cannot parse date: {}", raw),
            ));
        }

        None
    }

    /// Split a batch into accepted and rejected records, producing one
    /// outcome per record so audit coverage is total.
    pub fn validate_batch(&self, records: &[SalesRecord]) -> ValidationSplit {
        let mut split = ValidationSplit {
            accepted: Vec::new(),
            rejected: Vec::new(),
            outcomes: Vec::new(),
        };

        for record in records {
            let violations = self.evaluate(record);

            if violations.is_empty() {
                split
                    .outcomes
                    .push(ValidationOutcome::passed(record.row, &record.order_id));
                split.accepted.push(record.clone());
            } else {
                split.outcomes.push(ValidationOutcome::failed(
                    record.row,
                    &record.order_id,
                    violations.clone(),
                ));
                split.rejected.push(RejectedRecord {
                    record: record.clone(),
                    violations,
                });
            }
        }

        split
    }
}

impl Default for RecordValidator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
