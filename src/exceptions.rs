// 🚨 Exception Categorizer - routes rejected records into a fixed taxonomy
// Exactly one category per record, chosen by priority; the detail string
// still lists every violation so nothing is hidden from reviewers

use crate::validator::{RejectedRecord, Rule, RuleViolation};
use serde::{Deserialize, Serialize};

/// Stage tag for records rejected by the rule set
pub const STAGE_VALIDATION: &str = "VALIDATION";
/// Stage tag for records dropped by duplicate resolution
pub const STAGE_DEDUPLICATION: &str = "DEDUPLICATION";

// ============================================================================
// CATEGORIES
// ============================================================================

/// Coarse error categories for reporting. Mutually exclusive per record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    MissingRequiredField,
    BusinessRuleViolation,
    DataFormatError,
    DataQualityIssue,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::MissingRequiredField => "MISSING_REQUIRED_FIELD",
            ErrorCategory::BusinessRuleViolation => "BUSINESS_RULE_VIOLATION",
            ErrorCategory::DataFormatError => "DATA_FORMAT_ERROR",
            ErrorCategory::DataQualityIssue => "DATA_QUALITY_ISSUE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "MISSING_REQUIRED_FIELD" => Some(ErrorCategory::MissingRequiredField),
            "BUSINESS_RULE_VIOLATION" => Some(ErrorCategory::BusinessRuleViolation),
            "DATA_FORMAT_ERROR" => Some(ErrorCategory::DataFormatError),
            "DATA_QUALITY_ISSUE" => Some(ErrorCategory::DataQualityIssue),
            _ => None,
        }
    }
}

/// Quarantined record with its category, detail and a full field snapshot
/// for forensic replay. Append-only; never re-validated.
#[derive(Debug, Clone, Serialize)]
pub struct ExceptionRecord {
    pub row: usize,
    pub order_id: String,
    pub category: ErrorCategory,
    pub stage: String,
    pub details: String,
    pub raw_data: serde_json::Value,
}

// ============================================================================
// EXCEPTION CATEGORIZER
// ============================================================================

pub struct ExceptionCategorizer;

impl ExceptionCategorizer {
    pub fn new() -> Self {
        ExceptionCategorizer
    }

    /// Pick the single category for a violation set.
    ///
    /// Priority is policy: a missing identifier outranks broken business
    /// rules, which outrank date format problems; everything else (invalid
    /// region alone, duplicates) falls through to the catch-all.
    pub fn categorize(&self, violations: &[RuleViolation]) -> ErrorCategory {
        let has = |rule: Rule| violations.iter().any(|v| v.rule == rule);

        if has(Rule::MissingOrderId) {
            ErrorCategory::MissingRequiredField
        } else if has(Rule::NegativeRevenue) || has(Rule::InvalidQuantity) {
            ErrorCategory::BusinessRuleViolation
        } else if has(Rule::MissingDate) || has(Rule::InvalidDateFormat) || has(Rule::DateParseError)
        {
            ErrorCategory::DataFormatError
        } else {
            ErrorCategory::DataQualityIssue
        }
    }

    /// Join every violation reason into one detail string, so the full
    /// violation set stays visible even though only one category is recorded.
    pub fn details(&self, violations: &[RuleViolation]) -> String {
        if violations.is_empty() {
            return "Unknown error".to_string();
        }

        violations
            .iter()
            .map(|v| v.reason.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Build the full exception record for one rejected record
    pub fn build(&self, rejected: &RejectedRecord, stage: &str) -> ExceptionRecord {
        ExceptionRecord {
            row: rejected.record.row,
            order_id: rejected.record.order_id.clone(),
            category: self.categorize(&rejected.violations),
            stage: stage.to_string(),
            details: self.details(&rejected.violations),
            raw_data: serde_json::to_value(&rejected.record).unwrap_or(serde_json::Value::Null),
        }
    }

    /// Build exception records for a whole rejected set, preserving order
    pub fn build_batch(&self, rejected: &[RejectedRecord], stage: &str) -> Vec<ExceptionRecord> {
        rejected.iter().map(|r| self.build(r, stage)).collect()
    }
}

impl Default for ExceptionCategorizer {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::SalesRecord;

    fn violation(rule: Rule, reason: &str) -> RuleViolation {
        RuleViolation::new(rule, reason)
    }

    #[test]
    fn test_missing_identifier_takes_top_priority() {
        let categorizer = ExceptionCategorizer::new();

        // Missing order id AND negative revenue: priority 1 wins
        let violations = vec![
            violation(Rule::MissingOrderId, "Order ID is null or empty"),
            violation(Rule::NegativeRevenue, "Revenue is negative: -10"),
        ];

        assert_eq!(
            categorizer.categorize(&violations),
            ErrorCategory::MissingRequiredField
        );
    }

    #[test]
    fn test_business_rule_outranks_date_format() {
        let categorizer = ExceptionCategorizer::new();

        let violations = vec![
            violation(Rule::InvalidDateFormat, "Invalid date format: invalid_date"),
            violation(Rule::NegativeRevenue, "Revenue is negative: -10"),
        ];
        assert_eq!(
            categorizer.categorize(&violations),
            ErrorCategory::BusinessRuleViolation
        );

        // Non-positive quantity sits at the same priority as negative revenue
        let violations = vec![
            violation(Rule::MissingDate, "Order date is missing"),
            violation(Rule::InvalidQuantity, "Quantity is zero or negative: 0"),
        ];
        assert_eq!(
            categorizer.categorize(&violations),
            ErrorCategory::BusinessRuleViolation
        );
    }

    #[test]
    fn test_date_problems_without_business_rules() {
        let categorizer = ExceptionCategorizer::new();

        let violations = vec![violation(Rule::MissingDate, "Order date is missing")];
        assert_eq!(
            categorizer.categorize(&violations),
            ErrorCategory::DataFormatError
        );

        let violations = vec![violation(Rule::DateParseError, "Cannot parse date: 03/01/2025")];
        assert_eq!(
            categorizer.categorize(&violations),
            ErrorCategory::DataFormatError
        );
    }

    #[test]
    fn test_fallback_category() {
        let categorizer = ExceptionCategorizer::new();

        let violations = vec![violation(Rule::InvalidRegion, "Invalid region: Atlantis")];
        assert_eq!(
            categorizer.categorize(&violations),
            ErrorCategory::DataQualityIssue
        );

        let violations = vec![violation(Rule::DuplicateOrderId, "Duplicate order ID: A")];
        assert_eq!(
            categorizer.categorize(&violations),
            ErrorCategory::DataQualityIssue
        );

        // Absent quantity/revenue is a data-quality problem, not a broken
        // business rule: priority 2 is reserved for bad values
        let violations = vec![violation(Rule::MissingQuantity, "Quantity is null or not numeric")];
        assert_eq!(
            categorizer.categorize(&violations),
            ErrorCategory::DataQualityIssue
        );
    }

    #[test]
    fn test_details_join_all_reasons() {
        let categorizer = ExceptionCategorizer::new();

        let violations = vec![
            violation(Rule::MissingRegion, "Region is null or empty"),
            violation(Rule::NegativeRevenue, "Revenue is negative: -5"),
        ];

        assert_eq!(
            categorizer.details(&violations),
            "Region is null or empty; Revenue is negative: -5"
        );
        assert_eq!(categorizer.details(&[]), "Unknown error");
    }

    #[test]
    fn test_build_carries_snapshot_and_stage() {
        let categorizer = ExceptionCategorizer::new();
        let rejected = RejectedRecord {
            record: SalesRecord {
                row: 12,
                order_id: "ORD000099".to_string(),
                order_date: Some("invalid_date".to_string()),
                region: Some("East".to_string()),
                product: "Tomato Ketchup 500g".to_string(),
                quantity: Some(3),
                revenue: Some(45.0),
            },
            violations: vec![violation(
                Rule::InvalidDateFormat,
                "Invalid date format: invalid_date",
            )],
        };

        let exception = categorizer.build(&rejected, STAGE_VALIDATION);

        assert_eq!(exception.row, 12);
        assert_eq!(exception.order_id, "ORD000099");
        assert_eq!(exception.category, ErrorCategory::DataFormatError);
        assert_eq!(exception.stage, "VALIDATION");
        assert_eq!(exception.raw_data["product"], "Tomato Ketchup 500g");
        assert_eq!(exception.raw_data["order_date"], "invalid_date");
    }
}
