// 🔄 Transformer - canonicalizes clean records for analytics
// Inputs arrive post-validation; any precondition breach here means the
// validator broke its contract, so it surfaces as an internal error rather
// than a data exception

use crate::error::{PipelineError, Result};
use crate::record::{parse_order_date, round2, SalesRecord, TransformedRecord};

pub struct Transformer;

impl Transformer {
    pub fn new() -> Self {
        Transformer
    }

    /// Transform a deduplicated clean batch. Empty input is a successful
    /// no-op, not an error.
    pub fn transform(&self, records: &[SalesRecord]) -> Result<Vec<TransformedRecord>> {
        let mut transformed = Vec::with_capacity(records.len());

        for record in records {
            transformed.push(self.transform_record(record)?);
        }

        Ok(transformed)
    }

    fn transform_record(&self, record: &SalesRecord) -> Result<TransformedRecord> {
        let raw_date = record
            .order_date
            .as_deref()
            .ok_or_else(|| precondition(record, "order date is missing"))?;
        let order_date = parse_order_date(raw_date)
            .ok_or_else(|| precondition(record, "order date is not parseable"))?;

        let region = record
            .region
            .as_deref()
            .ok_or_else(|| precondition(record, "region is missing"))?;

        let quantity = record
            .quantity
            .ok_or_else(|| precondition(record, "quantity is missing"))?;
        if quantity <= 0 {
            return Err(precondition(record, "quantity is not positive"));
        }

        let revenue = record
            .revenue
            .ok_or_else(|| precondition(record, "revenue is missing"))?;
        if revenue < 0.0 {
            return Err(precondition(record, "revenue is negative"));
        }

        Ok(TransformedRecord {
            order_id: record.order_id.clone(),
            order_date,
            region: title_case(region),
            product: record.product.clone(),
            quantity,
            revenue,
            revenue_per_unit: round2(revenue / quantity as f64),
        })
    }
}

impl Default for Transformer {
    fn default() -> Self {
        Self::new()
    }
}

fn precondition(record: &SalesRecord, reason: &str) -> PipelineError {
    PipelineError::TransformPrecondition {
        order_id: record.order_id.clone(),
        reason: reason.to_string(),
    }
}

/// Title-case every word: "north" -> "North", "new delhi" -> "New Delhi"
fn title_case(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// TESTS
// ============================================================================
