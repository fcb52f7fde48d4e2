// 📦 Record Model - sales records as they move through the pipeline
// Raw records keep absence explicit; transformed records are fully resolved

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ============================================================================
// REFERENCE DATA (pipeline policy, closed sets)
// ============================================================================

/// Columns every source batch must carry
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "order_id",
    "order_date",
    "region",
    "product",
    "quantity",
    "revenue",
];

/// The five sales regions the business recognizes (case-sensitive membership)
pub const REGIONS: [&str; 5] = ["North", "South", "East", "West", "Central"];

/// Reference products reported in every analytics snapshot
pub const REFERENCE_PRODUCTS: [&str; 5] = [
    "Tomato Ketchup 500g",
    "Chicken Biryani Ready Meal",
    "Paneer 200g",
    "Potato Chips 50g",
    "Mango Juice 1L",
];

/// Literal that upstream systems emit when a date failed to serialize
pub const INVALID_DATE_SENTINEL: &str = "invalid_date";

// ============================================================================
// RAW RECORDS
// ============================================================================

/// One raw sales record as ingested. Absent or blank source fields become
/// `None`; the record is immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    /// 0-based position in the source batch (provenance, not data)
    #[serde(skip)]
    pub row: usize,
    pub order_id: String,
    pub order_date: Option<String>,
    pub region: Option<String>,
    pub product: String,
    pub quantity: Option<i64>,
    pub revenue: Option<f64>,
}

/// An ingested batch: the records plus enough provenance to audit where
/// they came from and which columns the source actually had.
#[derive(Debug, Clone)]
pub struct RawBatch {
    pub source: String,
    pub checksum: Option<String>,
    pub columns: Vec<String>,
    pub records: Vec<SalesRecord>,
}

impl RawBatch {
    /// Wrap already-built records as a batch with the full expected schema.
    pub fn from_records(records: Vec<SalesRecord>) -> Self {
        RawBatch {
            source: "inline".to_string(),
            checksum: None,
            columns: REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            records,
        }
    }
}

// ============================================================================
// TRANSFORMED RECORDS
// ============================================================================

/// A validated, deduplicated record after canonicalization. Every field is
/// resolved; nothing optional survives this far.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformedRecord {
    pub order_id: String,
    pub order_date: NaiveDate,
    pub region: String,
    pub product: String,
    pub quantity: i64,
    pub revenue: f64,
    pub revenue_per_unit: f64,
}

/// One analytics row at a single grain. `region`/`product` hold either a
/// concrete value or the literal "ALL"; date-grain rows carry the order date
/// as `calculation_date`, all others carry the run date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateSummary {
    pub region: String,
    pub product: String,
    pub calculation_date: NaiveDate,
    pub total_revenue: f64,
    pub total_orders: i64,
}

// ============================================================================
// SHARED HELPERS
// ============================================================================

/// Parse an order date. Accepts a timestamp with optional fractional
/// seconds, or a plain calendar date.
pub fn parse_order_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt.date());
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }

    None
}

/// A sale counts toward a reference product when its name contains the
/// reference's first word (e.g. "Paneer 500g Family Pack" matches "Paneer 200g").
pub fn product_matches(reference: &str, product: &str) -> bool {
    match reference.split_whitespace().next() {
        Some(first_word) => product.contains(first_word),
        None => false,
    }
}

/// Round to 2 decimal places (money columns)
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_order_date_formats() {
        // Timestamp with fractional seconds
        let parsed = parse_order_date("2025-03-01 14:23:45.123456").unwrap();
        assert_eq!(parsed, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());

        // Timestamp without fraction
        let parsed = parse_order_date("2025-03-01 14:23:45").unwrap();
        assert_eq!(parsed, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());

        // Plain date
        let parsed = parse_order_date("2025-03-01").unwrap();
        assert_eq!(parsed, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
    }

    #[test]
    fn test_parse_order_date_rejects_garbage() {
        assert!(parse_order_date("invalid_date").is_none());
        assert!(parse_order_date("03/01/2025").is_none());
        assert!(parse_order_date("2025-13-45").is_none());
        assert!(parse_order_date("").is_none());
    }

    #[test]
    fn test_product_matches_first_word() {
        assert!(product_matches("Tomato Ketchup 500g", "Tomato Ketchup 1kg"));
        assert!(product_matches("Paneer 200g", "Paneer 200g"));
        assert!(product_matches("Mango Juice 1L", "Fresh Mango Pulp"));
        assert!(!product_matches("Potato Chips 50g", "Banana Chips 50g"));
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(100.0 / 5.0), 20.00);
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(33.333333), 33.33);
    }

    #[test]
    fn test_sales_record_snapshot_omits_row() {
        let record = SalesRecord {
            row: 7,
            order_id: "ORD000001".to_string(),
            order_date: Some("2025-03-01".to_string()),
            region: Some("North".to_string()),
            product: "Paneer 200g".to_string(),
            quantity: Some(5),
            revenue: Some(100.0),
        };

        let snapshot = serde_json::to_value(&record).unwrap();
        assert!(snapshot.get("row").is_none());
        assert_eq!(snapshot["order_id"], "ORD000001");
        assert_eq!(snapshot["quantity"], 5);
    }
}
