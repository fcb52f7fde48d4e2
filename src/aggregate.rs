// 📊 Aggregator - fixed-shape analytics snapshot per run
// Grand total, every region, every reference product (zero-filled when
// absent), then one row per order date present. Downstream reporting never
// has to special-case a missing dimension.

use crate::record::{
    product_matches, AggregateSummary, TransformedRecord, REFERENCE_PRODUCTS, REGIONS,
};
use chrono::{NaiveDate, Utc};
use std::collections::BTreeMap;

pub struct Aggregator;

impl Aggregator {
    pub fn new() -> Self {
        Aggregator
    }

    /// Build the multi-grain summary set for one run.
    ///
    /// Output order is deterministic: grand total, the five regions, the
    /// five reference products, then dates ascending.
    pub fn aggregate(&self, records: &[TransformedRecord]) -> Vec<AggregateSummary> {
        let run_date = Utc::now().date_naive();
        let mut summaries = Vec::new();

        // Grand total
        summaries.push(AggregateSummary {
            region: "ALL".to_string(),
            product: "ALL".to_string(),
            calculation_date: run_date,
            total_revenue: records.iter().map(|r| r.revenue).sum(),
            total_orders: records.len() as i64,
        });

        // One row per region, zero-filled when nothing matched
        for region in REGIONS {
            let (revenue, orders) = fold(records.iter().filter(|r| r.region == region));
            summaries.push(AggregateSummary {
                region: region.to_string(),
                product: "ALL".to_string(),
                calculation_date: run_date,
                total_revenue: revenue,
                total_orders: orders,
            });
        }

        // One row per reference product, zero-filled when nothing matched
        for product in REFERENCE_PRODUCTS {
            let (revenue, orders) =
                fold(records.iter().filter(|r| product_matches(product, &r.product)));
            summaries.push(AggregateSummary {
                region: "ALL".to_string(),
                product: product.to_string(),
                calculation_date: run_date,
                total_revenue: revenue,
                total_orders: orders,
            });
        }

        // One row per distinct order date present, ascending
        let mut by_date: BTreeMap<NaiveDate, (f64, i64)> = BTreeMap::new();
        for record in records {
            let entry = by_date.entry(record.order_date).or_insert((0.0, 0));
            entry.0 += record.revenue;
            entry.1 += 1;
        }
        for (date, (revenue, orders)) in by_date {
            summaries.push(AggregateSummary {
                region: "ALL".to_string(),
                product: "ALL".to_string(),
                calculation_date: date,
                total_revenue: revenue,
                total_orders: orders,
            });
        }

        summaries
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

fn fold<'a>(records: impl Iterator<Item = &'a TransformedRecord>) -> (f64, i64) {
    let mut revenue = 0.0;
    let mut orders = 0;
    for record in records {
        revenue += record.revenue;
        orders += 1;
    }
    (revenue, orders)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn create_transformed(
        order_id: &str,
        date: &str,
        region: &str,
        product: &str,
        revenue: f64,
    ) -> TransformedRecord {
        TransformedRecord {
            order_id: order_id.to_string(),
            order_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            region: region.to_string(),
            product: product.to_string(),
            quantity: 1,
            revenue,
            revenue_per_unit: revenue,
        }
    }

    #[test]
    fn test_zero_fill_regions_for_north_only_batch() {
        let aggregator = Aggregator::new();
        let records = vec![
            create_transformed("A", "2025-03-01", "North", "Paneer 200g", 100.0),
            create_transformed("B", "2025-03-01", "North", "Paneer 200g", 50.0),
        ];

        let summaries = aggregator.aggregate(&records);

        let north = summaries
            .iter()
            .find(|s| s.region == "North")
            .expect("North row must exist");
        assert_eq!(north.total_revenue, 150.0);
        assert_eq!(north.total_orders, 2);

        // Every other region still gets a row, at zero
        for region in ["South", "East", "West", "Central"] {
            let row = summaries
                .iter()
                .find(|s| s.region == region)
                .unwrap_or_else(|| panic!("{} row must exist", region));
            assert_eq!(row.total_revenue, 0.0);
            assert_eq!(row.total_orders, 0);
        }
    }

    #[test]
    fn test_grand_total_row_comes_first() {
        let aggregator = Aggregator::new();
        let records = vec![create_transformed(
            "A",
            "2025-03-01",
            "East",
            "Potato Chips 50g",
            75.5,
        )];

        let summaries = aggregator.aggregate(&records);

        assert_eq!(summaries[0].region, "ALL");
        assert_eq!(summaries[0].product, "ALL");
        assert_eq!(summaries[0].total_revenue, 75.5);
        assert_eq!(summaries[0].total_orders, 1);
    }

    #[test]
    fn test_product_rows_use_first_word_matching() {
        let aggregator = Aggregator::new();
        let records = vec![
            // Variant packaging still counts toward the reference product
            create_transformed("A", "2025-03-01", "West", "Tomato Ketchup 1kg", 30.0),
            create_transformed("B", "2025-03-01", "West", "Tomato Ketchup 500g", 20.0),
        ];

        let summaries = aggregator.aggregate(&records);

        let ketchup = summaries
            .iter()
            .find(|s| s.product == "Tomato Ketchup 500g")
            .expect("reference product row must exist");
        assert_eq!(ketchup.total_revenue, 50.0);
        assert_eq!(ketchup.total_orders, 2);

        let paneer = summaries
            .iter()
            .find(|s| s.product == "Paneer 200g")
            .expect("zero-fill row must exist");
        assert_eq!(paneer.total_orders, 0);
    }

    #[test]
    fn test_daily_rows_ascending() {
        let aggregator = Aggregator::new();
        let records = vec![
            create_transformed("A", "2025-03-02", "North", "Paneer 200g", 10.0),
            create_transformed("B", "2025-03-01", "South", "Paneer 200g", 20.0),
            create_transformed("C", "2025-03-02", "East", "Paneer 200g", 30.0),
        ];

        let summaries = aggregator.aggregate(&records);

        // 1 grand total + 5 regions + 5 products + 2 dates
        assert_eq!(summaries.len(), 13);

        let daily: Vec<&AggregateSummary> = summaries[11..].iter().collect();
        assert_eq!(
            daily[0].calculation_date,
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
        );
        assert_eq!(daily[0].total_revenue, 20.0);
        assert_eq!(
            daily[1].calculation_date,
            NaiveDate::from_ymd_opt(2025, 3, 2).unwrap()
        );
        assert_eq!(daily[1].total_revenue, 40.0);
        assert_eq!(daily[1].total_orders, 2);
    }

    #[test]
    fn test_empty_input_still_materializes_dimensions() {
        let aggregator = Aggregator::new();

        let summaries = aggregator.aggregate(&[]);

        // Grand total + 5 regions + 5 products, no daily rows
        assert_eq!(summaries.len(), 11);
        assert!(summaries
            .iter()
            .all(|s| s.total_revenue == 0.0 && s.total_orders == 0));
    }
}
