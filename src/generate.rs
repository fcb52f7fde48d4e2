// 🎲 Data Generator - synthetic sales CSVs with planted quality issues
// Defect rates mirror what the pipeline is built to catch: missing and
// sentinel dates, duplicate order ids, negative quantities and revenue,
// missing regions. Seeded, so fixtures are reproducible.

use crate::error::Result;
use crate::record::{round2, INVALID_DATE_SENTINEL, REGIONS};
use chrono::{Duration, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;
use tracing::info;

/// Full product catalog the generator draws from (a superset of the
/// reference products the aggregator reports on)
const CATALOG: [&str; 16] = [
    "Tomato Ketchup 500g",
    "Chili Sauce 250g",
    "Soy Sauce 200ml",
    "Chicken Biryani Ready Meal",
    "Paneer Curry Ready Meal",
    "Dal Tadka Ready Meal",
    "Paneer 200g",
    "Milk 1L",
    "Yogurt 500g",
    "Cheese Spread 100g",
    "Potato Chips 50g",
    "Namkeen Mix 100g",
    "Biscuits 200g",
    "Mango Juice 1L",
    "Cola 500ml",
    "Water Bottle 1L",
];

pub struct DataGenerator {
    rows: usize,
    seed: u64,
    start_date: NaiveDate,
}

impl DataGenerator {
    pub fn new(rows: usize, seed: u64) -> Self {
        DataGenerator {
            rows,
            seed,
            start_date: Utc::now().date_naive() - Duration::days(365),
        }
    }

    /// Pin the 365-day sales window (fixtures want byte-identical output)
    pub fn with_start_date(mut self, start_date: NaiveDate) -> Self {
        self.start_date = start_date;
        self
    }

    /// Write the synthetic batch to a CSV file. Returns the row count.
    pub fn write_csv(&self, path: &Path) -> Result<usize> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut writer = csv::Writer::from_path(path)?;

        writer.write_record([
            "order_id",
            "order_date",
            "region",
            "product",
            "quantity",
            "revenue",
        ])?;

        for i in 0..self.rows {
            let date = self.start_date + Duration::days(rng.gen_range(0..=365));
            let seconds = rng.gen_range(0..86_400);
            let mut order_date = format!(
                "{} {:02}:{:02}:{:02}",
                date.format("%Y-%m-%d"),
                seconds / 3600,
                (seconds % 3600) / 60,
                seconds % 60
            );
            if rng.gen::<f64>() < 0.05 {
                // 5% missing dates
                order_date = String::new();
            } else if rng.gen::<f64>() < 0.03 {
                // 3% unparseable sentinel
                order_date = INVALID_DATE_SENTINEL.to_string();
            }

            let mut order_id = format!("ORD{:06}", i + 1);
            if i > 0 && rng.gen::<f64>() < 0.02 {
                // 2% duplicate order ids, drawn from earlier rows
                order_id = format!("ORD{:06}", rng.gen_range(1..=i));
            }

            let mut quantity: i64 = rng.gen_range(1..=50);
            if rng.gen::<f64>() < 0.01 {
                // 1% negative quantities
                quantity = -rng.gen_range(1..=10);
            }

            let unit_price = round2(rng.gen_range(10.0..500.0));
            let mut revenue = round2(quantity as f64 * unit_price);
            if rng.gen::<f64>() < 0.015 {
                // 1.5% negative revenue
                revenue = -revenue.abs();
            }

            let region = if rng.gen::<f64>() < 0.02 {
                // 2% missing regions
                ""
            } else {
                REGIONS[rng.gen_range(0..REGIONS.len())]
            };

            let product = CATALOG[rng.gen_range(0..CATALOG.len())];

            writer.write_record([
                order_id.as_str(),
                order_date.as_str(),
                region,
                product,
                &quantity.to_string(),
                &format!("{:.2}", revenue),
            ])?;
        }

        writer.flush()?;
        info!(
            "Generated {} sales records with planted quality issues at {}",
            self.rows,
            path.display()
        );

        Ok(self.rows)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_same_seed_same_bytes() {
        let dir = tempdir().unwrap();
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let path_a = dir.path().join("a.csv");
        let path_b = dir.path().join("b.csv");

        DataGenerator::new(200, 42)
            .with_start_date(start)
            .write_csv(&path_a)
            .unwrap();
        DataGenerator::new(200, 42)
            .with_start_date(start)
            .write_csv(&path_b)
            .unwrap();

        assert_eq!(fs::read(&path_a).unwrap(), fs::read(&path_b).unwrap());

        let different = dir.path().join("c.csv");
        DataGenerator::new(200, 43)
            .with_start_date(start)
            .write_csv(&different)
            .unwrap();
        assert_ne!(fs::read(&path_a).unwrap(), fs::read(&different).unwrap());
    }

    #[test]
    fn test_generated_batch_carries_every_defect_class() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sales.csv");
        DataGenerator::new(2000, 7)
            .with_start_date(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
            .write_csv(&path)
            .unwrap();

        let batch = ingest::read_csv(&path).unwrap();
        assert_eq!(batch.records.len(), 2000);

        assert!(batch.records.iter().any(|r| r.order_date.is_none()));
        assert!(batch
            .records
            .iter()
            .any(|r| r.order_date.as_deref() == Some(INVALID_DATE_SENTINEL)));
        assert!(batch.records.iter().any(|r| r.region.is_none()));
        assert!(batch.records.iter().any(|r| r.quantity.unwrap_or(1) < 0));
        assert!(batch.records.iter().any(|r| r.revenue.unwrap_or(0.0) < 0.0));

        let mut ids: Vec<&str> = batch.records.iter().map(|r| r.order_id.as_str()).collect();
        let before = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert!(ids.len() < before, "expected duplicated order ids");
    }

    #[test]
    fn test_clean_majority_survives_the_pipeline() {
        use crate::pipeline::{RunStatus, SalesPipeline};
        use crate::store::SqliteStore;

        let dir = tempdir().unwrap();
        let path = dir.path().join("sales.csv");
        DataGenerator::new(500, 11)
            .with_start_date(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
            .write_csv(&path)
            .unwrap();

        let store = SqliteStore::open_in_memory().unwrap();
        let summary = SalesPipeline::with_run_id(&store, "gen01").run_from_csv(&path);

        assert_eq!(summary.status, RunStatus::Success);
        assert_eq!(summary.total_records, 500);
        // Defect rates are low; most of the batch must come through clean
        assert!(summary.clean_records > 350);
        assert_eq!(
            summary.clean_records + summary.invalid_records + summary.duplicate_records,
            500
        );
    }
}
