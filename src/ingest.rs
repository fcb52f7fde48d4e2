// 📂 Ingestion - CSV source files into an in-memory RawBatch
// Reads leniently: per-record problems become absent fields for the
// validator to judge; only unreadable files and broken CSV framing fail here

use crate::error::Result;
use crate::record::{RawBatch, SalesRecord};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::info;

/// Read a source CSV into a batch. Captures the header row as-is (the
/// schema precondition runs later, in the validator, so a missing column
/// is a pipeline-stage failure rather than an I/O error) and records a
/// SHA-256 checksum of the file for the ingestion audit event.
pub fn read_csv(path: &Path) -> Result<RawBatch> {
    let bytes = fs::read(path)?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let checksum = format!("{:x}", hasher.finalize());

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes.as_slice());
    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let index: HashMap<&str, usize> = columns
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let line = result?;
        let field = |name: &str| -> Option<String> {
            index
                .get(name)
                .and_then(|&i| line.get(i))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        records.push(SalesRecord {
            row,
            order_id: field("order_id").unwrap_or_default(),
            order_date: field("order_date"),
            region: field("region"),
            product: field("product").unwrap_or_default(),
            quantity: field("quantity").and_then(|v| v.parse::<i64>().ok()),
            revenue: field("revenue").and_then(|v| v.parse::<f64>().ok()),
        });
    }

    info!(
        "Ingested {} records from {} (sha256 {})",
        records.len(),
        path.display(),
        &checksum[..12]
    );

    Ok(RawBatch {
        source: path.display().to_string(),
        checksum: Some(checksum),
        columns,
        records,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_read_csv_captures_headers_and_checksum() {
        let file = write_csv(
            "order_id,order_date,region,product,quantity,revenue\n\
             ORD000001,2025-03-01,North,Paneer 200g,5,100.0\n",
        );

        let batch = read_csv(file.path()).unwrap();

        assert_eq!(
            batch.columns,
            vec!["order_id", "order_date", "region", "product", "quantity", "revenue"]
        );
        assert_eq!(batch.checksum.as_ref().unwrap().len(), 64);
        assert_eq!(batch.records.len(), 1);

        let record = &batch.records[0];
        assert_eq!(record.row, 0);
        assert_eq!(record.order_id, "ORD000001");
        assert_eq!(record.quantity, Some(5));
        assert_eq!(record.revenue, Some(100.0));
    }

    #[test]
    fn test_blank_and_unparseable_fields_become_absent() {
        let file = write_csv(
            "order_id,order_date,region,product,quantity,revenue\n\
             ORD000001,,North,Paneer 200g,five,\n\
             ,invalid_date,,Milk 1L,-3,-45.5\n",
        );

        let batch = read_csv(file.path()).unwrap();

        let first = &batch.records[0];
        assert_eq!(first.order_date, None);
        assert_eq!(first.quantity, None);
        assert_eq!(first.revenue, None);

        // Bad values still land in the batch; the validator judges them
        let second = &batch.records[1];
        assert_eq!(second.order_id, "");
        assert_eq!(second.order_date.as_deref(), Some("invalid_date"));
        assert_eq!(second.region, None);
        assert_eq!(second.quantity, Some(-3));
        assert_eq!(second.revenue, Some(-45.5));
        assert_eq!(second.row, 1);
    }

    #[test]
    fn test_missing_column_does_not_fail_ingestion() {
        // No revenue column at all: ingestion succeeds, the schema check
        // downstream is what rejects the batch
        let file = write_csv(
            "order_id,order_date,region,product,quantity\n\
             ORD000001,2025-03-01,North,Paneer 200g,5\n",
        );

        let batch = read_csv(file.path()).unwrap();

        assert!(!batch.columns.contains(&"revenue".to_string()));
        assert_eq!(batch.records[0].revenue, None);
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let err = read_csv(Path::new("/nonexistent/sales.csv")).unwrap_err();
        assert!(matches!(err, crate::error::PipelineError::Io(_)));
    }
}
