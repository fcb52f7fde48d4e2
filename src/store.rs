// 💾 Run Store - persistence boundary for every run-scoped artifact
// Append-only tables accumulate history across runs; replace-semantics
// tables are rewritten delete-then-insert so a re-run of the same run id
// lands on identical rows

use crate::audit::AuditEvent;
use crate::error::Result;
use crate::exceptions::{ErrorCategory, ExceptionRecord};
use crate::record::{AggregateSummary, RawBatch, TransformedRecord};
use crate::validator::{ValidationOutcome, ValidationStatus};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};
use std::path::Path;

/// One flattened validation row as persisted: failed outcomes produce one
/// row per violation, passed outcomes a single PASSED row.
#[derive(Debug, Clone)]
pub struct StoredOutcome {
    pub record_id: i64,
    pub stage: String,
    pub control_type: String,
    pub status: String,
    pub reason: Option<String>,
}

/// Persistence contract for one pipeline run. Every row is tagged with its
/// run id, so logically concurrent runs never read each other's data.
pub trait RunStore {
    // Append-only tables
    fn append_raw(&self, run_id: &str, batch: &RawBatch) -> Result<()>;
    fn append_outcomes(&self, run_id: &str, outcomes: &[ValidationOutcome]) -> Result<()>;
    fn append_exceptions(&self, run_id: &str, exceptions: &[ExceptionRecord]) -> Result<()>;
    fn append_audit(&self, event: &AuditEvent) -> Result<()>;

    // Replace-semantics tables (delete-by-run, then append)
    fn replace_clean(&self, run_id: &str, records: &[TransformedRecord]) -> Result<()>;
    fn replace_summaries(&self, run_id: &str, summaries: &[AggregateSummary]) -> Result<()>;

    // Run-scoped readers (dashboard feed)
    fn clean_records(&self, run_id: &str) -> Result<Vec<TransformedRecord>>;
    fn summaries(&self, run_id: &str) -> Result<Vec<AggregateSummary>>;
    fn exceptions(&self, run_id: &str) -> Result<Vec<ExceptionRecord>>;
    fn outcomes(&self, run_id: &str) -> Result<Vec<StoredOutcome>>;
    fn audit_events(&self, run_id: &str) -> Result<Vec<AuditEvent>>;

    /// Run ids in first-seen order (last entry is the latest run)
    fn list_runs(&self) -> Result<Vec<String>>;
}

// ============================================================================
// SQLITE IMPLEMENTATION
// ============================================================================

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        setup_schema(&conn)?;
        Ok(SqliteStore { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        setup_schema(&conn)?;
        Ok(SqliteStore { conn })
    }
}

fn setup_schema(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS raw_sales (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id TEXT NOT NULL,
            ingestion_timestamp TEXT NOT NULL,
            source_name TEXT NOT NULL,
            record_id INTEGER NOT NULL,
            order_id TEXT,
            order_date TEXT,
            region TEXT,
            product TEXT,
            quantity INTEGER,
            revenue REAL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS validation_results (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id TEXT NOT NULL,
            record_id INTEGER NOT NULL,
            validation_stage TEXT NOT NULL,
            control_type TEXT NOT NULL,
            status TEXT NOT NULL,
            failure_reason TEXT,
            timestamp TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS clean_sales (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id TEXT NOT NULL,
            order_id TEXT NOT NULL,
            order_date TEXT NOT NULL,
            region TEXT NOT NULL,
            product TEXT NOT NULL,
            quantity INTEGER NOT NULL,
            revenue REAL NOT NULL,
            revenue_per_unit REAL NOT NULL,
            processed_timestamp TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS exceptions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id TEXT NOT NULL,
            original_record_id INTEGER NOT NULL,
            error_category TEXT NOT NULL,
            pipeline_stage TEXT NOT NULL,
            error_details TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            raw_data TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS audit_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id TEXT NOT NULL,
            event_type TEXT NOT NULL,
            event_description TEXT NOT NULL,
            record_count INTEGER NOT NULL,
            timestamp TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS analytics_summary (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id TEXT NOT NULL,
            region TEXT NOT NULL,
            product TEXT NOT NULL,
            calculation_date TEXT NOT NULL,
            total_revenue REAL NOT NULL,
            total_orders INTEGER NOT NULL,
            created_timestamp TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_validation_run ON validation_results(run_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_clean_run ON clean_sales(run_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_exceptions_run ON exceptions(run_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_audit_run ON audit_log(run_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_summary_run ON analytics_summary(run_id)",
        [],
    )?;

    Ok(())
}

impl RunStore for SqliteStore {
    fn append_raw(&self, run_id: &str, batch: &RawBatch) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let mut stmt = self.conn.prepare(
            "INSERT INTO raw_sales (
                run_id, ingestion_timestamp, source_name, record_id,
                order_id, order_date, region, product, quantity, revenue
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )?;

        for record in &batch.records {
            stmt.execute(params![
                run_id,
                now,
                batch.source,
                record.row as i64,
                record.order_id,
                record.order_date,
                record.region,
                record.product,
                record.quantity,
                record.revenue,
            ])?;
        }

        Ok(())
    }

    fn append_outcomes(&self, run_id: &str, outcomes: &[ValidationOutcome]) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let mut stmt = self.conn.prepare(
            "INSERT INTO validation_results (
                run_id, record_id, validation_stage, control_type,
                status, failure_reason, timestamp
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;

        for outcome in outcomes {
            match outcome.status {
                ValidationStatus::Passed => {
                    stmt.execute(params![
                        run_id,
                        outcome.row as i64,
                        "RECORD_VALIDATION",
                        "PASSED",
                        ValidationStatus::Passed.as_str(),
                        Option::<String>::None,
                        now,
                    ])?;
                }
                ValidationStatus::Failed => {
                    for violation in &outcome.violations {
                        stmt.execute(params![
                            run_id,
                            outcome.row as i64,
                            violation.rule.stage(),
                            violation.rule.name(),
                            ValidationStatus::Failed.as_str(),
                            Some(violation.reason.as_str()),
                            now,
                        ])?;
                    }
                }
            }
        }

        Ok(())
    }

    fn append_exceptions(&self, run_id: &str, exceptions: &[ExceptionRecord]) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let mut stmt = self.conn.prepare(
            "INSERT INTO exceptions (
                run_id, original_record_id, error_category, pipeline_stage,
                error_details, timestamp, raw_data
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;

        for exception in exceptions {
            stmt.execute(params![
                run_id,
                exception.row as i64,
                exception.category.as_str(),
                exception.stage,
                exception.details,
                now,
                serde_json::to_string(&exception.raw_data)?,
            ])?;
        }

        Ok(())
    }

    fn append_audit(&self, event: &AuditEvent) -> Result<()> {
        self.conn.execute(
            "INSERT INTO audit_log (
                run_id, event_type, event_description, record_count, timestamp
            ) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                event.run_id,
                event.event_type,
                event.description,
                event.record_count,
                event.timestamp.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    fn replace_clean(&self, run_id: &str, records: &[TransformedRecord]) -> Result<()> {
        self.conn.execute(
            "DELETE FROM clean_sales WHERE run_id = ?1",
            params![run_id],
        )?;

        let now = Utc::now().to_rfc3339();
        let mut stmt = self.conn.prepare(
            "INSERT INTO clean_sales (
                run_id, order_id, order_date, region, product,
                quantity, revenue, revenue_per_unit, processed_timestamp
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;

        for record in records {
            stmt.execute(params![
                run_id,
                record.order_id,
                record.order_date.format("%Y-%m-%d").to_string(),
                record.region,
                record.product,
                record.quantity,
                record.revenue,
                record.revenue_per_unit,
                now,
            ])?;
        }

        Ok(())
    }

    fn replace_summaries(&self, run_id: &str, summaries: &[AggregateSummary]) -> Result<()> {
        self.conn.execute(
            "DELETE FROM analytics_summary WHERE run_id = ?1",
            params![run_id],
        )?;

        let now = Utc::now().to_rfc3339();
        let mut stmt = self.conn.prepare(
            "INSERT INTO analytics_summary (
                run_id, region, product, calculation_date,
                total_revenue, total_orders, created_timestamp
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;

        for summary in summaries {
            stmt.execute(params![
                run_id,
                summary.region,
                summary.product,
                summary.calculation_date.format("%Y-%m-%d").to_string(),
                summary.total_revenue,
                summary.total_orders,
                now,
            ])?;
        }

        Ok(())
    }

    fn clean_records(&self, run_id: &str) -> Result<Vec<TransformedRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT order_id, order_date, region, product, quantity, revenue, revenue_per_unit
             FROM clean_sales WHERE run_id = ?1 ORDER BY id",
        )?;

        let records = stmt
            .query_map(params![run_id], |row| {
                let date_str: String = row.get(1)?;
                Ok(TransformedRecord {
                    order_id: row.get(0)?,
                    order_date: parse_stored_date(&date_str)?,
                    region: row.get(2)?,
                    product: row.get(3)?,
                    quantity: row.get(4)?,
                    revenue: row.get(5)?,
                    revenue_per_unit: row.get(6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn summaries(&self, run_id: &str) -> Result<Vec<AggregateSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT region, product, calculation_date, total_revenue, total_orders
             FROM analytics_summary WHERE run_id = ?1 ORDER BY id",
        )?;

        let summaries = stmt
            .query_map(params![run_id], |row| {
                let date_str: String = row.get(2)?;
                Ok(AggregateSummary {
                    region: row.get(0)?,
                    product: row.get(1)?,
                    calculation_date: parse_stored_date(&date_str)?,
                    total_revenue: row.get(3)?,
                    total_orders: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(summaries)
    }

    fn exceptions(&self, run_id: &str) -> Result<Vec<ExceptionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT original_record_id, error_category, pipeline_stage, error_details, raw_data
             FROM exceptions WHERE run_id = ?1 ORDER BY id",
        )?;

        let exceptions = stmt
            .query_map(params![run_id], |row| {
                let record_id: i64 = row.get(0)?;
                let category_str: String = row.get(1)?;
                let raw_json: String = row.get(4)?;
                let raw_data: serde_json::Value =
                    serde_json::from_str(&raw_json).map_err(|_| rusqlite::Error::InvalidQuery)?;

                Ok(ExceptionRecord {
                    row: record_id as usize,
                    order_id: raw_data
                        .get("order_id")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string(),
                    category: ErrorCategory::parse(&category_str)
                        .ok_or(rusqlite::Error::InvalidQuery)?,
                    stage: row.get(2)?,
                    details: row.get(3)?,
                    raw_data,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(exceptions)
    }

    fn outcomes(&self, run_id: &str) -> Result<Vec<StoredOutcome>> {
        let mut stmt = self.conn.prepare(
            "SELECT record_id, validation_stage, control_type, status, failure_reason
             FROM validation_results WHERE run_id = ?1 ORDER BY id",
        )?;

        let outcomes = stmt
            .query_map(params![run_id], |row| {
                Ok(StoredOutcome {
                    record_id: row.get(0)?,
                    stage: row.get(1)?,
                    control_type: row.get(2)?,
                    status: row.get(3)?,
                    reason: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(outcomes)
    }

    fn audit_events(&self, run_id: &str) -> Result<Vec<AuditEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT run_id, event_type, event_description, record_count, timestamp
             FROM audit_log WHERE run_id = ?1 ORDER BY id",
        )?;

        let events = stmt
            .query_map(params![run_id], |row| {
                let timestamp_str: String = row.get(4)?;
                Ok(AuditEvent {
                    run_id: row.get(0)?,
                    event_type: row.get(1)?,
                    description: row.get(2)?,
                    record_count: row.get(3)?,
                    timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
                        .map_err(|_| rusqlite::Error::InvalidQuery)?
                        .with_timezone(&Utc),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(events)
    }

    fn list_runs(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT run_id FROM audit_log GROUP BY run_id ORDER BY MIN(id)",
        )?;

        let runs = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        Ok(runs)
    }
}

fn parse_stored_date(raw: &str) -> std::result::Result<NaiveDate, rusqlite::Error> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| rusqlite::Error::InvalidQuery)
}

// ============================================================================
// TESTS
// ============================================================================
