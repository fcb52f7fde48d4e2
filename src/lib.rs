// Sales Pipeline - batch ETL core for retail sales data
// Exposes all modules for use in the CLI and tests

pub mod aggregate;
pub mod audit;
pub mod dedup;
pub mod error;
pub mod exceptions;
pub mod generate;
pub mod ingest;
pub mod logging;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod store;
pub mod transform;
pub mod validator;

// Re-export commonly used types
pub use aggregate::Aggregator;
pub use audit::{AuditEvent, AuditLogger};
pub use dedup::{DedupOutcome, DuplicateResolver};
pub use error::{PipelineError, Result};
pub use exceptions::{ErrorCategory, ExceptionCategorizer, ExceptionRecord};
pub use generate::DataGenerator;
pub use ingest::read_csv;
pub use pipeline::{RunStatus, RunSummary, SalesPipeline, Stage};
pub use record::{
    AggregateSummary, RawBatch, SalesRecord, TransformedRecord, REFERENCE_PRODUCTS, REGIONS,
};
pub use report::{RuleBreakdown, RunReport};
pub use store::{RunStore, SqliteStore, StoredOutcome};
pub use transform::Transformer;
pub use validator::{
    RecordValidator, RejectedRecord, Rule, RuleViolation, ValidationOutcome, ValidationStatus,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
