use thiserror::Error;

/// Error taxonomy for the pipeline core.
///
/// Per-record data problems are never errors - they travel through the
/// exception path as values. These variants cover the failures that abort
/// or degrade a run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Schema validation failed: missing columns {missing:?}")]
    Schema { missing: Vec<String> },

    #[error("Ingestion failed: {0}")]
    Ingest(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A record that should have been rejected reached the transformer.
    /// Signals a defect in the validation stage, not a data-quality issue.
    #[error("Transform precondition violated for order '{order_id}': {reason}")]
    TransformPrecondition { order_id: String, reason: String },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
