//! Error types for the knowledge harvester.

use super::index::RecordIndex;

/// Errors produced while extracting, writing or reading training records.
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed record on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("no record at index {index} (log holds {len})")]
    RecordNotFound { index: RecordIndex, len: usize },

    #[error("invalid record index {0}: use -1 for the last record or a zero-based position")]
    InvalidIndex(i64),
}

/// Result type for harvester operations.
pub type HarvestResult<T> = std::result::Result<T, HarvestError>;
