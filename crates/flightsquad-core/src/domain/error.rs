//! Domain-level error taxonomy for flightsquad.
//!
//! Compliance, build and simulation failures are verdict data, not errors.
//! The variants here cover the machinery around them: reading candidate
//! files, loading configuration, and spawning external commands.

/// flightsquad domain errors.
#[derive(Debug, thiserror::Error)]
pub enum SquadError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid pattern for rule {rule}: {reason}")]
    InvalidPattern { rule: String, reason: String },

    #[error("invalid command: {0}")]
    InvalidCommand(String),

    #[error("command '{label}' failed to run: {reason}")]
    CommandFailed { label: String, reason: String },

    #[error("command '{label}' timed out after {timeout_secs} seconds")]
    Timeout { label: String, timeout_secs: u64 },
}

/// Result type for flightsquad domain operations.
pub type Result<T> = std::result::Result<T, SquadError>;
