//! Build outcome and compiler diagnostic types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One `<path>:<line>:<column>: error: <message>` diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildError {
    pub file_path: String,
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}",
            self.file_path, self.line, self.column, self.message
        )
    }
}

/// Result of a single build invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOutcome {
    /// Whether the build command exited with code 0.
    pub success: bool,

    /// Parsed diagnostics, in order of appearance, capped.
    pub errors: Vec<BuildError>,

    /// Leading slice of the raw log; populated on failure.
    pub raw_log_excerpt: String,

    /// Process exit code (-1 when the process never ran).
    pub exit_code: i32,

    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl BuildOutcome {
    pub fn succeeded(exit_code: i32, duration_ms: u64) -> Self {
        Self {
            success: true,
            errors: Vec::new(),
            raw_log_excerpt: String::new(),
            exit_code,
            duration_ms,
        }
    }

    pub fn failed(
        errors: Vec<BuildError>,
        raw_log_excerpt: String,
        exit_code: i32,
        duration_ms: u64,
    ) -> Self {
        Self {
            success: false,
            errors,
            raw_log_excerpt,
            exit_code,
            duration_ms,
        }
    }

    /// True when the build failed but no diagnostic matched the grammar.
    pub fn is_unrecognized_failure(&self) -> bool {
        !self.success && self.errors.is_empty()
    }
}
