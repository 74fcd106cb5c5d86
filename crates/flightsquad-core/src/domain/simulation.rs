//! SITL simulation outcome.

use serde::{Deserialize, Serialize};

/// Pass/fail result of a software-in-the-loop run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    pub success: bool,

    /// Human-readable explanation of the result.
    pub summary: String,
}

impl SimulationOutcome {
    pub fn passed(summary: impl Into<String>) -> Self {
        Self {
            success: true,
            summary: summary.into(),
        }
    }

    pub fn failed(summary: impl Into<String>) -> Self {
        Self {
            success: false,
            summary: summary.into(),
        }
    }
}
