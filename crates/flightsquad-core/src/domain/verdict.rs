//! Verification verdict produced once per pipeline run.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::build::{BuildError, BuildOutcome};
use super::compliance::ComplianceViolation;

/// Pipeline stage at which a verdict was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStage {
    Compliance,
    Build,
    Simulation,
    /// Every stage passed.
    All,
}

impl VerificationStage {
    pub fn name(&self) -> &'static str {
        match self {
            VerificationStage::Compliance => "COMPLIANCE",
            VerificationStage::Build => "BUILD",
            VerificationStage::Simulation => "SIMULATION",
            VerificationStage::All => "ALL",
        }
    }
}

impl fmt::Display for VerificationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pass/fail outcome of one verification run, with itemized reasons.
///
/// Only the stage constructors create verdicts, so fields of stages that
/// never ran are always empty and `passed` holds exactly when the stage is
/// [`VerificationStage::All`]. Serialize-only for the same reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationVerdict {
    run_id: Uuid,
    passed: bool,
    stage: VerificationStage,
    violations: Vec<ComplianceViolation>,
    build_errors: Vec<BuildError>,
    build_log_excerpt: String,
    simulation_summary: String,
    duration_ms: u64,
}

impl VerificationVerdict {
    /// Compliance scan found violations; nothing else ran.
    pub fn compliance_failed(
        run_id: Uuid,
        violations: Vec<ComplianceViolation>,
        duration_ms: u64,
    ) -> Self {
        Self {
            run_id,
            passed: false,
            stage: VerificationStage::Compliance,
            violations,
            build_errors: Vec::new(),
            build_log_excerpt: String::new(),
            simulation_summary: String::new(),
            duration_ms,
        }
    }

    /// Build failed; simulation never ran.
    pub fn build_failed(run_id: Uuid, outcome: BuildOutcome, duration_ms: u64) -> Self {
        Self {
            run_id,
            passed: false,
            stage: VerificationStage::Build,
            violations: Vec::new(),
            build_errors: outcome.errors,
            build_log_excerpt: outcome.raw_log_excerpt,
            simulation_summary: String::new(),
            duration_ms,
        }
    }

    /// Simulation reported instability or failed to run.
    pub fn simulation_failed(run_id: Uuid, summary: String, duration_ms: u64) -> Self {
        Self {
            run_id,
            passed: false,
            stage: VerificationStage::Simulation,
            violations: Vec::new(),
            build_errors: Vec::new(),
            build_log_excerpt: String::new(),
            simulation_summary: summary,
            duration_ms,
        }
    }

    /// All stages passed.
    pub fn all_passed(run_id: Uuid, simulation_summary: String, duration_ms: u64) -> Self {
        Self {
            run_id,
            passed: true,
            stage: VerificationStage::All,
            violations: Vec::new(),
            build_errors: Vec::new(),
            build_log_excerpt: String::new(),
            simulation_summary,
            duration_ms,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn stage(&self) -> VerificationStage {
        self.stage
    }

    pub fn violations(&self) -> &[ComplianceViolation] {
        &self.violations
    }

    pub fn build_errors(&self) -> &[BuildError] {
        &self.build_errors
    }

    pub fn build_log_excerpt(&self) -> &str {
        &self.build_log_excerpt
    }

    pub fn simulation_summary(&self) -> &str {
        &self.simulation_summary
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// Number of itemized reasons carried by a failing verdict.
    pub fn reason_count(&self) -> usize {
        match self.stage {
            VerificationStage::Compliance => self.violations.len(),
            VerificationStage::Build => self.build_errors.len().max(1),
            VerificationStage::Simulation => 1,
            VerificationStage::All => 0,
        }
    }
}
