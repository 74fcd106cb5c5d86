//! flightsquad core library
//!
//! Domain types, configuration, the command-runner seam and the knowledge
//! harvester shared by the verification pipeline and the CLI.

pub mod config;
pub mod domain;
pub mod harvest;
pub mod metrics;
pub mod obs;
pub mod reporting;
pub mod runner;
pub mod telemetry;

pub use config::{
    BuildConfig, CustomRuleConfig, HarvestConfig, ScannerConfig, SimulationConfig, SimulationStep,
    SquadConfig, ToolsConfig, DEFAULT_CONFIG_FILE, DEFAULT_SITL_RUN_SECS, SITL_BINARY,
};

pub use domain::{
    BuildError, BuildOutcome, ComplianceViolation, Result, RuleId, SimulationOutcome, SquadError,
    TrainingRecord, VerificationStage, VerificationVerdict,
};

pub use harvest::{
    review_records, ApprovalOutcome, HarvestError, HarvestResult, JsonlRecordLog,
    KnowledgeHarvester, MemoryRecordLog, RecordIndex, RecordLog, ReviewSummary,
};

pub use runner::{CommandOutput, CommandRunner, CommandSpec, CommandTemplate, TARGET_PLACEHOLDER};

pub use metrics::METRICS;
pub use obs::{
    emit_approval_failed, emit_harvest_failed, emit_record_approved, emit_record_harvested,
    emit_stage_failed, emit_verification_finished, emit_verification_started, verify_span,
};
pub use reporting::{render_record, render_verdict, truncate_chars};
pub use telemetry::init_tracing;

/// flightsquad version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
