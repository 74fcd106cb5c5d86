//! Structured observability hooks for verification and harvesting.
//!
//! - Run-scoped tracing span via [`verify_span`], attached with `Instrument`
//! - Emission functions for the verification lifecycle and the record log
//!
//! Filter with `RUST_LOG`; pass `--json` to the CLI for JSON lines.

use tracing::{info, warn};

use crate::domain::VerificationStage;

/// Span tagged with the verification run id.
///
/// Attach it to the verification future with `tracing::Instrument` rather
/// than entering it, so the future stays `Send`.
pub fn verify_span(run_id: &str) -> tracing::Span {
    tracing::info_span!("flightsquad.verify", run_id = %run_id)
}

/// Emit event: verification started for a build target.
pub fn emit_verification_started(run_id: &str, build_target: &str) {
    info!(event = "verify.started", run_id = %run_id, build_target = %build_target);
}

/// Emit event: a stage rejected the candidate.
pub fn emit_stage_failed(run_id: &str, stage: VerificationStage, reasons: usize) {
    warn!(
        event = "verify.stage_failed",
        run_id = %run_id,
        stage = %stage,
        reasons = reasons,
    );
}

/// Emit event: verification finished.
pub fn emit_verification_finished(
    run_id: &str,
    stage: VerificationStage,
    passed: bool,
    duration_ms: u64,
) {
    info!(
        event = "verify.finished",
        run_id = %run_id,
        stage = %stage,
        passed = passed,
        duration_ms = duration_ms,
    );
}

/// Emit event: a training record was appended.
pub fn emit_record_harvested(instruction: &str) {
    let preview: String = instruction.chars().take(50).collect();
    info!(event = "harvest.appended", instruction = %preview);
}

/// Emit event: harvesting failed and was swallowed.
pub fn emit_harvest_failed(error: &dyn std::fmt::Display) {
    warn!(event = "harvest.failed", error = %error);
}

/// Emit event: a record was marked human-approved.
pub fn emit_record_approved(index: usize, changed: bool) {
    info!(event = "harvest.approved", index = index, changed = changed);
}

/// Emit event: approval failed and was swallowed.
pub fn emit_approval_failed(error: &dyn std::fmt::Display) {
    warn!(event = "harvest.approval_failed", error = %error);
}
