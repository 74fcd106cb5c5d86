//! Compliance -> build -> simulation orchestration.

use crate::build::BuildRunner;
use crate::scanner::PatternScanner;
use crate::simulation::SimulationRunner;
use flightsquad_core::obs::{
    emit_stage_failed, emit_verification_finished, emit_verification_started, verify_span,
};
use flightsquad_core::{CommandRunner, Result, SquadConfig, VerificationVerdict, METRICS};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, Instrument};
use uuid::Uuid;

/// Verifies one candidate source file, stopping at the first failing stage.
pub struct VerificationPipeline {
    scanner: PatternScanner,
    build: BuildRunner,
    simulation: SimulationRunner,
}

impl VerificationPipeline {
    pub fn new(scanner: PatternScanner, build: BuildRunner, simulation: SimulationRunner) -> Self {
        Self {
            scanner,
            build,
            simulation,
        }
    }

    /// Wire every stage from configuration onto a shared runner.
    pub fn from_config(config: &SquadConfig, runner: Arc<dyn CommandRunner>) -> Result<Self> {
        let scanner = PatternScanner::new()?.with_custom_rules(&config.scanner.extra_rules)?;
        let build = BuildRunner::new(runner.clone(), config.build.clone())?;
        let simulation = SimulationRunner::new(runner, config.simulation.clone());
        Ok(Self::new(scanner, build, simulation))
    }

    pub fn scanner(&self) -> &PatternScanner {
        &self.scanner
    }

    /// Verify candidate source text against `target`.
    ///
    /// Build is never invoked when the scan reports violations, and simulation
    /// is never invoked when the build fails.
    pub async fn verify(&self, candidate: &str, target: &str) -> VerificationVerdict {
        let run_id = Uuid::new_v4();
        let id = run_id.to_string();

        async {
            let start = Instant::now();
            emit_verification_started(&id, target);

            let verdict = self.run_stages(run_id, candidate, target, start).await;

            if !verdict.passed() {
                emit_stage_failed(&id, verdict.stage(), verdict.reason_count());
            }
            emit_verification_finished(&id, verdict.stage(), verdict.passed(), verdict.duration_ms());
            METRICS.record_verification(verdict.passed());
            verdict
        }
        .instrument(verify_span(&id))
        .await
    }

    /// Read a candidate file and verify it.
    pub async fn verify_file(
        &self,
        path: impl AsRef<Path>,
        target: &str,
    ) -> Result<VerificationVerdict> {
        let candidate = tokio::fs::read_to_string(path.as_ref()).await?;
        Ok(self.verify(&candidate, target).await)
    }

    async fn run_stages(
        &self,
        run_id: Uuid,
        candidate: &str,
        target: &str,
        start: Instant,
    ) -> VerificationVerdict {
        let elapsed = || start.elapsed().as_millis() as u64;

        let violations = self.scanner.scan(candidate);
        if !violations.is_empty() {
            return VerificationVerdict::compliance_failed(run_id, violations, elapsed());
        }
        info!("compliance scan clean");

        let build = self.build.build(target).await;
        if !build.success {
            return VerificationVerdict::build_failed(run_id, build, elapsed());
        }
        info!(duration_ms = build.duration_ms, "firmware build succeeded");

        let simulation = self.simulation.run_simulation().await;
        if !simulation.success {
            return VerificationVerdict::simulation_failed(run_id, simulation.summary, elapsed());
        }

        VerificationVerdict::all_passed(run_id, simulation.summary, elapsed())
    }
}
