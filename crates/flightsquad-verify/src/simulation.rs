//! Software-in-the-loop run treated as a pass/fail oracle.

use flightsquad_core::{CommandRunner, SimulationConfig, SimulationOutcome};
use std::sync::Arc;
use tracing::{info, warn};

/// Runner label for every simulation step.
pub const SIMULATION_LABEL: &str = "simulation";

/// Value substituted for `{target}` in simulation steps.
pub const SITL_TARGET: &str = "SITL";

/// Builds and runs the SITL binary, then checks its output for instability.
pub struct SimulationRunner {
    runner: Arc<dyn CommandRunner>,
    config: SimulationConfig,
}

impl SimulationRunner {
    pub fn new(runner: Arc<dyn CommandRunner>, config: SimulationConfig) -> Self {
        Self { runner, config }
    }

    /// Run each configured step in order and stop at the first failure.
    ///
    /// A step with `run_secs` is stopped when its window ends and that stop
    /// is a normal finish. When every step finishes cleanly, the combined
    /// output is searched for the configured failure markers.
    pub async fn run_simulation(&self) -> SimulationOutcome {
        if self.config.steps.is_empty() {
            return SimulationOutcome::failed("no simulation steps configured");
        }

        let mut output = String::new();
        for (i, step) in self.config.steps.iter().enumerate() {
            let n = i + 1;
            let spec = match step.command.render(SIMULATION_LABEL, SITL_TARGET) {
                Ok(spec) => spec
                    .with_work_dir(&self.config.work_dir)
                    .with_timeout(self.config.timeout_secs)
                    .with_run_for(step.run_secs),
                Err(e) => return SimulationOutcome::failed(format!("step {n} is invalid: {e}")),
            };

            info!(
                step = n,
                command = %spec.display(),
                run_secs = step.run_secs,
                "running simulation step"
            );

            match self.runner.run(&spec).await {
                Ok(out) if out.completed() => {
                    if out.deadline_reached {
                        info!(step = n, run_secs = step.run_secs, "simulation step ran its window");
                    }
                    output.push_str(&out.combined());
                    output.push('\n');
                }
                Ok(out) => {
                    warn!(step = n, exit_code = out.exit_code, "simulation step failed");
                    return SimulationOutcome::failed(format!(
                        "step {n} `{}` exited with code {}",
                        spec.display(),
                        out.exit_code
                    ));
                }
                Err(e) => {
                    warn!(step = n, error = %e, "simulation step did not complete");
                    return SimulationOutcome::failed(format!(
                        "step {n} `{}` did not complete: {e}",
                        spec.display()
                    ));
                }
            }
        }

        if let Some((marker, line)) = find_marker(&output, &self.config.failure_markers) {
            return SimulationOutcome::failed(format!(
                "instability marker '{marker}' in simulator output: {}",
                line.trim()
            ));
        }

        SimulationOutcome::passed(format!(
            "SITL passed: {} step(s) completed with no instability markers",
            self.config.steps.len()
        ))
    }
}

/// First output line containing any marker, compared case-insensitively.
fn find_marker<'a, 'm>(output: &'a str, markers: &'m [String]) -> Option<(&'m str, &'a str)> {
    let markers: Vec<(&str, String)> = markers
        .iter()
        .filter(|m| !m.trim().is_empty())
        .map(|m| (m.as_str(), m.to_lowercase()))
        .collect();

    output.lines().find_map(|line| {
        let lower = line.to_lowercase();
        markers
            .iter()
            .find(|(_, needle)| lower.contains(needle.as_str()))
            .map(|(marker, _)| (*marker, line))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::ScriptedRunner;
    use crate::runner::ProcessRunner;
    use flightsquad_core::SimulationStep;

    fn two_step_config() -> SimulationConfig {
        SimulationConfig {
            steps: vec![
                SimulationStep::command(["make", "TARGET={target}"]),
                SimulationStep::command(["./obj/main/betaflight_SITL.elf"]),
            ],
            ..SimulationConfig::default()
        }
    }

    fn observed_run(script: &str, run_secs: u64) -> SimulationConfig {
        SimulationConfig {
            steps: vec![SimulationStep::run_for(["sh", "-c", script], run_secs)],
            timeout_secs: 1,
            ..SimulationConfig::default()
        }
    }

    fn sim(script: ScriptedRunner, config: SimulationConfig) -> (Arc<ScriptedRunner>, SimulationRunner) {
        let script = Arc::new(script);
        (script.clone(), SimulationRunner::new(script, config))
    }

    #[tokio::test]
    async fn test_clean_run_passes() {
        let script = ScriptedRunner::new()
            .with_output(SIMULATION_LABEL, 0, "Linking betaflight_SITL.elf", "")
            .with_output(SIMULATION_LABEL, 0, "armed\nloop 8kHz stable", "");
        let (calls, runner) = sim(script, two_step_config());

        let outcome = runner.run_simulation().await;
        assert!(outcome.success, "{}", outcome.summary);
        assert_eq!(calls.calls_for(SIMULATION_LABEL), 2);
        assert_eq!(calls.calls()[0].args, vec!["TARGET=SITL".to_string()]);
    }

    #[tokio::test]
    async fn test_first_failing_step_stops_run() {
        let script = ScriptedRunner::new().with_output(SIMULATION_LABEL, 2, "", "undefined reference");
        let (calls, runner) = sim(script, two_step_config());

        let outcome = runner.run_simulation().await;
        assert!(!outcome.success);
        assert!(outcome.summary.contains("step 1"));
        assert!(outcome.summary.contains("exited with code 2"));
        assert_eq!(calls.calls_for(SIMULATION_LABEL), 1);
    }

    #[tokio::test]
    async fn test_marker_fails_run() {
        let script = ScriptedRunner::new()
            .with_output(SIMULATION_LABEL, 0, "", "")
            .with_output(SIMULATION_LABEL, 0, "tick\n  Scheduler OVERRUN on task GYRO  \n", "");
        let (_, runner) = sim(script, two_step_config());

        let outcome = runner.run_simulation().await;
        assert!(!outcome.success);
        assert_eq!(
            outcome.summary,
            "instability marker 'overrun' in simulator output: Scheduler OVERRUN on task GYRO"
        );
    }

    #[tokio::test]
    async fn test_runner_error_fails_run() {
        let script = ScriptedRunner::new().with_error(SIMULATION_LABEL, "timed out");
        let (_, runner) = sim(script, two_step_config());
        let outcome = runner.run_simulation().await;
        assert!(!outcome.success);
        assert!(outcome.summary.contains("did not complete"));
    }

    #[tokio::test]
    async fn test_no_steps_configured() {
        let config = SimulationConfig {
            steps: Vec::new(),
            ..SimulationConfig::default()
        };
        let (calls, runner) = sim(ScriptedRunner::new(), config);
        let outcome = runner.run_simulation().await;
        assert_eq!(outcome.summary, "no simulation steps configured");
        assert!(calls.calls().is_empty());
    }

    #[tokio::test]
    async fn test_default_steps_build_then_observe_sitl() {
        let script = ScriptedRunner::new()
            .with_output(SIMULATION_LABEL, 0, "Linking betaflight_SITL.elf", "")
            .with_deadline_output(SIMULATION_LABEL, "[SITL] init PwmOut\narmed\n");
        let (calls, runner) = sim(script, SimulationConfig::default());

        let outcome = runner.run_simulation().await;
        assert!(outcome.success, "{}", outcome.summary);

        let calls = calls.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].args, vec!["TARGET=SITL".to_string()]);
        assert_eq!(calls[0].run_for_secs, 0);
        assert_eq!(calls[1].program, flightsquad_core::SITL_BINARY);
        assert_eq!(calls[1].run_for_secs, flightsquad_core::DEFAULT_SITL_RUN_SECS);
    }

    #[tokio::test]
    async fn test_marker_in_observed_window_fails() {
        let script = ScriptedRunner::new()
            .with_output(SIMULATION_LABEL, 0, "", "")
            .with_deadline_output(SIMULATION_LABEL, "armed\ntask GYRO overrun by 12us\n");
        let (_, runner) = sim(script, SimulationConfig::default());

        let outcome = runner.run_simulation().await;
        assert!(!outcome.success);
        assert!(outcome.summary.contains("task GYRO overrun by 12us"));
    }

    #[tokio::test]
    async fn test_long_running_clean_process_passes() {
        let config = observed_run("echo 'armed, loop stable'; sleep 5", 1);
        let runner = SimulationRunner::new(Arc::new(ProcessRunner), config);

        let outcome = runner.run_simulation().await;
        assert!(outcome.success, "{}", outcome.summary);
    }

    #[tokio::test]
    async fn test_long_running_process_with_overrun_fails() {
        let config = observed_run("echo armed; echo 'scheduler overrun on PID loop'; sleep 5", 1);
        let runner = SimulationRunner::new(Arc::new(ProcessRunner), config);

        let outcome = runner.run_simulation().await;
        assert!(!outcome.success);
        assert_eq!(
            outcome.summary,
            "instability marker 'overrun' in simulator output: scheduler overrun on PID loop"
        );
    }

    #[tokio::test]
    async fn test_observed_step_exiting_nonzero_fails() {
        let config = observed_run("echo 'Segfault handler'; exit 139", 5);
        let runner = SimulationRunner::new(Arc::new(ProcessRunner), config);

        let outcome = runner.run_simulation().await;
        assert!(!outcome.success);
        assert!(outcome.summary.contains("exited with code 139"));
    }

    #[test]
    fn test_find_marker_ignores_blank_markers() {
        let markers = vec![String::new(), "crash".to_string()];
        assert!(find_marker("all good", &markers).is_none());
        assert_eq!(
            find_marker("a\nSITL CRASHED\n", &markers),
            Some(("crash", "SITL CRASHED"))
        );
    }
}
