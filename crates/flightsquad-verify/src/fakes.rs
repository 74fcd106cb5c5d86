//! Scripted command runner for tests.

use async_trait::async_trait;
use flightsquad_core::{CommandOutput, CommandRunner, CommandSpec, Result, SquadError};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

#[derive(Debug, Clone)]
enum Scripted {
    Output(CommandOutput),
    Error(String),
}

/// Returns canned outputs per command label and records every invocation.
///
/// Responses queued for a label are consumed in order. Once a label's queue
/// is empty, further calls succeed with exit code 0 and no output.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(self, label: &str, response: Scripted) -> Self {
        self.scripts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(label.to_string())
            .or_default()
            .push_back(response);
        self
    }

    /// Queue a process result for `label`.
    pub fn with_output(
        self,
        label: &str,
        exit_code: i32,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        self.push(
            label,
            Scripted::Output(CommandOutput {
                exit_code,
                stdout: stdout.into(),
                stderr: stderr.into(),
                duration_ms: 1,
                deadline_reached: false,
            }),
        )
    }

    /// Queue a run that was still going when its window ended.
    pub fn with_deadline_output(self, label: &str, stdout: impl Into<String>) -> Self {
        self.push(
            label,
            Scripted::Output(CommandOutput {
                exit_code: -1,
                stdout: stdout.into(),
                stderr: String::new(),
                duration_ms: 1,
                deadline_reached: true,
            }),
        )
    }

    /// Queue a runner failure (spawn error) for `label`.
    pub fn with_error(self, label: &str, reason: impl Into<String>) -> Self {
        self.push(label, Scripted::Error(reason.into()))
    }

    /// Every command run so far, in order.
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of commands run under `label`.
    pub fn calls_for(&self, label: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|c| c.label == label)
            .count()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(spec.clone());

        let next = self
            .scripts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get_mut(&spec.label)
            .and_then(VecDeque::pop_front);

        match next {
            Some(Scripted::Output(out)) => Ok(out),
            Some(Scripted::Error(reason)) => Err(SquadError::CommandFailed {
                label: spec.label.clone(),
                reason,
            }),
            None => Ok(CommandOutput {
                exit_code: 0,
                stdout: String::new(),
                stderr: String::new(),
                duration_ms: 0,
                deadline_reached: false,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(label: &str) -> CommandSpec {
        CommandSpec::from_argv(label, &["make".to_string()]).expect("spec")
    }

    #[tokio::test]
    async fn test_queued_responses_in_order() {
        let runner = ScriptedRunner::new()
            .with_output("build", 2, "", "boom")
            .with_error("build", "no such file");

        let first = runner.run(&spec("build")).await.unwrap();
        assert_eq!(first.exit_code, 2);
        assert!(runner.run(&spec("build")).await.is_err());

        let third = runner.run(&spec("build")).await.unwrap();
        assert!(third.success());
        assert_eq!(runner.calls_for("build"), 3);
        assert_eq!(runner.calls_for("simulation"), 0);
    }
}
