//! Command runner trait and command types.
//!
//! Every shell-out (firmware build, SITL, codebase search) goes through
//! [`CommandRunner`], so tests can substitute canned outcomes for real
//! processes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::error::{Result, SquadError};

/// Placeholder substituted with the build target name in command templates.
pub const TARGET_PLACEHOLDER: &str = "{target}";

// ---------------------------------------------------------------------------
// Runner trait
// ---------------------------------------------------------------------------

/// Trait for command execution backends (host process, container, fake).
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Execute a command once and return its captured output.
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;
}

// ---------------------------------------------------------------------------
// Command types
// ---------------------------------------------------------------------------

/// A fully rendered command ready to execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Human-readable label used in logs and errors.
    pub label: String,

    /// Executable name or path.
    pub program: String,

    /// Arguments passed to the executable.
    pub args: Vec<String>,

    /// Working directory (inherits the caller's when `None`).
    pub work_dir: Option<PathBuf>,

    /// Timeout in seconds; 0 waits indefinitely.
    pub timeout_secs: u64,

    /// When non-zero, the command is stopped after this many seconds and
    /// its captured output returned with `deadline_reached` set. Takes
    /// precedence over `timeout_secs`.
    #[serde(default)]
    pub run_for_secs: u64,
}

impl CommandSpec {
    /// Build a spec from an argv-style vector (first element is the executable).
    pub fn from_argv(label: impl Into<String>, argv: &[String]) -> Result<Self> {
        let label = label.into();
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| SquadError::InvalidCommand(format!("command '{label}' is empty")))?;
        if program.trim().is_empty() {
            return Err(SquadError::InvalidCommand(format!(
                "command '{label}' has an empty executable"
            )));
        }
        Ok(Self {
            label,
            program: program.clone(),
            args: args.to_vec(),
            work_dir: None,
            timeout_secs: 0,
            run_for_secs: 0,
        })
    }

    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(work_dir.into());
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Run for a fixed window instead of waiting for exit.
    pub fn with_run_for(mut self, run_for_secs: u64) -> Self {
        self.run_for_secs = run_for_secs;
        self
    }

    /// Shell-like rendering for logs.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    /// Exit code (0 = success, -1 when terminated by a signal).
    pub exit_code: i32,

    pub stdout: String,

    pub stderr: String,

    pub duration_ms: u64,

    /// The process was still running when its `run_for_secs` window ended
    /// and was stopped.
    #[serde(default)]
    pub deadline_reached: bool,
}

impl CommandOutput {
    /// Exit code 0. A process stopped at its deadline is not a success.
    pub fn success(&self) -> bool {
        self.exit_code == 0 && !self.deadline_reached
    }

    /// Exited with code 0, or ran for its whole window.
    pub fn completed(&self) -> bool {
        self.exit_code == 0 || self.deadline_reached
    }

    /// Stdout followed by stderr.
    pub fn combined(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (true, _) => self.stderr.clone(),
            (false, true) => self.stdout.clone(),
            (false, false) => format!("{}\n{}", self.stdout, self.stderr),
        }
    }
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// Argv-style command template with an optional `{target}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandTemplate(pub Vec<String>);

impl CommandTemplate {
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(argv.into_iter().map(Into::into).collect())
    }

    /// Substitute `{target}` in every argument and build a [`CommandSpec`].
    pub fn render(&self, label: &str, target: &str) -> Result<CommandSpec> {
        let argv: Vec<String> = self
            .0
            .iter()
            .map(|arg| arg.replace(TARGET_PLACEHOLDER, target))
            .collect();
        CommandSpec::from_argv(label, &argv)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
