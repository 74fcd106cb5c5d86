//! Firmware build invocation and compiler diagnostic parsing.

use flightsquad_core::{
    truncate_chars, BuildConfig, BuildError, BuildOutcome, CommandRunner, Result, SquadError,
};
use regex::Regex;
use std::sync::Arc;
use tracing::{info, warn};

/// Runner label for build commands.
pub const BUILD_LABEL: &str = "build";

const DIAGNOSTIC_PATTERN: &str =
    r"^\s*(?P<path>[^:\s][^:]*):(?P<line>\d+):(?P<col>\d+):\s*(?:fatal\s+)?error:\s*(?P<msg>.*?)\s*$";

/// Extracts `<path>:<line>:<column>: error: <message>` lines from compiler
/// output. Warnings and notes are ignored.
#[derive(Debug, Clone)]
pub struct DiagnosticParser {
    pattern: Regex,
    max_errors: usize,
}

impl DiagnosticParser {
    pub fn new(max_errors: usize) -> Result<Self> {
        let pattern = Regex::new(DIAGNOSTIC_PATTERN).map_err(|e| SquadError::InvalidPattern {
            rule: "compiler diagnostic".to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            pattern,
            max_errors,
        })
    }

    /// Diagnostics in order of appearance, at most `max_errors`.
    pub fn parse(&self, output: &str) -> Vec<BuildError> {
        output
            .lines()
            .filter_map(|line| {
                let caps = self.pattern.captures(line)?;
                Some(BuildError {
                    file_path: caps["path"].to_string(),
                    line: caps["line"].parse().ok()?,
                    column: caps["col"].parse().ok()?,
                    message: caps["msg"].to_string(),
                })
            })
            .take(self.max_errors)
            .collect()
    }
}

/// Runs the configured build command once per call.
pub struct BuildRunner {
    runner: Arc<dyn CommandRunner>,
    config: BuildConfig,
    parser: DiagnosticParser,
}

impl BuildRunner {
    pub fn new(runner: Arc<dyn CommandRunner>, config: BuildConfig) -> Result<Self> {
        let parser = DiagnosticParser::new(config.max_errors)?;
        Ok(Self {
            runner,
            config,
            parser,
        })
    }

    /// Build `target`. Never retries.
    ///
    /// A command that cannot be rendered, spawned or finished in time is
    /// reported as a failed build carrying the error text.
    pub async fn build(&self, target: &str) -> BuildOutcome {
        let spec = match self.config.command.render(BUILD_LABEL, target) {
            Ok(spec) => spec
                .with_work_dir(&self.config.work_dir)
                .with_timeout(self.config.timeout_secs),
            Err(e) => return BuildOutcome::failed(Vec::new(), e.to_string(), -1, 0),
        };

        info!(build_target = %target, command = %spec.display(), "running firmware build");

        let output = match self.runner.run(&spec).await {
            Ok(output) => output,
            Err(e) => {
                warn!(build_target = %target, error = %e, "build command did not complete");
                return BuildOutcome::failed(Vec::new(), e.to_string(), -1, 0);
            }
        };

        if output.success() {
            return BuildOutcome::succeeded(output.exit_code, output.duration_ms);
        }

        let log = if output.stderr.trim().is_empty() {
            &output.stdout
        } else {
            &output.stderr
        };
        let errors = self.parser.parse(log);
        let excerpt = truncate_chars(log, self.config.excerpt_chars).to_string();

        info!(
            build_target = %target,
            exit_code = output.exit_code,
            diagnostics = errors.len(),
            "firmware build failed"
        );

        BuildOutcome::failed(errors, excerpt, output.exit_code, output.duration_ms)
    }
}
