//! Configuration for the verification pipeline and harvester.
//!
//! Loaded from a TOML file; every section falls back to defaults that match
//! a stock Betaflight checkout built with `make`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::error::{Result, SquadError};
use crate::runner::CommandTemplate;

/// File looked up in the working directory when no config path is given.
pub const DEFAULT_CONFIG_FILE: &str = "flightsquad.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SquadConfig {
    pub build: BuildConfig,
    pub simulation: SimulationConfig,
    pub scanner: ScannerConfig,
    pub harvest: HarvestConfig,
    pub tools: ToolsConfig,
}

impl SquadConfig {
    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, `flightsquad.toml` in the
    /// working directory is used when present, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::from_file(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Parse a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| SquadError::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    /// Parse TOML text.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| SquadError::Config(e.to_string()))
    }
}

/// Firmware build invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Argv template; `{target}` is replaced by the build target.
    pub command: CommandTemplate,

    pub work_dir: PathBuf,

    /// 0 waits indefinitely.
    pub timeout_secs: u64,

    /// Maximum number of parsed diagnostics kept in a report.
    pub max_errors: usize,

    /// Length of the raw log excerpt, in characters.
    pub excerpt_chars: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            command: CommandTemplate::new(["make", "{target}"]),
            work_dir: PathBuf::from("."),
            timeout_secs: 0,
            max_errors: 5,
            excerpt_chars: 500,
        }
    }
}

/// SITL build-and-run steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Commands run in order; the first failure stops the run.
    pub steps: Vec<SimulationStep>,

    pub work_dir: PathBuf,

    /// Per-step timeout for steps without a run window; 0 waits indefinitely.
    pub timeout_secs: u64,

    /// Case-insensitive substrings that mark an unstable run.
    pub failure_markers: Vec<String>,
}

/// SITL binary produced by `make TARGET=SITL`.
pub const SITL_BINARY: &str = "./obj/main/betaflight_SITL.elf";

/// Seconds the SITL binary runs before its output is inspected.
pub const DEFAULT_SITL_RUN_SECS: u64 = 10;

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            steps: vec![
                SimulationStep::command(["make", "TARGET={target}"]),
                SimulationStep::run_for([SITL_BINARY], DEFAULT_SITL_RUN_SECS),
            ],
            work_dir: PathBuf::from("."),
            timeout_secs: 0,
            failure_markers: [
                "overrun",
                "segmentation fault",
                "core dumped",
                "hardfault",
                "hard fault",
                "crash",
                "assertion failed",
            ]
            .iter()
            .map(|m| (*m).to_string())
            .collect(),
        }
    }
}

/// One simulation command.
///
/// ```toml
/// [[simulation.steps]]
/// command = ["make", "TARGET={target}"]
///
/// [[simulation.steps]]
/// command = ["./obj/main/betaflight_SITL.elf"]
/// run_secs = 10
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationStep {
    /// Argv template; `{target}` is replaced by `SITL`.
    pub command: CommandTemplate,

    /// When non-zero the step is stopped after this many seconds and the
    /// stop counts as a normal finish. A step that exits earlier is judged
    /// by its exit code.
    #[serde(default)]
    pub run_secs: u64,
}

impl SimulationStep {
    /// A step that must exit with code 0.
    pub fn command<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: CommandTemplate::new(argv),
            run_secs: 0,
        }
    }

    /// A long-running step observed for `run_secs` seconds.
    pub fn run_for<I, S>(argv: I, run_secs: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: CommandTemplate::new(argv),
            run_secs,
        }
    }
}

/// Additional compliance rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub extra_rules: Vec<CustomRuleConfig>,
}

/// A regex rule declared in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomRuleConfig {
    /// Rule identifier shown in reports (e.g. `NO_PRINTF`).
    pub id: String,
    pub pattern: String,
    pub message: String,
}

/// Training-record log settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    pub log_path: PathBuf,
    pub context: String,
    pub source: String,

    /// Instruction recorded when no action line is found.
    pub default_instruction: String,

    pub transcript_excerpt_chars: usize,
    pub solution_fallback_chars: usize,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("betaflight_gold_dataset.jsonl"),
            context: "Betaflight Firmware v4.6-dev - STM32 flight controller".to_string(),
            source: "betaflight_ai_squad".to_string(),
            default_instruction: "Implement Betaflight firmware feature".to_string(),
            transcript_excerpt_chars: 2000,
            solution_fallback_chars: 500,
        }
    }
}

/// Codebase tools exposed to agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub src_root: PathBuf,
    pub max_search_results: usize,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            src_root: PathBuf::from("/workspace/src"),
            max_search_results: 20,
        }
    }
}
