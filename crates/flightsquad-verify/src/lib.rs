//! flightsquad verify - gatekeeping for agent-authored firmware changes
//!
//! Runs a candidate source file through three stages and stops at the first
//! failure:
//! - Compliance scan for blocking calls, unbounded loops and heap allocation
//! - Firmware build with compiler diagnostics parsed into structured errors
//! - SITL simulation checked for instability markers
//!
//! Every external process goes through [`flightsquad_core::CommandRunner`].

pub mod build;
pub mod fakes;
pub mod pipeline;
pub mod runner;
pub mod scanner;
pub mod simulation;
pub mod tools;

// Re-export key types
pub use build::{BuildRunner, DiagnosticParser, BUILD_LABEL};
pub use fakes::ScriptedRunner;
pub use pipeline::VerificationPipeline;
pub use runner::ProcessRunner;
pub use scanner::PatternScanner;
pub use simulation::{SimulationRunner, SIMULATION_LABEL, SITL_TARGET};
pub use tools::{
    check_atomic_access, read_file_content, CodebaseTools, ATOMIC_REVIEW_NOTE, SEARCH_LABEL,
};
