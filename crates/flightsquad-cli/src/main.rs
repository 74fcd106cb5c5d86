//! flightsquad - verification gate and training-data harvester CLI
//!
//! ## Commands
//!
//! - `scan`: Run the compliance scanner over a source file
//! - `verify`: Scan, build and simulate a candidate, optionally harvesting its transcript
//! - `review`: Interactively approve harvested records
//! - `approve`: Mark one record as human-approved
//! - `list`: Print harvested records
//! - `search` / `read`: Codebase lookup tools
//! - `atomic`: Shared-state review reminder for a source file

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flightsquad_core::{
    render_record, render_verdict, review_records, KnowledgeHarvester, RecordIndex, SquadConfig,
    METRICS,
};
use flightsquad_verify::{
    check_atomic_access, read_file_content, CodebaseTools, PatternScanner, ProcessRunner,
    VerificationPipeline,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "flightsquad")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Verification gate and training-data harvester for agent-written firmware", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Configuration file (default: ./flightsquad.toml when present)
    #[arg(long, global = true, env = "FLIGHTSQUAD_CONFIG")]
    config: Option<PathBuf>,

    /// Training record log, overriding `harvest.log_path`
    #[arg(long, global = true, env = "FLIGHTSQUAD_DATASET")]
    dataset: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a source file for forbidden constructs
    Scan {
        /// C source file to scan
        file: PathBuf,
    },

    /// Run compliance, build and SITL checks on a candidate file
    Verify {
        /// Candidate source file
        file: PathBuf,

        /// Firmware build target (e.g. STM32F405, SITL)
        #[arg(short, long)]
        target: String,

        /// Agent transcript to harvest when verification passes
        #[arg(long)]
        transcript: Option<PathBuf>,
    },

    /// Walk the record log and approve entries interactively
    Review,

    /// Mark one record as human-approved
    Approve {
        /// Zero-based record position, or -1 for the last record
        #[arg(short, long, default_value_t = -1, allow_negative_numbers = true)]
        index: i64,
    },

    /// Print harvested records
    List {
        /// Only records awaiting approval
        #[arg(long)]
        pending: bool,
    },

    /// Search the firmware source tree
    Search {
        /// String or regex passed to grep
        query: String,

        /// Source root (default: `tools.src_root`)
        #[arg(long)]
        src: Option<PathBuf>,
    },

    /// Print a source file
    Read {
        /// File to read
        file: PathBuf,
    },

    /// List shared volatile state that needs ATOMIC_BLOCK review
    Atomic {
        /// C source file to check
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    flightsquad_core::init_tracing(cli.json, level);

    let result = run(cli).await;
    METRICS.flush();
    result
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref(), cli.dataset)?;

    match cli.command {
        Commands::Scan { file } => cmd_scan(&config, &file),
        Commands::Verify {
            file,
            target,
            transcript,
        } => cmd_verify(&config, &file, &target, transcript.as_deref()).await,
        Commands::Review => cmd_review(&config),
        Commands::Approve { index } => cmd_approve(&config, index),
        Commands::List { pending } => cmd_list(&config, pending),
        Commands::Search { query, src } => cmd_search(config, &query, src).await,
        Commands::Read { file } => {
            println!("{}", read_file_content(&file).await);
            Ok(())
        }
        Commands::Atomic { file } => {
            println!("{}", check_atomic_access(&file).await);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>, dataset: Option<PathBuf>) -> Result<SquadConfig> {
    let mut config = SquadConfig::load(path).context("Failed to load configuration")?;
    if let Some(dataset) = dataset {
        config.harvest.log_path = dataset;
    }
    Ok(config)
}

fn open_harvester(config: &SquadConfig) -> Result<KnowledgeHarvester> {
    KnowledgeHarvester::from_config(config.harvest.clone()).with_context(|| {
        format!(
            "Failed to open record log {}",
            config.harvest.log_path.display()
        )
    })
}

/// Scan one file; violations are a failure exit
fn cmd_scan(config: &SquadConfig, file: &Path) -> Result<()> {
    let scanner = PatternScanner::new()?.with_custom_rules(&config.scanner.extra_rules)?;
    let violations = scanner
        .scan_file(file)
        .with_context(|| format!("Failed to scan {}", file.display()))?;

    if violations.is_empty() {
        println!("PASS: no compliance violations in {}", file.display());
        return Ok(());
    }

    println!("REJECTED: {} violation(s) in {}", violations.len(), file.display());
    for v in &violations {
        println!("  - {v}");
    }
    anyhow::bail!("compliance scan failed")
}

/// Verify a candidate and harvest its transcript on success
async fn cmd_verify(
    config: &SquadConfig,
    file: &Path,
    target: &str,
    transcript: Option<&Path>,
) -> Result<()> {
    let pipeline = VerificationPipeline::from_config(config, Arc::new(ProcessRunner))?;
    let verdict = pipeline
        .verify_file(file, target)
        .await
        .with_context(|| format!("Failed to read candidate {}", file.display()))?;

    print!("{}", render_verdict(&verdict));

    if !verdict.passed() {
        anyhow::bail!("verification failed at stage {}", verdict.stage());
    }

    if let Some(path) = transcript {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read transcript {}", path.display()))?;
        let harvester = open_harvester(config)?;
        if harvester.harvest_verified(&verdict, &text) {
            println!(
                "Harvested training record into {}",
                config.harvest.log_path.display()
            );
        } else {
            println!("Harvest failed; see log output for details");
        }
    }

    Ok(())
}

fn cmd_review(config: &SquadConfig) -> Result<()> {
    let harvester = open_harvester(config)?;
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let summary = review_records(&harvester, stdin.lock(), stdout.lock())?;
    info!(
        total = summary.total,
        approved = summary.approved,
        newly_approved = summary.newly_approved,
        "review finished"
    );
    Ok(())
}

fn cmd_approve(config: &SquadConfig, index: i64) -> Result<()> {
    let harvester = open_harvester(config)?;
    let index = RecordIndex::try_from(index)?;
    let outcome = harvester
        .try_mark_human_approved(index)
        .context("Failed to approve record")?;

    if outcome.changed {
        println!("Entry #{} marked as human-approved", outcome.index);
    } else {
        println!("Entry #{} was already approved", outcome.index);
    }
    Ok(())
}

fn cmd_list(config: &SquadConfig, pending_only: bool) -> Result<()> {
    let harvester = open_harvester(config)?;
    let entries: Vec<_> = if pending_only {
        harvester.pending()?
    } else {
        harvester.records()?.into_iter().enumerate().collect()
    };

    if entries.is_empty() {
        println!("No entries found.");
        return Ok(());
    }

    for (i, record) in &entries {
        print!("{}", render_record(*i, record));
    }
    println!("\n{} entr{} listed", entries.len(), if entries.len() == 1 { "y" } else { "ies" });
    Ok(())
}

async fn cmd_search(mut config: SquadConfig, query: &str, src: Option<PathBuf>) -> Result<()> {
    if let Some(src) = src {
        config.tools.src_root = src;
    }
    let tools = CodebaseTools::new(Arc::new(ProcessRunner), config.tools);
    println!("{}", tools.search_codebase(query).await);
    Ok(())
}
