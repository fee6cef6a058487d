//! xasim driver
//!
//! Stands in for the application that hosts a crash-prone participant:
//! prepare a branch (optionally crashing the process on commit), list the
//! branch records left on disk, and run a recovery pass after a restart.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;
use xasim_core::{XaResource, XaSimConfig, Xid};
use xasim_durability::BranchLog;
use xasim_engine::{DummyParticipant, Outcome, RecoveryManager, RecoveryScanner};

/// Format id used when none is given (the Narayana coordinator's tag)
const DEFAULT_FORMAT_ID: i32 = 131077;

#[derive(Parser)]
#[command(name = "xasim")]
#[command(about = "Crash-prone XA participant for exercising coordinator recovery")]
#[command(version)]
struct Cli {
    /// Branch record directory (overrides config file and XASIM_RECORD_DIR)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prepare one branch, then commit or roll it back
    Prepare {
        /// Halt the process during commit, leaving the branch prepared
        #[arg(long)]
        crash: bool,

        /// Roll back instead of committing
        #[arg(long, conflicts_with = "crash")]
        rollback: bool,

        /// Format id of the branch
        #[arg(long, default_value_t = DEFAULT_FORMAT_ID)]
        format_id: i32,

        /// Global transaction id as hex (random if omitted)
        #[arg(long)]
        gtrid: Option<String>,

        /// Branch qualifier as hex (random if omitted)
        #[arg(long)]
        bqual: Option<String>,
    },

    /// List outstanding branch records
    List,

    /// Recover and resolve every outstanding branch
    Recover {
        /// Roll back recovered branches instead of committing them
        #[arg(long)]
        rollback: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;
    info!(dir = %config.record_dir.display(), "Using branch record directory");

    match cli.command {
        Commands::Prepare {
            crash,
            rollback,
            format_id,
            gtrid,
            bqual,
        } => {
            let xid = Xid::new(
                format_id,
                parse_or_random(gtrid.as_deref(), "gtrid")?,
                parse_or_random(bqual.as_deref(), "bqual")?,
            );
            prepare(&config, xid, crash, rollback)
        }
        Commands::List => list(&config),
        Commands::Recover { rollback } => {
            let outcome = if rollback {
                Outcome::Rollback
            } else {
                Outcome::Commit
            };
            recover(&config, outcome)
        }
    }
}

fn load_config(cli: &Cli) -> Result<XaSimConfig> {
    let config = match &cli.config {
        Some(path) => XaSimConfig::from_file(path)?,
        None => XaSimConfig::default(),
    };
    let config = config.with_env_overrides();

    Ok(match &cli.dir {
        Some(dir) => config.record_dir(dir),
        None => config,
    })
}

fn parse_or_random(value: Option<&str>, field: &str) -> Result<Vec<u8>> {
    match value {
        Some(text) => hex::decode(text).with_context(|| format!("invalid hex for {field}: {text}")),
        None => Ok(Uuid::new_v4().as_bytes().to_vec()),
    }
}

fn prepare(config: &XaSimConfig, xid: Xid, crash: bool, rollback: bool) -> Result<()> {
    let mut participant = DummyParticipant::new(config, crash);

    participant
        .prepare(&xid)
        .with_context(|| format!("prepare of {xid} failed"))?;
    if let Some(record) = participant.record() {
        println!("prepared {xid} -> {record}");
    }

    if rollback {
        participant
            .rollback(&xid)
            .with_context(|| format!("rollback of {xid} failed"))?;
        println!("rolled back {xid}");
    } else {
        participant
            .commit(&xid, false)
            .with_context(|| format!("commit of {xid} failed"))?;
        println!("committed {xid}");
    }
    Ok(())
}

fn list(config: &XaSimConfig) -> Result<()> {
    let log = BranchLog::new(&config.record_dir);
    let handles = log.list()?;

    if handles.is_empty() {
        println!("no outstanding branches in {}", config.record_dir.display());
        return Ok(());
    }

    for handle in handles {
        match log.read(&handle) {
            Ok(xid) => println!("{handle}\t{xid}"),
            Err(e) => println!("{handle}\t<unreadable: {e}>"),
        }
    }
    Ok(())
}

fn recover(config: &XaSimConfig, outcome: Outcome) -> Result<()> {
    let scanner = Arc::new(RecoveryScanner::from_config(config));
    let mut manager = RecoveryManager::new();
    scanner.register(&mut manager);

    let report = manager.recover_all(outcome)?;
    for xid in &report.resolved {
        println!("{outcome} {xid}");
    }
    println!(
        "recovered {} branch(es), {} left for retry",
        report.resolved.len(),
        report.retry_later.len()
    );

    if !report.is_complete() {
        bail!(
            "{} branch(es) could not be resolved, run recover again",
            report.retry_later.len()
        );
    }
    Ok(())
}
