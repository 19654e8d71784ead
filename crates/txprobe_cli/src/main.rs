//! txprobe CLI.
//!
//! Drives the transactional counter against a SQLite file (or an in-memory
//! store) so commit and rollback behavior can be checked by hand.
//!
//! # Commands
//!
//! - `init` - create table `foo` and insert the seed row
//! - `count` - print the row count
//! - `commit` - insert one row and commit
//! - `abort` - insert one row, then fail and roll back (exits non-zero)
//! - `state` - print whether the table exists and its row count
//! - `scenario` - run init, commit and abort end to end and verify counts

mod commands;

use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use txprobe_core::{default_log_level, init_logging};

/// Transactional counter probe for SQLite.
#[derive(Parser)]
#[command(name = "txprobe")]
#[command(version, about, long_about = None)]
struct Cli {
    /// SQLite database file; an in-memory store is used when omitted
    #[arg(global = true, long, env = "TXPROBE_DB")]
    db: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); requires --log-dir
    #[arg(global = true, long, env = "TXPROBE_LOG_LEVEL", requires = "log_dir")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when omitted
    #[arg(global = true, long, env = "TXPROBE_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Print results as JSON
    #[arg(global = true, long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create table `foo` and insert the seed row
    Init,
    /// Print the number of rows
    Count,
    /// Insert one row and commit
    Commit,
    /// Insert one row, then fail so the transaction rolls back
    Abort,
    /// Print table presence and row count
    State,
    /// Run init, commit and abort end to end and verify the counts
    Scenario,
    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();
    // Why: the Debug form of `Box<dyn Error>` hides the `count=N` message.
    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli
            .log_level
            .clone()
            .unwrap_or_else(|| default_log_level().to_string());
        init_logging(&level, log_dir)?;
    }

    let output = commands::Output { json: cli.json };
    let db = cli.db.as_deref();

    match cli.command {
        Commands::Init => commands::init(db, output)?,
        Commands::Count => commands::count(db, output)?,
        Commands::Commit => commands::commit(db, output)?,
        Commands::Abort => commands::abort(db, output)?,
        Commands::State => commands::state(db, output)?,
        Commands::Scenario => commands::scenario(db, output)?,
        Commands::Version => {
            println!("txprobe CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("txprobe core v{}", txprobe_core::core_version());
        }
    }

    Ok(())
}
