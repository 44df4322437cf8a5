//! Maintenance probe for a memos database.
//!
//! # Responsibility
//! - Resolve a `Profile` from flags and `MEMOS_*` environment variables.
//! - Run one maintenance operation against the store and report the result.

use clap::{Parser, Subcommand};
use log::error;
use memos_store::{
    core_version, default_log_level, init_logging, restore_backup, schema_version,
    verify_backup, Context, Profile, Store,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "memos")]
#[command(version)]
#[command(about = "Maintenance commands for the memos persistence store")]
struct Cli {
    /// Runtime mode: prod, dev or demo
    #[arg(long, global = true, env = "MEMOS_MODE")]
    mode: Option<String>,

    /// Database driver
    #[arg(long, global = true, env = "MEMOS_DRIVER")]
    driver: Option<String>,

    /// Data source name; defaults to <data>/memos_<mode>.db
    #[arg(long, global = true, env = "MEMOS_DSN")]
    dsn: Option<String>,

    /// Data directory
    #[arg(long, global = true, env = "MEMOS_DATA")]
    data: Option<String>,

    /// Write logs to this absolute directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Give up after this many seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply pending schema migrations
    Migrate,
    /// Remove orphaned rows and reclaim space
    Vacuum,
    /// Write a consistent snapshot to a new file
    Backup {
        /// Destination file; must not exist
        path: PathBuf,
    },
    /// Check that a file is a usable memos backup
    Verify {
        path: PathBuf,
    },
    /// Copy a verified backup into a new database file
    Restore {
        backup: PathBuf,
        /// Destination file; must not exist
        target: PathBuf,
    },
    /// Print crate and schema versions
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        if let Err(err) = init_logging(level, log_dir, true) {
            eprintln!("memos: {err}");
            return ExitCode::FAILURE;
        }
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_command module=cli status=error error={err}");
            eprintln!("memos: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let ctx = match cli.timeout_secs {
        Some(secs) => Context::with_timeout(Duration::from_secs(secs)),
        None => Context::background(),
    };

    match &cli.command {
        Command::Version => {
            println!("memos_store version={}", core_version());
            println!("memos_store schema_version={}", schema_version());
        }
        Command::Verify { path } => {
            let version = verify_backup(path)?;
            println!("ok schema_version={version}");
        }
        Command::Restore { backup, target } => {
            let version = restore_backup(backup, target)?;
            println!("restored {} schema_version={version}", target.display());
        }
        Command::Migrate => {
            // Opening the store migrates it.
            let store = Store::open(&ctx, resolve_profile(cli)?)?;
            println!("migrated schema_version={}", schema_version());
            store.close()?;
        }
        Command::Vacuum => {
            let store = Store::open(&ctx, resolve_profile(cli)?)?;
            store.vacuum(&ctx)?;
            println!("vacuumed");
            store.close()?;
        }
        Command::Backup { path } => {
            let store = Store::open(&ctx, resolve_profile(cli)?)?;
            store.backup_to(&ctx, path)?;
            println!("backup written to {}", path.display());
            store.close()?;
        }
    }
    Ok(())
}

fn resolve_profile(cli: &Cli) -> Result<Profile, Box<dyn Error>> {
    let profile = Profile::from_lookup(|key| match key {
        "MEMOS_MODE" => cli.mode.clone(),
        "MEMOS_DRIVER" => cli.driver.clone(),
        "MEMOS_DSN" => cli.dsn.clone(),
        "MEMOS_DATA" => cli.data.clone(),
        _ => None,
    })?;
    Ok(profile)
}
