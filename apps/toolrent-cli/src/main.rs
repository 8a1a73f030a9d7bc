//! # toolrent
//!
//! Operator command line for the rental shop.
//!
//! ## Usage
//! ```bash
//! toolrent customer add --name "Aziz" --phone "+998 90 123-45-67"
//! toolrent rental create --customer <ID>
//! toolrent rental add-item <RENTAL> --tool <TOOL> --quantity 2
//! toolrent rental complete <RENTAL>
//! toolrent --json dashboard
//! ```
//!
//! ## Exit Codes
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Success |
//! | 1 | Storage or unexpected failure |
//! | 2 | Validation (bad input, not enough stock) |
//! | 3 | Not found |
//! | 4 | Conflict (delete blocked by an active rental) |
//! | 5 | Invalid state (rental already settled) |

mod cli;
mod commands;
mod config;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use toolrent_core::ErrorKind;
use toolrent_db::{Database, DbError};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::commands::Output;
use crate::config::AppConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(exit_code(&err))
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(path) = cli.db {
        config.database.path = Some(path);
    }

    init_tracing(&config.logging.filter);

    let db_config = config.db_config()?;
    debug!(path = %db_config.database_path.display(), "Opening shop database");

    let db = Database::new(db_config)
        .await
        .context("failed to open database")?;

    let out = Output::new(cli.json, &config);
    let result = commands::run(&db, &config, cli.command, &out).await;

    db.close().await;
    info!("Database closed");

    result
}

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=toolrent_db=trace` - Trace the ledger only
/// - Default: `[logging] filter`, or `TOOLRENT_LOG`
///
/// Logs go to stderr so `--json` output stays parseable.
fn init_tracing(configured: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured))
        .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<DbError>().map(DbError::kind) {
        Some(ErrorKind::Validation) => 2,
        Some(ErrorKind::NotFound) => 3,
        Some(ErrorKind::Conflict) => 4,
        Some(ErrorKind::InvalidState) => 5,
        Some(ErrorKind::Storage) | None => 1,
    }
}
