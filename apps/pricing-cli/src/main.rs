//! # storefront-pricing
//!
//! ## Exit Status
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  0   priced / submission matches                                        │
//! │  1   error (unreadable file, invalid input, ineligible promo code, ...)│
//! │  2   usage error                                                        │
//! │  3   verify: submitted pricing disagrees with authoritative pricing    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::error::ErrorKind;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use storefront_pricing::commands::{self, Cli, Command};
use storefront_pricing::config::PricingConfig;
use storefront_pricing::summary::{render_summary, render_verification};

const EXIT_USAGE: u8 = 2;
const EXIT_MISMATCH: u8 = 3;

fn main() -> ExitCode {
    let command = match Cli::try_parse() {
        Ok(cli) => cli.command,
        Err(err) => {
            if err.print().is_err() {
                return ExitCode::FAILURE;
            }
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(EXIT_USAGE),
            };
        }
    };

    let config = match PricingConfig::load(None) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {}", err);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.log.filter);
    info!(version = env!("CARGO_PKG_VERSION"), "storefront-pricing starting");

    match run(command, &config) {
        Ok(code) => code,
        Err(err) => {
            error!("{:#}", err);
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - `STOREFRONT_LOG=debug` - Show computed breakdowns
/// - `STOREFRONT_LOG=storefront_core=debug` - Core crate only
/// - Default: INFO level
///
/// Logs go to stderr so stdout stays parseable with `--json`.
fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_input(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn run(command: Command, config: &PricingConfig) -> Result<ExitCode> {
    match command {
        Command::Quote { payload, json } => {
            let quote = commands::quote(&read_input(&payload)?, config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&quote)?);
            } else {
                print!("{}", render_summary(&quote.result, quote.tax_rate));
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Verify {
            submission,
            json,
            at,
        } => {
            let catalog_path = config
                .verify
                .catalog
                .as_deref()
                .context("No catalog configured; set STOREFRONT_CATALOG or [verify] catalog")?;
            let catalog = commands::load_catalog(catalog_path)?;

            let now = at.unwrap_or_else(Utc::now);
            let verification =
                commands::verify(&read_input(&submission)?, &catalog, config, now)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&verification)?);
            } else {
                print!("{}", render_verification(&verification));
            }

            if verification.is_consistent() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(EXIT_MISMATCH))
            }
        }
    }
}
