//! # storefront-pricing
//!
//! Command-line edge around `storefront-core`: reads payload and catalog
//! files, loads configuration, and prints totals. All pricing happens in the
//! core crate.
//!
//! ## Modules
//! - [`config`] - `PricingConfig` from environment, TOML file and defaults
//! - [`commands`] - argument parsing and the `quote` / `verify` commands
//! - [`summary`] - terminal rendering of results

pub mod commands;
pub mod config;
pub mod summary;
