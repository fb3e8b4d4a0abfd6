//! ev-rebase-sim: precision simulations for the elastic supply ledger.
//!
//! Drives an in-memory ledger through long rebase sequences and fails on the
//! first cycle that breaks supply or transfer precision.

#![allow(missing_docs, rustdoc::missing_crate_level_docs)]

mod sim;

use alloy_primitives::{address, Address};
use clap::{Parser, Subcommand};
use ev_elastic::LedgerConfig;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Administrator used when the config leaves it unset.
const DEFAULT_ADMIN: Address = address!("0x00000000000000000000000000000000000000a0");

/// Seed for the growth sampler unless overridden.
const DEFAULT_SEED: u64 = 0x1bd;

#[derive(Parser, Debug)]
#[command(name = "ev-rebase-sim", about = "Precision simulations for the elastic supply ledger")]
struct Cli {
    /// JSON ledger config (defaults to the reference deployment)
    #[arg(long, global = true, env = "EV_ELASTIC_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Alternately rebase by +1 and double the supply until the cap
    SupplyPrecision,
    /// Random growth and contraction cycles, checking transfer precision
    TransferPrecision {
        /// Seed for the growth sampler
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,

        /// Stop after this many cycles even if the cap is not reached
        #[arg(long)]
        max_cycles: Option<u64>,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn load_config(path: Option<&Path>) -> eyre::Result<LedgerConfig> {
    let mut config = match path {
        Some(path) => LedgerConfig::from_file(path)?,
        None => LedgerConfig::default(),
    };
    if config.administrator.is_zero() {
        config.administrator = DEFAULT_ADMIN;
    }
    Ok(config)
}

fn main() -> eyre::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    info!(
        admin = %config.administrator,
        initial_supply = config.initial_supply,
        "=== EV-REBASE-SIM: starting ==="
    );

    let report = match cli.command {
        Command::SupplyPrecision => sim::supply_precision(&config)?,
        Command::TransferPrecision { seed, max_cycles } => {
            sim::transfer_precision(&config, seed, max_cycles)?
        }
    };

    info!(
        cycles = report.cycles,
        final_supply = %report.final_supply,
        "=== EV-REBASE-SIM: all cycles passed ==="
    );
    Ok(())
}
