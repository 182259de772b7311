//! Ledger CLI Application
//!
//! A command-line interface for key handling and chain demos.

use clap::{Parser, Subcommand};
use ledger_core::cli;
use ledger_core::config::ChainConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ledger")]
#[command(version)]
#[command(about = "Signed block ledger with a validated header chain", long_about = None)]
struct Cli {
    /// JSON chain config; defaults plus LEDGER_* environment overrides otherwise
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Address operations
    Address {
        #[command(subcommand)]
        action: AddressCommands,
    },

    /// Chain operations
    Chain {
        #[command(subcommand)]
        action: ChainCommands,
    },

    /// Print version information
    Version,
}

#[derive(Subcommand)]
enum AddressCommands {
    /// Create a new mnemonic and address
    Create,

    /// Restore an address from a mnemonic
    Restore {
        /// Mnemonic phrase (quote it)
        #[arg(short, long)]
        mnemonic: String,
    },
}

#[derive(Subcommand)]
enum ChainCommands {
    /// Build genesis plus N signed blocks
    Demo {
        /// Number of blocks to append
        #[arg(short, long, default_value = "10")]
        blocks: u64,

        /// Persist blocks under this directory instead of memory
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ChainConfig::load(path)?,
        None => ChainConfig::from_env(),
    };

    match cli.command {
        Commands::Address { action } => match action {
            AddressCommands::Create => cli::cmd_address_create()?,
            AddressCommands::Restore { mnemonic } => cli::cmd_address_restore(&mnemonic)?,
        },

        Commands::Chain { action } => match action {
            ChainCommands::Demo { blocks, data_dir } => {
                cli::cmd_chain_demo(&config, blocks, data_dir)?;
            }
        },

        Commands::Version => cli::cmd_version()?,
    }

    Ok(())
}
