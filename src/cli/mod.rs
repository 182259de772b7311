//! Command-line interface handlers

pub mod commands;

pub use commands::{
    cmd_address_create, cmd_address_restore, cmd_chain_demo, cmd_version, CliResult,
};
