//! CLI commands for the ledger
//!
//! Thin handlers over the library; all validation lives in `core`.

use crate::config::ChainConfig;
use crate::core::{Blockchain, Transaction};
use crate::crypto::{generate_mnemonic, validate_mnemonic, PrivateKey};
use crate::mining::Mempool;
use crate::storage::{FileStore, MemoryStore, Storage};
use std::path::PathBuf;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Transactions generated per demo block
const DEMO_TXS_PER_BLOCK: i64 = 3;

/// Nonce of the `index`-th demo transaction in the block at `height`
fn demo_nonce(height: u64, index: i64) -> Option<i64> {
    i64::try_from(height)
        .ok()?
        .checked_mul(DEMO_TXS_PER_BLOCK)?
        .checked_add(index)
}

/// Create a new mnemonic and print its address
pub fn cmd_address_create() -> CliResult<()> {
    let mnemonic = generate_mnemonic()?;
    let key = PrivateKey::from_mnemonic(&mnemonic);

    println!("✅ New address created!");
    println!("   📝 Mnemonic: {}", mnemonic);
    println!("   📍 Address:  {}", key.public_key().address());
    println!("   🔑 Public key: {}", key.public_key());
    println!();
    println!("   ⚠️  Write the mnemonic down; it is the only way to restore this key.");
    Ok(())
}

/// Print the address derived from an existing mnemonic
pub fn cmd_address_restore(mnemonic: &str) -> CliResult<()> {
    if let Err(e) = validate_mnemonic(mnemonic) {
        // Derivation accepts any phrase; only warn.
        log::warn!("{}", e);
    }
    let key = PrivateKey::from_mnemonic(mnemonic);

    println!("📍 Address:    {}", key.public_key().address());
    println!("🔑 Public key: {}", key.public_key());
    Ok(())
}

/// Build genesis plus `blocks` signed blocks and report the result
pub fn cmd_chain_demo(config: &ChainConfig, blocks: u64, data_dir: Option<PathBuf>) -> CliResult<()> {
    let store: Box<dyn Storage> = match data_dir {
        Some(dir) => {
            println!("📂 Writing blocks to {:?}", dir);
            Box::new(FileStore::new(dir)?)
        }
        None => Box::new(MemoryStore::new()),
    };

    let mut chain = Blockchain::new(store, config)?;
    let mempool = Mempool::new();
    let author = PrivateKey::generate()?;
    let recipient = PrivateKey::generate()?.public_key();

    println!("⛓️  Building {} block(s) on top of genesis", blocks);

    for height in 1..=blocks {
        for i in 0..DEMO_TXS_PER_BLOCK {
            let nonce = demo_nonce(height, i).ok_or("block count too large for demo nonces")?;
            let mut tx = Transaction::new(recipient, 1, format!("demo {}", nonce).into_bytes(), nonce);
            tx.sign(&author);
            mempool.add(tx)?;
        }

        let mut block = chain.next_block(mempool.transactions())?;
        block.sign(&author);
        chain.accept_block(&block, &mempool)?;
    }

    let tip = chain.last_header()?;
    println!("✅ Chain built!");
    println!("   📏 Height: {}", tip.height);
    println!("   🧱 Tip hash: {}", tip.hash());
    println!("   📦 Pending transactions: {}", mempool.len());
    println!("{}", serde_json::to_string_pretty(tip)?);
    Ok(())
}

pub fn cmd_version() -> CliResult<()> {
    println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    Ok(())
}
