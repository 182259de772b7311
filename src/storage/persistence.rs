//! File-backed block store
//!
//! One file per block under `<data_dir>/blocks/`, named by the hex block
//! hash and holding the canonical encoding. Writes go to a temporary file
//! first and are moved into place with a rename.

use crate::core::codec::{Decode, Encode};
use crate::core::Block;
use crate::crypto::Hash;
use crate::storage::store::{Storage, StorageError};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const BLOCKS_DIR: &str = "blocks";
const BLOCK_EXTENSION: &str = "blk";

/// Block store writing canonically-encoded files
#[derive(Debug, Clone)]
pub struct FileStore {
    blocks_dir: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `data_dir`
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let blocks_dir = data_dir.as_ref().join(BLOCKS_DIR);
        fs::create_dir_all(&blocks_dir)?;
        Ok(Self { blocks_dir })
    }

    pub fn blocks_dir(&self) -> &Path {
        &self.blocks_dir
    }

    fn block_path(&self, hash_hex: &str) -> PathBuf {
        self.blocks_dir.join(format!("{}.{}", hash_hex, BLOCK_EXTENSION))
    }

    /// Returns true if a block file exists for `hash_hex`
    pub fn contains(&self, hash_hex: &str) -> bool {
        hash_hex.parse::<Hash>().is_ok() && self.block_path(hash_hex).exists()
    }
}

fn write_then_rename(temp_path: &Path, path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(temp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);
    fs::rename(temp_path, path)
}

impl Storage for FileStore {
    fn put(&self, block: &Block) -> Result<(), StorageError> {
        let hash_hex = block.calculate_hash().to_hex();
        let path = self.block_path(&hash_hex);
        let temp_path = self.blocks_dir.join(format!("{}.tmp", hash_hex));

        if let Err(e) = write_then_rename(&temp_path, &path, &block.encode()) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
        log::debug!("Stored block {} at {}", hash_hex, path.display());
        Ok(())
    }

    fn get(&self, hash_hex: &str) -> Result<Block, StorageError> {
        let expected: Hash = hash_hex
            .parse()
            .map_err(|e| StorageError::InvalidData(format!("bad block hash {:?}: {}", hash_hex, e)))?;

        let bytes = match fs::read(self.block_path(hash_hex)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(hash_hex.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let block = Block::decode(&bytes)?;
        let actual = block.calculate_hash();
        if actual != expected {
            return Err(StorageError::InvalidData(format!(
                "block file {} holds block {}",
                hash_hex, actual
            )));
        }
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Header, Transaction, BLOCK_VERSION};
    use crate::crypto::{PrivateKey, PublicKey};

    fn sample_block(height: u64) -> Block {
        let key = PrivateKey::generate().unwrap();
        let mut block = Block::new(Header::new(Hash::ZERO, height, BLOCK_VERSION), vec![]);
        let mut tx = Transaction::new(PublicKey([5; 32]), 1, vec![], height as i64);
        tx.sign(&key);
        block.add_transaction(tx);
        block.sign(&key);
        block
    }

    #[test]
    fn test_file_store_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp_dir.path()).unwrap();

        let block = sample_block(1);
        let hash_hex = block.calculate_hash().to_hex();
        store.put(&block).unwrap();
        assert!(store.contains(&hash_hex));

        let loaded = store.get(&hash_hex).unwrap();
        assert_eq!(loaded, block);
        assert!(loaded.verify().is_ok());

        // no temporary files left behind
        let leftovers = fs::read_dir(store.blocks_dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map_or(false, |x| x == "tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_failed_put_removes_temp_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp_dir.path()).unwrap();
        let block = sample_block(6);
        let hash_hex = block.calculate_hash().to_hex();

        // a non-empty directory in the final location makes the rename fail
        let blocker = store.block_path(&hash_hex);
        fs::create_dir(&blocker).unwrap();
        fs::write(blocker.join("occupied"), b"x").unwrap();

        assert!(matches!(store.put(&block), Err(StorageError::Io(_))));
        assert!(!store.blocks_dir().join(format!("{}.tmp", hash_hex)).exists());
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let temp_dir = tempfile::tempdir().unwrap();
        let block = sample_block(2);
        let hash_hex = block.calculate_hash().to_hex();

        FileStore::new(temp_dir.path()).unwrap().put(&block).unwrap();
        let reopened = FileStore::new(temp_dir.path()).unwrap();
        assert_eq!(reopened.get(&hash_hex).unwrap(), block);
    }

    #[test]
    fn test_file_store_missing_and_bad_keys() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp_dir.path()).unwrap();

        assert!(matches!(
            store.get(&Hash::ZERO.to_hex()),
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            store.get("../../etc/passwd"),
            Err(StorageError::InvalidData(_))
        ));
        assert!(!store.contains("not-a-hash"));
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp_dir.path()).unwrap();
        let block = sample_block(3);
        let hash_hex = block.calculate_hash().to_hex();
        store.put(&block).unwrap();

        let path = store.block_path(&hash_hex);
        let mut bytes = fs::read(&path).unwrap();
        bytes.truncate(bytes.len() - 10);
        fs::write(&path, bytes).unwrap();

        assert!(matches!(store.get(&hash_hex), Err(StorageError::Codec(_))));
    }

    #[test]
    fn test_file_store_rejects_misnamed_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp_dir.path()).unwrap();
        let block = sample_block(4);
        store.put(&block).unwrap();

        let other = Hash([0x44; 32]).to_hex();
        fs::copy(store.block_path(&block.calculate_hash().to_hex()), store.block_path(&other)).unwrap();
        assert!(matches!(store.get(&other), Err(StorageError::InvalidData(_))));
    }
}
