//! # SledStore — Crash-Durable Adapter
//!
//! The production [`DurableStore`], built on sled's embedded key-value
//! store. All ledger keys (wallet records and identity seeds) live in a
//! single named tree:
//!
//! | Tree     | Key (UTF-8)          | Value                 |
//! |----------|----------------------|-----------------------|
//! | `ledger` | `wallet:<walletId>`  | `bincode(Wallet)`     |
//! | `ledger` | `dht-seed`           | 32 raw bytes          |
//! | `ledger` | `rpc-seed`           | 32 raw bytes          |
//!
//! ## Durability
//!
//! sled buffers writes in memory. `put` therefore awaits `flush_async`
//! before returning, so a put that returned `Ok` survives a crash. Reads
//! are lock-free and never flush.
//!
//! ## Recovery
//!
//! Reopening the same directory makes every previously flushed key
//! available immediately. There is no separate replay step.

use std::path::Path;

use async_trait::async_trait;
use sled::{Db, Tree};

use super::{DurableStore, StoreResult};

/// Name of the sled tree holding all ledger keys.
const LEDGER_TREE: &str = "ledger";

/// sled-backed durable store.
///
/// # Thread Safety
///
/// sled handles are internally reference-counted and thread-safe, so a
/// `SledStore` can be shared via `Arc` without extra locking.
#[derive(Debug, Clone)]
pub struct SledStore {
    /// The underlying sled database handle.
    db: Db,
    /// All ledger keys.
    tree: Tree,
}

impl SledStore {
    /// Open or create a store at the given filesystem path.
    ///
    /// If the directory doesn't exist, sled creates it. If it does, all
    /// previously flushed keys are available immediately.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Create a temporary store that is removed when dropped.
    pub fn open_temporary() -> StoreResult<Self> {
        let config = sled::Config::new().temporary(true);
        let db = config.open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> StoreResult<Self> {
        let tree = db.open_tree(LEDGER_TREE)?;
        Ok(Self { db, tree })
    }

    /// Number of keys in the ledger tree.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Number of wallet records on disk.
    pub fn wallet_count(&self) -> usize {
        self.tree
            .scan_prefix(crate::config::WALLET_KEY_PREFIX.as_bytes())
            .count()
    }

    /// Force a flush of all pending writes to disk.
    pub fn flush(&self) -> StoreResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

#[async_trait]
impl DurableStore for SledStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.tree.get(key.as_bytes())?.map(|v| v.to_vec()))
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> StoreResult<()> {
        self.tree.insert(key.as_bytes(), value)?;
        self.db.flush_async().await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
