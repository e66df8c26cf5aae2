//! # Storage Module
//!
//! The durable side of the ledger. Everything the service persists goes
//! through the [`DurableStore`] trait: a flat string-keyed mapping to opaque
//! bytes with point lookups and single-key atomic puts.
//!
//! ## Architecture
//!
//! ```text
//! mod.rs        — DurableStore trait, StoreError, typed wallet accessors
//! sled_store.rs — crash-durable adapter over sled (flushes on every put)
//! memory.rs     — in-process adapter for ephemeral nodes and tests
//! ```
//!
//! ## Contract
//!
//! 1. `put` returns only after the value is durable. For sled that means
//!    after the flush completes, not after the in-memory insert.
//! 2. `get` after a successful `put` of the same key returns that value,
//!    including across a restart of the process (for durable adapters).
//! 3. No multi-key transactions. The ledger never needs them: every
//!    operation touches exactly one wallet record.
//!
//! Wallet records are bincode. JSON is for the API; bincode is for disk.

pub mod memory;
pub mod sled_store;

use async_trait::async_trait;

use crate::config::wallet_key;
use crate::wallet::Wallet;

pub use memory::MemoryStore;
pub use sled_store::SledStore;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// ---------------------------------------------------------------------------
// DurableStore
// ---------------------------------------------------------------------------

/// Crash-durable key-value persistence.
///
/// Both methods may suspend on I/O. Implementations must be safe to share
/// across tasks behind an `Arc`.
#[async_trait]
pub trait DurableStore: Send + Sync + 'static {
    /// Point lookup. `Ok(None)` means the key has never been written.
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Atomically replaces the value at `key`, durably, before returning.
    async fn put(&self, key: &str, value: Vec<u8>) -> StoreResult<()>;
}

// ---------------------------------------------------------------------------
// Typed Wallet Accessors
// ---------------------------------------------------------------------------

/// Loads the wallet record stored under `wallet:<wallet_id>`.
pub async fn load_wallet(
    store: &dyn DurableStore,
    wallet_id: &str,
) -> StoreResult<Option<Wallet>> {
    match store.get(&wallet_key(wallet_id)).await? {
        Some(bytes) => {
            let wallet: Wallet = bincode::deserialize(&bytes)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            Ok(Some(wallet))
        }
        None => Ok(None),
    }
}

/// Overwrites the whole wallet record under `wallet:<id>`.
pub async fn save_wallet(store: &dyn DurableStore, wallet: &Wallet) -> StoreResult<()> {
    let bytes =
        bincode::serialize(wallet).map_err(|e| StoreError::Serialization(e.to_string()))?;
    store.put(&wallet_key(wallet.id()), bytes).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn wallet_accessors_roundtrip() {
        let store = MemoryStore::new();
        let mut wallet = Wallet::new("w1", "btc-alice", 100);
        wallet.debit("btc-bob", 40, 7).unwrap();

        save_wallet(&store, &wallet).await.unwrap();
        let loaded = load_wallet(&store, "w1").await.unwrap().expect("stored");
        assert_eq!(loaded, wallet);
    }

    #[tokio::test]
    async fn wallet_accessors_use_prefixed_key() {
        let store = MemoryStore::new();
        save_wallet(&store, &Wallet::new("w1", "btc-alice", 1))
            .await
            .unwrap();
        assert!(store.get("wallet:w1").await.unwrap().is_some());
        assert!(store.get("w1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn load_missing_wallet_returns_none() {
        let store = MemoryStore::new();
        assert!(load_wallet(&store, "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn undecodable_record_is_a_serialization_error() {
        let store = MemoryStore::new();
        store.put("wallet:bad", vec![0xFF]).await.unwrap();
        let err = load_wallet(&store, "bad").await.unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
