//! # WalletCache
//!
//! The in-process, authoritative view of every wallet touched since
//! startup. It fronts the [`DurableStore`]: a miss falls through to the
//! store and the loaded record is kept for the life of the process. Nothing
//! is ever evicted; wallet counts are assumed modest.
//!
//! ## Entries
//!
//! Each wallet id maps to one [`WalletEntry`], created once and never
//! replaced. An entry carries two things:
//!
//! - a **payment gate** (`tokio::sync::Mutex<()>`), held by `sendPayment`
//!   across its whole read-validate-deduct-persist-publish sequence,
//!   including the durable write;
//! - the **committed snapshot** (`parking_lot::RwLock<Wallet>`), swapped
//!   only after the store has confirmed the write.
//!
//! Readers take the snapshot lock for the length of a clone and never wait
//! on store I/O. Writers to different wallets hold different gates, and the
//! map itself is a sharded `DashMap`, so there is no cross-wallet blocking.
//!
//! ## Cold Loads
//!
//! Two tasks missing on the same id may both read the store. Whichever
//! inserts first wins; the other adopts the winner's entry and drops its own
//! copy. Because every write goes through an existing entry's gate, the
//! winner is never older than what the store held when it was inserted.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use tokio::sync::{Mutex, MutexGuard};

use crate::error::LedgerResult;
use crate::storage::{self, DurableStore};
use crate::wallet::{Amount, Transaction, Wallet};
use crate::LedgerError;

// ---------------------------------------------------------------------------
// WalletEntry
// ---------------------------------------------------------------------------

/// One cached wallet: its payment gate and last committed state.
#[derive(Debug)]
pub struct WalletEntry {
    gate: Mutex<()>,
    committed: RwLock<Wallet>,
}

impl WalletEntry {
    fn new(wallet: Wallet) -> Self {
        Self {
            gate: Mutex::new(()),
            committed: RwLock::new(wallet),
        }
    }

    /// A copy of the last committed wallet state.
    pub fn snapshot(&self) -> Wallet {
        self.committed.read().clone()
    }

    pub fn balance(&self) -> Amount {
        self.committed.read().balance()
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.committed.read().transactions().to_vec()
    }

    /// Waits for exclusive mutation rights on this wallet.
    pub(crate) async fn lock(&self) -> MutexGuard<'_, ()> {
        self.gate.lock().await
    }

    pub(crate) fn publish(&self, wallet: Wallet) {
        *self.committed.write() = wallet;
    }
}

// ---------------------------------------------------------------------------
// WalletCache
// ---------------------------------------------------------------------------

/// Wallet id → [`WalletEntry`], populated on demand from the store.
pub struct WalletCache {
    entries: DashMap<String, Arc<WalletEntry>>,
    store: Arc<dyn DurableStore>,
}

impl std::fmt::Debug for WalletCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletCache")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl WalletCache {
    pub fn new(store: Arc<dyn DurableStore>) -> Self {
        Self {
            entries: DashMap::new(),
            store,
        }
    }

    /// Returns the entry for `wallet_id`, loading it from the store on a miss.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::WalletNotFound`] if neither cache nor store has it.
    /// - [`LedgerError::Persistence`] if the store lookup itself fails.
    pub async fn get(&self, wallet_id: &str) -> LedgerResult<Arc<WalletEntry>> {
        // Release the shard guard before suspending on the store.
        let cached = self.entries.get(wallet_id).map(|e| Arc::clone(e.value()));
        if let Some(entry) = cached {
            return Ok(entry);
        }

        let wallet = storage::load_wallet(&*self.store, wallet_id)
            .await?
            .ok_or(LedgerError::WalletNotFound)?;
        tracing::debug!(wallet_id, "wallet loaded from store");

        let entry = self
            .entries
            .entry(wallet_id.to_string())
            .or_insert_with(|| Arc::new(WalletEntry::new(wallet)));
        Ok(Arc::clone(entry.value()))
    }

    /// Writes `wallet` into the cache at its id, overwriting the committed
    /// state of any existing entry (its payment gate is kept).
    pub fn put(&self, wallet: Wallet) {
        match self.entries.entry(wallet.id().to_string()) {
            Entry::Occupied(occupied) => occupied.get().publish(wallet),
            Entry::Vacant(vacant) => {
                vacant.insert(Arc::new(WalletEntry::new(wallet)));
            }
        }
    }

    /// Whether `wallet_id` is cached. Does not consult the store.
    pub fn contains(&self, wallet_id: &str) -> bool {
        self.entries.contains_key(wallet_id)
    }

    /// Number of cached wallets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
