//! # LedgerService
//!
//! Business rules and atomicity for the four wallet operations:
//!
//! | Operation            | Mutates | Result                |
//! |----------------------|---------|-----------------------|
//! | `create_wallet`      | yes     | `{walletId, address}` |
//! | `get_balance`        | no      | balance               |
//! | `send_payment`       | yes     | the new transaction   |
//! | `list_transactions`  | no      | the full log          |
//!
//! ## Ordering
//!
//! Every mutation writes the store first and the cache second. A crash
//! between the two loses nothing: the cache is rebuilt from the store on
//! demand. The reverse order could serve a wallet (or a deduction) that a
//! crash would later un-create.
//!
//! ## Payments
//!
//! `send_payment` holds the wallet's payment gate from the balance check
//! until the cache is updated, on a spawned task that outlives its caller.
//! The deduction is applied to a working copy; the committed snapshot is
//! replaced only once the store confirms. If the write fails the working
//! copy is dropped, so cache and store both keep the pre-call state.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{instrument, Instrument};

use crate::cache::WalletCache;
use crate::config::MAX_ID_ATTEMPTS;
use crate::error::{LedgerError, LedgerResult};
use crate::storage::{self, DurableStore, StoreError};
use crate::wallet::{now_millis, Amount, Transaction, Wallet};

/// Identifiers handed back by `create_wallet`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedWallet {
    pub wallet_id: String,
    pub address: String,
}

/// The ledger: owns the wallet cache and is the sole writer of wallets.
///
/// Cheap to share: wrap in an `Arc` and hand it to every request task.
pub struct LedgerService {
    store: Arc<dyn DurableStore>,
    cache: WalletCache,
}

impl std::fmt::Debug for LedgerService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerService")
            .field("cache", &self.cache)
            .finish()
    }
}

impl LedgerService {
    pub fn new(store: Arc<dyn DurableStore>) -> Self {
        let cache = WalletCache::new(Arc::clone(&store));
        Self { store, cache }
    }

    /// Read access to the cache, for status reporting.
    pub fn cache(&self) -> &WalletCache {
        &self.cache
    }

    /// Creates a wallet holding `initial_balance` with an empty log.
    ///
    /// The record is durable before it is visible: a failed store write
    /// leaves no trace in the cache.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Persistence`] if the store write fails, or if no
    /// unused id could be found.
    #[instrument(skip(self))]
    pub async fn create_wallet(&self, initial_balance: Amount) -> LedgerResult<CreatedWallet> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let wallet = Wallet::generate(initial_balance);
            if self.id_in_use(wallet.id()).await? {
                tracing::warn!(wallet_id = wallet.id(), "wallet id collision, retrying");
                continue;
            }

            if let Err(e) = storage::save_wallet(&*self.store, &wallet).await {
                tracing::error!(error = %e, "failed to persist new wallet");
                return Err(LedgerError::Persistence(e));
            }

            let created = CreatedWallet {
                wallet_id: wallet.id().to_string(),
                address: wallet.address().to_string(),
            };
            self.cache.put(wallet);

            tracing::info!(
                wallet_id = %created.wallet_id,
                address = %created.address,
                balance = initial_balance,
                "wallet created"
            );
            return Ok(created);
        }

        Err(LedgerError::Persistence(StoreError::Unavailable(
            "could not allocate a unique wallet id".into(),
        )))
    }

    /// Current balance of `wallet_id`.
    #[instrument(skip(self))]
    pub async fn get_balance(&self, wallet_id: &str) -> LedgerResult<Amount> {
        let entry = self.cache.get(wallet_id).await?;
        Ok(entry.balance())
    }

    /// Sends `amount` from `wallet_id` to `to_address` and returns the
    /// appended transaction.
    ///
    /// Payments on the same wallet are fully serialized: one finishes,
    /// successfully or not, before the next reads the balance.
    ///
    /// The gated section (check, persist, publish) runs on its own task, so
    /// dropping the returned future never leaves a write in the store that
    /// the cache has not seen. A payment that reaches the store is always
    /// published, even if the caller has gone away.
    ///
    /// # Errors
    ///
    /// Checked in this order:
    /// 1. [`LedgerError::InvalidAmount`] if `amount` is zero.
    /// 2. [`LedgerError::WalletNotFound`] if the wallet does not exist.
    /// 3. [`LedgerError::InsufficientFunds`] if the balance is too low.
    /// 4. [`LedgerError::Persistence`] if the store write fails; nothing
    ///    changes in that case.
    #[instrument(skip(self))]
    pub async fn send_payment(
        &self,
        wallet_id: &str,
        to_address: &str,
        amount: Amount,
    ) -> LedgerResult<Transaction> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }

        let entry = self.cache.get(wallet_id).await?;
        let store = Arc::clone(&self.store);
        let to_address = to_address.to_string();

        let commit: tokio::task::JoinHandle<LedgerResult<Transaction>> = tokio::spawn(
            async move {
                let _gate = entry.lock().await;

                let mut working = entry.snapshot();
                let tx = working.debit(&to_address, amount, now_millis())?;

                if let Err(e) = storage::save_wallet(&*store, &working).await {
                    tracing::error!(error = %e, "failed to persist payment, rolled back");
                    return Err(LedgerError::Persistence(e));
                }
                entry.publish(working);

                tracing::info!(tx_id = %tx.id, to = %tx.to, amount, "payment committed");
                Ok(tx)
            }
            .in_current_span(),
        );

        match commit.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => Err(LedgerError::Persistence(StoreError::Unavailable(format!(
                "payment task did not complete: {e}"
            )))),
        }
    }

    /// The full transaction log of `wallet_id`, oldest first.
    #[instrument(skip(self))]
    pub async fn list_transactions(&self, wallet_id: &str) -> LedgerResult<Vec<Transaction>> {
        let entry = self.cache.get(wallet_id).await?;
        Ok(entry.transactions())
    }

    async fn id_in_use(&self, wallet_id: &str) -> LedgerResult<bool> {
        if self.cache.contains(wallet_id) {
            return Ok(true);
        }
        Ok(storage::load_wallet(&*self.store, wallet_id)
            .await?
            .is_some())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
