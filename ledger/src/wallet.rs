//! # Wallets & Transactions
//!
//! A [`Wallet`] is a ledger account: an immutable id and address, a
//! balance, and an append-only log of outgoing [`Transaction`]s. The only
//! way to change a wallet after creation is [`Wallet::debit`], which checks
//! funds, deducts, and appends in one step.
//!
//! ## Identifiers
//!
//! Ids and addresses are random bytes from the OS RNG, hex-encoded. Their
//! format is opaque to callers; uniqueness is the only promise.
//!
//! ## Persistence
//!
//! The whole wallet (including its log) is one store record, serialized with
//! bincode and overwritten on every mutation.

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::config::{ADDRESS_BYTES, ADDRESS_PREFIX, TX_ID_BYTES, WALLET_ID_BYTES};
use crate::error::{LedgerError, LedgerResult};

/// Amount in smallest units.
pub type Amount = u64;

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// An immutable record of one completed transfer out of a wallet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Hex-encoded random id.
    pub id: String,
    /// Sender wallet's address at the time of transfer.
    pub from: String,
    /// Recipient address. Not necessarily a wallet this ledger knows.
    pub to: String,
    /// Amount transferred. Always positive.
    pub amount: Amount,
    /// Unix milliseconds. Non-decreasing within one wallet's log.
    pub timestamp: u64,
}

// ---------------------------------------------------------------------------
// Wallet
// ---------------------------------------------------------------------------

/// A ledger account with a balance and an append-only transaction history.
///
/// Fields are private so that nothing outside this module can rewrite the
/// log or set the balance directly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    id: String,
    address: String,
    balance: Amount,
    transactions: Vec<Transaction>,
}

impl Wallet {
    /// Creates a wallet with explicit identifiers and an empty log.
    pub fn new(id: impl Into<String>, address: impl Into<String>, balance: Amount) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
            balance,
            transactions: Vec::new(),
        }
    }

    /// Creates a wallet with a fresh random id and address.
    pub fn generate(balance: Amount) -> Self {
        Self::new(generate_wallet_id(), generate_address(), balance)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    /// The full log, oldest first.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Sends `amount` to `to`: checks funds, deducts, and appends a new
    /// transaction stamped `now_ms` (clamped so the log never goes back in
    /// time). Returns the appended transaction.
    ///
    /// On error the wallet is untouched.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] if `amount` is zero.
    /// - [`LedgerError::InsufficientFunds`] if `amount` exceeds the balance.
    pub fn debit(&mut self, to: &str, amount: Amount, now_ms: u64) -> LedgerResult<Transaction> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        if self.balance < amount {
            return Err(LedgerError::InsufficientFunds {
                available: self.balance,
                requested: amount,
            });
        }

        let timestamp = match self.transactions.last() {
            Some(last) => now_ms.max(last.timestamp),
            None => now_ms,
        };
        let tx = Transaction {
            id: generate_tx_id(),
            from: self.address.clone(),
            to: to.to_string(),
            amount,
            timestamp,
        };

        self.balance -= amount;
        self.transactions.push(tx.clone());
        Ok(tx)
    }
}

// ---------------------------------------------------------------------------
// Identifier Generation
// ---------------------------------------------------------------------------

fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// A fresh wallet id.
pub fn generate_wallet_id() -> String {
    random_hex(WALLET_ID_BYTES)
}

/// A fresh wallet address, e.g. `btc-3f9a…`.
pub fn generate_address() -> String {
    format!("{ADDRESS_PREFIX}{}", random_hex(ADDRESS_BYTES))
}

/// A fresh transaction id.
pub fn generate_tx_id() -> String {
    random_hex(TX_ID_BYTES)
}

/// Current wall-clock time in Unix milliseconds.
pub fn now_millis() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_identifiers_have_expected_shape() {
        let wallet = Wallet::generate(0);
        assert_eq!(wallet.id().len(), WALLET_ID_BYTES * 2);
        assert!(wallet.address().starts_with("btc-"));
        assert_eq!(wallet.address().len(), 4 + ADDRESS_BYTES * 2);
        assert_eq!(generate_tx_id().len(), TX_ID_BYTES * 2);
    }

    #[test]
    fn generated_identifiers_are_unique() {
        let a = Wallet::generate(0);
        let b = Wallet::generate(0);
        assert_ne!(a.id(), b.id());
        assert_ne!(a.address(), b.address());
    }

    #[test]
    fn debit_deducts_and_appends() {
        let mut wallet = Wallet::new("w1", "btc-alice", 100);
        let tx = wallet.debit("btc-xyz", 30, 1_000).unwrap();

        assert_eq!(wallet.balance(), 70);
        assert_eq!(wallet.transactions(), &[tx.clone()]);
        assert_eq!(tx.from, "btc-alice");
        assert_eq!(tx.to, "btc-xyz");
        assert_eq!(tx.amount, 30);
        assert_eq!(tx.timestamp, 1_000);
    }

    #[test]
    fn debit_entire_balance_leaves_zero() {
        let mut wallet = Wallet::new("w1", "btc-alice", 25);
        wallet.debit("btc-bob", 25, 1).unwrap();
        assert_eq!(wallet.balance(), 0);
    }

    #[test]
    fn debit_rejects_zero_amount() {
        let mut wallet = Wallet::new("w1", "btc-alice", 100);
        let err = wallet.debit("btc-xyz", 0, 1).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount));
        assert_eq!(wallet.balance(), 100);
        assert!(wallet.transactions().is_empty());
    }

    #[test]
    fn debit_rejects_overdraft_without_side_effects() {
        let mut wallet = Wallet::new("w1", "btc-alice", 10);
        let err = wallet.debit("btc-xyz", 50, 1).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientFunds {
                available: 10,
                requested: 50
            }
        ));
        assert_eq!(wallet.balance(), 10);
        assert!(wallet.transactions().is_empty());
    }

    #[test]
    fn timestamps_never_go_backwards() {
        let mut wallet = Wallet::new("w1", "btc-alice", 100);
        wallet.debit("btc-a", 1, 5_000).unwrap();
        // Clock stepped back.
        let tx = wallet.debit("btc-b", 1, 4_000).unwrap();
        assert_eq!(tx.timestamp, 5_000);
        let tx = wallet.debit("btc-c", 1, 6_000).unwrap();
        assert_eq!(tx.timestamp, 6_000);
    }

    #[test]
    fn bincode_roundtrip_preserves_log() {
        let mut wallet = Wallet::new("w1", "btc-alice", 100);
        wallet.debit("btc-a", 10, 1).unwrap();
        wallet.debit("btc-b", 20, 2).unwrap();

        let bytes = bincode::serialize(&wallet).unwrap();
        let decoded: Wallet = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded, wallet);
    }

    #[test]
    fn transaction_json_uses_plain_field_names() {
        let tx = Transaction {
            id: "t1".into(),
            from: "btc-a".into(),
            to: "btc-b".into(),
            amount: 5,
            timestamp: 42,
        };
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "t1", "from": "btc-a", "to": "btc-b", "amount": 5, "timestamp": 42
            })
        );
    }
}
