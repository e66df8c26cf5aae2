//! # Ledger Errors
//!
//! The four ways a ledger operation can fail. All of them are recoverable:
//! the dispatcher turns each into an `{error}` response and the service
//! keeps running.
//!
//! The `Display` strings are part of the wire contract. Clients match on
//! them, so change them only together with every client.

use thiserror::Error;

use crate::storage::StoreError;

/// Errors returned by [`LedgerService`](crate::service::LedgerService)
/// operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The wallet id has no record in the cache or the durable store.
    #[error("Wallet not found")]
    WalletNotFound,

    /// A payment amount that is zero, negative, fractional, or not a number;
    /// or an initial balance that is negative or fractional.
    #[error("Invalid amount")]
    InvalidAmount,

    /// The wallet balance is below the requested amount.
    #[error("Insufficient funds")]
    InsufficientFunds {
        /// Balance at the time of the check.
        available: u64,
        /// Amount the caller asked to send.
        requested: u64,
    },

    /// The durable store rejected a read or a write. Nothing was published.
    #[error("Failed to persist wallet")]
    Persistence(#[source] StoreError),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        LedgerError::Persistence(err)
    }
}

/// Convenience alias used throughout the crate.
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_strings_match_wire_contract() {
        assert_eq!(LedgerError::WalletNotFound.to_string(), "Wallet not found");
        assert_eq!(LedgerError::InvalidAmount.to_string(), "Invalid amount");
        assert_eq!(
            LedgerError::InsufficientFunds {
                available: 10,
                requested: 50
            }
            .to_string(),
            "Insufficient funds"
        );
        assert_eq!(
            LedgerError::from(StoreError::Unavailable("disk gone".into())).to_string(),
            "Failed to persist wallet"
        );
    }

    #[test]
    fn persistence_error_keeps_its_source() {
        use std::error::Error as _;

        let err = LedgerError::from(StoreError::Unavailable("disk gone".into()));
        let source = err.source().expect("store error is the source");
        assert!(source.to_string().contains("disk gone"));
    }
}
