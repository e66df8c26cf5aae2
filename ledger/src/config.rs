//! # Ledger Configuration & Constants
//!
//! Key layout, identifier sizes, and network defaults. Changing any of the
//! key prefixes after data has been written orphans every existing wallet,
//! so treat them as part of the on-disk format.

// ---------------------------------------------------------------------------
// Version
// ---------------------------------------------------------------------------

/// Ledger format version reported by the node's status endpoint.
pub const LEDGER_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Store Key Layout
// ---------------------------------------------------------------------------

/// Prefix for wallet records: `wallet:<walletId>`.
pub const WALLET_KEY_PREFIX: &str = "wallet:";

/// Store key for the 32-byte discovery seed.
pub const DHT_SEED_KEY: &str = "dht-seed";

/// Store key for the 32-byte RPC seed. The service public key derives from it.
pub const RPC_SEED_KEY: &str = "rpc-seed";

/// Length of each identity seed in bytes.
pub const SEED_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Random bytes in a wallet id (hex-encoded: 32 chars).
pub const WALLET_ID_BYTES: usize = 16;

/// Random bytes in a wallet address, after the prefix.
pub const ADDRESS_BYTES: usize = 20;

/// Human-readable prefix on every wallet address.
pub const ADDRESS_PREFIX: &str = "btc-";

/// Random bytes in a transaction id (hex-encoded: 64 chars).
pub const TX_ID_BYTES: usize = 32;

/// How many fresh ids `createWallet` tries before giving up on a collision.
/// With 128-bit ids a single retry is already astronomically unlikely.
pub const MAX_ID_ATTEMPTS: usize = 4;

// ---------------------------------------------------------------------------
// Network Defaults
// ---------------------------------------------------------------------------

/// Default port for the request/response API.
pub const DEFAULT_RPC_PORT: u16 = 4001;

/// Default port for the Prometheus metrics endpoint.
pub const DEFAULT_METRICS_PORT: u16 = 4002;

/// Default data directory for the durable store.
pub const DEFAULT_DATA_DIR: &str = "./db/tally-server";

// ---------------------------------------------------------------------------
// Utility
// ---------------------------------------------------------------------------

/// Builds the store key for a wallet id.
pub fn wallet_key(wallet_id: &str) -> String {
    format!("{WALLET_KEY_PREFIX}{wallet_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_key_uses_prefix() {
        assert_eq!(wallet_key("abc123"), "wallet:abc123");
    }

    #[test]
    fn seed_keys_do_not_collide_with_wallet_keys() {
        assert!(!DHT_SEED_KEY.starts_with(WALLET_KEY_PREFIX));
        assert!(!RPC_SEED_KEY.starts_with(WALLET_KEY_PREFIX));
        assert_ne!(DHT_SEED_KEY, RPC_SEED_KEY);
    }

    #[test]
    fn default_ports_are_distinct() {
        assert_ne!(DEFAULT_RPC_PORT, DEFAULT_METRICS_PORT);
    }
}
