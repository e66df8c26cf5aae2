//! # Service Identity
//!
//! Process-wide key material kept in the durable store under fixed keys:
//! a discovery seed (`dht-seed`) and an RPC seed (`rpc-seed`), 32 bytes
//! each. On startup each seed is read back; if it is missing or not exactly
//! 32 bytes it is regenerated from the OS RNG and written once.
//!
//! The RPC seed is an Ed25519 secret. Its public key is what the node
//! advertises as its identity. Seed bytes are never logged.

use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::config::{DHT_SEED_KEY, RPC_SEED_KEY, SEED_LENGTH};
use crate::storage::{DurableStore, StoreResult};

/// The node's persistent identity seeds.
pub struct ServiceIdentity {
    dht_seed: [u8; SEED_LENGTH],
    rpc_seed: [u8; SEED_LENGTH],
}

impl std::fmt::Debug for ServiceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceIdentity")
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

impl ServiceIdentity {
    /// Loads both seeds from `store`, regenerating any that are invalid.
    pub async fn load_or_init(store: &dyn DurableStore) -> StoreResult<Self> {
        let dht_seed = load_or_generate_seed(store, DHT_SEED_KEY).await?;
        let rpc_seed = load_or_generate_seed(store, RPC_SEED_KEY).await?;
        Ok(Self { dht_seed, rpc_seed })
    }

    /// Seed for the discovery layer's keypair.
    pub fn dht_seed(&self) -> &[u8; SEED_LENGTH] {
        &self.dht_seed
    }

    /// Hex-encoded Ed25519 public key derived from the RPC seed.
    pub fn public_key_hex(&self) -> String {
        let signing_key = SigningKey::from_bytes(&self.rpc_seed);
        hex::encode(signing_key.verifying_key().to_bytes())
    }
}

/// Returns the seed at `key`, replacing it with fresh random bytes if it is
/// absent or has the wrong length.
pub async fn load_or_generate_seed(
    store: &dyn DurableStore,
    key: &str,
) -> StoreResult<[u8; SEED_LENGTH]> {
    if let Some(bytes) = store.get(key).await? {
        if let Ok(seed) = <[u8; SEED_LENGTH]>::try_from(bytes.as_slice()) {
            return Ok(seed);
        }
    }

    tracing::warn!(key, "seed is invalid or missing. Regenerating...");
    let mut seed = [0u8; SEED_LENGTH];
    OsRng.fill_bytes(&mut seed);
    store.put(key, seed.to_vec()).await?;
    Ok(seed)
}
