// Copyright (c) 2026 Tally Contributors. MIT License.
// See LICENSE for details.

//! # Tally Ledger — Core Library
//!
//! A remote wallet ledger: create wallets, query balances, send payments,
//! and list transaction history. This crate owns wallet state and keeps
//! the balance invariant under concurrent mutation, with the in-memory view
//! consistent with durable storage.
//!
//! ## Architecture
//!
//! ```text
//! config   — Key layout, identifier lengths, default ports.
//! wallet   — Wallet and Transaction records, identifier generation.
//! storage  — DurableStore trait plus sled and in-memory adapters.
//! cache    — WalletCache: per-wallet entries fronting the store.
//! service  — LedgerService: the four operations and their atomicity.
//! rpc      — Request dispatcher: JSON payload in, JSON payload out.
//! identity — Service seeds kept in the store, regenerated when invalid.
//! ```
//!
//! ## Ground Rules
//!
//! 1. The store is written before the cache. A wallet the store doesn't
//!    have is never served.
//! 2. Payments against one wallet are serialized end to end, including
//!    the durable write. Payments against different wallets never wait
//!    on each other.
//! 3. Amounts are `u64` in smallest units. No floating point touches a
//!    balance.

pub mod cache;
pub mod config;
pub mod error;
pub mod identity;
pub mod rpc;
pub mod service;
pub mod storage;
pub mod wallet;

pub use cache::WalletCache;
pub use error::{LedgerError, LedgerResult};
pub use rpc::{Dispatcher, Method};
pub use service::{CreatedWallet, LedgerService};
pub use storage::{DurableStore, MemoryStore, SledStore, StoreError};
pub use wallet::{Amount, Transaction, Wallet};
