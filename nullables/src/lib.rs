//! Nullable infrastructure for deterministic testing.
//!
//! The collaborators of the bootstrap pipeline (wallet, header store,
//! validated-hash cache) are abstracted behind traits. This crate provides
//! test-friendly implementations that:
//! - Keep all state in memory and never touch the filesystem
//! - Can be controlled programmatically (failure injection, hooks)
//! - Count calls so tests can assert what did and did not happen
//!
//! Usage: swap real implementations for nullables in tests.

pub mod store;
pub mod wallet;

pub use store::{NullHeaderStore, NullValidHashStore};
pub use wallet::{NullWallet, WalletSnapshot};
