//! Wallet side of the chain bootstrap.
//!
//! The wallet itself (keys, transactions, persistence) lives elsewhere; this
//! crate defines the narrow interface the bootstrap pipeline needs from it and
//! the policy that wipes the wallet's chain-derived state when the local
//! header store has to be rebuilt from scratch.

pub mod reset;
pub mod state;

pub use reset::{reset_wallet, ResetDecision, WalletResetPolicy};
pub use state::{WalletState, UNKNOWN_BLOCK_HEIGHT};
