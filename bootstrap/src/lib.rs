//! Local chain-state bootstrap and recovery.
//!
//! Opens (or rebuilds) the on-disk header store, applies bundled checkpoints
//! to young stores, opens the validated-hash cache and hands everything to a
//! chain constructor. The whole procedure runs on a background worker and can
//! be cancelled between stages.
//!
//! ```text
//! Idle → ResetCheck → StoreOpen → CheckpointApply → CacheOpen → ChainBuild → Ready
//!                         │                            │             │
//!                         └──────── Failed ────────────┴─────────────┘
//! any stage boundary ──→ Cancelled
//! ```

pub mod bundle;
pub mod chain;
pub mod config;
pub mod error;
pub mod files;
pub mod loader;
pub mod logging;
pub mod orchestrator;

pub use bundle::ChainStateBundle;
pub use chain::{ChainConstructionError, ChainConstructor, HeaderChain, HeaderChainConstructor};
pub use config::BootstrapConfig;
pub use error::BootstrapError;
pub use files::ChainFiles;
pub use loader::{AttemptHandle, BootstrapLoader, SlotLease};
pub use logging::{init_logging, LogFormat};
pub use orchestrator::{CancelToken, Orchestrator, Outcome, Stage};
