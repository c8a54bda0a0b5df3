//! The staged bootstrap procedure.
//!
//! Stages run strictly in order on the calling thread. Between stages the
//! cancel token is consulted; a stage that has started always runs to
//! completion.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chainload_checkpoints::{apply, load_from, CheckpointSource, FileSource};
use chainload_store::{HeaderStore, ValidHashStore};
use chainload_store_lmdb::{LmdbHeaderStore, LmdbValidHashCache};
use chainload_types::{NetworkParams, Timestamp};
use chainload_wallet_core::{WalletResetPolicy, WalletState};

use crate::bundle::{ChainStateBundle, PartialChainState};
use crate::chain::ChainConstructor;
use crate::config::BootstrapConfig;
use crate::files::ChainFiles;
use crate::BootstrapError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Idle,
    ResetCheck,
    StoreOpen,
    CheckpointApply,
    CacheOpen,
    ChainBuild,
    Ready,
    Cancelled,
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::ResetCheck => "reset_check",
            Stage::StoreOpen => "store_open",
            Stage::CheckpointApply => "checkpoint_apply",
            Stage::CacheOpen => "cache_open",
            Stage::ChainBuild => "chain_build",
            Stage::Ready => "ready",
            Stage::Cancelled => "cancelled",
            Stage::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Ready | Stage::Cancelled | Stage::Failed)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Cancellation ───────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    full_reset: AtomicBool,
}

/// Shared "still wanted" flag plus the full-reset choice made when cancelling.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    state: Arc<CancelState>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Withdraw the attempt. Takes effect at the next stage boundary.
    pub fn cancel(&self, full_reset: bool) {
        self.state.full_reset.store(full_reset, Ordering::SeqCst);
        self.state.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_wanted(&self) -> bool {
        !self.state.cancelled.load(Ordering::SeqCst)
    }

    pub fn full_reset_requested(&self) -> bool {
        self.state.full_reset.load(Ordering::SeqCst)
    }
}

// ── Outcome ────────────────────────────────────────────────────────────

/// Terminal result of one bootstrap attempt.
pub enum Outcome<C> {
    Ready(ChainStateBundle<C>),
    Cancelled { full_reset: bool },
    Failed(BootstrapError),
}

impl<C> Outcome<C> {
    pub fn stage(&self) -> Stage {
        match self {
            Outcome::Ready(_) => Stage::Ready,
            Outcome::Cancelled { .. } => Stage::Cancelled,
            Outcome::Failed(_) => Stage::Failed,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Outcome::Ready(_))
    }

    pub fn into_bundle(self) -> Option<ChainStateBundle<C>> {
        match self {
            Outcome::Ready(bundle) => Some(bundle),
            _ => None,
        }
    }

    pub fn into_error(self) -> Option<BootstrapError> {
        match self {
            Outcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}

impl<C> fmt::Debug for Outcome<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Ready(bundle) => f.debug_tuple("Ready").field(bundle).finish(),
            Outcome::Cancelled { full_reset } => f
                .debug_struct("Cancelled")
                .field("full_reset", full_reset)
                .finish(),
            Outcome::Failed(e) => f.debug_tuple("Failed").field(e).finish(),
        }
    }
}

// ── Orchestrator ───────────────────────────────────────────────────────

/// Sequences one bootstrap attempt from reset check to a ready bundle.
pub struct Orchestrator<K: ChainConstructor> {
    params: NetworkParams,
    files: ChainFiles,
    checkpoints: Option<Arc<dyn CheckpointSource>>,
    checkpoint_height_threshold: u32,
    checkpoint_time_margin_secs: u64,
    header_store_map_size: usize,
    valid_hash_map_size: usize,
    constructor: K,
}

impl<K: ChainConstructor> Orchestrator<K> {
    pub fn new(config: &BootstrapConfig, constructor: K) -> Self {
        Self {
            params: config.params(),
            files: config.files(),
            checkpoints: Some(Arc::new(FileSource::new(config.checkpoints_path()))),
            checkpoint_height_threshold: config.checkpoint_height_threshold,
            checkpoint_time_margin_secs: config.checkpoint_time_margin_secs,
            header_store_map_size: config.header_store_map_size,
            valid_hash_map_size: config.valid_hash_map_size,
            constructor,
        }
    }

    /// Replace the configured checkpoint bundle.
    pub fn with_checkpoint_source(mut self, source: Arc<dyn CheckpointSource>) -> Self {
        self.checkpoints = Some(source);
        self
    }

    pub fn without_checkpoints(mut self) -> Self {
        self.checkpoints = None;
        self
    }

    pub fn files(&self) -> &ChainFiles {
        &self.files
    }

    pub fn params(&self) -> &NetworkParams {
        &self.params
    }

    pub fn run(&self, wallet: Arc<dyn WalletState>, token: &CancelToken) -> Outcome<K::Chain> {
        self.run_observed(wallet, token, &|_| {})
    }

    /// Run the attempt, reporting every stage to `observe` as it is entered.
    pub fn run_observed(
        &self,
        wallet: Arc<dyn WalletState>,
        token: &CancelToken,
        observe: &dyn Fn(Stage),
    ) -> Outcome<K::Chain> {
        let started = Instant::now();
        let partial = PartialChainState::new(self.files.clone());

        // ResetCheck
        if !token.is_wanted() {
            return cancelled(partial, token, observe);
        }
        enter(Stage::ResetCheck, observe);
        WalletResetPolicy::decide(self.files.header_store_exists()).apply(wallet.as_ref());

        // StoreOpen
        if !token.is_wanted() {
            return cancelled(partial, token, observe);
        }
        enter(Stage::StoreOpen, observe);
        let headers = match LmdbHeaderStore::open(
            &self.files.header_store,
            &self.params,
            self.header_store_map_size,
        ) {
            Ok(store) => Arc::new(store),
            Err(e) => return failed(BootstrapError::HeaderStoreCorrupt(e), observe),
        };

        // CheckpointApply
        if !token.is_wanted() {
            return cancelled(partial.with_headers(headers), token, observe);
        }
        let head = headers.chain_head();
        if head.height < self.checkpoint_height_threshold {
            enter(Stage::CheckpointApply, observe);
            self.apply_checkpoints(headers.as_ref(), wallet.earliest_key_creation_time());
        } else {
            tracing::debug!(
                height = head.height,
                threshold = self.checkpoint_height_threshold,
                "chain head above checkpoint threshold, skipping checkpoints"
            );
        }

        // CacheOpen
        if !token.is_wanted() {
            return cancelled(partial.with_headers(headers), token, observe);
        }
        enter(Stage::CacheOpen, observe);
        let valid_hashes =
            match LmdbValidHashCache::open(&self.files.valid_hashes, self.valid_hash_map_size) {
                Ok(cache) => Arc::new(cache),
                Err(e) => return failed(BootstrapError::ValidHashCacheCorrupt(e), observe),
            };

        // ChainBuild
        if !token.is_wanted() {
            let partial = partial.with_headers(headers).with_valid_hashes(valid_hashes);
            return cancelled(partial, token, observe);
        }
        enter(Stage::ChainBuild, observe);
        let chain = match self.constructor.construct(
            &self.params,
            wallet,
            headers.clone(),
            valid_hashes.clone(),
        ) {
            Ok(chain) => chain,
            Err(e) => return failed(e.into(), observe),
        };

        if !token.is_wanted() {
            drop(chain);
            let partial = partial.with_headers(headers).with_valid_hashes(valid_hashes);
            return cancelled(partial, token, observe);
        }

        tracing::info!(
            height = headers.chain_head().height,
            validated_hashes = valid_hashes.len().unwrap_or(0),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "chain state ready"
        );
        observe(Stage::Ready);
        Outcome::Ready(ChainStateBundle::new(
            self.files.clone(),
            headers,
            valid_hashes,
            chain,
        ))
    }

    /// Load and apply the bundled checkpoints. Failures are logged and dropped.
    fn apply_checkpoints(&self, headers: &dyn HeaderStore, earliest_key_time: Timestamp) {
        let Some(source) = &self.checkpoints else {
            tracing::debug!("no checkpoint source configured");
            return;
        };
        let key_time = earliest_key_time.saturating_sub_secs(self.checkpoint_time_margin_secs);

        match load_from(source.as_ref()).and_then(|set| apply(&set, headers, key_time)) {
            Ok(Some(checkpoint)) => {
                tracing::info!(
                    height = checkpoint.height,
                    key_time = key_time.as_secs(),
                    "chain head advanced to checkpoint"
                );
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!(
                    source = %source.describe(),
                    error = %e,
                    "failed to apply checkpoints, continuing without them"
                );
            }
        }
    }
}

fn enter(stage: Stage, observe: &dyn Fn(Stage)) {
    tracing::info!(stage = %stage, "bootstrap stage");
    observe(stage);
}

fn cancelled<C>(partial: PartialChainState, token: &CancelToken, observe: &dyn Fn(Stage)) -> Outcome<C> {
    let full_reset = token.full_reset_requested();
    tracing::info!(full_reset, "bootstrap cancelled");
    partial.cleanup(full_reset);
    observe(Stage::Cancelled);
    Outcome::Cancelled { full_reset }
}

fn failed<C>(error: BootstrapError, observe: &dyn Fn(Stage)) -> Outcome<C> {
    tracing::error!(error = %error, "bootstrap failed");
    observe(Stage::Failed);
    Outcome::Failed(error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_records_reset_choice() {
        let token = CancelToken::new();
        assert!(token.is_wanted());
        token.cancel(true);
        assert!(!token.is_wanted());
        assert!(token.full_reset_requested());

        let clone = token.clone();
        clone.cancel(false);
        assert!(!token.full_reset_requested());
    }

    #[test]
    fn terminal_stages() {
        assert!(Stage::Ready.is_terminal());
        assert!(Stage::Cancelled.is_terminal());
        assert!(Stage::Failed.is_terminal());
        assert!(!Stage::ChainBuild.is_terminal());
        assert_eq!(Stage::CheckpointApply.to_string(), "checkpoint_apply");
    }
}
