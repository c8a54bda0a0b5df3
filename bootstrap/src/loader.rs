//! Background bootstrap attempts with a single in-flight slot.
//!
//! The foreground calls [`BootstrapLoader::start`] and gets an
//! [`AttemptHandle`] back. The attempt runs on its own named OS thread; the
//! handle can cancel it, watch its stage and await the terminal outcome.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use tokio::sync::{oneshot, watch};

use chainload_wallet_core::WalletState;

use crate::chain::ChainConstructor;
use crate::orchestrator::{CancelToken, Orchestrator, Outcome, Stage};
use crate::BootstrapError;

/// Occupancy of the loader's attempt slot. Dropping it frees the slot.
pub struct SlotLease {
    slot: Arc<AtomicBool>,
    attempt: u64,
}

impl Drop for SlotLease {
    fn drop(&mut self) {
        self.slot.store(false, Ordering::SeqCst);
        tracing::debug!(attempt = self.attempt, "bootstrap slot released");
    }
}

/// Starts bootstrap attempts for one wallet, at most one at a time.
///
/// The slot stays taken from `start` until the attempt ends in `Cancelled`
/// or `Failed`, or until the bundle delivered with `Ready` is dropped.
pub struct BootstrapLoader<K: ChainConstructor> {
    orchestrator: Arc<Orchestrator<K>>,
    slot: Arc<AtomicBool>,
    next_attempt: AtomicU64,
}

impl<K: ChainConstructor> BootstrapLoader<K> {
    pub fn new(orchestrator: Orchestrator<K>) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            slot: Arc::new(AtomicBool::new(false)),
            next_attempt: AtomicU64::new(1),
        }
    }

    /// Whether an attempt or its delivered bundle currently holds the slot.
    pub fn is_busy(&self) -> bool {
        self.slot.load(Ordering::SeqCst)
    }

    pub fn start(
        &self,
        wallet: Arc<dyn WalletState>,
    ) -> Result<AttemptHandle<K::Chain>, BootstrapError> {
        if self
            .slot
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!("bootstrap already in flight, rejecting start");
            return Err(BootstrapError::AlreadyRunning);
        }

        let attempt = self.next_attempt.fetch_add(1, Ordering::SeqCst);
        let lease = SlotLease {
            slot: self.slot.clone(),
            attempt,
        };
        let token = CancelToken::new();
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let (stage_tx, stage_rx) = watch::channel(Stage::Idle);

        let orchestrator = self.orchestrator.clone();
        let worker_token = token.clone();
        thread::Builder::new()
            .name(format!("chain-bootstrap-{attempt}"))
            .spawn(move || {
                let observe = |stage: Stage| {
                    stage_tx.send_replace(stage);
                };
                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    orchestrator.run_observed(wallet, &worker_token, &observe)
                }));
                let outcome = result.unwrap_or_else(|_| {
                    tracing::error!(attempt, "bootstrap worker panicked");
                    observe(Stage::Failed);
                    Outcome::Failed(BootstrapError::WorkerLost)
                });
                let outcome = match outcome {
                    Outcome::Ready(mut bundle) => {
                        bundle.attach_lease(lease);
                        Outcome::Ready(bundle)
                    }
                    other => {
                        drop(lease);
                        other
                    }
                };
                if outcome_tx.send(outcome).is_err() {
                    tracing::info!(attempt, "bootstrap outcome unclaimed, closing chain state");
                }
            })?;

        tracing::info!(attempt, "bootstrap started");
        Ok(AttemptHandle {
            attempt,
            token,
            stage: stage_rx,
            outcome: outcome_rx,
        })
    }
}

/// Foreground side of one running attempt.
pub struct AttemptHandle<C> {
    attempt: u64,
    token: CancelToken,
    stage: watch::Receiver<Stage>,
    outcome: oneshot::Receiver<Outcome<C>>,
}

impl<C> AttemptHandle<C> {
    pub fn id(&self) -> u64 {
        self.attempt
    }

    /// Ask the attempt to stop at the next stage boundary.
    pub fn cancel(&self, full_reset: bool) {
        tracing::info!(attempt = self.attempt, full_reset, "bootstrap cancellation requested");
        self.token.cancel(full_reset);
    }

    /// A token that cancels this attempt, for use from another task.
    pub fn canceller(&self) -> CancelToken {
        self.token.clone()
    }

    /// The most recently entered stage.
    pub fn stage(&self) -> Stage {
        *self.stage.borrow()
    }

    pub fn stage_updates(&self) -> watch::Receiver<Stage> {
        self.stage.clone()
    }

    pub async fn outcome(self) -> Outcome<C> {
        self.outcome
            .await
            .unwrap_or(Outcome::Failed(BootstrapError::WorkerLost))
    }

    /// Block the current thread until the attempt ends.
    ///
    /// # Panics
    ///
    /// Panics when called from inside an async runtime; use
    /// [`AttemptHandle::outcome`] there.
    pub fn wait(self) -> Outcome<C> {
        self.outcome
            .blocking_recv()
            .unwrap_or(Outcome::Failed(BootstrapError::WorkerLost))
    }
}
