//! The chain collaborator: turns opened stores into a usable chain.

use std::sync::Arc;

use thiserror::Error;

use chainload_store::{HeaderStore, StoreError, ValidHashStore};
use chainload_types::{BlockHash, NetworkParams, StoredHeader};
use chainload_wallet_core::WalletState;

#[derive(Debug, Error)]
pub enum ChainConstructionError {
    #[error("chain head {0} is missing from the header index")]
    HeadMissing(BlockHash),

    #[error("header store error: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Other(String),
}

/// Builds the application's chain object once both stores are open.
pub trait ChainConstructor: Send + Sync + 'static {
    type Chain: Send + 'static;

    fn construct(
        &self,
        params: &NetworkParams,
        wallet: Arc<dyn WalletState>,
        headers: Arc<dyn HeaderStore>,
        valid_hashes: Arc<dyn ValidHashStore>,
    ) -> Result<Self::Chain, ChainConstructionError>;
}

/// Builds a [`HeaderChain`] directly on top of the stores.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeaderChainConstructor;

impl ChainConstructor for HeaderChainConstructor {
    type Chain = HeaderChain;

    fn construct(
        &self,
        params: &NetworkParams,
        wallet: Arc<dyn WalletState>,
        headers: Arc<dyn HeaderStore>,
        valid_hashes: Arc<dyn ValidHashStore>,
    ) -> Result<HeaderChain, ChainConstructionError> {
        let head = headers.chain_head();
        if headers.get(&head.hash())?.is_none() {
            return Err(ChainConstructionError::HeadMissing(head.hash()));
        }

        let last_seen = wallet.last_seen_block_height();
        if last_seen > i64::from(head.height) {
            tracing::warn!(
                wallet_height = last_seen,
                head_height = head.height,
                "wallet has seen blocks beyond the local chain head"
            );
        }

        tracing::info!(
            network = params.id.as_str(),
            height = head.height,
            head = %head.hash(),
            "chain constructed"
        );
        Ok(HeaderChain {
            params: params.clone(),
            wallet,
            headers,
            valid_hashes,
        })
    }
}

/// A header-only chain view: head, header lookups and validation shortcuts.
pub struct HeaderChain {
    params: NetworkParams,
    wallet: Arc<dyn WalletState>,
    headers: Arc<dyn HeaderStore>,
    valid_hashes: Arc<dyn ValidHashStore>,
}

impl HeaderChain {
    pub fn params(&self) -> &NetworkParams {
        &self.params
    }

    pub fn wallet(&self) -> &Arc<dyn WalletState> {
        &self.wallet
    }

    pub fn head(&self) -> StoredHeader {
        self.headers.chain_head()
    }

    pub fn header(&self, hash: &BlockHash) -> Result<Option<StoredHeader>, StoreError> {
        self.headers.get(hash)
    }

    /// Whether full validation of `hash` can be skipped.
    pub fn is_validated(&self, hash: &BlockHash) -> bool {
        self.valid_hashes.contains(hash)
    }

    pub fn mark_validated(&self, hash: &BlockHash) -> Result<(), StoreError> {
        self.valid_hashes.insert(hash)
    }
}
