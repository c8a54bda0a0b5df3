//! Header store trait.

use chainload_types::{BlockHash, StoredHeader};

use crate::StoreError;

/// Persistent index of block headers plus the chain head pointer.
pub trait HeaderStore: Send + Sync {
    /// The current chain head. Always available on an opened store.
    fn chain_head(&self) -> StoredHeader;

    /// Move the chain head pointer. The header should already be stored.
    fn set_chain_head(&self, head: &StoredHeader) -> Result<(), StoreError>;

    /// Look up a stored header by its hash.
    fn get(&self, hash: &BlockHash) -> Result<Option<StoredHeader>, StoreError>;

    /// Insert or replace a header, keyed by its hash.
    fn put(&self, header: &StoredHeader) -> Result<(), StoreError>;

    /// Number of headers in the index.
    fn header_count(&self) -> Result<u64, StoreError>;
}
