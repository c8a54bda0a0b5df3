//! Validated-hash cache trait.

use chainload_types::BlockHash;

use crate::StoreError;

/// Allow-list of block hashes already fully validated under current rules.
pub trait ValidHashStore: Send + Sync {
    /// Whether `hash` is known valid. A backend that cannot answer must
    /// return `false`: membership is never assumed.
    fn contains(&self, hash: &BlockHash) -> bool;

    /// Record `hash` as fully validated.
    fn insert(&self, hash: &BlockHash) -> Result<(), StoreError>;

    /// Number of hashes in the cache.
    fn len(&self) -> Result<u64, StoreError>;

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}
