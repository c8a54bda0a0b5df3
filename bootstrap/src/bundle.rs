//! The ready chain state handed to the application, and cleanup of
//! half-built state when an attempt is cancelled.

use std::fmt;
use std::io;
use std::sync::Arc;

use chainload_store::HeaderStore;
use chainload_store_lmdb::{LmdbHeaderStore, LmdbValidHashCache};
use chainload_types::StoredHeader;

use crate::files::ChainFiles;
use crate::loader::SlotLease;

/// Header store, validated-hash cache and the chain built on them.
///
/// The caller owns the bundle. While it is alive it keeps the loader's
/// attempt slot occupied, so no second bootstrap can open the same files.
pub struct ChainStateBundle<C> {
    files: ChainFiles,
    headers: Arc<LmdbHeaderStore>,
    valid_hashes: Arc<LmdbValidHashCache>,
    chain: C,
    lease: Option<SlotLease>,
}

impl<C> ChainStateBundle<C> {
    pub(crate) fn new(
        files: ChainFiles,
        headers: Arc<LmdbHeaderStore>,
        valid_hashes: Arc<LmdbValidHashCache>,
        chain: C,
    ) -> Self {
        Self {
            files,
            headers,
            valid_hashes,
            chain,
            lease: None,
        }
    }

    pub(crate) fn attach_lease(&mut self, lease: SlotLease) {
        self.lease = Some(lease);
    }

    pub fn files(&self) -> &ChainFiles {
        &self.files
    }

    pub fn header_store(&self) -> &Arc<LmdbHeaderStore> {
        &self.headers
    }

    pub fn valid_hash_cache(&self) -> &Arc<LmdbValidHashCache> {
        &self.valid_hashes
    }

    pub fn chain(&self) -> &C {
        &self.chain
    }

    pub fn chain_mut(&mut self) -> &mut C {
        &mut self.chain
    }

    pub fn chain_head(&self) -> StoredHeader {
        self.headers.chain_head()
    }

    /// Close every handle and free the attempt slot. Files stay on disk.
    pub fn close(self) {
        let Self {
            files,
            headers,
            valid_hashes,
            chain,
            lease,
        } = self;
        drop(chain);
        drop(valid_hashes);
        drop(headers);
        tracing::info!(header_store = %files.header_store.display(), "chain state closed");
        drop(lease);
    }

    /// Close every handle, then delete both store files.
    pub fn delete(self) -> io::Result<()> {
        let files = self.files.clone();
        self.close();
        files.remove_all()
    }

    /// `close` or `delete`, depending on whether a full reset is wanted.
    pub fn teardown(self, reset: bool) -> io::Result<()> {
        if reset {
            self.delete()
        } else {
            self.close();
            Ok(())
        }
    }
}

impl<C> fmt::Debug for ChainStateBundle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainStateBundle")
            .field("files", &self.files)
            .field("head_height", &self.headers.chain_head().height)
            .field("leased", &self.lease.is_some())
            .finish_non_exhaustive()
    }
}

/// Handles opened by an attempt that has not reached `Ready`.
///
/// The orchestrator moves its handles in here when it sees cancellation, so
/// the cleanup holds the last reference to each store.
pub(crate) struct PartialChainState {
    files: ChainFiles,
    headers: Option<Arc<LmdbHeaderStore>>,
    valid_hashes: Option<Arc<LmdbValidHashCache>>,
}

impl PartialChainState {
    pub(crate) fn new(files: ChainFiles) -> Self {
        Self {
            files,
            headers: None,
            valid_hashes: None,
        }
    }

    pub(crate) fn with_headers(mut self, headers: Arc<LmdbHeaderStore>) -> Self {
        self.headers = Some(headers);
        self
    }

    pub(crate) fn with_valid_hashes(mut self, valid_hashes: Arc<LmdbValidHashCache>) -> Self {
        self.valid_hashes = Some(valid_hashes);
        self
    }

    /// Close the handles. With `full_reset` the store files are deleted
    /// too, whatever stage the attempt reached; otherwise they are left for
    /// the next attempt to resume from.
    ///
    /// Files are only deleted once every handle is closed. If another owner
    /// still holds a store, the files are kept and an error is logged.
    /// Returns whether the files were removed.
    pub(crate) fn cleanup(self, full_reset: bool) -> bool {
        let Self {
            files,
            headers,
            valid_hashes,
        } = self;
        let valid_hashes_closed = close(valid_hashes);
        let headers_closed = close(headers);

        if !full_reset {
            tracing::info!("cancelled, keeping chain state files for the next attempt");
            return false;
        }
        if !(headers_closed && valid_hashes_closed) {
            tracing::error!(
                headers_closed,
                valid_hashes_closed,
                "chain state still open elsewhere, not removing files"
            );
            return false;
        }
        match files.remove_all() {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "failed to remove chain state files after cancellation");
                false
            }
        }
    }
}

/// Drop `handle`, reporting whether that was the last reference.
fn close<T>(handle: Option<Arc<T>>) -> bool {
    match handle {
        Some(handle) => Arc::into_inner(handle).is_some(),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainload_types::{NetworkId, NetworkParams};

    const MAP_SIZE: usize = 4 * 1024 * 1024;

    fn open_bundle(dir: &std::path::Path) -> ChainStateBundle<()> {
        let files = ChainFiles::in_dir(dir);
        let params = NetworkParams::for_network(NetworkId::Regtest);
        let headers = LmdbHeaderStore::open(&files.header_store, &params, MAP_SIZE).unwrap();
        let valid_hashes = LmdbValidHashCache::open(&files.valid_hashes, MAP_SIZE).unwrap();
        ChainStateBundle::new(files, Arc::new(headers), Arc::new(valid_hashes), ())
    }

    #[test]
    fn close_keeps_files() {
        let dir = tempfile::tempdir().expect("temp dir");
        let bundle = open_bundle(dir.path());
        let files = bundle.files().clone();
        bundle.teardown(false).unwrap();
        assert!(files.header_store_exists());
        assert!(files.valid_hashes_exists());
    }

    #[test]
    fn delete_removes_files() {
        let dir = tempfile::tempdir().expect("temp dir");
        let bundle = open_bundle(dir.path());
        let files = bundle.files().clone();
        bundle.teardown(true).unwrap();
        assert!(!files.header_store_exists());
        assert!(!files.valid_hashes_exists());
    }

    #[test]
    fn partial_cleanup_respects_reset_flag() {
        let dir = tempfile::tempdir().expect("temp dir");
        let files = ChainFiles::in_dir(dir.path());
        let params = NetworkParams::for_network(NetworkId::Regtest);

        let headers = LmdbHeaderStore::open(&files.header_store, &params, MAP_SIZE).unwrap();
        let partial = PartialChainState::new(files.clone()).with_headers(Arc::new(headers));
        assert!(!partial.cleanup(false));
        assert!(files.header_store_exists());

        let headers = LmdbHeaderStore::open(&files.header_store, &params, MAP_SIZE).unwrap();
        let partial = PartialChainState::new(files.clone()).with_headers(Arc::new(headers));
        assert!(partial.cleanup(true));
        assert!(!files.header_store_exists());
    }

    #[test]
    fn full_reset_waits_for_every_handle() {
        let dir = tempfile::tempdir().expect("temp dir");
        let files = ChainFiles::in_dir(dir.path());
        let params = NetworkParams::for_network(NetworkId::Regtest);

        let headers = Arc::new(LmdbHeaderStore::open(&files.header_store, &params, MAP_SIZE).unwrap());
        let valid_hashes = Arc::new(LmdbValidHashCache::open(&files.valid_hashes, MAP_SIZE).unwrap());
        let still_open = headers.clone();
        let partial = PartialChainState::new(files.clone())
            .with_headers(headers)
            .with_valid_hashes(valid_hashes);

        assert!(!partial.cleanup(true));
        assert!(files.header_store_exists());
        assert_eq!(Arc::strong_count(&still_open), 1);
    }
}
