//! LMDB storage backend for local chain state.
//!
//! Implements the header store and validated-hash cache traits from
//! `chainload-store` using the `heed` LMDB bindings. Each store lives in its
//! own single-file environment (`NO_SUB_DIR`), so deleting a store means
//! deleting one data file and its `-lock` companion.
//!
//! Both stores follow the same open discipline: open or create the file, run
//! schema migration and an integrity pass, then probe. Any failure closes the
//! environment, deletes the files and reports [`StoreError::Corruption`], so
//! the next open starts from a clean slate.
//!
//! [`StoreError::Corruption`]: chainload_store::StoreError::Corruption

pub mod environment;
pub mod error;
pub mod header;
pub mod integrity;
pub mod meta;
pub mod migration;
pub mod valid_hash;

pub use environment::{env_file_exists, lock_file_path, remove_env_files, LmdbEnvironment};
pub use error::LmdbError;
pub use header::{LmdbHeaderStore, DEFAULT_HEADER_MAP_SIZE};
pub use valid_hash::{LmdbValidHashCache, DEFAULT_VALID_HASH_MAP_SIZE};
