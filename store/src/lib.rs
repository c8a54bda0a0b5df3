//! Abstract storage traits for local chain state.
//!
//! Every storage backend (LMDB on disk, in-memory for testing) implements
//! these traits. The bootstrap pipeline and the chain collaborator depend only
//! on the traits.

pub mod error;
pub mod header;
pub mod meta;
pub mod valid_hash;

pub use error::StoreError;
pub use header::HeaderStore;
pub use meta::MetaStore;
pub use valid_hash::ValidHashStore;
