//! Checkpoint sets shipped with the wallet.
//!
//! A checkpoint set is an immutable list of stored headers at known heights.
//! Applying one to a young header store jumps its chain head forward so that
//! history older than the wallet's keys never has to be downloaded or
//! validated.

pub mod apply;
pub mod error;
pub mod set;
pub mod source;

pub use apply::apply;
pub use error::CheckpointError;
pub use set::{CheckpointSet, BUNDLE_MAGIC};
pub use source::{load_from, CheckpointSource, EmbeddedSource, FileSource};
