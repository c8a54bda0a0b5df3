//! Fundamental chain types shared by every crate in the workspace.
//!
//! Block hashes, the 80-byte block header, the stored-header record that pairs a
//! header with its height and cumulative work, timestamps, and per-network
//! parameters (genesis header and genesis work).

pub mod block;
pub mod error;
pub mod network;
pub mod time;

pub use block::{BlockHash, BlockHeader, StoredHeader};
pub use error::TypesError;
pub use network::{NetworkId, NetworkParams};
pub use time::Timestamp;
