use chainload_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("failed to read checkpoints: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed checkpoint bundle at line {line}: {reason}")]
    Format { line: usize, reason: String },

    #[error("signed checkpoint bundles are not supported ({0} signatures)")]
    SignaturesUnsupported(u32),

    #[error("checkpoint set is empty")]
    Empty,

    #[error("checkpoint {index} does not advance both time and height")]
    NotMonotonic { index: usize },

    #[error("failed to write checkpoint to the header store: {0}")]
    Store(#[from] StoreError),
}
