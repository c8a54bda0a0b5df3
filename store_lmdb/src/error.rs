use thiserror::Error;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("key not found: {0}")]
    NotFound(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("integrity check failed: {0}")]
    Integrity(String),
}

impl From<heed::Error> for LmdbError {
    fn from(e: heed::Error) -> Self {
        LmdbError::Heed(e.to_string())
    }
}

impl From<bincode::Error> for LmdbError {
    fn from(e: bincode::Error) -> Self {
        LmdbError::Serialization(e.to_string())
    }
}

impl From<LmdbError> for chainload_store::StoreError {
    fn from(e: LmdbError) -> Self {
        match e {
            LmdbError::Integrity(msg) => chainload_store::StoreError::Corruption(msg),
            LmdbError::NotFound(msg) => chainload_store::StoreError::NotFound(msg),
            LmdbError::Serialization(msg) => chainload_store::StoreError::Serialization(msg),
            other => chainload_store::StoreError::Backend(other.to_string()),
        }
    }
}
