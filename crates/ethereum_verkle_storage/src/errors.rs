use thiserror::Error;

use crate::storage_trait::DbKey;

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum StorageError {
    #[error("integrity hash mismatch for node stored at {0}")]
    HashMismatch(DbKey),
    #[error("storage backend failure: {0}")]
    Backend(String),
}

pub type StorageResult<T> = Result<T, StorageError>;
