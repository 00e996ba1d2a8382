use std::path::PathBuf;

use ethereum_verkle_storage::errors::StorageError;
use thiserror::Error;

use crate::crypto::errors::CryptoError;
use crate::verkle_tree::basic_data::BasicDataError;
use crate::verkle_tree::types::NodeLocation;

#[derive(Debug, Error)]
pub enum VerkleTrieError {
    #[error("key length must be 32 bytes, got {0}")]
    KeyLengthInvalid(usize),
    #[error("value length must be 32 bytes, got {0}")]
    ValueLengthInvalid(usize),
    #[error("node at {location} is referenced but missing from storage")]
    StorageMiss { location: NodeLocation },
    #[error("malformed stored node at {location}: {reason}")]
    MalformedNode { location: NodeLocation, reason: String },
    #[error("no node kind is stored at a location of {0} bytes")]
    UnknownLocationLength(usize),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    BasicData(#[from] BasicDataError),
    #[error("dot export path must end in .dot or .gv, got {}", .0.display())]
    InvalidDotPath(PathBuf),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type VerkleTrieResult<T> = Result<T, VerkleTrieError>;
