use thiserror::Error;

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum CryptoError {
    #[error("invalid {kind} byte length: expected {expected}, got {actual}")]
    InvalidLength { kind: &'static str, expected: usize, actual: usize },
    #[error("point is not on the banderwagon curve")]
    NotOnCurve,
    #[error("failed to decompress a 32-byte commitment")]
    Decompression,
}

pub type CryptoResult<T> = Result<T, CryptoError>;
