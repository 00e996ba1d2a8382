//! Field-wise access to the basic-data account leaf.
//!
//! The 32-byte value packs four account fields at fixed offsets, all
//! multi-byte fields little-endian:
//!
//! | field     | offset | size |
//! |-----------|--------|------|
//! | version   | 0      | 1    |
//! | (reserved)| 1      | 4    |
//! | code_size | 5      | 3    |
//! | nonce     | 8      | 8    |
//! | balance   | 16     | 16   |
//!
//! Setters erase the field window and write the supplied bytes in place,
//! leaving every other byte of the value untouched.

use thiserror::Error;

use crate::verkle_tree::types::TrieValue;

#[cfg(test)]
#[path = "basic_data_test.rs"]
mod basic_data_test;

pub const VERSION_OFFSET: usize = 0;
pub const VERSION_BYTES: usize = 1;
pub const CODE_SIZE_OFFSET: usize = 5;
pub const CODE_SIZE_BYTES: usize = 3;
pub const NONCE_OFFSET: usize = 8;
pub const NONCE_BYTES: usize = 8;
pub const BALANCE_OFFSET: usize = 16;
pub const BALANCE_BYTES: usize = 16;

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum BasicDataError {
    #[error("{field} field must be {expected} bytes, got {actual}")]
    FieldSize { field: &'static str, expected: usize, actual: usize },
}

pub type BasicDataResult<T> = Result<T, BasicDataError>;

fn set_field(
    value: TrieValue,
    field: &'static str,
    offset: usize,
    size: usize,
    bytes: &[u8],
) -> BasicDataResult<TrieValue> {
    if bytes.len() != size {
        return Err(BasicDataError::FieldSize { field, expected: size, actual: bytes.len() });
    }
    let mut out = value;
    out.0[offset..offset + size].copy_from_slice(bytes);
    Ok(out)
}

pub fn set_version(value: TrieValue, version: &[u8]) -> BasicDataResult<TrieValue> {
    set_field(value, "version", VERSION_OFFSET, VERSION_BYTES, version)
}

pub fn set_code_size(value: TrieValue, code_size: &[u8]) -> BasicDataResult<TrieValue> {
    set_field(value, "code_size", CODE_SIZE_OFFSET, CODE_SIZE_BYTES, code_size)
}

pub fn set_nonce(value: TrieValue, nonce: &[u8]) -> BasicDataResult<TrieValue> {
    set_field(value, "nonce", NONCE_OFFSET, NONCE_BYTES, nonce)
}

pub fn set_balance(value: TrieValue, balance: &[u8]) -> BasicDataResult<TrieValue> {
    set_field(value, "balance", BALANCE_OFFSET, BALANCE_BYTES, balance)
}

pub fn version(value: &TrieValue) -> u8 {
    value.0[VERSION_OFFSET]
}

pub fn code_size(value: &TrieValue) -> [u8; CODE_SIZE_BYTES] {
    let mut out = [0; CODE_SIZE_BYTES];
    out.copy_from_slice(&value.0[CODE_SIZE_OFFSET..CODE_SIZE_OFFSET + CODE_SIZE_BYTES]);
    out
}

pub fn code_size_u32(value: &TrieValue) -> u32 {
    let field = code_size(value);
    u32::from_le_bytes([field[0], field[1], field[2], 0])
}

pub fn nonce(value: &TrieValue) -> [u8; NONCE_BYTES] {
    let mut out = [0; NONCE_BYTES];
    out.copy_from_slice(&value.0[NONCE_OFFSET..NONCE_OFFSET + NONCE_BYTES]);
    out
}

pub fn nonce_u64(value: &TrieValue) -> u64 {
    u64::from_le_bytes(nonce(value))
}

pub fn balance(value: &TrieValue) -> [u8; BALANCE_BYTES] {
    let mut out = [0; BALANCE_BYTES];
    out.copy_from_slice(&value.0[BALANCE_OFFSET..BALANCE_OFFSET + BALANCE_BYTES]);
    out
}

pub fn balance_u128(value: &TrieValue) -> u128 {
    u128::from_le_bytes(balance(value))
}
