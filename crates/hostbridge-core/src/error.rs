//! Error types for the value bridge.

use thiserror::Error;

use crate::value::ValueKind;

/// Errors raised while constructing or accessing bridge values.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid {kind} length: {actual} != {expected}")]
    InvalidLength {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid {kind} hex length: {actual} != {expected}")]
    InvalidHexLength {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid hex encoding: {0}")]
    InvalidHexEncoding(#[from] hex::FromHexError),

    #[error("empty hex string")]
    EmptyHex,

    #[error("hex string without 0x prefix")]
    MissingHexPrefix,

    #[error("hex string of odd length")]
    OddHexLength,

    #[error("index out of bounds: {index} not in [0, {size})")]
    IndexOutOfBounds { index: isize, size: usize },

    #[error("type mismatch: requested {requested}, stored {stored}")]
    TypeMismatch {
        requested: ValueKind,
        stored: ValueKind,
    },

    #[error("unsupported base: {0}")]
    InvalidBase(u32),

    #[error("invalid number {text:?} in base {base}")]
    InvalidNumber { text: String, base: u32 },

    #[error("invalid enode: {0}")]
    InvalidEnode(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

/// Result type for value bridge operations.
pub type Result<T> = std::result::Result<T, CoreError>;
