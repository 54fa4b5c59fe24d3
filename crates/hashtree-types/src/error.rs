//! Error types for hashtree-types

use thiserror::Error;

/// Errors that can occur when decoding digests
#[derive(Error, Debug)]
pub enum Error {
    /// Base64 decoding error
    #[error("Base64 decoding error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Hex decoding error
    #[error("Hex decoding error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Input decoded but does not form a usable digest
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),
}

/// Result type for hashtree-types operations
pub type Result<T> = std::result::Result<T, Error>;
