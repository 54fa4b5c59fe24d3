//! Error types for hashtree

use thiserror::Error;

/// Errors that can occur in Merkle tree operations
///
/// Plain lookups (`find_one`, `get_proof`, `root_hash`) report absence with
/// `None`; these variants surface only where a caller asks for a reason.
#[derive(Error, Debug)]
pub enum Error {
    /// The tree was never built or was mutated since the last build
    #[error("Tree is not ready: build it after the last mutation")]
    TreeNotReady,

    /// Digest is not present in the leaf level
    #[error("Leaf not found: {0}")]
    LeafNotFound(String),

    /// Invalid proof format
    #[error("Invalid proof: {0}")]
    InvalidProof(String),

    /// Hash mismatch
    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },

    /// Digest text decoding error
    #[error("Encoding error: {0}")]
    Encoding(#[from] hashtree_types::Error),
}

/// Result type for Merkle tree operations
pub type Result<T> = std::result::Result<T, Error>;
