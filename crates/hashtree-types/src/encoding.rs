//! Digest value type and its text encodings
//!
//! A [`Digest`] is the raw output of a hash function. Equality, ordering and
//! hashing always operate on the raw bytes; the hex and base64url renditions
//! exist only for display and for use as external string keys.

use crate::error::{Error, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Hash digest used as both leaf identity and tree node value
///
/// The derived `Ord` is byte-wise lexicographic: the first differing byte
/// decides, and a strict prefix sorts before the longer digest.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest(Vec<u8>);

impl Digest {
    /// Create from raw bytes
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Digest(bytes.into())
    }

    /// Parse from hex-encoded string
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)?;
        Self::non_empty(bytes)
    }

    /// Parse from URL-safe, unpadded base64
    pub fn from_base64url(s: &str) -> Result<Self> {
        let bytes = URL_SAFE_NO_PAD.decode(s)?;
        Self::non_empty(bytes)
    }

    fn non_empty(bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::InvalidEncoding("digest cannot be empty".to_string()));
        }
        Ok(Digest(bytes))
    }

    /// Encode as hex string (lowercase)
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Encode as URL-safe base64 with padding stripped
    pub fn to_base64url(&self) -> String {
        URL_SAFE_NO_PAD.encode(&self.0)
    }

    /// Concatenate two digests, left then right, with no separator
    pub fn concat(left: &Digest, right: &Digest) -> Vec<u8> {
        let mut out = Vec::with_capacity(left.len() + right.len());
        out.extend_from_slice(&left.0);
        out.extend_from_slice(&right.0);
        out
    }

    /// Get as a byte slice
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for a zero-length digest
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Convert into the underlying bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Digest {
    fn from(bytes: Vec<u8>) -> Self {
        Digest(bytes)
    }
}

impl<const N: usize> From<[u8; N]> for Digest {
    fn from(bytes: [u8; N]) -> Self {
        Digest(bytes.to_vec())
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Digest {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_base64url())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        // a zero-length digest serializes as ""
        if s.is_empty() {
            return Ok(Digest::from_bytes(Vec::new()));
        }
        Digest::from_base64url(&s).map_err(serde::de::Error::custom)
    }
}
