//! Content hashing.

use sbor::prelude::*;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A 32-byte blake3 content hash.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, BasicSbor)]
#[sbor(transparent)]
pub struct Hash([u8; 32]);

impl Hash {
    /// The all-zero hash, used as a sentinel for "no value".
    pub const ZERO: Self = Hash([0u8; 32]);

    /// Digest arbitrary bytes into a hash.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Hash(*blake3::hash(bytes).as_bytes())
    }

    /// Wrap an already-computed 32-byte digest.
    pub const fn from_raw(raw: [u8; 32]) -> Self {
        Hash(raw)
    }

    /// Get the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check whether this is the zero sentinel.
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

/// Errors from parsing a hash out of a hex string.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HexError {
    #[error("invalid hex encoding: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("invalid length: expected 32 bytes, got {0}")]
    InvalidLength(usize),
}

impl FromStr for Hash {
    type Err = HexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        let raw: [u8; 32] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| HexError::InvalidLength(b.len()))?;
        Ok(Hash(raw))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form: first 8 hex chars, enough to eyeball in logs.
        write!(f, "{}", &hex::encode(self.0)[..8])
    }
}
