//! Content digests for ledger entities.
//!
//! Every hash in the ledger is BLAKE3-256 over the canonical `bincode`
//! encoding of a value. Re-encoding an unchanged value yields identical bytes,
//! so digests are stable across the network.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named alias for a 32-byte(u8) array, used to represent a 256-bit hash.
pub type H256 = [u8; 32];

/// A 32-byte content digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Hash(pub H256);

impl Hash {
    /// The zero hash. Used as the previous-hash of genesis and as the
    /// Merkle root of a block without transactions.
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn from_bytes(bytes: H256) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &H256 {
        &self.0
    }

    /// Lowercase hex without prefix. This is the key format of every store.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a 64-character hex string (optional `0x` prefix).
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let mut arr = [0u8; 32];
        hex::decode_to_slice(s, &mut arr)?;
        Ok(Self(arr))
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", &self.to_hex()[..12])
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<H256> for Hash {
    fn from(bytes: H256) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Digest raw bytes.
pub fn digest(data: &[u8]) -> Hash {
    Hash(blake3::hash(data).into())
}

/// Digest the concatenation of several byte slices without allocating.
pub fn digest_concat(parts: &[&[u8]]) -> Hash {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(part);
    }
    Hash(hasher.finalize().into())
}

/// Digest the canonical encoding of a value.
pub fn content_hash<T: Serialize + ?Sized>(value: &T) -> Hash {
    // bincode cannot fail on plain structs, vectors and fixed arrays
    let encoded = bincode::serialize(value).expect("canonical encoding is infallible");
    digest(&encoded)
}
