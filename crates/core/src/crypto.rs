//! Ed25519 keys, signatures and address derivation.
//!
//! Raw key material crosses the crate boundary only through the checked
//! `from_slice` / `from_seed` constructors; a wrong length is a hard error,
//! never truncated or padded.

use crate::hash::Hash;
use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const PUBLIC_KEY_LEN: usize = 32;
pub const KEYPAIR_LEN: usize = 64;
pub const SEED_LEN: usize = 32;
pub const SIGNATURE_LEN: usize = 64;
pub const ADDRESS_LEN: usize = 20;

/// Errors that can occur during cryptographic operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid seed length (expected 32 bytes, got {0})")]
    InvalidSeed(usize),
    #[error("invalid private key")]
    InvalidPrivateKey,
    #[error("invalid public key")]
    InvalidPublicKey,
    #[error("invalid signature encoding")]
    InvalidSignature,
    #[error("invalid address format")]
    InvalidAddress,
    #[error("signature verification failed")]
    VerificationFailed,
}

fn fixed<const N: usize>(bytes: &[u8], err: CryptoError) -> Result<[u8; N], CryptoError> {
    <[u8; N]>::try_from(bytes).map_err(|_| err)
}

/// A 20-byte account address: the last 20 bytes of a public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Address(pub [u8; ADDRESS_LEN]);

impl Address {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        fixed(bytes, CryptoError::InvalidAddress).map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a hex string (with or without 0x prefix).
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|_| CryptoError::InvalidAddress)?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A raw Ed25519 public key as carried on the wire.
///
/// Point validity is checked lazily, at verification time.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PublicKey(pub [u8; PUBLIC_KEY_LEN]);

impl PublicKey {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        fixed(bytes, CryptoError::InvalidPublicKey).map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.0
    }

    /// Derive the address: the trailing 20 bytes of the key.
    pub fn to_address(&self) -> Address {
        let mut addr = [0u8; ADDRESS_LEN];
        addr.copy_from_slice(&self.0[PUBLIC_KEY_LEN - ADDRESS_LEN..]);
        Address(addr)
    }

    /// Verify `signature` over `message`.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), CryptoError> {
        let key = VerifyingKey::from_bytes(&self.0).map_err(|_| CryptoError::InvalidPublicKey)?;
        key.verify(message, &DalekSignature::from_bytes(&signature.0))
            .map_err(|_| CryptoError::VerificationFailed)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// A 64-byte Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; SIGNATURE_LEN]);

impl Signature {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        fixed(bytes, CryptoError::InvalidSignature).map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self([0u8; SIGNATURE_LEN])
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}...)", &self.to_hex()[..16])
    }
}

// serde only derives arrays up to 32 elements; encode as a byte sequence and
// reject anything that is not exactly 64 bytes on the way back in.
impl Serialize for Signature {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes: Vec<u8> = Deserialize::deserialize(deserializer)?;
        Signature::from_slice(&bytes).map_err(serde::de::Error::custom)
    }
}

/// A keypair for signing blocks and transaction inputs.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
    pub public_key: PublicKey,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::generate(&mut OsRng))
    }

    /// Deterministically derive a keypair from a 32-byte seed.
    pub fn from_seed(seed: &[u8]) -> Result<Self, CryptoError> {
        let seed: [u8; SEED_LEN] = fixed(seed, CryptoError::InvalidSeed(seed.len()))?;
        Ok(Self::from_seed_bytes(&seed))
    }

    pub fn from_seed_bytes(seed: &[u8; SEED_LEN]) -> Self {
        Self::from_signing_key(SigningKey::from_bytes(seed))
    }

    /// Same as [`Keypair::from_seed`] for a hex-encoded seed.
    pub fn from_seed_hex(seed: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(seed).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Self::from_seed(&bytes)
    }

    /// Load the 64-byte `seed || public key` form.
    pub fn from_keypair_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; KEYPAIR_LEN] = fixed(bytes, CryptoError::InvalidPrivateKey)?;
        SigningKey::from_keypair_bytes(&bytes)
            .map(Self::from_signing_key)
            .map_err(|_| CryptoError::InvalidPrivateKey)
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let public_key = PublicKey(signing_key.verifying_key().to_bytes());
        Self {
            signing_key,
            public_key,
        }
    }

    /// The 64-byte private key (`seed || public key`).
    pub fn to_keypair_bytes(&self) -> [u8; KEYPAIR_LEN] {
        self.signing_key.to_keypair_bytes()
    }

    pub fn seed(&self) -> [u8; SEED_LEN] {
        self.signing_key.to_bytes()
    }

    pub fn address(&self) -> Address {
        self.public_key.to_address()
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.signing_key.sign(message).to_bytes())
    }

    pub fn sign_hash(&self, hash: &Hash) -> Signature {
        self.sign(hash.as_bytes())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("address", &self.address())
            .finish()
    }
}
