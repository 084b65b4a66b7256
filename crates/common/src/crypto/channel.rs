//! Client-to-server confidential channel for private hash requests
//!
//! A client generates one ephemeral keypair per server and sends only the
//! public halves. Each server then derives a symmetric key from:
//! 1. **ECDH**: its long-term key against the client's ephemeral key (X25519)
//! 2. **Context**: `SHA-256("client" || client_pub || "server" || server_pub)`
//! 3. **HKDF-SHA256**: no salt, the shared point as input keying material
//!    and the context as `info`, expanded to a 32-byte AES-256-GCM key
//!
//! and seals its content hash under a fresh random 96-bit nonce, with no
//! associated data. The client runs the same derivation with its ephemeral
//! secret and the server's public key to open the result.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use hkdf::Hkdf;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::keys::{KeyError, PublicKey, SecretKey};

/// Size of the derived symmetric key in bytes (AES-256)
pub const SHARED_KEY_SIZE: usize = 32;
/// Size of an AES-GCM nonce in bytes
pub const AEAD_NONCE_SIZE: usize = 12;
/// Size of a channel context digest in bytes
pub const CONTEXT_SIZE: usize = 32;

const CLIENT_LABEL: &[u8] = b"client";
const SERVER_LABEL: &[u8] = b"server";

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("key error: {0}")]
    Key(#[from] KeyError),
    #[error("diffie-hellman produced a non-contributory shared point")]
    NonContributory,
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),
    #[error("random source failed: {0}")]
    Random(String),
    #[error("encryption failed")]
    Seal,
    #[error("decryption failed")]
    Open,
    #[error("invalid signature: {0}")]
    InvalidSignature(String),
    #[error("no ephemeral key for {0}")]
    MissingEphemeralKey(PublicKey),
    #[error("invalid length for {what}: expected {expected}, got {actual}")]
    InvalidLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Raw Diffie-Hellman output. Only ever fed into [`derive_key`].
pub struct SharedPoint([u8; 32]);

impl SharedPoint {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Computes the X25519 shared point between our secret and a peer's public key.
///
/// Symmetric: `shared_secret(a, B) == shared_secret(b, A)`. Low-order peer
/// points are rejected.
pub fn shared_secret(own: &SecretKey, peer: &PublicKey) -> Result<SharedPoint, CryptoError> {
    let peer = peer.to_x25519()?;
    let shared = own.to_x25519().diffie_hellman(&peer);
    if !shared.was_contributory() {
        return Err(CryptoError::NonContributory);
    }
    Ok(SharedPoint(shared.to_bytes()))
}

/// Binds a derived key to one (client ephemeral, server) pair.
pub fn derive_context(client: &PublicKey, server: &PublicKey) -> [u8; CONTEXT_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update(CLIENT_LABEL);
    hasher.update(client.to_bytes());
    hasher.update(SERVER_LABEL);
    hasher.update(server.to_bytes());
    hasher.finalize().into()
}

/// HKDF-SHA256 over the shared point with `context` as info.
pub fn derive_key(shared: &SharedPoint, context: &[u8]) -> Result<SharedKey, CryptoError> {
    let hkdf = Hkdf::<Sha256>::new(None, shared.as_bytes());
    let mut okm = [0u8; SHARED_KEY_SIZE];
    hkdf.expand(context, &mut okm)
        .map_err(|e| CryptoError::KeyDerivation(format!("HKDF expansion failed: {:?}", e)))?;
    Ok(SharedKey(okm))
}

/// Convenience for the whole derivation as seen from either side.
///
/// `client` is always the client's ephemeral public key and `server` the
/// server's long-term key, regardless of which side's secret is passed in.
pub fn channel_key(
    own: &SecretKey,
    peer: &PublicKey,
    client: &PublicKey,
    server: &PublicKey,
) -> Result<SharedKey, CryptoError> {
    let shared = shared_secret(own, peer)?;
    derive_key(&shared, &derive_context(client, server))
}

/// Symmetric AES-256-GCM key derived for one client/server pair
pub struct SharedKey([u8; SHARED_KEY_SIZE]);

impl SharedKey {
    pub fn seal(&self, nonce: &AeadNonce, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let cipher = Aes256Gcm::new_from_slice(&self.0).map_err(|_| CryptoError::Seal)?;
        cipher
            .encrypt(&Nonce::from(nonce.0), plaintext)
            .map_err(|_| CryptoError::Seal)
    }

    /// Fails on a wrong key, wrong nonce, or any tampering with the ciphertext.
    pub fn open(&self, nonce: &AeadNonce, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let cipher = Aes256Gcm::new_from_slice(&self.0).map_err(|_| CryptoError::Open)?;
        cipher
            .decrypt(&Nonce::from(nonce.0), ciphertext)
            .map_err(|_| CryptoError::Open)
    }
}

/// 96-bit AES-GCM nonce, fresh per sealed message
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AeadNonce([u8; AEAD_NONCE_SIZE]);

impl AeadNonce {
    pub fn generate() -> Result<Self, CryptoError> {
        let mut bytes = [0u8; AEAD_NONCE_SIZE];
        getrandom::getrandom(&mut bytes).map_err(|e| CryptoError::Random(e.to_string()))?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; AEAD_NONCE_SIZE] {
        &self.0
    }
}

impl From<[u8; AEAD_NONCE_SIZE]> for AeadNonce {
    fn from(bytes: [u8; AEAD_NONCE_SIZE]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for AeadNonce {
    type Error = CryptoError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let array: [u8; AEAD_NONCE_SIZE] =
            bytes.try_into().map_err(|_| CryptoError::InvalidLength {
                what: "aead nonce",
                expected: AEAD_NONCE_SIZE,
                actual: bytes.len(),
            })?;
        Ok(Self(array))
    }
}

impl Serialize for AeadNonce {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for AeadNonce {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        let bytes = hex::decode(encoded).map_err(serde::de::Error::custom)?;
        Self::try_from(bytes.as_slice()).map_err(serde::de::Error::custom)
    }
}
