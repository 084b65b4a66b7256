//! Freshness-bound signatures over content hashes
//!
//! A public request carries a client-chosen random nonce. Each server signs
//! `hash || nonce` with its long-term Ed25519 key, so a signature observed
//! for one request cannot be replayed as an answer to another.

use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::channel::CryptoError;
use super::keys::{PublicKey, SecretKey};

/// Size of a request nonce in bytes
pub const REQUEST_NONCE_SIZE: usize = 32;
/// Size of an Ed25519 signature in bytes
pub const SIGNATURE_SIZE: usize = 64;

/// Client-chosen freshness value for a public hash request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestNonce([u8; REQUEST_NONCE_SIZE]);

impl RequestNonce {
    pub fn generate() -> Self {
        let mut bytes = [0u8; REQUEST_NONCE_SIZE];
        rand::rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; REQUEST_NONCE_SIZE] {
        &self.0
    }
}

impl From<[u8; REQUEST_NONCE_SIZE]> for RequestNonce {
    fn from(bytes: [u8; REQUEST_NONCE_SIZE]) -> Self {
        Self(bytes)
    }
}

impl Serialize for RequestNonce {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for RequestNonce {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        let mut bytes = [0u8; REQUEST_NONCE_SIZE];
        hex::decode_to_slice(&encoded, &mut bytes).map_err(|_| {
            serde::de::Error::custom(format!(
                "request nonce must be {} hex-encoded bytes",
                REQUEST_NONCE_SIZE
            ))
        })?;
        Ok(Self(bytes))
    }
}

fn signed_message(hash: &[u8], nonce: &RequestNonce) -> Vec<u8> {
    let mut msg = Vec::with_capacity(hash.len() + REQUEST_NONCE_SIZE);
    msg.extend_from_slice(hash);
    msg.extend_from_slice(nonce.as_bytes());
    msg
}

/// Signs `hash || nonce` with the server's long-term key.
pub fn sign_with_nonce(secret: &SecretKey, hash: &[u8], nonce: &RequestNonce) -> Vec<u8> {
    secret
        .sign(&signed_message(hash, nonce))
        .to_bytes()
        .to_vec()
}

pub fn verify_with_nonce(
    public: &PublicKey,
    hash: &[u8],
    nonce: &RequestNonce,
    signature: &[u8],
) -> Result<(), CryptoError> {
    let signature = ed25519_dalek::Signature::from_slice(signature)
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
    public
        .verify(&signed_message(hash, nonce), &signature)
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_signature_binds_hash_and_nonce() {
        let server = SecretKey::generate();
        let nonce = RequestNonce::generate();
        let hash = [7u8; 32];

        let signature = sign_with_nonce(&server, &hash, &nonce);
        assert_eq!(signature.len(), SIGNATURE_SIZE);
        verify_with_nonce(&server.public(), &hash, &nonce, &signature).unwrap();

        // replay against a different request
        let fresh = RequestNonce::generate();
        assert!(verify_with_nonce(&server.public(), &hash, &fresh, &signature).is_err());

        // different content
        assert!(verify_with_nonce(&server.public(), &[8u8; 32], &nonce, &signature).is_err());

        // different signer
        let other = SecretKey::generate().public();
        assert!(verify_with_nonce(&other, &hash, &nonce, &signature).is_err());
    }

    #[test]
    fn test_fresh_nonce_changes_signature() {
        let server = SecretKey::generate();
        let hash = [7u8; 32];
        let first = sign_with_nonce(&server, &hash, &RequestNonce::generate());
        let second = sign_with_nonce(&server, &hash, &RequestNonce::generate());
        assert_ne!(first, second);
    }

    #[test]
    fn test_truncated_signature_is_rejected() {
        let server = SecretKey::generate();
        let nonce = RequestNonce::generate();
        let signature = sign_with_nonce(&server, b"hash", &nonce);

        let err = verify_with_nonce(&server.public(), b"hash", &nonce, &signature[..63]);
        assert!(matches!(err, Err(CryptoError::InvalidSignature(_))));
    }

    #[test]
    fn test_nonce_serde() {
        let nonce = RequestNonce::from([0xab; REQUEST_NONCE_SIZE]);
        let json = serde_json::to_string(&nonce).unwrap();
        assert_eq!(json, format!("\"{}\"", "ab".repeat(REQUEST_NONCE_SIZE)));
        assert_eq!(serde_json::from_str::<RequestNonce>(&json).unwrap(), nonce);
        assert!(serde_json::from_str::<RequestNonce>("\"abab\"").is_err());
    }
}
