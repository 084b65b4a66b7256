//! Cryptographic primitives for Vantage
//!
//! - **Identity**: Ed25519 keypairs (`SecretKey`/`PublicKey`) name every
//!   server in a roster and double as its overlay node id
//! - **Public requests**: servers sign `hash || nonce` so clients can check
//!   who vouched for which content, and that the answer is fresh
//! - **Private requests**: servers seal their hash with AES-256-GCM under a
//!   key derived from ECDH against a per-server client ephemeral key, so
//!   nobody but the requesting client learns what any server saw
//!
//! Content and context hashes are SHA-256 throughout.

mod channel;
mod ephemeral;
mod keys;
mod signing;

pub use channel::{
    channel_key, derive_context, derive_key, shared_secret, AeadNonce, CryptoError, SharedKey,
    SharedPoint, AEAD_NONCE_SIZE, CONTEXT_SIZE, SHARED_KEY_SIZE,
};
pub use ed25519_dalek::Signature;
pub use ephemeral::{EphemeralKeyPair, EphemeralKeys};
pub use keys::{KeyError, PublicKey, SecretKey, PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE};
pub use signing::{
    sign_with_nonce, verify_with_nonce, RequestNonce, REQUEST_NONCE_SIZE, SIGNATURE_SIZE,
};
