//! Request and response bodies exchanged between clients and a leader

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::crypto::{EphemeralKeys, PublicKey, RequestNonce};
use crate::protocol::{SealedHash, SignedHash};
use crate::roster::Roster;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashPublicRequest {
    pub roster: Roster,
    pub url: String,
    pub nonce: RequestNonce,
}

impl HashPublicRequest {
    /// Builds a request under a freshly generated nonce.
    pub fn new(roster: Roster, url: impl Into<String>) -> Self {
        Self {
            roster,
            url: url.into(),
            nonce: RequestNonce::generate(),
        }
    }
}

/// Signed hashes keyed by server identity, plus the children that never
/// answered
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashPublicResponse {
    pub responses: BTreeMap<PublicKey, SignedHash>,
    #[serde(default)]
    pub missing: Vec<PublicKey>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashPrivateRequest {
    pub roster: Roster,
    pub url: String,
    pub client_public_keys: BTreeMap<PublicKey, PublicKey>,
}

impl HashPrivateRequest {
    pub fn new(roster: Roster, url: impl Into<String>, keys: &EphemeralKeys) -> Self {
        Self {
            roster,
            url: url.into(),
            client_public_keys: keys.public_keys(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashPrivateResponse {
    pub responses: BTreeMap<PublicKey, SealedHash>,
    #[serde(default)]
    pub missing: Vec<PublicKey>,
}

/// Either kind of request, tagged so a single entry point can dispatch it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HashRequest {
    Public(HashPublicRequest),
    Private(HashPrivateRequest),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HashResponse {
    Public(HashPublicResponse),
    Private(HashPrivateResponse),
}
