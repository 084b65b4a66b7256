//! Client-side request assembly and response checking
//!
//! Clients never trust the leader: every entry in a public response must
//! carry a valid signature by a roster member over `hash || nonce`, and
//! every entry in a private response must decrypt under the ephemeral key
//! generated for that member. A single bad entry rejects the whole
//! response.

use std::collections::BTreeMap;

use crate::crypto::{channel_key, verify_with_nonce, CryptoError, EphemeralKeys, PublicKey};
use crate::request::{HashPrivateRequest, HashPrivateResponse, HashPublicRequest, HashPublicResponse};
use crate::roster::{Roster, ServerIdentity, TreeError};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("roster error: {0}")]
    Roster(#[from] TreeError),
    #[error("response includes {0}, which is not in the roster")]
    UnknownIdentity(PublicKey),
    #[error("response entry keyed {key} claims to be from {claimed}")]
    MismatchedIdentity { key: PublicKey, claimed: PublicKey },
    #[error("no ephemeral key was generated for {0}")]
    MissingEphemeralKey(PublicKey),
    #[error("entry from {identity} failed verification: {source}")]
    Crypto {
        identity: PublicKey,
        #[source]
        source: CryptoError,
    },
}

/// Uniformly random roster member to send the request to
pub fn pick_leader(roster: &Roster) -> Result<&ServerIdentity, ClientError> {
    Ok(roster.random_server()?)
}

/// Content hashes each server reported, keyed by server identity
pub type Hashes = BTreeMap<PublicKey, Vec<u8>>;

/// Builds a public request and checks the leader's answer to it.
#[derive(Debug, Clone)]
pub struct PublicHashSession {
    request: HashPublicRequest,
}

impl PublicHashSession {
    pub fn new(roster: Roster, url: impl Into<String>) -> Result<Self, ClientError> {
        if roster.is_empty() {
            return Err(TreeError::EmptyRoster.into());
        }
        Ok(Self {
            request: HashPublicRequest::new(roster, url),
        })
    }

    pub fn request(&self) -> &HashPublicRequest {
        &self.request
    }

    pub fn leader(&self) -> Result<&ServerIdentity, ClientError> {
        pick_leader(&self.request.roster)
    }

    /// Verifies every signed hash against this session's nonce.
    pub fn verify(&self, response: &HashPublicResponse) -> Result<Hashes, ClientError> {
        let mut hashes = Hashes::new();
        for (key, signed) in &response.responses {
            check_identity(&self.request.roster, key, &signed.public_key)?;
            verify_with_nonce(key, &signed.hash, &self.request.nonce, &signed.signature).map_err(
                |source| ClientError::Crypto {
                    identity: *key,
                    source,
                },
            )?;
            hashes.insert(*key, signed.hash.clone());
        }
        Ok(hashes)
    }
}

/// Builds a private request and opens the leader's answer to it.
///
/// Holds the ephemeral secrets for the lifetime of one request; they are
/// dropped with the session.
#[derive(Debug)]
pub struct PrivateHashSession {
    request: HashPrivateRequest,
    keys: EphemeralKeys,
}

impl PrivateHashSession {
    /// Generates one ephemeral keypair per roster member.
    pub fn new(roster: Roster, url: impl Into<String>) -> Result<Self, ClientError> {
        if roster.is_empty() {
            return Err(TreeError::EmptyRoster.into());
        }
        let keys = EphemeralKeys::generate(roster.public_keys());
        let request = HashPrivateRequest::new(roster, url, &keys);
        Ok(Self { request, keys })
    }

    pub fn request(&self) -> &HashPrivateRequest {
        &self.request
    }

    pub fn leader(&self) -> Result<&ServerIdentity, ClientError> {
        pick_leader(&self.request.roster)
    }

    /// Decrypts every sealed hash; any failure rejects the whole response.
    pub fn open(&self, response: &HashPrivateResponse) -> Result<Hashes, ClientError> {
        let mut hashes = Hashes::new();
        for (key, sealed) in &response.responses {
            check_identity(&self.request.roster, key, &sealed.public_key)?;
            let pair = self
                .keys
                .get(key)
                .ok_or(ClientError::MissingEphemeralKey(*key))?;

            let hash = channel_key(pair.secret(), key, pair.public(), key)
                .and_then(|channel| channel.open(&sealed.nonce, &sealed.encrypted_hash))
                .map_err(|source| ClientError::Crypto {
                    identity: *key,
                    source,
                })?;
            hashes.insert(*key, hash);
        }
        Ok(hashes)
    }
}

fn check_identity(
    roster: &Roster,
    key: &PublicKey,
    claimed: &PublicKey,
) -> Result<(), ClientError> {
    if key != claimed {
        return Err(ClientError::MismatchedIdentity {
            key: *key,
            claimed: *claimed,
        });
    }
    if !roster.contains(key) {
        return Err(ClientError::UnknownIdentity(*key));
    }
    Ok(())
}

/// Which servers reported which hash
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashTally {
    groups: BTreeMap<Vec<u8>, Vec<PublicKey>>,
}

impl HashTally {
    pub fn new(hashes: &Hashes) -> Self {
        let mut groups: BTreeMap<Vec<u8>, Vec<PublicKey>> = BTreeMap::new();
        for (server, hash) in hashes {
            groups.entry(hash.clone()).or_default().push(*server);
        }
        Self { groups }
    }

    /// True when every reporting server saw the same content
    pub fn is_unanimous(&self) -> bool {
        self.groups.len() <= 1
    }

    /// The hash with the most backers, ties broken by byte order
    pub fn majority(&self) -> Option<(&[u8], &[PublicKey])> {
        self.groups
            .iter()
            .max_by(|a, b| a.1.len().cmp(&b.1.len()).then_with(|| b.0.cmp(a.0)))
            .map(|(hash, servers)| (hash.as_slice(), servers.as_slice()))
    }

    pub fn groups(&self) -> impl Iterator<Item = (&[u8], &[PublicKey])> {
        self.groups
            .iter()
            .map(|(hash, servers)| (hash.as_slice(), servers.as_slice()))
    }

    pub fn distinct(&self) -> usize {
        self.groups.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::{sign_with_nonce, AeadNonce, SecretKey};
    use crate::protocol::{SealedHash, SignedHash};

    fn roster_of(secrets: &[SecretKey]) -> Roster {
        Roster::new(
            secrets
                .iter()
                .map(|s| ServerIdentity::new(s.public()))
                .collect(),
        )
        .unwrap()
    }

    fn signed(secret: &SecretKey, hash: &[u8], session: &PublicHashSession) -> SignedHash {
        SignedHash {
            public_key: secret.public(),
            hash: hash.to_vec(),
            signature: sign_with_nonce(secret, hash, &session.request().nonce),
        }
    }

    #[test]
    fn test_empty_roster_is_rejected() {
        assert!(matches!(
            PublicHashSession::new(Roster::default(), "https://example.com/"),
            Err(ClientError::Roster(TreeError::EmptyRoster))
        ));
        assert!(PrivateHashSession::new(Roster::default(), "https://example.com/").is_err());
    }

    #[test]
    fn test_public_verification() {
        let secrets: Vec<_> = (0..3).map(|_| SecretKey::generate()).collect();
        let session = PublicHashSession::new(roster_of(&secrets), "https://example.com/").unwrap();
        assert!(session.request().roster.contains(&session.leader().unwrap().public_key));

        let mut response = HashPublicResponse::default();
        for secret in &secrets[1..] {
            response
                .responses
                .insert(secret.public(), signed(secret, &[4u8; 32], &session));
        }
        let hashes = session.verify(&response).unwrap();
        assert_eq!(hashes.len(), 2);

        // tampered hash
        let mut tampered = response.clone();
        tampered
            .responses
            .get_mut(&secrets[1].public())
            .unwrap()
            .hash = vec![5u8; 32];
        assert!(matches!(
            session.verify(&tampered),
            Err(ClientError::Crypto { .. })
        ));

        // signed by someone outside the roster
        let outsider = SecretKey::generate();
        let mut foreign = response.clone();
        foreign
            .responses
            .insert(outsider.public(), signed(&outsider, &[4u8; 32], &session));
        assert!(matches!(
            session.verify(&foreign),
            Err(ClientError::UnknownIdentity(_))
        ));
    }

    #[test]
    fn test_private_open_is_all_or_nothing() {
        let secrets: Vec<_> = (0..3).map(|_| SecretKey::generate()).collect();
        let session = PrivateHashSession::new(roster_of(&secrets), "https://example.com/").unwrap();

        let mut response = HashPrivateResponse::default();
        for secret in &secrets {
            let server = secret.public();
            let client = session.request().client_public_keys[&server];
            let key = channel_key(secret, &client, &client, &server).unwrap();
            let nonce = AeadNonce::generate().unwrap();
            response.responses.insert(
                server,
                SealedHash {
                    public_key: server,
                    encrypted_hash: key.seal(&nonce, &[6u8; 32]).unwrap(),
                    nonce,
                },
            );
        }
        let hashes = session.open(&response).unwrap();
        assert_eq!(hashes.len(), 3);
        assert!(hashes.values().all(|h| h == &vec![6u8; 32]));

        let mut corrupted = response.clone();
        corrupted
            .responses
            .get_mut(&secrets[2].public())
            .unwrap()
            .encrypted_hash[0] ^= 0xff;
        assert!(matches!(
            session.open(&corrupted),
            Err(ClientError::Crypto { identity, .. }) if identity == secrets[2].public()
        ));
    }

    #[test]
    fn test_tally() {
        let keys: Vec<_> = (0..4).map(|_| SecretKey::generate().public()).collect();
        let mut hashes = Hashes::new();
        hashes.insert(keys[0], vec![1]);
        hashes.insert(keys[1], vec![1]);
        hashes.insert(keys[2], vec![1]);
        hashes.insert(keys[3], vec![2]);

        let tally = HashTally::new(&hashes);
        assert!(!tally.is_unanimous());
        assert_eq!(tally.distinct(), 2);
        let (hash, backers) = tally.majority().unwrap();
        assert_eq!(hash, &[1]);
        assert_eq!(backers.len(), 3);

        assert!(HashTally::new(&Hashes::new()).majority().is_none());
    }
}
