use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{HashProtocol, Message, ProtocolError, Reply};
use crate::crypto::{channel_key, AeadNonce, CryptoError, PublicKey, SecretKey};
use crate::roster::Tree;

/// Every child seals its content hash for the requesting client only,
/// under a key agreed with that client's per-server ephemeral key.
#[derive(Debug, Clone, Copy)]
pub struct HashPrivate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashPrivateAnnouncement {
    pub url: String,
    /// Server identity -> the client ephemeral public key meant for it
    pub client_public_keys: BTreeMap<PublicKey, PublicKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedHash {
    pub public_key: PublicKey,
    #[serde(with = "crate::encoding::hex_bytes")]
    pub encrypted_hash: Vec<u8>,
    pub nonce: AeadNonce,
}

impl HashProtocol for HashPrivate {
    const NAME: &'static str = "hash_private";

    type Announcement = HashPrivateAnnouncement;
    type Response = SealedHash;

    fn url(announcement: &Self::Announcement) -> &str {
        &announcement.url
    }

    fn validate(announcement: &Self::Announcement) -> Result<(), ProtocolError> {
        if announcement.url.trim().is_empty() {
            return Err(ProtocolError::Configuration("url is empty".into()));
        }
        if announcement.client_public_keys.is_empty() {
            return Err(ProtocolError::Configuration(
                "no client ephemeral keys supplied".into(),
            ));
        }
        Ok(())
    }

    fn validate_for_tree(
        announcement: &Self::Announcement,
        tree: &Tree,
    ) -> Result<(), ProtocolError> {
        if let Some(child) = tree
            .children()
            .iter()
            .find(|child| !announcement.client_public_keys.contains_key(&child.public_key))
        {
            return Err(ProtocolError::Configuration(format!(
                "no client ephemeral key for {}",
                child.public_key
            )));
        }
        Ok(())
    }

    fn contribute(
        node: &SecretKey,
        announcement: &Self::Announcement,
        hash: &[u8],
    ) -> Result<Self::Response, ProtocolError> {
        let server = node.public();
        let client = announcement
            .client_public_keys
            .get(&server)
            .ok_or(CryptoError::MissingEphemeralKey(server))?;

        let key = channel_key(node, client, client, &server)?;
        let nonce = AeadNonce::generate()?;
        let encrypted_hash = key.seal(&nonce, hash)?;

        Ok(SealedHash {
            public_key: server,
            encrypted_hash,
            nonce,
        })
    }

    fn sender(response: &Self::Response) -> &PublicKey {
        &response.public_key
    }

    fn wrap_announcement(announcement: Self::Announcement) -> Message {
        Message::HashPrivate(announcement)
    }

    fn wrap_response(response: Self::Response) -> Reply {
        Reply::HashPrivate(response)
    }

    fn unwrap_reply(reply: Reply) -> Option<Self::Response> {
        match reply {
            Reply::HashPrivate(response) => Some(response),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::EphemeralKeys;
    use crate::roster::{Roster, ServerIdentity};

    #[test]
    fn test_only_the_client_can_open() {
        let node = SecretKey::generate();
        let server = node.public();
        let keys = EphemeralKeys::generate([&server]);
        let announcement = HashPrivateAnnouncement {
            url: "https://example.com/".into(),
            client_public_keys: keys.public_keys(),
        };

        let sealed = HashPrivate::contribute(&node, &announcement, &[9u8; 32]).unwrap();
        assert_ne!(sealed.encrypted_hash, vec![9u8; 32]);

        let pair = keys.get(&server).unwrap();
        let key = channel_key(pair.secret(), &server, pair.public(), &server).unwrap();
        assert_eq!(
            key.open(&sealed.nonce, &sealed.encrypted_hash).unwrap(),
            vec![9u8; 32]
        );
    }

    #[test]
    fn test_missing_key_fails_locally() {
        let node = SecretKey::generate();
        let someone_else = SecretKey::generate().public();
        let announcement = HashPrivateAnnouncement {
            url: "https://example.com/".into(),
            client_public_keys: EphemeralKeys::generate([&someone_else]).public_keys(),
        };

        assert!(matches!(
            HashPrivate::contribute(&node, &announcement, &[0u8; 32]),
            Err(ProtocolError::Crypto(CryptoError::MissingEphemeralKey(key))) if key == node.public()
        ));
    }

    #[test]
    fn test_validation() {
        let servers: Vec<_> = (0..3)
            .map(|_| ServerIdentity::new(SecretKey::generate().public()))
            .collect();
        let roster = Roster::new(servers.clone()).unwrap();
        let tree = Tree::flat(&roster, &servers[0].public_key).unwrap();

        let empty = HashPrivateAnnouncement {
            url: "https://example.com/".into(),
            client_public_keys: BTreeMap::new(),
        };
        assert!(HashPrivate::validate(&empty).is_err());

        // the root itself does not need a key, its children do
        let partial = HashPrivateAnnouncement {
            url: "https://example.com/".into(),
            client_public_keys: EphemeralKeys::generate([&servers[1].public_key]).public_keys(),
        };
        assert!(HashPrivate::validate(&partial).is_ok());
        assert!(HashPrivate::validate_for_tree(&partial, &tree).is_err());

        let full = HashPrivateAnnouncement {
            url: "https://example.com/".into(),
            client_public_keys: EphemeralKeys::generate(roster.public_keys()).public_keys(),
        };
        assert!(HashPrivate::validate_for_tree(&full, &tree).is_ok());
    }
}
