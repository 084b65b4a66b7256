use serde::{Deserialize, Serialize};

use super::hash_private::{HashPrivateAnnouncement, SealedHash};
use super::hash_public::{HashPublicAnnouncement, SignedHash};

/// What a parent sends down one tree edge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Message {
    HashPublic(HashPublicAnnouncement),
    HashPrivate(HashPrivateAnnouncement),
}

/// What a child sends back up its edge, exactly once
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Reply {
    HashPublic(SignedHash),
    HashPrivate(SealedHash),
    /// The child could not contribute; carries a reason for the parent's logs
    Aborted(String),
}

impl Message {
    pub fn url(&self) -> &str {
        match self {
            Message::HashPublic(announcement) => &announcement.url,
            Message::HashPrivate(announcement) => &announcement.url,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::{sign_with_nonce, AeadNonce, EphemeralKeys, RequestNonce, SecretKey};

    fn over_the_wire<T: Serialize + serde::de::DeserializeOwned>(value: &T) -> T {
        let bytes = bincode::serialize(value).unwrap();
        bincode::deserialize(&bytes).unwrap()
    }

    #[test]
    fn test_public_exchange_survives_bincode() {
        let server = SecretKey::generate();
        let nonce = RequestNonce::generate();
        let hash = vec![3u8; 32];

        let message = Message::HashPublic(HashPublicAnnouncement {
            url: "https://example.com/".into(),
            nonce,
        });
        match over_the_wire(&message) {
            Message::HashPublic(announcement) => {
                assert_eq!(announcement.url, "https://example.com/");
                assert_eq!(announcement.nonce, nonce);
            }
            other => panic!("unexpected message {:?}", other),
        }

        let signed = SignedHash {
            public_key: server.public(),
            signature: sign_with_nonce(&server, &hash, &nonce),
            hash,
        };
        match over_the_wire(&Reply::HashPublic(signed.clone())) {
            Reply::HashPublic(decoded) => assert_eq!(decoded, signed),
            other => panic!("unexpected reply {:?}", other),
        }
    }

    #[test]
    fn test_private_exchange_survives_bincode() {
        let servers = [SecretKey::generate().public(), SecretKey::generate().public()];
        let keys = EphemeralKeys::generate(servers.iter());

        let message = Message::HashPrivate(HashPrivateAnnouncement {
            url: "https://example.com/".into(),
            client_public_keys: keys.public_keys(),
        });
        match over_the_wire(&message) {
            Message::HashPrivate(announcement) => {
                assert_eq!(announcement.client_public_keys, keys.public_keys());
            }
            other => panic!("unexpected message {:?}", other),
        }

        let sealed = SealedHash {
            public_key: servers[0],
            encrypted_hash: vec![0xde, 0xad, 0xbe, 0xef],
            nonce: AeadNonce::from([7u8; crate::crypto::AEAD_NONCE_SIZE]),
        };
        match over_the_wire(&Reply::HashPrivate(sealed.clone())) {
            Reply::HashPrivate(decoded) => assert_eq!(decoded, sealed),
            other => panic!("unexpected reply {:?}", other),
        }

        match over_the_wire(&Reply::Aborted("fetch failed".into())) {
            Reply::Aborted(reason) => assert_eq!(reason, "fetch failed"),
            other => panic!("unexpected reply {:?}", other),
        }
    }
}
