use serde::{Deserialize, Serialize};

use super::{HashProtocol, Message, ProtocolError, Reply};
use crate::crypto::{sign_with_nonce, PublicKey, RequestNonce, SecretKey};

/// Every child returns its content hash in the clear, signed over
/// `hash || nonce` so the client can attribute and date each answer.
#[derive(Debug, Clone, Copy)]
pub struct HashPublic;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashPublicAnnouncement {
    pub url: String,
    pub nonce: RequestNonce,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedHash {
    pub public_key: PublicKey,
    #[serde(with = "crate::encoding::hex_bytes")]
    pub hash: Vec<u8>,
    #[serde(with = "crate::encoding::hex_bytes")]
    pub signature: Vec<u8>,
}

impl HashProtocol for HashPublic {
    const NAME: &'static str = "hash_public";

    type Announcement = HashPublicAnnouncement;
    type Response = SignedHash;

    fn url(announcement: &Self::Announcement) -> &str {
        &announcement.url
    }

    fn validate(announcement: &Self::Announcement) -> Result<(), ProtocolError> {
        if announcement.url.trim().is_empty() {
            return Err(ProtocolError::Configuration("url is empty".into()));
        }
        Ok(())
    }

    fn contribute(
        node: &SecretKey,
        announcement: &Self::Announcement,
        hash: &[u8],
    ) -> Result<Self::Response, ProtocolError> {
        Ok(SignedHash {
            public_key: node.public(),
            hash: hash.to_vec(),
            signature: sign_with_nonce(node, hash, &announcement.nonce),
        })
    }

    fn sender(response: &Self::Response) -> &PublicKey {
        &response.public_key
    }

    fn wrap_announcement(announcement: Self::Announcement) -> Message {
        Message::HashPublic(announcement)
    }

    fn wrap_response(response: Self::Response) -> Reply {
        Reply::HashPublic(response)
    }

    fn unwrap_reply(reply: Reply) -> Option<Self::Response> {
        match reply {
            Reply::HashPublic(response) => Some(response),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::verify_with_nonce;

    #[test]
    fn test_contribution_verifies() {
        let node = SecretKey::generate();
        let announcement = HashPublicAnnouncement {
            url: "https://example.com/".into(),
            nonce: RequestNonce::generate(),
        };

        let response = HashPublic::contribute(&node, &announcement, &[1u8; 32]).unwrap();
        assert_eq!(HashPublic::sender(&response), &node.public());
        verify_with_nonce(
            &response.public_key,
            &response.hash,
            &announcement.nonce,
            &response.signature,
        )
        .unwrap();
    }

    #[test]
    fn test_empty_url_is_rejected() {
        let announcement = HashPublicAnnouncement {
            url: " ".into(),
            nonce: RequestNonce::generate(),
        };
        assert!(matches!(
            HashPublic::validate(&announcement),
            Err(ProtocolError::Configuration(_))
        ));
    }

    #[test]
    fn test_reply_variant_mismatch() {
        assert!(HashPublic::unwrap_reply(Reply::Aborted("fetch failed".into())).is_none());
    }
}
