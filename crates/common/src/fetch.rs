//! The seam between the protocol engine and the outside web
//!
//! Every node fetches the requested URL independently through a
//! [`Fetcher`]. The daemon's implementation speaks HTTP(S) and reads from a
//! confined local directory; tests inject canned resources instead.

use std::fmt::Debug;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

/// Size of a content hash in bytes (SHA-256)
pub const CONTENT_HASH_SIZE: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),
    #[error("server answered with status {0}")]
    NonOkStatus(u16),
    #[error("unsupported content type: {0:?}")]
    UnsupportedContentType(String),
    #[error("path escapes the file root: {0}")]
    PathTraversal(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("io error: {0}")]
    Io(String),
}

/// A fetched resource body together with its declared media type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub url: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl Resource {
    pub fn content_hash(&self) -> [u8; CONTENT_HASH_SIZE] {
        content_hash(&self.data)
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync + Debug {
    /// Fetches the full body of `url`.
    ///
    /// Implementations only return resources of an accepted media type.
    async fn fetch(&self, url: &str) -> Result<Resource, FetchError>;
}

/// SHA-256 of a resource body
pub fn content_hash(data: &[u8]) -> [u8; CONTENT_HASH_SIZE] {
    Sha256::digest(data).into()
}
