//! Tree-structured hash collection
//!
//! One run of a hash protocol looks like this:
//! 1. The root (the request's leader) validates the announcement and
//!    delivers it to every child over the [`Overlay`]
//! 2. Each child fetches the URL itself, hashes the body, and turns the
//!    hash into its variant's response (signed or sealed)
//! 3. Each child sends exactly one response back up its edge
//! 4. The root collects responses into an [`Aggregate`] keyed by sender and
//!    raises its completion once every child answered, every child edge
//!    closed, or the run was cancelled
//!
//! The two variants, [`HashPublic`] and [`HashPrivate`], share all of that
//! machinery and only differ in what they put in a response.

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};

use crate::crypto::{CryptoError, PublicKey, SecretKey};
use crate::fetch::{FetchError, Fetcher};
use crate::roster::{Tree, TreeError};

mod aggregate;
mod cancel;
mod hash_private;
mod hash_public;
mod instance;
mod messages;
mod overlay;

pub use aggregate::Aggregate;
pub use cancel::{cancellation, CancelHandle, Cancellation};
pub use hash_private::{HashPrivate, HashPrivateAnnouncement, SealedHash};
pub use hash_public::{HashPublic, HashPublicAnnouncement, SignedHash};
pub use instance::{Completion, NodeState, ProtocolInstance};
pub use messages::{Message, Reply};
pub use overlay::{Overlay, ResponseSender};

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("tree construction error: {0}")]
    TreeConstruction(#[from] TreeError),
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
    #[error("protocol did not complete within {0:?}")]
    Timeout(Duration),
    #[error("only {received} of {required} required contributions arrived")]
    Insufficient { received: usize, required: usize },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("protocol run cancelled")]
    Cancelled,
}

/// A hash-collection variant.
///
/// Implementors are zero-sized markers; everything that differs between
/// variants hangs off the associated types.
pub trait HashProtocol: Send + Sync + 'static {
    /// Name used in logs
    const NAME: &'static str;

    /// Parameters the root delivers to each child
    type Announcement: Clone + Debug + Send + Sync + Serialize + DeserializeOwned + 'static;
    /// What a child sends back up its edge
    type Response: Clone + Debug + Send + Sync + Serialize + DeserializeOwned + 'static;

    fn url(announcement: &Self::Announcement) -> &str;

    /// Checks an announcement is well formed. Runs on every node.
    fn validate(announcement: &Self::Announcement) -> Result<(), ProtocolError>;

    /// Extra root-side checks against the tree the run will use.
    fn validate_for_tree(
        _announcement: &Self::Announcement,
        _tree: &Tree,
    ) -> Result<(), ProtocolError> {
        Ok(())
    }

    /// Turns this node's content hash into its response.
    fn contribute(
        node: &SecretKey,
        announcement: &Self::Announcement,
        hash: &[u8],
    ) -> Result<Self::Response, ProtocolError>;

    /// Identity the response claims to come from
    fn sender(response: &Self::Response) -> &PublicKey;

    fn wrap_announcement(announcement: Self::Announcement) -> Message;

    fn wrap_response(response: Self::Response) -> Reply;

    /// Extracts this variant's response, or `None` for an abort or a reply
    /// belonging to the other variant.
    fn unwrap_reply(reply: Reply) -> Option<Self::Response>;
}

/// Long-lived per-server context every protocol instance runs with
#[derive(Debug, Clone)]
pub struct NodeContext {
    secret: SecretKey,
    fetcher: Arc<dyn Fetcher>,
}

impl NodeContext {
    pub fn new(secret: SecretKey, fetcher: Arc<dyn Fetcher>) -> Self {
        Self { secret, fetcher }
    }

    pub fn public(&self) -> PublicKey {
        self.secret.public()
    }

    pub fn secret(&self) -> &SecretKey {
        &self.secret
    }

    pub fn fetcher(&self) -> &Arc<dyn Fetcher> {
        &self.fetcher
    }
}
