//! Leader-side entry point for hash requests
//!
//! A server that receives a request from a client becomes the leader for
//! it: it builds a flat tree rooted at itself, starts a root instance of the
//! right variant, and waits (bounded) for the aggregate.

use std::sync::Arc;
use std::time::Duration;

use crate::protocol::{
    cancellation, Aggregate, HashPrivate, HashPrivateAnnouncement, HashProtocol, HashPublic,
    HashPublicAnnouncement, NodeContext, Overlay, ProtocolError, ProtocolInstance,
};
use crate::request::{
    HashPrivateRequest, HashPrivateResponse, HashPublicRequest, HashPublicResponse, HashRequest,
    HashResponse,
};
use crate::roster::{Roster, Tree};

/// Upper bound on one protocol run, announcement to aggregate
pub const DEFAULT_PROTOCOL_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_MIN_CONTRIBUTIONS: usize = 1;

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub timeout: Duration,
    /// Fewest child contributions a run may return, capped at the number
    /// of children in the tree
    pub min_contributions: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_PROTOCOL_TIMEOUT,
            min_contributions: DEFAULT_MIN_CONTRIBUTIONS,
        }
    }
}

pub struct Orchestrator<O> {
    node: NodeContext,
    overlay: Arc<O>,
    config: OrchestratorConfig,
}

impl<O> Orchestrator<O>
where
    O: Overlay<HashPublic> + Overlay<HashPrivate> + 'static,
{
    pub fn new(node: NodeContext, overlay: Arc<O>, config: OrchestratorConfig) -> Self {
        Self {
            node,
            overlay,
            config,
        }
    }

    pub fn node(&self) -> &NodeContext {
        &self.node
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub async fn handle(&self, request: HashRequest) -> Result<HashResponse, ProtocolError> {
        match request {
            HashRequest::Public(request) => self.hash_public(request).await.map(HashResponse::Public),
            HashRequest::Private(request) => {
                self.hash_private(request).await.map(HashResponse::Private)
            }
        }
    }

    pub async fn hash_public(
        &self,
        request: HashPublicRequest,
    ) -> Result<HashPublicResponse, ProtocolError> {
        let announcement = HashPublicAnnouncement {
            url: request.url,
            nonce: request.nonce,
        };
        let aggregate = self.run::<HashPublic>(&request.roster, announcement).await?;
        Ok(HashPublicResponse {
            responses: aggregate.responses,
            missing: aggregate.missing.into_iter().collect(),
        })
    }

    pub async fn hash_private(
        &self,
        request: HashPrivateRequest,
    ) -> Result<HashPrivateResponse, ProtocolError> {
        let announcement = HashPrivateAnnouncement {
            url: request.url,
            client_public_keys: request.client_public_keys,
        };
        let aggregate = self.run::<HashPrivate>(&request.roster, announcement).await?;
        Ok(HashPrivateResponse {
            responses: aggregate.responses,
            missing: aggregate.missing.into_iter().collect(),
        })
    }

    async fn run<P>(
        &self,
        roster: &Roster,
        announcement: P::Announcement,
    ) -> Result<Aggregate<P::Response>, ProtocolError>
    where
        P: HashProtocol,
        O: Overlay<P>,
    {
        let tree = Arc::new(Tree::flat(roster, &self.node.public())?);
        let (cancel_handle, cancel) = cancellation();
        let overlay: Arc<dyn Overlay<P>> = self.overlay.clone();

        let (mut root, completion) =
            ProtocolInstance::<P>::root(self.node.clone(), tree.clone(), overlay, cancel)?;
        root.start(announcement)?;
        let dispatch = tokio::spawn(root.dispatch());

        let outcome = tokio::time::timeout(self.config.timeout, completion.wait()).await;
        // stops leaf fetches and overlay deliveries still in flight
        cancel_handle.cancel();

        let aggregate = match outcome {
            Ok(aggregate) => aggregate?,
            Err(_) => {
                tracing::warn!(
                    protocol = P::NAME,
                    timeout = ?self.config.timeout,
                    "protocol run timed out"
                );
                return Err(ProtocolError::Timeout(self.config.timeout));
            }
        };
        match dispatch.await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::warn!(protocol = P::NAME, "root instance failed: {}", e),
            Err(e) => tracing::warn!(protocol = P::NAME, "root instance panicked: {}", e),
        }

        let required = self.config.min_contributions.min(tree.children().len());
        if aggregate.len() < required {
            return Err(ProtocolError::Insufficient {
                received: aggregate.len(),
                required,
            });
        }
        if !aggregate.is_complete() {
            tracing::info!(
                protocol = P::NAME,
                received = aggregate.len(),
                missing = aggregate.missing.len(),
                "returning partial aggregate"
            );
        }
        Ok(aggregate)
    }
}
