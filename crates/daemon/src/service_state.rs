use std::sync::Arc;

use iroh::Endpoint;

use common::crypto::{PublicKey, SecretKey};
use common::orchestrator::{Orchestrator, OrchestratorConfig};
use common::protocol::NodeContext;
use common::roster::ServerIdentity;

use crate::fetch::{FetcherSetupError, HttpFetcher};
use crate::peer::{self, HashHandler, IrohOverlay, PeerError};
use crate::service_config::Config;

/// Main service state - shared between the peer router and the API
#[derive(Clone)]
pub struct State {
    node: NodeContext,
    endpoint: Endpoint,
    orchestrator: Arc<Orchestrator<IrohOverlay>>,
}

impl State {
    pub async fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        // 1. Setup node secret
        let node_secret = config
            .node_secret
            .clone()
            .unwrap_or_else(SecretKey::generate);

        // 2. Setup fetcher
        tracing::debug!(file_root = %config.file_root.display(), "ServiceState::from_config - building fetcher");
        let fetcher = HttpFetcher::new(config.file_root.clone())?;
        let node = NodeContext::new(node_secret.clone(), Arc::new(fetcher));

        // 3. Bind the endpoint under our roster identity
        let endpoint =
            peer::bind_endpoint(&node_secret, config.node_listen_addr, config.peer_discovery)
                .await?;

        // 4. Leader side runs over the same endpoint
        let orchestrator = Arc::new(Orchestrator::new(
            node.clone(),
            Arc::new(IrohOverlay::new(endpoint.clone())),
            OrchestratorConfig {
                timeout: config.protocol_timeout,
                min_contributions: config.min_contributions,
            },
        ));

        let bound_addrs = endpoint.bound_sockets();
        tracing::info!("Node id: {}", node.public());
        tracing::info!("Peer listening on: {:?}", bound_addrs);

        Ok(Self {
            node,
            endpoint,
            orchestrator,
        })
    }

    pub fn public_key(&self) -> PublicKey {
        self.node.public()
    }

    /// How other roster members reach this node
    pub fn identity(&self) -> ServerIdentity {
        ServerIdentity::new(self.node.public()).with_peer_addrs(self.endpoint.bound_sockets())
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn orchestrator(&self) -> &Orchestrator<IrohOverlay> {
        &self.orchestrator
    }

    /// Inbound side of the overlay
    pub fn handler(&self) -> HashHandler {
        HashHandler::new(self.node.clone())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("fetcher setup error: {0}")]
    Fetcher(#[from] FetcherSetupError),
    #[error("peer setup error: {0}")]
    Peer(#[from] PeerError),
}
