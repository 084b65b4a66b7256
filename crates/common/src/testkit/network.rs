use std::collections::HashMap;
use std::sync::Arc;

use super::{Behaviour, LocalOverlay, StaticFetcher};
use crate::crypto::{PublicKey, SecretKey};
use crate::orchestrator::{Orchestrator, OrchestratorConfig};
use crate::protocol::NodeContext;
use crate::roster::{Roster, ServerIdentity};

/// A fixed set of in-process nodes sharing one roster
pub struct TestNetwork {
    nodes: Vec<NodeContext>,
    roster: Roster,
    overlay: LocalOverlay,
    config: OrchestratorConfig,
}

impl TestNetwork {
    /// `size` honest nodes that all see the web through `fetcher`
    pub fn new(size: usize, fetcher: StaticFetcher) -> Self {
        Self::builder(size, fetcher).build()
    }

    pub fn builder(size: usize, fetcher: StaticFetcher) -> TestNetworkBuilder {
        TestNetworkBuilder {
            size,
            fetcher,
            fetchers: HashMap::new(),
            behaviours: HashMap::new(),
            config: OrchestratorConfig::default(),
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn public_key(&self, index: usize) -> PublicKey {
        self.nodes[index].public()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Leader-side orchestrator for node `index`
    pub fn orchestrator(&self, index: usize) -> Orchestrator<LocalOverlay> {
        let node = self.nodes[index].clone();
        let overlay = Arc::new(self.overlay.from_node(node.public()));
        Orchestrator::new(node, overlay, self.config.clone())
    }
}

pub struct TestNetworkBuilder {
    size: usize,
    fetcher: StaticFetcher,
    fetchers: HashMap<usize, StaticFetcher>,
    behaviours: HashMap<usize, Behaviour>,
    config: OrchestratorConfig,
}

impl TestNetworkBuilder {
    /// Gives node `index` its own view of the web.
    pub fn fetcher_for(mut self, index: usize, fetcher: StaticFetcher) -> Self {
        self.fetchers.insert(index, fetcher);
        self
    }

    pub fn behaviour(mut self, index: usize, behaviour: Behaviour) -> Self {
        self.behaviours.insert(index, behaviour);
        self
    }

    pub fn config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> TestNetwork {
        let nodes: Vec<NodeContext> = (0..self.size)
            .map(|index| {
                let fetcher = self
                    .fetchers
                    .get(&index)
                    .cloned()
                    .unwrap_or_else(|| self.fetcher.clone());
                NodeContext::new(SecretKey::generate(), Arc::new(fetcher))
            })
            .collect();

        let servers = nodes
            .iter()
            .map(|node| ServerIdentity::new(node.public()))
            .collect();
        let roster = Roster::new(servers).expect("generated keys are distinct");

        let overlay = LocalOverlay::new(nodes.iter().enumerate().map(|(index, node)| {
            let behaviour = self.behaviours.get(&index).copied().unwrap_or_default();
            (node.clone(), behaviour)
        }));

        TestNetwork {
            nodes,
            roster,
            overlay,
            config: self.config,
        }
    }
}
