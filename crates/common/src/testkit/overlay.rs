use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::oneshot;

use crate::crypto::PublicKey;
use crate::protocol::{
    Cancellation, HashProtocol, NodeContext, Overlay, ProtocolError, ProtocolInstance,
    ResponseSender,
};
use crate::roster::ServerIdentity;

/// How a node reacts to announcements delivered over a [`LocalOverlay`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Behaviour {
    /// Runs a leaf instance and answers
    #[default]
    Honest,
    /// Drops the edge immediately, like a peer that cannot be dialed
    Unreachable,
    /// Accepts the announcement and never answers
    Silent,
}

#[derive(Debug, Clone)]
struct LocalNode {
    context: NodeContext,
    behaviour: Behaviour,
}

/// In-memory overlay connecting the nodes of one [`super::TestNetwork`].
///
/// Each clone delivers on behalf of one origin node, set with
/// [`LocalOverlay::from_node`].
#[derive(Debug, Clone, Default)]
pub struct LocalOverlay {
    nodes: Arc<HashMap<PublicKey, LocalNode>>,
    origin: Option<PublicKey>,
}

impl LocalOverlay {
    pub fn new(nodes: impl IntoIterator<Item = (NodeContext, Behaviour)>) -> Self {
        let nodes = nodes
            .into_iter()
            .map(|(context, behaviour)| (context.public(), LocalNode { context, behaviour }))
            .collect();
        Self {
            nodes: Arc::new(nodes),
            origin: None,
        }
    }

    pub fn from_node(&self, origin: PublicKey) -> Self {
        Self {
            nodes: self.nodes.clone(),
            origin: Some(origin),
        }
    }
}

impl<P: HashProtocol> Overlay<P> for LocalOverlay {
    fn deliver(
        &self,
        child: &ServerIdentity,
        announcement: P::Announcement,
        parent: ResponseSender<P>,
        cancel: Cancellation,
    ) -> Result<(), ProtocolError> {
        let node = self.nodes.get(&child.public_key).cloned().ok_or_else(|| {
            ProtocolError::Transport(format!("{} is not part of this network", child.public_key))
        })?;
        let origin = self.origin.ok_or_else(|| {
            ProtocolError::Configuration("local overlay used without an origin node".into())
        })?;

        match node.behaviour {
            Behaviour::Unreachable => {
                drop(parent);
            }
            Behaviour::Silent => {
                let mut cancel = cancel;
                tokio::spawn(async move {
                    let _held = parent;
                    cancel.cancelled().await;
                });
            }
            Behaviour::Honest => {
                let (announce_tx, announce_rx) = oneshot::channel();
                let instance =
                    ProtocolInstance::<P>::child(node.context, origin, announce_rx, parent, cancel);
                let _ = announce_tx.send(announcement);
                let child = child.public_key;
                tokio::spawn(async move {
                    if let Err(e) = instance.dispatch().await {
                        tracing::debug!(protocol = P::NAME, %child, "leaf gave up: {}", e);
                    }
                });
            }
        }
        Ok(())
    }
}
