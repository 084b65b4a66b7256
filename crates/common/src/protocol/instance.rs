use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use super::{
    Aggregate, Cancellation, HashProtocol, NodeContext, Overlay, ProtocolError, ResponseSender,
};
use crate::crypto::PublicKey;
use crate::roster::Tree;

/// Lifecycle of one node within one protocol run.
///
/// Leaves go `AwaitingAnnouncement -> Announced -> Computing ->
/// ResponseSent -> Finished`; the root goes `Idle -> Announced ->
/// AwaitingResponses -> Aggregated -> Finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Idle,
    AwaitingAnnouncement,
    Announced,
    Computing,
    ResponseSent,
    AwaitingResponses,
    Aggregated,
    Finished,
}

/// Resolves with the root's aggregate, exactly once.
#[derive(Debug)]
pub struct Completion<R>(oneshot::Receiver<Aggregate<R>>);

impl<R> Completion<R> {
    pub async fn wait(self) -> Result<Aggregate<R>, ProtocolError> {
        self.0
            .await
            .map_err(|_| ProtocolError::Transport("root exited without an aggregate".into()))
    }
}

struct Root<P: HashProtocol> {
    tree: Arc<Tree>,
    overlay: Arc<dyn Overlay<P>>,
    responses_tx: Option<ResponseSender<P>>,
    responses_rx: mpsc::Receiver<P::Response>,
    finished: oneshot::Sender<Aggregate<P::Response>>,
}

struct Child<P: HashProtocol> {
    parent: PublicKey,
    announcement: oneshot::Receiver<P::Announcement>,
    respond: ResponseSender<P>,
}

enum Role<P: HashProtocol> {
    Root(Root<P>),
    Child(Child<P>),
    Spent,
}

/// One node's share of one run of protocol `P`.
///
/// Built with [`ProtocolInstance::root`] on the leader or
/// [`ProtocolInstance::child`] on every other roster member, then driven to
/// completion by [`ProtocolInstance::dispatch`].
pub struct ProtocolInstance<P: HashProtocol> {
    node: NodeContext,
    role: Role<P>,
    state: NodeState,
    cancel: Cancellation,
}

impl<P: HashProtocol> ProtocolInstance<P> {
    pub fn root(
        node: NodeContext,
        tree: Arc<Tree>,
        overlay: Arc<dyn Overlay<P>>,
        cancel: Cancellation,
    ) -> Result<(Self, Completion<P::Response>), ProtocolError> {
        if !tree.is_root(&node.public()) {
            return Err(ProtocolError::Configuration(format!(
                "{} is not the root of this tree",
                node.public()
            )));
        }

        let (responses_tx, responses_rx) = mpsc::channel(tree.children().len().max(1));
        let (finished, completion) = oneshot::channel();
        let instance = Self {
            node,
            role: Role::Root(Root {
                tree,
                overlay,
                responses_tx: Some(responses_tx),
                responses_rx,
                finished,
            }),
            state: NodeState::Idle,
            cancel,
        };
        Ok((instance, Completion(completion)))
    }

    /// A leaf that waits for one announcement from `parent` and answers on
    /// `respond`.
    pub fn child(
        node: NodeContext,
        parent: PublicKey,
        announcement: oneshot::Receiver<P::Announcement>,
        respond: ResponseSender<P>,
        cancel: Cancellation,
    ) -> Self {
        Self {
            node,
            role: Role::Child(Child {
                parent,
                announcement,
                respond,
            }),
            state: NodeState::AwaitingAnnouncement,
            cancel,
        }
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    fn advance(&mut self, next: NodeState) {
        tracing::debug!(
            protocol = P::NAME,
            node = %self.node.public(),
            from = ?self.state,
            to = ?next,
            "node state"
        );
        self.state = next;
    }

    /// Root only: validates the announcement and delivers it to every child.
    pub fn start(&mut self, announcement: P::Announcement) -> Result<(), ProtocolError> {
        if self.state != NodeState::Idle {
            return Err(ProtocolError::Configuration(
                "protocol run already started".into(),
            ));
        }
        let Role::Root(root) = &mut self.role else {
            return Err(ProtocolError::Configuration(
                "only the root starts a protocol run".into(),
            ));
        };

        P::validate(&announcement)?;
        P::validate_for_tree(&announcement, &root.tree)?;

        let responses_tx = root.responses_tx.take().ok_or_else(|| {
            ProtocolError::Configuration("protocol run already started".into())
        })?;
        for child in root.tree.children() {
            // a child we cannot reach is reported as missing, not fatal
            if let Err(e) = root.overlay.deliver(
                child,
                announcement.clone(),
                responses_tx.clone(),
                self.cancel.clone(),
            ) {
                tracing::warn!(
                    protocol = P::NAME,
                    child = %child.public_key,
                    "failed to deliver announcement: {}",
                    e
                );
            }
        }
        drop(responses_tx);

        tracing::debug!(
            protocol = P::NAME,
            url = P::url(&announcement),
            children = root.tree.children().len(),
            "announced"
        );
        self.advance(NodeState::Announced);
        self.advance(NodeState::AwaitingResponses);
        Ok(())
    }

    /// Runs this node's part until it finishes, fails, or is cancelled.
    pub async fn dispatch(mut self) -> Result<NodeState, ProtocolError> {
        let role = std::mem::replace(&mut self.role, Role::Spent);
        match role {
            Role::Root(root) => self.collect(root).await,
            Role::Child(child) => self.contribute(child).await,
            Role::Spent => Err(ProtocolError::Configuration(
                "protocol instance already dispatched".into(),
            )),
        }
    }

    async fn collect(mut self, root: Root<P>) -> Result<NodeState, ProtocolError> {
        if self.state != NodeState::AwaitingResponses {
            return Err(ProtocolError::Configuration(
                "dispatch called before start".into(),
            ));
        }
        let Root {
            tree,
            mut responses_rx,
            finished,
            ..
        } = root;

        let expected = tree.children().len();
        let mut aggregate = Aggregate::default();
        let mut cancel = self.cancel.clone();

        while aggregate.len() < expected {
            tokio::select! {
                received = responses_rx.recv() => {
                    let Some(response) = received else {
                        // every child edge is closed
                        break;
                    };
                    let sender = *P::sender(&response);
                    if !tree.is_child(&sender) {
                        tracing::warn!(protocol = P::NAME, %sender, "dropping response from outside the tree");
                        continue;
                    }
                    if !aggregate.insert(sender, response) {
                        tracing::warn!(protocol = P::NAME, %sender, "dropping duplicate response");
                    }
                }
                _ = cancel.cancelled() => {
                    tracing::debug!(protocol = P::NAME, received = aggregate.len(), expected, "collection cancelled");
                    break;
                }
            }
        }

        aggregate.close(tree.children());
        self.advance(NodeState::Aggregated);
        tracing::debug!(
            protocol = P::NAME,
            received = aggregate.len(),
            missing = aggregate.missing.len(),
            "aggregated"
        );
        // nobody listening just means the orchestrator already gave up
        let _ = finished.send(aggregate);
        self.advance(NodeState::Finished);
        Ok(self.state)
    }

    async fn contribute(mut self, child: Child<P>) -> Result<NodeState, ProtocolError> {
        let Child {
            parent,
            announcement,
            respond,
        } = child;
        let mut cancel = self.cancel.clone();

        let announcement = tokio::select! {
            received = announcement => received.map_err(|_| {
                ProtocolError::Transport(format!("announcement from {} never arrived", parent))
            })?,
            _ = cancel.cancelled() => return Err(ProtocolError::Cancelled),
        };
        self.advance(NodeState::Announced);
        P::validate(&announcement)?;

        self.advance(NodeState::Computing);
        let fetcher = self.node.fetcher().clone();
        let resource = tokio::select! {
            fetched = fetcher.fetch(P::url(&announcement)) => fetched?,
            _ = cancel.cancelled() => return Err(ProtocolError::Cancelled),
        };
        let hash = resource.content_hash();
        let response = P::contribute(self.node.secret(), &announcement, &hash)?;

        respond
            .send(response)
            .await
            .map_err(|_| ProtocolError::Transport(format!("{} stopped listening", parent)))?;
        self.advance(NodeState::ResponseSent);
        tracing::debug!(
            protocol = P::NAME,
            url = P::url(&announcement),
            %parent,
            "contributed"
        );

        self.advance(NodeState::Finished);
        Ok(self.state)
    }
}
