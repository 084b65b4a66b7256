use futures::future::BoxFuture;
use iroh::endpoint::Connection;
use iroh::protocol::{AcceptError, ProtocolHandler};
use tokio::sync::{mpsc, oneshot};

use common::crypto::PublicKey;
use common::protocol::{
    cancellation, HashPrivate, HashProtocol, HashPublic, Message, NodeContext, ProtocolInstance,
    Reply,
};

use super::MAX_MESSAGE_SIZE;

/// Answers announcements from roster roots by running a leaf instance.
#[derive(Debug, Clone)]
pub struct HashHandler {
    node: NodeContext,
}

impl HashHandler {
    pub fn new(node: NodeContext) -> Self {
        Self { node }
    }
}

fn accept_error(msg: String) -> AcceptError {
    tracing::error!("{}", msg);
    AcceptError::from(std::io::Error::other(msg))
}

impl ProtocolHandler for HashHandler {
    #[allow(refining_impl_trait)]
    fn accept(&self, conn: Connection) -> BoxFuture<'static, Result<(), AcceptError>> {
        let node = self.node.clone();
        Box::pin(async move {
            let parent: PublicKey = conn
                .remote_node_id()
                .map_err(|e| accept_error(format!("unknown remote node: {}", e)))?
                .into();
            let (mut send, mut recv) = conn.accept_bi().await.map_err(|e| {
                tracing::error!("failed to accept bidirectional stream: {}", e);
                AcceptError::from(e)
            })?;

            let message_bytes = recv
                .read_to_end(MAX_MESSAGE_SIZE)
                .await
                .map_err(|e| accept_error(format!("failed to read message: {}", e)))?;
            let message: Message = bincode::deserialize(&message_bytes)
                .map_err(|e| accept_error(format!("failed to decode message: {}", e)))?;
            tracing::debug!(%parent, url = message.url(), "announcement received");

            let leaf = async {
                match message {
                    Message::HashPublic(announcement) => {
                        run_leaf::<HashPublic>(node, parent, announcement).await
                    }
                    Message::HashPrivate(announcement) => {
                        run_leaf::<HashPrivate>(node, parent, announcement).await
                    }
                }
            };
            // the root hanging up cancels the leaf
            let reply = tokio::select! {
                reply = leaf => reply,
                _ = conn.closed() => {
                    tracing::debug!(%parent, "root closed the connection");
                    return Ok(());
                }
            };

            let reply_bytes = bincode::serialize(&reply)
                .map_err(|e| accept_error(format!("failed to encode reply: {}", e)))?;
            send.write_all(&reply_bytes)
                .await
                .map_err(|e| accept_error(format!("failed to send reply: {}", e)))?;
            send.finish()
                .map_err(|e| accept_error(format!("failed to finish stream: {}", e)))?;

            conn.closed().await;
            Ok(())
        })
    }
}

/// Runs one leaf instance to completion and packs its result as a reply.
async fn run_leaf<P: HashProtocol>(
    node: NodeContext,
    parent: PublicKey,
    announcement: P::Announcement,
) -> Reply {
    let (_cancel_handle, cancel) = cancellation();
    let (announce_tx, announce_rx) = oneshot::channel();
    let (respond_tx, mut respond_rx) = mpsc::channel(1);

    let instance = ProtocolInstance::<P>::child(node, parent, announce_rx, respond_tx, cancel);
    let _ = announce_tx.send(announcement);

    if let Err(e) = instance.dispatch().await {
        tracing::warn!(protocol = P::NAME, %parent, "not contributing: {}", e);
        return Reply::Aborted(e.to_string());
    }
    match respond_rx.recv().await {
        Some(response) => P::wrap_response(response),
        None => Reply::Aborted("no contribution produced".into()),
    }
}
