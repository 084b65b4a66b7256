use iroh::Endpoint;

use common::protocol::{
    Cancellation, HashProtocol, Message, Overlay, ProtocolError, Reply, ResponseSender,
};
use common::roster::ServerIdentity;

use super::{node_addr, ALPN, MAX_MESSAGE_SIZE};

/// Delivers announcements to roster members over iroh.
#[derive(Debug, Clone)]
pub struct IrohOverlay {
    endpoint: Endpoint,
}

impl IrohOverlay {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }
}

impl<P: HashProtocol> Overlay<P> for IrohOverlay {
    fn deliver(
        &self,
        child: &ServerIdentity,
        announcement: P::Announcement,
        parent: ResponseSender<P>,
        mut cancel: Cancellation,
    ) -> Result<(), ProtocolError> {
        let endpoint = self.endpoint.clone();
        let child = child.clone();
        let message = P::wrap_announcement(announcement);

        tokio::spawn(async move {
            let reply = tokio::select! {
                reply = exchange(&endpoint, &child, message) => reply,
                _ = cancel.cancelled() => {
                    tracing::debug!(protocol = P::NAME, child = %child.public_key, "delivery cancelled");
                    return;
                }
            };

            let reply = match reply {
                Ok(reply) => reply,
                Err(e) => {
                    tracing::warn!(protocol = P::NAME, child = %child.public_key, "exchange failed: {}", e);
                    return;
                }
            };
            if let Reply::Aborted(reason) = &reply {
                tracing::info!(protocol = P::NAME, child = %child.public_key, "child aborted: {}", reason);
                return;
            }
            let Some(response) = P::unwrap_reply(reply) else {
                tracing::warn!(protocol = P::NAME, child = %child.public_key, "reply for the wrong protocol");
                return;
            };
            if P::sender(&response) != &child.public_key {
                tracing::warn!(
                    protocol = P::NAME,
                    child = %child.public_key,
                    claimed = %P::sender(&response),
                    "reply signed for another identity"
                );
                return;
            }
            // parent is dropped on every path, closing this edge
            let _ = parent.send(response).await;
        });
        Ok(())
    }
}

/// One announcement down, one reply up, on a fresh bidirectional stream.
async fn exchange(
    endpoint: &Endpoint,
    child: &ServerIdentity,
    message: Message,
) -> Result<Reply, ProtocolError> {
    let transport = |what: &str, e: &dyn std::fmt::Display| {
        ProtocolError::Transport(format!("{} {}: {}", what, child.public_key, e))
    };

    let conn = endpoint
        .connect(node_addr(child), ALPN)
        .await
        .map_err(|e| transport("failed to connect to", &e))?;
    let (mut send, mut recv) = conn
        .open_bi()
        .await
        .map_err(|e| transport("failed to open stream to", &e))?;

    let message_bytes =
        bincode::serialize(&message).map_err(|e| transport("failed to encode message for", &e))?;
    send.write_all(&message_bytes)
        .await
        .map_err(|e| transport("failed to write to", &e))?;
    send.finish()
        .map_err(|e| transport("failed to finish stream to", &e))?;

    let reply_bytes = recv
        .read_to_end(MAX_MESSAGE_SIZE)
        .await
        .map_err(|e| transport("failed to read reply from", &e))?;
    conn.close(0u32.into(), b"done");
    bincode::deserialize(&reply_bytes).map_err(|e| transport("failed to decode reply from", &e))
}
