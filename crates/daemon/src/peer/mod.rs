//! Overlay transport between roster members
//!
//! Every server runs an iroh endpoint keyed by its roster identity, so a
//! roster public key doubles as the node id to dial. A root reaches each
//! child with one bidirectional stream per run: the announcement goes down
//! as a bincode [`Message`](common::protocol::Message), the child's single
//! [`Reply`](common::protocol::Reply) comes back up.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use iroh::discovery::pkarr::dht::DhtDiscovery;
use iroh::protocol::Router;
use iroh::{Endpoint, NodeAddr};
use tokio::sync::watch::Receiver as WatchReceiver;

use common::crypto::SecretKey;
use common::roster::ServerIdentity;

mod handler;
mod overlay;

pub use handler::HashHandler;
pub use overlay::IrohOverlay;

/// ALPN identifier for the hash protocols
pub const ALPN: &[u8] = b"/vantage/hash/1";

/// Largest message or reply accepted on a stream
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    #[error("invalid listen address: {0}")]
    ListenAddr(String),
    #[error("failed to set up discovery: {0}")]
    Discovery(String),
    #[error("failed to bind endpoint: {0}")]
    Bind(String),
    #[error("router shutdown failed: {0}")]
    Shutdown(String),
}

/// Binds this node's endpoint.
///
/// With `discovery` off the endpoint neither publishes to the DHT nor uses
/// relays; children are then only reachable at their roster addresses.
pub async fn bind_endpoint(
    secret_key: &SecretKey,
    listen_addr: Option<SocketAddr>,
    discovery: bool,
) -> Result<Endpoint, PeerError> {
    let socket_addr =
        listen_addr.unwrap_or_else(|| SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), 0));
    let addr = match socket_addr {
        SocketAddr::V4(addr) => addr,
        SocketAddr::V6(addr) => {
            return Err(PeerError::ListenAddr(format!(
                "{} is not an ipv4 address",
                addr
            )))
        }
    };

    let builder = Endpoint::builder().secret_key(secret_key.0.clone());
    let builder = if discovery {
        let mainline_discovery = DhtDiscovery::builder()
            .secret_key(secret_key.0.clone())
            .build()
            .map_err(|e| PeerError::Discovery(e.to_string()))?;
        builder.discovery(mainline_discovery)
    } else {
        builder.relay_mode(iroh::RelayMode::Disabled)
    };

    builder
        .bind_addr_v4(SocketAddrV4::new(*addr.ip(), addr.port()))
        .bind()
        .await
        .map_err(|e| PeerError::Bind(e.to_string()))
}

/// Serves inbound announcements until `shutdown_rx` fires.
pub async fn spawn(
    endpoint: Endpoint,
    handler: HashHandler,
    mut shutdown_rx: WatchReceiver<()>,
) -> Result<(), PeerError> {
    let router = Router::builder(endpoint).accept(ALPN, handler).spawn();

    let _ = shutdown_rx.changed().await;

    router
        .shutdown()
        .await
        .map_err(|e| PeerError::Shutdown(e.to_string()))?;
    Ok(())
}

/// Dialable address of a roster member; the relay is left to discovery.
pub fn node_addr(server: &ServerIdentity) -> NodeAddr {
    NodeAddr::from_parts(*server.public_key, None, server.peer_addrs.clone())
}
