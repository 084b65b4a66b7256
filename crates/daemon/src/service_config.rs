use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use common::prelude::SecretKey;

#[derive(Debug)]
pub struct Config {
    // peer configuration
    /// address for our peer to listen on,
    ///  if not set then an ephemeral port will be used
    pub node_listen_addr: Option<SocketAddr>,
    /// our long-term identity,
    ///  if not set then a new secret will be generated
    pub node_secret: Option<SecretKey>,
    /// publish and resolve addresses over the mainline DHT and use relays;
    ///  when off, peers are only reached at their roster addresses
    pub peer_discovery: bool,

    // http server configuration
    /// Port for the API HTTP server
    pub api_port: u16,

    // protocol configuration
    /// root directory file:// urls are confined to
    pub file_root: PathBuf,
    pub protocol_timeout: Duration,
    pub min_contributions: usize,

    // logging
    pub log_level: tracing::Level,
    /// Directory for log files (optional, logs to stdout only if not set)
    pub log_dir: Option<PathBuf>,
}
