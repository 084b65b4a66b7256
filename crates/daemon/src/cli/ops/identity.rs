use std::net::{IpAddr, SocketAddr};

use clap::Args;
use url::Url;

use common::roster::{Roster, ServerIdentity, TreeError};
use vantage_daemon::state::{AppState, StateError};

/// Print the roster entry for this node
#[derive(Args, Debug, Clone)]
pub struct Identity {
    /// IP address other servers and clients reach this node at
    #[arg(long, default_value = "127.0.0.1")]
    pub host: IpAddr,
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("state error: {0}")]
    State(#[from] StateError),
    #[error("invalid api url: {0}")]
    ApiUrl(#[from] url::ParseError),
    #[error(transparent)]
    Roster(#[from] TreeError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Identity {
    type Error = IdentityError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = AppState::load(ctx.config_path.clone())?;
        let public_key = state.load_key()?.public();

        let api_addr = SocketAddr::new(self.host, state.config.api_port);
        let api_url = Url::parse(&format!("http://{}", api_addr))?;
        let mut identity = ServerIdentity::new(public_key).with_api_url(api_url);

        // an ephemeral peer port can only be learned from the running daemon
        if let Some(port) = state.config.peer_port {
            identity = identity.with_peer_addrs(vec![SocketAddr::new(self.host, port)]);
        }

        Ok(Roster::new(vec![identity])?.to_toml()?.trim_end().to_string())
    }
}
