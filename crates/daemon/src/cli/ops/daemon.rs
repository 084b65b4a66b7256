use std::net::SocketAddr;
use std::time::Duration;

use clap::Args;

use vantage_daemon::state::AppState;
use vantage_daemon::{spawn_service, ServiceConfig};

#[derive(Args, Debug, Clone)]
pub struct Daemon {
    /// Override API server port (default from config)
    #[arg(long)]
    pub api_port: Option<u16>,

    /// Override peer listen port (default from config)
    #[arg(long)]
    pub peer_port: Option<u16>,

    /// Directory for log files (default from config, stdout only if unset)
    #[arg(long)]
    pub log_dir: Option<std::path::PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("state error: {0}")]
    StateError(#[from] vantage_daemon::state::StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Daemon {
    type Error = DaemonError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        // Load state from config path (or default ~/.vantage)
        let state = AppState::load(ctx.config_path.clone())?;

        let secret_key = state.load_key()?;

        let node_listen_addr = self
            .peer_port
            .or(state.config.peer_port)
            .map(|port| SocketAddr::from(([0, 0, 0, 0], port)));

        let config = ServiceConfig {
            node_listen_addr,
            node_secret: Some(secret_key),
            peer_discovery: state.config.peer_discovery,
            api_port: self.api_port.unwrap_or(state.config.api_port),
            file_root: state.file_root(),
            protocol_timeout: Duration::from_millis(state.config.protocol_timeout_ms),
            min_contributions: state.config.min_contributions,
            log_level: tracing::Level::DEBUG,
            log_dir: self.log_dir.clone().or(state.config.log_dir.clone()),
        };

        spawn_service(&config).await;
        Ok("daemon ended".to_string())
    }
}
