use clap::Args;

use vantage_daemon::state::{AppConfig, AppState, StateError};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// API server port
    #[arg(long, default_value_t = 5001)]
    pub api_port: u16,

    /// Peer (P2P) node listen port (optional, defaults to ephemeral port if not specified)
    #[arg(long)]
    pub peer_port: Option<u16>,

    /// Directory file:// URLs are confined to, relative to the config directory
    #[arg(long)]
    pub file_root: Option<std::path::PathBuf>,

    /// Only reach peers at their roster addresses (no DHT, no relays)
    #[arg(long)]
    pub no_discovery: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut config = AppConfig {
            api_port: self.api_port,
            peer_port: self.peer_port,
            peer_discovery: !self.no_discovery,
            ..Default::default()
        };
        if let Some(file_root) = &self.file_root {
            config.file_root = file_root.clone();
        }

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;
        let public_key = state.load_key()?.public();

        let peer_port_str = match state.config.peer_port {
            Some(port) => format!("{}", port),
            None => "ephemeral (auto-assigned)".to_string(),
        };

        let output = format!(
            "Initialized vantage directory at: {}\n\
             - Identity: {}\n\
             - Key: {}\n\
             - Config: {}\n\
             - File root: {}\n\
             - API port: {}\n\
             - Peer port: {}",
            state.vantage_dir.display(),
            public_key,
            state.key_path.display(),
            state.config_path.display(),
            state.file_root().display(),
            state.config.api_port,
            peer_port_str
        );

        Ok(output)
    }
}
