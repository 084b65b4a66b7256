use clap::Args;

use common::roster::ServerIdentity;
use vantage_daemon::state::AppState;

#[derive(Args, Debug, Clone)]
pub struct Health;

#[derive(Debug, thiserror::Error)]
pub enum HealthError {
    #[error("Health check failed: {0}")]
    Failed(String),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Health {
    type Error = HealthError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut lines = Vec::new();

        // 1. Check config directory
        lines.push("Config:".to_string());
        match AppState::load(ctx.config_path.clone()) {
            Ok(state) => {
                lines.push(format!("  directory:    {}", state.vantage_dir.display()));
                lines.push("  config.toml:  OK".to_string());
                match state.load_key() {
                    Ok(key) => lines.push(format!("  key.pem:      OK ({})", key.public())),
                    Err(e) => lines.push(format!("  key.pem:      {}", e)),
                }
                lines.push(format!("  file_root:    {}", state.file_root().display()));
                lines.push(format!("  api_port:     {}", state.config.api_port));
            }
            Err(e) => {
                lines.push(format!("  error: {}", e));
            }
        }

        // 2. Check daemon liveness
        let base = ctx.client.base_url();
        let client = ctx.client.http_client();
        let status_url = |path: &str| format!("{}/_status/{}", base.as_str().trim_end_matches('/'), path);

        lines.push(String::new());
        lines.push(format!("Daemon ({}):", base));

        match client.get(status_url("livez")).send().await {
            Ok(resp) if resp.status().is_success() => {
                lines.push("  livez:    OK".to_string());
            }
            Ok(resp) => {
                lines.push(format!("  livez:    UNHEALTHY ({})", resp.status()));
            }
            Err(_) => {
                lines.push("  livez:    NOT REACHABLE".to_string());
                return Ok(lines.join("\n"));
            }
        }

        // 3. Print the roster entry the daemon advertises
        let identity = client
            .get(status_url("identity"))
            .send()
            .await
            .map_err(|e| HealthError::Failed(e.to_string()))?
            .json::<ServerIdentity>()
            .await
            .map_err(|e| HealthError::Failed(e.to_string()))?;
        lines.push(format!("  identity: {}", identity.public_key));
        for addr in &identity.peer_addrs {
            lines.push(format!("  peer:     {}", addr));
        }

        Ok(lines.join("\n"))
    }
}
