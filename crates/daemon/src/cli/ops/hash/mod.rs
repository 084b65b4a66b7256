use std::fmt::Write as _;
use std::path::PathBuf;

use clap::{Args, Subcommand};
pub mod private;
pub mod public;

use common::client::{pick_leader, HashTally, Hashes};
use common::crypto::PublicKey;
use common::roster::{Roster, ServerIdentity, TreeError};
use vantage_daemon::http_server::api::client::{ApiClient, ApiError};

use crate::cli::op::{Op, OpContext};

crate::command_enum! {
    (Public, public::Public),
    (Private, private::Private),
}

pub type HashCommand = Command;

#[derive(Args, Debug, Clone)]
pub struct Hash {
    #[command(subcommand)]
    pub command: HashCommand,
}

#[async_trait::async_trait]
impl Op for Hash {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}

/// Arguments shared by both hash variants
#[derive(Args, Debug, Clone)]
pub struct HashArgs {
    /// TOML file listing the servers to ask (`[[servers]]` entries)
    #[arg(long)]
    pub roster: PathBuf,

    /// URL every server should fetch and hash
    pub url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum HashOpError {
    #[error("failed to read roster {0}: {1}")]
    ReadRoster(PathBuf, std::io::Error),
    #[error(transparent)]
    Roster(#[from] TreeError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Client(#[from] common::client::ClientError),
    #[error("leader {0} lists no api_url")]
    NoApiUrl(PublicKey),
}

impl HashArgs {
    pub fn load_roster(&self) -> Result<Roster, HashOpError> {
        let contents = std::fs::read_to_string(&self.roster)
            .map_err(|e| HashOpError::ReadRoster(self.roster.clone(), e))?;
        Ok(Roster::from_toml(&contents)?)
    }
}

/// Node a hash request is submitted to
#[derive(Debug, Clone)]
pub struct Leader {
    /// Roster identity of the leader, unknown when the request goes to `--remote`
    pub identity: Option<PublicKey>,
    pub client: ApiClient,
}

/// Picks a random roster member that publishes an API endpoint. When no member
/// does, the request goes to `--remote` and the leader's identity is left open.
pub fn choose_leader(roster: &Roster, ctx: &OpContext) -> Result<Leader, HashOpError> {
    let reachable: Vec<ServerIdentity> = roster
        .iter()
        .filter(|server| server.api_url.is_some())
        .cloned()
        .collect();
    if reachable.is_empty() {
        return Ok(Leader {
            identity: None,
            client: ctx.client.clone(),
        });
    }
    let reachable = Roster::new(reachable)?;
    let leader = pick_leader(&reachable)?;
    Ok(Leader {
        identity: Some(leader.public_key),
        client: leader_client(leader)?,
    })
}

/// Client for the leader's own API.
pub fn leader_client(leader: &ServerIdentity) -> Result<ApiClient, HashOpError> {
    let url = leader
        .api_url
        .as_ref()
        .ok_or(HashOpError::NoApiUrl(leader.public_key))?;
    Ok(ApiClient::new(url)?)
}

/// One line per distinct hash, largest group first.
pub fn render(leader: &Leader, hashes: &Hashes) -> String {
    let tally = HashTally::new(hashes);
    let mut groups: Vec<_> = tally.groups().collect();
    groups.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

    let mut out = String::new();
    let remote = leader.client.base_url();
    match &leader.identity {
        Some(identity) => {
            let _ = writeln!(out, "leader: {} ({})", identity, remote);
        }
        None => {
            let _ = writeln!(out, "leader: {}", remote);
        }
    }
    let _ = writeln!(
        out,
        "{} servers reported {} distinct hash(es)",
        hashes.len(),
        tally.distinct()
    );
    for (hash, servers) in groups {
        let _ = writeln!(out, "{}  x{}", hex::encode(hash), servers.len());
        for server in servers {
            let _ = writeln!(out, "  {}", server);
        }
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use common::crypto::SecretKey;
    use url::Url;

    use super::*;

    fn ctx() -> OpContext {
        OpContext::new(Url::parse("http://localhost:5001").unwrap(), None).unwrap()
    }

    #[test]
    fn test_leader_is_always_a_member_with_an_api() {
        let api = Url::parse("http://10.0.0.2:5001").unwrap();
        let listed = ServerIdentity::new(SecretKey::generate().public()).with_api_url(api.clone());
        let roster = Roster::new(vec![
            ServerIdentity::new(SecretKey::generate().public()),
            listed.clone(),
            ServerIdentity::new(SecretKey::generate().public()),
        ])
        .unwrap();

        for _ in 0..20 {
            let leader = choose_leader(&roster, &ctx()).unwrap();
            assert_eq!(leader.identity, Some(listed.public_key));
            assert_eq!(leader.client.base_url(), &api);
        }
    }

    #[test]
    fn test_roster_without_apis_goes_to_remote() {
        let roster = Roster::new(vec![
            ServerIdentity::new(SecretKey::generate().public()),
            ServerIdentity::new(SecretKey::generate().public()),
        ])
        .unwrap();

        let leader = choose_leader(&roster, &ctx()).unwrap();
        assert_eq!(leader.identity, None);
        assert_eq!(leader.client.base_url().as_str(), "http://localhost:5001/");

        let rendered = render(&leader, &Hashes::new());
        assert!(rendered.starts_with("leader: http://localhost:5001/\n"));
    }

    #[test]
    fn test_leader_client_needs_an_api_url() {
        let server = ServerIdentity::new(SecretKey::generate().public());
        assert!(matches!(
            leader_client(&server),
            Err(HashOpError::NoApiUrl(key)) if key == server.public_key
        ));
    }
}
