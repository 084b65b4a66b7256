//! Server rosters and the overlay trees built from them
//!
//! A roster is the client-chosen, ordered set of servers that should take
//! part in one request. The leader (whichever roster member received the
//! request) builds a flat tree from it: itself as root, every other member
//! as a direct child.

use std::collections::BTreeSet;
use std::net::SocketAddr;

use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::crypto::PublicKey;

#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    #[error("roster is empty")]
    EmptyRoster,
    #[error("roster lists {0} more than once")]
    DuplicateIdentity(PublicKey),
    #[error("{0} is not a member of the roster")]
    RootNotInRoster(PublicKey),
    #[error("invalid roster file: {0}")]
    Parse(String),
}

/// Everything a client or a peer needs to reach one server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerIdentity {
    pub public_key: PublicKey,
    /// Base URL of the server's HTTP API, used by clients
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<Url>,
    /// Direct socket addresses of the server's overlay endpoint
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub peer_addrs: Vec<SocketAddr>,
}

impl ServerIdentity {
    pub fn new(public_key: PublicKey) -> Self {
        Self {
            public_key,
            api_url: None,
            peer_addrs: Vec::new(),
        }
    }

    pub fn with_api_url(mut self, api_url: Url) -> Self {
        self.api_url = Some(api_url);
        self
    }

    pub fn with_peer_addrs(mut self, peer_addrs: Vec<SocketAddr>) -> Self {
        self.peer_addrs = peer_addrs;
        self
    }
}

/// Ordered list of distinct server identities
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Roster {
    servers: Vec<ServerIdentity>,
}

impl<'de> Deserialize<'de> for Roster {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawRoster {
            #[serde(default)]
            servers: Vec<ServerIdentity>,
        }

        let raw = RawRoster::deserialize(deserializer)?;
        Roster::new(raw.servers).map_err(serde::de::Error::custom)
    }
}

impl Roster {
    /// Builds a roster, rejecting any identity listed twice.
    pub fn new(servers: Vec<ServerIdentity>) -> Result<Self, TreeError> {
        let mut seen = BTreeSet::new();
        for server in &servers {
            if !seen.insert(server.public_key) {
                return Err(TreeError::DuplicateIdentity(server.public_key));
            }
        }
        Ok(Self { servers })
    }

    /// Parses a roster file of `[[servers]]` tables.
    pub fn from_toml(contents: &str) -> Result<Self, TreeError> {
        toml::from_str(contents).map_err(|e| TreeError::Parse(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String, TreeError> {
        toml::to_string_pretty(self).map_err(|e| TreeError::Parse(e.to_string()))
    }

    pub fn servers(&self) -> &[ServerIdentity] {
        &self.servers
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServerIdentity> {
        self.servers.iter()
    }

    pub fn public_keys(&self) -> impl Iterator<Item = &PublicKey> {
        self.servers.iter().map(|server| &server.public_key)
    }

    pub fn get(&self, public_key: &PublicKey) -> Option<&ServerIdentity> {
        self.servers
            .iter()
            .find(|server| &server.public_key == public_key)
    }

    pub fn contains(&self, public_key: &PublicKey) -> bool {
        self.get(public_key).is_some()
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Picks a member uniformly at random, e.g. to act as leader.
    pub fn random_server(&self) -> Result<&ServerIdentity, TreeError> {
        self.servers
            .choose(&mut rand::rng())
            .ok_or(TreeError::EmptyRoster)
    }
}

/// Depth-one overlay tree rooted at the request's leader
#[derive(Debug, Clone)]
pub struct Tree {
    root: ServerIdentity,
    children: Vec<ServerIdentity>,
}

impl Tree {
    /// Root at `root`, with every other roster member as a direct child
    /// in roster order.
    pub fn flat(roster: &Roster, root: &PublicKey) -> Result<Self, TreeError> {
        if roster.is_empty() {
            return Err(TreeError::EmptyRoster);
        }
        let root = roster
            .get(root)
            .cloned()
            .ok_or(TreeError::RootNotInRoster(*root))?;
        let children = roster
            .iter()
            .filter(|server| server.public_key != root.public_key)
            .cloned()
            .collect();
        Ok(Self { root, children })
    }

    pub fn root(&self) -> &ServerIdentity {
        &self.root
    }

    pub fn children(&self) -> &[ServerIdentity] {
        &self.children
    }

    pub fn is_root(&self, public_key: &PublicKey) -> bool {
        &self.root.public_key == public_key
    }

    pub fn is_child(&self, public_key: &PublicKey) -> bool {
        self.children
            .iter()
            .any(|child| &child.public_key == public_key)
    }

    /// Number of nodes, root included
    pub fn size(&self) -> usize {
        self.children.len() + 1
    }
}
