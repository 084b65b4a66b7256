use std::{fs, path::PathBuf};

use common::prelude::SecretKey;
use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "vantage";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const KEY_FILE_NAME: &str = "key.pem";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Port for the HTTP API clients submit hash requests to
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    /// Listen port for the peer (P2P) node (optional, defaults to ephemeral)
    #[serde(default)]
    pub peer_port: Option<u16>,
    /// Directory `file://` URLs are resolved against and confined to
    #[serde(default = "default_file_root")]
    pub file_root: PathBuf,
    /// Upper bound on one protocol run, in milliseconds
    #[serde(default = "default_protocol_timeout_ms")]
    pub protocol_timeout_ms: u64,
    /// Fewest child contributions a leader will return to a client
    #[serde(default = "default_min_contributions")]
    pub min_contributions: usize,
    /// Publish and resolve peer addresses over the mainline DHT
    #[serde(default = "default_peer_discovery")]
    pub peer_discovery: bool,
    /// Directory for log files (logs to stdout only if not set)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_api_port() -> u16 {
    5001
}

fn default_file_root() -> PathBuf {
    PathBuf::from("..")
}

fn default_protocol_timeout_ms() -> u64 {
    5000
}

fn default_min_contributions() -> usize {
    1
}

fn default_peer_discovery() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            peer_port: None,
            file_root: default_file_root(),
            protocol_timeout_ms: default_protocol_timeout_ms(),
            min_contributions: default_min_contributions(),
            peer_discovery: default_peer_discovery(),
            log_dir: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the vantage directory (~/.vantage)
    pub vantage_dir: PathBuf,
    /// Path to the node key PEM file
    pub key_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the vantage directory path (custom or default ~/.vantage)
    pub fn vantage_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new state directory with a fresh node key
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let vantage_dir = Self::vantage_dir(custom_path)?;

        if vantage_dir.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&vantage_dir)?;

        let key = SecretKey::generate();
        let key_path = vantage_dir.join(KEY_FILE_NAME);
        fs::write(&key_path, key.to_pem())?;

        let config = config.unwrap_or_default();
        let config_path = vantage_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        Ok(Self {
            vantage_dir,
            key_path,
            config_path,
            config,
        })
    }

    /// Load existing state from the vantage directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let vantage_dir = Self::vantage_dir(custom_path)?;

        if !vantage_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let key_path = vantage_dir.join(KEY_FILE_NAME);
        let config_path = vantage_dir.join(CONFIG_FILE_NAME);

        if !key_path.exists() {
            return Err(StateError::MissingFile(KEY_FILE_NAME.to_string()));
        }
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            vantage_dir,
            key_path,
            config_path,
            config,
        })
    }

    /// Load the secret key from the key file
    pub fn load_key(&self) -> Result<SecretKey, StateError> {
        let pem = fs::read_to_string(&self.key_path)?;
        let key = SecretKey::from_pem(&pem).map_err(|e| StateError::InvalidKey(e.to_string()))?;
        Ok(key)
    }

    /// `file_root` resolved against the state directory when relative
    pub fn file_root(&self) -> PathBuf {
        if self.config.file_root.is_absolute() {
            self.config.file_root.clone()
        } else {
            self.vantage_dir.join(&self.config.file_root)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("vantage directory not initialized. Run 'vantage init' first")]
    NotInitialized,

    #[error("vantage directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
