use crate::error::{BlockchainError, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

static DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8081";

const NODE_ADDRESS_KEY: &str = "NODE_ADDRESS";
const NODE_PEERS_KEY: &str = "NODE_PEERS";

/// Node settings: defaults, then an optional TOML file, then environment,
/// then command line flags applied by the caller.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Address the HTTP and peer endpoints listen on
    pub http_addr: String,
    /// Peer endpoints to dial at startup, e.g. `ws://10.0.0.2:8081/addPeer`
    pub peers: Vec<String>,
    pub mailbox_capacity: usize,
    pub max_message_size: usize,
    pub pong_wait_secs: u64,
    pub write_wait_secs: u64,
    pub log_level: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            http_addr: String::from(DEFAULT_HTTP_ADDR),
            peers: Vec::new(),
            mailbox_capacity: 256,
            max_message_size: 1024 * 1024,
            pong_wait_secs: 60,
            write_wait_secs: 10,
            log_level: String::from("info"),
        }
    }
}

impl NodeConfig {
    /// Load from `path` when given, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<NodeConfig> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => NodeConfig::default(),
        };
        config.apply_env(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<NodeConfig> {
        let contents = fs::read_to_string(path).map_err(|e| {
            BlockchainError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<NodeConfig> {
        Ok(toml::from_str(contents)?)
    }

    /// Apply `NODE_ADDRESS` and `NODE_PEERS` through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(addr) = lookup(NODE_ADDRESS_KEY) {
            self.http_addr = addr;
        }
        if let Some(peers) = lookup(NODE_PEERS_KEY) {
            self.peers = peers
                .split(',')
                .map(str::trim)
                .filter(|peer| !peer.is_empty())
                .map(String::from)
                .collect();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.mailbox_capacity == 0 {
            return Err(BlockchainError::Config(
                "mailbox_capacity must be at least 1".to_string(),
            ));
        }
        if self.max_message_size == 0 {
            return Err(BlockchainError::Config(
                "max_message_size must be at least 1".to_string(),
            ));
        }
        if self.pong_wait_secs == 0 {
            return Err(BlockchainError::Config(
                "pong_wait_secs must be at least 1".to_string(),
            ));
        }
        if self.write_wait_secs == 0 {
            return Err(BlockchainError::Config(
                "write_wait_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn pong_wait(&self) -> Duration {
        Duration::from_secs(self.pong_wait_secs)
    }

    /// Liveness probe interval, nine tenths of the pong wait
    pub fn ping_period(&self) -> Duration {
        self.pong_wait() * 9 / 10
    }

    pub fn write_wait(&self) -> Duration {
        Duration::from_secs(self.write_wait_secs)
    }
}
