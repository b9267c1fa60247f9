//! Error handling for the ledger node
//!
//! Peer-local failures are logged and never leave the connection that caused
//! them. Only `EmptyChain` on the canonical chain is treated as fatal.

use std::fmt;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, BlockchainError>;

/// Error types for ledger, hub and transport operations
#[derive(Debug, Clone, PartialEq)]
pub enum BlockchainError {
    /// A chain with no blocks where at least the genesis block is required
    EmptyChain,
    /// Block or chain validation errors
    InvalidBlock(String),
    /// Network and transport errors
    Network(String),
    /// Serialization/deserialization errors
    Serialization(String),
    /// Configuration errors
    Config(String),
    /// File I/O errors
    Io(String),
    /// System clock errors
    Clock(String),
    /// The hub event loop is no longer running
    HubClosed,
}

impl fmt::Display for BlockchainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockchainError::EmptyChain => write!(f, "Empty chain: no blocks present"),
            BlockchainError::InvalidBlock(msg) => write!(f, "Invalid block: {msg}"),
            BlockchainError::Network(msg) => write!(f, "Network error: {msg}"),
            BlockchainError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            BlockchainError::Config(msg) => write!(f, "Configuration error: {msg}"),
            BlockchainError::Io(msg) => write!(f, "I/O error: {msg}"),
            BlockchainError::Clock(msg) => write!(f, "Clock error: {msg}"),
            BlockchainError::HubClosed => write!(f, "Hub is not running"),
        }
    }
}

impl std::error::Error for BlockchainError {}

impl From<std::io::Error> for BlockchainError {
    fn from(err: std::io::Error) -> Self {
        BlockchainError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BlockchainError {
    fn from(err: serde_json::Error) -> Self {
        BlockchainError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for BlockchainError {
    fn from(err: toml::de::Error) -> Self {
        BlockchainError::Config(err.to_string())
    }
}

impl From<axum::Error> for BlockchainError {
    fn from(err: axum::Error) -> Self {
        BlockchainError::Network(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for BlockchainError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        BlockchainError::Network(err.to_string())
    }
}
