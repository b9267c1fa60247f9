//! # Ace Chain - My Peer-Synchronized Ledger Node
//!
//! This is a small append-only ledger that I keep in sync across a set of
//! nodes over websockets. When I come back to this code, here's what I need
//! to remember:
//!
//! ## What I Built
//! - **Hash-Linked Ledger**: Every block commits to its predecessor with SHA-256
//! - **Longest-Valid-Chain Consensus**: A valid, strictly longer chain always wins
//! - **Hub Actor**: One task owns the chain and the peer set, everyone else sends it messages
//! - **Peer Pumps**: A reader and a writer per websocket, with liveness probes and coalescing
//! - **HTTP API**: Read the chain, submit data, list and connect peers
//!
//! ## How I Organized My Code
//! - `core/`: Blocks, chain snapshots, validation and the consensus rule
//! - `network/`: Wire messages, the hub, and the per-peer pumps
//! - `api/`: The HTTP routes and the websocket upgrade for inbound peers
//! - `config/`: Node settings from defaults, a TOML file and the environment
//! - `utils/`: Digest, clock and wire encoding helpers
//! - `cli/`: Command-line interface
//!
//! ## Key Design Decisions I Made
//! - Nothing is persisted; a restarted node re-syncs from its peers
//! - The hub never waits on a peer: a full mailbox gets the peer evicted
//! - Chain snapshots are immutable and shared, so reads never block writes
//!
//! ## When I Need to Understand Something
//! 1. Start with `main.rs` to see how a node is wired together
//! 2. Look at `core/consensus.rs` for how competing chains are resolved
//! 3. Check `network/hub.rs` for the event loop and fan-out
//! 4. Review `network/peer.rs` for the reader/writer pumps

pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod network;
pub mod utils;

#[cfg(test)]
pub mod testnet;

// Re-export commonly used types for convenience
pub use api::{router, serve, serve_listener, ApiState};
pub use cli::{Command, Opt};
pub use config::NodeConfig;
pub use core::{
    ensure_valid_chain, resolve, validate_block, validate_chain, Block, Chain, Outcome, GENESIS_BLOCK,
};
pub use error::{BlockchainError, Result};
pub use network::{
    connect_peer, serve_peer, Hub, HubHandle, Message, MessageType, PeerId, PeerSettings,
};
pub use utils::{current_timestamp, sha256_digest, Clock, SystemClock};
