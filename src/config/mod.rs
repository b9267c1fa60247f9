//! Configuration management
//!
//! This module handles node settings: listen address, peers to dial at
//! startup, and the per-peer limits and timers.

pub mod settings;

pub use settings::NodeConfig;
