//! Test fixtures for ledger, hub and peer-link tests
//!
//! Deterministic chains, a pinned clock, in-memory transports and mailbox
//! helpers so hub scenarios can run without sockets.

pub mod test_utils;

pub use test_utils::*;
