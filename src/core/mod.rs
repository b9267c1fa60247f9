//! Core ledger functionality
//!
//! This module contains the block and chain model, the validator and the
//! consensus rule that decides between competing chains.

pub mod block;
pub mod chain;
pub mod consensus;
pub mod validation;

pub use block::{Block, GENESIS_BLOCK, GENESIS_DATA, GENESIS_TIMESTAMP};
pub use chain::{latest, Chain};
pub use consensus::{resolve, Outcome};
pub use validation::{ensure_valid_chain, validate_block, validate_chain, validate_chain_from};
