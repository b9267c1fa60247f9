//! Block and chain validation.
//!
//! Both checks are pure and return `bool`; the reason for a rejection is
//! logged. Timestamps are taken at face value.

use crate::core::{Block, GENESIS_BLOCK};
use crate::error::{BlockchainError, Result};
use log::warn;

/// Check `candidate` as the direct successor of `previous`.
pub fn validate_block(candidate: &Block, previous: &Block) -> bool {
    if candidate.get_index() != previous.get_index() + 1 {
        warn!(
            "Invalid index: expected {}, got {}",
            previous.get_index() + 1,
            candidate.get_index()
        );
        return false;
    }
    if candidate.get_previous_hash() != previous.get_hash() {
        warn!(
            "Invalid predecessor link for block {}: does not point at {}",
            candidate.get_index(),
            previous.short_hash()
        );
        return false;
    }
    if candidate.recompute_hash() != candidate.get_hash() {
        warn!(
            "Invalid hash for block {}: contents were tampered with",
            candidate.get_index()
        );
        return false;
    }
    true
}

/// Check a whole chain: rooted at the well-known genesis block, every
/// adjacent pair linked. The empty chain is never valid.
pub fn validate_chain(blocks: &[Block]) -> bool {
    validate_chain_from(blocks, &GENESIS_BLOCK)
}

pub fn validate_chain_from(blocks: &[Block], genesis: &Block) -> bool {
    let Some(first) = blocks.first() else {
        warn!("Invalid chain: no blocks");
        return false;
    };
    if first != genesis {
        warn!("Invalid chain: first block is not the genesis block");
        return false;
    }
    blocks
        .windows(2)
        .all(|pair| validate_block(&pair[1], &pair[0]))
}

/// `validate_chain` for callers that propagate errors
pub fn ensure_valid_chain(blocks: &[Block]) -> Result<()> {
    if validate_chain(blocks) {
        Ok(())
    } else {
        Err(BlockchainError::InvalidBlock(format!(
            "chain of {} blocks failed validation",
            blocks.len()
        )))
    }
}
