use crate::core::{Block, GENESIS_BLOCK};
use crate::error::{BlockchainError, Result};
use serde::{Serialize, Serializer};
use std::sync::Arc;

/// Last block of a sequence, or `EmptyChain` when there is none
pub fn latest(blocks: &[Block]) -> Result<&Block> {
    blocks.last().ok_or(BlockchainError::EmptyChain)
}

/// An immutable snapshot of the ledger, genesis first.
///
/// Cloning shares the underlying blocks. A snapshot is never modified;
/// growing the ledger produces a new `Chain`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    blocks: Arc<Vec<Block>>,
}

impl Chain {
    /// A chain holding only the well-known genesis block
    pub fn new() -> Chain {
        Chain {
            blocks: Arc::new(vec![GENESIS_BLOCK.clone()]),
        }
    }

    /// Wrap received blocks. Structure is not checked here; run the
    /// validator first.
    pub fn from_blocks(blocks: Vec<Block>) -> Result<Chain> {
        if blocks.is_empty() {
            return Err(BlockchainError::EmptyChain);
        }
        Ok(Chain {
            blocks: Arc::new(blocks),
        })
    }

    /// New snapshot with `block` appended after the current tip
    pub fn append(&self, block: Block) -> Chain {
        let mut blocks = Vec::with_capacity(self.blocks.len() + 1);
        blocks.extend(self.blocks.iter().cloned());
        blocks.push(block);
        Chain {
            blocks: Arc::new(blocks),
        }
    }

    pub fn latest(&self) -> Result<&Block> {
        latest(&self.blocks)
    }

    pub fn blocks(&self) -> &[Block] {
        self.blocks.as_slice()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

impl Serialize for Chain {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.blocks.serialize(serializer)
    }
}
