use crate::error::Result;
use crate::utils::{base64_bytes, base64_nullable, sha256_digest_parts, Clock};
use data_encoding::HEXLOWER;
use log::info;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payload carried by the genesis block
pub const GENESIS_DATA: &str = "genesis";

/// Fixed genesis timestamp so every node derives the same first block
pub const GENESIS_TIMESTAMP: i64 = 1_465_154_705;

/// The well-known first block of every valid chain
pub static GENESIS_BLOCK: Lazy<Block> = Lazy::new(Block::generate_genesis_block);

/// A single hash-linked ledger record.
///
/// Blocks are minted once and never mutated; the field names are part of
/// the peer wire contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    index: u64,
    data: String,
    timestamp: i64,
    #[serde(with = "base64_bytes")]
    hash: Vec<u8>,
    #[serde(with = "base64_nullable")]
    previous_hash: Vec<u8>,
}

impl Block {
    /// Mint the successor of `previous` carrying `data`, stamped by `clock`.
    pub fn mint(previous: &Block, data: impl Into<String>, clock: &dyn Clock) -> Result<Block> {
        let data = data.into();
        let index = previous.index + 1;
        let timestamp = clock.now()?;
        let previous_hash = previous.hash.clone();
        let hash = Self::calculate_hash(index, &data, timestamp, &previous_hash);

        let block = Block {
            index,
            data,
            timestamp,
            hash,
            previous_hash,
        };
        info!("Minted block {} at index {index}", block.short_hash());
        Ok(block)
    }

    /// Build a block from raw fields without recomputing its hash.
    ///
    /// Used for blocks received from elsewhere; pass the result through the
    /// validator before trusting it.
    pub fn from_parts(
        index: u64,
        data: impl Into<String>,
        timestamp: i64,
        hash: Vec<u8>,
        previous_hash: Vec<u8>,
    ) -> Block {
        Block {
            index,
            data: data.into(),
            timestamp,
            hash,
            previous_hash,
        }
    }

    /// H(index, data, timestamp, previousHash): SHA-256 over the decimal
    /// index, the payload bytes, the decimal timestamp and the raw
    /// predecessor digest, concatenated in that order.
    pub fn calculate_hash(index: u64, data: &str, timestamp: i64, previous_hash: &[u8]) -> Vec<u8> {
        let index = index.to_string();
        let timestamp = timestamp.to_string();
        sha256_digest_parts(&[
            index.as_bytes(),
            data.as_bytes(),
            timestamp.as_bytes(),
            previous_hash,
        ])
    }

    /// Recompute this block's digest from its own fields
    pub fn recompute_hash(&self) -> Vec<u8> {
        Self::calculate_hash(self.index, &self.data, self.timestamp, &self.previous_hash)
    }

    pub fn generate_genesis_block() -> Block {
        let hash = Self::calculate_hash(0, GENESIS_DATA, GENESIS_TIMESTAMP, &[]);
        Block {
            index: 0,
            data: String::from(GENESIS_DATA),
            timestamp: GENESIS_TIMESTAMP,
            hash,
            previous_hash: Vec::new(),
        }
    }

    pub fn get_index(&self) -> u64 {
        self.index
    }

    pub fn get_data(&self) -> &str {
        self.data.as_str()
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_hash(&self) -> &[u8] {
        &self.hash
    }

    pub fn get_previous_hash(&self) -> &[u8] {
        &self.previous_hash
    }

    /// First eight hex digits of the hash, for log lines
    pub fn short_hash(&self) -> String {
        let hex = HEXLOWER.encode(&self.hash);
        hex.chars().take(8).collect()
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} ({} bytes, ts {})",
            self.index,
            self.short_hash(),
            self.data.len(),
            self.timestamp
        )
    }
}
