//! Peer wire messages.
//!
//! An envelope is a JSON object `{"messageType": 0|1|2, "data": [...]|null}`.
//! Several envelopes may share one transport frame, separated by newlines.

use crate::core::Block;
use crate::error::{BlockchainError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The three kinds of peer message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum MessageType {
    /// Ask for the single most recent block
    QueryLatest,
    /// Ask for the entire chain
    QueryAll,
    /// One or more blocks: a proposal, a tip, or a full chain
    Blockchain,
}

impl TryFrom<u8> for MessageType {
    type Error = String;

    fn try_from(tag: u8) -> std::result::Result<Self, Self::Error> {
        match tag {
            0 => Ok(MessageType::QueryLatest),
            1 => Ok(MessageType::QueryAll),
            2 => Ok(MessageType::Blockchain),
            _ => Err(format!("unknown message type {tag}")),
        }
    }
}

impl From<MessageType> for u8 {
    fn from(message_type: MessageType) -> u8 {
        match message_type {
            MessageType::QueryLatest => 0,
            MessageType::QueryAll => 1,
            MessageType::Blockchain => 2,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageType::QueryLatest => write!(f, "QUERY_LATEST"),
            MessageType::QueryAll => write!(f, "QUERY_ALL"),
            MessageType::Blockchain => write!(f, "BLOCKCHAIN"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub message_type: MessageType,
    #[serde(default)]
    pub data: Option<Vec<Block>>,
}

impl Message {
    pub fn query_latest() -> Message {
        Message {
            message_type: MessageType::QueryLatest,
            data: None,
        }
    }

    pub fn query_all() -> Message {
        Message {
            message_type: MessageType::QueryAll,
            data: None,
        }
    }

    pub fn blockchain(blocks: Vec<Block>) -> Message {
        Message {
            message_type: MessageType::Blockchain,
            data: Some(blocks),
        }
    }

    /// Carried blocks; `null` data reads as an empty chain
    pub fn blocks(&self) -> &[Block] {
        self.data.as_deref().unwrap_or(&[])
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.data.unwrap_or_default()
    }

    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| BlockchainError::Serialization(format!("Failed to encode message: {e}")))
    }

    pub fn decode(text: &str) -> Result<Message> {
        serde_json::from_str(text)
            .map_err(|e| BlockchainError::Serialization(format!("Failed to decode message: {e}")))
    }
}

/// Split a transport frame into envelopes and decode each one.
///
/// Blank lines are skipped. A line that fails to decode yields an error in
/// its slot without affecting the others.
pub fn decode_frame(frame: &str) -> Vec<Result<Message>> {
    frame
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(Message::decode)
        .collect()
}
