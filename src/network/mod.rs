//! Peer-to-peer synchronization
//!
//! This module handles the peer wire protocol, the hub that owns the
//! canonical chain and the peer set, and the per-peer pumps that move
//! messages between a websocket and the hub.

pub mod hub;
pub mod message;
pub mod peer;
pub mod transport;

pub use hub::{Hub, HubHandle, PeerId, PeerRegistration, HUB_COMMAND_CAPACITY};
pub use message::{decode_frame, Message, MessageType};
pub use peer::{connect_peer, serve_peer, PeerSettings};
pub use transport::{into_frames, Frame, FrameSink, FrameStream};
