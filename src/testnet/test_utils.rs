//! Test utilities for chain and network testing

use crate::core::{Block, Chain};
use crate::error::{BlockchainError, Result};
use crate::network::{decode_frame, Frame, FrameSink, FrameStream, HubHandle, Message, PeerId, PeerRegistration};
use crate::utils::Clock;
use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use tokio::sync::mpsc;

/// Base timestamp for fixture chains
pub const TEST_EPOCH: i64 = 1_600_000_000;

/// Clock that always reports the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(i64);

impl FixedClock {
    pub fn new(timestamp: i64) -> FixedClock {
        FixedClock(timestamp)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Result<i64> {
        Ok(self.0)
    }
}

/// Valid chain of `len` blocks (genesis included) with payloads `block-{i}`
pub fn build_chain(len: usize) -> Chain {
    build_chain_with(len, "block")
}

/// Valid chain of `len` blocks whose payloads are `{prefix}-{i}`.
/// Different prefixes give chains that diverge right after genesis.
pub fn build_chain_with(len: usize, prefix: &str) -> Chain {
    let mut chain = Chain::new();
    for i in 1..len {
        let clock = FixedClock::new(TEST_EPOCH + i as i64);
        let tip = chain.latest().expect("fixture chain is never empty");
        let block = Block::mint(tip, format!("{prefix}-{i}"), &clock)
            .expect("fixed clock never fails");
        chain = chain.append(block);
    }
    chain
}

/// The hub's side of a fake peer: its registered identity and the
/// receiving end of its mailbox
pub struct TestPeer {
    pub id: PeerId,
    pub addr: SocketAddr,
    pub outbox: mpsc::Receiver<String>,
}

impl TestPeer {
    /// Register a peer at `127.0.0.1:port` whose mailbox holds `capacity`
    pub async fn register(hub: &HubHandle, capacity: usize, port: u16) -> TestPeer {
        let id = PeerId::new();
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let (mailbox, outbox) = mpsc::channel(capacity);
        hub.register(PeerRegistration { id, addr, mailbox })
            .await
            .expect("hub is running");
        TestPeer { id, addr, outbox }
    }
}

/// Decode everything currently waiting in a mailbox
pub fn drain(outbox: &mut mpsc::Receiver<String>) -> Vec<Message> {
    let mut messages = Vec::new();
    while let Ok(payload) = outbox.try_recv() {
        for message in decode_frame(&payload) {
            messages.push(message.expect("hub only sends valid messages"));
        }
    }
    messages
}

/// A transport backed by channels.
///
/// Returns the pump-facing sink and stream, plus the test-facing sender
/// (frames the peer "receives") and receiver (frames the peer "sent").
pub fn memory_transport() -> (
    FrameSink,
    FrameStream,
    UnboundedSender<Result<Frame>>,
    UnboundedReceiver<Frame>,
) {
    let (inbound_tx, inbound_rx) = unbounded::<Result<Frame>>();
    let (outbound_tx, outbound_rx) = unbounded::<Frame>();
    let sink = outbound_tx.sink_map_err(|e| BlockchainError::Network(e.to_string()));
    (Box::pin(sink), inbound_rx.boxed(), inbound_tx, outbound_rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{validate_chain, GENESIS_BLOCK};

    #[test]
    fn test_build_chain_is_valid_and_deterministic() {
        let chain = build_chain(5);
        assert_eq!(chain.len(), 5);
        assert!(validate_chain(chain.blocks()));
        assert_eq!(chain, build_chain(5));
        assert_eq!(chain.blocks()[0], *GENESIS_BLOCK);
    }

    #[test]
    fn test_prefixes_diverge_after_genesis() {
        let a = build_chain_with(3, "a");
        let b = build_chain_with(3, "b");
        assert_eq!(a.blocks()[0], b.blocks()[0]);
        assert_ne!(a.blocks()[1].get_hash(), b.blocks()[1].get_hash());
    }

    #[tokio::test]
    async fn test_memory_transport_carries_frames() {
        let (mut sink, mut stream, inbound, mut outbound) = memory_transport();
        sink.send(Frame::Text("out".to_string())).await.unwrap();
        assert_eq!(outbound.next().await, Some(Frame::Text("out".to_string())));

        inbound.unbounded_send(Ok(Frame::Close)).unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap(), Frame::Close);
    }
}
