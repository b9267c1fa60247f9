//! The hub: single owner of the canonical chain and the peer set.
//!
//! Every mutation of either goes through one event loop, one command at a
//! time. Other tasks hold a [`HubHandle`] and talk to the loop by message.
//! Fan-out never waits on a peer: a mailbox that is full gets its peer
//! evicted instead.

use crate::core::{resolve, Block, Chain, Outcome};
use crate::error::{BlockchainError, Result};
use crate::network::Message;
use crate::utils::Clock;
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Depth of the hub's own command queue
pub const HUB_COMMAND_CAPACITY: usize = 1024;

/// Identity of one connected peer, assigned when the link is set up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerId(Uuid);

impl PeerId {
    pub fn new() -> PeerId {
        PeerId(Uuid::new_v4())
    }
}

impl Default for PeerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.0.simple().to_string();
        write!(f, "{}", &id[..8])
    }
}

/// Everything the hub needs to own a peer. The mailbox sender moves into
/// the hub; dropping it there is what stops the peer's writer.
#[derive(Debug)]
pub struct PeerRegistration {
    pub id: PeerId,
    pub addr: SocketAddr,
    pub mailbox: mpsc::Sender<String>,
}

struct PeerEntry {
    addr: SocketAddr,
    mailbox: mpsc::Sender<String>,
}

enum HubCommand {
    Register(PeerRegistration),
    Unregister(PeerId),
    Broadcast(Message),
    QueryLatest(PeerId),
    QueryAll(PeerId),
    ResolveChain {
        from: PeerId,
        blocks: Vec<Block>,
    },
    Submit {
        data: String,
        reply: oneshot::Sender<Result<Block>>,
    },
    Snapshot {
        reply: oneshot::Sender<Chain>,
    },
    ListPeers {
        reply: oneshot::Sender<Vec<SocketAddr>>,
    },
}

pub struct Hub {
    chain: Chain,
    peers: HashMap<PeerId, PeerEntry>,
    commands: mpsc::Receiver<HubCommand>,
    clock: Arc<dyn Clock>,
}

impl Hub {
    /// Build a hub around `chain` alongside the handle used to reach it.
    pub fn new(chain: Chain, clock: Arc<dyn Clock>) -> (Hub, HubHandle) {
        let (command_tx, command_rx) = mpsc::channel(HUB_COMMAND_CAPACITY);
        let hub = Hub {
            chain,
            peers: HashMap::new(),
            commands: command_rx,
            clock,
        };
        (hub, HubHandle { commands: command_tx })
    }

    /// Build a hub and run it on the current runtime.
    pub fn spawn(chain: Chain, clock: Arc<dyn Clock>) -> (HubHandle, JoinHandle<Result<()>>) {
        let (hub, handle) = Hub::new(chain, clock);
        (handle, tokio::spawn(hub.run()))
    }

    /// Process commands until every handle has been dropped.
    ///
    /// Returns an error only when the canonical chain invariant breaks.
    pub async fn run(mut self) -> Result<()> {
        info!("Hub started with chain of length {}", self.chain.len());
        while let Some(command) = self.commands.recv().await {
            if let Err(e) = self.handle_command(command) {
                error!("Hub stopping on broken invariant: {e}");
                return Err(e);
            }
        }
        info!("Hub stopped, releasing {} peers", self.peers.len());
        Ok(())
    }

    fn handle_command(&mut self, command: HubCommand) -> Result<()> {
        match command {
            HubCommand::Register(registration) => self.register(registration),
            HubCommand::Unregister(id) => self.unregister(id),
            HubCommand::Broadcast(message) => self.broadcast(&message),
            HubCommand::QueryLatest(id) => {
                let tip = self.chain.latest()?.clone();
                self.send_to(id, &Message::blockchain(vec![tip]));
            }
            HubCommand::QueryAll(id) => {
                let blocks = self.chain.blocks().to_vec();
                self.send_to(id, &Message::blockchain(blocks));
            }
            HubCommand::ResolveChain { from, blocks } => self.resolve_chain(from, &blocks)?,
            HubCommand::Submit { data, reply } => {
                let result = self.submit(data)?;
                let _ = reply.send(result);
            }
            HubCommand::Snapshot { reply } => {
                let _ = reply.send(self.chain.clone());
            }
            HubCommand::ListPeers { reply } => {
                let _ = reply.send(self.peers.values().map(|peer| peer.addr).collect());
            }
        }
        Ok(())
    }

    fn register(&mut self, registration: PeerRegistration) {
        let PeerRegistration { id, addr, mailbox } = registration;
        info!("Registered peer {id} at {addr}");
        self.peers.insert(id, PeerEntry { addr, mailbox });
        // a new peer may be ahead of us; ask for its tip right away
        self.send_to(id, &Message::query_latest());
    }

    fn unregister(&mut self, id: PeerId) {
        if let Some(peer) = self.peers.remove(&id) {
            info!("Unregistered peer {id} at {}", peer.addr);
        }
    }

    fn broadcast(&mut self, message: &Message) {
        let payload = match message.encode() {
            Ok(payload) => payload,
            Err(e) => {
                error!("Dropping broadcast: {e}");
                return;
            }
        };
        debug!(
            "Broadcasting {} to {} peers",
            message.message_type,
            self.peers.len()
        );

        let evicted: Vec<PeerId> = self
            .peers
            .iter()
            .filter(|(id, peer)| !Self::deliver(**id, peer, payload.clone()))
            .map(|(id, _)| *id)
            .collect();
        for id in evicted {
            self.evict(id);
        }
    }

    fn send_to(&mut self, id: PeerId, message: &Message) {
        let Some(peer) = self.peers.get(&id) else {
            debug!("Peer {id} is gone, dropping {}", message.message_type);
            return;
        };
        let payload = match message.encode() {
            Ok(payload) => payload,
            Err(e) => {
                error!("Dropping reply to {id}: {e}");
                return;
            }
        };
        if !Self::deliver(id, peer, payload) {
            self.evict(id);
        }
    }

    /// Enqueue without waiting. `false` means the peer must be dropped.
    fn deliver(id: PeerId, peer: &PeerEntry, payload: String) -> bool {
        match peer.mailbox.try_send(payload) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("Mailbox of peer {id} at {} is full", peer.addr);
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Mailbox of peer {id} is closed");
                false
            }
        }
    }

    fn evict(&mut self, id: PeerId) {
        if let Some(peer) = self.peers.remove(&id) {
            warn!("Evicted peer {id} at {}", peer.addr);
        }
    }

    fn resolve_chain(&mut self, from: PeerId, blocks: &[Block]) -> Result<()> {
        debug!("Resolving chain of length {} from peer {from}", blocks.len());
        match resolve(&self.chain, blocks)? {
            Outcome::Keep => {}
            Outcome::Replace(chain) => self.install(chain)?,
            Outcome::RequestFull => self.broadcast(&Message::query_all()),
        }
        Ok(())
    }

    fn submit(&mut self, data: String) -> Result<Result<Block>> {
        let tip = self.chain.latest()?;
        let block = match Block::mint(tip, data, self.clock.as_ref()) {
            Ok(block) => block,
            Err(e) => {
                warn!("Could not mint block: {e}");
                return Ok(Err(e));
            }
        };
        self.install(self.chain.append(block.clone()))?;
        Ok(Ok(block))
    }

    /// Swap in a new canonical chain and announce its tip.
    fn install(&mut self, chain: Chain) -> Result<()> {
        let tip = chain.latest()?.clone();
        info!("Canonical chain is now length {} with tip {tip}", chain.len());
        self.chain = chain;
        self.broadcast(&Message::blockchain(vec![tip]));
        Ok(())
    }
}

/// Clonable handle to a running [`Hub`]
#[derive(Clone)]
pub struct HubHandle {
    commands: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    async fn send(&self, command: HubCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| BlockchainError::HubClosed)
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> HubCommand) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.send(build(tx)).await?;
        rx.await.map_err(|_| BlockchainError::HubClosed)
    }

    pub async fn register(&self, registration: PeerRegistration) -> Result<()> {
        self.send(HubCommand::Register(registration)).await
    }

    pub async fn unregister(&self, id: PeerId) -> Result<()> {
        self.send(HubCommand::Unregister(id)).await
    }

    pub async fn broadcast(&self, message: Message) -> Result<()> {
        self.send(HubCommand::Broadcast(message)).await
    }

    pub async fn query_latest(&self, id: PeerId) -> Result<()> {
        self.send(HubCommand::QueryLatest(id)).await
    }

    pub async fn query_all(&self, id: PeerId) -> Result<()> {
        self.send(HubCommand::QueryAll(id)).await
    }

    /// Hand a received chain to the consensus rule
    pub async fn resolve_chain(&self, from: PeerId, blocks: Vec<Block>) -> Result<()> {
        self.send(HubCommand::ResolveChain { from, blocks }).await
    }

    /// Mint `data` on top of the canonical chain and announce it
    pub async fn submit(&self, data: String) -> Result<Block> {
        self.request(|reply| HubCommand::Submit { data, reply })
            .await?
    }

    pub async fn chain(&self) -> Result<Chain> {
        self.request(|reply| HubCommand::Snapshot { reply }).await
    }

    pub async fn peers(&self) -> Result<Vec<SocketAddr>> {
        self.request(|reply| HubCommand::ListPeers { reply }).await
    }
}
