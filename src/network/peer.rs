//! One connected peer: an inbound pump and an outbound pump.
//!
//! The inbound pump is the only reader of the transport and the outbound
//! pump the only writer. They share no state; the inbound side talks to the
//! hub, the hub fills the peer's mailbox, and the outbound side drains it.

use crate::config::NodeConfig;
use crate::error::{BlockchainError, Result};
use crate::network::transport::{into_frames, Frame, FrameSink, FrameStream};
use crate::network::{decode_frame, HubHandle, Message, MessageType, PeerId, PeerRegistration};
use futures::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval_at, timeout, Instant};
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::{connect_async_with_config, MaybeTlsStream};

/// Limits and timers for a single peer link
#[derive(Debug, Clone)]
pub struct PeerSettings {
    /// Outbound messages that may wait before the peer counts as slow
    pub mailbox_capacity: usize,
    /// Largest inbound frame accepted, in bytes
    pub max_message_size: usize,
    /// Longest silence tolerated from the peer
    pub pong_wait: Duration,
    /// Interval between liveness probes; shorter than `pong_wait`
    pub ping_period: Duration,
    /// Longest a single write may take
    pub write_wait: Duration,
}

impl From<&NodeConfig> for PeerSettings {
    fn from(config: &NodeConfig) -> Self {
        PeerSettings {
            mailbox_capacity: config.mailbox_capacity,
            max_message_size: config.max_message_size,
            pong_wait: config.pong_wait(),
            ping_period: config.ping_period(),
            write_wait: config.write_wait(),
        }
    }
}

impl PeerSettings {
    /// Client transport limits matching what the server side enforces
    pub fn client_config(&self) -> WebSocketConfig {
        WebSocketConfig::default()
            .max_message_size(Some(self.max_message_size))
            .max_frame_size(Some(self.max_message_size))
    }
}

impl Default for PeerSettings {
    fn default() -> Self {
        PeerSettings::from(&NodeConfig::default())
    }
}

/// Register a peer with the hub and pump its link until it ends.
///
/// Runs the inbound pump on the calling task and the outbound pump on a
/// spawned one. Returns once both have stopped and the peer is gone from
/// the hub.
pub async fn serve_peer(
    sink: FrameSink,
    mut stream: FrameStream,
    addr: SocketAddr,
    hub: HubHandle,
    settings: PeerSettings,
) -> Result<()> {
    let id = PeerId::new();
    let (mailbox, outbox) = mpsc::channel(settings.mailbox_capacity);
    hub.register(PeerRegistration { id, addr, mailbox }).await?;

    let (writer_done_tx, mut writer_done) = oneshot::channel::<()>();
    let writer_settings = settings.clone();
    let writer = tokio::spawn(async move {
        write_pump(id, sink, outbox, &writer_settings).await;
        drop(writer_done_tx);
    });

    read_pump(id, &mut stream, &hub, &settings, &mut writer_done).await;
    drop(stream);

    match hub.unregister(id).await {
        Ok(()) | Err(BlockchainError::HubClosed) => {}
        Err(e) => warn!("Failed to unregister peer {id}: {e}"),
    }
    if let Err(e) = writer.await {
        error!("Writer for peer {id} panicked: {e}");
    }
    info!("Peer {id} at {addr} disconnected");
    Ok(())
}

/// Open an outbound link to another node's peer endpoint and serve it in
/// the background. Returns the remote address once connected.
pub async fn connect_peer(url: &str, hub: HubHandle, settings: PeerSettings) -> Result<SocketAddr> {
    let config = settings.client_config();
    let (socket, _response) = connect_async_with_config(url, Some(config), false)
        .await
        .map_err(|e| BlockchainError::Network(format!("Failed to connect to {url}: {e}")))?;

    let addr = match socket.get_ref() {
        MaybeTlsStream::Plain(tcp) => tcp.peer_addr()?,
        _ => {
            return Err(BlockchainError::Network(format!(
                "Unsupported transport for {url}"
            )))
        }
    };
    info!("Connected to peer {url} at {addr}");

    let (sink, stream) = into_frames(socket);
    tokio::spawn(async move {
        if let Err(e) = serve_peer(sink, stream, addr, hub, settings).await {
            warn!("Peer link to {addr} ended with error: {e}");
        }
    });
    Ok(addr)
}

async fn read_pump(
    id: PeerId,
    stream: &mut FrameStream,
    hub: &HubHandle,
    settings: &PeerSettings,
    writer_done: &mut oneshot::Receiver<()>,
) {
    loop {
        let next = tokio::select! {
            _ = &mut *writer_done => {
                debug!("Writer for peer {id} stopped, closing reader");
                return;
            }
            next = timeout(settings.pong_wait, stream.next()) => next,
        };

        let frame = match next {
            Err(_) => {
                warn!("Peer {id} silent for {:?}, dropping", settings.pong_wait);
                return;
            }
            Ok(None) => {
                debug!("Peer {id} closed the stream");
                return;
            }
            Ok(Some(Err(e))) => {
                error!("Read from peer {id} failed: {e}");
                return;
            }
            Ok(Some(Ok(frame))) => frame,
        };

        if frame.data_len() > settings.max_message_size {
            warn!(
                "Peer {id} sent {} bytes, limit is {}",
                frame.data_len(),
                settings.max_message_size
            );
            return;
        }

        let text = match frame {
            Frame::Text(text) => text,
            Frame::Binary(data) => match String::from_utf8(data) {
                Ok(text) => text,
                Err(_) => {
                    warn!("Discarding non UTF-8 frame from peer {id}");
                    continue;
                }
            },
            Frame::Ping(_) | Frame::Pong(_) => continue,
            Frame::Close => {
                debug!("Peer {id} sent close");
                return;
            }
        };

        for decoded in decode_frame(&text) {
            let message = match decoded {
                Ok(message) => message,
                Err(e) => {
                    warn!("Discarding message from peer {id}: {e}");
                    continue;
                }
            };
            if dispatch(id, message, hub).await.is_err() {
                debug!("Hub closed, stopping reader for peer {id}");
                return;
            }
        }
    }
}

async fn dispatch(id: PeerId, message: Message, hub: &HubHandle) -> Result<()> {
    debug!("Peer {id} sent {}", message.message_type);
    match message.message_type {
        MessageType::QueryLatest => hub.query_latest(id).await,
        MessageType::QueryAll => hub.query_all(id).await,
        MessageType::Blockchain => hub.resolve_chain(id, message.into_blocks()).await,
    }
}

async fn write_pump(
    id: PeerId,
    mut sink: FrameSink,
    mut outbox: mpsc::Receiver<String>,
    settings: &PeerSettings,
) {
    let mut ticker = interval_at(Instant::now() + settings.ping_period, settings.ping_period);
    let mut carried: Option<String> = None;

    loop {
        let first = match carried.take() {
            Some(message) => Some(message),
            None => tokio::select! {
                message = outbox.recv() => message,
                _ = ticker.tick() => {
                    if let Err(e) = write_frame(&mut sink, Frame::Ping(Vec::new()), settings).await {
                        warn!("Ping to peer {id} failed: {e}");
                        break;
                    }
                    continue;
                }
            },
        };

        let Some(mut payload) = first else {
            debug!("Mailbox of peer {id} closed");
            let _ = write_frame(&mut sink, Frame::Close, settings).await;
            break;
        };

        // fold whatever is already queued into the same frame
        while let Ok(next) = outbox.try_recv() {
            if payload.len() + 1 + next.len() > settings.max_message_size {
                carried = Some(next);
                break;
            }
            payload.push('\n');
            payload.push_str(&next);
        }

        if let Err(e) = write_frame(&mut sink, Frame::Text(payload), settings).await {
            warn!("Write to peer {id} failed: {e}");
            break;
        }
    }

    let _ = timeout(settings.write_wait, sink.close()).await;
}

async fn write_frame(sink: &mut FrameSink, frame: Frame, settings: &PeerSettings) -> Result<()> {
    match timeout(settings.write_wait, sink.send(frame)).await {
        Ok(result) => result,
        Err(_) => Err(BlockchainError::Network(format!(
            "Write timed out after {:?}",
            settings.write_wait
        ))),
    }
}
