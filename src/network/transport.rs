//! Websocket frames, independent of which websocket library produced them.
//!
//! Inbound peers arrive through the HTTP server's upgrade, dialed peers
//! through the websocket client. Both are adapted to the same boxed
//! stream/sink pair so one set of pumps serves either.

use crate::error::{BlockchainError, Result};
use axum::extract::ws::Message as ServerMessage;
use futures::stream::BoxStream;
use futures::{future, Sink, SinkExt, Stream, StreamExt};
use std::pin::Pin;
use tokio_tungstenite::tungstenite::Message as ClientMessage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    Close,
}

impl Frame {
    /// Payload size of a data frame; control frames count as zero
    pub fn data_len(&self) -> usize {
        match self {
            Frame::Text(text) => text.len(),
            Frame::Binary(data) => data.len(),
            Frame::Ping(_) | Frame::Pong(_) | Frame::Close => 0,
        }
    }
}

pub type FrameStream = BoxStream<'static, Result<Frame>>;
pub type FrameSink = Pin<Box<dyn Sink<Frame, Error = BlockchainError> + Send>>;

/// Split a websocket into a frame sink and a frame stream.
pub fn into_frames<T, M, E>(socket: T) -> (FrameSink, FrameStream)
where
    T: Stream<Item = std::result::Result<M, E>> + Sink<M, Error = E> + Send + 'static,
    M: From<Frame> + Into<Frame> + Send + 'static,
    E: Send + 'static,
    BlockchainError: From<E>,
{
    let (sink, stream) = socket.split();
    let sink = sink.with(|frame: Frame| future::ready(Ok::<M, BlockchainError>(M::from(frame))));
    let stream = stream.map(|item| item.map(Into::into).map_err(BlockchainError::from));
    (Box::pin(sink), stream.boxed())
}

impl From<ServerMessage> for Frame {
    fn from(message: ServerMessage) -> Frame {
        match message {
            ServerMessage::Text(text) => Frame::Text(text.as_str().to_owned()),
            ServerMessage::Binary(data) => Frame::Binary(data.to_vec()),
            ServerMessage::Ping(data) => Frame::Ping(data.to_vec()),
            ServerMessage::Pong(data) => Frame::Pong(data.to_vec()),
            ServerMessage::Close(_) => Frame::Close,
        }
    }
}

impl From<Frame> for ServerMessage {
    fn from(frame: Frame) -> ServerMessage {
        match frame {
            Frame::Text(text) => ServerMessage::Text(text.into()),
            Frame::Binary(data) => ServerMessage::Binary(data.into()),
            Frame::Ping(data) => ServerMessage::Ping(data.into()),
            Frame::Pong(data) => ServerMessage::Pong(data.into()),
            Frame::Close => ServerMessage::Close(None),
        }
    }
}

impl From<ClientMessage> for Frame {
    fn from(message: ClientMessage) -> Frame {
        match message {
            ClientMessage::Text(text) => Frame::Text(text.as_str().to_owned()),
            ClientMessage::Binary(data) => Frame::Binary(data.to_vec()),
            ClientMessage::Ping(data) => Frame::Ping(data.to_vec()),
            ClientMessage::Pong(data) => Frame::Pong(data.to_vec()),
            ClientMessage::Close(_) => Frame::Close,
            raw @ ClientMessage::Frame(_) => Frame::Binary(raw.into_data().to_vec()),
        }
    }
}

impl From<Frame> for ClientMessage {
    fn from(frame: Frame) -> ClientMessage {
        match frame {
            Frame::Text(text) => ClientMessage::Text(text.into()),
            Frame::Binary(data) => ClientMessage::Binary(data.into()),
            Frame::Ping(data) => ClientMessage::Ping(data.into()),
            Frame::Pong(data) => ClientMessage::Pong(data.into()),
            Frame::Close => ClientMessage::Close(None),
        }
    }
}
