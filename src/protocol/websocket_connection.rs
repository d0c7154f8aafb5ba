/// WebSocket implementation of TerminalConnection
use std::fmt::Debug;

use axum::extract::ws::Message::{Binary, Close, Ping, Pong, Text};
use axum::extract::ws::WebSocket;
use futures_util::StreamExt;
use tracing::{debug, error};
use uuid::Uuid;

use crate::protocol::{ConnectionError, ConnectionResult, TerminalConnection, TerminalMessage};

pub struct WebSocketConnection {
    socket: WebSocket,
    id: String,
}

impl WebSocketConnection {
    /// Wrap an upgraded socket, giving it a fresh connection id
    pub fn new(socket: WebSocket) -> Self {
        Self {
            socket,
            id: Uuid::new_v4().to_string(),
        }
    }
}

impl Debug for WebSocketConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketConnection")
            .field("id", &self.id)
            .finish()
    }
}

#[async_trait::async_trait]
impl TerminalConnection for WebSocketConnection {
    async fn send_text(&mut self, message: &str) -> ConnectionResult<()> {
        self.socket
            .send(Text(message.to_string()))
            .await
            .map_err(|e| ConnectionError::WebSocket(e.to_string()))
    }

    async fn receive(&mut self) -> Option<ConnectionResult<TerminalMessage>> {
        match self.socket.next().await {
            Some(Ok(Text(text))) => Some(Ok(TerminalMessage::Text(text))),
            Some(Ok(Binary(bin))) => {
                debug!("WebSocket {} received binary frame, length: {}", self.id, bin.len());
                Some(Ok(TerminalMessage::Binary(bin)))
            }
            Some(Ok(Ping(ping))) => Some(Ok(TerminalMessage::Ping(ping))),
            Some(Ok(Pong(pong))) => Some(Ok(TerminalMessage::Pong(pong))),
            Some(Ok(Close(_))) => Some(Ok(TerminalMessage::Close)),
            Some(Err(e)) => {
                error!("WebSocket {} receive error: {}", self.id, e);
                Some(Err(ConnectionError::WebSocket(e.to_string())))
            }
            None => None,
        }
    }

    async fn close(&mut self) -> ConnectionResult<()> {
        self.socket
            .send(Close(None))
            .await
            .map_err(|_| ConnectionError::ConnectionClosed)
    }

    fn id(&self) -> &str {
        &self.id
    }
}
