/// Terminal connection trait for abstracting the client transport
use std::fmt::Debug;

use thiserror::Error;

/// Connection error type
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Connection already closed
    #[error("Connection closed")]
    ConnectionClosed,

    /// Outbound frame could not be encoded
    #[error("Message serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Connection result type
pub type ConnectionResult<T> = Result<T, ConnectionError>;

/// What a client connection must offer the session layer
#[async_trait::async_trait]
pub trait TerminalConnection: Send + Debug {
    /// Send a text frame
    async fn send_text(&mut self, message: &str) -> ConnectionResult<()>;

    /// Receive the next frame.
    /// Returns None when the connection is closed
    async fn receive(&mut self) -> Option<ConnectionResult<TerminalMessage>>;

    /// Close the connection
    async fn close(&mut self) -> ConnectionResult<()>;

    /// Get the connection ID
    fn id(&self) -> &str;
}

/// Transport-neutral frame
#[derive(Debug, Clone, PartialEq)]
pub enum TerminalMessage {
    Text(String),
    Binary(Vec<u8>),
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    Close,
}
