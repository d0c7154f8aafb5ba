/// Client transport and wire format for rs_webterm
mod connection;
pub mod events;
mod websocket_connection;

pub use connection::{ConnectionError, ConnectionResult, TerminalConnection, TerminalMessage};
pub use events::{AckPayload, ClientEvent, ClientFrame, NOT_FOUND_NOTICE, ServerFrame};
pub use websocket_connection::WebSocketConnection;
