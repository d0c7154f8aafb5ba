//! rs_webterm: drive interactive shell sessions over a WebSocket.
//!
//! Each session owns a pseudo-terminal and the shell attached to it. Clients
//! create, resize and close sessions and write input through JSON events;
//! every session's output is broadcast back to connected clients.

pub mod api;
pub mod app_state;
pub mod config;
pub mod handlers;
pub mod protocol;
pub mod pty;
pub mod server;
pub mod service;
