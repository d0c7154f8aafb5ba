/// HTTP, WebSocket and Socket.IO request handlers
pub mod rest;
pub mod socketio;
pub mod websocket;
