use axum::{
    extract::State,
    extract::ws::{WebSocket, WebSocketUpgrade},
    response::IntoResponse,
};

use crate::{app_state::AppState, protocol::WebSocketConnection, service::handle_terminal_connection};

pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

pub async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection = WebSocketConnection::new(socket);
    handle_terminal_connection(connection, state.sessions).await;
}
