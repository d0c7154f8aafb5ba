/// Per-connection loop bridging a client to the session manager
use tokio::select;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

use crate::protocol::{ConnectionResult, ServerFrame, TerminalConnection, TerminalMessage};
use crate::service::{MessageHandler, SessionManager};

/// Serve one client connection until it closes.
///
/// Requests are handled in arrival order; every session's output is
/// forwarded as it is published. Sessions outlive the connection.
pub async fn handle_terminal_connection(mut connection: impl TerminalConnection, sessions: SessionManager) {
    let conn_id = connection.id().to_string();
    info!("Client connected: {}", conn_id);

    let mut output = sessions.hub().subscribe();
    let handler = MessageHandler::new(sessions);

    'connection: loop {
        select! {
            msg_result = connection.receive() => {
                match msg_result {
                    Some(Ok(TerminalMessage::Text(text))) => {
                        debug!("Received frame from {}: {}", conn_id, text);
                        for frame in handler.handle_text(&text).await {
                            if let Err(e) = send_frame(&mut connection, &frame).await {
                                error!("Failed to reply to {}: {}", conn_id, e);
                                break 'connection;
                            }
                        }
                    }
                    Some(Ok(TerminalMessage::Binary(bin))) => {
                        debug!("Ignoring binary frame of length {} from {}", bin.len(), conn_id);
                    }
                    Some(Ok(TerminalMessage::Ping(_))) | Some(Ok(TerminalMessage::Pong(_))) => {}
                    Some(Ok(TerminalMessage::Close)) => {
                        debug!("Received close frame from {}", conn_id);
                        break;
                    }
                    Some(Err(e)) => {
                        error!("Connection error for {}: {}", conn_id, e);
                        break;
                    }
                    None => break,
                }
            },
            event = output.recv() => {
                match event {
                    Ok(event) => {
                        let frame = ServerFrame::output(&event.id, event.output);
                        if let Err(e) = send_frame(&mut connection, &frame).await {
                            error!("Failed to forward output to {}: {}", conn_id, e);
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Client {} fell behind, {} output events dropped", conn_id, skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            },
        }
    }

    if let Err(e) = connection.close().await {
        debug!("Connection {} already closed: {}", conn_id, e);
    }
    info!("Client disconnected: {}", conn_id);
}

async fn send_frame(connection: &mut impl TerminalConnection, frame: &ServerFrame) -> ConnectionResult<()> {
    let text = frame.to_json()?;
    connection.send_text(&text).await
}
