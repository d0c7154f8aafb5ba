/// Socket.IO surface used by the bundled UI
///
/// Same four events as `/ws`. Create and close answer through the Socket.IO
/// ack callback; output and not-found notices arrive as
/// `terminal_output_<id>` events.
use serde_json::Value;
use socketioxide::SocketIo;
use socketioxide::extract::{AckSender, Data, SocketRef};
use socketioxide::layer::SocketIoLayer;
use tokio::select;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::protocol::events::{CLOSE_TERMINAL, CREATE_TERMINAL, RESIZE_TERMINAL, TERMINAL_INPUT};
use crate::protocol::{AckPayload, ClientEvent, ServerFrame};
use crate::service::{MessageHandler, Reply, SessionManager};

/// Build the tower layer that answers `/socket.io/` requests
pub fn socketio_layer(sessions: SessionManager) -> SocketIoLayer {
    let (layer, io) = SocketIo::new_layer();
    io.ns("/", move |socket: SocketRef| on_connect(socket, sessions.clone()));
    layer
}

fn on_connect(socket: SocketRef, sessions: SessionManager) {
    info!("Socket.IO client connected: {}", socket.id);

    let handler = MessageHandler::new(sessions.clone());
    for event in [CREATE_TERMINAL, TERMINAL_INPUT, RESIZE_TERMINAL, CLOSE_TERMINAL] {
        let handler = handler.clone();
        socket.on(
            event,
            move |socket: SocketRef, Data(data): Data<Value>, ack: AckSender| async move {
                handle_event(&socket, &handler, event, data, ack).await;
            },
        );
    }

    let cancel = CancellationToken::new();
    tokio::spawn(forward_output(socket.clone(), sessions, cancel.clone()));

    socket.on_disconnect(move |socket: SocketRef| {
        cancel.cancel();
        info!("Socket.IO client disconnected: {}", socket.id);
    });
}

async fn handle_event(socket: &SocketRef, handler: &MessageHandler, event: &str, data: Value, ack: AckSender) {
    let decoded = match ClientEvent::decode(event, data) {
        Ok(decoded) => decoded,
        Err(e) => {
            warn!("Ignoring invalid {} payload: {}", event, e);
            if let Err(e) = ack.send(&AckPayload::failed(format!("Invalid request: {}", e))) {
                debug!("Ack for {} not delivered to {}: {}", event, socket.id, e);
            }
            return;
        }
    };

    let Reply { ack: payload, frames } = handler.dispatch(decoded).await;
    for frame in frames {
        emit_frame(socket, frame);
    }
    if let Some(payload) = payload {
        if let Err(e) = ack.send(&payload) {
            debug!("Ack for {} not delivered to {}: {}", event, socket.id, e);
        }
    }
}

/// Forward every session's output to this socket until it disconnects
async fn forward_output(socket: SocketRef, sessions: SessionManager, cancel: CancellationToken) {
    let mut output = sessions.hub().subscribe();
    loop {
        select! {
            _ = cancel.cancelled() => break,
            event = output.recv() => {
                match event {
                    Ok(event) => {
                        if !emit_frame(&socket, ServerFrame::output(&event.id, event.output)) {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Socket.IO client {} fell behind, {} output events dropped", socket.id, skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            },
        }
    }
    debug!("Output forwarding to {} stopped", socket.id);
}

/// Emit an event frame. Returns false once the socket can no longer be written.
fn emit_frame(socket: &SocketRef, frame: ServerFrame) -> bool {
    match frame {
        ServerFrame::Event { event, data } => match socket.emit(event, &data) {
            Ok(()) => true,
            Err(e) => {
                debug!("Emit to {} failed: {}", socket.id, e);
                false
            }
        },
        // Socket.IO acks travel through the ack callback instead
        ServerFrame::Ack { .. } => true,
    }
}
