/// Message handler for decoded client events
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::protocol::events::{CloseTerminal, CreateTerminal, ResizeTerminal, TerminalInput};
use crate::protocol::{AckPayload, ClientEvent, ClientFrame, NOT_FOUND_NOTICE, ServerFrame};
use crate::service::{SessionError, SessionManager};

/// Turns client frames into session operations.
///
/// Returns the frames owed to the requesting client only: acknowledgements
/// and not-found notices. Session output reaches clients through the hub.
#[derive(Clone)]
pub struct MessageHandler {
    sessions: SessionManager,
}

impl MessageHandler {
    pub fn new(sessions: SessionManager) -> Self {
        Self { sessions }
    }

    /// Handle one text frame
    pub async fn handle_text(&self, text: &str) -> Vec<ServerFrame> {
        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => {
                warn!("Ignoring malformed frame: {}", e);
                return Vec::new();
            }
        };
        let ack = value.get("ack").and_then(Value::as_u64);

        let event = match ClientFrame::from_value(value).and_then(ClientFrame::into_event) {
            Ok(event) => event,
            Err(e) => {
                warn!("Ignoring invalid frame: {}", e);
                return ack
                    .map(|ack| ServerFrame::ack(ack, AckPayload::failed(format!("Invalid request: {}", e))))
                    .into_iter()
                    .collect();
            }
        };

        self.handle_event(event, ack).await
    }

    /// Handle one decoded event, acknowledging it under `ack` when given
    pub async fn handle_event(&self, event: ClientEvent, ack: Option<u64>) -> Vec<ServerFrame> {
        let Reply { ack: payload, mut frames } = self.dispatch(event).await;
        if let (Some(ack), Some(payload)) = (ack, payload) {
            frames.push(ServerFrame::ack(ack, payload));
        }
        frames
    }

    /// Run one request against the session manager.
    ///
    /// Transport neutral: callers decide how the acknowledgement and the
    /// requester-only frames travel back.
    pub async fn dispatch(&self, event: ClientEvent) -> Reply {
        match event {
            ClientEvent::CreateTerminal(request) => Reply::ack(self.create_terminal(request).await),
            ClientEvent::TerminalInput(request) => Reply {
                ack: None,
                frames: self.terminal_input(request).await,
            },
            ClientEvent::ResizeTerminal(request) => {
                self.resize_terminal(request).await;
                Reply::default()
            }
            ClientEvent::CloseTerminal(request) => Reply::ack(self.close_terminal(request).await),
            ClientEvent::Unknown(name) => {
                debug!("Ignoring unknown event: {}", name);
                Reply::default()
            }
        }
    }

    async fn create_terminal(&self, request: CreateTerminal) -> AckPayload {
        info!("Create terminal requested: {}", request.terminal_id);
        match self
            .sessions
            .create(&request.terminal_id, request.cols, request.rows)
            .await
        {
            Ok(id) => AckPayload::created(id),
            Err(e) => {
                error!("Failed to create terminal {}: {}", request.terminal_id, e);
                AckPayload::failed(e.to_string())
            }
        }
    }

    async fn terminal_input(&self, request: TerminalInput) -> Vec<ServerFrame> {
        match self
            .sessions
            .send_input(&request.terminal_id, request.input.as_bytes())
            .await
        {
            Ok(()) => Vec::new(),
            Err(SessionError::NotFound(id)) => {
                debug!("Input for unknown terminal {}", id);
                vec![ServerFrame::output(&id, NOT_FOUND_NOTICE)]
            }
            // Already reported on the session's output stream
            Err(_) => Vec::new(),
        }
    }

    async fn resize_terminal(&self, request: ResizeTerminal) {
        self.sessions
            .resize(&request.terminal_id, request.cols, request.rows)
            .await;
    }

    async fn close_terminal(&self, request: CloseTerminal) -> AckPayload {
        info!("Close terminal requested: {}", request.terminal_id);
        match self.sessions.close(&request.terminal_id).await {
            Ok(()) => AckPayload::ok(),
            Err(e) => AckPayload::failed(e.to_string()),
        }
    }
}

/// What a request owes its sender
#[derive(Debug, Default, PartialEq)]
pub struct Reply {
    /// Set for create and close
    pub ack: Option<AckPayload>,
    /// Frames for the requesting client only
    pub frames: Vec<ServerFrame>,
}

impl Reply {
    fn ack(payload: AckPayload) -> Self {
        Self {
            ack: Some(payload),
            frames: Vec::new(),
        }
    }
}
