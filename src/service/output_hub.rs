/// Fan-out of session output to every connected client
use tokio::sync::broadcast;
use tracing::trace;

/// Output produced by one session
#[derive(Debug, Clone, PartialEq)]
pub struct OutputEvent {
    pub id: String,
    pub output: String,
}

/// Broadcast channel shared by all output pumps. Each connection subscribes
/// once and receives every session's output in per-session order.
#[derive(Debug, Clone)]
pub struct OutputHub {
    tx: broadcast::Sender<OutputEvent>,
}

impl OutputHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish output for `id`. Output with no connected receiver is dropped.
    pub fn publish(&self, id: &str, output: impl Into<String>) {
        let event = OutputEvent {
            id: id.to_string(),
            output: output.into(),
        };
        if self.tx.send(event).is_err() {
            trace!("No client subscribed, dropping output for session {}", id);
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OutputEvent> {
        self.tx.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
