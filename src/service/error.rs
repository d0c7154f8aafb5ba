/// Error types for the service layer
use thiserror::Error;

use crate::pty::PtyError;

/// Session lifecycle error type
#[derive(Error, Debug)]
pub enum SessionError {
    /// PTY allocation or shell spawn failed; nothing was registered
    #[error("Failed to create terminal: {0}")]
    Allocation(#[source] PtyError),

    /// No session is registered under the identifier
    #[error("Terminal not found")]
    NotFound(String),

    /// Device read/write failed during normal operation
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SessionError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SessionError::NotFound(_))
    }
}
