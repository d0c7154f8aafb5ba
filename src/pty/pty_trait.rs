use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use super::{PtyDevice, ShellProcess};

// ================ Configuration and errors ================

#[derive(Debug, Clone)]
pub struct PtyConfig {
    pub command: String,
    pub args: Vec<String>,
    pub cols: u16,
    pub rows: u16,
    pub env: Vec<(String, String)>,
    pub cwd: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum PtyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to open PTY: {0}")]
    OpenFailed(String),
    #[error("Process spawn failed: {0}")]
    SpawnFailed(String),
    #[error("PTY not available")]
    NotAvailable,
    #[error("Resize failed: {0}")]
    ResizeFailed(String),
    #[error("Signal delivery failed: {0}")]
    Signal(String),
    #[error("Resource cleanup error: {0}")]
    ResourceCleanup(String),
    #[error("Background task error: {0}")]
    BackgroundTask(String),
}

// ================ Core traits ================

/// The two halves produced by a successful allocation. They are created
/// together and must be torn down together.
pub struct Allocation {
    pub device: PtyDevice,
    pub process: ShellProcess,
}

/// Opens a PTY pair and spawns a shell on its secondary side.
#[async_trait]
pub trait PtyFactory: Send + Sync {
    /// Allocate a new PTY and start the configured shell in it
    async fn create(&self, config: &PtyConfig) -> Result<Allocation, PtyError>;

    /// Factory name
    fn name(&self) -> &'static str;
}
