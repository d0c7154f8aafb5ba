/// Configuration data structures for rs_webterm
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct TerminalConfig {
    /// Listener and static asset settings
    pub server: ServerConfig,

    /// Shell spawned for every session
    pub shell: ShellConfig,

    /// Geometry used when a create request does not carry one
    pub terminal: TerminalSize,

    /// Output pump and registry behaviour
    pub sessions: SessionConfig,

    /// Log output
    pub logging: LoggingConfig,
}

/// HTTP/WebSocket listener configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding the prebuilt UI bundle
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            static_dir: PathBuf::from("dist"),
        }
    }
}

/// Shell configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct ShellConfig {
    /// Command to execute; `$SHELL` (then `/bin/bash`) when unset
    pub command: Option<Vec<String>>,

    /// Working directory; the server's own when unset
    pub working_directory: Option<PathBuf>,

    /// Extra environment on top of the inherited one
    pub env: Vec<EnvVar>,
}

/// One environment variable. Kept as a name/value pair because config keys
/// are case-folded while values are not.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

/// Terminal size configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct TerminalSize {
    /// Number of columns
    pub columns: u16,

    /// Number of rows
    pub rows: u16,
}

impl Default for TerminalSize {
    fn default() -> Self {
        Self {
            columns: 80,
            rows: 24,
        }
    }
}

/// Session runtime configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SessionConfig {
    /// Upper bound on how long the output pump waits for data per iteration
    pub poll_interval_ms: u64,

    /// Maximum bytes forwarded per output event
    pub read_chunk_size: usize,

    /// Close sessions whose shell exited on its own
    pub reap_exited: bool,

    /// Buffered output events per connected client before it starts lagging
    pub output_channel_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            read_chunk_size: 20 * 1024,
            reap_exited: false,
            output_channel_capacity: 1024,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set
    pub level: String,
    pub format: LogFormat,
    /// Also write daily-rotated log files here
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            directory: None,
        }
    }
}
