/// PTY (Pseudo Terminal) allocation for rs_webterm
/// A factory trait opens the pair and spawns the shell; the device, reader
/// and process handles own the resulting descriptors and child.
mod device;
mod portable_pty_impl;
mod process;
mod pty_trait;

// Export all public types and traits
pub use device::{PtyDevice, PtyReader};
pub use portable_pty_impl::PortablePtyFactory;
pub use process::ShellProcess;
pub use pty_trait::*;

use crate::config::TerminalConfig;

/// Shell used when neither the configuration nor `$SHELL` names one.
pub const DEFAULT_SHELL: &str = "/bin/bash";

/// Returns the user's preferred shell, falling back to [`DEFAULT_SHELL`].
pub fn default_shell() -> String {
    std::env::var("SHELL")
        .ok()
        .filter(|shell| !shell.is_empty())
        .unwrap_or_else(|| DEFAULT_SHELL.to_string())
}

impl PtyConfig {
    /// Build the spawn configuration for one session.
    ///
    /// Geometry comes from the request when both dimensions are given,
    /// otherwise from `[terminal]` in the configuration.
    pub fn from_config(config: &TerminalConfig, cols: Option<u16>, rows: Option<u16>) -> Self {
        let (cols, rows) = match (cols, rows) {
            (Some(cols), Some(rows)) => (cols, rows),
            _ => (config.terminal.columns, config.terminal.rows),
        };

        let (command, args) = match config.shell.command.as_deref() {
            Some([command, args @ ..]) => (command.clone(), args.to_vec()),
            _ => (default_shell(), Vec::new()),
        };

        // Inherit the server's directory like a plain fork would
        let cwd = config
            .shell
            .working_directory
            .clone()
            .or_else(|| std::env::current_dir().ok());

        let env = config
            .shell
            .env
            .iter()
            .map(|var| (var.name.clone(), var.value.clone()))
            .collect();

        Self {
            command,
            args,
            cols,
            rows,
            env,
            cwd,
        }
    }
}
