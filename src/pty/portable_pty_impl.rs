use crate::pty::pty_trait::{Allocation, PtyConfig, PtyError, PtyFactory};
use crate::pty::{PtyDevice, ShellProcess};
use async_trait::async_trait;
use portable_pty::{CommandBuilder, PtyPair, PtySize};
use tokio::task::spawn_blocking;
use tracing::{debug, error, info};

/// Allocates PTYs through the native backend of `portable-pty`.
///
/// The spawned child becomes a session leader with the secondary side as its
/// controlling terminal, so its pid doubles as its process group id.
#[derive(Debug, Default)]
pub struct PortablePtyFactory;

impl PortablePtyFactory {
    fn allocate(config: &PtyConfig) -> Result<Allocation, PtyError> {
        info!(
            "PortablePty: opening {}x{} PTY for command {:?} {:?}",
            config.cols, config.rows, config.command, config.args
        );

        let pty_system = portable_pty::native_pty_system();
        let PtyPair { master, slave } = pty_system
            .openpty(PtySize {
                rows: config.rows,
                cols: config.cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| PtyError::OpenFailed(e.to_string()))?;

        let mut cmd = CommandBuilder::new(&config.command);
        cmd.args(&config.args);
        for (key, value) in &config.env {
            cmd.env(key, value);
        }
        if let Some(cwd) = &config.cwd {
            cmd.cwd(cwd);
        }

        let mut child = slave.spawn_command(cmd).map_err(|e| {
            error!("PortablePty: failed to spawn {:?}: {}", config.command, e);
            PtyError::SpawnFailed(e.to_string())
        })?;
        // The parent must not keep the secondary side open, otherwise reads
        // on the primary never observe the shell going away.
        drop(slave);

        let writer = match master.take_writer() {
            Ok(writer) => writer,
            Err(e) => {
                error!("PortablePty: failed to take writer: {}", e);
                let _ = child.kill();
                let _ = child.wait();
                return Err(PtyError::OpenFailed(e.to_string()));
            }
        };

        let process = ShellProcess::new(child);
        debug!("PortablePty: spawned shell with pid {:?}", process.pid());

        Ok(Allocation {
            device: PtyDevice::new(master, writer),
            process,
        })
    }
}

#[async_trait]
impl PtyFactory for PortablePtyFactory {
    async fn create(&self, config: &PtyConfig) -> Result<Allocation, PtyError> {
        // openpty and fork/exec block; keep them off the async workers
        let config = config.clone();
        match spawn_blocking(move || Self::allocate(&config)).await {
            Ok(result) => result,
            Err(e) => Err(PtyError::BackgroundTask(format!(
                "PTY allocation task failed: {}",
                e
            ))),
        }
    }

    fn name(&self) -> &'static str {
        "portable-pty"
    }
}
