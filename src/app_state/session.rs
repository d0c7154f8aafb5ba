/// Terminal session record
use std::time::{Duration, SystemTime};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::pty::{PtyDevice, PtyError, ShellProcess};

/// How long close waits for the output pump before leaving it behind
const PUMP_JOIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Read-only view of a session for listings
#[derive(Debug, Clone, PartialEq)]
pub struct SessionInfo {
    pub id: String,
    pub pid: Option<u32>,
    pub columns: u16,
    pub rows: u16,
    pub created_at: u64,
}

/// A live terminal session: one PTY device, one shell, one output pump.
pub struct Session {
    /// Client-supplied identifier
    pub id: String,

    /// Distinguishes this allocation from earlier ones under the same id
    pub instance: Uuid,

    /// Current terminal columns
    pub columns: u16,

    /// Current terminal rows
    pub rows: u16,

    /// Session creation timestamp (UNIX epoch in seconds)
    pub created_at: u64,

    device: PtyDevice,
    process: ShellProcess,
    cancel: CancellationToken,
    pump: Option<JoinHandle<()>>,
}

impl Session {
    pub fn new(
        id: String,
        instance: Uuid,
        columns: u16,
        rows: u16,
        device: PtyDevice,
        process: ShellProcess,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id,
            instance,
            columns,
            rows,
            created_at: unix_now(),
            device,
            process,
            cancel,
            pump: None,
        }
    }

    pub fn attach_pump(&mut self, pump: JoinHandle<()>) {
        self.pump = Some(pump);
    }

    pub fn pid(&self) -> Option<u32> {
        self.process.pid()
    }

    pub fn is_alive(&mut self) -> bool {
        self.process.is_alive()
    }

    pub fn write_input(&mut self, data: &[u8]) -> std::io::Result<()> {
        self.device.write_all(data)
    }

    pub fn resize(&mut self, columns: u16, rows: u16) -> Result<(), PtyError> {
        self.device.resize(columns, rows)?;
        self.columns = columns;
        self.rows = rows;
        Ok(())
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id.clone(),
            pid: self.pid(),
            columns: self.columns,
            rows: self.rows,
            created_at: self.created_at,
        }
    }

    /// Tear the session down, best effort.
    ///
    /// Stops the pump, signals the process group, terminates the shell and
    /// releases the device. Every step runs even if an earlier one failed;
    /// the failures are returned for logging.
    pub async fn shutdown(self) -> Vec<PtyError> {
        let Session {
            id,
            device,
            process,
            cancel,
            pump,
            ..
        } = self;
        let mut failures = Vec::new();

        cancel.cancel();
        if let Some(pump) = pump {
            match tokio::time::timeout(PUMP_JOIN_TIMEOUT, pump).await {
                Ok(Ok(())) => debug!("Output pump for session {} joined", id),
                Ok(Err(e)) => failures.push(PtyError::BackgroundTask(e.to_string())),
                Err(_) => warn!("Output pump for session {} did not stop in time", id),
            }
        }

        if let Err(e) = process.signal_group(libc::SIGTERM) {
            failures.push(e);
        }

        match tokio::task::spawn_blocking(move || process.terminate()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => failures.push(e),
            Err(e) => failures.push(PtyError::BackgroundTask(e.to_string())),
        }

        device.release();
        info!("Session {} torn down ({} cleanup failures)", id, failures.len());
        failures
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("instance", &self.instance)
            .field("pid", &self.pid())
            .field("columns", &self.columns)
            .field("rows", &self.rows)
            .finish()
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}
