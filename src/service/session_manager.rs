/// Session manager: lifecycle, input routing and resizing of terminal sessions
use std::sync::{Arc, Weak};

use tokio::sync::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app_state::{Session, SessionInfo};
use crate::config::TerminalConfig;
use crate::pty::{PtyConfig, PtyError, PtyFactory};
use crate::service::{OutputHub, OutputPump, PumpExit, PumpSettings, SessionError, SessionRegistry};

/// Identifier used when a request does not name a session
pub const DEFAULT_SESSION_ID: &str = "default";

/// Owns every live session.
///
/// Lock discipline: the registry sits behind a single async mutex.
/// `create` and `close` hold it for the whole operation, allocation and
/// teardown included, so two creates for the same identifier are strictly
/// serialized. Input, resize and listing hold it for one lookup plus one
/// device call. Output pumps never take it.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Mutex<SessionRegistry>,
    factory: Arc<dyn PtyFactory>,
    hub: OutputHub,
    config: Arc<TerminalConfig>,
    pump_settings: PumpSettings,
    exit_tx: Option<UnboundedSender<PumpExit>>,
}

impl SessionManager {
    /// Create a manager. With `sessions.reap_exited` set this spawns the
    /// reaper task, so it must run inside a Tokio runtime.
    pub fn new(config: Arc<TerminalConfig>, factory: Arc<dyn PtyFactory>) -> Self {
        let hub = OutputHub::new(config.sessions.output_channel_capacity);
        let pump_settings = PumpSettings::from(&config.sessions);

        let (exit_tx, exit_rx) = if config.sessions.reap_exited {
            let (tx, rx) = mpsc::unbounded_channel();
            (Some(tx), Some(rx))
        } else {
            (None, None)
        };

        let inner = Arc::new(Inner {
            registry: Mutex::new(SessionRegistry::new()),
            factory,
            hub,
            config,
            pump_settings,
            exit_tx,
        });

        if let Some(exit_rx) = exit_rx {
            tokio::spawn(reap_exited_sessions(Arc::downgrade(&inner), exit_rx));
        }

        info!("Session manager ready (PTY backend: {})", inner.factory.name());
        Self { inner }
    }

    /// The hub every output pump publishes to
    pub fn hub(&self) -> &OutputHub {
        &self.inner.hub
    }

    /// Create a session under `id`, first closing any session already there.
    ///
    /// `cols`/`rows` only apply when both are given. On allocation failure the
    /// registry is left as the preceding close left it.
    pub async fn create(
        &self,
        id: &str,
        cols: Option<u16>,
        rows: Option<u16>,
    ) -> Result<String, SessionError> {
        let mut registry = self.inner.registry.lock().await;

        if registry.contains(id) {
            info!("Session {} already exists, closing it before re-creating", id);
            self.inner.close_locked(&mut registry, id).await?;
        }

        let pty_config = PtyConfig::from_config(&self.inner.config, cols, rows);
        let allocation = self.inner.factory.create(&pty_config).await.map_err(|e| {
            error!("Failed to allocate PTY for session {}: {}", id, e);
            SessionError::Allocation(e)
        })?;

        let reader = match allocation.device.try_clone_reader() {
            Ok(reader) => reader,
            Err(e) => {
                error!("Failed to open PTY reader for session {}: {}", id, e);
                let process = allocation.process;
                let mut failures = Vec::new();
                if let Err(cleanup) = process.signal_group(libc::SIGTERM) {
                    failures.push(cleanup);
                }
                match tokio::task::spawn_blocking(move || process.terminate()).await {
                    Ok(Ok(())) => {}
                    Ok(Err(cleanup)) => failures.push(cleanup),
                    Err(join) => failures.push(PtyError::BackgroundTask(join.to_string())),
                }
                allocation.device.release();
                for failure in failures {
                    warn!("Rollback of session {} incomplete: {}", id, failure);
                }
                return Err(SessionError::Allocation(e));
            }
        };

        let instance = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let mut session = Session::new(
            id.to_string(),
            instance,
            pty_config.cols,
            pty_config.rows,
            allocation.device,
            allocation.process,
            cancel.clone(),
        );
        let pid = session.pid();

        let pump = OutputPump::new(
            id.to_string(),
            instance,
            reader,
            self.inner.hub.clone(),
            cancel,
            self.inner.pump_settings,
            self.inner.exit_tx.clone(),
        );
        session.attach_pump(pump.spawn());
        registry.put(id, session);

        info!(
            "Created session {} (pid {:?}, {}x{})",
            id, pid, pty_config.cols, pty_config.rows
        );
        Ok(id.to_string())
    }

    /// Close the session under `id`.
    ///
    /// The identifier is removed even when signalling or terminating the shell
    /// fails; those failures are only logged.
    pub async fn close(&self, id: &str) -> Result<(), SessionError> {
        let mut registry = self.inner.registry.lock().await;
        self.inner.close_locked(&mut registry, id).await
    }

    /// Close every session, returning how many were closed.
    pub async fn close_all(&self) -> usize {
        let mut registry = self.inner.registry.lock().await;
        let ids = registry.ids();
        let mut closed = 0;
        for id in ids {
            if self.inner.close_locked(&mut registry, &id).await.is_ok() {
                closed += 1;
            }
        }
        info!("Closed {} sessions", closed);
        closed
    }

    /// Write `data` to the session's PTY.
    ///
    /// An unknown `id` yields `NotFound` and changes nothing. A failed write is
    /// also reported on the session's own output stream.
    pub async fn send_input(&self, id: &str, data: &[u8]) -> Result<(), SessionError> {
        let mut registry = self.inner.registry.lock().await;
        let session = registry
            .get_mut(id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;

        debug!("Writing {} bytes to session {}", data.len(), id);
        if let Err(e) = session.write_input(data) {
            error!("Failed to write to PTY for session {}: {}", id, e);
            self.inner.hub.publish(id, format!("\r\nError: {}\r\n", e));
            return Err(SessionError::Io(e));
        }
        Ok(())
    }

    /// Apply new window geometry. Returns whether a session was found; resize
    /// failures are logged, not returned.
    pub async fn resize(&self, id: &str, cols: u16, rows: u16) -> bool {
        let mut registry = self.inner.registry.lock().await;
        let Some(session) = registry.get_mut(id) else {
            debug!("Ignoring resize for unknown session {}", id);
            return false;
        };

        match session.resize(cols, rows) {
            Ok(()) => debug!("Resized session {} to {}x{}", id, cols, rows),
            Err(e) => warn!("Failed to resize session {} to {}x{}: {}", id, cols, rows, e),
        }
        true
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.inner.registry.lock().await.contains(id)
    }

    pub async fn session_count(&self) -> usize {
        self.inner.registry.lock().await.len()
    }

    pub async fn pid(&self, id: &str) -> Option<u32> {
        self.inner.registry.lock().await.get(id).and_then(Session::pid)
    }

    /// Whether the shell behind `id` is still running; `None` if unknown.
    pub async fn is_alive(&self, id: &str) -> Option<bool> {
        let mut registry = self.inner.registry.lock().await;
        registry.get_mut(id).map(Session::is_alive)
    }

    pub async fn list(&self) -> Vec<SessionInfo> {
        let registry = self.inner.registry.lock().await;
        let mut sessions: Vec<SessionInfo> = registry.values().map(Session::info).collect();
        sessions.sort_by(|a, b| a.id.cmp(&b.id));
        sessions
    }
}

impl Inner {
    async fn close_locked(&self, registry: &mut SessionRegistry, id: &str) -> Result<(), SessionError> {
        let Some(session) = registry.remove(id) else {
            debug!("Close requested for unknown session {}", id);
            return Err(SessionError::NotFound(id.to_string()));
        };

        info!("Closing session {} (pid {:?})", id, session.pid());
        for failure in session.shutdown().await {
            warn!("Cleanup of session {} incomplete: {}", id, failure);
        }
        Ok(())
    }
}

/// Close sessions whose pump stopped on a device failure, as long as the
/// registered session is still the instance that pump belonged to.
async fn reap_exited_sessions(inner: Weak<Inner>, mut exit_rx: UnboundedReceiver<PumpExit>) {
    while let Some(exit) = exit_rx.recv().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };

        let mut registry = inner.registry.lock().await;
        let current = registry.get(&exit.id).map(|session| session.instance);
        if current == Some(exit.instance) {
            info!("Reaping session {} after its shell exited", exit.id);
            let _ = inner.close_locked(&mut registry, &exit.id).await;
        } else {
            debug!("Ignoring exit of replaced session {}", exit.id);
        }
    }
    debug!("Session reaper stopped");
}
