use std::io;

use portable_pty::Child;
use tracing::{debug, warn};

use crate::pty::PtyError;

/// Handle to the shell running on the secondary side of a PTY.
pub struct ShellProcess {
    child: Box<dyn Child + Send + Sync>,
    pid: Option<u32>,
}

impl ShellProcess {
    pub fn new(child: Box<dyn Child + Send + Sync>) -> Self {
        let pid = child.process_id();
        Self { child, pid }
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Non-blocking liveness check. Reaps the child if it has exited.
    pub fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Deliver `signal` to the shell's whole process group.
    pub fn signal_group(&self, signal: libc::c_int) -> Result<(), PtyError> {
        let pid = self
            .pid
            .ok_or_else(|| PtyError::Signal("shell pid unknown".to_string()))?;

        // SAFETY: getpgid/getpgrp only read process table state.
        let pgid = unsafe { libc::getpgid(pid as libc::pid_t) };
        if pgid < 0 {
            return Err(PtyError::Signal(format!(
                "getpgid({}) failed: {}",
                pid,
                io::Error::last_os_error()
            )));
        }
        if pgid == unsafe { libc::getpgrp() } {
            return Err(PtyError::Signal(format!(
                "refusing to signal the server's own process group {}",
                pgid
            )));
        }

        // SAFETY: plain syscall on a pgid we just looked up.
        if unsafe { libc::killpg(pgid, signal) } != 0 {
            return Err(PtyError::Signal(format!(
                "killpg({}, {}) failed: {}",
                pgid,
                signal,
                io::Error::last_os_error()
            )));
        }
        debug!("Delivered signal {} to process group {}", signal, pgid);
        Ok(())
    }

    /// Terminate the shell directly and reap it. Blocks briefly while the
    /// child goes away.
    pub fn terminate(mut self) -> Result<(), PtyError> {
        match self.child.kill() {
            Ok(()) => {
                self.child
                    .wait()
                    .map_err(|e| PtyError::ResourceCleanup(format!("wait failed: {}", e)))?;
                Ok(())
            }
            Err(e) => {
                // Already gone: make sure it does not linger as a zombie
                if let Err(wait_err) = self.child.try_wait() {
                    warn!("Failed to reap shell {:?}: {}", self.pid, wait_err);
                }
                Err(PtyError::ResourceCleanup(format!("kill failed: {}", e)))
            }
        }
    }
}

impl std::fmt::Debug for ShellProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellProcess").field("pid", &self.pid).finish()
    }
}
