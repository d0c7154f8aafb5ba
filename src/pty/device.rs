use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::{AsRawFd, BorrowedFd};
use std::time::Duration;

use portable_pty::{MasterPty, PtySize};
use tracing::trace;

use crate::pty::PtyError;

/// Primary side of a PTY pair: the write half plus the handle used for
/// window-geometry changes. Dropping it releases the descriptors.
pub struct PtyDevice {
    master: Box<dyn MasterPty + Send>,
    writer: Box<dyn Write + Send>,
}

impl PtyDevice {
    pub fn new(master: Box<dyn MasterPty + Send>, writer: Box<dyn Write + Send>) -> Self {
        Self { master, writer }
    }

    /// Write the whole buffer and flush it through to the shell.
    pub fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.writer.write_all(data)?;
        self.writer.flush()
    }

    pub fn resize(&self, cols: u16, rows: u16) -> Result<(), PtyError> {
        self.master
            .resize(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| PtyError::ResizeFailed(e.to_string()))
    }

    /// Duplicate the primary descriptor into an independently owned reader.
    ///
    /// The duplicate is close-on-exec, so shells spawned later never inherit it.
    pub fn try_clone_reader(&self) -> Result<PtyReader, PtyError> {
        let raw = MasterPty::as_raw_fd(&*self.master).ok_or(PtyError::NotAvailable)?;
        // SAFETY: `raw` belongs to `self.master`, which outlives this call.
        let owned = unsafe { BorrowedFd::borrow_raw(raw) }.try_clone_to_owned()?;
        Ok(PtyReader {
            file: File::from(owned),
        })
    }

    /// Close the writer and the primary descriptor.
    pub fn release(self) {
        drop(self.writer);
        drop(self.master);
    }
}

/// Read side of the primary descriptor, owned by the output pump.
#[derive(Debug)]
pub struct PtyReader {
    file: File,
}

impl PtyReader {
    /// Wait up to `timeout` for the descriptor to become readable.
    ///
    /// Hang-up and error conditions also count as readable so that the
    /// following `read` surfaces them.
    pub fn wait_readable(&self, timeout: Duration) -> io::Result<bool> {
        let mut fds = libc::pollfd {
            fd: self.file.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        let millis = timeout.as_millis().min(libc::c_int::MAX as u128) as libc::c_int;

        // SAFETY: `fds` is a single valid pollfd for the duration of the call.
        let rc = unsafe { libc::poll(&mut fds, 1, millis) };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        trace!("poll returned {} (revents {:#x})", rc, fds.revents);
        Ok(rc > 0 && fds.revents != 0)
    }
}

impl Read for PtyReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}
