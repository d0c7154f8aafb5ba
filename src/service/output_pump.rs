/// Per-session task moving bytes from the PTY to the output hub
use std::io::{self, ErrorKind, Read};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::pty::PtyReader;
use crate::service::OutputHub;

/// Pump timing and sizing
#[derive(Debug, Clone, Copy)]
pub struct PumpSettings {
    pub poll_interval: Duration,
    pub chunk_size: usize,
}

impl From<&SessionConfig> for PumpSettings {
    fn from(config: &SessionConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            chunk_size: config.read_chunk_size,
        }
    }
}

/// Sent when a pump stops because its device failed, not because it was
/// cancelled.
#[derive(Debug, Clone, PartialEq)]
pub struct PumpExit {
    pub id: String,
    pub instance: Uuid,
}

/// Reads one session's PTY and publishes what it reads.
///
/// The pump owns its reader and identifier outright and never consults the
/// registry. It stops when `cancel` fires or the device read fails.
pub struct OutputPump {
    id: String,
    instance: Uuid,
    reader: PtyReader,
    hub: OutputHub,
    cancel: CancellationToken,
    settings: PumpSettings,
    exit_tx: Option<UnboundedSender<PumpExit>>,
}

impl OutputPump {
    pub fn new(
        id: String,
        instance: Uuid,
        reader: PtyReader,
        hub: OutputHub,
        cancel: CancellationToken,
        settings: PumpSettings,
        exit_tx: Option<UnboundedSender<PumpExit>>,
    ) -> Self {
        Self {
            id,
            instance,
            reader,
            hub,
            cancel,
            settings,
            exit_tx,
        }
    }

    /// Run the pump on the blocking pool.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::task::spawn_blocking(move || self.run())
    }

    fn run(mut self) {
        debug!("Output pump started for session {}", self.id);
        let mut buffer = vec![0u8; self.settings.chunk_size];
        let mut decoder = Utf8Decoder::default();

        loop {
            if self.cancel.is_cancelled() {
                debug!("Output pump for session {} cancelled", self.id);
                return;
            }

            match self.reader.wait_readable(self.settings.poll_interval) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return self.finish(&mut decoder, e),
            }

            match self.reader.read(&mut buffer) {
                Ok(0) => {
                    let eof = io::Error::new(ErrorKind::UnexpectedEof, "end of stream");
                    return self.finish(&mut decoder, eof);
                }
                Ok(n) => {
                    trace!("Output pump read {} bytes for session {}", n, self.id);
                    let text = decoder.decode(&buffer[..n]);
                    if !text.is_empty() {
                        self.hub.publish(&self.id, text);
                    }
                }
                Err(e) if matches!(e.kind(), ErrorKind::Interrupted | ErrorKind::WouldBlock) => {
                    continue;
                }
                Err(e) => return self.finish(&mut decoder, e),
            }
        }
    }

    /// Emit the final diagnostic after a device failure and report the exit.
    fn finish(&mut self, decoder: &mut Utf8Decoder, error: io::Error) {
        if self.cancel.is_cancelled() {
            // Closed on purpose; the failure is the teardown itself
            return;
        }

        let rest = decoder.flush();
        if !rest.is_empty() {
            self.hub.publish(&self.id, rest);
        }

        info!("Output pump for session {} stopped: {}", self.id, error);
        self.hub
            .publish(&self.id, format!("\r\nConnection closed: {}\r\n", error));

        if let Some(exit_tx) = &self.exit_tx {
            let exit = PumpExit {
                id: self.id.clone(),
                instance: self.instance,
            };
            if exit_tx.send(exit).is_err() {
                warn!("Session reaper is gone; session {} stays registered", self.id);
            }
        }
    }
}

/// Lossy UTF-8 decoding that carries an incomplete trailing sequence over to
/// the next chunk instead of replacing it.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let complete = complete_prefix_len(&self.pending);
        let tail = self.pending.split_off(complete);
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending = tail;
        text
    }

    /// Decode whatever is still held back.
    pub fn flush(&mut self) -> String {
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        text
    }
}

/// Length of the longest prefix that does not end inside a multi-byte
/// sequence. Invalid bytes before that point stay in the prefix and are
/// replaced by the lossy decode.
fn complete_prefix_len(bytes: &[u8]) -> usize {
    let mut start = 0;
    loop {
        match std::str::from_utf8(&bytes[start..]) {
            Ok(_) => return bytes.len(),
            Err(e) => match e.error_len() {
                Some(invalid) => start += e.valid_up_to() + invalid,
                None => return start + e.valid_up_to(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passes_through() {
        let mut decoder = Utf8Decoder::default();
        assert_eq!(decoder.decode(b"echo hi\r\n"), "echo hi\r\n");
        assert_eq!(decoder.flush(), "");
    }

    #[test]
    fn test_split_multibyte_is_reassembled() {
        let bytes = "héllo".as_bytes();
        let mut decoder = Utf8Decoder::default();
        // 'é' is two bytes; cut between them
        assert_eq!(decoder.decode(&bytes[..2]), "h");
        assert_eq!(decoder.decode(&bytes[2..]), "éllo");
    }

    #[test]
    fn test_invalid_bytes_are_replaced() {
        let mut decoder = Utf8Decoder::default();
        assert_eq!(decoder.decode(b"a\xffb"), "a\u{FFFD}b");
    }

    #[test]
    fn test_invalid_then_incomplete_tail() {
        let mut decoder = Utf8Decoder::default();
        // invalid byte, then the first two bytes of a three-byte '€'
        assert_eq!(decoder.decode(b"x\xff\xe2\x82"), "x\u{FFFD}");
        assert_eq!(decoder.decode(b"\xac!"), "€!");
    }

    #[test]
    fn test_flush_replaces_dangling_sequence() {
        let mut decoder = Utf8Decoder::default();
        assert_eq!(decoder.decode(b"ok\xe2\x82"), "ok");
        assert_eq!(decoder.flush(), "\u{FFFD}");
    }

    #[test]
    fn test_pump_settings_from_config() {
        let settings = PumpSettings::from(&SessionConfig::default());
        assert_eq!(settings.poll_interval, Duration::from_millis(100));
        assert_eq!(settings.chunk_size, 20 * 1024);
    }
}
