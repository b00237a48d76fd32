//! A child engine process driven over its stdin/stdout pipes.

use std::ffi::OsStr;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::error::{Result, SidecarError};

pub const QUIT_TIMEOUT: Duration = Duration::from_millis(300);
const QUIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Owns the child process; output lines arrive through a reader thread.
pub struct EngineProcess {
    child: Child,
    stdin: BufWriter<ChildStdin>,
    rx: Receiver<String>,
}

impl EngineProcess {
    pub fn spawn<S: AsRef<OsStr>>(path: &Path, args: &[S]) -> Result<Self> {
        let mut child = Command::new(path)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| SidecarError::Spawn {
                path: path.to_path_buf(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or(SidecarError::Exited)?;
        let stdout = child.stdout.take().ok_or(SidecarError::Exited)?;

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let reader = BufReader::new(stdout);
            for line in reader.lines().map_while(std::result::Result::ok) {
                if tx.send(line).is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            child,
            stdin: BufWriter::new(stdin),
            rx,
        })
    }

    pub fn send(&mut self, command: &str) -> Result<()> {
        trace!(command, "> sidecar");
        writeln!(self.stdin, "{command}")?;
        self.stdin.flush()?;
        Ok(())
    }

    /// Next output line, waiting at most `timeout`.
    pub fn recv_line(&self, timeout: Duration) -> Result<String> {
        match self.rx.recv_timeout(timeout) {
            Ok(line) => {
                trace!(line = line.as_str(), "< sidecar");
                Ok(line.trim_end().to_string())
            }
            Err(RecvTimeoutError::Timeout) => Err(SidecarError::Timeout("output".into())),
            Err(RecvTimeoutError::Disconnected) => Err(SidecarError::Exited),
        }
    }

    /// Read lines until one equals `expected`.
    pub fn wait_for(&self, expected: &str, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(SidecarError::Timeout(expected.to_string()));
            }
            match self.recv_line(remaining) {
                Ok(line) if line == expected => return Ok(()),
                Ok(_) => {}
                Err(SidecarError::Timeout(_)) => return Err(SidecarError::Timeout(expected.to_string())),
                Err(err) => return Err(err),
            }
        }
    }

    /// `isready` / `readyok` round trip.
    pub fn sync_ready(&mut self, timeout: Duration) -> Result<()> {
        self.send("isready")?;
        self.wait_for("readyok", timeout)
    }

    pub fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }
}

impl Drop for EngineProcess {
    fn drop(&mut self) {
        let _ = self.send("quit");
        let deadline = Instant::now() + QUIT_TIMEOUT;
        while Instant::now() < deadline {
            if let Ok(Some(_)) = self.child.try_wait() {
                return;
            }
            thread::sleep(QUIT_POLL_INTERVAL);
        }
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
