//! Alternate move source that asks an external UCI engine (typically
//! Stockfish) for its choice.
//!
//! The process is started lazily on the first request and kept alive between
//! moves. Any failure is logged and reported as "no answer" so the caller can
//! fall back to its own search.

pub mod config;
pub mod error;
pub mod process;
pub mod protocol;

use std::env;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chess_core::{parse_uci_move, Move, MoveBudget, MoveSource, Position};
use tracing::{debug, info, warn};

pub use config::SidecarConfig;
pub use error::{Result, SidecarError};
pub use process::EngineProcess;
pub use protocol::{parse_bestmove, BestMove, MAX_SKILL_LEVEL};

const COMMON_LOCATIONS: &[&str] = &[
    "/usr/games",
    "/usr/local/bin",
    "/opt/homebrew/bin",
    ".",
    "./engines",
];

/// Locate `name` on PATH, then in a few usual install directories.
pub fn find_sidecar_binary(name: &str) -> Option<PathBuf> {
    let on_path = env::var_os("PATH")
        .map(|paths| env::split_paths(&paths).collect::<Vec<_>>())
        .unwrap_or_default();

    on_path
        .into_iter()
        .chain(COMMON_LOCATIONS.iter().map(PathBuf::from))
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

pub struct UciSidecar {
    config: SidecarConfig,
    path: Option<PathBuf>,
    process: Option<EngineProcess>,
}

impl UciSidecar {
    pub fn new(config: SidecarConfig) -> Self {
        let path = config
            .path
            .clone()
            .or_else(|| find_sidecar_binary("stockfish"));
        match &path {
            Some(p) => debug!(path = %p.display(), "sidecar engine binary"),
            None => info!("no sidecar engine binary found"),
        }
        Self {
            config,
            path,
            process: None,
        }
    }

    pub fn config(&self) -> &SidecarConfig {
        &self.config
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_running(&mut self) -> bool {
        self.process.as_mut().is_some_and(EngineProcess::is_alive)
    }

    /// Change the skill level, applying it right away when the process is up.
    pub fn set_strength(&mut self, level: u8) {
        self.config.skill_level = level.min(MAX_SKILL_LEVEL);
        let command = protocol::skill_command(self.config.skill_level);
        if let Some(process) = self.process.as_mut() {
            if let Err(err) = process.send(&command) {
                warn!(%err, "failed to update sidecar skill level");
                self.process = None;
            }
        }
    }

    fn start(&mut self) -> Result<&mut EngineProcess> {
        if !self.is_running() {
            self.process = None;
            let path = self.path.as_deref().ok_or(SidecarError::NotFound)?;
            let mut process = EngineProcess::spawn(path, &self.config.args)?;
            let timeout = self.config.ready_timeout();
            process.send("uci")?;
            process.wait_for("uciok", timeout)?;
            process.send(&protocol::skill_command(self.config.skill_level()))?;
            process.send("ucinewgame")?;
            process.sync_ready(timeout)?;
            info!(path = %path.display(), "sidecar engine started");
            self.process = Some(process);
        }
        self.process.as_mut().ok_or(SidecarError::Exited)
    }

    fn request_deadline(&self, budget: &MoveBudget) -> Duration {
        match budget {
            MoveBudget::MoveTime(time) => *time + self.config.move_timeout_margin(),
            MoveBudget::Depth(_) => self.config.depth_timeout(),
        }
    }

    /// One full request/response exchange.
    pub fn try_request(&mut self, pos: &Position, budget: &MoveBudget) -> Result<Option<Move>> {
        let deadline = self.request_deadline(budget);
        let margin = self.config.move_timeout_margin();
        let process = self.start()?;

        process.send(&protocol::position_command(pos))?;
        process.send(&protocol::go_command(budget))?;

        let reply = match read_bestmove(process, deadline) {
            Err(SidecarError::Timeout(_)) => {
                debug!("sidecar over time, sending stop");
                process.send("stop")?;
                read_bestmove(process, margin)?
            }
            other => other?,
        };

        match reply.mv {
            None => Ok(None),
            Some(text) => parse_uci_move(pos, &text)
                .map(Some)
                .map_err(|err| SidecarError::Malformed(err.to_string())),
        }
    }
}

fn read_bestmove(process: &EngineProcess, timeout: Duration) -> Result<BestMove> {
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(SidecarError::Timeout("bestmove".into()));
        }
        let line = process.recv_line(remaining)?;
        if let Some(best) = parse_bestmove(&line) {
            return Ok(best);
        }
    }
}

impl MoveSource for UciSidecar {
    fn request_move(&mut self, pos: &Position, budget: &MoveBudget) -> Option<Move> {
        match self.try_request(pos, budget) {
            Ok(mv) => mv,
            Err(err) => {
                warn!(%err, "sidecar request failed");
                self.process = None;
                None
            }
        }
    }

    fn new_game(&mut self) {
        let Some(process) = self.process.as_mut() else {
            return;
        };
        let timeout = self.config.ready_timeout();
        let synced = process.is_alive()
            && process
                .send("ucinewgame")
                .and_then(|_| process.sync_ready(timeout))
                .is_ok();
        if !synced {
            debug!("dropping unresponsive sidecar");
            self.process = None;
        }
    }

    fn name(&self) -> &str {
        "uci-sidecar"
    }
}
