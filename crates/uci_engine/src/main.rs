//! UCI front end: reads protocol commands on stdin, answers on stdout and
//! logs to stderr.

mod config;
mod go;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use chess_core::{move_to_uci, set_position_from_uci, Engine, Position, SearchResult, TimeControl};
use clap::Parser;
use classical_engine::{
    adaptive_depth, ClassicalEngine, MemoryBook, MoveSourceKind, SearchStats, MATE_SCORE,
    MATE_THRESHOLD,
};
use sidecar_engine::UciSidecar;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::go::GoParams;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML file with `[engine]` and `[sidecar]` sections
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the default search depth
    #[arg(short, long)]
    depth: Option<u8>,

    /// External UCI engine to ask first; the search runs only when it fails
    #[arg(long, value_name = "PATH")]
    sidecar: Option<PathBuf>,

    /// Opening book (TOML)
    #[arg(long)]
    book: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log: String,
}

fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}

fn build_engine(app: &AppConfig) -> Result<ClassicalEngine> {
    let mut engine = ClassicalEngine::with_config(app.engine.clone());
    if let Some(path) = &app.book {
        let book = MemoryBook::load(path).with_context(|| format!("loading book {}", path.display()))?;
        info!(positions = book.len(), "opening book loaded");
        engine.set_book(Box::new(book));
    }
    if app.engine.move_source == MoveSourceKind::Sidecar {
        engine.set_alternate_source(Box::new(UciSidecar::new(app.sidecar.clone())));
    }
    Ok(engine)
}

fn send(line: &str) {
    let mut out = io::stdout().lock();
    let _ = writeln!(out, "{line}");
    let _ = out.flush();
}

fn lock(engine: &Mutex<ClassicalEngine>) -> MutexGuard<'_, ClassicalEngine> {
    engine.lock().unwrap_or_else(PoisonError::into_inner)
}

/// `cp <n>` or `mate <moves>` as UCI expects.
fn format_score(score: i32) -> String {
    if score.abs() >= MATE_THRESHOLD {
        let plies = MATE_SCORE - score.abs();
        let moves = (plies + 1) / 2;
        if score > 0 {
            format!("mate {moves}")
        } else {
            format!("mate -{moves}")
        }
    } else {
        format!("cp {score}")
    }
}

fn info_line(pos: &Position, result: &SearchResult, stats: &SearchStats) -> String {
    let ms = stats.elapsed.as_millis().max(1);
    let nps = u128::from(result.nodes) * 1000 / ms;
    let mut line = format!(
        "info depth {} seldepth {} score {} nodes {} time {} nps {}",
        result.depth,
        stats.seldepth,
        format_score(result.score),
        result.nodes,
        stats.elapsed.as_millis(),
        nps,
    );
    if let Some(mv) = result.best_move {
        line.push_str(" pv ");
        line.push_str(&move_to_uci(pos, mv));
    }
    line
}

struct RunningSearch {
    handle: JoinHandle<()>,
    stop: TimeControl,
}

struct Session {
    engine: Arc<Mutex<ClassicalEngine>>,
    pos: Position,
    search: Option<RunningSearch>,
}

impl Session {
    fn new(engine: ClassicalEngine) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            pos: Position::startpos(),
            search: None,
        }
    }

    fn wait_for_search(&mut self) {
        if let Some(search) = self.search.take() {
            if search.handle.join().is_err() {
                warn!("search thread panicked");
            }
        }
    }

    fn stop_search(&mut self) {
        if let Some(search) = &self.search {
            search.stop.stop();
        }
        self.wait_for_search();
    }

    /// Handle one command line; `false` means quit.
    fn handle(&mut self, line: &str) -> bool {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = parts.split_first() else {
            return true;
        };
        match command {
            "uci" => self.identify(),
            "isready" => send("readyok"),
            "setoption" => self.set_option(args),
            "ucinewgame" => {
                self.stop_search();
                lock(&self.engine).new_game();
                self.pos = Position::startpos();
            }
            "position" => {
                self.stop_search();
                if let Err(err) = set_position_from_uci(&mut self.pos, args) {
                    warn!(%err, line, "rejected position command");
                }
            }
            "go" => self.go(args),
            "stop" => self.stop_search(),
            "eval" => {
                let score = lock(&self.engine).get_evaluation(&self.pos);
                send(&format!("info string eval cp {score}"));
            }
            "d" => {
                send(&self.pos.to_string());
                send(&format!("Fen: {}", self.pos.fen()));
            }
            "quit" => {
                self.stop_search();
                return false;
            }
            other => debug!(command = other, "ignoring unknown command"),
        }
        true
    }

    fn identify(&self) {
        let engine = lock(&self.engine);
        let config = engine.config();
        send(&format!("id name chess-lab {}", engine.name()));
        send(&format!("id author {}", engine.author()));
        send(&format!(
            "option name Hash type spin default {} min 1 max 1024",
            config.tt_size_mb
        ));
        send(&format!("option name Depth type spin default {} min 1 max 32", config.depth));
        send(&format!(
            "option name MoveTime type spin default {} min 10 max 600000",
            (config.time_limit_secs * 1000.0) as u64
        ));
        send(&format!(
            "option name QuiescenceDepth type spin default {} min 0 max 16",
            config.quiescence_depth
        ));
        send(&format!("option name OwnBook type check default {}", config.use_book));
        send("uciok");
    }

    fn set_option(&mut self, args: &[&str]) {
        let name_at = args.iter().position(|&a| a == "name");
        let value_at = args.iter().position(|&a| a == "value");
        let Some(name_at) = name_at else {
            warn!(?args, "setoption without a name");
            return;
        };
        let name_end = value_at.filter(|&v| v > name_at).unwrap_or(args.len());
        let name: String = args[name_at + 1..name_end].concat();
        let value = value_at.map(|v| args[v + 1..].join(" ")).unwrap_or_default();

        self.stop_search();
        if !lock(&self.engine).set_option(&name, &value) {
            warn!(name = %name, value = %value, "unsupported or invalid option");
        }
    }

    fn go(&mut self, args: &[&str]) {
        self.wait_for_search();
        let params = GoParams::parse(args);
        let pos = self.pos.clone();

        let limits = {
            let engine = lock(&self.engine);
            let config = engine.config();
            let depth = if config.adaptive_depth {
                adaptive_depth(config.depth.max(1), pos.occupied().len() as usize)
            } else {
                config.depth
            };
            params.limits(pos.side_to_move(), depth, config.move_time())
        };
        debug!(?params, depth = limits.depth, move_time = ?limits.move_time, "go");

        let stop = limits.time_control.clone();
        let engine = Arc::clone(&self.engine);
        let handle = thread::spawn(move || {
            let mut engine = lock(&engine);
            let result = engine.search(&pos, limits);
            if result.depth > 0 {
                send(&info_line(&pos, &result, &engine.last_stats()));
            }
            match result.best_move {
                Some(mv) => send(&format!("bestmove {}", move_to_uci(&pos, mv))),
                None => send("bestmove 0000"),
            }
        });
        self.search = Some(RunningSearch { handle, stop });
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log);

    let mut app = AppConfig::load_or_default(args.config.as_deref())?;
    if let Some(depth) = args.depth {
        app.engine.depth = depth.max(1);
    }
    if let Some(path) = args.sidecar {
        app.engine.move_source = MoveSourceKind::Sidecar;
        app.sidecar.path = Some(path);
    }
    if args.book.is_some() {
        app.book = args.book;
    }

    let engine = build_engine(&app)?;
    info!(config = ?app.engine, "engine ready");

    let mut session = Session::new(engine);
    for line in io::stdin().lock().lines() {
        let line = line.context("reading stdin")?;
        if !session.handle(line.trim()) {
            break;
        }
    }
    session.stop_search();
    Ok(())
}
