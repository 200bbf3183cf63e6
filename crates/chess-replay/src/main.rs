//! Chess Replay - applies moves to a stored game.
//!
//! Reads a stored game record (or starts a new game), submits each move
//! given on the command line, and writes the resulting record as JSON.

mod config;

use anyhow::Context;
use chess_core::MoveRequest;
use chess_engine::{decode_game, Game, StoredGame};
use clap::Parser;
use config::ReplayConfig;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Chess Replay - applies moves to a stored game.
#[derive(Parser)]
#[command(name = "chess-replay")]
#[command(about = "Applies moves to a stored chess game")]
struct Args {
    /// Stored game JSON to start from (default: a new game)
    #[arg(long)]
    record: Option<PathBuf>,

    /// Where to write the resulting record (default: stdout)
    #[arg(long)]
    out: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Moves as square pairs, e.g. e2e4 or e7e8q
    moves: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = ReplayConfig::load(args.config.as_deref())?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut game = match &args.record {
        Some(path) => load_game(path)?,
        None => Game::new(),
    };
    tracing::info!("Starting from: {}", game.status_line());

    for (index, text) in args.moves.iter().enumerate() {
        let request = MoveRequest::parse(text)
            .with_context(|| format!("move {}: cannot parse {:?}", index + 1, text))?;
        game = game
            .submit_request(request)
            .with_context(|| format!("move {} ({})", index + 1, text))?;
    }

    eprintln!("{}", game.position().board);
    eprintln!("{}", game.status_line());
    if config.show_moves && !game.is_game_over() {
        let moves: Vec<String> = game.legal_moves().iter().map(|m| m.to_uci()).collect();
        eprintln!("Legal moves: {}", moves.join(" "));
    }

    let stored = StoredGame::from(&game);
    let json = if config.pretty {
        serde_json::to_string_pretty(&stored)?
    } else {
        serde_json::to_string(&stored)?
    };
    match &args.out {
        Some(path) => std::fs::write(path, json + "\n")
            .with_context(|| format!("writing {}", path.display()))?,
        None => println!("{}", json),
    }
    Ok(())
}

fn load_game(path: &Path) -> anyhow::Result<Game> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(decode_game(&value))
}
