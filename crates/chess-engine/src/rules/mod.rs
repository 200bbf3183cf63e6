//! Rule set abstraction and game results.
//!
//! [`RuleSet`] is the seam between the game record and the rules that
//! drive it. [`StandardChess`] is the only implementation.

mod standard;

pub use standard::StandardChess;

use crate::Position;
use chess_core::{Color, Move, Square};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of occurrences of a position that ends the game.
pub const REPETITION_LIMIT: usize = 3;

/// Halfmove clock value that ends the game.
pub const FIFTY_MOVE_PLIES: u32 = 100;

/// Lifecycle state of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    #[default]
    Playing,
    Checkmate,
    Stalemate,
    Draw,
}

impl GameStatus {
    /// Lowercase stored name.
    pub const fn name(self) -> &'static str {
        match self {
            GameStatus::Playing => "playing",
            GameStatus::Checkmate => "checkmate",
            GameStatus::Stalemate => "stalemate",
            GameStatus::Draw => "draw",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "playing" => Some(GameStatus::Playing),
            "checkmate" => Some(GameStatus::Checkmate),
            "stalemate" => Some(GameStatus::Stalemate),
            "draw" => Some(GameStatus::Draw),
            _ => None,
        }
    }

    #[inline]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, GameStatus::Playing)
    }
}

/// Reason for a draw other than stalemate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawReason {
    ThreefoldRepetition,
    FiftyMoveRule,
    InsufficientMaterial,
}

impl fmt::Display for DrawReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DrawReason::ThreefoldRepetition => "threefold repetition",
            DrawReason::FiftyMoveRule => "fifty-move rule",
            DrawReason::InsufficientMaterial => "insufficient material",
        };
        f.write_str(text)
    }
}

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    /// The side to move is mated; `winner` made the last move.
    Checkmate { winner: Color },
    Stalemate,
    Draw(DrawReason),
}

impl GameResult {
    pub const fn status(self) -> GameStatus {
        match self {
            GameResult::Checkmate { .. } => GameStatus::Checkmate,
            GameResult::Stalemate => GameStatus::Stalemate,
            GameResult::Draw(_) => GameStatus::Draw,
        }
    }

    pub const fn winner(self) -> Option<Color> {
        match self {
            GameResult::Checkmate { winner } => Some(winner),
            _ => None,
        }
    }

    /// Free-text reason recorded with the result.
    pub fn reason(self) -> String {
        match self {
            GameResult::Checkmate { .. } => "checkmate".to_string(),
            GameResult::Stalemate => "stalemate".to_string(),
            GameResult::Draw(reason) => reason.to_string(),
        }
    }
}

/// Trait for the rules a game is played under.
pub trait RuleSet {
    /// Returns the initial position.
    fn initial_position(&self) -> Position;

    /// Legal moves of the piece on `from`.
    fn legal_moves_for_square(&self, position: &Position, from: Square) -> Vec<Move>;

    /// All legal moves of the side to move.
    fn generate_moves(&self, position: &Position) -> Vec<Move>;

    /// Applies a legal move, returning the new position.
    fn make_move(&self, position: &Position, m: Move) -> Position;

    /// Returns true if the side to move is in check.
    fn is_check(&self, position: &Position) -> bool;

    /// Returns true if the material left cannot produce a mate.
    fn is_insufficient_material(&self, position: &Position) -> bool;

    /// Evaluates the position for the side to move.
    ///
    /// `position_keys` holds every position key reached so far, the current
    /// one included. Returns `None` while the game goes on.
    fn game_result(&self, position: &Position, position_keys: &[String]) -> Option<GameResult>;
}
