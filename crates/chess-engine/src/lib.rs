//! Rules engine for two-player chess.
//!
//! This crate provides:
//! - [`Board`] - 8x8 grid of optional pieces
//! - [`Position`] - board plus side to move, castling rights, en passant
//!   target and move clocks
//! - [`Game`] - immutable game snapshot; submitting a move yields a new one
//! - [`RuleSet`] - the rules a game is played under, with [`StandardChess`]
//! - [`movegen`] - attack detection, move generation and move application
//! - [`codec`] - conversion to and from a stored representation
//!
//! # Example
//!
//! ```
//! use chess_core::Square;
//! use chess_engine::{Game, GameStatus};
//!
//! let sq = |s| Square::from_algebraic(s).unwrap();
//!
//! let game = Game::new();
//! let game = game.submit(sq("f2"), sq("f3"), None).unwrap();
//! let game = game.submit(sq("e7"), sq("e5"), None).unwrap();
//! let game = game.submit(sq("g2"), sq("g4"), None).unwrap();
//! let game = game.submit(sq("d8"), sq("h4"), None).unwrap();
//!
//! assert_eq!(game.status(), GameStatus::Checkmate);
//! assert_eq!(game.status_line(), "Checkmate - Black wins");
//! ```

mod board;
pub mod codec;
mod game;
pub mod movegen;
mod position;
pub mod rules;

pub use board::Board;
pub use codec::{decode_board, decode_game, encode_board, encode_game, Decoded, StoredGame};
pub use game::{Game, GameError, LastMove, MoveRecord};
pub use movegen::{
    generate_moves, has_legal_move, is_king_attacked, is_square_attacked, legal_moves_for_square,
    make_move,
};
pub use position::{CastlingRights, Position};
pub use rules::{DrawReason, GameResult, GameStatus, RuleSet, StandardChess};
