//! Core types for chess.
//!
//! This crate provides the value types shared by the rules engine and its
//! callers:
//! - [`Piece`], [`PieceKind`] and [`Color`] (with per-color [`SideLayout`])
//! - [`Square`], [`File`], and [`Rank`] for board coordinates
//! - [`Move`], [`MoveFlag`], [`CastleSide`] and [`MoveRequest`]
//! - FEN parsing

mod color;
mod fen;
mod mov;
mod piece;
mod square;

pub use color::{Color, SideLayout};
pub use fen::{Fen, FenError};
pub use mov::{CastleSide, Move, MoveFlag, MoveRequest};
pub use piece::{Piece, PieceKind};
pub use square::{File, Rank, Square};
