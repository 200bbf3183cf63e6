//! Standard chess rules implementation.

use super::{DrawReason, GameResult, RuleSet, FIFTY_MOVE_PLIES, REPETITION_LIMIT};
use crate::movegen;
use crate::Position;
use chess_core::{Move, Piece, PieceKind, Square};

/// Standard chess rules.
///
/// Game end is detected automatically after every move:
/// - checkmate and stalemate
/// - threefold repetition (board, side to move, castling, en passant)
/// - fifty-move rule (100 plies without a pawn move or capture)
/// - insufficient material, in a simplified form: bare kings, a single
///   minor piece, or one bishop each on same-colored squares. Two knights
///   against a bare king is played on.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardChess;

impl RuleSet for StandardChess {
    fn initial_position(&self) -> Position {
        Position::startpos()
    }

    fn legal_moves_for_square(&self, position: &Position, from: Square) -> Vec<Move> {
        movegen::legal_moves_for_square(position, from)
    }

    fn generate_moves(&self, position: &Position) -> Vec<Move> {
        movegen::generate_moves(position)
    }

    fn make_move(&self, position: &Position, m: Move) -> Position {
        movegen::make_move(position, m)
    }

    fn is_check(&self, position: &Position) -> bool {
        movegen::is_king_attacked(&position.board, position.side_to_move)
    }

    fn is_insufficient_material(&self, position: &Position) -> bool {
        let material: Vec<(Square, Piece)> = position
            .board
            .pieces()
            .filter(|(_, p)| p.kind != PieceKind::King)
            .collect();

        match material.as_slice() {
            [] => true,
            [(_, piece)] => matches!(piece.kind, PieceKind::Bishop | PieceKind::Knight),
            [(sq_a, a), (sq_b, b)] => {
                a.kind == PieceKind::Bishop
                    && b.kind == PieceKind::Bishop
                    && a.color != b.color
                    && sq_a.is_dark() == sq_b.is_dark()
            }
            _ => false,
        }
    }

    fn game_result(&self, position: &Position, position_keys: &[String]) -> Option<GameResult> {
        if !movegen::has_legal_move(position) {
            return Some(if self.is_check(position) {
                GameResult::Checkmate {
                    winner: position.side_to_move.opposite(),
                }
            } else {
                GameResult::Stalemate
            });
        }

        let key = position.position_key();
        let occurrences = position_keys.iter().filter(|k| **k == key).count();
        if occurrences >= REPETITION_LIMIT {
            return Some(GameResult::Draw(DrawReason::ThreefoldRepetition));
        }

        if position.halfmove_clock >= FIFTY_MOVE_PLIES {
            return Some(GameResult::Draw(DrawReason::FiftyMoveRule));
        }

        if self.is_insufficient_material(position) {
            return Some(GameResult::Draw(DrawReason::InsufficientMaterial));
        }

        None
    }
}
