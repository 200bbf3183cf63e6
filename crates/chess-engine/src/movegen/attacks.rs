//! Square attack detection by direct board inspection.

use crate::Board;
use chess_core::{Color, PieceKind, Square};

/// Knight jump offsets as `(row, file)` deltas.
pub(crate) const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

/// King step offsets.
pub(crate) const KING_OFFSETS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Rook ray directions.
pub(crate) const ORTHOGONAL: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Bishop ray directions.
pub(crate) const DIAGONAL: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

/// Returns true if any piece of `by_color` attacks `target`.
pub fn is_square_attacked(board: &Board, target: Square, by_color: Color) -> bool {
    let holds = |sq: Option<Square>, kind: PieceKind| {
        sq.and_then(|sq| board.piece_at(sq))
            .is_some_and(|p| p.color == by_color && p.kind == kind)
    };

    // An attacking pawn sits one step behind the target, relative to its own
    // forward direction.
    let behind = -by_color.layout().forward;
    if holds(target.offset(behind, -1), PieceKind::Pawn)
        || holds(target.offset(behind, 1), PieceKind::Pawn)
    {
        return true;
    }

    if KNIGHT_OFFSETS
        .iter()
        .any(|&(dr, df)| holds(target.offset(dr, df), PieceKind::Knight))
    {
        return true;
    }

    if KING_OFFSETS
        .iter()
        .any(|&(dr, df)| holds(target.offset(dr, df), PieceKind::King))
    {
        return true;
    }

    let ray_hits = |directions: &[(i8, i8)], slider: PieceKind| {
        directions.iter().any(|&(dr, df)| {
            first_piece_on_ray(board, target, dr, df).is_some_and(|p| {
                p.color == by_color && (p.kind == slider || p.kind == PieceKind::Queen)
            })
        })
    };

    ray_hits(&ORTHOGONAL, PieceKind::Rook) || ray_hits(&DIAGONAL, PieceKind::Bishop)
}

/// Returns true if the king of `color` is attacked.
///
/// A board without that king reports false.
pub fn is_king_attacked(board: &Board, color: Color) -> bool {
    board
        .king_square(color)
        .is_some_and(|sq| is_square_attacked(board, sq, color.opposite()))
}

fn first_piece_on_ray(
    board: &Board,
    from: Square,
    dr: i8,
    df: i8,
) -> Option<chess_core::Piece> {
    let mut current = from.offset(dr, df);
    while let Some(sq) = current {
        if let Some(piece) = board.piece_at(sq) {
            return Some(piece);
        }
        current = sq.offset(dr, df);
    }
    None
}
