//! Move generation and move application.
//!
//! Generation happens in two stages. [`pseudo_moves`] lists what a piece
//! could do by its movement rules alone; [`legal_moves_for_square`] keeps the
//! candidates that do not leave the mover's king attacked. Both the legality
//! filter and the castling path check go through [`is_safe_after`], which
//! applies the move to a copy of the position and inspects the result.

mod attacks;
pub mod perft;

use crate::Position;
use chess_core::{CastleSide, Color, Move, MoveFlag, Piece, PieceKind, Square};

pub use attacks::{is_king_attacked, is_square_attacked};
use attacks::{DIAGONAL, KING_OFFSETS, KNIGHT_OFFSETS, ORTHOGONAL};

/// Generates every legal move for the side to move.
pub fn generate_moves(position: &Position) -> Vec<Move> {
    own_squares(position)
        .flat_map(|sq| legal_moves_for_square(position, sq))
        .collect()
}

/// Returns true if the side to move has at least one legal move.
///
/// Stops at the first square that has one.
pub fn has_legal_move(position: &Position) -> bool {
    own_squares(position).any(|sq| !legal_moves_for_square(position, sq).is_empty())
}

fn own_squares(position: &Position) -> impl Iterator<Item = Square> + '_ {
    position
        .board
        .pieces()
        .filter(move |(_, p)| p.color == position.side_to_move)
        .map(|(sq, _)| sq)
}

/// Legal moves of the piece on `from`, whichever color it is.
pub fn legal_moves_for_square(position: &Position, from: Square) -> Vec<Move> {
    pseudo_moves(position, from)
        .into_iter()
        .filter(|m| is_safe_after(position, *m))
        .collect()
}

/// Applies `m` to a copy of the position and reports whether the mover's
/// king is unattacked afterwards.
pub fn is_safe_after(position: &Position, m: Move) -> bool {
    match position.board.piece_at(m.from()) {
        Some(piece) => !is_king_attacked(&make_move(position, m).board, piece.color),
        None => false,
    }
}

/// Candidate moves of the piece on `from`, ignoring self-check.
pub fn pseudo_moves(position: &Position, from: Square) -> Vec<Move> {
    let mut moves = Vec::new();
    let Some(piece) = position.board.piece_at(from) else {
        return moves;
    };

    match piece.kind {
        PieceKind::Pawn => pawn_moves(position, from, piece.color, &mut moves),
        PieceKind::Knight => step_moves(position, from, piece.color, &KNIGHT_OFFSETS, &mut moves),
        PieceKind::Bishop => slide_moves(position, from, piece.color, &DIAGONAL, &mut moves),
        PieceKind::Rook => slide_moves(position, from, piece.color, &ORTHOGONAL, &mut moves),
        PieceKind::Queen => {
            slide_moves(position, from, piece.color, &ORTHOGONAL, &mut moves);
            slide_moves(position, from, piece.color, &DIAGONAL, &mut moves);
        }
        PieceKind::King => {
            step_moves(position, from, piece.color, &KING_OFFSETS, &mut moves);
            let back_row = piece.color.layout().back_row;
            for side in CastleSide::ALL {
                if can_castle(position, piece.color, side) {
                    if let Some(to) = Square::from_coords(back_row, side.king_to_file()) {
                        moves.push(Move::new(from, to, MoveFlag::Castle(side)));
                    }
                }
            }
        }
    }
    moves
}

fn pawn_moves(position: &Position, from: Square, color: Color, moves: &mut Vec<Move>) {
    let board = &position.board;
    let layout = color.layout();

    if let Some(one) = from.offset(layout.forward, 0) {
        if board.piece_at(one).is_none() {
            push_pawn_move(from, one, color, moves);
            if from.row() == layout.pawn_row {
                if let Some(two) = one.offset(layout.forward, 0) {
                    if board.piece_at(two).is_none() {
                        moves.push(Move::new(from, two, MoveFlag::DoublePush));
                    }
                }
            }
        }
    }

    for df in [-1, 1] {
        let Some(to) = from.offset(layout.forward, df) else {
            continue;
        };
        match board.piece_at(to) {
            Some(target) if target.color != color => push_pawn_move(from, to, color, moves),
            None if position.en_passant == Some(to) => {
                let victim =
                    Square::from_coords(from.row(), to.col()).and_then(|sq| board.piece_at(sq));
                if victim == Some(Piece::new(color.opposite(), PieceKind::Pawn)) {
                    moves.push(Move::new(from, to, MoveFlag::EnPassant));
                }
            }
            _ => {}
        }
    }
}

/// Pushes a pawn move, expanded into the four promotions on the far row.
fn push_pawn_move(from: Square, to: Square, color: Color, moves: &mut Vec<Move>) {
    if to.row() == color.layout().promotion_row {
        for kind in PieceKind::PROMOTIONS {
            moves.push(Move::new(from, to, MoveFlag::Promotion(kind)));
        }
    } else {
        moves.push(Move::normal(from, to));
    }
}

fn step_moves(
    position: &Position,
    from: Square,
    color: Color,
    offsets: &[(i8, i8)],
    moves: &mut Vec<Move>,
) {
    for &(dr, df) in offsets {
        if let Some(to) = from.offset(dr, df) {
            if position.board.piece_at(to).map_or(true, |p| p.color != color) {
                moves.push(Move::normal(from, to));
            }
        }
    }
}

fn slide_moves(
    position: &Position,
    from: Square,
    color: Color,
    directions: &[(i8, i8)],
    moves: &mut Vec<Move>,
) {
    for &(dr, df) in directions {
        let mut current = from.offset(dr, df);
        while let Some(to) = current {
            match position.board.piece_at(to) {
                None => moves.push(Move::normal(from, to)),
                Some(p) => {
                    if p.color != color {
                        moves.push(Move::normal(from, to));
                    }
                    break;
                }
            }
            current = to.offset(dr, df);
        }
    }
}

/// Returns true if `color` may castle towards `side` right now.
///
/// Requires the right flag, king and rook on their home squares, empty
/// squares between them, the king not in check, and every square the king
/// crosses (destination included) safe to step on.
pub fn can_castle(position: &Position, color: Color, side: CastleSide) -> bool {
    if !position.castling.allows(color, side) {
        return false;
    }

    let board = &position.board;
    let back_row = color.layout().back_row;
    let home = |file: u8| Square::from_coords(back_row, file);
    let (Some(king_sq), Some(rook_sq)) = (home(4), home(side.rook_from_file())) else {
        return false;
    };

    if board.piece_at(king_sq) != Some(Piece::new(color, PieceKind::King))
        || board.piece_at(rook_sq) != Some(Piece::new(color, PieceKind::Rook))
    {
        return false;
    }
    if is_king_attacked(board, color) {
        return false;
    }

    let (low, high) = match side {
        CastleSide::Kingside => (5, 7),
        CastleSide::Queenside => (1, 4),
    };
    if (low..high).any(|file| home(file).and_then(|sq| board.piece_at(sq)).is_some()) {
        return false;
    }

    let path: [u8; 2] = match side {
        CastleSide::Kingside => [5, 6],
        CastleSide::Queenside => [3, 2],
    };
    path.iter().all(|&file| {
        home(file).is_some_and(|sq| is_safe_after(position, Move::normal(king_sq, sq)))
    })
}

/// Piece removed from the board by `m`, if any.
pub fn captured_piece(position: &Position, m: Move) -> Option<Piece> {
    let board = &position.board;
    if m.flag().is_en_passant() {
        Square::from_coords(m.from().row(), m.to().col()).and_then(|sq| board.piece_at(sq))
    } else {
        board.piece_at(m.to())
    }
}

/// Applies a move and returns the next position.
///
/// The move is assumed to come from the legal move list: special handling
/// (castling, en passant) follows the move's flag. A pawn reaching the far
/// row without a promotion flag becomes a queen. A move whose origin is
/// empty returns the position unchanged.
pub fn make_move(position: &Position, m: Move) -> Position {
    let mut next = *position;
    let Some(piece) = position.board.piece_at(m.from()) else {
        return next;
    };
    let us = piece.color;
    let layout = us.layout();
    let (from, to) = (m.from(), m.to());

    let captured = captured_piece(position, m);
    next.board.set(from, None);
    if m.flag().is_en_passant() {
        if let Some(victim_sq) = Square::from_coords(from.row(), to.col()) {
            next.board.set(victim_sq, None);
        }
    }

    let placed = if piece.kind == PieceKind::Pawn && to.row() == layout.promotion_row {
        Piece::new(us, m.flag().promotion_piece().unwrap_or(PieceKind::Queen))
    } else {
        piece
    };
    next.board.set(to, Some(placed));

    if let Some(side) = m.flag().castle_side() {
        let rook_from = Square::from_coords(layout.back_row, side.rook_from_file());
        let rook_to = Square::from_coords(layout.back_row, side.rook_to_file());
        if let (Some(rook_from), Some(rook_to)) = (rook_from, rook_to) {
            let rook = next.board.piece_at(rook_from);
            next.board.set(rook_from, None);
            next.board.set(rook_to, rook);
        }
    }

    // King moves drop both rights; anything leaving or landing on a rook's
    // home corner drops that corner's right.
    if piece.kind == PieceKind::King {
        next.castling.revoke_color(us);
    }
    for color in Color::ALL {
        for side in CastleSide::ALL {
            let corner = Square::from_coords(color.layout().back_row, side.rook_from_file());
            if corner == Some(from) || corner == Some(to) {
                next.castling.revoke(color, side);
            }
        }
    }

    next.en_passant = if piece.kind == PieceKind::Pawn && from.row().abs_diff(to.row()) == 2 {
        from.offset(layout.forward, 0)
    } else {
        None
    };

    if piece.kind == PieceKind::Pawn || captured.is_some() {
        next.halfmove_clock = 0;
    } else {
        next.halfmove_clock = next.halfmove_clock.saturating_add(1);
    }
    if us == Color::Black {
        next.fullmove_number = next.fullmove_number.saturating_add(1);
    }
    next.side_to_move = us.opposite();

    next
}
