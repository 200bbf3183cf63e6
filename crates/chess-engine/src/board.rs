//! 8x8 piece grid.

use chess_core::{Color, Piece, PieceKind, Square};

const BACK_ROW: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

/// An 8x8 grid of optional pieces, indexed by `[row][file]` with row 0 at
/// rank 8.
///
/// `Board` is `Copy`: every change produces a new value and boards held by
/// earlier positions are never touched.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    squares: [[Option<Piece>; 8]; 8],
}

impl Board {
    /// A board with no pieces.
    pub const EMPTY: Board = Board {
        squares: [[None; 8]; 8],
    };

    /// The standard starting arrangement.
    pub fn startpos() -> Self {
        let mut board = Board::EMPTY;
        for color in Color::ALL {
            let layout = color.layout();
            for (file, kind) in BACK_ROW.iter().enumerate() {
                board.squares[layout.back_row as usize][file] = Some(Piece::new(color, *kind));
                board.squares[layout.pawn_row as usize][file] =
                    Some(Piece::new(color, PieceKind::Pawn));
            }
        }
        board
    }

    /// Builds a board from `[row][file]` cells.
    pub const fn from_rows(squares: [[Option<Piece>; 8]; 8]) -> Self {
        Board { squares }
    }

    /// Returns the `[row][file]` cells.
    pub const fn rows(&self) -> &[[Option<Piece>; 8]; 8] {
        &self.squares
    }

    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.row() as usize][sq.col() as usize]
    }

    /// Returns a copy of this board with `sq` set to `piece`.
    #[must_use]
    pub fn with(mut self, sq: Square, piece: Option<Piece>) -> Self {
        self.set(sq, piece);
        self
    }

    #[inline]
    pub(crate) fn set(&mut self, sq: Square, piece: Option<Piece>) {
        self.squares[sq.row() as usize][sq.col() as usize] = piece;
    }

    /// Iterates over occupied squares, a8 first.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| self.piece_at(sq).map(|p| (sq, p)))
    }

    /// Finds the king of the given color.
    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces()
            .find(|(_, p)| p.color == color && p.kind == PieceKind::King)
            .map(|(sq, _)| sq)
    }

    /// FEN piece-placement field for this board.
    pub fn placement(&self) -> String {
        let mut out = String::with_capacity(72);
        for (row, cells) in self.squares.iter().enumerate() {
            let mut empty = 0;
            for cell in cells {
                match cell {
                    Some(piece) => {
                        if empty > 0 {
                            out.push_str(&empty.to_string());
                            empty = 0;
                        }
                        out.push(piece.to_fen_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                out.push_str(&empty.to_string());
            }
            if row < 7 {
                out.push('/');
            }
        }
        out
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::startpos()
    }
}

impl std::fmt::Debug for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Board({})", self.placement())
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (row, cells) in self.squares.iter().enumerate() {
            write!(f, "{} ", 8 - row)?;
            for cell in cells {
                let c = cell.map_or('.', |p| p.to_fen_char());
                write!(f, " {}", c)?;
            }
            writeln!(f)?;
        }
        write!(f, "   a b c d e f g h")
    }
}
