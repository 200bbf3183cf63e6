//! Chess position representation.

use chess_core::{CastleSide, Color, Fen, FenError, Square};

use crate::Board;

/// Castling rights flags.
///
/// Rights can be revoked but never granted back once a position exists;
/// the only constructors are the flag sets below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights(0);
    pub const ALL: CastlingRights = CastlingRights(0b1111);

    const WHITE_KINGSIDE: u8 = 0b0001;
    const WHITE_QUEENSIDE: u8 = 0b0010;
    const BLACK_KINGSIDE: u8 = 0b0100;
    const BLACK_QUEENSIDE: u8 = 0b1000;

    /// Builds rights from the four individual flags.
    pub const fn from_flags(
        white_kingside: bool,
        white_queenside: bool,
        black_kingside: bool,
        black_queenside: bool,
    ) -> Self {
        let mut bits = 0;
        if white_kingside {
            bits |= Self::WHITE_KINGSIDE;
        }
        if white_queenside {
            bits |= Self::WHITE_QUEENSIDE;
        }
        if black_kingside {
            bits |= Self::BLACK_KINGSIDE;
        }
        if black_queenside {
            bits |= Self::BLACK_QUEENSIDE;
        }
        CastlingRights(bits)
    }

    const fn flag(color: Color, side: CastleSide) -> u8 {
        match (color, side) {
            (Color::White, CastleSide::Kingside) => Self::WHITE_KINGSIDE,
            (Color::White, CastleSide::Queenside) => Self::WHITE_QUEENSIDE,
            (Color::Black, CastleSide::Kingside) => Self::BLACK_KINGSIDE,
            (Color::Black, CastleSide::Queenside) => Self::BLACK_QUEENSIDE,
        }
    }

    /// Returns true if `color` still has the right to castle on `side`.
    #[inline]
    pub const fn allows(self, color: Color, side: CastleSide) -> bool {
        self.0 & Self::flag(color, side) != 0
    }

    /// Clears one right.
    #[inline]
    pub fn revoke(&mut self, color: Color, side: CastleSide) {
        self.0 &= !Self::flag(color, side);
    }

    /// Clears both rights of a color.
    #[inline]
    pub fn revoke_color(&mut self, color: Color) {
        self.revoke(color, CastleSide::Kingside);
        self.revoke(color, CastleSide::Queenside);
    }

    /// FEN-style string ("KQkq", "Kq", "-").
    pub fn to_fen_string(self) -> String {
        let mut s = String::new();
        for (color, side, c) in [
            (Color::White, CastleSide::Kingside, 'K'),
            (Color::White, CastleSide::Queenside, 'Q'),
            (Color::Black, CastleSide::Kingside, 'k'),
            (Color::Black, CastleSide::Queenside, 'q'),
        ] {
            if self.allows(color, side) {
                s.push(c);
            }
        }
        if s.is_empty() {
            s.push('-');
        }
        s
    }

    /// Reads a FEN castling field; unknown characters are ignored.
    pub fn from_fen_str(s: &str) -> Self {
        Self::from_flags(
            s.contains('K'),
            s.contains('Q'),
            s.contains('k'),
            s.contains('q'),
        )
    }
}

impl Default for CastlingRights {
    fn default() -> Self {
        Self::ALL
    }
}

/// The rules-relevant part of a game state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub board: Board,

    /// The side to move.
    pub side_to_move: Color,

    pub castling: CastlingRights,

    /// Square skipped by a pawn double push on the previous move.
    pub en_passant: Option<Square>,

    /// Plies since the last pawn move or capture.
    pub halfmove_clock: u32,

    /// Fullmove number (starts at 1, increments after Black's move).
    pub fullmove_number: u32,
}

impl Position {
    /// Creates the standard starting position.
    pub fn startpos() -> Self {
        Position {
            board: Board::startpos(),
            side_to_move: Color::White,
            castling: CastlingRights::ALL,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// Creates a position from a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let parsed = Fen::parse(fen)?;
        let board = parsed
            .pieces
            .iter()
            .fold(Board::EMPTY, |board, (sq, piece)| {
                board.with(*sq, Some(*piece))
            });

        Ok(Position {
            board,
            side_to_move: parsed.side_to_move,
            castling: CastlingRights::from_fen_str(&parsed.castling),
            en_passant: parsed.en_passant,
            halfmove_clock: parsed.halfmove_clock,
            fullmove_number: parsed.fullmove_number,
        })
    }

    /// Converts the position to a FEN string.
    pub fn to_fen(&self) -> String {
        format!(
            "{} {} {}",
            self.position_key(),
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    /// Canonical identifier used for repetition detection: board layout,
    /// side to move, castling rights and en passant square.
    pub fn position_key(&self) -> String {
        format!(
            "{} {} {} {}",
            self.board.placement(),
            self.side_to_move.code(),
            self.castling.to_fen_string(),
            self.en_passant
                .map_or_else(|| "-".to_string(), |sq| sq.to_algebraic())
        )
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::startpos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::{Piece, PieceKind};

    #[test]
    fn startpos_fen() {
        assert_eq!(Position::startpos().to_fen(), Fen::STARTPOS);
    }

    #[test]
    fn custom_fen_roundtrip() {
        let fen = "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3";
        let pos = Position::from_fen(fen).unwrap();
        assert_eq!(pos.to_fen(), fen);
    }

    #[test]
    fn fen_with_en_passant() {
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
        let pos = Position::from_fen(fen).unwrap();
        assert_eq!(pos.en_passant, Square::from_algebraic("e3"));
        assert_eq!(pos.side_to_move, Color::Black);
        assert_eq!(pos.to_fen(), fen);
    }

    #[test]
    fn piece_placement_from_fen() {
        let pos = Position::from_fen("8/8/8/8/8/8/8/4K2k w - - 0 1").unwrap();
        assert_eq!(
            pos.board.piece_at(Square::E1),
            Some(Piece::new(Color::White, PieceKind::King))
        );
        assert_eq!(
            pos.board.piece_at(Square::H1),
            Some(Piece::new(Color::Black, PieceKind::King))
        );
        assert_eq!(pos.board.pieces().count(), 2);
    }

    #[test]
    fn position_key_excludes_clocks() {
        let a = Position::from_fen("8/8/8/8/8/8/8/4K2k w - - 0 1").unwrap();
        let b = Position::from_fen("8/8/8/8/8/8/8/4K2k w - - 7 12").unwrap();
        assert_eq!(a.position_key(), b.position_key());
        assert_eq!(a.position_key(), "8/8/8/8/8/8/8/4K2k w - -");
    }

    #[test]
    fn castling_rights_revoke() {
        let mut rights = CastlingRights::ALL;
        rights.revoke(Color::White, CastleSide::Kingside);
        assert!(!rights.allows(Color::White, CastleSide::Kingside));
        assert!(rights.allows(Color::White, CastleSide::Queenside));
        assert_eq!(rights.to_fen_string(), "Qkq");

        rights.revoke_color(Color::Black);
        assert_eq!(rights.to_fen_string(), "Q");
    }

    #[test]
    fn castling_rights_strings() {
        assert_eq!(CastlingRights::NONE.to_fen_string(), "-");
        assert_eq!(CastlingRights::from_fen_str("-"), CastlingRights::NONE);
        assert_eq!(CastlingRights::from_fen_str("KQkq"), CastlingRights::ALL);
        assert_eq!(
            CastlingRights::from_fen_str("Kq"),
            CastlingRights::from_flags(true, false, false, true)
        );
    }
}
