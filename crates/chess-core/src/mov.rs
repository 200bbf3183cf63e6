//! Move representation.

use crate::{PieceKind, Square};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the board a castle goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CastleSide {
    Kingside,
    Queenside,
}

impl CastleSide {
    pub const ALL: [CastleSide; 2] = [CastleSide::Kingside, CastleSide::Queenside];

    /// File the king lands on.
    pub const fn king_to_file(self) -> u8 {
        match self {
            CastleSide::Kingside => 6,
            CastleSide::Queenside => 2,
        }
    }

    /// File of the rook's home corner.
    pub const fn rook_from_file(self) -> u8 {
        match self {
            CastleSide::Kingside => 7,
            CastleSide::Queenside => 0,
        }
    }

    /// File the rook lands on, next to the king on the inner side.
    pub const fn rook_to_file(self) -> u8 {
        match self {
            CastleSide::Kingside => 5,
            CastleSide::Queenside => 3,
        }
    }
}

/// Flags for special move types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveFlag {
    /// Normal move or capture.
    Normal,
    /// Pawn double push from its home row.
    DoublePush,
    /// King move that castles to the given side.
    Castle(CastleSide),
    /// Pawn capture onto the en passant target.
    EnPassant,
    /// Pawn reaching the far row, becoming the given piece.
    Promotion(PieceKind),
}

impl MoveFlag {
    /// Returns the promotion piece if this is a promotion move.
    #[inline]
    pub const fn promotion_piece(self) -> Option<PieceKind> {
        match self {
            MoveFlag::Promotion(kind) => Some(kind),
            _ => None,
        }
    }

    /// Returns the castle side if this is a castling move.
    #[inline]
    pub const fn castle_side(self) -> Option<CastleSide> {
        match self {
            MoveFlag::Castle(side) => Some(side),
            _ => None,
        }
    }

    #[inline]
    pub const fn is_promotion(self) -> bool {
        matches!(self, MoveFlag::Promotion(_))
    }

    #[inline]
    pub const fn is_castling(self) -> bool {
        matches!(self, MoveFlag::Castle(_))
    }

    #[inline]
    pub const fn is_en_passant(self) -> bool {
        matches!(self, MoveFlag::EnPassant)
    }
}

/// A candidate or applied move.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    from: Square,
    to: Square,
    flag: MoveFlag,
}

impl Move {
    #[inline]
    pub const fn new(from: Square, to: Square, flag: MoveFlag) -> Self {
        Move { from, to, flag }
    }

    /// Creates a normal move (no special flags).
    #[inline]
    pub const fn normal(from: Square, to: Square) -> Self {
        Self::new(from, to, MoveFlag::Normal)
    }

    #[inline]
    pub const fn from(self) -> Square {
        self.from
    }

    #[inline]
    pub const fn to(self) -> Square {
        self.to
    }

    #[inline]
    pub const fn flag(self) -> MoveFlag {
        self.flag
    }

    /// Square-pair text for this move ("e2e4", "e7e8q").
    pub fn to_uci(self) -> String {
        match self.flag.promotion_piece() {
            Some(kind) => format!(
                "{}{}{}",
                self.from,
                self.to,
                kind.letter().to_ascii_lowercase()
            ),
            None => format!("{}{}", self.from, self.to),
        }
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Move({})", self.to_uci())
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}

/// A move as a caller asks for it: origin, destination, optional promotion.
///
/// Flags are not known until the request is matched against the legal moves
/// of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRequest {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
}

impl MoveRequest {
    pub const fn new(from: Square, to: Square, promotion: Option<PieceKind>) -> Self {
        MoveRequest {
            from,
            to,
            promotion,
        }
    }

    /// Parses square-pair text: "e2e4", or "e7e8q" with a promotion letter.
    pub fn parse(s: &str) -> Option<Self> {
        if !s.is_ascii() || s.len() < 4 || s.len() > 5 {
            return None;
        }
        let from = Square::from_algebraic(&s[0..2])?;
        let to = Square::from_algebraic(&s[2..4])?;
        let promotion = match s[4..].chars().next() {
            Some(c) => {
                let kind = PieceKind::from_letter(c)?;
                if !kind.is_promotion_target() {
                    return None;
                }
                Some(kind)
            }
            None => None,
        };
        Some(MoveRequest::new(from, to, promotion))
    }
}
