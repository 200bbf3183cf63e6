//! Player color representation.

use serde::{Deserialize, Serialize};

/// Represents the two players in chess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Color {
    White = 0,
    Black = 1,
}

/// Board geometry that depends on which side a piece belongs to.
///
/// Rows are counted from the top of the board (row 0 is rank 8), so white
/// pawns walk towards row 0 and black pawns towards row 7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SideLayout {
    /// Row delta of a single pawn step.
    pub forward: i8,
    /// Row the pawns start on (double pushes allowed from here).
    pub pawn_row: u8,
    /// Row on which a pawn promotes.
    pub promotion_row: u8,
    /// Row holding the king and rooks at the start of the game.
    pub back_row: u8,
    /// Row skipped by a double push, where an en passant capture lands.
    pub en_passant_row: u8,
}

const WHITE_LAYOUT: SideLayout = SideLayout {
    forward: -1,
    pawn_row: 6,
    promotion_row: 0,
    back_row: 7,
    en_passant_row: 5,
};

const BLACK_LAYOUT: SideLayout = SideLayout {
    forward: 1,
    pawn_row: 1,
    promotion_row: 7,
    back_row: 0,
    en_passant_row: 2,
};

impl Color {
    /// Both colors, white first.
    pub const ALL: [Color; 2] = [Color::White, Color::Black];

    /// Returns the opposite color.
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Returns the index (0 for White, 1 for Black).
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the row layout for this color.
    #[inline]
    pub const fn layout(self) -> SideLayout {
        match self {
            Color::White => WHITE_LAYOUT,
            Color::Black => BLACK_LAYOUT,
        }
    }

    /// Single-letter code used in piece codes and position keys.
    #[inline]
    pub const fn code(self) -> char {
        match self {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }

    /// Parses the single-letter code.
    pub const fn from_code(c: char) -> Option<Self> {
        match c {
            'w' => Some(Color::White),
            'b' => Some(Color::Black),
            _ => None,
        }
    }

    /// Lowercase name as stored ("white" / "black").
    pub const fn name(self) -> &'static str {
        match self {
            Color::White => "white",
            Color::Black => "black",
        }
    }

    /// Parses the lowercase stored name.
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "white" => Some(Color::White),
            "black" => Some(Color::Black),
            _ => None,
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Color::White => write!(f, "White"),
            Color::Black => write!(f, "Black"),
        }
    }
}
