//! Conversion between games and a storage-neutral representation.
//!
//! Encoding produces plain serde types ([`StoredGame`], [`GameState`],
//! [`BoardGrid`]). Decoding starts from a [`serde_json::Value`] as read back
//! from a store and checks every field on its own: a field that is missing or
//! malformed is replaced by its default and reported as
//! [`Decoded::Defaulted`], while the rest of the record is still used.
//! Decoding never fails.

use crate::rules::GameStatus;
use crate::{Board, CastlingRights, Game, LastMove, MoveRecord, Position};
use chess_core::{CastleSide, Color, Piece, Square};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Board as 8 rows of 8 cell codes, row 0 = rank 8.
pub type BoardGrid = Vec<Vec<String>>;

/// Cell value for an empty square.
pub const EMPTY_CELL: &str = "";

static NULL: Value = Value::Null;

/// Outcome of decoding one stored field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded<T> {
    /// The stored value passed validation.
    Valid(T),
    /// The stored value was missing or malformed; this is the default.
    Defaulted(T),
}

impl<T> Decoded<T> {
    pub fn into_inner(self) -> T {
        match self {
            Decoded::Valid(v) | Decoded::Defaulted(v) => v,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Decoded::Valid(_))
    }

    fn from_option(value: Option<T>, default: impl FnOnce() -> T) -> Self {
        match value {
            Some(v) => Decoded::Valid(v),
            None => Decoded::Defaulted(default()),
        }
    }

    /// Unwraps the value, logging when it had to be defaulted.
    fn logged(self, field: &str) -> T {
        if !self.is_valid() {
            warn!(field, "stored field missing or malformed, using default");
        }
        self.into_inner()
    }
}

/// Winner as stored: a color or "none".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    White,
    Black,
    None,
}

impl From<Option<Color>> for Winner {
    fn from(color: Option<Color>) -> Self {
        match color {
            Some(Color::White) => Winner::White,
            Some(Color::Black) => Winner::Black,
            None => Winner::None,
        }
    }
}

impl From<Winner> for Option<Color> {
    fn from(winner: Winner) -> Self {
        match winner {
            Winner::White => Some(Color::White),
            Winner::Black => Some(Color::Black),
            Winner::None => None,
        }
    }
}

/// Castling rights as four named flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCastlingRights {
    pub white_kingside: bool,
    pub white_queenside: bool,
    pub black_kingside: bool,
    pub black_queenside: bool,
}

impl From<CastlingRights> for StoredCastlingRights {
    fn from(rights: CastlingRights) -> Self {
        StoredCastlingRights {
            white_kingside: rights.allows(Color::White, CastleSide::Kingside),
            white_queenside: rights.allows(Color::White, CastleSide::Queenside),
            black_kingside: rights.allows(Color::Black, CastleSide::Kingside),
            black_queenside: rights.allows(Color::Black, CastleSide::Queenside),
        }
    }
}

impl From<StoredCastlingRights> for CastlingRights {
    fn from(stored: StoredCastlingRights) -> Self {
        CastlingRights::from_flags(
            stored.white_kingside,
            stored.white_queenside,
            stored.black_kingside,
            stored.black_queenside,
        )
    }
}

/// Auxiliary state stored next to the board and turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub castling_rights: StoredCastlingRights,
    pub en_passant: Option<String>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
    pub position_keys: Vec<String>,
    pub result_reason: Option<String>,
}

/// Every part of a game as it is written to a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredGame {
    pub board: BoardGrid,
    pub turn: Color,
    pub status: GameStatus,
    pub winner: Winner,
    pub history: Vec<MoveRecord>,
    pub last_move: Option<LastMove>,
    pub state: GameState,
}

impl From<&Game> for StoredGame {
    fn from(game: &Game) -> Self {
        encode_game(game)
    }
}

/// Encodes a board into its cell grid.
pub fn encode_board(board: &Board) -> BoardGrid {
    board
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| cell.map_or_else(|| EMPTY_CELL.to_string(), Piece::code))
                .collect()
        })
        .collect()
}

/// Decodes a cell grid.
///
/// Anything other than 8 rows of 8 known cells yields the starting board.
/// `null` cells are read as empty.
pub fn decode_board(value: &Value) -> Decoded<Board> {
    Decoded::from_option(parse_board(value), Board::startpos)
}

fn parse_board(value: &Value) -> Option<Board> {
    let rows = value.as_array().filter(|rows| rows.len() == 8)?;
    let mut cells = [[None; 8]; 8];
    for (row, row_value) in rows.iter().enumerate() {
        let row_cells = row_value.as_array().filter(|r| r.len() == 8)?;
        for (file, cell) in row_cells.iter().enumerate() {
            cells[row][file] = match cell {
                Value::Null => None,
                Value::String(code) if code == EMPTY_CELL => None,
                Value::String(code) => Some(Piece::from_code(code)?),
                _ => return None,
            };
        }
    }
    Some(Board::from_rows(cells))
}

/// Encodes the auxiliary state bundle of a game.
pub fn encode_state(game: &Game) -> GameState {
    GameState {
        castling_rights: game.castling().into(),
        en_passant: game.en_passant().map(Square::to_algebraic),
        halfmove_clock: game.halfmove_clock(),
        fullmove_number: game.fullmove_number(),
        position_keys: game.position_keys().to_vec(),
        result_reason: game.result_reason().map(str::to_string),
    }
}

/// Field-by-field result of decoding a [`GameState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedState {
    pub castling: Decoded<CastlingRights>,
    pub en_passant: Decoded<Option<Square>>,
    pub halfmove_clock: Decoded<u32>,
    pub fullmove_number: Decoded<u32>,
    /// `Valid` only for a non-empty list of strings.
    pub position_keys: Decoded<Vec<String>>,
    pub result_reason: Decoded<Option<String>>,
}

/// Decodes the auxiliary state bundle.
///
/// Missing position keys decode to an empty, defaulted list; callers that
/// know the position derive a key from it (see [`decode_game`]).
pub fn decode_state(value: &Value) -> DecodedState {
    let field = |name: &str| value.get(name);

    DecodedState {
        castling: Decoded::from_option(
            field("castling_rights")
                .cloned()
                .and_then(|v| serde_json::from_value::<StoredCastlingRights>(v).ok())
                .map(CastlingRights::from),
            CastlingRights::default,
        ),
        en_passant: decode_optional(field("en_passant"), |v| {
            v.as_str()
                .and_then(Square::from_algebraic)
                .filter(|sq| Color::ALL.iter().any(|c| c.layout().en_passant_row == sq.row()))
        }),
        halfmove_clock: Decoded::from_option(decode_count(field("halfmove_clock")), || 0),
        fullmove_number: Decoded::from_option(
            decode_count(field("fullmove_number")).filter(|n| *n >= 1),
            || 1,
        ),
        position_keys: Decoded::from_option(
            field("position_keys")
                .and_then(Value::as_array)
                .filter(|keys| !keys.is_empty())
                .and_then(|keys| {
                    keys.iter()
                        .map(|k| k.as_str().map(str::to_string))
                        .collect::<Option<Vec<_>>>()
                }),
            Vec::new,
        ),
        result_reason: decode_optional(field("result_reason"), |v| {
            v.as_str().map(str::to_string)
        }),
    }
}

/// `null` or missing is a valid `None`; anything else must parse.
fn decode_optional<T>(
    value: Option<&Value>,
    parse: impl FnOnce(&Value) -> Option<T>,
) -> Decoded<Option<T>> {
    match value {
        None | Some(Value::Null) => Decoded::Valid(None),
        Some(v) => match parse(v) {
            Some(parsed) => Decoded::Valid(Some(parsed)),
            None => Decoded::Defaulted(None),
        },
    }
}

/// A finite, non-negative whole number that fits in `u32`. Integral floats
/// such as `12.0` are accepted.
fn decode_count(value: Option<&Value>) -> Option<u32> {
    let number = match value? {
        Value::Number(n) => n,
        _ => return None,
    };
    let whole = match number.as_u64() {
        Some(n) => n,
        None => {
            let f = number.as_f64()?;
            if !f.is_finite() || f < 0.0 || f.fract() != 0.0 || f > f64::from(u32::MAX) {
                return None;
            }
            f as u64
        }
    };
    u32::try_from(whole).ok()
}

/// Encodes every part of a game.
pub fn encode_game(game: &Game) -> StoredGame {
    StoredGame {
        board: encode_board(&game.position().board),
        turn: game.side_to_move(),
        status: game.status(),
        winner: game.winner().into(),
        history: game.history().to_vec(),
        last_move: game.last_move().cloned(),
        state: encode_state(game),
    }
}

/// Rebuilds a game from a stored record.
///
/// `record` is expected to look like a serialized [`StoredGame`]. Each field
/// is validated on its own and replaced by its default when unusable; when
/// no position keys were stored, one is derived from the decoded position so
/// the key log is never empty.
pub fn decode_game(record: &Value) -> Game {
    let field = |name: &str| record.get(name).unwrap_or(&NULL);

    let board = decode_board(field("board")).logged("board");
    let side_to_move = Decoded::from_option(
        field("turn").as_str().and_then(Color::from_name),
        || Color::White,
    )
    .logged("turn");
    let status = Decoded::from_option(
        field("status").as_str().and_then(GameStatus::from_name),
        GameStatus::default,
    )
    .logged("status");
    let winner = match field("winner") {
        Value::Null => Decoded::Valid(None),
        v => Decoded::from_option(
            serde_json::from_value::<Winner>(v.clone()).ok().map(Into::into),
            || None,
        ),
    }
    .logged("winner");
    let history = Decoded::from_option(
        serde_json::from_value::<Vec<MoveRecord>>(field("history").clone()).ok(),
        Vec::new,
    )
    .logged("history");
    let last_move = decode_optional(Some(field("last_move")), parse_last_move).logged("last_move");

    let state = decode_state(field("state"));
    // Only the side that just moved can have left a capturable pawn behind.
    let en_passant = match state.en_passant {
        Decoded::Valid(Some(sq))
            if sq.row() != side_to_move.opposite().layout().en_passant_row =>
        {
            Decoded::Defaulted(None)
        }
        decoded => decoded,
    }
    .logged("en_passant");
    let position = Position {
        board,
        side_to_move,
        castling: state.castling.logged("castling_rights"),
        en_passant,
        halfmove_clock: state.halfmove_clock.logged("halfmove_clock"),
        fullmove_number: state.fullmove_number.logged("fullmove_number"),
    };
    let mut position_keys = state.position_keys.logged("position_keys");
    if position_keys.is_empty() {
        position_keys.push(position.position_key());
    }
    let result_reason = state.result_reason.logged("result_reason");
    let (winner, result_reason) = reconcile_result(status, winner, result_reason);

    Game::from_parts(
        position,
        status,
        winner,
        result_reason,
        history,
        last_move,
        position_keys,
    )
}

/// Drops a winner or reason that the status does not allow: an ongoing game
/// has neither, and only checkmate has a winner.
fn reconcile_result(
    status: GameStatus,
    winner: Option<Color>,
    result_reason: Option<String>,
) -> (Option<Color>, Option<String>) {
    let winner = match (status, winner) {
        (GameStatus::Checkmate, winner) => winner,
        (_, Some(stray)) => {
            warn!(status = status.name(), winner = stray.name(), "dropping winner");
            None
        }
        (_, None) => None,
    };
    let result_reason = match (status, result_reason) {
        (GameStatus::Playing, Some(stray)) => {
            warn!(reason = %stray, "dropping result reason of an ongoing game");
            None
        }
        (_, reason) => reason,
    };
    (winner, result_reason)
}

fn parse_last_move(value: &Value) -> Option<LastMove> {
    let name = |key: &str| {
        value
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| Square::from_algebraic(s).is_some())
            .map(str::to_string)
    };
    Some(LastMove {
        from: name("from")?,
        to: name("to")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::PieceKind;
    use serde_json::json;

    #[test]
    fn encode_startpos_board() {
        let grid = encode_board(&Board::startpos());
        assert_eq!(grid.len(), 8);
        assert_eq!(grid[0][4], "bK");
        assert_eq!(grid[7][3], "wQ");
        assert_eq!(grid[6][0], "wP");
        assert_eq!(grid[4][4], EMPTY_CELL);
    }

    #[test]
    fn board_roundtrip() {
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        let board = Position::from_fen(fen).unwrap().board;
        let value = serde_json::to_value(encode_board(&board)).unwrap();
        assert_eq!(decode_board(&value), Decoded::Valid(board));
    }

    #[test]
    fn null_cells_are_empty() {
        let mut grid = serde_json::to_value(encode_board(&Board::EMPTY)).unwrap();
        grid[0][0] = Value::Null;
        grid[7][7] = json!("wK");
        let board = decode_board(&grid).into_inner();
        assert_eq!(board.pieces().count(), 1);
        assert_eq!(
            board.piece_at(Square::H1),
            Some(Piece::new(Color::White, PieceKind::King))
        );
    }

    #[test]
    fn malformed_boards_fall_back_to_startpos() {
        let mut bad_code = serde_json::to_value(encode_board(&Board::EMPTY)).unwrap();
        bad_code[3][3] = json!("xQ");
        let mut bad_type = serde_json::to_value(encode_board(&Board::EMPTY)).unwrap();
        bad_type[3][3] = json!(5);
        let short_row = serde_json::to_value(vec![vec![EMPTY_CELL; 7]; 8]).unwrap();

        for value in [
            bad_code,
            bad_type,
            short_row,
            json!([]),
            json!("board"),
            Value::Null,
        ] {
            assert_eq!(decode_board(&value), Decoded::Defaulted(Board::startpos()));
        }
    }

    #[test]
    fn state_roundtrip() {
        let game = Game::from_fen("r3k2r/8/8/3pP3/8/8/8/R3K2R w Kq d6 4 20").unwrap();
        let value = serde_json::to_value(encode_state(&game)).unwrap();
        let state = decode_state(&value);
        assert_eq!(
            state.castling,
            Decoded::Valid(CastlingRights::from_fen_str("Kq"))
        );
        assert_eq!(
            state.en_passant,
            Decoded::Valid(Square::from_algebraic("d6"))
        );
        assert_eq!(state.halfmove_clock, Decoded::Valid(4));
        assert_eq!(state.fullmove_number, Decoded::Valid(20));
        assert_eq!(
            state.position_keys,
            Decoded::Valid(vec![game.position().position_key()])
        );
        assert_eq!(state.result_reason, Decoded::Valid(None));
    }

    #[test]
    fn malformed_state_fields_default_independently() {
        let value = json!({
            "castling_rights": { "white_kingside": "yes" },
            "en_passant": "z9",
            "halfmove_clock": 1.5,
            "fullmove_number": 0,
            "position_keys": [],
            "result_reason": 7,
        });
        let state = decode_state(&value);
        assert_eq!(state.castling, Decoded::Defaulted(CastlingRights::ALL));
        assert_eq!(state.en_passant, Decoded::Defaulted(None));
        assert_eq!(state.halfmove_clock, Decoded::Defaulted(0));
        assert_eq!(state.fullmove_number, Decoded::Defaulted(1));
        assert_eq!(state.position_keys, Decoded::Defaulted(Vec::new()));
        assert_eq!(state.result_reason, Decoded::Defaulted(None));
    }

    #[test]
    fn clock_values() {
        assert_eq!(decode_count(Some(&json!(12))), Some(12));
        assert_eq!(decode_count(Some(&json!(12.0))), Some(12));
        assert_eq!(decode_count(Some(&json!(-3))), None);
        assert_eq!(decode_count(Some(&json!("12"))), None);
        assert_eq!(decode_count(Some(&json!(1e12))), None);
        assert_eq!(decode_count(None), None);
    }

    #[test]
    fn game_roundtrip() {
        let mut game = Game::new();
        for (from, to) in [("e2", "e4"), ("e7", "e5"), ("g1", "f3")] {
            game = game
                .submit(
                    Square::from_algebraic(from).unwrap(),
                    Square::from_algebraic(to).unwrap(),
                    None,
                )
                .unwrap();
        }
        let value = serde_json::to_value(StoredGame::from(&game)).unwrap();
        assert_eq!(decode_game(&value), game);
    }

    #[test]
    fn stored_names() {
        let value = serde_json::to_value(encode_game(&Game::new())).unwrap();
        assert_eq!(value["turn"], "white");
        assert_eq!(value["status"], "playing");
        assert_eq!(value["winner"], "none");
        assert_eq!(value["last_move"], Value::Null);
        assert_eq!(value["state"]["castling_rights"]["black_queenside"], true);
    }

    #[test]
    fn garbage_record_decodes_to_new_game() {
        for value in [Value::Null, json!(42), json!({}), json!({"board": "x"})] {
            assert_eq!(decode_game(&value), Game::new());
        }
    }

    #[test]
    fn missing_keys_are_derived_from_position() {
        let record = json!({
            "board": encode_board(&Board::startpos()),
            "turn": "black",
            "status": "playing",
            "winner": "none",
            "history": [],
            "last_move": { "from": "e2", "to": "e4" },
            "state": {
                "castling_rights": {
                    "white_kingside": false,
                    "white_queenside": true,
                    "black_kingside": true,
                    "black_queenside": true
                },
                "en_passant": null,
                "halfmove_clock": 3,
                "fullmove_number": 2
            }
        });
        let game = decode_game(&record);
        assert_eq!(game.side_to_move(), Color::Black);
        assert_eq!(game.halfmove_clock(), 3);
        assert_eq!(game.position_keys().len(), 1);
        assert_eq!(
            game.position_keys()[0],
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR b Qkq -"
        );
        assert_eq!(game.last_move().map(|m| m.from.as_str()), Some("e2"));
    }

    #[test]
    fn en_passant_must_sit_behind_the_side_that_just_moved() {
        let board = Board::EMPTY
            .with(Square::E1, Some(Piece::new(Color::White, PieceKind::King)))
            .with(Square::E8, Some(Piece::new(Color::Black, PieceKind::King)))
            .with(
                Square::from_algebraic("d3").unwrap(),
                Some(Piece::new(Color::White, PieceKind::Pawn)),
            )
            .with(
                Square::from_algebraic("e3").unwrap(),
                Some(Piece::new(Color::Black, PieceKind::Pawn)),
            );
        let record = |turn: &str, en_passant: &str| {
            json!({
                "board": encode_board(&board),
                "turn": turn,
                "state": { "en_passant": en_passant },
            })
        };

        // e4 is not a square any double push skips.
        let game = decode_game(&record("white", "e4"));
        assert_eq!(game.en_passant(), None);
        assert_eq!(
            game.legal_destinations(Square::from_algebraic("d3").unwrap()),
            vec!["d4"]
        );
        assert_eq!(
            decode_state(&json!({ "en_passant": "e4" })).en_passant,
            Decoded::Defaulted(None)
        );

        // e3 would be left by a white double push, so black must be to move.
        assert_eq!(decode_game(&record("white", "e3")).en_passant(), None);
        assert_eq!(
            decode_game(&record("black", "e3")).en_passant(),
            Square::from_algebraic("e3")
        );
        assert_eq!(
            decode_game(&record("white", "d6")).en_passant(),
            Square::from_algebraic("d6")
        );
    }

    #[test]
    fn result_fields_follow_status() {
        let game = decode_game(&json!({
            "status": "playing",
            "winner": "black",
            "state": { "result_reason": "checkmate" },
        }));
        assert_eq!(game.status(), GameStatus::Playing);
        assert_eq!(game.winner(), None);
        assert_eq!(game.result_reason(), None);
        assert_eq!(game.status_line(), "White to move");

        let drawn = decode_game(&json!({
            "status": "draw",
            "winner": "white",
            "state": { "result_reason": "fifty-move rule" },
        }));
        assert_eq!(drawn.winner(), None);
        assert_eq!(drawn.result_reason(), Some("fifty-move rule"));

        let mated = decode_game(&json!({
            "status": "checkmate",
            "winner": "black",
            "state": { "result_reason": "checkmate" },
        }));
        assert_eq!(mated.winner(), Some(Color::Black));
        assert_eq!(mated.status_line(), "Checkmate - Black wins");
    }

    #[test]
    fn bad_last_move_and_winner_default() {
        let record = json!({
            "winner": "purple",
            "last_move": { "from": "e2" },
            "status": "resigned",
            "turn": 1,
        });
        let game = decode_game(&record);
        assert_eq!(game.winner(), None);
        assert_eq!(game.last_move(), None);
        assert_eq!(game.status(), GameStatus::Playing);
        assert_eq!(game.side_to_move(), Color::White);
    }
}
