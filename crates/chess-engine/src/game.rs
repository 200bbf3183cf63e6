//! Immutable game snapshots.
//!
//! A [`Game`] is one frozen moment of a game: the [`Position`], the result
//! so far, the move log and the log of every position key reached. Nothing
//! mutates a `Game`; [`Game::submit`] returns the next snapshot and leaves
//! the receiver as it was, so earlier snapshots stay valid for history views.

use crate::movegen::{captured_piece, is_king_attacked};
use crate::rules::{GameResult, GameStatus, RuleSet, StandardChess};
use crate::{CastlingRights, Position};
use chess_core::{CastleSide, Color, FenError, Move, MoveRequest, PieceKind, Square};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// One applied move, as kept in the game log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// Origin square name.
    pub from: String,
    /// Destination square name.
    pub to: String,
    /// Side that moved.
    pub color: Color,
    /// Code of the moving piece ("wP").
    pub piece: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PieceKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub castle: Option<CastleSide>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub en_passant: bool,
}

/// Origin and destination of the most recent move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastMove {
    pub from: String,
    pub to: String,
}

/// Reasons a move submission is turned down.
///
/// A rejected submission never produces a new snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("game has already ended")]
    GameOver,

    #[error("no piece on {0}")]
    EmptySquare(Square),

    #[error("the piece on {square} belongs to {color}, who is not to move")]
    WrongTurn { square: Square, color: Color },

    #[error("illegal move: {from}{to}")]
    IllegalMove { from: Square, to: Square },

    #[error("move {from}{to} needs a promotion choice")]
    PromotionRequired { from: Square, to: Square },
}

/// An immutable game snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    position: Position,
    status: GameStatus,
    winner: Option<Color>,
    result_reason: Option<String>,
    history: Vec<MoveRecord>,
    last_move: Option<LastMove>,
    position_keys: Vec<String>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// Creates a new game with the standard starting position.
    pub fn new() -> Self {
        let position = StandardChess.initial_position();
        Game {
            position_keys: vec![position.position_key()],
            position,
            status: GameStatus::Playing,
            winner: None,
            result_reason: None,
            history: Vec::new(),
            last_move: None,
        }
    }

    /// Creates a game from a custom starting position.
    ///
    /// The position is evaluated straight away, so a mated or stalemated
    /// position yields a finished game.
    pub fn from_position(position: Position) -> Self {
        let position_keys = vec![position.position_key()];
        let mut game = Game {
            position,
            status: GameStatus::Playing,
            winner: None,
            result_reason: None,
            history: Vec::new(),
            last_move: None,
            position_keys,
        };
        if let Some(result) = StandardChess.game_result(&game.position, &game.position_keys) {
            game.record_result(result);
        }
        game
    }

    /// Creates a game from a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        Ok(Self::from_position(Position::from_fen(fen)?))
    }

    /// Reassembles a snapshot from stored parts without re-evaluating it.
    pub(crate) fn from_parts(
        position: Position,
        status: GameStatus,
        winner: Option<Color>,
        result_reason: Option<String>,
        history: Vec<MoveRecord>,
        last_move: Option<LastMove>,
        position_keys: Vec<String>,
    ) -> Self {
        Game {
            position,
            status,
            winner,
            result_reason,
            history,
            last_move,
            position_keys,
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn side_to_move(&self) -> Color {
        self.position.side_to_move
    }

    pub fn castling(&self) -> CastlingRights {
        self.position.castling
    }

    pub fn en_passant(&self) -> Option<Square> {
        self.position.en_passant
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.position.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.position.fullmove_number
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn winner(&self) -> Option<Color> {
        self.winner
    }

    /// Why the game ended; `None` while it is still being played.
    pub fn result_reason(&self) -> Option<&str> {
        self.result_reason.as_deref()
    }

    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    pub fn last_move(&self) -> Option<&LastMove> {
        self.last_move.as_ref()
    }

    /// Keys of every position reached, the initial one included.
    pub fn position_keys(&self) -> &[String] {
        &self.position_keys
    }

    pub fn is_game_over(&self) -> bool {
        self.status.is_terminal()
    }

    /// Returns true if the side to move is in check.
    pub fn is_check(&self) -> bool {
        StandardChess.is_check(&self.position)
    }

    /// All legal moves of the side to move.
    pub fn legal_moves(&self) -> Vec<Move> {
        if self.is_game_over() {
            return Vec::new();
        }
        StandardChess.generate_moves(&self.position)
    }

    /// Legal moves from `from`. Empty when the game is over or the square
    /// does not hold a piece of the side to move.
    ///
    /// Generated from the position on every call; nothing is cached.
    pub fn legal_moves_from(&self, from: Square) -> Vec<Move> {
        let movable = self
            .position
            .board
            .piece_at(from)
            .is_some_and(|p| p.color == self.position.side_to_move);
        if self.is_game_over() || !movable {
            return Vec::new();
        }
        StandardChess.legal_moves_for_square(&self.position, from)
    }

    /// Names of the squares the piece on `from` may move to, without
    /// duplicates and in generation order. Regenerates the moves of `from`
    /// on each call, as does [`Game::needs_promotion_choice`].
    pub fn legal_destinations(&self, from: Square) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for m in self.legal_moves_from(from) {
            let name = m.to().to_algebraic();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Returns true if moving `from` to `to` is a legal promotion, so the
    /// caller has to pick the new piece before submitting.
    pub fn needs_promotion_choice(&self, from: Square, to: Square) -> bool {
        self.legal_moves_from(from)
            .iter()
            .any(|m| m.to() == to && m.flag().is_promotion())
    }

    /// Number of times the current position has been reached.
    pub fn position_count(&self) -> usize {
        let key = self.position.position_key();
        self.position_keys.iter().filter(|k| **k == key).count()
    }

    /// One-line human readable status.
    pub fn status_line(&self) -> String {
        match self.status {
            GameStatus::Playing => {
                let side = self.position.side_to_move;
                if self.is_check() {
                    format!("{} to move (check)", side)
                } else {
                    format!("{} to move", side)
                }
            }
            GameStatus::Checkmate => match self.winner {
                Some(winner) => format!("Checkmate - {} wins", winner),
                None => "Checkmate".to_string(),
            },
            GameStatus::Stalemate => "Draw - stalemate".to_string(),
            GameStatus::Draw => match &self.result_reason {
                Some(reason) => format!("Draw - {}", reason),
                None => "Draw".to_string(),
            },
        }
    }

    /// Submits a parsed move request.
    pub fn submit_request(&self, request: MoveRequest) -> Result<Game, GameError> {
        self.submit(request.from, request.to, request.promotion)
    }

    /// Submits a move and returns the resulting snapshot.
    ///
    /// When several legal moves share the destination (a promotion) the
    /// caller must name the piece; a supplied promotion has to match one of
    /// the candidates.
    pub fn submit(
        &self,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    ) -> Result<Game, GameError> {
        let result = self.try_submit(from, to, promotion);
        if let Err(err) = &result {
            debug!(%from, %to, ?promotion, %err, "move rejected");
        }
        result
    }

    fn try_submit(
        &self,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    ) -> Result<Game, GameError> {
        if self.is_game_over() {
            return Err(GameError::GameOver);
        }
        let piece = self
            .position
            .board
            .piece_at(from)
            .ok_or(GameError::EmptySquare(from))?;
        if piece.color != self.position.side_to_move {
            return Err(GameError::WrongTurn {
                square: from,
                color: piece.color,
            });
        }

        let candidates = StandardChess.legal_moves_for_square(&self.position, from);
        let m = resolve_candidate(&candidates, from, to, promotion)?;

        let next = self.apply(m);
        if is_king_attacked(&next.position.board, piece.color) {
            return Err(GameError::IllegalMove { from, to });
        }
        Ok(next)
    }

    /// Builds the snapshot that follows a legal move.
    fn apply(&self, m: Move) -> Game {
        let (from, to) = (m.from(), m.to());
        let record = self.position.board.piece_at(from).map(|piece| MoveRecord {
            from: from.to_algebraic(),
            to: to.to_algebraic(),
            color: piece.color,
            piece: piece.code(),
            captured: captured_piece(&self.position, m).map(|p| p.code()),
            promotion: m.flag().promotion_piece(),
            castle: m.flag().castle_side(),
            en_passant: m.flag().is_en_passant(),
        });

        let position = StandardChess.make_move(&self.position, m);
        let mut next = self.clone();
        next.position = position;
        next.history.extend(record);
        next.last_move = Some(LastMove {
            from: from.to_algebraic(),
            to: to.to_algebraic(),
        });
        next.position_keys.push(position.position_key());

        if let Some(result) = StandardChess.game_result(&next.position, &next.position_keys) {
            next.record_result(result);
            info!(
                status = next.status.name(),
                reason = %result.reason(),
                plies = next.history.len(),
                "game finished"
            );
        }
        next
    }

    fn record_result(&mut self, result: GameResult) {
        self.status = result.status();
        self.winner = result.winner();
        self.result_reason = Some(result.reason());
    }
}

/// Picks the legal move a request refers to.
fn resolve_candidate(
    candidates: &[Move],
    from: Square,
    to: Square,
    promotion: Option<PieceKind>,
) -> Result<Move, GameError> {
    let matching: Vec<Move> = candidates.iter().copied().filter(|m| m.to() == to).collect();
    match (promotion, matching.as_slice()) {
        (_, []) => Err(GameError::IllegalMove { from, to }),
        (Some(kind), _) => matching
            .iter()
            .copied()
            .find(|m| m.flag().promotion_piece() == Some(kind))
            .ok_or(GameError::IllegalMove { from, to }),
        (None, [only]) => Ok(*only),
        (None, _) => Err(GameError::PromotionRequired { from, to }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::{MoveFlag, Piece};

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    fn play(game: &Game, moves: &[&str]) -> Game {
        moves.iter().fold(game.clone(), |g, text| {
            let request = MoveRequest::parse(text).unwrap();
            g.submit_request(request)
                .unwrap_or_else(|e| panic!("{} rejected: {}", text, e))
        })
    }

    #[test]
    fn new_game() {
        let game = Game::new();
        assert_eq!(game.status(), GameStatus::Playing);
        assert_eq!(game.winner(), None);
        assert_eq!(game.result_reason(), None);
        assert_eq!(game.position_keys().len(), 1);
        assert_eq!(game.fullmove_number(), 1);
        assert_eq!(game.halfmove_clock(), 0);
        assert_eq!(game.castling(), CastlingRights::ALL);
        assert_eq!(game.en_passant(), None);
        assert_eq!(game.legal_moves().len(), 20);
        assert_eq!(game.status_line(), "White to move");
    }

    #[test]
    fn submit_leaves_receiver_untouched() {
        let game = Game::new();
        let next = game.submit(sq("e2"), sq("e4"), None).unwrap();
        assert_eq!(game, Game::new());
        assert_eq!(next.side_to_move(), Color::Black);
        assert_eq!(next.en_passant(), Some(sq("e3")));
        assert_eq!(next.position_keys().len(), 2);
        assert_eq!(
            next.last_move(),
            Some(&LastMove {
                from: "e2".to_string(),
                to: "e4".to_string()
            })
        );
        assert_eq!(next.history()[0].piece, "wP");
        assert_eq!(next.history()[0].color, Color::White);
    }

    #[test]
    fn rejections() {
        let game = Game::new();
        assert_eq!(
            game.submit(sq("e4"), sq("e5"), None),
            Err(GameError::EmptySquare(sq("e4")))
        );
        assert_eq!(
            game.submit(sq("e7"), sq("e5"), None),
            Err(GameError::WrongTurn {
                square: sq("e7"),
                color: Color::Black
            })
        );
        assert_eq!(
            game.submit(sq("e2"), sq("e5"), None),
            Err(GameError::IllegalMove {
                from: sq("e2"),
                to: sq("e5")
            })
        );
        // A promotion piece on a plain move does not match any candidate.
        assert!(matches!(
            game.submit(sq("e2"), sq("e4"), Some(PieceKind::Queen)),
            Err(GameError::IllegalMove { .. })
        ));
    }

    #[test]
    fn promotion_needs_choice() {
        let game = Game::from_fen("8/P7/8/8/8/8/8/4K2k w - - 0 1").unwrap();
        assert!(game.needs_promotion_choice(sq("a7"), sq("a8")));
        assert!(!game.needs_promotion_choice(sq("e1"), sq("e2")));
        assert_eq!(
            game.submit(sq("a7"), sq("a8"), None),
            Err(GameError::PromotionRequired {
                from: sq("a7"),
                to: sq("a8")
            })
        );

        let next = game
            .submit(sq("a7"), sq("a8"), Some(PieceKind::Rook))
            .unwrap();
        assert_eq!(
            next.position().board.piece_at(sq("a8")),
            Some(Piece::new(Color::White, PieceKind::Rook))
        );
        assert_eq!(next.history()[0].promotion, Some(PieceKind::Rook));
        assert!(matches!(
            game.submit(sq("a7"), sq("a8"), Some(PieceKind::King)),
            Err(GameError::IllegalMove { .. })
        ));
    }

    #[test]
    fn legal_destinations_for_knight() {
        let game = Game::new();
        assert_eq!(game.legal_destinations(sq("g1")), vec!["f3", "h3"]);
        assert!(game.legal_destinations(sq("g8")).is_empty());
        assert!(game.legal_destinations(sq("e4")).is_empty());
    }

    #[test]
    fn destinations_collapse_promotions() {
        let game = Game::from_fen("8/P7/8/8/8/8/8/4K2k w - - 0 1").unwrap();
        assert_eq!(game.legal_destinations(sq("a7")), vec!["a8"]);
        assert_eq!(game.legal_moves_from(sq("a7")).len(), 4);
    }

    #[test]
    fn fools_mate() {
        let game = play(&Game::new(), &["f2f3", "e7e5", "g2g4", "d8h4"]);
        assert_eq!(game.status(), GameStatus::Checkmate);
        assert_eq!(game.winner(), Some(Color::Black));
        assert_eq!(game.result_reason(), Some("checkmate"));
        assert_eq!(game.status_line(), "Checkmate - Black wins");
        assert!(game.legal_moves().is_empty());
        assert_eq!(
            game.submit(sq("a2"), sq("a3"), None),
            Err(GameError::GameOver)
        );
    }

    #[test]
    fn check_shows_in_status_line() {
        let game = play(&Game::new(), &["e2e4", "f7f6", "d1h5"]);
        assert!(game.is_check());
        assert_eq!(game.status_line(), "Black to move (check)");
    }

    #[test]
    fn stalemate_by_move() {
        let game = Game::from_fen("7k/8/5QK1/8/8/8/8/8 w - - 0 1").unwrap();
        let next = game.submit(sq("f6"), sq("f7"), None).unwrap();
        assert_eq!(next.status(), GameStatus::Stalemate);
        assert_eq!(next.winner(), None);
        assert_eq!(next.status_line(), "Draw - stalemate");
    }

    #[test]
    fn stalemate_from_position() {
        let game = Game::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(game.status(), GameStatus::Stalemate);
    }

    #[test]
    fn castling_through_submit() {
        let game = Game::from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1").unwrap();
        let next = game.submit(Square::E1, Square::G1, None).unwrap();
        let record = &next.history()[0];
        assert_eq!(record.castle, Some(CastleSide::Kingside));
        assert_eq!(
            next.position().board.piece_at(Square::F1),
            Some(Piece::new(Color::White, PieceKind::Rook))
        );
        assert!(!next.castling().allows(Color::White, CastleSide::Queenside));
    }

    #[test]
    fn en_passant_through_submit() {
        let game = play(&Game::new(), &["e2e4", "a7a6", "e4e5", "d7d5"]);
        assert_eq!(game.en_passant(), Some(sq("d6")));
        let next = game.submit(sq("e5"), sq("d6"), None).unwrap();
        let record = next.history().last().unwrap();
        assert!(record.en_passant);
        assert_eq!(record.captured.as_deref(), Some("bP"));
        assert_eq!(next.position().board.piece_at(sq("d5")), None);
    }

    #[test]
    fn resolve_candidate_rules() {
        let from = sq("a7");
        let to = sq("a8");
        let promos: Vec<Move> = PieceKind::PROMOTIONS
            .iter()
            .map(|k| Move::new(from, to, MoveFlag::Promotion(*k)))
            .collect();
        assert_eq!(
            resolve_candidate(&promos, from, to, Some(PieceKind::Bishop)),
            Ok(Move::new(from, to, MoveFlag::Promotion(PieceKind::Bishop)))
        );
        assert_eq!(
            resolve_candidate(&promos, from, to, None),
            Err(GameError::PromotionRequired { from, to })
        );
        assert_eq!(
            resolve_candidate(&[], from, to, None),
            Err(GameError::IllegalMove { from, to })
        );
    }

    #[test]
    fn error_messages() {
        let err = GameError::IllegalMove {
            from: sq("e2"),
            to: sq("e5"),
        };
        assert_eq!(err.to_string(), "illegal move: e2e5");
        assert_eq!(GameError::GameOver.to_string(), "game has already ended");
    }
}
