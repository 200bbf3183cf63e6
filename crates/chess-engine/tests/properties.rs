//! Property tests: random playouts and stored-board decoding.

use chess_core::{Color, Piece, PieceKind, Square};
use chess_engine::{
    decode_board, encode_board, is_king_attacked, Board, Decoded, Game, GameError, GameStatus,
};
use proptest::prelude::*;
use proptest::sample::Index;

fn arb_board() -> impl Strategy<Value = Board> {
    prop::collection::vec(prop::option::of((0..2usize, 0..6usize)), 64).prop_map(|cells| {
        let mut rows = [[None; 8]; 8];
        for (i, cell) in cells.into_iter().enumerate() {
            rows[i / 8][i % 8] =
                cell.map(|(color, kind)| Piece::new(Color::ALL[color], PieceKind::ALL[kind]));
        }
        Board::from_rows(rows)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_playouts_keep_invariants(picks in prop::collection::vec(any::<Index>(), 1..80)) {
        let mut game = Game::new();
        for pick in picks {
            if game.is_game_over() {
                break;
            }
            let moves = game.legal_moves();
            prop_assert!(!moves.is_empty());
            let m = *pick.get(&moves);
            let mover = game.side_to_move();
            let before = game.clone();

            let next = game
                .submit(m.from(), m.to(), m.flag().promotion_piece())
                .unwrap();

            prop_assert_eq!(&game, &before);
            prop_assert!(!is_king_attacked(&next.position().board, mover));
            prop_assert_eq!(next.side_to_move(), mover.opposite());
            prop_assert_eq!(next.position_keys().len(), next.history().len() + 1);
            let key = next.position().position_key();
            prop_assert_eq!(next.position_keys().last(), Some(&key));
            if next.status() == GameStatus::Checkmate {
                prop_assert!(next.is_check());
                prop_assert_eq!(next.winner(), Some(mover));
            }
            game = next;
        }
    }

    #[test]
    fn unlisted_moves_are_rejected(from in 0u8..64, to in 0u8..64) {
        let game = Game::new();
        let from = Square::from_index(from).unwrap();
        let to = Square::from_index(to).unwrap();
        let listed = game
            .legal_moves()
            .iter()
            .any(|m| m.from() == from && m.to() == to);
        let result = game.submit(from, to, None);
        prop_assert_eq!(result.is_ok(), listed);
        if let Err(err) = result {
            prop_assert!(!matches!(err, GameError::GameOver));
        }
    }

    #[test]
    fn board_grid_roundtrip(board in arb_board()) {
        let value = serde_json::to_value(encode_board(&board)).unwrap();
        prop_assert_eq!(decode_board(&value), Decoded::Valid(board));
    }

    #[test]
    fn wrong_row_count_decodes_to_startpos(rows in (0usize..12).prop_filter("not 8", |n| *n != 8)) {
        let grid = vec![vec![String::new(); 8]; rows];
        let value = serde_json::to_value(grid).unwrap();
        prop_assert_eq!(decode_board(&value), Decoded::Defaulted(Board::startpos()));
    }

    #[test]
    fn wrong_row_length_decodes_to_startpos(
        row in 0usize..8,
        len in (0usize..12).prop_filter("not 8", |n| *n != 8),
    ) {
        let mut grid = vec![vec![String::new(); 8]; 8];
        grid[row] = vec![String::new(); len];
        let value = serde_json::to_value(grid).unwrap();
        prop_assert_eq!(decode_board(&value), Decoded::Defaulted(Board::startpos()));
    }
}
