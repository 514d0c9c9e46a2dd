pub mod board;
pub mod evaluation;
pub mod fen;
pub mod movegen;
pub mod rules;
pub mod search;
pub mod session;
pub mod uci;

#[cfg(test)]
mod tests {
    use super::*;
    use board::{Color, PieceKind, Position, Square};
    use movegen::{Move, MoveGenerator};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rules::GameState;
    use search::Search;

    const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    const ENDGAME: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    fn find_move(generator: &MoveGenerator, position: &mut Position, text: &str) -> Move {
        generator
            .legal_moves(position)
            .into_iter()
            .find(|mv| mv.to_string() == text)
            .unwrap_or_else(|| panic!("{text} is not legal in {}", position.to_fen()))
    }

    fn perft(position: &mut Position, generator: &MoveGenerator, depth: u32) -> u64 {
        if depth == 0 {
            return 1;
        }
        let mut nodes = 0;
        for mv in generator.legal_moves(position) {
            let undo = position.make_move(&mv);
            nodes += perft(position, generator, depth - 1);
            position.unmake_move(undo);
        }
        nodes
    }

    #[test]
    fn test_initial_position() {
        let generator = MoveGenerator::new();
        let mut position = Position::new();
        assert_eq!(generator.legal_moves(&mut position).len(), 20);

        let mv = find_move(&generator, &mut position, "e2e4");
        position.make_move(&mv);
        assert_eq!(position.side_to_move, Color::Black);
        assert_eq!(position.en_passant_target, Some(sq("e3")));
        assert_eq!(generator.legal_moves(&mut position).len(), 20);
    }

    #[test]
    fn test_perft_initial_position() {
        let generator = MoveGenerator::new();
        let mut position = Position::new();
        assert_eq!(perft(&mut position, &generator, 1), 20);
        assert_eq!(perft(&mut position, &generator, 2), 400);
        assert_eq!(perft(&mut position, &generator, 3), 8902);
        assert_eq!(position, Position::new());
    }

    #[test]
    fn test_perft_kiwipete() {
        let generator = MoveGenerator::new();
        let mut position = Position::from_fen(KIWIPETE).unwrap();
        assert_eq!(perft(&mut position, &generator, 1), 48);
        assert_eq!(perft(&mut position, &generator, 2), 2039);
    }

    #[test]
    fn test_perft_rook_endgame() {
        let generator = MoveGenerator::new();
        let mut position = Position::from_fen(ENDGAME).unwrap();
        assert_eq!(perft(&mut position, &generator, 1), 14);
        assert_eq!(perft(&mut position, &generator, 2), 191);
        assert_eq!(perft(&mut position, &generator, 3), 2812);
    }

    #[test]
    fn test_en_passant() {
        let generator = MoveGenerator::new();
        let mut position = Position::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 5 10").unwrap();
        let before = position.clone();

        let mv = find_move(&generator, &mut position, "e5d6");
        assert!(mv.is_capture(&position));
        let undo = position.make_move(&mv);

        assert!(position.is_empty(sq("d5")));
        assert_eq!(position.piece_at(sq("d6")).map(|p| p.symbol()), Some('P'));
        assert_eq!(position.pieces(Color::Black).count(), 1);
        assert_eq!(position.halfmove_clock, 0);
        assert_eq!(position.en_passant_target, None);
        assert_eq!(undo.captured().map(|p| p.square), Some(sq("d5")));

        position.unmake_move(undo);
        assert_eq!(position, before);
    }

    #[test]
    fn test_en_passant_expires() {
        let generator = MoveGenerator::new();
        let mut position = Position::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
        let king_step = find_move(&generator, &mut position, "e1e2");
        position.make_move(&king_step);
        let black_step = find_move(&generator, &mut position, "e8e7");
        position.make_move(&black_step);
        assert!(generator
            .legal_moves(&mut position)
            .iter()
            .all(|mv| mv.to != sq("d6") || mv.from != sq("e5")));
    }

    #[test]
    fn test_promotion() {
        let generator = MoveGenerator::new();
        let mut position = Position::from_fen("r3k3/1P6/8/8/8/8/8/4K3 w q - 0 1").unwrap();
        let pawn_moves: Vec<String> = generator
            .legal_moves(&mut position)
            .iter()
            .filter(|mv| mv.from == sq("b7"))
            .map(|mv| mv.to_string())
            .collect();
        assert_eq!(
            pawn_moves,
            vec!["b7b8n", "b7b8b", "b7b8r", "b7b8q", "b7a8n", "b7a8b", "b7a8r", "b7a8q"]
        );

        let mv = find_move(&generator, &mut position, "b7a8q");
        position.make_move(&mv);
        assert_eq!(position.piece_at(sq("a8")).map(|p| p.kind), Some(PieceKind::Queen));
        // Capturing the unmoved rook also takes away Black's queenside castling.
        assert!(position.castling_rights.is_empty());
    }

    #[test]
    fn test_undo_restores_every_move() {
        let generator = MoveGenerator::new();
        for fen in [
            fen::DEFAULT_FEN,
            KIWIPETE,
            ENDGAME,
            "r3k3/1P6/8/8/8/8/8/4K3 w q - 0 1",
            "4k3/8/8/3pP3/8/8/8/4K3 w - d6 5 10",
            "r3k2r/8/8/8/8/8/8/R3K2R b KQkq - 3 20",
        ] {
            let mut position = Position::from_fen(fen).unwrap();
            let before = position.clone();
            for mv in generator.legal_moves(&mut position) {
                let undo = position.make_move(&mv);
                position.unmake_move(undo);
                assert_eq!(position, before, "{fen}: {mv}");
            }
        }
    }

    #[test]
    fn test_castling_moves_both_pieces() {
        let generator = MoveGenerator::new();
        let mut position = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R b KQkq - 3 20").unwrap();
        let mv = find_move(&generator, &mut position, "e8c8");
        position.make_move(&mv);
        assert_eq!(
            position.to_fen(),
            "2kr3r/8/8/8/8/8/8/R3K2R w KQ - 4 21"
        );
    }

    #[test]
    fn test_random_playouts_stay_consistent() {
        let generator = MoveGenerator::new();
        for seed in 0..4 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut position = Position::new();
            let start = position.clone();
            let mut history = Vec::new();

            for _ in 0..80 {
                let moves = generator.legal_moves(&mut position);
                if moves.is_empty() {
                    break;
                }
                let snapshot = position.clone();
                for mv in &moves {
                    let undo = position.make_move(mv);
                    assert!(!generator.is_king_in_check(&position, snapshot.side_to_move));
                    position.unmake_move(undo);
                    assert_eq!(position, snapshot);
                }

                let fen = position.to_fen();
                assert_eq!(Position::from_fen(&fen).unwrap().to_fen(), fen);

                let mv = moves[rng.gen_range(0..moves.len())];
                history.push(position.make_move(&mv));
            }

            while let Some(undo) = history.pop() {
                position.unmake_move(undo);
            }
            assert_eq!(position, start, "seed {seed}");
        }
    }

    #[test]
    fn test_search_survives_maximal_counters() {
        for fen in [
            "4k3/8/8/8/8/8/8/4K3 w - - 4294967295 1",
            "4k3/8/8/8/8/8/8/4K3 b - - 0 4294967295",
        ] {
            let mut position = Position::from_fen(fen).unwrap();
            let before = position.clone();
            let mut search = Search::new();
            search.set_max_depth(2);
            assert!(search.find_best_move(&mut position).is_ok(), "{fen}");
            assert_eq!(position, before);
        }
    }

    #[test]
    fn test_bare_kings() {
        let generator = MoveGenerator::new();
        let mut position = Position::from_fen("8/8/8/8/8/8/8/K6k w - - 0 1").unwrap();
        assert_eq!(generator.legal_moves(&mut position).len(), 3);
        assert_eq!(
            generator.game_state(&mut position),
            GameState::InsufficientMaterial
        );

        let mut search = Search::new();
        search.set_max_depth(2);
        let result = search.find_best_move(&mut position).unwrap();
        assert_eq!(result.best_move.from, sq("a1"));
    }
}
