use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

use crate::board::{Color, Position};
use crate::evaluation::Evaluator;
use crate::movegen::{Move, MoveGenerator};
use crate::rules::GameState;

/// Plies searched per decision unless configured otherwise.
pub const DEFAULT_DEPTH: u32 = 3;

/// Score of a mate found with no plies to spare; sooner mates score higher.
pub const MATE_SCORE: i32 = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("{side:?} has no legal moves ({state:?})")]
    NoLegalMoves { side: Color, state: GameState },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchResult {
    pub best_move: Move,
    /// From the point of view of the side that was to move.
    pub score: i32,
    pub nodes: u64,
}

/// Fixed-depth minimax without pruning; cost grows as branching factor ^ depth.
pub struct Search {
    evaluator: Evaluator,
    move_generator: MoveGenerator,
    max_depth: u32,
    nodes_searched: u64,
}

impl Search {
    pub fn new() -> Self {
        Self {
            evaluator: Evaluator::new(),
            move_generator: MoveGenerator::new(),
            max_depth: DEFAULT_DEPTH,
            nodes_searched: 0,
        }
    }

    /// Picks a move for the side to move. The position is mutated during the
    /// search and handed back unchanged.
    ///
    /// Equal scores keep the move generated first.
    pub fn find_best_move(&mut self, position: &mut Position) -> Result<SearchResult, SearchError> {
        self.nodes_searched = 0;
        let start = Instant::now();
        let perspective = position.side_to_move;
        let depth = self.max_depth.max(1);

        let mut moves = self.move_generator.legal_moves(position).into_iter();
        let Some(first) = moves.next() else {
            let state = self.move_generator.game_state(position);
            return Err(SearchError::NoLegalMoves {
                side: perspective,
                state,
            });
        };

        let mut best_move = first;
        let mut best_score = self.score_root_move(position, &first, depth, perspective);
        for mv in moves {
            let score = self.score_root_move(position, &mv, depth, perspective);
            if score > best_score {
                best_score = score;
                best_move = mv;
            }
        }

        info!(
            best = %best_move,
            score = best_score,
            nodes = self.nodes_searched,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "search complete"
        );

        Ok(SearchResult {
            best_move,
            score: best_score,
            nodes: self.nodes_searched,
        })
    }

    fn score_root_move(
        &mut self,
        position: &mut Position,
        mv: &Move,
        depth: u32,
        perspective: Color,
    ) -> i32 {
        let undo = position.make_move(mv);
        let score = self.minimax(position, depth - 1, false, perspective);
        position.unmake_move(undo);
        debug!(candidate = %mv, score, "root move scored");
        score
    }

    /// Minimax value of `position` for `perspective`, looking `depth` plies ahead.
    /// `maximizing` is true when `perspective` is the side to move.
    pub fn minimax(
        &mut self,
        position: &mut Position,
        depth: u32,
        maximizing: bool,
        perspective: Color,
    ) -> i32 {
        self.nodes_searched += 1;

        if depth == 0 {
            return self.evaluator.evaluate_for(position, perspective);
        }

        let moves = self.move_generator.legal_moves(position);
        if moves.is_empty() {
            return self.terminal_score(position, depth, perspective);
        }

        let mut best = if maximizing { i32::MIN } else { i32::MAX };
        for mv in moves {
            let undo = position.make_move(&mv);
            let score = self.minimax(position, depth - 1, !maximizing, perspective);
            position.unmake_move(undo);

            best = if maximizing {
                best.max(score)
            } else {
                best.min(score)
            };
        }
        best
    }

    fn terminal_score(&self, position: &Position, depth: u32, perspective: Color) -> i32 {
        let side = position.side_to_move;
        if !self.move_generator.is_king_in_check(position, side) {
            return 0;
        }
        let mate = MATE_SCORE + depth as i32;
        if side == perspective {
            -mate
        } else {
            mate
        }
    }

    pub fn set_max_depth(&mut self, depth: u32) {
        self.max_depth = depth;
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn get_nodes_searched(&self) -> u64 {
        self.nodes_searched
    }
}

impl Default for Search {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Square;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    fn search(depth: u32) -> Search {
        let mut search = Search::new();
        search.set_max_depth(depth);
        search
    }

    #[test]
    fn test_depth_one_prefers_capture() {
        let mut position = Position::from_fen("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1").unwrap();
        let before = position.clone();
        let result = search(1).find_best_move(&mut position).unwrap();
        assert_eq!(result.best_move.from, sq("e4"));
        assert_eq!(result.best_move.to, sq("d5"));
        assert_eq!(position, before);
    }

    #[test]
    fn test_black_also_takes_material() {
        let mut position = Position::from_fen("4k3/8/8/3q4/8/8/3R4/4K3 b - - 0 1").unwrap();
        let result = search(1).find_best_move(&mut position).unwrap();
        assert_eq!(result.best_move.to, sq("d2"));
        assert!(result.score > 0);
    }

    #[test]
    fn test_finds_mate_in_one() {
        // Back-rank mate: Ra1-a8.
        let mut position = Position::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
        let result = search(2).find_best_move(&mut position).unwrap();
        assert_eq!(result.best_move.to, sq("a8"));
        assert!(result.score >= MATE_SCORE);
    }

    #[test]
    fn test_avoids_losing_the_queen() {
        // Taking the defended pawn on d5 loses the queen; depth 2 sees the recapture.
        let mut position =
            Position::from_fen("4k3/8/2p5/3p4/8/8/3Q4/4K3 w - - 0 1").unwrap();
        let result = search(2).find_best_move(&mut position).unwrap();
        assert_ne!(result.best_move.to, sq("d5"));
    }

    #[test]
    fn test_ties_keep_first_generated_move() {
        // Several king steps share the best score; the earliest one must win.
        let mut position = Position::from_fen("8/8/8/8/8/8/8/K6k w - - 0 1").unwrap();
        let mut search = search(1);
        let result = search.find_best_move(&mut position).unwrap();

        let generator = MoveGenerator::new();
        let evaluator = Evaluator::new();
        let first_best = generator
            .legal_moves(&mut position)
            .into_iter()
            .map(|mv| {
                let undo = position.make_move(&mv);
                let score = evaluator.evaluate_for(&position, Color::White);
                position.unmake_move(undo);
                (mv, score)
            })
            .fold(None::<(Move, i32)>, |best, (mv, score)| match best {
                Some((_, best_score)) if score <= best_score => best,
                _ => Some((mv, score)),
            });
        assert_eq!(Some(result.best_move), first_best.map(|(mv, _)| mv));
    }

    #[test]
    fn test_no_legal_moves_is_reported() {
        let mut mated =
            Position::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
                .unwrap();
        assert_eq!(
            search(3).find_best_move(&mut mated),
            Err(SearchError::NoLegalMoves {
                side: Color::White,
                state: GameState::Checkmate {
                    winner: Color::Black
                },
            })
        );

        let mut stalemate = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert!(matches!(
            search(3).find_best_move(&mut stalemate),
            Err(SearchError::NoLegalMoves {
                state: GameState::Stalemate,
                ..
            })
        ));
    }

    #[test]
    fn test_search_restores_position_and_counts_nodes() {
        let mut position = Position::new();
        let before = position.clone();
        let mut search = search(2);
        let result = search.find_best_move(&mut position).unwrap();
        assert_eq!(position, before);
        // 20 root children, each with 20 replies.
        assert_eq!(result.nodes, 20 + 400);
        assert_eq!(search.get_nodes_searched(), result.nodes);
    }
}
