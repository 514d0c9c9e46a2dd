//! Check detection, the legality filter and game-state classification.

use tracing::trace;

use crate::board::{Color, PieceId, PieceKind, Position};
use crate::movegen::{Move, MoveGenerator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Ongoing,
    Checkmate { winner: Color },
    Stalemate,
    FiftyMoveRule,
    InsufficientMaterial,
}

impl GameState {
    pub fn is_over(&self) -> bool {
        *self != GameState::Ongoing
    }
}

impl MoveGenerator {
    /// True iff some enemy piece has a pseudo-legal move onto `color`'s king.
    pub fn is_king_in_check(&self, position: &Position, color: Color) -> bool {
        let Some(king) = position.king_square(color) else {
            return false;
        };
        position
            .pieces(color.opposite())
            .any(|piece| self.reaches(position, piece, king))
    }

    /// Tries `mv` on the position and reports whether the mover's king survives.
    /// The position is restored before returning.
    pub fn is_legal(&self, position: &mut Position, mv: &Move) -> bool {
        let Some(color) = position.piece(mv.piece).map(|piece| piece.color()) else {
            return false;
        };

        if mv.is_castling() {
            if self.is_king_in_check(position, color) {
                trace!(%mv, "castling out of check rejected");
                return false;
            }
            let step = if mv.to.file() > mv.from.file() { 1 } else { -1 };
            if let Some(transit) = mv.from.offset(step, 0) {
                let undo = position.make_move(&Move::new(mv.piece, mv.from, transit));
                let crossed_attack = self.is_king_in_check(position, color);
                position.unmake_move(undo);
                if crossed_attack {
                    trace!(%mv, "castling through an attacked square rejected");
                    return false;
                }
            }
        }

        let undo = position.make_move(mv);
        let exposed = self.is_king_in_check(position, color);
        position.unmake_move(undo);
        if exposed {
            trace!(%mv, "move leaves own king in check");
        }
        !exposed
    }

    pub fn legal_moves_for_piece(&self, position: &mut Position, id: PieceId) -> Vec<Move> {
        self.pseudo_legal_moves(position, id)
            .into_iter()
            .filter(|mv| self.is_legal(position, mv))
            .collect()
    }

    /// Legal moves for the side to move, in registry order.
    pub fn legal_moves(&self, position: &mut Position) -> Vec<Move> {
        let mut moves = Vec::new();
        for id in position.piece_ids(position.side_to_move) {
            moves.extend(self.legal_moves_for_piece(position, id));
        }
        moves
    }

    pub fn game_state(&self, position: &mut Position) -> GameState {
        let side = position.side_to_move;
        if self.legal_moves(position).is_empty() {
            return if self.is_king_in_check(position, side) {
                GameState::Checkmate {
                    winner: side.opposite(),
                }
            } else {
                GameState::Stalemate
            };
        }

        if position.halfmove_clock >= 100 {
            return GameState::FiftyMoveRule;
        }

        if self.is_insufficient_material(position) {
            return GameState::InsufficientMaterial;
        }

        GameState::Ongoing
    }

    fn is_insufficient_material(&self, position: &Position) -> bool {
        let mut minors = Vec::new();
        for color in [Color::White, Color::Black] {
            for piece in position.pieces(color) {
                match piece.kind {
                    PieceKind::King => {}
                    PieceKind::Knight | PieceKind::Bishop => minors.push(piece),
                    PieceKind::Pawn | PieceKind::Rook | PieceKind::Queen => return false,
                }
            }
        }

        match minors.as_slice() {
            [] | [_] => true,
            [a, b] => {
                // Opposing bishops on the same square colour cannot force mate.
                a.kind == PieceKind::Bishop
                    && b.kind == PieceKind::Bishop
                    && a.color() != b.color()
                    && a.square.is_light() == b.square.is_light()
            }
            _ => false,
        }
    }
}
