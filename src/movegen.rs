use std::fmt;

use crate::board::{CastlingSide, Color, Piece, PieceId, PieceKind, Position, Square};

const DIAGONALS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const ORTHOGONALS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const KNIGHT_JUMPS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];
const KING_STEPS: [(i8, i8); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

/// The rook half of a castling move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CastlingRook {
    pub rook: PieceId,
    pub from: Square,
    pub to: Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub piece: PieceId,
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
    /// Square skipped by a double pawn step.
    pub en_passant_target: Option<Square>,
    pub castling: Option<CastlingRook>,
}

impl Move {
    pub fn new(piece: PieceId, from: Square, to: Square) -> Self {
        Self {
            piece,
            from,
            to,
            promotion: None,
            en_passant_target: None,
            castling: None,
        }
    }

    pub fn with_promotion(self, kind: PieceKind) -> Self {
        Self {
            promotion: Some(kind),
            ..self
        }
    }

    pub fn is_castling(&self) -> bool {
        self.castling.is_some()
    }

    pub fn is_capture(&self, position: &Position) -> bool {
        if position.piece_at(self.to).is_some() {
            return true;
        }
        let is_pawn = position
            .piece(self.piece)
            .is_some_and(|piece| piece.kind == PieceKind::Pawn);
        is_pawn && position.en_passant_target == Some(self.to)
    }
}

/// Long algebraic form: `e2e4`, `e7e8q`, castles as the king's move.
impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.symbol(Color::Black))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MoveGenerator;

impl MoveGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Moves obeying the piece's movement rules, without regard to the mover's king.
    pub fn pseudo_legal_moves(&self, position: &Position, id: PieceId) -> Vec<Move> {
        let mut moves = Vec::new();
        if let Some(piece) = position.piece(id) {
            self.generate(position, piece, true, &mut moves);
        }
        moves
    }

    pub fn pseudo_legal_moves_for(&self, position: &Position, color: Color) -> Vec<Move> {
        let mut moves = Vec::new();
        for piece in position.pieces(color) {
            self.generate(position, piece, true, &mut moves);
        }
        moves
    }

    /// Whether any pseudo-legal move of `piece` lands on `target`.
    ///
    /// Castling never lands on an occupied square, so it is skipped here.
    pub fn reaches(&self, position: &Position, piece: &Piece, target: Square) -> bool {
        let mut moves = Vec::new();
        self.generate(position, piece, false, &mut moves);
        moves.iter().any(|mv| mv.to == target)
    }

    fn generate(
        &self,
        position: &Position,
        piece: &Piece,
        with_castling: bool,
        moves: &mut Vec<Move>,
    ) {
        match piece.kind {
            PieceKind::Pawn => self.push_pawn_moves(position, piece, moves),
            PieceKind::Knight => self.push_steps(position, piece, &KNIGHT_JUMPS, moves),
            PieceKind::Bishop => self.push_slides(position, piece, &DIAGONALS, moves),
            PieceKind::Rook => self.push_slides(position, piece, &ORTHOGONALS, moves),
            PieceKind::Queen => {
                self.push_slides(position, piece, &DIAGONALS, moves);
                self.push_slides(position, piece, &ORTHOGONALS, moves);
            }
            PieceKind::King => {
                self.push_steps(position, piece, &KING_STEPS, moves);
                if with_castling {
                    self.push_castling_moves(position, piece, moves);
                }
            }
        }
    }

    fn push_slides(
        &self,
        position: &Position,
        piece: &Piece,
        directions: &[(i8, i8)],
        moves: &mut Vec<Move>,
    ) {
        for &(df, dr) in directions {
            let mut current = piece.square;
            while let Some(target) = current.offset(df, dr) {
                match position.piece_at(target) {
                    None => moves.push(Move::new(piece.id, piece.square, target)),
                    Some(other) => {
                        if piece.is_enemy(other) {
                            moves.push(Move::new(piece.id, piece.square, target));
                        }
                        break;
                    }
                }
                current = target;
            }
        }
    }

    fn push_steps(
        &self,
        position: &Position,
        piece: &Piece,
        offsets: &[(i8, i8)],
        moves: &mut Vec<Move>,
    ) {
        for &(df, dr) in offsets {
            let Some(target) = piece.square.offset(df, dr) else {
                continue;
            };
            let open = position
                .piece_at(target)
                .map_or(true, |other| piece.is_enemy(other));
            if open {
                moves.push(Move::new(piece.id, piece.square, target));
            }
        }
    }

    fn push_pawn_moves(&self, position: &Position, pawn: &Piece, moves: &mut Vec<Move>) {
        let color = pawn.color();
        let direction = color.pawn_direction();

        if let Some(one) = pawn.square.offset(0, direction) {
            if position.is_empty(one) {
                self.push_pawn_move(Move::new(pawn.id, pawn.square, one), color, moves);

                if !pawn.has_moved {
                    if let Some(two) = one.offset(0, direction) {
                        if position.is_empty(two) {
                            moves.push(Move {
                                en_passant_target: Some(one),
                                ..Move::new(pawn.id, pawn.square, two)
                            });
                        }
                    }
                }
            }
        }

        for df in [-1, 1] {
            let Some(target) = pawn.square.offset(df, direction) else {
                continue;
            };
            let capturable = match position.piece_at(target) {
                Some(other) => pawn.is_enemy(other),
                None => {
                    position.en_passant_target == Some(target)
                        && self.has_en_passant_victim(position, target, color)
                }
            };
            if capturable {
                self.push_pawn_move(Move::new(pawn.id, pawn.square, target), color, moves);
            }
        }
    }

    fn push_pawn_move(&self, mv: Move, color: Color, moves: &mut Vec<Move>) {
        if mv.to.rank() == color.promotion_rank() {
            moves.extend(PieceKind::PROMOTIONS.iter().map(|&kind| mv.with_promotion(kind)));
        } else {
            moves.push(mv);
        }
    }

    fn has_en_passant_victim(&self, position: &Position, target: Square, color: Color) -> bool {
        target
            .offset(0, -color.pawn_direction())
            .and_then(|square| position.piece_at(square))
            .is_some_and(|victim| victim.kind == PieceKind::Pawn && victim.color() != color)
    }

    /// Rights held, king and rook unmoved, and nothing standing between them.
    /// Attacked squares are left to the legality filter.
    fn push_castling_moves(&self, position: &Position, king: &Piece, moves: &mut Vec<Move>) {
        if king.has_moved {
            return;
        }
        let color = king.color();
        let rank = king.square.rank();

        for side in [CastlingSide::Kingside, CastlingSide::Queenside] {
            if !position.castling_rights.has(color, side) {
                continue;
            }
            let rook_square = Square::at(side.rook_file(), rank);
            let rook = match position.piece_at(rook_square) {
                Some(rook)
                    if rook.color() == color && rook.kind == PieceKind::Rook && !rook.has_moved =>
                {
                    rook
                }
                _ => continue,
            };

            let (low, high) = if rook_square.file() < king.square.file() {
                (rook_square.file(), king.square.file())
            } else {
                (king.square.file(), rook_square.file())
            };
            let clear = (low + 1..high).all(|file| position.is_empty(Square::at(file, rank)));
            if !clear {
                continue;
            }

            moves.push(Move {
                castling: Some(CastlingRook {
                    rook: rook.id,
                    from: rook_square,
                    to: Square::at(side.rook_target_file(), rank),
                }),
                ..Move::new(king.id, king.square, Square::at(side.king_target_file(), rank))
            });
        }
    }
}
