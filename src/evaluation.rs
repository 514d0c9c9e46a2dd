use crate::board::{Color, PieceKind, Position, Square};

// Tables are written as seen from White: first row is rank 8.
const PAWN_TABLE: [[i32; 8]; 8] = [
    [0, 0, 0, 0, 0, 0, 0, 0],
    [50, 50, 50, 50, 50, 50, 50, 50],
    [10, 10, 20, 30, 30, 20, 10, 10],
    [5, 5, 10, 25, 25, 10, 5, 5],
    [0, 0, 0, 20, 20, 0, 0, 0],
    [5, -5, -10, 0, 0, -10, -5, 5],
    [5, 10, 10, -20, -20, 10, 10, 5],
    [0, 0, 0, 0, 0, 0, 0, 0],
];

const KNIGHT_TABLE: [[i32; 8]; 8] = [
    [-50, -40, -30, -30, -30, -30, -40, -50],
    [-40, -20, 0, 0, 0, 0, -20, -40],
    [-30, 0, 10, 15, 15, 10, 0, -30],
    [-30, 5, 15, 20, 20, 15, 5, -30],
    [-30, 0, 15, 20, 20, 15, 0, -30],
    [-30, 5, 10, 15, 15, 10, 5, -30],
    [-40, -20, 0, 5, 5, 0, -20, -40],
    [-50, -40, -30, -30, -30, -30, -40, -50],
];

const BISHOP_TABLE: [[i32; 8]; 8] = [
    [-20, -10, -10, -10, -10, -10, -10, -20],
    [-10, 0, 0, 0, 0, 0, 0, -10],
    [-10, 0, 5, 10, 10, 5, 0, -10],
    [-10, 5, 5, 10, 10, 5, 5, -10],
    [-10, 0, 10, 10, 10, 10, 0, -10],
    [-10, 10, 10, 10, 10, 10, 10, -10],
    [-10, 5, 0, 0, 0, 0, 5, -10],
    [-20, -10, -10, -10, -10, -10, -10, -20],
];

const ROOK_TABLE: [[i32; 8]; 8] = [
    [0, 0, 0, 0, 0, 0, 0, 0],
    [5, 10, 10, 10, 10, 10, 10, 5],
    [-5, 0, 0, 0, 0, 0, 0, -5],
    [-5, 0, 0, 0, 0, 0, 0, -5],
    [-5, 0, 0, 0, 0, 0, 0, -5],
    [-5, 0, 0, 0, 0, 0, 0, -5],
    [-5, 0, 0, 0, 0, 0, 0, -5],
    [0, 0, 0, 5, 5, 0, 0, 0],
];

const QUEEN_TABLE: [[i32; 8]; 8] = [
    [-20, -10, -10, -5, -5, -10, -10, -20],
    [-10, 0, 0, 0, 0, 0, 0, -10],
    [-10, 0, 5, 5, 5, 5, 0, -10],
    [-5, 0, 5, 5, 5, 5, 0, -5],
    [0, 0, 5, 5, 5, 5, 0, -5],
    [-10, 5, 5, 5, 5, 5, 0, -10],
    [-10, 0, 5, 0, 0, 0, 0, -10],
    [-20, -10, -10, -5, -5, -10, -10, -20],
];

const KING_TABLE: [[i32; 8]; 8] = [
    [-30, -40, -40, -50, -50, -40, -40, -30],
    [-30, -40, -40, -50, -50, -40, -40, -30],
    [-30, -40, -40, -50, -50, -40, -40, -30],
    [-30, -40, -40, -50, -50, -40, -40, -30],
    [-20, -30, -30, -40, -40, -30, -30, -20],
    [-10, -20, -20, -20, -20, -20, -20, -10],
    [20, 20, 0, 0, 0, 0, 20, 20],
    [20, 30, 10, 0, 0, 10, 30, 20],
];

const KING_ENDGAME_TABLE: [[i32; 8]; 8] = [
    [-50, -40, -30, -20, -20, -30, -40, -50],
    [-30, -20, -10, 0, 0, -10, -20, -30],
    [-30, -10, 20, 30, 30, 20, -10, -30],
    [-30, -10, 30, 40, 40, 30, -10, -30],
    [-30, -10, 30, 40, 40, 30, -10, -30],
    [-30, -10, 20, 30, 30, 20, -10, -30],
    [-30, -30, 0, 0, 0, 0, -30, -30],
    [-50, -30, -30, -30, -30, -30, -30, -50],
];

/// Material, piece placement and pawn structure, in centipawns.
pub struct Evaluator {
    pub pawn_value: i32,
    pub knight_value: i32,
    pub bishop_value: i32,
    pub rook_value: i32,
    pub queen_value: i32,
    pub king_value: i32,

    pub doubled_pawn_penalty: i32,
    pub isolated_pawn_penalty: i32,
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            pawn_value: 100,
            knight_value: 320,
            bishop_value: 330,
            rook_value: 500,
            queen_value: 900,
            king_value: 20000,

            doubled_pawn_penalty: -10,
            isolated_pawn_penalty: -20,
        }
    }

    /// Positive scores favour White.
    pub fn evaluate(&self, position: &Position) -> i32 {
        let endgame = self.is_endgame(position);
        self.side_score(position, Color::White, endgame)
            - self.side_score(position, Color::Black, endgame)
    }

    /// The same score seen from `color`'s side of the board.
    pub fn evaluate_for(&self, position: &Position, color: Color) -> i32 {
        match color {
            Color::White => self.evaluate(position),
            Color::Black => -self.evaluate(position),
        }
    }

    pub fn piece_value(&self, kind: PieceKind) -> i32 {
        match kind {
            PieceKind::Pawn => self.pawn_value,
            PieceKind::Knight => self.knight_value,
            PieceKind::Bishop => self.bishop_value,
            PieceKind::Rook => self.rook_value,
            PieceKind::Queen => self.queen_value,
            PieceKind::King => self.king_value,
        }
    }

    fn side_score(&self, position: &Position, color: Color, endgame: bool) -> i32 {
        let mut score = 0;
        let mut pawns_per_file = [0i32; 8];

        for piece in position.pieces(color) {
            score += self.piece_value(piece.kind);
            score += self.placement_bonus(piece.kind, color, piece.square, endgame);
            if piece.kind == PieceKind::Pawn {
                pawns_per_file[piece.square.file() as usize] += 1;
            }
        }

        score + self.pawn_structure(&pawns_per_file)
    }

    fn placement_bonus(&self, kind: PieceKind, color: Color, square: Square, endgame: bool) -> i32 {
        let table = match kind {
            PieceKind::Pawn => &PAWN_TABLE,
            PieceKind::Knight => &KNIGHT_TABLE,
            PieceKind::Bishop => &BISHOP_TABLE,
            PieceKind::Rook => &ROOK_TABLE,
            PieceKind::Queen => &QUEEN_TABLE,
            PieceKind::King if endgame => &KING_ENDGAME_TABLE,
            PieceKind::King => &KING_TABLE,
        };
        let row = match color {
            Color::White => 7 - square.rank(),
            Color::Black => square.rank(),
        };
        table[row as usize][square.file() as usize]
    }

    fn pawn_structure(&self, pawns_per_file: &[i32; 8]) -> i32 {
        let mut score = 0;
        for (file, &count) in pawns_per_file.iter().enumerate() {
            if count == 0 {
                continue;
            }
            if count > 1 {
                score += self.doubled_pawn_penalty * (count - 1);
            }
            let left = file > 0 && pawns_per_file[file - 1] > 0;
            let right = file < 7 && pawns_per_file[file + 1] > 0;
            if !left && !right {
                score += self.isolated_pawn_penalty * count;
            }
        }
        score
    }

    /// Two or fewer rooks and queens left on the board.
    fn is_endgame(&self, position: &Position) -> bool {
        let majors = [Color::White, Color::Black]
            .iter()
            .flat_map(|&color| position.pieces(color))
            .filter(|piece| matches!(piece.kind, PieceKind::Rook | PieceKind::Queen))
            .count();
        majors <= 2
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}
