use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::movegen::Move;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 1,
        }
    }

    pub fn pawn_direction(&self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    pub fn promotion_rank(&self) -> u8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Promotion choices, in the order candidate moves are emitted.
    pub const PROMOTIONS: [PieceKind; 4] = [
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
    ];

    /// Uppercase symbols are White, lowercase are Black.
    pub fn from_symbol(symbol: char) -> Option<(Color, PieceKind)> {
        let kind = match symbol.to_ascii_lowercase() {
            'p' => PieceKind::Pawn,
            'n' => PieceKind::Knight,
            'b' => PieceKind::Bishop,
            'r' => PieceKind::Rook,
            'q' => PieceKind::Queen,
            'k' => PieceKind::King,
            _ => return None,
        };
        let color = if symbol.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some((color, kind))
    }

    pub fn symbol(&self, color: Color) -> char {
        let symbol = match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        };
        match color {
            Color::White => symbol.to_ascii_uppercase(),
            Color::Black => symbol,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid square `{0}`")]
pub struct SquareParseError(pub String);

/// A board coordinate. File 0 is the a-file, rank 0 is White's back rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square {
    file: u8,
    rank: u8,
}

impl Square {
    pub fn new(file: u8, rank: u8) -> Option<Square> {
        (file < 8 && rank < 8).then_some(Square { file, rank })
    }

    /// Coordinates wrap into the board; only for values already known to be in range.
    pub(crate) const fn at(file: u8, rank: u8) -> Square {
        Square {
            file: file & 7,
            rank: rank & 7,
        }
    }

    pub fn file(&self) -> u8 {
        self.file
    }

    pub fn rank(&self) -> u8 {
        self.rank
    }

    /// Steps off the board yield `None`, which ends a ray or discards an offset.
    pub fn offset(&self, file_delta: i8, rank_delta: i8) -> Option<Square> {
        let file = self.file as i8 + file_delta;
        let rank = self.rank as i8 + rank_delta;
        if (0..8).contains(&file) && (0..8).contains(&rank) {
            Some(Square {
                file: file as u8,
                rank: rank as u8,
            })
        } else {
            None
        }
    }

    pub fn is_light(&self) -> bool {
        (self.file + self.rank) % 2 == 1
    }

    pub fn file_char(&self) -> char {
        (b'a' + self.file) as char
    }

    /// Rank as printed on a board, 1 through 8.
    pub fn rank_number(&self) -> u8 {
        self.rank + 1
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank_number())
    }
}

impl FromStr for Square {
    type Err = SquareParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(SquareParseError(s.to_string()));
        }
        match (bytes[0], bytes[1]) {
            (file @ b'a'..=b'h', rank @ b'1'..=b'8') => Ok(Square {
                file: file - b'a',
                rank: rank - b'1',
            }),
            _ => Err(SquareParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PieceId {
    pub color: Color,
    pub serial: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub id: PieceId,
    pub square: Square,
    pub kind: PieceKind,
    pub has_moved: bool,
}

impl Piece {
    pub fn color(&self) -> Color {
        self.id.color
    }

    pub fn symbol(&self) -> char {
        self.kind.symbol(self.color())
    }

    pub fn is_enemy(&self, other: &Piece) -> bool {
        self.color() != other.color()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastlingSide {
    Kingside,
    Queenside,
}

impl CastlingSide {
    pub fn rook_file(&self) -> u8 {
        match self {
            CastlingSide::Kingside => 7,
            CastlingSide::Queenside => 0,
        }
    }

    pub fn king_target_file(&self) -> u8 {
        match self {
            CastlingSide::Kingside => 6,
            CastlingSide::Queenside => 2,
        }
    }

    pub fn rook_target_file(&self) -> u8 {
        match self {
            CastlingSide::Kingside => 5,
            CastlingSide::Queenside => 3,
        }
    }

    /// The side a rook standing on `file` castles toward, if it is a corner file.
    pub fn from_rook_file(file: u8) -> Option<CastlingSide> {
        match file {
            7 => Some(CastlingSide::Kingside),
            0 => Some(CastlingSide::Queenside),
            _ => None,
        }
    }
}

/// Four bits: KQkq.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights(0);
    pub const ALL: CastlingRights = CastlingRights(0b1111);

    fn bit(color: Color, side: CastlingSide) -> u8 {
        match (color, side) {
            (Color::White, CastlingSide::Kingside) => 0b0001,
            (Color::White, CastlingSide::Queenside) => 0b0010,
            (Color::Black, CastlingSide::Kingside) => 0b0100,
            (Color::Black, CastlingSide::Queenside) => 0b1000,
        }
    }

    pub fn has(&self, color: Color, side: CastlingSide) -> bool {
        self.0 & Self::bit(color, side) != 0
    }

    pub fn grant(&mut self, color: Color, side: CastlingSide) {
        self.0 |= Self::bit(color, side);
    }

    pub fn revoke(&mut self, color: Color, side: CastlingSide) {
        self.0 &= !Self::bit(color, side);
    }

    pub fn revoke_all(&mut self, color: Color) {
        self.revoke(color, CastlingSide::Kingside);
        self.revoke(color, CastlingSide::Queenside);
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "-");
        }
        for (color, side, flag) in [
            (Color::White, CastlingSide::Kingside, 'K'),
            (Color::White, CastlingSide::Queenside, 'Q'),
            (Color::Black, CastlingSide::Kingside, 'k'),
            (Color::Black, CastlingSide::Queenside, 'q'),
        ] {
            if self.has(color, side) {
                write!(f, "{}", flag)?;
            }
        }
        Ok(())
    }
}

const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

/// What the standard starting layout holds on `square`.
pub fn starting_occupant(square: Square) -> Option<(Color, PieceKind)> {
    let back_rank = BACK_RANK[square.file() as usize];
    match square.rank() {
        0 => Some((Color::White, back_rank)),
        1 => Some((Color::White, PieceKind::Pawn)),
        6 => Some((Color::Black, PieceKind::Pawn)),
        7 => Some((Color::Black, back_rank)),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MovedPiece {
    id: PieceId,
    from: Square,
    kind: PieceKind,
    has_moved: bool,
}

/// Everything `Position::unmake_move` needs to reverse one `make_move`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoState {
    moved: Option<MovedPiece>,
    rook: Option<MovedPiece>,
    captured: Option<Piece>,
    side_to_move: Color,
    castling_rights: CastlingRights,
    en_passant_target: Option<Square>,
    halfmove_clock: u32,
    fullmove_counter: u32,
}

impl UndoState {
    pub fn captured(&self) -> Option<&Piece> {
        self.captured.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    grid: [[Option<PieceId>; 8]; 8], // [rank][file]
    pieces: [BTreeMap<PieceId, Piece>; 2],
    next_serial: u16,
    pub side_to_move: Color,
    pub castling_rights: CastlingRights,
    pub en_passant_target: Option<Square>,
    pub halfmove_clock: u32,
    pub fullmove_counter: u32,
}

impl Position {
    /// The standard starting position.
    pub fn new() -> Self {
        let mut position = Self::empty();
        for rank in (0..8).rev() {
            for file in 0..8 {
                let square = Square::at(file, rank);
                if let Some((color, kind)) = starting_occupant(square) {
                    position.add_piece(square, color, kind, false);
                }
            }
        }
        position.castling_rights = CastlingRights::ALL;
        position
    }

    pub fn empty() -> Self {
        Self {
            grid: [[None; 8]; 8],
            pieces: [BTreeMap::new(), BTreeMap::new()],
            next_serial: 0,
            side_to_move: Color::White,
            castling_rights: CastlingRights::NONE,
            en_passant_target: None,
            halfmove_clock: 0,
            fullmove_counter: 1,
        }
    }

    fn slot(&mut self, square: Square) -> &mut Option<PieceId> {
        &mut self.grid[square.rank() as usize][square.file() as usize]
    }

    /// Registers a new piece on `square`, replacing whatever stood there.
    pub fn add_piece(
        &mut self,
        square: Square,
        color: Color,
        kind: PieceKind,
        has_moved: bool,
    ) -> PieceId {
        self.remove(square);
        let id = PieceId {
            color,
            serial: self.next_serial,
        };
        self.next_serial += 1;
        self.insert(Piece {
            id,
            square,
            kind,
            has_moved,
        });
        id
    }

    fn insert(&mut self, piece: Piece) {
        *self.slot(piece.square) = Some(piece.id);
        self.pieces[piece.id.color.index()].insert(piece.id, piece);
    }

    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.pieces[id.color.index()].get(&id)
    }

    pub fn piece_at(&self, square: Square) -> Option<&Piece> {
        self.grid[square.rank() as usize][square.file() as usize].and_then(|id| self.piece(id))
    }

    pub fn is_empty(&self, square: Square) -> bool {
        self.grid[square.rank() as usize][square.file() as usize].is_none()
    }

    pub fn pieces(&self, color: Color) -> impl Iterator<Item = &Piece> {
        self.pieces[color.index()].values()
    }

    pub fn piece_ids(&self, color: Color) -> Vec<PieceId> {
        self.pieces[color.index()].keys().copied().collect()
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces(color)
            .find(|piece| piece.kind == PieceKind::King)
            .map(|piece| piece.square)
    }

    /// Moves the piece to `square`, capturing any occupant there.
    ///
    /// A capture resets the halfmove clock. Returns the captured piece.
    pub fn place(&mut self, id: PieceId, square: Square) -> Option<Piece> {
        let from = self.piece(id)?.square;
        *self.slot(from) = None;
        let captured = self.remove(square);
        if captured.is_some() {
            self.halfmove_clock = 0;
        }
        *self.slot(square) = Some(id);
        if let Some(piece) = self.pieces[id.color.index()].get_mut(&id) {
            piece.square = square;
        }
        captured
    }

    /// Deletes the occupant of `square` from the grid and its registry.
    pub fn remove(&mut self, square: Square) -> Option<Piece> {
        let id = self.slot(square).take()?;
        self.pieces[id.color.index()].remove(&id)
    }

    fn snapshot(&self) -> UndoState {
        UndoState {
            moved: None,
            rook: None,
            captured: None,
            side_to_move: self.side_to_move,
            castling_rights: self.castling_rights,
            en_passant_target: self.en_passant_target,
            halfmove_clock: self.halfmove_clock,
            fullmove_counter: self.fullmove_counter,
        }
    }

    /// Applies `mv` in place. A move whose piece is not on the board changes nothing.
    pub fn make_move(&mut self, mv: &Move) -> UndoState {
        let mut undo = self.snapshot();
        let Some(mover) = self.piece(mv.piece).cloned() else {
            return undo;
        };
        let color = mover.color();
        undo.moved = Some(MovedPiece {
            id: mover.id,
            from: mover.square,
            kind: mover.kind,
            has_moved: mover.has_moved,
        });

        if mover.kind == PieceKind::King && !mover.has_moved {
            self.castling_rights.revoke_all(color);
            if let Some(castling) = mv.castling {
                if let Some(rook) = self.piece(castling.rook).cloned() {
                    undo.rook = Some(MovedPiece {
                        id: rook.id,
                        from: rook.square,
                        kind: rook.kind,
                        has_moved: rook.has_moved,
                    });
                    self.place(rook.id, castling.to);
                    self.mark_moved(rook.id);
                }
            }
        }

        if mover.kind == PieceKind::Rook && !mover.has_moved {
            if let Some(side) = CastlingSide::from_rook_file(mover.square.file()) {
                self.castling_rights.revoke(color, side);
            }
        }

        if mover.kind == PieceKind::Pawn {
            if self.en_passant_target == Some(mv.to) {
                if let Some(victim) = mv.to.offset(0, -color.pawn_direction()) {
                    let is_enemy_pawn = self
                        .piece_at(victim)
                        .is_some_and(|p| p.kind == PieceKind::Pawn && p.color() != color);
                    if is_enemy_pawn {
                        undo.captured = self.remove(victim);
                    }
                }
            }
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }

        if let Some(captured) = self.place(mover.id, mv.to) {
            if captured.kind == PieceKind::Rook && !captured.has_moved {
                if let Some(side) = CastlingSide::from_rook_file(captured.square.file()) {
                    self.castling_rights.revoke(captured.color(), side);
                }
            }
            undo.captured = Some(captured);
        }

        self.mark_moved(mover.id);
        if let Some(kind) = mv.promotion {
            if let Some(piece) = self.pieces[color.index()].get_mut(&mover.id) {
                piece.kind = kind;
            }
        }

        self.en_passant_target = mv.en_passant_target;

        if color == Color::Black {
            self.fullmove_counter = self.fullmove_counter.saturating_add(1);
        }
        self.side_to_move = color.opposite();
        undo
    }

    fn mark_moved(&mut self, id: PieceId) {
        if let Some(piece) = self.pieces[id.color.index()].get_mut(&id) {
            piece.has_moved = true;
        }
    }

    /// Reverses the `make_move` that produced `undo`. Undo states must be
    /// consumed in reverse order of application.
    pub fn unmake_move(&mut self, undo: UndoState) {
        for moved in [undo.moved, undo.rook].into_iter().flatten() {
            let Some(piece) = self.pieces[moved.id.color.index()].get_mut(&moved.id) else {
                continue;
            };
            let current = piece.square;
            piece.square = moved.from;
            piece.kind = moved.kind;
            piece.has_moved = moved.has_moved;
            *self.slot(current) = None;
            *self.slot(moved.from) = Some(moved.id);
        }
        if let Some(captured) = undo.captured {
            self.insert(captured);
        }
        self.side_to_move = undo.side_to_move;
        self.castling_rights = undo.castling_rights;
        self.en_passant_target = undo.en_passant_target;
        self.halfmove_clock = undo.halfmove_clock;
        self.fullmove_counter = undo.fullmove_counter;
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}
