//! Forsyth-Edwards Notation for `Position`.

use std::str::FromStr;
use thiserror::Error;

use crate::board::{
    starting_occupant, CastlingRights, CastlingSide, Color, PieceKind, Position, Square,
};

pub const DEFAULT_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FenError {
    #[error("expected 6 fields, found {0}")]
    MissingField(usize),
    #[error("expected 8 ranks, found {0}")]
    RankCount(usize),
    #[error("rank {rank} covers {files} files")]
    RankLength { rank: u8, files: usize },
    #[error("unrecognized symbol `{0}`")]
    UnknownSymbol(char),
    #[error("invalid side to move `{0}`")]
    SideToMove(String),
    #[error("invalid castling field `{0}`")]
    Castling(String),
    #[error("invalid en passant square `{0}`")]
    EnPassant(String),
    #[error("invalid {field} `{value}`")]
    Counter { field: &'static str, value: String },
}

impl Position {
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 6 {
            return Err(FenError::MissingField(fields.len()));
        }

        let mut position = Position::empty();
        read_placement(&mut position, fields[0])?;

        position.side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::SideToMove(other.to_string())),
        };
        position.castling_rights = read_castling(fields[2])?;
        position.en_passant_target = match fields[3] {
            "-" => None,
            square => Some(
                square
                    .parse()
                    .map_err(|_| FenError::EnPassant(square.to_string()))?,
            ),
        };
        position.halfmove_clock = read_counter("halfmove clock", fields[4])?;
        position.fullmove_counter = read_counter("fullmove counter", fields[5])?;
        if position.fullmove_counter == 0 {
            return Err(FenError::Counter {
                field: "fullmove counter",
                value: fields[5].to_string(),
            });
        }

        Ok(position)
    }

    pub fn to_fen(&self) -> String {
        let mut ranks = Vec::with_capacity(8);
        for rank in (0..8).rev() {
            let mut section = String::new();
            let mut empty = 0;
            for file in 0..8 {
                match self.piece_at(Square::at(file, rank)) {
                    Some(piece) => {
                        if empty > 0 {
                            section.push_str(&empty.to_string());
                            empty = 0;
                        }
                        section.push(piece.symbol());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                section.push_str(&empty.to_string());
            }
            ranks.push(section);
        }

        let side = match self.side_to_move {
            Color::White => "w",
            Color::Black => "b",
        };
        let en_passant = self
            .en_passant_target
            .map_or_else(|| "-".to_string(), |square| square.to_string());

        format!(
            "{} {} {} {} {} {}",
            ranks.join("/"),
            side,
            self.castling_rights,
            en_passant,
            self.halfmove_clock,
            self.fullmove_counter
        )
    }
}

impl FromStr for Position {
    type Err = FenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Position::from_fen(s)
    }
}

fn read_placement(position: &mut Position, placement: &str) -> Result<(), FenError> {
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::RankCount(ranks.len()));
    }

    for (row, text) in ranks.iter().enumerate() {
        let rank = 7 - row as u8;
        let mut file = 0usize;
        for symbol in text.chars() {
            if let Some(run) = symbol.to_digit(10).filter(|run| (1..=8).contains(run)) {
                file += run as usize;
            } else {
                let (color, kind) =
                    PieceKind::from_symbol(symbol).ok_or(FenError::UnknownSymbol(symbol))?;
                if file >= 8 {
                    return Err(FenError::RankLength {
                        rank: rank + 1,
                        files: file + 1,
                    });
                }
                let square = Square::at(file as u8, rank);
                let has_moved = starting_occupant(square) != Some((color, kind));
                position.add_piece(square, color, kind, has_moved);
                file += 1;
            }
        }
        if file != 8 {
            return Err(FenError::RankLength {
                rank: rank + 1,
                files: file,
            });
        }
    }
    Ok(())
}

fn read_castling(field: &str) -> Result<CastlingRights, FenError> {
    let mut rights = CastlingRights::NONE;
    if field == "-" {
        return Ok(rights);
    }
    if field.is_empty() {
        return Err(FenError::Castling(field.to_string()));
    }
    for flag in field.chars() {
        let (color, side) = match flag {
            'K' => (Color::White, CastlingSide::Kingside),
            'Q' => (Color::White, CastlingSide::Queenside),
            'k' => (Color::Black, CastlingSide::Kingside),
            'q' => (Color::Black, CastlingSide::Queenside),
            _ => return Err(FenError::Castling(field.to_string())),
        };
        rights.grant(color, side);
    }
    Ok(rights)
}

fn read_counter(field: &'static str, value: &str) -> Result<u32, FenError> {
    value.parse().map_err(|_| FenError::Counter {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_fen_round_trip() {
        let position = Position::from_fen(DEFAULT_FEN).unwrap();
        assert_eq!(position.to_fen(), DEFAULT_FEN);
        assert_eq!(position, Position::new());
    }

    #[test]
    fn test_canonical_fens_round_trip() {
        for fen in [
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "rnbqkbnr/pp1ppppp/8/2p5/4P3/8/PPPP1PPP/RNBQKBNR w KQkq c6 0 2",
            "4k3/8/8/8/8/8/8/4K2R b K - 12 40",
        ] {
            assert_eq!(Position::from_fen(fen).unwrap().to_fen(), fen);
        }
    }

    #[test]
    fn test_bare_kings() {
        let position = Position::from_fen("8/8/8/8/8/8/8/K6k w - - 0 1").unwrap();
        assert_eq!(position.to_fen(), "8/8/8/8/8/8/8/K6k w - - 0 1");
        assert_eq!(position.king_square(Color::White), Some("a1".parse().unwrap()));
        assert_eq!(position.king_square(Color::Black), Some("h1".parse().unwrap()));
        for color in [Color::White, Color::Black] {
            let kinds: Vec<PieceKind> = position.pieces(color).map(|p| p.kind).collect();
            assert_eq!(kinds, vec![PieceKind::King]);
        }
        assert!(position.castling_rights.is_empty());
        assert_eq!(position.en_passant_target, None);
    }

    #[test]
    fn test_has_moved_derived_from_starting_layout() {
        let position =
            Position::from_fen("rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2")
                .unwrap();
        let moved = |name: &str| position.piece_at(name.parse().unwrap()).unwrap().has_moved;
        assert!(moved("e4"));
        assert!(moved("e5"));
        assert!(moved("f3"));
        assert!(!moved("d2"));
        assert!(!moved("e1"));
        assert!(!moved("a8"));
    }

    #[test]
    fn test_piece_ids_follow_fen_order() {
        let position = Position::from_fen("8/8/8/8/8/8/8/K6k w - - 0 1").unwrap();
        let white = position.piece_at("a1".parse().unwrap()).unwrap();
        let black = position.piece_at("h1".parse().unwrap()).unwrap();
        assert_eq!(white.id.serial, 0);
        assert_eq!(black.id.serial, 1);
    }

    #[test]
    fn test_malformed_fens() {
        assert_eq!(
            Position::from_fen("8/8/8/8/8/8/8/K6k w - -"),
            Err(FenError::MissingField(4))
        );
        assert_eq!(
            Position::from_fen("8/8/8/8/8/8/K6k w - - 0 1"),
            Err(FenError::RankCount(7))
        );
        assert_eq!(
            Position::from_fen("8/8/8/8/8/8/8/K5k w - - 0 1"),
            Err(FenError::RankLength { rank: 1, files: 7 })
        );
        assert_eq!(
            Position::from_fen("8/8/8/8/8/8/8/K7k w - - 0 1"),
            Err(FenError::RankLength { rank: 1, files: 9 })
        );
        assert_eq!(
            Position::from_fen("8/8/8/8/8/8/8/K6x w - - 0 1"),
            Err(FenError::UnknownSymbol('x'))
        );
        assert!(matches!(
            Position::from_fen("8/8/8/8/8/8/8/K6k x - - 0 1"),
            Err(FenError::SideToMove(_))
        ));
        assert!(matches!(
            Position::from_fen("8/8/8/8/8/8/8/K6k w KX - 0 1"),
            Err(FenError::Castling(_))
        ));
        assert!(matches!(
            Position::from_fen("8/8/8/8/8/8/8/K6k w - e9 0 1"),
            Err(FenError::EnPassant(_))
        ));
        assert!(matches!(
            Position::from_fen("8/8/8/8/8/8/8/K6k w - - x 1"),
            Err(FenError::Counter { .. })
        ));
        assert!(matches!(
            Position::from_fen("8/8/8/8/8/8/8/K6k w - - 0 0"),
            Err(FenError::Counter { .. })
        ));
    }
}
