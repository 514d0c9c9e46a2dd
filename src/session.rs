//! The per-turn contract with the game-session collaborator: it hands over the
//! authoritative FEN and its view of our pieces, and expects a single move back.

use thiserror::Error;
use tracing::warn;

use crate::board::{Color, PieceKind, Position, Square};
use crate::fen::FenError;
use crate::movegen::Move;
use crate::search::{Search, SearchError};

/// A piece as the session reports it: file letter, rank number, kind and owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemotePiece {
    pub file: char,
    pub rank: u8,
    pub kind: PieceKind,
    pub owner: Color,
}

impl RemotePiece {
    pub fn square(&self) -> Option<Square> {
        let file = (self.file as u32).checked_sub('a' as u32)?;
        let rank = self.rank.checked_sub(1)?;
        Square::new(u8::try_from(file).ok()?, rank)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveSubmission {
    pub from_file: char,
    pub from_rank: u8,
    pub to_file: char,
    pub to_rank: u8,
    pub promotion: Option<PieceKind>,
}

impl From<&Move> for MoveSubmission {
    fn from(mv: &Move) -> Self {
        Self {
            from_file: mv.from.file_char(),
            from_rank: mv.from.rank_number(),
            to_file: mv.to.file_char(),
            to_rank: mv.to.rank_number(),
            promotion: mv.promotion,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardMismatch {
    OffBoard(RemotePiece),
    Missing(RemotePiece),
    WrongPiece { remote: RemotePiece, local: char },
    CountDiffers { local: usize, remote: usize },
}

#[derive(Debug, Error)]
pub enum TurnError {
    #[error("invalid game FEN: {0}")]
    Fen(#[from] FenError),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error("{to_move:?} is to move, not {player:?}")]
    NotOurTurn { player: Color, to_move: Color },
}

/// Compares the session's list of `player`'s pieces with the parsed position.
pub fn reconcile(position: &Position, player: Color, pieces: &[RemotePiece]) -> Vec<BoardMismatch> {
    let mut mismatches = Vec::new();
    let mut remote_count = 0;

    for remote in pieces.iter().filter(|piece| piece.owner == player) {
        remote_count += 1;
        let Some(square) = remote.square() else {
            mismatches.push(BoardMismatch::OffBoard(*remote));
            continue;
        };
        match position.piece_at(square) {
            None => mismatches.push(BoardMismatch::Missing(*remote)),
            Some(local) if local.kind != remote.kind || local.color() != remote.owner => {
                mismatches.push(BoardMismatch::WrongPiece {
                    remote: *remote,
                    local: local.symbol(),
                })
            }
            Some(_) => {}
        }
    }

    let local_count = position.pieces(player).count();
    if local_count != remote_count {
        mismatches.push(BoardMismatch::CountDiffers {
            local: local_count,
            remote: remote_count,
        });
    }
    mismatches
}

pub struct TurnPlanner {
    player: Color,
    search: Search,
}

impl TurnPlanner {
    pub fn new(player: Color) -> Self {
        Self {
            player,
            search: Search::new(),
        }
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.search.set_max_depth(depth);
        self
    }

    /// Chooses this turn's move from the session's FEN. Disagreements between the
    /// FEN and the piece list are logged; the FEN wins.
    pub fn plan_turn(
        &mut self,
        fen: &str,
        pieces: &[RemotePiece],
    ) -> Result<MoveSubmission, TurnError> {
        let mut position = Position::from_fen(fen)?;
        if position.side_to_move != self.player {
            return Err(TurnError::NotOurTurn {
                player: self.player,
                to_move: position.side_to_move,
            });
        }

        for mismatch in reconcile(&position, self.player, pieces) {
            warn!(?mismatch, "session pieces disagree with FEN");
        }

        let result = self.search.find_best_move(&mut position)?;
        Ok(MoveSubmission::from(&result.best_move))
    }
}
