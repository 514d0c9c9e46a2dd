use anyhow::{anyhow, bail, Context, Result};
use std::io::{self, BufRead, Write};
use tracing::warn;

use crate::board::{PieceKind, Position, Square};
use crate::movegen::{Move, MoveGenerator};
use crate::search::{Search, SearchError, DEFAULT_DEPTH};

/// Deepest search accepted from `go` or `setoption`.
const MAX_DEPTH: u32 = 8;

pub struct UciHandler {
    position: Position,
    move_generator: MoveGenerator,
    search: Search,
}

impl UciHandler {
    pub fn new() -> Self {
        UciHandler {
            position: Position::new(),
            move_generator: MoveGenerator::new(),
            search: Search::new(),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();

        for line in stdin.lock().lines() {
            let line = line.context("failed to read from stdin")?;
            let command = line.trim();
            if command == "quit" {
                break;
            }

            match self.handle_command(command) {
                Ok(response) => write!(stdout, "{}", response)?,
                Err(err) => {
                    warn!(command, error = %err, "command rejected");
                    writeln!(stdout, "info string error: {:#}", err)?;
                }
            }
            stdout.flush()?;
        }
        Ok(())
    }

    pub fn handle_command(&mut self, command: &str) -> Result<String> {
        let parts: Vec<&str> = command.split_whitespace().collect();
        let Some(&keyword) = parts.first() else {
            return Ok(String::new());
        };

        match keyword {
            "uci" => Ok(self.handle_uci()),
            "isready" => Ok("readyok\n".to_string()),
            "ucinewgame" => {
                self.position = Position::new();
                Ok(String::new())
            }
            "position" => {
                self.handle_position(&parts[1..])?;
                Ok(String::new())
            }
            "setoption" => {
                self.handle_setoption(&parts[1..])?;
                Ok(String::new())
            }
            "go" => self.handle_go(&parts[1..]),
            "d" => Ok(format!("{}\n", self.position.to_fen())),
            _ => Ok(String::new()),
        }
    }

    fn handle_uci(&self) -> String {
        format!(
            "id name fen-minimax\n\
             id author fen-minimax developers\n\
             option name Depth type spin default {} min 1 max {}\n\
             uciok\n",
            DEFAULT_DEPTH, MAX_DEPTH
        )
    }

    fn handle_position(&mut self, parts: &[&str]) -> Result<()> {
        let (mut position, rest) = match parts.first() {
            Some(&"startpos") => (Position::new(), &parts[1..]),
            Some(&"fen") => {
                let fields = parts
                    .get(1..7)
                    .ok_or_else(|| anyhow!("position fen needs 6 fields"))?;
                let position = Position::from_fen(&fields.join(" ")).context("bad FEN")?;
                (position, &parts[7..])
            }
            _ => bail!("expected `startpos` or `fen`"),
        };

        if let Some((&"moves", moves)) = rest.split_first() {
            for text in moves {
                let mv = self
                    .parse_move(&mut position, text)
                    .with_context(|| format!("cannot play `{}`", text))?;
                position.make_move(&mv);
            }
        }

        self.position = position;
        Ok(())
    }

    fn handle_setoption(&mut self, parts: &[&str]) -> Result<()> {
        match parts {
            ["name", name, "value", value] if name.eq_ignore_ascii_case("depth") => {
                let depth: u32 = value.parse().context("depth must be a number")?;
                self.search.set_max_depth(depth.clamp(1, MAX_DEPTH));
                Ok(())
            }
            _ => bail!("unsupported option"),
        }
    }

    /// Finds the legal move written as `e2e4` / `e7e8q`.
    fn parse_move(&self, position: &mut Position, text: &str) -> Result<Move> {
        let from: Square = text.get(0..2).unwrap_or_default().parse()?;
        let to: Square = text.get(2..4).unwrap_or_default().parse()?;
        let promotion = match text.get(4..) {
            None | Some("") => None,
            Some(suffix) => {
                let symbol = suffix.chars().next().unwrap_or_default();
                match PieceKind::from_symbol(symbol) {
                    Some((_, kind))
                        if suffix.len() == 1 && PieceKind::PROMOTIONS.contains(&kind) =>
                    {
                        Some(kind)
                    }
                    _ => bail!("invalid promotion `{}`", suffix),
                }
            }
        };

        self.move_generator
            .legal_moves(position)
            .into_iter()
            .find(|mv| mv.from == from && mv.to == to && mv.promotion == promotion)
            .ok_or_else(|| anyhow!("illegal move"))
    }

    fn handle_go(&mut self, parts: &[&str]) -> Result<String> {
        if let Some(index) = parts.iter().position(|&part| part == "depth") {
            let depth: u32 = parts
                .get(index + 1)
                .ok_or_else(|| anyhow!("depth needs a value"))?
                .parse()
                .context("depth must be a number")?;
            self.search.set_max_depth(depth.clamp(1, MAX_DEPTH));
        }

        match self.search.find_best_move(&mut self.position) {
            Ok(result) => Ok(format!(
                "info depth {} score cp {} nodes {}\nbestmove {}\n",
                self.search.max_depth(),
                result.score,
                result.nodes,
                result.best_move
            )),
            Err(SearchError::NoLegalMoves { .. }) => Ok("bestmove (none)\n".to_string()),
        }
    }
}

impl Default for UciHandler {
    fn default() -> Self {
        Self::new()
    }
}
