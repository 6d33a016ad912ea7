use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use thiserror::Error;

use crate::RulesEngine;
use crate::codec::{BOARD_SIZE, Square};
use crate::rules::{Evaluation, RulesError};
use crate::session::{Piece, PieceKind, Position, Side, Status};

/// Board layout of a new game: 64 cells from a8 to h1, `.` for empty.
const STARTING_BOARD: &str = concat!(
    "rnbqkbnr",
    "pppppppp",
    "........",
    "........",
    "........",
    "........",
    "PPPPPPPP",
    "RNBQKBNR",
);

/// Error when parsing a verdict script.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid verdict: '{0}'")]
pub struct ScriptError(String);

/// What the scripted engine says about the next move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Legal(Status),
    Illegal,
}

/// A scriptable rules engine for tests and demos.
///
/// Knows where pieces stand but nothing about how they move: each proposed
/// move is judged by the next queued verdict. With nothing queued every move is
/// accepted. Positions are plain 64-character boards (`.` for empty, FEN
/// letters for pieces), so captures and ownership still behave.
#[derive(Debug)]
pub struct ScriptedRules {
    pending: Mutex<VecDeque<Verdict>>,
    evaluations: AtomicUsize,
}

impl Default for ScriptedRules {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedRules {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
            evaluations: AtomicUsize::new(0),
        }
    }

    /// Parse and queue verdicts for upcoming moves.
    ///
    /// Format: whitespace-separated tokens, one per move.
    /// - `ok` - legal, game continues
    /// - `check` - legal, opponent in check
    /// - `mate`, `stalemate`, `draw` - legal, game over
    /// - `illegal` - rejected
    ///
    /// Example: `"ok check ok mate"`
    pub fn push_script(&mut self, script: &str) -> Result<(), ScriptError> {
        let verdicts = parse_script(script)?;
        self.pending.get_mut().extend(verdicts);
        Ok(())
    }

    /// Number of moves the engine has been asked to evaluate.
    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::Relaxed)
    }

    fn cells(position: &Position) -> Result<&[u8], RulesError> {
        let cells = position.as_str().as_bytes();
        if cells.len() == usize::from(BOARD_SIZE) * usize::from(BOARD_SIZE) {
            Ok(cells)
        } else {
            Err(RulesError::InvalidPosition {
                position: position.to_string(),
                reason: format!("expected 64 cells, found {}", cells.len()),
            })
        }
    }
}

impl RulesEngine for ScriptedRules {
    fn starting_position(&self) -> Position {
        Position::new(STARTING_BOARD)
    }

    fn piece_at(&self, position: &Position, square: Square) -> Result<Option<Piece>, RulesError> {
        let cells = Self::cells(position)?;
        Ok(piece_from_cell(cells[index(square)]))
    }

    /// Boards carry no turn, so every readable board is taken as a new game.
    fn side_to_move(&self, position: &Position) -> Result<Side, RulesError> {
        Self::cells(position)?;
        Ok(Side::White)
    }

    /// Any square not held by the moving piece's own side.
    fn valid_destinations(
        &self,
        position: &Position,
        square: Square,
    ) -> Result<Vec<Square>, RulesError> {
        let cells = Self::cells(position)?;
        let Some(piece) = piece_from_cell(cells[index(square)]) else {
            return Ok(Vec::new());
        };
        Ok(Square::all()
            .filter(|&target| {
                piece_from_cell(cells[index(target)]).is_none_or(|other| other.side != piece.side)
            })
            .collect())
    }

    fn evaluate(
        &self,
        position: &Position,
        source: Square,
        destination: Square,
        _side: Side,
    ) -> Result<Evaluation, RulesError> {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        let cells = Self::cells(position)?;

        let verdict = self
            .pending
            .lock()
            .pop_front()
            .unwrap_or(Verdict::Legal(Status::InProgress));
        let Verdict::Legal(status) = verdict else {
            return Ok(Evaluation::illegal(position.clone()));
        };

        let captured = piece_from_cell(cells[index(destination)]).map(|piece| piece.kind);
        let mut board = cells.to_vec();
        board[index(destination)] = board[index(source)];
        board[index(source)] = b'.';

        let board = String::from_utf8(board).map_err(|e| RulesError::InvalidPosition {
            position: position.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Evaluation::legal(captured, Position::new(board), status))
    }
}

#[inline]
fn index(square: Square) -> usize {
    usize::from(square.row()) * usize::from(BOARD_SIZE) + usize::from(square.col())
}

fn piece_from_cell(cell: u8) -> Option<Piece> {
    let kind = match cell.to_ascii_lowercase() {
        b'p' => PieceKind::Pawn,
        b'n' => PieceKind::Knight,
        b'b' => PieceKind::Bishop,
        b'r' => PieceKind::Rook,
        b'q' => PieceKind::Queen,
        b'k' => PieceKind::King,
        _ => return None,
    };
    let side = if cell.is_ascii_uppercase() {
        Side::White
    } else {
        Side::Black
    };
    Some(Piece { side, kind })
}

/// Parse a verdict script into queued verdicts.
fn parse_script(script: &str) -> Result<Vec<Verdict>, ScriptError> {
    script
        .split_whitespace()
        .map(|token| match token {
            "ok" => Ok(Verdict::Legal(Status::InProgress)),
            "check" => Ok(Verdict::Legal(Status::Check)),
            "mate" => Ok(Verdict::Legal(Status::Checkmate)),
            "stalemate" => Ok(Verdict::Legal(Status::Stalemate)),
            "draw" => Ok(Verdict::Legal(Status::Draw)),
            "illegal" => Ok(Verdict::Illegal),
            other => Err(ScriptError(other.to_string())),
        })
        .collect()
}
