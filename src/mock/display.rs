use std::io::{self, Write};

use shakmaty::{CastlingMode, Chess, Position as _, fen::Fen};

use crate::SessionView;
use crate::codec::{BOARD_SIZE, Square};
use crate::session::{Piece, SessionState, Side};

/// Which side is drawn at the bottom of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    White,
    Black,
}

impl Orientation {
    #[inline]
    pub const fn flip(self) -> Self {
        match self {
            Orientation::White => Orientation::Black,
            Orientation::Black => Orientation::White,
        }
    }
}

/// Terminal-based session display for development and testing.
///
/// Renders the board from the session's FEN as an 8×8 grid, followed by the
/// turn, move count, status, captures and the FEN itself.
#[derive(Debug, Default)]
pub struct TerminalDisplay {
    orientation: Orientation,
}

impl TerminalDisplay {
    pub fn new(orientation: Orientation) -> Self {
        Self { orientation }
    }

    #[inline]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Turn the board around.
    pub fn flip(&mut self) {
        self.orientation = self.orientation.flip();
    }
}

/// Error type for terminal display operations.
#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("failed to write to terminal: {0}")]
    Io(#[from] io::Error),
}

impl SessionView for TerminalDisplay {
    type Error = DisplayError;

    fn show(&mut self, state: &SessionState) -> Result<(), Self::Error> {
        render_state(&mut io::stdout(), state, self.orientation)
    }
}

/// Render a session snapshot to any writer. Extracted for testability.
pub(crate) fn render_state(
    w: &mut impl Write,
    state: &SessionState,
    orientation: Orientation,
) -> Result<(), DisplayError> {
    match state
        .position()
        .as_str()
        .parse::<Fen>()
        .ok()
        .and_then(|fen| fen.into_position::<Chess>(CastlingMode::Standard).ok())
    {
        Some(chess) => render_board(w, &chess, orientation)?,
        None => writeln!(w, " (no board for position '{}')", state.position())?,
    }

    writeln!(w)?;
    writeln!(
        w,
        "Turn: {} | Move: {} | Ply: {} | Status: {}",
        state.side_to_move(),
        state.move_number(),
        state.ply_count(),
        state.status()
    )?;
    for side in [Side::White, Side::Black] {
        let pieces: String = state
            .captured()
            .by(side)
            .iter()
            .map(|&kind| {
                Piece {
                    side: side.opposite(),
                    kind,
                }
                .char()
            })
            .collect();
        writeln!(
            w,
            "Captured by {side}: {}",
            if pieces.is_empty() { "-" } else { pieces.as_str() }
        )?;
    }
    writeln!(w, "Material: {:+}", state.captured().material_advantage())?;
    writeln!(w, "FEN: {}", state.position())?;
    w.flush()?;
    Ok(())
}

fn render_board(w: &mut impl Write, chess: &Chess, orientation: Orientation) -> io::Result<()> {
    let mut squares: Vec<Square> = Square::all().collect();
    if orientation == Orientation::Black {
        squares.reverse();
    }

    for row in squares.chunks(usize::from(BOARD_SIZE)) {
        write!(w, " {} ", row[0].rank_char())?;
        for &square in row {
            match chess.board().piece_at(square.into()) {
                Some(piece) => write!(w, " {} ", Piece::from(piece).char())?,
                None => write!(w, " · ")?,
            }
        }
        writeln!(w)?;
    }

    let files: Vec<String> = squares[..usize::from(BOARD_SIZE)]
        .iter()
        .map(|square| square.file_char().to_string())
        .collect();
    writeln!(w, "    {}", files.join("  "))
}
