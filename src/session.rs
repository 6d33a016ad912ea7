use std::fmt;

use crate::codec::Square;

/// Standard chess starting position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// The two players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    White,
    Black,
}

impl Side {
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::White => "White",
            Side::Black => "Black",
        })
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
    /// Material value in pawns. The king is never captured, so it counts zero.
    pub const fn value(self) -> i32 {
        match self {
            PieceKind::Pawn => 1,
            PieceKind::Knight | PieceKind::Bishop => 3,
            PieceKind::Rook => 5,
            PieceKind::Queen => 9,
            PieceKind::King => 0,
        }
    }

    /// Lowercase letter as used in FEN, e.g. `'n'` for a knight.
    pub const fn char(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }
}

/// A piece kind owned by a side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub side: Side,
    pub kind: PieceKind,
}

impl Piece {
    /// FEN letter: uppercase for White, lowercase for Black.
    pub const fn char(self) -> char {
        match self.side {
            Side::White => self.kind.char().to_ascii_uppercase(),
            Side::Black => self.kind.char(),
        }
    }
}

/// Game status as reported by the rules engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    #[default]
    InProgress,
    Check,
    Checkmate,
    Stalemate,
    Draw,
}

impl Status {
    /// No further moves may be played from a terminal status.
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Status::Checkmate | Status::Stalemate | Status::Draw)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::InProgress => "In Progress",
            Status::Check => "Check",
            Status::Checkmate => "Checkmate",
            Status::Stalemate => "Stalemate",
            Status::Draw => "Draw",
        })
    }
}

/// Opaque serialized board position (FEN for the bundled rules engine).
///
/// The session stores and forwards it; only a [`RulesEngine`](crate::RulesEngine)
/// interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Position(String);

impl Position {
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One ply: who moved what from where to where.
///
/// Fields are private so a record cannot change after it enters the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MoveRecord {
    source: Square,
    destination: Square,
    side: Side,
    captured: Option<PieceKind>,
}

impl MoveRecord {
    pub const fn new(
        source: Square,
        destination: Square,
        side: Side,
        captured: Option<PieceKind>,
    ) -> Self {
        Self {
            source,
            destination,
            side,
            captured,
        }
    }

    #[inline]
    pub const fn source(&self) -> Square {
        self.source
    }

    #[inline]
    pub const fn destination(&self) -> Square {
        self.destination
    }

    #[inline]
    pub const fn side(&self) -> Side {
        self.side
    }

    #[inline]
    pub const fn captured(&self) -> Option<PieceKind> {
        self.captured
    }
}

/// Pieces each side has captured, in capture order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Captured {
    /// Black pieces taken by White
    white: Vec<PieceKind>,
    /// White pieces taken by Black
    black: Vec<PieceKind>,
}

impl Captured {
    /// Pieces captured by `side`.
    pub fn by(&self, side: Side) -> &[PieceKind] {
        match side {
            Side::White => &self.white,
            Side::Black => &self.black,
        }
    }

    /// Credit `kind` to the capturing side.
    pub fn record(&mut self, capturer: Side, kind: PieceKind) {
        match capturer {
            Side::White => self.white.push(kind),
            Side::Black => self.black.push(kind),
        }
    }

    /// Material balance in pawns. Positive means White is ahead.
    pub fn material_advantage(&self) -> i32 {
        let score = |pieces: &[PieceKind]| pieces.iter().map(|p| p.value()).sum::<i32>();
        score(&self.white) - score(&self.black)
    }

    pub fn is_empty(&self) -> bool {
        self.white.is_empty() && self.black.is_empty()
    }
}

/// Settings applied whenever a session starts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionConfig {
    /// Position to start from. `None` uses the rules engine's starting position.
    pub start_position: Option<Position>,
}

impl SessionConfig {
    pub fn with_start_position(mut self, position: Position) -> Self {
        self.start_position = Some(position);
        self
    }
}

/// Client-visible snapshot of a game.
///
/// Only the [`SessionController`](crate::controller::SessionController) builds
/// these; everyone else reads them through shared, immutable handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    side_to_move: Side,
    history: Vec<MoveRecord>,
    captured: Captured,
    status: Status,
    position: Position,
}

impl SessionState {
    /// Snapshot at the start of a game: White to move, nothing played.
    pub fn initial(position: Position) -> Self {
        Self {
            side_to_move: Side::White,
            history: Vec::new(),
            captured: Captured::default(),
            status: Status::InProgress,
            position,
        }
    }

    /// The snapshot that follows `record`.
    ///
    /// Returns a new value; `self` is left untouched so callers can swap the
    /// whole snapshot in one step.
    pub(crate) fn advanced(&self, record: MoveRecord, status: Status, position: Position) -> Self {
        let mut next = self.clone();
        if let Some(kind) = record.captured() {
            next.captured.record(record.side(), kind);
        }
        next.history.push(record);
        next.side_to_move = record.side().opposite();
        next.status = status;
        next.position = position;
        next
    }

    #[inline]
    pub fn side_to_move(&self) -> Side {
        self.side_to_move
    }

    /// Number of plies played. Always equal to `history().len()`.
    #[inline]
    pub fn ply_count(&self) -> usize {
        self.history.len()
    }

    /// Full-move number as written in game records (starts at 1).
    #[inline]
    pub fn move_number(&self) -> usize {
        self.ply_count() / 2 + 1
    }

    #[inline]
    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    #[inline]
    pub fn last_move(&self) -> Option<&MoveRecord> {
        self.history.last()
    }

    #[inline]
    pub fn captured(&self) -> &Captured {
        &self.captured
    }

    #[inline]
    pub fn status(&self) -> Status {
        self.status
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    #[inline]
    pub fn position(&self) -> &Position {
        &self.position
    }
}
