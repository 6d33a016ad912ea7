use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Number of rows and columns on the board.
pub const BOARD_SIZE: u8 = 8;

/// Errors raised while translating between algebraic names and grid coordinates.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("invalid square notation: '{0}'")]
    InvalidNotation(String),
    #[error("square ({row}, {col}) is off the board")]
    InvalidSquare { row: u8, col: u8 },
}

/// A board square as zero-based grid coordinates.
///
/// Row 0 is rank 8 (the top of the board with White at the bottom),
/// column 0 is file 'a'. Both coordinates are always in `0..8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square {
    row: u8,
    col: u8,
}

impl Square {
    /// Create a square from grid coordinates.
    pub const fn new(row: u8, col: u8) -> Result<Self, CodecError> {
        if row < BOARD_SIZE && col < BOARD_SIZE {
            Ok(Self { row, col })
        } else {
            Err(CodecError::InvalidSquare { row, col })
        }
    }

    #[inline]
    pub const fn row(self) -> u8 {
        self.row
    }

    #[inline]
    pub const fn col(self) -> u8 {
        self.col
    }

    /// File letter, 'a' through 'h'.
    #[inline]
    pub const fn file_char(self) -> char {
        (b'a' + self.col) as char
    }

    /// Rank digit, '1' through '8'.
    #[inline]
    pub const fn rank_char(self) -> char {
        (b'8' - self.row) as char
    }

    /// All 64 squares, row by row from a8 to h1.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..BOARD_SIZE).flat_map(|row| (0..BOARD_SIZE).map(move |col| Square { row, col }))
    }
}

/// Parse an algebraic square name such as `"e2"`.
pub fn to_square(algebraic: &str) -> Result<Square, CodecError> {
    let invalid = || CodecError::InvalidNotation(algebraic.to_string());

    let &[file, rank] = algebraic.as_bytes() else {
        return Err(invalid());
    };
    if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
        return Err(invalid());
    }

    Ok(Square {
        row: b'8' - rank,
        col: file - b'a',
    })
}

/// Name the square at the given grid coordinates, e.g. `(6, 4)` is `"e2"`.
pub fn to_algebraic(row: u8, col: u8) -> Result<String, CodecError> {
    Square::new(row, col).map(|square| square.to_string())
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank_char())
    }
}

impl FromStr for Square {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        to_square(s)
    }
}

impl From<Square> for shakmaty::Square {
    fn from(square: Square) -> Self {
        shakmaty::Square::from_coords(
            shakmaty::File::ALL[usize::from(square.col)],
            shakmaty::Rank::ALL[usize::from(BOARD_SIZE - 1 - square.row)],
        )
    }
}

impl From<shakmaty::Square> for Square {
    fn from(square: shakmaty::Square) -> Self {
        // File and rank chars are always in 'a'..='h' and '1'..='8'.
        Square {
            row: b'8' - square.rank().char() as u8,
            col: square.file().char() as u8 - b'a',
        }
    }
}
