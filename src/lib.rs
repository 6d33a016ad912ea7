pub mod codec;
pub mod controller;
pub mod notation;
pub mod rules;
pub mod session;

pub mod mock;

use codec::Square;
use rules::{Evaluation, RulesError};
use session::{Piece, Position, SessionState, Side};

/// Trait for the chess rules behind a session.
///
/// Abstracts over a local rules implementation and a remote rules service,
/// giving `SessionController` a uniform way to validate and play moves.
/// Positions are opaque to the session; only the engine reads them.
pub trait RulesEngine {
    /// Position a new session starts from when none is configured.
    fn starting_position(&self) -> Position;

    /// The piece standing on `square` in `position`, if any.
    fn piece_at(&self, position: &Position, square: Square) -> Result<Option<Piece>, RulesError>;

    /// Which side `position` has to move.
    fn side_to_move(&self, position: &Position) -> Result<Side, RulesError>;

    /// Squares the piece on `square` may legally move to, for highlighting
    /// targets before a drop. Empty when the square is empty or holds no
    /// piece with a legal move.
    fn valid_destinations(
        &self,
        position: &Position,
        square: Square,
    ) -> Result<Vec<Square>, RulesError>;

    /// Judge `side` moving from `source` to `destination` in `position`.
    ///
    /// An illegal move is a successful evaluation with `legal == false`;
    /// `Err` is reserved for the engine itself failing.
    fn evaluate(
        &self,
        position: &Position,
        source: Square,
        destination: Square,
        side: Side,
    ) -> Result<Evaluation, RulesError>;
}

/// Trait for presenting session snapshots to the player.
///
/// Abstracts over terminal rendering and any other front end, providing a
/// uniform interface for the output side of the session. Mirrors
/// [`RulesEngine`] on the input side.
pub trait SessionView {
    /// Error type for display update failures.
    type Error: std::fmt::Debug + std::fmt::Display;

    /// Show the given snapshot.
    fn show(&mut self, state: &SessionState) -> Result<(), Self::Error>;
}

impl<R: RulesEngine + ?Sized> RulesEngine for &R {
    fn starting_position(&self) -> Position {
        (**self).starting_position()
    }

    fn piece_at(&self, position: &Position, square: Square) -> Result<Option<Piece>, RulesError> {
        (**self).piece_at(position, square)
    }

    fn side_to_move(&self, position: &Position) -> Result<Side, RulesError> {
        (**self).side_to_move(position)
    }

    fn valid_destinations(
        &self,
        position: &Position,
        square: Square,
    ) -> Result<Vec<Square>, RulesError> {
        (**self).valid_destinations(position, square)
    }

    fn evaluate(
        &self,
        position: &Position,
        source: Square,
        destination: Square,
        side: Side,
    ) -> Result<Evaluation, RulesError> {
        (**self).evaluate(position, source, destination, side)
    }
}
