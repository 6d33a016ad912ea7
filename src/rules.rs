use shakmaty::{
    CastlingMode, Chess, Color, EnPassantMode, Move, Position as _, Role, fen::Fen,
};
use thiserror::Error;

use crate::RulesEngine;
use crate::codec::Square;
use crate::session::{Piece, PieceKind, Position, STARTING_FEN, Side, Status};

/// Halfmove clock value at which the seventy-five-move rule ends the game.
/// The claimable fifty-move draw is not offered; there is no way to claim.
const SEVENTY_FIVE_MOVE_HALFMOVES: u32 = 150;

/// Failure of the rules engine itself, as opposed to an illegal move.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RulesError {
    #[error("rules engine could not read position '{position}': {reason}")]
    InvalidPosition { position: String, reason: String },
    #[error("rules engine unavailable: {0}")]
    Unavailable(String),
}

/// Verdict of a [`RulesEngine`] on one proposed move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub legal: bool,
    /// Piece removed from the board by this move (en passant included)
    pub captured: Option<PieceKind>,
    /// Position after the move; the unchanged position when illegal
    pub position: Position,
    /// Status after the move
    pub status: Status,
}

impl Evaluation {
    pub fn legal(captured: Option<PieceKind>, position: Position, status: Status) -> Self {
        Self {
            legal: true,
            captured,
            position,
            status,
        }
    }

    pub fn illegal(position: Position) -> Self {
        Self {
            legal: false,
            captured: None,
            position,
            status: Status::InProgress,
        }
    }
}

impl From<Color> for Side {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Side::White,
            Color::Black => Side::Black,
        }
    }
}

impl From<Side> for Color {
    fn from(side: Side) -> Self {
        match side {
            Side::White => Color::White,
            Side::Black => Color::Black,
        }
    }
}

impl From<Role> for PieceKind {
    fn from(role: Role) -> Self {
        match role {
            Role::Pawn => PieceKind::Pawn,
            Role::Knight => PieceKind::Knight,
            Role::Bishop => PieceKind::Bishop,
            Role::Rook => PieceKind::Rook,
            Role::Queen => PieceKind::Queen,
            Role::King => PieceKind::King,
        }
    }
}

impl From<shakmaty::Piece> for Piece {
    fn from(piece: shakmaty::Piece) -> Self {
        Piece {
            side: piece.color.into(),
            kind: piece.role.into(),
        }
    }
}

/// Standard chess rules backed by `shakmaty`, with FEN positions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShakmatyRules;

impl ShakmatyRules {
    pub fn new() -> Self {
        Self
    }

    fn parse(position: &Position) -> Result<Chess, RulesError> {
        let invalid = |reason: String| RulesError::InvalidPosition {
            position: position.to_string(),
            reason,
        };
        position
            .as_str()
            .parse::<Fen>()
            .map_err(|e| invalid(e.to_string()))?
            .into_position(CastlingMode::Standard)
            .map_err(|e| invalid(e.to_string()))
    }

    /// Legal moves a drag starting on `from` can stand for.
    fn moves_from(chess: &Chess, from: shakmaty::Square) -> impl Iterator<Item = Move> {
        chess.legal_moves().into_iter().filter(move |mv| {
            // Only queen promotions; there is no piece picker.
            mv.from() == Some(from) && mv.promotion().is_none_or(|role| role == Role::Queen)
        })
    }

    /// Find the legal move a drag from `from` to `to` stands for.
    fn find_move(chess: &Chess, from: shakmaty::Square, to: shakmaty::Square) -> Option<Move> {
        let turn = chess.turn();
        // Castling is encoded as king-takes-rook. Accept the rook square and
        // the square the king actually lands on.
        Self::moves_from(chess, from).find(|mv| {
            mv.to() == to || mv.castling_side().is_some_and(|side| side.king_to(turn) == to)
        })
    }

    fn status_of(chess: &Chess) -> Status {
        if chess.is_checkmate() {
            Status::Checkmate
        } else if chess.is_stalemate() {
            Status::Stalemate
        } else if chess.is_insufficient_material()
            || chess.halfmoves() >= SEVENTY_FIVE_MOVE_HALFMOVES
        {
            Status::Draw
        } else if chess.is_check() {
            Status::Check
        } else {
            Status::InProgress
        }
    }
}

impl RulesEngine for ShakmatyRules {
    fn starting_position(&self) -> Position {
        Position::new(STARTING_FEN)
    }

    fn piece_at(&self, position: &Position, square: Square) -> Result<Option<Piece>, RulesError> {
        let chess = Self::parse(position)?;
        Ok(chess.board().piece_at(square.into()).map(Piece::from))
    }

    fn side_to_move(&self, position: &Position) -> Result<Side, RulesError> {
        Ok(Self::parse(position)?.turn().into())
    }

    /// Destinations come back in board order, a8 to h1. Castling shows the
    /// square the king lands on.
    fn valid_destinations(
        &self,
        position: &Position,
        square: Square,
    ) -> Result<Vec<Square>, RulesError> {
        let chess = Self::parse(position)?;
        let turn = chess.turn();
        let mut destinations: Vec<Square> = Self::moves_from(&chess, square.into())
            .map(|mv| match mv.castling_side() {
                Some(side) => side.king_to(turn),
                None => mv.to(),
            })
            .map(Square::from)
            .collect();
        destinations.sort_unstable();
        destinations.dedup();
        Ok(destinations)
    }

    fn evaluate(
        &self,
        position: &Position,
        source: Square,
        destination: Square,
        side: Side,
    ) -> Result<Evaluation, RulesError> {
        let chess = Self::parse(position)?;

        let turn = Side::from(chess.turn());
        if turn != side {
            log::debug!("{side} proposed a move but the position has {turn} to move");
            return Ok(Evaluation::illegal(position.clone()));
        }

        let Some(mv) = Self::find_move(&chess, source.into(), destination.into()) else {
            return Ok(Evaluation::illegal(position.clone()));
        };

        let captured = mv.capture().map(PieceKind::from);
        let mut after = chess;
        after.play_unchecked(mv);

        let fen = Fen::from_position(&after, EnPassantMode::Legal);
        Ok(Evaluation::legal(
            captured,
            Position::new(fen.to_string()),
            Self::status_of(&after),
        ))
    }
}
