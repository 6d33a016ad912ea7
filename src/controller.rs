use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use thiserror::Error;

use crate::RulesEngine;
use crate::codec::{CodecError, Square, to_square};
use crate::rules::RulesError;
use crate::session::{MoveRecord, SessionConfig, SessionState, Side, Status};

/// Why a proposed move was refused. The session is unchanged in every case.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MoveError {
    #[error("game is over ({0})")]
    SessionTerminated(Status),
    #[error("no piece of the side to move on {0}")]
    EmptySquare(Square),
    #[error("piece on {0} must move to a different square")]
    NullMove(Square),
    #[error("{from}-{to} is not a legal move")]
    IllegalMove { from: Square, to: Square },
    #[error(transparent)]
    Notation(#[from] CodecError),
    #[error(transparent)]
    Rules(#[from] RulesError),
}

/// Why a [`SessionConfig`] cannot start a session.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("start position has {0} to move; sessions start with White")]
    WrongSideToMove(Side),
    #[error(transparent)]
    Rules(#[from] RulesError),
}

/// Owns a game session and is the only thing that changes it.
///
/// Moves are checked for sequencing (game over, ownership, null moves) here
/// and judged for legality by the [`RulesEngine`]. Each accepted move builds a
/// complete new snapshot before replacing the old one, so a failure at any
/// step leaves the session exactly as it was.
pub struct SessionController<R> {
    rules: R,
    config: SessionConfig,
    state: Arc<SessionState>,
}

impl<R: RulesEngine> SessionController<R> {
    /// Session from the rules engine's own starting position.
    pub fn new(rules: R) -> Self {
        let config = SessionConfig::default();
        let state = Arc::new(initial_state(&rules, &config));
        Self {
            rules,
            config,
            state,
        }
    }

    /// Session from a configured start position.
    ///
    /// The position is read once up front: it must be readable by `rules` and
    /// have White to move.
    pub fn with_config(rules: R, config: SessionConfig) -> Result<Self, ConfigError> {
        if let Some(position) = &config.start_position {
            let side = rules
                .side_to_move(position)
                .inspect_err(|e| log::warn!("Rejected start position {position}: {e}"))?;
            if side != Side::White {
                return Err(ConfigError::WrongSideToMove(side));
            }
        }

        let state = Arc::new(initial_state(&rules, &config));
        Ok(Self {
            rules,
            config,
            state,
        })
    }

    #[inline]
    pub fn rules(&self) -> &R {
        &self.rules
    }

    /// Discard the current game and start over from the configured position.
    pub fn start_new_session(&mut self) -> Arc<SessionState> {
        self.state = Arc::new(initial_state(&self.rules, &self.config));
        log::info!("New session from {}", self.state.position());
        Arc::clone(&self.state)
    }

    /// Snapshot of the session as of the last accepted move.
    #[inline]
    pub fn current_state(&self) -> Arc<SessionState> {
        Arc::clone(&self.state)
    }

    /// Play the side to move's piece from `source` to `destination`.
    pub fn propose_move(
        &mut self,
        source: Square,
        destination: Square,
    ) -> Result<Arc<SessionState>, MoveError> {
        let next = self
            .next_state(source, destination)
            .inspect_err(|e| log::debug!("Rejected {source}-{destination}: {e}"))?;

        self.state = Arc::new(next);
        log::info!(
            "Ply {}: {source}-{destination}, {} to move, {}",
            self.state.ply_count(),
            self.state.side_to_move(),
            self.state.status()
        );
        Ok(Arc::clone(&self.state))
    }

    /// [`propose_move`](Self::propose_move) with algebraic square names, e.g. `("e2", "e4")`.
    pub fn play(&mut self, source: &str, destination: &str) -> Result<Arc<SessionState>, MoveError> {
        let source = to_square(source)?;
        let destination = to_square(destination)?;
        self.propose_move(source, destination)
    }

    /// Squares the side to move may play the piece on `square` to.
    ///
    /// Empty when the game is over or the square holds no piece of the side to
    /// move, so a front end can highlight targets before the drop.
    pub fn valid_moves(&self, square: &str) -> Result<Vec<Square>, MoveError> {
        let square = to_square(square)?;
        let state = &self.state;
        if state.is_terminal() {
            return Ok(Vec::new());
        }

        let owned = self
            .rules
            .piece_at(state.position(), square)?
            .is_some_and(|piece| piece.side == state.side_to_move());
        if !owned {
            return Ok(Vec::new());
        }

        Ok(self.rules.valid_destinations(state.position(), square)?)
    }

    /// Compute the snapshot that follows the move without touching `self.state`.
    fn next_state(&self, source: Square, destination: Square) -> Result<SessionState, MoveError> {
        let state = &self.state;
        if state.is_terminal() {
            return Err(MoveError::SessionTerminated(state.status()));
        }

        let side = state.side_to_move();
        let owned = self
            .rules
            .piece_at(state.position(), source)
            .inspect_err(|e| log::warn!("Rules engine failed reading {source}: {e}"))?
            .is_some_and(|piece| piece.side == side);
        if !owned {
            return Err(MoveError::EmptySquare(source));
        }

        if source == destination {
            return Err(MoveError::NullMove(source));
        }

        let evaluation = self
            .rules
            .evaluate(state.position(), source, destination, side)
            .inspect_err(|e| log::warn!("Rules engine failed on {source}-{destination}: {e}"))?;
        if !evaluation.legal {
            return Err(MoveError::IllegalMove {
                from: source,
                to: destination,
            });
        }

        let record = MoveRecord::new(source, destination, side, evaluation.captured);
        Ok(state.advanced(record, evaluation.status, evaluation.position))
    }
}

impl<R> std::fmt::Debug for SessionController<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("position", &self.state.position().as_str())
            .field("ply", &self.state.ply_count())
            .field("status", &self.state.status())
            .finish_non_exhaustive()
    }
}

fn initial_state<R: RulesEngine>(rules: &R, config: &SessionConfig) -> SessionState {
    let position = config
        .start_position
        .clone()
        .unwrap_or_else(|| rules.starting_position());
    SessionState::initial(position)
}

/// A [`SessionController`] that can be shared between threads.
///
/// Writers (`propose_move`, `start_new_session`) are serialized through one
/// lock that is held across the rules engine call. Every committed snapshot is
/// then published separately, so readers never wait on an evaluation and never
/// see a half-applied move.
pub struct SharedSession<R> {
    controller: Mutex<SessionController<R>>,
    published: RwLock<Arc<SessionState>>,
}

impl<R: RulesEngine> SharedSession<R> {
    pub fn new(controller: SessionController<R>) -> Self {
        let published = RwLock::new(controller.current_state());
        Self {
            controller: Mutex::new(controller),
            published,
        }
    }

    pub fn start_new_session(&self) -> Arc<SessionState> {
        let mut controller = self.controller.lock();
        let state = controller.start_new_session();
        *self.published.write() = Arc::clone(&state);
        state
    }

    /// Propose a move using algebraic square names.
    pub fn propose_move(
        &self,
        source: &str,
        destination: &str,
    ) -> Result<Arc<SessionState>, MoveError> {
        let mut controller = self.controller.lock();
        let state = controller.play(source, destination)?;
        *self.published.write() = Arc::clone(&state);
        Ok(state)
    }

    #[inline]
    pub fn current_state(&self) -> Arc<SessionState> {
        self.published.read().clone()
    }

    pub fn valid_moves(&self, square: &str) -> Result<Vec<Square>, MoveError> {
        self.controller.lock().valid_moves(square)
    }
}

impl<R: RulesEngine> From<SessionController<R>> for SharedSession<R> {
    fn from(controller: SessionController<R>) -> Self {
        Self::new(controller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::ScriptedRules;
    use crate::rules::{Evaluation, ShakmatyRules};
    use crate::session::{Piece, PieceKind, Position};
    use test_case::test_case;

    fn sq(name: &str) -> Square {
        to_square(name).expect("test square is valid")
    }

    fn scripted(script: &str) -> SessionController<ScriptedRules> {
        let mut rules = ScriptedRules::new();
        rules.push_script(script).expect("test script should be valid");
        SessionController::new(rules)
    }

    #[test]
    fn test_new_session_is_initial() {
        let controller = SessionController::new(ShakmatyRules);
        let state = controller.current_state();

        assert_eq!(state.ply_count(), 0);
        assert_eq!(state.side_to_move(), Side::White);
        assert!(state.history().is_empty());
        assert!(state.captured().is_empty());
        assert_eq!(state.status(), Status::InProgress);
        assert_eq!(state.position(), &ShakmatyRules.starting_position());
    }

    #[test]
    fn test_first_move() {
        let mut controller = SessionController::new(ShakmatyRules);

        let state = controller.propose_move(sq("e2"), sq("e4")).expect("legal move");

        assert_eq!(state.ply_count(), 1);
        assert_eq!(state.side_to_move(), Side::Black);
        assert_eq!(
            state.history(),
            &[MoveRecord::new(sq("e2"), sq("e4"), Side::White, None)]
        );
        assert!(Arc::ptr_eq(&state, &controller.current_state()));
    }

    #[test]
    fn test_null_move_rejected() {
        let mut controller = scripted("");
        let before = controller.current_state();

        let result = controller.propose_move(sq("e2"), sq("e2"));

        assert_eq!(result, Err(MoveError::NullMove(sq("e2"))));
        assert_eq!(controller.current_state().ply_count(), 0);
        assert!(Arc::ptr_eq(&before, &controller.current_state()));
        assert_eq!(controller.rules().evaluations(), 0);
    }

    #[test_case("e4"; "empty square")]
    #[test_case("e7"; "opponent piece")]
    fn test_must_move_own_piece(source: &str) {
        let mut controller = scripted("");

        let result = controller.propose_move(sq(source), sq("e5"));

        assert_eq!(result, Err(MoveError::EmptySquare(sq(source))));
        assert_eq!(controller.rules().evaluations(), 0);
    }

    #[test]
    fn test_ownership_follows_turn() {
        let mut controller = scripted("");
        controller.play("e2", "e4").expect("accepted");

        assert_eq!(
            controller.play("d2", "d4"),
            Err(MoveError::EmptySquare(sq("d2")))
        );
        controller.play("e7", "e5").expect("black may move");
    }

    #[test]
    fn test_illegal_move_leaves_state_unchanged() {
        let mut controller = SessionController::new(ShakmatyRules);
        let before = controller.current_state();

        let result = controller.play("e2", "e5");

        assert_eq!(
            result,
            Err(MoveError::IllegalMove {
                from: sq("e2"),
                to: sq("e5")
            })
        );
        assert!(Arc::ptr_eq(&before, &controller.current_state()));
    }

    #[test_case("mate", Status::Checkmate)]
    #[test_case("stalemate", Status::Stalemate)]
    #[test_case("draw", Status::Draw)]
    fn test_terminal_status_blocks_moves(verdict: &str, status: Status) {
        let mut controller = scripted(verdict);
        controller.play("e2", "e4").expect("accepted");
        let terminal = controller.current_state();
        let snapshot = (*terminal).clone();

        let result = controller.play("e7", "e5");

        assert_eq!(result, Err(MoveError::SessionTerminated(status)));
        assert!(Arc::ptr_eq(&terminal, &controller.current_state()));
        assert_eq!(*controller.current_state(), snapshot);
        assert_eq!(controller.rules().evaluations(), 1);
    }

    #[test]
    fn test_terminated_checked_before_ownership() {
        let mut controller = scripted("mate");
        controller.play("e2", "e4").expect("accepted");

        // Same square, and not black's piece: the game being over still wins.
        let result = controller.play("e2", "e2");
        assert_eq!(result, Err(MoveError::SessionTerminated(Status::Checkmate)));
    }

    #[test]
    fn test_check_then_play_continues() {
        let mut controller = scripted("check ok mate");

        let state = controller.play("e2", "e4").expect("accepted");
        assert_eq!(state.status(), Status::Check);

        let state = controller.play("e7", "e5").expect("accepted");
        assert_eq!(state.status(), Status::InProgress);

        let state = controller.play("d1", "h5").expect("accepted");
        assert_eq!(state.status(), Status::Checkmate);
    }

    #[test]
    fn test_capture_credited_to_mover() {
        let mut controller = SessionController::new(ShakmatyRules);
        controller.play("e2", "e4").unwrap();
        controller.play("d7", "d5").unwrap();

        let state = controller.play("e4", "d5").expect("capture is legal");

        assert_eq!(state.captured().by(Side::White), &[PieceKind::Pawn]);
        assert!(state.captured().by(Side::Black).is_empty());
        assert_eq!(state.last_move().and_then(|m| m.captured()), Some(PieceKind::Pawn));
    }

    #[test]
    fn test_start_new_session_resets() {
        let mut controller = scripted("ok ok mate");
        controller.play("e2", "e4").unwrap();
        controller.play("e7", "e5").unwrap();
        controller.play("g1", "f3").unwrap();
        assert!(controller.current_state().is_terminal());

        let state = controller.start_new_session();

        assert_eq!(state.ply_count(), 0);
        assert_eq!(state.side_to_move(), Side::White);
        assert_eq!(state.status(), Status::InProgress);
        assert!(state.captured().is_empty());
        controller.play("d2", "d4").expect("new game accepts moves");
    }

    #[test]
    fn test_configured_start_position() {
        let fen = "7k/8/5K2/8/8/8/8/6Q1 w - - 0 1";
        let config = SessionConfig::default().with_start_position(Position::new(fen));
        let mut controller =
            SessionController::with_config(ShakmatyRules, config).expect("white to move");

        let state = controller.play("g1", "g6").expect("legal move");
        assert_eq!(state.status(), Status::Stalemate);

        let state = controller.start_new_session();
        assert_eq!(state.position().as_str(), fen);
    }

    #[test_case("e9", "e4"; "bad source")]
    #[test_case("e2", ""; "empty destination")]
    fn test_play_rejects_bad_notation(source: &str, destination: &str) {
        let mut controller = scripted("");
        let result = controller.play(source, destination);
        assert!(matches!(
            result,
            Err(MoveError::Notation(CodecError::InvalidNotation(_)))
        ));
    }

    #[test]
    fn test_start_position_with_black_to_move_is_rejected() {
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
        let config = SessionConfig::default().with_start_position(Position::new(fen));

        let result = SessionController::with_config(ShakmatyRules, config);

        assert!(matches!(
            result,
            Err(ConfigError::WrongSideToMove(Side::Black))
        ));
    }

    #[test]
    fn test_unreadable_start_position_is_rejected() {
        let config = SessionConfig::default().with_start_position(Position::new("garbage"));

        let result = SessionController::with_config(ShakmatyRules, config);

        assert!(matches!(
            result,
            Err(ConfigError::Rules(RulesError::InvalidPosition { .. }))
        ));
    }

    /// Engine whose backing service is gone.
    struct OfflineRules;

    impl RulesEngine for OfflineRules {
        fn starting_position(&self) -> Position {
            Position::new("")
        }

        fn piece_at(&self, _: &Position, _: Square) -> Result<Option<Piece>, RulesError> {
            Err(RulesError::Unavailable("offline".to_string()))
        }

        fn side_to_move(&self, _: &Position) -> Result<Side, RulesError> {
            Err(RulesError::Unavailable("offline".to_string()))
        }

        fn valid_destinations(&self, _: &Position, _: Square) -> Result<Vec<Square>, RulesError> {
            Err(RulesError::Unavailable("offline".to_string()))
        }

        fn evaluate(
            &self,
            _: &Position,
            _: Square,
            _: Square,
            _: Side,
        ) -> Result<Evaluation, RulesError> {
            Err(RulesError::Unavailable("offline".to_string()))
        }
    }

    #[test]
    fn test_rules_failure_is_reported() {
        let mut controller = SessionController::new(OfflineRules);
        let before = controller.current_state();

        let result = controller.play("e2", "e4");

        assert_eq!(
            result,
            Err(MoveError::Rules(RulesError::Unavailable("offline".to_string())))
        );
        assert!(Arc::ptr_eq(&before, &controller.current_state()));
        assert!(matches!(controller.valid_moves("e2"), Err(MoveError::Rules(_))));
    }

    fn names(squares: &[Square]) -> Vec<String> {
        squares.iter().map(Square::to_string).collect()
    }

    #[test]
    fn test_valid_moves_for_side_to_move() {
        let mut controller = SessionController::new(ShakmatyRules);

        assert_eq!(names(&controller.valid_moves("e2").unwrap()), ["e4", "e3"]);
        assert_eq!(controller.valid_moves("e4"), Ok(Vec::new()));
        assert_eq!(controller.valid_moves("e7"), Ok(Vec::new()));

        controller.play("e2", "e4").unwrap();
        assert_eq!(names(&controller.valid_moves("e7").unwrap()), ["e6", "e5"]);
        assert_eq!(controller.valid_moves("d2"), Ok(Vec::new()));
    }

    #[test]
    fn test_valid_moves_empty_after_game_over() {
        let mut controller = scripted("mate");
        controller.play("e2", "e4").unwrap();

        assert_eq!(controller.valid_moves("e7"), Ok(Vec::new()));
    }

    #[test]
    fn test_valid_moves_rejects_bad_notation() {
        let controller = SessionController::new(ShakmatyRules);
        assert_eq!(
            controller.valid_moves("z9"),
            Err(MoveError::Notation(CodecError::InvalidNotation("z9".to_string())))
        );
    }

    #[test]
    fn test_borrowed_rules() {
        let mut rules = ScriptedRules::new();
        rules.push_script("illegal").unwrap();
        let mut controller = SessionController::new(&rules);

        assert!(matches!(
            controller.play("e2", "e4"),
            Err(MoveError::IllegalMove { .. })
        ));
        assert_eq!(rules.evaluations(), 1);
    }

    #[test]
    fn test_shared_session_publishes_snapshots() {
        let shared = SharedSession::new(SessionController::new(ShakmatyRules));

        let state = shared.propose_move("e2", "e4").expect("legal move");
        assert!(Arc::ptr_eq(&state, &shared.current_state()));

        assert!(shared.propose_move("e2", "e2").is_err());
        assert!(Arc::ptr_eq(&state, &shared.current_state()));

        let state = shared.start_new_session();
        assert_eq!(shared.current_state().ply_count(), 0);
        assert!(Arc::ptr_eq(&state, &shared.current_state()));
        assert_eq!(shared.valid_moves("b1").map(|s| s.len()), Ok(2));
    }

    #[test]
    fn test_shared_session_serializes_writers() {
        let shared = Arc::new(SharedSession::from(SessionController::new(ScriptedRules::new())));
        let moves = [("a2", "a3"), ("b2", "b3"), ("c2", "c3"), ("d2", "d3")];

        std::thread::scope(|scope| {
            for (from, to) in moves {
                let shared = Arc::clone(&shared);
                scope.spawn(move || {
                    // Each white move only succeeds while white is to move.
                    let _ = shared.propose_move(from, to);
                    let _ = shared.current_state();
                });
            }
        });

        let state = shared.current_state();
        assert_eq!(state.ply_count(), 1);
        assert_eq!(state.side_to_move(), Side::Black);
        assert_eq!(state.history().len(), state.ply_count());
    }
}
