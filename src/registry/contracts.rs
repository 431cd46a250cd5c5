//! Contract-based validation for registry calls.
//!
//! Contracts define correctness through preconditions and postconditions.
//! They formalize the Hoare-style reasoning: {P} call {Q}

use super::account::Amount;
use super::action::{Cancel, Join, MakeMove, Punish};
use super::error::RegistryError;
use super::game::{Game, GameState};
use super::invariants::{GameInvariants, InvariantSet};
use crate::games::tictactoe::{Player, Position, Square};
use tracing::{instrument, warn};

// ─────────────────────────────────────────────────────────────
//  Contract Trait
// ─────────────────────────────────────────────────────────────

/// A contract defines preconditions and postconditions for state transitions.
///
/// - Precondition: {P(state, action)} - must hold before applying action
/// - Postcondition: {Q(before, after)} - must hold after applying action
pub trait Contract<S, A> {
    /// Checks preconditions before applying the action.
    fn pre(state: &S, action: &A) -> Result<(), RegistryError>;

    /// Checks postconditions after applying the action.
    fn post(before: &S, after: &S) -> Result<(), RegistryError>;
}

// ─────────────────────────────────────────────────────────────
//  Stake
// ─────────────────────────────────────────────────────────────

/// Precondition: attached value equals the stake exactly.
pub struct ExactStake;

impl ExactStake {
    #[instrument]
    pub fn check(deposit: Amount, expected: Amount) -> Result<(), RegistryError> {
        if deposit != expected {
            warn!(deposit, expected, "Deposit does not match stake");
            Err(RegistryError::InvalidStake {
                expected,
                actual: deposit,
            })
        } else {
            Ok(())
        }
    }
}

// ─────────────────────────────────────────────────────────────
//  Join / Cancel Preconditions
// ─────────────────────────────────────────────────────────────

/// Precondition: the game still waits for an opponent.
pub struct GameIsJoinable;

impl GameIsJoinable {
    #[instrument(skip(game), fields(game_id = game.id()))]
    pub fn check(game: &Game) -> Result<(), RegistryError> {
        if *game.state() != GameState::WaitingForOpponent {
            Err(RegistryError::GameNotJoinable { game_id: *game.id() })
        } else {
            Ok(())
        }
    }
}

/// Precondition: the joiner is not the creator.
pub struct NotOwnGame;

impl NotOwnGame {
    #[instrument(skip(game), fields(game_id = game.id()))]
    pub fn check(join: &Join, game: &Game) -> Result<(), RegistryError> {
        if join.caller == *game.creator() {
            Err(RegistryError::CannotJoinOwnGame { game_id: *game.id() })
        } else {
            Ok(())
        }
    }
}

/// Precondition: only the creator may cancel, and only before anyone joined.
pub struct CreatorMayCancel;

impl CreatorMayCancel {
    #[instrument(skip(game), fields(game_id = game.id()))]
    pub fn check(cancel: &Cancel, game: &Game) -> Result<(), RegistryError> {
        if cancel.caller != *game.creator() || *game.state() != GameState::WaitingForOpponent {
            Err(RegistryError::CancelNotAllowed { game_id: *game.id() })
        } else {
            Ok(())
        }
    }
}

// ─────────────────────────────────────────────────────────────
//  Move Preconditions
// ─────────────────────────────────────────────────────────────

/// Precondition: the game accepts moves.
pub struct GameIsActive;

impl GameIsActive {
    #[instrument(skip(game), fields(game_id = game.id()))]
    pub fn check(game: &Game) -> Result<(), RegistryError> {
        if *game.state() != GameState::InProgress {
            Err(RegistryError::GameNotActive { game_id: *game.id() })
        } else {
            Ok(())
        }
    }
}

/// Precondition: the caller holds the seat whose turn it is.
pub struct CallersTurn;

impl CallersTurn {
    /// Returns the mover's seat.
    #[instrument(skip(game), fields(game_id = game.id()))]
    pub fn check(mov: &MakeMove, game: &Game) -> Result<Player, RegistryError> {
        match (game.player_of(&mov.caller), *game.current_player()) {
            (Some(seat), Some(current)) if seat == current => Ok(seat),
            _ => Err(RegistryError::NotYourTurn { game_id: *game.id() }),
        }
    }
}

/// Precondition: the requested cell is on the board.
pub struct CellOnBoard;

impl CellOnBoard {
    /// Returns the position addressed by the cell.
    #[instrument]
    pub fn check(cell: usize) -> Result<Position, RegistryError> {
        Position::from_index(cell).ok_or(RegistryError::InvalidMove { cell })
    }
}

/// Precondition: the square at the move's position must be empty.
pub struct SquareIsEmpty;

impl SquareIsEmpty {
    #[instrument(skip(game), fields(game_id = game.id()))]
    pub fn check(position: Position, game: &Game) -> Result<(), RegistryError> {
        if !game.board().is_empty(position) {
            Err(RegistryError::CellOccupied { position })
        } else {
            Ok(())
        }
    }
}

/// Composite precondition for a move, checked in call order:
/// active game, caller's turn, cell on board, cell empty.
pub struct LegalMove;

impl LegalMove {
    /// Validates all preconditions and returns the mover and target.
    #[instrument(skip(game), fields(game_id = game.id()))]
    pub fn check(mov: &MakeMove, game: &Game) -> Result<(Player, Position), RegistryError> {
        GameIsActive::check(game)?;
        let player = CallersTurn::check(mov, game)?;
        let position = CellOnBoard::check(mov.cell)?;
        SquareIsEmpty::check(position, game)?;
        Ok((player, position))
    }
}

// ─────────────────────────────────────────────────────────────
//  Punish Preconditions
// ─────────────────────────────────────────────────────────────

/// Precondition: the player to move has been idle longer than the timeout.
pub struct InactivityElapsed;

impl InactivityElapsed {
    #[instrument(skip(game), fields(game_id = game.id()))]
    pub fn check(punish: &Punish, game: &Game) -> Result<(), RegistryError> {
        let elapsed = punish.now.saturating_sub(*game.last_move_at());
        if elapsed <= punish.timeout {
            Err(RegistryError::TooEarlyToPunish {
                game_id: *game.id(),
                eligible_after: game.last_move_at().saturating_add(punish.timeout),
            })
        } else {
            Ok(())
        }
    }
}

/// Precondition: the caller is the player waiting on the opponent.
pub struct CallerIsWaiting;

impl CallerIsWaiting {
    /// Returns the caller's seat.
    #[instrument(skip(game), fields(game_id = game.id()))]
    pub fn check(punish: &Punish, game: &Game) -> Result<Player, RegistryError> {
        match (game.player_of(&punish.caller), game.waiting_player()) {
            (Some(seat), Some(waiting)) if seat == waiting => Ok(seat),
            _ => Err(RegistryError::NotWaitingPlayer { game_id: *game.id() }),
        }
    }
}

// ─────────────────────────────────────────────────────────────
//  Postconditions
// ─────────────────────────────────────────────────────────────

/// Transition check shared by every contract.
///
/// - Identity, players and stake never change once set
/// - Marks already on the board are unchanged
/// - At most one mark is added per call
/// - The record satisfies every [`GameInvariants`] member
#[instrument(skip(before, after), fields(game_id = after.id()))]
pub fn transition_holds(before: &Game, after: &Game) -> Result<(), RegistryError> {
    let mut violations = Vec::new();

    if before.id() != after.id() || before.creator() != after.creator() || before.stake() != after.stake() {
        violations.push("Game identity changed".to_string());
    }

    if before.joiner().is_some() && before.joiner() != after.joiner() {
        violations.push("Joined player changed".to_string());
    }

    if before.is_finished() && before != after {
        violations.push("Finished game was mutated".to_string());
    }

    let overwritten = before
        .board()
        .squares()
        .iter()
        .zip(after.board().squares().iter())
        .any(|(was, now)| *was != Square::Empty && was != now);
    if overwritten {
        violations.push("Occupied square changed".to_string());
    }

    let added = after.move_count().checked_sub(*before.move_count());
    if !matches!(added, Some(0) | Some(1)) {
        violations.push("Move count did not advance by at most one".to_string());
    }

    if let Err(failed) = GameInvariants::check_all(after) {
        violations.extend(failed.into_iter().map(|v| v.description));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        let description = violations.join("; ");
        warn!(%description, "Postcondition failed");
        Err(RegistryError::InvariantViolation {
            description: format!("Postcondition failed: {}", description),
        })
    }
}

// ─────────────────────────────────────────────────────────────
//  Call Contracts (Pre + Post)
// ─────────────────────────────────────────────────────────────

/// Contract for joining: waiting game, not own game, exact stake.
pub struct JoinContract;

impl Contract<Game, Join> for JoinContract {
    fn pre(game: &Game, action: &Join) -> Result<(), RegistryError> {
        GameIsJoinable::check(game)?;
        NotOwnGame::check(action, game)?;
        ExactStake::check(action.deposit, *game.stake())
    }

    fn post(before: &Game, after: &Game) -> Result<(), RegistryError> {
        transition_holds(before, after)
    }
}

/// Contract for cancelling: creator only, while waiting.
pub struct CancelContract;

impl Contract<Game, Cancel> for CancelContract {
    fn pre(game: &Game, action: &Cancel) -> Result<(), RegistryError> {
        CreatorMayCancel::check(action, game)
    }

    fn post(before: &Game, after: &Game) -> Result<(), RegistryError> {
        transition_holds(before, after)
    }
}

/// Contract for moves.
///
/// Preconditions:
/// - Game in progress
/// - Caller's turn
/// - Cell on the board and empty
///
/// Postconditions:
/// - Board remains monotonic
/// - Players still alternate
/// - Escrow matches the game phase
pub struct MoveContract;

impl Contract<Game, MakeMove> for MoveContract {
    fn pre(game: &Game, action: &MakeMove) -> Result<(), RegistryError> {
        LegalMove::check(action, game).map(|_| ())
    }

    fn post(before: &Game, after: &Game) -> Result<(), RegistryError> {
        transition_holds(before, after)
    }
}

/// Contract for punishing: active game, timeout elapsed, waiting caller.
pub struct PunishContract;

impl Contract<Game, Punish> for PunishContract {
    fn pre(game: &Game, action: &Punish) -> Result<(), RegistryError> {
        GameIsActive::check(game)?;
        InactivityElapsed::check(action, game)?;
        CallerIsWaiting::check(action, game).map(|_| ())
    }

    fn post(before: &Game, after: &Game) -> Result<(), RegistryError> {
        transition_holds(before, after)
    }
}
