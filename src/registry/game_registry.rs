//! The game registry: an arena of escrowed games plus the treasury that
//! pays them out.
//!
//! Every state-changing call follows the same shape:
//!
//! 1. check the call's contract against the record (no mutation yet);
//! 2. mutate the record and the aggregate escrow;
//! 3. check postconditions (debug builds);
//! 4. hand any payouts to the treasury.
//!
//! Step 4 only ever sees a record that is already finished with zero
//! escrow. If the treasury refuses, the record, the aggregate escrow and
//! the event log are put back exactly as they were before the call.

use super::account::{AccountId, Amount, GameId, Timestamp};
use super::action::{Cancel, Join, MakeMove, Punish};
use super::contracts::{
    CallerIsWaiting, CancelContract, Contract, ExactStake, JoinContract, LegalMove, MoveContract,
    PunishContract,
};
use super::error::RegistryError;
use super::events::RegistryEvent;
use super::game::{Game, GameState, Outcome};
use super::treasury::{Payout, Treasury};
use crate::config::WagerConfig;
use crate::games::tictactoe::{rules, Board, Player};
use tracing::{debug, info, instrument, warn};

/// Arena of games keyed by sequential identifier.
#[derive(Debug, Clone)]
pub struct GameRegistry<T> {
    config: WagerConfig,
    games: Vec<Game>,
    total_escrowed: Amount,
    treasury: T,
    events: Vec<RegistryEvent>,
}

/// Pre-call state restored when a payout fails.
struct Checkpoint {
    index: usize,
    game: Game,
    total_escrowed: Amount,
    events: usize,
}

impl<T: Treasury> GameRegistry<T> {
    /// Creates an empty registry. The first game will get identifier 1.
    #[instrument(skip(treasury))]
    pub fn new(config: WagerConfig, treasury: T) -> Self {
        info!(
            stake = config.stake(),
            punish_timeout_secs = config.punish_timeout_secs(),
            "Creating game registry"
        );
        Self {
            config,
            games: Vec::new(),
            total_escrowed: 0,
            treasury,
            events: Vec::new(),
        }
    }

    // ─────────────────────────────────────────────────────────
    //  State-changing calls
    // ─────────────────────────────────────────────────────────

    /// Opens a new game with the caller as player one.
    ///
    /// # Errors
    ///
    /// [`RegistryError::InvalidStake`] unless `deposit` equals the
    /// configured stake.
    #[instrument(skip(self), fields(caller = %caller))]
    pub fn create(
        &mut self,
        caller: &AccountId,
        deposit: Amount,
        now: Timestamp,
    ) -> Result<GameId, RegistryError> {
        let stake = *self.config.stake();
        ExactStake::check(deposit, stake)?;
        let total_escrowed = self.escrow_after_deposit(stake)?;

        let game_id = self.total_games_created();
        self.games
            .push(Game::open(game_id, caller.clone(), stake, now));
        self.total_escrowed = total_escrowed;
        self.events.push(RegistryEvent::GameCreated {
            game_id,
            creator: caller.clone(),
            stake,
        });

        info!(game_id, stake, "Game created");
        Ok(game_id)
    }

    /// Seats the caller as player two and starts the game.
    ///
    /// # Errors
    ///
    /// [`RegistryError::GameNotJoinable`], [`RegistryError::CannotJoinOwnGame`]
    /// or [`RegistryError::InvalidStake`], checked in that order.
    #[instrument(skip(self), fields(caller = %caller))]
    pub fn join(
        &mut self,
        game_id: GameId,
        caller: &AccountId,
        deposit: Amount,
        now: Timestamp,
    ) -> Result<(), RegistryError> {
        let index = self
            .index_of(game_id)
            .ok_or(RegistryError::GameNotJoinable { game_id })?;
        let action = Join::new(caller.clone(), deposit);
        JoinContract::pre(&self.games[index], &action).inspect_err(|e| {
            warn!(game_id, error = %e, "Join rejected");
        })?;
        let total_escrowed = self.escrow_after_deposit(deposit)?;

        self.transact::<JoinContract, Join>(index, |registry| {
            registry.games[index].seat_joiner(action.caller, deposit, now);
            registry.total_escrowed = total_escrowed;
            registry.events.push(RegistryEvent::GameJoined {
                game_id,
                joiner: caller.clone(),
            });
            Ok(Vec::new())
        })?;

        info!(game_id, "Opponent joined, game in progress");
        Ok(())
    }

    /// Withdraws an unjoined game and refunds the creator.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotFound`] for unknown games,
    /// [`RegistryError::CancelNotAllowed`] unless the caller created the game
    /// and nobody has joined, [`RegistryError::TransferFailed`] if the refund
    /// cannot be paid (the call is then reverted).
    #[instrument(skip(self), fields(caller = %caller))]
    pub fn cancel(&mut self, game_id: GameId, caller: &AccountId) -> Result<(), RegistryError> {
        let index = self
            .index_of(game_id)
            .ok_or(RegistryError::NotFound { game_id })?;
        CancelContract::pre(&self.games[index], &Cancel::new(caller.clone())).inspect_err(
            |e| {
                warn!(game_id, error = %e, "Cancel rejected");
            },
        )?;

        let refund = *self.games[index].escrowed();
        self.transact::<CancelContract, Cancel>(index, |registry| {
            let refund = registry.games[index].finish(Outcome::Cancelled);
            registry.release(refund)?;
            registry
                .events
                .push(RegistryEvent::GameCancelled { game_id, refund });
            Ok(vec![Payout::new(caller.clone(), refund)])
        })?;

        info!(game_id, refund, "Game cancelled, stake refunded");
        Ok(())
    }

    /// Places the caller's mark on `cell` and settles the game if the move
    /// is terminal.
    ///
    /// A move that completes a line wins the whole pot, even if it also
    /// fills the board. A full board without a line refunds each player
    /// one stake.
    ///
    /// # Errors
    ///
    /// [`RegistryError::GameNotActive`], [`RegistryError::NotYourTurn`],
    /// [`RegistryError::InvalidMove`] or [`RegistryError::CellOccupied`],
    /// checked in that order; [`RegistryError::TransferFailed`] if a terminal
    /// payout cannot be made (the move is then reverted).
    #[instrument(skip(self), fields(caller = %caller))]
    pub fn make_move(
        &mut self,
        game_id: GameId,
        caller: &AccountId,
        cell: usize,
        now: Timestamp,
    ) -> Result<(), RegistryError> {
        let index = self
            .index_of(game_id)
            .ok_or(RegistryError::GameNotActive { game_id })?;
        let action = MakeMove::new(caller.clone(), cell);
        MoveContract::pre(&self.games[index], &action).inspect_err(|e| {
            warn!(game_id, error = %e, "Move rejected");
        })?;
        let (player, position) = LegalMove::check(&action, &self.games[index])?;

        self.transact::<MoveContract, MakeMove>(index, |registry| {
            registry.games[index].place(player, position, now);
            registry.events.push(RegistryEvent::MoveMade {
                game_id,
                player,
                position,
            });
            debug!(
                game_id,
                %action,
                board = %registry.games[index].board().display(),
                "Move placed"
            );

            // Win strictly before tie: a line on the ninth move takes the pot.
            if rules::has_line(registry.games[index].board(), player) {
                let pot = registry.games[index].finish(Outcome::Winner(player));
                registry.release(pot)?;
                registry.events.push(RegistryEvent::GameWon {
                    game_id,
                    winner: caller.clone(),
                    payout: pot,
                });
                info!(game_id, %player, pot, "Game won");
                Ok(vec![Payout::new(caller.clone(), pot)])
            } else if rules::is_full(registry.games[index].board()) {
                let refunds = registry.tie_refunds(index)?;
                let pot = registry.games[index].finish(Outcome::Draw);
                registry.release(pot)?;
                let refund = *registry.games[index].stake();
                registry
                    .events
                    .push(RegistryEvent::GameTied { game_id, refund });
                info!(game_id, refund, "Game tied, stakes refunded");
                Ok(refunds)
            } else {
                registry.games[index].pass_turn();
                Ok(Vec::new())
            }
        })
    }

    /// Awards the pot to the waiting player when the player to move has been
    /// idle for longer than the configured timeout.
    ///
    /// # Errors
    ///
    /// [`RegistryError::GameNotActive`], [`RegistryError::TooEarlyToPunish`]
    /// or [`RegistryError::NotWaitingPlayer`], checked in that order;
    /// [`RegistryError::TransferFailed`] if the pot cannot be paid (the call
    /// is then reverted).
    #[instrument(skip(self), fields(caller = %caller))]
    pub fn punish_current_player(
        &mut self,
        game_id: GameId,
        caller: &AccountId,
        now: Timestamp,
    ) -> Result<(), RegistryError> {
        let index = self
            .index_of(game_id)
            .ok_or(RegistryError::GameNotActive { game_id })?;
        let action = Punish::new(caller.clone(), now, *self.config.punish_timeout_secs());
        PunishContract::pre(&self.games[index], &action).inspect_err(|e| {
            warn!(game_id, error = %e, "Punish rejected");
        })?;
        let winner = CallerIsWaiting::check(&action, &self.games[index])?;
        let punished = self.games[index]
            .account_of(winner.opponent())
            .cloned()
            .ok_or(RegistryError::GameNotActive { game_id })?;

        let pot = *self.games[index].escrowed();
        self.transact::<PunishContract, Punish>(index, |registry| {
            let pot = registry.games[index].finish(Outcome::Forfeit { winner });
            registry.release(pot)?;
            registry.events.push(RegistryEvent::PlayerPunished {
                game_id,
                punished: punished.clone(),
                winner: caller.clone(),
                payout: pot,
            });
            Ok(vec![Payout::new(caller.clone(), pot)])
        })?;

        info!(game_id, punished = %punished, pot, "Idle player punished");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    //  Read-only queries
    // ─────────────────────────────────────────────────────────

    /// Full record of a game.
    pub fn game(&self, game_id: GameId) -> Result<&Game, RegistryError> {
        self.index_of(game_id)
            .map(|index| &self.games[index])
            .ok_or(RegistryError::NotFound { game_id })
    }

    /// Board snapshot.
    pub fn game_info(&self, game_id: GameId) -> Result<&Board, RegistryError> {
        self.game(game_id).map(Game::board)
    }

    /// Seat of `caller`: 1 for the creator, 2 for the joiner.
    pub fn player_index(&self, game_id: GameId, caller: &AccountId) -> Result<u8, RegistryError> {
        self.game(game_id)?
            .player_of(caller)
            .map(Player::index)
            .ok_or(RegistryError::NotAParticipant { game_id })
    }

    /// Lifecycle phase.
    pub fn game_state(&self, game_id: GameId) -> Result<GameState, RegistryError> {
        self.game(game_id).map(|game| *game.state())
    }

    /// Player to move: 1, 2, or 0 for nobody.
    pub fn current_player_index(&self, game_id: GameId) -> Result<u8, RegistryError> {
        self.game(game_id)
            .map(|game| game.current_player().map_or(0, Player::index))
    }

    /// Time of the last accepted move, or of game start.
    pub fn last_move_time(&self, game_id: GameId) -> Result<Timestamp, RegistryError> {
        self.game(game_id).map(|game| *game.last_move_at())
    }

    /// Occupied cells.
    pub fn move_count(&self, game_id: GameId) -> Result<u8, RegistryError> {
        self.game(game_id).map(|game| *game.move_count())
    }

    /// Identifier the next game will receive; starts at 1.
    pub fn total_games_created(&self) -> GameId {
        self.games.len() as GameId + 1
    }

    /// Funds currently escrowed across all games.
    pub fn total_escrowed(&self) -> Amount {
        self.total_escrowed
    }

    /// Every game, in identifier order.
    pub fn games(&self) -> &[Game] {
        &self.games
    }

    /// Committed events, oldest first.
    pub fn events(&self) -> &[RegistryEvent] {
        &self.events
    }

    /// Active configuration.
    pub fn config(&self) -> &WagerConfig {
        &self.config
    }

    /// Payout collaborator.
    pub fn treasury(&self) -> &T {
        &self.treasury
    }

    /// Payout collaborator, mutably.
    pub fn treasury_mut(&mut self) -> &mut T {
        &mut self.treasury
    }

    // ─────────────────────────────────────────────────────────
    //  Internals
    // ─────────────────────────────────────────────────────────

    fn index_of(&self, game_id: GameId) -> Option<usize> {
        let index = usize::try_from(game_id.checked_sub(1)?).ok()?;
        (index < self.games.len()).then_some(index)
    }

    fn escrow_after_deposit(&self, deposit: Amount) -> Result<Amount, RegistryError> {
        self.total_escrowed
            .checked_add(deposit)
            .ok_or_else(|| RegistryError::InvariantViolation {
                description: "Aggregate escrow would overflow".to_string(),
            })
    }

    fn checkpoint(&self, index: usize) -> Checkpoint {
        Checkpoint {
            index,
            game: self.games[index].clone(),
            total_escrowed: self.total_escrowed,
            events: self.events.len(),
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        self.games[checkpoint.index] = checkpoint.game;
        self.total_escrowed = checkpoint.total_escrowed;
        self.events.truncate(checkpoint.events);
    }

    /// Removes a settled game's escrow from the aggregate.
    fn release(&mut self, amount: Amount) -> Result<(), RegistryError> {
        self.total_escrowed = self.total_escrowed.checked_sub(amount).ok_or_else(|| {
            RegistryError::InvariantViolation {
                description: "Released more than the aggregate escrow".to_string(),
            }
        })?;
        Ok(())
    }

    /// One stake back to each player. Both stakes are equal, so the split
    /// is exact.
    fn tie_refunds(&self, index: usize) -> Result<Vec<Payout>, RegistryError> {
        let game = &self.games[index];
        let stake = *game.stake();
        let both = stake.checked_mul(2);
        if both != Some(*game.escrowed()) {
            return Err(RegistryError::InvariantViolation {
                description: "Tie escrow is not two stakes".to_string(),
            });
        }
        let joiner = game
            .joiner()
            .clone()
            .ok_or(RegistryError::GameNotActive { game_id: *game.id() })?;
        Ok(vec![
            Payout::new(game.creator().clone(), stake),
            Payout::new(joiner, stake),
        ])
    }

    /// Applies a mutation to one game as a single atomic unit.
    ///
    /// `apply` mutates the record and returns the payouts it owes. The
    /// contract's postcondition is checked in debug builds, then the payouts
    /// go to the treasury. Any failure along the way restores the pre-call
    /// state.
    fn transact<C, A>(
        &mut self,
        index: usize,
        apply: impl FnOnce(&mut Self) -> Result<Vec<Payout>, RegistryError>,
    ) -> Result<(), RegistryError>
    where
        C: Contract<Game, A>,
    {
        let checkpoint = self.checkpoint(index);
        let game_id = *checkpoint.game.id();

        let payouts = match apply(self) {
            Ok(payouts) => payouts,
            Err(e) => {
                warn!(game_id, error = %e, "Call failed mid-transition, reverting");
                self.restore(checkpoint);
                return Err(e);
            }
        };

        if cfg!(debug_assertions) {
            if let Err(e) = C::post(&checkpoint.game, &self.games[index]) {
                self.restore(checkpoint);
                return Err(e);
            }
        }

        if payouts.is_empty() {
            return Ok(());
        }

        // Bookkeeping is final before any value leaves escrow.
        debug_assert!(self.games[index].is_finished());
        debug_assert_eq!(*self.games[index].escrowed(), 0);

        if let Err(e) = self.treasury.disburse(&payouts) {
            warn!(game_id, error = %e, "Payout failed, reverting call");
            self.restore(checkpoint);
            return Err(RegistryError::TransferFailed { source: e });
        }
        debug!(game_id, payouts = payouts.len(), "Payouts settled");
        Ok(())
    }
}
