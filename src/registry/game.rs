//! The escrowed game record.

use super::account::{AccountId, Amount, GameId, Timestamp};
use crate::games::tictactoe::{Board, Player, Position, Square};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Lifecycle phase of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameState {
    /// Created and escrowed, no opponent yet.
    WaitingForOpponent,
    /// Both stakes escrowed, moves accepted.
    InProgress,
    /// Settled. Nothing changes after this.
    Finished,
}

impl GameState {
    /// External numbering: 0, 1, 2.
    pub fn index(self) -> u8 {
        match self {
            GameState::WaitingForOpponent => 0,
            GameState::InProgress => 1,
            GameState::Finished => 2,
        }
    }
}

/// How a finished game was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// A player completed a line and took the pot.
    Winner(Player),
    /// The board filled without a line; both stakes refunded.
    Draw,
    /// The player to move timed out; the waiting player took the pot.
    Forfeit {
        /// Player awarded the pot.
        winner: Player,
    },
    /// The creator withdrew before anyone joined.
    Cancelled,
}

impl Outcome {
    /// Returns the player who took the pot, if any.
    pub fn winner(&self) -> Option<Player> {
        match self {
            Outcome::Winner(player) | Outcome::Forfeit { winner: player } => Some(*player),
            Outcome::Draw | Outcome::Cancelled => None,
        }
    }

    /// Returns true if the game was a draw.
    pub fn is_draw(&self) -> bool {
        matches!(self, Outcome::Draw)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Winner(player) => write!(f, "{} wins", player),
            Outcome::Draw => write!(f, "Draw"),
            Outcome::Forfeit { winner } => write!(f, "{} wins by forfeit", winner),
            Outcome::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// One game and the funds escrowed for it.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct Game {
    /// Sequential identifier.
    id: GameId,
    /// Player one.
    creator: AccountId,
    /// Player two, once joined.
    joiner: Option<AccountId>,
    /// Amount each player escrows.
    stake: Amount,
    /// Current board.
    board: Board,
    /// Lifecycle phase.
    state: GameState,
    /// Player to move; `None` before join and after a draw.
    current_player: Option<Player>,
    /// Occupied cells.
    move_count: u8,
    /// Last accepted move, or game start.
    last_move_at: Timestamp,
    /// Funds held for this game.
    escrowed: Amount,
    /// Cells played, in order.
    history: Vec<Position>,
    /// Settlement, present exactly when finished.
    outcome: Option<Outcome>,
}

impl Game {
    /// Opens a game with the creator's stake escrowed.
    #[instrument(skip(creator), fields(creator = %creator))]
    pub(crate) fn open(id: GameId, creator: AccountId, stake: Amount, now: Timestamp) -> Self {
        Self {
            id,
            creator,
            joiner: None,
            stake,
            board: Board::new(),
            state: GameState::WaitingForOpponent,
            current_player: None,
            move_count: 0,
            last_move_at: now,
            escrowed: stake,
            history: Vec::new(),
            outcome: None,
        }
    }

    /// Account seated as `player`, if seated.
    pub fn account_of(&self, player: Player) -> Option<&AccountId> {
        match player {
            Player::One => Some(&self.creator),
            Player::Two => self.joiner.as_ref(),
        }
    }

    /// Seat held by `account` in this game.
    pub fn player_of(&self, account: &AccountId) -> Option<Player> {
        if *account == self.creator {
            Some(Player::One)
        } else if self.joiner.as_ref() == Some(account) {
            Some(Player::Two)
        } else {
            None
        }
    }

    /// Player waiting on the opponent, while in progress.
    pub fn waiting_player(&self) -> Option<Player> {
        match self.state {
            GameState::InProgress => self.current_player.map(Player::opponent),
            _ => None,
        }
    }

    /// Number of stakes escrowed and not yet paid out.
    pub fn depositors(&self) -> u64 {
        match self.state {
            GameState::WaitingForOpponent => 1,
            GameState::InProgress => 2,
            GameState::Finished => 0,
        }
    }

    /// True once the game is settled.
    pub fn is_finished(&self) -> bool {
        self.state == GameState::Finished
    }

    pub(crate) fn seat_joiner(&mut self, joiner: AccountId, deposit: Amount, now: Timestamp) {
        self.joiner = Some(joiner);
        self.state = GameState::InProgress;
        self.current_player = Some(Player::One);
        self.last_move_at = now;
        self.escrowed += deposit;
    }

    pub(crate) fn place(&mut self, player: Player, position: Position, now: Timestamp) {
        self.board.set(position, Square::Occupied(player));
        self.history.push(position);
        self.move_count += 1;
        self.last_move_at = now;
    }

    pub(crate) fn pass_turn(&mut self) {
        self.current_player = self.current_player.map(Player::opponent);
    }

    /// Marks the game finished and releases its escrow.
    ///
    /// Returns the amount released. The caller pays it out afterwards.
    pub(crate) fn finish(&mut self, outcome: Outcome) -> Amount {
        self.state = GameState::Finished;
        self.outcome = Some(outcome);
        if outcome.is_draw() {
            self.current_player = None;
        }
        std::mem::take(&mut self.escrowed)
    }

    #[cfg(test)]
    pub(crate) fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    #[cfg(test)]
    pub(crate) fn set_escrowed(&mut self, escrowed: Amount) {
        self.escrowed = escrowed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_game() -> Game {
        Game::open(1, AccountId::new("alice"), 1, 100)
    }

    #[test]
    fn test_open_game_waits_with_one_stake() {
        let game = open_game();
        assert_eq!(*game.state(), GameState::WaitingForOpponent);
        assert_eq!(*game.escrowed(), 1);
        assert_eq!(*game.current_player(), None);
        assert_eq!(game.depositors(), 1);
        assert_eq!(game.waiting_player(), None);
    }

    #[test]
    fn test_seats_resolve_both_ways() {
        let mut game = open_game();
        game.seat_joiner(AccountId::new("bob"), 1, 101);
        assert_eq!(game.player_of(&AccountId::new("alice")), Some(Player::One));
        assert_eq!(game.player_of(&AccountId::new("bob")), Some(Player::Two));
        assert_eq!(game.player_of(&AccountId::new("carol")), None);
        assert_eq!(game.account_of(Player::Two), Some(&AccountId::new("bob")));
        assert_eq!(game.waiting_player(), Some(Player::Two));
        assert_eq!(*game.escrowed(), 2);
    }

    #[test]
    fn test_finish_draw_clears_turn_and_escrow() {
        let mut game = open_game();
        game.seat_joiner(AccountId::new("bob"), 1, 101);
        let released = game.finish(Outcome::Draw);
        assert_eq!(released, 2);
        assert_eq!(*game.escrowed(), 0);
        assert_eq!(*game.current_player(), None);
        assert!(game.is_finished());
    }

    #[test]
    fn test_finish_win_keeps_last_mover() {
        let mut game = open_game();
        game.seat_joiner(AccountId::new("bob"), 1, 101);
        game.finish(Outcome::Winner(Player::One));
        assert_eq!(*game.current_player(), Some(Player::One));
        assert_eq!(game.outcome().and_then(|o| o.winner()), Some(Player::One));
    }

    #[test]
    fn test_state_numbering() {
        assert_eq!(GameState::WaitingForOpponent.index(), 0);
        assert_eq!(GameState::InProgress.index(), 1);
        assert_eq!(GameState::Finished.index(), 2);
    }
}
