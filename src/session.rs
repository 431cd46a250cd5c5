//! Sandbox execution environment for the registry.
//!
//! A [`Session`] stands in for the chain the registry would run on: it
//! serializes calls, stamps each one with a block time, collects the value
//! attached to payable calls from the caller's wallet, and hands that value
//! back when the registry rejects the call.

use crate::config::WagerConfig;
use crate::games::tictactoe::Position;
use crate::registry::{
    AccountId, Amount, GameId, GameRegistry, InMemoryTreasury, RegistryError, RegistryEvent,
    Timestamp, TransferError,
};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// One call submitted to the sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum Call {
    /// Open a game, attaching the stake.
    Create {
        /// Calling account.
        caller: AccountId,
        /// Attached value.
        value: Amount,
    },
    /// Join an open game, attaching the stake.
    Join {
        /// Calling account.
        caller: AccountId,
        /// Target game.
        game_id: GameId,
        /// Attached value.
        value: Amount,
    },
    /// Withdraw an unjoined game.
    Cancel {
        /// Calling account.
        caller: AccountId,
        /// Target game.
        game_id: GameId,
    },
    /// Place a mark.
    MakeMove {
        /// Calling account.
        caller: AccountId,
        /// Target game.
        game_id: GameId,
        /// Target cell, by number or label.
        cell: Cell,
    },
    /// Claim the pot from an idle opponent.
    Punish {
        /// Calling account.
        caller: AccountId,
        /// Target game.
        game_id: GameId,
    },
    /// Move the block clock forward without calling the registry.
    Advance {
        /// Seconds to skip.
        seconds: u64,
    },
}

impl std::fmt::Display for Call {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Call::Create { caller, value } => write!(f, "{} create (value {})", caller, value),
            Call::Join {
                caller,
                game_id,
                value,
            } => write!(f, "{} join #{} (value {})", caller, game_id, value),
            Call::Cancel { caller, game_id } => write!(f, "{} cancel #{}", caller, game_id),
            Call::MakeMove {
                caller,
                game_id,
                cell,
            } => write!(f, "{} move #{} cell {}", caller, game_id, cell),
            Call::Punish { caller, game_id } => write!(f, "{} punish #{}", caller, game_id),
            Call::Advance { seconds } => write!(f, "advance {}s", seconds),
        }
    }
}

/// A board cell as written in a script: its number (`cell = 4`) or its
/// label (`cell = "center"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// Cell number. Out-of-range numbers are passed on and rejected by the
    /// registry.
    Index(usize),
    /// Position label such as `"top-left"`, or a number written as text.
    Label(String),
}

impl Cell {
    /// Cell number this refers to, or `None` for an unknown label.
    pub fn resolve(&self) -> Option<usize> {
        match self {
            Cell::Index(index) => Some(*index),
            Cell::Label(label) => Position::from_label_or_number(label).map(Position::to_index),
        }
    }
}

impl From<usize> for Cell {
    fn from(index: usize) -> Self {
        Cell::Index(index)
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Index(index) => write!(f, "{}", index),
            Cell::Label(label) => f.write_str(label),
        }
    }
}

/// What an accepted call produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CallOutcome {
    /// A game was opened.
    Created {
        /// Identifier of the new game.
        game_id: GameId,
    },
    /// The registry accepted the call.
    Accepted,
    /// The clock moved.
    Advanced {
        /// Block time after the advance.
        now: Timestamp,
    },
}

/// Errors surfaced by the sandbox.
#[derive(Debug, derive_more::Display, derive_more::From)]
pub enum SessionError {
    /// The registry rejected the call.
    #[display("Registry rejected call: {_0}")]
    Registry(RegistryError),
    /// The attached value could not be collected.
    #[display("Value transfer failed: {_0}")]
    Transfer(TransferError),
    /// A script could not be loaded.
    #[display("{_0}")]
    Script(ScriptError),
    /// A move named a cell label that is not on the board.
    #[display("Unknown cell {label:?}")]
    #[from(skip)]
    UnknownCell {
        /// Label as written.
        label: String,
    },
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Registry(e) => Some(e),
            SessionError::Transfer(e) => Some(e),
            SessionError::Script(e) => Some(e),
            SessionError::UnknownCell { .. } => None,
        }
    }
}

/// Script loading error.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Script error: {} at {}:{}", message, file, line)]
pub struct ScriptError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ScriptError {
    /// Creates a new script error.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// Opening balance for one account.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize, derive_new::new)]
pub struct Funding {
    /// Funded account.
    account: AccountId,
    /// Starting balance.
    balance: Amount,
}

/// A scripted session: who starts with what, then the calls in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct Script {
    /// Opening balances.
    #[serde(default)]
    accounts: Vec<Funding>,
    /// Calls, submitted in order.
    #[serde(default)]
    calls: Vec<Call>,
}

impl Script {
    /// Creates a script from its parts.
    pub fn new(accounts: Vec<Funding>, calls: Vec<Call>) -> Self {
        Self { accounts, calls }
    }

    /// Loads a script from a TOML file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ScriptError> {
        debug!("Loading script from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ScriptError::new(format!("Failed to read script file: {}", e)))?;
        let script = Self::from_toml(&content)?;
        info!(
            accounts = script.accounts.len(),
            calls = script.calls.len(),
            "Script loaded successfully"
        );
        Ok(script)
    }

    /// Parses a script from TOML text.
    ///
    /// # Errors
    ///
    /// Fails on malformed TOML or an unknown call kind.
    pub fn from_toml(content: &str) -> Result<Self, ScriptError> {
        toml::from_str(content).map_err(|e| ScriptError::new(format!("Failed to parse script: {}", e)))
    }
}

/// Result of one scripted call.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize)]
pub struct CallReport {
    /// Block time the call ran at.
    at: Timestamp,
    /// The call as submitted.
    call: Call,
    /// What it produced, when accepted.
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<CallOutcome>,
    /// Why it failed, when rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl CallReport {
    /// True if the call was accepted.
    pub fn is_accepted(&self) -> bool {
        self.outcome.is_some()
    }
}

/// Serial execution environment around one registry.
#[derive(Debug, Clone)]
pub struct Session {
    registry: GameRegistry<InMemoryTreasury>,
    clock: Timestamp,
}

impl Session {
    /// Creates a session with an empty ledger. The clock starts at zero.
    #[instrument]
    pub fn new(config: WagerConfig) -> Self {
        info!("Creating sandbox session");
        Self {
            registry: GameRegistry::new(config, InMemoryTreasury::new()),
            clock: 0,
        }
    }

    /// Creates a session and applies a script's opening balances.
    ///
    /// # Errors
    ///
    /// Fails if a balance would overflow.
    #[instrument(skip(script))]
    pub fn with_accounts(config: WagerConfig, script: &Script) -> Result<Self, SessionError> {
        let mut session = Self::new(config);
        for funding in script.accounts() {
            session.fund(funding.account(), *funding.balance())?;
        }
        Ok(session)
    }

    /// Credits an account's wallet.
    ///
    /// # Errors
    ///
    /// Fails if the balance would overflow.
    pub fn fund(&mut self, account: &AccountId, amount: Amount) -> Result<(), SessionError> {
        self.registry.treasury_mut().fund(account, amount)?;
        debug!(account = %account, amount, "Account funded");
        Ok(())
    }

    /// Wallet balance of an account.
    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.registry.treasury().balance_of(account)
    }

    /// Current block time.
    pub fn now(&self) -> Timestamp {
        self.clock
    }

    /// Moves the clock forward and returns the new time.
    pub fn advance(&mut self, seconds: u64) -> Timestamp {
        self.clock = self.clock.saturating_add(seconds);
        debug!(now = self.clock, "Clock advanced");
        self.clock
    }

    /// The registry under test.
    pub fn registry(&self) -> &GameRegistry<InMemoryTreasury> {
        &self.registry
    }

    /// The registry under test, mutably.
    pub fn registry_mut(&mut self) -> &mut GameRegistry<InMemoryTreasury> {
        &mut self.registry
    }

    /// Committed registry events.
    pub fn events(&self) -> &[RegistryEvent] {
        self.registry.events()
    }

    /// Submits one call in its own block.
    ///
    /// Every call except [`Call::Advance`] ticks the clock by one second
    /// before it is dispatched, so a rejected call still uses up its block.
    /// A rejected call leaves every balance as it was.
    ///
    /// # Errors
    ///
    /// [`SessionError::Transfer`] if the caller cannot cover the attached
    /// value, [`SessionError::UnknownCell`] for a label that names no cell,
    /// [`SessionError::Registry`] if the registry rejects the call.
    #[instrument(skip(self), fields(call = %call))]
    pub fn submit(&mut self, call: &Call) -> Result<CallOutcome, SessionError> {
        match call {
            Call::Advance { seconds } => Ok(CallOutcome::Advanced {
                now: self.advance(*seconds),
            }),
            Call::Create { caller, value } => {
                let now = self.tick();
                let game_id =
                    self.with_value(caller, *value, |registry| registry.create(caller, *value, now))?;
                Ok(CallOutcome::Created { game_id })
            }
            Call::Join {
                caller,
                game_id,
                value,
            } => {
                let now = self.tick();
                self.with_value(caller, *value, |registry| {
                    registry.join(*game_id, caller, *value, now)
                })?;
                Ok(CallOutcome::Accepted)
            }
            Call::Cancel { caller, game_id } => {
                self.tick();
                self.registry.cancel(*game_id, caller)?;
                Ok(CallOutcome::Accepted)
            }
            Call::MakeMove {
                caller,
                game_id,
                cell,
            } => {
                let now = self.tick();
                let index = cell.resolve().ok_or_else(|| SessionError::UnknownCell {
                    label: cell.to_string(),
                })?;
                self.registry.make_move(*game_id, caller, index, now)?;
                Ok(CallOutcome::Accepted)
            }
            Call::Punish { caller, game_id } => {
                let now = self.tick();
                self.registry.punish_current_player(*game_id, caller, now)?;
                Ok(CallOutcome::Accepted)
            }
        }
    }

    /// Submits every call of a script in order.
    ///
    /// Rejected calls are reported and do not stop the run.
    #[instrument(skip(self, script), fields(calls = script.calls().len()))]
    pub fn run(&mut self, script: &Script) -> Vec<CallReport> {
        script
            .calls()
            .iter()
            .map(|call| {
                let result = self.submit(call);
                let report = CallReport {
                    at: self.clock,
                    call: call.clone(),
                    outcome: result.as_ref().ok().copied(),
                    error: result.as_ref().err().map(ToString::to_string),
                };
                match &report.error {
                    Some(error) => warn!(call = %call, %error, "Call rejected"),
                    None => debug!(call = %call, "Call accepted"),
                }
                report
            })
            .collect()
    }

    fn tick(&mut self) -> Timestamp {
        self.clock = self.clock.saturating_add(1);
        self.clock
    }

    /// Collects `value` from `caller`, runs the call, and returns the value
    /// if the registry rejects it.
    fn with_value<R>(
        &mut self,
        caller: &AccountId,
        value: Amount,
        call: impl FnOnce(&mut GameRegistry<InMemoryTreasury>) -> Result<R, RegistryError>,
    ) -> Result<R, SessionError> {
        self.registry.treasury_mut().collect(caller, value)?;
        match call(&mut self.registry) {
            Ok(result) => Ok(result),
            Err(e) => {
                self.registry.treasury_mut().return_collected(caller, value);
                debug!(account = %caller, value, "Attached value returned");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> AccountId {
        AccountId::new("alice")
    }

    fn funded() -> Session {
        let mut session = Session::new(WagerConfig::default());
        session.fund(&alice(), 3).unwrap();
        session
    }

    #[test]
    fn test_each_call_ticks_the_clock() {
        let mut session = funded();
        session
            .submit(&Call::Create {
                caller: alice(),
                value: 1,
            })
            .unwrap();
        assert_eq!(session.now(), 1);
        let game = session.registry().game(1).unwrap();
        assert_eq!(*game.last_move_at(), 1);
    }

    #[test]
    fn test_rejected_call_still_uses_its_block() {
        let mut session = funded();
        session
            .submit(&Call::Cancel {
                caller: alice(),
                game_id: 9,
            })
            .unwrap_err();
        assert_eq!(session.now(), 1);
    }

    #[test]
    fn test_cell_labels_resolve_to_numbers() {
        assert_eq!(Cell::from(4).resolve(), Some(4));
        assert_eq!(Cell::Label("Top-left".to_string()).resolve(), Some(0));
        assert_eq!(Cell::Label("8".to_string()).resolve(), Some(8));
        assert_eq!(Cell::Label("corner".to_string()).resolve(), None);
    }

    #[test]
    fn test_unknown_cell_label_is_rejected() {
        let mut session = funded();
        let err = session
            .submit(&Call::MakeMove {
                caller: alice(),
                game_id: 1,
                cell: Cell::Label("corner".to_string()),
            })
            .unwrap_err();
        assert!(matches!(err, SessionError::UnknownCell { ref label } if label == "corner"));
    }

    #[test]
    fn test_advance_does_not_tick() {
        let mut session = funded();
        let outcome = session.submit(&Call::Advance { seconds: 10 }).unwrap();
        assert_eq!(outcome, CallOutcome::Advanced { now: 10 });
    }

    #[test]
    fn test_rejected_call_returns_value() {
        let mut session = funded();
        let err = session
            .submit(&Call::Create {
                caller: alice(),
                value: 2,
            })
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::Registry(RegistryError::InvalidStake { .. })
        ));
        assert_eq!(session.balance_of(&alice()), 3);
        assert_eq!(session.registry().treasury().held(), 0);
    }

    #[test]
    fn test_insufficient_funds_never_reaches_registry() {
        let mut session = Session::new(WagerConfig::default());
        let err = session
            .submit(&Call::Create {
                caller: alice(),
                value: 1,
            })
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::Transfer(TransferError::InsufficientFunds { .. })
        ));
        assert_eq!(session.registry().total_games_created(), 1);
    }

    #[test]
    fn test_script_parses_tagged_calls() {
        let script = Script::from_toml(
            r#"
            [[accounts]]
            account = "alice"
            balance = 5

            [[calls]]
            call = "create"
            caller = "alice"
            value = 1

            [[calls]]
            call = "advance"
            seconds = 30

            [[calls]]
            call = "make_move"
            caller = "alice"
            game_id = 1
            cell = 4

            [[calls]]
            call = "make_move"
            caller = "alice"
            game_id = 1
            cell = "bottom-right"
            "#,
        )
        .unwrap();
        assert_eq!(script.accounts(), &vec![Funding::new(alice(), 5)]);
        assert_eq!(script.calls().len(), 4);
        assert_eq!(script.calls()[1], Call::Advance { seconds: 30 });
        assert!(matches!(
            &script.calls()[2],
            Call::MakeMove { cell: Cell::Index(4), .. }
        ));
        assert!(matches!(
            &script.calls()[3],
            Call::MakeMove { cell: Cell::Label(label), .. } if label == "bottom-right"
        ));
    }

    #[test]
    fn test_unknown_call_kind_is_rejected() {
        let err = Script::from_toml("[[calls]]\ncall = \"resign\"\ncaller = \"alice\"").unwrap_err();
        assert!(err.message.starts_with("Failed to parse script"));
    }

    #[test]
    fn test_run_reports_rejections_and_continues() {
        let script = Script::new(
            vec![Funding::new(alice(), 2)],
            vec![
                Call::Cancel {
                    caller: alice(),
                    game_id: 7,
                },
                Call::Create {
                    caller: alice(),
                    value: 1,
                },
            ],
        );
        let mut session = Session::with_accounts(WagerConfig::default(), &script).unwrap();
        let reports = session.run(&script);
        assert!(!reports[0].is_accepted());
        assert_eq!(
            *reports[1].outcome(),
            Some(CallOutcome::Created { game_id: 1 })
        );
        assert_eq!(*reports[1].at(), 2);
    }
}
