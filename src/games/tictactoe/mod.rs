//! Tic-tac-toe board, marks and rules.

mod position;
pub mod rules;
mod types;

pub use position::Position;
pub use types::{Board, Player, Square};
