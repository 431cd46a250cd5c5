//! Game rules for tic-tac-toe.
//!
//! Pure functions over a [`Board`](super::Board). Rules are kept apart from
//! the escrow registry so that money never depends on anything but the
//! board they evaluate.

pub mod draw;
pub mod win;

pub use draw::{is_draw, is_full};
pub use win::{check_winner, has_line, LINES};
