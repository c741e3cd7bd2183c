//! Arena simulation module
//!
//! All gameplay logic lives here. This module must stay pure:
//! - One discrete turn per command, no timers
//! - Randomness only through an injected `CellSampler`
//! - Stable entity order (survivors keep their relative order)
//! - No rendering, terminal or file dependencies

pub mod command;
pub mod event;
pub mod spawn;
pub mod state;
pub mod tools;
pub mod turn;

#[cfg(test)]
pub(crate) mod testing;

pub use command::{Command, apply};
pub use event::GameEvent;
pub use spawn::{CellSampler, difficulty_for_level, generate_board, generate_positions};
pub use state::{
    BlasterState, Difficulty, Direction, Entity, EntityKind, GameOverCause, GamePhase, GameState,
    Position, SetupError, ToolStock,
};
pub use tools::{
    cancel_blaster, in_blast_zone, move_blaster_target, teleport, toggle_blaster, use_emp,
};
pub use turn::{advance_level, move_player, move_robots, resolve_collisions};
