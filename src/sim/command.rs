//! Discrete player commands
//!
//! The host maps one input event to one `Command`; `apply` routes it to the
//! matching transition and returns what happened.

use serde::{Deserialize, Serialize};

use super::event::GameEvent;
use super::spawn::CellSampler;
use super::state::{Direction, GameState};
use super::{tools, turn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Step the player, or steer the blaster aim while targeting
    Move(Direction),
    Teleport,
    Emp,
    /// Arm the blaster, or fire when already armed
    Blaster,
    /// Disarm the blaster
    Cancel,
}

/// Apply one command and collect the resulting events.
///
/// While the blaster is armed, movement steers the aim and teleport/EMP are
/// ignored. An empty result means the command was a no-op.
pub fn apply<S: CellSampler + ?Sized>(
    state: &mut GameState,
    command: Command,
    sampler: &mut S,
) -> Vec<GameEvent> {
    let mut events = Vec::new();
    let targeting = state.is_targeting();

    match command {
        Command::Move(direction) if targeting => {
            tools::move_blaster_target(state, direction, &mut events);
        }
        Command::Move(direction) => turn::move_player(state, direction, sampler, &mut events),
        Command::Teleport | Command::Emp if targeting => {}
        Command::Teleport => {
            tools::teleport(state, sampler, &mut events);
        }
        Command::Emp => {
            tools::use_emp(state, &mut events);
        }
        Command::Blaster => {
            tools::toggle_blaster(state, sampler, &mut events);
        }
        Command::Cancel => {
            tools::cancel_blaster(state, &mut events);
        }
    }

    events
}
