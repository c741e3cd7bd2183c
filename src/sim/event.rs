//! Output events emitted by engine transitions
//!
//! The host reacts to these (status messages, recording the final score)
//! instead of diffing state between frames.

use serde::{Deserialize, Serialize};

use super::state::{GameOverCause, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    PlayerMoved { to: Position },
    /// An EMP charge absorbed this turn's robot movement
    RobotsFrozen { turns_left: u32 },
    /// A robot stepped toward junk and was wrecked in place
    RobotWrecked { at: Position },
    RobotsMerged { at: Position, count: u32, points: i64 },
    Teleported { to: Position },
    EmpActivated { turns: u32 },
    BlasterArmed { target: Position },
    BlasterTargetMoved { target: Position },
    BlasterCancelled,
    BlasterFired { target: Position, kills: u32, points: i64 },
    LevelAdvanced { level: u32 },
    /// Emitted exactly once, by the transition that ends the run
    GameOver {
        cause: GameOverCause,
        level: u32,
        score: i64,
    },
}
