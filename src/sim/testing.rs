//! Test samplers

use std::collections::VecDeque;

use super::spawn::CellSampler;
use super::state::Position;

/// Replays a fixed list of cells
pub struct Scripted(pub VecDeque<Position>);

impl Scripted {
    pub fn new(cells: impl IntoIterator<Item = Position>) -> Self {
        Self(cells.into_iter().collect())
    }
}

impl CellSampler for Scripted {
    fn sample_cell(&mut self, _width: i32, _height: i32) -> Position {
        self.0.pop_front().expect("script exhausted")
    }
}

/// Always returns the same cell and counts draws
pub struct Fixed {
    pub cell: Position,
    pub draws: u32,
}

impl Fixed {
    pub fn new(cell: Position) -> Self {
        Self { cell, draws: 0 }
    }
}

impl CellSampler for Fixed {
    fn sample_cell(&mut self, _width: i32, _height: i32) -> Position {
        self.draws += 1;
        self.cell
    }
}
