use serde::{Deserialize, Serialize};

pub use cell::*;
pub use engine::*;
pub use error::*;
pub use game::*;
pub use types::*;

mod cell;
mod engine;
mod error;
mod game;
mod types;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub rows: Coord,
    pub columns: Coord,
    pub mines: CellCount,
}

impl GameConfig {
    /// Validates raw dimensions and mine count.
    ///
    /// A field must keep at least one safe cell, so `mines` has to be strictly less than the
    /// number of cells.
    pub fn new(rows: u32, columns: u32, mines: u32) -> Result<Self> {
        let invalid_size = GameError::InvalidSize { max: Coord::MAX };
        let rows = Coord::try_from(rows)
            .ok()
            .filter(|&rows| rows > 0)
            .ok_or(invalid_size)?;
        let columns = Coord::try_from(columns)
            .ok()
            .filter(|&columns| columns > 0)
            .ok_or(invalid_size)?;
        if mines == 0 {
            return Err(GameError::NoMines);
        }
        let total_cells = mult(rows, columns);
        let mines = CellCount::try_from(mines)
            .ok()
            .filter(|&mines| mines < total_cells)
            .ok_or(GameError::TooManyMines)?;
        Ok(Self {
            rows,
            columns,
            mines,
        })
    }

    pub const fn size(&self) -> Coord2 {
        (self.rows, self.columns)
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.rows, self.columns)
    }

    pub fn contains(&self, (row, column): Coord2) -> bool {
        row < self.rows && column < self.columns
    }
}

/// Outcome of toggling a flag
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FlagOutcome {
    NoChange,
    Changed,
}

/// Outcome of opening a cell
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OpenOutcome {
    NoChange,
    /// Number of cells revealed, including the flood fill.
    Revealed(CellCount),
    /// The cell holds a mine. Its view is left untouched so the caller can finalize it.
    Detonated,
}
