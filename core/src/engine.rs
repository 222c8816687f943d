use ndarray::Array2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::*;

/// Setup progress of a field. Valid transitions: `Empty -> Mined -> Ready`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetupPhase {
    /// No mines yet, layout is all zero
    #[default]
    Empty,
    /// Mines placed, adjacency counts still missing
    Mined,
    /// Layout complete, cells can be opened and flagged
    Ready,
}

/// Owns the mine layout and the player-visible board of a single match.
///
/// The engine only reports what happened; deciding when a match is won or lost is left to the
/// caller, see [`Game`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEngine {
    config: GameConfig,
    layout: Array2<LayoutCell>,
    board: Array2<CellView>,
    flag_count: CellCount,
    phase: SetupPhase,
}

impl GameEngine {
    pub fn new(rows: u32, columns: u32, mines: u32) -> Result<Self> {
        GameConfig::new(rows, columns, mines).map(Self::with_config)
    }

    /// Allocates an all-hidden board with an empty layout.
    pub fn with_config(config: GameConfig) -> Self {
        let shape = config.size().to_nd_index();
        Self {
            config,
            layout: Array2::default(shape),
            board: Array2::default(shape),
            flag_count: 0,
            phase: Default::default(),
        }
    }

    pub fn size(&self) -> Coord2 {
        self.config.size()
    }

    pub fn phase(&self) -> SetupPhase {
        self.phase
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.phase, SetupPhase::Ready)
    }

    /// Player-visible board, indexed by `[row, column]`.
    pub fn board(&self) -> &Array2<CellView> {
        &self.board
    }

    /// # Panics
    ///
    /// Panics if `coords` is out of bounds.
    pub fn cell_at(&self, coords: Coord2) -> CellView {
        self.board[coords.to_nd_index()]
    }

    /// # Panics
    ///
    /// Panics if `coords` is out of bounds.
    pub fn layout_at(&self, coords: Coord2) -> LayoutCell {
        self.layout[coords.to_nd_index()]
    }

    pub fn is_mine(&self, coords: Coord2) -> bool {
        self.config.contains(coords) && self.layout_at(coords).is_mine()
    }

    /// How many mines have not been flagged yet, negative when over-flagged
    pub fn mines_left(&self) -> i32 {
        i32::from(self.config.mines) - i32::from(self.flag_count)
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        if self.config.contains(coords) {
            Ok(coords)
        } else {
            Err(GameError::OutOfBounds)
        }
    }

    /// Places the configured number of mines on uniformly random distinct cells.
    ///
    /// Draws are retried on collision until enough distinct cells are mined.
    pub fn place_mines<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        self.check_phase(SetupPhase::Empty)?;

        let (rows, columns) = self.size();
        let mut placed: CellCount = 0;
        let mut draws: u64 = 0;
        while placed < self.config.mines {
            let coords = (rng.random_range(0..rows), rng.random_range(0..columns));
            draws += 1;
            let cell = &mut self.layout[coords.to_nd_index()];
            if !cell.is_mine() {
                *cell = LayoutCell::Mine;
                placed += 1;
            }
        }
        log::debug!("Placed {} mines in {} draws", placed, draws);

        self.phase = SetupPhase::Mined;
        Ok(())
    }

    /// Places mines on exactly the given cells instead of random ones.
    ///
    /// The cells must be distinct, in bounds, and match the configured mine count. Nothing is
    /// placed when validation fails.
    pub fn place_mines_at(&mut self, mine_coords: &[Coord2]) -> Result<()> {
        self.check_phase(SetupPhase::Empty)?;

        let mut distinct = mine_coords
            .iter()
            .map(|&coords| self.validate_coords(coords))
            .collect::<Result<Vec<_>>>()?;
        distinct.sort_unstable();
        distinct.dedup();
        if distinct.len() != usize::from(self.config.mines) || distinct.len() != mine_coords.len() {
            return Err(GameError::InvalidLayout);
        }

        for coords in distinct {
            self.layout[coords.to_nd_index()] = LayoutCell::Mine;
        }
        log::debug!("Placed {} mines from a fixed layout", mine_coords.len());

        self.phase = SetupPhase::Mined;
        Ok(())
    }

    /// Counts mines around every safe cell. Counts never change afterwards.
    pub fn compute_adjacency(&mut self) -> Result<()> {
        match self.phase {
            SetupPhase::Empty => return Err(GameError::NotReady),
            SetupPhase::Ready => return Err(GameError::AdjacencyComputed),
            SetupPhase::Mined => {}
        }

        let (rows, columns) = self.size();
        for row in 0..rows {
            for column in 0..columns {
                let coords = (row, column);
                if self.layout[coords.to_nd_index()].is_mine() {
                    continue;
                }
                let count = self
                    .layout
                    .iter_neighbors(coords)
                    .filter(|&pos| self.layout[pos.to_nd_index()].is_mine())
                    .count();
                // at most 8 neighbours
                self.layout[coords.to_nd_index()] = LayoutCell::Clear(count as u8);
            }
        }

        self.phase = SetupPhase::Ready;
        Ok(())
    }

    /// Opens a hidden cell, flood-filling through zero-count cells.
    ///
    /// Cells that are already revealed or flagged are left alone. Opening a mine changes nothing
    /// and reports [`OpenOutcome::Detonated`].
    pub fn open(&mut self, coords: Coord2) -> Result<OpenOutcome> {
        use OpenOutcome::*;

        let coords = self.validate_coords(coords)?;
        self.check_phase(SetupPhase::Ready)?;

        if !self.board[coords.to_nd_index()].is_hidden() {
            return Ok(NoChange);
        }

        let count = match self.layout[coords.to_nd_index()] {
            LayoutCell::Mine => {
                log::debug!("Mine hit at {:?}", coords);
                return Ok(Detonated);
            }
            LayoutCell::Clear(count) => count,
        };
        self.board[coords.to_nd_index()] = CellView::Revealed(count);
        let mut revealed: CellCount = 1;
        log::debug!("Open cell at {:?}, mine count: {}", coords, count);

        if count == 0 {
            // every pushed cell is already revealed, so nothing is visited twice
            let mut to_visit = vec![coords];
            while let Some(visit_coords) = to_visit.pop() {
                for pos in self.layout.iter_neighbors(visit_coords) {
                    if !self.board[pos.to_nd_index()].is_hidden() {
                        continue;
                    }
                    let LayoutCell::Clear(pos_count) = self.layout[pos.to_nd_index()] else {
                        continue;
                    };

                    self.board[pos.to_nd_index()] = CellView::Revealed(pos_count);
                    revealed += 1;
                    log::trace!("Flood opened cell at {:?}, mine count: {}", pos, pos_count);

                    if pos_count == 0 {
                        to_visit.push(pos);
                    }
                }
            }
        }

        Ok(Revealed(revealed))
    }

    /// Shows a detonated mine as exploded.
    pub fn mark_exploded(&mut self, coords: Coord2) -> Result<()> {
        let coords = self.validate_coords(coords)?;
        self.check_phase(SetupPhase::Ready)?;

        if !self.layout[coords.to_nd_index()].is_mine() {
            return Err(GameError::NotAMine);
        }
        let cell = &mut self.board[coords.to_nd_index()];
        if cell.is_hidden() {
            *cell = CellView::Exploded;
        }
        Ok(())
    }

    /// Flags a hidden cell or unflags a flagged one. Revealed cells cannot be flagged.
    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<FlagOutcome> {
        use CellView::*;
        use FlagOutcome::*;

        let coords = self.validate_coords(coords)?;
        self.check_phase(SetupPhase::Ready)?;

        let cell = &mut self.board[coords.to_nd_index()];
        Ok(match *cell {
            Hidden => {
                *cell = Flagged;
                self.flag_count += 1;
                log::debug!("Flag cell at {:?}", coords);
                Changed
            }
            Flagged => {
                *cell = Hidden;
                self.flag_count -= 1;
                log::debug!("Unflag cell at {:?}", coords);
                Changed
            }
            Revealed(_) | Exploded => NoChange,
        })
    }

    /// Whether the number of flagged mines equals the mine count.
    ///
    /// Flags on safe cells are not counted against the player.
    pub fn win_condition(&self) -> bool {
        let flagged_mines = self
            .board
            .iter()
            .zip(self.layout.iter())
            .filter(|&(&cell, &layout)| cell == CellView::Flagged && layout.is_mine())
            .count();
        flagged_mines == usize::from(self.config.mines)
    }

    fn check_phase(&self, expected: SetupPhase) -> Result<()> {
        if self.phase == expected {
            return Ok(());
        }
        Err(match expected {
            SetupPhase::Empty => GameError::MinesAlreadyPlaced,
            SetupPhase::Mined | SetupPhase::Ready => GameError::NotReady,
        })
    }
}
