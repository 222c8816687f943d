use serde::{Deserialize, Serialize};

/// Player-visible state of a single cell.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellView {
    #[default]
    Hidden,
    Flagged,
    Revealed(u8),
    Exploded,
}

impl CellView {
    pub const fn is_hidden(self) -> bool {
        matches!(self, Self::Hidden)
    }

    /// Character used for this cell in the printed field.
    pub const fn glyph(self) -> char {
        match self {
            Self::Hidden => 'x',
            Self::Flagged => '?',
            Self::Revealed(count) => (b'0' + count) as char,
            Self::Exploded => '!',
        }
    }
}

/// What the mine layout holds for a cell, fixed once the field is set up.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutCell {
    Mine,
    Clear(u8),
}

impl LayoutCell {
    pub const fn is_mine(self) -> bool {
        matches!(self, Self::Mine)
    }

    /// `-1` for a mine, otherwise the number of adjacent mines.
    pub const fn value(self) -> i8 {
        match self {
            Self::Mine => -1,
            Self::Clear(count) => count as i8,
        }
    }
}

impl Default for LayoutCell {
    fn default() -> Self {
        Self::Clear(0)
    }
}
