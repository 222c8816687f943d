use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Each dimension must be between 1 and {max}")]
    InvalidSize { max: u8 },
    #[error("At least one mine is required")]
    NoMines,
    #[error("Too many mines")]
    TooManyMines,
    #[error("Coordinates are outside the field")]
    OutOfBounds,
    #[error("Mines were already placed")]
    MinesAlreadyPlaced,
    #[error("Adjacency counts were already computed")]
    AdjacencyComputed,
    #[error("Field is not set up yet")]
    NotReady,
    #[error("Mine layout does not match the configured mine count")]
    InvalidLayout,
    #[error("Cell at the given coordinates cannot explode")]
    NotAMine,
    #[error("Game already ended, no new moves are accepted")]
    AlreadyEnded,
}

/// Failure while driving a match through its collaborators.
#[derive(Error, Debug)]
pub enum PlayError {
    #[error(transparent)]
    Game(#[from] GameError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = core::result::Result<T, GameError>;
