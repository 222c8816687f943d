use sapper_core::{Action, Coord, Coord2, GameConfig, GameError, InputProvider, Turn};
use std::io::{self, BufRead, Write};
use thiserror::Error;

/// Rejected console input. The message is shown to the player before re-prompting.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("Enter only integers. Try again!")]
    NotIntegers,
    #[error("Enter exactly 3 numbers. Try again!")]
    WrongCount,
    #[error("Each argument must be > 0. Try again!")]
    NotPositive,
    #[error("Too many mines, leave at least one free cell. Try again!")]
    TooManyMines,
    #[error("At most {max} rows and columns are supported. Try again!")]
    TooLarge { max: Coord },
    #[error("Enter two coordinates and an action. Try again!")]
    TurnFormat,
    #[error("Enter only valid values. Try again!")]
    NotCoordinates,
    #[error("Your coordinates are out of limits. Try again!")]
    OutOfLimits,
    #[error("Enter only valid Action. Try again!")]
    UnknownAction,
}

/// Parses `rows columns mines`.
pub fn parse_config(line: &str) -> Result<GameConfig, InputError> {
    let values = line
        .split_whitespace()
        .map(str::parse::<i64>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| InputError::NotIntegers)?;

    if values.iter().any(|&value| value <= 0) {
        return Err(InputError::NotPositive);
    }
    let [rows, columns, mines] = values[..] else {
        return Err(InputError::WrongCount);
    };

    let clamp = |value: i64| u32::try_from(value).unwrap_or(u32::MAX);
    GameConfig::new(clamp(rows), clamp(columns), clamp(mines)).map_err(|err| match err {
        GameError::InvalidSize { max } => InputError::TooLarge { max },
        GameError::NoMines => InputError::NotPositive,
        _ => InputError::TooManyMines,
    })
}

/// Parses `X Y Action` in display coordinates for a field of `(rows, columns)`.
///
/// `X` counts columns from 1 on the left, `Y` counts rows from 1 at the bottom.
pub fn parse_turn(line: &str, (rows, columns): Coord2) -> Result<Turn, InputError> {
    let parts: Vec<_> = line.split_whitespace().collect();
    let [x, y, action] = parts[..] else {
        return Err(InputError::TurnFormat);
    };

    let x: i64 = x.parse().map_err(|_| InputError::NotCoordinates)?;
    let y: i64 = y.parse().map_err(|_| InputError::NotCoordinates)?;
    let (Ok(x), Ok(y)) = (Coord::try_from(x), Coord::try_from(y)) else {
        return Err(InputError::OutOfLimits);
    };
    let coords = from_display((x, y), rows)
        .filter(|&(_, column)| column < columns)
        .ok_or(InputError::OutOfLimits)?;

    let action: Action = action.parse().map_err(|_| InputError::UnknownAction)?;
    Ok(Turn::new(coords, action))
}

/// Converts display `(X, Y)` into engine `(row, column)`, if it lies within `rows`.
pub fn from_display((x, y): Coord2, rows: Coord) -> Option<Coord2> {
    let column = x.checked_sub(1)?;
    if y == 0 || y > rows {
        return None;
    }
    Some((rows - y, column))
}

/// Converts engine `(row, column)` into display `(X, Y)`.
pub fn to_display((row, column): Coord2, rows: Coord) -> (u16, u16) {
    (u16::from(column) + 1, u16::from(rows) - u16::from(row))
}

/// Whether an answer to the replay prompt asks for another match.
pub fn wants_replay(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes" | "да")
}

/// Line-oriented prompts over any reader/writer pair, usually stdin and stdout.
pub struct ConsoleInput<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> ConsoleInput<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Asks whether to play again. End of input counts as no.
    pub fn ask_replay(&mut self) -> io::Result<bool> {
        writeln!(self.writer, "\nWant to play one more time? (Y/n)")?;
        match self.read_line() {
            Ok(answer) => Ok(wants_replay(&answer)),
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn read_line(&mut self) -> io::Result<String> {
        self.writer.flush()?;
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        Ok(line)
    }

    fn prompt<T>(
        &mut self,
        prompt: &str,
        parse: impl Fn(&str) -> Result<T, InputError>,
    ) -> io::Result<T> {
        loop {
            writeln!(self.writer, "{prompt}")?;
            let line = self.read_line()?;
            match parse(&line) {
                Ok(value) => return Ok(value),
                Err(err) => {
                    log::debug!("rejected input {:?}: {:?}", line.trim_end(), err);
                    writeln!(self.writer, "{err}")?;
                }
            }
        }
    }
}

impl<R: BufRead, W: Write> InputProvider for ConsoleInput<R, W> {
    fn read_config(&mut self) -> io::Result<GameConfig> {
        self.prompt(
            "Enter number of rows, columns and mines separated by space",
            parse_config,
        )
    }

    fn read_turn(&mut self, size: Coord2) -> io::Result<Turn> {
        self.prompt(
            "Enter coordinates and action in next format: X Y Action\n\
             ('Flag' to set a flag, 'Open' to open a cell)",
            |line| parse_turn(line, size),
        )
    }
}
