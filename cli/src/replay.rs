use chrono::prelude::*;
use sapper_core::{GameEngine, GameObserver, GameState, Turn};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::input::to_display;
use crate::render::{outcome_line, write_board};

/// File name for a match that started at `started_at`.
pub fn log_file_name(started_at: DateTime<Local>) -> String {
    format!("sapper_{}.log", started_at.format("%Y-%m-%d_%H-%M-%S"))
}

/// Append-only textual record of a match: board snapshots, turns, outcome and duration.
///
/// Write failures are logged once and further records are dropped; the match goes on.
pub struct ReplayLog<W: Write> {
    writer: W,
    broken: bool,
}

impl ReplayLog<BufWriter<File>> {
    pub fn create(dir: &Path, started_at: DateTime<Local>) -> io::Result<(Self, PathBuf)> {
        let path = dir.join(log_file_name(started_at));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        log::debug!("replay log at {}", path.display());
        Ok((Self::new(BufWriter::new(file)), path))
    }
}

impl<W: Write> ReplayLog<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            broken: false,
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.writer
    }

    fn record(&mut self, write: impl FnOnce(&mut W) -> io::Result<()>) {
        if self.broken {
            return;
        }
        if let Err(err) = write(&mut self.writer) {
            log::warn!("Could not write replay log, no further turns are recorded: {}", err);
            self.broken = true;
        }
    }
}

impl<W: Write> GameObserver for ReplayLog<W> {
    fn board_rendered(&mut self, engine: &GameEngine) {
        self.record(|writer| write_board(engine, writer));
    }

    fn turn_applied(&mut self, turn: Turn, engine: &GameEngine) {
        let (x, y) = to_display(turn.coords, engine.size().0);
        self.record(|writer| writeln!(writer, "{} {} {}", x, y, turn.action));
    }

    fn game_over(&mut self, state: GameState) {
        if let Some(line) = outcome_line(state) {
            self.record(|writer| writeln!(writer, "{line}"));
        }
    }

    fn match_finished(&mut self, elapsed_secs: u32) {
        self.record(|writer| {
            writeln!(writer, "Duration: {elapsed_secs} s")?;
            writer.flush()
        });
    }
}
