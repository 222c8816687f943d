use crossterm::{
    QueueableCommand,
    cursor::MoveTo,
    terminal::{Clear, ClearType},
};
use sapper_core::{GameEngine, GameState, Presenter};
use std::io::{self, Write};

/// Line printed once a match is over.
pub const fn outcome_line(state: GameState) -> Option<&'static str> {
    match state {
        GameState::Playing => None,
        GameState::Won => Some("YOU WON!"),
        GameState::Lost => Some("YOU LOST!"),
    }
}

fn digits(value: u8) -> usize {
    value.to_string().len()
}

/// Writes the board with row labels counting down to 1, column labels below and the number of
/// unflagged mines.
///
/// ```text
///
///  Y
///  2  x  ?
///  1  1  x
///
///     1  2 X
/// Mines left: 1
///
/// ```
pub fn write_board(engine: &GameEngine, out: &mut dyn Write) -> io::Result<()> {
    let (rows, columns) = engine.size();
    let label_width = digits(rows).max(2);
    let cell_width = digits(columns).max(2);

    writeln!(out)?;
    writeln!(out, " Y")?;
    for (index, row) in engine.board().rows().into_iter().enumerate() {
        let mut line = format!("{:>label_width$} ", usize::from(rows) - index);
        for cell in row {
            line.push_str(&format!("{:>cell_width$} ", cell.glyph()));
        }
        writeln!(out, "{}", line.trim_end())?;
    }

    writeln!(out)?;
    write!(out, "{:label_width$} ", "")?;
    for column in 1..=columns {
        write!(out, "{column:>cell_width$} ")?;
    }
    writeln!(out, "X")?;
    writeln!(out, "Mines left: {}", engine.mines_left())?;
    writeln!(out)
}

/// Plain-text presenter for a console.
#[derive(Copy, Clone, Debug, Default)]
pub struct TextPresenter {
    clear_screen: bool,
}

impl TextPresenter {
    /// `clear_screen` wipes the terminal before every board; only useful on a real terminal.
    pub fn new(clear_screen: bool) -> Self {
        Self { clear_screen }
    }

    pub fn clear(&self, sink: &mut dyn Write) -> io::Result<()> {
        if self.clear_screen {
            sink.queue(Clear(ClearType::All))?.queue(MoveTo(0, 0))?;
        }
        Ok(())
    }
}

impl Presenter for TextPresenter {
    fn render(&self, engine: &GameEngine, sink: &mut dyn Write) -> io::Result<()> {
        self.clear(sink)?;
        write_board(engine, sink)?;
        sink.flush()
    }

    fn announce(&self, state: GameState, sink: &mut dyn Write) -> io::Result<()> {
        if let Some(line) = outcome_line(state) {
            writeln!(sink, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sapper_core::Coord2;

    fn engine(size: Coord2, mines: &[Coord2]) -> GameEngine {
        let mut engine = GameEngine::new(size.0.into(), size.1.into(), mines.len() as u32).unwrap();
        engine.place_mines_at(mines).unwrap();
        engine.compute_adjacency().unwrap();
        engine
    }

    fn rendered(engine: &GameEngine) -> String {
        let mut out = Vec::new();
        TextPresenter::default().render(engine, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn hidden_board_layout() {
        let engine = engine((3, 3), &[(0, 0)]);

        assert_eq!(
            rendered(&engine),
            "\n Y\n 3  x  x  x\n 2  x  x  x\n 1  x  x  x\n\n    1  2  3 X\nMines left: 1\n\n"
        );
    }

    #[test]
    fn glyphs_for_every_cell_state() {
        let mut engine = engine((2, 2), &[(0, 0)]);
        engine.toggle_flag((0, 1)).unwrap();
        engine.open((1, 1)).unwrap();
        engine.mark_exploded((0, 0)).unwrap();

        assert_eq!(
            rendered(&engine),
            "\n Y\n 2  !  ?\n 1  x  1\n\n    1  2 X\nMines left: 0\n\n"
        );
    }

    #[test]
    fn wide_labels_stay_aligned() {
        let engine = engine((10, 12), &[(0, 0)]);
        let output = rendered(&engine);
        let lines: Vec<_> = output.lines().collect();

        assert_eq!(lines[2], "10  x  x  x  x  x  x  x  x  x  x  x  x");
        assert_eq!(lines[11], " 1  x  x  x  x  x  x  x  x  x  x  x  x");
        assert_eq!(lines[13], "    1  2  3  4  5  6  7  8  9 10 11 12 X");
    }

    #[test]
    fn mines_left_follows_flags() {
        let mut engine = engine((3, 3), &[(0, 0), (2, 2)]);
        assert!(rendered(&engine).contains("\nMines left: 2\n"));

        engine.toggle_flag((1, 1)).unwrap();
        engine.toggle_flag((0, 1)).unwrap();
        engine.toggle_flag((1, 0)).unwrap();
        assert!(rendered(&engine).contains("\nMines left: -1\n"));
    }

    #[test]
    fn announce_prints_outcome() {
        let presenter = TextPresenter::default();
        let mut out = Vec::new();

        presenter.announce(GameState::Playing, &mut out).unwrap();
        presenter.announce(GameState::Lost, &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "YOU LOST!\n");
    }

    #[test]
    fn clearing_emits_escape_codes_only_when_enabled() {
        let mut out = Vec::new();
        TextPresenter::new(false).clear(&mut out).unwrap();
        assert!(out.is_empty());

        TextPresenter::new(true).clear(&mut out).unwrap();
        assert!(out.starts_with(b"\x1b["));
    }
}
