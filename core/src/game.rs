use chrono::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

use crate::*;

/// What the player does with a cell on their turn
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Open,
    Flag,
}

impl Action {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Flag => "Flag",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct UnknownAction;

impl FromStr for Action {
    type Err = UnknownAction;

    /// Case-sensitive, only `Open` and `Flag` are accepted.
    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        match s {
            "Open" => Ok(Self::Open),
            "Flag" => Ok(Self::Flag),
            _ => Err(UnknownAction),
        }
    }
}

/// A single player command, in engine coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub coords: Coord2,
    pub action: Action,
}

impl Turn {
    pub const fn new(coords: Coord2, action: Action) -> Self {
        Self { coords, action }
    }
}

/// Valid transitions:
/// - Playing -> Won
/// - Playing -> Lost
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    #[default]
    Playing,
    Won,
    Lost,
}

impl GameState {
    /// Indicates the game has ended and no moves can be made anymore
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

/// Represents a match from setup to finish
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Game {
    engine: GameEngine,
    state: GameState,
    move_count: u32,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
}

impl Game {
    /// Sets up a fresh field with random mines.
    pub fn new<R: Rng + ?Sized>(config: GameConfig, rng: &mut R) -> Result<Self> {
        let mut engine = GameEngine::with_config(config);
        engine.place_mines(rng)?;
        engine.compute_adjacency()?;
        Self::from_engine(engine)
    }

    /// Starts a match on an engine whose setup is complete.
    pub fn from_engine(engine: GameEngine) -> Result<Self> {
        if !engine.is_ready() {
            return Err(GameError::NotReady);
        }
        let now = Utc::now();
        log::debug!("started at {}", now);
        Ok(Self {
            engine,
            state: Default::default(),
            move_count: 0,
            started_at: now,
            ended_at: None,
        })
    }

    pub fn engine(&self) -> &GameEngine {
        &self.engine
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn ended(&self) -> bool {
        self.state.is_final()
    }

    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// How many seconds the match has lasted, up to its end if it ended
    pub fn elapsed_secs(&self) -> u32 {
        (self.ended_at.unwrap_or_else(Utc::now) - self.started_at)
            .num_seconds()
            .max(0) as u32
    }

    /// Applies one turn and moves the match to its next state.
    pub fn apply(&mut self, turn: Turn) -> Result<GameState> {
        if self.state.is_final() {
            return Err(GameError::AlreadyEnded);
        }

        let detonated = match turn.action {
            Action::Open => self.engine.open(turn.coords)? == OpenOutcome::Detonated,
            Action::Flag => {
                self.engine.toggle_flag(turn.coords)?;
                false
            }
        };
        self.move_count += 1;

        if detonated {
            self.engine.mark_exploded(turn.coords)?;
            self.mark_ended(GameState::Lost);
        } else if self.engine.win_condition() {
            self.mark_ended(GameState::Won);
        }
        Ok(self.state)
    }

    fn mark_ended(&mut self, state: GameState) {
        let now = Utc::now();
        self.ended_at.replace(now);
        self.state = state;
        log::debug!("ended at {} with {:?}", now, state);
    }
}

/// Source of setup parameters and player turns.
///
/// Implementations are expected to validate and re-prompt on their own; only well-formed values
/// reach the engine.
pub trait InputProvider {
    fn read_config(&mut self) -> io::Result<GameConfig>;

    /// Reads the next turn for a field of the given `(rows, columns)` size.
    fn read_turn(&mut self, size: Coord2) -> io::Result<Turn>;
}

/// Draws the board onto whatever sink it is handed.
pub trait Presenter {
    fn render(&self, engine: &GameEngine, sink: &mut dyn Write) -> io::Result<()>;

    fn announce(&self, state: GameState, sink: &mut dyn Write) -> io::Result<()>;
}

/// Gets told about a match as it progresses, e.g. to keep a replay.
pub trait GameObserver {
    fn board_rendered(&mut self, _engine: &GameEngine) {}

    fn turn_applied(&mut self, _turn: Turn, _engine: &GameEngine) {}

    fn game_over(&mut self, _state: GameState) {}

    fn match_finished(&mut self, _elapsed_secs: u32) {}
}

impl GameObserver for () {}

impl<T: GameObserver> GameObserver for Option<T> {
    fn board_rendered(&mut self, engine: &GameEngine) {
        if let Some(observer) = self {
            observer.board_rendered(engine);
        }
    }

    fn turn_applied(&mut self, turn: Turn, engine: &GameEngine) {
        if let Some(observer) = self {
            observer.turn_applied(turn, engine);
        }
    }

    fn game_over(&mut self, state: GameState) {
        if let Some(observer) = self {
            observer.game_over(state);
        }
    }

    fn match_finished(&mut self, elapsed_secs: u32) {
        if let Some(observer) = self {
            observer.match_finished(elapsed_secs);
        }
    }
}

/// Runs the turn loop until the match is won or lost.
pub fn play(
    game: &mut Game,
    input: &mut impl InputProvider,
    presenter: &impl Presenter,
    sink: &mut dyn Write,
    observer: &mut impl GameObserver,
) -> core::result::Result<GameState, PlayError> {
    while !game.ended() {
        presenter.render(game.engine(), sink)?;
        observer.board_rendered(game.engine());

        let turn = input.read_turn(game.engine().size())?;
        log::debug!("turn {}: {:?}", game.move_count() + 1, turn);
        game.apply(turn)?;
        observer.turn_applied(turn, game.engine());
    }

    let state = game.state();
    presenter.render(game.engine(), sink)?;
    observer.board_rendered(game.engine());
    presenter.announce(state, sink)?;
    observer.game_over(state);
    observer.match_finished(game.elapsed_secs());
    sink.flush()?;
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::SmallRng};
    use std::collections::VecDeque;

    fn game(size: Coord2, mines: &[Coord2]) -> Game {
        let mut engine = GameEngine::new(size.0.into(), size.1.into(), mines.len() as u32).unwrap();
        engine.place_mines_at(mines).unwrap();
        engine.compute_adjacency().unwrap();
        Game::from_engine(engine).unwrap()
    }

    struct Scripted(VecDeque<Turn>);

    impl InputProvider for Scripted {
        fn read_config(&mut self) -> io::Result<GameConfig> {
            Err(io::ErrorKind::UnexpectedEof.into())
        }

        fn read_turn(&mut self, _size: Coord2) -> io::Result<Turn> {
            self.0
                .pop_front()
                .ok_or_else(|| io::ErrorKind::UnexpectedEof.into())
        }
    }

    struct Glyphs;

    impl Presenter for Glyphs {
        fn render(&self, engine: &GameEngine, sink: &mut dyn Write) -> io::Result<()> {
            for row in engine.board().rows() {
                let line: String = row.iter().map(|cell| cell.glyph()).collect();
                writeln!(sink, "{line}")?;
            }
            Ok(())
        }

        fn announce(&self, state: GameState, sink: &mut dyn Write) -> io::Result<()> {
            writeln!(sink, "{state:?}")
        }
    }

    #[derive(Default)]
    struct Recorder {
        renders: usize,
        turns: Vec<Turn>,
        outcome: Option<GameState>,
        finished: bool,
    }

    impl GameObserver for Recorder {
        fn board_rendered(&mut self, _engine: &GameEngine) {
            self.renders += 1;
        }

        fn turn_applied(&mut self, turn: Turn, _engine: &GameEngine) {
            self.turns.push(turn);
        }

        fn game_over(&mut self, state: GameState) {
            self.outcome = Some(state);
        }

        fn match_finished(&mut self, _elapsed_secs: u32) {
            self.finished = true;
        }
    }

    #[test]
    fn action_parsing_is_case_sensitive() {
        assert_eq!("Open".parse::<Action>(), Ok(Action::Open));
        assert_eq!("Flag".parse::<Action>(), Ok(Action::Flag));
        assert_eq!("open".parse::<Action>(), Err(UnknownAction));
        assert_eq!("FLAG".parse::<Action>(), Err(UnknownAction));
        assert_eq!(Action::Flag.to_string(), "Flag");
    }

    #[test]
    fn new_game_is_set_up_and_playing() {
        let mut rng = SmallRng::seed_from_u64(3);
        let game = Game::new(GameConfig::new(5, 6, 7).unwrap(), &mut rng).unwrap();

        assert_eq!(game.state(), GameState::Playing);
        assert!(game.engine().is_ready());
        assert_eq!(game.elapsed_secs(), 0);
    }

    #[test]
    fn from_engine_requires_complete_setup() {
        let engine = GameEngine::new(2, 2, 1).unwrap();

        assert_eq!(Game::from_engine(engine), Err(GameError::NotReady));
    }

    #[test]
    fn opening_a_mine_loses() {
        let mut game = game((2, 2), &[(0, 0)]);

        assert_eq!(game.apply(Turn::new((0, 0), Action::Open)), Ok(GameState::Lost));
        assert_eq!(game.engine().cell_at((0, 0)), CellView::Exploded);
        assert_eq!(
            game.apply(Turn::new((1, 1), Action::Open)),
            Err(GameError::AlreadyEnded)
        );
    }

    #[test]
    fn flagging_every_mine_wins() {
        let mut game = game((2, 2), &[(0, 0)]);

        assert_eq!(game.apply(Turn::new((1, 1), Action::Flag)), Ok(GameState::Playing));
        assert_eq!(game.apply(Turn::new((1, 1), Action::Flag)), Ok(GameState::Playing));
        assert_eq!(game.apply(Turn::new((0, 0), Action::Flag)), Ok(GameState::Won));
        assert_eq!(game.move_count(), 3);
    }

    #[test]
    fn revealing_all_safe_cells_does_not_win_by_itself() {
        let mut game = game((1, 3), &[(0, 2)]);

        assert_eq!(game.apply(Turn::new((0, 0), Action::Open)), Ok(GameState::Playing));
        assert_eq!(game.engine().cell_at((0, 1)), CellView::Revealed(1));
        assert!(!game.ended());
    }

    #[test]
    fn invalid_turn_leaves_game_untouched() {
        let mut game = game((2, 2), &[(0, 0)]);

        assert_eq!(
            game.apply(Turn::new((2, 0), Action::Flag)),
            Err(GameError::OutOfBounds)
        );
        assert_eq!(game.move_count(), 0);
        assert_eq!(game.state(), GameState::Playing);
    }

    #[test]
    fn play_runs_until_win_and_notifies_observer() {
        let mut game = game((2, 2), &[(0, 0)]);
        let mut input = Scripted(VecDeque::from([
            Turn::new((1, 1), Action::Open),
            Turn::new((0, 0), Action::Flag),
        ]));
        let mut sink = Vec::new();
        let mut recorder = Recorder::default();

        let state = play(&mut game, &mut input, &Glyphs, &mut sink, &mut recorder).unwrap();

        assert_eq!(state, GameState::Won);
        assert_eq!(recorder.renders, 3);
        assert_eq!(recorder.turns.len(), 2);
        assert_eq!(recorder.outcome, Some(GameState::Won));
        assert!(recorder.finished);
        let output = String::from_utf8(sink).unwrap();
        assert!(output.ends_with("?x\nx1\nWon\n"), "{output}");
    }

    #[test]
    fn play_reports_loss_with_exploded_cell() {
        let mut game = game((1, 2), &[(0, 1)]);
        let mut input = Scripted(VecDeque::from([Turn::new((0, 1), Action::Open)]));
        let mut sink = Vec::new();

        let state = play(&mut game, &mut input, &Glyphs, &mut sink, &mut ()).unwrap();

        assert_eq!(state, GameState::Lost);
        let output = String::from_utf8(sink).unwrap();
        assert!(output.ends_with("x!\nLost\n"), "{output}");
    }

    #[test]
    fn play_stops_when_input_runs_out() {
        let mut game = game((2, 2), &[(0, 0)]);
        let mut input = Scripted(VecDeque::new());
        let mut observer: Option<Recorder> = None;

        let result = play(&mut game, &mut input, &Glyphs, &mut io::sink(), &mut observer);

        assert!(matches!(result, Err(PlayError::Io(err)) if err.kind() == io::ErrorKind::UnexpectedEof));
        assert_eq!(game.state(), GameState::Playing);
    }
}
