use anyhow::Context;
use chrono::prelude::*;
use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use rand::{SeedableRng, rngs::SmallRng};
use sapper_core::{Game, GameState, InputProvider, PlayError, play};
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;

use input::ConsoleInput;
use render::TextPresenter;
use replay::ReplayLog;

mod input;
mod render;
mod replay;

#[derive(Parser, Debug)]
#[command(version, about = "Console minesweeper", long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: Verbosity<WarnLevel>,

    /// Force a seed instead of random
    #[arg(short, long)]
    seed: Option<u64>,

    /// Directory replay logs are written to
    #[arg(long, default_value = ".")]
    log_dir: PathBuf,

    /// Do not write a replay log
    #[arg(long)]
    no_replay_log: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.verbose.tracing_level_filter())
        .with_writer(io::stderr)
        .init();

    let seed = args.seed.unwrap_or_else(rand::random);
    log::info!("seed: {}", seed);
    let mut rng = SmallRng::seed_from_u64(seed);

    let mut stdout = io::stdout();
    let presenter = TextPresenter::new(stdout.is_terminal());
    let mut input = ConsoleInput::new(io::stdin().lock(), io::stdout());

    loop {
        presenter.clear(&mut stdout)?;
        writeln!(stdout, "{}", banner())?;

        match run_match(&args, &mut input, &presenter, &mut rng) {
            Ok(state) => log::info!("match finished: {:?}", state),
            Err(PlayError::Io(err)) if err.kind() == io::ErrorKind::UnexpectedEof => {
                log::debug!("input closed");
                break;
            }
            Err(err) => return Err(err).context("match aborted"),
        }

        if !input.ask_replay()? {
            break;
        }
    }

    writeln!(stdout, "Thanks for playing!")?;
    Ok(())
}

fn banner() -> String {
    format!(
        "WELCOME TO SAPPER!\nVersion: {}\nMade by: {}\n",
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_AUTHORS")
    )
}

fn run_match<R: BufRead, W: Write>(
    args: &Args,
    input: &mut ConsoleInput<R, W>,
    presenter: &TextPresenter,
    rng: &mut SmallRng,
) -> Result<GameState, PlayError> {
    let config = input.read_config()?;
    log::debug!("config: {:?}", config);
    let mut game = Game::new(config, rng)?;

    let mut replay = if args.no_replay_log {
        None
    } else {
        let started_at = game.started_at().with_timezone(&Local);
        match ReplayLog::create(&args.log_dir, started_at) {
            Ok((log, path)) => {
                log::info!("recording replay to {}", path.display());
                Some(log)
            }
            Err(err) => {
                log::warn!("Could not open replay log in {}: {}", args.log_dir.display(), err);
                None
            }
        }
    };

    play(&mut game, input, presenter, &mut io::stdout(), &mut replay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_flags() {
        let args = Args::try_parse_from(["sapper", "--seed", "42", "--no-replay-log", "-v"]).unwrap();

        assert_eq!(args.seed, Some(42));
        assert!(args.no_replay_log);
        assert_eq!(args.log_dir, PathBuf::from("."));
    }

    #[test]
    fn banner_names_version_and_authors() {
        let banner = banner();

        assert!(banner.starts_with("WELCOME TO SAPPER!\n"));
        assert!(banner.contains(&format!("Version: {}\n", env!("CARGO_PKG_VERSION"))));
        assert!(banner.contains("Made by: Bodrov Egor\n"));
    }

    #[test]
    fn scripted_match_reprompts_and_wins_by_flagging() {
        let args = Args::try_parse_from(["sapper", "--no-replay-log"]).unwrap();
        let script = "0 0 0\n1 2 1\n1 1 Flag\n2 1 Flag\n";
        let mut input = ConsoleInput::new(script.as_bytes(), Vec::new());
        let mut rng = SmallRng::seed_from_u64(5);

        // the 2x1 field gets one mine, so one of the two flags lands on it
        let state = run_match(&args, &mut input, &TextPresenter::default(), &mut rng).unwrap();

        assert_eq!(state, GameState::Won);
    }
}
