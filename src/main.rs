use std::{io, path::PathBuf, str::FromStr};

use anyhow::Context;
use blockfall::{Command, Config, EmptySequence, PieceKind, RotationMode, Session, Snapshot};
use clap::{ArgAction, Parser};
use derive_more::From;
use generic_new::GenericNew;
use recap::Recap;
use serde::Deserialize;
use tracing::level_filters::LevelFilter;

/// Play one line of input on a fresh session and return where it ended up.
fn play(
    config: &Config,
    commands: impl IntoIterator<Item = impl Into<InputCommand>>,
) -> anyhow::Result<Snapshot> {
    let mut session = Session::from_config(config).context("couldn't start a session")?;
    for InputCommand { key, repeat } in commands.into_iter().map(Into::into) {
        for _ in 0..repeat.unwrap_or(1) {
            session.command(key.into());
        }
    }
    Ok(session.snapshot())
}

#[derive(Debug, Parser)]
#[command(about, override_usage = "blockfall [OPTIONS] < input.txt")]
struct Args {
    /// TOML file of session settings. Flags override it.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    width: Option<usize>,
    #[arg(long)]
    height: Option<usize>,
    /// Seed for the piece randomiser
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, value_enum)]
    rotation: Option<RotationMode>,
    /// Deal these kinds in a loop instead of at random, e.g. `OIT`
    #[arg(long)]
    pieces: Option<PieceList>,
    /// Print each final snapshot as JSON
    #[arg(long)]
    json: bool,
    /// Log to stderr, more with each repeat
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(rotation) = self.rotation {
            config.rotation = rotation;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(PieceList(kinds)) = &self.pieces {
            config.pieces = kinds.clone();
        }
        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PieceList(Vec<PieceKind>);

impl FromStr for PieceList {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let kinds = s
            .chars()
            .map(|letter| {
                PieceKind::from_str(&letter.to_string())
                    .with_context(|| format!("{letter:?} isn't a piece kind"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        anyhow::ensure!(!kinds.is_empty(), EmptySequence);
        Ok(Self(kinds))
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);
    let config = args.config().context("couldn't load config")?;
    for line in io::stdin().lines() {
        let input_commands = parse_line(&line.context("couldn't read line from stdin")?)
            .context("couldn't parse line")?;
        let snapshot = play(&config, input_commands)?;
        match args.json {
            true => println!("{}", serde_json::to_string(&snapshot)?),
            false => println!("{snapshot}"),
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
enum Key {
    L,
    R,
    D,
    U,
    T,
}

impl From<Key> for Command {
    fn from(key: Key) -> Self {
        match key {
            Key::L => Command::MoveLeft,
            Key::R => Command::MoveRight,
            Key::D => Command::SoftDrop,
            Key::U => Command::Rotate,
            Key::T => Command::Tick,
        }
    }
}

#[derive(Debug, Deserialize, Recap, PartialEq, Eq, Clone, Copy, GenericNew, From)]
#[recap(regex = r#"^(?P<key>[LRDUT])(?P<repeat>\d+)?$"#)]
struct InputCommand {
    key: Key,
    repeat: Option<usize>,
}

/// A blank line is a game with no moves.
fn parse_line(s: &str) -> anyhow::Result<Vec<InputCommand>> {
    Ok(s.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(InputCommand::from_str)
        .collect::<Result<Vec<_>, _>>()?)
}
