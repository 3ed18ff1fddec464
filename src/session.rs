//! The game session: the one stateful object a front end holds.
//!
//! A front end feeds it [`Command`]s one at a time and reads a [`Snapshot`]
//! back whenever it wants to draw. Each command runs to completion, so a
//! snapshot never shows a half-locked piece or a half-cleared grid.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::EnumString;
use tracing::{debug, info};

use crate::{
    active::{spawn_column, ActivePiece},
    config::{Config, Rules},
    engine::{attempt_move, attempt_rotate, collides, lock},
    grid::{Cell, Grid, GridError},
    piece::{PieceKind, Position, Rotation},
};

/// Where the next piece kind comes from.
pub trait PieceSource {
    fn next_kind(&mut self) -> PieceKind;
}

/// Uniform draws over all seven kinds.
#[derive(Debug, Clone)]
pub struct RandomPieces {
    rng: fastrand::Rng,
}

impl RandomPieces {
    pub fn new() -> Self {
        Self {
            rng: fastrand::Rng::new(),
        }
    }

    /// Same seed, same pieces.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }
}

impl Default for RandomPieces {
    fn default() -> Self {
        Self::new()
    }
}

impl PieceSource for RandomPieces {
    fn next_kind(&mut self) -> PieceKind {
        PieceKind::random(&mut self.rng)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone, Copy)]
#[error("a piece sequence needs at least one kind")]
pub struct EmptySequence;

/// Deals the same kinds in order, forever.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceSequence {
    kinds: Vec<PieceKind>,
    next: usize,
}

impl PieceSequence {
    pub fn new(kinds: impl IntoIterator<Item = PieceKind>) -> Result<Self, EmptySequence> {
        let kinds = kinds.into_iter().collect::<Vec<_>>();
        match kinds.is_empty() {
            true => Err(EmptySequence),
            false => Ok(Self { kinds, next: 0 }),
        }
    }
}

impl PieceSource for PieceSequence {
    fn next_kind(&mut self) -> PieceKind {
        let kind = self.kinds[self.next];
        self.next = (self.next + 1) % self.kinds.len();
        kind
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, strum::Display, Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Command {
    MoveLeft,
    MoveRight,
    SoftDrop,
    Rotate,
    /// The fall timer elapsed. Same as [`Command::SoftDrop`].
    Tick,
}

/// What a command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Moved,
    Rotated,
    /// The move or rotation would have collided, so nothing changed.
    Blocked,
    /// The piece couldn't fall any further and is now part of the grid.
    Locked { cleared: usize },
    /// The game is over.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum GameOverReason {
    /// A fresh piece overlapped the stack as it appeared.
    SpawnBlocked,
    /// A locked piece left something in the top row.
    TopRowOccupied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Active,
    GameOver(GameOverReason),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum Event {
    Spawned {
        kind: PieceKind,
        anchor: Position,
    },
    Locked {
        kind: PieceKind,
        cells: [Position; 4],
    },
    RowsCleared {
        count: usize,
        points: u64,
        score: u64,
    },
    GameOver {
        reason: GameOverReason,
        score: u64,
    },
}

pub struct Session {
    grid: Grid,
    // invariant: `Some` exactly while the phase is `Active`
    active: Option<ActivePiece>,
    score: u64,
    phase: Phase,
    rules: Rules,
    pieces: Box<dyn PieceSource>,
    subscribers: Vec<Box<dyn FnMut(&Event)>>,
}

impl Session {
    /// Empty grid, default rules, random pieces.
    pub fn new(width: usize, height: usize) -> Result<Self, GridError> {
        Ok(Self::start(
            Grid::new(width, height)?,
            Rules::default(),
            RandomPieces::new(),
        ))
    }

    /// Deals `config.pieces` in order if there are any, otherwise draws at
    /// random (seeded if `config.seed` is set).
    pub fn from_config(config: &Config) -> Result<Self, GridError> {
        let grid = Grid::new(config.width, config.height)?;
        let pieces: Box<dyn PieceSource> = match PieceSequence::new(config.pieces.iter().copied())
        {
            Ok(sequence) => Box::new(sequence),
            Err(EmptySequence) => Box::new(
                config
                    .seed
                    .map_or_else(RandomPieces::new, RandomPieces::seeded),
            ),
        };
        Ok(Self::start_boxed(grid, config.rules(), pieces))
    }

    /// Start playing on `grid`, which may already hold locked cells. The first
    /// piece is spawned straight away, so the session may already be over.
    pub fn start(grid: Grid, rules: Rules, pieces: impl PieceSource + 'static) -> Self {
        Self::start_boxed(grid, rules, Box::new(pieces))
    }

    fn start_boxed(grid: Grid, rules: Rules, pieces: Box<dyn PieceSource>) -> Self {
        let mut session = Self {
            grid,
            active: None,
            score: 0,
            phase: Phase::Active,
            rules,
            pieces,
            subscribers: Vec::new(),
        };
        session.spawn();
        session
    }

    /// Call `subscriber` with every event from now on. The opening spawn has
    /// already happened by the time anyone can subscribe.
    pub fn subscribe(&mut self, subscriber: impl FnMut(&Event) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn active(&self) -> Option<&ActivePiece> {
        self.active.as_ref()
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_game_over(&self) -> bool {
        matches!(self.phase, Phase::GameOver(_))
    }

    pub fn rules(&self) -> Rules {
        self.rules
    }

    pub fn command(&mut self, command: Command) -> Outcome {
        let Some(piece) = self.active else {
            return Outcome::Ignored;
        };
        match command {
            Command::MoveLeft => self.shift(piece, -1, 0),
            Command::MoveRight => self.shift(piece, 1, 0),
            Command::SoftDrop | Command::Tick => self.shift(piece, 0, 1),
            Command::Rotate => {
                let (piece, rotated) = attempt_rotate(&self.grid, piece, self.rules.rotation);
                self.active = Some(piece);
                match rotated {
                    true => Outcome::Rotated,
                    false => Outcome::Blocked,
                }
            }
        }
    }

    pub fn tick(&mut self) -> Outcome {
        self.command(Command::Tick)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            grid: self.grid.rows().map(<[Cell]>::to_vec).collect(),
            active: self.active.map(|piece| ActiveSnapshot {
                kind: piece.kind,
                rotation: piece.rotation,
                cells: piece.cells(self.rules.rotation),
            }),
            score: self.score,
            game_over: self.is_game_over(),
        }
    }

    fn shift(&mut self, piece: ActivePiece, dx: i32, dy: i32) -> Outcome {
        let (moved_piece, moved) = attempt_move(&self.grid, piece, dx, dy, self.rules.rotation);
        if moved {
            self.active = Some(moved_piece);
            Outcome::Moved
        } else if dy > 0 {
            self.settle(piece)
        } else {
            Outcome::Blocked
        }
    }

    fn settle(&mut self, piece: ActivePiece) -> Outcome {
        let cells = lock(&mut self.grid, &piece, self.rules.rotation);
        self.active = None;
        self.emit(Event::Locked {
            kind: piece.kind,
            cells,
        });

        let cleared = self.grid.clear_full_rows();
        if cleared > 0 {
            let points = self.rules.points_per_line.saturating_mul(cleared as u64);
            self.score = self.score.saturating_add(points);
            self.emit(Event::RowsCleared {
                count: cleared,
                points,
                score: self.score,
            });
        }

        if self.grid.top_row_occupied() {
            self.end(GameOverReason::TopRowOccupied);
        } else {
            self.spawn();
        }
        Outcome::Locked { cleared }
    }

    fn spawn(&mut self) {
        let piece = ActivePiece::spawn(self.pieces.next_kind(), spawn_column(self.grid.width()));
        if collides(&self.grid, &piece, self.rules.rotation) {
            self.end(GameOverReason::SpawnBlocked);
            return;
        }
        self.active = Some(piece);
        self.emit(Event::Spawned {
            kind: piece.kind,
            anchor: piece.anchor,
        });
    }

    fn end(&mut self, reason: GameOverReason) {
        self.active = None;
        self.phase = Phase::GameOver(reason);
        self.emit(Event::GameOver {
            reason,
            score: self.score,
        });
    }

    fn emit(&mut self, event: Event) {
        match &event {
            Event::Spawned { kind, anchor } => debug!(%kind, col = anchor.col, "spawned piece"),
            Event::Locked { kind, cells } => debug!(%kind, ?cells, "locked piece"),
            Event::RowsCleared {
                count,
                points,
                score,
            } => info!(count, points, score, "cleared rows"),
            Event::GameOver { reason, score } => info!(%reason, score, "game over"),
        }
        for subscriber in &mut self.subscribers {
            subscriber(&event);
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("grid", &self.grid)
            .field("active", &self.active)
            .field("score", &self.score)
            .field("phase", &self.phase)
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActiveSnapshot {
    pub kind: PieceKind,
    pub rotation: Rotation,
    pub cells: [Position; 4],
}

/// An owned copy of everything a renderer needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// Locked cells only, top row first.
    pub grid: Vec<Vec<Cell>>,
    /// Gone once the game is over.
    pub active: Option<ActiveSnapshot>,
    pub score: u64,
    pub game_over: bool,
}

impl Snapshot {
    pub fn active_cells(&self) -> Option<[Position; 4]> {
        self.active.map(|active| active.cells)
    }

    fn active_kind_at(&self, col: usize, row: usize) -> Option<PieceKind> {
        let at = Position::new(i32::try_from(col).ok()?, i32::try_from(row).ok()?);
        self.active
            .filter(|active| active.cells.contains(&at))
            .map(|active| active.kind)
    }
}

/// Locked cells in upper case, the falling piece in lower case.
impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row_n, row) in self.grid.iter().enumerate() {
            for (col_n, cell) in row.iter().enumerate() {
                let letter = match (self.active_kind_at(col_n, row_n), cell) {
                    (Some(falling), _) => falling.letter().to_ascii_lowercase(),
                    (None, Some(locked)) => locked.letter(),
                    (None, None) => '.',
                };
                write!(f, "{letter}")?;
            }
            writeln!(f)?;
        }
        write!(f, "score: {}", self.score)?;
        if self.game_over {
            write!(f, "\ngame over")?;
        }
        Ok(())
    }
}
