//! A falling-block puzzle engine.
//!
//! Pieces of seven kinds fall into a fixed grid, can be shifted and rotated,
//! lock when they can fall no further, and clear any rows they complete. A
//! [`Session`] owns all of that state; front ends send it [`Command`]s and
//! draw from its [`Snapshot`]s.
//!
//! ```
//! use blockfall::{Command, Outcome, Session};
//!
//! let mut session = Session::new(10, 20)?;
//! assert_eq!(session.command(Command::SoftDrop), Outcome::Moved);
//! assert_eq!(session.snapshot().score, 0);
//! # Ok::<(), blockfall::GridError>(())
//! ```

pub mod active;
pub mod config;
pub mod engine;
pub mod grid;
pub mod piece;
pub mod session;

pub use active::ActivePiece;
pub use config::{Config, ConfigError, Rules};
pub use grid::{Cell, Grid, GridError};
pub use piece::{PieceKind, Position, Rotation, RotationMode};
pub use session::{
    ActiveSnapshot, Command, EmptySequence, Event, GameOverReason, Outcome, Phase, PieceSequence,
    PieceSource, RandomPieces, Session, Snapshot,
};
