use derive_more::{Add, Display, From};
use serde::{Deserialize, Serialize};
use static_assertions::const_assert_eq;
use strum::{EnumCount, EnumString};

/// Every piece kind is laid out in a box this many columns wide...
pub const BOX_WIDTH: usize = 2;
/// ...and this many rows tall.
pub const BOX_HEIGHT: usize = 4;

/// A `(col, row)` pair. Used both for offsets within a piece's box and for
/// absolute grid coordinates, where `row` may be negative (above the field).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Add, From, Serialize)]
pub struct Position {
    pub col: i32,
    pub row: i32,
}

impl Position {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// Quarter turn clockwise about `pivot`, with rows growing downwards.
    fn turned_clockwise_about(self, pivot: Position) -> Self {
        let (dc, dr) = (self.col - pivot.col, self.row - pivot.row);
        Self::new(pivot.col - dr, pivot.row + dc)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumString,
    EnumCount,
    strum::Display,
    Serialize,
    Deserialize,
)]
pub enum PieceKind {
    I,
    Z,
    S,
    T,
    L,
    J,
    O,
}

const_assert_eq!(PieceKind::ALL.len(), PieceKind::COUNT);

const fn at(col: i32, row: i32) -> Position {
    Position::new(col, row)
}

// choice: named offsets rather than packed box indices, so nothing silently
//         depends on the box being two columns wide
const I_CELLS: [Position; 4] = [at(1, 0), at(1, 1), at(1, 2), at(1, 3)];
const Z_CELLS: [Position; 4] = [at(0, 1), at(0, 2), at(1, 2), at(1, 3)];
const S_CELLS: [Position; 4] = [at(1, 1), at(1, 2), at(0, 2), at(0, 3)];
const T_CELLS: [Position; 4] = [at(1, 1), at(1, 2), at(0, 2), at(1, 3)];
const L_CELLS: [Position; 4] = [at(0, 1), at(1, 1), at(1, 2), at(1, 3)];
const J_CELLS: [Position; 4] = [at(1, 1), at(1, 2), at(1, 3), at(0, 3)];
const O_CELLS: [Position; 4] = [at(0, 1), at(1, 1), at(0, 2), at(1, 2)];

/// Every kind has a cell here, so quarter turns about it keep the piece connected.
const PIVOT: Position = at(1, 2);

impl PieceKind {
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::Z,
        PieceKind::S,
        PieceKind::T,
        PieceKind::L,
        PieceKind::J,
        PieceKind::O,
    ];

    /// The kind's four cells, relative to the anchor, in its spawn orientation.
    pub const fn offsets(self) -> [Position; 4] {
        match self {
            PieceKind::I => I_CELLS,
            PieceKind::Z => Z_CELLS,
            PieceKind::S => S_CELLS,
            PieceKind::T => T_CELLS,
            PieceKind::L => L_CELLS,
            PieceKind::J => J_CELLS,
            PieceKind::O => O_CELLS,
        }
    }

    /// The kind's cells once `rotation` has been applied under `mode`.
    pub fn cells(self, rotation: Rotation, mode: RotationMode) -> [Position; 4] {
        match mode {
            RotationMode::Fixed => self.offsets(),
            RotationMode::QuarterTurn if self == PieceKind::O => self.offsets(),
            RotationMode::QuarterTurn => self.offsets().map(|offset| {
                (0..rotation.index()).fold(offset, |cell, _| cell.turned_clockwise_about(PIVOT))
            }),
        }
    }

    pub fn random(rng: &mut fastrand::Rng) -> Self {
        Self::ALL[rng.usize(..Self::ALL.len())]
    }

    pub fn letter(self) -> char {
        match self {
            PieceKind::I => 'I',
            PieceKind::Z => 'Z',
            PieceKind::S => 'S',
            PieceKind::T => 'T',
            PieceKind::L => 'L',
            PieceKind::J => 'J',
            PieceKind::O => 'O',
        }
    }
}

/// Quarter turns applied to a piece, always in `0..4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, Serialize)]
pub struct Rotation(u8);

impl Rotation {
    pub fn index(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn next(self) -> Self {
        Self((self.0 + 1) % 4)
    }
}

/// How a rotation index maps onto the cells a piece occupies.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum RotationMode {
    /// The rotation index advances but every kind keeps its spawn shape.
    #[default]
    Fixed,
    /// Each step turns the shape 90 degrees clockwise. No wall kicks.
    QuarterTurn,
}
