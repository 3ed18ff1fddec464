use serde::Serialize;

use crate::piece::{PieceKind, Position, Rotation, RotationMode};

/// The piece currently falling. Replaced wholesale on every spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActivePiece {
    pub kind: PieceKind,
    pub rotation: Rotation,
    pub anchor: Position,
}

impl ActivePiece {
    /// Fresh piece at the top of the field, in its spawn orientation.
    pub fn spawn(kind: PieceKind, col: i32) -> Self {
        Self {
            kind,
            rotation: Rotation::default(),
            anchor: Position::new(col, 0),
        }
    }

    /// Absolute grid cells this piece covers.
    pub fn cells(&self, mode: RotationMode) -> [Position; 4] {
        self.kind
            .cells(self.rotation, mode)
            .map(|offset| self.anchor + offset)
    }

    #[must_use]
    pub fn translated(self, dx: i32, dy: i32) -> Self {
        Self {
            anchor: self.anchor + Position::new(dx, dy),
            ..self
        }
    }

    #[must_use]
    pub fn rotated(self) -> Self {
        Self {
            rotation: self.rotation.next(),
            ..self
        }
    }
}

/// Column a new piece is anchored at on a grid `width` cells wide.
pub fn spawn_column(width: usize) -> i32 {
    i32::try_from(width / 2)
        .unwrap_or(i32::MAX)
        .saturating_sub(2)
        .max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawns_at_top_unrotated() {
        let piece = ActivePiece::spawn(PieceKind::T, 3);
        assert_eq!(piece.anchor, Position::new(3, 0));
        assert_eq!(piece.rotation, Rotation::default());
    }

    #[test]
    fn cells_are_offset_by_anchor() {
        let piece = ActivePiece::spawn(PieceKind::O, 3).translated(0, 5);
        assert_eq!(
            piece.cells(RotationMode::Fixed),
            [(3, 6), (4, 6), (3, 7), (4, 7)].map(Position::from)
        );
    }

    #[test]
    fn translation_keeps_kind_and_rotation() {
        let piece = ActivePiece::spawn(PieceKind::S, 0).rotated();
        let moved = piece.translated(-1, 2);
        assert_eq!(moved.kind, PieceKind::S);
        assert_eq!(moved.rotation, piece.rotation);
        assert_eq!(moved.anchor, Position::new(-1, 2));
    }

    #[test]
    fn spawn_column_centres_the_box() {
        assert_eq!(spawn_column(10), 3);
        assert_eq!(spawn_column(11), 3);
        assert_eq!(spawn_column(20), 8);
        assert_eq!(spawn_column(4), 0);
        assert_eq!(spawn_column(2), 0);
    }
}
