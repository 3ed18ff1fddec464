//! Collision and placement. Every attempt either applies in full or hands back
//! the piece it was given; nothing here fails.

use crate::{
    active::ActivePiece,
    grid::Grid,
    piece::{Position, RotationMode},
};

/// True if any cell is left or right of the field, below the floor, or on an
/// occupied cell. Cells above the field only have their column checked.
pub fn collides(grid: &Grid, piece: &ActivePiece, mode: RotationMode) -> bool {
    piece
        .cells(mode)
        .iter()
        .any(|&Position { col, row }| !grid.in_bounds(col, row) || grid.is_occupied(col, row))
}

/// Returns the translated piece and `true`, or the original piece and `false`
/// if the translation would collide.
pub fn attempt_move(
    grid: &Grid,
    piece: ActivePiece,
    dx: i32,
    dy: i32,
    mode: RotationMode,
) -> (ActivePiece, bool) {
    settle_attempt(grid, piece, piece.translated(dx, dy), mode)
}

/// Advances the rotation index, rolling it back if the new orientation collides.
pub fn attempt_rotate(grid: &Grid, piece: ActivePiece, mode: RotationMode) -> (ActivePiece, bool) {
    settle_attempt(grid, piece, piece.rotated(), mode)
}

fn settle_attempt(
    grid: &Grid,
    original: ActivePiece,
    candidate: ActivePiece,
    mode: RotationMode,
) -> (ActivePiece, bool) {
    if collides(grid, &candidate, mode) {
        (original, false)
    } else {
        (candidate, true)
    }
}

/// Write the piece's kind into every cell it covers and return those cells.
/// The caller has already seen the piece fail to move down.
pub fn lock(grid: &mut Grid, piece: &ActivePiece, mode: RotationMode) -> [Position; 4] {
    let cells = piece.cells(mode);
    for Position { col, row } in cells {
        grid.set_cell(col, row, piece.kind);
    }
    cells
}
