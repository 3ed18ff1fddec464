use std::fmt;

use tracing::trace;

use crate::piece::{PieceKind, BOX_HEIGHT, BOX_WIDTH};

/// Empty, or the kind of the piece that locked here.
pub type Cell = Option<PieceKind>;

#[derive(Debug, Clone, PartialEq, Eq)]
// choice: Vec of rows, not a const-generic array, since dimensions arrive at runtime
// choice: row-wise, because we'll be searching and clearing rows
// choice: keep the kind in each cell rather than a bit, renderers colour by it
pub struct Grid {
    width: usize,
    rows: Vec<Vec<Cell>>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone, Copy)]
pub enum GridError {
    #[error(
        "a {width}x{height} grid can't hold a piece, it must be at least {min_width}x{min_height}",
        min_width = BOX_WIDTH,
        min_height = BOX_HEIGHT
    )]
    TooSmall { width: usize, height: usize },
    #[error("row {row_n} has {found} cells but row 0 has {expected}")]
    Ragged {
        row_n: usize,
        found: usize,
        expected: usize,
    },
}

fn is_full(row: &[Cell]) -> bool {
    row.iter().all(Option::is_some)
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Result<Self, GridError> {
        Self::from_rows(vec![vec![None; width]; height])
    }

    /// Build a grid from explicit rows, top row first.
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Result<Self, GridError> {
        let width = rows.first().map_or(0, Vec::len);
        if let Some((row_n, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != width) {
            return Err(GridError::Ragged {
                row_n,
                found: row.len(),
                expected: width,
            });
        }
        if width < BOX_WIDTH || rows.len() < BOX_HEIGHT {
            return Err(GridError::TooSmall {
                width,
                height: rows.len(),
            });
        }
        Ok(Self { width, rows })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Horizontally inside the field and not below the floor. Rows above the
    /// field (negative) count as in bounds.
    pub fn in_bounds(&self, col: i32, row: i32) -> bool {
        usize::try_from(col).is_ok_and(|col| col < self.width)
            && usize::try_from(row).map_or(true, |row| row < self.height())
    }

    /// `None` for anything outside the visible field.
    pub fn get(&self, col: i32, row: i32) -> Option<Cell> {
        let (col, row) = (usize::try_from(col).ok()?, usize::try_from(row).ok()?);
        self.rows.get(row)?.get(col).copied()
    }

    /// Cells above the field can never be occupied.
    pub fn is_occupied(&self, col: i32, row: i32) -> bool {
        matches!(self.get(col, row), Some(Some(_)))
    }

    /// Returns `false`, leaving the grid untouched, if the cell is outside the field.
    pub fn set_cell(&mut self, col: i32, row: i32, kind: PieceKind) -> bool {
        let (Ok(col), Ok(row)) = (usize::try_from(col), usize::try_from(row)) else {
            return false;
        };
        match self.rows.get_mut(row).and_then(|cells| cells.get_mut(col)) {
            Some(cell) => {
                *cell = Some(kind);
                true
            }
            None => false,
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(Vec::as_slice)
    }

    pub fn top_row_occupied(&self) -> bool {
        self.rows
            .first()
            .is_some_and(|row| row.iter().any(Option::is_some))
    }

    pub fn occupied_count(&self) -> usize {
        self.rows.iter().flatten().filter(|cell| cell.is_some()).count()
    }

    /// Indices of every full row, bottom to top.
    pub fn full_rows(&self) -> Vec<usize> {
        (0..self.height())
            .rev()
            .filter(|&row_n| is_full(&self.rows[row_n]))
            .collect()
    }

    /// Drop every full row, letting the rows above fall into its place, and
    /// return how many went.
    pub fn clear_full_rows(&mut self) -> usize {
        let full = self.full_rows();
        if full.is_empty() {
            return 0;
        }
        trace!(rows = ?full, "clearing full rows");
        let survivors = self.rows.drain(..).filter(|row| !is_full(row));
        let mut rows = vec![vec![None; self.width]; full.len()];
        rows.extend(survivors);
        self.rows = rows;
        full.len()
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row_n, row) in self.rows().enumerate() {
            if row_n > 0 {
                writeln!(f)?;
            }
            for cell in row {
                write!(f, "{}", cell.map_or('.', PieceKind::letter))?;
            }
        }
        Ok(())
    }
}

/// Grid literal, top row first: `.` for an empty cell, a kind letter for a
/// locked one.
///
/// ```
/// let grid = blockfall::grid![
///     [. . . .],
///     [. . . .],
///     [. . . .],
///     [I I . O],
/// ];
/// assert_eq!(grid.occupied_count(), 3);
/// ```
///
/// # Panics
/// - If the rows are ragged or the grid is smaller than a piece
#[macro_export]
macro_rules! grid {
    (@cell .) => {
        None
    };
    (@cell $kind:ident) => {
        Some($crate::PieceKind::$kind)
    };
    ($([$($cell:tt)*]),* $(,)?) => {
        $crate::Grid::from_rows(vec![$(vec![$($crate::grid!(@cell $cell)),*]),*])
            .expect("grid literal must be rectangular and hold a piece")
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid;

    #[test]
    fn new_grid_is_empty() -> anyhow::Result<()> {
        let grid = Grid::new(10, 20)?;
        assert_eq!((grid.width(), grid.height()), (10, 20));
        assert_eq!(grid.occupied_count(), 0);
        Ok(())
    }

    #[test]
    fn too_small() {
        assert_eq!(
            Grid::new(0, 20),
            Err(GridError::TooSmall {
                width: 0,
                height: 20
            })
        );
        assert!(Grid::new(10, 0).is_err());
        assert!(Grid::new(1, 4).is_err());
        assert!(Grid::new(2, 3).is_err());
        assert!(Grid::new(2, 4).is_ok());
    }

    #[test]
    fn ragged_rows() {
        assert_eq!(
            Grid::from_rows(vec![vec![None; 3], vec![None; 2]]),
            Err(GridError::Ragged {
                row_n: 1,
                found: 2,
                expected: 3
            })
        );
    }

    #[test]
    fn bounds() -> anyhow::Result<()> {
        let grid = Grid::new(4, 6)?;
        assert!(grid.in_bounds(0, 0));
        assert!(grid.in_bounds(3, 5));
        assert!(grid.in_bounds(2, -3));
        assert!(!grid.in_bounds(-1, 0));
        assert!(!grid.in_bounds(4, 0));
        assert!(!grid.in_bounds(4, -2));
        assert!(!grid.in_bounds(0, 6));
        Ok(())
    }

    #[test]
    fn occupancy() -> anyhow::Result<()> {
        let mut grid = Grid::new(4, 6)?;
        assert!(grid.set_cell(1, 5, PieceKind::T));
        assert!(grid.is_occupied(1, 5));
        assert!(!grid.is_occupied(0, 5));
        assert!(!grid.is_occupied(1, -1));
        assert!(!grid.is_occupied(9, 5));
        assert_eq!(grid.get(1, 5), Some(Some(PieceKind::T)));
        Ok(())
    }

    #[test]
    fn out_of_field_writes_are_ignored() -> anyhow::Result<()> {
        let mut grid = Grid::new(4, 6)?;
        assert!(!grid.set_cell(0, -1, PieceKind::I));
        assert!(!grid.set_cell(4, 0, PieceKind::I));
        assert!(!grid.set_cell(0, 6, PieceKind::I));
        assert_eq!(grid, Grid::new(4, 6)?);
        Ok(())
    }

    #[test]
    fn top_row() {
        assert!(!grid![[. .], [. .], [. .], [S S]].top_row_occupied());
        assert!(grid![[. J], [. .], [. .], [. .]].top_row_occupied());
    }

    #[test]
    fn nothing_to_clear() {
        let mut grid = grid![
            [. . .],
            [. . .],
            [O . .],
            [O O .],
        ];
        let before = grid.clone();
        assert_eq!(grid.clear_full_rows(), 0);
        assert_eq!(grid, before);
    }

    #[test]
    fn clear_single_row() {
        let mut grid = grid![
            [. . .],
            [T . .],
            [Z Z .],
            [L L L],
            [. I .],
        ];
        assert_eq!(grid.clear_full_rows(), 1);
        assert_eq!(
            grid,
            grid![
                [. . .],
                [. . .],
                [T . .],
                [Z Z .],
                [. I .],
            ]
        );
    }

    #[test]
    fn clear_non_adjacent_rows() {
        let mut grid = grid![
            [. S .],
            [J J J],
            [. T .],
            [O O O],
            [L . .],
            [I I I],
        ];
        assert_eq!(grid.full_rows(), vec![5, 3, 1]);
        assert_eq!(grid.clear_full_rows(), 3);
        assert_eq!(
            grid,
            grid![
                [. . .],
                [. . .],
                [. . .],
                [. S .],
                [. T .],
                [L . .],
            ]
        );
    }

    #[test]
    fn clear_adjacent_rows() {
        let mut grid = grid![
            [. Z],
            [O O],
            [O O],
            [. I],
        ];
        assert_eq!(grid.clear_full_rows(), 2);
        assert_eq!(grid, grid![[. .], [. .], [. Z], [. I]]);
    }

    #[test]
    fn display() {
        let grid = grid![[. .], [. .], [. J], [S .]];
        assert_eq!(grid.to_string(), "..\n..\n.J\nS.");
    }
}
