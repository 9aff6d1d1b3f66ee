#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Weighted grid path search and blocked-target resolution.
//!
//! Both entry points run synchronously to completion. They never suspend and
//! never mutate the grid, so any number of agents may share one room grid.

mod probe;
mod search;

pub use probe::nearest_free_cell;
pub use search::build_path;

use dungeon_core::CellCoord;

/// Offsets of the eight neighbours of a cell in the fixed expansion order.
pub(crate) const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Sequence of cells from a start cell to a goal cell.
///
/// Cells are stored last-in-first-out: [`Path::pop_next`] yields the nearest
/// upcoming cell first, beginning with the start cell itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
    cells: Vec<CellCoord>,
}

impl Path {
    /// Builds a path from cells ordered start to goal.
    #[must_use]
    pub fn from_travel_order(mut cells: Vec<CellCoord>) -> Self {
        cells.reverse();
        Self { cells }
    }

    pub(crate) fn from_goal_order(cells: Vec<CellCoord>) -> Self {
        Self { cells }
    }

    /// Removes and returns the nearest upcoming cell.
    pub fn pop_next(&mut self) -> Option<CellCoord> {
        self.cells.pop()
    }

    /// Nearest upcoming cell without consuming it.
    #[must_use]
    pub fn peek_next(&self) -> Option<CellCoord> {
        self.cells.last().copied()
    }

    /// Number of cells left in the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether every cell has been consumed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Remaining cells in travel order, nearest first.
    pub fn iter(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.cells.iter().rev().copied()
    }

    /// Final cell of the path.
    #[must_use]
    pub fn goal(&self) -> Option<CellCoord> {
        self.cells.first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_are_consumed_nearest_first() {
        let start = CellCoord::new(0, 0);
        let middle = CellCoord::new(1, 1);
        let goal = CellCoord::new(2, 1);
        let mut path = Path::from_travel_order(vec![start, middle, goal]);

        assert_eq!(path.goal(), Some(goal));
        assert_eq!(path.iter().collect::<Vec<_>>(), vec![start, middle, goal]);
        assert_eq!(path.pop_next(), Some(start));
        assert_eq!(path.peek_next(), Some(middle));
        assert_eq!(path.pop_next(), Some(middle));
        assert_eq!(path.pop_next(), Some(goal));
        assert!(path.is_empty());
        assert_eq!(path.pop_next(), None);
    }
}
