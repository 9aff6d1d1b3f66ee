use std::cmp::Reverse;
use std::collections::BinaryHeap;

use dungeon_core::{CellCoord, CostGrid, GridError};
use tracing::trace;

use crate::{Path, NEIGHBOR_OFFSETS};

/// Computes the cheapest 8-connected path between two cells of the grid.
///
/// Entering a cell costs that cell's tile cost. The start cell is never
/// charged and may itself be impassable; every other cell on the path is
/// passable. Among equally cheap candidates the one discovered first is
/// expanded first, so repeated searches over the same grid return the same
/// path.
///
/// Returns `Ok(None)` when the goal cannot be reached and an error when either
/// endpoint lies outside the grid.
pub fn build_path(
    grid: &CostGrid,
    start: CellCoord,
    goal: CellCoord,
) -> Result<Option<Path>, GridError> {
    let _ = grid.cost_at(start)?;
    let goal_cost = grid.cost_at(goal)?;

    if start == goal {
        return Ok(Some(Path::from_goal_order(vec![start])));
    }
    if !goal_cost.is_passable() {
        return Ok(None);
    }

    let step_floor = grid
        .min_passable_cost()
        .map_or(0, |cost| u64::from(cost.get()));
    let heuristic = |cell: CellCoord| u64::from(cell.chebyshev_distance(goal)) * step_floor;

    let cell_count = grid.cells().len();
    let mut best_cost = vec![u64::MAX; cell_count];
    let mut came_from: Vec<Option<CellCoord>> = vec![None; cell_count];
    let mut closed = vec![false; cell_count];
    let mut open = BinaryHeap::new();
    let mut sequence: u64 = 0;

    let Some(start_index) = index(grid, start) else {
        return Ok(None);
    };
    best_cost[start_index] = 0;
    open.push(Reverse(OpenEntry {
        estimate: heuristic(start),
        sequence,
        cell: start,
    }));

    while let Some(Reverse(entry)) = open.pop() {
        let Some(current_index) = index(grid, entry.cell) else {
            continue;
        };
        if closed[current_index] {
            continue;
        }
        if entry.cell == goal {
            trace!(pushed = sequence, cost = best_cost[current_index], "path found");
            return Ok(Some(reconstruct(grid, &came_from, goal)));
        }
        closed[current_index] = true;

        let current_cost = best_cost[current_index];
        for neighbor in neighbors(grid, entry.cell) {
            let Some(neighbor_index) = index(grid, neighbor) else {
                continue;
            };
            if closed[neighbor_index] {
                continue;
            }
            let cost = grid.cost_at(neighbor)?;
            if !cost.is_passable() {
                continue;
            }

            let tentative = current_cost + u64::from(cost.get());
            if tentative < best_cost[neighbor_index] {
                best_cost[neighbor_index] = tentative;
                came_from[neighbor_index] = Some(entry.cell);
                sequence += 1;
                open.push(Reverse(OpenEntry {
                    estimate: tentative + heuristic(neighbor),
                    sequence,
                    cell: neighbor,
                }));
            }
        }
    }

    trace!(?start, ?goal, "goal unreachable");
    Ok(None)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct OpenEntry {
    estimate: u64,
    sequence: u64,
    cell: CellCoord,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.estimate
            .cmp(&other.estimate)
            .then(self.sequence.cmp(&other.sequence))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

fn reconstruct(grid: &CostGrid, came_from: &[Option<CellCoord>], goal: CellCoord) -> Path {
    let mut cells = vec![goal];
    let mut current = goal;
    while let Some(previous) = index(grid, current).and_then(|slot| came_from[slot]) {
        cells.push(previous);
        current = previous;
    }
    Path::from_goal_order(cells)
}

fn neighbors(grid: &CostGrid, cell: CellCoord) -> impl Iterator<Item = CellCoord> + '_ {
    NEIGHBOR_OFFSETS
        .iter()
        .filter_map(move |&(column_delta, row_delta)| cell.offset(column_delta, row_delta))
        .filter(move |neighbor| grid.contains(*neighbor))
}

fn index(grid: &CostGrid, cell: CellCoord) -> Option<usize> {
    if !grid.contains(cell) {
        return None;
    }
    let width = usize::try_from(grid.width()).ok()?;
    let row = usize::try_from(cell.row()).ok()?;
    let column = usize::try_from(cell.column()).ok()?;
    Some(row * width + column)
}
