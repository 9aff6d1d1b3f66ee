use dungeon_core::{CellCoord, CostGrid, GridError};

use crate::NEIGHBOR_OFFSETS;

/// Resolves a possibly blocked target cell to a traversable cell next to it.
///
/// A traversable target is returned unchanged. Otherwise the eight neighbours
/// are scanned column by column and the first traversable one wins. When the
/// target is boxed in, the original cell is returned and the subsequent path
/// search is expected to fail.
pub fn nearest_free_cell(grid: &CostGrid, target: CellCoord) -> Result<CellCoord, GridError> {
    if grid.cost_at(target)?.is_passable() {
        return Ok(target);
    }

    let free = NEIGHBOR_OFFSETS
        .iter()
        .filter_map(|&(column_delta, row_delta)| target.offset(column_delta, row_delta))
        .find(|candidate| grid.is_passable(*candidate));

    Ok(free.unwrap_or(target))
}
