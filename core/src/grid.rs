//! Per-room traversal cost grid and its mapping into world space.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::CellCoord;

/// Movement penalty assigned to a single grid cell.
///
/// Lower values are preferred by the path search. The reserved value zero
/// marks a hard obstacle that is never entered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCost(u16);

impl TileCost {
    /// Cost reserved for cells that cannot be traversed.
    pub const IMPASSABLE: Self = Self(0);

    /// Creates a new tile cost from the provided penalty weight.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Retrieves the raw penalty weight.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }

    /// Reports whether the cost describes a traversable cell.
    #[must_use]
    pub const fn is_passable(&self) -> bool {
        self.0 != 0
    }
}

/// Affine mapping between world positions and room-local cells.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridTransform {
    origin: Vec2,
    cell_size: f32,
}

impl GridTransform {
    /// Creates a transform anchored at `origin`, the lower corner of cell `(0, 0)`.
    #[must_use]
    pub const fn new(origin: Vec2, cell_size: f32) -> Self {
        Self { origin, cell_size }
    }

    /// World position of the lower corner of cell `(0, 0)`.
    #[must_use]
    pub const fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Edge length of a single square cell in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }
}

impl Default for GridTransform {
    fn default() -> Self {
        Self::new(Vec2::ZERO, 1.0)
    }
}

/// Dimensions and placement of a cost grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridBounds {
    /// Number of columns in the grid.
    pub width: u32,
    /// Number of rows in the grid.
    pub height: u32,
    /// World position of the lower corner of cell `(0, 0)`.
    pub origin: Vec2,
}

/// Failures raised by cost grid construction and lookups.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum GridError {
    /// A cell outside the grid was addressed.
    #[error("cell ({column}, {row}) lies outside the {width}x{height} grid")]
    OutOfBounds {
        /// Column of the offending cell.
        column: u32,
        /// Row of the offending cell.
        row: u32,
        /// Width of the grid that rejected the lookup.
        width: u32,
        /// Height of the grid that rejected the lookup.
        height: u32,
    },
    /// The cost buffer length does not match the grid dimensions.
    #[error("a {width}x{height} grid needs {expected} costs but {actual} were supplied")]
    DimensionMismatch {
        /// Requested grid width.
        width: u32,
        /// Requested grid height.
        height: u32,
        /// Number of cells implied by the dimensions.
        expected: usize,
        /// Number of costs actually supplied.
        actual: usize,
    },
    /// The world transform used a non-positive or non-finite cell size.
    #[error("cell size must be a positive finite number, got {0}")]
    InvalidCellSize(f32),
}

/// Dense traversal cost map covering a room's local bounds.
///
/// Costs are stored in row-major order. The grid is built once per room and is
/// only mutated through [`CostGrid::set_cost`] when destructible obstacles
/// change; every read is a plain shared borrow so any number of agents may
/// query it within a tick.
#[derive(Clone, Debug, PartialEq)]
pub struct CostGrid {
    width: u32,
    height: u32,
    costs: Vec<TileCost>,
    transform: GridTransform,
    min_passable: Option<TileCost>,
}

impl CostGrid {
    /// Creates a grid from row-major costs.
    pub fn from_costs(
        width: u32,
        height: u32,
        costs: Vec<TileCost>,
        transform: GridTransform,
    ) -> Result<Self, GridError> {
        let cell_size = transform.cell_size();
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(GridError::InvalidCellSize(cell_size));
        }

        let expected = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(usize::MAX);
        if costs.len() != expected {
            return Err(GridError::DimensionMismatch {
                width,
                height,
                expected,
                actual: costs.len(),
            });
        }

        let min_passable = lowest_passable(&costs);
        Ok(Self {
            width,
            height,
            costs,
            transform,
            min_passable,
        })
    }

    /// Creates a grid where every cell carries the same cost.
    pub fn filled(
        width: u32,
        height: u32,
        cost: TileCost,
        transform: GridTransform,
    ) -> Result<Self, GridError> {
        let count = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0);
        Self::from_costs(width, height, vec![cost; count], transform)
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Dimensions and world-space origin of the grid.
    #[must_use]
    pub const fn bounds(&self) -> GridBounds {
        GridBounds {
            width: self.width,
            height: self.height,
            origin: self.transform.origin(),
        }
    }

    /// Mapping between world positions and cells.
    #[must_use]
    pub const fn transform(&self) -> &GridTransform {
        &self.transform
    }

    /// Row-major cost buffer.
    #[must_use]
    pub fn cells(&self) -> &[TileCost] {
        &self.costs
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.width && cell.row() < self.height
    }

    /// Cost of the provided cell.
    ///
    /// Callers are expected to bounds-check first; an out-of-bounds lookup is
    /// reported as [`GridError::OutOfBounds`] rather than clamped.
    pub fn cost_at(&self, cell: CellCoord) -> Result<TileCost, GridError> {
        self.index(cell)
            .and_then(|index| self.costs.get(index).copied())
            .ok_or_else(|| self.out_of_bounds(cell))
    }

    /// Reports whether the cell is inside the grid and traversable.
    #[must_use]
    pub fn is_passable(&self, cell: CellCoord) -> bool {
        self.cost_at(cell).is_ok_and(|cost| cost.is_passable())
    }

    /// Replaces the cost of a cell, returning the previous value.
    pub fn set_cost(&mut self, cell: CellCoord, cost: TileCost) -> Result<TileCost, GridError> {
        let index = self.index(cell).ok_or_else(|| self.out_of_bounds(cell))?;
        let previous = std::mem::replace(&mut self.costs[index], cost);
        if previous != cost {
            self.min_passable = lowest_passable(&self.costs);
        }
        Ok(previous)
    }

    /// Lowest positive cost present in the grid, if any cell is traversable.
    #[must_use]
    pub const fn min_passable_cost(&self) -> Option<TileCost> {
        self.min_passable
    }

    /// Maps a world position onto the cell that contains it.
    ///
    /// Positions outside the room's bounding rectangle yield `None`.
    #[must_use]
    pub fn world_to_cell(&self, position: Vec2) -> Option<CellCoord> {
        let local = (position - self.transform.origin()) / self.transform.cell_size();
        if !local.is_finite() {
            return None;
        }

        let column = local.x.floor();
        let row = local.y.floor();
        if column < 0.0 || row < 0.0 || column >= self.width as f32 || row >= self.height as f32 {
            return None;
        }

        Some(CellCoord::new(column as u32, row as u32))
    }

    /// World position of the centre of the provided cell.
    #[must_use]
    pub fn cell_to_world(&self, cell: CellCoord) -> Vec2 {
        let size = self.transform.cell_size();
        self.transform.origin()
            + Vec2::new(
                (cell.column() as f32 + 0.5) * size,
                (cell.row() as f32 + 0.5) * size,
            )
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let width = usize::try_from(self.width).ok()?;
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }

    fn out_of_bounds(&self, cell: CellCoord) -> GridError {
        GridError::OutOfBounds {
            column: cell.column(),
            row: cell.row(),
            width: self.width,
            height: self.height,
        }
    }
}

fn lowest_passable(costs: &[TileCost]) -> Option<TileCost> {
    costs.iter().copied().filter(TileCost::is_passable).min()
}
