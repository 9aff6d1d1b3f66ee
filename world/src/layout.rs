//! Room layouts and the placement rules that turn them into cost grids.

use dungeon_core::{CellCoord, CostGrid, GridError, GridTransform, TileCost};
use thiserror::Error;

/// Default movement penalty applied to plain floor tiles.
pub const DEFAULT_MOVEMENT_PENALTY: TileCost = TileCost::new(40);
/// Movement penalty applied to tiles painted as preferred paths.
pub const PREFERRED_PATH_PENALTY: TileCost = TileCost::new(1);

/// Placement rule authored for a single tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TileKind {
    /// Regular floor that receives the default penalty.
    Floor,
    /// Collision tile that can never be traversed.
    Obstacle,
    /// Tile painted as a preferred route for enemies.
    PreferredPath,
    /// Tile with an explicitly authored penalty.
    Penalty(TileCost),
}

/// Penalties applied when converting tile kinds into traversal costs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PenaltyRules {
    /// Cost of [`TileKind::Floor`] tiles.
    pub default_penalty: TileCost,
    /// Cost of [`TileKind::PreferredPath`] tiles.
    pub preferred_path_penalty: TileCost,
}

impl PenaltyRules {
    /// Resolves the traversal cost of a tile kind.
    #[must_use]
    pub const fn cost_of(&self, kind: TileKind) -> TileCost {
        match kind {
            TileKind::Floor => self.default_penalty,
            TileKind::Obstacle => TileCost::IMPASSABLE,
            TileKind::PreferredPath => self.preferred_path_penalty,
            TileKind::Penalty(cost) => cost,
        }
    }
}

impl Default for PenaltyRules {
    fn default() -> Self {
        Self {
            default_penalty: DEFAULT_MOVEMENT_PENALTY,
            preferred_path_penalty: PREFERRED_PATH_PENALTY,
        }
    }
}

/// Builds a cost grid by resolving the tile kind of every cell.
pub fn build_cost_grid<F>(
    width: u32,
    height: u32,
    transform: GridTransform,
    rules: &PenaltyRules,
    mut tile_at: F,
) -> Result<CostGrid, GridError>
where
    F: FnMut(CellCoord) -> TileKind,
{
    let capacity = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0);
    let mut costs = Vec::with_capacity(capacity);
    for row in 0..height {
        for column in 0..width {
            costs.push(rules.cost_of(tile_at(CellCoord::new(column, row))));
        }
    }
    CostGrid::from_costs(width, height, costs, transform)
}

/// Errors raised while parsing a textual room layout.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// The layout contained no rows or only empty rows.
    #[error("room layout is empty")]
    Empty,
    /// A row had a different width than the first row.
    #[error("layout line {line} has {found} tiles, expected {expected}")]
    RaggedRow {
        /// Zero-based index of the offending text line.
        line: usize,
        /// Width of the first line.
        expected: usize,
        /// Width of the offending line.
        found: usize,
    },
    /// A symbol outside the layout legend was encountered.
    #[error("unknown tile symbol {symbol:?} at line {line}, column {column}")]
    UnknownTile {
        /// The unrecognised symbol.
        symbol: char,
        /// Zero-based index of the text line.
        line: usize,
        /// Zero-based character position within the line.
        column: usize,
    },
}

/// Tile placement parsed from text rows.
///
/// Legend: `#` obstacle, `.` floor, `=` preferred path, `1`-`9` explicit
/// penalty. The first text line is the top of the room, so it maps to the
/// highest row index in the y-up world.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoomLayout {
    width: u32,
    height: u32,
    tiles: Vec<TileKind>,
}

impl RoomLayout {
    /// Parses a layout from text lines ordered top to bottom.
    pub fn parse<I, S>(lines: I) -> Result<Self, LayoutError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parsed: Vec<Vec<TileKind>> = Vec::new();
        for (line_index, line) in lines.into_iter().enumerate() {
            let line = line.as_ref().trim();
            let mut row = Vec::with_capacity(line.len());
            for (column, symbol) in line.chars().enumerate() {
                row.push(tile_from_symbol(symbol).ok_or(LayoutError::UnknownTile {
                    symbol,
                    line: line_index,
                    column,
                })?);
            }

            if let Some(first) = parsed.first() {
                if first.len() != row.len() {
                    return Err(LayoutError::RaggedRow {
                        line: line_index,
                        expected: first.len(),
                        found: row.len(),
                    });
                }
            }
            parsed.push(row);
        }

        let width = parsed.first().map_or(0, Vec::len);
        if width == 0 {
            return Err(LayoutError::Empty);
        }

        let height = parsed.len();
        let tiles = parsed.into_iter().rev().flatten().collect();
        Ok(Self {
            width: u32::try_from(width).unwrap_or(u32::MAX),
            height: u32::try_from(height).unwrap_or(u32::MAX),
            tiles,
        })
    }

    /// Number of tile columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of tile rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Tile kind placed at the provided cell.
    #[must_use]
    pub fn tile(&self, cell: CellCoord) -> Option<TileKind> {
        if cell.column() >= self.width || cell.row() >= self.height {
            return None;
        }
        let width = usize::try_from(self.width).ok()?;
        let index = usize::try_from(cell.row()).ok()? * width + usize::try_from(cell.column()).ok()?;
        self.tiles.get(index).copied()
    }

    /// Converts the layout into a cost grid using the provided penalties.
    pub fn to_cost_grid(
        &self,
        transform: GridTransform,
        rules: &PenaltyRules,
    ) -> Result<CostGrid, GridError> {
        build_cost_grid(self.width, self.height, transform, rules, |cell| {
            self.tile(cell).unwrap_or(TileKind::Obstacle)
        })
    }
}

fn tile_from_symbol(symbol: char) -> Option<TileKind> {
    match symbol {
        '#' => Some(TileKind::Obstacle),
        '.' => Some(TileKind::Floor),
        '=' => Some(TileKind::PreferredPath),
        '1'..='9' => symbol
            .to_digit(10)
            .and_then(|digit| u16::try_from(digit).ok())
            .map(|penalty| TileKind::Penalty(TileCost::new(penalty))),
        _ => None,
    }
}
