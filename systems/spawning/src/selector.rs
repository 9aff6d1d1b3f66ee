use std::ops::Range;

use dungeon_core::{DungeonLevel, SpawnableByLevel};
use rand::Rng;

/// Contiguous slice of the draw space owned by one spawn entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChanceBoundary<T> {
    item: T,
    range: Range<u64>,
}

impl<T> ChanceBoundary<T> {
    /// Entry that is selected when a draw lands in [`Self::range`].
    #[must_use]
    pub const fn item(&self) -> &T {
        &self.item
    }

    /// Half-open range of draw values mapped to the entry.
    #[must_use]
    pub fn range(&self) -> Range<u64> {
        self.range.clone()
    }
}

/// Cumulative ratio table built for a single dungeon level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChanceTable<T> {
    boundaries: Vec<ChanceBoundary<T>>,
    total: u64,
}

impl<T> ChanceTable<T> {
    /// Sum of every ratio in the table.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Boundaries in table order.
    #[must_use]
    pub fn boundaries(&self) -> &[ChanceBoundary<T>] {
        &self.boundaries
    }

    /// Reports whether no draw can select anything.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Entry whose range contains `value`, first match wins.
    #[must_use]
    pub fn lookup(&self, value: u64) -> Option<&T> {
        self.boundaries
            .iter()
            .find(|boundary| boundary.range.contains(&value))
            .map(ChanceBoundary::item)
    }
}

/// Picks spawn entries with probability proportional to their ratio.
///
/// Tables are filtered by level and rebuilt on every call so a level change
/// can never leave a stale table behind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeightedSpawnSelector<T> {
    tables: Vec<SpawnableByLevel<T>>,
}

impl<T> Default for WeightedSpawnSelector<T> {
    fn default() -> Self {
        Self { tables: Vec::new() }
    }
}

impl<T: Clone> WeightedSpawnSelector<T> {
    /// Creates a selector over per-level spawn tables.
    #[must_use]
    pub fn new(tables: Vec<SpawnableByLevel<T>>) -> Self {
        Self { tables }
    }

    /// Per-level tables the selector draws from.
    #[must_use]
    pub fn tables(&self) -> &[SpawnableByLevel<T>] {
        &self.tables
    }

    /// Builds the cumulative table for the provided level.
    #[must_use]
    pub fn chance_table(&self, level: DungeonLevel) -> ChanceTable<T> {
        let mut boundaries = Vec::new();
        // Summed in u64 so any number of u32 ratios keeps every range exact.
        let mut total: u64 = 0;
        for ratio in self
            .tables
            .iter()
            .filter(|table| table.level() == level)
            .flat_map(SpawnableByLevel::ratios)
        {
            let start = total;
            total = total.saturating_add(u64::from(ratio.ratio()));
            boundaries.push(ChanceBoundary {
                item: ratio.item().clone(),
                range: start..total,
            });
        }
        ChanceTable { boundaries, total }
    }

    /// Draws an entry for the provided level.
    ///
    /// Returns `None` when the level has no entries or every ratio is zero.
    pub fn select<R>(&self, level: DungeonLevel, rng: &mut R) -> Option<T>
    where
        R: Rng + ?Sized,
    {
        let table = self.chance_table(level);
        if table.is_empty() {
            return None;
        }
        let value = rng.gen_range(0..table.total());
        table.lookup(value).cloned()
    }
}
