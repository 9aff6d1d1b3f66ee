#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system that picks enemies from weighted tables.

mod selector;

use dungeon_core::{Command, EnemyKind, Event, LevelProvider, SpawnableByLevel};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

pub use selector::{ChanceBoundary, ChanceTable, WeightedSpawnSelector};

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided seed.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self { rng_seed }
    }
}

/// Pure system that turns spawn triggers into spawn commands.
#[derive(Debug)]
pub struct Spawning {
    selector: WeightedSpawnSelector<EnemyKind>,
    rng: ChaCha8Rng,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            selector: WeightedSpawnSelector::default(),
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Selector loaded with the tables of the most recently entered room.
    #[must_use]
    pub const fn selector(&self) -> &WeightedSpawnSelector<EnemyKind> {
        &self.selector
    }

    /// Consumes events to emit spawn commands.
    ///
    /// `room_tables` are the spawn tables of the active room; they replace the
    /// loaded tables whenever a room is entered.
    pub fn handle<L>(
        &mut self,
        events: &[Event],
        room_tables: &[SpawnableByLevel<EnemyKind>],
        level: &L,
        out: &mut Vec<Command>,
    ) where
        L: LevelProvider + ?Sized,
    {
        for event in events {
            match event {
                Event::RoomEntered { room, .. } => {
                    self.selector = WeightedSpawnSelector::new(room_tables.to_vec());
                    debug!(room = room.get(), tables = room_tables.len(), "spawn tables loaded");
                }
                Event::SpawnRequested { cell } => {
                    let current = level.current_level();
                    match self.selector.select(current, &mut self.rng) {
                        Some(kind) => {
                            debug!(level = current.get(), kind = kind.get(), ?cell, "enemy selected");
                            out.push(Command::SpawnEnemy { kind, cell: *cell });
                        }
                        None => debug!(level = current.get(), ?cell, "nothing to spawn"),
                    }
                }
                _ => {}
            }
        }
    }
}
