#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the dungeon chase engine.
//!
//! This crate defines the message surface that connects the host loop, the
//! authoritative world, and pure systems. Hosts submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! views such as the room's [`CostGrid`], and respond exclusively with new
//! command batches.

mod grid;

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub use grid::{CostGrid, GridBounds, GridError, GridTransform, TileCost};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Moves the chased player to a new world position.
    PlacePlayer {
        /// Position the player occupies after the command.
        position: Vec2,
    },
    /// Switches the active dungeon level.
    SetLevel {
        /// Level that becomes active.
        level: DungeonLevel,
    },
    /// Makes the provided room the active room, clearing its previous occupants.
    EnterRoom {
        /// Identifier of the room being entered.
        room: RoomId,
    },
    /// Asks the spawning system to pick an enemy for the provided cell.
    RequestSpawn {
        /// Cell where the selected enemy should appear.
        cell: CellCoord,
    },
    /// Requests that an enemy of the provided kind appear in the active room.
    SpawnEnemy {
        /// Catalogue entry describing the enemy.
        kind: EnemyKind,
        /// Cell the enemy is placed at.
        cell: CellCoord,
    },
    /// Requests removal of an enemy from the active room.
    DespawnEnemy {
        /// Identifier of the enemy to remove.
        agent: AgentId,
    },
    /// Asks the movement executor to advance an enemy toward a waypoint.
    MoveToPosition {
        /// Enemy being moved.
        agent: AgentId,
        /// Destination, speed, and heading for this physics step.
        intent: MoveIntent,
    },
    /// Tells the movement executor that an enemy stopped moving.
    Idle {
        /// Enemy that became idle.
        agent: AgentId,
    },
    /// Replaces the traversal cost of a cell in the active room.
    SetTileCost {
        /// Cell whose cost changes.
        cell: CellCoord,
        /// Cost applied to the cell.
        cost: TileCost,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that the player moved.
    PlayerMoved {
        /// Position the player occupies.
        position: Vec2,
    },
    /// Announces that a different dungeon level became active.
    LevelChanged {
        /// Level that became active.
        level: DungeonLevel,
    },
    /// Announces that a room became the active room.
    RoomEntered {
        /// Identifier of the entered room.
        room: RoomId,
        /// Dungeon level active while the room was entered.
        level: DungeonLevel,
    },
    /// Relays a spawn trigger for systems that choose what to spawn.
    SpawnRequested {
        /// Cell where the selected enemy should appear.
        cell: CellCoord,
    },
    /// Confirms that an enemy was created.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        agent: AgentId,
        /// Catalogue entry the enemy was created from.
        kind: EnemyKind,
        /// World position the enemy occupies after spawning.
        position: Vec2,
        /// Pursuit parameters of the enemy.
        profile: ChaseProfile,
    },
    /// Reports that a spawn request was rejected.
    SpawnRejected {
        /// Catalogue entry requested for spawning.
        kind: EnemyKind,
        /// Cell provided in the spawn request.
        cell: CellCoord,
        /// Specific reason the spawn failed.
        reason: SpawnError,
    },
    /// Confirms that an enemy was removed.
    EnemyDespawned {
        /// Identifier of the removed enemy.
        agent: AgentId,
    },
    /// Confirms that an enemy moved during a physics step.
    EnemyMoved {
        /// Identifier of the moved enemy.
        agent: AgentId,
        /// Position before the step.
        from: Vec2,
        /// Position after the step.
        to: Vec2,
    },
    /// Confirms that an enemy entered its idle state.
    EnemyIdled {
        /// Identifier of the idle enemy.
        agent: AgentId,
    },
    /// Confirms that a cell's traversal cost changed.
    TileCostChanged {
        /// Cell whose cost changed.
        cell: CellCoord,
        /// Cost now applied to the cell.
        cost: TileCost,
    },
}

/// Single physics-step movement request emitted while following a path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoveIntent {
    /// Waypoint the agent is heading toward.
    pub destination: Vec2,
    /// Agent position observed when the intent was produced.
    pub current: Vec2,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Normalized heading from `current` toward `destination`.
    pub direction: Vec2,
}

/// Pursuit parameters attached to an enemy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChaseProfile {
    /// Movement speed in world units per second.
    pub move_speed: f32,
    /// Distance at which a dormant enemy starts pursuing its target.
    pub engagement_radius: f32,
}

/// Reasons a spawn request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnError {
    /// No room is active.
    NoActiveRoom,
    /// The requested kind is missing from the enemy catalogue.
    UnknownKind,
    /// The requested cell lies outside the active room.
    OutOfBounds,
    /// The requested cell is an obstacle.
    Blocked,
}

/// Unique identifier assigned to a spawned enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(u32);

impl AgentId {
    /// Creates a new agent identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Index into the enemy catalogue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyKind(u16);

impl EnemyKind {
    /// Creates a new enemy kind from its catalogue index.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Retrieves the catalogue index.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

/// Identifier of a room template instantiated in the dungeon.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoomId(u32);

impl RoomId {
    /// Creates a new room identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Dungeon level tier used to filter spawn tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DungeonLevel(u32);

impl DungeonLevel {
    /// Creates a new level identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric level.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Number of king moves separating two cells.
    #[must_use]
    pub fn chebyshev_distance(self, other: CellCoord) -> u32 {
        self.column
            .abs_diff(other.column)
            .max(self.row.abs_diff(other.row))
    }

    /// Cell displaced by the provided offsets, if it stays non-negative.
    #[must_use]
    pub fn offset(self, column_delta: i32, row_delta: i32) -> Option<CellCoord> {
        let column = self.column.checked_add_signed(column_delta)?;
        let row = self.row.checked_add_signed(row_delta)?;
        Some(CellCoord::new(column, row))
    }
}

/// Weighted entry of a spawn table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpawnRatio<T> {
    item: T,
    ratio: u32,
}

impl<T> SpawnRatio<T> {
    /// Creates an entry that is selected proportionally to `ratio`.
    #[must_use]
    pub const fn new(item: T, ratio: u32) -> Self {
        Self { item, ratio }
    }

    /// Entity produced when the entry is selected.
    #[must_use]
    pub const fn item(&self) -> &T {
        &self.item
    }

    /// Relative weight of the entry.
    #[must_use]
    pub const fn ratio(&self) -> u32 {
        self.ratio
    }
}

/// Spawn ratios that apply while a specific dungeon level is active.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpawnableByLevel<T> {
    level: DungeonLevel,
    ratios: Vec<SpawnRatio<T>>,
}

impl<T> SpawnableByLevel<T> {
    /// Creates a table of ratios for the provided level.
    #[must_use]
    pub fn new(level: DungeonLevel, ratios: Vec<SpawnRatio<T>>) -> Self {
        Self { level, ratios }
    }

    /// Level this table applies to.
    #[must_use]
    pub const fn level(&self) -> DungeonLevel {
        self.level
    }

    /// Ratios in authoring order.
    #[must_use]
    pub fn ratios(&self) -> &[SpawnRatio<T>] {
        &self.ratios
    }
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: AgentId,
    /// Catalogue entry the enemy was created from.
    pub kind: EnemyKind,
    /// Current world position.
    pub position: Vec2,
    /// Whether the enemy received a movement intent since it last idled.
    pub moving: bool,
}

/// Read-only snapshot describing all enemies in the active room.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Snapshot of the provided enemy, if it exists.
    #[must_use]
    pub fn get(&self, agent: AgentId) -> Option<&EnemySnapshot> {
        self.snapshots
            .binary_search_by_key(&agent, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Supplies the world position of the entity being chased.
pub trait TargetProvider {
    /// Current position of the chase target.
    fn target_position(&self) -> Vec2;
}

impl TargetProvider for Vec2 {
    fn target_position(&self) -> Vec2 {
        *self
    }
}

/// Supplies the dungeon level used to filter spawn tables.
pub trait LevelProvider {
    /// Level that is currently active.
    fn current_level(&self) -> DungeonLevel;
}

impl LevelProvider for DungeonLevel {
    fn current_level(&self) -> DungeonLevel {
        *self
    }
}

/// Receives the movement signals produced by path following.
pub trait MovementSink {
    /// Requests one physics step of movement toward a waypoint.
    fn move_towards(&mut self, agent: AgentId, intent: MoveIntent);

    /// Signals that the agent stopped moving.
    fn idle(&mut self, agent: AgentId);
}

impl MovementSink for Vec<Command> {
    fn move_towards(&mut self, agent: AgentId, intent: MoveIntent) {
        self.push(Command::MoveToPosition { agent, intent });
    }

    fn idle(&mut self, agent: AgentId) {
        self.push(Command::Idle { agent });
    }
}
