#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative dungeon state and movement execution.
//!
//! The world owns every entity transform. Systems never move enemies
//! directly; they emit [`Command::MoveToPosition`] and [`Command::Idle`]
//! intents which [`apply`] integrates once per physics step.

mod layout;

use std::{collections::BTreeMap, time::Duration};

use dungeon_core::{
    AgentId, CellCoord, ChaseProfile, Command, CostGrid, DungeonLevel, EnemyKind, Event,
    LevelProvider, RoomId, SpawnError, SpawnableByLevel, TargetProvider,
};
use glam::Vec2;
use tracing::debug;

pub use layout::{
    build_cost_grid, LayoutError, PenaltyRules, RoomLayout, TileKind, DEFAULT_MOVEMENT_PENALTY,
    PREFERRED_PATH_PENALTY,
};

/// Physics step used when no explicit step is configured.
pub const DEFAULT_FIXED_STEP: Duration = Duration::from_millis(20);

/// Static description of an enemy type.
#[derive(Clone, Debug, PartialEq)]
pub struct EnemyDetails {
    name: String,
    profile: ChaseProfile,
}

impl EnemyDetails {
    /// Creates a catalogue entry.
    #[must_use]
    pub fn new(name: impl Into<String>, profile: ChaseProfile) -> Self {
        Self {
            name: name.into(),
            profile,
        }
    }

    /// Display name of the enemy type.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pursuit parameters shared by every enemy of this type.
    #[must_use]
    pub const fn profile(&self) -> ChaseProfile {
        self.profile
    }
}

/// Instantiated room: its traversal grid and the enemies it may spawn.
#[derive(Clone, Debug, PartialEq)]
pub struct Room {
    id: RoomId,
    grid: CostGrid,
    enemies_by_level: Vec<SpawnableByLevel<EnemyKind>>,
}

impl Room {
    /// Creates a room from its cost grid and per-level spawn tables.
    #[must_use]
    pub fn new(
        id: RoomId,
        grid: CostGrid,
        enemies_by_level: Vec<SpawnableByLevel<EnemyKind>>,
    ) -> Self {
        Self {
            id,
            grid,
            enemies_by_level,
        }
    }

    /// Identifier of the room.
    #[must_use]
    pub const fn id(&self) -> RoomId {
        self.id
    }

    /// Traversal costs covering the room's bounds.
    #[must_use]
    pub const fn grid(&self) -> &CostGrid {
        &self.grid
    }

    /// Spawn tables authored for the room, one per dungeon level.
    #[must_use]
    pub fn enemies_by_level(&self) -> &[SpawnableByLevel<EnemyKind>] {
        &self.enemies_by_level
    }
}

/// Static content the world is built from.
#[derive(Clone, Debug, Default)]
pub struct DungeonContent {
    /// Enemy catalogue indexed by [`EnemyKind`].
    pub enemies: Vec<EnemyDetails>,
    /// Rooms that may be entered.
    pub rooms: Vec<Room>,
}

/// Simulation parameters of the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldSettings {
    /// Duration of one physics step used to integrate movement intents.
    pub fixed_step: Duration,
    /// Level active when the world is created.
    pub level: DungeonLevel,
    /// Position of the player when the world is created.
    pub player: Vec2,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            fixed_step: DEFAULT_FIXED_STEP,
            level: DungeonLevel::new(1),
            player: Vec2::ZERO,
        }
    }
}

/// Represents the authoritative dungeon state.
#[derive(Debug)]
pub struct World {
    settings: WorldSettings,
    catalogue: Vec<EnemyDetails>,
    rooms: BTreeMap<RoomId, Room>,
    active_room: Option<RoomId>,
    level: DungeonLevel,
    player: Vec2,
    enemies: Vec<Enemy>,
    next_agent: u32,
    tick_index: u64,
}

impl World {
    /// Creates a world from static content. No room is active until
    /// [`Command::EnterRoom`] is applied.
    #[must_use]
    pub fn new(content: DungeonContent, settings: WorldSettings) -> Self {
        let rooms = content
            .rooms
            .into_iter()
            .map(|room| (room.id(), room))
            .collect();
        Self {
            settings,
            catalogue: content.enemies,
            rooms,
            active_room: None,
            level: settings.level,
            player: settings.player,
            enemies: Vec::new(),
            next_agent: 0,
            tick_index: 0,
        }
    }

    fn active_room(&self) -> Option<&Room> {
        self.active_room.and_then(|id| self.rooms.get(&id))
    }

    fn active_room_mut(&mut self) -> Option<&mut Room> {
        let id = self.active_room?;
        self.rooms.get_mut(&id)
    }

    fn enemy_mut(&mut self, agent: AgentId) -> Option<&mut Enemy> {
        self.enemies.iter_mut().find(|enemy| enemy.id == agent)
    }

    fn despawn_all(&mut self, out_events: &mut Vec<Event>) {
        for enemy in self.enemies.drain(..) {
            out_events.push(Event::EnemyDespawned { agent: enemy.id });
        }
    }

    fn spawn(&mut self, kind: EnemyKind, cell: CellCoord) -> Result<Event, SpawnError> {
        let room = self.active_room().ok_or(SpawnError::NoActiveRoom)?;
        let details = self
            .catalogue
            .get(usize::from(kind.get()))
            .ok_or(SpawnError::UnknownKind)?;
        let cost = room
            .grid()
            .cost_at(cell)
            .map_err(|_| SpawnError::OutOfBounds)?;
        if !cost.is_passable() {
            return Err(SpawnError::Blocked);
        }

        let position = room.grid().cell_to_world(cell);
        let profile = details.profile();
        let agent = AgentId::new(self.next_agent);
        self.next_agent = self.next_agent.wrapping_add(1);
        self.enemies.push(Enemy {
            id: agent,
            kind,
            position,
            moving: false,
        });
        debug!(agent = agent.get(), kind = kind.get(), ?cell, "enemy spawned");

        Ok(Event::EnemySpawned {
            agent,
            kind,
            position,
            profile,
        })
    }
}

impl TargetProvider for World {
    fn target_position(&self) -> Vec2 {
        self.player
    }
}

impl LevelProvider for World {
    fn current_level(&self) -> DungeonLevel {
        self.level
    }
}

#[derive(Clone, Debug)]
struct Enemy {
    id: AgentId,
    kind: EnemyKind,
    position: Vec2,
    moving: bool,
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::PlacePlayer { position } => {
            world.player = position;
            out_events.push(Event::PlayerMoved { position });
        }
        Command::SetLevel { level } => {
            if world.level != level {
                world.level = level;
                out_events.push(Event::LevelChanged { level });
            }
        }
        Command::EnterRoom { room } => {
            if !world.rooms.contains_key(&room) {
                return;
            }
            world.despawn_all(out_events);
            world.active_room = Some(room);
            debug!(room = room.get(), level = world.level.get(), "room entered");
            out_events.push(Event::RoomEntered {
                room,
                level: world.level,
            });
        }
        Command::RequestSpawn { cell } => {
            if world.active_room.is_some() {
                out_events.push(Event::SpawnRequested { cell });
            }
        }
        Command::SpawnEnemy { kind, cell } => match world.spawn(kind, cell) {
            Ok(event) => out_events.push(event),
            Err(reason) => out_events.push(Event::SpawnRejected { kind, cell, reason }),
        },
        Command::DespawnEnemy { agent } => {
            if let Some(index) = world.enemies.iter().position(|enemy| enemy.id == agent) {
                let _ = world.enemies.remove(index);
                out_events.push(Event::EnemyDespawned { agent });
            }
        }
        Command::MoveToPosition { agent, intent } => {
            let step = world.settings.fixed_step.as_secs_f32();
            if let Some(enemy) = world.enemy_mut(agent) {
                let from = enemy.position;
                let to = from + intent.direction.normalize_or_zero() * intent.speed * step;
                enemy.position = to;
                enemy.moving = true;
                out_events.push(Event::EnemyMoved { agent, from, to });
            }
        }
        Command::Idle { agent } => {
            if let Some(enemy) = world.enemy_mut(agent) {
                enemy.moving = false;
                out_events.push(Event::EnemyIdled { agent });
            }
        }
        Command::SetTileCost { cell, cost } => {
            let Some(room) = world.active_room_mut() else {
                return;
            };
            if room.grid.set_cost(cell, cost).is_ok() {
                out_events.push(Event::TileCostChanged { cell, cost });
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use dungeon_core::{
        CostGrid, DungeonLevel, EnemyKind, EnemySnapshot, EnemyView, SpawnableByLevel,
    };
    use glam::Vec2;

    use super::{EnemyDetails, Room, World};

    /// Room that is currently active, if any.
    #[must_use]
    pub fn active_room(world: &World) -> Option<&Room> {
        world.active_room()
    }

    /// Cost grid of the active room, if any.
    #[must_use]
    pub fn cost_grid(world: &World) -> Option<&CostGrid> {
        world.active_room().map(Room::grid)
    }

    /// Spawn tables of the active room, empty when no room is active.
    #[must_use]
    pub fn spawn_tables(world: &World) -> &[SpawnableByLevel<EnemyKind>] {
        world
            .active_room()
            .map_or(&[][..], |room| room.enemies_by_level())
    }

    /// Captures a read-only view of the enemies in the active room.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(
            world
                .enemies
                .iter()
                .map(|enemy| EnemySnapshot {
                    id: enemy.id,
                    kind: enemy.kind,
                    position: enemy.position,
                    moving: enemy.moving,
                })
                .collect(),
        )
    }

    /// Current position of the player.
    #[must_use]
    pub fn player_position(world: &World) -> Vec2 {
        world.player
    }

    /// Dungeon level that is currently active.
    #[must_use]
    pub fn current_level(world: &World) -> DungeonLevel {
        world.level
    }

    /// Catalogue entry of the provided enemy kind.
    #[must_use]
    pub fn enemy_details(world: &World, kind: EnemyKind) -> Option<&EnemyDetails> {
        world.catalogue.get(usize::from(kind.get()))
    }

    /// Number of ticks processed since the world was created.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }
}
