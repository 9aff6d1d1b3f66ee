//! Scenario files describing rooms, enemies, and a scripted session.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use dungeon_core::{
    CellCoord, ChaseProfile, Command, DungeonLevel, EnemyKind, GridError, GridTransform, RoomId,
    SpawnRatio, SpawnableByLevel, TileCost,
};
use dungeon_system_movement::{
    FollowerSettings, DEFAULT_REBUILD_COOLDOWN, DEFAULT_REBUILD_DISTANCE,
    DEFAULT_WAYPOINT_PROXIMITY,
};
use dungeon_world::{
    DungeonContent, EnemyDetails, LayoutError, PenaltyRules, Room, RoomLayout, WorldSettings,
    DEFAULT_FIXED_STEP, DEFAULT_MOVEMENT_PENALTY, PREFERRED_PATH_PENALTY,
};
use glam::Vec2;
use serde::Deserialize;
use thiserror::Error;

/// Scenario used when no file is supplied on the command line.
pub(crate) const DEMO_SCENARIO: &str = include_str!("../assets/demo.toml");

/// Failures raised while loading a scenario.
#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read scenario file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("scenario is not valid toml")]
    Parse(#[from] toml::de::Error),
    #[error("room {room} spawns unknown enemy `{name}`")]
    UnknownEnemy { room: u32, name: String },
    #[error("room {0} is not defined")]
    UnknownRoom(u32),
    #[error("room {room} has an invalid layout")]
    Layout {
        room: u32,
        #[source]
        source: LayoutError,
    },
    #[error("room {room} cannot be converted into a cost grid")]
    Grid {
        room: u32,
        #[source]
        source: GridError,
    },
}

/// Host command scheduled for a specific tick.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ScriptedCommand {
    pub(crate) tick: u32,
    pub(crate) command: Command,
}

/// Fully validated scenario ready to drive a session.
#[derive(Debug)]
pub(crate) struct Scenario {
    pub(crate) seed: u64,
    pub(crate) ticks: u32,
    pub(crate) start_room: RoomId,
    pub(crate) content: DungeonContent,
    pub(crate) world: WorldSettings,
    pub(crate) follower: FollowerSettings,
    pub(crate) script: Vec<ScriptedCommand>,
}

impl Scenario {
    /// Reads and validates the scenario stored at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    /// Validates a scenario from its toml text.
    pub(crate) fn parse(contents: &str) -> Result<Self, ConfigError> {
        let raw: RawScenario = toml::from_str(contents)?;
        raw.into_scenario()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawScenario {
    seed: u64,
    ticks: u32,
    start_room: u32,
    #[serde(default = "default_level")]
    level: u32,
    #[serde(default = "default_fixed_step_ms")]
    fixed_step_ms: u64,
    player: [f32; 2],
    #[serde(default)]
    follower: RawFollower,
    #[serde(default)]
    penalties: RawPenalties,
    enemies: Vec<RawEnemy>,
    rooms: Vec<RawRoom>,
    #[serde(default)]
    script: Vec<RawScriptEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawFollower {
    rebuild_cooldown_ms: u64,
    rebuild_distance: f32,
    waypoint_proximity: f32,
}

impl Default for RawFollower {
    fn default() -> Self {
        Self {
            rebuild_cooldown_ms: u64::try_from(DEFAULT_REBUILD_COOLDOWN.as_millis())
                .unwrap_or(u64::MAX),
            rebuild_distance: DEFAULT_REBUILD_DISTANCE,
            waypoint_proximity: DEFAULT_WAYPOINT_PROXIMITY,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawPenalties {
    floor: u16,
    preferred_path: u16,
}

impl Default for RawPenalties {
    fn default() -> Self {
        Self {
            floor: DEFAULT_MOVEMENT_PENALTY.get(),
            preferred_path: PREFERRED_PATH_PENALTY.get(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEnemy {
    name: String,
    move_speed: f32,
    engagement_radius: f32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRoom {
    id: u32,
    #[serde(default)]
    origin: [f32; 2],
    #[serde(default = "default_cell_size")]
    cell_size: f32,
    layout: Vec<String>,
    #[serde(default)]
    spawns: Vec<RawSpawnTable>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSpawnTable {
    level: u32,
    entries: Vec<RawSpawnEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSpawnEntry {
    enemy: String,
    ratio: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawScriptEntry {
    tick: u32,
    level: Option<u32>,
    room: Option<u32>,
    player: Option<[f32; 2]>,
    spawn: Option<[u32; 2]>,
}

fn default_level() -> u32 {
    1
}

fn default_fixed_step_ms() -> u64 {
    u64::try_from(DEFAULT_FIXED_STEP.as_millis()).unwrap_or(20)
}

fn default_cell_size() -> f32 {
    1.0
}

impl RawScenario {
    fn into_scenario(self) -> Result<Scenario, ConfigError> {
        let rules = PenaltyRules {
            default_penalty: TileCost::new(self.penalties.floor),
            preferred_path_penalty: TileCost::new(self.penalties.preferred_path),
        };

        let mut rooms = Vec::with_capacity(self.rooms.len());
        for raw in &self.rooms {
            rooms.push(raw.to_room(&self.enemies, &rules)?);
        }

        let known_room = |id: u32| rooms.iter().any(|room| room.id() == RoomId::new(id));
        if !known_room(self.start_room) {
            return Err(ConfigError::UnknownRoom(self.start_room));
        }

        let mut script = Vec::new();
        for entry in &self.script {
            if let Some(level) = entry.level {
                script.push(ScriptedCommand {
                    tick: entry.tick,
                    command: Command::SetLevel {
                        level: DungeonLevel::new(level),
                    },
                });
            }
            if let Some(room) = entry.room {
                if !known_room(room) {
                    return Err(ConfigError::UnknownRoom(room));
                }
                script.push(ScriptedCommand {
                    tick: entry.tick,
                    command: Command::EnterRoom {
                        room: RoomId::new(room),
                    },
                });
            }
            if let Some(position) = entry.player {
                script.push(ScriptedCommand {
                    tick: entry.tick,
                    command: Command::PlacePlayer {
                        position: Vec2::from(position),
                    },
                });
            }
            if let Some([column, row]) = entry.spawn {
                script.push(ScriptedCommand {
                    tick: entry.tick,
                    command: Command::RequestSpawn {
                        cell: CellCoord::new(column, row),
                    },
                });
            }
        }
        script.sort_by_key(|scripted| scripted.tick);

        let enemies = self
            .enemies
            .iter()
            .map(|enemy| {
                EnemyDetails::new(
                    enemy.name.clone(),
                    ChaseProfile {
                        move_speed: enemy.move_speed,
                        engagement_radius: enemy.engagement_radius,
                    },
                )
            })
            .collect();

        Ok(Scenario {
            seed: self.seed,
            ticks: self.ticks,
            start_room: RoomId::new(self.start_room),
            content: DungeonContent { enemies, rooms },
            world: WorldSettings {
                fixed_step: Duration::from_millis(self.fixed_step_ms),
                level: DungeonLevel::new(self.level),
                player: Vec2::from(self.player),
            },
            follower: FollowerSettings {
                rebuild_cooldown: Duration::from_millis(self.follower.rebuild_cooldown_ms),
                rebuild_distance: self.follower.rebuild_distance,
                waypoint_proximity: self.follower.waypoint_proximity,
            },
            script,
        })
    }
}

impl RawRoom {
    fn to_room(&self, enemies: &[RawEnemy], rules: &PenaltyRules) -> Result<Room, ConfigError> {
        let layout = RoomLayout::parse(&self.layout).map_err(|source| ConfigError::Layout {
            room: self.id,
            source,
        })?;
        let transform = GridTransform::new(Vec2::from(self.origin), self.cell_size);
        let grid = layout
            .to_cost_grid(transform, rules)
            .map_err(|source| ConfigError::Grid {
                room: self.id,
                source,
            })?;

        let mut tables = Vec::with_capacity(self.spawns.len());
        for table in &self.spawns {
            let mut ratios = Vec::with_capacity(table.entries.len());
            for entry in &table.entries {
                let kind = enemies
                    .iter()
                    .position(|enemy| enemy.name == entry.enemy)
                    .and_then(|index| u16::try_from(index).ok())
                    .ok_or_else(|| ConfigError::UnknownEnemy {
                        room: self.id,
                        name: entry.enemy.clone(),
                    })?;
                ratios.push(SpawnRatio::new(EnemyKind::new(kind), entry.ratio));
            }
            tables.push(SpawnableByLevel::new(DungeonLevel::new(table.level), ratios));
        }

        Ok(Room::new(RoomId::new(self.id), grid, tables))
    }
}
