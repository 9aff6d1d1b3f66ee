//! Fixed-step host loop wiring the world to the pursuit and spawning systems.

use std::{collections::VecDeque, time::Duration};

use dungeon_core::{Command, Event, RoomId};
use dungeon_system_movement::{Movement, PathFollower};
use dungeon_system_spawning::{Config as SpawningConfig, Spawning};
use dungeon_world::{self as world, query, World};
use tracing::info;

use crate::config::{Scenario, ScriptedCommand};

const REPORT_INTERVAL_TICKS: u32 = 50;

/// Running totals gathered from world events.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct SessionStats {
    pub(crate) ticks: u32,
    pub(crate) spawned: u32,
    pub(crate) rejected: u32,
    pub(crate) moves: u64,
    pub(crate) idles: u64,
    pub(crate) rooms_entered: u32,
}

/// Headless session driving one scenario.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    movement: Movement,
    spawning: Spawning,
    script: VecDeque<ScriptedCommand>,
    fixed_step: Duration,
    stats: SessionStats,
}

impl Session {
    /// Builds the world and systems and enters the scenario's start room.
    pub(crate) fn new(scenario: Scenario) -> Self {
        let fixed_step = scenario.world.fixed_step;
        let mut session = Self {
            world: World::new(scenario.content, scenario.world),
            movement: Movement::new(scenario.follower),
            spawning: Spawning::new(SpawningConfig::new(scenario.seed)),
            script: scenario.script.into(),
            fixed_step,
            stats: SessionStats::default(),
        };
        session.submit(Command::EnterRoom {
            room: scenario.start_room,
        });
        session
    }

    /// Simulates the provided number of ticks.
    pub(crate) fn run(&mut self, ticks: u32) -> SessionStats {
        for _ in 0..ticks {
            self.step();
            if self.stats.ticks % REPORT_INTERVAL_TICKS == 0 {
                self.report();
            }
        }
        self.stats
    }

    /// Releases scripted commands that are due, then advances one physics step.
    pub(crate) fn step(&mut self) {
        while self
            .script
            .front()
            .is_some_and(|scripted| scripted.tick <= self.stats.ticks)
        {
            if let Some(scripted) = self.script.pop_front() {
                self.submit(scripted.command);
            }
        }
        self.submit(Command::Tick {
            dt: self.fixed_step,
        });
        self.stats.ticks = self.stats.ticks.saturating_add(1);
    }

    /// Distance between the player and the closest enemy.
    pub(crate) fn nearest_enemy_distance(&self) -> Option<f32> {
        let player = query::player_position(&self.world);
        query::enemy_view(&self.world)
            .iter()
            .map(|enemy| enemy.position.distance(player))
            .min_by(f32::total_cmp)
    }

    /// Room the world currently simulates.
    pub(crate) fn active_room(&self) -> Option<RoomId> {
        query::active_room(&self.world).map(|room| room.id())
    }

    fn submit(&mut self, command: Command) {
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);
        self.dispatch(events);
    }

    fn dispatch(&mut self, mut events: Vec<Event>) {
        loop {
            if events.is_empty() {
                break;
            }
            self.record(&events);

            let mut commands = Vec::new();
            let enemy_view = query::enemy_view(&self.world);
            self.movement.handle(
                &events,
                &enemy_view,
                query::cost_grid(&self.world),
                &self.world,
                &mut commands,
            );
            self.spawning.handle(
                &events,
                query::spawn_tables(&self.world),
                &self.world,
                &mut commands,
            );

            if commands.is_empty() {
                break;
            }

            events.clear();
            for command in commands {
                world::apply(&mut self.world, command, &mut events);
            }
        }
    }

    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::EnemySpawned { .. } => self.stats.spawned += 1,
                Event::SpawnRejected { .. } => self.stats.rejected += 1,
                Event::EnemyMoved { .. } => self.stats.moves += 1,
                Event::EnemyIdled { .. } => self.stats.idles += 1,
                Event::RoomEntered { room, level } => {
                    self.stats.rooms_entered += 1;
                    info!(room = room.get(), level = level.get(), "entered room");
                }
                _ => {}
            }
        }
    }

    fn report(&self) {
        let enemy_view = query::enemy_view(&self.world);
        let enemies = enemy_view.iter().count();
        let chasing = enemy_view
            .iter()
            .filter(|enemy| {
                self.movement
                    .follower(enemy.id)
                    .is_some_and(PathFollower::is_chasing)
            })
            .count();
        info!(
            tick = self.stats.ticks,
            enemies,
            chasing,
            nearest = ?self.nearest_enemy_distance(),
            "chase progress"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEMO_SCENARIO;

    fn demo_session(seed: u64) -> Session {
        let mut scenario = Scenario::parse(DEMO_SCENARIO).expect("demo scenario parses");
        scenario.seed = seed;
        Session::new(scenario)
    }

    #[test]
    fn demo_session_spawns_and_chases() {
        let mut session = demo_session(11);
        let stats = session.run(200);

        assert_eq!(stats.ticks, 200);
        assert_eq!(stats.rooms_entered, 1);
        assert!(stats.spawned >= 2, "stats: {stats:?}");
        assert!(stats.moves > 0, "stats: {stats:?}");
        assert!(session.nearest_enemy_distance().is_some());
    }

    #[test]
    fn scripted_room_change_clears_enemies() {
        let mut session = demo_session(11);
        let start = session.active_room();
        let stats = session.run(600);

        assert_eq!(stats.rooms_entered, 2);
        assert_ne!(session.active_room(), start);
    }

    #[test]
    fn identical_seeds_replay_identically() {
        let first = demo_session(5).run(600);
        let second = demo_session(5).run(600);
        assert_eq!(first, second);
    }
}
