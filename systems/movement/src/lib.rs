#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic pursuit system that plans paths and emits movement intents.

mod follower;
mod step;

use std::collections::BTreeMap;

use dungeon_core::{AgentId, Command, CostGrid, EnemyView, Event, TargetProvider};
use tracing::trace;

pub use follower::{
    FollowerSettings, PathFollower, RebuildOutcome, DEFAULT_REBUILD_COOLDOWN,
    DEFAULT_REBUILD_DISTANCE, DEFAULT_WAYPOINT_PROXIMITY,
};
pub use step::{StepPhase, StepTask};

/// Pure system that reacts to world events and emits movement commands.
///
/// One [`PathFollower`] is kept per spawned enemy. Followers are ticked in
/// ascending [`AgentId`] order so identical event streams always produce
/// identical command batches.
#[derive(Debug, Default)]
pub struct Movement {
    settings: FollowerSettings,
    followers: BTreeMap<AgentId, PathFollower>,
}

impl Movement {
    /// Creates a movement system whose followers share the provided settings.
    #[must_use]
    pub fn new(settings: FollowerSettings) -> Self {
        Self {
            settings,
            followers: BTreeMap::new(),
        }
    }

    /// Follower driving the provided enemy, if it is tracked.
    #[must_use]
    pub fn follower(&self, agent: AgentId) -> Option<&PathFollower> {
        self.followers.get(&agent)
    }

    /// Consumes world events and immutable views to emit movement commands.
    ///
    /// `grid` is the cost grid of the active room. Without one no follower is
    /// ticked.
    pub fn handle<T>(
        &mut self,
        events: &[Event],
        enemy_view: &EnemyView,
        grid: Option<&CostGrid>,
        target: &T,
        out: &mut Vec<Command>,
    ) where
        T: TargetProvider + ?Sized,
    {
        for event in events {
            match event {
                Event::EnemySpawned { agent, profile, .. } => {
                    let follower = PathFollower::new(
                        *agent,
                        *profile,
                        self.settings,
                        target.target_position(),
                    );
                    if let Some(mut previous) = self.followers.insert(*agent, follower) {
                        previous.teardown(out);
                    }
                }
                Event::EnemyDespawned { agent } => {
                    if let Some(mut follower) = self.followers.remove(agent) {
                        follower.teardown(out);
                    }
                }
                Event::TimeAdvanced { dt } => {
                    let Some(grid) = grid else {
                        continue;
                    };
                    for (agent, follower) in &mut self.followers {
                        let Some(snapshot) = enemy_view.get(*agent) else {
                            continue;
                        };
                        let outcome = follower.tick(*dt, grid, snapshot.position, target, out);
                        trace!(agent = agent.get(), ?outcome, "follower ticked");
                    }
                }
                _ => {}
            }
        }
    }
}
