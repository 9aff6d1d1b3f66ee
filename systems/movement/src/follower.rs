use std::time::Duration;

use dungeon_core::{AgentId, ChaseProfile, CostGrid, MovementSink, TargetProvider};
use dungeon_system_pathfinding::{build_path, nearest_free_cell, Path};
use glam::Vec2;
use tracing::{debug, trace, warn};

use crate::step::StepTask;

/// Default interval between periodic path rebuilds.
pub const DEFAULT_REBUILD_COOLDOWN: Duration = Duration::from_secs(2);
/// Default target displacement that forces an early rebuild.
pub const DEFAULT_REBUILD_DISTANCE: f32 = 3.0;
/// Default distance at which a waypoint counts as reached.
pub const DEFAULT_WAYPOINT_PROXIMITY: f32 = 0.2;

/// Scheduling thresholds shared by every follower.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FollowerSettings {
    /// Time between periodic rebuilds while chasing.
    pub rebuild_cooldown: Duration,
    /// Distance the target may drift from the last rebuild before a new one
    /// is forced.
    pub rebuild_distance: f32,
    /// Distance at which a waypoint counts as reached.
    pub waypoint_proximity: f32,
}

impl Default for FollowerSettings {
    fn default() -> Self {
        Self {
            rebuild_cooldown: DEFAULT_REBUILD_COOLDOWN,
            rebuild_distance: DEFAULT_REBUILD_DISTANCE,
            waypoint_proximity: DEFAULT_WAYPOINT_PROXIMITY,
        }
    }
}

/// What a single [`PathFollower::tick`] decided about the agent's path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RebuildOutcome {
    /// The agent is chasing and kept its current path.
    Skipped,
    /// The target is outside the engagement radius.
    Dormant,
    /// A fresh path was planned.
    Rebuilt {
        /// Waypoints in the new path.
        waypoints: usize,
    },
    /// Planning produced no waypoints so the agent was told to idle.
    Unreachable,
}

/// Per-agent pursuit scheduler.
///
/// The follower stays dormant until the target comes within the agent's
/// engagement radius, then chases for the rest of its lifetime. While chasing
/// it replans when the cooldown expires or the target drifts too far, and
/// drives a [`StepTask`] that walks the most recent path.
#[derive(Clone, Debug)]
pub struct PathFollower {
    agent: AgentId,
    profile: ChaseProfile,
    settings: FollowerSettings,
    cooldown: Duration,
    reference: Vec2,
    chasing: bool,
    task: Option<StepTask>,
}

impl PathFollower {
    /// Creates a dormant follower. The first chasing tick always replans.
    #[must_use]
    pub fn new(
        agent: AgentId,
        profile: ChaseProfile,
        settings: FollowerSettings,
        target_position: Vec2,
    ) -> Self {
        Self {
            agent,
            profile,
            settings,
            cooldown: Duration::ZERO,
            reference: target_position,
            chasing: false,
            task: None,
        }
    }

    /// Agent driven by this follower.
    #[must_use]
    pub const fn agent(&self) -> AgentId {
        self.agent
    }

    /// Reports whether the agent engaged its target.
    #[must_use]
    pub const fn is_chasing(&self) -> bool {
        self.chasing
    }

    /// Time left until the next periodic rebuild.
    #[must_use]
    pub const fn cooldown_remaining(&self) -> Duration {
        self.cooldown
    }

    /// Target position captured by the most recent rebuild.
    #[must_use]
    pub const fn reference_position(&self) -> Vec2 {
        self.reference
    }

    /// Step task that is still walking a path, if any.
    #[must_use]
    pub fn active_task(&self) -> Option<&StepTask> {
        self.task.as_ref().filter(|task| task.is_running())
    }

    /// Advances the follower by one physics step.
    pub fn tick<T, S>(
        &mut self,
        dt: Duration,
        grid: &CostGrid,
        agent_position: Vec2,
        target: &T,
        sink: &mut S,
    ) -> RebuildOutcome
    where
        T: TargetProvider + ?Sized,
        S: MovementSink,
    {
        self.cooldown = self.cooldown.saturating_sub(dt);
        let target_position = target.target_position();

        if !self.chasing {
            if agent_position.distance(target_position) >= self.profile.engagement_radius {
                return RebuildOutcome::Dormant;
            }
            self.chasing = true;
            debug!(agent = self.agent.get(), "target engaged");
        }

        let outcome = if self.cooldown.is_zero()
            || target_position.distance(self.reference) > self.settings.rebuild_distance
        {
            self.rebuild(grid, agent_position, target_position, sink)
        } else {
            RebuildOutcome::Skipped
        };

        if let Some(task) = self.task.as_mut() {
            task.resume(agent_position, sink);
        }

        outcome
    }

    /// Stops any path in progress ahead of the agent's removal.
    pub fn teardown<S>(&mut self, sink: &mut S)
    where
        S: MovementSink,
    {
        if let Some(mut task) = self.task.take() {
            let _ = task.cancel(sink);
        }
    }

    fn rebuild<S>(
        &mut self,
        grid: &CostGrid,
        agent_position: Vec2,
        target_position: Vec2,
        sink: &mut S,
    ) -> RebuildOutcome
    where
        S: MovementSink,
    {
        self.cooldown = self.settings.rebuild_cooldown;
        self.reference = target_position;

        match self.plan(grid, agent_position, target_position) {
            Some(path) if !path.is_empty() => {
                self.teardown(sink);
                let waypoints = path.len();
                self.task = Some(StepTask::new(
                    self.agent,
                    grid,
                    &path,
                    self.profile.move_speed,
                    self.settings.waypoint_proximity,
                ));
                debug!(agent = self.agent.get(), waypoints, "path rebuilt");
                RebuildOutcome::Rebuilt { waypoints }
            }
            _ => {
                let signalled = self
                    .task
                    .take()
                    .is_some_and(|mut task| task.cancel(sink));
                if !signalled {
                    sink.idle(self.agent);
                }
                trace!(agent = self.agent.get(), "no path to target");
                RebuildOutcome::Unreachable
            }
        }
    }

    fn plan(&self, grid: &CostGrid, agent_position: Vec2, target_position: Vec2) -> Option<Path> {
        let Some(start) = grid.world_to_cell(agent_position) else {
            trace!(agent = self.agent.get(), ?agent_position, "agent outside room");
            return None;
        };
        let Some(target_cell) = grid.world_to_cell(target_position) else {
            trace!(agent = self.agent.get(), ?target_position, "target outside room");
            return None;
        };

        let goal = match nearest_free_cell(grid, target_cell) {
            Ok(goal) => goal,
            Err(error) => {
                warn!(agent = self.agent.get(), %error, "target probe failed");
                return None;
            }
        };

        let mut path = match build_path(grid, start, goal) {
            Ok(path) => path?,
            Err(error) => {
                warn!(agent = self.agent.get(), %error, "path search failed");
                return None;
            }
        };
        let _ = path.pop_next();
        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dungeon_core::{CellCoord, Command, GridTransform, TileCost};

    const AGENT: AgentId = AgentId::new(9);
    const STEP: Duration = Duration::from_millis(20);

    fn open_grid() -> CostGrid {
        CostGrid::filled(8, 8, TileCost::new(1), GridTransform::default()).expect("valid grid")
    }

    fn follower(target: Vec2) -> PathFollower {
        PathFollower::new(
            AGENT,
            ChaseProfile {
                move_speed: 4.0,
                engagement_radius: 5.0,
            },
            FollowerSettings::default(),
            target,
        )
    }

    fn idles(commands: &[Command]) -> usize {
        commands
            .iter()
            .filter(|command| matches!(command, Command::Idle { .. }))
            .count()
    }

    #[test]
    fn distant_target_keeps_follower_dormant() {
        let grid = open_grid();
        let target = Vec2::new(7.5, 7.5);
        let mut follower = follower(target);
        let mut commands: Vec<Command> = Vec::new();

        let outcome = follower.tick(STEP, &grid, Vec2::new(0.5, 0.5), &target, &mut commands);

        assert_eq!(outcome, RebuildOutcome::Dormant);
        assert!(!follower.is_chasing());
        assert!(commands.is_empty());
    }

    #[test]
    fn engagement_radius_is_exclusive() {
        let grid = open_grid();
        let target = Vec2::new(5.5, 0.5);
        let mut follower = follower(target);
        let mut commands: Vec<Command> = Vec::new();

        let outcome = follower.tick(STEP, &grid, Vec2::new(0.5, 0.5), &target, &mut commands);
        assert_eq!(outcome, RebuildOutcome::Dormant);

        let outcome = follower.tick(STEP, &grid, Vec2::new(0.6, 0.5), &target, &mut commands);
        assert_eq!(outcome, RebuildOutcome::Rebuilt { waypoints: 5 });
    }

    #[test]
    fn first_chasing_tick_rebuilds_and_moves() {
        let grid = open_grid();
        let target = Vec2::new(3.5, 0.5);
        let mut follower = follower(target);
        let mut commands: Vec<Command> = Vec::new();

        let outcome = follower.tick(STEP, &grid, Vec2::new(0.5, 0.5), &target, &mut commands);

        assert_eq!(outcome, RebuildOutcome::Rebuilt { waypoints: 3 });
        assert_eq!(follower.cooldown_remaining(), DEFAULT_REBUILD_COOLDOWN);
        assert_eq!(follower.reference_position(), target);
        assert!(matches!(
            commands.as_slice(),
            [Command::MoveToPosition { intent, .. }] if intent.destination == Vec2::new(1.5, 0.5)
        ));
    }

    #[test]
    fn engagement_never_reverts() {
        let grid = open_grid();
        let mut follower = follower(Vec2::new(2.5, 0.5));
        let mut commands: Vec<Command> = Vec::new();
        let _ = follower.tick(
            STEP,
            &grid,
            Vec2::new(0.5, 0.5),
            &Vec2::new(2.5, 0.5),
            &mut commands,
        );

        let outcome = follower.tick(
            STEP,
            &grid,
            Vec2::new(0.5, 0.5),
            &Vec2::new(7.5, 7.5),
            &mut commands,
        );

        assert!(follower.is_chasing());
        assert_ne!(outcome, RebuildOutcome::Dormant);
    }

    #[test]
    fn rebuild_waits_for_cooldown_or_displacement() {
        let grid = open_grid();
        let target = Vec2::new(4.5, 4.5);
        let mut follower = follower(target);
        let mut commands: Vec<Command> = Vec::new();
        let agent = Vec2::new(1.5, 1.5);
        let _ = follower.tick(STEP, &grid, agent, &target, &mut commands);

        assert_eq!(
            follower.tick(STEP, &grid, agent, &Vec2::new(6.5, 4.5), &mut commands),
            RebuildOutcome::Skipped
        );
        assert!(matches!(
            follower.tick(STEP, &grid, agent, &Vec2::new(7.6, 4.5), &mut commands),
            RebuildOutcome::Rebuilt { .. }
        ));
        assert!(matches!(
            follower.tick(
                DEFAULT_REBUILD_COOLDOWN,
                &grid,
                agent,
                &Vec2::new(7.6, 4.5),
                &mut commands
            ),
            RebuildOutcome::Rebuilt { .. }
        ));
    }

    #[test]
    fn replanning_cancels_active_task_with_single_idle() {
        let grid = open_grid();
        let target = Vec2::new(4.5, 0.5);
        let mut follower = follower(target);
        let mut commands: Vec<Command> = Vec::new();
        let agent = Vec2::new(0.5, 0.5);
        let _ = follower.tick(STEP, &grid, agent, &target, &mut commands);
        commands.clear();

        let moved = Vec2::new(4.5, 4.5);
        let outcome = follower.tick(STEP, &grid, agent, &moved, &mut commands);

        assert!(matches!(outcome, RebuildOutcome::Rebuilt { .. }));
        assert_eq!(idles(&commands), 1);
        assert!(matches!(commands.first(), Some(Command::Idle { .. })));
        assert!(matches!(commands.last(), Some(Command::MoveToPosition { .. })));
    }

    #[test]
    fn unreachable_target_idles_once() {
        #[rustfmt::skip]
        let costs = [
            1, 0, 1,
            0, 0, 1,
            1, 1, 1,
        ]
        .map(TileCost::new)
        .to_vec();
        let grid = CostGrid::from_costs(3, 3, costs, GridTransform::default()).expect("grid");
        let target = Vec2::new(2.5, 2.5);
        let mut follower = follower(target);
        let mut commands: Vec<Command> = Vec::new();

        let outcome = follower.tick(STEP, &grid, Vec2::new(0.5, 0.5), &target, &mut commands);

        assert_eq!(outcome, RebuildOutcome::Unreachable);
        assert_eq!(commands, vec![Command::Idle { agent: AGENT }]);
        assert!(follower.active_task().is_none());
    }

    #[test]
    fn losing_the_path_cancels_the_running_task() {
        let mut grid = open_grid();
        let target = Vec2::new(4.5, 0.5);
        let mut follower = follower(target);
        let mut commands: Vec<Command> = Vec::new();
        let agent = Vec2::new(0.5, 0.5);
        let _ = follower.tick(STEP, &grid, agent, &target, &mut commands);
        assert!(follower.active_task().is_some());
        commands.clear();

        for column in 0..8 {
            for row in 0..8 {
                if column > 1 {
                    let _ = grid
                        .set_cost(CellCoord::new(column, row), TileCost::IMPASSABLE)
                        .expect("in bounds");
                }
            }
        }
        let outcome = follower.tick(
            DEFAULT_REBUILD_COOLDOWN,
            &grid,
            agent,
            &target,
            &mut commands,
        );

        assert_eq!(outcome, RebuildOutcome::Unreachable);
        assert_eq!(commands, vec![Command::Idle { agent: AGENT }]);
        assert!(follower.active_task().is_none());
    }

    #[test]
    fn adjacent_target_finishes_without_moving() {
        let grid = open_grid();
        let target = Vec2::new(0.5, 0.5);
        let mut follower = follower(target);
        let mut commands: Vec<Command> = Vec::new();

        let outcome = follower.tick(STEP, &grid, Vec2::new(0.6, 0.5), &target, &mut commands);

        assert_eq!(outcome, RebuildOutcome::Unreachable);
        assert_eq!(commands, vec![Command::Idle { agent: AGENT }]);
    }

    #[test]
    fn teardown_signals_idle_only_while_moving() {
        let grid = open_grid();
        let target = Vec2::new(4.5, 0.5);
        let mut follower = follower(target);
        let mut commands: Vec<Command> = Vec::new();
        let _ = follower.tick(STEP, &grid, Vec2::new(0.5, 0.5), &target, &mut commands);
        commands.clear();

        follower.teardown(&mut commands);
        follower.teardown(&mut commands);

        assert_eq!(commands, vec![Command::Idle { agent: AGENT }]);
    }
}
