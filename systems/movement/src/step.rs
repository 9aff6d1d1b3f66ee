use dungeon_core::{AgentId, CostGrid, MoveIntent, MovementSink};
use dungeon_system_pathfinding::Path;
use glam::Vec2;

/// Resumption point of a [`StepTask`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StepPhase {
    /// Next resume pops the following waypoint.
    Advance,
    /// Agent is heading toward the waypoint.
    Moving {
        /// World position of the cell centre being approached.
        waypoint: Vec2,
    },
    /// Waypoint reached; the task idles for one tick before advancing.
    Pause,
    /// Every waypoint was consumed and the idle signal was sent.
    Finished,
    /// The follower stopped the task early.
    Cancelled,
}

/// Resumable consumption of a single path, one physics step per resume.
#[derive(Clone, Debug)]
pub struct StepTask {
    agent: AgentId,
    waypoints: Vec<Vec2>,
    speed: f32,
    proximity: f32,
    phase: StepPhase,
}

impl StepTask {
    /// Prepares a task that walks the remaining cells of `path`.
    #[must_use]
    pub fn new(agent: AgentId, grid: &CostGrid, path: &Path, speed: f32, proximity: f32) -> Self {
        let mut waypoints: Vec<Vec2> = path.iter().map(|cell| grid.cell_to_world(cell)).collect();
        waypoints.reverse();
        Self {
            agent,
            waypoints,
            speed,
            proximity,
            phase: StepPhase::Advance,
        }
    }

    /// Current resumption point.
    #[must_use]
    pub const fn phase(&self) -> StepPhase {
        self.phase
    }

    /// Reports whether the task still expects to be resumed.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        !matches!(self.phase, StepPhase::Finished | StepPhase::Cancelled)
    }

    /// Waypoints that have not been popped yet.
    #[must_use]
    pub fn remaining_waypoints(&self) -> usize {
        self.waypoints.len()
    }

    /// Runs the task until its next suspension point.
    pub fn resume<S>(&mut self, agent_position: Vec2, sink: &mut S)
    where
        S: MovementSink,
    {
        loop {
            match self.phase {
                StepPhase::Finished | StepPhase::Cancelled => return,
                StepPhase::Advance => match self.waypoints.pop() {
                    Some(waypoint) => self.phase = StepPhase::Moving { waypoint },
                    None => {
                        sink.idle(self.agent);
                        self.phase = StepPhase::Finished;
                        return;
                    }
                },
                StepPhase::Moving { waypoint } => {
                    if agent_position.distance(waypoint) > self.proximity {
                        sink.move_towards(
                            self.agent,
                            MoveIntent {
                                destination: waypoint,
                                current: agent_position,
                                speed: self.speed,
                                direction: (waypoint - agent_position).normalize_or_zero(),
                            },
                        );
                    } else {
                        self.phase = StepPhase::Pause;
                    }
                    return;
                }
                StepPhase::Pause => self.phase = StepPhase::Advance,
            }
        }
    }

    /// Stops the task, emitting the idle signal if it was still running.
    ///
    /// Returns whether a signal was emitted. Cancelling twice, or cancelling
    /// a finished task, is a no-op.
    pub fn cancel<S>(&mut self, sink: &mut S) -> bool
    where
        S: MovementSink,
    {
        if !self.is_running() {
            return false;
        }
        self.phase = StepPhase::Cancelled;
        self.waypoints.clear();
        sink.idle(self.agent);
        true
    }
}
