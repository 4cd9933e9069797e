use crate::math::{Float, Vector3};
use crate::{Observation, ProbeHits, ProbeKind};

/// Reward for every step in which the vehicle's position changed.
pub const PROGRESS_REWARD: Float = 0.1;

/// Maximal reward for keeping the vehicle in the middle of the lane. Only reachable when it is
/// exactly centered.
pub const CENTERING_REWARD_SCALE: Float = 0.1;

/// Added on every step, so that episodes are encouraged to make progress fast.
pub const TIME_PENALTY: Float = -0.05;

/// The positions the vehicle went through during the current episode.
///
/// The default history is empty, for vehicles that were never reset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathHistory {
    positions: Vec<Vector3>,
    distance_traveled: Float,
}

impl PathHistory {
    pub fn new(start: Vector3) -> Self {
        Self {
            positions: vec![start],
            distance_traveled: 0.0,
        }
    }

    pub fn record(&mut self, position: Vector3) {
        if let Some(last) = self.positions.last() {
            self.distance_traveled += last.distance(position);
        }
        self.positions.push(position);
    }

    /// Leave exactly one entry - `start` - and zero the traveled distance.
    pub fn reset(&mut self, start: Vector3) {
        self.positions.clear();
        self.positions.push(start);
        self.distance_traveled = 0.0;
    }

    pub fn positions(&self) -> &[Vector3] {
        &self.positions
    }

    pub fn last(&self) -> Option<Vector3> {
        self.positions.last().copied()
    }

    /// Sum of the distances between every two consecutive positions.
    pub fn distance_traveled(&self) -> Float {
        self.distance_traveled
    }

    /// Whether the last two positions differ.
    ///
    /// A history with fewer than two positions counts as having moved, so the first step of an
    /// episode always gets the progress reward.
    pub fn moved_last_step(&self) -> bool {
        match self.positions.as_slice() {
            [.., before, last] => 0.0 < before.distance(*last),
            _ => true,
        }
    }
}

/// Reward for keeping the same distance from both sides.
///
/// ```
/// # use bevy_autodrive::centering_reward;
/// assert_eq!(centering_reward(3.0, 3.0), 0.05);
/// assert_eq!(centering_reward(0.0, 5.0), 0.0);
/// assert_eq!(centering_reward(0.0, 0.0), 0.0);
/// ```
pub fn centering_reward(left_distance: Float, right_distance: Float) -> Float {
    let total = left_distance + right_distance;
    if total <= 0.0 {
        return 0.0;
    }
    CENTERING_REWARD_SCALE * (left_distance.min(right_distance) / total)
}

/// The terms that make up the reward of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RewardBreakdown {
    pub progress: Float,
    pub centering: Float,
    pub time_penalty: Float,
    /// The distance traveled during the episode, granted when the vehicle hits an obstacle.
    pub terminal: Float,
    /// The vehicle touched an obstacle and the episode is over.
    pub done: bool,
}

impl RewardBreakdown {
    pub fn total(&self) -> Float {
        self.progress + self.centering + self.time_penalty + self.terminal
    }
}

/// Score a single control step.
///
/// `path` must already include the position the vehicle reached in this step.
pub fn compute_reward(
    path: &PathHistory,
    hits: &ProbeHits,
    touching_obstacle: bool,
) -> RewardBreakdown {
    RewardBreakdown {
        progress: if path.moved_last_step() {
            PROGRESS_REWARD
        } else {
            0.0
        },
        centering: centering_reward(
            hits[ProbeKind::Left].distance,
            hits[ProbeKind::Right].distance,
        ),
        time_penalty: TIME_PENALTY,
        terminal: if touching_obstacle {
            path.distance_traveled()
        } else {
            0.0
        },
        done: touching_obstacle,
    }
}

/// The lifecycle of a training episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EpisodeState {
    #[default]
    Running,
    /// The vehicle hit an obstacle. Nothing is actuated or scored until the episode is reset.
    Terminated,
}

/// Bookkeeping of the current training episode.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AutodriveEpisode {
    state: EpisodeState,
    cumulative_reward: Float,
    steps: usize,
}

impl AutodriveEpisode {
    pub fn state(&self) -> EpisodeState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == EpisodeState::Running
    }

    pub fn cumulative_reward(&self) -> Float {
        self.cumulative_reward
    }

    /// Number of scored steps in this episode.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Accumulate the reward of a step, terminating the episode if it is done.
    ///
    /// Ignored while the episode is terminated.
    pub fn record(&mut self, breakdown: &RewardBreakdown) {
        if !self.is_running() {
            return;
        }
        self.cumulative_reward += breakdown.total();
        self.steps += 1;
        if breakdown.done {
            self.state = EpisodeState::Terminated;
        }
    }

    pub fn restart(&mut self) {
        *self = Self::default();
    }
}

/// What the training loop receives after every step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingStep {
    pub observation: Observation,
    pub reward: Float,
    pub done: bool,
}
