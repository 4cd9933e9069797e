use std::fmt;

use crate::drive::DriveController;
use crate::math::{clamp_to, Float};
use crate::{AutodriveConfig, PerProbe, ProbeHits, PROBE_COUNT};

fn clamp_unit(value: Float) -> Float {
    if value.is_nan() {
        0.0
    } else {
        clamp_to(value, -1.0, 1.0)
    }
}

/// The decision of a single step, in abstract units.
///
/// Both amounts are clamped into `[-1, 1]` on construction (`NaN` becomes `0`).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlCommand {
    turn_amount: Float,
    accel_amount: Float,
}

impl ControlCommand {
    pub const IDLE: Self = Self {
        turn_amount: 0.0,
        accel_amount: 0.0,
    };

    pub fn new(turn_amount: Float, accel_amount: Float) -> Self {
        Self {
            turn_amount: clamp_unit(turn_amount),
            accel_amount: clamp_unit(accel_amount),
        }
    }

    /// Positive turns right, negative turns left.
    pub fn turn_amount(&self) -> Float {
        self.turn_amount
    }

    /// Positive speeds up, negative slows down (and eventually reverses).
    pub fn accel_amount(&self) -> Float {
        self.accel_amount
    }
}

/// What a control policy gets to see on every step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Observation {
    /// Probe distances divided by the probe range, clamped into `[0, 1]`.
    pub distances: PerProbe<Float>,
    /// The magnitude of the vehicle's velocity.
    pub speed: Float,
}

impl Observation {
    pub const SIZE: usize = PROBE_COUNT + 1;

    pub fn from_hits(hits: &ProbeHits, speed: Float, max_ray_distance: Float) -> Self {
        Self {
            distances: hits.map(|_, hit| {
                if 0.0 < max_ray_distance {
                    clamp_to(hit.distance / max_ray_distance, 0.0, 1.0)
                } else {
                    0.0
                }
            }),
            speed,
        }
    }

    /// The flat vector handed to training frameworks: the five distances in probe order,
    /// followed by the speed.
    pub fn as_array(&self) -> [Float; Self::SIZE] {
        let mut result = [0.0; Self::SIZE];
        result[..PROBE_COUNT].copy_from_slice(&self.distances.0);
        result[PROBE_COUNT] = self.speed;
        result
    }
}

/// A control policy that can drive the vehicle, usually one trained by an external learning
/// framework.
///
/// Implemented for closures, so a policy can be as simple as
/// `|observation: &Observation| ControlCommand::new(0.0, 1.0)`.
pub trait AutodrivePolicy: 'static + Send + Sync {
    fn act(&mut self, observation: &Observation) -> ControlCommand;
}

impl<F> AutodrivePolicy for F
where
    F: 'static + Send + Sync + FnMut(&Observation) -> ControlCommand,
{
    fn act(&mut self, observation: &Observation) -> ControlCommand {
        self(observation)
    }
}

/// The [`DriveController`] heuristic, working on observations instead of raw probe hits.
///
/// The controller's distances are divided by the probe range once, so the normalized
/// observation is compared against them directly. Ties and distances exactly at the caution
/// distance decide like the controller does on raw hits. Two raw distances a single rounding
/// step apart can become equal after normalizing, and the goal speed can differ in its last bits.
#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicPolicy {
    /// Distances in units of the probe range.
    pub controller: DriveController,
}

impl HeuristicPolicy {
    pub fn new(config: &AutodriveConfig) -> Self {
        let range = config.max_ray_distance;
        Self {
            controller: DriveController {
                free_distance: config.free_distance / range,
                max_speed: config.max_speed,
                caution_distance: config.caution_distance / range,
            },
        }
    }
}

impl AutodrivePolicy for HeuristicPolicy {
    fn act(&mut self, observation: &Observation) -> ControlCommand {
        self.controller
            .decide(&observation.distances, observation.speed)
            .command
    }
}

/// The state of the driving keys, for driving the vehicle by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ManualDriveInput {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

impl ManualDriveInput {
    /// Opposite keys cancel each other out.
    pub fn command(&self) -> ControlCommand {
        fn axis(positive: bool, negative: bool) -> Float {
            match (positive, negative) {
                (true, false) => 1.0,
                (false, true) => -1.0,
                _ => 0.0,
            }
        }
        ControlCommand::new(
            axis(self.right, self.left),
            axis(self.forward, self.backward),
        )
    }
}

/// Who decides the [`ControlCommand`] of each step.
#[derive(Default)]
pub enum ControlSource {
    Manual(ManualDriveInput),
    /// The built-in [`DriveController`].
    #[default]
    Heuristic,
    Trained(Box<dyn AutodrivePolicy>),
}

impl fmt::Debug for ControlSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manual(input) => f.debug_tuple("Manual").field(input).finish(),
            Self::Heuristic => write!(f, "Heuristic"),
            Self::Trained(_) => write!(f, "Trained(..)"),
        }
    }
}

impl ControlSource {
    pub fn trained(policy: impl AutodrivePolicy) -> Self {
        Self::Trained(Box::new(policy))
    }

    /// Resolve this step's command.
    ///
    /// `hits` and `observation` must come from the same sampling of the probes.
    pub fn resolve(
        &mut self,
        controller: &DriveController,
        hits: &ProbeHits,
        observation: &Observation,
    ) -> ControlCommand {
        match self {
            Self::Manual(input) => input.command(),
            Self::Heuristic => controller.decide_from_hits(hits, observation.speed).command,
            Self::Trained(policy) => policy.act(observation),
        }
    }

    /// Update the key state if this is a manual source. Other sources are left untouched.
    pub fn feed_manual(&mut self, input: ManualDriveInput) {
        if let Self::Manual(current) = self {
            *current = input;
        }
    }
}
