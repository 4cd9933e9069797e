use crate::config::AutodriveConfig;
use crate::control_source::ControlCommand;
use crate::math::{clamp_to, Float};
use crate::{PerProbe, ProbeHits, ProbeKind};

/// Linearly rescale `value` from `[in_low, in_high]` to `[out_low, out_high]`, and then clamp
/// the result into `[out_low, out_high]`.
///
/// The clamp happens after the scaling, so inputs outside the input range saturate instead of
/// extrapolating:
///
/// ```
/// # use bevy_autodrive::map_clamp;
/// assert_eq!(map_clamp(0.0, 10.0, 0.0, 20.0, 5.0), 10.0);
/// assert_eq!(map_clamp(0.0, 10.0, 0.0, 20.0, 15.0), 20.0);
/// assert_eq!(map_clamp(0.0, 10.0, 0.0, 20.0, -3.0), 0.0);
/// ```
///
/// An empty input range maps everything below `in_low` to `out_low` and everything else to
/// `out_high`.
pub fn map_clamp(
    in_low: Float,
    in_high: Float,
    out_low: Float,
    out_high: Float,
    value: Float,
) -> Float {
    let in_span = in_high - in_low;
    if in_span == 0.0 {
        return if value < in_low { out_low } else { out_high };
    }
    let mapped = (value - in_low) / in_span * (out_high - out_low) + out_low;
    clamp_to(mapped, out_low, out_high)
}

/// What the [`DriveController`] decided for a single step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriveDecision {
    pub goal_speed: Float,
    pub command: ControlCommand,
}

/// The obstacle avoidance heuristic used when the vehicle drives on its own.
///
/// It only looks at probe distances and the current speed, so a trained policy that sees the
/// same [`Observation`](crate::Observation) can replace it.
#[derive(Debug, Clone, PartialEq)]
pub struct DriveController {
    /// Forward distance at which the goal speed reaches [`max_speed`](Self::max_speed).
    pub free_distance: Float,
    pub max_speed: Float,
    /// Brake to a stop if either diagonal probe reports less than this.
    pub caution_distance: Float,
}

impl DriveController {
    pub fn new(config: &AutodriveConfig) -> Self {
        Self {
            free_distance: config.free_distance,
            max_speed: config.max_speed,
            caution_distance: config.caution_distance,
        }
    }

    /// The speed the vehicle wants to drive at, given the probe distances.
    ///
    /// Scales linearly with the forward distance up to [`free_distance`](Self::free_distance).
    /// The diagonal probes override it with zero when either of them is closer than
    /// [`caution_distance`](Self::caution_distance).
    pub fn goal_speed(&self, distances: &PerProbe<Float>) -> Float {
        if distances[ProbeKind::ForwardLeft] < self.caution_distance
            || distances[ProbeKind::ForwardRight] < self.caution_distance
        {
            return 0.0;
        }
        map_clamp(
            0.0,
            self.free_distance,
            0.0,
            self.max_speed,
            distances[ProbeKind::Forward],
        )
    }

    pub fn decide(&self, distances: &PerProbe<Float>, current_speed: Float) -> DriveDecision {
        let goal_speed = self.goal_speed(distances);
        let accel_amount = if current_speed < goal_speed {
            1.0
        } else if goal_speed < current_speed {
            -1.0
        } else {
            0.0
        };
        // Equal clearance on both sides turns right.
        let turn_amount =
            if distances[ProbeKind::ForwardRight] < distances[ProbeKind::ForwardLeft] {
                -1.0
            } else {
                1.0
            };
        DriveDecision {
            goal_speed,
            command: ControlCommand::new(turn_amount, accel_amount),
        }
    }

    pub fn decide_from_hits(&self, hits: &ProbeHits, current_speed: Float) -> DriveDecision {
        self.decide(&hits.map(|_, hit| hit.distance), current_speed)
    }
}
