use crate::math::Float;

/// Tuning of the probes, the drive heuristic and the motion actuator.
///
/// A configuration is checked with [`validate`](Self::validate) when it is handed to
/// [`AutodriveVehicle::new`](crate::AutodriveVehicle::new) or
/// [`AutodriveController::new`](crate::AutodriveController::new), so invalid values are rejected
/// when loaded rather than misbehaving mid-simulation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialize",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct AutodriveConfig {
    /// The angle, in degrees, between the forward probe and the forward-left/forward-right
    /// probes.
    pub side_ray_angle: Float,

    /// Height in meters above the vehicle's origin for the probes.
    pub ray_height: Float,

    /// How far to the sides of the vehicle's center line the forward-left/forward-right probes
    /// start.
    pub horizontal_forward_ray_distance: Float,

    /// The range of every probe. Probes that hit nothing report this as their distance.
    pub max_ray_distance: Float,

    /// The acceleration applied when speeding up.
    pub acceleration: Float,

    /// The deceleration applied when slowing down.
    ///
    /// This is a separate coefficient from [`acceleration`](Self::acceleration) so that braking
    /// can be stronger (or weaker) than speeding up.
    #[cfg_attr(feature = "serialize", serde(alias = "decceleration"))]
    pub deceleration: Float,

    /// The goal speed when the forward probe reports at least
    /// [`free_distance`](Self::free_distance).
    pub max_speed: Float,

    /// Multiplier for the torque applied when turning.
    pub turning_speed: Float,

    /// The forward distance at which the vehicle wants to drive at
    /// [`max_speed`](Self::max_speed). Shorter distances scale the goal speed down linearly.
    pub free_distance: Float,

    /// If either the forward-left or the forward-right probe reports less than this, the goal
    /// speed is set to zero.
    pub caution_distance: Float,

    /// Recognized and validated, but not used by any of the decision logic.
    pub stop_distance: Float,
}

impl Default for AutodriveConfig {
    fn default() -> Self {
        Self {
            side_ray_angle: 10.0,
            ray_height: 0.2,
            horizontal_forward_ray_distance: 0.5,
            max_ray_distance: 5.0,
            acceleration: 1.0,
            deceleration: 1.0,
            max_speed: 10.0,
            turning_speed: 1.0,
            free_distance: 5.0,
            caution_distance: 1.0,
            stop_distance: 0.5,
        }
    }
}

/// A configuration value that cannot be used.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("invalid autodrive configuration: `{field}` {problem} (got {value})")]
pub struct AutodriveConfigError {
    pub field: &'static str,
    pub problem: &'static str,
    pub value: Float,
}

fn require(
    field: &'static str,
    value: Float,
    is_valid: bool,
    problem: &'static str,
) -> Result<(), AutodriveConfigError> {
    if value.is_finite() && is_valid {
        Ok(())
    } else {
        Err(AutodriveConfigError {
            field,
            problem,
            value,
        })
    }
}

impl AutodriveConfig {
    pub fn validate(&self) -> Result<(), AutodriveConfigError> {
        // Divides the forward distance in the goal speed mapping
        require(
            "free_distance",
            self.free_distance,
            0.0 < self.free_distance,
            "must be positive",
        )?;
        require(
            "max_ray_distance",
            self.max_ray_distance,
            0.0 < self.max_ray_distance,
            "must be positive",
        )?;
        require(
            "side_ray_angle",
            self.side_ray_angle,
            (0.0..=90.0).contains(&self.side_ray_angle),
            "must be between 0 and 90 degrees",
        )?;
        require("ray_height", self.ray_height, true, "must be finite")?;
        for (field, value) in [
            (
                "horizontal_forward_ray_distance",
                self.horizontal_forward_ray_distance,
            ),
            ("acceleration", self.acceleration),
            ("deceleration", self.deceleration),
            ("max_speed", self.max_speed),
            ("turning_speed", self.turning_speed),
            ("caution_distance", self.caution_distance),
            ("stop_distance", self.stop_distance),
        ] {
            require(field, value, 0.0 <= value, "must not be negative")?;
        }
        Ok(())
    }

    /// Parse a configuration from RON and validate it.
    ///
    /// Missing fields take their default values.
    #[cfg(feature = "serialize")]
    pub fn from_ron_str(source: &str) -> Result<Self, crate::AutodriveError> {
        let config: Self = ron::de::from_str(source)?;
        config.validate().inspect_err(|err| {
            bevy::log::warn!("Rejected autodrive configuration: {err}");
        })?;
        Ok(config)
    }
}
