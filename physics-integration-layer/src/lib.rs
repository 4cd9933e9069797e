use bevy::prelude::*;

pub mod data_for_backends;
pub mod math;
pub mod motion;
pub mod perception;

/// Umbrella system set for [`AutodrivePipelineSystems`].
///
/// The physics backends' plugins are responsible for preventing this entire system set from
/// running when the physics backend itself is paused.
#[derive(SystemSet, Clone, PartialEq, Eq, Debug, Hash)]
pub struct AutodriveSystems;

/// The various stages of the autodrive pipeline.
///
/// One control step runs through all of them, in order, before the next tick begins.
#[derive(SystemSet, Clone, PartialEq, Eq, Debug, Hash)]
pub enum AutodrivePipelineSystems {
    /// The physics backend updates the pose, velocity and contacts of the vehicle.
    Sensors,
    /// The probe rays are computed from the vehicle's pose.
    Probes,
    /// The physics backend casts the probe rays against the scene.
    Perception,
    /// The controller decides on a command and turns it into motor output.
    Logic,
    /// The physics backend applies the motor output to the rigid body.
    Motors,
    /// The step is scored for the training loop.
    Reward,
}

/// The user controls should be applied in this system set.
///
/// It runs after perception, so manual input and external policies see this tick's probe
/// samples, and before [`AutodrivePipelineSystems::Logic`] which consumes them.
#[derive(SystemSet, Clone, PartialEq, Eq, Debug, Hash)]
pub struct AutodriveUserControlsSystems;
