//! # Autodrive - a reactive probe-based vehicle controller for Bevy
//!
//! A vehicle perceives its surroundings through a fixed fan of five distance probes, turns them
//! into a goal speed and a turning decision, and applies the result as force and torque. The same
//! observations, together with a shaped reward signal, can be handed to a reinforcement learning
//! training loop that replaces the built-in heuristic with a learned policy.
//!
//! Autodrive does not do physics on its own. It needs a physics backend to read the vehicle's
//! state, cast the probes and apply the motor output. Currently supported backends:
//!
//! | Physics Backend                                      | Crate                                                              |
//! |------------------------------------------------------|--------------------------------------------------------------------|
//! | [Avian 3D](https://crates.io/crates/avian3d)         | [bevy-autodrive-avian3d](https://crates.io/crates/bevy-autodrive-avian3d) |
//!
//! For simulations without Bevy, or for training without a renderer, see the [`headless`]
//! module and [`AutodriveVehicle`].
//!
//! ## Using Autodrive in a Bevy app
//!
//! * Add [`AutodriveControllerPlugin`] and the physics backend's plugin to the app, with the same
//!   schedule:
//!
//!   ```no_run
//!   # use bevy::prelude::*;
//!   # use bevy_autodrive::prelude::*;
//!   # let mut app = App::new();
//!   app.add_plugins(AutodriveControllerPlugin::new(FixedUpdate));
//!   ```
//!
//! * Add an [`AutodriveController`] to the vehicle's rigid body entity. It is constructed from
//!   an [`AutodriveConfig`] (which gets validated) and the [`VehicleGeometry`] of the vehicle.
//! * To drive the vehicle manually or with a trained policy, change its [`ControlSource`] from a
//!   system in the [`AutodriveUserControlsSystems`] set.
//! * To score the vehicle for training, add an [`AutodriveAgent`] as well. Its episode ends when
//!   the vehicle touches an entity marked with [`AutodriveObstacle`], and
//!   [`AutodriveAgent::request_reset`] starts a new one.
//!
//! ## The pipeline
//!
//! Each tick runs the stages of [`AutodrivePipelineSystems`] in order: the backend updates the
//! sensors, the probes are computed from the vehicle's pose, the backend casts them, the user
//! controls run, the controller decides on a command and writes it to the [`AutodriveMotor`],
//! the backend applies the motor, and finally the step is scored.
//!
//! If the probes could not be cast (the scene query itself failed), the step is aborted before
//! anything is actuated and an [`AutodrivePerceptionFailed`] event is sent.
mod actuator;
mod config;
mod control_source;
mod controller;
pub mod debug;
mod drive;
mod error;
pub mod headless;
mod probes;
mod reward;
mod vehicle;

pub use actuator::*;
pub use config::*;
pub use control_source::*;
pub use controller::*;
pub use drive::*;
pub use error::*;
pub use probes::*;
pub use reward::*;
pub use vehicle::*;

pub use bevy_autodrive_physics_integration_layer::data_for_backends::*;
pub use bevy_autodrive_physics_integration_layer::math;
pub use bevy_autodrive_physics_integration_layer::motion::*;
pub use bevy_autodrive_physics_integration_layer::perception::*;
pub use bevy_autodrive_physics_integration_layer::*;

pub mod prelude {
    pub use crate::{
        AutodriveAgent, AutodriveConfig, AutodriveController, AutodriveControllerPlugin,
        AutodriveEpisodeEnded, AutodriveObstacle, AutodrivePerceptionFailed,
        AutodrivePipelineSystems, AutodriveSystems, AutodriveToggle, AutodriveUserControlsSystems,
        AutodriveVehicle, ControlCommand, ControlSource, ManualDriveInput, Observation,
        VehicleGeometry, VehiclePose,
    };
}
