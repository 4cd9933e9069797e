//! Running Autodrive without a physics engine.
//!
//! This is mostly useful for training: [`HeadlessTrack`] combines an [`AutodriveVehicle`] with a
//! scene made of axis-aligned boxes ([`AabbScene`]) and a simple integrator
//! ([`KinematicBody`]), and exposes the `reset`/`step` interface training loops expect.

mod body;
mod scene;

pub use body::KinematicBody;
pub use scene::{AabbScene, SceneBox};

use crate::control_source::{ControlCommand, Observation};
use crate::error::AutodriveError;
use crate::math::{Float, Vector3};
use crate::reward::TrainingStep;
use crate::vehicle::{AutodriveVehicle, StepReport};
use crate::{AutodriveMotionPort, VehiclePose};

/// A single vehicle driving in an [`AabbScene`].
///
/// The vehicle is always in training mode, so touching a box marked as an obstacle terminates
/// the episode.
pub struct HeadlessTrack {
    pub scene: AabbScene,
    pub body: KinematicBody,
    vehicle: AutodriveVehicle,
    start_pose: VehiclePose,
    frame_duration: Float,
}

impl HeadlessTrack {
    /// The vehicle starts at `start_pose`, but the episode only starts on the first
    /// [`reset`](Self::reset).
    pub fn new(
        scene: AabbScene,
        vehicle: AutodriveVehicle,
        start_pose: VehiclePose,
        frame_duration: Float,
    ) -> Self {
        Self {
            scene,
            body: KinematicBody::new(start_pose),
            vehicle: vehicle.with_training(true),
            start_pose,
            frame_duration,
        }
    }

    pub fn vehicle(&self) -> &AutodriveVehicle {
        &self.vehicle
    }

    pub fn vehicle_mut(&mut self) -> &mut AutodriveVehicle {
        &mut self.vehicle
    }

    pub fn start_pose(&self) -> &VehiclePose {
        &self.start_pose
    }

    pub fn frame_duration(&self) -> Float {
        self.frame_duration
    }

    /// Half extents of the vehicle's box, for checking contacts.
    fn half_extents(&self) -> Vector3 {
        let geometry = self.vehicle.geometry();
        Vector3::new(geometry.width(), geometry.height(), geometry.length())
            * 0.5
            * self.body.pose.scale
    }

    fn touching_obstacle(&self) -> bool {
        self.scene.touching_obstacle(&self.body.pose, self.half_extents())
    }

    /// Start a new episode and return its first observation.
    pub fn reset(&mut self) -> Result<Observation, AutodriveError> {
        self.vehicle.reset(&self.start_pose, &mut self.body);
        let pose = self.body.pose;
        let hits = self.vehicle.sense(&pose, &self.scene)?;
        Ok(self.vehicle.observe(&hits, self.body.velocity().length()))
    }

    /// Apply a command from an external policy, advance the simulation by one frame, and return
    /// the reward of the step along with the next observation.
    ///
    /// Once the episode is done, further steps report `done` with no reward until the next
    /// [`reset`](Self::reset).
    pub fn step(&mut self, command: ControlCommand) -> Result<TrainingStep, AutodriveError> {
        let pose = self.body.pose;
        let hits = self.vehicle.sense(&pose, &self.scene)?;
        self.vehicle
            .actuate(&command, &pose, &mut self.body, self.frame_duration);
        self.body.integrate(self.frame_duration);

        let touching_obstacle = self.touching_obstacle();
        let reward = self
            .vehicle
            .score(self.body.pose.translation, &hits, touching_obstacle);

        let next_pose = self.body.pose;
        let next_hits = self.vehicle.sense(&next_pose, &self.scene)?;
        Ok(TrainingStep {
            observation: self
                .vehicle
                .observe(&next_hits, self.body.velocity().length()),
            reward: reward.map_or(0.0, |reward| reward.total()),
            done: !self.vehicle.episode().is_running(),
        })
    }

    /// Let the vehicle's own [`ControlSource`](crate::ControlSource) drive for one frame.
    ///
    /// Contacts and the path are checked after the frame is integrated, as in
    /// [`step`](Self::step).
    pub fn step_autonomous(&mut self) -> Result<StepReport, AutodriveError> {
        let pose = self.body.pose;
        let hits = self.vehicle.sense(&pose, &self.scene)?;
        let drive = self
            .vehicle
            .drive(&hits, &pose, &mut self.body, self.frame_duration);
        self.body.integrate(self.frame_duration);

        let touching_obstacle = self.touching_obstacle();
        let reward = self
            .vehicle
            .score(self.body.pose.translation, &hits, touching_obstacle);
        Ok(StepReport {
            hits,
            drive,
            reward,
        })
    }
}
