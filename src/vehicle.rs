use bevy::prelude::*;

use crate::actuator::{
    accel_feedback_color, apply_command, remove_lateral_velocity, RESET_FEEDBACK_COLOR,
};
use crate::config::AutodriveConfig;
use crate::control_source::{ControlCommand, ControlSource, Observation};
use crate::debug::{draw_probes, AutodriveDebugSink};
use crate::drive::DriveController;
use crate::error::AutodriveError;
use crate::math::{Float, Vector3};
use crate::probes::{compute_probes, VehicleGeometry};
use crate::reward::{compute_reward, AutodriveEpisode, PathHistory, RewardBreakdown, TrainingStep};
use crate::{
    sample_probes, AutodriveMotionPort, AutodriveSceneQuery, PerProbe, PerceptionUnavailable,
    Probe, ProbeHits, VehiclePose,
};

/// What happened when a command was decided and actuated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriveOutcome {
    pub observation: Observation,
    pub command: ControlCommand,
    /// The goal speed of the [`DriveController`], even when another source is in control.
    pub goal_speed: Float,
    /// `false` if the episode is terminated, in which case only the lateral velocity was removed.
    pub actuated: bool,
}

/// The result of [`AutodriveVehicle::step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    pub hits: ProbeHits,
    pub drive: DriveOutcome,
    /// Only available in training mode, while the episode is running.
    pub reward: Option<RewardBreakdown>,
}

impl StepReport {
    pub fn done(&self) -> bool {
        self.reward.is_some_and(|reward| reward.done)
    }

    /// The step in the form the training loop consumes it. `None` when nothing was scored.
    pub fn training_step(&self) -> Option<TrainingStep> {
        let reward = self.reward?;
        Some(TrainingStep {
            observation: self.drive.observation,
            reward: reward.total(),
            done: reward.done,
        })
    }
}

/// The full control pipeline of a single vehicle, independent of any ECS.
///
/// Every step runs probe computation, sampling, command resolution, actuation and (in training
/// mode) scoring exactly once, in that order. The scene and the motion state are owned by the
/// caller and passed in as collaborators.
#[derive(Debug)]
pub struct AutodriveVehicle {
    config: AutodriveConfig,
    geometry: VehicleGeometry,
    controller: DriveController,
    control_source: ControlSource,
    training: bool,
    path: PathHistory,
    episode: AutodriveEpisode,
    feedback_color: Color,
    last_sample: Option<(PerProbe<Probe>, ProbeHits)>,
}

impl AutodriveVehicle {
    /// Fails if the configuration does not [validate](AutodriveConfig::validate).
    pub fn new(config: AutodriveConfig, geometry: VehicleGeometry) -> Result<Self, AutodriveError> {
        config.validate().inspect_err(|err| {
            warn!("Rejected autodrive configuration: {err}");
        })?;
        Ok(Self {
            controller: DriveController::new(&config),
            config,
            geometry,
            control_source: ControlSource::default(),
            training: false,
            path: PathHistory::default(),
            episode: AutodriveEpisode::default(),
            feedback_color: RESET_FEEDBACK_COLOR,
            last_sample: None,
        })
    }

    pub fn with_control_source(mut self, control_source: ControlSource) -> Self {
        self.control_source = control_source;
        self
    }

    /// In training mode every step is scored, and the episode terminates when the vehicle
    /// touches an obstacle.
    pub fn with_training(mut self, training: bool) -> Self {
        self.training = training;
        self
    }

    pub fn config(&self) -> &AutodriveConfig {
        &self.config
    }

    pub fn geometry(&self) -> &VehicleGeometry {
        &self.geometry
    }

    pub fn controller(&self) -> &DriveController {
        &self.controller
    }

    pub fn control_source(&self) -> &ControlSource {
        &self.control_source
    }

    pub fn control_source_mut(&mut self) -> &mut ControlSource {
        &mut self.control_source
    }

    pub fn is_training(&self) -> bool {
        self.training
    }

    pub fn set_training(&mut self, training: bool) {
        self.training = training;
    }

    pub fn path(&self) -> &PathHistory {
        &self.path
    }

    pub fn episode(&self) -> &AutodriveEpisode {
        &self.episode
    }

    /// The color of the last actuated acceleration. White after a reset.
    pub fn feedback_color(&self) -> Color {
        self.feedback_color
    }

    pub fn probes(&self, pose: &VehiclePose) -> PerProbe<Probe> {
        compute_probes(pose, &self.geometry, &self.config)
    }

    /// Compute the probes for `pose` and cast them against `scene`.
    pub fn sense(
        &mut self,
        pose: &VehiclePose,
        scene: &impl AutodriveSceneQuery,
    ) -> Result<ProbeHits, PerceptionUnavailable> {
        let probes = self.probes(pose);
        let hits = sample_probes(&probes, scene, self.config.max_ray_distance)?;
        self.last_sample = Some((probes, hits));
        Ok(hits)
    }

    pub fn observe(&self, hits: &ProbeHits, speed: Float) -> Observation {
        Observation::from_hits(hits, speed, self.config.max_ray_distance)
    }

    /// Resolve the command from the current [`ControlSource`] and actuate it.
    ///
    /// While the episode is terminated the command is resolved but not actuated. The lateral
    /// velocity is removed either way.
    pub fn drive(
        &mut self,
        hits: &ProbeHits,
        pose: &VehiclePose,
        motion: &mut impl AutodriveMotionPort,
        frame_duration: Float,
    ) -> DriveOutcome {
        let speed = motion.velocity().length();
        let observation = self.observe(hits, speed);
        let goal_speed = self
            .controller
            .goal_speed(&hits.map(|_, hit| hit.distance));
        let command = self
            .control_source
            .resolve(&self.controller, hits, &observation);

        let actuated = self.actuate(&command, pose, motion, frame_duration);
        DriveOutcome {
            observation,
            command,
            goal_speed,
            actuated,
        }
    }

    /// Actuate a command that was decided elsewhere.
    ///
    /// Returns `false` if the episode is terminated, in which case only the lateral velocity is
    /// removed.
    pub fn actuate(
        &mut self,
        command: &ControlCommand,
        pose: &VehiclePose,
        motion: &mut impl AutodriveMotionPort,
        frame_duration: Float,
    ) -> bool {
        if self.training && !self.episode.is_running() {
            remove_lateral_velocity(motion, pose);
            return false;
        }
        apply_command(command, motion, pose, &self.config, frame_duration);
        self.feedback_color = accel_feedback_color(command.accel_amount());
        true
    }

    /// Record the vehicle's position and, in training mode, score the step.
    pub fn score(
        &mut self,
        position: Vector3,
        hits: &ProbeHits,
        touching_obstacle: bool,
    ) -> Option<RewardBreakdown> {
        self.path.record(position);
        if !self.training || !self.episode.is_running() {
            return None;
        }
        let reward = compute_reward(&self.path, hits, touching_obstacle);
        self.episode.record(&reward);
        if reward.done {
            info!(
                "Autodrive episode ended after {} steps with reward {} and distance {}",
                self.episode.steps(),
                self.episode.cumulative_reward(),
                self.path.distance_traveled(),
            );
        }
        Some(reward)
    }

    /// Run one full control step.
    ///
    /// If the scene query fails, the step is aborted before anything is actuated or recorded.
    pub fn step(
        &mut self,
        pose: &VehiclePose,
        scene: &impl AutodriveSceneQuery,
        motion: &mut impl AutodriveMotionPort,
        touching_obstacle: bool,
        frame_duration: Float,
    ) -> Result<StepReport, AutodriveError> {
        let hits = self.sense(pose, scene).inspect_err(|err| {
            error!("Autodrive step aborted: {err}");
        })?;
        let drive = self.drive(&hits, pose, motion, frame_duration);
        let reward = self.score(pose.translation, &hits, touching_obstacle);
        Ok(StepReport {
            hits,
            drive,
            reward,
        })
    }

    /// Start a new episode at `start`.
    ///
    /// Moves the vehicle, zeroes its velocities, restarts the path history and the episode
    /// bookkeeping, all together.
    pub fn reset(&mut self, start: &VehiclePose, motion: &mut impl AutodriveMotionPort) {
        motion.reset(start);
        self.path.reset(start.translation);
        self.episode.restart();
        self.feedback_color = RESET_FEEDBACK_COLOR;
        self.last_sample = None;
        debug!("Autodrive vehicle reset to {}", start.translation);
    }

    /// Draw the probes of the last successful sampling.
    pub fn draw_debug(&self, sink: &mut (impl AutodriveDebugSink + ?Sized)) {
        if let Some((probes, hits)) = &self.last_sample {
            draw_probes(probes, hits, sink);
        }
    }
}
