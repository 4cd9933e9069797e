use bevy::ecs::schedule::{InternedScheduleLabel, ScheduleLabel};
use bevy::prelude::*;

use crate::config::AutodriveConfig;
use crate::control_source::{ControlSource, ManualDriveInput};
use crate::debug::{draw_probes, AutodriveDebugSegments};
use crate::error::AutodriveError;
use crate::math::Float;
use crate::probes::VehicleGeometry;
use crate::reward::TrainingStep;
use crate::vehicle::{AutodriveVehicle, DriveOutcome};
use crate::{
    AutodriveContacts, AutodriveMotor, AutodriveMotorPort, AutodrivePipelineSystems,
    AutodriveProbeSensors, AutodriveRigidBodyTracker, AutodriveSystems, AutodriveToggle,
    AutodriveUserControlsSystems, PerceptionUnavailable, ProbeHits, ProbeKind, VehiclePose,
};

/// The main plugin for Autodrive.
///
/// This plugin should be used in addition to a physics backend plugin (like
/// `AutodriveAvian3dPlugin`), and both plugins must use the same schedule.
pub struct AutodriveControllerPlugin {
    schedule: InternedScheduleLabel,
}

impl AutodriveControllerPlugin {
    pub fn new(schedule: impl ScheduleLabel) -> Self {
        Self {
            schedule: schedule.intern(),
        }
    }
}

impl Plugin for AutodriveControllerPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<AutodrivePerceptionFailed>();
        app.add_event::<AutodriveEpisodeEnded>();
        app.configure_sets(
            self.schedule,
            (
                AutodrivePipelineSystems::Sensors,
                AutodrivePipelineSystems::Probes,
                AutodrivePipelineSystems::Perception,
                AutodriveUserControlsSystems,
                AutodrivePipelineSystems::Logic,
                AutodrivePipelineSystems::Motors,
                AutodrivePipelineSystems::Reward,
            )
                .chain()
                .in_set(AutodriveSystems),
        );
        app.add_systems(
            self.schedule,
            compute_probes_system.in_set(AutodrivePipelineSystems::Probes),
        );
        app.add_systems(
            self.schedule,
            apply_keyboard_controls_system
                .run_if(resource_exists::<ButtonInput<KeyCode>>)
                .in_set(AutodriveUserControlsSystems),
        );
        app.add_systems(
            self.schedule,
            apply_controller_system.in_set(AutodrivePipelineSystems::Logic),
        );
        app.add_systems(
            self.schedule,
            apply_reward_system.in_set(AutodrivePipelineSystems::Reward),
        );
    }
}

/// The main component used for interaction with the controller.
///
/// Add it to the vehicle's rigid body entity. To change who drives the vehicle, use
/// [`control_source_mut`](Self::control_source_mut) from a system in
/// [`AutodriveUserControlsSystems`].
#[derive(Component, Debug)]
#[require(
    AutodriveMotor,
    AutodriveRigidBodyTracker,
    AutodriveProbeSensors,
    AutodriveContacts
)]
pub struct AutodriveController {
    vehicle: AutodriveVehicle,
    last_drive: Option<DriveOutcome>,
    unscored_hits: Option<ProbeHits>,
}

impl AutodriveController {
    /// Fails if the configuration does not [validate](AutodriveConfig::validate).
    pub fn new(config: AutodriveConfig, geometry: VehicleGeometry) -> Result<Self, AutodriveError> {
        Ok(Self::from_vehicle(AutodriveVehicle::new(config, geometry)?))
    }

    pub fn from_vehicle(vehicle: AutodriveVehicle) -> Self {
        Self {
            vehicle,
            last_drive: None,
            unscored_hits: None,
        }
    }

    pub fn with_control_source(self, control_source: ControlSource) -> Self {
        Self::from_vehicle(self.vehicle.with_control_source(control_source))
    }

    pub fn vehicle(&self) -> &AutodriveVehicle {
        &self.vehicle
    }

    pub fn control_source_mut(&mut self) -> &mut ControlSource {
        self.vehicle.control_source_mut()
    }

    /// The decision of the last tick in which the probes were sampled successfully.
    pub fn last_drive(&self) -> Option<&DriveOutcome> {
        self.last_drive.as_ref()
    }
}

/// Makes an [`AutodriveController`] entity a training agent.
///
/// Its steps are scored, and the episode terminates when the vehicle touches an
/// [`AutodriveObstacle`](crate::AutodriveObstacle).
#[derive(Component, Debug, Clone)]
pub struct AutodriveAgent {
    /// Where the vehicle goes when the episode is reset.
    pub start_pose: VehiclePose,
    reset_requested: bool,
    last_step: Option<TrainingStep>,
}

impl AutodriveAgent {
    /// The episode starts with a reset, so that the path history begins at the start pose.
    pub fn new(start_pose: VehiclePose) -> Self {
        Self {
            start_pose,
            reset_requested: true,
            last_step: None,
        }
    }

    /// Reset the vehicle and start a new episode on the next tick.
    ///
    /// The tick that performs the reset does not drive the vehicle. While the entity is
    /// [`AutodriveToggle::SenseOnly`] the reset stays pending and the vehicle is neither driven
    /// nor scored.
    pub fn request_reset(&mut self) {
        self.reset_requested = true;
    }

    pub fn reset_pending(&self) -> bool {
        self.reset_requested
    }

    /// The observation, reward and termination flag of the last scored tick.
    pub fn last_step(&self) -> Option<&TrainingStep> {
        self.last_step.as_ref()
    }
}

/// Marks a vehicle whose [`ControlSource::Manual`] is fed from the keyboard (WASD).
#[derive(Component, Default, Debug)]
pub struct AutodriveKeyboardControls;

/// Sent when a vehicle could not sample its probes, and therefore did not move this tick.
#[derive(Event, Debug, Clone)]
pub struct AutodrivePerceptionFailed {
    pub entity: Entity,
    pub error: PerceptionUnavailable,
}

/// Sent when the episode of an [`AutodriveAgent`] terminates.
#[derive(Event, Debug, Clone)]
pub struct AutodriveEpisodeEnded {
    pub entity: Entity,
    pub cumulative_reward: Float,
    pub distance_traveled: Float,
    pub steps: usize,
}

fn compute_probes_system(
    mut query: Query<(
        &AutodriveController,
        &AutodriveRigidBodyTracker,
        &mut AutodriveProbeSensors,
        Option<&AutodriveToggle>,
    )>,
) {
    for (controller, tracker, mut sensors, autodrive_toggle) in query.iter_mut() {
        match autodrive_toggle.copied().unwrap_or_default() {
            AutodriveToggle::Disabled => continue,
            AutodriveToggle::SenseOnly => {}
            AutodriveToggle::Enabled => {}
        }
        sensors.probes = controller.vehicle.probes(&tracker.pose());
        sensors.cast_range = controller.vehicle.config().max_ray_distance;
        sensors.output = None;
    }
}

fn apply_keyboard_controls_system(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut query: Query<&mut AutodriveController, With<AutodriveKeyboardControls>>,
) {
    let input = ManualDriveInput {
        forward: keyboard.pressed(KeyCode::KeyW),
        backward: keyboard.pressed(KeyCode::KeyS),
        left: keyboard.pressed(KeyCode::KeyA),
        right: keyboard.pressed(KeyCode::KeyD),
    };
    for mut controller in query.iter_mut() {
        controller.control_source_mut().feed_manual(input);
    }
}

#[allow(clippy::type_complexity)]
fn apply_controller_system(
    time: Res<Time>,
    mut query: Query<(
        Entity,
        &mut AutodriveController,
        &AutodriveRigidBodyTracker,
        &AutodriveProbeSensors,
        &mut AutodriveMotor,
        Option<&mut AutodriveAgent>,
        Option<&mut AutodriveDebugSegments>,
        Option<&AutodriveToggle>,
    )>,
    mut perception_failed: EventWriter<AutodrivePerceptionFailed>,
) {
    let frame_duration = time.delta_secs();
    if frame_duration == 0.0 {
        return;
    }
    for (
        entity,
        mut controller,
        tracker,
        sensors,
        mut motor,
        agent,
        debug_segments,
        autodrive_toggle,
    ) in query.iter_mut()
    {
        let motor_applied = match autodrive_toggle.copied().unwrap_or_default() {
            AutodriveToggle::Disabled => continue,
            AutodriveToggle::SenseOnly => false,
            AutodriveToggle::Enabled => true,
        };
        let controller = controller.as_mut();
        motor.clear();
        controller.unscored_hits = None;

        if let Some(mut agent) = agent {
            controller.vehicle.set_training(true);
            if agent.reset_requested {
                // The backend ignores `reset_to` while sensing only, so the path and the
                // episode must wait for the teleport too.
                if !motor_applied {
                    continue;
                }
                let mut motion = AutodriveMotorPort::new(tracker, motor.as_mut());
                controller.vehicle.reset(&agent.start_pose, &mut motion);
                controller.last_drive = None;
                agent.reset_requested = false;
                agent.last_step = None;
                continue;
            }
        } else {
            controller.vehicle.set_training(false);
        }

        let hits = match &sensors.output {
            Some(Ok(hits)) => *hits,
            Some(Err(err)) => {
                error!("Autodrive step aborted for {entity}: {err}");
                perception_failed.write(AutodrivePerceptionFailed {
                    entity,
                    error: err.clone(),
                });
                continue;
            }
            None => {
                let err = PerceptionUnavailable {
                    probe: ProbeKind::Forward,
                    reason: "the probes were not cast by any physics backend".to_owned(),
                };
                error!("Autodrive step aborted for {entity}: {err}");
                perception_failed.write(AutodrivePerceptionFailed { entity, error: err });
                continue;
            }
        };

        let mut motion = AutodriveMotorPort::new(tracker, motor.as_mut());
        let drive = controller
            .vehicle
            .drive(&hits, &tracker.pose(), &mut motion, frame_duration);
        controller.last_drive = Some(drive);
        controller.unscored_hits = Some(hits);

        if let Some(mut debug_segments) = debug_segments {
            debug_segments.0.clear();
            draw_probes(&sensors.probes, &hits, &mut debug_segments.0);
        }
    }
}

#[allow(clippy::type_complexity)]
fn apply_reward_system(
    mut query: Query<(
        Entity,
        &mut AutodriveController,
        &mut AutodriveAgent,
        &AutodriveRigidBodyTracker,
        &AutodriveContacts,
        Option<&AutodriveToggle>,
    )>,
    mut episode_ended: EventWriter<AutodriveEpisodeEnded>,
) {
    for (entity, mut controller, mut agent, tracker, contacts, autodrive_toggle) in
        query.iter_mut()
    {
        match autodrive_toggle.copied().unwrap_or_default() {
            AutodriveToggle::Disabled => continue,
            AutodriveToggle::SenseOnly => {}
            AutodriveToggle::Enabled => {}
        }
        let controller = controller.as_mut();
        let Some(hits) = controller.unscored_hits.take() else {
            continue;
        };
        let Some(reward) =
            controller
                .vehicle
                .score(tracker.translation, &hits, contacts.touching_obstacle)
        else {
            continue;
        };
        if let Some(drive) = controller.last_drive.as_ref() {
            agent.last_step = Some(TrainingStep {
                observation: drive.observation,
                reward: reward.total(),
                done: reward.done,
            });
        }
        if reward.done {
            let episode = controller.vehicle.episode();
            episode_ended.write(AutodriveEpisodeEnded {
                entity,
                cumulative_reward: episode.cumulative_reward(),
                distance_traveled: controller.vehicle.path().distance_traveled(),
                steps: episode.steps(),
            });
        }
    }
}
