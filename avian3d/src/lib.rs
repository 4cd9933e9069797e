//! # avian3d Integration for bevy-autodrive
//!
//! In addition to the instruction in bevy-autodrive's documentation:
//!
//! * Add [`AutodriveAvian3dPlugin`] to the Bevy app, with the same schedule as
//!   `AutodriveControllerPlugin`.
//! * The vehicle's [`Collider`] must be on the same entity as its rigid body and its
//!   `AutodriveController`, so that its collisions are reported to the controller.
//! * Mark colliders that should end training episodes with
//!   [`AutodriveObstacle`](bevy_autodrive_physics_integration_layer::data_for_backends::AutodriveObstacle).
mod spatial_ext;

use avian3d::prelude::*;
use bevy::ecs::schedule::{InternedScheduleLabel, ScheduleLabel};
use bevy::prelude::*;

use bevy_autodrive_physics_integration_layer::data_for_backends::{
    AutodriveContacts, AutodriveMotor, AutodriveObstacle, AutodriveProbeSensors,
    AutodriveRigidBodyTracker, AutodriveToggle,
};
use bevy_autodrive_physics_integration_layer::perception::sample_probes;
use bevy_autodrive_physics_integration_layer::AutodrivePipelineSystems;
use bevy_autodrive_physics_integration_layer::AutodriveSystems;
pub use spatial_ext::{AutodriveSceneQueryAvian3d, AutodriveSceneQueryAvian3dView};

pub mod prelude {
    pub use crate::{AutodriveAvian3dPlugin, AutodriveSceneQueryAvian3d};
}

/// Add this plugin to use avian3d as a physics backend.
///
/// This plugin should be used in addition to `AutodriveControllerPlugin`, and both plugins must
/// use the same schedule.
pub struct AutodriveAvian3dPlugin {
    schedule: InternedScheduleLabel,
}

impl AutodriveAvian3dPlugin {
    pub fn new(schedule: impl ScheduleLabel) -> Self {
        Self {
            schedule: schedule.intern(),
        }
    }
}

impl Plugin for AutodriveAvian3dPlugin {
    fn build(&self, app: &mut App) {
        app.register_required_components::<AutodriveMotor, LinearVelocity>()
            .register_required_components::<AutodriveMotor, AngularVelocity>()
            .register_required_components::<AutodriveMotor, ExternalImpulse>()
            .register_required_components::<AutodriveMotor, ExternalAngularImpulse>()
            .register_required_components_with::<AutodriveContacts, CollisionEventsEnabled>(
                || CollisionEventsEnabled,
            );
        app.configure_sets(
            self.schedule,
            AutodriveSystems.run_if(|physics_time: Res<Time<Physics>>| !physics_time.is_paused()),
        );
        app.add_systems(
            self.schedule,
            (update_rigid_body_trackers_system, update_contacts_system)
                .in_set(AutodrivePipelineSystems::Sensors),
        );
        app.add_systems(
            self.schedule,
            cast_probes_system.in_set(AutodrivePipelineSystems::Perception),
        );
        app.add_systems(
            self.schedule,
            apply_motors_system.in_set(AutodrivePipelineSystems::Motors),
        );
    }
}

#[allow(clippy::type_complexity)]
fn update_rigid_body_trackers_system(
    mut query: Query<(
        &GlobalTransform,
        &LinearVelocity,
        &AngularVelocity,
        &ComputedMass,
        &mut AutodriveRigidBodyTracker,
        Option<&AutodriveToggle>,
    )>,
) {
    for (transform, linear_velocity, angular_velocity, mass, mut tracker, autodrive_toggle) in
        query.iter_mut()
    {
        match autodrive_toggle.copied().unwrap_or_default() {
            AutodriveToggle::Disabled => continue,
            AutodriveToggle::SenseOnly => {}
            AutodriveToggle::Enabled => {}
        }
        let (scale, rotation, translation) = transform.to_scale_rotation_translation();
        *tracker = AutodriveRigidBodyTracker {
            translation,
            rotation,
            scale: scale.x,
            velocity: linear_velocity.0,
            angvel: angular_velocity.0,
            mass: mass.value(),
        };
    }
}

fn update_contacts_system(
    mut collision_started: EventReader<CollisionStarted>,
    mut collision_ended: EventReader<CollisionEnded>,
    mut query: Query<&mut AutodriveContacts>,
    obstacles_query: Query<(), With<AutodriveObstacle>>,
) {
    for CollisionStarted(entity1, entity2) in collision_started.read() {
        for (vehicle, other) in [(*entity1, *entity2), (*entity2, *entity1)] {
            if let Ok(mut contacts) = query.get_mut(vehicle) {
                contacts.start_contact(vehicle, other, obstacles_query.contains(other));
            }
        }
    }
    for CollisionEnded(entity1, entity2) in collision_ended.read() {
        for (vehicle, other) in [(*entity1, *entity2), (*entity2, *entity1)] {
            if let Ok(mut contacts) = query.get_mut(vehicle) {
                contacts.end_contact(vehicle, other, obstacles_query.contains(other));
            }
        }
    }
    for mut contacts in query.iter_mut() {
        let touching_obstacle = contacts.any_obstacle(|entity| obstacles_query.contains(entity));
        // Avoid triggering change detection every frame.
        if contacts.touching_obstacle != touching_obstacle {
            contacts.touching_obstacle = touching_obstacle;
        }
    }
}

fn cast_probes_system(
    scene_query: AutodriveSceneQueryAvian3d,
    mut query: Query<(Entity, &mut AutodriveProbeSensors, Option<&AutodriveToggle>)>,
) {
    for (entity, mut sensors, autodrive_toggle) in query.iter_mut() {
        match autodrive_toggle.copied().unwrap_or_default() {
            AutodriveToggle::Disabled => continue,
            AutodriveToggle::SenseOnly => {}
            AutodriveToggle::Enabled => {}
        }
        let output = sample_probes(
            &sensors.probes,
            &scene_query.excluding(entity),
            sensors.cast_range,
        );
        sensors.output = Some(output);
    }
}

#[allow(clippy::type_complexity)]
fn apply_motors_system(
    mut query: Query<(
        &AutodriveMotor,
        &mut LinearVelocity,
        &mut AngularVelocity,
        &mut ExternalImpulse,
        &mut ExternalAngularImpulse,
        &mut Transform,
        Option<&mut Position>,
        Option<&mut Rotation>,
        Option<&AutodriveToggle>,
    )>,
) {
    for (
        motor,
        mut linear_velocity,
        mut angular_velocity,
        mut external_impulse,
        mut external_angular_impulse,
        mut transform,
        position,
        rotation,
        autodrive_toggle,
    ) in query.iter_mut()
    {
        match autodrive_toggle.copied().unwrap_or_default() {
            AutodriveToggle::Disabled | AutodriveToggle::SenseOnly => continue,
            AutodriveToggle::Enabled => {}
        }
        if let Some(pose) = motor.reset_to {
            transform.translation = pose.translation;
            transform.rotation = pose.rotation;
            if let Some(mut position) = position {
                position.0 = pose.translation;
            }
            if let Some(mut rotation) = rotation {
                rotation.0 = pose.rotation;
            }
            linear_velocity.0 = Vec3::ZERO;
            angular_velocity.0 = Vec3::ZERO;
            external_impulse.clear();
            external_angular_impulse.clear();
            continue;
        }
        if motor.impulse.is_finite() {
            external_impulse.apply_impulse(motor.impulse);
        }
        if motor.angular_impulse.is_finite() {
            external_angular_impulse.apply_impulse(motor.angular_impulse);
        }
        if motor.velocity_change.is_finite() {
            linear_velocity.0 += motor.velocity_change;
        }
    }
}
