use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use bevy_autodrive::math::Float;
use bevy_autodrive::prelude::*;
use bevy_autodrive::{
    AutodriveContacts, AutodriveKeyboardControls, AutodriveMotor, AutodriveProbeSensors,
    AutodriveRigidBodyTracker, PerceptionUnavailable, ProbeHit, ProbeKind,
};

/// Stands in for a physics backend's probe casting.
#[derive(Resource)]
enum ScriptedPerception {
    /// Every probe hits at this distance.
    HitAt(Float),
    Fail(PerceptionUnavailable),
    /// Leave the probes uncast.
    Skip,
}

fn scripted_perception_system(
    script: Res<ScriptedPerception>,
    mut query: Query<&mut AutodriveProbeSensors>,
) {
    for mut sensors in query.iter_mut() {
        sensors.output = match script.as_ref() {
            ScriptedPerception::HitAt(distance) => {
                Some(Ok(sensors.probes.map(|_, probe| ProbeHit {
                    distance: *distance,
                    point: probe.point_at(*distance),
                    hit: true,
                })))
            }
            ScriptedPerception::Fail(err) => Some(Err(err.clone())),
            ScriptedPerception::Skip => continue,
        };
    }
}

fn app(script: ScriptedPerception) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(
        100,
    )));
    app.add_plugins(AutodriveControllerPlugin::new(Update));
    app.insert_resource(script);
    app.add_systems(
        Update,
        scripted_perception_system.in_set(AutodrivePipelineSystems::Perception),
    );
    app
}

fn controller() -> AutodriveController {
    AutodriveController::new(
        AutodriveConfig::default(),
        VehicleGeometry::new(1.0, 2.0, 1.0),
    )
    .unwrap()
}

fn count_events<E: Event>(app: &App) -> usize {
    let events = app.world().resource::<Events<E>>();
    let mut cursor = events.get_cursor();
    cursor.read(events).count()
}

#[track_caller]
fn assert_close(actual: Vec3, expected: Vec3) {
    assert!(
        actual.abs_diff_eq(expected, 1e-5),
        "expected {expected}, got {actual}"
    );
}

#[test]
fn controller_writes_the_motor() {
    let mut app = app(ScriptedPerception::HitAt(5.0));
    let entity = app.world_mut().spawn(controller()).id();

    // The first frame has no duration, so nothing is decided.
    app.update();
    assert!(app
        .world()
        .get::<AutodriveController>(entity)
        .unwrap()
        .last_drive()
        .is_none());

    app.update();
    let motor = app.world().get::<AutodriveMotor>(entity).unwrap();
    // Goal speed is the max speed, and the diagonal probes tie.
    assert_close(motor.impulse, Vec3::new(0.0, 0.0, -0.1));
    assert_close(motor.angular_impulse, Vec3::new(0.0, -0.1, 0.0));
    assert_close(motor.velocity_change, Vec3::ZERO);
    assert_eq!(motor.reset_to, None);

    let drive = *app
        .world()
        .get::<AutodriveController>(entity)
        .unwrap()
        .last_drive()
        .unwrap();
    assert!(drive.actuated);
    assert_eq!(drive.goal_speed, 10.0);
    assert_eq!(drive.command, ControlCommand::new(1.0, 1.0));
    assert_eq!(drive.observation.distances[ProbeKind::Forward], 1.0);

    let sensors = app.world().get::<AutodriveProbeSensors>(entity).unwrap();
    assert_eq!(sensors.cast_range, 5.0);
    assert_close(sensors.probes[ProbeKind::Forward].origin, Vec3::new(0.0, 0.2, -1.0));
    assert_eq!(count_events::<AutodrivePerceptionFailed>(&app), 0);
}

#[test]
fn perception_failure_skips_actuation() {
    let mut app = app(ScriptedPerception::Fail(PerceptionUnavailable {
        probe: ProbeKind::Left,
        reason: "physics world not ready".to_owned(),
    }));
    let entity = app
        .world_mut()
        .spawn((
            controller(),
            AutodriveMotor {
                impulse: Vec3::X,
                ..Default::default()
            },
        ))
        .id();

    app.update();
    app.update();

    let motor = app.world().get::<AutodriveMotor>(entity).unwrap();
    assert_eq!(motor.impulse, Vec3::ZERO);
    assert_eq!(motor.angular_impulse, Vec3::ZERO);
    assert!(app
        .world()
        .get::<AutodriveController>(entity)
        .unwrap()
        .last_drive()
        .is_none());

    let events = app.world().resource::<Events<AutodrivePerceptionFailed>>();
    let mut cursor = events.get_cursor();
    let failures = cursor.read(events).collect::<Vec<_>>();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].entity, entity);
    assert_eq!(failures[0].error.probe, ProbeKind::Left);
}

#[test]
fn uncast_probes_count_as_a_failure() {
    let mut app = app(ScriptedPerception::Skip);
    app.world_mut().spawn(controller());

    app.update();
    app.update();
    assert_eq!(count_events::<AutodrivePerceptionFailed>(&app), 1);
}

#[test]
fn disabled_vehicles_keep_their_motor() {
    let mut app = app(ScriptedPerception::Skip);
    let entity = app
        .world_mut()
        .spawn((
            controller(),
            AutodriveToggle::Disabled,
            AutodriveMotor {
                impulse: Vec3::X,
                ..Default::default()
            },
        ))
        .id();

    app.update();
    app.update();
    assert_eq!(
        app.world().get::<AutodriveMotor>(entity).unwrap().impulse,
        Vec3::X
    );
    assert_eq!(count_events::<AutodrivePerceptionFailed>(&app), 0);
}

#[test]
fn sense_only_vehicles_still_decide() {
    let mut app = app(ScriptedPerception::HitAt(5.0));
    let entity = app
        .world_mut()
        .spawn((controller(), AutodriveToggle::SenseOnly))
        .id();

    app.update();
    app.update();

    let controller = app.world().get::<AutodriveController>(entity).unwrap();
    assert!(controller.last_drive().unwrap().actuated);
    // Written for inspection, but the backend does not apply it.
    let motor = app.world().get::<AutodriveMotor>(entity).unwrap();
    assert_close(motor.impulse, Vec3::new(0.0, 0.0, -0.1));
    assert_eq!(count_events::<AutodrivePerceptionFailed>(&app), 0);
}

#[test]
fn sense_only_agents_are_scored() {
    let mut app = app(ScriptedPerception::HitAt(5.0));
    let start_pose = VehiclePose::new(Vec3::new(0.0, 0.0, 3.0), Quat::IDENTITY);
    let entity = app
        .world_mut()
        .spawn((controller(), AutodriveAgent::new(start_pose)))
        .id();

    app.update();
    app.update();
    assert!(!app
        .world()
        .get::<AutodriveAgent>(entity)
        .unwrap()
        .reset_pending());

    app.world_mut()
        .entity_mut(entity)
        .insert(AutodriveToggle::SenseOnly);
    app.world_mut()
        .get_mut::<AutodriveRigidBodyTracker>(entity)
        .unwrap()
        .translation = Vec3::new(0.0, 0.0, 2.0);
    app.update();

    let step = *app
        .world()
        .get::<AutodriveAgent>(entity)
        .unwrap()
        .last_step()
        .unwrap();
    assert!(!step.done);
    assert!((step.reward - 0.1).abs() < 1e-6);
    let motor = app.world().get::<AutodriveMotor>(entity).unwrap();
    assert_close(motor.impulse, Vec3::new(0.0, 0.0, -0.1));
}

#[test]
fn reset_waits_until_the_backend_can_teleport() {
    let mut app = app(ScriptedPerception::HitAt(5.0));
    let start_pose = VehiclePose::new(Vec3::new(0.0, 0.0, 3.0), Quat::IDENTITY);
    let entity = app
        .world_mut()
        .spawn((
            controller(),
            AutodriveAgent::new(start_pose),
            AutodriveToggle::SenseOnly,
            AutodriveRigidBodyTracker {
                translation: Vec3::new(5.0, 0.0, 0.0),
                ..Default::default()
            },
        ))
        .id();

    for _ in 0..3 {
        app.update();
    }
    let agent = app.world().get::<AutodriveAgent>(entity).unwrap();
    assert!(agent.reset_pending());
    assert!(agent.last_step().is_none());
    let motor = app.world().get::<AutodriveMotor>(entity).unwrap();
    assert_eq!(motor.reset_to, None);
    assert_eq!(motor.impulse, Vec3::ZERO);
    let controller = app.world().get::<AutodriveController>(entity).unwrap();
    assert!(controller.vehicle().path().positions().is_empty());
    assert!(controller.last_drive().is_none());

    app.world_mut()
        .entity_mut(entity)
        .insert(AutodriveToggle::Enabled);
    app.update();
    let motor = app.world().get::<AutodriveMotor>(entity).unwrap();
    assert_eq!(motor.reset_to, Some(start_pose));
    assert!(!app
        .world()
        .get::<AutodriveAgent>(entity)
        .unwrap()
        .reset_pending());
    let controller = app.world().get::<AutodriveController>(entity).unwrap();
    assert_eq!(controller.vehicle().path().positions(), &[start_pose.translation]);
    assert_eq!(controller.vehicle().path().distance_traveled(), 0.0);
}

#[test]
fn agent_episode_lifecycle() {
    let mut app = app(ScriptedPerception::HitAt(5.0));
    let start_pose = VehiclePose::new(Vec3::new(0.0, 0.0, 3.0), Quat::IDENTITY);
    let entity = app
        .world_mut()
        .spawn((controller(), AutodriveAgent::new(start_pose)))
        .id();

    app.update();
    assert!(app
        .world()
        .get::<AutodriveAgent>(entity)
        .unwrap()
        .reset_pending());

    // The reset tick only asks the backend to move the vehicle.
    app.update();
    let motor = app.world().get::<AutodriveMotor>(entity).unwrap();
    assert_eq!(motor.reset_to, Some(start_pose));
    assert_eq!(motor.impulse, Vec3::ZERO);
    let agent = app.world().get::<AutodriveAgent>(entity).unwrap();
    assert!(!agent.reset_pending());
    assert!(agent.last_step().is_none());

    let move_to = |app: &mut App, translation: Vec3| {
        app.world_mut()
            .get_mut::<AutodriveRigidBodyTracker>(entity)
            .unwrap()
            .translation = translation;
    };

    move_to(&mut app, Vec3::new(0.0, 0.0, 2.0));
    app.update();
    let step = *app
        .world()
        .get::<AutodriveAgent>(entity)
        .unwrap()
        .last_step()
        .unwrap();
    assert!(!step.done);
    assert!((step.reward - 0.1).abs() < 1e-6);
    assert_eq!(step.observation.distances[ProbeKind::Left], 1.0);
    assert_eq!(count_events::<AutodriveEpisodeEnded>(&app), 0);

    move_to(&mut app, Vec3::ZERO);
    app.world_mut()
        .get_mut::<AutodriveContacts>(entity)
        .unwrap()
        .touching_obstacle = true;
    app.update();
    let step = *app
        .world()
        .get::<AutodriveAgent>(entity)
        .unwrap()
        .last_step()
        .unwrap();
    assert!(step.done);
    assert!((step.reward - 3.1).abs() < 1e-5);

    let events = app.world().resource::<Events<AutodriveEpisodeEnded>>();
    let mut cursor = events.get_cursor();
    let ended = cursor.read(events).collect::<Vec<_>>();
    assert_eq!(ended.len(), 1);
    assert_eq!(ended[0].entity, entity);
    assert_eq!(ended[0].steps, 2);
    assert!((ended[0].distance_traveled - 3.0).abs() < 1e-6);
    assert!((ended[0].cumulative_reward - 3.2).abs() < 1e-5);

    // Until the next reset, the vehicle coasts.
    app.update();
    let motor = app.world().get::<AutodriveMotor>(entity).unwrap();
    assert_eq!(motor.impulse, Vec3::ZERO);
    assert_eq!(motor.angular_impulse, Vec3::ZERO);
    let controller = app.world().get::<AutodriveController>(entity).unwrap();
    assert!(!controller.last_drive().unwrap().actuated);
    assert!(!controller.vehicle().episode().is_running());

    app.world_mut()
        .get_mut::<AutodriveAgent>(entity)
        .unwrap()
        .request_reset();
    app.update();
    let controller = app.world().get::<AutodriveController>(entity).unwrap();
    assert!(controller.vehicle().episode().is_running());
    assert_eq!(controller.vehicle().path().positions(), &[start_pose.translation]);
}

#[test]
fn keyboard_feeds_manual_control() {
    let mut app = app(ScriptedPerception::HitAt(5.0));
    let mut keyboard = ButtonInput::<KeyCode>::default();
    keyboard.press(KeyCode::KeyW);
    keyboard.press(KeyCode::KeyA);
    app.insert_resource(keyboard);

    let entity = app
        .world_mut()
        .spawn((
            controller().with_control_source(ControlSource::Manual(ManualDriveInput::default())),
            AutodriveKeyboardControls,
        ))
        .id();

    app.update();
    app.update();

    let controller = app.world().get::<AutodriveController>(entity).unwrap();
    let command = controller.last_drive().unwrap().command;
    assert_eq!(command.accel_amount(), 1.0);
    assert_eq!(command.turn_amount(), -1.0);
    let motor = app.world().get::<AutodriveMotor>(entity).unwrap();
    assert_close(motor.angular_impulse, Vec3::new(0.0, 0.1, 0.0));
}
