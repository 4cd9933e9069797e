use bevy::prelude::*;
use bevy_autodrive::{compute_probes, AutodriveConfig, ProbeKind, VehicleGeometry, VehiclePose};

#[track_caller]
fn assert_close(actual: Vec3, expected: Vec3) {
    assert!(
        actual.abs_diff_eq(expected, 1e-5),
        "expected {expected}, got {actual}"
    );
}

fn config() -> AutodriveConfig {
    AutodriveConfig {
        side_ray_angle: 10.0,
        ray_height: 0.2,
        horizontal_forward_ray_distance: 0.5,
        ..Default::default()
    }
}

#[test]
fn probes_of_an_unrotated_vehicle() {
    let geometry = VehicleGeometry::new(2.0, 4.0, 1.0);
    let probes = compute_probes(&VehiclePose::IDENTITY, &geometry, &config());

    assert_close(probes[ProbeKind::Forward].origin, Vec3::new(0.0, 0.2, -2.0));
    assert_close(*probes[ProbeKind::Forward].direction, Vec3::NEG_Z);

    assert_close(
        probes[ProbeKind::ForwardLeft].origin,
        Vec3::new(-0.5, 0.2, -2.0),
    );
    assert_close(
        probes[ProbeKind::ForwardRight].origin,
        Vec3::new(0.5, 0.2, -2.0),
    );

    assert_close(probes[ProbeKind::Left].origin, Vec3::new(-1.0, 0.2, 0.0));
    assert_close(*probes[ProbeKind::Left].direction, Vec3::NEG_X);
    assert_close(probes[ProbeKind::Right].origin, Vec3::new(1.0, 0.2, 0.0));
    assert_close(*probes[ProbeKind::Right].direction, Vec3::X);
}

#[test]
fn diagonal_probes_are_rotated_toward_their_side() {
    let geometry = VehicleGeometry::new(2.0, 4.0, 1.0);
    let probes = compute_probes(&VehiclePose::IDENTITY, &geometry, &config());

    let forward_left = *probes[ProbeKind::ForwardLeft].direction;
    let forward_right = *probes[ProbeKind::ForwardRight].direction;
    assert!(forward_left.x < 0.0);
    assert!(0.0 < forward_right.x);
    for direction in [forward_left, forward_right] {
        assert!(direction.z < 0.0);
        assert_eq!(direction.y, 0.0);
        let angle = direction.angle_between(Vec3::NEG_Z).to_degrees();
        assert!((angle - 10.0).abs() < 1e-3, "angle is {angle}");
    }
}

#[test]
fn probes_follow_the_pose() {
    let geometry = VehicleGeometry::new(2.0, 4.0, 1.0);
    let pose = VehiclePose::looking_to(Vec3::new(3.0, 0.0, 5.0), Dir3::X);
    let probes = compute_probes(&pose, &geometry, &config());

    // Facing +X, right is +Z.
    assert_close(probes[ProbeKind::Forward].origin, Vec3::new(5.0, 0.2, 5.0));
    assert_close(*probes[ProbeKind::Forward].direction, Vec3::X);
    assert_close(
        probes[ProbeKind::ForwardRight].origin,
        Vec3::new(5.0, 0.2, 5.5),
    );
    assert_close(probes[ProbeKind::Right].origin, Vec3::new(3.0, 0.2, 6.0));
    assert_close(*probes[ProbeKind::Right].direction, Vec3::Z);
    assert_close(probes[ProbeKind::Left].origin, Vec3::new(3.0, 0.2, 4.0));
}

#[test]
fn probe_offsets_scale_with_the_vehicle() {
    let geometry = VehicleGeometry::new(2.0, 4.0, 1.0);
    let pose = VehiclePose::IDENTITY.with_scale(2.0);
    let probes = compute_probes(&pose, &geometry, &config());

    assert_close(probes[ProbeKind::Forward].origin, Vec3::new(0.0, 0.4, -4.0));
    assert_close(
        probes[ProbeKind::ForwardLeft].origin,
        Vec3::new(-1.0, 0.4, -4.0),
    );
    assert_close(probes[ProbeKind::Left].origin, Vec3::new(-2.0, 0.4, 0.0));
    // Directions are not affected by the scale.
    assert_close(*probes[ProbeKind::Left].direction, Vec3::NEG_X);
}

#[test]
fn geometry_from_half_extents() {
    let geometry = VehicleGeometry::from_half_extents(Vec3::new(1.0, 0.5, 2.0));
    assert_eq!(geometry.width(), 2.0);
    assert_eq!(geometry.height(), 1.0);
    assert_eq!(geometry.length(), 4.0);
}
