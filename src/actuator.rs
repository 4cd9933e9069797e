use bevy::color::palettes::basic::{LIME, RED, WHITE};
use bevy::color::Mix;
use bevy::prelude::*;

use crate::config::AutodriveConfig;
use crate::control_source::ControlCommand;
use crate::math::{clamp_to, Float};
use crate::{AutodriveMotionPort, VehiclePose};

/// Push the vehicle along its forward direction.
///
/// Positive amounts are scaled by [`acceleration`](AutodriveConfig::acceleration) and
/// non-positive amounts by [`deceleration`](AutodriveConfig::deceleration). The force is
/// multiplied by the mass, so the coefficients are accelerations.
pub fn accelerate(
    motion: &mut impl AutodriveMotionPort,
    pose: &VehiclePose,
    amount: Float,
    config: &AutodriveConfig,
    frame_duration: Float,
) {
    let coefficient = if 0.0 < amount {
        config.acceleration
    } else {
        config.deceleration
    };
    let force = *pose.forward() * amount * coefficient * motion.mass() * frame_duration;
    motion.apply_force(force);
}

/// Rotate the vehicle around its up axis. Positive amounts turn right.
pub fn turn(
    motion: &mut impl AutodriveMotionPort,
    pose: &VehiclePose,
    amount: Float,
    config: &AutodriveConfig,
    frame_duration: Float,
) {
    // Turning right is a negative rotation around up.
    let torque = -*pose.up() * amount * config.turning_speed * frame_duration;
    motion.apply_torque(torque);
}

/// Cancel the component of the velocity along the vehicle's right axis, so that it does not
/// slide sideways.
pub fn remove_lateral_velocity(motion: &mut impl AutodriveMotionPort, pose: &VehiclePose) {
    let right = pose.right();
    let lateral = *right * motion.velocity().dot(*right);
    if lateral != Vec3::ZERO {
        motion.apply_velocity_change(-lateral);
    }
}

/// Actuate a full command: accelerate, turn, and then remove the lateral velocity.
///
/// The lateral velocity is removed even for [`ControlCommand::IDLE`].
pub fn apply_command(
    command: &ControlCommand,
    motion: &mut impl AutodriveMotionPort,
    pose: &VehiclePose,
    config: &AutodriveConfig,
    frame_duration: Float,
) {
    accelerate(
        motion,
        pose,
        command.accel_amount(),
        config,
        frame_duration,
    );
    turn(motion, pose, command.turn_amount(), config, frame_duration);
    remove_lateral_velocity(motion, pose);
}

/// A color for visualizing the acceleration: red when braking fully, green when accelerating
/// fully.
pub fn accel_feedback_color(accel_amount: Float) -> Color {
    let factor = clamp_to((accel_amount + 1.0) / 2.0, 0.0, 1.0);
    RED.mix(&LIME, factor).into()
}

/// The color of a vehicle that was just reset.
pub const RESET_FEEDBACK_COLOR: Color = Color::Srgba(WHITE);
