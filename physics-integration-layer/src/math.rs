//! Math aliases shared by the controller and the physics backends.
//!
//! Autodrive works in Bevy's frame convention: in the vehicle's local space forward is
//! [`Vector3::NEG_Z`], right is [`Vector3::X`] and up is [`Vector3::Y`].

use bevy::math::{Quat, Vec3};

pub type Float = f32;
pub type Vector3 = Vec3;
pub type Quaternion = Quat;

/// Clamp a value into `[low, high]` without panicking when the range is inverted.
///
/// Values below `low` become `low`, and only then values above `high` become `high`.
pub fn clamp_to(value: Float, low: Float, high: Float) -> Float {
    if value < low {
        low
    } else if value > high {
        high
    } else {
        value
    }
}
