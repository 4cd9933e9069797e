use bevy::prelude::*;

use crate::config::AutodriveConfig;
use crate::math::{Float, Quaternion, Vector3};
use crate::{PerProbe, Probe, ProbeKind, VehiclePose};

/// The dimensions of the vehicle's bounding box.
///
/// Set once when the vehicle is created and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleGeometry {
    width: Float,
    length: Float,
    height: Float,
}

impl VehicleGeometry {
    /// Full dimensions of the box: `width` along the right axis, `length` along the forward axis
    /// and `height` along the up axis.
    pub fn new(width: Float, length: Float, height: Float) -> Self {
        Self {
            width,
            length,
            height,
        }
    }

    /// Take the dimensions from a collider's half extents, given in the vehicle's local space
    /// (so `x` is the half width and `z` is the half length).
    pub fn from_half_extents(half_extents: Vector3) -> Self {
        let size = 2.0 * half_extents.abs();
        Self::new(size.x, size.z, size.y)
    }

    pub fn width(&self) -> Float {
        self.width
    }

    pub fn length(&self) -> Float {
        self.length
    }

    pub fn height(&self) -> Float {
        self.height
    }
}

/// Compute the five probes for the vehicle's current pose.
///
/// All the offsets from the vehicle's position are multiplied by the pose's
/// [`scale`](VehiclePose::scale), so the probes follow the model if it gets rescaled.
///
/// * [`ProbeKind::Forward`] starts at the front of the vehicle, [`ray_height`] above its
///   origin, and points forward.
/// * [`ProbeKind::ForwardLeft`] and [`ProbeKind::ForwardRight`] start at the same place but
///   [`horizontal_forward_ray_distance`] to the side, and point forward rotated by
///   [`side_ray_angle`] toward their side.
/// * [`ProbeKind::Left`] and [`ProbeKind::Right`] start at the vehicle's sides (no forward
///   offset) and point strictly sideways.
///
/// [`ray_height`]: AutodriveConfig::ray_height
/// [`horizontal_forward_ray_distance`]: AutodriveConfig::horizontal_forward_ray_distance
/// [`side_ray_angle`]: AutodriveConfig::side_ray_angle
pub fn compute_probes(
    pose: &VehiclePose,
    geometry: &VehicleGeometry,
    config: &AutodriveConfig,
) -> PerProbe<Probe> {
    let forward = pose.forward();
    let right = pose.right();
    let up = pose.up();

    let lifted = *up * config.ray_height;
    let front = *forward * (geometry.length() / 2.0);
    let origin_at = |offset: Vector3| pose.translation + offset * pose.scale;

    // Positive rotation around up turns toward the left in a right-handed frame.
    let side_rotation = |angle: Float| Quaternion::from_axis_angle(*up, angle.to_radians());

    PerProbe::from_fn(|kind| match kind {
        ProbeKind::Forward => Probe {
            origin: origin_at(lifted + front),
            direction: forward,
        },
        ProbeKind::ForwardLeft => Probe {
            origin: origin_at(
                lifted - *right * config.horizontal_forward_ray_distance + front,
            ),
            direction: side_rotation(config.side_ray_angle) * forward,
        },
        ProbeKind::ForwardRight => Probe {
            origin: origin_at(
                lifted + *right * config.horizontal_forward_ray_distance + front,
            ),
            direction: side_rotation(-config.side_ray_angle) * forward,
        },
        ProbeKind::Left => Probe {
            origin: origin_at(lifted - *right * (geometry.width() / 2.0)),
            direction: -right,
        },
        ProbeKind::Right => Probe {
            origin: origin_at(lifted + *right * (geometry.width() / 2.0)),
            direction: right,
        },
    })
}
