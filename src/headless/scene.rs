use bevy::prelude::*;

use crate::math::{Float, Vector3};
use crate::{AutodriveSceneQuery, RaycastHit, SceneQueryError, VehiclePose};

/// An axis-aligned box in an [`AabbScene`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneBox {
    pub min: Vector3,
    pub max: Vector3,
    /// Touching an obstacle ends the training episode. Other boxes only block the probes.
    pub obstacle: bool,
}

impl SceneBox {
    pub fn new(center: Vector3, half_extents: Vector3, obstacle: bool) -> Self {
        let half_extents = half_extents.abs();
        Self {
            min: center - half_extents,
            max: center + half_extents,
            obstacle,
        }
    }

    pub fn contains(&self, point: Vector3) -> bool {
        self.min.cmple(point).all() && point.cmple(self.max).all()
    }

    /// Overlap test against another axis-aligned box. Touching faces count as overlapping.
    pub fn overlaps(&self, min: Vector3, max: Vector3) -> bool {
        self.min.cmple(max).all() && min.cmple(self.max).all()
    }

    /// Distance along `direction` at which a ray from `origin` enters this box.
    ///
    /// Rays that start inside the box do not hit it.
    pub fn raycast(&self, origin: Vector3, direction: Dir3) -> Option<Float> {
        let mut enter = Float::NEG_INFINITY;
        let mut exit = Float::INFINITY;
        for axis in 0..3 {
            let origin = origin[axis];
            let direction = direction[axis];
            let (min, max) = (self.min[axis], self.max[axis]);
            if direction == 0.0 {
                if origin < min || max < origin {
                    return None;
                }
                continue;
            }
            let near = (min - origin) / direction;
            let far = (max - origin) / direction;
            enter = enter.max(near.min(far));
            exit = exit.min(near.max(far));
        }
        if exit < enter || enter < 0.0 {
            None
        } else {
            Some(enter)
        }
    }
}

/// A scene made of axis-aligned boxes.
#[derive(Debug, Default, Clone)]
pub struct AabbScene {
    boxes: Vec<SceneBox>,
    unavailable: Option<String>,
}

impl AabbScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_box(mut self, scene_box: SceneBox) -> Self {
        self.boxes.push(scene_box);
        self
    }

    pub fn add_box(&mut self, scene_box: SceneBox) {
        self.boxes.push(scene_box);
    }

    pub fn boxes(&self) -> &[SceneBox] {
        &self.boxes
    }

    /// While set, every raycast fails with this reason.
    pub fn set_unavailable(&mut self, reason: Option<String>) {
        self.unavailable = reason;
    }

    /// Whether a vehicle box at `pose` with the given (local) half extents overlaps any obstacle.
    ///
    /// The vehicle box is approximated by the axis-aligned box that bounds it.
    pub fn touching_obstacle(&self, pose: &VehiclePose, half_extents: Vector3) -> bool {
        let rotation = Mat3::from_quat(pose.rotation);
        let bounding_half_extents = rotation.x_axis.abs() * half_extents.x
            + rotation.y_axis.abs() * half_extents.y
            + rotation.z_axis.abs() * half_extents.z;
        let min = pose.translation - bounding_half_extents;
        let max = pose.translation + bounding_half_extents;
        self.boxes
            .iter()
            .any(|scene_box| scene_box.obstacle && scene_box.overlaps(min, max))
    }
}

impl AutodriveSceneQuery for AabbScene {
    fn raycast(
        &self,
        origin: Vector3,
        direction: Dir3,
        max_distance: Float,
    ) -> Result<Option<RaycastHit>, SceneQueryError> {
        if let Some(reason) = &self.unavailable {
            return Err(SceneQueryError::new(reason.clone()));
        }
        Ok(self
            .boxes
            .iter()
            .filter_map(|scene_box| scene_box.raycast(origin, direction))
            .filter(|distance| *distance <= max_distance)
            .min_by(|a, b| a.total_cmp(b))
            .map(|distance| RaycastHit {
                distance,
                point: origin + *direction * distance,
            }))
    }
}
