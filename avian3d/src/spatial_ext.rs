use avian3d::prelude::*;
use bevy::{ecs::system::SystemParam, prelude::*};
use bevy_autodrive_physics_integration_layer::{
    math::{Float, Vector3},
    perception::{AutodriveSceneQuery, RaycastHit, SceneQueryError},
};

/// Avian's spatial query pipeline, as an [`AutodriveSceneQuery`].
#[derive(SystemParam)]
pub struct AutodriveSceneQueryAvian3d<'w, 's> {
    spatial_query: SpatialQuery<'w, 's>,
}

impl<'w, 's> AutodriveSceneQueryAvian3d<'w, 's> {
    /// Cast rays that ignore the colliders of `vehicle`.
    pub fn excluding(&self, vehicle: Entity) -> AutodriveSceneQueryAvian3dView<'_, 'w, 's> {
        AutodriveSceneQueryAvian3dView {
            spatial_query: &self.spatial_query,
            filter: SpatialQueryFilter::default().with_excluded_entities([vehicle]),
        }
    }
}

pub struct AutodriveSceneQueryAvian3dView<'a, 'w, 's> {
    spatial_query: &'a SpatialQuery<'w, 's>,
    filter: SpatialQueryFilter,
}

impl AutodriveSceneQuery for AutodriveSceneQueryAvian3dView<'_, '_, '_> {
    fn raycast(
        &self,
        origin: Vector3,
        direction: Dir3,
        max_distance: Float,
    ) -> Result<Option<RaycastHit>, SceneQueryError> {
        if !origin.is_finite() || !max_distance.is_finite() {
            return Err(SceneQueryError::new(format!(
                "cannot cast from {origin} with range {max_distance}"
            )));
        }
        Ok(self
            .spatial_query
            .cast_ray(origin, direction, max_distance, true, &self.filter)
            .map(|hit| RaycastHit {
                distance: hit.distance,
                point: origin + *direction * hit.distance,
            }))
    }
}
