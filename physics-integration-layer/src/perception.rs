use bevy::prelude::*;

use crate::data_for_backends::{PerProbe, Probe, ProbeHit, ProbeHits, ProbeKind};
use crate::math::{Float, Vector3};

/// A ray intersection reported by an [`AutodriveSceneQuery`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    pub distance: Float,
    pub point: Vector3,
}

/// Raised by an [`AutodriveSceneQuery`] that cannot answer a query at all.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct SceneQueryError(pub String);

impl SceneQueryError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// The scene-query collaborator: casts rays against the environment.
///
/// Implementations must be side-effect free. Physics backends implement it on top of their
/// spatial query pipeline, and the headless harness implements it on a set of boxes.
pub trait AutodriveSceneQuery {
    /// Cast a ray and return the nearest intersection within `max_distance`, or `None` if
    /// nothing was hit.
    fn raycast(
        &self,
        origin: Vector3,
        direction: Dir3,
        max_distance: Float,
    ) -> Result<Option<RaycastHit>, SceneQueryError>;
}

impl<T: AutodriveSceneQuery + ?Sized> AutodriveSceneQuery for &T {
    fn raycast(
        &self,
        origin: Vector3,
        direction: Dir3,
        max_distance: Float,
    ) -> Result<Option<RaycastHit>, SceneQueryError> {
        (**self).raycast(origin, direction, max_distance)
    }
}

/// The scene-query collaborator failed while the probes were being cast.
///
/// The step that produced this must not actuate anything.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("perception unavailable while casting the {probe:?} probe: {reason}")]
pub struct PerceptionUnavailable {
    pub probe: ProbeKind,
    pub reason: String,
}

/// Cast every probe against the scene, in [`ProbeKind::ALL`] order.
///
/// Probes that hit nothing within `max_range` (including hits the scene reports beyond it)
/// report `max_range` as their distance. The first failure of the scene query aborts the whole
/// sampling - partial results are never returned.
pub fn sample_probes(
    probes: &PerProbe<Probe>,
    scene: &impl AutodriveSceneQuery,
    max_range: Float,
) -> Result<ProbeHits, PerceptionUnavailable> {
    let mut hits = probes.map(|_, probe| ProbeHit::miss(probe, max_range));
    for kind in ProbeKind::ALL {
        let probe = &probes[kind];
        let raycast_hit = scene
            .raycast(probe.origin, probe.direction, max_range)
            .map_err(|SceneQueryError(reason)| PerceptionUnavailable {
                probe: kind,
                reason,
            })?;
        if let Some(raycast_hit) = raycast_hit {
            if raycast_hit.distance <= max_range {
                hits[kind] = ProbeHit {
                    distance: raycast_hit.distance.max(0.0),
                    point: raycast_hit.point,
                    hit: true,
                };
            }
        }
    }
    Ok(hits)
}
