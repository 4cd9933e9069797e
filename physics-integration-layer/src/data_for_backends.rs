use std::ops::{Index, IndexMut};

use bevy::platform::collections::HashSet;
use bevy::prelude::*;

use crate::math::{Float, Quaternion, Vector3};
use crate::perception::PerceptionUnavailable;

/// Allows disabling autodrive for a specific entity.
///
/// This can be used to let some other system temporarily take control over a vehicle.
///
/// This component is not mandatory - if omitted, autodrive will just assume it is enabled for
/// that entity.
#[derive(Component, Default, Debug, PartialEq, Eq, Clone, Copy)]
pub enum AutodriveToggle {
    /// Do not update the sensors, and do not apply forces from the motor.
    ///
    /// The controller system will also not run and won't update the motor component. It will
    /// retain its last value from before `AutodriveToggle::Disabled` was set.
    Disabled,
    /// Update the sensors and decide on commands, but do not apply forces from the motor.
    SenseOnly,
    #[default]
    /// The backend behaves normally - it updates the sensors and applies forces from the motor.
    Enabled,
}

/// Position, orientation and uniform scale of a vehicle.
///
/// The pose is owned by the physics engine. Autodrive only reads it, except when an episode is
/// reset and the vehicle is moved back to its start pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehiclePose {
    pub translation: Vector3,
    pub rotation: Quaternion,
    /// Uniform scale factor of the vehicle model. Probe offsets are multiplied by it.
    pub scale: Float,
}

impl Default for VehiclePose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl VehiclePose {
    pub const IDENTITY: Self = Self {
        translation: Vector3::ZERO,
        rotation: Quaternion::IDENTITY,
        scale: 1.0,
    };

    pub fn new(translation: Vector3, rotation: Quaternion) -> Self {
        Self {
            translation,
            rotation,
            scale: 1.0,
        }
    }

    /// A pose at `translation` whose forward direction is `direction`, keeping [`Vector3::Y`] as
    /// the up direction.
    pub fn looking_to(translation: Vector3, direction: Dir3) -> Self {
        let rotation = Transform::default().looking_to(direction, Dir3::Y).rotation;
        Self::new(translation, rotation)
    }

    pub fn with_scale(self, scale: Float) -> Self {
        Self { scale, ..self }
    }

    pub fn forward(&self) -> Dir3 {
        self.rotation * Dir3::NEG_Z
    }

    pub fn right(&self) -> Dir3 {
        self.rotation * Dir3::X
    }

    pub fn up(&self) -> Dir3 {
        self.rotation * Dir3::Y
    }
}

/// Newtonian state of the vehicle's rigid body.
///
/// The physics backend is responsible for updating this component from the physics engine
/// during [`AutodrivePipelineSystems::Sensors`](crate::AutodrivePipelineSystems::Sensors).
#[derive(Component, Debug, Clone)]
pub struct AutodriveRigidBodyTracker {
    pub translation: Vector3,
    pub rotation: Quaternion,
    pub scale: Float,
    pub velocity: Vector3,
    /// Angular velocity as the rotation axis multiplied by the rotation speed in radians per
    /// second.
    pub angvel: Vector3,
    pub mass: Float,
}

impl Default for AutodriveRigidBodyTracker {
    fn default() -> Self {
        Self {
            translation: Vector3::ZERO,
            rotation: Quaternion::IDENTITY,
            scale: 1.0,
            velocity: Vector3::ZERO,
            angvel: Vector3::ZERO,
            mass: 1.0,
        }
    }
}

impl AutodriveRigidBodyTracker {
    pub fn pose(&self) -> VehiclePose {
        VehiclePose {
            translation: self.translation,
            rotation: self.rotation,
            scale: self.scale,
        }
    }

    /// The magnitude of the velocity.
    pub fn speed(&self) -> Float {
        self.velocity.length()
    }
}

pub const PROBE_COUNT: usize = 5;

/// The five probes of the vehicle, in the fixed order they are cast in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeKind {
    Forward,
    ForwardLeft,
    ForwardRight,
    /// Strictly lateral, pointing left.
    Left,
    /// Strictly lateral, pointing right.
    Right,
}

impl ProbeKind {
    pub const ALL: [ProbeKind; PROBE_COUNT] = [
        ProbeKind::Forward,
        ProbeKind::ForwardLeft,
        ProbeKind::ForwardRight,
        ProbeKind::Left,
        ProbeKind::Right,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// One value for each [`ProbeKind`], indexable by it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PerProbe<T>(pub [T; PROBE_COUNT]);

impl<T> PerProbe<T> {
    pub fn from_fn(mut f: impl FnMut(ProbeKind) -> T) -> Self {
        Self(ProbeKind::ALL.map(|kind| f(kind)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (ProbeKind, &T)> {
        ProbeKind::ALL.into_iter().zip(self.0.iter())
    }

    pub fn map<U>(&self, mut f: impl FnMut(ProbeKind, &T) -> U) -> PerProbe<U> {
        PerProbe::from_fn(|kind| f(kind, &self[kind]))
    }
}

impl<T> Index<ProbeKind> for PerProbe<T> {
    type Output = T;

    fn index(&self, kind: ProbeKind) -> &T {
        &self.0[kind.index()]
    }
}

impl<T> IndexMut<ProbeKind> for PerProbe<T> {
    fn index_mut(&mut self, kind: ProbeKind) -> &mut T {
        &mut self.0[kind.index()]
    }
}

/// A single ray, in world space, used to sample the distance to the nearest obstacle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Probe {
    pub origin: Vector3,
    pub direction: Dir3,
}

impl Default for Probe {
    fn default() -> Self {
        Self {
            origin: Vector3::ZERO,
            direction: Dir3::NEG_Z,
        }
    }
}

impl Probe {
    pub fn point_at(&self, distance: Float) -> Vector3 {
        self.origin + *self.direction * distance
    }
}

/// The result of casting a single [`Probe`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeHit {
    /// Distance from the probe's origin to the hit, or the cast range if nothing was hit.
    pub distance: Float,
    /// The hit point, or the far end of the probe if nothing was hit.
    pub point: Vector3,
    pub hit: bool,
}

impl ProbeHit {
    pub fn miss(probe: &Probe, max_range: Float) -> Self {
        Self {
            distance: max_range,
            point: probe.point_at(max_range),
            hit: false,
        }
    }
}

pub type ProbeHits = PerProbe<ProbeHit>;

/// The probes of a vehicle and the result of casting them.
///
/// The controller fills [`probes`](Self::probes) and [`cast_range`](Self::cast_range) during
/// [`AutodrivePipelineSystems::Probes`](crate::AutodrivePipelineSystems::Probes). The physics
/// backend is responsible for filling [`output`](Self::output) during
/// [`AutodrivePipelineSystems::Perception`](crate::AutodrivePipelineSystems::Perception),
/// usually by calling [`sample_probes`](crate::perception::sample_probes).
#[derive(Component, Debug, Default)]
pub struct AutodriveProbeSensors {
    pub probes: PerProbe<Probe>,
    pub cast_range: Float,
    /// `None` means the probes were not cast this tick.
    pub output: Option<Result<ProbeHits, PerceptionUnavailable>>,
}

/// A marker for colliders that end a training episode when the vehicle touches them.
#[derive(Component, Default, Debug)]
pub struct AutodriveObstacle;

/// The entities currently in contact with the vehicle.
///
/// The physics backend is responsible for updating this component during
/// [`AutodrivePipelineSystems::Sensors`](crate::AutodrivePipelineSystems::Sensors).
#[derive(Component, Default, Debug)]
pub struct AutodriveContacts {
    pub touching: HashSet<Entity>,
    /// Whether any of the [`touching`](Self::touching) entities is an [`AutodriveObstacle`].
    pub touching_obstacle: bool,
}

impl AutodriveContacts {
    /// Record that `vehicle` started touching `other`.
    ///
    /// Returns `false` if the contact was already known.
    pub fn start_contact(
        &mut self,
        vehicle: Entity,
        other: Entity,
        other_is_obstacle: bool,
    ) -> bool {
        let started = self.touching.insert(other);
        if started && other_is_obstacle {
            debug!("Autodrive vehicle {vehicle} started touching obstacle {other}");
        }
        started
    }

    /// Record that `vehicle` stopped touching `other`.
    ///
    /// Returns `false` if there was no such contact.
    pub fn end_contact(
        &mut self,
        vehicle: Entity,
        other: Entity,
        other_is_obstacle: bool,
    ) -> bool {
        let ended = self.touching.remove(&other);
        if ended && other_is_obstacle {
            debug!("Autodrive vehicle {vehicle} stopped touching obstacle {other}");
        }
        ended
    }

    /// Whether any of the touching entities is an obstacle. Does not update
    /// [`touching_obstacle`](Self::touching_obstacle).
    pub fn any_obstacle(&self, is_obstacle: impl Fn(Entity) -> bool) -> bool {
        self.touching.iter().any(|entity| is_obstacle(*entity))
    }
}

/// Instructions on how to move the rigid body.
///
/// The physics backend is responsible for reading this component during
/// [`AutodrivePipelineSystems::Motors`](crate::AutodrivePipelineSystems::Motors) and apply it to
/// the rigid body.
#[derive(Component, Default, Debug, Clone)]
pub struct AutodriveMotor {
    /// Force already multiplied by the frame duration. Apply as a linear impulse.
    pub impulse: Vector3,

    /// Torque already multiplied by the frame duration. Apply as an angular impulse.
    pub angular_impulse: Vector3,

    /// Added to the linear velocity as-is, ignoring mass.
    pub velocity_change: Vector3,

    /// Move the rigid body to this pose and zero its velocities instead of applying anything
    /// else.
    pub reset_to: Option<VehiclePose>,
}

impl AutodriveMotor {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
