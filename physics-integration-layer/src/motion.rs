use crate::data_for_backends::{AutodriveMotor, AutodriveRigidBodyTracker, VehiclePose};
use crate::math::{Float, Vector3};

/// The motion collaborator: exposes the velocity of the vehicle and accepts changes to it.
///
/// Autodrive never assigns the velocity directly - it only adds deltas - except through
/// [`reset`](Self::reset).
pub trait AutodriveMotionPort {
    fn velocity(&self) -> Vector3;

    fn angular_velocity(&self) -> Vector3;

    fn mass(&self) -> Float;

    /// Apply a force that was already multiplied by the frame duration (i.e. an impulse).
    fn apply_force(&mut self, force: Vector3);

    /// Apply a torque that was already multiplied by the frame duration (i.e. an angular
    /// impulse).
    fn apply_torque(&mut self, torque: Vector3);

    /// Add to the linear velocity as-is, ignoring mass.
    fn apply_velocity_change(&mut self, change: Vector3);

    /// Move the vehicle to `pose` and zero its linear and angular velocities.
    fn reset(&mut self, pose: &VehiclePose);
}

impl<T: AutodriveMotionPort + ?Sized> AutodriveMotionPort for &mut T {
    fn velocity(&self) -> Vector3 {
        (**self).velocity()
    }

    fn angular_velocity(&self) -> Vector3 {
        (**self).angular_velocity()
    }

    fn mass(&self) -> Float {
        (**self).mass()
    }

    fn apply_force(&mut self, force: Vector3) {
        (**self).apply_force(force)
    }

    fn apply_torque(&mut self, torque: Vector3) {
        (**self).apply_torque(torque)
    }

    fn apply_velocity_change(&mut self, change: Vector3) {
        (**self).apply_velocity_change(change)
    }

    fn reset(&mut self, pose: &VehiclePose) {
        (**self).reset(pose)
    }
}

/// A motion collaborator that keeps the rigid body state in memory and applies every change
/// immediately.
///
/// It has no notion of position, so [`reset`](AutodriveMotionPort::reset) only zeroes the
/// velocities.
#[derive(Debug, Clone, PartialEq)]
pub struct AutodriveMotionState {
    pub velocity: Vector3,
    pub angvel: Vector3,
    pub mass: Float,
    /// Scalar moment of inertia around every axis.
    pub angular_inertia: Float,
}

impl Default for AutodriveMotionState {
    fn default() -> Self {
        Self {
            velocity: Vector3::ZERO,
            angvel: Vector3::ZERO,
            mass: 1.0,
            angular_inertia: 1.0,
        }
    }
}

impl AutodriveMotionState {
    pub fn with_mass(mass: Float) -> Self {
        Self {
            mass,
            ..Default::default()
        }
    }
}

impl AutodriveMotionPort for AutodriveMotionState {
    fn velocity(&self) -> Vector3 {
        self.velocity
    }

    fn angular_velocity(&self) -> Vector3 {
        self.angvel
    }

    fn mass(&self) -> Float {
        self.mass
    }

    fn apply_force(&mut self, force: Vector3) {
        if 0.0 < self.mass {
            self.velocity += force / self.mass;
        }
    }

    fn apply_torque(&mut self, torque: Vector3) {
        if 0.0 < self.angular_inertia {
            self.angvel += torque / self.angular_inertia;
        }
    }

    fn apply_velocity_change(&mut self, change: Vector3) {
        self.velocity += change;
    }

    fn reset(&mut self, _pose: &VehiclePose) {
        self.velocity = Vector3::ZERO;
        self.angvel = Vector3::ZERO;
    }
}

/// A motion collaborator that records changes into an [`AutodriveMotor`] for the physics backend
/// to apply later in the frame.
///
/// [`velocity`](AutodriveMotionPort::velocity) predicts the velocity the rigid body will have
/// once the motor is applied, so that changes recorded later in the same tick (like removing the
/// lateral velocity) account for the earlier ones.
pub struct AutodriveMotorPort<'a> {
    tracker: &'a AutodriveRigidBodyTracker,
    motor: &'a mut AutodriveMotor,
}

impl<'a> AutodriveMotorPort<'a> {
    pub fn new(tracker: &'a AutodriveRigidBodyTracker, motor: &'a mut AutodriveMotor) -> Self {
        Self { tracker, motor }
    }
}

impl AutodriveMotionPort for AutodriveMotorPort<'_> {
    fn velocity(&self) -> Vector3 {
        let from_impulse = if 0.0 < self.tracker.mass {
            self.motor.impulse / self.tracker.mass
        } else {
            Vector3::ZERO
        };
        self.tracker.velocity + from_impulse + self.motor.velocity_change
    }

    fn angular_velocity(&self) -> Vector3 {
        // NOTE: the backend scales the impulse by the real inertia tensor, which is not tracked.
        self.tracker.angvel + self.motor.angular_impulse
    }

    fn mass(&self) -> Float {
        self.tracker.mass
    }

    fn apply_force(&mut self, force: Vector3) {
        self.motor.impulse += force;
    }

    fn apply_torque(&mut self, torque: Vector3) {
        self.motor.angular_impulse += torque;
    }

    fn apply_velocity_change(&mut self, change: Vector3) {
        self.motor.velocity_change += change;
    }

    fn reset(&mut self, pose: &VehiclePose) {
        self.motor.clear();
        self.motor.reset_to = Some(*pose);
    }
}
