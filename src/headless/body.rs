use crate::math::{Float, Quaternion, Vector3};
use crate::{AutodriveMotionPort, AutodriveMotionState, VehiclePose};

/// A rigid body without collision response.
///
/// Forces and torques change the velocities immediately, and [`integrate`](Self::integrate)
/// moves the pose by them.
#[derive(Debug, Clone, PartialEq)]
pub struct KinematicBody {
    pub pose: VehiclePose,
    pub motion: AutodriveMotionState,
    /// Applied every frame as `v /= 1 + dt * damping`, like Avian does.
    pub linear_damping: Float,
    pub angular_damping: Float,
}

impl KinematicBody {
    pub fn new(pose: VehiclePose) -> Self {
        Self {
            pose,
            motion: AutodriveMotionState::default(),
            linear_damping: 0.0,
            angular_damping: 0.0,
        }
    }

    pub fn with_mass(mut self, mass: Float) -> Self {
        self.motion.mass = mass;
        self
    }

    pub fn with_damping(mut self, linear_damping: Float, angular_damping: Float) -> Self {
        self.linear_damping = linear_damping;
        self.angular_damping = angular_damping;
        self
    }

    /// Advance the pose by `frame_duration` seconds.
    pub fn integrate(&mut self, frame_duration: Float) {
        self.motion.velocity /= 1.0 + frame_duration * self.linear_damping;
        self.motion.angvel /= 1.0 + frame_duration * self.angular_damping;

        self.pose.translation += self.motion.velocity * frame_duration;
        let spin = Quaternion::from_scaled_axis(self.motion.angvel * frame_duration);
        self.pose.rotation = (spin * self.pose.rotation).normalize();
    }
}

impl AutodriveMotionPort for KinematicBody {
    fn velocity(&self) -> Vector3 {
        self.motion.velocity
    }

    fn angular_velocity(&self) -> Vector3 {
        self.motion.angvel
    }

    fn mass(&self) -> Float {
        self.motion.mass
    }

    fn apply_force(&mut self, force: Vector3) {
        self.motion.apply_force(force);
    }

    fn apply_torque(&mut self, torque: Vector3) {
        self.motion.apply_torque(torque);
    }

    fn apply_velocity_change(&mut self, change: Vector3) {
        self.motion.apply_velocity_change(change);
    }

    /// Moves the body to `pose`, keeping its current scale.
    fn reset(&mut self, pose: &VehiclePose) {
        self.pose.translation = pose.translation;
        self.pose.rotation = pose.rotation;
        self.motion.reset(pose);
    }
}
