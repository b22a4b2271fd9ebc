//! Position + rotation pair

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Rigid placement (no scale)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Translation
    pub position: Vec3,
    /// Orientation
    pub rotation: Quat,
}

impl Pose {
    /// Origin, no rotation
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    /// Create a pose
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Pose at a position with no rotation
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Apply `local` in this pose's frame (`self * local`)
    pub fn mul_pose(&self, local: &Pose) -> Pose {
        Pose {
            position: self.position + self.rotation * local.position,
            rotation: (self.rotation * local.rotation).normalize(),
        }
    }

    /// Inverse transform
    pub fn inverse(&self) -> Pose {
        let inv_rot = self.rotation.conjugate();
        Pose {
            position: inv_rot * -self.position,
            rotation: inv_rot,
        }
    }

    /// Approximate equality for both components
    pub fn abs_diff_eq(&self, other: &Pose, max_abs_diff: f32) -> bool {
        self.position.abs_diff_eq(other.position, max_abs_diff)
            && (self.rotation.abs_diff_eq(other.rotation, max_abs_diff)
                || self.rotation.abs_diff_eq(-other.rotation, max_abs_diff))
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_compose_rotates_child_offset() {
        let parent = Pose::new(Vec3::new(10.0, 0.0, 0.0), Quat::from_rotation_y(FRAC_PI_2));
        let child = Pose::from_position(Vec3::new(0.0, 0.0, -1.0));

        let world = parent.mul_pose(&child);
        assert!(world.position.abs_diff_eq(Vec3::new(9.0, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn test_inverse_cancels() {
        let pose = Pose::new(Vec3::new(1.0, 2.0, 3.0), Quat::from_rotation_x(0.7));
        let identity = pose.mul_pose(&pose.inverse());
        assert!(identity.abs_diff_eq(&Pose::IDENTITY, 1e-5));
    }
}
