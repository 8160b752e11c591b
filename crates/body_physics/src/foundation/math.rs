//! Math utilities and types
//!
//! Provides the fundamental math types shared by the collision and body code.

use serde::{Deserialize, Serialize};

pub use nalgebra::{
    Isometry3,
    Matrix3,
    Quaternion,
    Translation3,
    Unit,
    Vector3,
};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Rigid pose (rotation + translation, no scale)
pub type Pose = Isometry3<f32>;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Builder-style scale override
    #[must_use]
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Rebuild a transform from a rigid pose and a scale
    pub fn from_pose(pose: &Pose, scale: Vec3) -> Self {
        Self {
            position: pose.translation.vector,
            rotation: pose.rotation,
            scale,
        }
    }

    /// The rigid part of this transform
    pub fn pose(&self) -> Pose {
        Pose::from_parts(Translation3::from(self.position), self.rotation)
    }

    /// Determinant of the linear part. Rotations have unit determinant, so
    /// only the scale contributes; a negative value means the transform mirrors.
    pub fn determinant(&self) -> f32 {
        self.scale.x * self.scale.y * self.scale.z
    }

    /// True if any component of position, rotation or scale is NaN
    pub fn contains_nan(&self) -> bool {
        self.position.iter().any(|c| c.is_nan())
            || self.rotation.coords.iter().any(|c| c.is_nan())
            || self.scale.iter().any(|c| c.is_nan())
    }

    /// True if any scale axis is within `tolerance` of zero
    pub fn has_nearly_zero_scale(&self, tolerance: f32) -> bool {
        self.scale.iter().any(|c| c.abs() <= tolerance)
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.position + self.rotation * self.scale.component_mul(&point)
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;

    /// Tolerance used for "is this effectively zero" checks on world-unit values
    pub const KINDA_SMALL_NUMBER: f32 = 1.0e-4;
}

/// Math utility functions
pub mod utils {
    use super::{constants, Quat, Vec3};

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Component-wise degrees to radians
    pub fn vec_deg_to_rad(degrees: Vec3) -> Vec3 {
        degrees * constants::DEG_TO_RAD
    }

    /// Component-wise radians to degrees
    pub fn vec_rad_to_deg(radians: Vec3) -> Vec3 {
        radians * constants::RAD_TO_DEG
    }

    /// Rotation applied to a mirrored (X-negated) or normal mesh so that,
    /// combined with `abs(scale)`, it reproduces the signed `scale`.
    ///
    /// Returns the compensating rotation and whether the X-mirrored mesh must
    /// be used (negative determinant).
    pub fn mirror_compensation(scale: &Vec3) -> (Quat, bool) {
        let use_neg_x = scale.x * scale.y * scale.z < 0.0;
        let rotation = match (scale.y > 0.0, scale.z > 0.0) {
            (true, true) => Quat::identity(),
            (true, false) => Quat::from_axis_angle(&Vec3::y_axis(), constants::PI),
            (false, true) => Quat::from_axis_angle(&Vec3::z_axis(), constants::PI),
            (false, false) => Quat::from_axis_angle(&Vec3::x_axis(), constants::PI),
        };
        (rotation, use_neg_x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_determinant_sign_follows_scale() {
        let t = Transform::identity().with_scale(Vec3::new(-1.0, 2.0, 3.0));
        assert!(t.determinant() < 0.0);

        let t = Transform::identity().with_scale(Vec3::new(-1.0, -2.0, 3.0));
        assert!(t.determinant() > 0.0);
    }

    #[test]
    fn test_nan_and_zero_scale_detection() {
        let mut t = Transform::identity();
        assert!(!t.contains_nan());
        t.position.y = f32::NAN;
        assert!(t.contains_nan());

        let t = Transform::identity().with_scale(Vec3::new(1.0, 0.0, 1.0));
        assert!(t.has_nearly_zero_scale(constants::KINDA_SMALL_NUMBER));
    }

    #[test]
    fn test_degree_conversions() {
        assert_relative_eq!(utils::deg_to_rad(180.0), constants::PI, epsilon = EPSILON);
        let degrees = Vec3::new(90.0, -45.0, 3600.0);
        let radians = utils::vec_deg_to_rad(degrees);
        assert_relative_eq!(radians.x, constants::PI / 2.0, epsilon = EPSILON);
        assert_relative_eq!(utils::vec_rad_to_deg(radians), degrees, epsilon = 1e-3);
    }

    #[test]
    fn test_mirror_compensation_reproduces_signed_scale() {
        let point = Vec3::new(0.3, -0.7, 1.1);
        let scales = [
            Vec3::new(-1.0, 1.0, 1.0),
            Vec3::new(1.0, -2.0, 1.0),
            Vec3::new(1.0, 1.0, -0.5),
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(1.0, -1.0, -3.0),
        ];

        for scale in scales {
            let (rotation, use_neg_x) = utils::mirror_compensation(&scale);
            let mut mesh_point = point;
            if use_neg_x {
                mesh_point.x = -mesh_point.x;
            }
            let reproduced = rotation * scale.abs().component_mul(&mesh_point);
            assert_relative_eq!(reproduced, scale.component_mul(&point), epsilon = EPSILON);
        }
    }
}
