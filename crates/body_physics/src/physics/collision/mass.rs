//! Mass, center of mass and inertia of solid shapes

use crate::foundation::math::{Mat3, Pose, Vec3};
use super::mesh::ConvexMesh;

/// Mass properties about the center of mass, expressed in the owning frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassProperties {
    /// Total mass
    pub mass: f32,
    /// Center of mass
    pub center_of_mass: Vec3,
    /// Inertia tensor about `center_of_mass`
    pub inertia: Mat3,
}

impl MassProperties {
    /// Massless placeholder
    pub fn zero() -> Self {
        Self {
            mass: 0.0,
            center_of_mass: Vec3::zeros(),
            inertia: Mat3::zeros(),
        }
    }

    /// Solid sphere
    pub fn sphere(radius: f32, density: f32) -> Self {
        let mass = density * (4.0 / 3.0) * std::f32::consts::PI * radius.powi(3);
        let i = 0.4 * mass * radius * radius;
        Self {
            mass,
            center_of_mass: Vec3::zeros(),
            inertia: Mat3::from_diagonal_element(i),
        }
    }

    /// Solid box
    pub fn cuboid(half_extents: &Vec3, density: f32) -> Self {
        let h = half_extents;
        let mass = density * 8.0 * h.x * h.y * h.z;
        let (x2, y2, z2) = (h.x * h.x, h.y * h.y, h.z * h.z);
        Self {
            mass,
            center_of_mass: Vec3::zeros(),
            inertia: Mat3::from_diagonal(&Vec3::new(
                mass * (y2 + z2) / 3.0,
                mass * (x2 + z2) / 3.0,
                mass * (x2 + y2) / 3.0,
            )),
        }
    }

    /// Solid capsule along local Z; `half_height` is the cylinder half length
    pub fn capsule(radius: f32, half_height: f32, density: f32) -> Self {
        let pi = std::f32::consts::PI;
        let r2 = radius * radius;
        let height = 2.0 * half_height;
        let cylinder = density * pi * r2 * height;
        let caps = density * (4.0 / 3.0) * pi * r2 * radius;

        let axial = cylinder * r2 / 2.0 + caps * 0.4 * r2;
        let lateral = cylinder * (3.0 * r2 + height * height) / 12.0
            + caps * (0.4 * r2 + height * height / 4.0 + 3.0 * height * radius / 8.0);

        Self {
            mass: cylinder + caps,
            center_of_mass: Vec3::zeros(),
            inertia: Mat3::from_diagonal(&Vec3::new(lateral, lateral, axial)),
        }
    }

    /// Solid convex hull scaled by `scale`, by signed tetrahedra from the origin
    pub fn convex(mesh: &ConvexMesh, scale: &Vec3, density: f32) -> Self {
        // Covariance of the canonical tetrahedron (0, e1, e2, e3)
        let canonical = Mat3::new(
            2.0, 1.0, 1.0,
            1.0, 2.0, 1.0,
            1.0, 1.0, 2.0,
        ) / 120.0;

        let mut volume = 0.0;
        let mut weighted_center = Vec3::zeros();
        let mut covariance = Mat3::zeros();

        for tri in mesh.scaled_faces(scale) {
            let a = Mat3::from_columns(&[tri.v0, tri.v1, tri.v2]);
            let det = a.determinant();
            volume += det / 6.0;
            weighted_center += (tri.v0 + tri.v1 + tri.v2) * (det / 24.0);
            covariance += a * canonical * a.transpose() * det;
        }

        if volume <= f32::EPSILON {
            return Self::zero();
        }

        let mass = density * volume;
        let center_of_mass = weighted_center / volume;
        // Shift covariance to the center of mass, then convert to inertia
        let covariance = covariance * density - center_of_mass * center_of_mass.transpose() * mass;
        let inertia = Mat3::identity() * covariance.trace() - covariance;

        Self {
            mass,
            center_of_mass,
            inertia,
        }
    }

    /// Same body seen from a parent frame in which it sits at `pose`
    #[must_use]
    pub fn transformed(&self, pose: &Pose) -> Self {
        let rotation = pose.rotation.to_rotation_matrix();
        let r = rotation.matrix();
        Self {
            mass: self.mass,
            center_of_mass: pose.transform_point(&self.center_of_mass.into()).coords,
            inertia: r * self.inertia * r.transpose(),
        }
    }

    /// Sum of parts, with inertia moved to the combined center of mass
    pub fn combine(parts: &[Self]) -> Self {
        let mass: f32 = parts.iter().map(|p| p.mass).sum();
        if mass <= 0.0 {
            return Self::zero();
        }
        let center_of_mass = parts.iter().map(|p| p.center_of_mass * p.mass).sum::<Vec3>() / mass;

        let inertia = parts.iter().fold(Mat3::zeros(), |acc, part| {
            let d = part.center_of_mass - center_of_mass;
            let shift = (Mat3::identity() * d.norm_squared() - d * d.transpose()) * part.mass;
            acc + part.inertia + shift
        });

        Self {
            mass,
            center_of_mass,
            inertia,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Quat, Translation3};
    use approx::assert_relative_eq;

    #[test]
    fn test_convex_cube_matches_analytic_box() {
        let half = Vec3::new(1.0, 2.0, 0.5);
        let hull = MassProperties::convex(&ConvexMesh::cuboid(half), &Vec3::new(1.0, 1.0, 1.0), 2.0);
        let solid = MassProperties::cuboid(&half, 2.0);

        assert_relative_eq!(hull.mass, solid.mass, epsilon = 1e-4);
        assert_relative_eq!(hull.center_of_mass, Vec3::zeros(), epsilon = 1e-5);
        assert_relative_eq!(hull.inertia, solid.inertia, epsilon = 1e-3);
    }

    #[test]
    fn test_scaled_hull_volume() {
        let hull = MassProperties::convex(&ConvexMesh::cuboid(Vec3::new(1.0, 1.0, 1.0)), &Vec3::new(2.0, 1.0, 3.0), 1.0);
        assert_relative_eq!(hull.mass, 8.0 * 6.0, epsilon = 1e-3);
    }

    #[test]
    fn test_combine_two_offset_spheres() {
        let sphere = MassProperties::sphere(1.0, 1.0);
        let left = sphere.transformed(&Pose::from_parts(Translation3::new(-2.0, 0.0, 0.0), Quat::identity()));
        let right = sphere.transformed(&Pose::from_parts(Translation3::new(2.0, 0.0, 0.0), Quat::identity()));
        let both = MassProperties::combine(&[left, right]);

        assert_relative_eq!(both.mass, 2.0 * sphere.mass, epsilon = 1e-4);
        assert_relative_eq!(both.center_of_mass, Vec3::zeros(), epsilon = 1e-5);
        // Parallel axis: the X axis inertia is unchanged, Y and Z gain m·d²
        let base = sphere.inertia[(0, 0)];
        assert_relative_eq!(both.inertia[(0, 0)], 2.0 * base, epsilon = 1e-3);
        assert_relative_eq!(both.inertia[(1, 1)], 2.0 * (base + sphere.mass * 4.0), epsilon = 1e-2);
    }

    #[test]
    fn test_capsule_degenerates_to_sphere() {
        let capsule = MassProperties::capsule(1.5, 0.0, 1.0);
        let sphere = MassProperties::sphere(1.5, 1.0);
        assert_relative_eq!(capsule.mass, sphere.mass, epsilon = 1e-4);
        assert_relative_eq!(capsule.inertia, sphere.inertia, epsilon = 1e-3);
    }
}
