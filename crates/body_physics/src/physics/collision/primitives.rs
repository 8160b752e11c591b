//! Primitive collision shapes and intersection algorithms
//!
//! Provides basic geometric primitives (rays, spheres, triangles, oriented
//! boxes) with the intersection routines the shape queries are built from.
//! Everything here works in world space.

use crate::foundation::math::{Quat, Vec3};

/// A ray for ray casting and picking
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// The origin point of the ray in world space
    pub origin: Vec3,
    /// The direction of the ray (normalized)
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray with the given origin and direction
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// A sphere in world space
#[derive(Debug, Clone, Copy)]
pub struct Sphere {
    /// The center position of the sphere in world space
    pub center: Vec3,
    /// The radius of the sphere
    pub radius: f32,
}

impl Sphere {
    /// Creates a new sphere with the given center and radius
    pub const fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Test ray intersection with this sphere.
    ///
    /// Returns `(distance, hit_point, normal)`. A ray starting inside the
    /// sphere hits at distance zero with the normal opposing the ray.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<(f32, Vec3, Vec3)> {
        // Vector from sphere center to ray origin
        let oc = ray.origin - self.center;

        // Solve |origin + t*direction - center|^2 = radius^2 with |direction| = 1
        let b = oc.dot(&ray.direction);
        let c = oc.dot(&oc) - self.radius * self.radius;

        if c <= 0.0 {
            return Some((0.0, ray.origin, -ray.direction));
        }
        if b > 0.0 {
            return None; // Outside and pointing away
        }

        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }

        let t = -b - discriminant.sqrt();
        let hit_point = ray.point_at(t);
        let normal = (hit_point - self.center).normalize();

        Some((t, hit_point, normal))
    }
}

/// A triangle for collision detection
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    /// Triangle vertices in world space
    pub v0: Vec3,
    /// Second vertex
    pub v1: Vec3,
    /// Third vertex
    pub v2: Vec3,
}

impl Triangle {
    /// Creates a new triangle
    pub const fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        Self { v0, v1, v2 }
    }

    /// Vertices as an array
    pub const fn vertices(&self) -> [Vec3; 3] {
        [self.v0, self.v1, self.v2]
    }

    /// Unnormalized face normal (right-hand rule); zero for degenerate triangles
    pub fn scaled_normal(&self) -> Vec3 {
        (self.v1 - self.v0).cross(&(self.v2 - self.v0))
    }

    /// Möller-Trumbore ray-triangle intersection algorithm
    /// Returns (t, u, v) barycentric coordinates if hit, None otherwise
    ///
    /// Both faces are hit. See: "Fast, Minimum Storage Ray/Triangle
    /// Intersection" by Möller & Trumbore
    pub fn intersect_ray(&self, ray: &Ray) -> Option<(f32, f32, f32)> {
        const EPSILON: f32 = 0.000_001;

        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;

        let h = ray.direction.cross(&edge2);
        let a = edge1.dot(&h);

        // Ray parallel to triangle?
        if a.abs() < EPSILON {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin - self.v0;
        let u = f * s.dot(&h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(&edge1);
        let v = f * ray.direction.dot(&q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(&q);
        if t >= 0.0 {
            Some((t, u, v))
        } else {
            None // Behind ray origin
        }
    }

    /// Get the closest point on the triangle to a given point
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        closest_point_on_triangle(point, self.v0, self.v1, self.v2).0
    }
}

/// Closest point on triangle `abc` to `p`, with its barycentric weights
/// `(wa, wb, wc)`. Region classification after Ericson, "Real-Time Collision
/// Detection" 5.1.5.
pub fn closest_point_on_triangle(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> (Vec3, [f32; 3]) {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;

    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    // Vertex region outside a
    if d1 <= 0.0 && d2 <= 0.0 {
        return (a, [1.0, 0.0, 0.0]);
    }

    // Vertex region outside b
    let bp = p - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return (b, [0.0, 1.0, 0.0]);
    }

    // Edge region ab
    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return (a + ab * v, [1.0 - v, v, 0.0]);
    }

    // Vertex region outside c
    let cp = p - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return (c, [0.0, 0.0, 1.0]);
    }

    // Edge region ac
    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return (a + ac * w, [1.0 - w, 0.0, w]);
    }

    // Edge region bc
    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return (b + (c - b) * w, [0.0, 1.0 - w, w]);
    }

    // Inside the face
    let sum = va + vb + vc;
    if sum.abs() <= f32::EPSILON {
        // Collinear vertices that slipped past the region tests
        return closest_point_on_segment(p, a, b);
    }
    let denom = 1.0 / sum;
    let v = vb * denom;
    let w = vc * denom;
    (a + ab * v + ac * w, [1.0 - v - w, v, w])
}

fn closest_point_on_segment(p: Vec3, a: Vec3, b: Vec3) -> (Vec3, [f32; 3]) {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    let t = if len_sq > f32::EPSILON {
        ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (a + ab * t, [1.0 - t, t, 0.0])
}

/// Oriented box: center, half-extents and three orthonormal axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    /// World-space center
    pub center: Vec3,
    /// Half size along each local axis
    pub half_extents: Vec3,
    /// Local axes in world space
    pub axes: [Vec3; 3],
}

impl OrientedBox {
    /// Axis-aligned box
    pub fn new(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            center,
            half_extents,
            axes: [Vec3::x(), Vec3::y(), Vec3::z()],
        }
    }

    /// Box rotated by `rotation`
    pub fn from_rotation(center: Vec3, half_extents: Vec3, rotation: &Quat) -> Self {
        Self {
            center,
            half_extents,
            axes: [rotation * Vec3::x(), rotation * Vec3::y(), rotation * Vec3::z()],
        }
    }

    /// Projection radius of the box onto `axis`
    pub fn projected_radius(&self, axis: &Vec3) -> f32 {
        self.axes
            .iter()
            .zip(self.half_extents.iter())
            .map(|(box_axis, extent)| axis.dot(box_axis).abs() * extent)
            .sum()
    }

    /// Farthest point of the box along `direction`
    pub fn support(&self, direction: &Vec3) -> Vec3 {
        self.axes
            .iter()
            .zip(self.half_extents.iter())
            .fold(self.center, |acc, (box_axis, extent)| {
                let sign = if direction.dot(box_axis) >= 0.0 { 1.0 } else { -1.0 };
                acc + box_axis * (sign * extent)
            })
    }

    /// Slab-test ray intersection. Returns `(distance, normal)`; a ray that
    /// starts inside hits at distance zero with the normal opposing the ray.
    pub fn intersect_ray(&self, ray: &Ray, max_distance: f32) -> Option<(f32, Vec3)> {
        let offset = ray.origin - self.center;
        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;
        let mut enter_normal = -ray.direction;

        for (axis, extent) in self.axes.iter().zip(self.half_extents.iter()) {
            let origin = axis.dot(&offset);
            let dir = axis.dot(&ray.direction);

            if dir.abs() < 1.0e-8 {
                if origin.abs() > *extent {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / dir;
            let mut t0 = (-extent - origin) * inv;
            let mut t1 = (extent - origin) * inv;
            let mut normal = -axis;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
                normal = *axis;
            }
            if t0 > t_enter {
                t_enter = t0;
                enter_normal = normal;
            }
            t_exit = t_exit.min(t1);
            if t_enter > t_exit {
                return None;
            }
        }

        if t_exit < 0.0 || t_enter > max_distance {
            return None;
        }
        if t_enter <= 0.0 {
            return Some((0.0, -ray.direction));
        }
        Some((t_enter, enter_normal))
    }
}

/// Axis-aligned bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Aabb {
    /// Inverted bounds that any point grows
    pub fn empty() -> Self {
        Self {
            min: Vec3::repeat(f32::MAX),
            max: Vec3::repeat(f32::MIN),
        }
    }

    /// Grow to include `point`
    pub fn include(&mut self, point: &Vec3) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    /// Grow to include `other`
    pub fn merge(&mut self, other: &Self) {
        self.include(&other.min);
        self.include(&other.max);
    }

    /// True if nothing was included yet
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x
    }

    /// Center point
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_sphere_ray_from_outside_and_inside() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, 0.0), 1.0);

        let ray = Ray::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::x());
        let (t, point, normal) = sphere.intersect_ray(&ray).unwrap();
        assert_relative_eq!(t, 4.0, epsilon = EPSILON);
        assert_relative_eq!(point, Vec3::new(-1.0, 0.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(normal, Vec3::new(-1.0, 0.0, 0.0), epsilon = EPSILON);

        let inside = Ray::new(Vec3::zeros(), Vec3::y());
        let (t, _, normal) = sphere.intersect_ray(&inside).unwrap();
        assert_eq!(t, 0.0);
        assert_relative_eq!(normal, -Vec3::y(), epsilon = EPSILON);

        let away = Ray::new(Vec3::new(-5.0, 0.0, 0.0), -Vec3::x());
        assert!(sphere.intersect_ray(&away).is_none());
    }

    #[test]
    fn test_triangle_ray_both_faces() {
        let tri = Triangle::new(
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        let down = Ray::new(Vec3::new(0.0, 0.0, 2.0), -Vec3::z());
        let up = Ray::new(Vec3::new(0.0, 0.0, -3.0), Vec3::z());

        assert_relative_eq!(tri.intersect_ray(&down).unwrap().0, 2.0, epsilon = EPSILON);
        assert_relative_eq!(tri.intersect_ray(&up).unwrap().0, 3.0, epsilon = EPSILON);
    }

    #[test]
    fn test_closest_point_regions() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(2.0, 0.0, 0.0);
        let c = Vec3::new(0.0, 2.0, 0.0);

        let (point, weights) = closest_point_on_triangle(Vec3::new(-1.0, -1.0, 0.0), a, b, c);
        assert_relative_eq!(point, a, epsilon = EPSILON);
        assert_eq!(weights, [1.0, 0.0, 0.0]);

        let (point, _) = closest_point_on_triangle(Vec3::new(1.0, -3.0, 0.0), a, b, c);
        assert_relative_eq!(point, Vec3::new(1.0, 0.0, 0.0), epsilon = EPSILON);

        let (point, weights) = closest_point_on_triangle(Vec3::new(0.5, 0.5, 4.0), a, b, c);
        assert_relative_eq!(point, Vec3::new(0.5, 0.5, 0.0), epsilon = EPSILON);
        let rebuilt = a * weights[0] + b * weights[1] + c * weights[2];
        assert_relative_eq!(rebuilt, point, epsilon = EPSILON);
    }

    #[test]
    fn test_box_ray_slab() {
        let obb = OrientedBox::new(Vec3::zeros(), Vec3::new(1.0, 2.0, 3.0));

        let ray = Ray::new(Vec3::new(0.0, -10.0, 0.0), Vec3::y());
        let (t, normal) = obb.intersect_ray(&ray, 100.0).unwrap();
        assert_relative_eq!(t, 8.0, epsilon = EPSILON);
        assert_relative_eq!(normal, -Vec3::y(), epsilon = EPSILON);

        assert!(obb.intersect_ray(&ray, 5.0).is_none());

        let miss = Ray::new(Vec3::new(5.0, -10.0, 0.0), Vec3::y());
        assert!(obb.intersect_ray(&miss, 100.0).is_none());
    }

    #[test]
    fn test_box_support_and_projection() {
        let obb = OrientedBox::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(
            obb.support(&Vec3::new(1.0, -1.0, 1.0)),
            Vec3::new(2.0, -2.0, 3.0),
            epsilon = EPSILON
        );
        assert_relative_eq!(obb.projected_radius(&Vec3::y()), 2.0, epsilon = EPSILON);
    }
}
