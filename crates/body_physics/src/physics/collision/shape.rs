//! Shape geometry attached to bodies, and the query volumes traced against it
//!
//! Body shapes are stored in actor space and transformed to world space
//! on demand during each query, the same way every other collision test in
//! this module works.

use std::sync::Arc;

use crate::foundation::math::{constants::KINDA_SMALL_NUMBER, Pose, Quat, Vec3};
use super::gjk::{self, ConvexProxy, SupportCore};
use super::mass::MassProperties;
use super::mesh::{ConvexMesh, TriMesh};
use super::primitives::{Aabb, OrientedBox, Ray, Sphere, Triangle};
use super::sat;

/// Geometry of one body shape, in actor space
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeGeometry {
    /// Sphere centered on the shape origin
    Sphere {
        /// Radius
        radius: f32,
    },
    /// Box centered on the shape origin
    Box {
        /// Half size per axis
        half_extents: Vec3,
    },
    /// Capsule along local Z
    Capsule {
        /// Radius
        radius: f32,
        /// Half length of the cylinder between the two cap centers
        half_height: f32,
    },
    /// Shared convex hull with a per-shape scale
    Convex {
        /// Hull data, possibly a mirrored copy
        mesh: Arc<ConvexMesh>,
        /// Non-negative scale
        scale: Vec3,
    },
    /// Shared triangle mesh with a per-shape scale
    TriangleMesh {
        /// Mesh data, possibly a mirrored copy
        mesh: Arc<TriMesh>,
        /// Non-negative scale
        scale: Vec3,
    },
}

impl ShapeGeometry {
    /// True for per-poly geometry
    pub const fn is_triangle_mesh(&self) -> bool {
        matches!(self, Self::TriangleMesh { .. })
    }

    /// Short name used in logs
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Sphere { .. } => "sphere",
            Self::Box { .. } => "box",
            Self::Capsule { .. } => "capsule",
            Self::Convex { .. } => "convex",
            Self::TriangleMesh { .. } => "triangle mesh",
        }
    }

    /// Every dimension is finite and not degenerate
    pub fn is_valid(&self) -> bool {
        let positive = |v: f32| v.is_finite() && v > KINDA_SMALL_NUMBER;
        match self {
            Self::Sphere { radius } => positive(*radius),
            Self::Box { half_extents } => half_extents.iter().all(|e| positive(*e)),
            Self::Capsule { radius, half_height } => positive(*radius) && half_height.is_finite() && *half_height >= 0.0,
            Self::Convex { scale, .. } | Self::TriangleMesh { scale, .. } => scale.iter().all(|s| positive(*s)),
        }
    }

    /// Primitive scaled uniformly by `ratio`; `None` for cooked meshes,
    /// which are rebuilt from the template instead
    pub fn scaled_uniform(&self, ratio: f32) -> Option<Self> {
        let ratio = ratio.abs();
        match self {
            Self::Sphere { radius } => Some(Self::Sphere { radius: radius * ratio }),
            Self::Box { half_extents } => Some(Self::Box {
                half_extents: half_extents * ratio,
            }),
            Self::Capsule { radius, half_height } => Some(Self::Capsule {
                radius: radius * ratio,
                half_height: half_height * ratio,
            }),
            Self::Convex { .. } | Self::TriangleMesh { .. } => None,
        }
    }

    /// Mass properties about the shape origin; `None` for triangle meshes
    pub fn mass_properties(&self, density: f32) -> Option<MassProperties> {
        match self {
            Self::Sphere { radius } => Some(MassProperties::sphere(*radius, density)),
            Self::Box { half_extents } => Some(MassProperties::cuboid(half_extents, density)),
            Self::Capsule { radius, half_height } => Some(MassProperties::capsule(*radius, *half_height, density)),
            Self::Convex { mesh, scale } => Some(MassProperties::convex(mesh, scale, density)),
            Self::TriangleMesh { .. } => None,
        }
    }

    /// Transform to world space for a single test
    pub fn to_world_space(&self, pose: &Pose) -> WorldSpaceShape {
        let center = pose.translation.vector;
        let rotation = &pose.rotation;
        match self {
            Self::Sphere { radius } => WorldSpaceShape::Convex(ConvexProxy::sphere(center, *radius)),
            Self::Box { half_extents } => {
                WorldSpaceShape::Convex(ConvexProxy::cuboid(OrientedBox::from_rotation(center, *half_extents, rotation)))
            }
            Self::Capsule { radius, half_height } => {
                let axis = rotation * Vec3::z() * *half_height;
                WorldSpaceShape::Convex(ConvexProxy::capsule(center - axis, center + axis, *radius))
            }
            Self::Convex { mesh, scale } => WorldSpaceShape::Convex(ConvexProxy::hull(
                mesh.scaled_vertices(scale)
                    .iter()
                    .map(|v| pose.transform_point(&(*v).into()).coords)
                    .collect(),
            )),
            Self::TriangleMesh { mesh, scale } => WorldSpaceShape::Mesh(
                mesh.scaled_triangles(scale)
                    .map(|(face, tri)| {
                        let world = |v: Vec3| pose.transform_point(&v.into()).coords;
                        (face, Triangle::new(world(tri.v0), world(tri.v1), world(tri.v2)))
                    })
                    .collect(),
            ),
        }
    }
}

/// Contact reported by a shape query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeHit {
    /// Fraction of the trace or sweep at first contact
    pub time: f32,
    /// Distance travelled along the trace
    pub distance: f32,
    /// Contact point on the shape surface
    pub point: Vec3,
    /// Surface normal at the contact, facing the query
    pub normal: Vec3,
    /// Triangle index for mesh hits
    pub face_index: Option<usize>,
    /// The query already touched the shape at its start
    pub start_penetrating: bool,
}

/// World-space shape (temporary, for testing only)
#[derive(Debug, Clone)]
pub enum WorldSpaceShape {
    /// Any convex shape
    Convex(ConvexProxy),
    /// Triangles of a mesh with their face indices
    Mesh(Vec<(usize, Triangle)>),
}

impl WorldSpaceShape {
    /// Nearest ray hit within `max_distance`
    pub fn raycast(&self, ray: &Ray, max_distance: f32) -> Option<ShapeHit> {
        if max_distance <= 0.0 {
            return None;
        }
        let hit = |distance: f32, normal: Vec3, face_index: Option<usize>| ShapeHit {
            time: distance / max_distance,
            distance,
            point: ray.point_at(distance),
            normal,
            face_index,
            start_penetrating: distance <= 0.0,
        };

        match self {
            Self::Convex(proxy) => match &proxy.core {
                SupportCore::Point(center) => Sphere::new(*center, proxy.margin)
                    .intersect_ray(ray)
                    .filter(|(t, _, _)| *t <= max_distance)
                    .map(|(t, _, normal)| hit(t, normal, None)),
                SupportCore::Box(obb) if proxy.margin <= 0.0 => {
                    obb.intersect_ray(ray, max_distance).map(|(t, normal)| hit(t, normal, None))
                }
                _ => {
                    let cast = gjk::cast(&ConvexProxy::point(ray.origin), &(ray.direction * max_distance), proxy)?;
                    let distance = cast.toi * max_distance;
                    let normal = if cast.initially_overlapping { -ray.direction } else { cast.normal };
                    Some(hit(distance, normal, None))
                }
            },
            Self::Mesh(triangles) => triangles
                .iter()
                .filter_map(|(face, tri)| {
                    let (t, _, _) = tri.intersect_ray(ray)?;
                    (t <= max_distance).then(|| (t, *face, tri))
                })
                .min_by(|a, b| a.0.total_cmp(&b.0))
                .map(|(t, face, tri)| {
                    let normal = facing_normal(tri, &ray.direction);
                    hit(t, normal, Some(face))
                }),
        }
    }

    /// First contact of `moving` swept along `motion`
    pub fn sweep(&self, moving: &ConvexProxy, motion: &Vec3) -> Option<ShapeHit> {
        let length = motion.norm();
        let to_hit = |cast: gjk::CastHit, face_index: Option<usize>| ShapeHit {
            time: cast.toi,
            distance: cast.toi * length,
            point: cast.point,
            normal: cast.normal,
            face_index,
            start_penetrating: cast.initially_overlapping,
        };

        match self {
            Self::Convex(proxy) => gjk::cast(moving, motion, proxy).map(|cast| to_hit(cast, None)),
            Self::Mesh(triangles) => triangles
                .iter()
                .filter_map(|(face, tri)| {
                    let target = ConvexProxy::hull(tri.vertices().to_vec());
                    gjk::cast(moving, motion, &target).map(|cast| (cast, *face))
                })
                .min_by(|a, b| a.0.toi.total_cmp(&b.0.toi))
                .map(|(cast, face)| to_hit(cast, Some(face))),
        }
    }

    /// True if `volume` touches this shape. Boxes against meshes use the
    /// separating axis test per triangle.
    pub fn overlaps(&self, volume: &ConvexProxy) -> bool {
        match self {
            Self::Convex(proxy) => gjk::intersects(volume, proxy),
            Self::Mesh(triangles) => match &volume.core {
                SupportCore::Box(obb) if volume.margin <= 0.0 => triangles
                    .iter()
                    .any(|(_, tri)| sat::box_triangle(obb, &tri.vertices(), false).is_overlapping()),
                _ => triangles
                    .iter()
                    .any(|(_, tri)| gjk::intersects(volume, &ConvexProxy::hull(tri.vertices().to_vec()))),
            },
        }
    }

    /// Distance from `point` to the surface and the closest point on it.
    /// Zero distance and the point itself when inside. `None` for meshes.
    pub fn closest_point(&self, point: &Vec3) -> Option<(f32, Vec3)> {
        match self {
            Self::Convex(proxy) => {
                let proximity = gjk::closest_points(&ConvexProxy::point(*point), proxy);
                if proximity.intersecting {
                    Some((0.0, *point))
                } else {
                    Some((proximity.distance, proximity.point_b))
                }
            }
            Self::Mesh(_) => None,
        }
    }

    /// World-space bounds
    pub fn bounds(&self) -> Aabb {
        let mut bounds = Aabb::empty();
        match self {
            Self::Convex(proxy) => {
                for axis in [Vec3::x(), Vec3::y(), Vec3::z()] {
                    bounds.include(&(proxy.support(&axis) + axis * proxy.margin));
                    bounds.include(&(proxy.support(&-axis) - axis * proxy.margin));
                }
            }
            Self::Mesh(triangles) => {
                for (_, tri) in triangles {
                    for v in tri.vertices() {
                        bounds.include(&v);
                    }
                }
            }
        }
        bounds
    }
}

fn facing_normal(tri: &Triangle, direction: &Vec3) -> Vec3 {
    let normal = tri.scaled_normal().try_normalize(f32::EPSILON).unwrap_or_else(|| -direction);
    if normal.dot(direction) > 0.0 {
        -normal
    } else {
        normal
    }
}

/// Query volume for sweeps and overlaps
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollisionShape {
    /// Zero-extent trace
    Line,
    /// Box
    Box {
        /// Half size per axis
        half_extents: Vec3,
    },
    /// Sphere
    Sphere {
        /// Radius
        radius: f32,
    },
    /// Capsule along local Z
    Capsule {
        /// Radius
        radius: f32,
        /// Half height including the caps
        half_height: f32,
    },
}

impl CollisionShape {
    /// Box with the given half extents
    pub const fn make_box(half_extents: Vec3) -> Self {
        Self::Box { half_extents }
    }

    /// Sphere with the given radius
    pub const fn make_sphere(radius: f32) -> Self {
        Self::Sphere { radius }
    }

    /// Capsule with the given radius and half height (caps included)
    pub const fn make_capsule(radius: f32, half_height: f32) -> Self {
        Self::Capsule { radius, half_height }
    }

    /// Too small to sweep; queries fall back to a line trace
    pub fn is_nearly_zero(&self) -> bool {
        match self {
            Self::Line => true,
            Self::Box { half_extents } => half_extents.iter().all(|e| e.abs() <= KINDA_SMALL_NUMBER),
            Self::Sphere { radius } | Self::Capsule { radius, .. } => radius.abs() <= KINDA_SMALL_NUMBER,
        }
    }

    /// World-space support proxy at `position` and `rotation`
    pub fn to_proxy(&self, position: &Vec3, rotation: &Quat) -> ConvexProxy {
        match self {
            Self::Line => ConvexProxy::point(*position),
            Self::Box { half_extents } => {
                ConvexProxy::cuboid(OrientedBox::from_rotation(*position, *half_extents, rotation))
            }
            Self::Sphere { radius } => ConvexProxy::sphere(*position, *radius),
            Self::Capsule { radius, half_height } => {
                let axis = rotation * Vec3::z() * (half_height - radius).max(0.0);
                ConvexProxy::capsule(position - axis, position + axis, *radius)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Translation3;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-3;

    fn at(x: f32, y: f32, z: f32) -> Pose {
        Pose::from_parts(Translation3::new(x, y, z), Quat::identity())
    }

    fn ground_mesh() -> ShapeGeometry {
        let mesh = TriMesh::new(
            vec![
                Vec3::new(-10.0, -10.0, 0.0),
                Vec3::new(10.0, -10.0, 0.0),
                Vec3::new(10.0, 10.0, 0.0),
                Vec3::new(-10.0, 10.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        );
        ShapeGeometry::TriangleMesh {
            mesh: Arc::new(mesh),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }

    #[test]
    fn test_raycast_each_convex_kind() {
        let ray = Ray::new(Vec3::new(-10.0, 0.0, 0.0), Vec3::x());
        let shapes = [
            ShapeGeometry::Sphere { radius: 1.0 },
            ShapeGeometry::Box {
                half_extents: Vec3::new(1.0, 1.0, 1.0),
            },
            ShapeGeometry::Capsule {
                radius: 1.0,
                half_height: 2.0,
            },
            ShapeGeometry::Convex {
                mesh: Arc::new(ConvexMesh::cuboid(Vec3::new(0.5, 1.0, 1.0))),
                scale: Vec3::new(2.0, 1.0, 1.0),
            },
        ];

        for shape in shapes {
            let hit = shape.to_world_space(&Pose::identity()).raycast(&ray, 20.0).unwrap();
            assert_relative_eq!(hit.distance, 9.0, epsilon = EPSILON);
            assert_relative_eq!(hit.time, 9.0 / 20.0, epsilon = EPSILON);
            assert_relative_eq!(hit.point.x, -1.0, epsilon = EPSILON);
            assert_relative_eq!(hit.normal, -Vec3::x(), epsilon = EPSILON);
            assert!(!hit.start_penetrating);
        }
    }

    #[test]
    fn test_raycast_mesh_reports_face_and_upward_normal() {
        let world = ground_mesh().to_world_space(&at(0.0, 0.0, -1.0));
        let hit = world
            .raycast(&Ray::new(Vec3::new(2.0, 5.0, 5.0), -Vec3::z()), 100.0)
            .unwrap();
        assert_relative_eq!(hit.distance, 6.0, epsilon = EPSILON);
        assert_eq!(hit.face_index, Some(1));
        assert_relative_eq!(hit.normal, Vec3::z(), epsilon = EPSILON);

        assert!(world.raycast(&Ray::new(Vec3::new(2.0, 5.0, 5.0), -Vec3::z()), 3.0).is_none());
    }

    #[test]
    fn test_box_overlaps_mesh_through_sat() {
        let world = ground_mesh().to_world_space(&Pose::identity());
        let touching = CollisionShape::make_box(Vec3::new(1.0, 1.0, 1.0)).to_proxy(&Vec3::new(0.0, 0.0, 0.5), &Quat::identity());
        let above = CollisionShape::make_box(Vec3::new(1.0, 1.0, 1.0)).to_proxy(&Vec3::new(0.0, 0.0, 1.5), &Quat::identity());
        let sphere = CollisionShape::make_sphere(1.0).to_proxy(&Vec3::new(3.0, 3.0, 0.9), &Quat::identity());

        assert!(world.overlaps(&touching));
        assert!(!world.overlaps(&above));
        assert!(world.overlaps(&sphere));
    }

    #[test]
    fn test_sweep_sphere_onto_mesh() {
        let world = ground_mesh().to_world_space(&Pose::identity());
        let ball = CollisionShape::make_sphere(0.5).to_proxy(&Vec3::new(1.0, 1.0, 5.0), &Quat::identity());
        let hit = world.sweep(&ball, &Vec3::new(0.0, 0.0, -10.0)).unwrap();

        assert_relative_eq!(hit.time, 0.45, epsilon = EPSILON);
        assert_relative_eq!(hit.distance, 4.5, epsilon = 1e-2);
        assert_relative_eq!(hit.normal.z, 1.0, epsilon = EPSILON);
        assert!(hit.face_index.is_some());
    }

    #[test]
    fn test_closest_point_and_bounds() {
        let world = ShapeGeometry::Sphere { radius: 2.0 }.to_world_space(&at(10.0, 0.0, 0.0));
        let (distance, point) = world.closest_point(&Vec3::zeros()).unwrap();
        assert_relative_eq!(distance, 8.0, epsilon = EPSILON);
        assert_relative_eq!(point, Vec3::new(8.0, 0.0, 0.0), epsilon = EPSILON);

        let (inside, at_point) = world.closest_point(&Vec3::new(10.5, 0.0, 0.0)).unwrap();
        assert_eq!(inside, 0.0);
        assert_relative_eq!(at_point, Vec3::new(10.5, 0.0, 0.0));

        let bounds = world.bounds();
        assert_relative_eq!(bounds.min, Vec3::new(8.0, -2.0, -2.0), epsilon = EPSILON);
        assert_relative_eq!(bounds.max, Vec3::new(12.0, 2.0, 2.0), epsilon = EPSILON);

        assert!(ground_mesh().to_world_space(&Pose::identity()).closest_point(&Vec3::zeros()).is_none());
    }

    #[test]
    fn test_scaled_uniform_and_validity() {
        let capsule = ShapeGeometry::Capsule {
            radius: 1.0,
            half_height: 3.0,
        };
        assert_eq!(
            capsule.scaled_uniform(2.0),
            Some(ShapeGeometry::Capsule {
                radius: 2.0,
                half_height: 6.0
            })
        );
        assert!(ground_mesh().scaled_uniform(2.0).is_none());
        assert!(!ShapeGeometry::Sphere { radius: 0.0 }.is_valid());
        assert!(!ShapeGeometry::Box {
            half_extents: Vec3::new(1.0, f32::NAN, 1.0)
        }
        .is_valid());
    }

    #[test]
    fn test_query_shape_nearly_zero() {
        assert!(CollisionShape::Line.is_nearly_zero());
        assert!(CollisionShape::make_sphere(0.0).is_nearly_zero());
        assert!(CollisionShape::make_box(Vec3::zeros()).is_nearly_zero());
        assert!(!CollisionShape::make_capsule(1.0, 2.0).is_nearly_zero());
    }
}
