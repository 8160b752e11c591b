//! GJK distance and conservative-advancement casts between convex shapes
//!
//! Shapes are described by a support mapping over a "core" (point, segment,
//! box or point cloud) plus a spherical margin, so spheres and capsules are
//! exact: a sphere is a point core with a margin, a capsule a segment core.

use super::primitives::{closest_point_on_triangle, OrientedBox};
use crate::foundation::math::Vec3;

const MAX_ITERATIONS: usize = 64;
const REL_TOLERANCE: f32 = 1.0e-6;
const ABS_TOLERANCE_SQ: f32 = 1.0e-12;

/// Distance at which a cast considers the shapes touching
pub const CAST_TOLERANCE: f32 = 1.0e-3;

/// Convex core of a support-mapped shape
#[derive(Debug, Clone, PartialEq)]
pub enum SupportCore {
    /// Single point
    Point(Vec3),
    /// Line segment
    Segment(Vec3, Vec3),
    /// Oriented box
    Box(OrientedBox),
    /// Convex hull of a point cloud
    Points(Vec<Vec3>),
}

/// A convex shape in world space: core plus spherical margin
#[derive(Debug, Clone, PartialEq)]
pub struct ConvexProxy {
    /// Core geometry
    pub core: SupportCore,
    /// Radius swept around the core
    pub margin: f32,
}

impl ConvexProxy {
    /// Point with zero margin
    pub const fn point(p: Vec3) -> Self {
        Self {
            core: SupportCore::Point(p),
            margin: 0.0,
        }
    }

    /// Sphere
    pub const fn sphere(center: Vec3, radius: f32) -> Self {
        Self {
            core: SupportCore::Point(center),
            margin: radius,
        }
    }

    /// Capsule between two cap centers
    pub const fn capsule(a: Vec3, b: Vec3, radius: f32) -> Self {
        Self {
            core: SupportCore::Segment(a, b),
            margin: radius,
        }
    }

    /// Oriented box
    pub const fn cuboid(obb: OrientedBox) -> Self {
        Self {
            core: SupportCore::Box(obb),
            margin: 0.0,
        }
    }

    /// Convex hull of `points`
    pub const fn hull(points: Vec<Vec3>) -> Self {
        Self {
            core: SupportCore::Points(points),
            margin: 0.0,
        }
    }

    /// Farthest core point along `direction`
    pub fn support(&self, direction: &Vec3) -> Vec3 {
        match &self.core {
            SupportCore::Point(p) => *p,
            SupportCore::Segment(a, b) => {
                if a.dot(direction) >= b.dot(direction) {
                    *a
                } else {
                    *b
                }
            }
            SupportCore::Box(obb) => obb.support(direction),
            SupportCore::Points(points) => points
                .iter()
                .copied()
                .max_by(|p, q| p.dot(direction).total_cmp(&q.dot(direction)))
                .unwrap_or_else(Vec3::zeros),
        }
    }

    /// Representative interior point of the core
    pub fn center(&self) -> Vec3 {
        match &self.core {
            SupportCore::Point(p) => *p,
            SupportCore::Segment(a, b) => (a + b) * 0.5,
            SupportCore::Box(obb) => obb.center,
            SupportCore::Points(points) => {
                if points.is_empty() {
                    Vec3::zeros()
                } else {
                    #[allow(clippy::cast_precision_loss)]
                    let count = points.len() as f32;
                    points.iter().sum::<Vec3>() / count
                }
            }
        }
    }

    /// Same shape moved by `offset`
    #[must_use]
    pub fn translated(&self, offset: &Vec3) -> Self {
        let core = match &self.core {
            SupportCore::Point(p) => SupportCore::Point(p + offset),
            SupportCore::Segment(a, b) => SupportCore::Segment(a + offset, b + offset),
            SupportCore::Box(obb) => SupportCore::Box(OrientedBox {
                center: obb.center + offset,
                ..*obb
            }),
            SupportCore::Points(points) => SupportCore::Points(points.iter().map(|p| p + offset).collect()),
        };
        Self {
            core,
            margin: self.margin,
        }
    }
}

/// Result of a distance query between two proxies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proximity {
    /// Surface distance, zero when touching or penetrating
    pub distance: f32,
    /// Closest point on the first shape
    pub point_a: Vec3,
    /// Closest point on the second shape
    pub point_b: Vec3,
    /// Unit direction from `b` toward `a`; zero if the cores intersect
    pub normal: Vec3,
    /// True when the shapes touch or interpenetrate
    pub intersecting: bool,
}

#[derive(Debug, Clone, Copy)]
struct SimplexVertex {
    w: Vec3,
    a: Vec3,
    b: Vec3,
}

fn support_vertex(a: &ConvexProxy, b: &ConvexProxy, direction: &Vec3) -> SimplexVertex {
    let pa = a.support(direction);
    let pb = b.support(&-direction);
    SimplexVertex { w: pa - pb, a: pa, b: pb }
}

/// Closest points between two convex proxies.
pub fn closest_points(a: &ConvexProxy, b: &ConvexProxy) -> Proximity {
    let mut direction = a.center() - b.center();
    if direction.norm_squared() < ABS_TOLERANCE_SQ {
        direction = Vec3::x();
    }

    let first = support_vertex(a, b, &-direction);
    let mut simplex: Vec<(SimplexVertex, f32)> = vec![(first, 1.0)];
    let mut v = first.w;
    let mut cores_overlap = false;

    for _ in 0..MAX_ITERATIONS {
        let v_sq = v.norm_squared();
        if v_sq <= ABS_TOLERANCE_SQ {
            cores_overlap = true;
            break;
        }

        let candidate = support_vertex(a, b, &-v);
        if v_sq - v.dot(&candidate.w) <= REL_TOLERANCE * v_sq {
            break;
        }
        if simplex.iter().any(|(s, _)| (s.w - candidate.w).norm_squared() <= ABS_TOLERANCE_SQ) {
            break;
        }

        let mut vertices: Vec<SimplexVertex> = simplex.iter().map(|(s, _)| *s).collect();
        vertices.push(candidate);
        let (reduced, closest, contains_origin) = reduce_simplex(&vertices);
        if contains_origin {
            cores_overlap = true;
            simplex = reduced;
            break;
        }
        if closest.norm_squared() >= v_sq {
            // No progress; keep the previous simplex
            break;
        }
        simplex = reduced;
        v = closest;
    }

    let core_a: Vec3 = simplex.iter().map(|(s, weight)| s.a * *weight).sum();
    let core_b: Vec3 = simplex.iter().map(|(s, weight)| s.b * *weight).sum();

    if cores_overlap {
        return Proximity {
            distance: 0.0,
            point_a: core_a,
            point_b: core_a,
            normal: Vec3::zeros(),
            intersecting: true,
        };
    }

    let separation = core_a - core_b;
    let core_distance = separation.norm();
    let normal = if core_distance > 0.0 {
        separation / core_distance
    } else {
        Vec3::zeros()
    };
    let distance = core_distance - a.margin - b.margin;

    Proximity {
        distance: distance.max(0.0),
        point_a: core_a - normal * a.margin,
        point_b: core_b + normal * b.margin,
        normal,
        intersecting: distance <= 0.0,
    }
}

/// True if the two proxies touch or overlap
pub fn intersects(a: &ConvexProxy, b: &ConvexProxy) -> bool {
    closest_points(a, b).intersecting
}

type Reduced = (Vec<(SimplexVertex, f32)>, Vec3, bool);

/// Closest point of the simplex hull to the origin, the minimal supporting
/// sub-simplex with barycentric weights, and whether the origin is enclosed.
fn reduce_simplex(vertices: &[SimplexVertex]) -> Reduced {
    match vertices {
        [p] => (vec![(*p, 1.0)], p.w, false),
        [p, q] => reduce_segment(*p, *q),
        [p, q, r] => reduce_triangle(*p, *q, *r),
        [p, q, r, s] => reduce_tetrahedron(*p, *q, *r, *s),
        _ => (Vec::new(), Vec3::zeros(), false),
    }
}

fn reduce_segment(p: SimplexVertex, q: SimplexVertex) -> Reduced {
    let pq = q.w - p.w;
    let len_sq = pq.norm_squared();
    let t = if len_sq > ABS_TOLERANCE_SQ {
        (-p.w.dot(&pq) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    if t <= 0.0 {
        (vec![(p, 1.0)], p.w, false)
    } else if t >= 1.0 {
        (vec![(q, 1.0)], q.w, false)
    } else {
        (vec![(p, 1.0 - t), (q, t)], p.w + pq * t, false)
    }
}

fn reduce_triangle(p: SimplexVertex, q: SimplexVertex, r: SimplexVertex) -> Reduced {
    let (closest, weights) = closest_point_on_triangle(Vec3::zeros(), p.w, q.w, r.w);
    let kept = [p, q, r]
        .into_iter()
        .zip(weights)
        .filter(|(_, weight)| *weight > 0.0)
        .collect();
    (kept, closest, false)
}

fn reduce_tetrahedron(p: SimplexVertex, q: SimplexVertex, r: SimplexVertex, s: SimplexVertex) -> Reduced {
    // Each face with the vertex opposite to it
    let faces = [(p, q, r, s), (p, r, s, q), (p, s, q, r), (q, s, r, p)];

    let mut best: Option<Reduced> = None;
    let mut origin_outside_any = false;

    for (a, b, c, opposite) in faces {
        let normal = (b.w - a.w).cross(&(c.w - a.w));
        let origin_side = normal.dot(&-a.w);
        let opposite_side = normal.dot(&(opposite.w - a.w));

        let degenerate = opposite_side.abs() <= ABS_TOLERANCE_SQ;
        if degenerate || origin_side * opposite_side < 0.0 {
            origin_outside_any = true;
            let candidate = reduce_triangle(a, b, c);
            let better = best
                .as_ref()
                .map_or(true, |(_, closest, _)| candidate.1.norm_squared() < closest.norm_squared());
            if better {
                best = Some(candidate);
            }
        }
    }

    match best {
        Some(reduced) if origin_outside_any => reduced,
        _ => (
            vec![(p, 0.25), (q, 0.25), (r, 0.25), (s, 0.25)],
            Vec3::zeros(),
            true,
        ),
    }
}

/// Time of impact of a linear cast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CastHit {
    /// Fraction of the motion at first contact, in `[0, 1]`
    pub toi: f32,
    /// Contact point on the target
    pub point: Vec3,
    /// Target surface normal at the contact, facing the moving shape
    pub normal: Vec3,
    /// The shapes already touched at the start of the motion
    pub initially_overlapping: bool,
}

/// Conservative advancement of `moving` along `motion` toward a static `target`.
pub fn cast(moving: &ConvexProxy, motion: &Vec3, target: &ConvexProxy) -> Option<CastHit> {
    let mut toi = 0.0_f32;
    let mut last_normal = motion.try_normalize(f32::EPSILON).map_or_else(Vec3::zeros, |d| -d);

    for iteration in 0..MAX_ITERATIONS {
        let placed = moving.translated(&(motion * toi));
        let proximity = closest_points(&placed, target);

        if proximity.intersecting || proximity.distance <= CAST_TOLERANCE {
            let normal = if proximity.normal == Vec3::zeros() {
                last_normal
            } else {
                proximity.normal
            };
            return Some(CastHit {
                toi,
                point: proximity.point_b,
                normal,
                initially_overlapping: iteration == 0 && proximity.intersecting,
            });
        }

        let approach = -motion.dot(&proximity.normal);
        if approach <= f32::EPSILON {
            return None;
        }
        toi += proximity.distance / approach;
        if toi > 1.0 {
            return None;
        }
        last_normal = proximity.normal;
    }

    log::trace!("Shape cast did not converge");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-4;

    #[test]
    fn test_sphere_sphere_distance() {
        let a = ConvexProxy::sphere(Vec3::new(0.0, 0.0, 0.0), 1.0);
        let b = ConvexProxy::sphere(Vec3::new(5.0, 0.0, 0.0), 2.0);
        let prox = closest_points(&a, &b);

        assert!(!prox.intersecting);
        assert_relative_eq!(prox.distance, 2.0, epsilon = EPSILON);
        assert_relative_eq!(prox.point_a, Vec3::new(1.0, 0.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(prox.point_b, Vec3::new(3.0, 0.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(prox.normal, Vec3::new(-1.0, 0.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_point_box_face_edge_and_inside() {
        let cube = ConvexProxy::cuboid(OrientedBox::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0)));

        let face = closest_points(&ConvexProxy::point(Vec3::new(0.2, 0.3, 4.0)), &cube);
        assert_relative_eq!(face.distance, 3.0, epsilon = EPSILON);
        assert_relative_eq!(face.point_b, Vec3::new(0.2, 0.3, 1.0), epsilon = EPSILON);

        let edge = closest_points(&ConvexProxy::point(Vec3::new(2.0, 2.0, 0.0)), &cube);
        assert_relative_eq!(edge.distance, 2.0_f32.sqrt(), epsilon = EPSILON);
        assert_relative_eq!(edge.point_b, Vec3::new(1.0, 1.0, 0.0), epsilon = EPSILON);

        let inside = closest_points(&ConvexProxy::point(Vec3::new(0.1, -0.2, 0.3)), &cube);
        assert!(inside.intersecting);
        assert_eq!(inside.distance, 0.0);
    }

    #[test]
    fn test_capsule_overlap_with_box() {
        let cube = ConvexProxy::cuboid(OrientedBox::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0)));
        let near = ConvexProxy::capsule(Vec3::new(1.5, -3.0, 0.0), Vec3::new(1.5, 3.0, 0.0), 0.6);
        let far = ConvexProxy::capsule(Vec3::new(1.5, -3.0, 0.0), Vec3::new(1.5, 3.0, 0.0), 0.4);

        assert!(intersects(&near, &cube));
        assert!(!intersects(&far, &cube));
        assert_relative_eq!(closest_points(&far, &cube).distance, 0.1, epsilon = EPSILON);
    }

    #[test]
    fn test_hull_distance_matches_box() {
        let corners: Vec<Vec3> = (0..8)
            .map(|i| {
                Vec3::new(
                    if i & 1 == 0 { -1.0 } else { 1.0 },
                    if i & 2 == 0 { -1.0 } else { 1.0 },
                    if i & 4 == 0 { -1.0 } else { 1.0 },
                )
            })
            .collect();
        let hull = ConvexProxy::hull(corners);
        let probe = ConvexProxy::point(Vec3::new(3.0, 0.5, -0.5));
        assert_relative_eq!(closest_points(&probe, &hull).distance, 2.0, epsilon = EPSILON);
    }

    #[test]
    fn test_sphere_cast_hits_box_face() {
        let cube = ConvexProxy::cuboid(OrientedBox::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0)));
        let ball = ConvexProxy::sphere(Vec3::new(-10.0, 0.0, 0.0), 0.5);
        let hit = cast(&ball, &Vec3::new(20.0, 0.0, 0.0), &cube).unwrap();

        // Sphere surface meets x = -1 when its center reaches x = -1.5
        assert_relative_eq!(hit.toi, 8.5 / 20.0, epsilon = 1e-3);
        assert_relative_eq!(hit.normal, Vec3::new(-1.0, 0.0, 0.0), epsilon = 1e-3);
        assert_relative_eq!(hit.point.x, -1.0, epsilon = 1e-3);
        assert!(!hit.initially_overlapping);
    }

    #[test]
    fn test_cast_misses_and_starts_inside() {
        let cube = ConvexProxy::cuboid(OrientedBox::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0)));

        let ball = ConvexProxy::sphere(Vec3::new(-10.0, 5.0, 0.0), 0.5);
        assert!(cast(&ball, &Vec3::new(20.0, 0.0, 0.0), &cube).is_none());

        let short = ConvexProxy::sphere(Vec3::new(-10.0, 0.0, 0.0), 0.5);
        assert!(cast(&short, &Vec3::new(5.0, 0.0, 0.0), &cube).is_none());

        let inside = ConvexProxy::sphere(Vec3::zeros(), 0.5);
        let hit = cast(&inside, &Vec3::new(5.0, 0.0, 0.0), &cube).unwrap();
        assert!(hit.initially_overlapping);
        assert_eq!(hit.toi, 0.0);
    }
}
