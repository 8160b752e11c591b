//! Separating axis tests between an oriented box and a convex polygon
//!
//! Candidate axes, in test order:
//! - the box's three face normals,
//! - the polygon's face normal,
//! - every polygon edge crossed with every box axis.
//!
//! The box is projected as `center·a ± Σ|a·axisᵢ|·extentᵢ` and the polygon by
//! the min/max of its vertex projections. The first axis whose intervals do not
//! overlap proves separation. Axes that come out (near) zero length, such as
//! an edge parallel to a box axis or the normal of a degenerate triangle, can
//! not separate anything and are skipped.

use super::primitives::OrientedBox;
use crate::foundation::math::Vec3;

/// Squared length below which a candidate axis is treated as degenerate
const DEGENERATE_AXIS_SQ: f32 = 1.0e-6;

/// Identifies which candidate axis a result refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeparatingAxis {
    /// Face normal `i` of the box (0 = X, 1 = Y, 2 = Z)
    BoxFace(usize),
    /// The polygon's own normal
    PolygonNormal,
    /// Polygon edge `edge` crossed with box axis `box_axis`
    EdgeCross {
        /// Box axis index
        box_axis: usize,
        /// Polygon edge index (edge `i` runs from vertex `i` to `i + 1`)
        edge: usize,
    },
}

/// Least-penetration estimate over every tested axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Penetration {
    /// Which axis needs the smallest displacement
    pub axis_id: SeparatingAxis,
    /// That axis, normalized
    pub axis: Vec3,
    /// Signed distance to move the polygon along `axis` to separate it
    pub depth: f32,
}

/// Outcome of a separating axis test
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SatResult {
    /// A separating axis was found; testing stopped there
    Separated(SeparatingAxis),
    /// No axis separates the shapes
    Overlapping {
        /// Present when requested
        penetration: Option<Penetration>,
    },
}

impl SatResult {
    /// True for [`SatResult::Overlapping`]
    pub const fn is_overlapping(&self) -> bool {
        matches!(self, Self::Overlapping { .. })
    }
}

/// Box vs triangle
pub fn box_triangle(obb: &OrientedBox, triangle: &[Vec3; 3], want_penetration: bool) -> SatResult {
    box_polygon(obb, triangle, want_penetration)
}

/// Box vs convex polygon. Polygons are expected to have at least three
/// coplanar vertices; fewer vertices degrade to a point or segment test
/// because their normal is degenerate and gets skipped.
pub fn box_polygon(obb: &OrientedBox, polygon: &[Vec3], want_penetration: bool) -> SatResult {
    let mut best: Option<Penetration> = None;

    for (axis_id, axis) in candidate_axes(obb, polygon) {
        let Some(axis) = normalized_axis(&axis) else {
            continue;
        };
        let (box_min, box_max) = project_box(obb, &axis);
        let (poly_min, poly_max) = project_polygon(polygon, &axis);

        if box_max < poly_min || poly_max < box_min {
            return SatResult::Separated(axis_id);
        }

        if want_penetration {
            // Push the polygon forward past the box, or backward before it
            let forward = box_max - poly_min;
            let backward = poly_max - box_min;
            let depth = if forward < backward { forward } else { -backward };
            if best.map_or(true, |b| depth.abs() < b.depth.abs()) {
                best = Some(Penetration { axis_id, axis, depth });
            }
        }
    }

    SatResult::Overlapping { penetration: best }
}

/// Every candidate axis in test order, unnormalized
pub fn candidate_axes(obb: &OrientedBox, polygon: &[Vec3]) -> Vec<(SeparatingAxis, Vec3)> {
    let mut axes = Vec::with_capacity(4 + 3 * polygon.len());

    for (i, axis) in obb.axes.iter().enumerate() {
        axes.push((SeparatingAxis::BoxFace(i), *axis));
    }
    axes.push((SeparatingAxis::PolygonNormal, polygon_normal(polygon)));

    let n = polygon.len();
    if n >= 2 {
        // A segment has a single edge
        let edge_count = if n == 2 { 1 } else { n };
        for edge in 0..edge_count {
            let direction = polygon[(edge + 1) % n] - polygon[edge];
            for (box_axis, axis) in obb.axes.iter().enumerate() {
                axes.push((SeparatingAxis::EdgeCross { box_axis, edge }, direction.cross(axis)));
            }
        }
    }
    axes
}

/// `Some(true)` if the projections overlap on `axis`, `Some(false)` if it
/// separates, `None` if the axis is degenerate
pub fn axis_overlaps(obb: &OrientedBox, polygon: &[Vec3], axis: &Vec3) -> Option<bool> {
    let axis = normalized_axis(axis)?;
    let (box_min, box_max) = project_box(obb, &axis);
    let (poly_min, poly_max) = project_polygon(polygon, &axis);
    Some(box_max >= poly_min && poly_max >= box_min)
}

/// Newell normal; exact for triangles and robust for near-planar polygons
pub fn polygon_normal(polygon: &[Vec3]) -> Vec3 {
    let n = polygon.len();
    if n < 3 {
        return Vec3::zeros();
    }
    if n == 3 {
        return (polygon[1] - polygon[0]).cross(&(polygon[2] - polygon[0]));
    }
    (0..n).fold(Vec3::zeros(), |acc, i| {
        let current = polygon[i];
        let next = polygon[(i + 1) % n];
        acc + Vec3::new(
            (current.y - next.y) * (current.z + next.z),
            (current.z - next.z) * (current.x + next.x),
            (current.x - next.x) * (current.y + next.y),
        )
    })
}

fn normalized_axis(axis: &Vec3) -> Option<Vec3> {
    let len_sq = axis.norm_squared();
    if len_sq < DEGENERATE_AXIS_SQ {
        return None;
    }
    Some(axis / len_sq.sqrt())
}

fn project_box(obb: &OrientedBox, axis: &Vec3) -> (f32, f32) {
    let center = obb.center.dot(axis);
    let radius = obb.projected_radius(axis);
    (center - radius, center + radius)
}

fn project_polygon(polygon: &[Vec3], axis: &Vec3) -> (f32, f32) {
    polygon.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
        let p = v.dot(axis);
        (lo.min(p), hi.max(p))
    })
}
