//! Geometric queries against the shapes of one body
//!
//! Queries read the body's primary actor under its scene's read lock. Shapes
//! take part only while flagged as scene query shapes, so a body whose
//! effective collision mode has no query part never reports a hit.
//!
//! [`line_trace`](BodyInstance::line_trace) reports the nearest hit over every
//! eligible shape. [`sweep`](BodyInstance::sweep) reports the first shape, in
//! shape order, that the swept volume hits, even if a later shape is hit
//! sooner.

use std::sync::Arc;

use super::BodyInstance;
use crate::foundation::math::constants::KINDA_SMALL_NUMBER;
use crate::foundation::math::{Pose, Quat, Vec3};
use crate::physics::actor::{RigidActor, Shape};
use crate::physics::collision::{ConvexProxy, CollisionShape, Ray, ShapeGeometry, ShapeHit, WorldSpaceShape};
use crate::physics::collision_channel::{CollisionChannel, CollisionResponse};
use crate::physics::hit::{HitResult, OverlapResult};

impl BodyInstance {
    /// Trace a line from `start` to `end` and return the nearest hit.
    ///
    /// `trace_complex` selects shapes answering complex traces instead of
    /// simple ones. The surface material is filled in on request.
    pub fn line_trace(&self, start: &Vec3, end: &Vec3, trace_complex: bool, return_phys_material: bool) -> Option<HitResult> {
        let delta = end - start;
        let length = delta.norm();
        if length <= KINDA_SMALL_NUMBER {
            log::trace!("line_trace: zero-length trace against '{}'", self.body_debug_name());
            return None;
        }
        if !self.collision_enabled().has_query() {
            return None;
        }

        let ray = Ray::new(*start, delta);
        self.read_actor(|actor| {
            let (index, hit) = eligible_shapes(actor, trace_complex)
                .filter_map(|(index, shape)| shape.world_space(&actor.pose).raycast(&ray, length).map(|hit| (index, hit)))
                .min_by(|a, b| a.1.distance.total_cmp(&b.1.distance))?;

            let shape = &actor.shapes[index];
            let mut result = hit_result(shape, index, &hit, start, end);
            result.location = hit.point;
            if return_phys_material {
                result.phys_material = shape.material(hit.face_index).map(Arc::clone);
            }
            Some(result)
        })
        .flatten()
    }

    /// Sweep `shape` at `rotation` from `start` to `end`.
    ///
    /// The first eligible shape reporting a hit wins. A nearly zero volume
    /// falls back to [`line_trace`](Self::line_trace).
    pub fn sweep(&self, start: &Vec3, end: &Vec3, rotation: &Quat, shape: &CollisionShape, trace_complex: bool) -> Option<HitResult> {
        if shape.is_nearly_zero() {
            return self.line_trace(start, end, trace_complex, false);
        }
        let delta = end - start;
        if delta.norm() <= KINDA_SMALL_NUMBER || !self.collision_enabled().has_query() {
            return None;
        }

        let moving = shape.to_proxy(start, rotation);
        self.read_actor(|actor| {
            eligible_shapes(actor, trace_complex).find_map(|(index, target)| {
                let hit = target.world_space(&actor.pose).sweep(&moving, &delta)?;
                let mut result = hit_result(target, index, &hit, start, end);
                result.location = start + delta * hit.time;
                Some(result)
            })
        })
        .flatten()
    }

    /// True if `shape` at `position` and `rotation` touches any query shape
    pub fn overlap_test(&self, position: &Vec3, rotation: &Quat, shape: &CollisionShape) -> bool {
        self.overlaps_proxy(&shape.to_proxy(position, rotation))
    }

    /// True if convex `geometry` at `pose` touches any query shape.
    /// Triangle meshes cannot be used as query geometry.
    pub fn overlap(&self, geometry: &ShapeGeometry, pose: &Pose) -> bool {
        match geometry.to_world_space(pose) {
            WorldSpaceShape::Convex(proxy) => self.overlaps_proxy(&proxy),
            WorldSpaceShape::Mesh(_) => {
                log::warn!("overlap: triangle mesh query geometry is not supported");
                false
            }
        }
    }

    fn overlaps_proxy(&self, proxy: &ConvexProxy) -> bool {
        if !self.collision_enabled().has_query() {
            return false;
        }
        self.read_actor(|actor| {
            actor
                .shapes
                .iter()
                .filter(|shape| shape.is_query_shape())
                .any(|shape| shape.world_space(&actor.pose).overlaps(proxy))
        })
        .unwrap_or(false)
    }

    /// Every query shape touching `shape` that does not ignore `test_channel`
    pub fn overlap_multi(
        &self,
        position: &Vec3,
        rotation: &Quat,
        shape: &CollisionShape,
        test_channel: CollisionChannel,
    ) -> Vec<OverlapResult> {
        if !self.collision_enabled().has_query() {
            return Vec::new();
        }
        let proxy = shape.to_proxy(position, rotation);
        self.read_actor(|actor| {
            actor
                .shapes
                .iter()
                .enumerate()
                .filter(|(_, shape)| shape.is_query_shape())
                .filter_map(|(index, shape)| {
                    let response = shape.query_filter.response_to(test_channel);
                    if response == CollisionResponse::Ignore || !shape.world_space(&actor.pose).overlaps(&proxy) {
                        return None;
                    }
                    Some(OverlapResult {
                        component_id: shape.query_filter.component_id,
                        actor_id: shape.query_filter.actor_id,
                        shape_index: index,
                        blocking_hit: response == CollisionResponse::Block,
                    })
                })
                .collect()
        })
        .unwrap_or_default()
    }

    /// Distance from `point` to the closest shape and the closest point on
    /// it. Zero distance when inside. Every shape counts regardless of its
    /// query flags, except triangle meshes, which are skipped; with nothing
    /// eligible the distance is `-1`.
    pub fn distance_to_body(&self, point: &Vec3) -> (f32, Vec3) {
        let nearest = self
            .read_actor(|actor| {
                let mut nearest: Option<(f32, Vec3)> = None;
                for shape in &actor.shapes {
                    if shape.geometry.is_triangle_mesh() {
                        log::warn!(
                            "distance_to_body: triangle mesh on '{}' does not support closest point queries",
                            actor.debug_name
                        );
                        continue;
                    }
                    let Some((distance, closest)) = shape.world_space(&actor.pose).closest_point(point) else {
                        continue;
                    };
                    if nearest.map_or(true, |(best, _)| distance < best) {
                        nearest = Some((distance, closest));
                    }
                }
                nearest
            })
            .flatten();

        nearest.unwrap_or_else(|| {
            log::warn!("distance_to_body: '{}' has no shape to measure against", self.body_debug_name());
            (-1.0, Vec3::zeros())
        })
    }
}

fn eligible_shapes(actor: &RigidActor, trace_complex: bool) -> impl Iterator<Item = (usize, &Shape)> {
    actor
        .shapes
        .iter()
        .enumerate()
        .filter(move |(_, shape)| shape.is_query_shape() && shape.query_filter.matches_trace(trace_complex))
}

fn hit_result(shape: &Shape, shape_index: usize, hit: &ShapeHit, start: &Vec3, end: &Vec3) -> HitResult {
    HitResult {
        blocking_hit: true,
        start_penetrating: hit.start_penetrating,
        time: hit.time,
        distance: hit.distance,
        location: hit.point,
        impact_point: hit.point,
        normal: hit.normal,
        impact_normal: hit.normal,
        trace_start: *start,
        trace_end: *end,
        component_id: shape.query_filter.component_id,
        actor_id: shape.query_filter.actor_id,
        shape_index,
        face_index: hit.face_index,
        phys_material: None,
    }
}
