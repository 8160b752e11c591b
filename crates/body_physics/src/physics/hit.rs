//! Results returned by body queries

use std::sync::Arc;

use crate::foundation::math::Vec3;
use super::material::PhysicalMaterial;

/// A trace or sweep hit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HitResult {
    /// The hit stops the query
    pub blocking_hit: bool,
    /// The query started inside the shape
    pub start_penetrating: bool,
    /// Fraction of the query at the hit, 0..=1
    pub time: f32,
    /// Distance from the start to `location`
    pub distance: f32,
    /// Where the query shape ended up (the impact point for line traces)
    pub location: Vec3,
    /// Contact point on the hit shape
    pub impact_point: Vec3,
    /// Normal of the query shape at the hit
    pub normal: Vec3,
    /// Normal of the hit surface
    pub impact_normal: Vec3,
    /// Query start
    pub trace_start: Vec3,
    /// Query end
    pub trace_end: Vec3,
    /// Hit component
    pub component_id: u64,
    /// Hit actor
    pub actor_id: u64,
    /// Index of the hit shape on the body
    pub shape_index: usize,
    /// Hit triangle for mesh shapes
    pub face_index: Option<usize>,
    /// Material at the hit, when requested
    pub phys_material: Option<Arc<PhysicalMaterial>>,
}

/// One shape reported by an overlap query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlapResult {
    /// Overlapping component
    pub component_id: u64,
    /// Overlapping actor
    pub actor_id: u64,
    /// Index of the overlapping shape on the body
    pub shape_index: usize,
    /// The body blocks the tested channel
    pub blocking_hit: bool,
}
