//! Narrow-phase geometry used by body queries and mass computation
//!
//! # Architecture
//!
//! - **Model Space Storage**: body shapes and cooked meshes are kept in actor
//!   or model space
//! - **On-Demand Transformation**: shapes become a [`WorldSpaceShape`] only for
//!   the duration of a single test
//! - **Shared Meshes**: convex hulls and triangle meshes are shared through `Arc`
//!   and scaled per shape
//!
//! # Module Organization
//!
//! - [`primitives`] - rays, spheres, triangles, oriented boxes, bounds
//! - [`sat`] - separating axis tests for boxes against triangles and polygons
//! - [`gjk`] - distance, intersection and shape casts between convex shapes
//! - [`mesh`] - cooked convex hulls and triangle meshes
//! - [`mass`] - mass and inertia of solid shapes
//! - [`shape`] - body shape geometry and query volumes

pub mod gjk;
pub mod mass;
pub mod mesh;
pub mod primitives;
pub mod sat;
pub mod shape;

pub use gjk::{ConvexProxy, Proximity};
pub use mass::MassProperties;
pub use mesh::{ConvexMesh, TriMesh};
pub use primitives::{Aabb, OrientedBox, Ray, Triangle};
pub use sat::{Penetration, SatResult, SeparatingAxis};
pub use shape::{CollisionShape, ShapeGeometry, ShapeHit, WorldSpaceShape};
