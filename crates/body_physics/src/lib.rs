//! # Body Physics
//!
//! Rigid-body collision integration layer: collision channels and profiles,
//! body instances living in a sync and an async scene, and geometric queries
//! against a single body.
//!
//! ## Features
//!
//! - **Collision filtering**: per-channel Ignore/Overlap/Block responses with named profiles
//! - **Body lifecycle**: static, kinematic and simulated bodies with RAII scene registration
//! - **Scaling**: uniform primitive rescale and mirrored hulls for negative scale
//! - **Queries**: line traces, sweeps, overlaps and closest points
//! - **Separating axis tests**: box against triangle or convex polygon
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use body_physics::prelude::*;
//!
//! let config = PhysicsConfig::shared();
//! let scene = PhysScene::new(Arc::clone(&config));
//! let setup = Arc::new(BodySetup::new("Crate").with_box(Vec3::zeros(), Vec3::new(50.0, 50.0, 50.0)));
//!
//! let mut body = BodyInstance::new(config);
//! body.init_body(setup, &Transform::identity(), None, &scene, None)?;
//!
//! let hit = body.line_trace(&Vec3::new(-200.0, 0.0, 0.0), &Vec3::new(200.0, 0.0, 0.0), false, false);
//! assert!(hit.is_some());
//! # Ok::<(), BodyInitError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod physics;

/// Common imports for users of the crate
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, NetMode, PhysicsConfig, PhysicsSettings},
        foundation::math::{Pose, Quat, Transform, Vec3},
        physics::{
            BodyInitError, BodyInstance, BodyOwner, BodySetup, CollisionChannel, CollisionEnabled,
            CollisionProfileTable, CollisionResponse, CollisionShape, CollisionTraceFlag, HitResult, Mobility,
            OverlapResult, OwnerComponent, PhysScene, PhysicalMaterial,
        },
    };
}
