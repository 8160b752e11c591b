//! Rigid-body collision layer
//!
//! Bodies are built from a shared [`BodySetup`] template, classified by
//! collision channel and response table, registered as native actors into a
//! sync and an optional async [`SceneWorld`], and queried with traces, sweeps,
//! overlaps and closest-point tests.
//!
//! # Module Organization
//!
//! - [`collision_channel`] - channels, responses and the dense response table
//! - [`profile`] - named collision profiles
//! - [`filter`] - per-shape filter data and flags
//! - [`collision`] - narrow-phase geometry, separating axis tests and mass
//! - [`body_setup`] - shape templates shared by every instance of an asset
//! - [`actor`] / [`scene`] - native actors and the scenes that own them
//! - [`body_instance`] - per-component runtime bodies and their queries

pub mod actor;
pub mod body_instance;
pub mod body_setup;
pub mod collision;
pub mod collision_channel;
pub mod component;
pub mod filter;
pub mod hit;
pub mod material;
pub mod profile;
pub mod scene;

#[cfg(test)]
mod tests;

pub use actor::{ActorKind, MotionState, RigidActor, RigidDynamic, Shape};
pub use body_instance::{
    BodyCollisionSettings, BodyInitError, BodyInstance, RadialFalloff, ScaleError, SceneMembership, SleepFamily,
};
pub use body_setup::{BodyCollisionResponse, BodySetup, CollisionTraceFlag, PhysicsType};
pub use collision::{CollisionShape, ShapeGeometry};
pub use collision_channel::{
    CollisionChannel, CollisionEnabled, CollisionResponse, CollisionResponseContainer, ResponseChannel,
};
pub use component::{BodyOwner, Mobility, OwnerComponent, ParentBodySettings};
pub use filter::{FilterData, FilterFlags, ShapeFlags};
pub use hit::{HitResult, OverlapResult};
pub use material::PhysicalMaterial;
pub use profile::{CollisionProfile, CollisionProfileTable, ProfileError, ProfileRegistry};
pub use scene::{ActorHandle, AggregateHandle, PhysScene, SceneKind, SceneWorld};
