//! Body instances
//!
//! A [`BodyInstance`] is the per-component runtime half of a rigid body. It
//! holds the collision and dynamics settings a designer edits, and once
//! [`init_body`](BodyInstance::init_body) succeeds it owns the native actor(s)
//! registered into the sync and/or async scene.
//!
//! The impl is split by concern:
//! - `collision`: responses, profiles and filter data
//! - `dynamics`: mass, damping, velocities, forces, sleep and scale
//! - `query`: traces, sweeps, overlaps and closest points against this body

mod collision;
mod dynamics;
mod query;

use std::sync::{Arc, Weak};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use collision::BodyCollisionSettings;
pub use dynamics::RadialFalloff;

use crate::config::PhysicsConfig;
use crate::foundation::collections::ActorKey;
use crate::foundation::math::{constants::KINDA_SMALL_NUMBER, utils, Transform, Vec3};
use super::actor::{MotionState, RigidActor, RigidDynamic, Shape};
use super::body_setup::{BodySetup, PhysicsType};
use super::collision::Aabb;
use super::collision_channel::{CollisionChannel, CollisionEnabled, CollisionResponseContainer};
use super::component::{BodyOwner, Mobility};
use super::material::PhysicalMaterial;
use super::scene::{ActorHandle, AggregateHandle, PhysScene, SceneData, SceneKind};

/// Sleep sensitivity of a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SleepFamily {
    /// Engine-wide sleep threshold
    #[default]
    Normal,
    /// Threshold divided by the sensitive divisor; sleeps only when nearly still
    Sensitive,
}

/// Where a body's actor(s) live
#[derive(Debug)]
pub enum SceneMembership {
    /// Static body; the async copy exists only when the async scene does
    StaticInBothScenes {
        /// Actor in the sync scene
        sync: ActorHandle,
        /// Copy in the async scene
        async_actor: Option<ActorHandle>,
    },
    /// Movable body in the sync scene
    DynamicInSync(ActorHandle),
    /// Movable body in the async scene
    DynamicInAsync(ActorHandle),
}

impl SceneMembership {
    /// Every handle, sync scene first
    pub fn handles(&self) -> impl Iterator<Item = &ActorHandle> {
        let (first, second) = match self {
            Self::StaticInBothScenes { sync, async_actor } => (sync, async_actor.as_ref()),
            Self::DynamicInSync(handle) | Self::DynamicInAsync(handle) => (handle, None),
        };
        std::iter::once(first).chain(second)
    }

    /// Handle queries read from
    pub const fn primary(&self) -> &ActorHandle {
        match self {
            Self::StaticInBothScenes { sync, .. } => sync,
            Self::DynamicInSync(handle) | Self::DynamicInAsync(handle) => handle,
        }
    }

    /// The movable body's handle
    pub const fn dynamic(&self) -> Option<&ActorHandle> {
        match self {
            Self::StaticInBothScenes { .. } => None,
            Self::DynamicInSync(handle) | Self::DynamicInAsync(handle) => Some(handle),
        }
    }

    /// True for static bodies
    pub const fn is_static(&self) -> bool {
        matches!(self, Self::StaticInBothScenes { .. })
    }
}

/// Reasons `init_body` leaves a body uninitialized
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BodyInitError {
    /// Some scale axis is nearly zero
    #[error("Body '{0}' has a nearly zero scale")]
    ZeroScale(String),

    /// Negative determinant but no mirrored geometry was generated
    #[error("Body '{0}' is mirrored but its setup has no mirrored collision")]
    MirroredGeometryMissing(String),

    /// Positive determinant but no normal geometry was generated
    #[error("Body '{0}' is not mirrored but its setup has no non-mirrored collision")]
    NonMirroredGeometryMissing(String),

    /// NaN somewhere in the transform
    #[error("Body '{0}' has a NaN transform")]
    NanTransform(String),

    /// `init_body` was already called
    #[error("Body '{0}' is already initialized")]
    AlreadyInitialized(String),

    /// Server-only body requested on a client
    #[error("Body '{0}' is server-only and cannot be created on a client")]
    WrongNetContext(String),

    /// The setup produced no valid shape
    #[error("Body '{0}' has no valid collision shapes")]
    NoShapes(String),
}

/// Reasons `update_body_scale` leaves the scale unchanged
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ScaleError {
    /// The body has no actor
    #[error("Body is not initialized")]
    Uninitialized,

    /// Nearly zero, infinite or NaN axis
    #[error("Invalid scale {0:?}")]
    InvalidScale([f32; 3]),

    /// Every shape failed to rescale
    #[error("No shape could be rescaled")]
    NothingRescaled,
}

/// Runtime rigid body of one component
#[derive(Debug)]
pub struct BodyInstance {
    collision_enabled: CollisionEnabled,
    object_type: CollisionChannel,
    collision_profile_name: Option<String>,
    responses: CollisionResponseContainer,

    /// Report rigid body contacts to the owner
    pub notify_rigid_body_collision: bool,
    /// Start awake; movable bodies with velocity wake regardless
    pub start_awake: bool,
    /// Request continuous collision detection
    pub use_ccd: bool,
    /// Register movable bodies in the async scene when it exists
    pub use_async_scene: bool,
    /// Recompute mass after `update_body_scale`
    pub update_mass_when_scale_changes: bool,
    /// Linear multiplier on the computed mass, clamped to [0.01, 100]
    pub mass_scale: f32,
    /// Offset added to the computed center of mass
    pub com_nudge: Vec3,
    /// Sleep sensitivity
    pub sleep_family: SleepFamily,
    /// Position solver iterations, clamped to 1..=255
    pub position_solver_iterations: u32,
    /// Velocity solver iterations, clamped to 1..=255
    pub velocity_solver_iterations: u32,
    /// Index of this body within a multi-body owner
    pub instance_body_index: u32,

    simulate_physics: bool,
    enable_gravity: bool,
    linear_damping: f32,
    angular_damping: f32,
    max_angular_velocity_override: Option<f32>,
    phys_material_override: Option<Arc<PhysicalMaterial>>,
    scale3d: Vec3,

    config: Arc<PhysicsConfig>,
    owner: Option<Weak<dyn BodyOwner>>,
    body_setup: Option<Arc<BodySetup>>,
    membership: Option<SceneMembership>,
    body_aggregate: Option<AggregateHandle>,
}

impl Default for BodyInstance {
    fn default() -> Self {
        Self::new(PhysicsConfig::shared())
    }
}

impl Drop for BodyInstance {
    fn drop(&mut self) {
        self.term_body();
    }
}

impl BodyInstance {
    /// Uninitialized body using `config` for profiles and settings
    pub fn new(config: Arc<PhysicsConfig>) -> Self {
        let settings = config.settings();
        Self {
            collision_enabled: CollisionEnabled::QueryAndPhysics,
            object_type: CollisionChannel::WORLD_STATIC,
            collision_profile_name: None,
            responses: *config.profiles().default_responses(),
            notify_rigid_body_collision: false,
            start_awake: true,
            use_ccd: false,
            use_async_scene: false,
            update_mass_when_scale_changes: false,
            mass_scale: 1.0,
            com_nudge: Vec3::zeros(),
            sleep_family: SleepFamily::Normal,
            position_solver_iterations: settings.position_solver_iterations,
            velocity_solver_iterations: settings.velocity_solver_iterations,
            instance_body_index: 0,
            simulate_physics: false,
            enable_gravity: true,
            linear_damping: 0.01,
            angular_damping: 0.0,
            max_angular_velocity_override: None,
            phys_material_override: None,
            scale3d: Vec3::new(1.0, 1.0, 1.0),
            config,
            owner: None,
            body_setup: None,
            membership: None,
            body_aggregate: None,
        }
    }

    /// Configuration this body reads profiles and settings from
    pub const fn config(&self) -> &Arc<PhysicsConfig> {
        &self.config
    }

    /// Create the native actor(s) for `setup` at `transform` and register them.
    ///
    /// Movable owners get a dynamic actor in exactly one scene; everything
    /// else (including bodies without an owner) is static and is registered
    /// in the sync scene plus the async scene when it exists. On error nothing
    /// is registered and the body stays uninitialized.
    pub fn init_body(
        &mut self,
        setup: Arc<BodySetup>,
        transform: &Transform,
        owner: Option<Arc<dyn BodyOwner>>,
        scene: &PhysScene,
        aggregate: Option<&AggregateHandle>,
    ) -> Result<(), BodyInitError> {
        let debug_name = match &owner {
            Some(owner) if !setup.name.is_empty() => format!("{}:{}", owner.path_name(), setup.name),
            Some(owner) => owner.path_name(),
            None => setup.name.clone(),
        };

        if let Err(err) = self.validate_init(&setup, transform, &debug_name) {
            log::warn!("init_body: {err}");
            return Err(err);
        }

        let is_static = owner.as_ref().map_or(true, |owner| owner.mobility() != Mobility::Movable);
        let templates = setup.shape_templates(&transform.scale);
        if templates.is_empty() {
            log::info!("init_body: no shapes created for '{debug_name}', body left uninitialized");
            return Err(BodyInitError::NoShapes(debug_name));
        }

        match setup.physics_type {
            PhysicsType::Simulated => self.simulate_physics = true,
            PhysicsType::Kinematic => self.simulate_physics = false,
            PhysicsType::Default => {}
        }

        let owner_ref = owner.as_deref();
        let simple_material = self.resolve_simple_material(owner_ref, Some(&setup));
        let complex_materials = complex_materials(owner_ref, &simple_material);
        let shapes: Vec<Shape> = templates
            .into_iter()
            .map(|template| {
                let materials = if template.geometry.is_triangle_mesh() {
                    complex_materials.clone()
                } else {
                    vec![Arc::clone(&simple_material)]
                };
                Shape::from_template(template, materials)
            })
            .collect();

        self.body_setup = Some(Arc::clone(&setup));
        self.owner = owner.as_ref().map(Arc::downgrade);
        self.scale3d = transform.scale;

        let pose = transform.pose();
        let membership = if is_static {
            let mut actor = RigidActor::new_static(pose, debug_name.as_str());
            actor.shapes = shapes;
            let async_actor = scene.async_scene().map(|async_scene| {
                let mut copy = actor.clone();
                self.apply_filter_data(&mut copy, SceneKind::Async, owner_ref);
                async_scene.add_actor(copy)
            });
            self.apply_filter_data(&mut actor, SceneKind::Sync, owner_ref);
            SceneMembership::StaticInBothScenes {
                sync: scene.sync_scene().add_actor(actor),
                async_actor,
            }
        } else {
            let dynamic = self.initial_dynamic_state(owner_ref);
            let mut actor = RigidActor::new_dynamic(pose, dynamic, debug_name.as_str());
            actor.shapes = shapes;
            let target_scene = match scene.async_scene() {
                Some(async_scene) if self.use_async_scene => async_scene,
                _ => scene.sync_scene(),
            };
            self.apply_filter_data(&mut actor, target_scene.kind(), owner_ref);
            self.apply_mass_properties(&mut actor);
            let handle = target_scene.add_actor(actor);
            match target_scene.kind() {
                SceneKind::Sync => SceneMembership::DynamicInSync(handle),
                SceneKind::Async => SceneMembership::DynamicInAsync(handle),
            }
        };

        if let Some(handle) = membership.dynamic() {
            self.join_aggregate(handle, aggregate);
        }
        self.membership = Some(membership);
        log::debug!("Initialized {} body '{debug_name}'", if is_static { "static" } else { "dynamic" });
        Ok(())
    }

    fn validate_init(&self, setup: &BodySetup, transform: &Transform, debug_name: &str) -> Result<(), BodyInitError> {
        let name = || debug_name.to_string();
        if transform.contains_nan() {
            return Err(BodyInitError::NanTransform(name()));
        }
        if transform.has_nearly_zero_scale(KINDA_SMALL_NUMBER) {
            return Err(BodyInitError::ZeroScale(name()));
        }
        if transform.determinant() < 0.0 {
            if !setup.generate_mirrored_collision {
                return Err(BodyInitError::MirroredGeometryMissing(name()));
            }
        } else if !setup.generate_non_mirrored_collision {
            return Err(BodyInitError::NonMirroredGeometryMissing(name()));
        }
        if self.membership.is_some() {
            return Err(BodyInitError::AlreadyInitialized(name()));
        }
        if setup.server_only && !self.config.settings().net_mode.allows_server_only_bodies() {
            return Err(BodyInitError::WrongNetContext(name()));
        }
        Ok(())
    }

    fn initial_dynamic_state(&self, owner: Option<&dyn BodyOwner>) -> RigidDynamic {
        let settings = self.config.settings();
        let mut sleep_threshold = settings.sleep_energy_threshold;
        if self.sleep_family == SleepFamily::Sensitive {
            sleep_threshold /= settings.sensitive_sleep_divisor;
        }
        let clamp_iterations = |n: u32| u8::try_from(n.clamp(1, 255)).unwrap_or(u8::MAX);

        let mut dynamic = RigidDynamic {
            linear_damping: self.linear_damping,
            angular_damping: self.angular_damping,
            max_angular_velocity: utils::deg_to_rad(self.max_angular_velocity()),
            sleep_threshold,
            wake_counter: settings.wake_counter_seconds,
            motion: if self.simulate_physics {
                MotionState::Simulated
            } else {
                MotionState::KinematicTracking
            },
            gravity_enabled: self.enable_gravity,
            ccd: self.use_ccd,
            position_iterations: clamp_iterations(self.position_solver_iterations),
            velocity_iterations: clamp_iterations(self.velocity_solver_iterations),
            ..RigidDynamic::default()
        };

        let owner_velocity = owner.map_or_else(Vec3::zeros, |owner| owner.velocity());
        if self.simulate_physics {
            dynamic.linear_velocity = owner_velocity;
        }
        let parent_awake = owner
            .and_then(|owner| owner.parent_body_settings())
            .map_or(true, |parent| parent.start_awake);
        let awake = (self.start_awake && parent_awake) || owner_velocity.norm() > KINDA_SMALL_NUMBER;
        if !awake {
            dynamic.put_to_sleep();
        }
        dynamic
    }

    fn join_aggregate(&mut self, handle: &ActorHandle, aggregate: Option<&AggregateHandle>) {
        if let Some(aggregate) = aggregate {
            if Arc::ptr_eq(aggregate.scene(), handle.scene()) {
                if !aggregate.add_actor(handle) {
                    log::warn!("Aggregate is full; body added to the scene on its own");
                }
                return;
            }
            log::debug!("Supplied aggregate lives in another scene; ignoring it");
        }

        let settings = self.config.settings();
        let shape_count = handle.scene().read().actor(handle.key()).map_or(0, |actor| actor.shapes.len());
        if shape_count > settings.aggregate_shapes_threshold {
            let own = handle.scene().create_aggregate(settings.aggregate_max_size);
            own.add_actor(handle);
            self.body_aggregate = Some(own);
        }
    }

    /// Release the actor(s) and aggregate and forget the owner. Safe to call
    /// repeatedly and on a body that never initialized.
    pub fn term_body(&mut self) {
        if let Some(membership) = self.membership.take() {
            log::trace!("Terminating body '{}'", self.body_debug_name_of(&membership));
        }
        self.body_aggregate = None;
        self.owner = None;
        self.body_setup = None;
    }

    /// True once `init_body` succeeded and until `term_body`
    pub const fn is_valid_body_instance(&self) -> bool {
        self.membership.is_some()
    }

    /// Scene membership, when initialized
    pub const fn membership(&self) -> Option<&SceneMembership> {
        self.membership.as_ref()
    }

    /// Aggregate created by this body for its many shapes
    pub const fn body_aggregate(&self) -> Option<&AggregateHandle> {
        self.body_aggregate.as_ref()
    }

    /// Template the shapes were built from
    pub const fn body_setup(&self) -> Option<&Arc<BodySetup>> {
        self.body_setup.as_ref()
    }

    /// Owning component, while it is alive
    pub fn owner(&self) -> Option<Arc<dyn BodyOwner>> {
        self.owner.as_ref()?.upgrade()
    }

    /// Scale the shapes were built for
    pub const fn scale3d(&self) -> Vec3 {
        self.scale3d
    }

    /// True for bodies with a movable actor
    pub fn is_dynamic(&self) -> bool {
        self.membership.as_ref().is_some_and(|m| !m.is_static())
    }

    /// True when the simulation, not the owner, drives this body
    pub fn is_instance_simulating_physics(&self) -> bool {
        self.read_actor(|actor| actor.dynamic().is_some_and(|d| d.motion == MotionState::Simulated))
            .unwrap_or(false)
    }

    /// Switch between simulated and kinematic motion
    pub fn set_instance_simulate_physics(&mut self, simulate: bool) {
        if simulate {
            let Some(membership) = &self.membership else {
                log::warn!("Simulating physics on '{}' but it has no physics actor", self.body_debug_name());
                self.simulate_physics = true;
                return;
            };
            if membership.is_static() {
                log::warn!(
                    "Cannot simulate physics on '{}': the owner is not movable",
                    self.body_debug_name()
                );
                return;
            }
        }
        self.simulate_physics = simulate;

        let wake_counter = self.config.settings().wake_counter_seconds;
        self.write_dynamic(|data, key| {
            data.clear_kinematic_target(key);
            if let Some(dynamic) = data.actor_mut(key).and_then(RigidActor::dynamic_mut) {
                if simulate {
                    dynamic.motion = MotionState::Simulated;
                    dynamic.wake_up(wake_counter);
                } else {
                    dynamic.motion = MotionState::KinematicTracking;
                }
            }
        });
    }

    /// Pose plus the body's scale
    pub fn world_transform(&self) -> Option<Transform> {
        self.read_actor(|actor| Transform::from_pose(&actor.pose, self.scale3d))
    }

    /// Move the body.
    ///
    /// Simulated bodies move at once. Kinematic bodies queue a target for the
    /// next step unless `teleport` is set, in which case they move at once and
    /// stay put for that step. Static bodies are moved with a warning.
    pub fn set_body_transform(&self, transform: &Transform, teleport: bool) {
        let Some(membership) = &self.membership else {
            return;
        };
        if transform.contains_nan() {
            log::warn!("set_body_transform: NaN transform for '{}'", self.body_debug_name());
            return;
        }
        let pose = transform.pose();

        if membership.is_static() {
            let unchanged = self.read_actor(|actor| actor.pose == pose).unwrap_or(true);
            if unchanged {
                return;
            }
            log::warn!("Moving static body '{}' at runtime", self.body_debug_name());
            self.write_actors(|_, actor| actor.pose = pose);
            return;
        }

        self.write_dynamic(|data, key| {
            let (motion, current) = match data.actor(key) {
                Some(actor) => (actor.dynamic().map(|d| d.motion), actor.pose),
                None => return,
            };
            if current == pose && data.kinematic_target(key).is_none() {
                return;
            }
            match motion {
                Some(MotionState::Simulated) | None => {
                    if let Some(actor) = data.actor_mut(key) {
                        actor.pose = pose;
                    }
                }
                Some(_) if teleport => {
                    data.clear_kinematic_target(key);
                    if let Some(actor) = data.actor_mut(key) {
                        actor.pose = pose;
                        if let Some(dynamic) = actor.dynamic_mut() {
                            dynamic.motion = MotionState::KinematicTeleporting;
                        }
                    }
                }
                Some(_) => data.set_kinematic_target(key, pose),
            }
        });
    }

    /// Center of mass in world space, or zero when uninitialized
    pub fn com_position(&self) -> Vec3 {
        self.read_actor(RigidActor::world_center_of_mass).unwrap_or_else(Vec3::zeros)
    }

    /// Mass of a dynamic body, zero otherwise
    pub fn body_mass(&self) -> f32 {
        self.read_actor(|actor| actor.dynamic().map_or(0.0, |d| d.mass)).unwrap_or(0.0)
    }

    /// World-space bounds of every shape
    pub fn body_bounds(&self) -> Aabb {
        self.read_actor(RigidActor::bounds).unwrap_or_else(Aabb::empty)
    }

    /// Owner path plus setup name, used in logs
    pub fn body_debug_name(&self) -> String {
        match &self.membership {
            Some(membership) => self.body_debug_name_of(membership),
            None => self.body_setup.as_ref().map(|setup| setup.name.clone()).unwrap_or_default(),
        }
    }

    fn body_debug_name_of(&self, membership: &SceneMembership) -> String {
        let handle = membership.primary();
        handle
            .scene()
            .read()
            .actor(handle.key())
            .map(|actor| actor.debug_name.clone())
            .unwrap_or_default()
    }

    /// Material simple shapes use: body override, then owner override, then
    /// setup material, then the first render material, then the default
    pub fn simple_physical_material(&self) -> Arc<PhysicalMaterial> {
        let owner = self.owner();
        self.resolve_simple_material(owner.as_deref(), self.body_setup.as_deref())
    }

    fn resolve_simple_material(&self, owner: Option<&dyn BodyOwner>, setup: Option<&BodySetup>) -> Arc<PhysicalMaterial> {
        self.phys_material_override
            .clone()
            .or_else(|| owner.and_then(|owner| owner.phys_material_override()))
            .or_else(|| setup.and_then(|setup| setup.phys_material.clone()))
            .or_else(|| owner.and_then(|owner| owner.render_phys_materials().into_iter().next()))
            .unwrap_or_else(|| Arc::clone(self.config.default_material()))
    }

    /// Body-level material override
    pub const fn phys_material_override(&self) -> Option<&Arc<PhysicalMaterial>> {
        self.phys_material_override.as_ref()
    }

    /// Replace the body-level material and re-apply materials to every shape
    pub fn set_phys_material_override(&mut self, material: Option<Arc<PhysicalMaterial>>) {
        self.phys_material_override = material;
        self.update_materials();
    }

    fn update_materials(&self) {
        if self.membership.is_none() {
            return;
        }
        let owner = self.owner();
        let simple = self.resolve_simple_material(owner.as_deref(), self.body_setup.as_deref());
        let complex = complex_materials(owner.as_deref(), &simple);
        self.write_actors(|_, actor| {
            for shape in &mut actor.shapes {
                shape.materials = if shape.geometry.is_triangle_mesh() {
                    complex.clone()
                } else {
                    vec![Arc::clone(&simple)]
                };
            }
        });
        self.update_mass_properties();
    }

    /// Approximate bytes held by the native actor(s), excluding shared meshes
    pub fn body_instance_resource_size(&self) -> usize {
        self.membership.as_ref().map_or(0, |membership| {
            membership
                .handles()
                .map(|handle| handle.scene().read().actor(handle.key()).map_or(0, RigidActor::memory_size))
                .sum()
        })
    }

    /// Copy every designer-facing setting from `other`; runtime state is kept.
    /// Filters, damping and mass are refreshed when this body is live.
    pub fn copy_body_instance_properties_from(&mut self, other: &Self) {
        self.collision_enabled = other.collision_enabled;
        self.object_type = other.object_type;
        self.collision_profile_name.clone_from(&other.collision_profile_name);
        self.responses = other.responses;
        self.notify_rigid_body_collision = other.notify_rigid_body_collision;
        self.start_awake = other.start_awake;
        self.use_ccd = other.use_ccd;
        self.use_async_scene = other.use_async_scene;
        self.update_mass_when_scale_changes = other.update_mass_when_scale_changes;
        self.mass_scale = other.mass_scale;
        self.com_nudge = other.com_nudge;
        self.sleep_family = other.sleep_family;
        self.position_solver_iterations = other.position_solver_iterations;
        self.velocity_solver_iterations = other.velocity_solver_iterations;
        self.simulate_physics = other.simulate_physics;
        self.enable_gravity = other.enable_gravity;
        self.linear_damping = other.linear_damping;
        self.angular_damping = other.angular_damping;
        self.max_angular_velocity_override = other.max_angular_velocity_override;
        self.phys_material_override.clone_from(&other.phys_material_override);

        if self.membership.is_some() {
            self.update_physics_filter_data();
            self.update_damping_properties();
            self.update_materials();
        }
    }

    /// Run `f` on the primary actor under its scene's read lock
    fn read_actor<R>(&self, f: impl FnOnce(&RigidActor) -> R) -> Option<R> {
        let handle = self.membership.as_ref()?.primary();
        let data = handle.scene().read();
        data.actor(handle.key()).map(f)
    }

    /// Run `f` on every actor of this body. All write locks are taken up
    /// front, sync scene first, and held until every actor has been visited.
    fn write_actors(&self, mut f: impl FnMut(SceneKind, &mut RigidActor)) {
        let Some(membership) = &self.membership else {
            return;
        };
        let handles: Vec<&ActorHandle> = membership.handles().collect();
        let mut guards: Vec<_> = handles.iter().map(|handle| handle.scene().write()).collect();
        for (handle, data) in handles.iter().zip(guards.iter_mut()) {
            if let Some(actor) = data.actor_mut(handle.key()) {
                f(handle.scene_kind(), actor);
            }
        }
    }

    /// Run `f` on the scene holding a movable body, under its write lock
    fn write_dynamic<R>(&self, f: impl FnOnce(&mut SceneData, ActorKey) -> R) -> Option<R> {
        let handle = self.membership.as_ref()?.dynamic()?;
        let mut data = handle.scene().write();
        Some(f(&mut data, handle.key()))
    }
}

fn complex_materials(owner: Option<&dyn BodyOwner>, simple: &Arc<PhysicalMaterial>) -> Vec<Arc<PhysicalMaterial>> {
    let render = owner.map(|owner| owner.render_phys_materials()).unwrap_or_default();
    if render.is_empty() {
        vec![Arc::clone(simple)]
    } else {
        render
    }
}
