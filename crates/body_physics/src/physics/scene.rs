//! Synchronous and asynchronous physics scenes
//!
//! Each [`SceneWorld`] owns an arena of rigid actors behind a reader/writer
//! lock, together with the per-scene bookkeeping bodies write into between
//! steps: kinematic targets and accumulated forces. Bodies hold RAII handles
//! ([`ActorHandle`], [`AggregateHandle`]) that release their actor or aggregate
//! when dropped.
//!
//! [`SceneWorld::step`] consumes the bookkeeping and integrates velocities. It
//! is not a constraint solver: there are no contacts.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::PhysicsConfig;
use crate::foundation::collections::{ActorKey, AggregateKey, HandleMap, SecondaryMap};
use crate::foundation::math::{Pose, Quat, Translation3, Vec3};
use super::actor::{ActorKind, MotionState, RigidActor};

/// Which of the two scenes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneKind {
    /// Stepped in lockstep with the game
    Sync,
    /// Stepped alongside the game, one frame behind
    Async,
}

/// Force and torque accumulated since the last step
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PendingForce {
    /// Force through the center of mass
    pub force: Vec3,
    /// Torque about the center of mass
    pub torque: Vec3,
}

/// A group of actors broad-phased as one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    /// Capacity
    pub max_size: usize,
    /// Members
    pub actors: Vec<ActorKey>,
}

/// Contents of one scene, guarded by the scene lock
#[derive(Debug, Default)]
pub struct SceneData {
    actors: HandleMap<ActorKey, RigidActor>,
    aggregates: HandleMap<AggregateKey, Aggregate>,
    kinematic_targets: SecondaryMap<ActorKey, Pose>,
    pending_forces: SecondaryMap<ActorKey, PendingForce>,
}

impl SceneData {
    /// Actor by key
    pub fn actor(&self, key: ActorKey) -> Option<&RigidActor> {
        self.actors.get(key)
    }

    /// Mutable actor by key
    pub fn actor_mut(&mut self, key: ActorKey) -> Option<&mut RigidActor> {
        self.actors.get_mut(key)
    }

    /// Number of live actors
    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Aggregate by key
    pub fn aggregate(&self, key: AggregateKey) -> Option<&Aggregate> {
        self.aggregates.get(key)
    }

    /// Number of live aggregates
    pub fn aggregate_count(&self) -> usize {
        self.aggregates.len()
    }

    /// Queue a kinematic target, replacing any earlier one
    pub fn set_kinematic_target(&mut self, key: ActorKey, target: Pose) {
        if self.actors.contains_key(key) {
            self.kinematic_targets.insert(key, target);
        }
    }

    /// Drop a queued kinematic target
    pub fn clear_kinematic_target(&mut self, key: ActorKey) {
        self.kinematic_targets.remove(key);
    }

    /// Queued kinematic target
    pub fn kinematic_target(&self, key: ActorKey) -> Option<&Pose> {
        self.kinematic_targets.get(key)
    }

    /// Accumulate force and torque until the next step
    pub fn add_force(&mut self, key: ActorKey, force: Vec3, torque: Vec3) {
        if !self.actors.contains_key(key) {
            return;
        }
        if let Some(pending) = self.pending_forces.entry(key) {
            let pending = pending.or_default();
            pending.force += force;
            pending.torque += torque;
        }
    }

    /// Force and torque accumulated so far
    pub fn pending_force(&self, key: ActorKey) -> Option<PendingForce> {
        self.pending_forces.get(key).copied()
    }

    fn insert_actor(&mut self, actor: RigidActor) -> ActorKey {
        self.actors.insert(actor)
    }

    fn remove_actor(&mut self, key: ActorKey) -> Option<RigidActor> {
        self.kinematic_targets.remove(key);
        self.pending_forces.remove(key);
        let actor = self.actors.remove(key)?;
        if let Some(aggregate) = actor.aggregate.and_then(|agg| self.aggregates.get_mut(agg)) {
            aggregate.actors.retain(|member| *member != key);
        }
        Some(actor)
    }

    fn add_to_aggregate(&mut self, aggregate_key: AggregateKey, actor_key: ActorKey) -> bool {
        let Some(aggregate) = self.aggregates.get_mut(aggregate_key) else {
            return false;
        };
        let Some(actor) = self.actors.get_mut(actor_key) else {
            return false;
        };
        if actor.aggregate == Some(aggregate_key) {
            return true;
        }
        if actor.aggregate.is_some() || aggregate.actors.len() >= aggregate.max_size {
            return false;
        }
        aggregate.actors.push(actor_key);
        actor.aggregate = Some(aggregate_key);
        true
    }

    fn remove_aggregate(&mut self, key: AggregateKey) {
        if let Some(aggregate) = self.aggregates.remove(key) {
            for member in aggregate.actors {
                if let Some(actor) = self.actors.get_mut(member) {
                    actor.aggregate = None;
                }
            }
        }
    }
}

/// One physics scene
#[derive(Debug)]
pub struct SceneWorld {
    kind: SceneKind,
    data: RwLock<SceneData>,
    config: Arc<PhysicsConfig>,
}

impl SceneWorld {
    /// Empty scene
    pub fn new(kind: SceneKind, config: Arc<PhysicsConfig>) -> Arc<Self> {
        Arc::new(Self {
            kind,
            data: RwLock::new(SceneData::default()),
            config,
        })
    }

    /// Which scene this is
    pub const fn kind(&self) -> SceneKind {
        self.kind
    }

    /// Shared read access. A poisoned lock is recovered rather than
    /// propagated.
    pub fn read(&self) -> RwLockReadGuard<'_, SceneData> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Exclusive write access
    pub fn write(&self) -> RwLockWriteGuard<'_, SceneData> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an actor; it lives until the handle is dropped
    pub fn add_actor(self: &Arc<Self>, actor: RigidActor) -> ActorHandle {
        let key = self.write().insert_actor(actor);
        ActorHandle {
            scene: Arc::clone(self),
            key,
        }
    }

    /// Create an aggregate with room for `max_size` actors
    pub fn create_aggregate(self: &Arc<Self>, max_size: usize) -> AggregateHandle {
        let key = self.write().aggregates.insert(Aggregate {
            max_size,
            actors: Vec::new(),
        });
        log::debug!("Created aggregate of size {} in {:?} scene", max_size, self.kind);
        AggregateHandle {
            scene: Arc::clone(self),
            key,
        }
    }

    /// Number of live actors
    pub fn actor_count(&self) -> usize {
        self.read().actor_count()
    }

    /// Advance every dynamic actor by `dt` seconds.
    ///
    /// Kinematic actors move to their queued target, or stop if none was
    /// queued. Simulated actors integrate accumulated forces and gravity, then
    /// damping and the angular speed cap, and may fall asleep once their
    /// mass-normalized kinetic energy stays under their threshold for the wake
    /// counter duration.
    pub fn step(&self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        let settings = self.config.settings();
        let gravity = settings.gravity;
        let wake_counter = settings.wake_counter_seconds;

        let mut guard = self.write();
        let SceneData {
            actors,
            kinematic_targets,
            pending_forces,
            ..
        } = &mut *guard;

        for (key, actor) in actors.iter_mut() {
            let pose = actor.pose;
            let ActorKind::Dynamic(body) = &mut actor.kind else {
                continue;
            };

            match body.motion {
                MotionState::KinematicTeleporting => {
                    kinematic_targets.remove(key);
                    body.motion = MotionState::KinematicTracking;
                }
                MotionState::KinematicTracking => match kinematic_targets.remove(key) {
                    Some(target) => {
                        body.linear_velocity = (target.translation.vector - pose.translation.vector) / dt;
                        let delta = target.rotation * pose.rotation.inverse();
                        body.angular_velocity = delta.scaled_axis() / dt;
                        actor.pose = target;
                    }
                    None => {
                        body.linear_velocity = Vec3::zeros();
                        body.angular_velocity = Vec3::zeros();
                    }
                },
                MotionState::Simulated => {
                    let pending = pending_forces.remove(key).unwrap_or_default();
                    let pushed = pending.force != Vec3::zeros() || pending.torque != Vec3::zeros();
                    if !body.awake {
                        if !pushed {
                            continue;
                        }
                        body.wake_up(wake_counter);
                    }

                    let inverse_mass = if body.mass > 0.0 { 1.0 / body.mass } else { 0.0 };
                    let mut acceleration = pending.force * inverse_mass;
                    if body.gravity_enabled {
                        acceleration += gravity;
                    }
                    body.linear_velocity += acceleration * dt;
                    body.angular_velocity += body.world_inverse_inertia(&pose.rotation) * pending.torque * dt;

                    body.linear_velocity *= 1.0 / (1.0 + dt * body.linear_damping);
                    body.angular_velocity *= 1.0 / (1.0 + dt * body.angular_damping);
                    body.clamp_angular_velocity();

                    // Rotate about the center of mass, not the actor origin
                    let com = body.center_of_mass;
                    let world_com = pose.transform_point(&com.into()).coords + body.linear_velocity * dt;
                    let rotation = Quat::from_scaled_axis(body.angular_velocity * dt) * pose.rotation;
                    let translation = world_com - rotation * com;
                    actor.pose = Pose::from_parts(Translation3::from(translation), rotation);

                    let energy = 0.5 * (body.linear_velocity.norm_squared() + body.angular_velocity.norm_squared());
                    if energy < body.sleep_threshold {
                        body.wake_counter -= dt;
                        if body.wake_counter <= 0.0 {
                            body.put_to_sleep();
                        }
                    } else {
                        body.wake_counter = wake_counter;
                    }
                }
            }
        }

        pending_forces.clear();
        log::trace!("Stepped {:?} scene by {dt}s", self.kind);
    }
}

/// Ownership of one actor in one scene; dropping it removes the actor
#[derive(Debug)]
pub struct ActorHandle {
    scene: Arc<SceneWorld>,
    key: ActorKey,
}

impl ActorHandle {
    /// Scene holding the actor
    pub fn scene(&self) -> &Arc<SceneWorld> {
        &self.scene
    }

    /// Actor key within its scene
    pub const fn key(&self) -> ActorKey {
        self.key
    }

    /// Kind of the scene holding the actor
    pub fn scene_kind(&self) -> SceneKind {
        self.scene.kind()
    }
}

impl Drop for ActorHandle {
    fn drop(&mut self) {
        if let Some(actor) = self.scene.write().remove_actor(self.key) {
            log::trace!("Released actor '{}' from {:?} scene", actor.debug_name, self.scene.kind());
        }
    }
}

/// Ownership of one aggregate; dropping it releases the aggregate
#[derive(Debug)]
pub struct AggregateHandle {
    scene: Arc<SceneWorld>,
    key: AggregateKey,
}

impl AggregateHandle {
    /// Scene holding the aggregate
    pub fn scene(&self) -> &Arc<SceneWorld> {
        &self.scene
    }

    /// Aggregate key within its scene
    pub const fn key(&self) -> AggregateKey {
        self.key
    }

    /// Add an actor living in the same scene. Returns false if the scenes
    /// differ, the aggregate is full or the actor already has another one.
    pub fn add_actor(&self, actor: &ActorHandle) -> bool {
        if !Arc::ptr_eq(&self.scene, actor.scene()) {
            return false;
        }
        self.scene.write().add_to_aggregate(self.key, actor.key())
    }

    /// Current member count
    pub fn len(&self) -> usize {
        self.scene.read().aggregate(self.key).map_or(0, |agg| agg.actors.len())
    }

    /// True when there are no members
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for AggregateHandle {
    fn drop(&mut self) {
        self.scene.write().remove_aggregate(self.key);
    }
}

/// The pair of scenes bodies register into
#[derive(Debug, Clone)]
pub struct PhysScene {
    sync: Arc<SceneWorld>,
    async_scene: Option<Arc<SceneWorld>>,
    config: Arc<PhysicsConfig>,
}

impl PhysScene {
    /// Create the sync scene, and the async one when the settings enable it
    pub fn new(config: Arc<PhysicsConfig>) -> Self {
        let sync = SceneWorld::new(SceneKind::Sync, Arc::clone(&config));
        let async_scene = config
            .settings()
            .enable_async_scene
            .then(|| SceneWorld::new(SceneKind::Async, Arc::clone(&config)));
        log::info!(
            "Created physics scene ({})",
            if async_scene.is_some() { "sync + async" } else { "sync only" }
        );
        Self {
            sync,
            async_scene,
            config,
        }
    }

    /// The synchronous scene
    pub const fn sync_scene(&self) -> &Arc<SceneWorld> {
        &self.sync
    }

    /// The asynchronous scene, when enabled
    pub const fn async_scene(&self) -> Option<&Arc<SceneWorld>> {
        self.async_scene.as_ref()
    }

    /// True when the asynchronous scene exists
    pub const fn has_async_scene(&self) -> bool {
        self.async_scene.is_some()
    }

    /// Scene by kind
    pub fn scene(&self, kind: SceneKind) -> Option<&Arc<SceneWorld>> {
        match kind {
            SceneKind::Sync => Some(&self.sync),
            SceneKind::Async => self.async_scene.as_ref(),
        }
    }

    /// Shared configuration
    pub const fn config(&self) -> &Arc<PhysicsConfig> {
        &self.config
    }

    /// Step both scenes
    pub fn step(&self, dt: f32) {
        self.sync.step(dt);
        if let Some(scene) = &self.async_scene {
            scene.step(dt);
        }
    }
}
