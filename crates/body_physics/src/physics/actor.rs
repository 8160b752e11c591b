//! Native rigid actors stored in a scene
//!
//! An actor is a pose plus a list of shapes. Dynamic actors additionally carry
//! mass, velocity and sleep state; static actors never move on their own.

use std::sync::Arc;

use crate::foundation::collections::AggregateKey;
use crate::foundation::math::{Mat3, Pose, Quat, Vec3};
use super::body_setup::{ShapeSource, ShapeTemplate};
use super::collision::{Aabb, ShapeGeometry, WorldSpaceShape};
use super::filter::{FilterData, ShapeFlags};
use super::material::PhysicalMaterial;

/// One collision shape attached to an actor
#[derive(Debug, Clone)]
pub struct Shape {
    /// Geometry in shape space
    pub geometry: ShapeGeometry,
    /// Pose relative to the actor
    pub local_pose: Pose,
    /// Template element this shape was built from
    pub source: ShapeSource,
    /// Filter data seen by queries
    pub query_filter: FilterData,
    /// Filter data seen by the simulation
    pub sim_filter: FilterData,
    /// Participation flags
    pub flags: ShapeFlags,
    /// Surface materials; one for simple shapes, one per slot for meshes
    pub materials: Vec<Arc<PhysicalMaterial>>,
}

impl Shape {
    /// Shape from a template, with no filter data yet
    pub fn from_template(template: ShapeTemplate, materials: Vec<Arc<PhysicalMaterial>>) -> Self {
        Self {
            geometry: template.geometry,
            local_pose: template.local_pose,
            source: template.source,
            query_filter: FilterData::default(),
            sim_filter: FilterData::default(),
            flags: ShapeFlags::VISUALIZATION,
            materials,
        }
    }

    /// World pose given the actor pose
    pub fn world_pose(&self, actor_pose: &Pose) -> Pose {
        actor_pose * self.local_pose
    }

    /// World-space geometry for a single test
    pub fn world_space(&self, actor_pose: &Pose) -> WorldSpaceShape {
        self.geometry.to_world_space(&self.world_pose(actor_pose))
    }

    /// Visible to scene queries
    pub fn is_query_shape(&self) -> bool {
        self.flags.contains(ShapeFlags::SCENE_QUERY_SHAPE)
    }

    /// Contributes to simulation and mass
    pub fn is_simulation_shape(&self) -> bool {
        self.flags.contains(ShapeFlags::SIMULATION_SHAPE)
    }

    /// Material at `face` for meshes, or the shape material
    pub fn material(&self, face: Option<usize>) -> Option<&Arc<PhysicalMaterial>> {
        let slot = match (&self.geometry, face) {
            (ShapeGeometry::TriangleMesh { mesh, .. }, Some(face)) => mesh.material_index(face),
            _ => 0,
        };
        self.materials.get(slot).or_else(|| self.materials.first())
    }

    fn memory_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.materials.len() * std::mem::size_of::<Arc<PhysicalMaterial>>()
    }
}

/// How a dynamic actor moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MotionState {
    /// Integrated by the scene
    Simulated,
    /// Moved toward kinematic targets at each step
    #[default]
    KinematicTracking,
    /// Teleported this frame; returns to tracking on the next step
    KinematicTeleporting,
}

impl MotionState {
    /// True for both kinematic states
    pub const fn is_kinematic(self) -> bool {
        !matches!(self, Self::Simulated)
    }
}

/// Dynamic state of a movable actor
#[derive(Debug, Clone, PartialEq)]
pub struct RigidDynamic {
    /// Mass
    pub mass: f32,
    /// Inertia about the center of mass, in actor space
    pub inertia: Mat3,
    /// Center of mass in actor space
    pub center_of_mass: Vec3,
    /// Linear velocity of the center of mass
    pub linear_velocity: Vec3,
    /// Angular velocity in rad/s
    pub angular_velocity: Vec3,
    /// Linear damping coefficient
    pub linear_damping: f32,
    /// Angular damping coefficient
    pub angular_damping: f32,
    /// Angular speed cap in rad/s
    pub max_angular_velocity: f32,
    /// Mass-normalized kinetic energy below which the actor may sleep
    pub sleep_threshold: f32,
    /// Seconds left before the actor may fall asleep
    pub wake_counter: f32,
    /// Actor is awake
    pub awake: bool,
    /// Kinematic or simulated
    pub motion: MotionState,
    /// Gravity applies while simulated
    pub gravity_enabled: bool,
    /// Continuous collision detection requested
    pub ccd: bool,
    /// Position solver iterations
    pub position_iterations: u8,
    /// Velocity solver iterations
    pub velocity_iterations: u8,
}

impl Default for RigidDynamic {
    fn default() -> Self {
        Self {
            mass: 1.0,
            inertia: Mat3::identity(),
            center_of_mass: Vec3::zeros(),
            linear_velocity: Vec3::zeros(),
            angular_velocity: Vec3::zeros(),
            linear_damping: 0.0,
            angular_damping: 0.05,
            max_angular_velocity: 100.0,
            sleep_threshold: 0.0,
            wake_counter: 0.0,
            awake: true,
            motion: MotionState::KinematicTracking,
            gravity_enabled: true,
            ccd: false,
            position_iterations: 8,
            velocity_iterations: 1,
        }
    }
}

impl RigidDynamic {
    /// Wake and reset the wake counter
    pub fn wake_up(&mut self, wake_counter: f32) {
        self.awake = true;
        self.wake_counter = self.wake_counter.max(wake_counter);
    }

    /// Sleep and zero both velocities
    pub fn put_to_sleep(&mut self) {
        self.awake = false;
        self.wake_counter = 0.0;
        self.linear_velocity = Vec3::zeros();
        self.angular_velocity = Vec3::zeros();
    }

    /// Inverse inertia in world space for the given actor rotation
    pub fn world_inverse_inertia(&self, rotation: &Quat) -> Mat3 {
        let r = rotation.to_rotation_matrix();
        let world = r.matrix() * self.inertia * r.matrix().transpose();
        world.try_inverse().unwrap_or_else(Mat3::zeros)
    }

    /// Inertia in world space for the given actor rotation
    pub fn world_inertia(&self, rotation: &Quat) -> Mat3 {
        let r = rotation.to_rotation_matrix();
        r.matrix() * self.inertia * r.matrix().transpose()
    }

    /// Clamp the angular speed to the cap
    pub fn clamp_angular_velocity(&mut self) {
        let speed = self.angular_velocity.norm();
        if self.max_angular_velocity > 0.0 && speed > self.max_angular_velocity {
            self.angular_velocity *= self.max_angular_velocity / speed;
        }
    }
}

/// Static or dynamic
#[derive(Debug, Clone, PartialEq)]
pub enum ActorKind {
    /// Never moves
    Static,
    /// Kinematic or simulated
    Dynamic(RigidDynamic),
}

/// A rigid actor in one scene
#[derive(Debug, Clone)]
pub struct RigidActor {
    /// World pose
    pub pose: Pose,
    /// Attached shapes
    pub shapes: Vec<Shape>,
    /// Static or dynamic state
    pub kind: ActorKind,
    /// Name used in logs
    pub debug_name: String,
    /// Aggregate this actor belongs to
    pub aggregate: Option<AggregateKey>,
}

impl RigidActor {
    /// Static actor without shapes
    pub fn new_static(pose: Pose, debug_name: impl Into<String>) -> Self {
        Self {
            pose,
            shapes: Vec::new(),
            kind: ActorKind::Static,
            debug_name: debug_name.into(),
            aggregate: None,
        }
    }

    /// Dynamic actor without shapes
    pub fn new_dynamic(pose: Pose, dynamic: RigidDynamic, debug_name: impl Into<String>) -> Self {
        Self {
            pose,
            shapes: Vec::new(),
            kind: ActorKind::Dynamic(dynamic),
            debug_name: debug_name.into(),
            aggregate: None,
        }
    }

    /// True for static actors
    pub const fn is_static(&self) -> bool {
        matches!(self.kind, ActorKind::Static)
    }

    /// Dynamic state, if any
    pub const fn dynamic(&self) -> Option<&RigidDynamic> {
        match &self.kind {
            ActorKind::Dynamic(dynamic) => Some(dynamic),
            ActorKind::Static => None,
        }
    }

    /// Mutable dynamic state, if any
    pub fn dynamic_mut(&mut self) -> Option<&mut RigidDynamic> {
        match &mut self.kind {
            ActorKind::Dynamic(dynamic) => Some(dynamic),
            ActorKind::Static => None,
        }
    }

    /// Dynamic state of a simulated actor
    pub fn simulated_mut(&mut self) -> Option<&mut RigidDynamic> {
        self.dynamic_mut().filter(|dynamic| dynamic.motion == MotionState::Simulated)
    }

    /// Center of mass in world space; the actor origin for static actors
    pub fn world_center_of_mass(&self) -> Vec3 {
        let local = self.dynamic().map_or_else(Vec3::zeros, |dynamic| dynamic.center_of_mass);
        self.pose.transform_point(&local.into()).coords
    }

    /// Bounds of every shape in world space
    pub fn bounds(&self) -> Aabb {
        let mut bounds = Aabb::empty();
        for shape in &self.shapes {
            bounds.merge(&shape.world_space(&self.pose).bounds());
        }
        bounds
    }

    /// Approximate bytes owned by this actor, excluding shared meshes
    pub fn memory_size(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.debug_name.capacity()
            + self.shapes.iter().map(Shape::memory_size).sum::<usize>()
    }
}
