//! The owning component a body instance is attached to
//!
//! Bodies keep only a weak reference to their owner. The owner supplies the
//! world transform, mobility and identity used for filtering, plus the
//! optional material overrides that feed the physical-material chain.

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::foundation::math::{Transform, Vec3};
use super::collision_channel::CollisionResponseContainer;
use super::material::PhysicalMaterial;

/// Whether the owner may move at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mobility {
    /// Never moves
    #[default]
    Static,
    /// Never moves, but may change other state
    Stationary,
    /// Moves; gets a dynamic actor
    Movable,
}

/// Settings a multi-body owner (for example a ragdoll) imposes on each body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentBodySettings {
    /// Per-body responses are clamped to these
    pub responses: CollisionResponseContainer,
    /// Bodies start awake only if the owner does too
    pub start_awake: bool,
}

/// What a body needs from the component that owns it
pub trait BodyOwner: Send + Sync {
    /// Current world transform, including scale
    fn world_transform(&self) -> Transform;

    /// Mobility of the owner
    fn mobility(&self) -> Mobility;

    /// Actor-level collision switch; `false` disables all collision
    fn is_actor_collision_enabled(&self) -> bool {
        true
    }

    /// Linear velocity of the owner, handed to newly simulated bodies
    fn velocity(&self) -> Vec3 {
        Vec3::zeros()
    }

    /// Id written into filter data and hits
    fn component_id(&self) -> u64;

    /// Id of the actor that owns the component
    fn actor_id(&self) -> u64 {
        0
    }

    /// Human-readable path used in logs
    fn path_name(&self) -> String;

    /// Component-level physical material override
    fn phys_material_override(&self) -> Option<Arc<PhysicalMaterial>> {
        None
    }

    /// Physical materials of the render material slots, in slot order
    fn render_phys_materials(&self) -> Vec<Arc<PhysicalMaterial>> {
        Vec::new()
    }

    /// Present when the owner drives several bodies
    fn parent_body_settings(&self) -> Option<ParentBodySettings> {
        None
    }
}

#[derive(Debug, Clone)]
struct OwnerState {
    transform: Transform,
    velocity: Vec3,
    collision_enabled: bool,
    material_override: Option<Arc<PhysicalMaterial>>,
    render_materials: Vec<Arc<PhysicalMaterial>>,
}

/// Plain owner with interior mutability, for tools and tests
#[derive(Debug)]
pub struct OwnerComponent {
    id: u64,
    actor_id: u64,
    name: String,
    mobility: Mobility,
    parent: Option<ParentBodySettings>,
    state: RwLock<OwnerState>,
}

impl OwnerComponent {
    /// Owner with an identity transform
    pub fn new(id: u64, name: impl Into<String>, mobility: Mobility) -> Self {
        Self {
            id,
            actor_id: id,
            name: name.into(),
            mobility,
            parent: None,
            state: RwLock::new(OwnerState {
                transform: Transform::identity(),
                velocity: Vec3::zeros(),
                collision_enabled: true,
                material_override: None,
                render_materials: Vec::new(),
            }),
        }
    }

    /// Builder-style actor id
    #[must_use]
    pub fn with_actor_id(mut self, actor_id: u64) -> Self {
        self.actor_id = actor_id;
        self
    }

    /// Builder-style multi-body parent settings
    #[must_use]
    pub fn with_parent(mut self, parent: ParentBodySettings) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Builder-style transform
    #[must_use]
    pub fn with_transform(self, transform: Transform) -> Self {
        self.set_transform(transform);
        self
    }

    /// Share as a trait object
    pub fn into_shared(self) -> Arc<dyn BodyOwner> {
        Arc::new(self)
    }

    /// Move the owner
    pub fn set_transform(&self, transform: Transform) {
        self.state.write().unwrap_or_else(PoisonError::into_inner).transform = transform;
    }

    /// Set the owner's velocity
    pub fn set_velocity(&self, velocity: Vec3) {
        self.state.write().unwrap_or_else(PoisonError::into_inner).velocity = velocity;
    }

    /// Toggle actor-level collision
    pub fn set_actor_collision_enabled(&self, enabled: bool) {
        self.state.write().unwrap_or_else(PoisonError::into_inner).collision_enabled = enabled;
    }

    /// Set the component material override
    pub fn set_material_override(&self, material: Option<Arc<PhysicalMaterial>>) {
        self.state.write().unwrap_or_else(PoisonError::into_inner).material_override = material;
    }

    /// Set the render slot materials
    pub fn set_render_materials(&self, materials: Vec<Arc<PhysicalMaterial>>) {
        self.state.write().unwrap_or_else(PoisonError::into_inner).render_materials = materials;
    }

    fn state(&self) -> OwnerState {
        self.state.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl BodyOwner for OwnerComponent {
    fn world_transform(&self) -> Transform {
        self.state().transform
    }

    fn mobility(&self) -> Mobility {
        self.mobility
    }

    fn is_actor_collision_enabled(&self) -> bool {
        self.state().collision_enabled
    }

    fn velocity(&self) -> Vec3 {
        self.state().velocity
    }

    fn component_id(&self) -> u64 {
        self.id
    }

    fn actor_id(&self) -> u64 {
        self.actor_id
    }

    fn path_name(&self) -> String {
        self.name.clone()
    }

    fn phys_material_override(&self) -> Option<Arc<PhysicalMaterial>> {
        self.state().material_override
    }

    fn render_phys_materials(&self) -> Vec<Arc<PhysicalMaterial>> {
        self.state().render_materials
    }

    fn parent_body_settings(&self) -> Option<ParentBodySettings> {
        self.parent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_state_is_shared_through_trait_object() {
        let owner = Arc::new(OwnerComponent::new(3, "Crate_1", Mobility::Movable).with_actor_id(30));
        let shared: Arc<dyn BodyOwner> = owner.clone();

        owner.set_velocity(Vec3::new(1.0, 0.0, 0.0));
        owner.set_actor_collision_enabled(false);

        assert_eq!(shared.component_id(), 3);
        assert_eq!(shared.actor_id(), 30);
        assert_eq!(shared.velocity(), Vec3::new(1.0, 0.0, 0.0));
        assert!(!shared.is_actor_collision_enabled());
        assert!(shared.parent_body_settings().is_none());
    }
}
