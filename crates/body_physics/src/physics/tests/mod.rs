//! Behavior tests that cross module boundaries: bodies registered into real
//! scenes, queried, pushed and stepped.

mod dynamics;
mod queries;

use std::sync::Arc;

use crate::config::{PhysicsConfig, PhysicsSettings};
use crate::foundation::math::{Transform, Vec3};
use crate::physics::actor::RigidActor;
use crate::physics::body_instance::BodyInstance;
use crate::physics::body_setup::BodySetup;
use crate::physics::component::{BodyOwner, Mobility, OwnerComponent};
use crate::physics::filter::FilterData;
use crate::physics::material::PhysicalMaterial;
use crate::physics::profile::CollisionProfileTable;
use crate::physics::scene::PendingForce;

/// Config with or without the async scene and the built-in profiles
fn config(async_scene: bool) -> Arc<PhysicsConfig> {
    let settings = PhysicsSettings::default().with_async_scene(async_scene);
    Arc::new(PhysicsConfig::new(settings, &CollisionProfileTable::default()))
}

/// Sync-only config whose bodies never fall asleep on their own
fn restless_config() -> Arc<PhysicsConfig> {
    let settings = PhysicsSettings {
        sleep_energy_threshold: 0.0,
        ..PhysicsSettings::default()
    }
    .with_async_scene(false);
    Arc::new(PhysicsConfig::new(settings, &CollisionProfileTable::default()))
}

/// Owner kept alive by the test; the body only holds a weak reference
fn owner(id: u64, mobility: Mobility) -> Arc<OwnerComponent> {
    Arc::new(OwnerComponent::new(id, format!("Owner_{id}"), mobility))
}

fn shared(owner: &Arc<OwnerComponent>) -> Option<Arc<dyn BodyOwner>> {
    let owner: Arc<dyn BodyOwner> = owner.clone();
    Some(owner)
}

/// Material whose mass is not curved, so expected masses are plain volume × density
fn linear_material() -> Arc<PhysicalMaterial> {
    Arc::new(PhysicalMaterial::new("Linear", 1.0).with_raise_mass_to_power(1.0))
}

/// Cube of the given half size centered on the body origin
fn box_setup(name: &str, half: f32) -> Arc<BodySetup> {
    Arc::new(
        BodySetup::new(name)
            .with_box(Vec3::zeros(), Vec3::new(half, half, half))
            .with_material(linear_material()),
    )
}

fn at(x: f32, y: f32, z: f32) -> Transform {
    Transform::from_position(Vec3::new(x, y, z))
}

/// Run `f` on the body's primary actor
fn with_actor<R>(body: &BodyInstance, f: impl FnOnce(&RigidActor) -> R) -> Option<R> {
    let handle = body.membership()?.primary();
    let data = handle.scene().read();
    data.actor(handle.key()).map(f)
}

/// Query filter of the first shape
fn first_query_filter(body: &BodyInstance) -> Option<FilterData> {
    with_actor(body, |actor| actor.shapes.first().map(|shape| shape.query_filter)).flatten()
}

fn pending_force(body: &BodyInstance) -> Option<PendingForce> {
    let handle = body.membership()?.primary();
    handle.scene().read().pending_force(handle.key())
}
