//! Dynamics tests: mass, scale, kinematic targets, forces and sleep
//!
//! Bodies are stepped through their scene so that queued targets and
//! accumulated forces are observed the way the simulation consumes them.

use super::{at, box_setup, config, owner, pending_force, restless_config, shared, with_actor};
use crate::foundation::math::{Quat, Transform, Vec3};
use crate::physics::actor::MotionState;
use crate::physics::body_instance::{BodyInstance, RadialFalloff, ScaleError};
use crate::physics::body_setup::BodySetup;
use crate::physics::collision::CollisionShape;
use crate::physics::component::{Mobility, OwnerComponent};
use crate::physics::material::PhysicalMaterial;
use crate::physics::scene::PhysScene;
use approx::assert_relative_eq;
use std::sync::Arc;

/// Movable 20 cm cube of unit density weighing 8 kg
fn movable_crate(scene: &PhysScene, owner: &Arc<OwnerComponent>, simulate: bool) -> BodyInstance {
    let mut body = BodyInstance::new(Arc::clone(scene.config()));
    body.set_instance_simulate_physics(simulate);
    body.init_body(box_setup("Crate", 10.0), &Transform::identity(), shared(owner), scene, None)
        .unwrap();
    body
}

fn motion(body: &BodyInstance) -> Option<MotionState> {
    with_actor(body, |actor| actor.dynamic().map(|dynamic| dynamic.motion)).flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mass_follows_density_and_mass_scale() {
        let scene = PhysScene::new(config(false));
        let component = owner(1, Mobility::Movable);

        let plain = movable_crate(&scene, &component, true);
        assert_relative_eq!(plain.body_mass(), 8.0, epsilon = 1e-4);

        let mut heavy = BodyInstance::new(Arc::clone(scene.config()));
        heavy.mass_scale = 2.0;
        heavy
            .init_body(box_setup("Crate", 10.0), &Transform::identity(), shared(&component), &scene, None)
            .unwrap();
        assert_relative_eq!(heavy.body_mass(), 16.0, epsilon = 1e-4);
    }

    #[test]
    fn test_mass_power_curve() {
        let scene = PhysScene::new(config(false));
        let component = owner(1, Mobility::Movable);
        let curved = Arc::new(PhysicalMaterial::new("Curved", 1.0).with_raise_mass_to_power(0.75));
        let setup = Arc::new(
            BodySetup::new("Crate")
                .with_box(Vec3::zeros(), Vec3::new(10.0, 10.0, 10.0))
                .with_material(curved),
        );

        let mut body = BodyInstance::new(Arc::clone(scene.config()));
        body.init_body(setup, &Transform::identity(), shared(&component), &scene, None)
            .unwrap();

        assert_relative_eq!(body.body_mass(), 8.0_f32.powf(0.75), epsilon = 1e-4);
    }

    #[test]
    fn test_material_override_recomputes_mass() {
        let scene = PhysScene::new(config(false));
        let component = owner(1, Mobility::Movable);
        let mut body = movable_crate(&scene, &component, true);

        let lead = Arc::new(PhysicalMaterial::new("Lead", 11.0).with_raise_mass_to_power(1.0));
        body.set_phys_material_override(Some(lead));

        assert_eq!(body.simple_physical_material().name, "Lead");
        assert_relative_eq!(body.body_mass(), 88.0, epsilon = 1e-3);
    }

    #[test]
    fn test_update_body_scale_is_idempotent() {
        let scene = PhysScene::new(config(false));
        let mut body = BodyInstance::new(Arc::clone(scene.config()));
        body.init_body(box_setup("Crate", 10.0), &Transform::identity(), None, &scene, None)
            .unwrap();

        assert_eq!(body.update_body_scale(Vec3::new(2.0, 2.0, 2.0)), Ok(true));
        assert_eq!(body.update_body_scale(Vec3::new(2.0, 2.0, 2.0)), Ok(false));

        let bounds = body.body_bounds();
        assert_relative_eq!(bounds.max, Vec3::new(20.0, 20.0, 20.0), epsilon = 1e-4);
        assert_eq!(body.scale3d(), Vec3::new(2.0, 2.0, 2.0));
    }

    #[test]
    fn test_zero_scale_component_is_rejected() {
        let scene = PhysScene::new(config(false));
        let mut body = BodyInstance::new(Arc::clone(scene.config()));
        assert_eq!(body.update_body_scale(Vec3::new(2.0, 2.0, 2.0)), Err(ScaleError::Uninitialized));

        body.init_body(box_setup("Crate", 10.0), &Transform::identity(), None, &scene, None)
            .unwrap();

        let result = body.update_body_scale(Vec3::new(0.0, 1.0, 1.0));
        assert_eq!(result, Err(ScaleError::InvalidScale([0.0, 1.0, 1.0])));
        assert_eq!(body.scale3d(), Vec3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(body.body_bounds().max, Vec3::new(10.0, 10.0, 10.0), epsilon = 1e-4);
    }

    #[test]
    fn test_rescale_updates_mass_on_request() {
        let scene = PhysScene::new(config(false));
        let component = owner(1, Mobility::Movable);
        let mut body = BodyInstance::new(Arc::clone(scene.config()));
        body.update_mass_when_scale_changes = true;
        body.init_body(box_setup("Crate", 10.0), &Transform::identity(), shared(&component), &scene, None)
            .unwrap();

        body.update_body_scale(Vec3::new(2.0, 2.0, 2.0)).unwrap();

        assert_relative_eq!(body.body_mass(), 64.0, epsilon = 1e-3);
    }

    #[test]
    fn test_mirrored_rescale_matches_fresh_init() {
        let scene = PhysScene::new(config(false));
        let component = owner(1, Mobility::Movable);
        let setup = Arc::new(BodySetup::new("Knob").with_sphere(Vec3::new(20.0, 0.0, 0.0), 5.0));
        let mirrored = Vec3::new(-1.0, 1.0, 1.0);
        let probe = CollisionShape::make_sphere(1.0);
        let left = Vec3::new(-20.0, 0.0, 0.0);
        let right = Vec3::new(20.0, 0.0, 0.0);

        let mut rescaled = BodyInstance::new(Arc::clone(scene.config()));
        rescaled
            .init_body(Arc::clone(&setup), &Transform::identity(), shared(&component), &scene, None)
            .unwrap();
        assert_eq!(rescaled.update_body_scale(mirrored), Ok(true));

        let mut fresh = BodyInstance::new(Arc::clone(scene.config()));
        fresh
            .init_body(setup, &Transform::identity().with_scale(mirrored), shared(&component), &scene, None)
            .unwrap();

        for body in [&rescaled, &fresh] {
            assert!(body.overlap_test(&left, &Quat::identity(), &probe));
            assert!(!body.overlap_test(&right, &Quat::identity(), &probe));
        }
    }

    #[test]
    fn test_kinematic_target_applies_on_step() {
        let scene = PhysScene::new(config(false));
        let component = owner(1, Mobility::Movable);
        let body = movable_crate(&scene, &component, false);
        assert_eq!(motion(&body), Some(MotionState::KinematicTracking));

        body.set_body_transform(&at(100.0, 0.0, 0.0), false);
        assert_relative_eq!(body.world_transform().unwrap().position, Vec3::zeros());

        scene.step(0.1);

        assert_relative_eq!(body.world_transform().unwrap().position, Vec3::new(100.0, 0.0, 0.0), epsilon = 1e-3);
        assert_relative_eq!(body.linear_velocity(), Vec3::new(1000.0, 0.0, 0.0), epsilon = 1e-2);
    }

    #[test]
    fn test_teleport_moves_at_once_and_resumes_tracking() {
        let scene = PhysScene::new(config(false));
        let component = owner(1, Mobility::Movable);
        let body = movable_crate(&scene, &component, false);

        body.set_body_transform(&at(0.0, 300.0, 0.0), true);

        assert_relative_eq!(body.world_transform().unwrap().position, Vec3::new(0.0, 300.0, 0.0));
        assert_eq!(motion(&body), Some(MotionState::KinematicTeleporting));

        scene.step(0.1);

        assert_relative_eq!(body.world_transform().unwrap().position, Vec3::new(0.0, 300.0, 0.0));
        assert_eq!(motion(&body), Some(MotionState::KinematicTracking));
    }

    #[test]
    fn test_forces_accumulate_until_step() {
        // A half-second step at 10 m/s would otherwise put the crate to sleep
        let scene = PhysScene::new(restless_config());
        let component = owner(1, Mobility::Movable);
        let mut body = movable_crate(&scene, &component, true);
        body.set_enable_gravity(false);
        body.set_linear_damping(0.0);

        body.add_force(Vec3::new(80.0, 0.0, 0.0), false);
        body.add_force(Vec3::new(80.0, 0.0, 0.0), false);
        assert_relative_eq!(pending_force(&body).unwrap().force, Vec3::new(160.0, 0.0, 0.0));

        scene.step(0.5);
        assert!(pending_force(&body).is_none());
        assert_relative_eq!(body.linear_velocity(), Vec3::new(10.0, 0.0, 0.0), epsilon = 1e-4);

        // As an acceleration the force is multiplied by the mass
        body.add_force(Vec3::new(10.0, 0.0, 0.0), true);
        scene.step(0.5);
        assert_relative_eq!(body.linear_velocity(), Vec3::new(15.0, 0.0, 0.0), epsilon = 1e-4);
    }

    #[test]
    fn test_kinematic_bodies_ignore_forces_and_impulses() {
        let scene = PhysScene::new(config(false));
        let component = owner(1, Mobility::Movable);
        let body = movable_crate(&scene, &component, false);

        body.add_force(Vec3::new(100.0, 0.0, 0.0), false);
        body.add_impulse(Vec3::new(100.0, 0.0, 0.0), true);
        body.set_linear_velocity(Vec3::new(100.0, 0.0, 0.0), false);

        assert!(pending_force(&body).is_none());
        assert_relative_eq!(body.linear_velocity(), Vec3::zeros());
    }

    #[test]
    fn test_impulse_and_velocity_change() {
        let scene = PhysScene::new(config(false));
        let component = owner(1, Mobility::Movable);
        let body = movable_crate(&scene, &component, true);

        body.add_impulse(Vec3::new(0.0, 40.0, 0.0), false);
        assert_relative_eq!(body.linear_velocity(), Vec3::new(0.0, 5.0, 0.0), epsilon = 1e-4);

        body.add_impulse(Vec3::new(0.0, 5.0, 0.0), true);
        assert_relative_eq!(body.linear_velocity(), Vec3::new(0.0, 10.0, 0.0), epsilon = 1e-4);

        body.set_linear_velocity(Vec3::new(1.0, 0.0, 0.0), true);
        assert_relative_eq!(body.linear_velocity(), Vec3::new(1.0, 10.0, 0.0), epsilon = 1e-4);
    }

    #[test]
    fn test_radial_impulse_falloff() {
        let scene = PhysScene::new(config(false));
        let component = Arc::new(OwnerComponent::new(1, "Crate", Mobility::Movable));
        let mut body = BodyInstance::new(Arc::clone(scene.config()));
        body.set_instance_simulate_physics(true);
        body.init_body(box_setup("Crate", 10.0), &at(50.0, 0.0, 0.0), shared(&component), &scene, None)
            .unwrap();

        body.add_radial_impulse(Vec3::zeros(), 100.0, 40.0, RadialFalloff::Linear, true);
        assert_relative_eq!(body.linear_velocity(), Vec3::new(20.0, 0.0, 0.0), epsilon = 1e-4);

        body.add_radial_impulse(Vec3::zeros(), 100.0, 40.0, RadialFalloff::Constant, false);
        assert_relative_eq!(body.linear_velocity(), Vec3::new(25.0, 0.0, 0.0), epsilon = 1e-4);

        // Center of mass outside the radius
        body.add_radial_impulse(Vec3::zeros(), 40.0, 40.0, RadialFalloff::Constant, true);
        assert_relative_eq!(body.linear_velocity(), Vec3::new(25.0, 0.0, 0.0), epsilon = 1e-4);
    }

    #[test]
    fn test_angular_velocity_round_trips_in_degrees() {
        let scene = PhysScene::new(config(false));
        let component = owner(1, Mobility::Movable);
        let mut body = movable_crate(&scene, &component, true);

        body.set_angular_velocity(Vec3::new(0.0, 0.0, 90.0), false);
        assert_relative_eq!(body.angular_velocity(), Vec3::new(0.0, 0.0, 90.0), epsilon = 1e-3);

        body.set_max_angular_velocity(400.0, true);
        assert_relative_eq!(body.max_angular_velocity(), 4000.0, epsilon = 1e-3);
    }

    #[test]
    fn test_sleep_and_wake() {
        let scene = PhysScene::new(config(false));
        let component = owner(1, Mobility::Movable);
        let body = movable_crate(&scene, &component, true);
        assert!(body.is_instance_awake());

        body.put_instance_to_sleep();
        assert!(!body.is_instance_awake());

        body.wake_instance();
        assert!(body.is_instance_awake());

        // Kinematic bodies cannot be put to sleep
        let kinematic = movable_crate(&scene, &component, false);
        kinematic.put_instance_to_sleep();
        assert!(kinematic.is_instance_awake());
    }

    #[test]
    fn test_static_body_refuses_simulation() {
        let scene = PhysScene::new(config(false));
        let mut body = BodyInstance::new(Arc::clone(scene.config()));
        body.init_body(box_setup("Wall", 10.0), &Transform::identity(), None, &scene, None)
            .unwrap();

        body.set_instance_simulate_physics(true);

        assert!(!body.is_instance_simulating_physics());
        assert_relative_eq!(body.body_mass(), 0.0);
    }

    #[test]
    fn test_simulate_toggle_switches_motion() {
        let scene = PhysScene::new(config(false));
        let component = owner(1, Mobility::Movable);
        let mut body = movable_crate(&scene, &component, false);

        body.set_instance_simulate_physics(true);
        assert!(body.is_instance_simulating_physics());
        assert_eq!(motion(&body), Some(MotionState::Simulated));

        body.set_instance_simulate_physics(false);
        assert_eq!(motion(&body), Some(MotionState::KinematicTracking));
    }
}
