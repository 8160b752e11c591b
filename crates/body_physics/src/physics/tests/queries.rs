//! Query tests against registered bodies
//!
//! Nearest-hit line traces, first-shape sweeps, overlaps, per-channel overlap
//! results, complex traces on triangle meshes and closest-point distance.

use super::{config, owner, shared};
use crate::foundation::math::{Pose, Quat, Transform, Vec3};
use crate::physics::body_instance::BodyInstance;
use crate::physics::body_setup::{BodySetup, CollisionTraceFlag};
use crate::physics::collision::{CollisionShape, ShapeGeometry, TriMesh};
use crate::physics::collision_channel::{CollisionChannel, CollisionEnabled, CollisionResponse};
use crate::physics::component::Mobility;
use crate::physics::material::PhysicalMaterial;
use crate::physics::scene::PhysScene;
use approx::assert_relative_eq;
use std::sync::Arc;

/// Two overlapping spheres: shape 0 on +X, shape 1 on -X
fn sphere_pair() -> Arc<BodySetup> {
    Arc::new(
        BodySetup::new("Pair")
            .with_sphere(Vec3::new(40.0, 0.0, 0.0), 50.0)
            .with_sphere(Vec3::new(-40.0, 0.0, 0.0), 50.0),
    )
}

/// 200 × 200 quad in the XY plane; face 0 below the diagonal y = x, face 1 above
fn floor_mesh() -> TriMesh {
    TriMesh::new(
        vec![
            Vec3::new(-100.0, -100.0, 0.0),
            Vec3::new(100.0, -100.0, 0.0),
            Vec3::new(100.0, 100.0, 0.0),
            Vec3::new(-100.0, 100.0, 0.0),
        ],
        vec![[0, 1, 2], [0, 2, 3]],
    )
    .with_material_indices(vec![0, 1])
}

fn static_body(setup: Arc<BodySetup>, scene: &PhysScene) -> BodyInstance {
    let mut body = BodyInstance::new(Arc::clone(scene.config()));
    body.init_body(setup, &Transform::identity(), None, scene, None)
        .unwrap();
    body
}

const START: Vec3 = Vec3::new(-500.0, 0.0, 0.0);
const END: Vec3 = Vec3::new(500.0, 0.0, 0.0);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_trace_reports_nearest_shape() {
        let scene = PhysScene::new(config(false));
        let body = static_body(sphere_pair(), &scene);

        let hit = body.line_trace(&START, &END, false, false).unwrap();

        assert!(hit.blocking_hit);
        assert_eq!(hit.shape_index, 1);
        assert_relative_eq!(hit.location, Vec3::new(-90.0, 0.0, 0.0), epsilon = 1e-3);
        assert_relative_eq!(hit.distance, 410.0, epsilon = 1e-3);
        assert_relative_eq!(hit.time, 0.41, epsilon = 1e-5);
        assert_relative_eq!(hit.impact_normal, Vec3::new(-1.0, 0.0, 0.0), epsilon = 1e-4);
        assert_eq!(hit.trace_start, START);
        assert_eq!(hit.trace_end, END);
    }

    #[test]
    fn test_sweep_reports_first_shape_that_hits() {
        let scene = PhysScene::new(config(false));
        let body = static_body(sphere_pair(), &scene);
        let probe = CollisionShape::make_sphere(10.0);

        let hit = body.sweep(&START, &END, &Quat::identity(), &probe, false).unwrap();

        // Shape 1 would be touched sooner (probe center at x = -100), but
        // shape 0 comes first in shape order
        assert_eq!(hit.shape_index, 0);
        assert_relative_eq!(hit.location.x, -20.0, epsilon = 0.5);
        assert_relative_eq!(hit.time, 0.48, epsilon = 1e-3);
    }

    #[test]
    fn test_zero_volume_sweep_is_a_line_trace() {
        let scene = PhysScene::new(config(false));
        let body = static_body(sphere_pair(), &scene);

        let hit = body
            .sweep(&START, &END, &Quat::identity(), &CollisionShape::Line, false)
            .unwrap();

        assert_eq!(hit.shape_index, 1);
        assert_relative_eq!(hit.location.x, -90.0, epsilon = 1e-3);
    }

    #[test]
    fn test_degenerate_traces_miss() {
        let scene = PhysScene::new(config(false));
        let body = static_body(sphere_pair(), &scene);

        assert!(body.line_trace(&START, &START, false, false).is_none());
        let above = Vec3::new(-500.0, 0.0, 200.0);
        assert!(body
            .line_trace(&above, &Vec3::new(500.0, 0.0, 200.0), false, false)
            .is_none());
    }

    #[test]
    fn test_uninitialized_body_answers_nothing() {
        let body = BodyInstance::new(config(false));
        let probe = CollisionShape::make_box(Vec3::new(10.0, 10.0, 10.0));

        assert!(body.line_trace(&START, &END, false, false).is_none());
        assert!(body.sweep(&START, &END, &Quat::identity(), &probe, false).is_none());
        assert!(!body.overlap_test(&Vec3::zeros(), &Quat::identity(), &probe));
        assert_relative_eq!(body.distance_to_body(&Vec3::zeros()).0, -1.0);
    }

    #[test]
    fn test_overlap_test_and_geometry_overlap() {
        let scene = PhysScene::new(config(false));
        let body = static_body(sphere_pair(), &scene);
        let probe = CollisionShape::make_box(Vec3::new(10.0, 10.0, 10.0));

        assert!(body.overlap_test(&Vec3::new(-40.0, 0.0, 0.0), &Quat::identity(), &probe));
        assert!(!body.overlap_test(&Vec3::new(0.0, 200.0, 0.0), &Quat::identity(), &probe));

        let sphere = ShapeGeometry::Sphere { radius: 5.0 };
        assert!(body.overlap(&sphere, &Pose::translation(40.0, 0.0, 0.0)));
        assert!(!body.overlap(&sphere, &Pose::translation(40.0, 0.0, 100.0)));

        let mesh = ShapeGeometry::TriangleMesh {
            mesh: Arc::new(floor_mesh()),
            scale: Vec3::new(1.0, 1.0, 1.0),
        };
        assert!(!body.overlap(&mesh, &Pose::identity()));
    }

    #[test]
    fn test_overlap_multi_follows_channel_response() {
        let scene = PhysScene::new(config(false));
        let mut body = static_body(sphere_pair(), &scene);
        let probe = CollisionShape::make_box(Vec3::new(20.0, 20.0, 20.0));

        let blocking = body.overlap_multi(&Vec3::zeros(), &Quat::identity(), &probe, CollisionChannel::PAWN);
        assert_eq!(blocking.len(), 2);
        assert!(blocking.iter().all(|overlap| overlap.blocking_hit));

        body.set_response_to_channel(CollisionChannel::PAWN, CollisionResponse::Overlap);
        let touching = body.overlap_multi(&Vec3::zeros(), &Quat::identity(), &probe, CollisionChannel::PAWN);
        assert_eq!(touching.len(), 2);
        assert!(touching.iter().all(|overlap| !overlap.blocking_hit));

        body.set_response_to_channel(CollisionChannel::PAWN, CollisionResponse::Ignore);
        assert!(body
            .overlap_multi(&Vec3::zeros(), &Quat::identity(), &probe, CollisionChannel::PAWN)
            .is_empty());
    }

    #[test]
    fn test_complex_trace_reports_face_and_material() {
        let config = config(false);
        let scene = PhysScene::new(Arc::clone(&config));
        let rock = Arc::new(PhysicalMaterial::new("Rock", 2.6));
        let mud = Arc::new(PhysicalMaterial::new("Mud", 1.7));
        let component = owner(5, Mobility::Static);
        component.set_render_materials(vec![Arc::clone(&rock), Arc::clone(&mud)]);

        let setup = Arc::new(BodySetup::new("Floor").with_tri_mesh(floor_mesh()));
        let mut body = BodyInstance::new(config);
        body.init_body(setup, &Transform::identity(), shared(&component), &scene, None)
            .unwrap();

        let start = Vec3::new(-50.0, 50.0, 100.0);
        let end = Vec3::new(-50.0, 50.0, -100.0);

        // Meshes answer complex traces only
        assert!(body.line_trace(&start, &end, false, false).is_none());

        let hit = body.line_trace(&start, &end, true, true).unwrap();
        assert_eq!(hit.face_index, Some(1));
        assert_eq!(hit.component_id, 5);
        assert_relative_eq!(hit.location, Vec3::new(-50.0, 50.0, 0.0), epsilon = 1e-3);
        assert_relative_eq!(hit.impact_normal, Vec3::new(0.0, 0.0, 1.0), epsilon = 1e-5);
        assert_eq!(hit.phys_material.map(|material| material.name.clone()), Some("Mud".to_string()));

        let below_diagonal = body
            .line_trace(&Vec3::new(50.0, -50.0, 100.0), &Vec3::new(50.0, -50.0, -100.0), true, true)
            .unwrap();
        assert_eq!(below_diagonal.face_index, Some(0));
        assert_eq!(below_diagonal.phys_material.map(|material| material.name.clone()), Some("Rock".to_string()));
    }

    #[test]
    fn test_complex_as_simple_mesh_answers_simple_traces() {
        let scene = PhysScene::new(config(false));
        let setup = Arc::new(
            BodySetup::new("Floor")
                .with_tri_mesh(floor_mesh())
                .with_trace_flag(CollisionTraceFlag::ComplexAsSimple),
        );
        let body = static_body(setup, &scene);

        let hit = body.line_trace(&Vec3::new(10.0, 20.0, 50.0), &Vec3::new(10.0, 20.0, -50.0), false, false);
        assert!(hit.is_some());
    }

    #[test]
    fn test_distance_to_body() {
        let scene = PhysScene::new(config(false));
        let body = static_body(sphere_pair(), &scene);

        let (distance, closest) = body.distance_to_body(&Vec3::new(200.0, 0.0, 0.0));
        assert_relative_eq!(distance, 110.0, epsilon = 0.1);
        assert_relative_eq!(closest, Vec3::new(90.0, 0.0, 0.0), epsilon = 0.1);

        let inside = Vec3::new(40.0, 0.0, 0.0);
        let (distance, closest) = body.distance_to_body(&inside);
        assert_relative_eq!(distance, 0.0);
        assert_eq!(closest, inside);
    }

    #[test]
    fn test_distance_ignores_query_flags() {
        let scene = PhysScene::new(config(false));
        let mut body = static_body(Arc::new(BodySetup::new("Ball").with_sphere(Vec3::zeros(), 25.0)), &scene);
        body.set_collision_enabled(CollisionEnabled::PhysicsOnly, true);

        let target = Vec3::new(100.0, 0.0, 0.0);
        assert!(body.line_trace(&Vec3::new(-100.0, 0.0, 0.0), &target, false, false).is_none());

        let (distance, closest) = body.distance_to_body(&target);
        assert_relative_eq!(distance, 75.0, epsilon = 0.1);
        assert_relative_eq!(closest, Vec3::new(25.0, 0.0, 0.0), epsilon = 0.1);
    }

    #[test]
    fn test_distance_skips_triangle_meshes() {
        let scene = PhysScene::new(config(false));
        let body = static_body(Arc::new(BodySetup::new("Floor").with_tri_mesh(floor_mesh())), &scene);

        let (distance, _) = body.distance_to_body(&Vec3::new(0.0, 0.0, 50.0));
        assert_relative_eq!(distance, -1.0);
    }
}
