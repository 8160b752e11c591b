//! Body physics demo
//!
//! Builds a small scene with a static wall and a simulated ball, steps it for
//! one second and runs every kind of query against the wall.
//!
//! Usage: `body_demo [settings.toml|.ron] [profiles.toml|.ron]`

use std::sync::Arc;

use body_physics::prelude::*;
use body_physics::foundation::logging;
use body_physics::physics::RadialFalloff;
use thiserror::Error;

/// Demo failures
#[derive(Error, Debug)]
enum DemoError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to create body: {0}")]
    Body(#[from] BodyInitError),

    #[error("expected query '{0}' to hit the wall")]
    Missed(&'static str),
}

fn load_config() -> Result<Arc<PhysicsConfig>, DemoError> {
    let mut args = std::env::args().skip(1);
    match (args.next(), args.next()) {
        (Some(settings), Some(profiles)) => {
            log::info!("Loading settings from {settings} and profiles from {profiles}");
            Ok(Arc::new(PhysicsConfig::load(settings, profiles)?))
        }
        (Some(settings), None) => {
            log::info!("Loading settings from {settings}");
            let settings = PhysicsSettings::load_from_file(settings)?;
            Ok(Arc::new(PhysicsConfig::new(settings, &CollisionProfileTable::default())))
        }
        _ => Ok(PhysicsConfig::shared()),
    }
}

fn run() -> Result<(), DemoError> {
    let config = load_config()?;
    let scene = PhysScene::new(Arc::clone(&config));

    // Static wall: a 4 m × 4 m × 20 cm slab at x = 500
    let wall_owner = OwnerComponent::new(1, "Wall", Mobility::Static).into_shared();
    let wall_setup = Arc::new(BodySetup::new("WallSlab").with_box(Vec3::zeros(), Vec3::new(10.0, 200.0, 200.0)));
    let mut wall = BodyInstance::new(Arc::clone(&config));
    wall.set_collision_profile_name("BlockAll");
    wall.init_body(
        wall_setup,
        &Transform::from_position(Vec3::new(500.0, 0.0, 0.0)),
        Some(Arc::clone(&wall_owner)),
        &scene,
        None,
    )?;

    // Simulated ball rolling toward the wall
    let ball_owner = OwnerComponent::new(2, "Ball", Mobility::Movable).into_shared();
    let ball_setup = Arc::new(BodySetup::new("BallSphere").with_sphere(Vec3::zeros(), 25.0));
    let mut ball = BodyInstance::new(Arc::clone(&config));
    ball.set_collision_profile_name("PhysicsActor");
    ball.set_instance_simulate_physics(true);
    ball.set_enable_gravity(false);
    ball.use_async_scene = true;
    ball.init_body(ball_setup, &Transform::identity(), Some(Arc::clone(&ball_owner)), &scene, None)?;

    log::info!(
        "Ball '{}' weighs {:.2} kg and lives in {:?}",
        ball.body_debug_name(),
        ball.body_mass(),
        ball.membership().map(|membership| membership.primary().scene_kind())
    );

    ball.add_impulse(Vec3::new(200.0, 0.0, 0.0), true);
    ball.add_radial_impulse(Vec3::new(-50.0, 0.0, 0.0), 100.0, 50.0, RadialFalloff::Linear, true);
    for _ in 0..60 {
        scene.step(1.0 / 60.0);
    }
    let ball_position = ball.world_transform().map_or_else(Vec3::zeros, |transform| transform.position);
    log::info!("Ball after 1 s: position {ball_position:?}, velocity {:?}", ball.linear_velocity());

    // Queries against the wall
    let start = Vec3::new(0.0, 0.0, 0.0);
    let end = Vec3::new(1000.0, 0.0, 0.0);

    let hit = wall.line_trace(&start, &end, false, true).ok_or(DemoError::Missed("line trace"))?;
    log::info!(
        "Line trace hit at {:?} (distance {:.1}, material {:?})",
        hit.location,
        hit.distance,
        hit.phys_material.as_ref().map(|material| material.name.as_str())
    );

    let probe = CollisionShape::make_sphere(25.0);
    let sweep = wall
        .sweep(&start, &end, &Quat::identity(), &probe, false)
        .ok_or(DemoError::Missed("sweep"))?;
    log::info!("Sphere sweep stops at {:?} (time {:.3})", sweep.location, sweep.time);

    let touching = wall.overlap_test(&Vec3::new(480.0, 0.0, 0.0), &Quat::identity(), &probe);
    log::info!("Sphere at x = 480 overlaps the wall: {touching}");

    let overlaps = wall.overlap_multi(&Vec3::new(490.0, 0.0, 0.0), &Quat::identity(), &probe, CollisionChannel::PAWN);
    log::info!("Overlap results toward Pawn: {overlaps:?}");

    let (distance, closest) = wall.distance_to_body(&ball_position);
    log::info!("Ball is {distance:.1} from the wall, closest point {closest:?}");

    // Collision settings persist in their compact form
    let settings = ball.collision_settings();
    match ron::to_string(&settings) {
        Ok(text) => log::info!("Ball collision settings: {text}"),
        Err(err) => log::warn!("Could not serialize ball settings: {err}"),
    }

    log::info!(
        "Scenes hold {} sync and {} async actors",
        scene.sync_scene().actor_count(),
        scene.async_scene().map_or(0, |async_scene| async_scene.actor_count())
    );

    ball.term_body();
    wall.term_body();
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::try_init_with_default("info");

    log::info!("Starting body physics demo");
    run()?;
    log::info!("Demo finished");
    Ok(())
}
