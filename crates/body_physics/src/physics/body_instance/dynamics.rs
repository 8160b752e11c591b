//! Mass, scale, damping, velocities, forces and sleep

use serde::{Deserialize, Serialize};

use super::{BodyInstance, ScaleError};
use crate::foundation::math::constants::KINDA_SMALL_NUMBER;
use crate::foundation::math::{utils, Pose, Translation3, Vec3};
use crate::physics::actor::{MotionState, RigidActor, RigidDynamic};
use crate::physics::collision::{MassProperties, ShapeGeometry};

/// Grams per cubic centimeter to kilograms per cubic unit
const DENSITY_TO_KG_PER_UU: f32 = 0.001;

/// How radial impulses and forces fade with distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RadialFalloff {
    /// Full strength anywhere inside the radius
    #[default]
    Constant,
    /// Full strength at the origin, zero at the radius
    Linear,
}

impl RadialFalloff {
    /// Strength multiplier at `distance` from the origin
    pub fn scale(self, distance: f32, radius: f32) -> f32 {
        match self {
            Self::Constant => 1.0,
            Self::Linear if radius > 0.0 => (1.0 - distance / radius).clamp(0.0, 1.0),
            Self::Linear => 0.0,
        }
    }
}

impl BodyInstance {
    /// Recompute mass, inertia and center of mass from the simulation shapes
    pub fn update_mass_properties(&self) {
        let Some(handle) = self.membership.as_ref().and_then(|m| m.dynamic()) else {
            return;
        };
        let mut data = handle.scene().write();
        if let Some(actor) = data.actor_mut(handle.key()) {
            self.apply_mass_properties(actor);
        }
    }

    /// Mass from the resolved material density. The raw mass goes through the
    /// material's power curve and the mass scale; inertia follows the mass
    /// ratio and the center of mass gets the nudge.
    pub(super) fn apply_mass_properties(&self, actor: &mut RigidActor) {
        let material = self.simple_physical_material();
        let settings = self.config.settings();
        let density = (material.density * DENSITY_TO_KG_PER_UU).max(settings.min_density);

        let parts: Vec<MassProperties> = actor
            .shapes
            .iter()
            .filter(|shape| shape.is_simulation_shape())
            .filter_map(|shape| {
                shape
                    .geometry
                    .mass_properties(density)
                    .map(|mass| mass.transformed(&shape.local_pose))
            })
            .collect();
        if parts.is_empty() {
            return;
        }
        let raw = MassProperties::combine(&parts);

        let power = material.raise_mass_to_power.clamp(KINDA_SMALL_NUMBER, 1.0);
        let mass = raw.mass.powf(power) * self.mass_scale.clamp(0.01, 100.0);
        let ratio = if raw.mass > 0.0 { mass / raw.mass } else { 1.0 };

        if let Some(dynamic) = actor.dynamic_mut() {
            dynamic.mass = mass;
            dynamic.inertia = raw.inertia * ratio;
            dynamic.center_of_mass = raw.center_of_mass + self.com_nudge;
        }
    }

    /// Rescale every shape for a new body scale.
    ///
    /// Primitive sizes are scaled uniformly by the ratio of the smallest new
    /// axis to the smallest old one; their local offsets follow the signed
    /// per-axis change, so a sign flip mirrors them. Hulls and meshes are rebuilt from the setup
    /// for the exact new scale, mirrored when its determinant is negative.
    /// Shapes that fail are skipped; the call fails only if none succeeded.
    /// Returns `Ok(false)` when the scale is unchanged.
    pub fn update_body_scale(&mut self, new_scale: Vec3) -> Result<bool, ScaleError> {
        if self.membership.is_none() {
            return Err(ScaleError::Uninitialized);
        }
        if new_scale.iter().any(|s| !s.is_finite() || s.abs() <= KINDA_SMALL_NUMBER) {
            return Err(ScaleError::InvalidScale([new_scale.x, new_scale.y, new_scale.z]));
        }
        if new_scale == self.scale3d {
            return Ok(false);
        }

        let ratio = new_scale.abs().min() / self.scale3d.abs().min();
        let relative = new_scale.component_div(&self.scale3d);
        let setup = self.body_setup.clone();
        let name = self.body_debug_name();
        let mut rescaled = 0usize;

        self.write_actors(|_, actor| {
            for shape in &mut actor.shapes {
                let updated = match &shape.geometry {
                    ShapeGeometry::Sphere { .. } | ShapeGeometry::Box { .. } | ShapeGeometry::Capsule { .. } => {
                        shape.geometry.scaled_uniform(ratio).map(|geometry| {
                            let mut pose = shape.local_pose;
                            pose.translation = Translation3::from(pose.translation.vector.component_mul(&relative));
                            (geometry, pose)
                        })
                    }
                    ShapeGeometry::Convex { .. } | ShapeGeometry::TriangleMesh { .. } => setup
                        .as_ref()
                        .and_then(|setup| setup.shape_template(shape.source, &new_scale))
                        .map(|template| (template.geometry, template.local_pose)),
                };

                match updated {
                    Some((geometry, pose)) if geometry.is_valid() => {
                        shape.geometry = geometry;
                        shape.local_pose = pose;
                        rescaled += 1;
                    }
                    _ => log::debug!("Failed to rescale {} shape of '{name}'", shape.geometry.type_name()),
                }
            }
        });

        if rescaled == 0 {
            return Err(ScaleError::NothingRescaled);
        }
        self.scale3d = new_scale;
        if self.update_mass_when_scale_changes {
            self.update_mass_properties();
        }
        Ok(true)
    }

    /// Push damping and the angular speed cap to the actor
    pub fn update_damping_properties(&self) {
        let (linear, angular) = (self.linear_damping, self.angular_damping);
        let max_angular = utils::deg_to_rad(self.max_angular_velocity());
        self.with_dynamic(|dynamic, _| {
            dynamic.linear_damping = linear;
            dynamic.angular_damping = angular;
            dynamic.max_angular_velocity = max_angular;
        });
    }

    /// Linear damping coefficient
    pub const fn linear_damping(&self) -> f32 {
        self.linear_damping
    }

    /// Set linear damping and push it to the actor
    pub fn set_linear_damping(&mut self, damping: f32) {
        self.linear_damping = damping;
        self.update_damping_properties();
    }

    /// Angular damping coefficient
    pub const fn angular_damping(&self) -> f32 {
        self.angular_damping
    }

    /// Set angular damping and push it to the actor
    pub fn set_angular_damping(&mut self, damping: f32) {
        self.angular_damping = damping;
        self.update_damping_properties();
    }

    /// Angular speed cap in deg/s: the body override or the engine default
    pub fn max_angular_velocity(&self) -> f32 {
        self.max_angular_velocity_override
            .unwrap_or(self.config.settings().max_angular_velocity)
    }

    /// Override the angular speed cap (deg/s), optionally adding to the current cap
    pub fn set_max_angular_velocity(&mut self, max_degrees: f32, add_to_current: bool) {
        let value = if add_to_current {
            self.max_angular_velocity() + max_degrees
        } else {
            max_degrees
        };
        self.max_angular_velocity_override = Some(value);
        self.update_damping_properties();
    }

    /// True while gravity applies
    pub const fn is_gravity_enabled(&self) -> bool {
        self.enable_gravity
    }

    /// Toggle gravity. Enabling it wakes a simulated body.
    pub fn set_enable_gravity(&mut self, enabled: bool) {
        if self.enable_gravity == enabled {
            return;
        }
        self.enable_gravity = enabled;
        let wake_counter = self.config.settings().wake_counter_seconds;
        self.with_dynamic(|dynamic, _| {
            dynamic.gravity_enabled = enabled;
            if enabled && dynamic.motion == MotionState::Simulated {
                dynamic.wake_up(wake_counter);
            }
        });
    }

    /// Set the linear velocity
    pub fn set_linear_velocity(&self, velocity: Vec3, add_to_current: bool) {
        let wake_counter = self.wake_counter();
        self.with_simulated(|dynamic, _| {
            if add_to_current {
                dynamic.linear_velocity += velocity;
            } else {
                dynamic.linear_velocity = velocity;
            }
            if dynamic.linear_velocity.norm_squared() > 0.0 {
                dynamic.wake_up(wake_counter);
            }
        });
    }

    /// Set the angular velocity in deg/s
    pub fn set_angular_velocity(&self, degrees: Vec3, add_to_current: bool) {
        let radians = utils::vec_deg_to_rad(degrees);
        let wake_counter = self.wake_counter();
        self.with_simulated(|dynamic, _| {
            if add_to_current {
                dynamic.angular_velocity += radians;
            } else {
                dynamic.angular_velocity = radians;
            }
            dynamic.clamp_angular_velocity();
            if dynamic.angular_velocity.norm_squared() > 0.0 {
                dynamic.wake_up(wake_counter);
            }
        });
    }

    /// Linear velocity; zero for static or uninitialized bodies
    pub fn linear_velocity(&self) -> Vec3 {
        self.read_actor(|actor| actor.dynamic().map_or_else(Vec3::zeros, |d| d.linear_velocity))
            .unwrap_or_else(Vec3::zeros)
    }

    /// Angular velocity in deg/s
    pub fn angular_velocity(&self) -> Vec3 {
        self.read_actor(|actor| actor.dynamic().map_or_else(Vec3::zeros, |d| d.angular_velocity))
            .map_or_else(Vec3::zeros, utils::vec_rad_to_deg)
    }

    /// Velocity of the body at a world-space point
    pub fn velocity_at_point(&self, point: &Vec3) -> Vec3 {
        self.read_actor(|actor| {
            actor.dynamic().map_or_else(Vec3::zeros, |d| {
                d.linear_velocity + d.angular_velocity.cross(&(point - actor.world_center_of_mass()))
            })
        })
        .unwrap_or_else(Vec3::zeros)
    }

    /// Accumulate a force through the center of mass until the next step.
    /// With `accel_change` the force is treated as an acceleration.
    pub fn add_force(&self, force: Vec3, accel_change: bool) {
        self.add_force_and_torque(|dynamic, _, _| {
            let force = if accel_change { force * dynamic.mass } else { force };
            (force, Vec3::zeros())
        });
    }

    /// Accumulate a force applied at a world-space point
    pub fn add_force_at_position(&self, force: Vec3, position: Vec3) {
        self.add_force_and_torque(|_, _, com| (force, (position - com).cross(&force)));
    }

    /// Accumulate a torque until the next step.
    /// With `accel_change` the torque is treated as an angular acceleration.
    pub fn add_torque(&self, torque: Vec3, accel_change: bool) {
        self.add_force_and_torque(|dynamic, pose, _| {
            let torque = if accel_change {
                dynamic.world_inertia(&pose.rotation) * torque
            } else {
                torque
            };
            (Vec3::zeros(), torque)
        });
    }

    /// Change velocity at once. With `vel_change` the impulse is a velocity delta.
    pub fn add_impulse(&self, impulse: Vec3, vel_change: bool) {
        let wake_counter = self.wake_counter();
        self.with_simulated(|dynamic, _| {
            dynamic.linear_velocity += if vel_change { impulse } else { impulse / dynamic.mass };
            dynamic.wake_up(wake_counter);
        });
    }

    /// Apply an impulse at a world-space point, changing both velocities
    pub fn add_impulse_at_position(&self, impulse: Vec3, position: Vec3) {
        let wake_counter = self.wake_counter();
        self.with_simulated(|dynamic, actor_pose| {
            let com = actor_pose.transform_point(&dynamic.center_of_mass.into()).coords;
            let angular = (position - com).cross(&impulse);
            dynamic.linear_velocity += impulse / dynamic.mass;
            dynamic.angular_velocity += dynamic.world_inverse_inertia(&actor_pose.rotation) * angular;
            dynamic.clamp_angular_velocity();
            dynamic.wake_up(wake_counter);
        });
    }

    /// Impulse pushing away from `origin`, for bodies whose center of mass
    /// lies within `radius`
    pub fn add_radial_impulse(&self, origin: Vec3, radius: f32, strength: f32, falloff: RadialFalloff, vel_change: bool) {
        let wake_counter = self.wake_counter();
        self.with_simulated(|dynamic, actor_pose| {
            let com = actor_pose.transform_point(&dynamic.center_of_mass.into()).coords;
            let Some(impulse) = radial_vector(origin, com, radius, strength, falloff) else {
                return;
            };
            dynamic.linear_velocity += if vel_change { impulse } else { impulse / dynamic.mass };
            dynamic.wake_up(wake_counter);
        });
    }

    /// Force pushing away from `origin`, accumulated until the next step
    pub fn add_radial_force(&self, origin: Vec3, radius: f32, strength: f32, falloff: RadialFalloff) {
        self.add_force_and_torque(|_, _, com| {
            let force = radial_vector(origin, com, radius, strength, falloff).unwrap_or_else(Vec3::zeros);
            (force, Vec3::zeros())
        });
    }

    /// Wake a simulated body
    pub fn wake_instance(&self) {
        let wake_counter = self.wake_counter();
        self.with_simulated(|dynamic, _| dynamic.wake_up(wake_counter));
    }

    /// Put a simulated body to sleep
    pub fn put_instance_to_sleep(&self) {
        self.with_simulated(|dynamic, _| dynamic.put_to_sleep());
    }

    /// True for dynamic bodies that are awake
    pub fn is_instance_awake(&self) -> bool {
        self.read_actor(|actor| actor.dynamic().is_some_and(|d| d.awake))
            .unwrap_or(false)
    }

    fn wake_counter(&self) -> f32 {
        self.config.settings().wake_counter_seconds
    }

    /// Run `f` on the dynamic state of a movable body, kinematic or not
    fn with_dynamic(&self, f: impl FnOnce(&mut RigidDynamic, &Pose)) {
        self.write_dynamic(|data, key| {
            if let Some(actor) = data.actor_mut(key) {
                let pose = actor.pose;
                if let Some(dynamic) = actor.dynamic_mut() {
                    f(dynamic, &pose);
                }
            }
        });
    }

    /// Run `f` on the dynamic state of a simulated body; no-op otherwise
    fn with_simulated(&self, f: impl FnOnce(&mut RigidDynamic, &Pose)) {
        self.write_dynamic(|data, key| {
            if let Some(actor) = data.actor_mut(key) {
                let pose = actor.pose;
                if let Some(dynamic) = actor.simulated_mut() {
                    f(dynamic, &pose);
                }
            }
        });
    }

    /// Queue force and torque from `f(dynamic, pose, world_com)` for a
    /// simulated body and wake it
    fn add_force_and_torque(&self, f: impl FnOnce(&RigidDynamic, &Pose, Vec3) -> (Vec3, Vec3)) {
        let wake_counter = self.wake_counter();
        self.write_dynamic(|data, key| {
            let Some(actor) = data.actor_mut(key) else {
                return;
            };
            let com = actor.world_center_of_mass();
            let pose = actor.pose;
            let Some(dynamic) = actor.simulated_mut() else {
                return;
            };
            let (force, torque) = f(dynamic, &pose, com);
            dynamic.wake_up(wake_counter);
            data.add_force(key, force, torque);
        });
    }
}

/// Push away from `origin` scaled by falloff, or `None` outside the radius
fn radial_vector(origin: Vec3, target: Vec3, radius: f32, strength: f32, falloff: RadialFalloff) -> Option<Vec3> {
    let delta = target - origin;
    let distance = delta.norm();
    if distance > radius {
        return None;
    }
    let direction = delta.try_normalize(KINDA_SMALL_NUMBER).unwrap_or_else(Vec3::zeros);
    Some(direction * strength * falloff.scale(distance, radius))
}
