//! Engine-wide physics tunables

use serde::{Deserialize, Serialize};

use super::Config;
use crate::foundation::math::Vec3;
use crate::physics::material::PhysicalMaterial;

/// Which side of a networked session this process is running as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NetMode {
    /// Single process, owns all bodies
    #[default]
    Standalone,
    /// Headless authoritative server
    DedicatedServer,
    /// Server with a local player
    ListenServer,
    /// Pure client; server-only bodies are never created here
    Client,
}

impl NetMode {
    /// True when bodies flagged server-only may be created
    pub const fn allows_server_only_bodies(self) -> bool {
        !matches!(self, Self::Client)
    }
}

/// Physics settings loaded from configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    /// Create the asynchronous scene alongside the synchronous one
    pub enable_async_scene: bool,

    /// Net role of this process
    pub net_mode: NetMode,

    /// Gravity applied to simulated bodies during a scene step (uu/s²)
    pub gravity: Vec3,

    /// Mass-normalized kinetic energy below which a body may fall asleep
    pub sleep_energy_threshold: f32,

    /// Divisor applied to the sleep threshold for the sensitive sleep family
    pub sensitive_sleep_divisor: f32,

    /// Seconds a body must stay below the sleep threshold before sleeping
    pub wake_counter_seconds: f32,

    /// Bodies with more shapes than this get their own aggregate
    pub aggregate_shapes_threshold: usize,

    /// Capacity of a body-owned aggregate
    pub aggregate_max_size: usize,

    /// Density floor in kg/uu³ after the g/cm³ conversion
    pub min_density: f32,

    /// Angular velocity cap in deg/s when a body does not override it
    pub max_angular_velocity: f32,

    /// Default position solver iterations for new bodies
    pub position_solver_iterations: u32,

    /// Default velocity solver iterations for new bodies
    pub velocity_solver_iterations: u32,

    /// Material used when nothing in the resolution chain provides one
    pub default_material: PhysicalMaterial,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            enable_async_scene: true,
            net_mode: NetMode::Standalone,
            gravity: Vec3::new(0.0, 0.0, -980.0),
            sleep_energy_threshold: 50.0,
            sensitive_sleep_divisor: 20.0,
            wake_counter_seconds: 0.4,
            aggregate_shapes_threshold: 4,
            aggregate_max_size: 128,
            min_density: 0.000_09,
            max_angular_velocity: 3600.0,
            position_solver_iterations: 8,
            velocity_solver_iterations: 1,
            default_material: PhysicalMaterial::default(),
        }
    }
}

impl Config for PhysicsSettings {}

impl PhysicsSettings {
    /// Builder-style async scene toggle
    #[must_use]
    pub fn with_async_scene(mut self, enabled: bool) -> Self {
        self.enable_async_scene = enabled;
        self
    }

    /// Builder-style net mode
    #[must_use]
    pub fn with_net_mode(mut self, net_mode: NetMode) -> Self {
        self.net_mode = net_mode;
        self
    }

    /// Builder-style aggregate threshold
    #[must_use]
    pub fn with_aggregate_threshold(mut self, threshold: usize) -> Self {
        self.aggregate_shapes_threshold = threshold;
        self
    }
}
