//! Physical surface materials

use serde::{Deserialize, Serialize};

/// Surface and density properties applied to shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicalMaterial {
    /// Display name, also used in logs
    pub name: String,
    /// Coulomb friction coefficient
    pub friction: f32,
    /// Bounciness, 0..=1
    pub restitution: f32,
    /// Density in g/cm³
    pub density: f32,
    /// Exponent used to compress the mass range of bodies; clamped to (0, 1]
    /// when applied
    pub raise_mass_to_power: f32,
}

impl Default for PhysicalMaterial {
    fn default() -> Self {
        Self {
            name: "DefaultPhysicalMaterial".to_string(),
            friction: 0.7,
            restitution: 0.3,
            density: 1.0,
            raise_mass_to_power: 0.75,
        }
    }
}

impl PhysicalMaterial {
    /// Material with the given name and density, other fields default
    pub fn new(name: impl Into<String>, density: f32) -> Self {
        Self {
            name: name.into(),
            density,
            ..Default::default()
        }
    }

    /// Builder-style mass power override
    #[must_use]
    pub fn with_raise_mass_to_power(mut self, power: f32) -> Self {
        self.raise_mass_to_power = power;
        self
    }
}
