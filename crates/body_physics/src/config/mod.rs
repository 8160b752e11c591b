//! Configuration system
//!
//! Every tunable of the physics layer is a plain serde type that can be read
//! from `.toml` or `.ron`. The loaded values are bundled into an immutable
//! [`PhysicsConfig`] which is shared by `Arc` between scenes and bodies, so two
//! tests (or two worlds) never observe each other's defaults.

pub mod settings;

use std::path::Path;
use std::sync::Arc;

pub use serde::{Serialize, Deserialize};

pub use settings::{NetMode, PhysicsSettings};

use crate::physics::material::PhysicalMaterial;
use crate::physics::profile::{CollisionProfileTable, ProfileRegistry};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = Format::of(path)?;
        let contents = std::fs::read_to_string(path)?;

        match format {
            Format::Toml => Self::from_toml_str(&contents),
            Format::Ron => Self::from_ron_str(&contents),
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match Format::of(path)? {
            Format::Toml => self.to_toml_string()?,
            Format::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }

    /// Parse from TOML text
    fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Parse from RON text
    fn from_ron_str(contents: &str) -> Result<Self, ConfigError> {
        ron::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Render as pretty TOML
    fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}

enum Format {
    Toml,
    Ron,
}

impl Format {
    fn of(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Immutable bundle of everything a scene or body needs to consult at runtime.
#[derive(Debug)]
pub struct PhysicsConfig {
    settings: PhysicsSettings,
    profiles: ProfileRegistry,
    default_material: Arc<PhysicalMaterial>,
}

impl PhysicsConfig {
    /// Resolve settings and a profile table into a shareable config
    pub fn new(settings: PhysicsSettings, table: &CollisionProfileTable) -> Self {
        let profiles = ProfileRegistry::from_table(table);
        let default_material = Arc::new(settings.default_material.clone());
        Self {
            settings,
            profiles,
            default_material,
        }
    }

    /// Load both halves from disk
    pub fn load(
        settings_path: impl AsRef<Path>,
        profiles_path: impl AsRef<Path>,
    ) -> Result<Self, ConfigError> {
        let settings = PhysicsSettings::load_from_file(settings_path)?;
        let table = CollisionProfileTable::load_from_file(profiles_path)?;
        log::debug!("Loaded {} collision profiles", table.profiles.len());
        Ok(Self::new(settings, &table))
    }

    /// Convenience for `Arc::new(PhysicsConfig::default())`
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Engine-wide tunables
    pub const fn settings(&self) -> &PhysicsSettings {
        &self.settings
    }

    /// Resolved collision profiles and channel names
    pub const fn profiles(&self) -> &ProfileRegistry {
        &self.profiles
    }

    /// Last link of the physical-material resolution chain
    pub fn default_material(&self) -> &Arc<PhysicalMaterial> {
        &self.default_material
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self::new(PhysicsSettings::default(), &CollisionProfileTable::default())
    }
}
