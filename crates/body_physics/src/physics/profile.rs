//! Named collision profiles
//!
//! A profile bundles the collision-enabled mode, the object-type channel and a
//! full response table under one name. The table is plain configuration data
//! ([`CollisionProfileTable`]); [`ProfileRegistry`] is the resolved, read-only
//! form bodies consult at runtime.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::collision_channel::{
    ChannelNames, CollisionChannel, CollisionEnabled, CollisionResponse, CollisionResponseContainer,
    ResponseChannel,
};
use crate::config::Config;

/// Reserved name meaning "responses were edited by hand"
pub const CUSTOM_PROFILE_NAME: &str = "Custom";

/// Resolved profile: a complete, immutable preset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollisionProfile {
    /// Lookup name
    pub name: String,
    /// Participation mode applied with the profile
    pub collision_enabled: CollisionEnabled,
    /// Object type applied with the profile
    pub object_type: CollisionChannel,
    /// Dense response table applied with the profile
    pub responses: CollisionResponseContainer,
    /// Editor tooltip
    pub help_message: String,
}

/// Profile lookup errors
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    /// Empty or reserved name
    #[error("'{0}' is not a valid collision profile name")]
    InvalidName(String),

    /// Name not present in the table
    #[error("Collision profile '{0}' not found")]
    NotFound(String),
}

/// A game-defined channel declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomChannelConfig {
    /// 1-based custom channel slot
    pub slot: u8,
    /// Display name
    pub name: String,
    /// Response every table starts with toward this channel
    #[serde(default)]
    pub default_response: CollisionResponse,
}

/// A profile as written in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDefinition {
    /// Lookup name
    pub name: String,
    /// Participation mode
    pub collision_enabled: CollisionEnabled,
    /// Object type channel display name
    pub object_type: String,
    /// Applied to every channel before `responses`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_response: Option<CollisionResponse>,
    /// Per-channel overrides; later entries win
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub responses: Vec<ResponseChannel>,
    /// Editor tooltip
    #[serde(default)]
    pub help_message: String,
}

impl ProfileDefinition {
    fn builtin(
        name: &str,
        collision_enabled: CollisionEnabled,
        object_type: CollisionChannel,
        default_response: CollisionResponse,
        responses: &[(CollisionChannel, CollisionResponse)],
        help_message: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            collision_enabled,
            object_type: object_type.default_name(),
            default_response: Some(default_response),
            responses: responses
                .iter()
                .map(|(channel, response)| ResponseChannel::new(channel.default_name(), *response))
                .collect(),
            help_message: help_message.to_string(),
        }
    }
}

/// Configuration form of the profile table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionProfileTable {
    /// Named custom channels
    pub custom_channels: Vec<CustomChannelConfig>,
    /// Overrides over an all-Block table, forming the default response table
    pub default_responses: Vec<ResponseChannel>,
    /// Profiles in declaration order
    pub profiles: Vec<ProfileDefinition>,
}

impl Config for CollisionProfileTable {}

impl Default for CollisionProfileTable {
    fn default() -> Self {
        use CollisionChannel as Ch;
        use CollisionEnabled::{NoCollision, QueryAndPhysics, QueryOnly};
        use CollisionResponse::{Block, Ignore, Overlap};

        let profiles = vec![
            ProfileDefinition::builtin("NoCollision", NoCollision, Ch::WORLD_STATIC, Ignore, &[], "No collision"),
            ProfileDefinition::builtin("BlockAll", QueryAndPhysics, Ch::WORLD_STATIC, Block, &[], "WorldStatic object that blocks all actors by default."),
            ProfileDefinition::builtin("OverlapAll", QueryOnly, Ch::WORLD_STATIC, Overlap, &[], "WorldStatic object that overlaps all actors by default."),
            ProfileDefinition::builtin("BlockAllDynamic", QueryAndPhysics, Ch::WORLD_DYNAMIC, Block, &[], "WorldDynamic object that blocks all actors by default."),
            ProfileDefinition::builtin("OverlapAllDynamic", QueryOnly, Ch::WORLD_DYNAMIC, Overlap, &[], "WorldDynamic object that overlaps all actors by default."),
            ProfileDefinition::builtin("Pawn", QueryAndPhysics, Ch::PAWN, Block, &[(Ch::VISIBILITY, Ignore)], "Pawn object. Can be used for capsule of any playerable character or AI."),
            ProfileDefinition::builtin("PhysicsActor", QueryAndPhysics, Ch::PHYSICS_BODY, Block, &[], "Simulating actors"),
            ProfileDefinition::builtin("Trigger", QueryOnly, Ch::WORLD_DYNAMIC, Overlap, &[(Ch::VISIBILITY, Ignore)], "WorldDynamic object that is used for trigger."),
            ProfileDefinition::builtin("Vehicle", QueryAndPhysics, Ch::VEHICLE, Block, &[], "Vehicle object that blocks Vehicle, WorldStatic, and WorldDynamic."),
            ProfileDefinition::builtin("Destructible", QueryAndPhysics, Ch::DESTRUCTIBLE, Block, &[], "Destructible actors"),
            ProfileDefinition::builtin("InvisibleWall", QueryAndPhysics, Ch::WORLD_STATIC, Block, &[(Ch::VISIBILITY, Ignore)], "WorldStatic object that is invisible."),
            ProfileDefinition::builtin("Ragdoll", QueryAndPhysics, Ch::PHYSICS_BODY, Block, &[(Ch::PAWN, Ignore), (Ch::VISIBILITY, Ignore)], "Simulating skeletal mesh component."),
        ];

        Self {
            custom_channels: Vec::new(),
            default_responses: Vec::new(),
            profiles,
        }
    }
}

/// Resolved profile table plus channel naming, shared through `PhysicsConfig`.
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    names: ChannelNames,
    defaults: CollisionResponseContainer,
    profiles: Vec<CollisionProfile>,
    by_name: HashMap<String, usize>,
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::from_table(&CollisionProfileTable::default())
    }
}

impl ProfileRegistry {
    /// Resolve every definition against the table's channel names and defaults.
    ///
    /// Definitions with an unknown object type are skipped with a warning. A
    /// repeated profile name replaces the earlier definition.
    pub fn from_table(table: &CollisionProfileTable) -> Self {
        let mut names = ChannelNames::default();
        let mut defaults = CollisionResponseContainer::default();

        for custom in &table.custom_channels {
            match CollisionChannel::custom(custom.slot) {
                Some(channel) => {
                    names.set(channel, custom.name.clone());
                    defaults.set(channel, custom.default_response);
                }
                None => log::warn!(
                    "Custom collision channel '{}' uses out-of-range slot {}",
                    custom.name,
                    custom.slot
                ),
            }
        }
        let defaults = CollisionResponseContainer::from_overrides(&defaults, &table.default_responses, &names);

        let mut registry = Self {
            names,
            defaults,
            profiles: Vec::with_capacity(table.profiles.len()),
            by_name: HashMap::new(),
        };

        for definition in &table.profiles {
            if let Some(profile) = registry.resolve(definition) {
                registry.insert(profile);
            }
        }
        registry
    }

    fn resolve(&self, definition: &ProfileDefinition) -> Option<CollisionProfile> {
        if !is_valid_profile_name(Some(&definition.name)) {
            log::warn!("Skipping collision profile with reserved name '{}'", definition.name);
            return None;
        }
        let Some(object_type) = self.names.find(&definition.object_type) else {
            log::warn!(
                "Skipping collision profile '{}': unknown object type '{}'",
                definition.name,
                definition.object_type
            );
            return None;
        };

        let mut base = self.defaults;
        if let Some(all) = definition.default_response {
            base.set_all(all);
        }
        let responses = CollisionResponseContainer::from_overrides(&base, &definition.responses, &self.names);

        Some(CollisionProfile {
            name: definition.name.clone(),
            collision_enabled: definition.collision_enabled,
            object_type,
            responses,
            help_message: definition.help_message.clone(),
        })
    }

    fn insert(&mut self, profile: CollisionProfile) {
        if let Some(&existing) = self.by_name.get(&profile.name) {
            log::debug!("Collision profile '{}' redefined", profile.name);
            self.profiles[existing] = profile;
        } else {
            self.by_name.insert(profile.name.clone(), self.profiles.len());
            self.profiles.push(profile);
        }
    }

    /// Look up a profile by name
    pub fn profile(&self, name: &str) -> Option<&CollisionProfile> {
        self.by_name.get(name).map(|&index| &self.profiles[index])
    }

    /// Look up a profile, explaining why it is unavailable
    pub fn require(&self, name: Option<&str>) -> Result<&CollisionProfile, ProfileError> {
        match name {
            Some(n) if is_valid_profile_name(Some(n)) => {
                self.profile(n).ok_or_else(|| ProfileError::NotFound(n.to_string()))
            }
            other => Err(ProfileError::InvalidName(other.unwrap_or_default().to_string())),
        }
    }

    /// Profiles in declaration order
    pub fn profiles(&self) -> impl Iterator<Item = &CollisionProfile> {
        self.profiles.iter()
    }

    /// Configured channel display names
    pub const fn channel_names(&self) -> &ChannelNames {
        &self.names
    }

    /// Response table new bodies start with
    pub const fn default_responses(&self) -> &CollisionResponseContainer {
        &self.defaults
    }
}

/// `None`, empty and the reserved custom name do not identify a profile
pub fn is_valid_profile_name(name: Option<&str>) -> bool {
    matches!(name, Some(n) if !n.is_empty() && n != CUSTOM_PROFILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_pawn_profile() {
        let registry = ProfileRegistry::default();
        let pawn = registry.profile("Pawn").unwrap();

        assert_eq!(pawn.object_type, CollisionChannel::PAWN);
        assert_eq!(pawn.collision_enabled, CollisionEnabled::QueryAndPhysics);
        assert_eq!(pawn.responses.get(CollisionChannel::VISIBILITY), CollisionResponse::Ignore);
        assert_eq!(pawn.responses.get(CollisionChannel::WORLD_STATIC), CollisionResponse::Block);
    }

    #[test]
    fn test_reserved_and_missing_names() {
        let registry = ProfileRegistry::default();
        assert!(!is_valid_profile_name(None));
        assert!(!is_valid_profile_name(Some(CUSTOM_PROFILE_NAME)));
        assert!(is_valid_profile_name(Some("Pawn")));

        assert_eq!(
            registry.require(Some("Nope")).unwrap_err(),
            ProfileError::NotFound("Nope".to_string())
        );
        assert!(matches!(registry.require(None), Err(ProfileError::InvalidName(_))));
    }

    #[test]
    fn test_table_from_toml_with_custom_channel() {
        let table = CollisionProfileTable::from_toml_str(
            r#"
            [[custom_channels]]
            slot = 1
            name = "Projectile"
            default_response = "Ignore"

            [[profiles]]
            name = "Bullet"
            collision_enabled = "QueryOnly"
            object_type = "Projectile"
            responses = [
                { channel = "Pawn", response = "Overlap" },
                { channel = "Pawn", response = "Block" },
            ]

            [[profiles]]
            name = "Broken"
            collision_enabled = "QueryOnly"
            object_type = "NotAChannel"
            "#,
        )
        .unwrap();

        let registry = ProfileRegistry::from_table(&table);
        let projectile = CollisionChannel::custom(1).unwrap();
        let bullet = registry.profile("Bullet").unwrap();

        assert_eq!(bullet.object_type, projectile);
        assert_eq!(bullet.responses.get(projectile), CollisionResponse::Ignore);
        assert_eq!(bullet.responses.get(CollisionChannel::PAWN), CollisionResponse::Block);
        assert_eq!(registry.default_responses().get(projectile), CollisionResponse::Ignore);
        assert!(registry.profile("Broken").is_none());
    }

    #[test]
    fn test_default_table_survives_ron_round_trip() {
        let table = CollisionProfileTable::default();
        let text = ron::to_string(&table).unwrap();
        let parsed = CollisionProfileTable::from_ron_str(&text).unwrap();
        assert_eq!(parsed, table);
    }
}
