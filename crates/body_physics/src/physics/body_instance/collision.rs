//! Collision responses, profiles and per-shape filter data

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::BodyInstance;
use crate::physics::actor::RigidActor;
use crate::physics::body_setup::{BodyCollisionResponse, CollisionTraceFlag};
use crate::physics::collision_channel::{
    CollisionChannel, CollisionEnabled, CollisionResponse, CollisionResponseContainer, ResponseChannel,
};
use crate::physics::component::BodyOwner;
use crate::physics::filter::{FilterData, FilterInput, ShapeFlags};
use crate::physics::profile::{is_valid_profile_name, CollisionProfile};
use crate::physics::scene::SceneKind;

/// Serializable collision settings of a body.
///
/// Only responses that differ from the configured defaults are stored. When
/// `profile_name` names a known profile it wins over the stored values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyCollisionSettings {
    /// Profile the body follows, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_name: Option<String>,
    /// Participation mode
    pub collision_enabled: CollisionEnabled,
    /// Object type channel display name
    pub object_type: String,
    /// Responses differing from the defaults
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub responses: Vec<ResponseChannel>,
}

impl BodyInstance {
    /// Set the response toward one channel. Clears the profile.
    pub fn set_response_to_channel(&mut self, channel: CollisionChannel, response: CollisionResponse) {
        self.invalidate_collision_profile_name();
        if self.responses.set(channel, response) {
            self.update_physics_filter_data();
        }
    }

    /// Set the response toward every channel. Clears the profile.
    pub fn set_response_to_all_channels(&mut self, response: CollisionResponse) {
        self.invalidate_collision_profile_name();
        if self.responses.set_all(response) {
            self.update_physics_filter_data();
        }
    }

    /// Replace the whole response table. Clears the profile.
    pub fn set_response_to_channels(&mut self, responses: CollisionResponseContainer) {
        self.invalidate_collision_profile_name();
        if self.responses != responses {
            self.responses = responses;
            self.update_physics_filter_data();
        }
    }

    /// Response toward `channel`
    pub const fn response_to_channel(&self, channel: CollisionChannel) -> CollisionResponse {
        self.responses.get(channel)
    }

    /// The whole response table
    pub const fn responses(&self) -> &CollisionResponseContainer {
        &self.responses
    }

    /// Object type channel
    pub const fn object_type(&self) -> CollisionChannel {
        self.object_type
    }

    /// Change the object type. Clears the profile.
    pub fn set_object_type(&mut self, channel: CollisionChannel) {
        self.invalidate_collision_profile_name();
        if self.object_type != channel {
            self.object_type = channel;
            self.update_physics_filter_data();
        }
    }

    /// Change the participation mode. Clears the profile when it changes.
    pub fn set_collision_enabled(&mut self, mode: CollisionEnabled, update_filters: bool) {
        if self.collision_enabled == mode {
            return;
        }
        self.invalidate_collision_profile_name();
        self.collision_enabled = mode;
        if update_filters {
            self.update_physics_filter_data();
        }
    }

    /// Effective participation mode. An owner with actor-level collision
    /// disabled forces `NoCollision`.
    pub fn collision_enabled(&self) -> CollisionEnabled {
        let owner = self.owner();
        self.collision_enabled_for(owner.as_deref())
    }

    fn collision_enabled_for(&self, owner: Option<&dyn BodyOwner>) -> CollisionEnabled {
        match owner {
            Some(owner) if !owner.is_actor_collision_enabled() => CollisionEnabled::NoCollision,
            _ => self.collision_enabled,
        }
    }

    /// Follow the named profile. Unknown names are logged and cleared, and the
    /// body keeps the responses it already had.
    pub fn set_collision_profile_name(&mut self, name: &str) {
        if self.collision_profile_name.as_deref() == Some(name) {
            return;
        }
        let config = Arc::clone(&self.config);
        match config.profiles().require(Some(name)) {
            Ok(profile) => {
                self.collision_profile_name = Some(name.to_string());
                self.apply_profile(profile);
            }
            Err(err) => {
                log::warn!("{err}; '{}' keeps its current responses", self.body_debug_name());
                self.collision_profile_name = None;
            }
        }
    }

    /// Re-read the current profile.
    ///
    /// With `verify`, the profile name is kept only if the body still matches
    /// the profile exactly; otherwise the profile is applied as is. Either way
    /// an unknown profile clears the name.
    pub fn load_profile_data(&mut self, verify: bool) {
        let Some(name) = self.collision_profile_name.clone() else {
            return;
        };
        let config = Arc::clone(&self.config);
        let profile = match config.profiles().require(Some(&name)) {
            Ok(profile) => profile,
            Err(err) => {
                log::warn!("{err}; clearing profile of '{}'", self.body_debug_name());
                self.collision_profile_name = None;
                return;
            }
        };

        if verify {
            let matches = profile.collision_enabled == self.collision_enabled
                && profile.object_type == self.object_type
                && profile.responses == self.responses;
            if !matches {
                log::debug!("'{}' no longer matches profile '{name}'", self.body_debug_name());
                self.collision_profile_name = None;
            }
        } else {
            self.apply_profile(profile);
        }
    }

    fn apply_profile(&mut self, profile: &CollisionProfile) {
        self.collision_enabled = profile.collision_enabled;
        self.object_type = profile.object_type;
        self.responses = profile.responses;
        self.update_physics_filter_data();
    }

    fn invalidate_collision_profile_name(&mut self) {
        self.collision_profile_name = None;
    }

    /// True while the body follows a profile
    pub fn does_use_collision_profile(&self) -> bool {
        is_valid_profile_name(self.collision_profile_name.as_deref())
    }

    /// Profile the body follows
    pub fn collision_profile_name(&self) -> Option<&str> {
        self.collision_profile_name.as_deref()
    }

    /// `None`, empty and `"Custom"` are not profile names
    pub fn is_valid_collision_profile_name(name: Option<&str>) -> bool {
        is_valid_profile_name(name)
    }

    /// Snapshot of the collision settings in their compact form
    pub fn collision_settings(&self) -> BodyCollisionSettings {
        let profiles = self.config.profiles();
        let names = profiles.channel_names();
        BodyCollisionSettings {
            profile_name: self.collision_profile_name.clone(),
            collision_enabled: self.collision_enabled,
            object_type: names.name(self.object_type).to_string(),
            responses: self.responses.overrides_from(profiles.default_responses(), names),
        }
    }

    /// Restore settings produced by [`collision_settings`](Self::collision_settings).
    ///
    /// A channel listed twice takes its last entry.
    pub fn apply_collision_settings(&mut self, settings: &BodyCollisionSettings) {
        let config = Arc::clone(&self.config);
        let profiles = config.profiles();
        let names = profiles.channel_names();

        self.collision_enabled = settings.collision_enabled;
        self.object_type = names.find(&settings.object_type).unwrap_or_else(|| {
            log::warn!("Unknown object type '{}', using WorldStatic", settings.object_type);
            CollisionChannel::WORLD_STATIC
        });
        self.responses =
            CollisionResponseContainer::from_overrides(profiles.default_responses(), &settings.responses, names);
        self.collision_profile_name = settings
            .profile_name
            .clone()
            .filter(|name| is_valid_profile_name(Some(name)));

        if self.collision_profile_name.is_some() {
            self.load_profile_data(false);
        } else {
            self.update_physics_filter_data();
        }
    }

    /// Rebuild the filter data and shape flags of every shape.
    ///
    /// Takes the write lock of every scene holding the body. When a simple
    /// shape starts or stops simulating, mass is recomputed afterwards.
    pub fn update_physics_filter_data(&self) {
        if self.membership.is_none() {
            return;
        }
        let owner = self.owner();
        let mut simulation_changed = false;
        self.write_actors(|kind, actor| {
            simulation_changed |= self.apply_filter_data(actor, kind, owner.as_deref());
        });
        if simulation_changed && self.is_dynamic() {
            self.update_mass_properties();
        }
    }

    /// Responses after the multi-body clamp.
    ///
    /// Bodies of an owner that drives several bodies never respond more
    /// strongly than the owner itself.
    fn effective_responses(&self, owner: Option<&dyn BodyOwner>) -> CollisionResponseContainer {
        let Some(parent) = owner.and_then(|owner| owner.parent_body_settings()) else {
            return self.responses;
        };
        let mut responses = self.responses;
        match self.body_setup.as_ref().map(|setup| setup.collision_response) {
            Some(BodyCollisionResponse::Enabled) => {
                responses.set_all(CollisionResponse::Block);
            }
            Some(BodyCollisionResponse::Disabled) => {
                responses.set_all(CollisionResponse::Ignore);
            }
            Some(BodyCollisionResponse::Default) | None => {}
        }
        CollisionResponseContainer::min(&responses, &parent.responses)
    }

    /// Write filter data and flags onto the shapes of `actor`. Returns true if
    /// a simple shape's simulation flag flipped.
    pub(super) fn apply_filter_data(&self, actor: &mut RigidActor, scene: SceneKind, owner: Option<&dyn BodyOwner>) -> bool {
        let enabled = self.collision_enabled_for(owner);
        let trace_flag = self
            .body_setup
            .as_ref()
            .map_or(CollisionTraceFlag::Default, |setup| setup.collision_trace_flag);
        let is_static = actor.is_static();

        let (query, sim) = FilterData::build(&FilterInput {
            object_type: self.object_type,
            responses: self.effective_responses(owner),
            actor_id: owner.map_or(0, |owner| owner.actor_id()),
            component_id: owner.map_or(0, |owner| owner.component_id()),
            body_index: self.instance_body_index,
            notify_contacts: self.notify_rigid_body_collision,
            ccd: self.use_ccd,
            is_static,
        });

        // Static shapes answer queries from the sync scene only
        let query_shape = enabled.has_query() && (!is_static || scene == SceneKind::Sync);

        let mut simulation_changed = false;
        for shape in &mut actor.shapes {
            let mesh = shape.geometry.is_triangle_mesh();
            let simple = !mesh || trace_flag == CollisionTraceFlag::ComplexAsSimple;
            let complex = mesh || trace_flag == CollisionTraceFlag::SimpleAsComplex;
            shape.query_filter = query.with_collision_kind(simple, complex);
            shape.sim_filter = sim.with_collision_kind(simple, complex);

            let sim_shape = if mesh {
                enabled.has_physics() && is_static && trace_flag == CollisionTraceFlag::ComplexAsSimple
            } else {
                enabled.has_physics() && trace_flag != CollisionTraceFlag::ComplexAsSimple
            };
            if !mesh && shape.is_simulation_shape() != sim_shape {
                simulation_changed = true;
            }
            shape.flags.set(ShapeFlags::SCENE_QUERY_SHAPE, query_shape);
            shape.flags.set(ShapeFlags::SIMULATION_SHAPE, sim_shape);
        }

        if let Some(dynamic) = actor.dynamic_mut() {
            dynamic.ccd = self.use_ccd;
        }
        simulation_changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_serialize_compactly() {
        let mut body = BodyInstance::default();
        body.set_response_to_channel(CollisionChannel::PAWN, CollisionResponse::Overlap);

        let settings = body.collision_settings();
        assert!(settings.profile_name.is_none());
        assert_eq!(settings.object_type, "WorldStatic");
        assert_eq!(settings.responses, vec![ResponseChannel::new("Pawn", CollisionResponse::Overlap)]);

        let text = toml::to_string(&settings).unwrap();
        let parsed: BodyCollisionSettings = toml::from_str(&text).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_duplicate_channel_takes_last_entry() {
        let mut body = BodyInstance::default();
        body.apply_collision_settings(&BodyCollisionSettings {
            profile_name: None,
            collision_enabled: CollisionEnabled::QueryOnly,
            object_type: "PhysicsBody".to_string(),
            responses: vec![
                ResponseChannel::new("Camera", CollisionResponse::Ignore),
                ResponseChannel::new("Camera", CollisionResponse::Overlap),
            ],
        });

        assert_eq!(body.response_to_channel(CollisionChannel::CAMERA), CollisionResponse::Overlap);
        assert_eq!(body.object_type(), CollisionChannel::PHYSICS_BODY);
        assert_eq!(body.collision_enabled(), CollisionEnabled::QueryOnly);
    }
}
