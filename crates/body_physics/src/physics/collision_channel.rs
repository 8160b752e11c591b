//! Collision channels and per-channel responses
//!
//! Every shape is classified by a single object-type channel and carries a
//! response (ignore, overlap or block) toward every channel. Two shapes
//! interact according to the weaker of the two responses they have toward each
//! other's object type.

use serde::{Deserialize, Serialize};

/// Semantic category used to classify shapes for filtering.
///
/// Channels are plain indices so they fit in a `u32` bitmask. The first eight
/// are built in; the remaining ones are game-defined and named through the
/// profile table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollisionChannel(u8);

impl CollisionChannel {
    /// Total number of channels, built in plus custom
    pub const COUNT: usize = 32;

    /// Number of game-defined channels after the built-in ones
    pub const CUSTOM_COUNT: u8 = 24;

    /// Static world geometry
    pub const WORLD_STATIC: Self = Self(0);

    /// Movable world geometry
    pub const WORLD_DYNAMIC: Self = Self(1);

    /// Player and AI characters
    pub const PAWN: Self = Self(2);

    /// Visibility traces (line of sight, picking)
    pub const VISIBILITY: Self = Self(3);

    /// Camera collision probes
    pub const CAMERA: Self = Self(4);

    /// Default channel for simulated bodies
    pub const PHYSICS_BODY: Self = Self(5);

    /// Vehicles
    pub const VEHICLE: Self = Self(6);

    /// Fracturable geometry
    pub const DESTRUCTIBLE: Self = Self(7);

    const FIRST_CUSTOM: u8 = 8;

    /// Game-defined channel `n` (1-based). Returns `None` outside `1..=24`.
    pub const fn custom(n: u8) -> Option<Self> {
        if n >= 1 && n <= Self::CUSTOM_COUNT {
            Some(Self(Self::FIRST_CUSTOM + n - 1))
        } else {
            None
        }
    }

    /// Channel from its raw index. Returns `None` past [`Self::COUNT`].
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < Self::COUNT {
            Some(Self(index as u8))
        } else {
            None
        }
    }

    /// Raw channel index
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Single-bit mask for this channel
    pub const fn bit(self) -> u32 {
        1 << self.0
    }

    /// Iterate all channels in index order
    pub fn all() -> impl Iterator<Item = Self> {
        (0..Self::COUNT).filter_map(Self::from_index)
    }

    /// Built-in display name; custom channels get `Custom<n>`
    pub fn default_name(self) -> String {
        match self {
            Self::WORLD_STATIC => "WorldStatic".to_string(),
            Self::WORLD_DYNAMIC => "WorldDynamic".to_string(),
            Self::PAWN => "Pawn".to_string(),
            Self::VISIBILITY => "Visibility".to_string(),
            Self::CAMERA => "Camera".to_string(),
            Self::PHYSICS_BODY => "PhysicsBody".to_string(),
            Self::VEHICLE => "Vehicle".to_string(),
            Self::DESTRUCTIBLE => "Destructible".to_string(),
            Self(index) => format!("Custom{}", index - Self::FIRST_CUSTOM + 1),
        }
    }
}

/// Outcome when a shape meets a given channel.
///
/// Ordered from weakest to strongest so that `min` degrades toward `Ignore`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum CollisionResponse {
    /// No interaction at all
    Ignore,
    /// Reported as a touch, does not stop traces or simulation
    Overlap,
    /// Blocks traces and simulation
    #[default]
    Block,
}

/// Which kinds of participation a body has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CollisionEnabled {
    /// Neither queries nor simulation
    NoCollision,
    /// Raycasts, sweeps and overlaps only
    QueryOnly,
    /// Simulation contacts only
    PhysicsOnly,
    /// Both
    #[default]
    QueryAndPhysics,
}

impl CollisionEnabled {
    /// True if scene queries should see this body
    pub const fn has_query(self) -> bool {
        matches!(self, Self::QueryOnly | Self::QueryAndPhysics)
    }

    /// True if the body generates simulation contacts
    pub const fn has_physics(self) -> bool {
        matches!(self, Self::PhysicsOnly | Self::QueryAndPhysics)
    }
}

/// Display names of every channel, as configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelNames {
    names: Vec<String>,
}

impl Default for ChannelNames {
    fn default() -> Self {
        Self {
            names: CollisionChannel::all().map(CollisionChannel::default_name).collect(),
        }
    }
}

impl ChannelNames {
    /// Rename one channel
    pub fn set(&mut self, channel: CollisionChannel, name: impl Into<String>) {
        self.names[channel.index()] = name.into();
    }

    /// Display name of a channel
    pub fn name(&self, channel: CollisionChannel) -> &str {
        &self.names[channel.index()]
    }

    /// Reverse lookup by display name
    pub fn find(&self, name: &str) -> Option<CollisionChannel> {
        self.names
            .iter()
            .position(|n| n == name)
            .and_then(CollisionChannel::from_index)
    }
}

/// One entry of the compact differs-from-default view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseChannel {
    /// Channel display name
    pub channel: String,
    /// Response toward that channel
    pub response: CollisionResponse,
}

impl ResponseChannel {
    /// Build an entry
    pub fn new(channel: impl Into<String>, response: CollisionResponse) -> Self {
        Self {
            channel: channel.into(),
            response,
        }
    }
}

/// Dense channel → response table.
///
/// This is the only stored representation. The compact list of entries that
/// differ from a default table is derived on demand with
/// [`overrides_from`](Self::overrides_from) and turned back into a dense table
/// with [`from_overrides`](Self::from_overrides).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollisionResponseContainer {
    responses: [CollisionResponse; CollisionChannel::COUNT],
}

impl Default for CollisionResponseContainer {
    fn default() -> Self {
        Self::new(CollisionResponse::Block)
    }
}

impl CollisionResponseContainer {
    /// Table with every channel set to `response`
    pub const fn new(response: CollisionResponse) -> Self {
        Self {
            responses: [response; CollisionChannel::COUNT],
        }
    }

    /// Set one channel. Returns true if the value changed.
    pub fn set(&mut self, channel: CollisionChannel, response: CollisionResponse) -> bool {
        let slot = &mut self.responses[channel.index()];
        let changed = *slot != response;
        *slot = response;
        changed
    }

    /// Response toward `channel`
    pub const fn get(&self, channel: CollisionChannel) -> CollisionResponse {
        self.responses[channel.index()]
    }

    /// Set every channel. Returns true if anything changed.
    pub fn set_all(&mut self, response: CollisionResponse) -> bool {
        let changed = self.responses.iter().any(|r| *r != response);
        self.responses = [response; CollisionChannel::COUNT];
        changed
    }

    /// Replace every occurrence of `old` with `new`. Returns true if anything changed.
    pub fn replace_all(&mut self, old: CollisionResponse, new: CollisionResponse) -> bool {
        let mut changed = false;
        for slot in &mut self.responses {
            if *slot == old && old != new {
                *slot = new;
                changed = true;
            }
        }
        changed
    }

    /// Per-channel minimum of two tables
    pub fn min(a: &Self, b: &Self) -> Self {
        let mut out = *a;
        for (slot, other) in out.responses.iter_mut().zip(b.responses.iter()) {
            *slot = (*slot).min(*other);
        }
        out
    }

    /// Iterate `(channel, response)` in channel order
    pub fn iter(&self) -> impl Iterator<Item = (CollisionChannel, CollisionResponse)> + '_ {
        CollisionChannel::all().map(move |channel| (channel, self.get(channel)))
    }

    /// Bitmask of channels whose response equals `response`
    pub fn mask(&self, response: CollisionResponse) -> u32 {
        self.iter()
            .filter(|(_, r)| *r == response)
            .fold(0, |acc, (channel, _)| acc | channel.bit())
    }

    /// Entries of `self` that differ from `defaults`, in channel order
    pub fn overrides_from(&self, defaults: &Self, names: &ChannelNames) -> Vec<ResponseChannel> {
        self.iter()
            .filter(|(channel, response)| defaults.get(*channel) != *response)
            .map(|(channel, response)| ResponseChannel::new(names.name(channel), response))
            .collect()
    }

    /// Rebuild a dense table from `defaults` plus a compact override list.
    ///
    /// Later entries win when a channel is named more than once. Entries naming
    /// an unknown channel are dropped with a warning.
    pub fn from_overrides(defaults: &Self, overrides: &[ResponseChannel], names: &ChannelNames) -> Self {
        let mut out = *defaults;
        for entry in overrides {
            match names.find(&entry.channel) {
                Some(channel) => {
                    out.set(channel, entry.response);
                }
                None => log::warn!("Ignoring response for unknown collision channel '{}'", entry.channel),
            }
        }
        out
    }
}
