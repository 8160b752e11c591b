//! Specialized collection types
//!
//! Scene actors and aggregates live in slot maps so handles stay stable while
//! other bodies come and go.

pub use slotmap::{SlotMap, SecondaryMap};

slotmap::new_key_type! {
    /// Key of a rigid actor inside one scene's actor arena
    pub struct ActorKey;

    /// Key of a shape aggregate inside one scene
    pub struct AggregateKey;
}

/// Arena of scene-owned values addressed by stable keys
pub type HandleMap<K, T> = SlotMap<K, T>;
