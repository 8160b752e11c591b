//! Per-shape filter data derived from a body's collision settings
//!
//! Filter data is what queries and the simulation actually test against: the
//! shape's object type, the masks of channels it blocks and touches, and a few
//! flag bits describing how the shape participates.

use bitflags::bitflags;

use super::collision_channel::{CollisionChannel, CollisionResponse, CollisionResponseContainer};

bitflags! {
    /// How a shape participates in collision
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FilterFlags: u8 {
        /// Answers simple-collision queries and simulation
        const SIMPLE_COLLISION = 0b0000_0001;
        /// Answers complex (per-poly) queries
        const COMPLEX_COLLISION = 0b0000_0010;
        /// Continuous collision detection requested
        const CCD = 0b0000_0100;
        /// Report rigid body contacts to the owner
        const CONTACT_NOTIFY = 0b0000_1000;
        /// Shape belongs to a static body
        const STATIC_SHAPE = 0b0001_0000;
    }
}

bitflags! {
    /// Which parts of the engine see a shape
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ShapeFlags: u8 {
        /// Generates simulation contacts
        const SIMULATION_SHAPE = 0b0000_0001;
        /// Visible to raycasts, sweeps and overlaps
        const SCENE_QUERY_SHAPE = 0b0000_0010;
        /// Drawn by debug visualization
        const VISUALIZATION = 0b0000_0100;
    }
}

/// Filter data stored on each shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FilterData {
    /// Channel the shape is classified as
    pub object_type: u8,
    /// Channels this shape blocks
    pub blocking: u32,
    /// Channels this shape overlaps
    pub touching: u32,
    /// Participation flags
    pub flags: FilterFlags,
    /// Owning actor id
    pub actor_id: u64,
    /// Owning component id
    pub component_id: u64,
    /// Body index within a multi-body owner
    pub body_index: u32,
}

/// Everything needed to build the filter data of one body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterInput {
    /// Object type of the body
    pub object_type: CollisionChannel,
    /// Effective responses
    pub responses: CollisionResponseContainer,
    /// Owning actor id
    pub actor_id: u64,
    /// Owning component id
    pub component_id: u64,
    /// Body index within a multi-body owner
    pub body_index: u32,
    /// Contact notification requested
    pub notify_contacts: bool,
    /// Continuous collision detection requested
    pub ccd: bool,
    /// The body is static
    pub is_static: bool,
}

impl FilterData {
    /// Build query and simulation filter data for one body.
    ///
    /// The two differ only in that simulation data never carries the CCD and
    /// notify bits of a static body. Simple and complex bits are applied per
    /// shape by the caller.
    pub fn build(input: &FilterInput) -> (Self, Self) {
        let object_type = u8::try_from(input.object_type.index()).unwrap_or(u8::MAX);
        let base = Self {
            object_type,
            blocking: input.responses.mask(CollisionResponse::Block),
            touching: input.responses.mask(CollisionResponse::Overlap),
            flags: FilterFlags::empty(),
            actor_id: input.actor_id,
            component_id: input.component_id,
            body_index: input.body_index,
        };

        let mut query = base;
        let mut sim = base;
        if input.is_static {
            query.flags |= FilterFlags::STATIC_SHAPE;
            sim.flags |= FilterFlags::STATIC_SHAPE;
        } else {
            if input.ccd {
                sim.flags |= FilterFlags::CCD;
            }
            if input.notify_contacts {
                sim.flags |= FilterFlags::CONTACT_NOTIFY;
            }
        }
        (query, sim)
    }

    /// Copy with the simple/complex bits set
    #[must_use]
    pub fn with_collision_kind(mut self, simple: bool, complex: bool) -> Self {
        self.flags.set(FilterFlags::SIMPLE_COLLISION, simple);
        self.flags.set(FilterFlags::COMPLEX_COLLISION, complex);
        self
    }

    /// Response of this shape toward `channel`
    pub const fn response_to(&self, channel: CollisionChannel) -> CollisionResponse {
        let bit = channel.bit();
        if self.blocking & bit != 0 {
            CollisionResponse::Block
        } else if self.touching & bit != 0 {
            CollisionResponse::Overlap
        } else {
            CollisionResponse::Ignore
        }
    }

    /// True if this shape answers a trace of the requested complexity
    pub fn matches_trace(&self, trace_complex: bool) -> bool {
        if trace_complex {
            self.flags.contains(FilterFlags::COMPLEX_COLLISION)
        } else {
            self.flags.contains(FilterFlags::SIMPLE_COLLISION)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(is_static: bool) -> FilterInput {
        let mut responses = CollisionResponseContainer::new(CollisionResponse::Block);
        responses.set(CollisionChannel::PAWN, CollisionResponse::Overlap);
        responses.set(CollisionChannel::CAMERA, CollisionResponse::Ignore);
        FilterInput {
            object_type: CollisionChannel::PHYSICS_BODY,
            responses,
            actor_id: 7,
            component_id: 9,
            body_index: 2,
            notify_contacts: true,
            ccd: true,
            is_static,
        }
    }

    #[test]
    fn test_masks_follow_responses() {
        let (query, sim) = FilterData::build(&input(false));

        assert_eq!(query.object_type, 5);
        assert_eq!(query.response_to(CollisionChannel::WORLD_STATIC), CollisionResponse::Block);
        assert_eq!(query.response_to(CollisionChannel::PAWN), CollisionResponse::Overlap);
        assert_eq!(query.response_to(CollisionChannel::CAMERA), CollisionResponse::Ignore);
        assert_eq!(query.blocking & query.touching, 0);
        assert!(sim.flags.contains(FilterFlags::CCD | FilterFlags::CONTACT_NOTIFY));
        assert!(!query.flags.contains(FilterFlags::CCD));
    }

    #[test]
    fn test_static_bodies_never_carry_ccd() {
        let (query, sim) = FilterData::build(&input(true));
        assert!(query.flags.contains(FilterFlags::STATIC_SHAPE));
        assert!(!sim.flags.contains(FilterFlags::CCD));
        assert!(!sim.flags.contains(FilterFlags::CONTACT_NOTIFY));
    }

    #[test]
    fn test_simple_and_complex_bits_are_independent() {
        let (query, _) = FilterData::build(&input(false));
        let both = query.with_collision_kind(true, true);
        assert!(both.matches_trace(true) && both.matches_trace(false));

        let complex_only = query.with_collision_kind(false, true);
        assert!(complex_only.matches_trace(true));
        assert!(!complex_only.matches_trace(false));
    }
}
