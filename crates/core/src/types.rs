//! Type aliases and 'abstracting' newtypes.

use bevy::math::Vec3;
use bevy::reflect::Reflect;

#[cfg(any(feature = "asset_loader"))]
use serde::{Deserialize, Serialize};

pub use crate::thread_safe_wrapper::ThreadSafeRef;

/// Type alias to make it easier to switch out what datatype is used for time.
/// All timers on the Blackboard count in seconds of game time.
pub type Seconds = f32;

/// Type alias for positions, directions and waypoints.
pub type Point = Vec3;

/// Amount of health removed by a single hit.
pub type HealthAmount = i32;

pub type DecisionRef = ThreadSafeRef<dyn crate::decisions::Decision>;
pub type ActionRef = ThreadSafeRef<dyn crate::actions::Action>;
pub type StateGraphRef = ThreadSafeRef<crate::state::StateGraph>;

pub type StateKey = crate::state::StateKey;
pub type StateIdentifier = crate::identifiers::StateIdentifier;

/// A handle to an object owned by the host (usually the player).
///
/// This is a weak reference: the object may have been removed by the time an
/// Action reads it, so anything that needs its position has to ask the
/// `PerceptionQuery` service to resolve it again.
#[derive(Reflect, Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct TargetId(pub u64);

impl From<u64> for TargetId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<bevy::prelude::Entity> for TargetId {
    fn from(value: bevy::prelude::Entity) -> Self {
        Self(value.to_bits())
    }
}

impl core::fmt::Display for TargetId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Target#{}", self.0)
    }
}

/// A bitmask of physics layers a perception cast may hit.
#[derive(Reflect, Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
#[cfg_attr(any(feature = "asset_loader"), derive(Serialize, Deserialize))]
#[cfg_attr(any(feature = "asset_loader"), serde(transparent))]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(u32::MAX);

    /// A mask containing only the given layer index (0-31).
    pub const fn layer(index: u32) -> Self {
        Self(1 << index)
    }

    pub const fn contains_layer(&self, index: u32) -> bool {
        index < 32 && self.0 & (1 << index) != 0
    }

    pub const fn intersects(&self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn union(self, other: LayerMask) -> Self {
        Self(self.0 | other.0)
    }
}

/// The shape of a swept-sphere perception cast: how wide and how far.
#[derive(Reflect, Clone, Copy, Debug, PartialEq)]
#[cfg_attr(any(feature = "asset_loader"), derive(Serialize, Deserialize))]
pub struct CastShape {
    /// Maximum distance off the sightline.
    pub radius: f32,
    /// Maximum distance along the sightline.
    pub range: f32,
}

impl CastShape {
    pub const fn new(radius: f32, range: f32) -> Self {
        Self { radius, range }
    }
}

/// Where the agent looks from and which way it is facing.
#[derive(Reflect, Clone, Copy, Debug, PartialEq)]
pub struct EyeTransform {
    pub position: Point,
    pub forward: Point,
}

impl EyeTransform {
    pub fn new(position: Point, forward: Point) -> Self {
        Self {
            position,
            forward: forward.normalize_or_zero(),
        }
    }

    /// The point at the far end of a cast of the given shape.
    pub fn sightline_end(&self, shape: &CastShape) -> Point {
        self.position + self.forward * shape.range
    }
}

impl Default for EyeTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            forward: Vec3::Z,
        }
    }
}

/// What a perception cast reported hitting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CastHit {
    pub target: TargetId,
    pub point: Point,
    pub distance: f32,
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_mask_queries() {
        let player = LayerMask::layer(3);
        let mask = player.union(LayerMask::layer(5));

        assert!(mask.contains_layer(3));
        assert!(mask.contains_layer(5));
        assert!(!mask.contains_layer(4));
        assert!(!mask.contains_layer(40));
        assert!(mask.intersects(player));
        assert!(!LayerMask::NONE.intersects(LayerMask::ALL));
    }

    #[test]
    fn eye_forward_is_normalized() {
        let eyes = EyeTransform::new(Vec3::ZERO, Vec3::new(0., 0., 4.));
        assert_eq!(eyes.forward, Vec3::Z);
        assert_eq!(eyes.sightline_end(&CastShape::new(1., 10.)), Vec3::new(0., 0., 10.));
    }
}
