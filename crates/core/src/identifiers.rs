//! Identifiers for key types.
//!
//! These are simple newtype wrappers whose main purpose is to keep state names
//! from being confused with any other String floating around in user code, and
//! to allow for Trait impls that do not 'leak' into the underlying type.

use core::borrow::Borrow;

use bevy::reflect::Reflect;

#[cfg(any(feature = "asset_loader"))]
use serde::{Serialize, Deserialize};


/// The human-readable name of an AIState within its StateGraph.
///
/// Names are unique within a graph; transitions in asset files refer to their
/// destination state by this name.
#[derive(Reflect, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(any(feature = "asset_loader"), derive(Serialize, Deserialize))]
#[cfg_attr(any(feature = "asset_loader"), serde(transparent))]
pub struct StateIdentifier(String);

impl StateIdentifier {
    pub fn from_string(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for StateIdentifier {
    fn from(value: &str) -> Self {
        Self::from_string(value.to_owned())
    }
}

impl From<String> for StateIdentifier {
    fn from(value: String) -> Self {
        Self::from_string(value)
    }
}

impl From<&String> for StateIdentifier {
    fn from(value: &String) -> Self {
        Self::from_string(value.to_owned())
    }
}

impl From<&StateIdentifier> for StateIdentifier {
    fn from(value: &StateIdentifier) -> Self {
        value.clone()
    }
}

impl Borrow<str> for StateIdentifier {
    fn borrow(&self) -> &str {
        self.0.borrow()
    }
}

impl Borrow<String> for StateIdentifier {
    fn borrow(&self) -> &String {
        &self.0
    }
}

impl core::fmt::Display for StateIdentifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.0.fmt(f)
    }
}
