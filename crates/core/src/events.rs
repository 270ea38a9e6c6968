//! Records of what the state machine did, for hosts to forward to their own event systems.

use crate::identifiers::StateIdentifier;
use crate::state::StateKey;

/// An agent left one state and entered another.
///
/// Self-transitions never produce one of these; they are no-ops.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateTransition {
    pub from: StateKey,
    pub to: StateKey,
    pub from_name: StateIdentifier,
    pub to_name: StateIdentifier,
}
