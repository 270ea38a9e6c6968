use bevy::prelude::*;

use pluggable_ai_core::controller::AIStateController;
use pluggable_ai_core::errors::ConfigError;
use pluggable_ai_core::game_services::{GameNotification, GameServicesHandle};
use pluggable_ai_core::identifiers::StateIdentifier;

/// Marks an Entity as an AI agent and holds its state machine.
///
/// Agents are set up automatically on the first frame after they are spawned
/// and ticked every Update after that.
#[derive(Component, Debug, Deref, DerefMut)]
pub struct AiAgent(pub AIStateController);

impl AiAgent {
    pub fn new(controller: AIStateController) -> Self {
        Self(controller)
    }
}

/// The session's GameServices, shared with the AI.
///
/// Hand clones of the inner handle to agents as their `HealthSink`.
#[derive(Resource, Debug, Clone, Default, Deref)]
pub struct GameServicesResource(pub GameServicesHandle);

/// An Event that signals an agent moved from one AIState to another.
#[derive(EntityEvent, Debug, Clone)]
pub struct AiStateTransitioned {
    /// The agent that transitioned.
    pub entity: Entity,
    pub from: StateIdentifier,
    pub to: StateIdentifier,
}

/// An Event that signals an agent failed setup and was deactivated.
///
/// Only raised under `SetupFailureStrategy::DeactivateWithLog`; the default
/// strategy panics instead.
#[derive(EntityEvent, Debug, Clone)]
pub struct AiSetupFailed {
    pub entity: Entity,
    pub error: ConfigError,
}

/// Re-raises every notification from the GameServices as an observable Event.
#[derive(Event, Debug, Clone)]
pub struct GameNotificationRaised(pub GameNotification);
