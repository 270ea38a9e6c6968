#![doc = include_str!("../README.md")]

pub use pluggable_ai_core::*;

pub mod prelude {
    pub use pluggable_ai_core::*;
    pub use pluggable_ai_core::types::*;
    pub use pluggable_ai_core::actions::{
        Action, ActionContext, AttackAction, ChaseAction, GoHomeAction, PatrolAction, WanderAction,
    };
    pub use pluggable_ai_core::blackboard::{Blackboard, BlackboardConfig};
    pub use pluggable_ai_core::controller::AIStateController;
    pub use pluggable_ai_core::decisions::{
        AtHomeDecision, AttackDecision, Decision, DecisionContext, DecisionOutcome, EndOfPatrolDecision,
        FirstAttackDecision, LookDecision, NotDecision, SelectionDecision, SequenceDecision, WaitDecision,
    };
    pub use pluggable_ai_core::errors::{ConfigError, SetupFailureStrategy, SetupFailureStrategyConfig};
    pub use pluggable_ai_core::events::StateTransition;
    pub use pluggable_ai_core::game_services::{GameNotification, GameServices, GameServicesHandle};
    pub use pluggable_ai_core::services::{AgentServices, AgentServicesBuilder};
    pub use pluggable_ai_core::state::{AIState, StateDraft, StateGraph, Transition};

    #[cfg(any(feature = "bevy_plugin", feature = "testing"))]
    pub use pluggable_ai_bevy_plugin::{AiAgent, GameServicesResource, PluggableAiPlugin};

    #[cfg(feature = "testing")]
    pub use pluggable_ai_test_plugin::AiTestPlugin;

    #[cfg(feature = "ai_server")]
    pub use pluggable_ai_server::{AgentId, AiServer, AiServerConfig};

    #[cfg(feature = "asset_loader")]
    pub use pluggable_ai_asset_loader;
}
