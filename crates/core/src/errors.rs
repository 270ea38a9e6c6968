use bevy::ecs::resource::Resource;

use crate::types::StateIdentifier;

/// Something is wrong with how an agent or a state graph was put together.
///
/// These are designer/setup mistakes rather than runtime conditions; they are
/// reported once, at setup or load time, and never silently skipped during play.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A required host service was never provided to the agent.
    MissingService(&'static str),
    /// Some Action or Decision in the graph needs a home waypoint, but the Blackboard has none.
    MissingHomeWaypoint { required_by: &'static str },
    /// Some Action or Decision in the graph needs patrol waypoints, but the Blackboard has none.
    MissingPatrolWaypoints { required_by: &'static str },
    /// A transition (or lookup) names a state that does not exist in the graph.
    UnknownState(StateIdentifier),
    /// Two states in one graph share a name.
    DuplicateState(StateIdentifier),
    /// The requested initial state does not exist in the graph.
    UnknownInitialState(StateIdentifier),
    /// A graph with no states cannot have a current state.
    EmptyGraph,
    /// Wraps another error with the name of the state it was found in.
    InState { state: StateIdentifier, error: Box<ConfigError> },
}

impl ConfigError {
    pub fn in_state(self, state: &StateIdentifier) -> Self {
        Self::InState { state: state.clone(), error: Box::new(self) }
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::MissingService(service) => write!(f, "no {} service was provided", service),
            Self::MissingHomeWaypoint { required_by } => write!(
                f, "{} requires a home waypoint, but none is set", required_by
            ),
            Self::MissingPatrolWaypoints { required_by } => write!(
                f, "{} requires patrol waypoints, but none are set", required_by
            ),
            Self::UnknownState(name) => write!(f, "no state named {:?} exists in the graph", name.as_str()),
            Self::DuplicateState(name) => write!(f, "state {:?} is defined more than once", name.as_str()),
            Self::UnknownInitialState(name) => write!(
                f, "initial state {:?} does not exist in the graph", name.as_str()
            ),
            Self::EmptyGraph => write!(f, "a state graph needs at least one state"),
            Self::InState { state, error } => write!(f, "in state {:?}: {}", state.as_str(), error),
        }
    }
}

impl core::error::Error for ConfigError {}


/// A config value indicating how hosts should handle an agent whose `setup()` fails.
///
/// By default the host panics; a misconfigured agent is a designer error and
/// running it anyway would have it act on missing data. Users may opt in to
/// logging the error and keeping the agent around, switched off.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SetupFailureStrategy {
    #[default]
    Panic,
    DeactivateWithLog,
}

/// A Resource that represents app-wide configuration for how to handle agents that fail setup.
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct SetupFailureStrategyConfig(pub SetupFailureStrategy);

impl SetupFailureStrategyConfig {
    pub fn set(&mut self, strategy: SetupFailureStrategy) -> &mut Self {
        self.0 = strategy;
        self
    }

    /// Configures the app to panic if an agent fails setup.
    ///
    /// This is the default behavior, so this method is only useful if something
    /// else has already modified the default settings.
    pub fn set_panic(&mut self) -> &mut Self {
        self.set(SetupFailureStrategy::Panic)
    }

    /// Configures the app to log the error and deactivate the agent instead.
    ///
    /// The agent stays in the world and can be fixed up and reactivated by user code.
    pub fn set_deactivate(&mut self) -> &mut Self {
        self.set(SetupFailureStrategy::DeactivateWithLog)
    }

    pub fn get_current_value(&self) -> SetupFailureStrategy {
        self.0
    }
}
