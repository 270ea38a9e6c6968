use core::time::Duration;

use pluggable_ai_core::controller::AIStateController;
use pluggable_ai_core::errors::ConfigError;
use pluggable_ai_core::events::StateTransition;
use pluggable_ai_core::game_services::{GameNotification, GameServicesHandle};
use pluggable_ai_core::types::Seconds;

/// Longest frame the server will simulate in one tick, unless overridden at build time.
const DEFAULT_MAX_DELTA: Duration = Duration::from_millis(250);

/// Handle to an agent owned by an AiServer.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct AgentId(pub u64);

impl core::fmt::Display for AgentId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Agent#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AiServerConfig {
    /// Deltas passed to `tick()` are clamped to this, so a stalled host
    /// does not fast-forward every Wait and patrol pause at once.
    pub max_delta: Seconds,
}

impl Default for AiServerConfig {
    fn default() -> Self {
        let max_delta = option_env!("PLUGGABLE_AI_MAX_DELTA_MS")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_MAX_DELTA)
        ;

        Self { max_delta: max_delta.as_secs_f32() }
    }
}

/// Owns a set of agents and advances them together, one host frame at a time.
#[derive(Debug, Default)]
pub struct AiServer {
    /// In spawn order; this is also the order agents are ticked in.
    agents: Vec<(AgentId, AIStateController)>,
    next_id: u64,
    game: GameServicesHandle,
    config: AiServerConfig,
}

impl AiServer {
    pub fn new(game: GameServicesHandle) -> Self {
        Self {
            game,
            ..Default::default()
        }
    }

    pub fn with_config(mut self, config: AiServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &AiServerConfig {
        &self.config
    }

    pub fn game(&self) -> &GameServicesHandle {
        &self.game
    }

    /// Sets up `controller` and takes ownership of it.
    ///
    /// An agent that fails setup is dropped and the error returned; it is never ticked.
    pub fn spawn(&mut self, mut controller: AIStateController) -> Result<AgentId, ConfigError> {
        controller.setup()?;

        let id = AgentId(self.next_id);
        self.next_id += 1;

        #[cfg(feature = "logging")]
        bevy::log::debug!("AiServer: spawned {}", id);

        self.agents.push((id, controller));
        Ok(id)
    }

    pub fn despawn(&mut self, id: AgentId) -> Option<AIStateController> {
        let idx = self.agents.iter().position(|(agent_id, _)| *agent_id == id)?;
        let (_, controller) = self.agents.remove(idx);
        Some(controller)
    }

    pub fn agent(&self, id: AgentId) -> Option<&AIStateController> {
        self.agents.iter().find(|(agent_id, _)| *agent_id == id).map(|(_, ctrl)| ctrl)
    }

    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut AIStateController> {
        self.agents.iter_mut().find(|(agent_id, _)| *agent_id == id).map(|(_, ctrl)| ctrl)
    }

    pub fn agent_ids(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.agents.iter().map(|(id, _)| *id)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Advances every agent by `delta` seconds (clamped), in spawn order.
    ///
    /// Does nothing while the game is paused. Returns the state changes made
    /// this tick, in the order they happened.
    pub fn tick(&mut self, delta: Seconds) -> Vec<(AgentId, StateTransition)> {
        if self.game.is_paused() {
            return Vec::new()
        }

        let delta = delta.clamp(0., self.config.max_delta.max(0.));

        self.agents.iter_mut()
            .flat_map(|(id, controller)| {
                let id = *id;
                controller.tick(delta).into_iter().map(move |transition| (id, transition))
            })
            .collect()
    }

    /// Takes every GameServices notification raised since the last call.
    pub fn drain_notifications(&self) -> Vec<GameNotification> {
        self.game.lock().drain_notifications()
    }
}
