//! Game-wide state the AI interacts with: player health, pausing and scenes.
//!
//! There is exactly one of these per game session. Agents never own it; they
//! reach it through a `GameServicesHandle` (usually as their `HealthSink`), and
//! hosts drain its notifications once per frame to drive UI and scene changes.

use std::sync::{Mutex, MutexGuard};

use crate::services::HealthSink;
use crate::types::{HealthAmount, TargetId, ThreadSafeRef};

pub const INITIAL_HEALTH: HealthAmount = 10;

/// Scene names starting with this are playable levels.
pub const LEVEL_SCENE_PREFIX: &str = "Level";
pub const CREDITS_SCENE: &str = "Credits";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GameState {
    #[default]
    Menu,
    Playing,
    Credits,
}

impl GameState {
    /// What kind of scene `scene` is, judging by its name.
    pub fn for_scene(scene: &str) -> Self {
        match scene {
            s if s.starts_with(LEVEL_SCENE_PREFIX) => Self::Playing,
            CREDITS_SCENE => Self::Credits,
            _ => Self::Menu,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PauseState {
    #[default]
    Running,
    Paused,
}

/// Things that happened to the game since the host last looked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameNotification {
    HealthChanged { health: HealthAmount },
    GameOver,
    Paused,
    Resumed,
    SceneChanged { scene: String, state: GameState },
}

#[derive(Debug)]
pub struct GameServices {
    health: HealthAmount,
    game_state: GameState,
    pause_state: PauseState,
    /// The only target whose damage counts against `health`; None means 'anyone'.
    player: Option<TargetId>,
    notifications: Vec<GameNotification>,
}

impl Default for GameServices {
    fn default() -> Self {
        Self::new()
    }
}

impl GameServices {
    pub fn new() -> Self {
        Self {
            health: INITIAL_HEALTH,
            game_state: GameState::default(),
            pause_state: PauseState::default(),
            player: None,
            notifications: Vec::new(),
        }
    }

    pub fn with_player(mut self, player: TargetId) -> Self {
        self.player = Some(player);
        self
    }

    pub fn health(&self) -> HealthAmount {
        self.health
    }

    pub fn game_state(&self) -> GameState {
        self.game_state
    }

    pub fn pause_state(&self) -> PauseState {
        self.pause_state
    }

    pub fn is_paused(&self) -> bool {
        self.pause_state == PauseState::Paused
    }

    pub fn player(&self) -> Option<TargetId> {
        self.player
    }

    pub fn set_player(&mut self, player: Option<TargetId>) {
        self.player = player;
    }

    pub fn add_health(&mut self, amount: HealthAmount) {
        self.health += amount;
        self.notifications.push(GameNotification::HealthChanged { health: self.health });
    }

    /// Removes health; every hit that leaves the player at zero or below is a game over.
    pub fn remove_health(&mut self, amount: HealthAmount) {
        self.health -= amount;

        if self.health <= 0 {
            #[cfg(feature = "logging")]
            bevy::log::info!("GameServices: health is down to {}, game over", self.health);

            self.notifications.push(GameNotification::GameOver);
        }

        self.notifications.push(GameNotification::HealthChanged { health: self.health });
    }

    pub fn pause(&mut self) {
        self.pause_state = PauseState::Paused;
        self.notifications.push(GameNotification::Paused);
    }

    pub fn resume(&mut self) {
        self.pause_state = PauseState::Running;
        self.notifications.push(GameNotification::Resumed);
    }

    /// Records a scene change; entering a level always unpauses the game.
    pub fn change_scene(&mut self, scene: &str) {
        let state = GameState::for_scene(scene);
        self.game_state = state;
        self.notifications.push(GameNotification::SceneChanged { scene: scene.to_owned(), state });

        if state == GameState::Playing {
            self.resume();
        }
    }

    /// Takes every notification raised since the last call, oldest first.
    pub fn drain_notifications(&mut self) -> Vec<GameNotification> {
        core::mem::take(&mut self.notifications)
    }
}


/// A shared handle to the session's GameServices.
#[derive(Debug, Clone)]
pub struct GameServicesHandle(ThreadSafeRef<Mutex<GameServices>>);

impl GameServicesHandle {
    pub fn new(services: GameServices) -> Self {
        Self(ThreadSafeRef::new(Mutex::new(services)))
    }

    /// Locks the GameServices for the caller. A poisoned lock is recovered, not propagated.
    pub fn lock(&self) -> MutexGuard<'_, GameServices> {
        self.0.lock().unwrap_or_else(|poisoned| {
            #[cfg(feature = "logging")]
            bevy::log::warn!("GameServicesHandle: recovering from a poisoned lock");

            poisoned.into_inner()
        })
    }

    pub fn is_paused(&self) -> bool {
        self.lock().is_paused()
    }
}

impl Default for GameServicesHandle {
    fn default() -> Self {
        Self::new(GameServices::new())
    }
}

impl HealthSink for GameServicesHandle {
    fn remove_health(&mut self, target: TargetId, amount: HealthAmount) {
        let mut game = self.lock();

        match game.player() {
            Some(player) if player != target => {
                #[cfg(feature = "logging")]
                bevy::log::debug!("GameServicesHandle: ignoring a hit on non-player {}", target);
            },
            _ => game.remove_health(amount),
        }
    }
}
