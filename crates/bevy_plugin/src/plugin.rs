/*
This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
If a copy of the MPL was not distributed with this file,
You can obtain one at https://mozilla.org/MPL/2.0/.
*/

use bevy::prelude::*;
use pluggable_ai_core::errors::{SetupFailureStrategy, SetupFailureStrategyConfig};
use pluggable_ai_core::types::EyeTransform;

#[cfg(feature = "include_asset_loader")]
use pluggable_ai_asset_loader::{StateGraphAssetPlugin, json_support::JsonStateGraphLoader};

use crate::agent::{AiAgent, AiSetupFailed, AiStateTransitioned, GameNotificationRaised, GameServicesResource};

/// Copies the Transform of every agent that has one onto its Blackboard.
pub fn sync_agent_pose(
    mut agents: Query<(&Transform, &mut AiAgent)>,
) {
    for (transform, mut agent) in agents.iter_mut() {
        let blackboard = &mut agent.blackboard;
        blackboard.position = transform.translation;
        blackboard.eyes = EyeTransform::new(transform.translation, *transform.forward());
    }
}

/// Runs `setup()` on freshly spawned agents, handling failures per the SetupFailureStrategyConfig.
pub fn setup_new_agents(
    strategy: Res<SetupFailureStrategyConfig>,
    mut agents: Query<(Entity, &mut AiAgent), Added<AiAgent>>,
    mut commands: Commands,
) {
    for (entity, mut agent) in agents.iter_mut() {
        let error = match agent.setup() {
            Ok(()) => {
                #[cfg(feature = "logging")]
                bevy::log::debug!("setup_new_agents: agent {:?} is ready", entity);
                continue
            },
            Err(error) => error,
        };

        match strategy.get_current_value() {
            SetupFailureStrategy::Panic => {
                panic!("AI agent {:?} failed setup: {}", entity, error)
            },
            SetupFailureStrategy::DeactivateWithLog => {
                #[cfg(feature = "logging")]
                bevy::log::error!("AI agent {:?} failed setup, deactivating it: {}", entity, error);

                agent.is_active = false;
                commands.trigger(AiSetupFailed { entity, error });
            },
        }
    }
}

/// Ticks every set-up agent by this frame's delta, unless the game is paused.
pub fn tick_agents(
    time: Res<Time>,
    game: Res<GameServicesResource>,
    mut agents: Query<(Entity, &mut AiAgent)>,
    mut commands: Commands,
) {
    if game.is_paused() {
        return
    }

    let delta = time.delta_secs();

    for (entity, mut agent) in agents.iter_mut() {
        if !agent.is_set_up() {
            continue
        }

        for transition in agent.tick(delta) {
            #[cfg(feature = "logging")]
            bevy::log::debug!(
                "tick_agents: agent {:?} moved from {} to {}",
                entity, transition.from_name, transition.to_name,
            );

            commands.trigger(AiStateTransitioned {
                entity,
                from: transition.from_name,
                to: transition.to_name,
            });
        }
    }
}

/// Drains the GameServices notification queue into GameNotificationRaised Events.
pub fn forward_game_notifications(
    game: Res<GameServicesResource>,
    mut commands: Commands,
) {
    let notifications = game.lock().drain_notifications();
    for notification in notifications {
        commands.trigger(GameNotificationRaised(notification));
    }
}


pub struct PluggableAiPlugin;

impl Plugin for PluggableAiPlugin {
    fn build(&self, app: &mut App) {
        #[cfg(feature = "include_asset_loader")]
        app
        .add_plugins((
            StateGraphAssetPlugin::<JsonStateGraphLoader>::default(),
        ));

        app
        .init_resource::<SetupFailureStrategyConfig>()
        .init_resource::<GameServicesResource>()
        .add_systems(
            Update,
            (
                sync_agent_pose,
                setup_new_agents,
                tick_agents,
                forward_game_notifications,
            ).chain()
        )
        ;
    }
}
