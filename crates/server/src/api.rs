/*
This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
If a copy of the MPL was not distributed with this file,
You can obtain one at https://mozilla.org/MPL/2.0/.
*/
use bevy::prelude::*;
use pluggable_ai_bevy_plugin::{GameServicesResource, PluggableAiPlugin};
use pluggable_ai_core::game_services::GameServicesHandle;

/// Builds a headless App that runs AiAgent Components against `game`.
///
/// The App is not driven on its own; call `tick_world()` from the host loop,
/// or add a ScheduleRunnerPlugin to `app.run()` it instead.
pub fn create_app(game: GameServicesHandle) -> App {
    let mut app = App::new();
    app
    .add_plugins(MinimalPlugins)
    .add_plugins(PluggableAiPlugin)
    .insert_resource(GameServicesResource(game))
    ;

    #[cfg(feature = "logging")]
    app.add_plugins(
        bevy::log::LogPlugin {
            level: bevy::log::Level::DEBUG,
            custom_layer: |_| None,
            filter: "wgpu=error,bevy_render=info,bevy_ecs=info".to_string(),
            fmt_layer: |_| None,
        }
    );

    app
}

/// Runs one frame of the AI World.
pub fn tick_world(app: &mut App) -> &mut App {
    app.update();
    app
}


#[cfg(test)]
mod tests {
    use pluggable_ai_bevy_plugin::AiAgent;
    use pluggable_ai_core::blackboard::Blackboard;
    use pluggable_ai_core::controller::AIStateController;
    use pluggable_ai_core::decisions::WaitDecision;
    use pluggable_ai_core::game_services::GameServices;
    use pluggable_ai_core::state::{StateDraft, StateGraph};
    use pluggable_ai_core::testing::MockServices;
    use pluggable_ai_core::types::ThreadSafeRef;

    use super::*;

    #[test]
    fn app_ticks_spawned_agents() {
        let game = GameServicesHandle::new(GameServices::new());
        let mut app = create_app(game.clone());

        let graph = StateGraph::builder()
            .state(StateDraft::new("Wait").transition(WaitDecision { duration: 0. }, "Done"))
            .state(StateDraft::new("Done"))
            .build()
            .unwrap();

        let controller = AIStateController::new(
            ThreadSafeRef::new(graph),
            Blackboard::default(),
            MockServices::new().agent_services(),
        );
        let entity = app.world_mut().spawn(AiAgent::new(controller)).id();

        tick_world(&mut app);

        let state = app.world().get::<AiAgent>(entity)
            .and_then(|agent| agent.current_state_data().map(|s| s.name.to_string()));
        assert_eq!(state.as_deref(), Some("Done"));

        game.lock().pause();
        tick_world(&mut app);
        assert!(app.world().resource::<GameServicesResource>().is_paused());
    }
}
