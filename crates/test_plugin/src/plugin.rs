use bevy::{app::ScheduleRunnerPlugin, prelude::*};

use pluggable_ai_bevy_plugin::PluggableAiPlugin;

use crate::helpers::*;


pub struct AiTestPlugin; 

impl Plugin for AiTestPlugin {
    fn build(&self, app: &mut App) {
        app
        .add_plugins((
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(core::time::Duration::from_millis(20))),
            #[cfg(feature = "logging")]
            bevy::log::LogPlugin { 
                level: bevy::log::Level::DEBUG, 
                custom_layer: |_| None, 
                filter: "wgpu=error,bevy_render=info,bevy_ecs=info".to_string(),
                fmt_layer: |_| None,
            },
            PluggableAiPlugin,
        ))
        .init_resource::<TransitionLog>()
        .init_resource::<FrameBudget>()
        .add_observer(record_transition)
        .add_systems(
            Last, 
            (
                exit_when_out_of_frames,
            ).chain()
        )
        ;
    }
}
