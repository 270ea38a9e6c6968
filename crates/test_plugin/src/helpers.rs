use bevy::prelude::*;

use pluggable_ai_bevy_plugin::{AiAgent, AiStateTransitioned};
use pluggable_ai_core::blackboard::Blackboard;
use pluggable_ai_core::controller::AIStateController;
use pluggable_ai_core::state::StateGraph;
use pluggable_ai_core::testing::MockServices;
use pluggable_ai_core::types::ThreadSafeRef;

/// Every AiStateTransitioned Event raised so far, in order.
#[derive(Resource, Default, Debug)]
pub struct TransitionLog(pub Vec<AiStateTransitioned>);

impl TransitionLog {
    /// The destination state names seen for `entity`.
    pub fn destinations_of(&self, entity: Entity) -> Vec<String> {
        self.0.iter()
            .filter(|evt| evt.entity == entity)
            .map(|evt| evt.to.to_string())
            .collect()
    }
}

pub fn record_transition(
    event: On<AiStateTransitioned>,
    mut log: ResMut<TransitionLog>,
) {
    log.0.push(event.event().clone());
}

/// How many frames a test app may run before it exits on its own.
#[derive(Resource, Debug)]
pub struct FrameBudget(pub u32);

impl Default for FrameBudget {
    fn default() -> Self {
        Self(10)
    }
}

pub fn exit_when_out_of_frames(
    mut budget: ResMut<FrameBudget>,
    mut exit: MessageWriter<AppExit>,
) {
    budget.0 = budget.0.saturating_sub(1);
    if budget.0 == 0 {
        exit.write(AppExit::Success);
    }
}

/// Spawns an agent running `graph`, backed by fresh mocks which are returned for inspection.
pub fn spawn_mock_agent(world: &mut World, graph: StateGraph, blackboard: Blackboard) -> (Entity, MockServices) {
    let mocks = MockServices::new();
    let controller = AIStateController::new(ThreadSafeRef::new(graph), blackboard, mocks.agent_services());
    let entity = world.spawn(AiAgent::new(controller)).id();
    (entity, mocks)
}
