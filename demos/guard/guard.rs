//! A single guard, driven by an AiServer from a plain loop.
//!
//! The guard walks a square patrol route. Partway through, an intruder shows up
//! in front of it; the guard gives chase and strikes about once a second, then
//! walks home once the intruder is gone. Movement is faked by sliding the guard
//! towards whatever destination its navigation agent was last given.

use bevy::math::Vec3;

use pluggable_ai_core::actions::{AttackAction, ChaseAction, GoHomeAction, PatrolAction};
use pluggable_ai_core::blackboard::{Blackboard, BlackboardConfig};
use pluggable_ai_core::controller::AIStateController;
use pluggable_ai_core::decisions::{
    AtHomeDecision, AttackDecision, LookDecision, NotDecision, WaitDecision,
};
use pluggable_ai_core::errors::ConfigError;
use pluggable_ai_core::game_services::{GameServices, GameServicesHandle};
use pluggable_ai_core::services::AgentServices;
use pluggable_ai_core::state::{StateDraft, StateGraph};
use pluggable_ai_core::testing::MockServices;
use pluggable_ai_core::types::{CastHit, LayerMask, ThreadSafeRef};
use pluggable_ai_server::AiServer;

const PLAYER_LAYER: LayerMask = LayerMask::layer(8);
const INTRUDER: u64 = 1;
const FRAME: f32 = 0.1;

fn guard_graph() -> Result<StateGraph, ConfigError> {
    StateGraph::builder()
        .state(
            StateDraft::new("Patrol")
                .on_update(PatrolAction)
                .transition(LookDecision::new(PLAYER_LAYER), "Chase")
        )
        .state(
            StateDraft::new("Chase")
                .on_update(ChaseAction)
                .transition(AttackDecision::new(PLAYER_LAYER), "Strike")
                .transition(NotDecision::new(LookDecision::new(PLAYER_LAYER)), "Return")
        )
        .state(
            StateDraft::new("Strike")
                .on_enter(AttackAction { damage: 3 })
                .transition(WaitDecision { duration: 1. }, "Chase")
        )
        .state(
            StateDraft::new("Return")
                .on_update(GoHomeAction)
                .transition(LookDecision::new(PLAYER_LAYER), "Chase")
                .transition(AtHomeDecision { threshold: Some(0.5) }, "Patrol")
        )
        .build()
}

fn main() -> Result<(), ConfigError> {
    let intruder = INTRUDER.into();
    let game = GameServicesHandle::new(GameServices::new().with_player(intruder));
    let mut server = AiServer::new(game.clone());

    let mocks = MockServices::new();
    let services = AgentServices::builder()
        .navigation(mocks.navigation.clone())
        .perception(mocks.perception.clone())
        .animator(mocks.animator.clone())
        .health(game.clone())
        .seed(7)
        .build()?;

    let config = BlackboardConfig { patrol_pause_duration: 1., ..Default::default() };
    let blackboard = Blackboard::new(config)
        .with_home(Vec3::ZERO)
        .with_patrol([
            Vec3::new(5., 0., 0.),
            Vec3::new(5., 0., 5.),
            Vec3::new(0., 0., 5.),
            Vec3::ZERO,
        ]);

    let guard = server.spawn(AIStateController::new(ThreadSafeRef::new(guard_graph()?), blackboard, services))?;

    for frame in 0..300 {
        match frame {
            100 => {
                println!("[{frame:>3}] an intruder appears");
                mocks.perception.place(intruder, Vec3::new(3., 0., 3.));
                mocks.perception.set_hit(PLAYER_LAYER, CastHit {
                    target: intruder,
                    point: Vec3::new(3., 0., 3.),
                    distance: 0.5,
                });
            },
            160 => {
                println!("[{frame:>3}] the intruder slips away");
                mocks.perception.clear_hit();
                mocks.perception.remove(intruder);
            },
            _ => {},
        }

        for (id, transition) in server.tick(FRAME) {
            println!("[{frame:>3}] {id}: {} -> {}", transition.from_name, transition.to_name);
        }

        for notification in server.drain_notifications() {
            println!("[{frame:>3}] game: {notification:?}");
        }

        if let (Some(agent), Some(destination)) = (server.agent_mut(guard), mocks.navigation.last_destination()) {
            let step = mocks.navigation.current_speed() * FRAME;
            let position = agent.blackboard.position;
            agent.blackboard.position = position + (destination - position).clamp_length_max(step);
        }
    }

    println!("intruder health: {}", game.lock().health());
    Ok(())
}
