//! The AIStateController: one agent's runtime half of the state machine.
//!
//! The controller owns everything that is specific to one agent (its Blackboard,
//! its host services, its current state) and points at a shared, immutable
//! StateGraph for everything else. Hosts call `setup()` once and `tick()` once
//! per frame; nothing in here ever blocks or waits.

use crate::actions::ActionContext;
use crate::blackboard::Blackboard;
use crate::decisions::{Decision, DecisionContext, DecisionOutcome};
use crate::errors::ConfigError;
use crate::events::StateTransition;
use crate::services::AgentServices;
use crate::state::{AIState, StateGraph};
use crate::types::{ActionRef, Point, Seconds, StateGraphRef, StateKey};

#[derive(Debug)]
pub struct AIStateController {
    graph: StateGraphRef,
    current_state: StateKey,
    /// While false, the current state is not updated; the timer keeps running.
    pub is_active: bool,
    is_set_up: bool,
    pub blackboard: Blackboard,
    pub services: AgentServices,
    /// Transitions not yet reported by `tick()`, oldest first.
    pending_transitions: Vec<StateTransition>,
}

impl AIStateController {
    /// Creates an agent sitting in the graph's initial state.
    ///
    /// The agent starts active, but should not be ticked before `setup()`.
    pub fn new(graph: StateGraphRef, blackboard: Blackboard, services: AgentServices) -> Self {
        Self {
            current_state: graph.initial(),
            graph,
            is_active: true,
            is_set_up: false,
            blackboard,
            services,
            pending_transitions: Vec::new(),
        }
    }

    pub fn graph(&self) -> &StateGraph {
        &self.graph
    }

    pub fn graph_ref(&self) -> StateGraphRef {
        self.graph.clone()
    }

    pub fn current_state(&self) -> StateKey {
        self.current_state
    }

    pub fn current_state_data(&self) -> Option<&AIState> {
        self.graph.state(self.current_state)
    }

    pub fn is_set_up(&self) -> bool {
        self.is_set_up
    }

    /// One-time preparation before the first tick.
    ///
    /// Validates every Action and Decision in the graph against this agent's
    /// Blackboard, then snaps the home and patrol waypoints onto the navigable
    /// surface. Waypoints with no surface nearby are kept as they are.
    ///
    /// Enter actions of the initial state are NOT run. Calling this again after
    /// a success does nothing.
    pub fn setup(&mut self) -> Result<(), ConfigError> {
        if self.is_set_up {
            return Ok(())
        }

        self.graph.validate(&self.blackboard)?;

        let surface = &self.services.surface;
        let radius = self.blackboard.config.check_radius;
        let snap = |point: Point| surface.sample_nearest(point, radius).unwrap_or(point);

        self.blackboard.home_waypoint = self.blackboard.home_waypoint.map(snap);
        for waypoint in self.blackboard.patrol_waypoints.iter_mut() {
            *waypoint = snap(*waypoint);
        }

        #[cfg(feature = "logging")]
        bevy::log::debug!(
            "AIStateController::setup(): ready in state {:?}, home {:?}, {} patrol waypoint(s)",
            self.current_state_data().map(|s| s.name.as_str()),
            self.blackboard.home_waypoint,
            self.blackboard.patrol_waypoints.len(),
        );

        self.is_set_up = true;
        Ok(())
    }

    /// Advances this agent by one frame of `delta` seconds.
    ///
    /// Updates the current state if the agent is active, then advances the state
    /// timer regardless. Returns every state change made since the last tick,
    /// in the order they happened.
    pub fn tick(&mut self, delta: Seconds) -> Vec<StateTransition> {
        if self.is_active {
            let graph = self.graph.clone();
            if let Some(state) = graph.state(self.current_state) {
                state.update_state(self);
            }
        }

        self.blackboard.advance(delta);
        core::mem::take(&mut self.pending_transitions)
    }

    /// Leaves the current state for `next`, running exit then enter actions.
    ///
    /// Moving to the current state is a no-op: nothing runs and nothing is reset.
    pub fn transition_to_state(&mut self, next: StateKey) {
        if next == self.current_state {
            return
        }

        let graph = self.graph.clone();
        let (Some(old), Some(new)) = (graph.state(self.current_state), graph.state(next)) else {
            #[cfg(feature = "logging")]
            bevy::log::error!(
                "AIStateController: ignoring transition to {:?}, which is not part of this agent's graph",
                next,
            );
            return
        };

        old.exit_state(self);

        let from = self.current_state;
        self.current_state = next;
        self.blackboard.reset_transients();

        #[cfg(feature = "logging")]
        bevy::log::debug!("AIStateController: {} -> {}", old.name, new.name);

        new.enter_state(self);

        self.pending_transitions.push(StateTransition {
            from,
            to: next,
            from_name: old.name.clone(),
            to_name: new.name.clone(),
        });
    }

    /// Like `transition_to_state()`, looking the state up by name.
    pub fn transition_to_named_state(&mut self, name: &str) -> Result<(), ConfigError> {
        let key = self.graph.key_of(name).ok_or_else(|| ConfigError::UnknownState(name.into()))?;
        self.transition_to_state(key);
        Ok(())
    }

    /// Runs `actions` in order against this agent.
    pub fn run_actions(&mut self, actions: &[ActionRef]) {
        let mut ctx = ActionContext {
            blackboard: &mut self.blackboard,
            services: &mut self.services,
        };

        for action in actions {
            action.act(&mut ctx);
        }
    }

    /// Asks `decision` about this agent, binding any target it reports.
    pub fn evaluate(&mut self, decision: &dyn Decision) -> DecisionOutcome {
        let outcome = decision.decide(&DecisionContext {
            blackboard: &self.blackboard,
            perception: &*self.services.perception,
        });

        if let Some(target) = outcome.target {
            self.blackboard.chase_target = Some(target);
        }

        outcome
    }
}


#[cfg(test)]
mod tests {
    use bevy::math::Vec3;

    use super::*;
    use crate::actions::{ChaseAction, GoHomeAction, PatrolAction};
    use crate::decisions::{SequenceDecision, decision_ref};
    use crate::state::{StateDraft, StateGraphBuilder};
    use crate::testing::{CountingDecision, FixedHeightSurface, MockServices, RecordingAction};
    use crate::types::{TargetId, ThreadSafeRef};

    fn controller(builder: StateGraphBuilder, blackboard: Blackboard) -> (AIStateController, MockServices) {
        let graph = match builder.build() {
            Ok(graph) => graph,
            Err(err) => panic!("unexpected error: {}", err),
        };
        let mocks = MockServices::new();
        let ctrl = AIStateController::new(ThreadSafeRef::new(graph), blackboard, mocks.agent_services());
        (ctrl, mocks)
    }

    fn name_of(ctrl: &AIStateController) -> &str {
        ctrl.current_state_data().map(|s| s.name.as_str()).unwrap_or("<none>")
    }

    #[test]
    fn first_satisfied_transition_wins() {
        let first = CountingDecision::new(true);
        let second = CountingDecision::new(true);
        let (mut ctrl, _) = controller(
            StateGraph::builder()
                .state(
                    StateDraft::new("Idle")
                        .transition(CountingDecision::new(false), "C")
                        .transition(first.clone(), "A")
                        .transition(second.clone(), "B")
                )
                .state(StateDraft::new("A"))
                .state(StateDraft::new("B"))
                .state(StateDraft::new("C")),
            Blackboard::default(),
        );

        let transition = ctrl.tick(0.1);

        assert_eq!(name_of(&ctrl), "A");
        assert_eq!(transition.into_iter().map(|t| t.to_name).collect::<Vec<_>>(), vec!["A".into()]);
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 0);
    }

    #[test]
    fn self_transition_is_a_no_op() {
        let journal = RecordingAction::journal();
        let (mut ctrl, _) = controller(
            StateGraph::builder().state(
                StateDraft::new("Idle")
                    .on_enter(RecordingAction::new("enter", &journal))
                    .on_exit(RecordingAction::new("exit", &journal))
                    .transition(CountingDecision::new(true), "Idle")
            ),
            Blackboard::default(),
        );
        ctrl.blackboard.timer = 3.;
        ctrl.blackboard.patrol_cycles = 2;

        let transition = ctrl.tick(0.5);

        assert!(transition.is_empty());
        assert!(RecordingAction::labels(&journal).is_empty());
        assert_eq!(ctrl.blackboard.timer, 3.5);
        assert_eq!(ctrl.blackboard.patrol_cycles, 2);
    }

    #[test]
    fn exit_runs_before_enter_and_entry_sees_the_reset() {
        let journal = RecordingAction::journal();
        let (mut ctrl, _) = controller(
            StateGraph::builder()
                .state(
                    StateDraft::new("Patrol")
                        .on_exit(RecordingAction::new("exit patrol", &journal))
                        .transition(CountingDecision::new(true), "Chase")
                )
                .state(
                    StateDraft::new("Chase")
                        .on_enter(RecordingAction::new("enter chase", &journal))
                        .on_enter(RecordingAction::new("enter chase again", &journal))
                ),
            Blackboard::default(),
        );
        ctrl.blackboard.timer = 7.;
        ctrl.blackboard.patrol_cycles = 4;
        ctrl.blackboard.wander_restart = false;

        ctrl.tick(0.25);

        let seen = RecordingAction::observations(&journal);
        assert_eq!(
            seen.iter().map(|obs| obs.label).collect::<Vec<_>>(),
            vec!["exit patrol", "enter chase", "enter chase again"]
        );
        assert_eq!(seen[0].timer, 7.);
        assert_eq!(seen[0].patrol_cycles, 4);
        assert_eq!(seen[1].timer, 0.);
        assert_eq!(seen[1].patrol_cycles, 0);
        assert!(seen[1].wander_restart);
        // The timer still advances on the frame of the transition.
        assert_eq!(ctrl.blackboard.timer, 0.25);
    }

    #[test]
    fn update_actions_run_before_transitions() {
        let journal = RecordingAction::journal();
        let (mut ctrl, _) = controller(
            StateGraph::builder()
                .state(
                    StateDraft::new("A")
                        .on_update(RecordingAction::new("update a", &journal))
                        .on_exit(RecordingAction::new("exit a", &journal))
                        .transition(CountingDecision::new(true), "B")
                )
                .state(StateDraft::new("B").on_update(RecordingAction::new("update b", &journal))),
            Blackboard::default(),
        );

        ctrl.tick(0.1);
        ctrl.tick(0.1);

        assert_eq!(RecordingAction::labels(&journal), vec!["update a", "exit a", "update b"]);
    }

    #[test]
    fn inactive_agents_only_keep_time() {
        let gate = CountingDecision::new(true);
        let journal = RecordingAction::journal();
        let (mut ctrl, _) = controller(
            StateGraph::builder()
                .state(
                    StateDraft::new("A")
                        .on_update(RecordingAction::new("update", &journal))
                        .transition(gate.clone(), "B")
                )
                .state(StateDraft::new("B")),
            Blackboard::default(),
        );
        ctrl.is_active = false;

        assert!(ctrl.tick(1.).is_empty());
        assert_eq!(ctrl.blackboard.timer, 1.);
        assert_eq!(gate.calls(), 0);
        assert!(RecordingAction::labels(&journal).is_empty());
    }

    #[test]
    fn spotted_target_sticks_even_if_the_transition_fails() {
        let spotter = decision_ref(CountingDecision::new(true).with_target(TargetId(42)));
        let veto = decision_ref(CountingDecision::new(false));
        let (mut ctrl, _) = controller(
            StateGraph::builder()
                .state(StateDraft::new("Idle").transition(SequenceDecision::new([spotter, veto]), "Chase"))
                .state(StateDraft::new("Chase").on_update(ChaseAction)),
            Blackboard::default(),
        );

        ctrl.tick(0.1);

        assert_eq!(name_of(&ctrl), "Idle");
        assert_eq!(ctrl.blackboard.chase_target, Some(TargetId(42)));
    }

    #[test]
    fn setup_validates_before_touching_anything() {
        let (mut ctrl, _) = controller(
            StateGraph::builder().state(StateDraft::new("Return").on_update(GoHomeAction)),
            Blackboard::default(),
        );

        assert_eq!(
            ctrl.setup(),
            Err(ConfigError::MissingHomeWaypoint { required_by: "GoHome" }.in_state(&"Return".into()))
        );
        assert!(!ctrl.is_set_up());
    }

    #[test]
    fn setup_snaps_waypoints_once() {
        let graph = match StateGraph::builder().state(StateDraft::new("Patrol").on_update(PatrolAction)).build() {
            Ok(graph) => graph,
            Err(err) => panic!("unexpected error: {}", err),
        };
        let mocks = MockServices::new();
        let blackboard = Blackboard::default()
            .with_home(Vec3::new(1., 5., 1.))
            .with_patrol([Vec3::new(0., 3., 0.), Vec3::new(50., 3., 0.)]);
        let services = mocks.agent_services_on(FixedHeightSurface::new(0.).with_extent(20.));
        let mut ctrl = AIStateController::new(ThreadSafeRef::new(graph), blackboard, services);

        assert_eq!(ctrl.setup(), Ok(()));
        assert_eq!(ctrl.blackboard.home_waypoint, Some(Vec3::new(1., 0., 1.)));
        assert_eq!(
            ctrl.blackboard.patrol_waypoints,
            vec![Vec3::new(0., 0., 0.), Vec3::new(50., 3., 0.)]
        );

        ctrl.blackboard.home_waypoint = Some(Vec3::new(1., 5., 1.));
        assert_eq!(ctrl.setup(), Ok(()));
        assert_eq!(ctrl.blackboard.home_waypoint, Some(Vec3::new(1., 5., 1.)));
    }

    #[test]
    fn named_transitions_resolve_or_fail() {
        let journal = RecordingAction::journal();
        let (mut ctrl, _) = controller(
            StateGraph::builder()
                .state(StateDraft::new("A"))
                .state(StateDraft::new("B").on_enter(RecordingAction::new("enter b", &journal))),
            Blackboard::default(),
        );

        assert_eq!(ctrl.transition_to_named_state("B"), Ok(()));
        assert_eq!(name_of(&ctrl), "B");
        assert_eq!(RecordingAction::labels(&journal), vec!["enter b"]);
        assert_eq!(
            ctrl.transition_to_named_state("Z"),
            Err(ConfigError::UnknownState("Z".into()))
        );

        // Transitions made outside of tick() are reported by the next tick.
        let reported = ctrl.tick(0.1);
        assert_eq!(
            reported.into_iter().map(|t| (t.from_name, t.to_name)).collect::<Vec<_>>(),
            vec![("A".into(), "B".into())]
        );
    }

    #[test]
    fn outside_and_ticked_transitions_are_both_reported() {
        let (mut ctrl, _) = controller(
            StateGraph::builder()
                .state(StateDraft::new("A"))
                .state(StateDraft::new("B").transition(CountingDecision::new(true), "C"))
                .state(StateDraft::new("C")),
            Blackboard::default(),
        );

        assert_eq!(ctrl.transition_to_named_state("B"), Ok(()));
        let reported = ctrl.tick(0.1);

        assert_eq!(name_of(&ctrl), "C");
        assert_eq!(
            reported.iter().map(|t| (t.from_name.as_str(), t.to_name.as_str())).collect::<Vec<_>>(),
            vec![("A", "B"), ("B", "C")]
        );
        assert!(ctrl.tick(0.1).is_empty());
    }
}
