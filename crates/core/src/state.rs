//! AIStates and the StateGraph that holds them.
//!
//! States refer to each other by `StateKey`, an index into their graph, rather
//! than by pointer; graphs are freely cyclic (Patrol -> Chase -> Patrol) and the
//! whole graph is shared read-only between agents behind a `StateGraphRef`.

use std::collections::HashMap;

use crate::actions::{Action, action_ref};
use crate::blackboard::Blackboard;
use crate::controller::AIStateController;
use crate::decisions::{Decision, decision_ref};
use crate::errors::ConfigError;
use crate::identifiers::StateIdentifier;
use crate::types::{ActionRef, DecisionRef};

/// Position of an AIState within its StateGraph.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct StateKey(usize);

impl StateKey {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A Decision guarding a move to another state.
#[derive(Clone, Debug)]
pub struct Transition {
    pub decision: DecisionRef,
    pub next_state: StateKey,
}

#[derive(Clone, Debug)]
pub struct AIState {
    pub name: StateIdentifier,
    pub enter_actions: Vec<ActionRef>,
    pub exit_actions: Vec<ActionRef>,
    pub update_actions: Vec<ActionRef>,
    /// In priority order; the first satisfied Transition wins.
    pub transitions: Vec<Transition>,
}

impl AIState {
    pub fn enter_state(&self, controller: &mut AIStateController) {
        controller.run_actions(&self.enter_actions);
    }

    pub fn exit_state(&self, controller: &mut AIStateController) {
        controller.run_actions(&self.exit_actions);
    }

    /// Runs one frame of this state: update actions first, then transitions.
    pub fn update_state(&self, controller: &mut AIStateController) {
        controller.run_actions(&self.update_actions);
        self.check_transitions(controller);
    }

    fn check_transitions(&self, controller: &mut AIStateController) {
        for transition in self.transitions.iter() {
            let outcome = controller.evaluate(&*transition.decision);

            if outcome.satisfied {
                controller.transition_to_state(transition.next_state);
                return
            }
        }
    }

    pub fn validate(&self, blackboard: &Blackboard) -> Result<(), ConfigError> {
        let actions = self.enter_actions.iter()
            .chain(self.update_actions.iter())
            .chain(self.exit_actions.iter());

        for action in actions {
            action.validate(blackboard).map_err(|err| err.in_state(&self.name))?;
        }

        for transition in self.transitions.iter() {
            transition.decision.validate(blackboard).map_err(|err| err.in_state(&self.name))?;
        }

        Ok(())
    }
}


/// A complete, resolved set of AIStates an agent can move between.
#[derive(Clone, Debug)]
pub struct StateGraph {
    states: Vec<AIState>,
    initial: StateKey,
    keys: HashMap<StateIdentifier, StateKey>,
}

impl StateGraph {
    pub fn builder() -> StateGraphBuilder {
        StateGraphBuilder::default()
    }

    pub fn initial(&self) -> StateKey {
        self.initial
    }

    pub fn state(&self, key: StateKey) -> Option<&AIState> {
        self.states.get(key.0)
    }

    pub fn key_of(&self, name: &str) -> Option<StateKey> {
        self.keys.get(name).copied()
    }

    pub fn contains(&self, key: StateKey) -> bool {
        key.0 < self.states.len()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StateKey, &AIState)> {
        self.states.iter().enumerate().map(|(idx, state)| (StateKey(idx), state))
    }

    /// Checks every Action and Decision in the graph against an agent's Blackboard.
    pub fn validate(&self, blackboard: &Blackboard) -> Result<(), ConfigError> {
        self.states.iter().try_for_each(|state| state.validate(blackboard))
    }
}


/// An AIState whose Transitions still name their destination instead of pointing at it.
#[derive(Clone, Debug)]
pub struct StateDraft {
    name: StateIdentifier,
    enter_actions: Vec<ActionRef>,
    exit_actions: Vec<ActionRef>,
    update_actions: Vec<ActionRef>,
    transitions: Vec<(DecisionRef, StateIdentifier)>,
}

impl StateDraft {
    pub fn new(name: impl Into<StateIdentifier>) -> Self {
        Self {
            name: name.into(),
            enter_actions: Vec::new(),
            exit_actions: Vec::new(),
            update_actions: Vec::new(),
            transitions: Vec::new(),
        }
    }

    pub fn name(&self) -> &StateIdentifier {
        &self.name
    }

    pub fn on_enter(self, action: impl Action + 'static) -> Self {
        self.on_enter_shared(action_ref(action))
    }

    pub fn on_enter_shared(mut self, action: ActionRef) -> Self {
        self.enter_actions.push(action); self
    }

    pub fn on_exit(self, action: impl Action + 'static) -> Self {
        self.on_exit_shared(action_ref(action))
    }

    pub fn on_exit_shared(mut self, action: ActionRef) -> Self {
        self.exit_actions.push(action); self
    }

    pub fn on_update(self, action: impl Action + 'static) -> Self {
        self.on_update_shared(action_ref(action))
    }

    pub fn on_update_shared(mut self, action: ActionRef) -> Self {
        self.update_actions.push(action); self
    }

    pub fn transition(self, decision: impl Decision + 'static, next: impl Into<StateIdentifier>) -> Self {
        self.transition_shared(decision_ref(decision), next)
    }

    pub fn transition_shared(mut self, decision: DecisionRef, next: impl Into<StateIdentifier>) -> Self {
        self.transitions.push((decision, next.into())); self
    }

    fn resolve(self, keys: &HashMap<StateIdentifier, StateKey>) -> Result<AIState, ConfigError> {
        let name = self.name;
        let transitions = self.transitions.into_iter()
            .map(|(decision, next)| match keys.get(&next) {
                Some(&next_state) => Ok(Transition { decision, next_state }),
                None => Err(ConfigError::UnknownState(next).in_state(&name)),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AIState {
            name,
            enter_actions: self.enter_actions,
            exit_actions: self.exit_actions,
            update_actions: self.update_actions,
            transitions,
        })
    }
}

/// Builder pattern for StateGraph
///
/// States may be added in any order; Transitions are resolved by name in
/// `build()`. The initial state defaults to the first state added.
#[derive(Clone, Debug, Default)]
pub struct StateGraphBuilder {
    drafts: Vec<StateDraft>,
    initial: Option<StateIdentifier>,
}

impl StateGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(mut self, draft: StateDraft) -> Self {
        self.drafts.push(draft); self
    }

    pub fn initial(mut self, name: impl Into<StateIdentifier>) -> Self {
        self.initial = Some(name.into()); self
    }

    pub fn build(self) -> Result<StateGraph, ConfigError> {
        if self.drafts.is_empty() {
            return Err(ConfigError::EmptyGraph)
        }

        let mut keys = HashMap::with_capacity(self.drafts.len());
        for (idx, draft) in self.drafts.iter().enumerate() {
            if keys.insert(draft.name.clone(), StateKey(idx)).is_some() {
                return Err(ConfigError::DuplicateState(draft.name.clone()))
            }
        }

        let initial = match self.initial {
            None => StateKey(0),
            Some(name) => match keys.get(&name) {
                Some(&key) => key,
                None => return Err(ConfigError::UnknownInitialState(name)),
            },
        };

        let states = self.drafts.into_iter()
            .map(|draft| draft.resolve(&keys))
            .collect::<Result<Vec<_>, _>>()?;

        #[cfg(feature = "logging")]
        bevy::log::debug!("StateGraphBuilder: built a graph of {} states", states.len());

        Ok(StateGraph { states, initial, keys })
    }
}
