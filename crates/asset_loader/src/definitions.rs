//! Serializable descriptions of state graphs and agents, as written by designers.
//!
//! Definitions only name things; `resolve()` turns them into live Actions,
//! Decisions and a StateGraph, failing on anything that does not add up
//! (unknown or duplicate state names and the like).

use bevy::asset::Asset;
use bevy::math::Vec3;
use bevy::reflect::TypePath;
use serde::{Deserialize, Serialize};

use pluggable_ai_core::actions::{
    AttackAction, ChaseAction, GoHomeAction, PatrolAction, WanderAction, action_ref,
};
use pluggable_ai_core::blackboard::{Blackboard, BlackboardConfig};
use pluggable_ai_core::decisions::{
    AtHomeDecision, AttackDecision, EndOfPatrolDecision, FirstAttackDecision, LookDecision,
    NotDecision, SelectionDecision, SequenceDecision, WaitDecision, decision_ref,
};
use pluggable_ai_core::errors::ConfigError;
use pluggable_ai_core::identifiers::StateIdentifier;
use pluggable_ai_core::state::{StateDraft, StateGraph};
use pluggable_ai_core::types::{ActionRef, CastShape, DecisionRef, HealthAmount, LayerMask, Seconds};

fn default_damage() -> HealthAmount {
    AttackAction::default().damage
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum ActionDefinition {
    Chase,
    Wander,
    Patrol,
    GoHome,
    Attack {
        #[serde(default = "default_damage")]
        damage: HealthAmount,
    },
}

impl ActionDefinition {
    pub fn to_action_ref(&self) -> ActionRef {
        match self {
            Self::Chase => action_ref(ChaseAction),
            Self::Wander => action_ref(WanderAction),
            Self::Patrol => action_ref(PatrolAction),
            Self::GoHome => action_ref(GoHomeAction),
            Self::Attack { damage } => action_ref(AttackAction { damage: *damage }),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum DecisionDefinition {
    Look {
        layers: LayerMask,
        #[serde(default)]
        shape: Option<CastShape>,
    },
    Attack {
        layers: LayerMask,
        #[serde(default)]
        shape: Option<CastShape>,
    },
    AtHome {
        #[serde(default)]
        threshold: Option<f32>,
    },
    Wait {
        duration: Seconds,
    },
    EndOfPatrol {
        max_cycles: u32,
    },
    FirstAttack,
    Not {
        #[serde(default)]
        decision: Option<Box<DecisionDefinition>>,
    },
    Sequence(Vec<DecisionDefinition>),
    Selection(Vec<DecisionDefinition>),
}

impl DecisionDefinition {
    pub fn to_decision_ref(&self) -> DecisionRef {
        match self {
            Self::Look { layers, shape } => decision_ref(LookDecision { layers: *layers, shape: *shape }),
            Self::Attack { layers, shape } => decision_ref(AttackDecision { layers: *layers, shape: *shape }),
            Self::AtHome { threshold } => decision_ref(AtHomeDecision { threshold: *threshold }),
            Self::Wait { duration } => decision_ref(WaitDecision { duration: *duration }),
            Self::EndOfPatrol { max_cycles } => decision_ref(EndOfPatrolDecision { max_cycles: *max_cycles }),
            Self::FirstAttack => decision_ref(FirstAttackDecision),
            Self::Not { decision } => decision_ref(NotDecision {
                decision: decision.as_ref().map(|child| child.to_decision_ref()),
            }),
            Self::Sequence(children) => decision_ref(SequenceDecision::new(
                children.iter().map(Self::to_decision_ref)
            )),
            Self::Selection(children) => decision_ref(SelectionDecision::new(
                children.iter().map(Self::to_decision_ref)
            )),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TransitionDefinition {
    pub decision: DecisionDefinition,
    pub next: StateIdentifier,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StateDefinition {
    pub name: StateIdentifier,
    #[serde(default)]
    pub enter: Vec<ActionDefinition>,
    #[serde(default)]
    pub exit: Vec<ActionDefinition>,
    #[serde(default)]
    pub update: Vec<ActionDefinition>,
    #[serde(default)]
    pub transitions: Vec<TransitionDefinition>,
}

impl StateDefinition {
    fn to_draft(&self) -> StateDraft {
        let draft = StateDraft::new(&self.name);
        let draft = self.enter.iter().fold(draft, |d, a| d.on_enter_shared(a.to_action_ref()));
        let draft = self.exit.iter().fold(draft, |d, a| d.on_exit_shared(a.to_action_ref()));
        let draft = self.update.iter().fold(draft, |d, a| d.on_update_shared(a.to_action_ref()));

        self.transitions.iter().fold(draft, |d, t| {
            d.transition_shared(t.decision.to_decision_ref(), &t.next)
        })
    }
}

/// A whole state graph, as stored in an asset file.
#[derive(Asset, TypePath, Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StateGraphDefinition {
    pub name: String,
    /// Defaults to the first state listed.
    #[serde(default)]
    pub initial: Option<StateIdentifier>,
    pub states: Vec<StateDefinition>,
}

impl StateGraphDefinition {
    /// Builds the live StateGraph this definition describes.
    pub fn resolve(&self) -> Result<StateGraph, ConfigError> {
        let builder = self.states.iter()
            .fold(StateGraph::builder(), |builder, state| builder.state(state.to_draft()));

        let builder = match &self.initial {
            Some(initial) => builder.initial(initial),
            None => builder,
        };

        builder.build()
    }
}

/// Per-agent tunables and waypoints, as stored in an asset file.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct AgentProfile {
    #[serde(default)]
    pub config: BlackboardConfig,
    #[serde(default)]
    pub home: Option<Vec3>,
    #[serde(default)]
    pub patrol: Vec<Vec3>,
}

impl AgentProfile {
    /// A fresh Blackboard for an agent standing at `position`.
    pub fn blackboard(&self, position: Vec3) -> Blackboard {
        let blackboard = Blackboard::new(self.config)
            .with_position(position)
            .with_patrol(self.patrol.iter().copied());

        match self.home {
            Some(home) => blackboard.with_home(home),
            None => blackboard,
        }
    }
}
