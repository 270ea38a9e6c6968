//! Decisions: the predicates that guard Transitions.
//!
//! A Decision is a stateless strategy object shared by every agent whose state
//! graph uses it. It reads the agent's Blackboard (and may query perception),
//! but never writes anything itself; a perceived target travels back to the
//! caller in the `DecisionOutcome` and the calling AIState binds it.

extern crate alloc;
use alloc::sync::Arc;

use crate::blackboard::{Blackboard, horizontal_distance, within_threshold};
use crate::errors::ConfigError;
use crate::services::PerceptionQuery;
use crate::types::{CastShape, DecisionRef, LayerMask, Seconds, TargetId, ThreadSafeRef};

/// Read-only view of one agent, handed to a Decision.
pub struct DecisionContext<'a> {
    pub blackboard: &'a Blackboard,
    pub perception: &'a dyn PerceptionQuery,
}

/// The answer to a Decision, plus whatever it spotted along the way.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DecisionOutcome {
    pub satisfied: bool,
    /// A target to bind as the agent's chase target.
    pub target: Option<TargetId>,
}

impl DecisionOutcome {
    pub const TRUE: Self = Self { satisfied: true, target: None };
    pub const FALSE: Self = Self { satisfied: false, target: None };

    pub fn from_bool(satisfied: bool) -> Self {
        Self { satisfied, target: None }
    }

    pub fn with_target(mut self, target: Option<TargetId>) -> Self {
        self.target = target;
        self
    }
}

impl From<bool> for DecisionOutcome {
    fn from(value: bool) -> Self {
        Self::from_bool(value)
    }
}

pub trait Decision: Send + Sync + core::fmt::Debug {
    fn decide(&self, ctx: &DecisionContext) -> DecisionOutcome;

    /// Checks the Blackboard carries everything this Decision reads.
    /// Called once, at agent setup.
    fn validate(&self, _blackboard: &Blackboard) -> Result<(), ConfigError> {
        Ok(())
    }
}

/// Wraps a Decision into a shareable DecisionRef.
pub fn decision_ref(decision: impl Decision + 'static) -> DecisionRef {
    let shared: Arc<dyn Decision> = Arc::new(decision);
    ThreadSafeRef::new_from_ref(shared)
}


fn cast_for_target(ctx: &DecisionContext, layers: LayerMask, shape: &CastShape) -> DecisionOutcome {
    let eyes = ctx.blackboard.eyes;
    let hit = ctx.perception.cast(eyes.position, shape.radius, eyes.forward, shape.range, layers);

    match hit {
        Some(hit) => DecisionOutcome::TRUE.with_target(Some(hit.target)),
        None => DecisionOutcome::FALSE,
    }
}

/// True if anything on `layers` is within sight; binds it as the chase target.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LookDecision {
    pub layers: LayerMask,
    /// Overrides the Blackboard's look shape.
    pub shape: Option<CastShape>,
}

impl LookDecision {
    pub fn new(layers: LayerMask) -> Self {
        Self { layers, shape: None }
    }
}

impl Decision for LookDecision {
    fn decide(&self, ctx: &DecisionContext) -> DecisionOutcome {
        let shape = self.shape.unwrap_or(ctx.blackboard.config.look);
        cast_for_target(ctx, self.layers, &shape)
    }
}

/// True if anything on `layers` is within striking reach; binds it as the chase target.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AttackDecision {
    pub layers: LayerMask,
    /// Overrides the Blackboard's attack shape.
    pub shape: Option<CastShape>,
}

impl AttackDecision {
    pub fn new(layers: LayerMask) -> Self {
        Self { layers, shape: None }
    }
}

impl Decision for AttackDecision {
    fn decide(&self, ctx: &DecisionContext) -> DecisionOutcome {
        let shape = self.shape.unwrap_or(ctx.blackboard.config.attack);
        cast_for_target(ctx, self.layers, &shape)
    }
}

/// True once the agent is back at its home waypoint (height ignored).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AtHomeDecision {
    /// Overrides the Blackboard's threshold.
    pub threshold: Option<f32>,
}

impl Decision for AtHomeDecision {
    fn decide(&self, ctx: &DecisionContext) -> DecisionOutcome {
        let bb = ctx.blackboard;
        let Some(home) = bb.home_waypoint else {
            return DecisionOutcome::FALSE
        };

        let threshold = self.threshold.unwrap_or(bb.config.threshold);
        within_threshold(horizontal_distance(bb.position, home), threshold).into()
    }

    fn validate(&self, blackboard: &Blackboard) -> Result<(), ConfigError> {
        match blackboard.home_waypoint {
            Some(_) => Ok(()),
            None => Err(ConfigError::MissingHomeWaypoint { required_by: "AtHome" }),
        }
    }
}

/// True once the agent has spent at least `duration` seconds in the current state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WaitDecision {
    pub duration: Seconds,
}

impl Decision for WaitDecision {
    fn decide(&self, ctx: &DecisionContext) -> DecisionOutcome {
        (ctx.blackboard.timer >= self.duration).into()
    }
}

/// True while standing on the last leg of a patrol that has looped at least `max_cycles` times.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EndOfPatrolDecision {
    pub max_cycles: u32,
}

impl Decision for EndOfPatrolDecision {
    fn decide(&self, ctx: &DecisionContext) -> DecisionOutcome {
        let bb = ctx.blackboard;
        let on_last_leg = bb.patrol_waypoints.len().checked_sub(1) == Some(bb.current_patrol_waypoint);
        (on_last_leg && bb.patrol_cycles >= self.max_cycles).into()
    }

    fn validate(&self, blackboard: &Blackboard) -> Result<(), ConfigError> {
        match blackboard.patrol_waypoints.is_empty() {
            false => Ok(()),
            true => Err(ConfigError::MissingPatrolWaypoints { required_by: "EndOfPatrol" }),
        }
    }
}

/// True until the agent has landed its first attack.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FirstAttackDecision;

impl Decision for FirstAttackDecision {
    fn decide(&self, ctx: &DecisionContext) -> DecisionOutcome {
        (!ctx.blackboard.has_attacked).into()
    }
}


/// Inverts its child. Without a child, this is always true.
#[derive(Clone, Debug, Default)]
pub struct NotDecision {
    pub decision: Option<DecisionRef>,
}

impl NotDecision {
    pub fn new(decision: impl Decision + 'static) -> Self {
        Self { decision: Some(decision_ref(decision)) }
    }
}

impl Decision for NotDecision {
    fn decide(&self, ctx: &DecisionContext) -> DecisionOutcome {
        match &self.decision {
            None => DecisionOutcome::TRUE,
            Some(child) => {
                let outcome = child.decide(ctx);
                DecisionOutcome { satisfied: !outcome.satisfied, target: outcome.target }
            }
        }
    }

    fn validate(&self, blackboard: &Blackboard) -> Result<(), ConfigError> {
        match &self.decision {
            None => Ok(()),
            Some(child) => child.validate(blackboard),
        }
    }
}

/// Logical AND over its children, in order, stopping at the first false.
/// An empty Sequence is false.
#[derive(Clone, Debug, Default)]
pub struct SequenceDecision {
    pub decisions: Vec<DecisionRef>,
}

impl SequenceDecision {
    pub fn new(decisions: impl IntoIterator<Item = DecisionRef>) -> Self {
        Self { decisions: decisions.into_iter().collect() }
    }
}

impl Decision for SequenceDecision {
    fn decide(&self, ctx: &DecisionContext) -> DecisionOutcome {
        if self.decisions.is_empty() {
            return DecisionOutcome::FALSE
        }

        let mut target = None;
        for child in self.decisions.iter() {
            let outcome = child.decide(ctx);
            target = outcome.target.or(target);

            if !outcome.satisfied {
                return DecisionOutcome::FALSE.with_target(target)
            }
        }

        DecisionOutcome::TRUE.with_target(target)
    }

    fn validate(&self, blackboard: &Blackboard) -> Result<(), ConfigError> {
        self.decisions.iter().try_for_each(|child| child.validate(blackboard))
    }
}

/// Logical OR over its children, in order, stopping at the first true.
/// An empty Selection is false.
#[derive(Clone, Debug, Default)]
pub struct SelectionDecision {
    pub decisions: Vec<DecisionRef>,
}

impl SelectionDecision {
    pub fn new(decisions: impl IntoIterator<Item = DecisionRef>) -> Self {
        Self { decisions: decisions.into_iter().collect() }
    }
}

impl Decision for SelectionDecision {
    fn decide(&self, ctx: &DecisionContext) -> DecisionOutcome {
        let mut target = None;
        for child in self.decisions.iter() {
            let outcome = child.decide(ctx);
            target = outcome.target.or(target);

            if outcome.satisfied {
                return DecisionOutcome::TRUE.with_target(target)
            }
        }

        DecisionOutcome::FALSE.with_target(target)
    }

    fn validate(&self, blackboard: &Blackboard) -> Result<(), ConfigError> {
        self.decisions.iter().try_for_each(|child| child.validate(blackboard))
    }
}


#[cfg(test)]
mod tests {
    use bevy::math::Vec3;

    use super::*;
    use crate::testing::{CountingDecision, ScriptedPerception};
    use crate::types::{CastHit, EyeTransform, TargetId};

    const PLAYER: LayerMask = LayerMask::layer(8);

    fn decide(decision: &dyn Decision, bb: &Blackboard, perception: &ScriptedPerception) -> DecisionOutcome {
        decision.decide(&DecisionContext { blackboard: bb, perception })
    }

    fn counting(result: bool) -> (DecisionRef, CountingDecision) {
        let decision = CountingDecision::new(result);
        (decision_ref(decision.clone()), decision)
    }

    #[test]
    fn empty_combinators_are_false() {
        let bb = Blackboard::default();
        let perception = ScriptedPerception::default();

        assert!(!decide(&SequenceDecision::default(), &bb, &perception).satisfied);
        assert!(!decide(&SelectionDecision::default(), &bb, &perception).satisfied);
    }

    #[test]
    fn not_without_child_is_true() {
        let bb = Blackboard::default();
        let perception = ScriptedPerception::default();

        assert!(decide(&NotDecision::default(), &bb, &perception).satisfied);
        assert!(!decide(&NotDecision::new(FirstAttackDecision), &bb, &perception).satisfied);
    }

    #[test]
    fn sequence_stops_at_first_false() {
        let bb = Blackboard::default();
        let perception = ScriptedPerception::default();
        let (a, a_count) = counting(true);
        let (b, b_count) = counting(false);
        let (c, c_count) = counting(true);

        let outcome = decide(&SequenceDecision::new([a, b, c]), &bb, &perception);

        assert!(!outcome.satisfied);
        assert_eq!(a_count.calls(), 1);
        assert_eq!(b_count.calls(), 1);
        assert_eq!(c_count.calls(), 0);
    }

    #[test]
    fn selection_stops_at_first_true() {
        let bb = Blackboard::default();
        let perception = ScriptedPerception::default();
        let (a, a_count) = counting(false);
        let (b, b_count) = counting(true);
        let (c, c_count) = counting(false);

        let outcome = decide(&SelectionDecision::new([a, b, c]), &bb, &perception);

        assert!(outcome.satisfied);
        assert_eq!(a_count.calls(), 1);
        assert_eq!(b_count.calls(), 1);
        assert_eq!(c_count.calls(), 0);
    }

    #[test]
    fn failed_sequence_still_reports_what_it_saw() {
        let bb = Blackboard::default();
        let perception = ScriptedPerception::default();
        let spotter = decision_ref(CountingDecision::new(true).with_target(TargetId(7)));
        let (veto, _) = counting(false);

        let outcome = decide(&SequenceDecision::new([spotter, veto]), &bb, &perception);

        assert!(!outcome.satisfied);
        assert_eq!(outcome.target, Some(TargetId(7)));
    }

    #[test]
    fn look_casts_from_the_eyes_and_binds_the_hit() {
        let bb = Blackboard::default()
            .with_eyes(EyeTransform::new(Vec3::new(0., 1.5, 0.), Vec3::X));
        let perception = ScriptedPerception::default();
        perception.set_hit(PLAYER, CastHit { target: TargetId(1), point: Vec3::new(8., 1.5, 0.), distance: 8. });

        let outcome = decide(&LookDecision::new(PLAYER), &bb, &perception);
        assert_eq!(outcome, DecisionOutcome { satisfied: true, target: Some(TargetId(1)) });

        let casts = perception.casts();
        assert_eq!(casts.len(), 1);
        assert_eq!(casts[0].origin, Vec3::new(0., 1.5, 0.));
        assert_eq!(casts[0].direction, Vec3::X);
        assert_eq!(casts[0].radius, 5.);
        assert_eq!(casts[0].max_distance, 10.);
    }

    #[test]
    fn attack_only_reaches_as_far_as_its_shape() {
        let bb = Blackboard::default();
        let perception = ScriptedPerception::default();
        perception.set_hit(PLAYER, CastHit { target: TargetId(1), point: Vec3::new(0., 0., 8.), distance: 8. });

        assert!(!decide(&AttackDecision::new(PLAYER), &bb, &perception).satisfied);
        assert!(decide(&LookDecision::new(PLAYER), &bb, &perception).satisfied);
        assert!(!decide(&LookDecision::new(LayerMask::layer(2)), &bb, &perception).satisfied);
    }

    #[test]
    fn at_home_ignores_height_and_float_noise() {
        let perception = ScriptedPerception::default();
        let bb = Blackboard::default()
            .with_home(Vec3::new(3., 0., 4.))
            .with_position(Vec3::new(3. + 1e-6, 2., 4.));

        assert!(decide(&AtHomeDecision::default(), &bb, &perception).satisfied);

        let away = bb.clone().with_position(Vec3::new(3.5, 0., 4.));
        assert!(!decide(&AtHomeDecision::default(), &away, &perception).satisfied);
        assert!(decide(&AtHomeDecision { threshold: Some(1.) }, &away, &perception).satisfied);
    }

    #[test]
    fn wait_compares_against_the_state_timer() {
        let perception = ScriptedPerception::default();
        let mut bb = Blackboard::default();
        let wait = WaitDecision { duration: 2. };

        bb.timer = 1.9;
        assert!(!decide(&wait, &bb, &perception).satisfied);
        bb.timer = 2.;
        assert!(decide(&wait, &bb, &perception).satisfied);
    }

    #[test]
    fn end_of_patrol_needs_last_leg_and_enough_cycles() {
        let perception = ScriptedPerception::default();
        let mut bb = Blackboard::default().with_patrol([Vec3::ZERO, Vec3::X, Vec3::Z]);
        let decision = EndOfPatrolDecision { max_cycles: 2 };

        bb.current_patrol_waypoint = 2;
        bb.patrol_cycles = 2;
        assert!(decide(&decision, &bb, &perception).satisfied);

        bb.patrol_cycles = 1;
        assert!(!decide(&decision, &bb, &perception).satisfied);

        bb.patrol_cycles = 2;
        bb.current_patrol_waypoint = 1;
        assert!(!decide(&decision, &bb, &perception).satisfied);
    }

    #[test]
    fn first_attack_flips_after_attacking() {
        let perception = ScriptedPerception::default();
        let mut bb = Blackboard::default();

        assert!(decide(&FirstAttackDecision, &bb, &perception).satisfied);
        bb.has_attacked = true;
        assert!(!decide(&FirstAttackDecision, &bb, &perception).satisfied);
    }

    #[test]
    fn validation_reaches_nested_children() {
        let bb = Blackboard::default();
        let nested = SelectionDecision::new([
            decision_ref(FirstAttackDecision),
            decision_ref(NotDecision::new(AtHomeDecision::default())),
        ]);

        assert_eq!(
            nested.validate(&bb),
            Err(ConfigError::MissingHomeWaypoint { required_by: "AtHome" })
        );
        assert!(nested.validate(&bb.with_home(Vec3::ZERO)).is_ok());
    }
}
