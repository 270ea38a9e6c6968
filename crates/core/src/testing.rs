//! Mock host services and instrumented Decisions/Actions for tests.
//!
//! Every mock is a cheap, cloneable handle over shared interior state: hand one
//! clone to the AgentServices under test and keep another to inspect what the
//! state machine asked the 'host' to do.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::actions::{Action, ActionContext};
use crate::decisions::{Decision, DecisionContext, DecisionOutcome};
use crate::services::{
    AgentServices, AnimationSink, HealthSink, NavigationAgent, PassThroughSurface, PerceptionQuery,
    SurfaceSampler,
};
use crate::types::{CastHit, HealthAmount, LayerMask, Point, Seconds, TargetId};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}


#[derive(Debug, Default, Clone, PartialEq)]
pub struct NavigationLog {
    pub destinations: Vec<Point>,
    pub stopped: bool,
    pub speed: f32,
}

/// A NavigationAgent that remembers every command it was given.
#[derive(Debug, Default, Clone)]
pub struct RecordingNavigation(Arc<Mutex<NavigationLog>>);

impl RecordingNavigation {
    pub fn snapshot(&self) -> NavigationLog {
        lock(&self.0).clone()
    }

    pub fn last_destination(&self) -> Option<Point> {
        lock(&self.0).destinations.last().copied()
    }

    pub fn destination_count(&self) -> usize {
        lock(&self.0).destinations.len()
    }

    pub fn stopped(&self) -> bool {
        lock(&self.0).stopped
    }

    pub fn current_speed(&self) -> f32 {
        lock(&self.0).speed
    }
}

impl NavigationAgent for RecordingNavigation {
    fn set_destination(&mut self, point: Point) {
        lock(&self.0).destinations.push(point);
    }

    fn is_stopped(&self) -> bool {
        self.stopped()
    }

    fn set_stopped(&mut self, stopped: bool) {
        lock(&self.0).stopped = stopped;
    }

    fn speed(&self) -> f32 {
        self.current_speed()
    }

    fn set_speed(&mut self, speed: f32) {
        lock(&self.0).speed = speed;
    }
}


/// One cast the state machine requested.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CastRecord {
    pub origin: Point,
    pub radius: f32,
    pub direction: Point,
    pub max_distance: f32,
    pub layers: LayerMask,
}

#[derive(Debug, Default)]
struct PerceptionScript {
    /// What a cast reports, provided it is aimed at the right layers and reaches far enough.
    hit: Option<(LayerMask, CastHit)>,
    positions: HashMap<TargetId, Point>,
    casts: Vec<CastRecord>,
}

/// A PerceptionQuery whose answers are set up by the test.
#[derive(Debug, Default, Clone)]
pub struct ScriptedPerception(Arc<Mutex<PerceptionScript>>);

impl ScriptedPerception {
    /// Makes casts against `layer` that reach `hit.distance` report `hit`.
    pub fn set_hit(&self, layer: LayerMask, hit: CastHit) {
        lock(&self.0).hit = Some((layer, hit));
    }

    pub fn clear_hit(&self) {
        lock(&self.0).hit = None;
    }

    pub fn place(&self, target: TargetId, position: Point) {
        lock(&self.0).positions.insert(target, position);
    }

    pub fn remove(&self, target: TargetId) {
        lock(&self.0).positions.remove(&target);
    }

    pub fn casts(&self) -> Vec<CastRecord> {
        lock(&self.0).casts.clone()
    }
}

impl PerceptionQuery for ScriptedPerception {
    fn cast(
        &self,
        origin: Point,
        radius: f32,
        direction: Point,
        max_distance: f32,
        layers: LayerMask,
    ) -> Option<CastHit> {
        let mut script = lock(&self.0);
        script.casts.push(CastRecord { origin, radius, direction, max_distance, layers });

        script
            .hit
            .filter(|(layer, hit)| layers.intersects(*layer) && hit.distance <= max_distance)
            .map(|(_, hit)| hit)
    }

    fn locate(&self, target: TargetId) -> Option<Point> {
        lock(&self.0).positions.get(&target).copied()
    }
}


#[derive(Debug, Default, Clone)]
pub struct RecordingAnimator(Arc<Mutex<Vec<String>>>);

impl RecordingAnimator {
    pub fn triggers(&self) -> Vec<String> {
        lock(&self.0).clone()
    }
}

impl AnimationSink for RecordingAnimator {
    fn set_trigger(&mut self, trigger: &str) {
        lock(&self.0).push(trigger.to_owned());
    }
}


#[derive(Debug, Default, Clone)]
pub struct RecordingHealth(Arc<Mutex<Vec<(TargetId, HealthAmount)>>>);

impl RecordingHealth {
    pub fn hits(&self) -> Vec<(TargetId, HealthAmount)> {
        lock(&self.0).clone()
    }
}

impl HealthSink for RecordingHealth {
    fn remove_health(&mut self, target: TargetId, amount: HealthAmount) {
        lock(&self.0).push((target, amount));
    }
}


/// A surface that is flat at a fixed height, optionally only near the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedHeightSurface {
    pub height: f32,
    /// Points further than this (horizontally) from the origin have no surface nearby.
    pub extent: Option<f32>,
}

impl FixedHeightSurface {
    pub fn new(height: f32) -> Self {
        Self { height, extent: None }
    }

    pub fn with_extent(mut self, extent: f32) -> Self {
        self.extent = Some(extent);
        self
    }
}

impl SurfaceSampler for FixedHeightSurface {
    fn sample_nearest(&self, point: Point, _max_radius: f32) -> Option<Point> {
        let horizontal = Point::new(point.x, 0., point.z).length();
        match self.extent {
            Some(extent) if horizontal > extent => None,
            _ => Some(Point::new(point.x, self.height, point.z)),
        }
    }
}


/// A full set of mock collaborators for one agent.
#[derive(Debug, Default, Clone)]
pub struct MockServices {
    pub navigation: RecordingNavigation,
    pub perception: ScriptedPerception,
    pub animator: RecordingAnimator,
    pub health: RecordingHealth,
}

impl MockServices {
    pub fn new() -> Self {
        Self::default()
    }

    /// AgentServices wired up to (clones of) these mocks, on a pass-through surface.
    pub fn agent_services(&self) -> AgentServices {
        self.agent_services_on(PassThroughSurface)
    }

    pub fn agent_services_on(&self, surface: impl SurfaceSampler + 'static) -> AgentServices {
        AgentServices {
            navigation: Box::new(self.navigation.clone()),
            perception: Box::new(self.perception.clone()),
            surface: Box::new(surface),
            animator: Box::new(self.animator.clone()),
            health: Box::new(self.health.clone()),
            rng: ChaCha8Rng::seed_from_u64(0),
        }
    }
}


/// A Decision with a fixed answer that counts how often it was asked.
#[derive(Debug, Clone)]
pub struct CountingDecision {
    pub result: bool,
    pub target: Option<TargetId>,
    calls: Arc<AtomicUsize>,
}

impl CountingDecision {
    pub fn new(result: bool) -> Self {
        Self { result, target: None, calls: Arc::default() }
    }

    pub fn with_target(mut self, target: TargetId) -> Self {
        self.target = Some(target);
        self
    }

    /// A handle to the call counter, shared with every clone of this Decision.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Decision for CountingDecision {
    fn decide(&self, _ctx: &DecisionContext) -> DecisionOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        DecisionOutcome { satisfied: self.result, target: self.target }
    }
}


/// What a RecordingAction saw on the Blackboard when it ran.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionObservation {
    pub label: &'static str,
    pub timer: Seconds,
    pub patrol_cycles: u32,
    pub wander_restart: bool,
}

pub type ActionJournal = Arc<Mutex<Vec<ActionObservation>>>;

/// An Action that only writes down when it ran and what it saw.
///
/// Several RecordingActions may share one journal to check relative ordering.
#[derive(Debug, Clone)]
pub struct RecordingAction {
    pub label: &'static str,
    journal: ActionJournal,
}

impl RecordingAction {
    pub fn new(label: &'static str, journal: &ActionJournal) -> Self {
        Self { label, journal: journal.clone() }
    }

    pub fn journal() -> ActionJournal {
        ActionJournal::default()
    }

    pub fn labels(journal: &ActionJournal) -> Vec<&'static str> {
        lock(journal).iter().map(|obs| obs.label).collect()
    }

    pub fn observations(journal: &ActionJournal) -> Vec<ActionObservation> {
        lock(journal).clone()
    }
}

impl Action for RecordingAction {
    fn act(&self, ctx: &mut ActionContext) {
        lock(&self.journal).push(ActionObservation {
            label: self.label,
            timer: ctx.blackboard.timer,
            patrol_cycles: ctx.blackboard.patrol_cycles,
            wander_restart: ctx.blackboard.wander_restart,
        });
    }
}
