//! Actions
//!
//! An Action is one side-effecting step an AIState runs when entered, exited or
//! updated. Like Decisions, Actions are shared between every agent using the
//! same state graph; all per-agent memory goes on the Blackboard.
extern crate alloc;
use alloc::sync::Arc;

use rand::Rng;

use crate::blackboard::{Blackboard, PatrolPause};
use crate::errors::ConfigError;
use crate::services::AgentServices;
use crate::types::{ActionRef, HealthAmount, Point, ThreadSafeRef};

/// Animation trigger fired whenever an agent lands a hit.
pub const ATTACK_TRIGGER: &str = "Attack";

/// Mutable view of one agent, handed to an Action.
pub struct ActionContext<'a> {
    pub blackboard: &'a mut Blackboard,
    pub services: &'a mut AgentServices,
}

pub trait Action: Send + Sync + core::fmt::Debug {
    fn act(&self, ctx: &mut ActionContext);

    /// Checks the Blackboard carries everything this Action reads.
    /// Called once, at agent setup.
    fn validate(&self, _blackboard: &Blackboard) -> Result<(), ConfigError> {
        Ok(())
    }
}

/// Wraps an Action into a shareable ActionRef.
pub fn action_ref(action: impl Action + 'static) -> ActionRef {
    let shared: Arc<dyn Action> = Arc::new(action);
    ThreadSafeRef::new_from_ref(shared)
}

fn require_home(blackboard: &Blackboard, required_by: &'static str) -> Result<(), ConfigError> {
    match blackboard.home_waypoint {
        Some(_) => Ok(()),
        None => Err(ConfigError::MissingHomeWaypoint { required_by }),
    }
}


/// Runs after the chase target at full speed.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ChaseAction;

impl Action for ChaseAction {
    fn act(&self, ctx: &mut ActionContext) {
        let Some(target) = ctx.blackboard.chase_target else {
            return
        };

        let Some(position) = ctx.services.perception.locate(target) else {
            #[cfg(feature = "logging")]
            bevy::log::warn!("ChaseAction: chase target {} no longer exists, releasing it", target);

            ctx.blackboard.chase_target = None;
            return
        };

        let nav = &mut ctx.services.navigation;
        nav.set_destination(position);
        nav.set_speed(ctx.blackboard.config.run_speed);
        nav.set_stopped(false);
        ctx.blackboard.is_running = true;
    }
}

/// Strolls between random points around home.
///
/// A new point is picked on arrival, or whenever the state was just (re-)entered.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WanderAction;

impl WanderAction {
    /// A uniformly distributed point on the disc of `radius` around `center`.
    fn sample_around(center: Point, radius: f32, rng: &mut impl Rng) -> Point {
        let angle = rng.gen_range(0.0..core::f32::consts::TAU);
        let distance = radius * rng.r#gen::<f32>().sqrt();
        center + Point::new(angle.cos() * distance, 0., angle.sin() * distance)
    }
}

impl Action for WanderAction {
    fn act(&self, ctx: &mut ActionContext) {
        let bb = &mut *ctx.blackboard;
        let Some(home) = bb.home_waypoint else {
            return
        };

        let needs_target = bb.wander_restart || match bb.wander_target {
            None => true,
            Some(target) => bb.is_at(target),
        };

        if needs_target {
            let services = &mut *ctx.services;
            let raw = Self::sample_around(home, bb.config.wander_radius, &mut services.rng);
            let snapped = services.surface.sample_nearest(raw, bb.config.check_radius).unwrap_or(raw);

            #[cfg(feature = "logging")]
            bevy::log::debug!("WanderAction: picked new wander target {:?}", snapped);

            bb.wander_target = Some(snapped);
        }

        if let Some(target) = bb.wander_target {
            let nav = &mut ctx.services.navigation;
            nav.set_destination(target);
            nav.set_stopped(false);
            nav.set_speed(bb.config.walk_speed);
            bb.is_running = false;
        }
        bb.wander_restart = false;
    }

    fn validate(&self, blackboard: &Blackboard) -> Result<(), ConfigError> {
        require_home(blackboard, "Wander")
    }
}

/// Walks the patrol route in order, pausing at every waypoint.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PatrolAction;

impl Action for PatrolAction {
    fn act(&self, ctx: &mut ActionContext) {
        let bb = &mut *ctx.blackboard;
        let count = bb.patrol_waypoints.len();
        let Some(waypoint) = bb.active_patrol_waypoint() else {
            return
        };

        // Nothing counts as an arrival until the current pause has run out.
        if let Some(pause) = bb.patrol_pause {
            if pause.elapsed(bb.timer) < bb.config.patrol_pause_duration {
                return
            }
            bb.patrol_pause = None;
        }

        if bb.is_at(waypoint) {
            let next = (bb.current_patrol_waypoint + 1) % count;
            if next == 0 {
                bb.patrol_cycles += 1;
            }
            bb.current_patrol_waypoint = next;
            bb.patrol_pause = Some(PatrolPause { started_at: bb.timer });
            ctx.services.navigation.set_stopped(true);
            return
        }

        let nav = &mut ctx.services.navigation;
        nav.set_destination(waypoint);
        nav.set_stopped(false);
        nav.set_speed(bb.config.walk_speed);
        bb.is_running = false;
    }

    fn validate(&self, blackboard: &Blackboard) -> Result<(), ConfigError> {
        match blackboard.patrol_waypoints.is_empty() {
            false => Ok(()),
            true => Err(ConfigError::MissingPatrolWaypoints { required_by: "Patrol" }),
        }
    }
}

/// Heads back to the home waypoint.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GoHomeAction;

impl Action for GoHomeAction {
    fn act(&self, ctx: &mut ActionContext) {
        let bb = &mut *ctx.blackboard;
        if let Some(home) = bb.home_waypoint {
            let nav = &mut ctx.services.navigation;
            nav.set_destination(home);
            nav.set_stopped(false);
            nav.set_speed(bb.config.walk_speed);
            bb.is_running = false;
        }
    }

    fn validate(&self, blackboard: &Blackboard) -> Result<(), ConfigError> {
        require_home(blackboard, "GoHome")
    }
}

/// Hits the chase target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttackAction {
    pub damage: HealthAmount,
}

impl Default for AttackAction {
    fn default() -> Self {
        Self { damage: 1 }
    }
}

impl Action for AttackAction {
    fn act(&self, ctx: &mut ActionContext) {
        let Some(target) = ctx.blackboard.chase_target else {
            return
        };

        #[cfg(feature = "logging")]
        bevy::log::info!("AttackAction: hitting {} for {} damage", target, self.damage);

        ctx.services.health.remove_health(target, self.damage);
        ctx.services.animator.set_trigger(ATTACK_TRIGGER);
        ctx.blackboard.has_attacked = true;
    }
}


#[cfg(test)]
mod tests {
    use bevy::math::Vec3;

    use super::*;
    use crate::blackboard::horizontal_distance;
    use crate::services::NavigationAgent;
    use crate::testing::{FixedHeightSurface, MockServices};
    use crate::types::TargetId;

    fn act(action: &dyn Action, bb: &mut Blackboard, services: &mut AgentServices) {
        action.act(&mut ActionContext { blackboard: bb, services });
    }

    fn patrol_route() -> Blackboard {
        Blackboard::default()
            .with_patrol([Vec3::ZERO, Vec3::new(10., 0., 0.), Vec3::new(10., 0., 10.)])
            .with_position(Vec3::ZERO)
    }

    #[test]
    fn chase_runs_at_the_target() {
        let mocks = MockServices::new();
        let mut services = mocks.agent_services();
        let mut bb = Blackboard::default();
        bb.chase_target = Some(TargetId(3));
        mocks.perception.place(TargetId(3), Vec3::new(4., 0., 4.));

        act(&ChaseAction, &mut bb, &mut services);

        let nav = mocks.navigation.snapshot();
        assert_eq!(nav.destinations, vec![Vec3::new(4., 0., 4.)]);
        assert_eq!(nav.speed, bb.config.run_speed);
        assert!(!nav.stopped);
        assert!(bb.is_running);
    }

    #[test]
    fn chase_releases_a_vanished_target() {
        let mocks = MockServices::new();
        let mut services = mocks.agent_services();
        let mut bb = Blackboard::default();
        bb.chase_target = Some(TargetId(3));

        act(&ChaseAction, &mut bb, &mut services);

        assert_eq!(bb.chase_target, None);
        assert_eq!(mocks.navigation.destination_count(), 0);
        assert!(!bb.is_running);
    }

    #[test]
    fn wander_picks_a_point_near_home_and_keeps_it() {
        let mocks = MockServices::new();
        let mut services = mocks.agent_services_on(FixedHeightSurface::new(2.));
        let home = Vec3::new(100., 0., -50.);
        let mut bb = Blackboard::default().with_home(home).with_position(home);

        act(&WanderAction, &mut bb, &mut services);

        let target = match bb.wander_target {
            Some(target) => target,
            None => panic!("wander did not pick a target"),
        };
        assert!(horizontal_distance(home, target) <= bb.config.wander_radius);
        assert_eq!(target.y, 2.);
        assert!(!bb.wander_restart);
        assert_eq!(mocks.navigation.last_destination(), Some(target));

        act(&WanderAction, &mut bb, &mut services);
        assert_eq!(bb.wander_target, Some(target));
    }

    #[test]
    fn wander_repicks_on_restart() {
        let mocks = MockServices::new();
        let mut services = mocks.agent_services();
        let mut bb = Blackboard::default().with_home(Vec3::ZERO);

        act(&WanderAction, &mut bb, &mut services);
        let first = bb.wander_target;

        bb.wander_restart = true;
        act(&WanderAction, &mut bb, &mut services);

        assert_ne!(bb.wander_target, first);
    }

    #[test]
    fn wander_is_reproducible_for_a_seed() {
        let home = Vec3::new(1., 0., 1.);
        let pick = || {
            let mut services = MockServices::new().agent_services();
            let mut bb = Blackboard::default().with_home(home);
            act(&WanderAction, &mut bb, &mut services);
            bb.wander_target
        };

        assert_eq!(pick(), pick());
    }

    #[test]
    fn patrol_advances_and_pauses_on_arrival() {
        let mocks = MockServices::new();
        let mut services = mocks.agent_services();
        let mut bb = patrol_route();
        bb.timer = 4.;

        act(&PatrolAction, &mut bb, &mut services);

        assert_eq!(bb.current_patrol_waypoint, 1);
        assert_eq!(bb.patrol_cycles, 0);
        assert_eq!(bb.patrol_pause, Some(PatrolPause { started_at: 4. }));
        assert!(mocks.navigation.stopped());
        assert_eq!(mocks.navigation.destination_count(), 0);
    }

    #[test]
    fn patrol_waits_out_the_pause_then_resumes() {
        let mocks = MockServices::new();
        let mut services = mocks.agent_services();
        let mut bb = patrol_route();
        bb.config.patrol_pause_duration = 5.;

        act(&PatrolAction, &mut bb, &mut services);

        bb.timer = 4.9;
        act(&PatrolAction, &mut bb, &mut services);
        assert_eq!(mocks.navigation.destination_count(), 0);
        assert!(mocks.navigation.stopped());

        bb.timer = 5.;
        act(&PatrolAction, &mut bb, &mut services);
        assert_eq!(bb.patrol_pause, None);
        assert_eq!(mocks.navigation.last_destination(), Some(Vec3::new(10., 0., 0.)));
        assert!(!mocks.navigation.stopped());
        assert_eq!(mocks.navigation.current_speed(), bb.config.walk_speed);
    }

    #[test]
    fn patrol_counts_a_cycle_only_on_wraparound() {
        let mocks = MockServices::new();
        let mut services = mocks.agent_services();
        let mut bb = patrol_route();
        bb.current_patrol_waypoint = 2;
        bb.position = Vec3::new(10., 0., 10.);

        act(&PatrolAction, &mut bb, &mut services);

        assert_eq!(bb.current_patrol_waypoint, 0);
        assert_eq!(bb.patrol_cycles, 1);

        bb.position = Vec3::ZERO;
        bb.patrol_pause = None;
        act(&PatrolAction, &mut bb, &mut services);

        assert_eq!(bb.current_patrol_waypoint, 1);
        assert_eq!(bb.patrol_cycles, 1);
    }

    #[test]
    fn patrol_on_a_single_waypoint_counts_pauses_not_frames() {
        let mocks = MockServices::new();
        let mut services = mocks.agent_services();
        let mut bb = Blackboard::default().with_patrol([Vec3::ZERO]).with_position(Vec3::ZERO);

        for frame in 0..5 {
            bb.timer = frame as f32 * 0.1;
            act(&PatrolAction, &mut bb, &mut services);
        }
        assert_eq!(bb.patrol_cycles, 1);

        bb.timer = bb.config.patrol_pause_duration;
        act(&PatrolAction, &mut bb, &mut services);
        assert_eq!(bb.patrol_cycles, 2);
        assert_eq!(bb.patrol_pause, Some(PatrolPause { started_at: bb.config.patrol_pause_duration }));
    }

    #[test]
    fn walking_actions_drop_the_chase_pace() {
        let mocks = MockServices::new();
        let mut services = mocks.agent_services();
        let mut bb = Blackboard::default().with_home(Vec3::new(0., 0., 9.));
        bb.chase_target = Some(TargetId(3));
        mocks.perception.place(TargetId(3), Vec3::new(4., 0., 4.));

        for walk in [&GoHomeAction as &dyn Action, &WanderAction] {
            act(&ChaseAction, &mut bb, &mut services);
            assert!(bb.is_running);

            act(walk, &mut bb, &mut services);
            assert!(!bb.is_running);
            assert_eq!(mocks.navigation.current_speed(), bb.config.walk_speed);
        }
    }

    #[test]
    fn go_home_heads_home() {
        let mocks = MockServices::new();
        let mut services = mocks.agent_services();
        let mut bb = Blackboard::default().with_home(Vec3::new(0., 0., 9.));
        mocks.navigation.clone().set_stopped(true);

        act(&GoHomeAction, &mut bb, &mut services);

        assert_eq!(mocks.navigation.last_destination(), Some(Vec3::new(0., 0., 9.)));
        assert!(!mocks.navigation.stopped());
    }

    #[test]
    fn attack_hits_the_bound_target_once_per_call() {
        let mocks = MockServices::new();
        let mut services = mocks.agent_services();
        let mut bb = Blackboard::default();

        act(&AttackAction::default(), &mut bb, &mut services);
        assert!(mocks.health.hits().is_empty());
        assert!(!bb.has_attacked);

        bb.chase_target = Some(TargetId(9));
        act(&AttackAction { damage: 3 }, &mut bb, &mut services);

        assert_eq!(mocks.health.hits(), vec![(TargetId(9), 3)]);
        assert_eq!(mocks.animator.triggers(), vec![ATTACK_TRIGGER.to_owned()]);
        assert!(bb.has_attacked);
    }

    #[test]
    fn validation_names_the_missing_waypoints() {
        let bb = Blackboard::default();
        assert_eq!(
            GoHomeAction.validate(&bb),
            Err(ConfigError::MissingHomeWaypoint { required_by: "GoHome" })
        );
        assert_eq!(
            PatrolAction.validate(&bb),
            Err(ConfigError::MissingPatrolWaypoints { required_by: "Patrol" })
        );
        assert!(ChaseAction.validate(&bb).is_ok());
    }
}
