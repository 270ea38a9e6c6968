//! The Blackboard: all the mutable, per-agent data the state machine reads and writes.
//!
//! States, Decisions and Actions are shared between every agent using them, so
//! nothing agent-specific may live on them. Anything an Action needs to remember
//! between frames (a pause in progress, the current wander destination) lives here.

use bevy::math::Vec3;
use bevy::reflect::Reflect;

#[cfg(any(feature = "asset_loader"))]
use serde::{Deserialize, Serialize};

use crate::types::{CastShape, EyeTransform, Point, Seconds, TargetId};

/// Relative tolerance of `approximately()`.
const APPROXIMATELY_RELATIVE: f32 = 1e-6;

/// Absolute floor of `approximately()`; distances below this count as zero.
const APPROXIMATELY_FLOOR: f32 = 1e-5;

/// Float comparison tolerant of accumulated rounding error.
pub fn approximately(a: f32, b: f32) -> bool {
    let tolerance = (APPROXIMATELY_RELATIVE * a.abs().max(b.abs())).max(APPROXIMATELY_FLOOR);
    (b - a).abs() < tolerance
}

/// Proximity test shared by everything that asks 'have we arrived?'.
///
/// A zero threshold means 'at the same spot, give or take float noise';
/// anything else is a strict radius.
pub fn within_threshold(distance: f32, threshold: f32) -> bool {
    if threshold == 0. {
        approximately(distance, 0.)
    } else {
        distance < threshold
    }
}

/// Distance between two points, ignoring their height difference.
pub fn horizontal_distance(from: Point, to: Point) -> f32 {
    Vec3::new(from.x, to.y, from.z).distance(to)
}


/// Tunable, designer-facing values for one agent.
#[derive(Reflect, Clone, Copy, Debug, PartialEq)]
#[cfg_attr(any(feature = "asset_loader"), derive(Serialize, Deserialize))]
#[cfg_attr(any(feature = "asset_loader"), serde(default))]
pub struct BlackboardConfig {
    /// Sightline used by the Look decision.
    pub look: CastShape,
    /// Reach used by the Attack decision.
    pub attack: CastShape,
    /// Maximum distance from home when wandering.
    pub wander_radius: f32,
    /// Maximum distance to search for a navigable point when snapping to the surface.
    pub check_radius: f32,
    /// How long to wait at each patrol waypoint.
    pub patrol_pause_duration: Seconds,
    /// How close counts as 'arrived'. Zero means 'approximately exactly there'.
    pub threshold: f32,
    pub walk_speed: f32,
    pub run_speed: f32,
}

impl Default for BlackboardConfig {
    fn default() -> Self {
        Self {
            look: CastShape::new(5., 10.),
            attack: CastShape::new(1., 2.),
            wander_radius: 30.,
            check_radius: 10.,
            patrol_pause_duration: 30.,
            threshold: 0.,
            walk_speed: 3.5,
            run_speed: 7.,
        }
    }
}

/// A pause in progress at a patrol waypoint.
#[derive(Reflect, Clone, Copy, Debug, PartialEq)]
pub struct PatrolPause {
    /// The value of the state timer when the pause began.
    pub started_at: Seconds,
}

impl PatrolPause {
    pub fn elapsed(&self, timer: Seconds) -> Seconds {
        timer - self.started_at
    }
}


#[derive(Clone, Debug, PartialEq)]
pub struct Blackboard {
    pub config: BlackboardConfig,

    /* Pose, written by the host every frame. */
    pub position: Point,
    pub eyes: EyeTransform,
    /// Position at the end of the previous tick.
    pub previous_position: Point,
    /// Speed derived from the last tick's movement, for animation blending.
    pub observed_speed: f32,

    /* Waypoints */
    pub home_waypoint: Option<Point>,
    pub patrol_waypoints: Vec<Point>,
    pub current_patrol_waypoint: usize,
    /// Full patrol loops completed since entering the current state.
    pub patrol_cycles: u32,
    pub patrol_pause: Option<PatrolPause>,

    /* Targets */
    pub chase_target: Option<TargetId>,
    pub wander_target: Option<Point>,
    /// Forces the next Wander to pick a fresh target.
    pub wander_restart: bool,

    /// Seconds since the current state was entered.
    pub timer: Seconds,

    /* Flags */
    pub is_running: bool,
    pub has_attacked: bool,
}

impl Blackboard {
    pub fn new(config: BlackboardConfig) -> Self {
        Self {
            config,
            position: Vec3::ZERO,
            eyes: EyeTransform::default(),
            previous_position: Vec3::ZERO,
            observed_speed: 0.,
            home_waypoint: None,
            patrol_waypoints: Vec::new(),
            current_patrol_waypoint: 0,
            patrol_cycles: 0,
            patrol_pause: None,
            chase_target: None,
            wander_target: None,
            wander_restart: true,
            timer: 0.,
            is_running: false,
            has_attacked: false,
        }
    }

    pub fn with_position(mut self, position: Point) -> Self {
        self.position = position;
        self.previous_position = position;
        self
    }

    pub fn with_eyes(mut self, eyes: EyeTransform) -> Self {
        self.eyes = eyes;
        self
    }

    pub fn with_home(mut self, home: Point) -> Self {
        self.home_waypoint = Some(home);
        self
    }

    pub fn with_patrol(mut self, waypoints: impl IntoIterator<Item = Point>) -> Self {
        self.patrol_waypoints = waypoints.into_iter().collect();
        self.current_patrol_waypoint = 0;
        self
    }

    /// The patrol waypoint the agent is currently heading for.
    pub fn active_patrol_waypoint(&self) -> Option<Point> {
        self.patrol_waypoints.get(self.current_patrol_waypoint).copied()
    }

    /// Whether the agent stands at `point`, per the configured threshold.
    /// Only the horizontal distance counts.
    pub fn is_at(&self, point: Point) -> bool {
        within_threshold(horizontal_distance(self.position, point), self.config.threshold)
    }

    /// Clears everything a state must not inherit from its predecessor.
    pub(crate) fn reset_transients(&mut self) {
        self.timer = 0.;
        self.patrol_cycles = 0;
        self.patrol_pause = None;
        self.wander_restart = true;
    }

    /// Per-frame bookkeeping run at the end of every tick.
    pub(crate) fn advance(&mut self, delta: Seconds) {
        self.timer += delta;
        self.observed_speed = match delta > 0. {
            true => self.position.distance(self.previous_position) / delta,
            false => 0.,
        };
        self.previous_position = self.position;
    }
}

impl Default for Blackboard {
    fn default() -> Self {
        Self::new(BlackboardConfig::default())
    }
}
