//! The boundary between the state machine and whatever engine is hosting it.
//!
//! Every physics, navigation, animation and health concern is reached through one of
//! the traits below. The library never implements them itself (apart from the trivial
//! pass-through surface); hosts plug in their engine's versions and tests plug in mocks.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::errors::ConfigError;
use crate::types::{CastHit, HealthAmount, LayerMask, Point, TargetId};

/// A navigation agent that can be told where to go.
///
/// Path computation is fire-and-forget: the state machine never waits on it and
/// simply polls its own position against the destination every frame.
pub trait NavigationAgent: Send + Sync {
    fn set_destination(&mut self, point: Point);

    fn is_stopped(&self) -> bool;

    fn set_stopped(&mut self, stopped: bool);

    fn speed(&self) -> f32;

    fn set_speed(&mut self, speed: f32);
}

/// Directional volumetric intersection queries (i.e. sphere casts) against the world.
pub trait PerceptionQuery: Send + Sync {
    /// Sweeps a sphere of `radius` from `origin` along `direction` for at most
    /// `max_distance`, returning the first object on one of the `layers` it hits.
    fn cast(
        &self,
        origin: Point,
        radius: f32,
        direction: Point,
        max_distance: f32,
        layers: LayerMask,
    ) -> Option<CastHit>;

    /// Resolves a previously perceived target to its current position.
    /// Returns None if the target no longer exists.
    fn locate(&self, target: TargetId) -> Option<Point>;
}

/// Snaps arbitrary points onto the navigable surface.
pub trait SurfaceSampler: Send + Sync {
    /// The nearest navigable point within `max_radius` of `point`, if any.
    fn sample_nearest(&self, point: Point, max_radius: f32) -> Option<Point>;
}

/// Fire-and-forget animation signals.
pub trait AnimationSink: Send + Sync {
    fn set_trigger(&mut self, trigger: &str);
}

/// Fire-and-forget health mutations on host-owned objects.
pub trait HealthSink: Send + Sync {
    fn remove_health(&mut self, target: TargetId, amount: HealthAmount);
}

/// A SurfaceSampler for hosts without a navigation mesh: every point is navigable.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassThroughSurface;

impl SurfaceSampler for PassThroughSurface {
    fn sample_nearest(&self, point: Point, _max_radius: f32) -> Option<Point> {
        Some(point)
    }
}


/// Everything one agent needs from its host, owned by its AIStateController.
pub struct AgentServices {
    pub navigation: Box<dyn NavigationAgent>,
    pub perception: Box<dyn PerceptionQuery>,
    pub surface: Box<dyn SurfaceSampler>,
    pub animator: Box<dyn AnimationSink>,
    pub health: Box<dyn HealthSink>,
    /// Per-agent randomness; seeded so a replayed session wanders the same way.
    pub rng: ChaCha8Rng,
}

impl AgentServices {
    pub fn builder() -> AgentServicesBuilder {
        AgentServicesBuilder::default()
    }
}

impl core::fmt::Debug for AgentServices {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AgentServices").finish_non_exhaustive()
    }
}

/// Builder pattern for AgentServices
///
/// Navigation, perception, animation and health have no sensible fallback and
/// must be provided; the surface defaults to `PassThroughSurface` and the rng
/// seed defaults to zero.
#[derive(Default)]
pub struct AgentServicesBuilder {
    navigation: Option<Box<dyn NavigationAgent>>,
    perception: Option<Box<dyn PerceptionQuery>>,
    surface: Option<Box<dyn SurfaceSampler>>,
    animator: Option<Box<dyn AnimationSink>>,
    health: Option<Box<dyn HealthSink>>,
    seed: Option<u64>,
}

impl AgentServicesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn navigation(mut self, val: impl NavigationAgent + 'static) -> Self {
        self.navigation = Some(Box::new(val)); self
    }

    pub fn perception(mut self, val: impl PerceptionQuery + 'static) -> Self {
        self.perception = Some(Box::new(val)); self
    }

    pub fn surface(mut self, val: impl SurfaceSampler + 'static) -> Self {
        self.surface = Some(Box::new(val)); self
    }

    pub fn animator(mut self, val: impl AnimationSink + 'static) -> Self {
        self.animator = Some(Box::new(val)); self
    }

    pub fn health(mut self, val: impl HealthSink + 'static) -> Self {
        self.health = Some(Box::new(val)); self
    }

    pub fn seed(mut self, val: u64) -> Self {
        self.seed = Some(val); self
    }

    pub fn build(self) -> Result<AgentServices, ConfigError> {
        Ok(AgentServices {
            navigation: self.navigation.ok_or(ConfigError::MissingService("navigation"))?,
            perception: self.perception.ok_or(ConfigError::MissingService("perception"))?,
            surface: self.surface.unwrap_or_else(|| Box::new(PassThroughSurface)),
            animator: self.animator.ok_or(ConfigError::MissingService("animation"))?,
            health: self.health.ok_or(ConfigError::MissingService("health"))?,
            rng: ChaCha8Rng::seed_from_u64(self.seed.unwrap_or(0)),
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockServices;

    #[test]
    fn builder_requires_navigation() {
        let mocks = MockServices::new();
        let res = AgentServices::builder()
            .perception(mocks.perception.clone())
            .animator(mocks.animator.clone())
            .health(mocks.health.clone())
            .build();

        assert_eq!(res.err(), Some(ConfigError::MissingService("navigation")));
    }

    #[test]
    fn builder_defaults_the_surface() {
        let mocks = MockServices::new();
        let services = AgentServices::builder()
            .navigation(mocks.navigation.clone())
            .perception(mocks.perception.clone())
            .animator(mocks.animator.clone())
            .health(mocks.health.clone())
            .build();

        let services = match services {
            Ok(services) => services,
            Err(err) => panic!("unexpected error: {}", err),
        };
        let point = Point::new(1., 2., 3.);
        assert_eq!(services.surface.sample_nearest(point, 0.), Some(point));
    }
}
