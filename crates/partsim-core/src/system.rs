//! Particle system construction and the per-tick step sequence.

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::config::SimConfig;
use crate::constraints::{enforce_constraints, link_line_indices, Constraint};
use crate::error::{ConfigError, SimError};
use crate::forces::{apply_forces, spring_line_indices, Force};
use crate::integrator::{integrate, Scratch};
use crate::lifecycle::Lifecycle;
use crate::particle::{ParticleInit, StateBuffer};

type Spawner = Box<dyn FnMut(usize, &mut SmallRng) -> ParticleInit>;

/// Collects everything a [`ParticleSystem`] needs, then validates it once.
///
/// Use method chaining to configure, then call `.build()`.
pub struct SystemBuilder {
    particle_count: usize,
    particles: Vec<ParticleInit>,
    spawner: Option<Spawner>,
    forces: Vec<Force>,
    constraints: Vec<Constraint>,
    config: SimConfig,
    lifecycle: Lifecycle,
}

impl SystemBuilder {
    pub fn new(particle_count: usize) -> Self {
        Self {
            particle_count,
            particles: Vec::new(),
            spawner: None,
            forces: Vec::new(),
            constraints: Vec::new(),
            config: SimConfig::default(),
            lifecycle: Lifecycle::default(),
        }
    }

    /// Explicit initial state, one entry per particle.
    pub fn with_particles(mut self, particles: Vec<ParticleInit>) -> Self {
        self.particles = particles;
        self
    }

    /// Initial state generator, called with `(index, rng)` for every particle.
    /// The generator is seeded from [`SimConfig::seed`], so seeding is
    /// reproducible. Ignored when explicit particles are given.
    pub fn with_spawner<F>(mut self, spawner: F) -> Self
    where
        F: FnMut(usize, &mut SmallRng) -> ParticleInit + 'static,
    {
        self.spawner = Some(Box::new(spawner));
        self
    }

    pub fn with_force(mut self, force: Force) -> Self {
        self.forces.push(force);
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn with_config(mut self, config: SimConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    /// Validate and assemble the system.
    ///
    /// Bad particles and lifecycle distributions are fatal. Bad descriptors
    /// and tunables are not: they are disabled (or reset to defaults),
    /// logged, and listed in [`ParticleSystem::diagnostics`].
    pub fn build(self) -> Result<ParticleSystem, SimError> {
        let SystemBuilder {
            particle_count: count,
            particles,
            spawner,
            mut forces,
            mut constraints,
            mut config,
            lifecycle,
        } = self;

        if count == 0 {
            return Err(SimError::Empty);
        }
        if !particles.is_empty() && particles.len() != count {
            return Err(SimError::InitCountMismatch {
                count: particles.len(),
                expected: count,
            });
        }
        lifecycle.validate()?;

        let mut diagnostics = config.sanitize();
        for err in &diagnostics {
            tracing::warn!(%err, "tunable reset to default");
        }

        let mut rng = SmallRng::seed_from_u64(config.seed);
        let particles = match (particles.is_empty(), spawner) {
            (false, _) => particles,
            (true, Some(mut spawn)) => (0..count).map(|i| spawn(i, &mut rng)).collect(),
            (true, None) => vec![ParticleInit::default(); count],
        };

        for (index, p) in particles.iter().enumerate() {
            if !(p.mass.is_finite() && p.mass > 0.0) {
                return Err(SimError::InvalidMass {
                    index,
                    mass: p.mass,
                });
            }
        }

        for (k, force) in forces.iter_mut().enumerate() {
            let owner = format!("force[{k}] {}", force.kind.name());
            if let Err(err) = force.validate(&owner, count) {
                tracing::warn!(%err, "force descriptor disabled");
                force.enabled = false;
                diagnostics.push(err);
            }
        }
        for (k, constraint) in constraints.iter_mut().enumerate() {
            let owner = format!("constraint[{k}] {}", constraint.kind.name());
            if let Err(err) = constraint.validate(&owner, count) {
                tracing::warn!(%err, "constraint descriptor disabled");
                constraint.enabled = false;
                diagnostics.push(err);
            }
        }

        let mut current = StateBuffer::new(count);
        for (i, p) in particles.iter().enumerate() {
            current.write(i, p);
        }

        let mut line_indices = spring_line_indices(&forces);
        line_indices.extend(link_line_indices(&constraints));

        tracing::debug!(
            particles = count,
            forces = forces.len(),
            constraints = constraints.len(),
            integrator = config.integrator.name(),
            fountain = lifecycle.fountain.is_some(),
            tornado = lifecycle.tornado.is_some(),
            "particle system built"
        );

        Ok(ParticleSystem {
            next: current.clone(),
            initial: current.clone(),
            current,
            scratch: Scratch::new(count),
            forces,
            constraints,
            config,
            lifecycle,
            rng,
            line_indices,
            diagnostics,
            ticks: 0,
        })
    }
}

/// A double-buffered particle system with its catalogs and tunables.
#[derive(Clone, Debug)]
pub struct ParticleSystem {
    current: StateBuffer,
    next: StateBuffer,
    /// State right after construction, for [`ParticleSystem::reset`].
    initial: StateBuffer,
    scratch: Scratch,
    forces: Vec<Force>,
    constraints: Vec<Constraint>,
    config: SimConfig,
    lifecycle: Lifecycle,
    rng: SmallRng,
    line_indices: Vec<u32>,
    diagnostics: Vec<ConfigError>,
    ticks: u64,
}

impl ParticleSystem {
    /// Advance one tick. `dt_ms` is the driver's elapsed time in
    /// milliseconds; see [`SimConfig::frame_seconds`] for clamping.
    pub fn step(&mut self, dt_ms: f32) {
        let dt = self.config.frame_seconds(dt_ms);

        // ==== 1. FORCES ====
        apply_forces(&mut self.current, &self.forces);

        // ==== 2. INTEGRATION ====
        integrate(
            self.config.integrator,
            &self.current,
            &mut self.next,
            &mut self.scratch,
            &self.forces,
            &self.config,
            dt,
        );

        // ==== 3. CONSTRAINTS ====
        enforce_constraints(&self.current, &mut self.next, &self.constraints, &self.config);

        // ==== 4. LIFECYCLE ====
        if self.lifecycle.is_active() {
            let respawned = self.lifecycle.apply(&mut self.next, &mut self.rng);
            if respawned > 0 {
                tracing::debug!(respawned, tick = self.ticks, "particles respawned");
            }
        }

        // ==== 5. SWAP ====
        std::mem::swap(&mut self.current, &mut self.next);
        self.ticks += 1;
    }

    /// Restore the initial state and reseed the generator.
    pub fn reset(&mut self) {
        self.current.copy_from(&self.initial);
        self.next.copy_from(&self.initial);
        self.rng = SmallRng::seed_from_u64(self.config.seed);
        self.ticks = 0;
    }

    /// Replace the respawn generator's seed. Later resets reuse it. The
    /// initial particles are not redrawn.
    pub fn reseed(&mut self, seed: u64) {
        self.config.seed = seed;
        self.rng = SmallRng::seed_from_u64(seed);
    }

    /// State after the last completed tick.
    pub fn state(&self) -> &StateBuffer {
        &self.current
    }

    pub fn particle_count(&self) -> usize {
        self.current.count()
    }

    /// Pairs to draw as line segments, `[a0, b0, a1, b1, ...]`, from the
    /// spring, rod and rope descriptors accepted at construction.
    pub fn line_indices(&self) -> &[u32] {
        &self.line_indices
    }

    /// Configuration problems found so far. Descriptors named here are
    /// disabled.
    pub fn diagnostics(&self) -> &[ConfigError] {
        &self.diagnostics
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Replace the tunables. Unusable values are reset to their defaults and
    /// returned (and recorded in the diagnostics).
    pub fn set_config(&mut self, mut config: SimConfig) -> Vec<ConfigError> {
        let errors = config.sanitize();
        for err in &errors {
            tracing::warn!(%err, "tunable reset to default");
        }
        self.diagnostics.extend(errors.iter().cloned());
        self.config = config;
        errors
    }

    pub fn forces(&self) -> &[Force] {
        &self.forces
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Toggle a force descriptor. Enabling re-validates it first.
    pub fn set_force_enabled(&mut self, index: usize, enabled: bool) -> Result<(), ConfigError> {
        let count = self.particle_count();
        let owner = format!("force[{index}]");
        let force = self
            .forces
            .get_mut(index)
            .ok_or_else(|| ConfigError::invalid(&owner, "no such force"))?;
        if enabled {
            force.validate(&owner, count)?;
        }
        force.enabled = enabled;
        Ok(())
    }

    /// Toggle a constraint descriptor. Enabling re-validates it first.
    pub fn set_constraint_enabled(&mut self, index: usize, enabled: bool) -> Result<(), ConfigError> {
        let count = self.particle_count();
        let owner = format!("constraint[{index}]");
        let constraint = self
            .constraints
            .get_mut(index)
            .ok_or_else(|| ConfigError::invalid(&owner, "no such constraint"))?;
        if enabled {
            constraint.validate(&owner, count)?;
        }
        constraint.enabled = enabled;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forces::ForceKind;
    use crate::targeting::Target;

    #[test]
    fn test_empty_system_rejected() {
        assert_eq!(SystemBuilder::new(0).build().unwrap_err(), SimError::Empty);
    }

    #[test]
    fn test_zero_mass_rejected() {
        let particles = vec![
            ParticleInit::default(),
            ParticleInit { mass: 0.0, ..Default::default() },
        ];
        let err = SystemBuilder::new(2).with_particles(particles).build().unwrap_err();
        assert!(matches!(err, SimError::InvalidMass { index: 1, .. }));
    }

    #[test]
    fn test_bad_descriptor_is_disabled_not_fatal() {
        let sys = SystemBuilder::new(4)
            .with_force(Force::drag(Target::Range { first: 2, count: 5 }, 0.1))
            .with_force(Force::new(ForceKind::Mouse, Target::ALL))
            .with_force(Force::drag(Target::ALL, 0.1))
            .build()
            .unwrap();
        assert_eq!(sys.diagnostics().len(), 2);
        assert!(!sys.forces()[0].enabled);
        assert!(!sys.forces()[1].enabled);
        assert!(sys.forces()[2].enabled);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut sys = SystemBuilder::new(3).build().unwrap();
        let initial = sys.state().clone();
        for _ in 0..10 {
            sys.step(16.0);
        }
        assert_ne!(sys.state(), &initial);
        sys.reset();
        assert_eq!(sys.state(), &initial);
        assert_eq!(sys.ticks(), 0);
    }

    #[test]
    fn test_enabling_invalid_force_fails() {
        let mut sys = SystemBuilder::new(2)
            .with_force(Force::drag(Target::From(5), 0.1))
            .build()
            .unwrap();
        assert!(sys.set_force_enabled(0, true).is_err());
        assert!(!sys.forces()[0].enabled);
        assert!(sys.set_force_enabled(9, false).is_err());
    }
}
