//! Force generators and the per-tick accumulation pass.
//!
//! Forces only ever write the force accumulator, so every generator may read
//! positions and velocities of the same buffer it accumulates into.

pub mod field;
pub mod flocking;
pub mod gravity;
pub mod spring;
pub mod tornado;

use std::ops::Range;

use glam::Vec3;

use crate::error::ConfigError;
use crate::particle::StateBuffer;
use crate::targeting::Target;

pub use field::Bubble;
pub use flocking::{BoidRule, Flocking, Obstacle};
pub use gravity::{EarthGravity, PlanetaryGravity};
pub use spring::{Spring, SpringLink, SpringSet};
pub use tornado::Tornado;

/// What a force generator does. Each variant carries only its own parameters.
#[derive(Clone, Debug, PartialEq)]
pub enum ForceKind {
    EarthGravity(EarthGravity),
    /// Mutual attraction of a particle pair.
    PlanetaryGravity(PlanetaryGravity),
    Bubble(Bubble),
    /// Linear viscous drag, `F = -k * v`.
    Drag { k: f32 },
    /// Damped spring between the two endpoints of a pair target.
    Spring(Spring),
    /// Many identical springs in one descriptor; the target is ignored.
    SpringSet(SpringSet),
    /// Clears the accumulator of the targeted particles after every other
    /// force has been applied. Existing velocity is kept, so a moving
    /// particle keeps drifting; pin it with an anchor constraint instead.
    Anchor,
    Tornado(Tornado),
    Flocking(Flocking),
    /// Spring to the mouse cursor. Needs presentation-layer input and is not
    /// evaluated by the kernel.
    Mouse,
}

impl ForceKind {
    pub fn name(&self) -> &'static str {
        match self {
            ForceKind::EarthGravity(_) => "EarthGravity",
            ForceKind::PlanetaryGravity(_) => "PlanetaryGravity",
            ForceKind::Bubble(_) => "Bubble",
            ForceKind::Drag { .. } => "Drag",
            ForceKind::Spring(_) => "Spring",
            ForceKind::SpringSet(_) => "SpringSet",
            ForceKind::Anchor => "Anchor",
            ForceKind::Tornado(_) => "Tornado",
            ForceKind::Flocking(_) => "Flocking",
            ForceKind::Mouse => "Mouse",
        }
    }
}

/// One entry of the force catalog.
#[derive(Clone, Debug, PartialEq)]
pub struct Force {
    pub kind: ForceKind,
    pub target: Target,
    pub enabled: bool,
}

impl Force {
    pub fn new(kind: ForceKind, target: Target) -> Self {
        Self {
            kind,
            target,
            enabled: true,
        }
    }

    /// Earth gravity with the default `-Z` down direction.
    pub fn earth_gravity(target: Target, g: f32) -> Self {
        Self::new(ForceKind::EarthGravity(EarthGravity::new(g)), target)
    }

    pub fn drag(target: Target, k: f32) -> Self {
        Self::new(ForceKind::Drag { k }, target)
    }

    pub fn spring(e1: usize, e2: usize, spring: Spring) -> Self {
        Self::new(ForceKind::Spring(spring), Target::Pair(e1, e2))
    }

    pub fn anchor(target: Target) -> Self {
        Self::new(ForceKind::Anchor, target)
    }

    pub fn tornado(target: Target, tornado: Tornado) -> Self {
        Self::new(ForceKind::Tornado(tornado), target)
    }

    pub fn flocking(target: Target, flocking: Flocking) -> Self {
        Self::new(ForceKind::Flocking(flocking), target)
    }

    /// Check the target and the kind's parameters against a system of
    /// `particle_count` particles.
    pub fn validate(&self, owner: &str, particle_count: usize) -> Result<(), ConfigError> {
        match &self.kind {
            ForceKind::Mouse => {
                return Err(ConfigError::Unsupported {
                    owner: owner.to_owned(),
                    kind: self.kind.name(),
                })
            }
            ForceKind::SpringSet(set) => return set.validate(owner, particle_count),
            ForceKind::Spring(_) | ForceKind::PlanetaryGravity(_) => {
                if self.target.pair().is_none() {
                    return Err(ConfigError::invalid(
                        owner,
                        "pairwise force needs a Target::Pair",
                    ));
                }
            }
            _ => {}
        }
        self.target.validate(owner, particle_count)?;

        match &self.kind {
            ForceKind::EarthGravity(g) => g.validate(owner),
            ForceKind::PlanetaryGravity(p) => p.validate(owner),
            ForceKind::Bubble(b) => b.validate(owner),
            ForceKind::Drag { k } if !k.is_finite() => {
                Err(ConfigError::invalid(owner, format!("drag coefficient {k}")))
            }
            ForceKind::Spring(s) => s.validate(owner),
            ForceKind::Tornado(t) => t.validate(owner),
            ForceKind::Flocking(f) => f.validate(owner),
            _ => Ok(()),
        }
    }
}

/// Clear every accumulator, then add the contribution of each enabled force.
///
/// Anchor forces run last regardless of their catalog position, so they
/// cancel everything else applied to their particles this pass.
pub fn apply_forces(state: &mut StateBuffer, forces: &[Force]) {
    state.clear_forces();
    let count = state.count();

    for force in forces.iter().filter(|f| f.enabled) {
        match &force.kind {
            ForceKind::PlanetaryGravity(p) => {
                if let Some((e1, e2)) = force.target.pair() {
                    gravity::apply_planetary_gravity(state, e1, e2, p);
                }
            }
            ForceKind::Spring(s) => {
                if let Some((e1, e2)) = force.target.pair() {
                    spring::apply_spring(state, e1, e2, s);
                }
            }
            ForceKind::SpringSet(set) => spring::apply_spring_set(state, set),
            ForceKind::Flocking(f) => {
                // A pair is one two-boid flock, not two lone boids.
                let mut flock: Vec<usize> = force.target.indices(count).collect();
                flock.dedup();
                flocking::apply_flocking(state, &flock, f);
            }
            // Anchors are handled below; Mouse is rejected at validation.
            ForceKind::Anchor | ForceKind::Mouse => {}
            kind => {
                for span in force.target.spans(count) {
                    apply_over(state, span, kind);
                }
            }
        }
    }

    for force in forces
        .iter()
        .filter(|f| f.enabled && matches!(f.kind, ForceKind::Anchor))
    {
        for i in force.target.indices(count) {
            state.set_force(i, Vec3::ZERO);
        }
    }
}

fn apply_over(state: &mut StateBuffer, span: Range<usize>, kind: &ForceKind) {
    if span.is_empty() {
        return;
    }
    match kind {
        ForceKind::EarthGravity(g) => gravity::apply_earth_gravity(state, span, g),
        ForceKind::Bubble(b) => field::apply_bubble(state, span, b),
        ForceKind::Drag { k } => field::apply_drag(state, span, *k),
        ForceKind::Tornado(t) => tornado::apply_tornado(state, span, t),
        _ => {}
    }
}

/// Particle pairs joined by spring descriptors, flattened as
/// `[a0, b0, a1, b1, ...]` for line rendering.
pub fn spring_line_indices(forces: &[Force]) -> Vec<u32> {
    let mut indices = Vec::new();
    for force in forces.iter().filter(|f| f.enabled) {
        match &force.kind {
            ForceKind::Spring(_) => {
                if let Some((e1, e2)) = force.target.pair() {
                    indices.extend([e1 as u32, e2 as u32]);
                }
            }
            ForceKind::SpringSet(set) => {
                for link in &set.links {
                    indices.extend([link.a as u32, link.b as u32]);
                }
            }
            _ => {}
        }
    }
    indices
}
