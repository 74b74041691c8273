use std::ops::Range;

use glam::Vec3;

use crate::error::ConfigError;
use crate::math::MIN_LENGTH;
use crate::particle::StateBuffer;

/// Uniform gravity field: `F = m * g * down`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EarthGravity {
    /// Acceleration in m/s^2.
    pub g: f32,
    /// Unit "down" vector.
    pub down: Vec3,
}

impl EarthGravity {
    pub fn new(g: f32) -> Self {
        Self {
            g,
            down: Vec3::NEG_Z,
        }
    }

    /// Gravity along an arbitrary direction; `down` is normalized here.
    pub fn with_down(g: f32, down: Vec3) -> Self {
        Self {
            g,
            down: down.normalize_or_zero(),
        }
    }

    pub(crate) fn validate(&self, owner: &str) -> Result<(), ConfigError> {
        if !self.g.is_finite() {
            return Err(ConfigError::invalid(owner, format!("gravity constant {}", self.g)));
        }
        if (self.down.length() - 1.0).abs() > 1.0e-3 {
            return Err(ConfigError::invalid(owner, "down direction must be a unit vector"));
        }
        Ok(())
    }
}

impl Default for EarthGravity {
    fn default() -> Self {
        Self::new(9.832)
    }
}

pub(crate) fn apply_earth_gravity(state: &mut StateBuffer, range: Range<usize>, g: &EarthGravity) {
    let accel = g.down * g.g;
    for i in range {
        let f = accel * state.mass(i);
        state.add_force(i, f);
    }
}

/// Newtonian attraction between two particles:
/// `F = G * m1 * m2 / max(d, min_distance)^2`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlanetaryGravity {
    pub g: f32,
    /// Smallest separation used in the force law; keeps colliding planets
    /// from producing near-infinite forces.
    pub min_distance: f32,
}

impl PlanetaryGravity {
    pub(crate) fn validate(&self, owner: &str) -> Result<(), ConfigError> {
        if !self.g.is_finite() || !(self.min_distance > 0.0) {
            return Err(ConfigError::invalid(
                owner,
                format!("planetary gravity g={} min_distance={}", self.g, self.min_distance),
            ));
        }
        Ok(())
    }
}

impl Default for PlanetaryGravity {
    fn default() -> Self {
        Self {
            g: 9.832,
            min_distance: 10.0,
        }
    }
}

pub(crate) fn apply_planetary_gravity(
    state: &mut StateBuffer,
    e1: usize,
    e2: usize,
    p: &PlanetaryGravity,
) {
    let diff = state.position(e2) - state.position(e1);
    let dist = diff.length();
    if dist < MIN_LENGTH {
        return;
    }
    let r = dist.max(p.min_distance);
    let magnitude = p.g * state.mass(e1) * state.mass(e2) / (r * r);
    let f = diff / dist * magnitude;
    state.add_force(e1, f);
    state.add_force(e2, -f);
}
