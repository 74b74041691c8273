use std::ops::Range;

use glam::Vec3;

use crate::error::ConfigError;
use crate::math::MIN_LENGTH;
use crate::particle::StateBuffer;

pub(crate) fn apply_drag(state: &mut StateBuffer, range: Range<usize>, k: f32) {
    for i in range {
        let f = -k * state.velocity(i);
        state.add_force(i, f);
    }
}

/// Constant inward push toward `center` for particles farther than `radius`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bubble {
    pub center: Vec3,
    pub radius: f32,
    pub strength: f32,
}

impl Bubble {
    pub(crate) fn validate(&self, owner: &str) -> Result<(), ConfigError> {
        if !(self.radius >= 0.0) || !self.strength.is_finite() || !self.center.is_finite() {
            return Err(ConfigError::invalid(
                owner,
                format!("bubble radius={} strength={}", self.radius, self.strength),
            ));
        }
        Ok(())
    }
}

impl Default for Bubble {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            radius: 1.0,
            strength: 1.0,
        }
    }
}

pub(crate) fn apply_bubble(state: &mut StateBuffer, range: Range<usize>, b: &Bubble) {
    for i in range {
        let offset = state.position(i) - b.center;
        let dist = offset.length();
        if dist > b.radius && dist > MIN_LENGTH {
            state.add_force(i, -offset / dist * b.strength);
        }
    }
}
