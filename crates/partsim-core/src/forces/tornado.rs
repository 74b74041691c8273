use std::ops::Range;

use glam::Vec3;

use crate::error::ConfigError;
use crate::math::{horizontal, MIN_LENGTH};
use crate::particle::StateBuffer;

/// World-up for the tornado frame.
pub const UP: Vec3 = Vec3::Z;

/// Vertical vortex around the axis through `center` parallel to [`UP`].
///
/// Force magnitude at horizontal distance `r` and height `h` above the base:
/// `5 - 2 ln(r + 1) + 0.2 h / height`. It drives the particle around the axis
/// (`swirl`), up and around the funnel wall, and toward the axis (`inward`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tornado {
    /// Base of the axis.
    pub center: Vec3,
    /// Horizontal extent of the funnel; particles beyond it are recycled by
    /// the tornado lifecycle.
    pub radius: f32,
    pub height: f32,
    /// Gain on the tangential component.
    pub swirl: f32,
    /// Gain on the horizontal pull toward the axis.
    pub inward: f32,
}

impl Tornado {
    pub fn new(center: Vec3, radius: f32, height: f32) -> Self {
        Self {
            center,
            radius,
            height,
            ..Default::default()
        }
    }

    /// Horizontal distance of `p` from the axis.
    pub fn axis_distance(&self, p: Vec3) -> f32 {
        horizontal(p - self.center).length()
    }

    pub(crate) fn validate(&self, owner: &str) -> Result<(), ConfigError> {
        if !(self.radius > 0.0) || !(self.height > 0.0) {
            return Err(ConfigError::invalid(
                owner,
                format!("tornado radius={} height={}", self.radius, self.height),
            ));
        }
        if !self.center.is_finite() || !self.swirl.is_finite() || !self.inward.is_finite() {
            return Err(ConfigError::invalid(owner, "tornado parameters must be finite"));
        }
        Ok(())
    }

    /// Force on a particle at `p`. Zero on the axis itself.
    pub fn force_at(&self, p: Vec3) -> Vec3 {
        let offset = p - self.center;
        let radial = horizontal(offset);
        let r = radial.length();
        if r < MIN_LENGTH {
            return Vec3::ZERO;
        }

        let out = offset.normalize_or_zero();
        let swirl = UP.cross(out).normalize_or_zero();
        let lift = out.cross(swirl);

        let h = offset.z.abs();
        let mag = 5.0 - 2.0 * (r + 1.0).ln() + 0.2 * h / self.height;

        mag * (self.swirl * swirl + lift) - self.inward * mag * (radial / r)
    }
}

impl Default for Tornado {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            radius: 20.0,
            height: 30.0,
            swirl: 1.0,
            inward: 10.0,
        }
    }
}

pub(crate) fn apply_tornado(state: &mut StateBuffer, range: Range<usize>, t: &Tornado) {
    for i in range {
        let f = t.force_at(state.position(i));
        state.add_force(i, f);
    }
}
