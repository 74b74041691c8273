use glam::Vec3;

use crate::error::ConfigError;

/// Horizontal floor at height `z` over the rectangle
/// `[x_min, x_max] x [y_min, y_max]`.
///
/// One-sided: only particles coming down from above are caught.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlidePlane {
    pub x_min: f32,
    pub x_max: f32,
    pub y_min: f32,
    pub y_max: f32,
    pub z: f32,
}

impl SlidePlane {
    pub(crate) fn validate(&self, owner: &str) -> Result<(), ConfigError> {
        let finite = [self.x_min, self.x_max, self.y_min, self.y_max, self.z]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.x_min > self.x_max || self.y_min > self.y_max {
            return Err(ConfigError::invalid(owner, format!("slide plane {self:?}")));
        }
        Ok(())
    }

    #[inline]
    fn covers(&self, p: Vec3) -> bool {
        p.x >= self.x_min && p.x <= self.x_max && p.y >= self.y_min && p.y <= self.y_max
    }

    /// New position and velocity if the particle moved from `prev` (on or
    /// above the plane) to `p` (on or below it) within the rectangle.
    pub fn resolve(&self, prev: Vec3, p: Vec3, v: Vec3) -> Option<(Vec3, Vec3)> {
        if !self.covers(p) || prev.z < self.z || p.z > self.z {
            return None;
        }
        Some((Vec3::new(p.x, p.y, self.z), Vec3::new(v.x, v.y, 0.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLOOR: SlidePlane = SlidePlane {
        x_min: -1.0,
        x_max: 1.0,
        y_min: -1.0,
        y_max: 1.0,
        z: 0.0,
    };

    #[test]
    fn test_catches_particle_from_above() {
        let out = FLOOR.resolve(Vec3::new(0.0, 0.0, 0.2), Vec3::new(0.1, 0.0, -0.1), Vec3::new(1.0, 0.0, -3.0));
        assert_eq!(out, Some((Vec3::new(0.1, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0))));
    }

    #[test]
    fn test_ignores_outside_rectangle_and_below() {
        assert!(FLOOR.resolve(Vec3::new(2.0, 0.0, 1.0), Vec3::new(2.0, 0.0, -1.0), Vec3::ZERO).is_none());
        assert!(FLOOR.resolve(Vec3::new(0.0, 0.0, -2.0), Vec3::new(0.0, 0.0, -1.0), Vec3::ZERO).is_none());
    }
}
