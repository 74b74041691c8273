use glam::{Affine3A, Vec3};

use super::HitParams;
use crate::error::ConfigError;
use crate::math::{wrap, Aabb, MIN_LENGTH};

/// Axis-aligned box that keeps particles inside.
///
/// Walls sit `margin` inside `bounds`; a particle past a wall is put back on it
/// and its velocity goes through the hit response for that wall.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Volume {
    pub bounds: Aabb,
    pub margin: f32,
}

impl Volume {
    pub const DEFAULT_MARGIN: f32 = 0.1;

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            bounds: Aabb::new(min, max),
            margin: Self::DEFAULT_MARGIN,
        }
    }

    /// The box particles are actually held in.
    pub fn walls(&self) -> Aabb {
        self.bounds.inset(self.margin)
    }

    pub(crate) fn validate(&self, owner: &str) -> Result<(), ConfigError> {
        if !self.bounds.is_valid() || !(self.margin >= 0.0) {
            return Err(ConfigError::invalid(owner, format!("volume {:?}", self)));
        }
        if !self.walls().is_valid() {
            return Err(ConfigError::invalid(
                owner,
                format!("margin {} leaves no room inside the volume", self.margin),
            ));
        }
        Ok(())
    }

    /// Resolve one particle. Each axis is handled on its own; at most one of
    /// its two walls can be hit per tick.
    pub fn resolve(&self, mut p: Vec3, mut v: Vec3, v_prev: Vec3, hit: &HitParams) -> (Vec3, Vec3) {
        let walls = self.walls();
        for axis in 0..3 {
            let mut n = Vec3::ZERO;
            if p[axis] < walls.min[axis] {
                p[axis] = walls.min[axis];
                n[axis] = -1.0;
            } else if p[axis] > walls.max[axis] {
                p[axis] = walls.max[axis];
                n[axis] = 1.0;
            } else {
                continue;
            }
            v = hit.respond(v, v_prev, n);
        }
        (p, v)
    }
}

/// Ellipsoid inscribed in an axis-aligned box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ball {
    pub bounds: Aabb,
}

impl Ball {
    pub(crate) fn validate(&self, owner: &str) -> Result<(), ConfigError> {
        let extent = self.bounds.extent();
        if !self.bounds.is_valid() || extent.min_element() <= 0.0 {
            return Err(ConfigError::invalid(owner, format!("ball bounds {:?}", self.bounds)));
        }
        Ok(())
    }

    pub fn resolve(&self, p: Vec3, v: Vec3, v_prev: Vec3, hit: &HitParams) -> (Vec3, Vec3) {
        let center = self.bounds.center();
        let half = self.bounds.extent() * 0.5;
        // Unit-sphere coordinates.
        let q = (p - center) / half;
        let len = q.length();
        if len <= 1.0 || len < MIN_LENGTH {
            return (p, v);
        }
        let q = q / len;
        let surface = center + q * half;
        // Gradient of the implicit ellipsoid at the projected point.
        let n = (q / half).normalize_or_zero();
        (surface, hit.respond(v, v_prev, n))
    }
}

/// [`Volume`] in a rigidly transformed frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatrixVolume {
    /// World-to-pose transform: rotation and translation only.
    pub pose: Affine3A,
    pub volume: Volume,
}

impl MatrixVolume {
    pub fn new(pose: Affine3A, min: Vec3, max: Vec3) -> Self {
        Self {
            pose,
            volume: Volume::new(min, max),
        }
    }

    pub(crate) fn validate(&self, owner: &str) -> Result<(), ConfigError> {
        let det = self.pose.matrix3.determinant();
        if !det.is_finite() || (det - 1.0).abs() > 1.0e-3 {
            return Err(ConfigError::invalid(
                owner,
                format!("pose must be a rigid transform (det = {det})"),
            ));
        }
        self.volume.validate(owner)
    }

    /// `to_world` is `pose.inverse()`, computed once per pass by the caller.
    pub fn resolve(
        &self,
        to_world: &Affine3A,
        p: Vec3,
        v: Vec3,
        v_prev: Vec3,
        hit: &HitParams,
    ) -> (Vec3, Vec3) {
        let (lp, lv) = self.volume.resolve(
            self.pose.transform_point3(p),
            self.pose.transform_vector3(v),
            self.pose.transform_vector3(v_prev),
            hit,
        );
        (to_world.transform_point3(lp), to_world.transform_vector3(lv))
    }
}

/// Periodic box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Wrap {
    pub bounds: Aabb,
}

impl Wrap {
    pub(crate) fn validate(&self, owner: &str) -> Result<(), ConfigError> {
        let extent = self.bounds.extent();
        if !self.bounds.is_valid() || extent.min_element() <= 0.0 {
            return Err(ConfigError::invalid(
                owner,
                format!("wrap extent {extent:?} must be positive on every axis"),
            ));
        }
        Ok(())
    }

    pub fn apply(&self, p: Vec3) -> Vec3 {
        let len = self.bounds.extent();
        Vec3::new(
            wrap(p.x, self.bounds.min.x, len.x),
            wrap(p.y, self.bounds.min.y, len.y),
            wrap(p.z, self.bounds.min.z, len.z),
        )
    }
}

/// Hard clamp to a box. Any axis may be degenerate (`min == max`), which
/// turns the slot into a plane, a line or a point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Slot {
    pub bounds: Aabb,
}

impl Slot {
    pub(crate) fn validate(&self, owner: &str) -> Result<(), ConfigError> {
        if !self.bounds.is_valid() {
            return Err(ConfigError::invalid(owner, format!("slot bounds {:?}", self.bounds)));
        }
        Ok(())
    }

    /// Clamped position, with velocity zeroed on every clamped axis.
    pub fn resolve(&self, p: Vec3, mut v: Vec3) -> (Vec3, Vec3) {
        let clamped = p.clamp(self.bounds.min, self.bounds.max);
        for axis in 0..3 {
            if clamped[axis] != p[axis] {
                v[axis] = 0.0;
            }
        }
        (clamped, v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::HitResponse;

    fn hit(response: HitResponse) -> HitParams {
        HitParams {
            response,
            restitution: 1.0,
            drag: 1.0,
        }
    }

    #[test]
    fn test_volume_clamps_to_margin() {
        let vol = Volume::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let (p, v) = vol.resolve(
            Vec3::new(0.0, 0.0, -3.0),
            Vec3::new(0.0, 0.0, -2.0),
            Vec3::ZERO,
            &hit(HitResponse::VelocityReversal),
        );
        assert!((p.z - -0.9).abs() < 1e-6, "p = {p:?}");
        assert_eq!(v.z, 2.0);
    }

    #[test]
    fn test_volume_inside_is_untouched() {
        let vol = Volume::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let p = Vec3::new(0.2, -0.3, 0.5);
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(vol.resolve(p, v, Vec3::ZERO, &hit(HitResponse::Stop)), (p, v));
    }

    #[test]
    fn test_ball_projects_to_surface() {
        let ball = Ball {
            bounds: Aabb::new(Vec3::new(-2.0, -1.0, -1.0), Vec3::new(2.0, 1.0, 1.0)),
        };
        let (p, v) = ball.resolve(
            Vec3::new(4.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::ZERO,
            &hit(HitResponse::VelocityReversal),
        );
        assert!((p - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-5, "p = {p:?}");
        assert!(v.x < 0.0, "v = {v:?}");
    }

    #[test]
    fn test_matrix_volume_matches_axis_volume_for_identity() {
        let mv = MatrixVolume::new(Affine3A::IDENTITY, Vec3::splat(-1.0), Vec3::splat(1.0));
        let hit = hit(HitResponse::Slide);
        let (p, v) = mv.resolve(
            &Affine3A::IDENTITY,
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::ZERO,
            &hit,
        );
        assert!((p.x - 0.9).abs() < 1e-6);
        assert!((v - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_wrap_reenters_opposite_face() {
        let w = Wrap {
            bounds: Aabb::new(Vec3::ZERO, Vec3::splat(10.0)),
        };
        let p = w.apply(Vec3::new(11.0, -1.0, 5.0));
        assert!((p - Vec3::new(1.0, 9.0, 5.0)).length() < 1e-5, "p = {p:?}");
    }

    #[test]
    fn test_slot_degenerate_axis() {
        let slot = Slot {
            bounds: Aabb::new(Vec3::new(0.0, 5.0, 3.0), Vec3::new(1.0, 5.0, 3.0)),
        };
        let (p, v) = slot.resolve(Vec3::new(0.5, 4.0, 3.0), Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(p, Vec3::new(0.5, 5.0, 3.0));
        assert_eq!(v, Vec3::new(1.0, 0.0, 0.0));
    }
}
