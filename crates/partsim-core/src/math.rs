use glam::Vec3;
use rand::Rng;

use crate::error::SampleError;

/// Shortest vector length treated as a usable direction.
pub const MIN_LENGTH: f32 = 1.0e-6;

/// Attempt cap for [`sample_unit_ball`]. Acceptance is pi/6 per draw, so a
/// sane generator virtually never needs more than a handful.
pub const MAX_BALL_ATTEMPTS: u32 = 64;

/// Uniform point strictly inside the unit ball, by rejection from the
/// `[-1,1]^3` cube.
pub fn sample_unit_ball<R: Rng + ?Sized>(rng: &mut R) -> Result<Vec3, SampleError> {
    for _ in 0..MAX_BALL_ATTEMPTS {
        let p = Vec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        if p.length_squared() < 1.0 {
            return Ok(p);
        }
    }
    Err(SampleError {
        attempts: MAX_BALL_ATTEMPTS,
    })
}

/// [`sample_unit_ball`], falling back to the origin (and a warning) when the
/// generator misbehaves.
pub fn sample_unit_ball_or_center<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    match sample_unit_ball(rng) {
        Ok(p) => p,
        Err(err) => {
            tracing::warn!(%err, "unit-ball sampler exhausted; using region center");
            Vec3::ZERO
        }
    }
}

/// Closed interval for uniform scalar draws.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScalarRange {
    pub min: f32,
    pub max: f32,
}

impl ScalarRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub const fn constant(v: f32) -> Self {
        Self { min: v, max: v }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.max > self.min {
            rng.gen_range(self.min..=self.max)
        } else {
            self.min
        }
    }

    pub fn contains(&self, v: f32) -> bool {
        v >= self.min && v <= self.max
    }
}

/// Axis-aligned box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Box shrunk by `margin` on every face.
    pub fn inset(&self, margin: f32) -> Self {
        Self {
            min: self.min + Vec3::splat(margin),
            max: self.max - Vec3::splat(margin),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min.cmple(self.max).all()
    }
}

/// Periodic wrap of `v` into `[min, min + len)`.
#[inline]
pub fn wrap(v: f32, min: f32, len: f32) -> f32 {
    let r = (v - min).rem_euclid(len);
    // rem_euclid rounds up to `len` for tiny negative offsets.
    if r >= len {
        min
    } else {
        r + min
    }
}

/// Vector with its z component removed.
#[inline]
pub fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.y, 0.0)
}
