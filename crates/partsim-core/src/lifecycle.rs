//! Age- and boundary-driven particle recycling.
//!
//! Both policies run on the freshly constrained buffer and reuse one
//! primitive: a uniform unit-ball sample mapped into a spawn region.

use glam::{Vec3, Vec4};
use rand::Rng;

use crate::error::SimError;
use crate::math::{horizontal, sample_unit_ball_or_center, Aabb, ScalarRange};
use crate::particle::{ParticleInit, StateBuffer};

/// Launch speed scale of the classic fountain.
pub const INIT_VEL: f32 = 9.0;

/// Where respawned particles appear.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SpawnRegion {
    /// Ellipsoid `center + scale * u`, `u` in the unit ball.
    Ball { center: Vec3, scale: Vec3 },
    /// Cone opening upward from `apex`: height above the apex is
    /// `base_height + height_spread * u.z`, horizontal offset is
    /// `height * flare * (u.x, u.y)`.
    Funnel {
        apex: Vec3,
        base_height: f32,
        height_spread: f32,
        flare: f32,
    },
}

impl SpawnRegion {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        let u = sample_unit_ball_or_center(rng);
        match *self {
            SpawnRegion::Ball { center, scale } => center + scale * u,
            SpawnRegion::Funnel {
                apex,
                base_height,
                height_spread,
                flare,
            } => {
                let h = base_height + height_spread * u.z;
                apex + Vec3::new(h * flare * u.x, h * flare * u.y, h)
            }
        }
    }

    /// Whether `p` could have come from [`SpawnRegion::sample`] (with a small
    /// tolerance for rounding).
    pub fn contains(&self, p: Vec3) -> bool {
        const TOL: f32 = 1.0e-4;
        match *self {
            SpawnRegion::Ball { center, scale } => {
                ((p - center) / scale).length_squared() <= 1.0 + TOL
            }
            SpawnRegion::Funnel {
                apex,
                base_height,
                height_spread,
                flare,
            } => {
                let rel = p - apex;
                let h = rel.z;
                let lo = base_height - height_spread.abs();
                let hi = base_height + height_spread.abs();
                h >= lo - TOL
                    && h <= hi + TOL
                    && horizontal(rel).length() <= h.abs() * flare + TOL
            }
        }
    }

    fn validate(&self, owner: &str) -> Result<(), SimError> {
        let ok = match *self {
            SpawnRegion::Ball { center, scale } => {
                center.is_finite() && scale.is_finite() && scale.min_element() > 0.0
            }
            SpawnRegion::Funnel {
                apex,
                base_height,
                height_spread,
                flare,
            } => {
                apex.is_finite()
                    && base_height.is_finite()
                    && height_spread.is_finite()
                    && flare.is_finite()
                    && flare >= 0.0
            }
        };
        if ok {
            Ok(())
        } else {
            Err(SimError::InvalidLifecycle(format!("{owner}: spawn region {self:?}")))
        }
    }
}

/// `base + spread * u`, `u` in the unit ball.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VelocityDistribution {
    pub base: Vec3,
    pub spread: Vec3,
}

impl VelocityDistribution {
    pub const ZERO: Self = Self {
        base: Vec3::ZERO,
        spread: Vec3::ZERO,
    };

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        if self.spread == Vec3::ZERO {
            return self.base;
        }
        self.base + self.spread * sample_unit_ball_or_center(rng)
    }
}

/// Fresh-particle distributions shared by both policies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnParams {
    pub region: SpawnRegion,
    pub velocity: VelocityDistribution,
    pub mass: ScalarRange,
    pub diameter: ScalarRange,
    pub age: ScalarRange,
    pub render_mode: u8,
    /// `None` keeps the particle's current color.
    pub color: Option<Vec4>,
}

impl SpawnParams {
    /// A freshly drawn particle. `color` is used when the params carry none.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, color: Vec4) -> ParticleInit {
        ParticleInit {
            position: self.region.sample(rng),
            velocity: self.velocity.sample(rng),
            color: self.color.unwrap_or(color),
            mass: self.mass.sample(rng),
            diameter: self.diameter.sample(rng),
            render_mode: self.render_mode,
            age: self.age.sample(rng),
        }
    }

    fn validate(&self, owner: &str) -> Result<(), SimError> {
        self.region.validate(owner)?;
        let bad = |what: &str, r: ScalarRange| {
            SimError::InvalidLifecycle(format!("{owner}: {what} range {}..{}", r.min, r.max))
        };
        if !(self.mass.min > 0.0) || !(self.mass.max >= self.mass.min) || !self.mass.max.is_finite() {
            return Err(bad("mass", self.mass));
        }
        if !(self.age.min > 0.0) || !(self.age.max >= self.age.min) || !self.age.max.is_finite() {
            return Err(bad("age", self.age));
        }
        if !(self.diameter.min >= 0.0) || !(self.diameter.max >= self.diameter.min) {
            return Err(bad("diameter", self.diameter));
        }
        if !self.velocity.base.is_finite() || !self.velocity.spread.is_finite() {
            return Err(SimError::InvalidLifecycle(format!("{owner}: velocity distribution")));
        }
        Ok(())
    }
}

/// Age countdown with respawn at zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FountainSpawn {
    pub spawn: SpawnParams,
    /// Subtracted from age every tick.
    pub age_decrement: f32,
    /// Subtracted from diameter every tick; diameter stops at zero.
    pub diameter_shrink: f32,
}

impl Default for FountainSpawn {
    fn default() -> Self {
        Self {
            spawn: SpawnParams {
                region: SpawnRegion::Ball {
                    center: Vec3::ZERO,
                    scale: Vec3::ONE,
                },
                velocity: VelocityDistribution {
                    base: Vec3::new(0.0, 0.0, 0.4 * INIT_VEL),
                    spread: Vec3::splat(0.2 * INIT_VEL),
                },
                mass: ScalarRange::constant(1.0),
                diameter: ScalarRange::new(2.0, 3.0),
                age: ScalarRange::new(10.0, 15.0),
                render_mode: 0,
                color: None,
            },
            age_decrement: 1.0,
            diameter_shrink: 0.05,
        }
    }
}

/// Respawn of particles that leave the tornado's working volume.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TornadoSpawn {
    pub spawn: SpawnParams,
    pub bounds: Aabb,
    /// Particles closer than this to a face of `bounds` count as outside.
    pub margin: f32,
    /// Base of the tornado axis, for `max_radius`.
    pub axis: Vec3,
    /// Also respawn particles farther than this from the axis.
    pub max_radius: Option<f32>,
}

impl Default for TornadoSpawn {
    fn default() -> Self {
        Self {
            spawn: SpawnParams {
                region: SpawnRegion::Funnel {
                    apex: Vec3::ZERO,
                    base_height: 3.5,
                    height_spread: 1.5,
                    flare: 1.0,
                },
                velocity: VelocityDistribution::ZERO,
                mass: ScalarRange::constant(1.0),
                diameter: ScalarRange::new(2.0, 12.0),
                age: ScalarRange::new(50.0, 58.0),
                render_mode: 0,
                color: None,
            },
            bounds: Aabb::new(Vec3::new(-10.0, -10.0, 0.0), Vec3::new(10.0, 10.0, 15.0)),
            margin: 2.0,
            axis: Vec3::ZERO,
            max_radius: None,
        }
    }
}

impl TornadoSpawn {
    /// The box particles may live in.
    pub fn live_zone(&self) -> Aabb {
        self.bounds.inset(self.margin)
    }

    pub fn is_outside(&self, p: Vec3) -> bool {
        if !self.live_zone().contains(p) {
            return true;
        }
        match self.max_radius {
            Some(r) => horizontal(p - self.axis).length() > r,
            None => false,
        }
    }
}

/// Which recycling policies a system runs. Both may be active.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Lifecycle {
    pub fountain: Option<FountainSpawn>,
    pub tornado: Option<TornadoSpawn>,
}

impl Lifecycle {
    pub fn fountain(spawn: FountainSpawn) -> Self {
        Self {
            fountain: Some(spawn),
            tornado: None,
        }
    }

    pub fn tornado(spawn: TornadoSpawn) -> Self {
        Self {
            fountain: None,
            tornado: Some(spawn),
        }
    }

    pub fn is_active(&self) -> bool {
        self.fountain.is_some() || self.tornado.is_some()
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if let Some(f) = &self.fountain {
            f.spawn.validate("fountain")?;
            if !(f.age_decrement > 0.0) || !(f.diameter_shrink >= 0.0) {
                return Err(SimError::InvalidLifecycle(format!(
                    "fountain: age_decrement={} diameter_shrink={}",
                    f.age_decrement, f.diameter_shrink
                )));
            }
        }
        if let Some(t) = &self.tornado {
            t.spawn.validate("tornado")?;
            let zone = t.live_zone();
            if !t.bounds.is_valid() || !(t.margin >= 0.0) || !zone.is_valid() {
                return Err(SimError::InvalidLifecycle(format!(
                    "tornado: bounds {:?} with margin {}",
                    t.bounds, t.margin
                )));
            }
            if matches!(t.max_radius, Some(r) if !(r > 0.0)) {
                return Err(SimError::InvalidLifecycle("tornado: max_radius must be > 0".into()));
            }
        }
        Ok(())
    }

    /// Age, shrink and respawn particles of `state` in place. Returns how many
    /// particles were respawned.
    pub fn apply<R: Rng + ?Sized>(&self, state: &mut StateBuffer, rng: &mut R) -> usize {
        let mut respawned = 0;

        if let Some(f) = &self.fountain {
            for i in 0..state.count() {
                let age = state.age(i) - f.age_decrement;
                state.set_age(i, age);
                state.set_diameter(i, (state.diameter(i) - f.diameter_shrink).max(0.0));
                if age <= 0.0 {
                    let init = f.spawn.sample(rng, state.color(i));
                    state.write(i, &init);
                    respawned += 1;
                }
            }
        }

        if let Some(t) = &self.tornado {
            for i in 0..state.count() {
                if t.is_outside(state.position(i)) {
                    let init = t.spawn.sample(rng, state.color(i));
                    state.write(i, &init);
                    respawned += 1;
                }
            }
        }

        respawned
    }
}
