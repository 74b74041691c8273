//! Constraint catalog and the post-integration enforcement pass.
//!
//! Constraints run in catalog order on the freshly integrated buffer; each one
//! sees the positions left by the ones before it. Scenes rely on that order
//! (e.g. wrap before anchor), so it is part of a scene's configuration.

pub mod distance;
pub mod plane;
pub mod volume;

use glam::{Affine3A, Vec3};

use crate::config::SimConfig;
use crate::error::ConfigError;
use crate::math::Aabb;
use crate::particle::StateBuffer;
use crate::targeting::Target;

pub use plane::SlidePlane;
pub use volume::{Ball, MatrixVolume, Slot, Volume, Wrap};

/// What happens to a particle that hits a constraint surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitResponse {
    /// Put it on the surface and zero its velocity.
    Stop,
    /// Put it on the surface and remove the velocity along the normal.
    Slide,
    /// Reverse the normal velocity (scaled by restitution) if it still points
    /// out through the surface.
    VelocityReversal,
    /// Undo this tick's velocity change along the normal, apply drag, then
    /// reflect so the particle always leaves the surface. Lets bouncing
    /// particles come to rest on a floor.
    Impulsive,
}

/// Everything a surface response needs besides the particle itself.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitParams {
    pub response: HitResponse,
    pub restitution: f32,
    /// Velocity scale from [`SimConfig::drag`], used by `Impulsive`.
    pub drag: f32,
}

impl HitParams {
    /// New velocity for a particle touching a surface with outward normal `n`
    /// (pointing out of the allowed region). `v_prev` is the particle's
    /// velocity before this tick's integration.
    pub fn respond(&self, v: Vec3, v_prev: Vec3, n: Vec3) -> Vec3 {
        let vn = v.dot(n);
        match self.response {
            HitResponse::Stop => Vec3::ZERO,
            HitResponse::Slide => v - n * vn,
            HitResponse::VelocityReversal => {
                if vn > 0.0 {
                    v - n * vn * (1.0 + self.restitution)
                } else {
                    v
                }
            }
            HitResponse::Impulsive => {
                let restored = v_prev.dot(n) * self.drag;
                // Always leave the surface, whatever the sign of the restored
                // velocity.
                (v - n * vn) - n * (self.restitution * restored.abs())
            }
        }
    }
}

/// What a constraint enforces.
#[derive(Clone, Debug, PartialEq)]
pub enum ConstraintKind {
    /// Keep particles inside an axis-aligned box.
    Volume(Volume),
    /// Keep particles inside the ellipsoid inscribed in a box.
    Ball(Ball),
    /// Box in a rigidly transformed frame.
    MatrixVolume(MatrixVolume),
    /// Periodic box: leaving one face re-enters through the opposite one.
    Wrap(Wrap),
    /// Pin to `Some(location)`, or hold at the previous-tick position.
    Anchor(Option<Vec3>),
    /// Clamp to a (possibly degenerate) box.
    Slot(Slot),
    /// Keep a pair exactly `length` apart.
    Rod { length: f32 },
    /// Keep a pair at most `max_length` apart.
    Rope { max_length: f32 },
    /// No two particles of the range closer than `2 * radius`.
    HardSphere { radius: f32 },
    /// One-sided horizontal floor over a rectangle.
    Slide(SlidePlane),
}

impl ConstraintKind {
    pub fn name(&self) -> &'static str {
        match self {
            ConstraintKind::Volume(_) => "Volume",
            ConstraintKind::Ball(_) => "Ball",
            ConstraintKind::MatrixVolume(_) => "MatrixVolume",
            ConstraintKind::Wrap(_) => "Wrap",
            ConstraintKind::Anchor(_) => "Anchor",
            ConstraintKind::Slot(_) => "Slot",
            ConstraintKind::Rod { .. } => "Rod",
            ConstraintKind::Rope { .. } => "Rope",
            ConstraintKind::HardSphere { .. } => "HardSphere",
            ConstraintKind::Slide(_) => "Slide",
        }
    }
}

/// One entry of the constraint catalog.
#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    pub kind: ConstraintKind,
    pub target: Target,
    /// `None` uses [`SimConfig::collision_response`].
    pub response: Option<HitResponse>,
    /// `None` uses [`SimConfig::restitution`].
    pub restitution: Option<f32>,
    /// Presentation hint only.
    pub visible: bool,
    pub enabled: bool,
}

impl Constraint {
    pub fn new(kind: ConstraintKind, target: Target) -> Self {
        Self {
            kind,
            target,
            response: None,
            restitution: None,
            visible: true,
            enabled: true,
        }
    }

    pub fn volume(target: Target, min: Vec3, max: Vec3) -> Self {
        Self::new(ConstraintKind::Volume(Volume::new(min, max)), target)
    }

    pub fn ball(target: Target, min: Vec3, max: Vec3) -> Self {
        Self::new(ConstraintKind::Ball(Ball { bounds: Aabb::new(min, max) }), target)
    }

    pub fn matrix_volume(target: Target, pose: Affine3A, min: Vec3, max: Vec3) -> Self {
        Self::new(
            ConstraintKind::MatrixVolume(MatrixVolume::new(pose, min, max)),
            target,
        )
    }

    pub fn wrap(target: Target, min: Vec3, max: Vec3) -> Self {
        Self::new(ConstraintKind::Wrap(Wrap { bounds: Aabb::new(min, max) }), target)
    }

    pub fn anchor(target: Target, location: Option<Vec3>) -> Self {
        Self::new(ConstraintKind::Anchor(location), target)
    }

    pub fn slot(target: Target, min: Vec3, max: Vec3) -> Self {
        Self::new(ConstraintKind::Slot(Slot { bounds: Aabb::new(min, max) }), target)
    }

    pub fn rod(e1: usize, e2: usize, length: f32) -> Self {
        Self::new(ConstraintKind::Rod { length }, Target::Pair(e1, e2))
    }

    pub fn rope(e1: usize, e2: usize, max_length: f32) -> Self {
        Self::new(ConstraintKind::Rope { max_length }, Target::Pair(e1, e2))
    }

    pub fn hard_sphere(target: Target, radius: f32) -> Self {
        Self::new(ConstraintKind::HardSphere { radius }, target)
    }

    pub fn slide(target: Target, plane: SlidePlane) -> Self {
        Self::new(ConstraintKind::Slide(plane), target)
    }

    pub fn with_response(mut self, response: HitResponse) -> Self {
        self.response = Some(response);
        self
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = Some(restitution);
        self
    }

    /// Check the target and the kind's parameters against a system of
    /// `particle_count` particles.
    pub fn validate(&self, owner: &str, particle_count: usize) -> Result<(), ConfigError> {
        let pairwise = matches!(
            self.kind,
            ConstraintKind::Rod { .. } | ConstraintKind::Rope { .. }
        );
        if pairwise && self.target.pair().is_none() {
            return Err(ConfigError::invalid(owner, "pairwise constraint needs a Target::Pair"));
        }
        if matches!(self.kind, ConstraintKind::HardSphere { .. }) && self.target.pair().is_some() {
            return Err(ConfigError::invalid(owner, "hard spheres need a range target; use a rod"));
        }
        self.target.validate(owner, particle_count)?;

        if let Some(r) = self.restitution {
            if !(r >= 0.0 && r.is_finite()) {
                return Err(ConfigError::invalid(owner, format!("restitution {r}")));
            }
        }

        match &self.kind {
            ConstraintKind::Volume(v) => v.validate(owner),
            ConstraintKind::Ball(b) => b.validate(owner),
            ConstraintKind::MatrixVolume(m) => m.validate(owner),
            ConstraintKind::Wrap(w) => w.validate(owner),
            ConstraintKind::Slot(s) => s.validate(owner),
            ConstraintKind::Anchor(Some(loc)) if !loc.is_finite() => {
                Err(ConfigError::invalid(owner, "anchor location must be finite"))
            }
            ConstraintKind::Rod { length } if !(*length > 0.0) => {
                Err(ConfigError::invalid(owner, format!("rod length {length}")))
            }
            ConstraintKind::Rope { max_length } if !(*max_length > 0.0) => {
                Err(ConfigError::invalid(owner, format!("rope length {max_length}")))
            }
            ConstraintKind::HardSphere { radius } if !(*radius > 0.0) => {
                Err(ConfigError::invalid(owner, format!("hard-sphere radius {radius}")))
            }
            ConstraintKind::Slide(p) => p.validate(owner),
            _ => Ok(()),
        }
    }

    fn hit_params(&self, config: &SimConfig) -> HitParams {
        HitParams {
            response: self.response.unwrap_or(config.collision_response),
            restitution: self.restitution.unwrap_or(config.restitution),
            drag: config.drag,
        }
    }
}

/// Apply every enabled constraint to `next`, in catalog order.
///
/// `prev` is the state the tick started from; impulsive bounces and
/// hold-in-place anchors read it. Each particle's position and velocity are
/// written together, after its resolution is complete.
pub fn enforce_constraints(
    prev: &StateBuffer,
    next: &mut StateBuffer,
    constraints: &[Constraint],
    config: &SimConfig,
) {
    let count = next.count();

    for c in constraints.iter().filter(|c| c.enabled) {
        let hit = c.hit_params(config);
        match &c.kind {
            ConstraintKind::Volume(vol) => {
                for i in c.target.indices(count) {
                    let (p, v) = vol.resolve(next.position(i), next.velocity(i), prev.velocity(i), &hit);
                    next.set_position(i, p);
                    next.set_velocity(i, v);
                }
            }
            ConstraintKind::Ball(ball) => {
                for i in c.target.indices(count) {
                    let (p, v) = ball.resolve(next.position(i), next.velocity(i), prev.velocity(i), &hit);
                    next.set_position(i, p);
                    next.set_velocity(i, v);
                }
            }
            ConstraintKind::MatrixVolume(mv) => {
                let to_world = mv.pose.inverse();
                for i in c.target.indices(count) {
                    let (p, v) = mv.resolve(
                        &to_world,
                        next.position(i),
                        next.velocity(i),
                        prev.velocity(i),
                        &hit,
                    );
                    next.set_position(i, p);
                    next.set_velocity(i, v);
                }
            }
            ConstraintKind::Wrap(w) => {
                for i in c.target.indices(count) {
                    next.set_position(i, w.apply(next.position(i)));
                }
            }
            ConstraintKind::Slot(s) => {
                for i in c.target.indices(count) {
                    let (p, v) = s.resolve(next.position(i), next.velocity(i));
                    next.set_position(i, p);
                    next.set_velocity(i, v);
                }
            }
            ConstraintKind::Anchor(location) => {
                distance::enforce_anchor(prev, next, c.target, *location);
            }
            ConstraintKind::Rod { length } => {
                if let Some((e1, e2)) = c.target.pair() {
                    distance::enforce_rod(next, e1, e2, *length, false);
                }
            }
            ConstraintKind::Rope { max_length } => {
                if let Some((e1, e2)) = c.target.pair() {
                    distance::enforce_rod(next, e1, e2, *max_length, true);
                }
            }
            ConstraintKind::HardSphere { radius } => {
                distance::enforce_hard_spheres(next, c.target.range(count), *radius, hit.restitution);
            }
            ConstraintKind::Slide(plane) => {
                for i in c.target.indices(count) {
                    if let Some((p, v)) = plane.resolve(prev.position(i), next.position(i), next.velocity(i)) {
                        next.set_position(i, p);
                        next.set_velocity(i, v);
                    }
                }
            }
        }
    }
}

/// Particle pairs joined by rods and ropes, as `[a0, b0, a1, b1, ...]`.
pub fn link_line_indices(constraints: &[Constraint]) -> Vec<u32> {
    constraints
        .iter()
        .filter(|c| {
            c.enabled
                && c.visible
                && matches!(c.kind, ConstraintKind::Rod { .. } | ConstraintKind::Rope { .. })
        })
        .filter_map(|c| c.target.pair())
        .flat_map(|(a, b)| [a as u32, b as u32])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(response: HitResponse) -> HitParams {
        HitParams {
            response,
            restitution: 0.5,
            drag: 1.0,
        }
    }

    #[test]
    fn test_reversal_only_when_moving_outward() {
        let n = Vec3::NEG_Z;
        let hit = params(HitResponse::VelocityReversal);
        let v = hit.respond(Vec3::new(1.0, 0.0, -4.0), Vec3::ZERO, n);
        assert_eq!(v, Vec3::new(1.0, 0.0, 2.0));
        let v = hit.respond(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, n);
        assert_eq!(v, Vec3::new(0.0, 0.0, 3.0));
    }

    #[test]
    fn test_impulsive_always_leaves_surface() {
        let n = Vec3::NEG_Z;
        let hit = params(HitResponse::Impulsive);
        // Previous velocity already pointing inward (away from the floor).
        let v = hit.respond(Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 0.0, 2.0), n);
        assert!(v.z > 0.0, "v = {v:?}");
        // Previous velocity pointing into the floor.
        let v = hit.respond(Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 0.0, -2.0), n);
        assert!((v.z - 1.0).abs() < 1e-6, "v = {v:?}");
    }

    #[test]
    fn test_slide_keeps_tangential() {
        let hit = params(HitResponse::Slide);
        let v = hit.respond(Vec3::new(2.0, 1.0, -5.0), Vec3::ZERO, Vec3::NEG_Z);
        assert_eq!(v, Vec3::new(2.0, 1.0, 0.0));
    }

    #[test]
    fn test_rod_requires_pair() {
        let c = Constraint::new(ConstraintKind::Rod { length: 1.0 }, Target::ALL);
        assert!(c.validate("constraint[0]", 4).is_err());
        assert!(Constraint::rod(0, 3, 1.0).validate("constraint[0]", 4).is_ok());
    }
}
