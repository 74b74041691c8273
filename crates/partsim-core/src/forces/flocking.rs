use glam::Vec3;

use crate::error::ConfigError;
use crate::math::MIN_LENGTH;
use crate::particle::StateBuffer;

/// Neighbourhood radius and weight of one steering rule.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoidRule {
    pub radius: f32,
    pub weight: f32,
}

impl BoidRule {
    pub const fn new(radius: f32, weight: f32) -> Self {
        Self { radius, weight }
    }
}

/// Spherical obstacle the flock steers away from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Obstacle {
    pub position: Vec3,
    pub radius: f32,
    pub weight: f32,
}

/// Reynolds flocking over every particle the target selects.
///
/// Brute force: each particle looks at every other selected particle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Flocking {
    /// Steer toward the centroid of neighbours.
    pub cohesion: BoidRule,
    /// Steer away from the centroid of close neighbours.
    pub separation: BoidRule,
    /// Match the average velocity of neighbours. The weight divides.
    pub alignment: BoidRule,
    pub obstacle: Option<Obstacle>,
    /// Overall scale on the summed steering force.
    pub gain: f32,
}

impl Default for Flocking {
    fn default() -> Self {
        Self {
            cohesion: BoidRule::new(15.0, 0.5),
            separation: BoidRule::new(10.0, 0.2),
            alignment: BoidRule::new(15.0, 1.0),
            obstacle: Some(Obstacle {
                position: Vec3::ZERO,
                radius: 10.0,
                weight: 0.1,
            }),
            gain: 1.0,
        }
    }
}

impl Flocking {
    pub(crate) fn validate(&self, owner: &str) -> Result<(), ConfigError> {
        let rules = [
            ("cohesion", self.cohesion),
            ("separation", self.separation),
            ("alignment", self.alignment),
        ];
        for (name, rule) in rules {
            if !(rule.radius >= 0.0) || !rule.weight.is_finite() {
                return Err(ConfigError::invalid(
                    owner,
                    format!("{name} radius={} weight={}", rule.radius, rule.weight),
                ));
            }
        }
        if let Some(o) = &self.obstacle {
            if !(o.radius >= 0.0) || !o.weight.is_finite() || !o.position.is_finite() {
                return Err(ConfigError::invalid(owner, "obstacle parameters"));
            }
        }
        if !self.gain.is_finite() {
            return Err(ConfigError::invalid(owner, format!("gain {}", self.gain)));
        }
        Ok(())
    }

    /// Steering force on flock member `i` given every position and velocity
    /// of the flock.
    fn steer(&self, i: usize, positions: &[Vec3], velocities: &[Vec3]) -> Vec3 {
        let p = positions[i];
        let v = velocities[i];

        let mut coh_sum = Vec3::ZERO;
        let mut coh_n = 0u32;
        let mut sep_sum = Vec3::ZERO;
        let mut sep_n = 0u32;
        let mut vel_sum = Vec3::ZERO;
        let mut vel_n = 0u32;

        let coh_r2 = self.cohesion.radius * self.cohesion.radius;
        let sep_r2 = self.separation.radius * self.separation.radius;
        let vel_r2 = self.alignment.radius * self.alignment.radius;

        for (j, (&q, &u)) in positions.iter().zip(velocities).enumerate() {
            if j == i {
                continue;
            }
            let d2 = (q - p).length_squared();
            if d2 <= coh_r2 {
                coh_sum += q;
                coh_n += 1;
            }
            if d2 <= sep_r2 {
                sep_sum += q;
                sep_n += 1;
            }
            if d2 <= vel_r2 {
                vel_sum += u;
                vel_n += 1;
            }
        }

        let mut steer = Vec3::ZERO;
        if coh_n > 0 {
            steer += (coh_sum / coh_n as f32 - p) * self.cohesion.weight;
        }
        if sep_n > 0 {
            steer -= (sep_sum / sep_n as f32 - p) * self.separation.weight;
        }
        if vel_n > 0 && self.alignment.weight.abs() > f32::EPSILON {
            steer += (vel_sum / vel_n as f32 - v) / self.alignment.weight;
        }
        if let Some(o) = &self.obstacle {
            let off = p - o.position;
            let d = off.length();
            if d < o.radius && d > MIN_LENGTH {
                steer += off / d * (o.radius - d) * o.weight;
            }
        }
        steer * self.gain
    }
}

/// Steer every particle of `flock` against the rest of `flock`.
pub(crate) fn apply_flocking(state: &mut StateBuffer, flock: &[usize], f: &Flocking) {
    // Snapshot so every boid steers from the same instant.
    let positions: Vec<Vec3> = flock.iter().map(|&i| state.position(i)).collect();
    let velocities: Vec<Vec3> = flock.iter().map(|&i| state.velocity(i)).collect();

    for (k, &i) in flock.iter().enumerate() {
        let steer = f.steer(k, &positions, &velocities);
        state.add_force(i, steer);
    }
}
