//! Numerical schemes that advance a state buffer by one tick.

use crate::config::SimConfig;
use crate::forces::{apply_forces, Force};
use crate::particle::{field, StateBuffer, STRIDE};

/// Which scheme [`integrate`] uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Integrator {
    /// `next = current + dt * dot(current)`.
    Euler,
    /// Second order: derivative re-evaluated at the half step.
    Midpoint,
    /// Semi-implicit Euler over the full force catalog:
    /// `v' = v + dt * F / m`, `x' = x + dt * v'`.
    SymplecticEuler,
    /// Closed-form gravity and unit-free drag only, ignoring the force
    /// catalog: `v.z -= g * dt; v *= drag; x += v * dt`.
    OldGood,
}

impl Integrator {
    pub fn name(&self) -> &'static str {
        match self {
            Integrator::Euler => "Euler",
            Integrator::Midpoint => "Midpoint",
            Integrator::SymplecticEuler => "SymplecticEuler",
            Integrator::OldGood => "OldGood",
        }
    }
}

/// Work buffers for the multi-stage schemes, sized once per system.
#[derive(Clone, Debug)]
pub struct Scratch {
    pub(crate) dot: StateBuffer,
    pub(crate) mid: StateBuffer,
    pub(crate) mid_dot: StateBuffer,
}

impl Scratch {
    pub fn new(count: usize) -> Self {
        Self {
            dot: StateBuffer::new(count),
            mid: StateBuffer::new(count),
            mid_dot: StateBuffer::new(count),
        }
    }
}

/// Time derivative of `src` into `dest`: position' = velocity,
/// velocity' = force / mass, every other field' = 0.
///
/// `src`'s force accumulator must already be filled by [`apply_forces`].
pub fn derivative(dest: &mut StateBuffer, src: &StateBuffer) {
    debug_assert_eq!(dest.count(), src.count());
    let out = dest.as_mut_slice();
    out.fill(0.0);

    for (d, s) in out.chunks_exact_mut(STRIDE).zip(src.as_slice().chunks_exact(STRIDE)) {
        let inv_mass = 1.0 / s[field::MASS];
        d[field::POSITION..field::POSITION + 3]
            .copy_from_slice(&s[field::VELOCITY..field::VELOCITY + 3]);
        for k in 0..3 {
            d[field::VELOCITY + k] = s[field::FORCE + k] * inv_mass;
        }
    }
}

/// `dest = base + h * rate`, over every scalar.
fn add_scaled(dest: &mut StateBuffer, base: &StateBuffer, rate: &StateBuffer, h: f32) {
    for ((d, &b), &r) in dest
        .as_mut_slice()
        .iter_mut()
        .zip(base.as_slice())
        .zip(rate.as_slice())
    {
        *d = b + h * r;
    }
}

/// Advance `current` by `dt` seconds into `next`.
///
/// `current`'s force accumulator must hold this tick's forces. Midpoint
/// re-runs the force catalog on its half-step state.
pub fn integrate(
    integrator: Integrator,
    current: &StateBuffer,
    next: &mut StateBuffer,
    scratch: &mut Scratch,
    forces: &[Force],
    config: &SimConfig,
    dt: f32,
) {
    match integrator {
        Integrator::Euler => {
            derivative(&mut scratch.dot, current);
            add_scaled(next, current, &scratch.dot, dt);
        }
        Integrator::Midpoint => {
            derivative(&mut scratch.dot, current);
            add_scaled(&mut scratch.mid, current, &scratch.dot, 0.5 * dt);
            apply_forces(&mut scratch.mid, forces);
            derivative(&mut scratch.mid_dot, &scratch.mid);
            add_scaled(next, current, &scratch.mid_dot, dt);
        }
        Integrator::SymplecticEuler => {
            next.copy_from(current);
            for i in 0..next.count() {
                let v = current.velocity(i) + current.force(i) * (dt / current.mass(i));
                next.set_velocity(i, v);
                next.set_position(i, current.position(i) + v * dt);
            }
        }
        Integrator::OldGood => {
            next.copy_from(current);
            for i in 0..next.count() {
                let mut v = next.velocity(i);
                v.z -= config.gravity * dt;
                v *= config.drag;
                next.set_velocity(i, v);
                next.set_position(i, next.position(i) + v * dt);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::ParticleInit;
    use glam::Vec3;

    fn one_particle(velocity: Vec3, force: Vec3, mass: f32) -> StateBuffer {
        let mut s = StateBuffer::new(1);
        s.write(
            0,
            &ParticleInit {
                position: Vec3::new(1.0, 2.0, 3.0),
                velocity,
                mass,
                ..Default::default()
            },
        );
        s.set_force(0, force);
        s
    }

    #[test]
    fn test_derivative_fields() {
        let src = one_particle(Vec3::new(1.0, 0.0, -1.0), Vec3::new(0.0, 4.0, 0.0), 2.0);
        let mut dot = StateBuffer::new(1);
        derivative(&mut dot, &src);
        assert_eq!(dot.position4(0).truncate(), Vec3::new(1.0, 0.0, -1.0));
        assert_eq!(dot.position4(0).w, 0.0);
        assert_eq!(dot.velocity(0), Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(dot.mass(0), 0.0);
        assert_eq!(dot.age(0), 0.0);
    }

    #[test]
    fn test_euler_step() {
        let current = one_particle(Vec3::X, Vec3::new(0.0, 0.0, -2.0), 1.0);
        let mut next = StateBuffer::new(1);
        let mut scratch = Scratch::new(1);
        let config = SimConfig::default();
        integrate(Integrator::Euler, &current, &mut next, &mut scratch, &[], &config, 0.5);

        assert_eq!(next.position(0), Vec3::new(1.5, 2.0, 3.0));
        assert_eq!(next.velocity(0), Vec3::new(1.0, 0.0, -1.0));
        assert_eq!(next.mass(0), 1.0);
        assert_eq!(next.age(0), current.age(0));
    }

    #[test]
    fn test_symplectic_uses_new_velocity() {
        let current = one_particle(Vec3::ZERO, Vec3::new(0.0, 0.0, -2.0), 1.0);
        let mut next = StateBuffer::new(1);
        let mut scratch = Scratch::new(1);
        let config = SimConfig::default();
        integrate(Integrator::SymplecticEuler, &current, &mut next, &mut scratch, &[], &config, 0.5);
        assert_eq!(next.velocity(0).z, -1.0);
        assert_eq!(next.position(0).z, 2.5);
    }

    #[test]
    fn test_midpoint_constant_force_is_exact() {
        let forces = [Force::earth_gravity(crate::targeting::Target::ALL, 10.0)];
        let mut current = one_particle(Vec3::ZERO, Vec3::ZERO, 1.0);
        apply_forces(&mut current, &forces);
        let mut next = StateBuffer::new(1);
        let mut scratch = Scratch::new(1);
        let config = SimConfig::default();
        integrate(Integrator::Midpoint, &current, &mut next, &mut scratch, &forces, &config, 1.0);
        // x = x0 - g t^2 / 2
        assert!((next.position(0).z - (3.0 - 5.0)).abs() < 1e-5);
        assert!((next.velocity(0).z + 10.0).abs() < 1e-5);
    }
}
