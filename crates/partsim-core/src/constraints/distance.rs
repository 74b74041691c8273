use std::ops::Range;

use glam::Vec3;

use crate::math::MIN_LENGTH;
use crate::particle::StateBuffer;
use crate::targeting::Target;

/// Pin the targeted particles to `location`, or hold them where they were at
/// the start of the tick. Velocity is zeroed either way.
pub(crate) fn enforce_anchor(
    prev: &StateBuffer,
    next: &mut StateBuffer,
    target: Target,
    location: Option<Vec3>,
) {
    for i in target.indices(next.count()) {
        let p = location.unwrap_or_else(|| prev.position(i));
        next.set_position(i, p);
        next.set_velocity(i, Vec3::ZERO);
    }
}

/// Mass-weighted projection of the pair `e1`, `e2` back to `length`.
///
/// With `slack` set the pair behaves like a rope: nothing happens until the
/// separation exceeds `length`, and only the separating velocity is removed.
/// A rod also removes approaching velocity along its axis.
pub(crate) fn enforce_rod(state: &mut StateBuffer, e1: usize, e2: usize, length: f32, slack: bool) {
    let p1 = state.position(e1);
    let p2 = state.position(e2);
    let d = p2 - p1;
    let dist = d.length();
    if dist < MIN_LENGTH || (slack && dist <= length) {
        return;
    }

    let w1 = 1.0 / state.mass(e1);
    let w2 = 1.0 / state.mass(e2);
    let w_sum = w1 + w2;
    let n = d / dist;

    let correction = n * ((dist - length) / w_sum);
    let p1 = p1 + correction * w1;
    let p2 = p2 - correction * w2;

    let v1 = state.velocity(e1);
    let v2 = state.velocity(e2);
    let separating = (v2 - v1).dot(n);
    let (v1, v2) = if slack && separating <= 0.0 {
        (v1, v2)
    } else {
        let impulse = n * (separating / w_sum);
        (v1 + impulse * w1, v2 - impulse * w2)
    };

    state.set_position(e1, p1);
    state.set_position(e2, p2);
    state.set_velocity(e1, v1);
    state.set_velocity(e2, v2);
}

/// Keep every pair in `range` at least `2 * radius` apart.
///
/// Brute force over all pairs. Overlapping pairs are split evenly along the
/// contact normal; if they are still approaching, their normal velocities
/// are exchanged through a mass-weighted impulse scaled by `restitution`.
pub(crate) fn enforce_hard_spheres(
    state: &mut StateBuffer,
    range: Range<usize>,
    radius: f32,
    restitution: f32,
) {
    let min_dist = 2.0 * radius;

    for i in range.clone() {
        for j in (i + 1)..range.end {
            let pi = state.position(i);
            let pj = state.position(j);
            let d = pj - pi;
            let dist = d.length();
            if dist >= min_dist || dist < MIN_LENGTH {
                continue;
            }
            let n = d / dist;
            let push = n * (0.5 * (min_dist - dist));

            let vi = state.velocity(i);
            let vj = state.velocity(j);
            let approach = (vj - vi).dot(n);
            let (vi, vj) = if approach < 0.0 {
                let wi = 1.0 / state.mass(i);
                let wj = 1.0 / state.mass(j);
                let jn = -(1.0 + restitution) * approach / (wi + wj);
                (vi - n * (jn * wi), vj + n * (jn * wj))
            } else {
                (vi, vj)
            };

            state.set_position(i, pi - push);
            state.set_position(j, pj + push);
            state.set_velocity(i, vi);
            state.set_velocity(j, vj);
        }
    }
}
