use glam::Vec3;

use crate::error::ConfigError;
use crate::math::MIN_LENGTH;
use crate::particle::StateBuffer;
use crate::targeting::Target;

/// Damped Hookean spring parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spring {
    /// Spring constant (N/m).
    pub stiffness: f32,
    /// Damping along the spring axis (N·s/m).
    pub damping: f32,
    /// Length at which the spring exerts no force.
    pub rest_length: f32,
}

impl Spring {
    pub(crate) fn validate(&self, owner: &str) -> Result<(), ConfigError> {
        if !self.stiffness.is_finite() || !self.damping.is_finite() {
            return Err(ConfigError::invalid(
                owner,
                format!("spring stiffness={} damping={}", self.stiffness, self.damping),
            ));
        }
        if !(self.rest_length >= 0.0) {
            return Err(ConfigError::invalid(
                owner,
                format!("spring rest length {}", self.rest_length),
            ));
        }
        Ok(())
    }
}

impl Default for Spring {
    fn default() -> Self {
        Self {
            stiffness: 10.0,
            damping: 0.5,
            rest_length: 1.0,
        }
    }
}

/// Force on the first endpoint of a spring; the second receives the negation.
///
/// Damping uses only the relative velocity projected onto the spring axis, so
/// sideways motion of the pair is not damped. Returns `None` when the
/// endpoints coincide and the axis is undefined.
#[inline]
pub fn spring_force(
    p1: Vec3,
    p2: Vec3,
    v1: Vec3,
    v2: Vec3,
    stiffness: f32,
    damping: f32,
    rest_length: f32,
) -> Option<Vec3> {
    let d = p1 - p2;
    let len = d.length();
    if len < MIN_LENGTH {
        return None;
    }
    let dir = d / len;
    let stretch = rest_length - len;
    let closing = (v1 - v2).dot(dir);
    Some(dir * (stiffness * stretch - damping * closing))
}

pub(crate) fn apply_spring(state: &mut StateBuffer, e1: usize, e2: usize, s: &Spring) {
    let f = spring_force(
        state.position(e1),
        state.position(e2),
        state.velocity(e1),
        state.velocity(e2),
        s.stiffness,
        s.damping,
        s.rest_length,
    );
    if let Some(f) = f {
        state.add_force(e1, f);
        state.add_force(e2, -f);
    }
}

/// One spring of a [`SpringSet`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpringLink {
    pub a: usize,
    pub b: usize,
    pub rest_length: f32,
}

/// Many springs sharing stiffness and damping (cloth meshes).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpringSet {
    pub stiffness: f32,
    pub damping: f32,
    pub links: Vec<SpringLink>,
}

impl SpringSet {
    pub fn new(stiffness: f32, damping: f32) -> Self {
        Self {
            stiffness,
            damping,
            links: Vec::new(),
        }
    }

    /// Link `a` and `b` with the given rest length.
    pub fn link(&mut self, a: usize, b: usize, rest_length: f32) {
        self.links.push(SpringLink { a, b, rest_length });
    }

    /// Rectangular cloth grid of `cols x rows` particles starting at `first`,
    /// laid out row-major with `spacing` between neighbours. Adds structural
    /// springs along rows and columns plus shear springs on both diagonals.
    pub fn grid(stiffness: f32, damping: f32, first: usize, cols: usize, rows: usize, spacing: f32) -> Self {
        let mut set = Self::new(stiffness, damping);
        let idx = |c: usize, r: usize| first + r * cols + c;
        let diagonal = spacing * std::f32::consts::SQRT_2;

        for r in 0..rows {
            for c in 0..cols {
                if c + 1 < cols {
                    set.link(idx(c, r), idx(c + 1, r), spacing);
                }
                if r + 1 < rows {
                    set.link(idx(c, r), idx(c, r + 1), spacing);
                }
                if c + 1 < cols && r + 1 < rows {
                    set.link(idx(c, r), idx(c + 1, r + 1), diagonal);
                    set.link(idx(c + 1, r), idx(c, r + 1), diagonal);
                }
            }
        }
        set
    }

    pub(crate) fn validate(&self, owner: &str, particle_count: usize) -> Result<(), ConfigError> {
        Spring {
            stiffness: self.stiffness,
            damping: self.damping,
            rest_length: 0.0,
        }
        .validate(owner)?;

        for (k, link) in self.links.iter().enumerate() {
            let link_owner = format!("{owner} link {k}");
            Target::Pair(link.a, link.b).validate(&link_owner, particle_count)?;
            if !(link.rest_length >= 0.0) {
                return Err(ConfigError::invalid(
                    &link_owner,
                    format!("spring rest length {}", link.rest_length),
                ));
            }
        }
        Ok(())
    }
}

pub(crate) fn apply_spring_set(state: &mut StateBuffer, set: &SpringSet) {
    for link in &set.links {
        let f = spring_force(
            state.position(link.a),
            state.position(link.b),
            state.velocity(link.a),
            state.velocity(link.b),
            set.stiffness,
            set.damping,
            link.rest_length,
        );
        if let Some(f) = f {
            state.add_force(link.a, f);
            state.add_force(link.b, -f);
        }
    }
}
