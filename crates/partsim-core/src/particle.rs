use glam::{Vec3, Vec4};

/// Field offsets inside one particle record.
///
/// The layout is stable within a build: renderers upload the raw buffer and
/// address attributes with `offset * size_of::<f32>()` and a byte stride of
/// `STRIDE * size_of::<f32>()`.
pub mod field {
    pub const POSITION: usize = 0; // x, y, z, w
    pub const VELOCITY: usize = 4; // x, y, z
    pub const FORCE: usize = 7; // x, y, z (transient accumulator)
    pub const COLOR: usize = 10; // r, g, b, a
    pub const MASS: usize = 14;
    pub const DIAMETER: usize = 15;
    pub const RENDER_MODE: usize = 16;
    pub const AGE: usize = 17;
}

/// Scalars per particle record.
pub const STRIDE: usize = 18;

/// Initial values for one particle, consumed by the system builder.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleInit {
    pub position: Vec3,
    pub velocity: Vec3,
    pub color: Vec4,
    pub mass: f32,
    pub diameter: f32,
    pub render_mode: u8,
    pub age: f32,
}

impl Default for ParticleInit {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            color: Vec4::ONE,
            mass: 1.0,
            diameter: 4.0,
            render_mode: 0,
            age: 100.0,
        }
    }
}

/// Flat array of particle records: `count * STRIDE` scalars, zero-initialized.
///
/// Every accessor indexes with `index * STRIDE + offset`. Indices are
/// validated against `count` when descriptors are attached to a system, so
/// the accessors only pay the slice bounds check.
#[derive(Clone, Debug, PartialEq)]
pub struct StateBuffer {
    count: usize,
    data: Vec<f32>,
}

impl StateBuffer {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            data: vec![0.0; count * STRIDE],
        }
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Raw scalars, `STRIDE` per particle.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Raw bytes, ready for a vertex-buffer upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// One particle's full record.
    #[inline]
    pub fn record(&self, index: usize) -> &[f32] {
        let base = index * STRIDE;
        &self.data[base..base + STRIDE]
    }

    /// Overwrite every scalar with `other`'s. Both buffers must hold the same
    /// number of particles.
    pub fn copy_from(&mut self, other: &StateBuffer) {
        debug_assert_eq!(self.count, other.count);
        self.data.copy_from_slice(&other.data);
    }

    #[inline]
    fn vec3(&self, index: usize, offset: usize) -> Vec3 {
        let j = index * STRIDE + offset;
        Vec3::new(self.data[j], self.data[j + 1], self.data[j + 2])
    }

    #[inline]
    fn set_vec3(&mut self, index: usize, offset: usize, v: Vec3) {
        let j = index * STRIDE + offset;
        self.data[j] = v.x;
        self.data[j + 1] = v.y;
        self.data[j + 2] = v.z;
    }

    #[inline]
    pub fn position(&self, index: usize) -> Vec3 {
        self.vec3(index, field::POSITION)
    }

    /// Homogeneous position; `w` is conventionally 1.0.
    #[inline]
    pub fn position4(&self, index: usize) -> Vec4 {
        let j = index * STRIDE + field::POSITION;
        Vec4::new(
            self.data[j],
            self.data[j + 1],
            self.data[j + 2],
            self.data[j + 3],
        )
    }

    /// Set x, y, z and force `w` to 1.0.
    #[inline]
    pub fn set_position(&mut self, index: usize, p: Vec3) {
        self.set_vec3(index, field::POSITION, p);
        self.data[index * STRIDE + field::POSITION + 3] = 1.0;
    }

    #[inline]
    pub fn velocity(&self, index: usize) -> Vec3 {
        self.vec3(index, field::VELOCITY)
    }

    #[inline]
    pub fn set_velocity(&mut self, index: usize, v: Vec3) {
        self.set_vec3(index, field::VELOCITY, v);
    }

    #[inline]
    pub fn force(&self, index: usize) -> Vec3 {
        self.vec3(index, field::FORCE)
    }

    #[inline]
    pub fn set_force(&mut self, index: usize, f: Vec3) {
        self.set_vec3(index, field::FORCE, f);
    }

    #[inline]
    pub fn add_force(&mut self, index: usize, f: Vec3) {
        let j = index * STRIDE + field::FORCE;
        self.data[j] += f.x;
        self.data[j + 1] += f.y;
        self.data[j + 2] += f.z;
    }

    /// Zero the force accumulator of every particle.
    pub fn clear_forces(&mut self) {
        for record in self.data.chunks_exact_mut(STRIDE) {
            record[field::FORCE..field::FORCE + 3].fill(0.0);
        }
    }

    #[inline]
    pub fn color(&self, index: usize) -> Vec4 {
        let j = index * STRIDE + field::COLOR;
        Vec4::new(
            self.data[j],
            self.data[j + 1],
            self.data[j + 2],
            self.data[j + 3],
        )
    }

    #[inline]
    pub fn set_color(&mut self, index: usize, c: Vec4) {
        let j = index * STRIDE + field::COLOR;
        self.data[j..j + 4].copy_from_slice(&c.to_array());
    }

    #[inline]
    pub fn mass(&self, index: usize) -> f32 {
        self.data[index * STRIDE + field::MASS]
    }

    #[inline]
    pub fn set_mass(&mut self, index: usize, m: f32) {
        self.data[index * STRIDE + field::MASS] = m;
    }

    #[inline]
    pub fn diameter(&self, index: usize) -> f32 {
        self.data[index * STRIDE + field::DIAMETER]
    }

    #[inline]
    pub fn set_diameter(&mut self, index: usize, d: f32) {
        self.data[index * STRIDE + field::DIAMETER] = d;
    }

    #[inline]
    pub fn render_mode(&self, index: usize) -> u8 {
        self.data[index * STRIDE + field::RENDER_MODE] as u8
    }

    #[inline]
    pub fn set_render_mode(&mut self, index: usize, mode: u8) {
        self.data[index * STRIDE + field::RENDER_MODE] = mode as f32;
    }

    #[inline]
    pub fn age(&self, index: usize) -> f32 {
        self.data[index * STRIDE + field::AGE]
    }

    #[inline]
    pub fn set_age(&mut self, index: usize, age: f32) {
        self.data[index * STRIDE + field::AGE] = age;
    }

    /// A particle is alive while its age is positive.
    #[inline]
    pub fn is_alive(&self, index: usize) -> bool {
        self.age(index) > 0.0
    }

    /// Write every field of one particle from `init`.
    pub fn write(&mut self, index: usize, init: &ParticleInit) {
        self.set_position(index, init.position);
        self.set_velocity(index, init.velocity);
        self.set_force(index, Vec3::ZERO);
        self.set_color(index, init.color);
        self.set_mass(index, init.mass);
        self.set_diameter(index, init.diameter);
        self.set_render_mode(index, init.render_mode);
        self.set_age(index, init.age);
    }
}
