//! Real-time particle dynamics kernel.
//!
//! A [`system::ParticleSystem`] advances a flat, fixed-stride
//! [`particle::StateBuffer`] once per external tick:
//!
//! 1. clear and refill force accumulators from the [`forces`] catalog,
//! 2. integrate into the back buffer ([`integrator`]),
//! 3. enforce the [`constraints`] catalog in order,
//! 4. run the [`lifecycle`] respawn policies,
//! 5. swap buffers.
//!
//! Rendering reads [`particle::StateBuffer::as_bytes`] using the offsets in
//! [`particle::field`].

pub mod config;
pub mod constraints;
pub mod error;
pub mod forces;
pub mod integrator;
pub mod lifecycle;
pub mod math;
pub mod particle;
pub mod scenes;
pub mod system;
pub mod targeting;
pub mod world;

pub use config::{SimConfig, Timestep};
pub use constraints::{Constraint, ConstraintKind, HitResponse};
pub use error::{ConfigError, SampleError, SimError};
pub use forces::{Force, ForceKind};
pub use integrator::Integrator;
pub use lifecycle::Lifecycle;
pub use particle::{ParticleInit, StateBuffer, STRIDE};
pub use scenes::Scene;
pub use system::{ParticleSystem, SystemBuilder};
pub use targeting::Target;
pub use world::{RunMode, World};
