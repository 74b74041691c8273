use thiserror::Error;

/// A problem with one force or constraint descriptor.
///
/// These never abort construction: the descriptor is disabled, the error is
/// logged and kept in [`crate::system::ParticleSystem::diagnostics`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{owner}: targets particles {first}..{end} but the system holds {count}")]
    RangeOutOfBounds {
        owner: String,
        first: usize,
        end: usize,
        count: usize,
    },
    #[error("{owner}: endpoint {index} is outside the {count} particles")]
    EndpointOutOfBounds {
        owner: String,
        index: usize,
        count: usize,
    },
    #[error("{owner}: both endpoints are particle {index}")]
    DegeneratePair { owner: String, index: usize },
    #[error("{owner}: {kind} is not supported by the kernel; descriptor ignored")]
    Unsupported { owner: String, kind: &'static str },
    #[error("{owner}: {reason}")]
    InvalidParameter { owner: String, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(owner: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            owner: owner.to_owned(),
            reason: reason.into(),
        }
    }
}

/// Fatal construction errors returned by [`crate::system::SystemBuilder::build`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("a particle system needs at least one particle")]
    Empty,
    #[error("particle {index} has mass {mass}; mass must be finite and > 0")]
    InvalidMass { index: usize, mass: f32 },
    #[error("{count} initial particle states supplied for {expected} particles")]
    InitCountMismatch { count: usize, expected: usize },
    #[error("lifecycle: {0}")]
    InvalidLifecycle(String),
}

/// The rejection sampler gave up before finding a point inside the ball.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no sample accepted after {attempts} attempts")]
pub struct SampleError {
    pub attempts: u32,
}
