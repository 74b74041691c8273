//! Particle selection shared by forces and constraints.

use std::ops::Range;

use crate::error::ConfigError;

/// Which particles a descriptor affects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    /// `first` and every particle after it.
    From(usize),
    /// Exactly `count` particles starting at `first`.
    Range { first: usize, count: usize },
    /// Only the two endpoints (springs, rods, planetary pairs).
    Pair(usize, usize),
}

impl Target {
    pub const ALL: Target = Target::From(0);

    /// Decode the signed `first/count/e1/e2` convention: a negative count
    /// selects everything from `first`, zero selects the endpoints, and a
    /// positive count selects that many particles.
    pub fn from_raw(first: usize, count: i64, e1: usize, e2: usize) -> Self {
        match count {
            c if c < 0 => Target::From(first),
            0 => Target::Pair(e1, e2),
            c => Target::Range {
                first,
                count: c as usize,
            },
        }
    }

    /// Check the selection against `particle_count`.
    pub fn validate(&self, owner: &str, particle_count: usize) -> Result<(), ConfigError> {
        match *self {
            Target::From(first) => {
                if first >= particle_count {
                    return Err(ConfigError::RangeOutOfBounds {
                        owner: owner.to_owned(),
                        first,
                        end: first,
                        count: particle_count,
                    });
                }
            }
            Target::Range { first, count } => {
                let end = first.saturating_add(count);
                if end > particle_count {
                    return Err(ConfigError::RangeOutOfBounds {
                        owner: owner.to_owned(),
                        first,
                        end,
                        count: particle_count,
                    });
                }
            }
            Target::Pair(e1, e2) => {
                for index in [e1, e2] {
                    if index >= particle_count {
                        return Err(ConfigError::EndpointOutOfBounds {
                            owner: owner.to_owned(),
                            index,
                            count: particle_count,
                        });
                    }
                }
                if e1 == e2 {
                    return Err(ConfigError::DegeneratePair {
                        owner: owner.to_owned(),
                        index: e1,
                    });
                }
            }
        }
        Ok(())
    }

    /// Contiguous index range for range-style targets, clamped to
    /// `particle_count`. Pair targets yield an empty range.
    pub fn range(&self, particle_count: usize) -> Range<usize> {
        match *self {
            Target::From(first) => first.min(particle_count)..particle_count,
            Target::Range { first, count } => {
                let start = first.min(particle_count);
                start..first.saturating_add(count).min(particle_count)
            }
            Target::Pair(..) => 0..0,
        }
    }

    /// The selection as at most two contiguous runs: the range itself, or
    /// one single-particle run per pair endpoint.
    pub fn spans(&self, particle_count: usize) -> [Range<usize>; 2] {
        match *self {
            Target::Pair(e1, e2) => {
                let one = |i: usize| i.min(particle_count)..(i + 1).min(particle_count);
                [one(e1), one(e2)]
            }
            _ => [self.range(particle_count), 0..0],
        }
    }

    /// Every selected index, in ascending order for ranges and `[e1, e2]` for
    /// pairs.
    pub fn indices(&self, particle_count: usize) -> TargetIter {
        match *self {
            Target::Pair(e1, e2) => TargetIter::Pair([e1, e2], 0),
            _ => TargetIter::Range(self.range(particle_count)),
        }
    }

    pub fn pair(&self) -> Option<(usize, usize)> {
        match *self {
            Target::Pair(e1, e2) => Some((e1, e2)),
            _ => None,
        }
    }
}

/// Iterator over the indices a [`Target`] selects.
pub enum TargetIter {
    Range(Range<usize>),
    Pair([usize; 2], usize),
}

impl Iterator for TargetIter {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        match self {
            TargetIter::Range(r) => r.next(),
            TargetIter::Pair(pair, pos) => {
                let item = pair.get(*pos).copied();
                *pos += 1;
                item
            }
        }
    }
}
