//! Several independent particle systems driven by one external tick.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::system::ParticleSystem;

/// What [`World::advance`] does with a system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunMode {
    Run,
    /// Skip the system entirely; its buffers are left untouched.
    Pause,
    /// Advance one tick, then pause.
    StepOnce,
    /// Restore the initial state, then run.
    Reset,
}

#[derive(Debug)]
struct Entry {
    name: String,
    mode: RunMode,
    system: ParticleSystem,
}

impl Entry {
    fn advance(&mut self, dt_ms: f32) {
        match self.mode {
            RunMode::Run => self.system.step(dt_ms),
            RunMode::Pause => {}
            RunMode::StepOnce => {
                self.system.step(dt_ms);
                self.mode = RunMode::Pause;
            }
            RunMode::Reset => {
                self.system.reset();
                self.mode = RunMode::Run;
            }
        }
    }
}

/// Named particle systems that share no state.
///
/// With the `parallel` feature the systems of one [`World::advance`] call
/// are stepped concurrently.
#[derive(Debug, Default)]
pub struct World {
    entries: Vec<Entry>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a running system. A system already registered under `name` is
    /// replaced.
    pub fn insert(&mut self, name: impl Into<String>, system: ParticleSystem) {
        let name = name.into();
        tracing::info!(name = %name, particles = system.particle_count(), "system added to world");
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => {
                entry.system = system;
                entry.mode = RunMode::Run;
            }
            None => self.entries.push(Entry {
                name,
                mode: RunMode::Run,
                system,
            }),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<ParticleSystem> {
        let pos = self.entries.iter().position(|e| e.name == name)?;
        Some(self.entries.remove(pos).system)
    }

    pub fn get(&self, name: &str) -> Option<&ParticleSystem> {
        self.entries.iter().find(|e| e.name == name).map(|e| &e.system)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ParticleSystem> {
        self.entries
            .iter_mut()
            .find(|e| e.name == name)
            .map(|e| &mut e.system)
    }

    pub fn mode(&self, name: &str) -> Option<RunMode> {
        self.entries.iter().find(|e| e.name == name).map(|e| e.mode)
    }

    /// Returns `false` if no system is called `name`.
    pub fn set_mode(&mut self, name: &str, mode: RunMode) -> bool {
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => {
                entry.mode = mode;
                true
            }
            None => false,
        }
    }

    /// Apply `mode` to every system.
    pub fn set_mode_all(&mut self, mode: RunMode) {
        for entry in &mut self.entries {
            entry.mode = mode;
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One external tick for every system, according to its mode.
    pub fn advance(&mut self, dt_ms: f32) {
        #[cfg(feature = "parallel")]
        {
            self.entries.par_iter_mut().for_each(|e| e.advance(dt_ms));
        }

        #[cfg(not(feature = "parallel"))]
        {
            for entry in &mut self.entries {
                entry.advance(dt_ms);
            }
        }
    }
}
