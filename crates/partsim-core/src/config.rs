use crate::constraints::HitResponse;
use crate::error::ConfigError;
use crate::integrator::Integrator;

/// How the tick length is chosen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Timestep {
    /// Use the elapsed time supplied by the driver (after clamping).
    Variable,
    /// Ignore the supplied time and always advance this many milliseconds.
    Fixed(f32),
}

#[derive(Clone, Debug)]
pub struct SimConfig {
    pub integrator: Integrator,
    /// Unit-free velocity scale per tick (OldGood and impulsive bounces).
    pub drag: f32,
    /// Gravitational acceleration in m/s^2 (OldGood only; force-based
    /// integrators take gravity from the force catalog).
    pub gravity: f32,
    /// Coefficient of restitution for constraints that do not pick their own.
    pub restitution: f32,
    /// Response used by constraints that do not pick their own.
    pub collision_response: HitResponse,
    pub timestep: Timestep,
    /// Elapsed times above this are treated as a stall (backgrounded tab).
    pub max_frame_ms: f32,
    /// Replacement for stalled or nonsensical elapsed times.
    pub fallback_frame_ms: f32,
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            integrator: Integrator::OldGood,
            drag: 0.985,
            gravity: 9.832,
            restitution: 1.0,
            collision_response: HitResponse::Impulsive,
            timestep: Timestep::Variable,
            max_frame_ms: 200.0,
            fallback_frame_ms: 1000.0 / 60.0,
            seed: 0x5EED,
        }
    }
}

impl SimConfig {
    /// Tick length in seconds for a driver-reported elapsed time in
    /// milliseconds. The only place milliseconds become seconds.
    pub fn frame_seconds(&self, elapsed_ms: f32) -> f32 {
        let ms = match self.timestep {
            Timestep::Fixed(ms) => ms,
            Timestep::Variable => {
                if !elapsed_ms.is_finite() || elapsed_ms <= 0.0 || elapsed_ms > self.max_frame_ms
                {
                    tracing::warn!(
                        elapsed_ms,
                        fallback_ms = self.fallback_frame_ms,
                        "abnormal frame time; using fallback step"
                    );
                    self.fallback_frame_ms
                } else {
                    elapsed_ms
                }
            }
        };
        ms * 0.001
    }

    /// Report unusable tunables and reset them to their defaults.
    pub fn sanitize(&mut self) -> Vec<ConfigError> {
        let defaults = SimConfig::default();
        let mut errors = Vec::new();

        let mut check = |name: &str, value: &mut f32, ok: bool, fallback: f32| {
            if !ok {
                errors.push(ConfigError::invalid(
                    "config",
                    format!("{name} = {value} is unusable; using {fallback}"),
                ));
                *value = fallback;
            }
        };

        let drag_ok = self.drag.is_finite() && self.drag >= 0.0;
        check("drag", &mut self.drag, drag_ok, defaults.drag);
        let gravity_ok = self.gravity.is_finite();
        check("gravity", &mut self.gravity, gravity_ok, defaults.gravity);
        let resti_ok = self.restitution.is_finite() && self.restitution >= 0.0;
        check("restitution", &mut self.restitution, resti_ok, defaults.restitution);
        let max_ok = self.max_frame_ms.is_finite() && self.max_frame_ms > 0.0;
        check("max_frame_ms", &mut self.max_frame_ms, max_ok, defaults.max_frame_ms);
        let fallback_ok = self.fallback_frame_ms.is_finite() && self.fallback_frame_ms > 0.0;
        check(
            "fallback_frame_ms",
            &mut self.fallback_frame_ms,
            fallback_ok,
            defaults.fallback_frame_ms,
        );
        if let Timestep::Fixed(ms) = self.timestep {
            if !(ms.is_finite() && ms > 0.0) {
                errors.push(ConfigError::invalid(
                    "config",
                    format!("fixed timestep {ms} ms is unusable; using variable timestep"),
                ));
                self.timestep = Timestep::Variable;
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_seconds_converts_once() {
        let config = SimConfig::default();
        assert!((config.frame_seconds(20.0) - 0.02).abs() < 1e-7);
    }

    #[test]
    fn test_stalled_frame_uses_fallback() {
        let config = SimConfig::default();
        let expected = config.fallback_frame_ms * 0.001;
        assert_eq!(config.frame_seconds(5000.0), expected);
        assert_eq!(config.frame_seconds(f32::NAN), expected);
        assert_eq!(config.frame_seconds(-3.0), expected);
    }

    #[test]
    fn test_fixed_timestep_ignores_elapsed() {
        let config = SimConfig {
            timestep: Timestep::Fixed(10.0),
            ..Default::default()
        };
        assert!((config.frame_seconds(33.0) - 0.01).abs() < 1e-7);
    }

    #[test]
    fn test_sanitize_restores_defaults() {
        let mut config = SimConfig {
            drag: -1.0,
            fallback_frame_ms: 0.0,
            ..Default::default()
        };
        let errors = config.sanitize();
        assert_eq!(errors.len(), 2);
        assert_eq!(config.drag, 0.985);
        assert!(config.fallback_frame_ms > 0.0);
    }
}
