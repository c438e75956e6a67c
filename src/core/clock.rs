//! Discrete simulation clock shared by every trace of a trial.
use serde::{Deserialize, Serialize};

use crate::core::{MAX_STEPS, STABILITY_WARNING_RATIO};
use crate::error::SynapseError;

/// Relative tolerance used when flooring `t_sim / dt`.
const STEP_TOLERANCE: f64 = 1e-9;

/// A warning for a time constant close to the explicit Euler stability boundary.
/// The simulation still runs; the warning is surfaced to the caller.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct StabilityWarning {
    /// The name of the offending time constant.
    pub parameter: String,
    /// The ratio `dt / tau`.
    pub ratio: f64,
}

/// A fixed-timestep clock derived from the simulation duration and the time step.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct SimulationClock {
    t_sim: f64,
    dt: f64,
    n_steps: usize,
}

impl SimulationClock {
    /// Create a clock with `floor(t_sim / dt)` steps.
    ///
    /// The floor is taken with a relative tolerance of `1e-9`: a ratio within that tolerance
    /// of an integer counts as that integer, so `SimulationClock::build(0.3, 0.1)` has 3 steps
    /// even though `0.3 / 0.1 = 2.9999999999999996` in floating point.
    ///
    /// Returns an error if the duration or the time step is not positive, or if the clock has
    /// no step at all or more than [`MAX_STEPS`] steps.
    pub fn build(t_sim: f64, dt: f64) -> Result<Self, SynapseError> {
        if !t_sim.is_finite() || t_sim <= 0.0 {
            return Err(SynapseError::InvalidParameter(
                "Invalid simulation duration: must be positive".to_string(),
            ));
        }
        if !dt.is_finite() || dt <= 0.0 {
            return Err(SynapseError::InvalidParameter(
                "Invalid time step: must be positive".to_string(),
            ));
        }

        let ratio = t_sim / dt;
        if !ratio.is_finite() || ratio >= (MAX_STEPS + 1) as f64 {
            return Err(SynapseError::InvalidParameter(format!(
                "Invalid time step: {} / {} exceeds the maximum of {} steps",
                t_sim, dt, MAX_STEPS
            )));
        }

        // Ratios like 0.3 / 0.1 land just below an integer.
        let nearest = ratio.round();
        let n_steps = (if (ratio - nearest).abs() <= STEP_TOLERANCE * nearest {
            nearest
        } else {
            ratio.floor()
        }) as usize;

        if n_steps == 0 {
            return Err(SynapseError::InvalidParameter(format!(
                "Invalid time step: {} is larger than the simulation duration {}",
                dt, t_sim
            )));
        }

        Ok(SimulationClock { t_sim, dt, n_steps })
    }

    /// Returns the simulation duration.
    pub fn t_sim(&self) -> f64 {
        self.t_sim
    }

    /// Returns the time step.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Returns the number of steps, i.e., the length of every trace.
    pub fn n_steps(&self) -> usize {
        self.n_steps
    }

    /// Returns the simulated duration actually covered by the steps.
    pub fn duration(&self) -> f64 {
        self.n_steps as f64 * self.dt
    }

    /// Converts a non-negative delay into a number of steps, rounding to the nearest integer.
    pub fn delay_steps(&self, delay: f64) -> Result<usize, SynapseError> {
        if !delay.is_finite() || delay < 0.0 {
            return Err(SynapseError::InvalidParameter(
                "Invalid delay value: must be non-negative".to_string(),
            ));
        }
        Ok((delay / self.dt).round() as usize)
    }

    /// Returns the ratio `dt / tau` of a leaky integrator with time constant `tau`.
    /// Returns an error if `tau` is not positive or if the ratio reaches 1,
    /// where the decay term flips sign.
    pub fn decay_ratio(&self, name: &str, tau: f64) -> Result<f64, SynapseError> {
        if !tau.is_finite() || tau <= 0.0 {
            return Err(SynapseError::InvalidParameter(format!(
                "Invalid time constant {}: must be positive",
                name
            )));
        }
        let ratio = self.dt / tau;
        if ratio >= 1.0 {
            return Err(SynapseError::InvalidParameter(format!(
                "Unstable discretization: dt / {} = {} must be below 1",
                name, ratio
            )));
        }
        Ok(ratio)
    }

    /// Checks a time constant against the stability boundary.
    /// Returns a warning if the ratio `dt / tau` is at least [`STABILITY_WARNING_RATIO`].
    pub fn check_stability(
        &self,
        name: &str,
        tau: f64,
    ) -> Result<Option<StabilityWarning>, SynapseError> {
        let ratio = self.decay_ratio(name, tau)?;
        if ratio >= STABILITY_WARNING_RATIO {
            return Ok(Some(StabilityWarning {
                parameter: name.to_string(),
                ratio,
            }));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_build() {
        let clock = SimulationClock::build(1.0, 0.001).unwrap();
        assert_eq!(clock.n_steps(), 1000);

        let clock = SimulationClock::build(0.3, 0.1).unwrap();
        assert_eq!(clock.n_steps(), 3);

        let clock = SimulationClock::build(1.05, 0.1).unwrap();
        assert_eq!(clock.n_steps(), 10);
        assert!((clock.duration() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_clock_build_invalid() {
        assert_eq!(
            SimulationClock::build(0.0, 0.1),
            Err(SynapseError::InvalidParameter(
                "Invalid simulation duration: must be positive".to_string()
            ))
        );
        assert_eq!(
            SimulationClock::build(1.0, -0.1),
            Err(SynapseError::InvalidParameter(
                "Invalid time step: must be positive".to_string()
            ))
        );
        assert!(SimulationClock::build(1.0, f64::NAN).is_err());
        assert!(SimulationClock::build(0.05, 0.1).is_err());
    }

    #[test]
    fn test_clock_build_too_many_steps() {
        assert!(matches!(
            SimulationClock::build(1e300, 1e-300),
            Err(SynapseError::InvalidParameter(_))
        ));
        assert!(matches!(
            SimulationClock::build(1.0, 1.0 / (2.0 * MAX_STEPS as f64)),
            Err(SynapseError::InvalidParameter(_))
        ));

        let clock = SimulationClock::build(MAX_STEPS as f64, 1.0).unwrap();
        assert_eq!(clock.n_steps(), MAX_STEPS);
    }

    #[test]
    fn test_delay_steps() {
        let clock = SimulationClock::build(1.0, 0.001).unwrap();
        assert_eq!(clock.delay_steps(0.0), Ok(0));
        assert_eq!(clock.delay_steps(0.03), Ok(30));
        assert_eq!(clock.delay_steps(0.0304), Ok(30));
        assert_eq!(clock.delay_steps(0.0306), Ok(31));
        assert!(clock.delay_steps(-0.01).is_err());
    }

    #[test]
    fn test_decay_ratio_and_stability() {
        let clock = SimulationClock::build(1.0, 0.01).unwrap();
        assert!((clock.decay_ratio("tau_c", 0.1).unwrap() - 0.1).abs() < 1e-12);
        assert_eq!(clock.check_stability("tau_c", 0.1), Ok(None));

        let warning = clock.check_stability("tau_f", 0.015).unwrap().unwrap();
        assert_eq!(warning.parameter, "tau_f");
        assert!(warning.ratio >= STABILITY_WARNING_RATIO && warning.ratio < 1.0);

        assert!(clock.decay_ratio("tau_c", 0.01).is_err());
        assert!(clock.decay_ratio("tau_c", 0.005).is_err());
        assert!(clock.decay_ratio("tau_c", 0.0).is_err());
    }

    #[test]
    fn test_stability_boundary() {
        let clock = SimulationClock::build(1.0, 0.25).unwrap();

        // dt / tau == 0.5 is already close to the boundary.
        let warning = clock.check_stability("tau_c", 0.5).unwrap().unwrap();
        assert_eq!(warning.ratio, 0.5);
        assert_eq!(warning.parameter, "tau_c");

        assert_eq!(clock.check_stability("tau_c", 0.500001), Ok(None));
    }
}
