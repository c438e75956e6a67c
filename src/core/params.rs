//! Simulation parameters, i.e., the configuration record of a batch of trials.
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::core::clock::{SimulationClock, StabilityWarning};
use crate::core::vesicle::ClampPolicy;
use crate::error::SynapseError;

/// The parameters of a single synapse simulation.
/// Missing fields in a configuration file take their default value.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynapseParams {
    /// The presynaptic firing rate.
    pub rate: f64,
    /// The simulation duration.
    pub t_sim: f64,
    /// The time step.
    pub dt: f64,
    /// The calcium decay time constant.
    pub tau_c: f64,
    /// The calcium influx per spike.
    #[serde(rename = "R", alias = "r")]
    pub calcium_per_spike: f64,
    /// The fusion time constant.
    pub tau_f: f64,
    /// The vesicle pool size.
    pub v_0: f64,
    /// The latency between the calcium/spike state and the release.
    pub release_delay: f64,
    /// Whether the last 10% of each trial is forced to be silent.
    pub suppress_tail: bool,
    /// The number of independent trials.
    pub n_trials: usize,
    /// The base seed of the trials. A random seed is drawn (and logged) if absent.
    pub seed: Option<u64>,
    /// How fusion and release are kept within the pool.
    pub clamp_policy: ClampPolicy,
}

impl Default for SynapseParams {
    fn default() -> Self {
        SynapseParams {
            rate: 30.0,
            t_sim: 1.0,
            dt: 0.001,
            tau_c: 0.03,
            calcium_per_spike: 1.0,
            tau_f: 0.1,
            v_0: 30.0,
            release_delay: 0.03,
            suppress_tail: true,
            n_trials: 10,
            seed: Some(42),
            clamp_policy: ClampPolicy::Unclamped,
        }
    }
}

impl SynapseParams {
    /// Returns the simulation clock of the parameters.
    pub fn clock(&self) -> Result<SimulationClock, SynapseError> {
        SimulationClock::build(self.t_sim, self.dt)
    }

    /// Check every parameter against its domain.
    /// Returns the stability warnings of the time constants,
    /// or an error for the first invalid parameter.
    pub fn validate(&self) -> Result<Vec<StabilityWarning>, SynapseError> {
        let clock = self.clock()?;

        if !self.rate.is_finite() || self.rate < 0.0 {
            return Err(SynapseError::InvalidParameter(
                "Invalid firing rate value: must be non-negative".to_string(),
            ));
        }
        if !self.calcium_per_spike.is_finite() || self.calcium_per_spike < 0.0 {
            return Err(SynapseError::InvalidParameter(
                "Invalid calcium per spike: must be non-negative".to_string(),
            ));
        }
        if !self.v_0.is_finite() || self.v_0 <= 0.0 {
            return Err(SynapseError::InvalidParameter(
                "Invalid pool size: must be positive".to_string(),
            ));
        }
        if self.n_trials == 0 {
            return Err(SynapseError::InvalidParameter(
                "Invalid number of trials: must be positive".to_string(),
            ));
        }
        clock.delay_steps(self.release_delay)?;

        let warnings: Vec<StabilityWarning> = [("tau_c", self.tau_c), ("tau_f", self.tau_f)]
            .iter()
            .map(|(name, tau)| clock.check_stability(name, *tau))
            .collect::<Result<Vec<Option<StabilityWarning>>, SynapseError>>()?
            .into_iter()
            .flatten()
            .collect();

        for warning in warnings.iter() {
            log::warn!(
                "Time constant {} is close to the stability boundary: dt / {} = {:.3}",
                warning.parameter,
                warning.parameter,
                warning.ratio
            );
        }

        Ok(warnings)
    }

    /// Save the parameters to a file.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), SynapseError> {
        let file = File::create(path).map_err(|e| SynapseError::IOError(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| SynapseError::IOError(e.to_string()))?;
        writer.flush().map_err(|e| SynapseError::IOError(e.to_string()))
    }

    /// Load parameters from a file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, SynapseError> {
        let file = File::open(path).map_err(|e| SynapseError::IOError(e.to_string()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| SynapseError::IOError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn with(update: impl FnOnce(&mut SynapseParams)) -> SynapseParams {
        let mut params = SynapseParams::default();
        update(&mut params);
        params
    }

    #[test]
    fn test_validate_default() {
        let params = SynapseParams::default();
        assert_eq!(params.validate(), Ok(vec![]));
        assert_eq!(params.clock().unwrap().n_steps(), 1000);
    }

    #[test]
    fn test_validate_invalid() {
        let invalid = [
            with(|p| p.rate = -1.0),
            with(|p| p.t_sim = 0.0),
            with(|p| p.dt = -0.001),
            with(|p| p.tau_c = 0.0),
            with(|p| p.calcium_per_spike = -1.0),
            with(|p| p.tau_f = -0.1),
            with(|p| p.v_0 = 0.0),
            with(|p| p.release_delay = -0.01),
            with(|p| p.tau_c = 0.001),
            with(|p| p.tau_f = 0.0005),
            with(|p| p.n_trials = 0),
        ];
        for params in invalid.iter() {
            assert!(
                matches!(params.validate(), Err(SynapseError::InvalidParameter(_))),
                "{:?} should be rejected",
                params
            );
        }

        // A silent synapse is valid.
        let params = SynapseParams {
            rate: 0.0,
            ..SynapseParams::default()
        };
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_validate_warnings() {
        let params = SynapseParams {
            tau_c: 0.0015,
            ..SynapseParams::default()
        };
        let warnings = params.validate().unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].parameter, "tau_c");
        assert!((warnings[0].ratio - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_deserialize_partial() {
        let json = r#"{"rate": 17.0, "R": 2.5, "seed": null, "clamp_policy": "physical"}"#;
        let params: SynapseParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.rate, 17.0);
        assert_eq!(params.calcium_per_spike, 2.5);
        assert_eq!(params.seed, None);
        assert_eq!(params.clamp_policy, ClampPolicy::Physical);
        assert_eq!(params.tau_f, 0.1);

        let params: SynapseParams = serde_json::from_str(r#"{"r": 3.0}"#).unwrap();
        assert_eq!(params.calcium_per_spike, 3.0);
    }

    #[test]
    fn test_save_and_load() {
        let params = SynapseParams {
            rate: 17.0,
            tau_c: 0.4,
            v_0: 10.0,
            seed: None,
            ..SynapseParams::default()
        };
        let file = NamedTempFile::new().unwrap();
        params.save_to(file.path()).unwrap();

        let loaded = SynapseParams::load_from(file.path()).unwrap();
        assert_eq!(loaded, params);

        let content = std::fs::read_to_string(file.path()).unwrap();
        assert!(content.contains("\"R\""));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            SynapseParams::load_from(dir.path().join("missing.json")),
            Err(SynapseError::IOError(_))
        ));
    }
}
