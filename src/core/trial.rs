//! A single trial of the synapse pipeline: spikes, calcium, then fusion and release.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::calcium::{self, CalciumTrace};
use crate::core::clock::{SimulationClock, StabilityWarning};
use crate::core::params::SynapseParams;
use crate::core::spike::SpikeTrace;
use crate::core::vesicle::{self, FusionTrace, ReleaseTrace};
use crate::error::SynapseError;

/// The summary statistics of a trial, i.e., the time averages of its traces.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct TrialStats {
    pub spike_count: usize,
    /// Spikes per unit of time.
    pub spike_rate: f64,
    pub mean_calcium: f64,
    pub mean_fusion: f64,
    pub mean_release: f64,
}

/// A trial, computed eagerly at construction and read-only afterwards.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Trial {
    params: SynapseParams,
    clock: SimulationClock,
    warnings: Vec<StabilityWarning>,
    spike: SpikeTrace,
    calcium: CalciumTrace,
    fusion: FusionTrace,
    release: ReleaseTrace,
}

impl Trial {
    /// Runs the whole pipeline with the given random number generator.
    /// Nothing is computed if a parameter is invalid.
    /// Stability warnings raised by the parameters are kept on the trial.
    ///
    /// # Examples
    ///
    /// ```
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    /// use rusty_synapse::core::params::SynapseParams;
    /// use rusty_synapse::core::trial::Trial;
    ///
    /// let params = SynapseParams::default();
    /// let trial = Trial::run(&params, &mut ChaCha8Rng::seed_from_u64(42)).unwrap();
    ///
    /// assert_eq!(trial.calcium().get(0), Some(0.0));
    /// assert_eq!(trial.release().len(), 1000);
    /// ```
    pub fn run<R: Rng + ?Sized>(params: &SynapseParams, rng: &mut R) -> Result<Self, SynapseError> {
        let warnings = params.validate()?;
        Self::run_validated(params, warnings, rng)
    }

    /// Runs the pipeline, assuming the parameters have already been validated.
    pub(crate) fn run_validated<R: Rng + ?Sized>(
        params: &SynapseParams,
        warnings: Vec<StabilityWarning>,
        rng: &mut R,
    ) -> Result<Self, SynapseError> {
        let clock = params.clock()?;

        let spike = SpikeTrace::rand(params.rate, &clock, params.suppress_tail, rng)?;
        let calcium = calcium::integrate(&spike, params.tau_c, params.calcium_per_spike, &clock)?;
        let (fusion, release) = vesicle::integrate(
            &calcium,
            &spike,
            params.tau_f,
            params.v_0,
            params.release_delay,
            params.clamp_policy,
            &clock,
        )?;

        let num_outside = release.count_outside(0.0, params.v_0);
        if num_outside > 0 {
            log::debug!(
                "Release left the pool range [0, {}] at {} steps",
                params.v_0,
                num_outside
            );
        }

        Ok(Trial {
            params: params.clone(),
            clock,
            warnings,
            spike,
            calcium,
            fusion,
            release,
        })
    }

    pub fn params(&self) -> &SynapseParams {
        &self.params
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    /// Returns the stability warnings of the parameters of the trial.
    pub fn warnings(&self) -> &[StabilityWarning] {
        &self.warnings[..]
    }

    pub fn spike(&self) -> &SpikeTrace {
        &self.spike
    }

    pub fn calcium(&self) -> &CalciumTrace {
        &self.calcium
    }

    pub fn fusion(&self) -> &FusionTrace {
        &self.fusion
    }

    pub fn release(&self) -> &ReleaseTrace {
        &self.release
    }

    /// Returns the summary statistics of the trial.
    pub fn stats(&self) -> TrialStats {
        TrialStats {
            spike_count: self.spike.count(),
            spike_rate: self.spike.rate(self.clock.dt()),
            mean_calcium: self.calcium.mean(),
            mean_fusion: self.fusion.mean(),
            mean_release: self.release.mean(),
        }
    }
}
