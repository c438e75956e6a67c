//! Spike train related module.
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

use crate::core::clock::SimulationClock;
use crate::core::TAIL_FRACTION;
use crate::error::SynapseError;

/// A binary spike train, with one value (0 or 1) per step of the simulation clock.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SpikeTrace {
    spikes: Vec<u8>,
}

impl SpikeTrace {
    /// Create a spike trace from raw values.
    /// Returns an error if any value is neither 0 nor 1.
    pub fn new_from(spikes: Vec<u8>) -> Result<Self, SynapseError> {
        if let Some(i) = spikes.iter().position(|s| *s > 1) {
            return Err(SynapseError::InvalidParameter(format!(
                "Invalid spike value {} at step {}: must be 0 or 1",
                spikes[i], i
            )));
        }
        Ok(SpikeTrace { spikes })
    }

    /// Samples a spike trace from a Poisson process with the given rate.
    ///
    /// Each step spikes independently with probability `1 - exp(-rate * dt)`.
    /// If `suppress_tail` is set, the last `floor(0.1 * n_steps)` steps are forced to be silent.
    ///
    /// # Examples
    ///
    /// ```
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    /// use rusty_synapse::core::clock::SimulationClock;
    /// use rusty_synapse::core::spike::SpikeTrace;
    ///
    /// let clock = SimulationClock::build(1.0, 0.001).unwrap();
    /// let mut rng = ChaCha8Rng::seed_from_u64(42);
    /// let spike = SpikeTrace::rand(30.0, &clock, true, &mut rng).unwrap();
    ///
    /// assert_eq!(spike.len(), 1000);
    /// assert!(spike.values()[900..].iter().all(|s| *s == 0));
    /// ```
    pub fn rand<R: Rng + ?Sized>(
        rate: f64,
        clock: &SimulationClock,
        suppress_tail: bool,
        rng: &mut R,
    ) -> Result<Self, SynapseError> {
        if !rate.is_finite() || rate < 0.0 {
            return Err(SynapseError::InvalidParameter(
                "Invalid firing rate value: must be non-negative".to_string(),
            ));
        }

        let p = 1.0 - (-rate * clock.dt()).exp();
        let uniform = Uniform::new(0.0, 1.0);

        let mut spikes: Vec<u8> = (0..clock.n_steps())
            .map(|_| u8::from(uniform.sample(rng) < p))
            .collect();

        if suppress_tail {
            let len = spikes.len();
            let num_quiet = (TAIL_FRACTION * len as f64).floor() as usize;
            spikes[len - num_quiet..].iter_mut().for_each(|s| *s = 0);
        }

        Ok(SpikeTrace { spikes })
    }

    pub fn values(&self) -> &[u8] {
        &self.spikes[..]
    }

    pub fn len(&self) -> usize {
        self.spikes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spikes.is_empty()
    }

    /// Returns the spike at step `i` as a real value (0 or 1).
    pub fn get(&self, i: usize) -> Option<f64> {
        self.spikes.get(i).map(|s| *s as f64)
    }

    /// Returns the number of spikes.
    pub fn count(&self) -> usize {
        self.spikes.iter().filter(|s| **s == 1).count()
    }

    /// Returns the fraction of steps carrying a spike.
    pub fn mean(&self) -> f64 {
        if self.spikes.is_empty() {
            return 0.0;
        }
        self.count() as f64 / self.spikes.len() as f64
    }

    /// Returns the empirical firing rate, i.e., the number of spikes per unit of time.
    pub fn rate(&self, dt: f64) -> f64 {
        self.mean() / dt
    }

    /// Returns an error if the trace does not have one value per step of the clock.
    pub fn check_len(&self, clock: &SimulationClock) -> Result<(), SynapseError> {
        if self.len() != clock.n_steps() {
            return Err(SynapseError::IncompatibleTraces(format!(
                "spike trace has {} values but the clock has {} steps",
                self.len(),
                clock.n_steps()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const SEED: u64 = 42;

    #[test]
    fn test_new_from() {
        let spike = SpikeTrace::new_from(vec![0, 1, 1, 0]).unwrap();
        assert_eq!(spike.count(), 2);
        assert_eq!(spike.mean(), 0.5);
        assert_eq!(spike.get(1), Some(1.0));
        assert_eq!(spike.get(4), None);

        assert_eq!(
            SpikeTrace::new_from(vec![0, 2]),
            Err(SynapseError::InvalidParameter(
                "Invalid spike value 2 at step 1: must be 0 or 1".to_string()
            ))
        );
    }

    #[test]
    fn test_rand_binary_and_length() {
        let clock = SimulationClock::build(2.0, 0.001).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(SEED);
        let spike = SpikeTrace::rand(50.0, &clock, false, &mut rng).unwrap();
        assert_eq!(spike.len(), 2000);
        assert!(spike.values().iter().all(|s| *s == 0 || *s == 1));
        assert!(spike.count() > 0);
    }

    #[test]
    fn test_rand_suppress_tail() {
        let clock = SimulationClock::build(1.0, 0.001).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(SEED);
        let spike = SpikeTrace::rand(1e6, &clock, true, &mut rng).unwrap();
        assert!(spike.values()[..900].iter().all(|s| *s == 1));
        assert!(spike.values()[900..].iter().all(|s| *s == 0));

        // floor(0.1 * 15) = 1 quiet step
        let clock = SimulationClock::build(1.5, 0.1).unwrap();
        let spike = SpikeTrace::rand(1e6, &clock, true, &mut rng).unwrap();
        assert_eq!(spike.len(), 15);
        assert_eq!(spike.count(), 14);
        assert_eq!(spike.values()[14], 0);
    }

    #[test]
    fn test_rand_zero_rate() {
        let clock = SimulationClock::build(1.0, 0.001).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(SEED);
        let spike = SpikeTrace::rand(0.0, &clock, false, &mut rng).unwrap();
        assert_eq!(spike.count(), 0);
    }

    #[test]
    fn test_rand_reproducible() {
        let clock = SimulationClock::build(1.0, 0.001).unwrap();
        let spike_1 =
            SpikeTrace::rand(30.0, &clock, false, &mut ChaCha8Rng::seed_from_u64(SEED)).unwrap();
        let spike_2 =
            SpikeTrace::rand(30.0, &clock, false, &mut ChaCha8Rng::seed_from_u64(SEED)).unwrap();
        let spike_3 =
            SpikeTrace::rand(30.0, &clock, false, &mut ChaCha8Rng::seed_from_u64(SEED + 1))
                .unwrap();
        assert_eq!(spike_1, spike_2);
        assert_ne!(spike_1, spike_3);
    }

    #[test]
    fn test_rand_invalid_rate() {
        let clock = SimulationClock::build(1.0, 0.001).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(SEED);
        assert_eq!(
            SpikeTrace::rand(-1.0, &clock, false, &mut rng),
            Err(SynapseError::InvalidParameter(
                "Invalid firing rate value: must be non-negative".to_string()
            ))
        );
        assert!(SpikeTrace::rand(f64::INFINITY, &clock, false, &mut rng).is_err());
    }
}
