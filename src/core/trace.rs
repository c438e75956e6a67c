//! Real-valued time traces sampled on a simulation clock.
use itertools::{Itertools, MinMaxResult};
use serde::{Deserialize, Serialize};

use crate::core::clock::SimulationClock;
use crate::error::SynapseError;

/// A real-valued trace, index-aligned with the other traces of a trial.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Trace {
    values: Vec<f64>,
}

impl Trace {
    /// Create a zero-filled trace with one value per step of the clock.
    pub fn zeros(clock: &SimulationClock) -> Self {
        Trace {
            values: vec![0.0; clock.n_steps()],
        }
    }

    /// Create a trace from raw values.
    pub fn new_from(values: Vec<f64>) -> Self {
        Trace { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values[..]
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the value at step `i`, if any.
    pub fn get(&self, i: usize) -> Option<f64> {
        self.values.get(i).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> + '_ {
        self.values.iter()
    }

    /// Returns the time average of the trace, or 0 for an empty trace.
    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    /// Returns the smallest and largest values of the trace.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match self
            .values
            .iter()
            .minmax_by(|a, b| a.total_cmp(b))
        {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(x) => Some((*x, *x)),
            MinMaxResult::MinMax(min, max) => Some((*min, *max)),
        }
    }

    /// Returns the number of values outside of the closed interval `[lo, hi]`.
    pub fn count_outside(&self, lo: f64, hi: f64) -> usize {
        self.values.iter().filter(|x| **x < lo || **x > hi).count()
    }

    /// Returns an error if the trace does not have one value per step of the clock.
    pub fn check_len(&self, name: &str, clock: &SimulationClock) -> Result<(), SynapseError> {
        if self.len() != clock.n_steps() {
            return Err(SynapseError::IncompatibleTraces(format!(
                "{} trace has {} values but the clock has {} steps",
                name,
                self.len(),
                clock.n_steps()
            )));
        }
        Ok(())
    }

    pub(crate) fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values[..]
    }
}
