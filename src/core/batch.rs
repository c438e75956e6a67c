//! Batches of independent trials and their aggregate statistics.
use rand::Rng;
use rand_chacha::{rand_core::SeedableRng, ChaCha8Rng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::core::clock::StabilityWarning;
use crate::core::params::SynapseParams;
use crate::core::trial::{Trial, TrialStats};
use crate::core::MIN_PARALLEL_TRIALS;
use crate::error::SynapseError;

/// Running mean and variance of a scalar (Welford).
#[derive(Debug, PartialEq, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RunningMoments {
    count: usize,
    mean: f64,
    m2: f64,
}

impl RunningMoments {
    pub fn push(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
    }

    /// Combines two partial moments (Chan et al.).
    pub fn merge(&self, other: &Self) -> Self {
        if self.count == 0 {
            return *other;
        }
        if other.count == 0 {
            return *self;
        }
        let count = self.count + other.count;
        let delta = other.mean - self.mean;
        let mean = self.mean + delta * other.count as f64 / count as f64;
        let m2 = self.m2
            + other.m2
            + delta * delta * (self.count as f64 * other.count as f64) / count as f64;
        RunningMoments { count, mean, m2 }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Returns the sample standard deviation, or 0 with fewer than two values.
    pub fn std(&self) -> f64 {
        if self.count < 2 {
            return 0.0;
        }
        (self.m2 / (self.count - 1) as f64).sqrt()
    }
}

/// Streaming aggregator of trial statistics.
#[derive(Debug, PartialEq, Clone, Copy, Default)]
pub struct TrialAccumulator {
    spike_rate: RunningMoments,
    spike_count: RunningMoments,
    calcium: RunningMoments,
    fusion: RunningMoments,
    release: RunningMoments,
}

impl TrialAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, stats: &TrialStats) {
        self.spike_rate.push(stats.spike_rate);
        self.spike_count.push(stats.spike_count as f64);
        self.calcium.push(stats.mean_calcium);
        self.fusion.push(stats.mean_fusion);
        self.release.push(stats.mean_release);
    }

    pub fn merge(&self, other: &Self) -> Self {
        TrialAccumulator {
            spike_rate: self.spike_rate.merge(&other.spike_rate),
            spike_count: self.spike_count.merge(&other.spike_count),
            calcium: self.calcium.merge(&other.calcium),
            fusion: self.fusion.merge(&other.fusion),
            release: self.release.merge(&other.release),
        }
    }

    pub fn num_trials(&self) -> usize {
        self.fusion.count()
    }

    pub fn summary(&self) -> TrialBatchSummary {
        TrialBatchSummary {
            num_trials: self.num_trials(),
            mean_spike_rate: self.spike_rate.mean(),
            mean_spike_count: self.spike_count.mean(),
            mean_calcium: self.calcium.mean(),
            mean_fusion: self.fusion.mean(),
            mean_release: self.release.mean(),
            std_spike_rate: self.spike_rate.std(),
            std_fusion: self.fusion.std(),
            std_release: self.release.std(),
        }
    }
}

impl<'a> FromIterator<&'a TrialStats> for TrialAccumulator {
    fn from_iter<I: IntoIterator<Item = &'a TrialStats>>(iter: I) -> Self {
        let mut accumulator = TrialAccumulator::new();
        iter.into_iter().for_each(|stats| accumulator.push(stats));
        accumulator
    }
}

/// The aggregate statistics of a batch of trials.
/// Means are taken over the per-trial time averages; standard deviations are across trials.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct TrialBatchSummary {
    pub num_trials: usize,
    pub mean_spike_rate: f64,
    pub mean_spike_count: f64,
    pub mean_calcium: f64,
    pub mean_fusion: f64,
    pub mean_release: f64,
    pub std_spike_rate: f64,
    pub std_fusion: f64,
    pub std_release: f64,
}

/// A batch of independent trials.
/// Only the last trial is kept in full; every trial contributes its statistics.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct TrialBatch {
    seed: u64,
    warnings: Vec<StabilityWarning>,
    stats: Vec<TrialStats>,
    summary: TrialBatchSummary,
    last_trial: Trial,
}

impl TrialBatch {
    /// Returns the base seed of the batch. Trial `k` is seeded with `seed + k`.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn warnings(&self) -> &[StabilityWarning] {
        &self.warnings[..]
    }

    /// Returns the statistics of every trial, in trial order.
    pub fn stats(&self) -> &[TrialStats] {
        &self.stats[..]
    }

    pub fn summary(&self) -> &TrialBatchSummary {
        &self.summary
    }

    pub fn last_trial(&self) -> &Trial {
        &self.last_trial
    }

    /// Save the summary and the last trial to a file, e.g., for plotting.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), SynapseError> {
        let file = File::create(path).map_err(|e| SynapseError::IOError(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| SynapseError::IOError(e.to_string()))?;
        writer.flush().map_err(|e| SynapseError::IOError(e.to_string()))
    }
}

/// Aggregates trial statistics in fixed-size chunks of [`MIN_PARALLEL_TRIALS`] trials.
///
/// Chunks are accumulated in parallel, then merged in trial order, so the result does not depend
/// on the scheduling of the chunks.
pub fn aggregate(stats: &[TrialStats]) -> TrialAccumulator {
    stats
        .par_chunks(MIN_PARALLEL_TRIALS)
        .map(|chunk| chunk.iter().collect::<TrialAccumulator>())
        .collect::<Vec<TrialAccumulator>>()
        .iter()
        .fold(TrialAccumulator::new(), |acc, partial| acc.merge(partial))
}

/// Returns the random number generator of trial `k` of a batch.
pub fn trial_rng(seed: u64, k: usize) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed.wrapping_add(k as u64))
}

/// Runs `params.n_trials` independent trials and aggregates their statistics.
///
/// Each trial owns a generator seeded from the base seed and its index, so the outcome does not
/// depend on whether the trials run in parallel.
pub fn run_trials(params: &SynapseParams) -> Result<TrialBatch, SynapseError> {
    let warnings = params.validate()?;

    let seed = match params.seed {
        Some(seed) => seed,
        None => rand::thread_rng().gen(),
    };
    log::info!(
        "Running {} trials with seed {} ({} steps each)",
        params.n_trials,
        seed,
        params.clock()?.n_steps()
    );

    let last = params.n_trials - 1;
    let run_one = |k: usize| -> Result<(TrialStats, Option<Trial>), SynapseError> {
        log::trace!("Trial {} seeded with {}", k, seed.wrapping_add(k as u64));
        let trial = Trial::run_validated(params, warnings.clone(), &mut trial_rng(seed, k))?;
        let stats = trial.stats();
        log::debug!("Trial {}: {:?}", k, stats);
        Ok((stats, if k == last { Some(trial) } else { None }))
    };

    let results = if params.n_trials >= MIN_PARALLEL_TRIALS {
        (0..params.n_trials)
            .into_par_iter()
            .map(run_one)
            .collect::<Result<Vec<_>, SynapseError>>()
    } else {
        (0..params.n_trials)
            .map(run_one)
            .collect::<Result<Vec<_>, SynapseError>>()
    }?;

    let mut stats = Vec::with_capacity(results.len());
    let mut last_trial = None;
    for (trial_stats, trial) in results {
        stats.push(trial_stats);
        if trial.is_some() {
            last_trial = trial;
        }
    }
    let last_trial = last_trial.ok_or_else(|| {
        SynapseError::InvalidParameter("Invalid number of trials: must be positive".to_string())
    })?;

    let summary = aggregate(&stats).summary();
    log::info!(
        "Trials completed: mean spike rate {:.3}, mean fusion {:.3}, mean release {:.3}",
        summary.mean_spike_rate,
        summary.mean_fusion,
        summary.mean_release
    );

    Ok(TrialBatch {
        seed,
        warnings,
        stats,
        summary,
        last_trial,
    })
}
