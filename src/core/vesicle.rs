//! Vesicle fusion and release dynamics.
//!
//! The fusion drive relaxes toward the part of the pool not released at the previous step,
//! while the release at step `i` is gated by the calcium, the spike and the available pool,
//! all read at the same lagged step `j = i - d`, with `d = round(release_delay / dt)`.
//! Steps with `j < 0` lie before the start of the trial and release nothing.
use serde::{Deserialize, Serialize};

use crate::core::calcium::CalciumTrace;
use crate::core::clock::SimulationClock;
use crate::core::spike::SpikeTrace;
use crate::core::trace::Trace;
use crate::error::SynapseError;

/// Fusion drive, one value per step. Not a vesicle count.
pub type FusionTrace = Trace;
/// Number of vesicles released at each step.
pub type ReleaseTrace = Trace;

/// How fusion and release values are kept within the pool.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClampPolicy {
    /// No clamping: values may leave `[0, v_0]` under extreme parameters.
    #[default]
    Unclamped,
    /// Fusion and release are clamped into `[0, v_0]` right after each update.
    Physical,
}

impl ClampPolicy {
    fn apply(&self, x: f64, v_0: f64) -> f64 {
        match self {
            ClampPolicy::Unclamped => x,
            ClampPolicy::Physical => x.clamp(0.0, v_0),
        }
    }
}

/// Integrates the fusion drive and the release of a vesicle pool of size `v_0`.
///
/// For every step `i >= 1`:
/// - `fusion[i] = (dt / tau_f) * (v_0 - release[i-1]) + (1 - dt / tau_f) * fusion[i-1]`
/// - `release[i] = calcium[j] * spike[j] * (v_0 - fusion[j])` with `j = i - d`, or 0 if `j < 0`.
///
/// With no delay, the release uses the fusion drive of the same step, which is updated first.
pub fn integrate(
    calcium: &CalciumTrace,
    spike: &SpikeTrace,
    tau_f: f64,
    v_0: f64,
    release_delay: f64,
    clamp_policy: ClampPolicy,
    clock: &SimulationClock,
) -> Result<(FusionTrace, ReleaseTrace), SynapseError> {
    if !v_0.is_finite() || v_0 <= 0.0 {
        return Err(SynapseError::InvalidParameter(
            "Invalid pool size: must be positive".to_string(),
        ));
    }
    let k = clock.decay_ratio("tau_f", tau_f)?;
    let d = clock.delay_steps(release_delay)?;
    calcium.check_len("calcium", clock)?;
    spike.check_len(clock)?;

    let calcium = calcium.values();
    let spike = spike.values();

    let mut fusion = vec![0.0; clock.n_steps()];
    let mut release = vec![0.0; clock.n_steps()];
    for i in 1..clock.n_steps() {
        let drive = k * (v_0 - release[i - 1]) + (1.0 - k) * fusion[i - 1];
        fusion[i] = clamp_policy.apply(drive, v_0);
        release[i] = match i.checked_sub(d) {
            Some(j) => {
                let released = calcium[j] * spike[j] as f64 * (v_0 - fusion[j]);
                clamp_policy.apply(released, v_0)
            }
            None => 0.0,
        };
    }

    Ok((FusionTrace::new_from(fusion), ReleaseTrace::new_from(release)))
}
