//! Presynaptic calcium concentration.
use crate::core::clock::SimulationClock;
use crate::core::spike::SpikeTrace;
use crate::core::trace::Trace;
use crate::error::SynapseError;

/// Calcium concentration, one value per step.
pub type CalciumTrace = Trace;

/// Integrates the calcium concentration driven by a spike trace.
///
/// The concentration follows the forward Euler discretization of
/// `dc/dt = -c / tau_c + R * spike(t)`, starting from zero:
/// `c[i] = c[i-1] * (1 - dt / tau_c) + (dt / tau_c) * R * spike[i-1]`.
/// A spike at step `i-1` only affects the concentration from step `i` on.
pub fn integrate(
    spike: &SpikeTrace,
    tau_c: f64,
    calcium_per_spike: f64,
    clock: &SimulationClock,
) -> Result<CalciumTrace, SynapseError> {
    if !calcium_per_spike.is_finite() || calcium_per_spike < 0.0 {
        return Err(SynapseError::InvalidParameter(
            "Invalid calcium per spike: must be non-negative".to_string(),
        ));
    }
    let k = clock.decay_ratio("tau_c", tau_c)?;
    spike.check_len(clock)?;

    let mut calcium = CalciumTrace::zeros(clock);
    let values = calcium.values_mut();
    let n_steps = values.len();
    for (i, s) in spike.values().iter().enumerate().take(n_steps - 1) {
        values[i + 1] = values[i] * (1.0 - k) + k * calcium_per_spike * *s as f64;
    }

    Ok(calcium)
}
