//! Core module defining the main components of the Rusty Synapse library.
//!
//! A trial runs a three-stage discrete-time pipeline over a fixed [`clock::SimulationClock`]:
//!
//! - [`spike`]: Samples the presynaptic spike train from a Poisson process
//! - [`calcium`]: Integrates the calcium concentration driven by the spikes
//! - [`vesicle`]: Integrates the coupled fusion and release dynamics
//! - [`trial`]: Runs the pipeline once
//! - [`batch`]: Runs many independent trials and aggregates their statistics
//!
//! # Examples
//!
//! ```
//! use rusty_synapse::core::params::SynapseParams;
//! use rusty_synapse::core::batch::run_trials;
//!
//! let params = SynapseParams {
//!     n_trials: 4,
//!     ..SynapseParams::default()
//! };
//! let batch = run_trials(&params).unwrap();
//!
//! assert_eq!(batch.stats().len(), 4);
//! assert_eq!(batch.last_trial().spike().len(), 1000);
//! ```
pub mod batch;
pub mod calcium;
pub mod clock;
pub mod params;
pub mod spike;
pub mod trace;
pub mod trial;
pub mod vesicle;

/// Fraction of the trial (at the end) forced to be quiescent when the tail is suppressed.
pub const TAIL_FRACTION: f64 = 0.1;
/// Ratio `dt / tau` from which a time constant triggers a stability warning.
pub const STABILITY_WARNING_RATIO: f64 = 0.5;
/// Maximum number of steps of a simulation clock.
pub const MAX_STEPS: usize = 100_000_000;
/// Minimum number of trials to consider parallel processing.
pub const MIN_PARALLEL_TRIALS: usize = 8;
