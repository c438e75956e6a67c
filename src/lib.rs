//! This crate provides tools for simulating the presynaptic vesicle release of a single synapse.
//!
//! A trial samples a Poisson spike train, integrates the calcium concentration it drives, and
//! integrates the coupled vesicle fusion and release dynamics, all with a fixed-timestep explicit
//! Euler scheme. Batches of independent trials are aggregated into summary statistics.
//!
//! # Running a Single Trial
//!
//! ```rust
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//! use rusty_synapse::core::params::SynapseParams;
//! use rusty_synapse::core::trial::Trial;
//!
//! let params = SynapseParams {
//!     rate: 17.0,
//!     tau_c: 0.4,
//!     v_0: 10.0,
//!     ..SynapseParams::default()
//! };
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let trial = Trial::run(&params, &mut rng).unwrap();
//!
//! assert_eq!(trial.spike().len(), 1000);
//! assert_eq!(trial.calcium().get(0), Some(0.0));
//! ```
//!
//! # Running Many Trials
//!
//! ```rust
//! use rusty_synapse::core::batch::run_trials;
//! use rusty_synapse::core::params::SynapseParams;
//!
//! let params = SynapseParams {
//!     n_trials: 10,
//!     seed: Some(7),
//!     ..SynapseParams::default()
//! };
//! let batch = run_trials(&params).unwrap();
//!
//! assert_eq!(batch.summary().num_trials, 10);
//! assert!(batch.summary().mean_spike_rate > 0.0);
//! ```

pub mod core;
pub mod error;
