use clap::Parser;
use log::LevelFilter;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use sha2::{Digest, Sha256};
use std::path::PathBuf;

use rusty_synapse::core::batch::run_trials;
use rusty_synapse::core::params::SynapseParams;
use rusty_synapse::error::SynapseError;

#[derive(Parser, Debug)]
struct Args {
    /// The JSON file with the simulation parameters (defaults are used if omitted)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the base seed of the trials
    #[arg(long)]
    seed: Option<u64>,
    /// Overrides the number of trials
    #[arg(long)]
    trials: Option<usize>,
    /// The JSON file receiving the summary and the traces of the last trial
    #[arg(long, default_value = "output/last_trial.json")]
    output: PathBuf,
    /// The directory of the log files
    #[arg(long, default_value = "log")]
    log_dir: PathBuf,
}

fn main() -> Result<(), SynapseError> {
    let args = Args::parse();

    let mut hasher = Sha256::new();
    hasher.update(format!("{:?}", args));
    let hash = hasher.finalize();
    let log_path = args.log_dir.join(format!("{:x}.log", hash));

    let logfile = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{d} {l} - {m}\n")))
        .build(log_path)
        .map_err(|e| SynapseError::IOError(e.to_string()))?;

    let config = Config::builder()
        .appender(Appender::builder().build("logfile", Box::new(logfile)))
        .build(Root::builder().appender("logfile").build(LevelFilter::Info))
        .map_err(|e| SynapseError::IOError(e.to_string()))?;

    log4rs::init_config(config).map_err(|e| SynapseError::IOError(e.to_string()))?;

    log::info!("{:?}", args);

    let mut params = match &args.config {
        Some(path) => SynapseParams::load_from(path)?,
        None => SynapseParams::default(),
    };
    if let Some(seed) = args.seed {
        params.seed = Some(seed);
    }
    if let Some(trials) = args.trials {
        params.n_trials = trials;
    }
    log::info!("{:?}", params);

    let batch = run_trials(&params)?;
    let summary = batch.summary();
    log::info!(
        "Summary over {} trials (seed {}): spike rate {:.3} +/- {:.3}, \
         fusion {:.4} +/- {:.4}, release {:.4} +/- {:.4}",
        summary.num_trials,
        batch.seed(),
        summary.mean_spike_rate,
        summary.std_spike_rate,
        summary.mean_fusion,
        summary.std_fusion,
        summary.mean_release,
        summary.std_release,
    );

    if let Some(dir) = args.output.parent() {
        std::fs::create_dir_all(dir).map_err(|e| SynapseError::IOError(e.to_string()))?;
    }
    batch.save_to(&args.output)?;
    log::info!("Output saving: done! Saved to {}", args.output.display());

    Ok(())
}
