use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use hertz_engine::logging::{init_logging, LoggingConfig};
use hertz_engine::{EstimatorConfig, PacedScheduler, RefreshRateEstimator};

#[derive(Parser, Debug)]
#[command(name = "hertz-probe", version, about = "Estimate a refresh rate from frame-callback cadence")]
struct Cli {
    #[arg(long, default_value_t = 60.0)]
    /// Rate of the simulated frame source driving the estimator.
    simulate_hz: f64,

    #[arg(long)]
    /// Frames averaged per estimate (overrides HERTZ_MIN_SAMPLES).
    min_samples: Option<u32>,

    #[arg(long)]
    /// Overall time budget in milliseconds (overrides HERTZ_TIMEOUT_MS).
    timeout_ms: Option<u64>,

    #[arg(long)]
    /// Readiness poll interval in milliseconds (overrides HERTZ_POLL_INTERVAL_MS).
    poll_ms: Option<u64>,

    #[arg(long)]
    /// Log filter in env_logger syntax, e.g. "hertz_engine=debug".
    log: Option<String>,
}

impl Cli {
    fn estimator_config(&self) -> Result<EstimatorConfig> {
        let mut config = EstimatorConfig::from_env().context("invalid HERTZ_* environment")?;

        if let Some(n) = self.min_samples {
            config.min_samples_per_window = n;
        }
        if let Some(ms) = self.timeout_ms {
            config.timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.poll_ms {
            config.poll_interval = Duration::from_millis(ms);
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(LoggingConfig {
        env_filter: cli.log.clone(),
        ..LoggingConfig::default()
    });

    let config = cli.estimator_config()?;
    let scheduler = PacedScheduler::from_hz(cli.simulate_hz).context("invalid --simulate-hz")?;
    log::debug!(
        "probing with period {:?}, window {} frames, timeout {:?}",
        scheduler.period(),
        config.min_samples_per_window,
        config.timeout
    );

    let estimator =
        RefreshRateEstimator::with_config(scheduler, config).context("failed to create estimator")?;
    let hz = estimator
        .estimate_hz()
        .await
        .context("refresh-rate estimation failed")?;

    println!("{hz}hz.");
    Ok(())
}
