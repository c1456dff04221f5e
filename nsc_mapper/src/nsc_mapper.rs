use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use lib_pubchem::retrieve::ky_http::ApiClient;
use lib_pubchem::tabular::{read_identifiers, write_records};
use lib_pubchem::{BatchDriver, JitteredDelay, RecordFetcher, RetryPolicy};

mod mapper_logic;
use mapper_logic::{config, logger};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = config::load_config()?;
    let log_path = logger::setup_logging(&settings.log_dir, &settings.log_level)?;
    log::info!("Logging to {}", log_path.display());

    let identifiers = read_identifiers(&settings.input, &settings.column)
        .with_context(|| format!("Cannot read identifiers from {}", settings.input.display()))?;

    let client = ApiClient::new(&settings.base_url, Duration::from_secs(settings.timeout_secs))?;
    let delay = JitteredDelay::from_secs_f64(settings.min_delay_secs, settings.max_delay_secs)?;
    let policy = RetryPolicy::new(settings.max_attempts, Arc::new(delay))?;
    let fetcher = Arc::new(RecordFetcher::new(client, policy));

    let driver = BatchDriver::new(fetcher, settings.workers);
    let records = driver.run(identifiers).await;

    write_records(&settings.output, &records)
        .with_context(|| format!("Cannot write results to {}", settings.output.display()))?;
    log::info!("Results saved to {}", settings.output.display());

    Ok(())
}
