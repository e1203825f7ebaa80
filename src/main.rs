use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use power_reader::{AcquisitionMode, App, SensorFetcher, SensorFileWriter, SensorSource};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to initialize logging: {err}"))?;

    let source = SensorFetcher::new(AcquisitionMode::SharedMemory);
    info!(source = source.description(), "power-reader starting");

    let app = App::new(Box::new(source), SensorFileWriter::new());
    app.run();

    Ok(())
}
