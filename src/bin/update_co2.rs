//! One-shot batch updater: fetch the latest reading and overwrite the data file.
//! Exits non-zero with the error on stderr if anything fails.

use chrono::Utc;
use co2_reading::bootstrap::Runtime;
use co2_reading::updater::run_update;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        eprintln!("update-co2 failed: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let rt = Runtime::from_env()?;
    let written = run_update(rt.provider.as_ref(), &rt.settings.data_path, Utc::now()).await?;
    println!(
        "CO2 {:.2} ppm at {} -> {}",
        written.ppm,
        written.timestamp,
        rt.settings.data_path.display()
    );
    Ok(())
}
