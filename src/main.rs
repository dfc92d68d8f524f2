//! CO2 display service — binary entrypoint.
//! Boots the Axum HTTP server with the reading view model and /metrics.

use co2_reading::api::{self, AppState};
use co2_reading::bootstrap::Runtime;
use co2_reading::telemetry::Metrics;
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact tracing logs for local runs only (the deployment runtime installs its own).
/// Activation requires BOTH a debug build and CO2_DEV_LOG=1.
fn enable_dev_tracing() {
    let dev_flag = std::env::var("CO2_DEV_LOG").is_ok_and(|v| v == "1");
    if !(dev_flag && cfg!(debug_assertions)) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("co2_reading=debug,info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    enable_dev_tracing();

    // Recorder first, so the initial fetch is already counted.
    let metrics = match Metrics::init() {
        Ok(m) => Some(m),
        Err(e) => {
            tracing::warn!(error = ?e, "metrics disabled");
            None
        }
    };

    let rt = Runtime::from_env()?;
    let state = AppState::new(rt.provider, rt.settings.data_path);

    // First reading in the background; the client sees `loading` until it lands.
    let display = state.display.clone();
    tokio::spawn(async move {
        display.refresh().await;
    });

    let mut router = api::router(state);
    if let Some(m) = metrics {
        router = router.merge(m.router());
    }

    Ok(router.into())
}
