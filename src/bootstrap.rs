// src/bootstrap.rs
use crate::config::{ApiCredential, Settings};
use crate::fetcher::{FixtureProvider, OpenAiFetcher, ReadingProvider};
use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};

pub const ENV_TEST_MODE: &str = "CO2_TEST_MODE";

pub struct Runtime {
    pub settings: Settings,
    pub provider: Arc<dyn ReadingProvider>,
}

impl Runtime {
    /// Resolve settings and credential once, then build the provider.
    ///
    /// * `CO2_TEST_MODE=mock` gives a deterministic offline provider.
    /// * Otherwise the real fetcher; a missing credential is only reported
    ///   here and surfaces as an auth error on the first fetch.
    pub fn from_env() -> anyhow::Result<Self> {
        let settings = Settings::load_default().context("loading settings")?;

        if std::env::var(ENV_TEST_MODE).is_ok_and(|v| v == "mock") {
            warn!("{ENV_TEST_MODE}=mock: serving a fixed reading");
            let provider = FixtureProvider::structured(
                421.3,
                "https://gml.noaa.gov/ccgg/trends/global.html",
                "2024-05-01T00:00:00Z",
            );
            return Ok(Self {
                settings,
                provider: Arc::new(provider),
            });
        }

        let credential = ApiCredential::resolve();
        // Safe diagnostics: only endpoint + model + key length
        info!(
            "settings loaded: endpoint={}, model={}, key_len={}",
            settings.endpoint,
            settings.model,
            credential.expose().len()
        );
        let fetcher =
            OpenAiFetcher::new(credential, &settings).context("building HTTP client")?;
        Ok(Self {
            settings,
            provider: Arc::new(fetcher),
        })
    }
}
