//! Reading fetcher: one POST to the Responses API with web search + strict JSON schema.

use std::time::Instant;

use async_trait::async_trait;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use serde_json::{json, Value};

use crate::config::{ApiCredential, Settings};
use crate::error::FetchError;
use crate::normalize;
use crate::reading::Reading;

pub const PROMPT: &str = "Use web search to find the most recent globally averaged atmospheric \
CO2 concentration in parts per million (for example the latest NOAA Mauna Loa or global \
monthly mean). Return only a JSON object with the fields ppm (number), source (the URL you \
took the value from) and timestamp (ISO-8601 date-time of the measurement).";

/// Anything that can produce a raw response body for the normalizer.
#[async_trait]
pub trait ReadingProvider: Send + Sync {
    async fn fetch_raw(&self) -> Result<Value, FetchError>;
    fn name(&self) -> &'static str;
}

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("co2_fetch_total", "Reading fetch attempts.");
        describe_counter!("co2_fetch_errors_total", "Failed fetches by error kind.");
        describe_histogram!("co2_fetch_ms", "Fetch + normalize time in milliseconds.");
        describe_gauge!("co2_last_ppm", "Last successfully fetched concentration.");
    });
}

/// Fetch and normalize one reading. Shared by the display service and the batch updater.
pub async fn fetch_reading(provider: &dyn ReadingProvider) -> Result<Reading, FetchError> {
    ensure_metrics_described();
    counter!("co2_fetch_total").increment(1);
    let t0 = Instant::now();

    let res = match provider.fetch_raw().await {
        Ok(body) => normalize::normalize(&body),
        Err(e) => Err(e),
    };
    histogram!("co2_fetch_ms").record(t0.elapsed().as_secs_f64() * 1000.0);

    match &res {
        Ok(r) => {
            gauge!("co2_last_ppm").set(r.concentration);
            tracing::info!(
                provider = provider.name(),
                ppm = r.concentration,
                timestamp = %r.timestamp,
                "reading fetched"
            );
        }
        Err(e) => {
            counter!("co2_fetch_errors_total", "kind" => e.kind()).increment(1);
            tracing::warn!(provider = provider.name(), kind = e.kind(), error = %e, "reading fetch failed");
        }
    }
    res
}

// ------------------------------------------------------------
// OpenAI Responses API
// ------------------------------------------------------------

/// Strict output schema: `{ ppm: number, source: string, timestamp: date-time }`.
pub fn output_format() -> Value {
    json!({
        "format": {
            "type": "json_schema",
            "name": "co2_reading",
            "strict": true,
            "schema": {
                "type": "object",
                "properties": {
                    "ppm": { "type": "number" },
                    "source": { "type": "string" },
                    "timestamp": { "type": "string", "format": "date-time" }
                },
                "required": ["ppm", "source", "timestamp"],
                "additionalProperties": false
            }
        }
    })
}

/// Request body for one reading.
pub fn request_body(model: &str) -> Value {
    json!({
        "model": model,
        "tools": [{ "type": "web_search_preview" }],
        "input": [{ "role": "user", "content": PROMPT }],
        "text": output_format(),
    })
}

pub struct OpenAiFetcher {
    http: reqwest::Client,
    credential: ApiCredential,
    endpoint: String,
    model: String,
}

impl OpenAiFetcher {
    /// The credential is resolved once by the caller and handed in here.
    pub fn new(credential: ApiCredential, settings: &Settings) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("co2-reading/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            credential,
            endpoint: settings.endpoint.clone(),
            model: settings.model.clone(),
        })
    }
}

#[async_trait]
impl ReadingProvider for OpenAiFetcher {
    async fn fetch_raw(&self) -> Result<Value, FetchError> {
        if self.credential.is_empty() {
            return Err(FetchError::Auth);
        }

        tracing::debug!(endpoint = %self.endpoint, model = %self.model, "requesting reading");
        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.credential.expose())
            .json(&request_body(&self.model))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Request {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.json::<Value>().await?)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

/// Fixed-response provider for offline runs and tests.
#[derive(Clone)]
pub struct FixtureProvider {
    pub body: Value,
}

impl FixtureProvider {
    /// A well-formed structured reply carrying the given reading.
    pub fn structured(ppm: f64, source: &str, timestamp: &str) -> Self {
        Self {
            body: json!({
                "output": [{ "type": "message", "content": [{
                    "type": "output_json",
                    "json": { "ppm": ppm, "source": source, "timestamp": timestamp }
                }]}]
            }),
        }
    }
}

#[async_trait]
impl ReadingProvider for FixtureProvider {
    async fn fetch_raw(&self) -> Result<Value, FetchError> {
        Ok(self.body.clone())
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}
