//! Reading types: the canonical reading, its persisted form, and the display projection.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A validated CO2 reading. Only produced by the normalizer, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// Concentration in parts per million.
    pub concentration: f64,
    /// Measurement time as reported by the source (ISO-8601).
    pub timestamp: String,
    /// Citation URL.
    pub source: String,
}

/// On-disk shape written by the batch updater.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedReading {
    pub ppm: f64,
    pub timestamp: String,
    pub source: String,
    pub updated_at: String,
}

impl PersistedReading {
    pub fn capture(reading: &Reading, now: DateTime<Utc>) -> Self {
        Self {
            ppm: reading.concentration,
            timestamp: reading.timestamp.clone(),
            source: reading.source.clone(),
            updated_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    pub fn reading(&self) -> Reading {
        Reading {
            concentration: self.ppm,
            timestamp: self.timestamp.clone(),
            source: self.source.clone(),
        }
    }
}

/// What the display client renders for a successful reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingView {
    pub ppm: f64,
    pub ppm_display: String,
    pub timestamp: String,
    pub timestamp_display: String,
    pub source: String,
}

impl From<&Reading> for ReadingView {
    fn from(r: &Reading) -> Self {
        Self {
            ppm: r.concentration,
            ppm_display: format_ppm(r.concentration),
            timestamp: r.timestamp.clone(),
            timestamp_display: format_timestamp(&r.timestamp),
            source: r.source.clone(),
        }
    }
}

/// Two decimals plus unit, e.g. `421.30 ppm`.
pub fn format_ppm(ppm: f64) -> String {
    format!("{ppm:.2} ppm")
}

/// Human date rendering. Falls back to the raw string when it is not a
/// recognizable date, so a valid reading is never hidden.
pub fn format_timestamp(ts: &str) -> String {
    let t = ts.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(t) {
        return dt
            .with_timezone(&Utc)
            .format("%-d %B %Y, %H:%M UTC")
            .to_string();
    }
    if let Ok(d) = NaiveDate::parse_from_str(t, "%Y-%m-%d") {
        return d.format("%-d %B %Y").to_string();
    }
    t.to_string()
}
