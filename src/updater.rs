// src/updater.rs
// Batch updater: fetch once, stamp, overwrite the static data file.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::fetcher::{fetch_reading, ReadingProvider};
use crate::reading::PersistedReading;

/// Fetch + normalize + write. Nothing is written unless the reading is valid.
pub async fn run_update(
    provider: &dyn ReadingProvider,
    path: &Path,
    now: DateTime<Utc>,
) -> Result<PersistedReading> {
    let reading = fetch_reading(provider).await?;
    let persisted = PersistedReading::capture(&reading, now);
    write_persisted(path, &persisted)?;
    tracing::info!(
        path = %path.display(),
        ppm = persisted.ppm,
        timestamp = %persisted.timestamp,
        "data file updated"
    );
    Ok(persisted)
}

/// Pretty JSON + trailing newline, replaced via temp file + rename.
pub fn write_persisted(path: &Path, value: &PersistedReading) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let mut json = serde_json::to_string_pretty(value).context("serializing reading")?;
    json.push('\n');

    let tmp = path.with_extension("json.tmp");
    let mut f = fs::File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
    f.write_all(json.as_bytes())?;
    f.sync_all()?;
    fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}

pub fn load_persisted(path: &Path) -> Result<PersistedReading> {
    let s = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parsing {}", path.display()))
}
