// src/config/credentials.rs
use serde::Deserialize;
use std::{env, fmt, fs, path::Path, path::PathBuf};

/// Env vars checked in order; first non-empty wins.
pub const ENV_API_KEYS: [&str; 2] = ["OPENAI_API_KEY", "CO2_OPENAI_API_KEY"];
pub const ENV_APP_CONFIG_PATH: &str = "CO2_APP_CONFIG_PATH";
pub const DEFAULT_APP_CONFIG_PATH: &str = "config/app.json";

/// Bearer credential for the remote API. May be empty; the fetcher
/// refuses to go on the network with an empty one.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ApiCredential(String);

impl ApiCredential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into().trim().to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Resolve from the process environment, then the app config file.
    pub fn resolve() -> Self {
        let path = env::var(ENV_APP_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_APP_CONFIG_PATH));
        Self::resolve_with(|k| env::var(k).ok(), &path)
    }

    /// Resolution with an injectable env lookup.
    pub fn resolve_with<F>(lookup: F, app_config: &Path) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        for name in ENV_API_KEYS {
            if let Some(v) = lookup(name).filter(|v| !v.trim().is_empty()) {
                tracing::debug!(source = name, "API credential resolved from env");
                return Self::new(v);
            }
        }
        match read_app_config_key(app_config) {
            Some(v) => {
                tracing::debug!(path = %app_config.display(), "API credential resolved from app config");
                Self::new(v)
            }
            None => {
                tracing::warn!("no API credential configured; fetches will fail");
                Self::default()
            }
        }
    }
}

// Keep the key out of logs and panics.
impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiCredential(len={})", self.0.len())
    }
}

#[derive(Debug, Deserialize)]
struct AppConfig {
    #[serde(default)]
    extra: Option<AppExtra>,
}

#[derive(Debug, Deserialize)]
struct AppExtra {
    #[serde(default, alias = "openaiApiKey")]
    openai_api_key: Option<String>,
}

fn read_app_config_key(path: &Path) -> Option<String> {
    let data = fs::read_to_string(path).ok()?;
    let cfg: AppConfig = match serde_json::from_str(&data) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "ignoring unreadable app config");
            return None;
        }
    };
    cfg.extra?
        .openai_api_key
        .filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(map: HashMap<&'static str, &'static str>) -> impl Fn(&str) -> Option<String> {
        move |k: &str| map.get(k).map(|v| v.to_string())
    }

    #[test]
    fn first_env_name_wins() {
        let dir = tempfile::tempdir().unwrap();
        let env = HashMap::from([("OPENAI_API_KEY", "k1"), ("CO2_OPENAI_API_KEY", "k2")]);
        let c = ApiCredential::resolve_with(lookup(env), &dir.path().join("none.json"));
        assert_eq!(c.expose(), "k1");
    }

    #[test]
    fn blank_env_falls_through_to_second_name() {
        let dir = tempfile::tempdir().unwrap();
        let env = HashMap::from([("OPENAI_API_KEY", "  "), ("CO2_OPENAI_API_KEY", "k2")]);
        let c = ApiCredential::resolve_with(lookup(env), &dir.path().join("none.json"));
        assert_eq!(c.expose(), "k2");
    }

    #[test]
    fn app_config_extra_is_last_resort() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("app.json");
        fs::write(&p, r#"{"name":"co2","extra":{"openaiApiKey":" k3 "}}"#).unwrap();
        let c = ApiCredential::resolve_with(lookup(HashMap::new()), &p);
        assert_eq!(c.expose(), "k3");
    }

    #[test]
    fn nothing_configured_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("app.json");
        fs::write(&p, r#"{"extra":{}}"#).unwrap();
        let c = ApiCredential::resolve_with(lookup(HashMap::new()), &p);
        assert!(c.is_empty());
        assert_eq!(format!("{c:?}"), "ApiCredential(len=0)");
    }
}
