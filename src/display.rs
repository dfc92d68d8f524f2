//! display.rs — view model behind the display client: loading / error / success,
//! plus a gate so only one refresh is in flight at a time.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::FetchError;
use crate::fetcher::{fetch_reading, ReadingProvider};
use crate::reading::{Reading, ReadingView};
use crate::updater::load_persisted;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DisplayState {
    Loading,
    Error { message: String },
    Success { reading: ReadingView },
}

impl DisplayState {
    pub fn from_result(res: &Result<Reading, FetchError>) -> Self {
        match res {
            Ok(r) => DisplayState::Success {
                reading: ReadingView::from(r),
            },
            Err(e) => DisplayState::Error {
                message: user_message(e),
            },
        }
    }
}

/// Short, user-facing text for each failure.
pub fn user_message(e: &FetchError) -> String {
    match e {
        FetchError::Auth => "No API key configured. Set OPENAI_API_KEY and try again.".into(),
        FetchError::Request { status, .. } => {
            format!("The CO2 service returned an error (HTTP {status}). Pull to retry.")
        }
        FetchError::Transport(_) => "Could not reach the CO2 service. Check your connection.".into(),
        FetchError::NoContent | FetchError::MalformedJson(_) => {
            "The CO2 service returned an unreadable answer. Pull to retry.".into()
        }
        FetchError::Validation { missing } => format!(
            "The CO2 service answer was incomplete (missing {}). Pull to retry.",
            missing.join(", ")
        ),
    }
}

/// Single-flight flag. The guard clears it on drop, including on panic/early return.
#[derive(Debug, Default)]
pub struct RefreshGate {
    busy: AtomicBool,
}

/// Owned so it can travel into the spawned refresh task.
pub struct RefreshGuard {
    gate: Arc<RefreshGate>,
}

impl RefreshGate {
    pub fn try_acquire(self: &Arc<Self>) -> Option<RefreshGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RefreshGuard { gate: self.clone() })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        self.gate.busy.store(false, Ordering::Release);
    }
}

#[derive(Clone)]
pub struct DisplayModel {
    provider: Arc<dyn ReadingProvider>,
    state: Arc<RwLock<DisplayState>>,
    gate: Arc<RefreshGate>,
}

impl DisplayModel {
    pub fn new(provider: Arc<dyn ReadingProvider>) -> Self {
        Self {
            provider,
            state: Arc::new(RwLock::new(DisplayState::Loading)),
            gate: Arc::new(RefreshGate::default()),
        }
    }

    pub async fn current(&self) -> DisplayState {
        self.state.read().await.clone()
    }

    pub fn is_refreshing(&self) -> bool {
        self.gate.is_busy()
    }

    /// Run one fetch. `None` means a refresh was already in flight and nothing was started.
    ///
    /// The fetch runs in its own task: dropping the returned future does not
    /// cancel it, so the state always ends in success or error.
    pub async fn refresh(&self) -> Option<DisplayState> {
        let guard = self.gate.try_acquire()?;
        let provider = self.provider.clone();
        let state = self.state.clone();

        let task = tokio::spawn(async move {
            let _guard = guard;
            *state.write().await = DisplayState::Loading;

            let res = fetch_reading(provider.as_ref()).await;
            let next = DisplayState::from_result(&res);
            *state.write().await = next.clone();
            next
        });

        match task.await {
            Ok(next) => Some(next),
            Err(e) => {
                tracing::error!(error = %e, "refresh task failed");
                let next = DisplayState::Error {
                    message: "Refreshing the CO2 reading failed unexpectedly. Pull to retry.".into(),
                };
                *self.state.write().await = next.clone();
                Some(next)
            }
        }
    }
}

/// The static reading shipped in the data file.
pub fn static_state(path: &Path) -> DisplayState {
    match load_persisted(path) {
        Ok(p) => DisplayState::Success {
            reading: ReadingView::from(&p.reading()),
        },
        Err(e) => {
            tracing::warn!(error = %e, "static reading unavailable");
            DisplayState::Error {
                message: "No stored CO2 reading available yet.".into(),
            }
        }
    }
}
