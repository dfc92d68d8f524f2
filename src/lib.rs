// src/lib.rs
// Shared library for the display service and the batch updater.

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod display;
pub mod error;
pub mod fetcher;
pub mod normalize;
pub mod reading;
pub mod telemetry;
pub mod updater;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::error::FetchError;
pub use crate::fetcher::{fetch_reading, ReadingProvider};
pub use crate::reading::{PersistedReading, Reading};
