use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::display::{static_state, DisplayModel, DisplayState};
use crate::fetcher::ReadingProvider;

#[derive(Clone)]
pub struct AppState {
    pub display: DisplayModel,
    pub data_path: PathBuf,
}

impl AppState {
    pub fn new(provider: Arc<dyn ReadingProvider>, data_path: PathBuf) -> Self {
        Self {
            display: DisplayModel::new(provider),
            data_path,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/reading", get(current_reading))
        .route("/api/reading/static", get(static_reading))
        .route("/api/refresh", post(refresh))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn current_reading(State(state): State<AppState>) -> Json<DisplayState> {
    Json(state.display.current().await)
}

async fn static_reading(State(state): State<AppState>) -> Json<DisplayState> {
    let path = state.data_path.clone();
    let out = tokio::task::spawn_blocking(move || static_state(&path))
        .await
        .unwrap_or_else(|e| DisplayState::Error {
            message: format!("static reading task failed: {e}"),
        });
    Json(out)
}

/// 409 while another refresh is still running; the body is the state as it stands.
async fn refresh(State(state): State<AppState>) -> (StatusCode, Json<DisplayState>) {
    match state.display.refresh().await {
        Some(next) => (StatusCode::OK, Json(next)),
        None => (StatusCode::CONFLICT, Json(state.display.current().await)),
    }
}
