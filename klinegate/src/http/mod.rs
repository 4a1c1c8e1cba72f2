//! HTTP surface: `/kline`, `/basic`, CORS and the front-end bundle.

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::get;

use crate::core::Kline;

mod assets;
mod cors;
mod error;
mod handlers;

pub use error::{ApiError, status_of};

/// State shared by every handler.
pub struct AppState {
    /// The pipeline orchestrator.
    pub kline: Kline,
    /// Directory holding the front-end bundle.
    pub web_root: PathBuf,
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/kline", get(handlers::kline_get).post(handlers::kline_post))
        .route("/basic", get(handlers::basic_get).post(handlers::basic_post))
        .fallback(assets::serve)
        .layer(middleware::from_fn(cors::cors))
        .with_state(state)
}
