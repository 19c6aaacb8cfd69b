//! Defines routes for the upload echo service.
//!
//! ## Structure
//! - `GET  /`             — greeting
//! - `GET  /healthz`      — liveness
//! - `POST /file`         — required file `file`, echoed as text
//! - `POST /file/json-file` — optional JSON file `file`
//! - `POST /file/image`   — optional static image `image`, size-limited (422)
//! - `POST /file/images`  — up to `max_images` static images `images`

use crate::{
    config::AppConfig,
    handlers::{
        health_handlers::healthz,
        upload_handlers::{say_hello, upload_file, upload_image, upload_images, upload_json_file},
    },
    services::upload_service::UploadService,
};
use anyhow::Result;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

/// Build and return the router for all upload routes.
///
/// The router carries shared state (`UploadService`) to all handlers.
pub fn routes() -> Router<UploadService> {
    Router::new()
        .route("/", get(say_hello))
        .route("/healthz", get(healthz))
        .route("/file", post(upload_file))
        .route("/file/json-file", post(upload_json_file))
        .route("/file/image", post(upload_image))
        .route("/file/images", post(upload_images))
}

/// The complete application: routes, state, body limit and request tracing.
pub fn app(cfg: &AppConfig) -> Result<Router> {
    let service = UploadService::new(cfg)?;

    Ok(routes()
        .with_state(service)
        .layer(DefaultBodyLimit::max(cfg.body_limit))
        .layer(TraceLayer::new_for_http()))
}
