//! All routes for the HTTP API.

pub mod download;
pub mod files;
pub mod upload;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::{api, AppState};

/// Builds the API route table.
pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/api/upload", post(upload::post))
        .route("/api/files", get(files::get))
        .route("/api/files/:filename", delete(files::delete))
        .route("/api/download/:filename", get(download::get))
}

/// Handles requests that match no route and no public asset.
#[allow(clippy::unused_async)] // Axum route handlers must be async.
pub(crate) async fn route_not_found() -> api::Error {
    api::Error::RouteNotFound
}
