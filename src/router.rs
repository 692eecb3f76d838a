//! The top-level router: API routes, the admin console, static file mounts,
//! and the JSON fallback.

use axum::{extract::DefaultBodyLimit, handler::HandlerWithoutStateExt, routing::get, Router};
use tower_http::services::ServeDir;

use crate::{
    admin, api,
    config::{Config, MAX_UPLOAD_BYTES, MULTIPART_OVERHEAD_BYTES},
    storage::UPLOADS_ROUTE,
    AppState,
};

/// Builds the complete application router.
///
/// Requests no route matches fall through to the public asset directory, and
/// requests that match no asset either get the JSON not-found response.
pub fn build(config: &Config, state: AppState) -> Router {
    let not_found = api::routes::route_not_found.into_service();

    let uploads = ServeDir::new(state.storage.root()).not_found_service(not_found.clone());
    let assets = ServeDir::new(&config.public_dir).not_found_service(not_found);

    Router::new()
        .merge(api::routes::router())
        .route("/admin", get(admin::routes::get))
        .route("/admin/delete", get(admin::routes::delete))
        .nest_service(UPLOADS_ROUTE, uploads)
        .fallback_service(assets)
        .layer(DefaultBodyLimit::max(
            MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD_BYTES,
        ))
        .with_state(state)
}
