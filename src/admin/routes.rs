//! Route handlers for the admin console.

use askama::Template;
use axum::{
    body::Body,
    extract::{Query, State},
    http::{header::LOCATION, StatusCode},
    response::{Html, Response},
};
use axum_macros::debug_handler;
use percent_encoding::utf8_percent_encode;
use serde::Deserialize;

use crate::{
    admin::{format_size, format_time, Error},
    percent_encoding::COMPONENT,
    storage::StoredName,
    AppState,
};

/// The query parameters for `GET /admin`.
#[derive(Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct ConsoleQuery {
    /// The presented admin key.
    key: Option<String>,
}

/// The query parameters for `GET /admin/delete`.
#[derive(Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct DeleteQuery {
    /// The stored name to delete.
    file: Option<String>,

    /// The presented admin key.
    key: Option<String>,
}

/// The admin console page.
#[derive(Template)]
#[template(path = "admin.html")]
struct ConsolePage {
    /// One row per stored file.
    rows: Vec<ConsoleRow>,
}

/// One file row on the console page.
struct ConsoleRow {
    /// The stored name.
    name: String,

    /// The uploader's filename.
    original_name: String,

    /// The size, human-formatted.
    size: String,

    /// The upload time, human-formatted.
    uploaded: String,

    /// A link to the raw file.
    download_url: String,

    /// A delete link with the presented key embedded.
    delete_url: String,
}

/// Renders the console: a table of every stored file with download and
/// delete links.
///
/// # Errors
///
/// See [`crate::admin::Error`].
#[debug_handler]
pub async fn get(
    State(state): State<AppState>,
    Query(query): Query<ConsoleQuery>,
) -> Result<Html<String>, Error> {
    let key = authorize(&state, query.key.as_deref())?;

    let files = state.storage.entries().await?;

    let rows = files
        .into_iter()
        .map(|file| {
            let download_url = file.url();
            let delete_url = format!(
                "/admin/delete?file={}&key={}",
                utf8_percent_encode(file.name.as_str(), COMPONENT),
                utf8_percent_encode(key, COMPONENT),
            );

            ConsoleRow {
                name: file.name.to_string(),
                original_name: file.original_name,
                size: format_size(file.size),
                uploaded: format_time(file.uploaded_at),
                download_url,
                delete_url,
            }
        })
        .collect();

    let page = ConsolePage { rows };
    let html = page.render().map_err(|error| Error::Internal(error.into()))?;

    Ok(Html(html))
}

/// Deletes the named file and redirects back to the console.
///
/// The filename passes through the same validation as the API delete, and a
/// missing file fails loudly instead of redirecting.
///
/// # Errors
///
/// See [`crate::admin::Error`].
#[debug_handler]
pub async fn delete(
    State(state): State<AppState>,
    Query(query): Query<DeleteQuery>,
) -> Result<Response, Error> {
    let key = authorize(&state, query.key.as_deref())?;

    let file = query.file.as_deref().ok_or(Error::FileUnnamed)?;
    let name: StoredName = file.parse()?;

    state.storage.delete(&name).await?;

    tracing::info!(%name, "deleted stored file from the admin console");

    let location = format!("/admin?key={}", utf8_percent_encode(key, COMPONENT));

    let response = Response::builder()
        .status(StatusCode::FOUND)
        .header(LOCATION, location)
        .body(Body::empty())
        .expect("response should be valid");

    Ok(response)
}

/// Checks the presented key against the configured authenticator, handing
/// the key back for re-embedding into console links.
fn authorize<'a>(state: &AppState, presented: Option<&'a str>) -> Result<&'a str, Error> {
    match presented {
        Some(key) if state.authenticator.verify(key) => Ok(key),
        _ => Err(Error::KeyInvalid),
    }
}
