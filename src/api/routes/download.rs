//! An HTTP resource serving stored files as attachments.

use axum::{
    body::Body,
    extract::{Path, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE},
    response::Response,
};
use axum_macros::debug_handler;
use percent_encoding::utf8_percent_encode;
use tokio_util::io::ReaderStream;

use crate::{api::Error, percent_encoding::COMPONENT, storage::StoredName, AppState};

/// Streams the named stored file as an attachment.
///
/// Only failures to resolve or open the file produce an error response. A
/// read failure after the headers are sent aborts the connection instead.
///
/// # Errors
///
/// See [`crate::api::Error`].
#[debug_handler]
pub async fn get(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, Error> {
    let name: StoredName = filename.parse()?;

    let (file, size) = state.storage.open_file(&name).await?;

    // Stored names may contain `"`, which would end the quoted filename
    // early. The encoded `filename*` form carries the exact name.
    let fallback_name = name.as_str().replace('"', "'");
    let disposition = format!(
        "attachment; filename=\"{fallback_name}\"; filename*=UTF-8''{}",
        utf8_percent_encode(name.as_str(), COMPONENT)
    );

    let response = Response::builder()
        .header(CONTENT_TYPE, "application/octet-stream")
        .header(CONTENT_LENGTH, size)
        .header(CONTENT_DISPOSITION, disposition)
        .body(Body::from_stream(ReaderStream::new(file)))
        .expect("response should be valid");

    Ok(response)
}
