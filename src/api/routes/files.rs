//! An HTTP resource representing the set of stored files.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_macros::debug_handler;
use serde::Serialize;

use crate::{
    api::Response,
    storage::{StoredFile, StoredName},
    AppState,
};

/// Lists every stored file, in directory enumeration order.
///
/// # Errors
///
/// See [`crate::api::Error`].
#[debug_handler]
pub async fn get(State(state): State<AppState>) -> Response<Vec<FileEntry>> {
    let files = state.storage.entries().await?;

    Ok((
        StatusCode::OK,
        Json(files.into_iter().map(Into::into).collect()),
    ))
}

/// One listing entry, as served to clients.
#[derive(Serialize, Clone, PartialEq, Eq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    /// The name the file is stored under and addressed by.
    pub name: StoredName,

    /// The filename the uploader supplied, or a best-effort derivation for
    /// files that have no metadata record.
    pub original_name: String,

    /// The size in bytes.
    pub size: u64,

    /// The upload time in Unix milliseconds.
    pub upload_time: u64,

    /// The public URL path serving the raw bytes.
    pub url: String,
}

impl From<StoredFile> for FileEntry {
    fn from(file: StoredFile) -> Self {
        let url = file.url();

        Self {
            name: file.name,
            original_name: file.original_name,
            size: file.size,
            upload_time: file.uploaded_at,
            url,
        }
    }
}

/// Deletes the named stored file.
///
/// # Errors
///
/// See [`crate::api::Error`].
#[debug_handler]
pub async fn delete(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Response<DeleteResponse> {
    let name: StoredName = filename.parse()?;

    state.storage.delete(&name).await?;

    tracing::info!(%name, "deleted stored file");

    Ok((
        StatusCode::OK,
        Json(DeleteResponse {
            message: "File deleted successfully".to_owned(),
        }),
    ))
}

/// A `DELETE` response body for this API route.
#[derive(Serialize, Clone, PartialEq, Eq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    /// A human-readable confirmation.
    pub message: String,
}
