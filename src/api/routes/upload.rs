//! An HTTP resource accepting new file uploads.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use axum_macros::debug_handler;
use serde::Serialize;

use crate::{
    api::{Error, Response},
    config::MAX_UPLOAD_BYTES,
    storage::{StoredFile, StoredName},
    AppState,
};

/// The multipart field name the uploaded file must arrive under.
const FILE_FIELD: &str = "file";

/// Accepts exactly one file under the `file` field and stores it.
///
/// # Errors
///
/// See [`crate::api::Error`].
#[debug_handler]
pub async fn post(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Response<PostResponse> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(mut field) = multipart.next_field().await.map_err(read_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        if upload.is_some() {
            return Err(Error::FileRepeated);
        }

        let Some(original_name) = field.file_name().map(ToOwned::to_owned) else {
            return Err(Error::FileMissing);
        };

        let mut data = Vec::new();

        while let Some(chunk) = field.chunk().await.map_err(read_error)? {
            // The limit layer bounds the whole request body. This bounds the
            // file itself, before buffering more of it.
            if data.len() + chunk.len() > MAX_UPLOAD_BYTES {
                return Err(Error::FileTooLarge);
            }

            data.extend_from_slice(&chunk);
        }

        upload = Some((original_name, data));
    }

    let Some((original_name, data)) = upload else {
        return Err(Error::FileMissing);
    };

    let file = state.storage.store(&original_name, &data).await?;

    tracing::info!(name = %file.name, size = file.size, "stored uploaded file");

    Ok((
        StatusCode::OK,
        Json(PostResponse {
            message: "File uploaded successfully".to_owned(),
            file: file.into(),
        }),
    ))
}

/// A `POST` response body for this API route.
#[derive(Serialize, Clone, PartialEq, Eq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    /// A human-readable confirmation.
    pub message: String,

    /// The stored file, as reported back to the uploader.
    pub file: UploadedFile,
}

/// The stored file's metadata, as reported back to the uploader.
#[derive(Serialize, Clone, PartialEq, Eq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    /// The filename the client supplied.
    pub original_name: String,

    /// The name the file is stored under and addressed by.
    pub filename: StoredName,

    /// The stored size in bytes.
    pub size: u64,

    /// The public URL path serving the raw bytes.
    pub path: String,

    /// The upload time in Unix milliseconds.
    pub upload_time: u64,
}

impl From<StoredFile> for UploadedFile {
    fn from(file: StoredFile) -> Self {
        let path = file.url();

        Self {
            original_name: file.original_name,
            filename: file.name,
            size: file.size,
            path,
            upload_time: file.uploaded_at,
        }
    }
}

/// Maps a multipart read failure into the API error taxonomy, keeping the
/// framework's over-limit signal distinct from plain malformed input.
fn read_error(error: MultipartError) -> Error {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::FileTooLarge
    } else {
        Error::FormInvalid
    }
}
