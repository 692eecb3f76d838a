//! The JSON HTTP API, exposed under `/api/`.

pub mod routes;

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use thiserror::Error;

use crate::{config::MAX_UPLOAD_BYTES, storage};

/// The response type every API route handler returns.
pub type Response<T> = Result<(StatusCode, Json<T>), Error>;

/// An error responding to an API request.
///
/// Converts into a `{"error": ...}` JSON response with the mapped status.
/// Internal failure detail is logged server-side and never serialized to the
/// client.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The upload form contains no file under the expected field.
    #[error("no file was uploaded under the `file` field")]
    FileMissing,

    /// The upload form contains more than one file under the expected field.
    #[error("only one file may be uploaded per request")]
    FileRepeated,

    /// The multipart form data couldn't be read.
    #[error("invalid multipart form data")]
    FormInvalid,

    /// The uploaded file exceeds [`MAX_UPLOAD_BYTES`].
    #[error("file exceeds the maximum upload size of {MAX_UPLOAD_BYTES} bytes")]
    FileTooLarge,

    /// The supplied filename failed validation.
    #[error("invalid filename: {0}")]
    FilenameInvalid(#[from] storage::NameError),

    /// The filename is valid but resolves outside the storage root.
    #[error("filename resolves outside the storage directory")]
    FileOutsideRoot,

    /// No stored file has the supplied name.
    #[error("no such file")]
    FileNotFound,

    /// No route matches the request.
    #[error("route not found")]
    RouteNotFound,

    /// An unexpected failure. The detail is logged, not sent.
    #[error("internal server error")]
    Internal(#[source] storage::Error),
}

impl Error {
    /// The HTTP status this error maps to.
    fn status(&self) -> StatusCode {
        match self {
            Self::FileMissing
            | Self::FileRepeated
            | Self::FormInvalid
            | Self::FilenameInvalid(_)
            | Self::FileOutsideRoot => StatusCode::BAD_REQUEST,
            Self::FileTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::FileNotFound | Self::RouteNotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<storage::Error> for Error {
    fn from(error: storage::Error) -> Self {
        match error {
            storage::Error::Name(error) => Self::FilenameInvalid(error),
            storage::Error::NotFound => Self::FileNotFound,
            storage::Error::Outside => Self::FileOutsideRoot,
            storage::Error::Io(_) => Self::Internal(error),
        }
    }
}

/// The JSON body of every API error response.
#[derive(Serialize, Clone, PartialEq, Eq, Debug)]
struct ErrorBody {
    /// A human-readable description of the failure.
    error: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        if let Self::Internal(source) = &self {
            tracing::error!(error = %source, "request failed");
        }

        let status = self.status();
        let body = ErrorBody {
            error: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::NameError;

    #[test]
    fn statuses_match_the_error_taxonomy() {
        let cases = [
            (Error::FileMissing, StatusCode::BAD_REQUEST),
            (Error::FormInvalid, StatusCode::BAD_REQUEST),
            (
                Error::FilenameInvalid(NameError::ParentRef),
                StatusCode::BAD_REQUEST,
            ),
            (Error::FileOutsideRoot, StatusCode::BAD_REQUEST),
            (Error::FileTooLarge, StatusCode::PAYLOAD_TOO_LARGE),
            (Error::FileNotFound, StatusCode::NOT_FOUND),
            (Error::RouteNotFound, StatusCode::NOT_FOUND),
        ];

        for (error, expected) in cases {
            assert_eq!(error.status(), expected, "{error} should map to {expected}");
        }
    }

    #[test]
    fn internal_detail_is_not_in_the_message() {
        let error = Error::Internal(storage::Error::Io(std::io::Error::other(
            "disk exploded at /secret/path",
        )));

        assert_eq!(
            error.to_string(),
            "internal server error",
            "internal detail shouldn't leak into the client message"
        );
    }
}
