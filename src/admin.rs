//! The key-gated admin console.

pub mod routes;

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
};
use ring::digest::Digest;
use thiserror::Error;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::{
    crypto::{digests_match, hash_without_salt},
    storage,
};

/// Verifies keys presented to the admin console.
///
/// The console handlers depend only on this trait, so the built-in shared
/// secret can be swapped for a real credential scheme without touching them.
pub trait Authenticator: Send + Sync {
    /// Whether the presented key grants admin access.
    fn verify(&self, presented: &str) -> bool;
}

/// An [`Authenticator`] comparing against one static shared secret.
#[derive(Clone, Copy, Debug)]
pub struct StaticKey {
    /// The SHA-256 digest of the configured key.
    key_digest: Digest,
}

impl StaticKey {
    /// Creates an authenticator accepting exactly `key`.
    pub fn new(key: &str) -> Self {
        Self {
            key_digest: hash_without_salt(&key),
        }
    }
}

impl Authenticator for StaticKey {
    fn verify(&self, presented: &str) -> bool {
        digests_match(&hash_without_salt(&presented), &self.key_digest)
    }
}

/// An error responding to an admin console request.
///
/// The console is HTML, not JSON, so this renders as a plain status line.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The presented key is missing or doesn't match.
    #[error("the admin key is missing or wrong")]
    KeyInvalid,

    /// The `file` query parameter is missing.
    #[error("no file was named")]
    FileUnnamed,

    /// The named file failed validation.
    #[error("invalid filename: {0}")]
    FilenameInvalid(#[from] storage::NameError),

    /// The filename is valid but resolves outside the storage root.
    #[error("filename resolves outside the storage directory")]
    FileOutsideRoot,

    /// No stored file has the supplied name.
    #[error("no such file")]
    FileNotFound,

    /// An unexpected failure. The detail is logged, not sent.
    #[error("internal server error")]
    Internal(#[source] anyhow::Error),
}

impl Error {
    /// The HTTP status this error maps to.
    fn status(&self) -> StatusCode {
        match self {
            Self::KeyInvalid => StatusCode::FORBIDDEN,
            Self::FileUnnamed | Self::FilenameInvalid(_) | Self::FileOutsideRoot => {
                StatusCode::BAD_REQUEST
            }
            Self::FileNotFound => StatusCode::NOT_FOUND,
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
            storage::Error::Io(_) => Self::Internal(error.into()),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        if let Self::Internal(source) = &self {
            tracing::error!(error = %source, "admin request failed");
        }

        let status = self.status();

        Response::builder()
            .status(status)
            .header(CONTENT_TYPE, "text/plain")
            .body(Body::from(status.to_string()))
            .expect("response should be valid")
    }
}

/// Formats a byte count for the console.
pub(crate) fn format_size(bytes: u64) -> String {
    /// One kibibyte.
    const KIB: u64 = 1024;
    /// One mebibyte.
    const MIB: u64 = KIB * 1024;
    /// One gibibyte.
    const GIB: u64 = MIB * 1024;

    if bytes >= GIB {
        format!("{:.2} GiB", bytes as f64 / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.2} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.2} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{bytes} B")
    }
}

/// Formats Unix milliseconds as RFC 3339 for the console, falling back to
/// the raw number when the value is out of range.
pub(crate) fn format_time(millis: u64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .ok()
        .and_then(|time| time.format(&Rfc3339).ok())
        .unwrap_or_else(|| millis.to_string())
}
