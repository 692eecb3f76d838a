//! Filedrop's backend web server: uploading, listing, downloading, and
//! deleting files over HTTP against a single storage directory.

pub mod admin;
pub mod api;
pub mod config;
pub(crate) mod crypto;
pub(crate) mod percent_encoding;
pub mod router;
pub mod storage;

use std::{fmt, sync::Arc};

use crate::{admin::Authenticator, storage::StorageDir};

/// State shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    /// The storage directory all file operations go through.
    pub storage: StorageDir,

    /// The verifier for admin console keys.
    pub authenticator: Arc<dyn Authenticator>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("storage", &self.storage)
            .finish_non_exhaustive()
    }
}
