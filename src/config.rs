//! Runtime configuration, read from the environment (and `.env`, if present).

use std::path::PathBuf;

/// The largest accepted size for one uploaded file, in bytes.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Request body headroom on top of [`MAX_UPLOAD_BYTES`], covering multipart
/// boundaries and part headers.
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// The TCP address listened on when `ADDRESS` is unset.
const DEFAULT_ADDRESS: &str = "0.0.0.0:3000";

/// The storage directory used when `STORAGE_DIR` is unset.
const DEFAULT_STORAGE_DIR: &str = "uploads";

/// The public asset directory used when `PUBLIC_DIR` is unset.
const DEFAULT_PUBLIC_DIR: &str = "public";

/// The admin key used when `ADMIN_KEY` is unset.
const DEFAULT_ADMIN_KEY: &str = "letmein";

/// Settings resolved once at startup.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Config {
    /// The TCP address to listen on.
    pub address: String,

    /// The directory uploaded files are stored in.
    pub storage_dir: PathBuf,

    /// The directory of public static assets served at `/`.
    pub public_dir: PathBuf,

    /// The shared secret granting access to the admin console.
    pub admin_key: String,
}

impl Config {
    /// Reads the configuration from the environment, falling back to the
    /// defaults above for each unset variable.
    pub fn from_env() -> Self {
        Self {
            address: var_or("ADDRESS", DEFAULT_ADDRESS),
            storage_dir: PathBuf::from(var_or("STORAGE_DIR", DEFAULT_STORAGE_DIR)),
            public_dir: PathBuf::from(var_or("PUBLIC_DIR", DEFAULT_PUBLIC_DIR)),
            admin_key: var_or("ADMIN_KEY", DEFAULT_ADMIN_KEY),
        }
    }

    /// Whether the admin key was left at its built-in default.
    pub fn uses_default_admin_key(&self) -> bool {
        self.admin_key == DEFAULT_ADMIN_KEY
    }
}

/// Reads an environment variable, falling back to `default` when it's unset.
fn var_or(name: &str, default: &str) -> String {
    dotenvy::var(name).unwrap_or_else(|_| default.to_owned())
}
