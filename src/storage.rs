//! The storage directory and every operation performed on it.
//!
//! All file state lives in one flat directory. Handlers never touch the
//! filesystem directly; they go through [`StorageDir`], which owns the
//! naming, metadata, and containment rules.

use std::{
    io,
    path::{Path, PathBuf},
    str::FromStr,
    time::{SystemTime, UNIX_EPOCH},
};

use derive_more::derive::{AsRef, Deref, Display};
use percent_encoding::utf8_percent_encode;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use thiserror::Error;
use tokio::fs;

use crate::percent_encoding::COMPONENT;

/// The URL prefix stored files are publicly served under.
pub const UPLOADS_ROUTE: &str = "/uploads";

/// The subdirectory of the storage root holding per-file metadata records.
const META_DIR: &str = ".meta";

/// The filename suffix of not-yet-published upload temporaries.
const PART_SUFFIX: &str = ".part";

/// The longest accepted stored name, in bytes.
///
/// Leaves room for the dot-prefixed `.part` temporary and the `.meta/*.json`
/// record within common 255-byte filesystem name limits.
const MAX_NAME_BYTES: usize = 200;

/// A filename that's safe to join directly onto the storage root.
///
/// Construction is the only validation gate: a `StoredName` never contains a
/// path separator, a `..` sequence, a control character, or a leading `.`,
/// and is at most [`MAX_NAME_BYTES`] bytes long.
#[derive(
    Deref,
    AsRef,
    Display,
    DeserializeFromStr,
    SerializeDisplay,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Debug,
)]
#[as_ref(forward)]
pub struct StoredName(String);

impl StoredName {
    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An error validating a filename.
#[derive(Error, Clone, PartialEq, Eq, Debug)]
#[non_exhaustive]
pub enum NameError {
    /// The name is empty.
    #[error("filename is empty")]
    Empty,

    /// The name contains `/` or `\`.
    #[error("filename contains a path separator")]
    Separator,

    /// The name contains a `..` sequence.
    #[error("filename contains a parent directory reference")]
    ParentRef,

    /// The name starts with a `.`. Dot-prefixed names are reserved for the
    /// service's own bookkeeping.
    #[error("filename starts with a dot")]
    Hidden,

    /// The name contains an ASCII control character.
    #[error("filename contains a control character")]
    Control,

    /// The name is longer than [`MAX_NAME_BYTES`] bytes.
    #[error("filename is longer than {MAX_NAME_BYTES} bytes")]
    TooLong,
}

impl FromStr for StoredName {
    type Err = NameError;

    fn from_str(str: &str) -> Result<Self, Self::Err> {
        if str.is_empty() {
            return Err(NameError::Empty);
        }

        if str.len() > MAX_NAME_BYTES {
            return Err(NameError::TooLong);
        }

        if str.contains(['/', '\\']) {
            return Err(NameError::Separator);
        }

        if str.contains("..") {
            return Err(NameError::ParentRef);
        }

        if str.starts_with('.') {
            return Err(NameError::Hidden);
        }

        if str.chars().any(|char| char.is_ascii_control()) {
            return Err(NameError::Control);
        }

        Ok(Self(str.to_owned()))
    }
}

/// The metadata record written next to every upload.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// The filename the client supplied at upload time.
    pub original_name: String,

    /// The upload time in Unix milliseconds.
    pub uploaded_at: u64,
}

/// A file in the storage directory together with its metadata.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct StoredFile {
    /// The on-disk name the file is addressed by.
    pub name: StoredName,

    /// The filename the client supplied at upload time, or a best-effort
    /// derivation for files that have no metadata record.
    pub original_name: String,

    /// The size in bytes, from filesystem metadata.
    pub size: u64,

    /// The upload time in Unix milliseconds. Falls back to the modification
    /// time for files that have no metadata record.
    pub uploaded_at: u64,
}

impl StoredFile {
    /// The public URL path this file is served under.
    pub fn url(&self) -> String {
        format!(
            "{UPLOADS_ROUTE}/{}",
            utf8_percent_encode(self.name.as_str(), COMPONENT)
        )
    }
}

/// An error performing a storage operation.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The filename failed validation.
    #[error(transparent)]
    Name(#[from] NameError),

    /// No stored file has the given name.
    #[error("no such file")]
    NotFound,

    /// The name resolves to a path outside the storage root.
    #[error("filename resolves outside the storage directory")]
    Outside,

    /// The underlying filesystem operation failed.
    #[error("storage I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Accessor for the single directory holding every stored file.
#[derive(Clone, Debug)]
pub struct StorageDir {
    /// The canonicalized storage root. Every resolved path must stay under
    /// it.
    root: PathBuf,
}

impl StorageDir {
    /// Opens the storage directory, creating it and its metadata
    /// subdirectory if absent, and sweeps temporaries left behind by
    /// interrupted uploads.
    ///
    /// # Errors
    ///
    /// Fails if the directories can't be created or enumerated, or if the
    /// root can't be canonicalized. The service can't run without its
    /// storage root, so callers treat this as fatal.
    pub async fn initialize(root: &Path) -> io::Result<Self> {
        fs::create_dir_all(root).await?;
        fs::create_dir_all(root.join(META_DIR)).await?;

        let root = fs::canonicalize(root).await?;

        let dir = Self { root };
        dir.sweep_temporaries().await?;

        Ok(dir)
    }

    /// The canonical storage root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Removes `.{name}.part` temporaries left behind by interrupted
    /// uploads.
    async fn sweep_temporaries(&self) -> io::Result<()> {
        let mut entries = fs::read_dir(&self.root).await?;

        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();

            let Some(name) = file_name.to_str() else {
                continue;
            };

            if name.starts_with('.') && name.ends_with(PART_SUFFIX) {
                if let Err(error) = fs::remove_file(entry.path()).await {
                    tracing::warn!(name, %error, "failed to remove stale upload temporary");
                }
            }
        }

        Ok(())
    }

    /// The path a stored name maps to. Containment holds by construction of
    /// [`StoredName`]; read and delete paths recheck it against the
    /// canonical path anyway.
    fn path_of(&self, name: &StoredName) -> PathBuf {
        self.root.join(name.as_str())
    }

    /// The path of the metadata record for a stored name.
    fn record_path_of(&self, name: &StoredName) -> PathBuf {
        self.root.join(META_DIR).join(format!("{name}.json"))
    }

    /// Resolves a name to the canonical path of an existing regular file,
    /// verifying that the result stays under the storage root.
    async fn resolve_existing(&self, name: &StoredName) -> Result<PathBuf, Error> {
        let path = fs::canonicalize(self.path_of(name))
            .await
            .map_err(io_not_found)?;

        if !path.starts_with(&self.root) {
            return Err(Error::Outside);
        }

        let metadata = fs::metadata(&path).await.map_err(io_not_found)?;

        if !metadata.is_file() {
            return Err(Error::NotFound);
        }

        Ok(path)
    }

    /// Stores one upload: writes the metadata record, then the bytes to a
    /// dot-prefixed temporary, then publishes the file with an atomic
    /// rename.
    ///
    /// # Errors
    ///
    /// Returns a name validation error when the client filename can't yield
    /// a usable stored name, and an I/O error otherwise. Nothing visible is
    /// left behind on failure.
    pub async fn store(&self, original_name: &str, data: &[u8]) -> Result<StoredFile, Error> {
        let uploaded_at = unix_millis();
        let name = compose_stored_name(original_name, uploaded_at)?;

        let record = FileRecord {
            original_name: original_name.to_owned(),
            uploaded_at,
        };

        let record_path = self.record_path_of(&name);
        let record_json = serde_json::to_vec(&record).map_err(io::Error::from)?;
        fs::write(&record_path, &record_json).await?;

        let temp_path = self.root.join(format!(".{name}{PART_SUFFIX}"));
        let final_path = self.path_of(&name);

        let publish = async {
            fs::write(&temp_path, data).await?;
            fs::rename(&temp_path, &final_path).await
        };

        if let Err(error) = publish.await {
            _ = fs::remove_file(&temp_path).await;
            _ = fs::remove_file(&record_path).await;
            return Err(Error::Io(error));
        }

        Ok(StoredFile {
            name,
            original_name: record.original_name,
            size: data.len() as u64,
            uploaded_at,
        })
    }

    /// Lists every visible stored file with its metadata, in directory
    /// enumeration order.
    ///
    /// Entries that vanish mid-enumeration are skipped rather than failing
    /// the listing, as are entries whose names the service couldn't have
    /// produced (and so can't address).
    ///
    /// # Errors
    ///
    /// Fails only if the directory itself can't be enumerated.
    pub async fn entries(&self) -> Result<Vec<StoredFile>, Error> {
        let mut files = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;

        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();

            let Some(raw_name) = file_name.to_str() else {
                continue;
            };

            if raw_name.starts_with('.') {
                continue;
            }

            let Ok(name) = raw_name.parse::<StoredName>() else {
                tracing::debug!(name = raw_name, "skipping unaddressable listing entry");
                continue;
            };

            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                Err(error) if error.kind() == io::ErrorKind::NotFound => {
                    tracing::debug!(name = raw_name, "file vanished during listing");
                    continue;
                }
                Err(error) => {
                    tracing::warn!(name = raw_name, %error, "skipping unreadable listing entry");
                    continue;
                }
            };

            if !metadata.is_file() {
                continue;
            }

            let (original_name, uploaded_at) = match self.read_record(&name).await {
                Some(record) => (record.original_name, record.uploaded_at),
                None => (
                    derive_original_name(raw_name).to_owned(),
                    modified_millis(&metadata),
                ),
            };

            files.push(StoredFile {
                name,
                original_name,
                size: metadata.len(),
                uploaded_at,
            });
        }

        Ok(files)
    }

    /// Reads the metadata record for a stored name, if one exists and is
    /// readable.
    async fn read_record(&self, name: &StoredName) -> Option<FileRecord> {
        let bytes = fs::read(self.record_path_of(name)).await.ok()?;

        match serde_json::from_slice(&bytes) {
            Ok(record) => Some(record),
            Err(error) => {
                tracing::warn!(%name, %error, "ignoring corrupt metadata record");
                None
            }
        }
    }

    /// Opens a stored file for reading, returning the handle and the file's
    /// size in bytes.
    ///
    /// # Errors
    ///
    /// See [`Error`].
    pub async fn open_file(&self, name: &StoredName) -> Result<(fs::File, u64), Error> {
        let path = self.resolve_existing(name).await?;

        let file = fs::File::open(&path).await.map_err(io_not_found)?;
        let size = file.metadata().await?.len();

        Ok((file, size))
    }

    /// Deletes a stored file along with its metadata record.
    ///
    /// # Errors
    ///
    /// See [`Error`]. Deleting a file that doesn't exist is [`Error::NotFound`].
    pub async fn delete(&self, name: &StoredName) -> Result<(), Error> {
        let path = self.resolve_existing(name).await?;

        fs::remove_file(&path).await.map_err(io_not_found)?;

        if let Err(error) = fs::remove_file(self.record_path_of(name)).await {
            if error.kind() != io::ErrorKind::NotFound {
                tracing::warn!(%name, %error, "failed to remove metadata record");
            }
        }

        Ok(())
    }
}

/// Maps an I/O error to [`Error::NotFound`] when the underlying file is
/// missing, and to [`Error::Io`] otherwise.
fn io_not_found(error: io::Error) -> Error {
    if error.kind() == io::ErrorKind::NotFound {
        Error::NotFound
    } else {
        Error::Io(error)
    }
}

/// The current Unix time in milliseconds, or `0` if the clock reads before
/// the epoch.
fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as u64)
}

/// The modification time in Unix milliseconds, or `0` when the filesystem
/// doesn't report one.
fn modified_millis(metadata: &std::fs::Metadata) -> u64 {
    metadata
        .modified()
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |elapsed| elapsed.as_millis() as u64)
}

/// Builds the stored name for an upload: the sanitized base name, a `-`, the
/// upload time in Unix milliseconds, and the original extension.
fn compose_stored_name(original_name: &str, uploaded_at: u64) -> Result<StoredName, NameError> {
    let file_name = sanitize_original(original_name);
    let (base, extension) = split_extension(file_name);

    if base.is_empty() {
        return Err(NameError::Empty);
    }

    format!("{base}-{uploaded_at}{extension}").parse()
}

/// Strips directory components and leading dots from a client filename.
///
/// Some clients send full paths; only the last segment is meaningful, and a
/// dot-prefixed result would collide with the hidden-name convention.
fn sanitize_original(original_name: &str) -> &str {
    let last_segment = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_name);

    last_segment.trim_start_matches('.')
}

/// Splits a filename at its last `.` into a base and an extension. The
/// extension includes the dot and is empty when there's none, or when the
/// name starts with its only dot.
fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(index) if index > 0 => file_name.split_at(index),
        _ => (file_name, ""),
    }
}

/// Best-effort recovery of the original name from a stored name alone, for
/// files that have no metadata record: everything from the final `-` onward
/// is dropped.
///
/// Lossy by construction. A `-` in the original base name directly before
/// the extension can't be told apart from the timestamp separator.
fn derive_original_name(stored_name: &str) -> &str {
    match stored_name.rfind('-') {
        Some(index) => &stored_name[..index],
        None => stored_name,
    }
}
