//! File manager data types

use std::path::{Path, PathBuf};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::path_utils::RemoteDir;

/// One file or folder from a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Name, unique within its parent listing
    pub name: String,
    /// Whether this entry is a folder
    pub is_folder: bool,
    /// Size in bytes (only meaningful for files)
    #[serde(default)]
    pub size: u64,
    /// Last modification time
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_modified: DateTime<Utc>,
}

impl Entry {
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            is_folder: false,
            size,
            last_modified: DateTime::<Utc>::default(),
        }
    }

    pub fn folder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_folder: true,
            size: 0,
            last_modified: DateTime::<Utc>::default(),
        }
    }

    /// Whether this entry looks like a zip archive the server can extract.
    pub fn is_archive(&self) -> bool {
        !self.is_folder
            && Path::new(&self.name)
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
    }
}

/// Modifier state accompanying an activation (click / enter).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivateModifiers {
    /// Ctrl (or Cmd) held: toggle selection instead of opening
    #[serde(default)]
    pub selecting: bool,
}

impl ActivateModifiers {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn selecting() -> Self {
        Self { selecting: true }
    }
}

/// What an activation ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// Selection was toggled for the entry
    Toggled { selected: bool },
    /// Navigated into the folder
    Navigated(RemoteDir),
    /// File was too large to preview and was downloaded instead
    Downloaded(SavedDownload),
    /// File was handed to the editor
    Opened(Entry),
}

/// A file fetched from the remote, ready to be saved.
#[derive(Debug, Clone)]
pub struct DownloadedFile {
    /// Server-suggested filename (from the content disposition)
    pub filename: String,
    pub data: Bytes,
}

/// Where a download ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedDownload {
    pub filename: String,
    pub location: PathBuf,
    pub size: u64,
}

/// Content of a pending upload
#[derive(Debug, Clone)]
pub enum UploadSource {
    /// Bytes already in memory
    Memory(Bytes),
    /// Local file streamed from disk
    Disk(PathBuf),
}

/// A file queued for upload into the current directory
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub size: u64,
    pub source: UploadSource,
}

impl UploadFile {
    pub fn from_bytes(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            name: name.into(),
            size: data.len() as u64,
            source: UploadSource::Memory(data),
        }
    }

    /// Stat a local file and queue it for streaming upload.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("not a regular file: {}", path.display()),
            ));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name")
            })?;
        Ok(Self {
            name,
            size: metadata.len(),
            source: UploadSource::Disk(path.to_path_buf()),
        })
    }

    pub fn mime_type(&self) -> String {
        mime_guess::from_path(&self.name)
            .first_or_octet_stream()
            .to_string()
    }
}

/// Constants for file manager operations
pub mod constants {
    use std::time::Duration;

    /// Files larger than this are downloaded instead of opened in the editor
    pub const LARGE_FILE_THRESHOLD: u64 = 1_000_000;

    /// Ceiling for every non-upload request
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    /// Ceiling for a single upload request
    pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);

    /// How long a status message stays visible
    pub const STATUS_DISPLAY: Duration = Duration::from_millis(3000);

    /// Chunk size used when streaming upload bodies (64 KB)
    pub const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;
}
