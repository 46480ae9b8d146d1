//! Remote file API
//!
//! [`FileApi`] is the contract the file manager needs from the server. Every
//! call is a suspension point and must give up after a bounded wait.
//! [`HttpFileApi`] implements it over the panel's REST endpoints.

pub mod client;

use async_trait::async_trait;

use crate::files::error::FileError;
use crate::files::path_utils::RemoteDir;
use crate::files::progress::ProgressFn;
use crate::files::types::{DownloadedFile, Entry, UploadFile};

pub use client::{parse_content_disposition, HttpFileApi};

#[async_trait]
pub trait FileApi: Send + Sync {
    /// Entries of `dir`, in server order.
    async fn list_folder(&self, dir: &RemoteDir) -> Result<Vec<Entry>, FileError>;

    /// Zip `names` inside `dir`. All-or-nothing from the client's view.
    async fn archive(&self, dir: &RemoteDir, names: &[String]) -> Result<(), FileError>;

    /// Extract the zip archives among `names` inside `dir`.
    async fn unarchive(&self, dir: &RemoteDir, names: &[String]) -> Result<(), FileError>;

    async fn delete_file(&self, path: &str) -> Result<(), FileError>;

    async fn delete_folder(&self, path: &str) -> Result<(), FileError>;

    /// Rename the file or folder at `path` to `new_name` (same parent).
    async fn rename(&self, path: &str, is_folder: bool, new_name: &str) -> Result<(), FileError>;

    /// Create or overwrite the file at `path` with `content`.
    async fn write_file(&self, path: &str, content: &str) -> Result<(), FileError>;

    async fn create_folder(&self, path: &str) -> Result<(), FileError>;

    /// Upload `file` into `dir`, reporting bytes sent through `progress`.
    async fn upload_file(
        &self,
        dir: &RemoteDir,
        file: UploadFile,
        progress: Option<ProgressFn>,
    ) -> Result<(), FileError>;

    /// Fetch the file at `path` along with its server-suggested filename.
    async fn fetch_file(&self, path: &str) -> Result<DownloadedFile, FileError>;
}
