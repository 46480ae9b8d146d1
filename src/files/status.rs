//! Status messages
//!
//! One slot, last write wins. Messages carry a stable i18n key; the English
//! text from `Display` is only a fallback.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusMessage {
    Archiving,
    Archived,
    ArchiveFailed,
    Unarchiving,
    Unarchived,
    UnarchiveFailed,
    Deleting,
    Deleted,
    DeleteFailed,
    Downloaded,
    DownloadFailed,
    FileUploaded,
    UploadingMultiple,
    FilesUploaded,
    UploadFailed,
    Renamed,
    RenameFailed,
    FolderCreated,
    FolderCreateFailed,
    FileCreated,
    CreateFailed,
    FileSaved,
    SaveFailed,
}

impl StatusMessage {
    /// Translation key
    pub fn key(&self) -> &'static str {
        match self {
            StatusMessage::Archiving => "files.archiving",
            StatusMessage::Archived => "files.archived",
            StatusMessage::ArchiveFailed => "files.archive_failed",
            StatusMessage::Unarchiving => "files.unarchiving",
            StatusMessage::Unarchived => "files.unarchived",
            StatusMessage::UnarchiveFailed => "files.unarchive_failed",
            StatusMessage::Deleting => "files.deleting",
            StatusMessage::Deleted => "files.deleted",
            StatusMessage::DeleteFailed => "files.delete_failed",
            StatusMessage::Downloaded => "files.downloaded",
            StatusMessage::DownloadFailed => "files.download_failed",
            StatusMessage::FileUploaded => "files.file_uploaded",
            StatusMessage::UploadingMultiple => "files.uploading_multiple",
            StatusMessage::FilesUploaded => "files.files_uploaded",
            StatusMessage::UploadFailed => "files.upload_failed",
            StatusMessage::Renamed => "files.renamed",
            StatusMessage::RenameFailed => "files.rename_failed",
            StatusMessage::FolderCreated => "files.create_folder.created",
            StatusMessage::FolderCreateFailed => "files.create_folder.failed",
            StatusMessage::FileCreated => "files.file_created",
            StatusMessage::CreateFailed => "files.create_failed",
            StatusMessage::FileSaved => "files.file_saved",
            StatusMessage::SaveFailed => "files.save_failed",
        }
    }

    /// Whether this reports a failed operation
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            StatusMessage::ArchiveFailed
                | StatusMessage::UnarchiveFailed
                | StatusMessage::DeleteFailed
                | StatusMessage::DownloadFailed
                | StatusMessage::UploadFailed
                | StatusMessage::RenameFailed
                | StatusMessage::FolderCreateFailed
                | StatusMessage::CreateFailed
                | StatusMessage::SaveFailed
        )
    }

    /// Whether this announces an operation that has not finished yet
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            StatusMessage::Archiving
                | StatusMessage::Unarchiving
                | StatusMessage::Deleting
                | StatusMessage::UploadingMultiple
        )
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StatusMessage::Archiving => "Archiving files...",
            StatusMessage::Archived => "Files archived",
            StatusMessage::ArchiveFailed => "Failed to archive files",
            StatusMessage::Unarchiving => "Extracting archives...",
            StatusMessage::Unarchived => "Archives extracted",
            StatusMessage::UnarchiveFailed => "Failed to extract archives",
            StatusMessage::Deleting => "Deleting files...",
            StatusMessage::Deleted => "Files deleted",
            StatusMessage::DeleteFailed => "Failed to delete files",
            StatusMessage::Downloaded => "Download finished",
            StatusMessage::DownloadFailed => "Download failed",
            StatusMessage::FileUploaded => "File uploaded",
            StatusMessage::UploadingMultiple => "Uploading files...",
            StatusMessage::FilesUploaded => "Files uploaded",
            StatusMessage::UploadFailed => "Upload failed",
            StatusMessage::Renamed => "Renamed",
            StatusMessage::RenameFailed => "Failed to rename",
            StatusMessage::FolderCreated => "Folder created",
            StatusMessage::FolderCreateFailed => "Failed to create folder",
            StatusMessage::FileCreated => "File created",
            StatusMessage::CreateFailed => "Failed to create file",
            StatusMessage::FileSaved => "File saved",
            StatusMessage::SaveFailed => "Failed to save file",
        };
        f.write_str(text)
    }
}

/// The single status slot; a new message replaces the old one.
#[derive(Debug, Clone)]
pub struct StatusSlot {
    current: Option<(StatusMessage, Instant)>,
    display_for: Duration,
}

impl StatusSlot {
    pub fn new(display_for: Duration) -> Self {
        Self {
            current: None,
            display_for,
        }
    }

    pub fn post(&mut self, message: StatusMessage) {
        self.current = Some((message, Instant::now()));
    }

    /// Last posted message, whether or not it has expired.
    pub fn last(&self) -> Option<StatusMessage> {
        self.current.map(|(message, _)| message)
    }

    /// Message still within its display window.
    pub fn visible(&self) -> Option<StatusMessage> {
        self.current
            .filter(|(_, posted)| posted.elapsed() < self.display_for)
            .map(|(message, _)| message)
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }
}
