//! File manager event system
//!
//! Outbound notifications for collaborators that live outside the core: the
//! URL/history layer, the status toast and the progress bar. The core never
//! reads any of this state back.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::path_utils::RemoteDir;
use super::progress::UploadProgress;
use super::status::StatusMessage;

/// File manager event types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FileManagerEvent {
    /// Current directory changed (push to router/history)
    DirectoryChanged { path: RemoteDir },
    /// A fresh listing was applied for `path`
    ListingUpdated { path: RemoteDir, entries: usize },
    /// Status slot overwritten
    Status { message: StatusMessage },
    /// Visible upload progress changed
    UploadProgress { progress: UploadProgress },
}

/// Receiver of [`FileManagerEvent`]s
pub trait FileEventSink: Send + Sync {
    fn emit(&self, event: FileManagerEvent);
}

/// Sink that drops everything (headless use, tests)
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl FileEventSink for NoopEventSink {
    fn emit(&self, _event: FileManagerEvent) {}
}

impl FileEventSink for mpsc::UnboundedSender<FileManagerEvent> {
    fn emit(&self, event: FileManagerEvent) {
        if let Err(e) = self.send(event) {
            tracing::warn!("Failed to emit file manager event: {:?}", e.0);
        }
    }
}
