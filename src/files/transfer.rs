//! Transfer Manager for uploads and downloads
//!
//! Transfers run independently of directory state. Each one is registered
//! with a cancellable [`TransferControl`] for its lifetime.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::error::FileError;
use super::path_utils::RemoteDir;
use super::progress::{ProgressFn, UploadCounter};
use super::types::{DownloadedFile, SavedDownload, UploadFile};
use crate::api::FileApi;

/// Transfer control signals
#[derive(Debug)]
pub struct TransferControl {
    cancel_tx: watch::Sender<bool>,
    cancel_rx: watch::Receiver<bool>,
}

impl TransferControl {
    pub fn new() -> Self {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        Self {
            cancel_tx,
            cancel_rx,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel_rx.borrow()
    }

    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }

    /// Get a receiver for waiting on cancellation
    pub fn subscribe_cancellation(&self) -> watch::Receiver<bool> {
        self.cancel_rx.clone()
    }

    /// Resolves once the transfer is cancelled; never resolves otherwise.
    pub async fn cancelled(&self) {
        let mut rx = self.subscribe_cancellation();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

impl Default for TransferControl {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard that unregisters a transfer from [`TransferManager`] on drop,
/// including early returns through `?`.
pub struct TransferGuard<'a> {
    manager: &'a TransferManager,
    transfer_id: String,
}

impl Drop for TransferGuard<'_> {
    fn drop(&mut self) {
        self.manager.unregister(&self.transfer_id);
    }
}

/// The "save as" collaborator for downloaded files
#[async_trait]
pub trait DownloadSink: Send + Sync {
    async fn save(&self, file: DownloadedFile) -> Result<SavedDownload, FileError>;
}

/// Saves downloads into a local directory
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl DownloadSink for DirectorySink {
    async fn save(&self, file: DownloadedFile) -> Result<SavedDownload, FileError> {
        // Only the final component of a server-suggested name is trusted
        let filename = Path::new(&file.filename)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| FileError::InvalidName(file.filename.clone()))?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let location = self.dir.join(&filename);
        tokio::fs::write(&location, &file.data).await?;
        debug!("Saved {} bytes to {:?}", file.data.len(), location);

        Ok(SavedDownload {
            filename,
            location,
            size: file.data.len() as u64,
        })
    }
}

/// Outcome of a multi-file upload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub total: usize,
    pub uploaded: Vec<String>,
    /// Failed file names with error messages
    pub failed: Vec<(String, String)>,
}

impl UploadSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty() && self.uploaded.len() == self.total
    }
}

/// Runs uploads and downloads against the remote
pub struct TransferManager {
    api: Arc<dyn FileApi>,
    sink: Arc<dyn DownloadSink>,
    controls: RwLock<HashMap<String, Arc<TransferControl>>>,
}

impl TransferManager {
    pub fn new(api: Arc<dyn FileApi>, sink: Arc<dyn DownloadSink>) -> Self {
        Self {
            api,
            sink,
            controls: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new transfer and get its control handle
    fn register(&self, label: &str) -> (String, Arc<TransferControl>, TransferGuard<'_>) {
        let transfer_id = uuid::Uuid::new_v4().to_string();
        let control = Arc::new(TransferControl::new());
        self.controls
            .write()
            .insert(transfer_id.clone(), control.clone());
        info!("Registered transfer {} ({})", transfer_id, label);
        let guard = TransferGuard {
            manager: self,
            transfer_id: transfer_id.clone(),
        };
        (transfer_id, control, guard)
    }

    fn unregister(&self, transfer_id: &str) {
        self.controls.write().remove(transfer_id);
        debug!("Unregistered transfer: {}", transfer_id);
    }

    /// IDs of transfers currently in flight
    pub fn active_ids(&self) -> Vec<String> {
        self.controls.read().keys().cloned().collect()
    }

    pub fn active_count(&self) -> usize {
        self.controls.read().len()
    }

    /// Cancel a specific transfer
    pub fn cancel(&self, transfer_id: &str) -> bool {
        if let Some(control) = self.controls.read().get(transfer_id) {
            control.cancel();
            info!("Cancelled transfer: {}", transfer_id);
            true
        } else {
            warn!("Transfer not found for cancel: {}", transfer_id);
            false
        }
    }

    /// Cancel all active transfers
    pub fn cancel_all(&self) {
        let controls = self.controls.read();
        for (id, control) in controls.iter() {
            control.cancel();
            info!("Cancelled transfer: {}", id);
        }
    }

    /// Upload one file into `dir`.
    pub async fn upload(
        &self,
        dir: &RemoteDir,
        file: UploadFile,
        progress: Option<ProgressFn>,
    ) -> Result<(), FileError> {
        let name = file.name.clone();
        let (transfer_id, control, _guard) = self.register(&name);
        info!("Uploading {} ({} bytes) to {}", name, file.size, dir);

        let result = tokio::select! {
            result = self.api.upload_file(dir, file, progress) => result,
            _ = control.cancelled() => Err(FileError::TransferCancelled),
        };

        match &result {
            Ok(()) => info!("Upload {} of {} complete", transfer_id, name),
            Err(e) => warn!("Upload {} of {} failed: {}", transfer_id, name, e),
        }
        result
    }

    /// Upload several files into `dir`, all requests in flight at once.
    ///
    /// No byte progress is reported; completion is tracked by count.
    pub async fn upload_many(&self, dir: &RemoteDir, files: Vec<UploadFile>) -> UploadSummary {
        let counter = UploadCounter::new(files.len());
        let uploads = files.into_iter().map(|file| {
            let counter = &counter;
            async move {
                let name = file.name.clone();
                let result = self.upload(dir, file, None).await;
                if counter.record(result.is_ok()) {
                    debug!(
                        "All {} uploads settled ({} failed)",
                        counter.total(),
                        counter.failed()
                    );
                }
                (name, result)
            }
        });

        let mut summary = UploadSummary {
            total: counter.total(),
            ..Default::default()
        };
        for (name, result) in join_all(uploads).await {
            match result {
                Ok(()) => summary.uploaded.push(name),
                Err(e) => summary.failed.push((name, e.to_string())),
            }
        }
        summary
    }

    /// Fetch the file at `path` and hand it to the download sink.
    pub async fn download(&self, path: &str) -> Result<SavedDownload, FileError> {
        let (transfer_id, control, _guard) = self.register(path);
        info!("Downloading {}", path);

        let file = tokio::select! {
            result = self.api.fetch_file(path) => result?,
            _ = control.cancelled() => return Err(FileError::TransferCancelled),
        };
        let saved = self.sink.save(file).await?;

        info!(
            "Download {} complete: {} ({} bytes)",
            transfer_id, saved.filename, saved.size
        );
        Ok(saved)
    }

    /// Fetch a file's content as text (for the editor).
    pub async fn read_text(&self, path: &str) -> Result<String, FileError> {
        let file = self.api.fetch_file(path).await?;
        Ok(String::from_utf8_lossy(&file.data).into_owned())
    }
}
