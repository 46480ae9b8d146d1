//! Batch operations over the current selection
//!
//! Archive and unarchive are one call each and succeed or fail as a whole.
//! Delete walks the selection strictly in order, one awaited call per entry,
//! and keeps going after a failure. Download-many skips folders.

use futures_util::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::error::FileError;
use super::path_utils::RemoteDir;
use super::transfer::TransferManager;
use super::types::Entry;
use crate::api::FileApi;

/// Per-entry outcome of a batch operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    pub success: Vec<String>,
    /// Names with the reason they failed
    pub failed: Vec<(String, String)>,
    /// Names the operation does not apply to (folders in a download)
    pub skipped: Vec<String>,
}

impl BatchResult {
    /// Every name succeeded or was skipped.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    fn all_or_nothing(names: &[String], result: Result<(), FileError>) -> Self {
        match result {
            Ok(()) => Self {
                success: names.to_vec(),
                ..Default::default()
            },
            Err(e) => {
                let reason = e.to_string();
                Self {
                    failed: names.iter().map(|n| (n.clone(), reason.clone())).collect(),
                    ..Default::default()
                }
            }
        }
    }
}

/// Runs batch operations against a directory
pub struct BatchExecutor<'a> {
    api: &'a dyn FileApi,
    transfers: &'a TransferManager,
}

impl<'a> BatchExecutor<'a> {
    pub fn new(api: &'a dyn FileApi, transfers: &'a TransferManager) -> Self {
        Self { api, transfers }
    }

    pub async fn archive(&self, dir: &RemoteDir, names: &[String]) -> BatchResult {
        info!("Archiving {} entries in {}", names.len(), dir);
        let result = self.api.archive(dir, names).await;
        if let Err(e) = &result {
            warn!("Archive in {} failed: {}", dir, e);
        }
        BatchResult::all_or_nothing(names, result)
    }

    pub async fn unarchive(&self, dir: &RemoteDir, names: &[String]) -> BatchResult {
        info!("Extracting {} entries in {}", names.len(), dir);
        let result = self.api.unarchive(dir, names).await;
        if let Err(e) = &result {
            warn!("Unarchive in {} failed: {}", dir, e);
        }
        BatchResult::all_or_nothing(names, result)
    }

    /// Delete `names` one at a time, in order. `listing` decides whether each
    /// name is a file or a folder.
    pub async fn delete(&self, dir: &RemoteDir, names: &[String], listing: &[Entry]) -> BatchResult {
        let mut result = BatchResult::default();

        for name in names {
            let outcome = match find_entry(listing, name) {
                Ok(entry) => {
                    let path = dir.entry_path(&entry.name);
                    debug!("Deleting {} (folder: {})", path, entry.is_folder);
                    if entry.is_folder {
                        self.api.delete_folder(&path).await
                    } else {
                        self.api.delete_file(&path).await
                    }
                }
                Err(e) => Err(e),
            };

            match outcome {
                Ok(()) => result.success.push(name.clone()),
                Err(e) => {
                    warn!("Failed to delete {} in {}: {}", name, dir, e);
                    result.failed.push((name.clone(), e.to_string()));
                }
            }
        }

        info!(
            "Deleted {}/{} entries in {}",
            result.success.len(),
            names.len(),
            dir
        );
        result
    }

    /// Download every selected file independently; folders are skipped.
    pub async fn download(&self, dir: &RemoteDir, names: &[String], listing: &[Entry]) -> BatchResult {
        let mut result = BatchResult::default();
        let mut files = Vec::new();

        for name in names {
            match find_entry(listing, name) {
                Ok(entry) if entry.is_folder => result.skipped.push(name.clone()),
                Ok(entry) => files.push(entry.name.clone()),
                Err(e) => result.failed.push((name.clone(), e.to_string())),
            }
        }

        let downloads = files.iter().map(|name| {
            let path = dir.entry_path(name);
            async move { (name, self.transfers.download(&path).await) }
        });

        for (name, outcome) in join_all(downloads).await {
            match outcome {
                Ok(_) => result.success.push(name.clone()),
                Err(e) => {
                    warn!("Failed to download {} from {}: {}", name, dir, e);
                    result.failed.push((name.clone(), e.to_string()));
                }
            }
        }

        if !result.skipped.is_empty() {
            debug!("Skipped {} folders in download", result.skipped.len());
        }
        result
    }
}

fn find_entry<'e>(listing: &'e [Entry], name: &str) -> Result<&'e Entry, FileError> {
    listing
        .iter()
        .find(|e| e.name == name)
        .ok_or_else(|| FileError::EntryNotFound(name.to_string()))
}
