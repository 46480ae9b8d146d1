//! In-memory test doubles for the remote API and the outbound collaborators.
//!
//! [`MockApi`] keeps per-directory listings and applies mutations to them so a
//! refresh after a successful operation observes the change. Calls are
//! recorded in order. Individual operations can be made to fail, and
//! listings or uploads can be held back behind a [`Notify`] gate to stage
//! races.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::Notify;

use super::error::FileError;
use super::events::{FileEventSink, FileManagerEvent};
use super::path_utils::RemoteDir;
use super::progress::ProgressFn;
use super::status::StatusMessage;
use super::transfer::DownloadSink;
use super::types::{DownloadedFile, Entry, SavedDownload, UploadFile, UploadSource};
use crate::api::FileApi;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    ListFolder(String),
    Archive(String, Vec<String>),
    Unarchive(String, Vec<String>),
    DeleteFile(String),
    DeleteFolder(String),
    Rename {
        path: String,
        is_folder: bool,
        new_name: String,
    },
    WriteFile {
        path: String,
        content: String,
    },
    CreateFolder(String),
    Upload(String, String),
    FetchFile(String),
}

#[derive(Default)]
struct MockState {
    calls: Vec<ApiCall>,
    listings: HashMap<String, Vec<Entry>>,
    files: HashMap<String, DownloadedFile>,
    failing: HashSet<String>,
    gates: HashMap<String, Arc<Notify>>,
}

#[derive(Default)]
pub struct MockApi {
    state: Mutex<MockState>,
}

fn split_path(path: &str) -> (String, String) {
    match path.rsplit_once('/') {
        Some((parent, name)) => (RemoteDir::parse(parent).as_str().to_string(), name.to_string()),
        None => (RemoteDir::root().as_str().to_string(), path.to_string()),
    }
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_listing(&self, dir: &str, entries: Vec<Entry>) {
        self.state
            .lock()
            .listings
            .insert(RemoteDir::parse(dir).as_str().to_string(), entries);
    }

    /// Serve `content` for `path` with a server-suggested `filename`.
    pub fn set_file(&self, path: &str, filename: &str, content: &str) {
        self.state.lock().files.insert(
            path.to_string(),
            DownloadedFile {
                filename: filename.to_string(),
                data: Bytes::from(content.to_string()),
            },
        );
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.state.lock().calls.clone()
    }

    /// Mutating calls only (no listings or fetches)
    pub fn mutations(&self) -> Vec<ApiCall> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, ApiCall::ListFolder(_) | ApiCall::FetchFile(_)))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    fn fail(&self, key: String) {
        self.state.lock().failing.insert(key);
    }

    pub fn fail_archive(&self) {
        self.fail("archive".to_string());
    }

    pub fn fail_unarchive(&self) {
        self.fail("unarchive".to_string());
    }

    pub fn fail_delete(&self, path: &str) {
        self.fail(format!("delete:{path}"));
    }

    pub fn fail_rename(&self, path: &str) {
        self.fail(format!("rename:{path}"));
    }

    pub fn fail_write(&self, path: &str) {
        self.fail(format!("write:{path}"));
    }

    pub fn fail_create_folder(&self, path: &str) {
        self.fail(format!("mkdir:{path}"));
    }

    pub fn fail_upload(&self, name: &str) {
        self.fail(format!("upload:{name}"));
    }

    fn gate(&self, key: String) -> Arc<Notify> {
        self.state
            .lock()
            .gates
            .entry(key)
            .or_insert_with(|| Arc::new(Notify::new()))
            .clone()
    }

    /// Hold listings of `dir` until the returned handle is notified.
    pub fn gate_listing(&self, dir: &str) -> Arc<Notify> {
        self.gate(format!("list:{}", RemoteDir::parse(dir).as_str()))
    }

    /// Hold uploads of `name` until the returned handle is notified.
    pub fn gate_upload(&self, name: &str) -> Arc<Notify> {
        self.gate(format!("upload:{name}"))
    }

    fn record(&self, call: ApiCall) {
        self.state.lock().calls.push(call);
    }

    fn check(&self, key: &str, status: u16) -> Result<(), FileError> {
        if self.state.lock().failing.contains(key) {
            Err(FileError::Http(status))
        } else {
            Ok(())
        }
    }

    /// Gates are one-shot: only the first matching call waits.
    async fn wait_gate(&self, key: &str) {
        let gate = self.state.lock().gates.remove(key);
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    fn with_listing<F: FnOnce(&mut Vec<Entry>)>(&self, dir: &str, f: F) {
        if let Some(entries) = self.state.lock().listings.get_mut(dir) {
            f(entries);
        }
    }
}

#[async_trait]
impl FileApi for MockApi {
    async fn list_folder(&self, dir: &RemoteDir) -> Result<Vec<Entry>, FileError> {
        self.record(ApiCall::ListFolder(dir.as_str().to_string()));
        self.wait_gate(&format!("list:{}", dir.as_str())).await;
        self.state
            .lock()
            .listings
            .get(dir.as_str())
            .cloned()
            .ok_or(FileError::Http(404))
    }

    async fn archive(&self, dir: &RemoteDir, names: &[String]) -> Result<(), FileError> {
        self.record(ApiCall::Archive(dir.as_str().to_string(), names.to_vec()));
        self.check("archive", 500)?;
        self.with_listing(dir.as_str(), |entries| {
            entries.push(Entry::file("archive.zip", 1));
        });
        Ok(())
    }

    async fn unarchive(&self, dir: &RemoteDir, names: &[String]) -> Result<(), FileError> {
        self.record(ApiCall::Unarchive(dir.as_str().to_string(), names.to_vec()));
        self.check("unarchive", 500)
    }

    async fn delete_file(&self, path: &str) -> Result<(), FileError> {
        self.record(ApiCall::DeleteFile(path.to_string()));
        self.check(&format!("delete:{path}"), 500)?;
        let (parent, name) = split_path(path);
        self.with_listing(&parent, |entries| entries.retain(|e| e.name != name));
        Ok(())
    }

    async fn delete_folder(&self, path: &str) -> Result<(), FileError> {
        self.record(ApiCall::DeleteFolder(path.to_string()));
        self.check(&format!("delete:{path}"), 500)?;
        let (parent, name) = split_path(path);
        self.with_listing(&parent, |entries| entries.retain(|e| e.name != name));
        Ok(())
    }

    async fn rename(&self, path: &str, is_folder: bool, new_name: &str) -> Result<(), FileError> {
        self.record(ApiCall::Rename {
            path: path.to_string(),
            is_folder,
            new_name: new_name.to_string(),
        });
        self.check(&format!("rename:{path}"), 500)?;
        let (parent, name) = split_path(path);
        self.with_listing(&parent, |entries| {
            if let Some(entry) = entries.iter_mut().find(|e| e.name == name) {
                entry.name = new_name.to_string();
            }
        });
        Ok(())
    }

    async fn write_file(&self, path: &str, content: &str) -> Result<(), FileError> {
        self.record(ApiCall::WriteFile {
            path: path.to_string(),
            content: content.to_string(),
        });
        self.check(&format!("write:{path}"), 500)?;
        let (parent, name) = split_path(path);
        self.with_listing(&parent, |entries| {
            entries.retain(|e| e.name != name);
            entries.push(Entry::file(name.clone(), content.len() as u64));
        });
        self.state.lock().files.insert(
            path.to_string(),
            DownloadedFile {
                filename: name,
                data: Bytes::from(content.to_string()),
            },
        );
        Ok(())
    }

    async fn create_folder(&self, path: &str) -> Result<(), FileError> {
        self.record(ApiCall::CreateFolder(path.to_string()));
        self.check(&format!("mkdir:{path}"), 500)?;
        let (parent, name) = split_path(path);
        self.with_listing(&parent, |entries| entries.push(Entry::folder(name)));
        self.state
            .lock()
            .listings
            .entry(RemoteDir::parse(path).as_str().to_string())
            .or_default();
        Ok(())
    }

    async fn upload_file(
        &self,
        dir: &RemoteDir,
        file: UploadFile,
        progress: Option<ProgressFn>,
    ) -> Result<(), FileError> {
        self.record(ApiCall::Upload(dir.as_str().to_string(), file.name.clone()));
        self.wait_gate(&format!("upload:{}", file.name)).await;
        self.check(&format!("upload:{}", file.name), 500)?;

        let data = match &file.source {
            UploadSource::Memory(data) => data.clone(),
            UploadSource::Disk(path) => Bytes::from(tokio::fs::read(path).await?),
        };
        if let Some(progress) = progress {
            let total = data.len() as u64;
            let half = total / 2;
            progress(half, total);
            progress(total, total);
        }
        self.with_listing(dir.as_str(), |entries| {
            entries.push(Entry::file(file.name.clone(), file.size));
        });
        self.state.lock().files.insert(
            dir.entry_path(&file.name),
            DownloadedFile {
                filename: file.name.clone(),
                data,
            },
        );
        Ok(())
    }

    async fn fetch_file(&self, path: &str) -> Result<DownloadedFile, FileError> {
        self.record(ApiCall::FetchFile(path.to_string()));
        self.state
            .lock()
            .files
            .get(path)
            .cloned()
            .ok_or(FileError::Http(404))
    }
}

/// Download sink that keeps files in memory
#[derive(Default)]
pub struct MemorySink {
    files: Mutex<Vec<DownloadedFile>>,
}

impl MemorySink {
    /// Filenames saved so far, in order
    pub fn saved(&self) -> Vec<String> {
        self.files.lock().iter().map(|f| f.filename.clone()).collect()
    }
}

#[async_trait]
impl DownloadSink for MemorySink {
    async fn save(&self, file: DownloadedFile) -> Result<SavedDownload, FileError> {
        let saved = SavedDownload {
            filename: file.filename.clone(),
            location: PathBuf::from(&file.filename),
            size: file.data.len() as u64,
        };
        self.files.lock().push(file);
        Ok(saved)
    }
}

/// Event sink that records everything it receives
#[derive(Default)]
pub struct RecordingEvents {
    events: Mutex<Vec<FileManagerEvent>>,
}

impl RecordingEvents {
    pub fn events(&self) -> Vec<FileManagerEvent> {
        self.events.lock().clone()
    }

    pub fn statuses(&self) -> Vec<StatusMessage> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                FileManagerEvent::Status { message } => Some(*message),
                _ => None,
            })
            .collect()
    }

    pub fn directories(&self) -> Vec<RemoteDir> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                FileManagerEvent::DirectoryChanged { path } => Some(path.clone()),
                _ => None,
            })
            .collect()
    }
}

impl FileEventSink for RecordingEvents {
    fn emit(&self, event: FileManagerEvent) {
        self.events.lock().push(event);
    }
}
