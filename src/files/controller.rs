//! Directory Controller
//!
//! Owns the current path, listing, selection, open file, upload progress and
//! the status slot. Everything else reaches that state through the methods
//! here. State lives behind a synchronous lock that is never held across an
//! await; every remote call happens with the lock released and its result is
//! applied afterwards.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::batch::{BatchExecutor, BatchResult};
use super::error::FileError;
use super::events::{FileEventSink, FileManagerEvent};
use super::listing::{fetch_listing, ListingSequencer, ListingTicket};
use super::path_utils::{Breadcrumb, RemoteDir};
use super::progress::{ProgressFn, UploadProgress};
use super::selection::{Selection, SelectionInput};
use super::status::{StatusMessage, StatusSlot};
use super::transfer::{DownloadSink, TransferManager, UploadSummary};
use super::types::{constants, ActivateModifiers, Activation, Entry, SavedDownload, UploadFile};
use crate::api::FileApi;
use crate::config::ClientConfig;

/// Tunables for the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    /// Files strictly larger than this are downloaded instead of opened
    pub large_file_threshold: u64,
    pub status_display: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            large_file_threshold: constants::LARGE_FILE_THRESHOLD,
            status_display: constants::STATUS_DISPLAY,
        }
    }
}

impl From<&ClientConfig> for ControllerOptions {
    fn from(config: &ClientConfig) -> Self {
        Self {
            large_file_threshold: config.large_file_threshold,
            status_display: config.status_display(),
        }
    }
}

#[derive(Debug, Clone)]
struct ControllerState {
    path: RemoteDir,
    listing: Vec<Entry>,
    selection: Selection,
    open_file: Option<Entry>,
    progress: UploadProgress,
    status: StatusSlot,
}

/// Read-only view of the controller, for rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControllerSnapshot {
    pub path: RemoteDir,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub listing: Vec<Entry>,
    pub selected: Vec<String>,
    pub selection_mode: bool,
    pub all_selected: bool,
    pub open_file: Option<Entry>,
    pub progress: UploadProgress,
    pub status: Option<StatusMessage>,
}

pub struct DirectoryController {
    api: Arc<dyn FileApi>,
    transfers: Arc<TransferManager>,
    events: Arc<dyn FileEventSink>,
    sequencer: ListingSequencer,
    state: Arc<RwLock<ControllerState>>,
    options: ControllerOptions,
}

impl DirectoryController {
    pub fn new(
        api: Arc<dyn FileApi>,
        sink: Arc<dyn DownloadSink>,
        events: Arc<dyn FileEventSink>,
        options: ControllerOptions,
    ) -> Self {
        let transfers = Arc::new(TransferManager::new(api.clone(), sink));
        Self {
            api,
            transfers,
            events,
            sequencer: ListingSequencer::new(),
            state: Arc::new(RwLock::new(ControllerState {
                path: RemoteDir::root(),
                listing: Vec::new(),
                selection: Selection::new(),
                open_file: None,
                progress: UploadProgress::idle(),
                status: StatusSlot::new(options.status_display),
            })),
            options,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // State accessors
    // ═══════════════════════════════════════════════════════════════════════

    pub fn path(&self) -> RemoteDir {
        self.state.read().path.clone()
    }

    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        self.state.read().path.breadcrumbs()
    }

    pub fn listing(&self) -> Vec<Entry> {
        self.state.read().listing.clone()
    }

    pub fn selection(&self) -> Selection {
        self.state.read().selection.clone()
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.state.read().selection.is_selected(name)
    }

    pub fn selection_mode(&self) -> bool {
        self.state.read().selection.is_active()
    }

    /// Every listed entry is selected (false for an empty listing).
    pub fn all_selected(&self) -> bool {
        let state = self.state.read();
        !state.listing.is_empty() && state.selection.all_selected(&state.listing)
    }

    pub fn open_file(&self) -> Option<Entry> {
        self.state.read().open_file.clone()
    }

    pub fn progress(&self) -> UploadProgress {
        self.state.read().progress
    }

    /// Status message still within its display window
    pub fn status(&self) -> Option<StatusMessage> {
        self.state.read().status.visible()
    }

    /// Last status message posted, expired or not
    pub fn last_status(&self) -> Option<StatusMessage> {
        self.state.read().status.last()
    }

    pub fn dismiss_status(&self) {
        self.state.write().status.dismiss();
    }

    pub fn transfers(&self) -> &Arc<TransferManager> {
        &self.transfers
    }

    pub fn options(&self) -> ControllerOptions {
        self.options
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        let state = self.state.read();
        ControllerSnapshot {
            path: state.path.clone(),
            breadcrumbs: state.path.breadcrumbs(),
            listing: state.listing.clone(),
            selected: state.selection.names().to_vec(),
            selection_mode: state.selection.is_active(),
            all_selected: !state.listing.is_empty()
                && state.selection.all_selected(&state.listing),
            open_file: state.open_file.clone(),
            progress: state.progress,
            status: state.status.visible(),
        }
    }

    fn post_status(&self, message: StatusMessage) {
        self.state.write().status.post(message);
        debug!("Status: {}", message.key());
        self.events.emit(FileManagerEvent::Status { message });
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Navigation and listing
    // ═══════════════════════════════════════════════════════════════════════

    /// Move to `dir` and fetch its listing.
    ///
    /// The open file, the old listing and the selection are dropped in the same
    /// step that changes the path.
    pub async fn change_directory(&self, dir: RemoteDir) {
        self.enter(dir);
        self.refresh().await;
    }

    /// Enter the folder `name` of the current directory.
    pub async fn navigate_into(&self, name: &str) -> RemoteDir {
        let dir = self.path().descend(name);
        self.change_directory(dir.clone()).await;
        dir
    }

    /// Go to the parent directory. Returns `false` at the root.
    pub async fn go_up(&self) -> bool {
        let current = self.path();
        if current.is_root() {
            return false;
        }
        self.change_directory(current.ascend()).await;
        true
    }

    /// Jump to an ancestor picked from the breadcrumb trail.
    pub async fn jump_to(&self, crumb: &Breadcrumb) {
        self.change_directory(crumb.path.clone()).await;
    }

    /// Back to the root with nothing open, selected or showing.
    pub async fn reset(&self) {
        {
            let mut state = self.state.write();
            state.progress = UploadProgress::idle();
            state.status.dismiss();
        }
        self.change_directory(RemoteDir::root()).await;
    }

    fn enter(&self, dir: RemoteDir) {
        {
            let mut state = self.state.write();
            state.path = dir.clone();
            state.listing.clear();
            state.selection.apply(SelectionInput::Reset);
            state.open_file = None;
        }
        info!("Changed directory to {}", dir);
        self.events
            .emit(FileManagerEvent::DirectoryChanged { path: dir });
    }

    /// Re-fetch the listing of the current directory.
    ///
    /// A failed fetch moves one level up and tries again until a listing loads
    /// or the root itself fails. Results that arrive after a newer fetch was
    /// started are discarded.
    pub async fn refresh(&self) {
        let mut ticket = {
            let state = self.state.read();
            self.sequencer.issue(state.path.clone())
        };

        loop {
            match fetch_listing(self.api.as_ref(), &ticket.dir).await {
                Ok(entries) => {
                    self.apply_listing(&ticket, entries);
                    return;
                }
                Err(e) => {
                    if !self.sequencer.is_current(&ticket) {
                        debug!("Ignoring failed stale listing of {}: {}", ticket.dir, e);
                        return;
                    }
                    if ticket.dir.is_root() {
                        warn!("Listing of root failed: {}", e);
                        return;
                    }
                    let parent = ticket.dir.ascend();
                    warn!(
                        "Listing of {} failed ({}), moving up to {}",
                        ticket.dir, e, parent
                    );
                    match self.recover_to(&ticket, parent) {
                        Some(next) => ticket = next,
                        None => return,
                    }
                }
            }
        }
    }

    /// Apply a fetched listing if it is still wanted.
    fn apply_listing(&self, ticket: &ListingTicket, entries: Vec<Entry>) -> bool {
        let count = entries.len();
        {
            let mut state = self.state.write();
            if !self.sequencer.is_current(ticket) || state.path != ticket.dir {
                debug!(
                    "Discarding stale listing of {} (generation {})",
                    ticket.dir, ticket.generation
                );
                return false;
            }
            state.listing = entries;
            let ControllerState {
                listing, selection, ..
            } = &mut *state;
            selection.apply(SelectionInput::Retain(listing.as_slice()));
        }
        self.events.emit(FileManagerEvent::ListingUpdated {
            path: ticket.dir.clone(),
            entries: count,
        });
        true
    }

    /// Move to `parent` after a failed fetch, unless a newer fetch has taken
    /// over in the meantime. Returns the ticket for the retry.
    fn recover_to(&self, ticket: &ListingTicket, parent: RemoteDir) -> Option<ListingTicket> {
        let next = {
            let mut state = self.state.write();
            if !self.sequencer.is_current(ticket) || state.path != ticket.dir {
                return None;
            }
            state.path = parent.clone();
            state.listing.clear();
            state.selection.apply(SelectionInput::Reset);
            state.open_file = None;
            self.sequencer.issue(parent.clone())
        };
        self.events
            .emit(FileManagerEvent::DirectoryChanged { path: parent });
        Some(next)
    }

    /// Click / enter on an entry.
    ///
    /// While selecting (modifier held or selection mode on) this only toggles
    /// the entry. Otherwise folders are entered, large files downloaded and
    /// everything else opened in the editor.
    pub async fn handle_activate(
        &self,
        entry: &Entry,
        modifiers: ActivateModifiers,
    ) -> Result<Activation, FileError> {
        if modifiers.selecting || self.selection_mode() {
            let selected = self.toggle_selection(&entry.name);
            return Ok(Activation::Toggled { selected });
        }

        if entry.is_folder {
            let dir = self.navigate_into(&entry.name).await;
            return Ok(Activation::Navigated(dir));
        }

        if entry.size > self.options.large_file_threshold {
            debug!(
                "{} is {} bytes, downloading instead of opening",
                entry.name, entry.size
            );
            let saved = self.download(&entry.name).await?;
            return Ok(Activation::Downloaded(saved));
        }

        self.state.write().open_file = Some(entry.clone());
        debug!("Opened {}", entry.name);
        Ok(Activation::Opened(entry.clone()))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Selection
    // ═══════════════════════════════════════════════════════════════════════

    /// Toggle `name`, entering selection mode if it was off. Returns whether
    /// the name ends up selected. Names missing from the listing are ignored.
    pub fn toggle_selection(&self, name: &str) -> bool {
        let mut state = self.state.write();
        if !state.listing.iter().any(|e| e.name == name) {
            debug!("Ignoring selection of unlisted entry {}", name);
            return false;
        }
        state.selection.toggle(name)
    }

    pub fn set_selection_mode(&self, on: bool) {
        self.state.write().selection.set_mode(on);
    }

    /// Select every listed entry, or clear when all are selected already.
    pub fn toggle_select_all(&self) {
        let mut state = self.state.write();
        let ControllerState {
            listing, selection, ..
        } = &mut *state;
        selection.apply(SelectionInput::ToggleAll(listing.as_slice()));
    }

    pub fn clear_selection(&self) {
        self.state.write().selection.clear();
    }

    /// Clear the selection and leave selection mode.
    pub fn exit_selection(&self) {
        self.state.write().selection.reset();
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Batch operations
    // ═══════════════════════════════════════════════════════════════════════

    /// Snapshot what a batch operation works on. `None` when nothing is
    /// selected.
    fn batch_targets(&self) -> Option<(RemoteDir, Vec<String>, Vec<Entry>)> {
        let state = self.state.read();
        if state.selection.is_empty() {
            return None;
        }
        Some((
            state.path.clone(),
            state.selection.names().to_vec(),
            state.listing.clone(),
        ))
    }

    /// Post the outcome; on success also clear the selection and refresh,
    /// provided the user is still in the directory the batch ran in.
    async fn finish_batch(
        &self,
        dir: &RemoteDir,
        result: BatchResult,
        done: StatusMessage,
        failed: StatusMessage,
    ) -> BatchResult {
        if !result.is_success() {
            self.post_status(failed);
            return result;
        }

        self.post_status(done);
        let still_here = {
            let mut state = self.state.write();
            if &state.path == dir {
                state.selection.reset();
                true
            } else {
                false
            }
        };
        if still_here {
            self.refresh().await;
        }
        result
    }

    /// Zip the selection in place.
    pub async fn archive_selected(&self) -> Option<BatchResult> {
        let (dir, names, _) = self.batch_targets()?;
        self.post_status(StatusMessage::Archiving);
        let result = BatchExecutor::new(self.api.as_ref(), &self.transfers)
            .archive(&dir, &names)
            .await;
        Some(
            self.finish_batch(&dir, result, StatusMessage::Archived, StatusMessage::ArchiveFailed)
                .await,
        )
    }

    /// Extract the selected archives in place.
    pub async fn unarchive_selected(&self) -> Option<BatchResult> {
        let (dir, names, _) = self.batch_targets()?;
        self.post_status(StatusMessage::Unarchiving);
        let result = BatchExecutor::new(self.api.as_ref(), &self.transfers)
            .unarchive(&dir, &names)
            .await;
        Some(
            self.finish_batch(
                &dir,
                result,
                StatusMessage::Unarchived,
                StatusMessage::UnarchiveFailed,
            )
            .await,
        )
    }

    /// Delete the selection, one entry at a time in selection order.
    pub async fn delete_selected(&self) -> Option<BatchResult> {
        let (dir, names, listing) = self.batch_targets()?;
        self.post_status(StatusMessage::Deleting);
        let result = BatchExecutor::new(self.api.as_ref(), &self.transfers)
            .delete(&dir, &names, &listing)
            .await;
        Some(
            self.finish_batch(&dir, result, StatusMessage::Deleted, StatusMessage::DeleteFailed)
                .await,
        )
    }

    /// Download every selected file; selected folders are skipped.
    pub async fn download_selected(&self) -> Option<BatchResult> {
        let (dir, names, listing) = self.batch_targets()?;
        let result = BatchExecutor::new(self.api.as_ref(), &self.transfers)
            .download(&dir, &names, &listing)
            .await;
        Some(
            self.finish_batch(
                &dir,
                result,
                StatusMessage::Downloaded,
                StatusMessage::DownloadFailed,
            )
            .await,
        )
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Single-entry mutations
    // ═══════════════════════════════════════════════════════════════════════

    /// Rename `entry` in the current directory.
    ///
    /// Returns `Ok(false)` without contacting the server when `new_name` is
    /// blank or unchanged. On success the entry is renamed in the listing
    /// (and selection) in place; no refetch happens.
    pub async fn rename(&self, entry: &Entry, new_name: &str) -> Result<bool, FileError> {
        let new_name = new_name.trim();
        if new_name.is_empty() || new_name == entry.name {
            return Ok(false);
        }
        if let Err(e) = validate_name(new_name) {
            self.post_status(StatusMessage::RenameFailed);
            return Err(e);
        }

        let dir = {
            let state = self.state.read();
            if state.listing.iter().any(|e| e.name == new_name) {
                drop(state);
                warn!("Not renaming {}: {} already exists", entry.name, new_name);
                self.post_status(StatusMessage::RenameFailed);
                return Err(FileError::InvalidName(format!("{new_name} already exists")));
            }
            state.path.clone()
        };
        let path = dir.entry_path(&entry.name);
        if let Err(e) = self.api.rename(&path, entry.is_folder, new_name).await {
            warn!("Failed to rename {} to {}: {}", path, new_name, e);
            self.post_status(StatusMessage::RenameFailed);
            return Err(e);
        }

        {
            let mut state = self.state.write();
            if state.path == dir {
                // Names stay unique: a listed entry the rename overwrote is gone
                state.listing.retain(|e| e.name != new_name);
                if let Some(listed) = state.listing.iter_mut().find(|e| e.name == entry.name) {
                    listed.name = new_name.to_string();
                }
                let was_selected = state.selection.is_selected(&entry.name);
                if was_selected {
                    state.selection.apply(SelectionInput::Toggle(&entry.name));
                }
                if was_selected != state.selection.is_selected(new_name) {
                    state.selection.apply(SelectionInput::Toggle(new_name));
                }
            }
        }
        info!("Renamed {} to {}", path, new_name);
        self.post_status(StatusMessage::Renamed);
        Ok(true)
    }

    /// Create folder `name` in the current directory and refresh.
    /// Returns `Ok(false)` for a blank name.
    pub async fn create_folder(&self, name: &str) -> Result<bool, FileError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(false);
        }
        if let Err(e) = validate_name(name) {
            self.post_status(StatusMessage::FolderCreateFailed);
            return Err(e);
        }

        let path = self.path().entry_path(name);
        match self.api.create_folder(&path).await {
            Ok(()) => {
                info!("Created folder {}", path);
                self.post_status(StatusMessage::FolderCreated);
                self.refresh().await;
                Ok(true)
            }
            Err(e) => {
                warn!("Failed to create folder {}: {}", path, e);
                self.post_status(StatusMessage::FolderCreateFailed);
                Err(e)
            }
        }
    }

    /// Create file `name` with `content` in the current directory and refresh.
    /// Returns `Ok(false)` for a blank name.
    pub async fn create_file(&self, name: &str, content: &str) -> Result<bool, FileError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(false);
        }
        if let Err(e) = validate_name(name) {
            self.post_status(StatusMessage::CreateFailed);
            return Err(e);
        }

        let path = self.path().entry_path(name);
        match self.api.write_file(&path, content).await {
            Ok(()) => {
                info!("Created file {}", path);
                self.post_status(StatusMessage::FileCreated);
                self.refresh().await;
                Ok(true)
            }
            Err(e) => {
                warn!("Failed to create file {}: {}", path, e);
                self.post_status(StatusMessage::CreateFailed);
                Err(e)
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Transfers
    // ═══════════════════════════════════════════════════════════════════════

    /// Upload `files` into the current directory.
    ///
    /// A single file reports live progress. Several files are sent all at once
    /// without byte progress and settle with one status message.
    pub async fn upload(&self, files: Vec<UploadFile>) -> UploadSummary {
        if files.is_empty() {
            return UploadSummary::default();
        }
        let dir = self.path();
        match <[UploadFile; 1]>::try_from(files) {
            Ok([file]) => self.upload_single(&dir, file).await,
            Err(files) => self.upload_multiple(&dir, files).await,
        }
    }

    fn set_progress(&self, progress: UploadProgress) {
        self.state.write().progress = progress;
        self.events
            .emit(FileManagerEvent::UploadProgress { progress });
    }

    async fn upload_single(&self, dir: &RemoteDir, file: UploadFile) -> UploadSummary {
        let name = file.name.clone();
        self.set_progress(UploadProgress::started(file.size));

        let state = self.state.clone();
        let events = self.events.clone();
        let on_progress: ProgressFn = Arc::new(move |loaded: u64, total: u64| {
            let progress = UploadProgress::at(loaded, total);
            state.write().progress = progress;
            events.emit(FileManagerEvent::UploadProgress { progress });
        });

        let result = self.transfers.upload(dir, file, Some(on_progress)).await;
        self.set_progress(UploadProgress::idle());

        let mut summary = UploadSummary {
            total: 1,
            ..Default::default()
        };
        match result {
            Ok(()) => {
                summary.uploaded.push(name);
                self.refresh().await;
                self.post_status(StatusMessage::FileUploaded);
            }
            Err(e) => {
                summary.failed.push((name, e.to_string()));
                self.post_status(StatusMessage::UploadFailed);
            }
        }
        summary
    }

    async fn upload_multiple(&self, dir: &RemoteDir, files: Vec<UploadFile>) -> UploadSummary {
        self.post_status(StatusMessage::UploadingMultiple);
        let summary = self.transfers.upload_many(dir, files).await;

        if !summary.uploaded.is_empty() {
            self.refresh().await;
        }
        if summary.all_succeeded() {
            self.post_status(StatusMessage::FilesUploaded);
        } else {
            warn!(
                "{} of {} uploads to {} failed",
                summary.failed.len(),
                summary.total,
                dir
            );
            self.post_status(StatusMessage::UploadFailed);
        }
        summary
    }

    /// Download `name` from the current directory. Failures are returned to
    /// the caller as-is.
    pub async fn download(&self, name: &str) -> Result<SavedDownload, FileError> {
        let path = self.path().entry_path(name);
        self.transfers.download(&path).await
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Editor hand-off
    // ═══════════════════════════════════════════════════════════════════════

    fn open_file_path(&self) -> Result<String, FileError> {
        let state = self.state.read();
        state
            .open_file
            .as_ref()
            .map(|entry| state.path.entry_path(&entry.name))
            .ok_or(FileError::NoOpenFile)
    }

    /// Text content of the open file.
    pub async fn read_open_file(&self) -> Result<String, FileError> {
        let path = self.open_file_path()?;
        self.transfers.read_text(&path).await
    }

    /// Write `content` back to the open file.
    pub async fn save_open_file(&self, content: &str) -> Result<(), FileError> {
        let path = self.open_file_path()?;
        match self.api.write_file(&path, content).await {
            Ok(()) => {
                info!("Saved {} ({} bytes)", path, content.len());
                self.post_status(StatusMessage::FileSaved);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to save {}: {}", path, e);
                self.post_status(StatusMessage::SaveFailed);
                Err(e)
            }
        }
    }

    pub fn close_file(&self) {
        self.state.write().open_file = None;
    }
}

/// A new entry name must be a single path segment.
fn validate_name(name: &str) -> Result<(), FileError> {
    if name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(FileError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::testing::{ApiCall, MemorySink, MockApi, RecordingEvents};

    struct Fixture {
        api: Arc<MockApi>,
        sink: Arc<MemorySink>,
        events: Arc<RecordingEvents>,
        ctl: DirectoryController,
    }

    fn fixture() -> Fixture {
        let api = Arc::new(MockApi::new());
        let sink = Arc::new(MemorySink::default());
        let events = Arc::new(RecordingEvents::default());
        let ctl = DirectoryController::new(
            api.clone(),
            sink.clone(),
            events.clone(),
            ControllerOptions::default(),
        );
        Fixture {
            api,
            sink,
            events,
            ctl,
        }
    }

    fn listed(ctl: &DirectoryController) -> Vec<String> {
        ctl.listing().into_iter().map(|e| e.name).collect()
    }

    fn list_calls(api: &MockApi) -> Vec<String> {
        api.calls()
            .into_iter()
            .filter_map(|c| match c {
                ApiCall::ListFolder(dir) => Some(dir),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_activate_folder_enters_it() {
        let f = fixture();
        f.api.set_listing("/", vec![Entry::folder("mods"), Entry::file("eula.txt", 9)]);
        f.api.set_listing("/mods/", vec![Entry::file("a.jar", 500)]);
        f.ctl.refresh().await;

        let result = f
            .ctl
            .handle_activate(&Entry::folder("mods"), ActivateModifiers::none())
            .await
            .unwrap();

        assert_eq!(result, Activation::Navigated(RemoteDir::parse("/mods/")));
        assert_eq!(f.ctl.path().as_str(), "/mods/");
        assert!(f.ctl.selection().is_empty());
        assert!(f.ctl.open_file().is_none());
        assert_eq!(list_calls(&f.api), vec!["/", "/mods/"]);
        assert_eq!(listed(&f.ctl), vec!["a.jar"]);
        assert_eq!(f.events.directories(), vec![RemoteDir::parse("/mods/")]);
    }

    #[tokio::test]
    async fn test_activate_small_file_opens_it() {
        let f = fixture();
        let jar = Entry::file("a.jar", 500);
        f.api.set_listing("/mods/", vec![jar.clone()]);
        f.ctl.change_directory(RemoteDir::parse("/mods/")).await;

        let result = f.ctl.handle_activate(&jar, ActivateModifiers::none()).await.unwrap();

        assert_eq!(result, Activation::Opened(jar.clone()));
        assert_eq!(f.ctl.open_file(), Some(jar));
    }

    #[tokio::test]
    async fn test_activate_large_file_downloads() {
        let f = fixture();
        let world = Entry::file("world.zip", 2_000_000);
        f.api.set_listing("/", vec![world.clone()]);
        f.api.set_file("/world.zip", "world.zip", "zipdata");
        f.ctl.refresh().await;

        let result = f.ctl.handle_activate(&world, ActivateModifiers::none()).await.unwrap();

        assert!(matches!(result, Activation::Downloaded(ref saved) if saved.filename == "world.zip"));
        assert!(f.ctl.open_file().is_none());
        assert!(f.api.calls().contains(&ApiCall::FetchFile("/world.zip".to_string())));
        assert_eq!(f.sink.saved(), vec!["world.zip"]);
    }

    #[tokio::test]
    async fn test_threshold_is_exclusive() {
        let f = fixture();
        let edge = Entry::file("edge.log", 1_000_000);
        let result = f.ctl.handle_activate(&edge, ActivateModifiers::none()).await.unwrap();
        assert_eq!(result, Activation::Opened(edge));
    }

    #[tokio::test]
    async fn test_large_file_download_failure_is_returned() {
        let f = fixture();
        let big = Entry::file("big.bin", 5_000_000);
        let err = f
            .ctl
            .handle_activate(&big, ActivateModifiers::none())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(f.ctl.open_file().is_none());
    }

    #[tokio::test]
    async fn test_modified_click_enters_selection_mode() {
        let f = fixture();
        f.api.set_listing("/", vec![Entry::folder("mods"), Entry::file("a.txt", 1)]);
        f.ctl.refresh().await;
        assert!(!f.ctl.selection_mode());

        let result = f
            .ctl
            .handle_activate(&Entry::folder("mods"), ActivateModifiers::selecting())
            .await
            .unwrap();

        assert_eq!(result, Activation::Toggled { selected: true });
        assert!(f.ctl.selection_mode());
        assert!(f.ctl.is_selected("mods"));
        assert_eq!(f.ctl.path(), RemoteDir::root());

        // In selection mode a plain click toggles too
        let result = f
            .ctl
            .handle_activate(&Entry::file("a.txt", 1), ActivateModifiers::none())
            .await
            .unwrap();
        assert_eq!(result, Activation::Toggled { selected: true });
        assert!(f.ctl.open_file().is_none());
    }

    #[tokio::test]
    async fn test_unlisted_entry_is_not_selected() {
        let f = fixture();
        f.api.set_listing("/", vec![Entry::file("a.txt", 1)]);
        f.ctl.refresh().await;

        let result = f
            .ctl
            .handle_activate(&Entry::file("ghost.txt", 1), ActivateModifiers::selecting())
            .await
            .unwrap();

        assert_eq!(result, Activation::Toggled { selected: false });
        assert!(!f.ctl.is_selected("ghost.txt"));
        assert!(f.ctl.selection().is_empty());
        assert!(!f.ctl.toggle_selection("ghost.txt"));
        assert!(f.ctl.delete_selected().await.is_none());
    }

    #[tokio::test]
    async fn test_select_all_toggles() {
        let f = fixture();
        f.api.set_listing("/", vec![Entry::folder("a"), Entry::file("b", 1)]);
        f.ctl.refresh().await;
        f.ctl.set_selection_mode(true);
        assert!(!f.ctl.all_selected());

        f.ctl.toggle_select_all();
        assert!(f.ctl.all_selected());
        f.ctl.toggle_select_all();
        assert!(f.ctl.selection().is_empty());
        assert!(f.ctl.selection_mode());
    }

    #[tokio::test]
    async fn test_all_selected_false_on_empty_listing() {
        let f = fixture();
        f.api.set_listing("/", vec![]);
        f.ctl.refresh().await;
        f.ctl.set_selection_mode(true);
        assert!(!f.ctl.all_selected());
    }

    #[tokio::test]
    async fn test_directory_change_clears_selection_and_open_file() {
        let f = fixture();
        f.api.set_listing("/", vec![Entry::folder("logs"), Entry::file("a.txt", 1)]);
        f.api.set_listing("/logs/", vec![]);
        f.ctl.refresh().await;
        f.ctl
            .handle_activate(&Entry::file("a.txt", 1), ActivateModifiers::none())
            .await
            .unwrap();
        f.ctl.toggle_selection("logs");

        f.ctl.change_directory(RemoteDir::parse("/logs/")).await;

        assert!(f.ctl.selection().is_empty());
        assert!(!f.ctl.selection_mode());
        assert!(f.ctl.open_file().is_none());
    }

    #[tokio::test]
    async fn test_stale_listing_is_discarded() {
        let f = fixture();
        f.api.set_listing("/old/", vec![Entry::file("stale.txt", 1)]);
        f.api.set_listing("/new/", vec![Entry::file("fresh.txt", 1)]);
        let gate = f.api.gate_listing("/old/");

        let into_old = f.ctl.change_directory(RemoteDir::parse("/old/"));
        let then_new = async {
            while !list_calls(&f.api).contains(&"/old/".to_string()) {
                tokio::task::yield_now().await;
            }
            f.ctl.change_directory(RemoteDir::parse("/new/")).await;
            gate.notify_one();
        };
        tokio::join!(into_old, then_new);

        assert_eq!(f.ctl.path().as_str(), "/new/");
        assert_eq!(listed(&f.ctl), vec!["fresh.txt"]);
    }

    #[tokio::test]
    async fn test_failed_stale_listing_does_not_ascend() {
        let f = fixture();
        f.api.set_listing("/", vec![Entry::file("root.txt", 1)]);
        f.api.set_listing("/new/", vec![Entry::file("fresh.txt", 1)]);
        let gate = f.api.gate_listing("/gone/");

        let into_gone = f.ctl.change_directory(RemoteDir::parse("/gone/"));
        let then_new = async {
            while !list_calls(&f.api).contains(&"/gone/".to_string()) {
                tokio::task::yield_now().await;
            }
            f.ctl.change_directory(RemoteDir::parse("/new/")).await;
            gate.notify_one();
        };
        tokio::join!(into_gone, then_new);

        assert_eq!(f.ctl.path().as_str(), "/new/");
        assert_eq!(listed(&f.ctl), vec!["fresh.txt"]);
        assert_eq!(list_calls(&f.api), vec!["/gone/", "/new/"]);
        assert_eq!(
            f.events.directories(),
            vec![RemoteDir::parse("/gone/"), RemoteDir::parse("/new/")]
        );
    }

    #[tokio::test]
    async fn test_missing_directory_ascends() {
        let f = fixture();
        f.api.set_listing("/", vec![Entry::file("eula.txt", 1)]);

        f.ctl.change_directory(RemoteDir::parse("/world/region/")).await;

        assert_eq!(f.ctl.path(), RemoteDir::root());
        assert_eq!(listed(&f.ctl), vec!["eula.txt"]);
        assert_eq!(list_calls(&f.api), vec!["/world/region/", "/world/", "/"]);
        assert_eq!(
            f.events.directories(),
            vec![
                RemoteDir::parse("/world/region/"),
                RemoteDir::parse("/world/"),
                RemoteDir::root(),
            ]
        );
    }

    #[tokio::test]
    async fn test_root_failure_does_not_loop() {
        let f = fixture();
        f.ctl.refresh().await;
        assert_eq!(f.ctl.path(), RemoteDir::root());
        assert!(f.ctl.listing().is_empty());
        assert_eq!(list_calls(&f.api), vec!["/"]);
    }

    #[tokio::test]
    async fn test_go_up_and_jump() {
        let f = fixture();
        f.api.set_listing("/", vec![]);
        f.api.set_listing("/a/", vec![]);
        f.api.set_listing("/a/b/", vec![]);
        assert!(!f.ctl.go_up().await);

        f.ctl.change_directory(RemoteDir::parse("/a/b/")).await;
        let crumbs = f.ctl.breadcrumbs();
        assert_eq!(crumbs.len(), 2);

        assert!(f.ctl.go_up().await);
        assert_eq!(f.ctl.path().as_str(), "/a/");

        f.ctl.change_directory(RemoteDir::parse("/a/b/")).await;
        f.ctl.jump_to(&crumbs[0]).await;
        assert_eq!(f.ctl.path().as_str(), "/a/");
    }

    #[tokio::test]
    async fn test_refresh_drops_vanished_selection() {
        let f = fixture();
        f.api.set_listing("/", vec![Entry::file("a.txt", 1), Entry::file("b.txt", 1)]);
        f.ctl.refresh().await;
        f.ctl.toggle_selection("a.txt");
        f.ctl.toggle_selection("b.txt");

        f.api.set_listing("/", vec![Entry::file("b.txt", 1)]);
        f.ctl.refresh().await;

        assert_eq!(f.ctl.selection().names(), &["b.txt"]);
    }

    #[tokio::test]
    async fn test_delete_selected_success() {
        let f = fixture();
        f.api.set_listing("/", vec![Entry::folder("b"), Entry::file("a.txt", 1)]);
        f.ctl.refresh().await;
        f.ctl.toggle_selection("a.txt");
        f.ctl.toggle_selection("b");

        let result = f.ctl.delete_selected().await.unwrap();

        assert!(result.is_success());
        assert_eq!(
            f.api.mutations(),
            vec![
                ApiCall::DeleteFile("/a.txt".to_string()),
                ApiCall::DeleteFolder("/b".to_string()),
            ]
        );
        assert!(f.ctl.selection().is_empty());
        assert!(!f.ctl.selection_mode());
        assert!(f.ctl.listing().is_empty());
        assert_eq!(
            f.events.statuses(),
            vec![StatusMessage::Deleting, StatusMessage::Deleted]
        );
    }

    #[tokio::test]
    async fn test_delete_selected_failure_keeps_state() {
        let f = fixture();
        f.api.set_listing("/", vec![Entry::file("a.txt", 1), Entry::folder("b")]);
        f.api.fail_delete("/a.txt");
        f.ctl.refresh().await;
        f.ctl.toggle_selection("a.txt");
        f.ctl.toggle_selection("b");
        f.api.clear_calls();

        let result = f.ctl.delete_selected().await.unwrap();

        assert!(!result.is_success());
        // The loop carries on past the failed entry
        assert_eq!(f.api.mutations().len(), 2);
        assert!(list_calls(&f.api).is_empty());
        assert_eq!(f.ctl.selection().names(), &["a.txt", "b"]);
        assert_eq!(f.ctl.last_status(), Some(StatusMessage::DeleteFailed));
    }

    #[tokio::test]
    async fn test_empty_selection_is_noop() {
        let f = fixture();
        f.api.set_listing("/", vec![Entry::file("a.txt", 1)]);
        f.ctl.refresh().await;
        f.ctl.set_selection_mode(true);

        assert!(f.ctl.archive_selected().await.is_none());
        assert!(f.ctl.unarchive_selected().await.is_none());
        assert!(f.ctl.delete_selected().await.is_none());
        assert!(f.ctl.download_selected().await.is_none());
        assert!(f.api.mutations().is_empty());
        assert!(f.events.statuses().is_empty());
    }

    #[tokio::test]
    async fn test_archive_selected() {
        let f = fixture();
        f.api.set_listing("/", vec![Entry::folder("world"), Entry::file("ops.json", 1)]);
        f.ctl.refresh().await;
        f.ctl.toggle_select_all();

        let result = f.ctl.archive_selected().await.unwrap();

        assert!(result.is_success());
        assert_eq!(
            f.api.mutations(),
            vec![ApiCall::Archive(
                "/".to_string(),
                vec!["world".to_string(), "ops.json".to_string()]
            )]
        );
        assert!(listed(&f.ctl).contains(&"archive.zip".to_string()));
        assert!(f.ctl.selection().is_empty());
        assert_eq!(f.ctl.status(), Some(StatusMessage::Archived));
    }

    #[tokio::test]
    async fn test_unarchive_failure() {
        let f = fixture();
        f.api.set_listing("/", vec![Entry::file("a.zip", 1)]);
        f.api.fail_unarchive();
        f.ctl.refresh().await;
        f.ctl.toggle_selection("a.zip");

        let result = f.ctl.unarchive_selected().await.unwrap();

        assert!(!result.is_success());
        assert!(f.ctl.is_selected("a.zip"));
        assert_eq!(
            f.events.statuses(),
            vec![StatusMessage::Unarchiving, StatusMessage::UnarchiveFailed]
        );
    }

    #[tokio::test]
    async fn test_download_selected_posts_one_status() {
        let f = fixture();
        f.api.set_listing("/", vec![Entry::folder("logs"), Entry::file("a.txt", 1)]);
        f.api.set_file("/a.txt", "a.txt", "hi");
        f.ctl.refresh().await;
        f.ctl.toggle_select_all();

        let result = f.ctl.download_selected().await.unwrap();

        assert_eq!(result.skipped, vec!["logs"]);
        assert_eq!(f.sink.saved(), vec!["a.txt"]);
        assert_eq!(f.events.statuses(), vec![StatusMessage::Downloaded]);
        assert!(f.ctl.selection().is_empty());
    }

    #[tokio::test]
    async fn test_rename_is_optimistic() {
        let f = fixture();
        let entry = Entry::file("old.txt", 1);
        f.api.set_listing("/", vec![entry.clone(), Entry::file("other.txt", 1)]);
        f.ctl.refresh().await;
        f.ctl.toggle_selection("old.txt");
        f.api.clear_calls();

        assert!(f.ctl.rename(&entry, " new.txt ").await.unwrap());

        assert_eq!(
            f.api.calls(),
            vec![ApiCall::Rename {
                path: "/old.txt".to_string(),
                is_folder: false,
                new_name: "new.txt".to_string(),
            }]
        );
        assert_eq!(listed(&f.ctl), vec!["new.txt", "other.txt"]);
        assert!(f.ctl.is_selected("new.txt"));
        assert!(!f.ctl.is_selected("old.txt"));
        assert_eq!(f.ctl.last_status(), Some(StatusMessage::Renamed));
    }

    #[tokio::test]
    async fn test_rename_noop_cases() {
        let f = fixture();
        let entry = Entry::file("same.txt", 1);
        assert!(!f.ctl.rename(&entry, "   ").await.unwrap());
        assert!(!f.ctl.rename(&entry, "same.txt").await.unwrap());
        assert!(f.api.calls().is_empty());
        assert!(f.events.statuses().is_empty());
    }

    #[tokio::test]
    async fn test_rename_failure_leaves_listing() {
        let f = fixture();
        let entry = Entry::folder("plugins");
        f.api.set_listing("/", vec![entry.clone()]);
        f.api.fail_rename("/plugins");
        f.ctl.refresh().await;

        assert!(f.ctl.rename(&entry, "addons").await.is_err());
        assert_eq!(listed(&f.ctl), vec!["plugins"]);
        assert_eq!(f.ctl.last_status(), Some(StatusMessage::RenameFailed));
    }

    #[tokio::test]
    async fn test_rename_onto_listed_name_is_refused() {
        let f = fixture();
        let entry = Entry::file("a.txt", 1);
        f.api.set_listing("/", vec![entry.clone(), Entry::file("b.txt", 2)]);
        f.ctl.refresh().await;
        f.api.clear_calls();

        let err = f.ctl.rename(&entry, "b.txt").await.unwrap_err();

        assert!(matches!(err, FileError::InvalidName(_)));
        assert!(f.api.calls().is_empty());
        assert_eq!(listed(&f.ctl), vec!["a.txt", "b.txt"]);
        assert_eq!(f.ctl.last_status(), Some(StatusMessage::RenameFailed));
    }

    #[tokio::test]
    async fn test_rename_rejects_path_separators() {
        let f = fixture();
        let entry = Entry::file("a.txt", 1);
        let err = f.ctl.rename(&entry, "../a.txt").await.unwrap_err();
        assert!(matches!(err, FileError::InvalidName(_)));
        assert!(f.api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_folder_and_file_refresh() {
        let f = fixture();
        f.api.set_listing("/", vec![]);
        f.ctl.refresh().await;

        assert!(f.ctl.create_folder("backups").await.unwrap());
        assert!(f.ctl.create_file("notes.txt", "").await.unwrap());
        assert!(!f.ctl.create_file("  ", "").await.unwrap());

        assert_eq!(listed(&f.ctl), vec!["backups", "notes.txt"]);
        assert_eq!(
            f.events.statuses(),
            vec![StatusMessage::FolderCreated, StatusMessage::FileCreated]
        );
        assert_eq!(list_calls(&f.api).len(), 3);
    }

    #[tokio::test]
    async fn test_create_folder_failure() {
        let f = fixture();
        f.api.set_listing("/", vec![]);
        f.api.fail_create_folder("/dup");
        f.ctl.refresh().await;
        f.api.clear_calls();

        assert!(f.ctl.create_folder("dup").await.is_err());
        assert!(list_calls(&f.api).is_empty());
        assert_eq!(f.ctl.last_status(), Some(StatusMessage::FolderCreateFailed));
    }

    #[tokio::test]
    async fn test_single_upload_tracks_progress() {
        let f = fixture();
        f.api.set_listing("/plugins/", vec![]);
        f.ctl.change_directory(RemoteDir::parse("/plugins/")).await;

        let summary = f
            .ctl
            .upload(vec![UploadFile::from_bytes("tool.jar", "0123456789")])
            .await;

        assert!(summary.all_succeeded());
        assert_eq!(f.ctl.progress(), UploadProgress::idle());
        assert_eq!(listed(&f.ctl), vec!["tool.jar"]);
        assert_eq!(f.ctl.last_status(), Some(StatusMessage::FileUploaded));

        let progress: Vec<UploadProgress> = f
            .events
            .events()
            .into_iter()
            .filter_map(|e| match e {
                FileManagerEvent::UploadProgress { progress } => Some(progress),
                _ => None,
            })
            .collect();
        assert_eq!(progress.first(), Some(&UploadProgress::started(10)));
        assert!(progress.contains(&UploadProgress::at(5, 10)));
        assert!(progress.iter().any(|p| p.active && p.percent == 100));
        assert_eq!(progress.last(), Some(&UploadProgress::idle()));
    }

    #[tokio::test]
    async fn test_single_upload_failure_resets_progress() {
        let f = fixture();
        f.api.set_listing("/", vec![]);
        f.api.fail_upload("x.bin");

        let summary = f.ctl.upload(vec![UploadFile::from_bytes("x.bin", "1")]).await;

        assert!(!summary.all_succeeded());
        assert!(!f.ctl.progress().active);
        assert_eq!(f.ctl.last_status(), Some(StatusMessage::UploadFailed));
    }

    #[tokio::test]
    async fn test_multi_upload_aggregates() {
        let f = fixture();
        f.api.set_listing("/", vec![]);

        let summary = f
            .ctl
            .upload(vec![
                UploadFile::from_bytes("a.txt", "1"),
                UploadFile::from_bytes("b.txt", "2"),
            ])
            .await;

        assert!(summary.all_succeeded());
        assert_eq!(
            f.events.statuses(),
            vec![StatusMessage::UploadingMultiple, StatusMessage::FilesUploaded]
        );
        // No byte progress for multi-file uploads
        assert!(!f
            .events
            .events()
            .iter()
            .any(|e| matches!(e, FileManagerEvent::UploadProgress { .. })));
        let mut names = listed(&f.ctl);
        names.sort();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[tokio::test]
    async fn test_multi_upload_partial_failure() {
        let f = fixture();
        f.api.set_listing("/", vec![]);
        f.api.fail_upload("b.txt");

        let summary = f
            .ctl
            .upload(vec![
                UploadFile::from_bytes("a.txt", "1"),
                UploadFile::from_bytes("b.txt", "2"),
            ])
            .await;

        assert_eq!(summary.uploaded, vec!["a.txt"]);
        assert_eq!(listed(&f.ctl), vec!["a.txt"]);
        assert_eq!(f.ctl.last_status(), Some(StatusMessage::UploadFailed));
    }

    #[tokio::test]
    async fn test_editor_round_trip() {
        let f = fixture();
        let props = Entry::file("server.properties", 12);
        f.api.set_listing("/", vec![props.clone()]);
        f.api.set_file("/server.properties", "server.properties", "motd=hello");
        f.ctl.refresh().await;

        assert!(matches!(
            f.ctl.read_open_file().await,
            Err(FileError::NoOpenFile)
        ));

        f.ctl.handle_activate(&props, ActivateModifiers::none()).await.unwrap();
        assert_eq!(f.ctl.read_open_file().await.unwrap(), "motd=hello");

        f.ctl.save_open_file("motd=bye").await.unwrap();
        assert_eq!(f.ctl.read_open_file().await.unwrap(), "motd=bye");
        assert_eq!(f.ctl.last_status(), Some(StatusMessage::FileSaved));

        f.ctl.close_file();
        assert!(f.ctl.open_file().is_none());
    }

    #[tokio::test]
    async fn test_save_failure_posts_status() {
        let f = fixture();
        let cfg = Entry::file("bukkit.yml", 3);
        f.api.fail_write("/bukkit.yml");
        f.ctl.handle_activate(&cfg, ActivateModifiers::none()).await.unwrap();

        assert!(f.ctl.save_open_file("x").await.is_err());
        assert_eq!(f.ctl.last_status(), Some(StatusMessage::SaveFailed));
    }

    #[tokio::test]
    async fn test_reset_returns_to_root() {
        let f = fixture();
        f.api.set_listing("/", vec![Entry::folder("a")]);
        f.api.set_listing("/a/", vec![Entry::file("x", 1)]);
        f.ctl.change_directory(RemoteDir::parse("/a/")).await;
        f.ctl.toggle_selection("x");

        f.ctl.reset().await;

        let snap = f.ctl.snapshot();
        assert_eq!(snap.path, RemoteDir::root());
        assert!(snap.breadcrumbs.is_empty());
        assert!(snap.selected.is_empty());
        assert!(!snap.selection_mode);
        assert_eq!(snap.status, None);
        assert_eq!(listed(&f.ctl), vec!["a"]);
    }
}
