//! Rename / create-folder / create-file dialogs
//!
//! Each dialog holds its input text and a [`LoadingFlag`] for the submit
//! button. The flag is raised through an RAII guard, so it drops back on every
//! exit path, including errors.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use super::controller::DirectoryController;
use super::error::FileError;
use super::types::Entry;

/// Busy flag shared with whatever renders the dialog
#[derive(Debug, Clone, Default)]
pub struct LoadingFlag(Arc<AtomicBool>);

impl LoadingFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Raise the flag. `None` if it is already raised (submit in flight).
    pub fn begin(&self) -> Option<LoadingGuard> {
        self.0
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| LoadingGuard(self.0.clone()))
    }
}

/// Lowers the [`LoadingFlag`] when dropped
#[derive(Debug)]
pub struct LoadingGuard(Arc<AtomicBool>);

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Rename an entry of the current directory
#[derive(Debug, Clone)]
pub struct RenameDialog {
    entry: Entry,
    new_name: String,
    open: bool,
    loading: LoadingFlag,
}

impl RenameDialog {
    /// Open pre-filled with the entry's current name.
    pub fn open(entry: Entry) -> Self {
        Self {
            new_name: entry.name.clone(),
            entry,
            open: true,
            loading: LoadingFlag::new(),
        }
    }

    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    pub fn new_name(&self) -> &str {
        &self.new_name
    }

    pub fn set_new_name(&mut self, name: impl Into<String>) {
        self.new_name = name.into();
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn loading(&self) -> &LoadingFlag {
        &self.loading
    }

    /// Close without renaming; the input goes back to the current name.
    pub fn cancel(&mut self) {
        self.open = false;
        self.new_name = self.entry.name.clone();
    }

    /// Rename through the controller.
    ///
    /// A blank or unchanged name just closes the dialog. On failure the dialog
    /// stays open so the name can be corrected.
    pub async fn submit(&mut self, controller: &DirectoryController) -> Result<bool, FileError> {
        let Some(_busy) = self.loading.begin() else {
            debug!("Rename of {} already in progress", self.entry.name);
            return Ok(false);
        };
        let renamed = controller.rename(&self.entry, &self.new_name).await?;
        if renamed {
            self.entry.name = self.new_name.trim().to_string();
        }
        self.open = false;
        Ok(renamed)
    }
}

/// Create a folder in the current directory
#[derive(Debug, Clone, Default)]
pub struct CreateFolderDialog {
    name: String,
    open: bool,
    loading: LoadingFlag,
}

impl CreateFolderDialog {
    pub fn open() -> Self {
        Self {
            open: true,
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn loading(&self) -> &LoadingFlag {
        &self.loading
    }

    pub fn cancel(&mut self) {
        self.open = false;
        self.name.clear();
    }

    /// Create the folder. A blank name keeps the dialog open and does nothing.
    pub async fn submit(&mut self, controller: &DirectoryController) -> Result<bool, FileError> {
        let Some(_busy) = self.loading.begin() else {
            return Ok(false);
        };
        let created = controller.create_folder(&self.name).await?;
        if created {
            self.cancel();
        }
        Ok(created)
    }
}

/// Create an empty file in the current directory
#[derive(Debug, Clone, Default)]
pub struct CreateFileDialog {
    name: String,
    open: bool,
    loading: LoadingFlag,
}

impl CreateFileDialog {
    pub fn open() -> Self {
        Self {
            open: true,
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn loading(&self) -> &LoadingFlag {
        &self.loading
    }

    pub fn cancel(&mut self) {
        self.open = false;
        self.name.clear();
    }

    pub async fn submit(&mut self, controller: &DirectoryController) -> Result<bool, FileError> {
        let Some(_busy) = self.loading.begin() else {
            return Ok(false);
        };
        let created = controller.create_file(&self.name, "").await?;
        if created {
            self.cancel();
        }
        Ok(created)
    }
}
