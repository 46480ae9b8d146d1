//! Remote file manager
//!
//! Directory navigation, listing synchronization, multi-select batch
//! operations and file transfers against a remote panel.

pub mod batch;
pub mod controller;
pub mod dialogs;
pub mod error;
pub mod events;
pub mod listing;
pub mod path_utils;
pub mod progress;
pub mod selection;
pub mod status;
pub mod transfer;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use batch::{BatchExecutor, BatchResult};
pub use controller::{ControllerOptions, ControllerSnapshot, DirectoryController};
pub use dialogs::{CreateFileDialog, CreateFolderDialog, LoadingFlag, RenameDialog};
pub use error::FileError;
pub use events::{FileEventSink, FileManagerEvent, NoopEventSink};
pub use listing::{fetch_listing, sort_listing, ListingSequencer};
pub use path_utils::{Breadcrumb, RemoteDir};
pub use progress::{format_bytes, UploadProgress};
pub use selection::{Selection, SelectionInput};
pub use status::{StatusMessage, StatusSlot};
pub use transfer::{DirectorySink, DownloadSink, TransferControl, TransferGuard, TransferManager, UploadSummary};
pub use types::*;
