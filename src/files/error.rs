//! File manager error types

use std::time::Duration;

use thiserror::Error;

use crate::config::StorageError;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("HTTP error: {0}")]
    Http(u16),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Entry not in current listing: {0}")]
    EntryNotFound(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Transfer cancelled")]
    TransferCancelled,

    #[error("No file is open")]
    NoOpenFile,

    #[error("Config error: {0}")]
    Config(#[from] StorageError),
}

impl FileError {
    /// Whether the remote answered with "not found" for the target path.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FileError::Http(404))
    }
}

// Serialize as the display string so UI bridges can forward it as-is
impl serde::Serialize for FileError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
