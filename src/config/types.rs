//! Client configuration types

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::files::types::constants::{
    LARGE_FILE_THRESHOLD, REQUEST_TIMEOUT, STATUS_DISPLAY, UPLOAD_TIMEOUT,
};

/// Current config file format version
pub const CONFIG_VERSION: u32 = 1;

/// Default panel API root
pub const DEFAULT_BASE_URL: &str = "http://localhost:7867/api/";

/// Connection and behavior settings for the file manager client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub version: u32,
    /// Panel API root, e.g. `http://host:7867/api/`
    pub base_url: String,
    /// Stored session token, sent as `Authorization: Basic <token>`
    pub token: Option<String>,
    pub request_timeout_secs: u64,
    pub upload_timeout_secs: u64,
    /// Files above this size are downloaded instead of opened
    pub large_file_threshold: u64,
    pub status_display_ms: u64,
    /// Where downloads are saved (platform download dir when unset)
    pub download_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            request_timeout_secs: REQUEST_TIMEOUT.as_secs(),
            upload_timeout_secs: UPLOAD_TIMEOUT.as_secs(),
            large_file_threshold: LARGE_FILE_THRESHOLD,
            status_display_ms: STATUS_DISPLAY.as_millis() as u64,
            download_dir: None,
        }
    }
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs.max(1))
    }

    pub fn status_display(&self) -> Duration {
        Duration::from_millis(self.status_display_ms)
    }

    /// Resolved download directory
    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .or_else(dirs::download_dir)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
