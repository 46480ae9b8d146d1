//! On-disk client settings
//!
//! Lives at `~/.mcdash/client.json` (`%APPDATA%\MCDash\client.json` on Windows).

use std::path::PathBuf;

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

use super::types::{ClientConfig, CONFIG_VERSION};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to determine config directory")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config version {found} is newer than supported {supported}")]
    VersionTooNew { found: u32, supported: u32 },
}

pub fn config_dir() -> Result<PathBuf, StorageError> {
    #[cfg(windows)]
    let dir = dirs::config_dir().map(|base| base.join("MCDash"));
    #[cfg(not(windows))]
    let dir = dirs::home_dir().map(|home| home.join(".mcdash"));

    dir.ok_or(StorageError::NoConfigDir)
}

pub fn config_file() -> Result<PathBuf, StorageError> {
    Ok(config_dir()?.join("client.json"))
}

/// Reads and writes one [`ClientConfig`] file
pub struct ConfigStorage {
    file: PathBuf,
}

impl ConfigStorage {
    /// Storage at the platform default location
    pub fn new() -> Result<Self, StorageError> {
        Ok(Self {
            file: config_file()?,
        })
    }

    pub fn with_path(file: PathBuf) -> Self {
        Self { file }
    }

    /// Read the saved config.
    ///
    /// A missing file gives the defaults. So does an unreadable one, after it
    /// has been moved aside so the next save does not overwrite it.
    pub async fn load(&self) -> Result<ClientConfig, StorageError> {
        let raw = match fs::read_to_string(&self.file).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No client config at {:?}, using defaults", self.file);
                return Ok(ClientConfig::default());
            }
            Err(e) => return Err(e.into()),
        };

        let config = match serde_json::from_str::<ClientConfig>(&raw) {
            Ok(config) => config,
            Err(e) => {
                warn!("Client config {:?} is unreadable: {}", self.file, e);
                self.set_aside().await;
                return Ok(ClientConfig::default());
            }
        };

        if config.version > CONFIG_VERSION {
            return Err(StorageError::VersionTooNew {
                found: config.version,
                supported: CONFIG_VERSION,
            });
        }
        info!("Loaded client config from {:?}", self.file);
        Ok(config)
    }

    /// Write `config`, replacing the file in one rename.
    pub async fn save(&self, config: &ClientConfig) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(config)?;
        if let Some(parent) = self.file.parent() {
            fs::create_dir_all(parent).await?;
        }

        let staging = self.file.with_extension("json.tmp");
        let mut out = fs::File::create(&staging).await?;
        out.write_all(json.as_bytes()).await?;
        out.sync_all().await?;
        drop(out);

        fs::rename(&staging, &self.file).await?;
        debug!("Saved client config to {:?}", self.file);
        Ok(())
    }

    async fn set_aside(&self) {
        let target = self.file.with_extension(format!(
            "json.corrupt.{}",
            chrono::Utc::now().format("%Y%m%d_%H%M%S")
        ));
        match fs::rename(&self.file, &target).await {
            Ok(()) => warn!("Moved unreadable client config to {:?}", target),
            Err(e) => error!("Failed to move unreadable client config aside: {}", e),
        }
    }
}
