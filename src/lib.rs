//! MCDash file manager client
//!
//! Navigate, edit and transfer files on a remote game server through the
//! panel's REST API. [`files::DirectoryController`] holds the browser state;
//! [`api::HttpFileApi`] talks to the panel.

pub mod api;
pub mod config;
pub mod files;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use api::{FileApi, HttpFileApi};
pub use config::{ClientConfig, ConfigStorage};
pub use files::{DirectoryController, FileError, FileEventSink, FileManagerEvent};

use files::{ControllerOptions, DirectorySink, NoopEventSink};

/// Install the global tracing subscriber, filtered by `RUST_LOG` (default
/// `info`). Calls after the first are ignored.
pub fn init_logging() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Build a controller for the panel described by `config`. Downloads are saved
/// to the configured download directory; events are dropped.
pub fn connect(config: &ClientConfig) -> Result<DirectoryController, FileError> {
    connect_with_events(config, Arc::new(NoopEventSink))
}

/// Load the config saved in `storage` and build a controller from it.
pub async fn connect_saved(storage: &ConfigStorage) -> Result<DirectoryController, FileError> {
    let config = storage.load().await?;
    connect(&config)
}

/// Like [`connect`], delivering [`FileManagerEvent`]s to `events`.
pub fn connect_with_events(
    config: &ClientConfig,
    events: Arc<dyn FileEventSink>,
) -> Result<DirectoryController, FileError> {
    let api = HttpFileApi::from_config(config)?;
    let sink = DirectorySink::new(config.download_dir());
    tracing::info!(
        "File manager connected to {} (downloads to {:?})",
        api.base_url(),
        sink.dir()
    );
    Ok(DirectoryController::new(
        Arc::new(api),
        Arc::new(sink),
        events,
        ControllerOptions::from(config),
    ))
}
