//! Configuration Management Module
//!
//! Client settings (panel URL, token, timeouts) and their on-disk storage.

pub mod storage;
pub mod types;

pub use storage::{config_dir, config_file, ConfigStorage, StorageError};
pub use types::{ClientConfig, CONFIG_VERSION, DEFAULT_BASE_URL};
