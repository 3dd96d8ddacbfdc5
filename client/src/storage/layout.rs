//! Storage layout configuration

use std::path::PathBuf;

use crate::filesys::file::File;

/// Where the client keeps its configuration
#[derive(Debug, Clone)]
pub struct StorageLayout {
    /// Base directory for all client state
    pub base_dir: PathBuf,
}

impl StorageLayout {
    /// Create a new storage layout
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Get the settings file path
    pub fn settings_file(&self) -> File {
        File::new(self.base_dir.join("config.json"))
    }
}

impl Default for StorageLayout {
    fn default() -> Self {
        let base_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".deployctl");

        Self::new(base_dir)
    }
}
