//! Application configuration options

use std::path::PathBuf;

use crate::logs::LogOptions;

/// Options shared by every command
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    /// Settings file to use instead of the default location
    pub config_path: Option<PathBuf>,

    /// Cluster to use instead of the configured current cluster
    pub cluster: Option<String>,

    /// Number of `-v` flags given
    pub verbosity: u8,

    /// Emit logs as JSON
    pub json_logs: bool,
}

impl AppOptions {
    /// Logging options derived from the configured level and verbosity
    pub fn log_options(&self, configured: crate::logs::LogLevel) -> LogOptions {
        LogOptions {
            log_level: configured.raised(self.verbosity),
            json_format: self.json_logs,
        }
    }
}
