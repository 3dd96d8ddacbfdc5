//! Settings file management

use std::collections::BTreeMap;

use secrecy::SecretString;
use serde::Deserialize;

use crate::errors::ClientError;
use crate::filesys::file::File;
use crate::logs::LogLevel;

/// Client settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Cluster used when none is given on the command line
    #[serde(default)]
    pub current_cluster: Option<String>,

    /// Known clusters by name
    #[serde(default)]
    pub clusters: BTreeMap<String, ClusterSettings>,
}

/// Connection settings for one deploy service
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterSettings {
    /// Base URL of the deploy service API
    #[serde(default = "default_server_url")]
    pub server: String,

    /// Bearer token attached to every request
    #[serde(default)]
    pub token: Option<SecretString>,
}

fn default_server_url() -> String {
    "http://localhost:8000/api/v1".to_string()
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            server: default_server_url(),
            token: None,
        }
    }
}

impl Settings {
    /// Load the settings file
    pub async fn load(file: &File) -> Result<Self, ClientError> {
        if !file.exists().await {
            return Err(ClientError::ConfigError(format!(
                "config file not found: {}",
                file.path().display()
            )));
        }
        file.read_json::<Settings>().await
    }

    /// Resolve the cluster to talk to.
    ///
    /// An explicit name wins over `current_cluster`.
    pub fn cluster(&self, name: Option<&str>) -> Result<(String, &ClusterSettings), ClientError> {
        let name = match name.or(self.current_cluster.as_deref()) {
            Some(n) if !n.is_empty() => n,
            _ => {
                return Err(ClientError::ConfigError(
                    "no cluster selected and no current_cluster set".to_string(),
                ))
            }
        };

        self.clusters
            .get(name)
            .map(|c| (name.to_string(), c))
            .ok_or_else(|| ClientError::ConfigError(format!("unknown cluster: {}", name)))
    }
}
