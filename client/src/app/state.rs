//! Application state: loaded settings and the selected cluster

use tracing::info;

use crate::app::options::AppOptions;
use crate::errors::ClientError;
use crate::filesys::file::File;
use crate::http::client::HttpClient;
use crate::storage::layout::StorageLayout;
use crate::storage::settings::Settings;
use crate::ws::connection::WsConnector;

/// Settings loaded for one command invocation
#[derive(Debug)]
pub struct AppState {
    settings: Settings,
    cluster_override: Option<String>,
}

/// Clients bound to one cluster
pub struct Connection {
    /// Name of the cluster in the settings file
    pub cluster: String,

    /// Revision registry endpoints
    pub registry: HttpClient,

    /// Deploy stream endpoint
    pub streams: WsConnector,
}

impl AppState {
    /// Load the settings file selected by `options`
    pub async fn load(options: &AppOptions) -> Result<Self, ClientError> {
        let file = match &options.config_path {
            Some(path) => File::new(path),
            None => StorageLayout::default().settings_file(),
        };

        let settings = Settings::load(&file).await?;
        Ok(Self::new(settings, options.cluster.clone()))
    }

    pub fn new(settings: Settings, cluster_override: Option<String>) -> Self {
        Self {
            settings,
            cluster_override,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Build the clients for the selected cluster
    pub fn connect(&self) -> Result<Connection, ClientError> {
        let (name, cluster) = self.settings.cluster(self.cluster_override.as_deref())?;

        let registry = HttpClient::new(&cluster.server, cluster.token.clone())?;
        let streams = WsConnector::new(&cluster.server, cluster.token.clone())?;
        info!(
            "Using cluster {}: api {}, deploy stream {}",
            name,
            registry.base_url(),
            streams.url()
        );

        Ok(Connection {
            cluster: name,
            registry,
            streams,
        })
    }
}
