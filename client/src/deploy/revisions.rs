//! Deploy revision registry

use async_trait::async_trait;
use tracing::info;

use crate::errors::ClientError;
use crate::models::deploy::{Deploy, Revision};

/// Label appended to the revision currently serving
pub const CURRENT_MARKER: &str = "(current)";

/// Registry of deploy revisions, trait for testability
#[async_trait]
pub trait RevisionRegistry: Send + Sync {
    /// Fetch every deploy revision of `app`
    async fn list_deploys(&self, app: &str) -> Result<Vec<Deploy>, ClientError>;

    /// Roll `app` back to `revision`
    async fn rollback(&self, app: &str, revision: &Revision) -> Result<(), ClientError>;
}

/// One display row of the revision listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionRow {
    pub label: String,
    pub created_at: String,
    pub description: String,
}

/// Result of listing the revisions of an app
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevisionListing {
    /// The app has never been deployed
    Empty,
    /// Rows ordered newest revision first
    Rows(Vec<RevisionRow>),
}

/// List the revisions of `app`, newest first, with the current one marked
pub async fn list_revisions(
    registry: &dyn RevisionRegistry,
    app: &str,
) -> Result<RevisionListing, ClientError> {
    let deploys = registry.list_deploys(app).await?;
    info!("Fetched {} deploys of app {}", deploys.len(), app);

    if deploys.is_empty() {
        return Ok(RevisionListing::Empty);
    }
    Ok(RevisionListing::Rows(order_revisions(deploys)))
}

/// Sort by revision descending, then label the current revision.
///
/// Labels are applied after sorting so the marker never affects order.
pub fn order_revisions(mut deploys: Vec<Deploy>) -> Vec<RevisionRow> {
    deploys.sort_by(|a, b| b.revision.cmp(&a.revision));

    deploys
        .into_iter()
        .map(|d| RevisionRow {
            label: if d.current {
                format!("{} {}", d.revision, CURRENT_MARKER)
            } else {
                d.revision.to_string()
            },
            created_at: d.created_at,
            description: d.description,
        })
        .collect()
}

/// Roll `app` back to `revision`.
///
/// A single attempt; the registry's error is returned unchanged.
pub async fn rollback(
    registry: &dyn RevisionRegistry,
    app: &str,
    revision: &Revision,
) -> Result<(), ClientError> {
    info!("Rolling back app {} to revision {}", app, revision);
    registry.rollback(app, revision).await
}
