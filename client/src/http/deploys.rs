//! Deploy revision API client

use async_trait::async_trait;

use crate::deploy::revisions::RevisionRegistry;
use crate::errors::ClientError;
use crate::http::client::HttpClient;
use crate::models::deploy::{Deploy, DeployListResponse, Revision, RollbackRequest};

#[async_trait]
impl RevisionRegistry for HttpClient {
    async fn list_deploys(&self, app: &str) -> Result<Vec<Deploy>, ClientError> {
        let url = self.endpoint(&["apps", app, "deploys"]);
        let response: DeployListResponse = self.get(url).await?;
        Ok(response.deploys)
    }

    async fn rollback(&self, app: &str, revision: &Revision) -> Result<(), ClientError> {
        let url = self.endpoint(&["apps", app, "rollback"]);
        let body = RollbackRequest {
            revision: revision.clone(),
        };
        self.post(url, &body).await
    }
}
