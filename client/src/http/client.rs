//! HTTP client implementation

use reqwest::{header, Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};
use url::Url;

use crate::errors::ClientError;

/// HTTP client for the deploy service API
pub struct HttpClient {
    client: Client,
    base_url: Url,
    token: Option<SecretString>,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(base_url: &str, token: Option<SecretString>) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent(concat!("deployctl/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| ClientError::ConfigError(format!("invalid server url {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::ConfigError(format!("invalid server url: {}", base_url)));
        }

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build an endpoint URL from path segments, escaping each segment
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header(
                header::AUTHORIZATION,
                format!("Bearer {}", token.expose_secret()),
            ),
            None => request,
        }
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, ClientError> {
        debug!("GET {}", url);

        let response = self.authorize(self.client.get(url)).send().await?;
        let response = check_status("GET", response).await?;

        let body = response.json().await?;
        Ok(body)
    }

    /// Make a POST request whose response body is not needed
    pub async fn post<B: Serialize>(&self, url: Url, body: &B) -> Result<(), ClientError> {
        debug!("POST {}", url);

        let response = self.authorize(self.client.post(url).json(body)).send().await?;
        check_status("POST", response).await?;
        Ok(())
    }
}

/// Turn a non-success response into a remote error carrying the body verbatim
async fn check_status(method: &str, response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    error!("HTTP {} failed: {} - {}", method, status, body);

    let message = match body.trim() {
        "" => status.canonical_reason().unwrap_or("request failed").to_string(),
        text => text.to_string(),
    };
    Err(ClientError::Remote {
        status: status.as_u16(),
        message,
    })
}
