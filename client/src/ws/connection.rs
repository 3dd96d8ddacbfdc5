//! WebSocket binding of the deploy stream
//!
//! Every frame is a JSON text message. WebSocket has no half-close, so the
//! end of the upload is an empty binary frame; the service answers with
//! the rest of its progress and then a Close frame. A connection dropped
//! without a Close frame also ends the inbound half.

use async_trait::async_trait;
use futures::{Sink, SinkExt, Stream, StreamExt};
use http::header::{HeaderValue, AUTHORIZATION, USER_AGENT};
use secrecy::{ExposeSecret, SecretString};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::Error as WsError;
use tracing::{debug, info, warn};
use url::Url;

use crate::deploy::stream::{DeploySink, DeployStream, DeployStreamOpener, ProgressSource};
use crate::errors::ClientError;
use crate::models::deploy::{DeployRequest, ServerMessage};

/// Path of the deploy stream endpoint below the server base URL
pub const DEPLOY_STREAM_PATH: &str = "deploys/stream";

/// Opens deploy streams over WebSocket
pub struct WsConnector {
    url: Url,
    token: Option<SecretString>,
}

impl WsConnector {
    /// Create a connector for the service at `server` (an http or https base URL)
    pub fn new(server: &str, token: Option<SecretString>) -> Result<Self, ClientError> {
        Ok(Self {
            url: build_stream_url(server)?,
            token,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl DeployStreamOpener for WsConnector {
    async fn open_deploy_stream(&self) -> Result<DeployStream, ClientError> {
        let mut request = self.url.as_str().into_client_request()?;
        let headers = request.headers_mut();
        headers.insert(USER_AGENT, HeaderValue::from_static("deployctl"));
        if let Some(token) = &self.token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| ClientError::ConfigError(format!("invalid token: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }

        info!("Connecting to deploy stream: {}", self.url);
        let (ws_stream, _) = connect_async(request).await?;
        let (write, read) = ws_stream.split();

        Ok(DeployStream::new(
            Box::new(WsDeploySink::new(write)),
            Box::new(WsProgressSource::new(read)),
        ))
    }
}

fn build_stream_url(server: &str) -> Result<Url, ClientError> {
    let mut url = Url::parse(server).map_err(|e| ClientError::ConfigError(e.to_string()))?;

    // Change http/https to ws/wss
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        _ => return Err(ClientError::ConfigError("Invalid server URL scheme".to_string())),
    };

    url.set_scheme(scheme)
        .map_err(|_| ClientError::ConfigError("Failed to set scheme".to_string()))?;

    url.set_path(&format!(
        "{}/{}",
        url.path().trim_end_matches('/'),
        DEPLOY_STREAM_PATH
    ));
    url.set_query(None);

    Ok(url)
}

/// Write half of a deploy WebSocket
pub struct WsDeploySink<S> {
    write: S,
    closed: bool,
}

impl<S> WsDeploySink<S> {
    pub fn new(write: S) -> Self {
        Self {
            write,
            closed: false,
        }
    }
}

#[async_trait]
impl<S> DeploySink for WsDeploySink<S>
where
    S: Sink<Message, Error = WsError> + Unpin + Send,
{
    async fn send(&mut self, request: DeployRequest) -> Result<(), ClientError> {
        if self.closed {
            return Err(ClientError::Transport(
                "deploy stream send side already closed".to_string(),
            ));
        }
        let frame = serde_json::to_string(&request)?;
        self.write.send(Message::Text(frame.into())).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ClientError> {
        if self.closed {
            return Err(ClientError::Transport(
                "deploy stream send side already closed".to_string(),
            ));
        }
        self.closed = true;
        debug!("Closing deploy stream send side");
        self.write.send(Message::Binary(Vec::new().into())).await?;
        Ok(())
    }
}

/// Read half of a deploy WebSocket
pub struct WsProgressSource<S> {
    read: S,
}

impl<S> WsProgressSource<S> {
    pub fn new(read: S) -> Self {
        Self { read }
    }
}

#[async_trait]
impl<S> ProgressSource for WsProgressSource<S>
where
    S: Stream<Item = Result<Message, WsError>> + Unpin + Send,
{
    async fn recv(&mut self) -> Result<Option<ServerMessage>, ClientError> {
        loop {
            match self.read.next().await {
                None => return Ok(None),
                // The service may drop the connection instead of sending Close
                Some(Err(WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake)))
                | Some(Err(WsError::ConnectionClosed)) => {
                    debug!("Deploy stream ended without a close handshake");
                    return Ok(None);
                }
                Some(Err(e)) => return Err(e.into()),
                Some(Ok(Message::Text(text))) => {
                    let message: ServerMessage = serde_json::from_str(text.as_str())?;
                    return Ok(Some(message));
                }
                Some(Ok(Message::Close(None))) => return Ok(None),
                Some(Ok(Message::Close(Some(frame)))) => {
                    return match frame.code {
                        CloseCode::Normal | CloseCode::Away => Ok(None),
                        code => {
                            warn!("Deploy stream closed by service: {} {}", u16::from(code), frame.reason.as_str());
                            Err(ClientError::Remote {
                                status: u16::from(code),
                                message: frame.reason.as_str().to_string(),
                            })
                        }
                    };
                }
                Some(Ok(other)) => {
                    debug!("Ignoring non-text frame ({} bytes)", other.len());
                }
            }
        }
    }
}
