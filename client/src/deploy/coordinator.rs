//! Deploy stream coordination
//!
//! A deploy sends one `Info` frame, then runs the archive upload and the
//! progress relay side by side over the same stream. The upload finishing
//! does not end the deploy: the service usually keeps reporting progress
//! after it has consumed the last chunk, so the relay runs until the
//! service closes its side.

use std::path::Path;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::deploy::receiver::relay_progress;
use crate::deploy::sender::{send_archive, CHUNK_SIZE};
use crate::deploy::stream::{DeployStream, DeployStreamOpener};
use crate::errors::ClientError;
use crate::models::deploy::{DeployInfo, DeployRequest};

/// Deploy options
#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// Payload size of each `File` frame
    pub chunk_size: usize,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
        }
    }
}

/// What a successful deploy exchanged
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployOutcome {
    pub bytes_sent: u64,
    pub messages_received: u64,
}

enum Finished {
    Upload(u64),
    Relay(u64),
}

/// Open a deploy stream and push the archive at `archive` through it,
/// relaying progress to `out`.
pub async fn deploy<W>(
    opener: &dyn DeployStreamOpener,
    info: DeployInfo,
    archive: &Path,
    out: W,
    options: &DeployOptions,
) -> Result<DeployOutcome, ClientError>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let file = tokio::fs::File::open(archive).await?;
    let stream = opener.open_deploy_stream().await?;
    stream_deploy(info, file, stream, out, options).await
}

/// Run one deploy over an already open stream.
///
/// Returns only once both the upload and the relay have terminated. If
/// either fails, the first failure to complete is the result and any
/// later failure is discarded.
pub async fn stream_deploy<R, W>(
    info: DeployInfo,
    archive: R,
    stream: DeployStream,
    out: W,
    options: &DeployOptions,
) -> Result<DeployOutcome, ClientError>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let DeployStream { mut sink, source } = stream;

    info!("Starting deploy of app {}", info.app);
    if let Err(e) = sink.send(DeployRequest::Info(info)).await {
        if let Err(close_err) = sink.close().await {
            warn!("Failed to close deploy stream after info error: {}", close_err);
        }
        return Err(e);
    }

    let chunk_size = options.chunk_size;
    let mut tasks = JoinSet::new();
    tasks.spawn(async move { send_archive(archive, sink, chunk_size).await.map(Finished::Upload) });
    tasks.spawn(async move { relay_progress(source, out).await.map(Finished::Relay) });

    let mut outcome = DeployOutcome::default();
    let mut first_error: Option<ClientError> = None;

    while let Some(joined) = tasks.join_next().await {
        match joined.map_err(ClientError::from).and_then(|result| result) {
            Ok(Finished::Upload(bytes)) => outcome.bytes_sent = bytes,
            Ok(Finished::Relay(messages)) => outcome.messages_received = messages,
            Err(e) if first_error.is_none() => {
                info!("Deploy task failed: {}", e);
                first_error = Some(e);
            }
            Err(e) => debug!("Discarding later deploy failure: {}", e),
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => {
            info!(
                "Deploy finished: {} bytes sent, {} progress messages",
                outcome.bytes_sent, outcome.messages_received
            );
            Ok(outcome)
        }
    }
}
