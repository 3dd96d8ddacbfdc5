//! Progress relay from the deploy service to the operator

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::deploy::stream::ProgressSource;
use crate::errors::ClientError;

/// Write every message text from `source` to `out` as it arrives.
///
/// Texts are written verbatim, one write per message, and flushed
/// immediately. Returns the number of messages relayed once the service
/// closes its side.
pub async fn relay_progress<W>(
    mut source: Box<dyn ProgressSource>,
    mut out: W,
) -> Result<u64, ClientError>
where
    W: AsyncWrite + Unpin + Send,
{
    let mut relayed = 0u64;

    while let Some(message) = source.recv().await? {
        out.write_all(message.text.as_bytes()).await?;
        out.flush().await?;
        relayed += 1;
    }

    debug!("Deploy service closed the stream after {} messages", relayed);
    Ok(relayed)
}
