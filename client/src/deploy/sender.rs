//! Chunked archive upload

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info, warn};

use crate::deploy::stream::DeploySink;
use crate::errors::ClientError;
use crate::models::deploy::DeployRequest;

/// Size of one `File` frame payload
pub const CHUNK_SIZE: usize = 1024;

/// Stream `archive` to `sink` as `File` frames of `chunk_size` bytes.
///
/// The last frame carries only the bytes actually read and may be
/// shorter. The sink is closed exactly once whatever the outcome; if the
/// upload already failed, that failure is returned over a close error.
/// Returns the number of bytes sent.
pub async fn send_archive<R>(
    archive: R,
    mut sink: Box<dyn DeploySink>,
    chunk_size: usize,
) -> Result<u64, ClientError>
where
    R: AsyncRead + Unpin + Send,
{
    info!("Sending app tarball...");

    let uploaded = pump_chunks(archive, sink.as_mut(), chunk_size).await;
    let closed = sink.close().await;

    match (uploaded, closed) {
        (Ok(sent), Ok(())) => {
            info!("Tarball sent ({} bytes)", sent);
            Ok(sent)
        }
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_err)) => {
            warn!("Failed to close deploy stream after upload error: {}", close_err);
            Err(e)
        }
    }
}

async fn pump_chunks<R>(
    mut archive: R,
    sink: &mut dyn DeploySink,
    chunk_size: usize,
) -> Result<u64, ClientError>
where
    R: AsyncRead + Unpin + Send,
{
    if chunk_size == 0 {
        return Err(ClientError::ValidationError("chunk size must be positive".to_string()));
    }

    let mut buf = vec![0u8; chunk_size];
    let mut sent = 0u64;

    loop {
        let n = read_block(&mut archive, &mut buf).await?;
        if n == 0 {
            return Ok(sent);
        }

        sink.send(DeployRequest::File {
            chunk: buf[..n].to_vec(),
        })
        .await?;

        sent += n as u64;
        debug!("Sent chunk of {} bytes ({} total)", n, sent);
    }
}

/// Fill `buf` from `reader`, stopping early only at end of input
async fn read_block<R>(reader: &mut R, buf: &mut [u8]) -> Result<usize, ClientError>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
