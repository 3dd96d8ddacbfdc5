//! Deploy source acquisition
//!
//! A source is a local directory, a local tarball or an http(s) URL of a
//! tarball. Whatever had to be downloaded or extracted lives in
//! temporaries owned by [`Source`] and is removed when it is dropped.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::{TempDir, TempPath};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;

use crate::deploy::archive;
use crate::errors::ClientError;

/// Where the source of a deploy comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    Remote(Url),
    Local(PathBuf),
}

impl SourceLocation {
    /// Classify a location given on the command line.
    ///
    /// Only http and https URLs are remote; anything else is a path.
    pub fn parse(location: &str) -> Self {
        match Url::parse(location) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => SourceLocation::Remote(url),
            _ => SourceLocation::Local(PathBuf::from(location)),
        }
    }
}

/// A source tree ready to be packaged
#[derive(Debug)]
pub struct Source {
    dir: PathBuf,
    _download: Option<TempPath>,
    _extracted: Option<TempDir>,
}

impl Source {
    /// Resolve `location` into a local directory
    pub async fn acquire(location: &str) -> Result<Source, ClientError> {
        let (path, download) = match SourceLocation::parse(location) {
            SourceLocation::Remote(url) => {
                let temp = download_to_temp(&url).await?;
                (temp.to_path_buf(), Some(temp))
            }
            SourceLocation::Local(path) => (path, None),
        };

        let metadata = tokio::fs::metadata(&path).await?;
        if metadata.is_dir() {
            debug!("Using directory {} as-is", path.display());
            return Ok(Source {
                dir: path,
                _download: download,
                _extracted: None,
            });
        }

        let extracted = archive::extract_temp(&path).await?;
        Ok(Source {
            dir: extracted.path().to_path_buf(),
            _download: download,
            _extracted: Some(extracted),
        })
    }

    /// Root directory of the source tree
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn display_url(url: &Url) -> String {
    format!("{}{}", url.origin().ascii_serialization(), url.path())
}

async fn download_to_temp(url: &Url) -> Result<TempPath, ClientError> {
    info!("Downloading {}", display_url(url));

    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .build()?;

    // Source URLs may carry credentials in the query string
    let mut response = client
        .get(url.clone())
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| ClientError::HttpError(e.without_url()))?;

    let (file, temp_path) = tempfile::Builder::new()
        .prefix("deployctl-download-")
        .suffix(".tar.gz")
        .tempfile()?
        .into_parts();
    let mut file = tokio::fs::File::from_std(file);

    let mut written = 0u64;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| ClientError::HttpError(e.without_url()))?
    {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    file.sync_all().await?;

    debug!("Downloaded {} bytes into {}", written, temp_path.display());
    Ok(temp_path)
}
