//! Source tree packaging
//!
//! Deploy sources travel as gzip-compressed tarballs. Both directions run
//! on the blocking pool and hand back guards that remove their temporary
//! files or directories when dropped.

use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use ignore::WalkBuilder;
use tempfile::{TempDir, TempPath};
use tracing::{debug, info};

use crate::errors::ClientError;

/// Package `dir` into a temporary tarball, skipping entries matched by
/// `patterns`.
///
/// Patterns follow gitignore rules, so a later `!pattern` re-includes
/// what an earlier one excluded. The returned path is deleted on drop.
pub async fn create_temp(
    dir: &Path,
    app: &str,
    patterns: &[String],
) -> Result<TempPath, ClientError> {
    let dir = dir.to_path_buf();
    let prefix = format!("{}-", app);
    let patterns = patterns.to_vec();

    tokio::task::spawn_blocking(move || create_blocking(&dir, &prefix, &patterns)).await?
}

/// Unpack the gzip tarball at `path` into a temporary directory that is
/// deleted on drop.
pub async fn extract_temp(path: &Path) -> Result<TempDir, ClientError> {
    let path = path.to_path_buf();

    tokio::task::spawn_blocking(move || extract_blocking(&path)).await?
}

fn build_matcher(root: &Path, patterns: &[String]) -> Result<Gitignore, ClientError> {
    let mut builder = GitignoreBuilder::new(root);
    for pattern in patterns {
        builder.add_line(None, pattern).map_err(|e| {
            ClientError::ValidationError(format!("invalid ignore pattern {:?}: {}", pattern, e))
        })?;
    }
    builder
        .build()
        .map_err(|e| ClientError::ValidationError(e.to_string()))
}

fn create_blocking(dir: &Path, prefix: &str, patterns: &[String]) -> Result<TempPath, ClientError> {
    let matcher = build_matcher(dir, patterns)?;

    let (file, temp_path) = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(".tar.gz")
        .tempfile()?
        .into_parts();

    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    // Store links as links; a dangling one must not abort packaging
    builder.follow_symlinks(false);

    let walker = WalkBuilder::new(dir)
        .standard_filters(false)
        .hidden(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(move |entry| {
            if entry.depth() == 0 {
                return true;
            }
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            !matcher.matched(entry.path(), is_dir).is_ignore()
        })
        .build();

    let mut entries = 0usize;
    for entry in walker {
        let entry = entry.map_err(|e| ClientError::ArchiveError(e.to_string()))?;
        if entry.depth() == 0 {
            continue;
        }

        let relative = relative_to(dir, entry.path())?;
        let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
        if is_dir {
            builder.append_dir(&relative, entry.path())?;
        } else {
            builder.append_path_with_name(entry.path(), &relative)?;
        }
        entries += 1;
    }

    let file = builder.into_inner()?.finish()?;
    file.sync_all()?;

    info!("Packaged {} entries of {} into {}", entries, dir.display(), temp_path.display());
    Ok(temp_path)
}

fn extract_blocking(path: &Path) -> Result<TempDir, ClientError> {
    let target = tempfile::Builder::new().prefix("deployctl-src-").tempdir()?;

    let file = fs::File::open(path)?;
    let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
    archive
        .unpack(target.path())
        .map_err(|e| ClientError::ArchiveError(format!("{}: {}", path.display(), e)))?;

    debug!("Extracted {} into {}", path.display(), target.path().display());
    Ok(target)
}

fn relative_to(root: &Path, path: &Path) -> Result<PathBuf, ClientError> {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .map_err(|_| {
            ClientError::ArchiveError(format!(
                "{} is outside of {}",
                path.display(),
                root.display()
            ))
        })
}
