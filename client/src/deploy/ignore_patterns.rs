//! Per-project ignore patterns

use std::path::Path;

use tracing::debug;

use crate::errors::ClientError;
use crate::filesys::file::File;

/// Name of the ignore file looked up at the source root
pub const IGNORE_FILE_NAME: &str = ".deployignore";

/// Read the ignore patterns of the source tree rooted at `root`.
///
/// A missing ignore file yields no patterns. Blank lines are skipped and
/// the remaining lines are returned in file order.
pub async fn load_ignore_patterns(root: &Path) -> Result<Vec<String>, ClientError> {
    let file = File::new(root.join(IGNORE_FILE_NAME));

    let Some(contents) = file.read_string_if_exists().await? else {
        debug!("No {} found under {}", IGNORE_FILE_NAME, root.display());
        return Ok(Vec::new());
    };

    let patterns: Vec<String> = contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect();

    debug!("Loaded {} ignore patterns from {}", patterns.len(), file.path().display());
    Ok(patterns)
}
