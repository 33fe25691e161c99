//! Discovery of implementor files in a rustdoc output tree.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, trace, warn};

use crate::error::{IndexError, IndexResult};
use crate::trait_path::TraitPath;

/// Name of the directory rustdoc writes implementor files to.
pub const IMPLEMENTORS_DIR: &str = "implementors";

/// A trait index file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraitFile {
    pub trait_path: TraitPath,
    pub path: PathBuf,
}

/// Resolve the `implementors/` directory for a docs root.
///
/// Accepts either the docs output directory (which contains
/// `implementors/`) or the `implementors/` directory itself.
pub async fn implementors_root(root: impl AsRef<Path>) -> IndexResult<PathBuf> {
    let root = root.as_ref();
    let nested = root.join(IMPLEMENTORS_DIR);
    if fs::metadata(&nested)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
    {
        return Ok(nested);
    }

    let meta = fs::metadata(root)
        .await
        .map_err(|e| IndexError::io(root.display(), e))?;
    if !meta.is_dir() {
        return Err(IndexError::Io {
            path: root.display().to_string(),
            message: "not a directory".to_string(),
        });
    }
    Ok(root.to_path_buf())
}

/// List every `trait.*.js` file under `root`, sorted by trait path.
///
/// Trait files outside a crate directory are skipped with a warning.
pub async fn discover(root: impl AsRef<Path>) -> IndexResult<Vec<TraitFile>> {
    let base = implementors_root(root).await?;
    let mut files = Vec::new();
    let mut stack = vec![base.clone()];

    while let Some(dir) = stack.pop() {
        let mut entries = fs::read_dir(&dir)
            .await
            .map_err(|e| IndexError::io(dir.display(), e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| IndexError::io(dir.display(), e))?
        {
            let path = entry.path();
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| IndexError::io(path.display(), e))?;

            if file_type.is_dir() {
                stack.push(path);
                continue;
            }

            let is_trait_file = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("trait.") && n.ends_with(".js"));
            if !is_trait_file {
                trace!(path = %path.display(), "skipping non-trait file");
                continue;
            }

            let relative = path.strip_prefix(&base).unwrap_or(&path);
            let trait_path = match TraitPath::from_relative_path(relative) {
                Ok(trait_path) => trait_path,
                Err(error) => {
                    warn!(path = %path.display(), error = %error, "skipping misplaced trait file");
                    continue;
                }
            };
            files.push(TraitFile { trait_path, path });
        }
    }

    files.sort_by(|a, b| a.trait_path.cmp(&b.trait_path));
    debug!(root = %base.display(), files = files.len(), "discovered implementor files");
    Ok(files)
}
