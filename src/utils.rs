//! File output helpers

use crate::config::FileCollisionAction;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Maximum number of rename attempts when resolving file collisions
const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// Resolve where an artifact should be written, handling collisions according
/// to `action`
///
/// - `Overwrite` returns `path` unchanged
/// - `Skip` returns [`Error::Collision`] if `path` exists
/// - `Rename` returns `path` if free, else the first free `stem (n).ext`
///
/// # Examples
///
/// ```
/// use flow_run_export::utils::resolve_output_path;
/// use flow_run_export::config::FileCollisionAction;
/// use std::path::Path;
///
/// let path = Path::new("/tmp/Invoice_Sync_run_history.xlsx");
/// let target = resolve_output_path(path, FileCollisionAction::Rename).unwrap();
/// // If the file exists, target is /tmp/Invoice_Sync_run_history (1).xlsx
/// ```
pub fn resolve_output_path(path: &Path, action: FileCollisionAction) -> Result<PathBuf> {
    match action {
        FileCollisionAction::Overwrite => Ok(path.to_path_buf()),
        FileCollisionAction::Skip => {
            if path.exists() {
                return Err(Error::Collision {
                    path: path.to_path_buf(),
                });
            }
            Ok(path.to_path_buf())
        }
        FileCollisionAction::Rename => {
            if !path.exists() {
                return Ok(path.to_path_buf());
            }

            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| Error::Other(format!("invalid file name: {}", path.display())))?;
            let extension = path.extension().and_then(|e| e.to_str());
            let parent = path.parent().unwrap_or_else(|| Path::new(""));

            for i in 1..=MAX_RENAME_ATTEMPTS {
                let candidate = match extension {
                    Some(ext) => parent.join(format!("{stem} ({i}).{ext}")),
                    None => parent.join(format!("{stem} ({i})")),
                };
                if !candidate.exists() {
                    return Ok(candidate);
                }
            }

            Err(Error::Collision {
                path: path.to_path_buf(),
            })
        }
    }
}

/// Write `bytes` to `path` without ever exposing a partially written file
///
/// The data goes to a hidden temporary file in the same directory, is flushed
/// to disk and then renamed over `path`. On failure the temporary file is
/// removed.
pub async fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::Other(format!("invalid file name: {}", path.display())))?;
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let temp_path = parent.join(format!(".{file_name}.{:08x}.tmp", rand::random::<u32>()));

    let result = async {
        let mut file = tokio::fs::File::create(&temp_path).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&temp_path, path).await
    }
    .await;

    if let Err(e) = result {
        if let Err(cleanup) = tokio::fs::remove_file(&temp_path).await {
            tracing::debug!(path = %temp_path.display(), error = %cleanup, "could not remove temporary file");
        }
        return Err(e.into());
    }
    Ok(())
}
