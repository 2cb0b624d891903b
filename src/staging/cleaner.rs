// ABOUTME: Empties the staging root once a deployment attempt is over.
// ABOUTME: Removes every entry but keeps the root itself, so the bind mount source survives.

use std::path::{Path, PathBuf};

use super::StagingError;

#[derive(Debug, Clone)]
pub struct Cleaner {
    root: PathBuf,
}

impl Cleaner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Remove every entry under the root and return how many were removed.
    ///
    /// A missing root counts as already clean. Every entry is attempted; the
    /// first failure is returned after the sweep.
    pub async fn clean(&self) -> Result<usize, StagingError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(source) => {
                return Err(StagingError::List {
                    path: self.root.clone(),
                    source,
                });
            }
        };

        let mut removed = 0;
        let mut first_error = None;

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(source) => {
                    return Err(StagingError::List {
                        path: self.root.clone(),
                        source,
                    });
                }
            };

            let path = entry.path();
            match remove_entry(&path).await {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "removed staged entry");
                    removed += 1;
                }
                Err(source) => {
                    tracing::warn!(path = %path.display(), error = %source, "failed to remove staged entry");
                    first_error.get_or_insert(StagingError::Remove { path, source });
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(removed),
        }
    }
}

async fn remove_entry(path: &Path) -> std::io::Result<()> {
    // symlink_metadata so a link to a directory is unlinked, not followed.
    let meta = tokio::fs::symlink_metadata(path).await?;
    if meta.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    }
}
