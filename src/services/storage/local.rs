//! Report store backed by a local directory.
//!
//! Used with a mounted view of the distributed filesystem (FUSE or NFS
//! gateway) and in development. Storage paths are resolved below `root`.

use std::io;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::BufReader;
use tracing::debug;

use super::{ReportSource, ReportStore};
use crate::error::{AppError, AppResult};

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Local filesystem report store.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a storage path below the root.
    ///
    /// Returns `None` when the path tries to leave the root.
    pub fn resolve(&self, path: &str) -> Option<PathBuf> {
        let mut resolved = self.root.clone();
        for component in Path::new(path.trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        Some(resolved)
    }
}

fn map_io_error(path: &str, err: io::Error) -> AppError {
    match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory | io::ErrorKind::InvalidInput => {
            AppError::NotFound(format!("Report {}", path))
        }
        _ => AppError::Storage(format!("Failed to open {}: {}", path, err)),
    }
}

#[async_trait]
impl ReportStore for LocalStore {
    async fn open(&self, path: &str) -> AppResult<ReportSource> {
        let local_path = self
            .resolve(path)
            .ok_or_else(|| AppError::NotFound(format!("Report {}", path)))?;

        debug!("Opening local report file: {}", local_path.display());

        let file = File::open(&local_path)
            .await
            .map_err(|e| map_io_error(path, e))?;

        let metadata = file.metadata().await.map_err(|e| map_io_error(path, e))?;
        if !metadata.is_file() {
            return Err(AppError::NotFound(format!("Report {}", path)));
        }

        Ok(Box::pin(BufReader::with_capacity(READ_BUFFER_SIZE, file)))
    }

    async fn check(&self) -> AppResult<()> {
        let metadata = tokio::fs::metadata(&self.root).await.map_err(|e| {
            AppError::Storage(format!(
                "Report root {} is not accessible: {}",
                self.root.display(),
                e
            ))
        })?;

        if !metadata.is_dir() {
            return Err(AppError::Storage(format!(
                "Report root {} is not a directory",
                self.root.display()
            )));
        }

        Ok(())
    }

    fn backend(&self) -> &'static str {
        "local"
    }
}
