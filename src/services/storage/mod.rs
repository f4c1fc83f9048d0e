//! Read-only access to stored report files.
//!
//! Report files live in a hierarchical store addressed by absolute paths such
//! as `/user/rucio01/reports/2015-03-07/http_monitoring_traffic.csv`. The
//! server only ever opens them for reading.

mod local;
mod s3;

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncBufRead;

pub use local::LocalStore;
pub use s3::S3Store;

use crate::config::StorageSettings;
use crate::error::AppResult;

/// An open report file. Dropping it releases the underlying handle.
pub type ReportSource = Pin<Box<dyn AsyncBufRead + Send>>;

/// Storage backend holding the generated reports.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Open the object at `path` for reading.
    ///
    /// Fails with `AppError::NotFound` when nothing exists at `path` and with
    /// `AppError::Storage` when the backend cannot be reached or read.
    async fn open(&self, path: &str) -> AppResult<ReportSource>;

    /// Verify the backend is reachable.
    async fn check(&self) -> AppResult<()>;

    /// Short backend name for logs and readiness output.
    fn backend(&self) -> &'static str;
}

/// Build the store selected by configuration.
pub async fn from_settings(settings: &StorageSettings) -> AppResult<Arc<dyn ReportStore>> {
    let store: Arc<dyn ReportStore> = match settings {
        StorageSettings::Local { root } => Arc::new(LocalStore::new(root.clone())),
        StorageSettings::S3(s3) => Arc::new(S3Store::new(s3).await?),
    };
    Ok(store)
}
