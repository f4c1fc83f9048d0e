//! S3 report store.
//!
//! Reads report objects from an S3 bucket (AWS S3 or MinIO). The storage path
//! without its leading slash is used as the object key.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};
use tracing::{debug, info};

use super::{ReportSource, ReportStore};
use crate::config::S3Settings;
use crate::error::{AppError, AppResult};

/// S3 storage client wrapper.
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    /// Create a new S3 client.
    ///
    /// No request is sent; reachability is left to [`ReportStore::check`].
    pub async fn new(config: &S3Settings) -> AppResult<Self> {
        let credentials =
            Credentials::new(&config.access_key, &config.secret_key, None, None, "hmon");

        let mut s3_config_builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(true); // Required for MinIO

        if let Some(ref endpoint) = config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        let store = Self {
            client: Client::from_conf(s3_config_builder.build()),
            bucket: config.bucket.clone(),
        };

        info!("S3 report store configured: bucket={}", store.bucket);

        Ok(store)
    }

    /// Object key for a storage path.
    pub fn object_key(path: &str) -> &str {
        path.trim_start_matches('/')
    }
}

#[async_trait]
impl ReportStore for S3Store {
    async fn open(&self, path: &str) -> AppResult<ReportSource> {
        let key = Self::object_key(path);
        debug!("Fetching report object s3://{}/{}", self.bucket, key);

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    AppError::NotFound(format!("Report {}", path))
                } else {
                    AppError::Storage(format!(
                        "Failed to get {} from S3: {}",
                        key, service_error
                    ))
                }
            })?;

        Ok(Box::pin(response.body.into_async_read()))
    }

    async fn check(&self) -> AppResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| {
                AppError::Storage(format!(
                    "Failed to access bucket '{}': {}",
                    self.bucket,
                    e.into_service_error()
                ))
            })?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "s3"
    }
}
