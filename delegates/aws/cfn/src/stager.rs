//! Staging the build artifact in versioned object storage.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::DeployerConfig;
use crate::error::{CfnError, Result};
use crate::provider::{ObjectStorage, Sleeper};

/// Versioning status that needs no further action
const VERSIONING_ENABLED: &str = "Enabled";

/// Uploads artifacts to a bucket it creates and versions on demand.
pub struct ArtifactStager<'a> {
    storage: &'a dyn ObjectStorage,
    sleeper: &'a dyn Sleeper,
    region: &'a str,
    wait_interval: Duration,
    wait_attempts: u32,
}

impl<'a> ArtifactStager<'a> {
    pub fn new(storage: &'a dyn ObjectStorage, sleeper: &'a dyn Sleeper, region: &'a str, config: &DeployerConfig) -> Self {
        Self {
            storage,
            sleeper,
            region,
            wait_interval: config.bucket_wait_interval(),
            wait_attempts: config.bucket_wait_attempts,
        }
    }

    /// Make sure the bucket exists and is versioned, then upload the file.
    ///
    /// Returns the object's version id. Provider errors are passed through
    /// untouched and nothing is retried here.
    pub async fn upload_to_s3(&self, bucket: &str, key: &str, file_path: &Path) -> Result<Option<String>> {
        if !self.storage.bucket_exists(bucket).await? {
            info!(bucket, region = self.region, "creating artifact bucket");
            self.storage.create_bucket(bucket, self.region).await?;
            self.wait_until_bucket_exists(bucket).await?;
        }

        let versioning = self.storage.bucket_versioning(bucket).await?;
        if versioning.as_deref() != Some(VERSIONING_ENABLED) {
            info!(bucket, status = ?versioning, "enabling bucket versioning");
            self.storage.enable_bucket_versioning(bucket).await?;
        }

        let body = tokio::fs::read(file_path).await?;
        debug!(bucket, key, size = body.len(), "uploading artifact");
        let version = self.storage.put_object(bucket, key, body).await?;

        info!(bucket, key, version = ?version, "artifact uploaded");
        Ok(version)
    }

    /// Bucket creation is eventually consistent; poll until it is visible.
    async fn wait_until_bucket_exists(&self, bucket: &str) -> Result<()> {
        for attempt in 1..=self.wait_attempts {
            if self.storage.bucket_exists(bucket).await? {
                return Ok(());
            }
            debug!(bucket, attempt, "bucket not visible yet");
            if attempt < self.wait_attempts {
                self.sleeper.sleep(self.wait_interval).await;
            }
        }

        Err(CfnError::BucketTimeout {
            bucket: bucket.to_string(),
            attempts: self.wait_attempts,
        })
    }
}
