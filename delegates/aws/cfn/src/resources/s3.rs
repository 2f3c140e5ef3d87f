//! S3 bucket and object operations.

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, BucketVersioningStatus, CreateBucketConfiguration, VersioningConfiguration};
use tracing::debug;

use crate::error::{CfnError, Result};
use crate::provider::ObjectStorage;

/// Buckets in this region must be created without a location constraint
const US_EAST_1: &str = "us-east-1";

/// Object storage backed by S3.
#[derive(Debug, Clone)]
pub struct S3Storage {
    client: aws_sdk_s3::Client,
}

impl S3Storage {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(e) => {
                if e.as_service_error().is_some_and(|se| se.is_not_found()) {
                    debug!(bucket, "bucket does not exist");
                    return Ok(false);
                }
                Err(CfnError::provider("HeadBucket", DisplayErrorContext(&e)))
            }
        }
    }

    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<()> {
        let mut request = self.client.create_bucket().bucket(bucket);
        if region != US_EAST_1 {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }

        match request.send().await {
            Ok(_) => Ok(()),
            // Another deploy created it first
            Err(e) if e.as_service_error().is_some_and(|se| se.is_bucket_already_owned_by_you()) => Ok(()),
            Err(e) => Err(CfnError::provider("CreateBucket", DisplayErrorContext(&e))),
        }
    }

    async fn bucket_versioning(&self, bucket: &str) -> Result<Option<String>> {
        let output = self
            .client
            .get_bucket_versioning()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| CfnError::provider("GetBucketVersioning", DisplayErrorContext(&e)))?;

        Ok(output.status().map(|s| s.as_str().to_string()))
    }

    async fn enable_bucket_versioning(&self, bucket: &str) -> Result<()> {
        self.client
            .put_bucket_versioning()
            .bucket(bucket)
            .versioning_configuration(
                VersioningConfiguration::builder()
                    .status(BucketVersioningStatus::Enabled)
                    .build(),
            )
            .send()
            .await
            .map_err(|e| CfnError::provider("PutBucketVersioning", DisplayErrorContext(&e)))?;
        Ok(())
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<Option<String>> {
        let output = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| CfnError::provider("PutObject", DisplayErrorContext(&e)))?;

        Ok(output.version_id().map(str::to_string))
    }
}
