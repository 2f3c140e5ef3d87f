//! AWS client construction for an explicit profile and region.

use std::sync::Arc;

use async_trait::async_trait;
use aws_config::default_provider::region::DefaultRegionChain;
use aws_config::{BehaviorVersion, Region};
use tracing::debug;

use crate::error::Result;
use crate::profile::ENVIRONMENT_AWS_CREDENTIALS;
use crate::provider::{CloudClientFactory, CloudContext, ObjectStorage, StackProvider};
use crate::resources::cloudformation::CloudFormationStacks;
use crate::resources::s3::S3Storage;

/// Region used when neither the environment nor the profile names one
pub const FALLBACK_REGION: &str = "us-east-1";

/// Shared function to create AWS config for a profile and region
pub async fn get_config(context: &CloudContext) -> aws_types::SdkConfig {
    let loader = aws_config::defaults(BehaviorVersion::latest()).region(Region::new(context.region.clone()));

    let loader = if context.aws_profile == ENVIRONMENT_AWS_CREDENTIALS {
        loader
    } else {
        loader.profile_name(&context.aws_profile)
    };

    loader.load().await
}

/// Client factory backed by the AWS SDK.
#[derive(Debug, Clone, Copy, Default)]
pub struct AwsClientFactory;

#[async_trait]
impl CloudClientFactory for AwsClientFactory {
    async fn default_region(&self, aws_profile: &str) -> Result<String> {
        let chain = DefaultRegionChain::builder();
        let chain = if aws_profile == ENVIRONMENT_AWS_CREDENTIALS {
            chain
        } else {
            chain.profile_name(aws_profile)
        };

        let region = chain
            .build()
            .region()
            .await
            .map(|r| r.as_ref().to_string())
            .unwrap_or_else(|| FALLBACK_REGION.to_string());

        debug!(aws_profile, region = %region, "resolved default region");
        Ok(region)
    }

    async fn object_storage(&self, context: &CloudContext) -> Result<Arc<dyn ObjectStorage>> {
        let config = get_config(context).await;
        Ok(Arc::new(S3Storage::new(aws_sdk_s3::Client::new(&config))))
    }

    async fn stack_provider(&self, context: &CloudContext) -> Result<Arc<dyn StackProvider>> {
        let config = get_config(context).await;
        Ok(Arc::new(CloudFormationStacks::new(aws_sdk_cloudformation::Client::new(&config))))
    }
}
