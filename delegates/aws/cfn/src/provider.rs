//! Seams between the delegate and the cloud provider.
//!
//! The stager and stack driver only talk to these traits. The AWS SDK backed
//! implementations live in [`crate::resources`]; tests substitute in-memory
//! ones.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One stack output as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StackOutput {
    pub output_key: String,
    pub output_value: String,
}

/// Stack status snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackInfo {
    pub status: String,
    pub status_reason: Option<String>,
    pub outputs: Vec<StackOutput>,
}

impl StackInfo {
    /// Value of the output with the given key.
    pub fn output(&self, key: &str) -> Option<&str> {
        self.outputs
            .iter()
            .find(|o| o.output_key == key)
            .map(|o| o.output_value.as_str())
    }
}

/// One entry of a stack's event history.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StackEvent {
    pub logical_resource_id: Option<String>,
    pub resource_type: Option<String>,
    pub resource_status: Option<String>,
    pub resource_status_reason: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Template, parameters and capabilities for a create or update.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StackRequest {
    pub template_body: String,
    pub parameters: BTreeMap<String, String>,
    pub capabilities: Vec<String>,
}

/// Credentials and region a set of clients is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudContext {
    pub aws_profile: String,
    pub region: String,
}

/// Object storage operations used for artifact staging.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Whether the bucket exists and is reachable.
    async fn bucket_exists(&self, bucket: &str) -> Result<bool>;

    /// Create the bucket in the given region.
    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<()>;

    /// Current versioning status, `None` if versioning was never configured.
    async fn bucket_versioning(&self, bucket: &str) -> Result<Option<String>>;

    /// Turn on versioning. Enabling twice is a no-op at the provider.
    async fn enable_bucket_versioning(&self, bucket: &str) -> Result<()>;

    /// Upload an object, returning its version id when versioning is on.
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<Option<String>>;
}

/// Stack orchestration operations.
#[async_trait]
pub trait StackProvider: Send + Sync {
    /// Whether the stack exists and has not been deleted.
    async fn stack_exists(&self, stack_id: &str) -> Result<bool>;

    /// Submit a create, returning the new stack id.
    async fn create_stack(&self, stack_name: &str, request: &StackRequest) -> Result<String>;

    /// Submit an update, returning the stack id.
    async fn update_stack(&self, stack_id: &str, request: &StackRequest) -> Result<String>;

    /// Fetch the current status of the stack.
    async fn describe_stack(&self, stack_id: &str) -> Result<StackInfo>;

    /// Fetch the stack's event history, most recent first.
    async fn describe_stack_events(&self, stack_id: &str) -> Result<Vec<StackEvent>>;
}

/// Builds provider clients for an explicit credential/region context.
#[async_trait]
pub trait CloudClientFactory: Send + Sync {
    /// Default region configured for the AWS profile.
    async fn default_region(&self, aws_profile: &str) -> Result<String>;

    async fn object_storage(&self, context: &CloudContext) -> Result<Arc<dyn ObjectStorage>>;

    async fn stack_provider(&self, context: &CloudContext) -> Result<Arc<dyn StackProvider>>;
}

/// The single suspension point of every polling loop.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
