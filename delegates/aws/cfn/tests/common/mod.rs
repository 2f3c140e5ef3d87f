//! In-memory provider, reporter and sleeper used across the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use deploy_core::Reporter;
use deploy_delegate_cfn::provider::{
    CloudClientFactory, CloudContext, ObjectStorage, Sleeper, StackEvent, StackInfo, StackOutput, StackProvider,
    StackRequest,
};
use deploy_delegate_cfn::{CfnError, Result};

pub const CREATED_STACK_ID: &str = "arn:aws:cloudformation:us-east-1:123456789012:stack/ask-hello/new";

#[derive(Default)]
pub struct MockState {
    pub calls: Vec<String>,
    /// bucket name -> versioning status
    pub buckets: HashMap<String, Option<String>>,
    /// existence checks that still report a new bucket as missing
    pub bucket_propagation_checks: u32,
    pub objects: Vec<(String, String, Vec<u8>)>,
    pub fail_put: Option<String>,
    pub existing_stacks: HashSet<String>,
    pub statuses: VecDeque<StackInfo>,
    pub events: Vec<StackEvent>,
    pub submitted: Vec<StackRequest>,
    pub contexts: Vec<CloudContext>,
}

#[derive(Default)]
pub struct MockCloud {
    pub state: Mutex<MockState>,
}

impl MockCloud {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_state(f: impl FnOnce(&mut MockState)) -> Arc<Self> {
        let cloud = Self::default();
        f(&mut cloud.state.lock().unwrap());
        Arc::new(cloud)
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.state.lock().unwrap().calls.iter().filter(|c| *c == call).count()
    }

    pub fn submitted(&self) -> Vec<StackRequest> {
        self.state.lock().unwrap().submitted.clone()
    }

    fn record(&self, call: &str) {
        self.state.lock().unwrap().calls.push(call.to_string());
    }
}

pub fn status(status: &str) -> StackInfo {
    StackInfo {
        status: status.to_string(),
        status_reason: None,
        outputs: vec![],
    }
}

pub fn complete_with_endpoint(status_name: &str, uri: &str) -> StackInfo {
    StackInfo {
        status: status_name.to_string(),
        status_reason: None,
        outputs: vec![StackOutput {
            output_key: "SkillEndpoint".to_string(),
            output_value: uri.to_string(),
        }],
    }
}

pub fn failed_event(resource: &str, reason: &str) -> StackEvent {
    StackEvent {
        logical_resource_id: Some(resource.to_string()),
        resource_type: Some("AWS::Lambda::Function".to_string()),
        resource_status: Some("CREATE_FAILED".to_string()),
        resource_status_reason: Some(reason.to_string()),
        timestamp: None,
    }
}

#[async_trait]
impl ObjectStorage for MockCloud {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        self.record("HeadBucket");
        let mut state = self.state.lock().unwrap();
        if !state.buckets.contains_key(bucket) {
            return Ok(false);
        }
        if state.bucket_propagation_checks > 0 {
            state.bucket_propagation_checks -= 1;
            return Ok(false);
        }
        Ok(true)
    }

    async fn create_bucket(&self, bucket: &str, _region: &str) -> Result<()> {
        self.record("CreateBucket");
        self.state.lock().unwrap().buckets.entry(bucket.to_string()).or_insert(None);
        Ok(())
    }

    async fn bucket_versioning(&self, bucket: &str) -> Result<Option<String>> {
        self.record("GetBucketVersioning");
        Ok(self.state.lock().unwrap().buckets.get(bucket).cloned().flatten())
    }

    async fn enable_bucket_versioning(&self, bucket: &str) -> Result<()> {
        self.record("PutBucketVersioning");
        self.state
            .lock()
            .unwrap()
            .buckets
            .insert(bucket.to_string(), Some("Enabled".to_string()));
        Ok(())
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<Option<String>> {
        self.record("PutObject");
        let mut state = self.state.lock().unwrap();
        if let Some(message) = state.fail_put.clone() {
            return Err(CfnError::Provider {
                operation: "PutObject",
                message,
            });
        }
        state.objects.push((bucket.to_string(), key.to_string(), body));
        Ok(Some(format!("v{}", state.objects.len())))
    }
}

#[async_trait]
impl StackProvider for MockCloud {
    async fn stack_exists(&self, stack_id: &str) -> Result<bool> {
        self.record("StackExists");
        Ok(self.state.lock().unwrap().existing_stacks.contains(stack_id))
    }

    async fn create_stack(&self, _stack_name: &str, request: &StackRequest) -> Result<String> {
        self.record("CreateStack");
        self.state.lock().unwrap().submitted.push(request.clone());
        Ok(CREATED_STACK_ID.to_string())
    }

    async fn update_stack(&self, stack_id: &str, request: &StackRequest) -> Result<String> {
        self.record("UpdateStack");
        self.state.lock().unwrap().submitted.push(request.clone());
        Ok(stack_id.to_string())
    }

    async fn describe_stack(&self, _stack_id: &str) -> Result<StackInfo> {
        self.record("DescribeStack");
        let mut state = self.state.lock().unwrap();
        let info = if state.statuses.len() > 1 {
            state.statuses.pop_front()
        } else {
            state.statuses.front().cloned()
        };
        info.ok_or_else(|| CfnError::Provider {
            operation: "DescribeStacks",
            message: "no scripted status".to_string(),
        })
    }

    async fn describe_stack_events(&self, _stack_id: &str) -> Result<Vec<StackEvent>> {
        self.record("DescribeStackEvents");
        Ok(self.state.lock().unwrap().events.clone())
    }
}

/// Factory handing out the same mock for every context.
pub struct MockFactory(pub Arc<MockCloud>);

#[async_trait]
impl CloudClientFactory for MockFactory {
    async fn default_region(&self, _aws_profile: &str) -> Result<String> {
        Ok("eu-west-1".to_string())
    }

    async fn object_storage(&self, context: &CloudContext) -> Result<Arc<dyn ObjectStorage>> {
        self.0.record("ObjectStorageClient");
        self.0.state.lock().unwrap().contexts.push(context.clone());
        Ok(self.0.clone())
    }

    async fn stack_provider(&self, context: &CloudContext) -> Result<Arc<dyn StackProvider>> {
        self.0.record("StackClient");
        self.0.state.lock().unwrap().contexts.push(context.clone());
        Ok(self.0.clone())
    }
}

#[derive(Default)]
pub struct RecordingReporter {
    lines: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl Reporter for RecordingReporter {
    fn update_status(&self, message: &str) {
        self.lines.lock().unwrap().push(message.to_string());
    }
}

#[derive(Default)]
pub struct CountingSleeper {
    count: AtomicUsize,
}

impl CountingSleeper {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sleeper for CountingSleeper {
    async fn sleep(&self, _duration: Duration) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}
