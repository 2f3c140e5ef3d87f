//! CloudFormation stack operations.

use async_trait::async_trait;
use aws_sdk_cloudformation::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_cloudformation::types::{Capability, Parameter};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::{CfnError, Result};
use crate::provider::{StackEvent, StackInfo, StackOutput, StackProvider, StackRequest};

/// Status of a stack that only lingers in history
const DELETE_COMPLETE: &str = "DELETE_COMPLETE";

/// Error code CloudFormation uses for unknown stacks and no-op updates
const VALIDATION_ERROR: &str = "ValidationError";

const NO_UPDATES_MESSAGE: &str = "No updates are to be performed";

/// Stack provider backed by CloudFormation.
#[derive(Debug, Clone)]
pub struct CloudFormationStacks {
    client: aws_sdk_cloudformation::Client,
}

impl CloudFormationStacks {
    pub fn new(client: aws_sdk_cloudformation::Client) -> Self {
        Self { client }
    }
}

fn parameters(request: &StackRequest) -> Vec<Parameter> {
    request
        .parameters
        .iter()
        .map(|(key, value)| Parameter::builder().parameter_key(key).parameter_value(value).build())
        .collect()
}

fn capabilities(request: &StackRequest) -> Vec<Capability> {
    request
        .capabilities
        .iter()
        .map(|c| Capability::from(c.as_str()))
        .collect()
}

fn to_chrono(timestamp: &aws_sdk_cloudformation::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp.secs(), timestamp.subsec_nanos())
}

#[async_trait]
impl StackProvider for CloudFormationStacks {
    async fn stack_exists(&self, stack_id: &str) -> Result<bool> {
        match self.client.describe_stacks().stack_name(stack_id).send().await {
            Ok(output) => {
                let status = output
                    .stacks()
                    .first()
                    .and_then(|s| s.stack_status())
                    .map(|s| s.as_str().to_string());
                debug!(stack_id, status = ?status, "checked stack existence");
                Ok(status.is_some_and(|s| s != DELETE_COMPLETE))
            }
            // Unknown stack ids are reported as validation errors
            Err(e) if e.code() == Some(VALIDATION_ERROR) => Ok(false),
            Err(e) => Err(CfnError::provider("DescribeStacks", DisplayErrorContext(&e))),
        }
    }

    async fn create_stack(&self, stack_name: &str, request: &StackRequest) -> Result<String> {
        let output = self
            .client
            .create_stack()
            .stack_name(stack_name)
            .template_body(&request.template_body)
            .set_parameters(Some(parameters(request)))
            .set_capabilities(Some(capabilities(request)))
            .send()
            .await
            .map_err(|e| CfnError::provider("CreateStack", DisplayErrorContext(&e)))?;

        output.stack_id().map(str::to_string).ok_or_else(|| CfnError::Provider {
            operation: "CreateStack",
            message: format!("CreateStack for {} returned no stack id", stack_name),
        })
    }

    async fn update_stack(&self, stack_id: &str, request: &StackRequest) -> Result<String> {
        let result = self
            .client
            .update_stack()
            .stack_name(stack_id)
            .template_body(&request.template_body)
            .set_parameters(Some(parameters(request)))
            .set_capabilities(Some(capabilities(request)))
            .send()
            .await;

        match result {
            Ok(output) => Ok(output.stack_id().unwrap_or(stack_id).to_string()),
            // Nothing changed; the stack stays in its current terminal state
            Err(e) if e.message().is_some_and(|m| m.contains(NO_UPDATES_MESSAGE)) => {
                info!(stack_id, "stack is already up to date");
                Ok(stack_id.to_string())
            }
            Err(e) => Err(CfnError::provider("UpdateStack", DisplayErrorContext(&e))),
        }
    }

    async fn describe_stack(&self, stack_id: &str) -> Result<StackInfo> {
        let output = self
            .client
            .describe_stacks()
            .stack_name(stack_id)
            .send()
            .await
            .map_err(|e| CfnError::provider("DescribeStacks", DisplayErrorContext(&e)))?;

        let stack = output.stacks().first().ok_or_else(|| CfnError::Provider {
            operation: "DescribeStacks",
            message: format!("Stack {} was not found", stack_id),
        })?;

        let outputs = stack
            .outputs()
            .iter()
            .filter_map(|o| match (o.output_key(), o.output_value()) {
                (Some(key), Some(value)) => Some(StackOutput {
                    output_key: key.to_string(),
                    output_value: value.to_string(),
                }),
                _ => None,
            })
            .collect();

        Ok(StackInfo {
            status: stack
                .stack_status()
                .map(|s| s.as_str().to_string())
                .unwrap_or_default(),
            status_reason: stack.stack_status_reason().map(str::to_string),
            outputs,
        })
    }

    async fn describe_stack_events(&self, stack_id: &str) -> Result<Vec<StackEvent>> {
        let output = self
            .client
            .describe_stack_events()
            .stack_name(stack_id)
            .send()
            .await
            .map_err(|e| CfnError::provider("DescribeStackEvents", DisplayErrorContext(&e)))?;

        Ok(output
            .stack_events()
            .iter()
            .map(|event| StackEvent {
                logical_resource_id: event.logical_resource_id().map(str::to_string),
                resource_type: event.resource_type().map(str::to_string),
                resource_status: event.resource_status().map(|s| s.as_str().to_string()),
                resource_status_reason: event.resource_status_reason().map(str::to_string),
                timestamp: event.timestamp().and_then(to_chrono),
            })
            .collect())
    }
}
