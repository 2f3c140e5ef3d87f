//! Driving a CloudFormation stack to a terminal state.
//!
//! The driver submits a create or update, polls the stack until the provider
//! stops reporting an in-progress status, and on failure digs the first
//! failing resource's reason out of the event history.

use std::time::Duration;

use deploy_core::Reporter;
use tracing::{debug, info, warn};

use crate::config::DeployerConfig;
use crate::error::{CfnError, Result};
use crate::provider::{Sleeper, StackEvent, StackInfo, StackProvider, StackRequest};

/// Message used when the event log has no failed resource to point at
pub const NO_FAILURE_DETAILS: &str = "could not find details for deploy error";

const IN_PROGRESS_SUFFIX: &str = "_IN_PROGRESS";
const COMPLETE_SUFFIX: &str = "_COMPLETE";
const FAILED_SUFFIX: &str = "_FAILED";
const STACK_RESOURCE_TYPE: &str = "AWS::CloudFormation::Stack";
const USER_INITIATED: &str = "User Initiated";

/// Coarse classification of a provider stack status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackPhase {
    InProgress,
    Succeeded,
    Failed,
}

/// Classify a status string such as `UPDATE_ROLLBACK_COMPLETE`.
pub fn classify_status(status: &str) -> StackPhase {
    if status.ends_with(IN_PROGRESS_SUFFIX) {
        StackPhase::InProgress
    } else if status.ends_with(COMPLETE_SUFFIX) && !status.contains("ROLLBACK") && !status.starts_with("DELETE") {
        StackPhase::Succeeded
    } else {
        StackPhase::Failed
    }
}

/// A stack that reached a healthy terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackDeployment {
    pub stack_id: String,
    pub stack_info: StackInfo,
    pub endpoint_uri: Option<String>,
}

/// Submits stack changes and polls them to completion.
pub struct StackDriver<'a> {
    stacks: &'a dyn StackProvider,
    sleeper: &'a dyn Sleeper,
    reporter: &'a dyn Reporter,
    poll_interval: Duration,
    max_poll_attempts: u32,
    endpoint_output_key: &'a str,
}

impl<'a> StackDriver<'a> {
    pub fn new(
        stacks: &'a dyn StackProvider,
        sleeper: &'a dyn Sleeper,
        reporter: &'a dyn Reporter,
        config: &'a DeployerConfig,
    ) -> Self {
        Self {
            stacks,
            sleeper,
            reporter,
            poll_interval: config.poll_interval(),
            max_poll_attempts: config.max_poll_attempts,
            endpoint_output_key: &config.endpoint_output_key,
        }
    }

    /// Create or update the stack and wait for it to finish.
    pub async fn deploy_stack(
        &self,
        stack_id: Option<&str>,
        stack_name: &str,
        request: &StackRequest,
    ) -> Result<StackDeployment> {
        let stack_id = self.submit(stack_id, stack_name, request).await?;
        self.wait_for_terminal(&stack_id).await
    }

    /// Submit an update when the known stack still exists, otherwise a create.
    ///
    /// A recorded id may point at a stack deleted out-of-band, so existence is
    /// checked rather than assumed.
    pub async fn submit(&self, stack_id: Option<&str>, stack_name: &str, request: &StackRequest) -> Result<String> {
        let existing = match stack_id.filter(|id| !id.is_empty()) {
            Some(id) if self.stacks.stack_exists(id).await? => Some(id),
            _ => None,
        };

        match existing {
            Some(id) => {
                self.reporter.update_status(&format!("Updating stack ({})...", id));
                info!(stack_id = id, "submitting stack update");
                self.stacks.update_stack(id, request).await
            }
            None => {
                self.reporter
                    .update_status("No stack exists or stack has been deleted. Creating stack...");
                info!(stack_name, "submitting stack create");
                let id = self.stacks.create_stack(stack_name, request).await?;
                debug!(stack_id = %id, "stack create accepted");
                Ok(id)
            }
        }
    }

    /// Poll until the stack leaves its in-progress states.
    pub async fn wait_for_terminal(&self, stack_id: &str) -> Result<StackDeployment> {
        let mut attempts = 0;

        loop {
            let info = self.stacks.describe_stack(stack_id).await?;
            attempts += 1;
            self.reporter.update_status(&format_status(&info));

            match classify_status(&info.status) {
                StackPhase::InProgress => {
                    if attempts >= self.max_poll_attempts {
                        warn!(stack_id, attempts, status = %info.status, "giving up waiting for stack");
                        return Err(CfnError::Timeout {
                            stack_id: stack_id.to_string(),
                            attempts,
                        });
                    }
                    self.sleeper.sleep(self.poll_interval).await;
                }
                StackPhase::Succeeded => {
                    info!(stack_id, status = %info.status, "stack deploy complete");
                    let endpoint_uri = info.output(self.endpoint_output_key).map(str::to_string);
                    return Ok(StackDeployment {
                        stack_id: stack_id.to_string(),
                        stack_info: info,
                        endpoint_uri,
                    });
                }
                StackPhase::Failed => {
                    warn!(stack_id, status = %info.status, "stack deploy failed");
                    return Err(self.diagnose_failure(stack_id).await);
                }
            }
        }
    }

    /// Turn the event history into a typed error with the best reason available.
    async fn diagnose_failure(&self, stack_id: &str) -> CfnError {
        let events = match self.stacks.describe_stack_events(stack_id).await {
            Ok(events) => events,
            Err(e) => return e,
        };

        let reason = first_failure_reason(&events).unwrap_or_else(|| NO_FAILURE_DETAILS.to_string());
        CfnError::StackDeploy {
            stack_id: stack_id.to_string(),
            reason,
        }
    }
}

/// Reason of the earliest failed resource in the latest stack operation.
///
/// Events arrive newest first. The latest operation starts at the most recent
/// user-initiated stack event; failures from older operations are only used
/// when the latest one has none.
pub fn first_failure_reason(events: &[StackEvent]) -> Option<String> {
    let operation_start = events
        .iter()
        .position(|e| {
            e.resource_type.as_deref() == Some(STACK_RESOURCE_TYPE)
                && e.resource_status_reason.as_deref() == Some(USER_INITIATED)
        })
        .map(|i| i + 1)
        .unwrap_or(events.len());

    earliest_failure(&events[..operation_start]).or_else(|| earliest_failure(events))
}

fn earliest_failure(events: &[StackEvent]) -> Option<String> {
    events.iter().rev().find_map(|e| {
        let failed = e.resource_status.as_deref().is_some_and(|s| s.ends_with(FAILED_SUFFIX));
        if !failed {
            return None;
        }
        debug!(
            resource = e.logical_resource_id.as_deref().unwrap_or("unknown"),
            status = e.resource_status.as_deref().unwrap_or_default(),
            "found failed stack resource"
        );
        e.resource_status_reason.clone().filter(|r| !r.is_empty())
    })
}

fn format_status(info: &StackInfo) -> String {
    match info.status_reason.as_deref().filter(|r| !r.is_empty()) {
        Some(reason) => format!("{} ({})", info.status, reason),
        None => info.status.clone(),
    }
}
