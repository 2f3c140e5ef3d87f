//! Error types for the CloudFormation delegate.

use std::fmt;

use deploy_core::DeployError;
use thiserror::Error;

/// Errors raised while staging artifacts or driving a stack.
#[derive(Error, Debug)]
pub enum CfnError {
    /// A provider call failed; the message is the provider's own
    #[error("{message}")]
    Provider { operation: &'static str, message: String },

    /// The stack reached a failed terminal state
    #[error("{reason}")]
    StackDeploy { stack_id: String, reason: String },

    /// The stack did not reach a terminal state within the poll budget
    #[error("Stack {stack_id} did not reach a terminal state after {attempts} status checks")]
    Timeout { stack_id: String, attempts: u32 },

    /// A newly created bucket never became visible
    #[error("Bucket {bucket} was not available after {attempts} checks")]
    BucketTimeout { bucket: String, attempts: u32 },

    /// Reading the artifact or template failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Delegate configuration is invalid
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for delegate operations
pub type Result<T> = std::result::Result<T, CfnError>;

impl CfnError {
    /// Wrap a provider error for the named operation.
    pub fn provider<E: fmt::Display>(operation: &'static str, err: E) -> Self {
        CfnError::Provider {
            operation,
            message: err.to_string(),
        }
    }

    /// Stack id the error refers to, if a stack mutation was already submitted.
    pub fn stack_id(&self) -> Option<&str> {
        match self {
            CfnError::StackDeploy { stack_id, .. } | CfnError::Timeout { stack_id, .. } => Some(stack_id),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for CfnError {
    fn from(err: toml::de::Error) -> Self {
        CfnError::Config(err.to_string())
    }
}

impl From<CfnError> for DeployError {
    fn from(err: CfnError) -> Self {
        match err {
            CfnError::Config(message) => DeployError::Config(message),
            other => DeployError::Bootstrap(other.to_string()),
        }
    }
}
