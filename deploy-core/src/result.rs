//! The result contract every deploy delegate reports back.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DeployError, Result};

/// Endpoint produced by a successful deploy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub uri: String,
}

/// Outcome of one delegate invocation for one environment.
///
/// A failed deploy is still a `DeployResult`; only integration errors are
/// returned through the error channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployResult {
    /// Every step, including the stack reaching a healthy terminal state, succeeded
    pub is_all_step_success: bool,

    /// The artifact upload completed, regardless of what followed
    pub is_code_deployed: bool,

    /// State to persist for this environment, possibly partial
    pub deploy_state: Value,

    /// Present only on full success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<Endpoint>,

    /// Human readable summary
    pub result_message: String,
}

impl DeployResult {
    /// Build a fully successful result.
    pub fn success(deploy_state: Value, uri: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            is_all_step_success: true,
            is_code_deployed: true,
            deploy_state,
            endpoint: Some(Endpoint { uri: uri.into() }),
            result_message: message.into(),
        }
    }

    /// Build a failed result that keeps whatever state was established.
    pub fn failure(deploy_state: Value, is_code_deployed: bool, message: impl Into<String>) -> Self {
        Self {
            is_all_step_success: false,
            is_code_deployed,
            deploy_state,
            endpoint: None,
            result_message: message.into(),
        }
    }
}

/// Check a backend's reported result for one environment.
///
/// Each missing field yields its own error so plugin authors can see which
/// part of the contract they broke.
pub fn validate_deploy_delegate_response(result: Option<&Value>) -> Result<()> {
    let result = match result {
        Some(value) if is_truthy(value) => value,
        _ => {
            return Err(DeployError::InvalidResponse(
                "The response from deploy delegate should not be empty.".to_string(),
            ))
        }
    };

    let endpoint = result.get("endpoint").filter(|v| !v.is_null()).ok_or_else(|| {
        DeployError::InvalidResponse("The response from deploy delegate should contain endpoint.".to_string())
    })?;

    if endpoint.get("uri").filter(|v| !v.is_null()).is_none() {
        return Err(DeployError::InvalidResponse(
            "The endpoint from deploy delegate should contain uri.".to_string(),
        ));
    }

    if result.get("deployState").filter(|v| !v.is_null()).is_none() {
        return Err(DeployError::InvalidResponse(
            "The response from deploy delegate should contain deployState.".to_string(),
        ));
    }

    Ok(())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        _ => true,
    }
}
