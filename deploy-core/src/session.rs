//! Running one delegate across several environments.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{info, warn};

use crate::delegate::DelegateHandle;
use crate::error::Result;
use crate::options::DeployOptions;
use crate::reporter::Reporter;
use crate::result::{validate_deploy_delegate_response, DeployResult};

/// Result of deploying one environment.
#[derive(Debug, Clone)]
pub struct EnvironmentOutcome {
    pub environment: String,
    pub result: DeployResult,
}

/// Results of a multi-environment deploy.
#[derive(Debug, Clone, Default)]
pub struct DeploymentSummary {
    /// Outcomes in invocation order
    pub outcomes: Vec<EnvironmentOutcome>,

    /// State to persist, keyed by environment
    pub deploy_states: BTreeMap<String, Value>,
}

impl DeploymentSummary {
    /// Whether every environment deployed fully.
    pub fn is_all_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_all_step_success)
    }

    /// Environments that did not fully deploy.
    pub fn failed_environments(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| !o.result.is_all_step_success)
            .map(|o| o.environment.as_str())
            .collect()
    }
}

/// Invoke the delegate for each environment in turn.
///
/// A failed environment does not stop the others. An `Err` is returned only
/// for integration errors, including a successful report that breaks the
/// response contract.
pub async fn deploy_environments(
    handle: &DelegateHandle,
    reporter: &dyn Reporter,
    environments: Vec<DeployOptions>,
) -> Result<DeploymentSummary> {
    let mut summary = DeploymentSummary::default();

    for options in environments {
        let environment = options.alexa_region.clone();
        info!(environment = %environment, delegate = handle.delegate_type(), "deploying environment");

        let result = handle.invoke(reporter, options).await?;
        if result.is_all_step_success {
            let report = serde_json::to_value(&result)?;
            validate_deploy_delegate_response(Some(&report))?;
        } else {
            warn!(environment = %environment, "{}", result.result_message);
        }

        summary
            .deploy_states
            .insert(environment.clone(), result.deploy_state.clone());
        summary.outcomes.push(EnvironmentOutcome { environment, result });
    }

    Ok(summary)
}
