//! Inputs handed from the orchestrator to a deploy delegate.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reference to the build artifact produced by packaging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeArtifact {
    /// Path to the packaged build file
    pub build_file: PathBuf,

    /// Whether the artifact changed since the last deploy
    #[serde(default)]
    pub is_modified: bool,
}

/// Options for a single delegate invocation against one environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployOptions {
    /// Caller profile name
    pub profile: String,

    /// Target environment identifier, e.g. `default`, `NA`, `EU`
    pub alexa_region: String,

    /// Identifier of the application being deployed
    pub skill_id: String,

    /// Human readable application name, used for resource naming
    pub skill_name: String,

    /// Build artifact to stage
    pub code: CodeArtifact,

    /// Backend configuration, interpreted by each delegate
    #[serde(default)]
    pub user_config: Value,

    /// State recorded by the previous invocation for this environment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deploy_state: Option<Value>,
}

/// Options for bootstrapping a delegate's configuration in a workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapOptions {
    /// Caller profile name
    pub profile: String,

    /// Workspace directory owned by this delegate
    pub workspace_path: PathBuf,

    /// Compute runtime, e.g. `nodejs18.x`
    pub runtime: String,

    /// Handler entry point, e.g. `index.handler`
    pub handler: String,

    /// Existing configuration to augment
    #[serde(default)]
    pub user_config: Value,
}
