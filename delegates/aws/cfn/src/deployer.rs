//! The CloudFormation deploy delegate.
//!
//! Validates the invocation, stages the artifact, and drives the stack.
//! Every deploy-domain outcome comes back as a [`DeployResult`]; partial
//! progress (a staged artifact, a submitted stack) stays in its deploy state.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use deploy_core::{BootstrapOptions, DeployDelegate, DeployError, DeployOptions, DeployResult, Reporter};
use serde_json::{json, Map, Value};
use tracing::{error, info, warn};

use crate::aws::AwsClientFactory;
use crate::config::DeployerConfig;
use crate::error::{CfnError, Result};
use crate::model::{CfnDeployState, CfnUserConfig, S3Artifact};
use crate::profile::{AwsProfileResolver, LinkedProfiles};
use crate::provider::{CloudClientFactory, CloudContext, Sleeper, StackRequest, TokioSleeper};
use crate::region::{default_bucket_key, default_bucket_name, default_stack_name, resolve_aws_region};
use crate::stack::StackDriver;
use crate::stager::ArtifactStager;

/// Capability acknowledging that the stack may create IAM resources
pub const CAPABILITY_IAM: &str = "CAPABILITY_IAM";

/// Parameter carrying the application identifier
pub const SKILL_ID_PARAMETER: &str = "SkillId";

/// Parameter names injected by the delegate and forbidden in user config.
pub const RESERVED_PARAMETERS: &[&str] = &[
    SKILL_ID_PARAMETER,
    "LambdaRuntime",
    "LambdaHandler",
    "CodeBucket",
    "CodeKey",
    "CodeVersion",
];

/// State accumulated while an invocation runs.
#[derive(Debug, Default)]
struct DeployProgress {
    state: CfnDeployState,
    is_code_deployed: bool,
}

/// Deploy delegate that stages code in S3 and deploys a CloudFormation stack.
pub struct CfnDeployer {
    profiles: Arc<dyn AwsProfileResolver>,
    clients: Arc<dyn CloudClientFactory>,
    sleeper: Arc<dyn Sleeper>,
    config: DeployerConfig,
}

impl CfnDeployer {
    pub fn new(
        profiles: Arc<dyn AwsProfileResolver>,
        clients: Arc<dyn CloudClientFactory>,
        sleeper: Arc<dyn Sleeper>,
        config: DeployerConfig,
    ) -> Self {
        Self {
            profiles,
            clients,
            sleeper,
            config,
        }
    }

    /// Deployer talking to AWS with real clients and timers.
    pub fn with_aws(profiles: LinkedProfiles, config: DeployerConfig) -> Self {
        Self::new(Arc::new(profiles), Arc::new(AwsClientFactory), Arc::new(TokioSleeper), config)
    }

    pub fn config(&self) -> &DeployerConfig {
        &self.config
    }

    /// Stage the artifact and drive the stack, recording progress as it goes.
    ///
    /// Returns the endpoint uri of a fully successful deploy.
    async fn deploy(
        &self,
        reporter: &dyn Reporter,
        options: &DeployOptions,
        user_config: &CfnUserConfig,
        context: &CloudContext,
        template_path: &Path,
        progress: &mut DeployProgress,
    ) -> Result<String> {
        let template_body = tokio::fs::read_to_string(template_path).await?;

        let bucket = user_config
            .explicit_bucket_name()
            .map(str::to_string)
            .or_else(|| progress.state.s3.as_ref().map(|s| s.bucket.clone()))
            .unwrap_or_else(|| {
                default_bucket_name(&options.skill_id, &options.skill_name, &options.profile, &context.region)
            });
        let key = user_config
            .explicit_bucket_key()
            .map(str::to_string)
            .or_else(|| progress.state.s3.as_ref().map(|s| s.key.clone()))
            .unwrap_or_else(|| default_bucket_key(&options.code.build_file));

        let staged_elsewhere = progress
            .state
            .s3
            .as_ref()
            .map_or(true, |s| s.bucket != bucket || s.key != key);

        if options.code.is_modified || staged_elsewhere {
            reporter.update_status(&format!("Uploading code artifact to s3://{}/{}", bucket, key));
            let storage = self.clients.object_storage(context).await?;
            let stager = ArtifactStager::new(storage.as_ref(), self.sleeper.as_ref(), &context.region, &self.config);
            let version = stager.upload_to_s3(&bucket, &key, &options.code.build_file).await?;

            progress.state.s3 = Some(S3Artifact {
                bucket,
                key,
                object_version: version,
            });
            progress.is_code_deployed = true;
        } else {
            info!(bucket = %bucket, key = %key, "code unchanged, reusing staged artifact");
        }

        let request = StackRequest {
            template_body,
            parameters: self.merge_parameters(options, user_config, progress.state.s3.as_ref()),
            capabilities: merge_capabilities(&user_config.cfn.capabilities),
        };

        let stack_name = user_config
            .stack_name
            .clone()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| default_stack_name(&options.skill_name, &options.alexa_region));

        let stacks = self.clients.stack_provider(context).await?;
        let driver = StackDriver::new(stacks.as_ref(), self.sleeper.as_ref(), reporter, &self.config);

        let stack_id = driver
            .submit(progress.state.stack_id.as_deref(), &stack_name, &request)
            .await?;
        progress.state.stack_id = Some(stack_id.clone());

        let deployment = driver.wait_for_terminal(&stack_id).await?;
        progress.state.outputs = deployment.stack_info.outputs.clone();

        deployment.endpoint_uri.ok_or_else(|| CfnError::StackDeploy {
            stack_id,
            reason: format!(
                "The stack completed without the \"{}\" output",
                self.config.endpoint_output_key
            ),
        })
    }

    /// Caller parameters plus the reserved ones the template expects.
    fn merge_parameters(
        &self,
        options: &DeployOptions,
        user_config: &CfnUserConfig,
        artifact: Option<&S3Artifact>,
    ) -> BTreeMap<String, String> {
        let mut parameters = user_config.cfn.parameters.clone();
        parameters.insert(SKILL_ID_PARAMETER.to_string(), options.skill_id.clone());

        if let Some(runtime) = &user_config.runtime {
            parameters.insert("LambdaRuntime".to_string(), runtime.clone());
        }
        if let Some(handler) = &user_config.handler {
            parameters.insert("LambdaHandler".to_string(), handler.clone());
        }
        if let Some(artifact) = artifact {
            parameters.insert("CodeBucket".to_string(), artifact.bucket.clone());
            parameters.insert("CodeKey".to_string(), artifact.key.clone());
            if let Some(version) = &artifact.object_version {
                parameters.insert("CodeVersion".to_string(), version.clone());
            }
        }

        parameters
    }
}

/// Caller capabilities with the IAM acknowledgement always present.
fn merge_capabilities(requested: &[String]) -> Vec<String> {
    let mut capabilities: Vec<String> = Vec::with_capacity(requested.len() + 1);
    for capability in requested {
        if !capabilities.contains(capability) {
            capabilities.push(capability.clone());
        }
    }
    if !capabilities.iter().any(|c| c == CAPABILITY_IAM) {
        capabilities.push(CAPABILITY_IAM.to_string());
    }
    capabilities
}

fn failure_message(environment: &str, cause: &str) -> String {
    format!("The CloudFormation deploy failed for Alexa region \"{}\": {}", environment, cause)
}

fn unlinked_profile_message(profile: &str) -> String {
    format!(
        "Profile [{}] doesn't have AWS profile linked to it. Please re-configure the profile to link an AWS profile.",
        profile
    )
}

#[async_trait]
impl DeployDelegate for CfnDeployer {
    async fn bootstrap(&self, options: BootstrapOptions) -> deploy_core::Result<Value> {
        let aws_profile = self
            .profiles
            .aws_profile(&options.profile)
            .ok_or_else(|| DeployError::Bootstrap(unlinked_profile_message(&options.profile)))?;

        let aws_region = self.clients.default_region(&aws_profile).await?;
        let template_path = options.workspace_path.join(&self.config.template_file_name);

        let mut user_config = match options.user_config {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(DeployError::InvalidInput(format!(
                    "userConfig must be an object, got {}",
                    other
                )))
            }
        };
        user_config.insert("runtime".to_string(), json!(options.runtime));
        user_config.insert("handler".to_string(), json!(options.handler));
        user_config.insert("templatePath".to_string(), json!(template_path.display().to_string()));
        user_config.insert("awsRegion".to_string(), json!(aws_region));

        info!(profile = %options.profile, region = %aws_region, "bootstrapped CloudFormation deployer");
        Ok(Value::Object(user_config))
    }

    async fn invoke(&self, reporter: &dyn Reporter, options: DeployOptions) -> deploy_core::Result<DeployResult> {
        let environment = options.alexa_region.clone();
        let prior_state = options
            .deploy_state
            .clone()
            .filter(|v| !v.is_null())
            .unwrap_or_else(|| json!({}));
        let rejected = |cause: String| {
            warn!(environment = %environment, "{}", cause);
            Ok(DeployResult::failure(prior_state.clone(), false, failure_message(&environment, &cause)))
        };

        let user_config = match CfnUserConfig::from_value(&options.user_config) {
            Ok(config) => config,
            Err(e) => return rejected(format!("Invalid userConfig: {}", e)),
        };

        let Some(aws_region) = resolve_aws_region(&environment, &user_config) else {
            return rejected(format!(
                "Unsupported Alexa region: {}. Please check your region name or use \"regionalOverrides\" to specify AWS region.",
                environment
            ));
        };

        let Some(aws_profile) = self.profiles.aws_profile(&options.profile) else {
            return rejected(unlinked_profile_message(&options.profile));
        };

        let Some(template_path) = user_config.template_path_for(&environment).cloned() else {
            return rejected("The template path in userConfig must be provided.".to_string());
        };

        if let Some(reserved) = user_config
            .cfn
            .parameters
            .keys()
            .find(|k| RESERVED_PARAMETERS.contains(&k.as_str()))
        {
            return rejected(format!(
                "CloudFormation parameter \"{}\" is reserved. Please use a different name.",
                reserved
            ));
        }

        let context = CloudContext {
            aws_profile,
            region: aws_region,
        };
        let mut progress = DeployProgress {
            state: CfnDeployState::from_prior(options.deploy_state.as_ref()),
            is_code_deployed: false,
        };

        info!(environment = %environment, region = %context.region, "starting CloudFormation deploy");
        match self
            .deploy(reporter, &options, &user_config, &context, &template_path, &mut progress)
            .await
        {
            Ok(uri) => Ok(DeployResult::success(
                progress.state.to_value(),
                uri.clone(),
                format!(
                    "The CloudFormation deploy succeeded for Alexa region \"{}\" with output Lambda ARN: {}.",
                    environment, uri
                ),
            )),
            Err(e) => {
                error!(environment = %environment, error = %e, "CloudFormation deploy failed");
                Ok(DeployResult::failure(
                    progress.state.to_value(),
                    progress.is_code_deployed,
                    failure_message(&environment, &e.to_string()),
                ))
            }
        }
    }
}
