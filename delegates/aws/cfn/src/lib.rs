//! CloudFormation deploy delegate for the deployment engine.
//!
//! This delegate stages a build artifact in a versioned S3 bucket and deploys
//! a CloudFormation stack that references it, polling the stack until it
//! reaches a terminal state.

pub mod aws;
pub mod config;
pub mod deployer;
pub mod error;
pub mod model;
pub mod profile;
pub mod provider;
pub mod region;
pub mod resources;
pub mod stack;
pub mod stager;

use std::sync::Arc;

use deploy_core::{DelegateRegistry, DeployDelegate};

pub use config::DeployerConfig;
pub use deployer::{CfnDeployer, CAPABILITY_IAM, RESERVED_PARAMETERS};
pub use error::{CfnError, Result};
pub use profile::{AwsProfileResolver, LinkedProfiles};
pub use stack::{StackDeployment, StackDriver, NO_FAILURE_DETAILS};
pub use stager::ArtifactStager;

/// Type identifier this delegate registers under
pub const DELEGATE_TYPE: &str = "@ask-cli/cfn-deployer";

/// Register the AWS backed delegate.
///
/// Configuration is read when the delegate is loaded, so a broken config file
/// surfaces as a load failure rather than mid-deploy.
pub fn register(registry: &DelegateRegistry, profiles: LinkedProfiles) -> deploy_core::Result<()> {
    registry.register(DELEGATE_TYPE, move || {
        let config = DeployerConfig::load()?;
        Ok(Arc::new(CfnDeployer::with_aws(profiles.clone(), config)) as Arc<dyn DeployDelegate>)
    })
}
