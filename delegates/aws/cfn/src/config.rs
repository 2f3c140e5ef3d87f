//! Tunables for the CloudFormation delegate.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CfnError, Result};

/// Environment variable pointing at a TOML config file.
pub const CONFIG_ENV_VAR: &str = "CFN_DEPLOYER_CONFIG";

/// Delegate configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeployerConfig {
    /// Seconds between stack status checks
    pub poll_interval_secs: u64,

    /// Status checks before giving up on a stack that stays in progress
    pub max_poll_attempts: u32,

    /// Seconds between checks for a newly created bucket
    pub bucket_wait_interval_secs: u64,

    /// Checks before giving up on a newly created bucket
    pub bucket_wait_attempts: u32,

    /// Stack output holding the deployed endpoint
    pub endpoint_output_key: String,

    /// Template file name written under the workspace by bootstrap
    pub template_file_name: String,
}

impl Default for DeployerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            max_poll_attempts: 720,
            bucket_wait_interval_secs: 5,
            bucket_wait_attempts: 20,
            endpoint_output_key: "SkillEndpoint".to_string(),
            template_file_name: "skill-stack.yaml".to_string(),
        }
    }
}

impl DeployerConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: DeployerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CfnError::Config(format!("Failed to read config file {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Load from the file named by `CFN_DEPLOYER_CONFIG`, or use defaults.
    pub fn load() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    /// Reject settings that would make polling spin or never run.
    pub fn validate(&self) -> Result<()> {
        if self.max_poll_attempts == 0 {
            return Err(CfnError::Config("max_poll_attempts must be greater than zero".to_string()));
        }
        if self.bucket_wait_attempts == 0 {
            return Err(CfnError::Config("bucket_wait_attempts must be greater than zero".to_string()));
        }
        if self.poll_interval_secs == 0 || self.bucket_wait_interval_secs == 0 {
            return Err(CfnError::Config("poll intervals must be at least one second".to_string()));
        }
        if self.endpoint_output_key.trim().is_empty() {
            return Err(CfnError::Config("endpoint_output_key must not be empty".to_string()));
        }
        if self.template_file_name.trim().is_empty() {
            return Err(CfnError::Config("template_file_name must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn bucket_wait_interval(&self) -> Duration {
        Duration::from_secs(self.bucket_wait_interval_secs)
    }
}
