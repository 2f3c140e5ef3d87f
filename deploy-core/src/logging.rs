//! Log setup for hosts embedding the engine.

use tracing_subscriber::EnvFilter;

use crate::error::{DeployError, Result};

/// Verbosity presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Normal,
    Quiet,
}

impl LogLevel {
    /// Filter directive for this level.
    pub fn directive(self) -> &'static str {
        match self {
            LogLevel::Debug => "deploy_core=debug,deploy_delegate_cfn=debug",
            LogLevel::Normal => "deploy_core=info,deploy_delegate_cfn=info",
            LogLevel::Quiet => "deploy_core=error,deploy_delegate_cfn=error",
        }
    }
}

/// Install a global fmt subscriber.
///
/// `RUST_LOG` takes precedence over the preset when set.
pub fn init_logging(level: LogLevel) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| DeployError::Config(format!("Failed to initialize logging: {}", e)))
}
