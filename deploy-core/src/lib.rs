//! Core types and functionality for the deployment engine.
//!
//! This crate provides the backend-agnostic half of the engine: the deploy
//! delegate contract, the registry that resolves delegates by type, the
//! option and result types exchanged with the orchestrator, and progress
//! reporting.

mod delegate;
mod error;
pub mod logging;
mod options;
mod registry;
mod reporter;
mod result;
mod session;

// Re-export core types
pub use delegate::{DelegateHandle, DeployDelegate};
pub use error::{DeployError, Result};
pub use logging::{init_logging, LogLevel};
pub use options::{BootstrapOptions, CodeArtifact, DeployOptions};
pub use registry::{DelegateFactory, DelegateRegistry};
pub use reporter::{ChannelReporter, Reporter, TracingReporter};
pub use result::{validate_deploy_delegate_response, DeployResult, Endpoint};
pub use session::{deploy_environments, DeploymentSummary, EnvironmentOutcome};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
