//! Error types for the deployment engine.
//!
//! Only integration and programmer errors live here. Deploy-domain failures
//! (unsupported region, stack rollback, upload failure) are reported inside a
//! [`DeployResult`](crate::DeployResult) instead.

use thiserror::Error;

/// Main error type for deploy delegate integration.
#[derive(Error, Debug)]
pub enum DeployError {
    /// The handle was disposed before use
    #[error("[Fatal]: not instantiated")]
    NotInstantiated,

    /// No delegate instance was supplied when constructing a handle
    #[error("[Fatal]: deploy delegate instance for type \"{0}\" must be provided")]
    MissingInstance(String),

    /// Empty or malformed delegate type identifier
    #[error("[Fatal]: invalid deploy delegate type \"{0}\"")]
    InvalidType(String),

    /// A factory was registered twice for the same type
    #[error("[Fatal]: deploy delegate type \"{0}\" is already registered")]
    AlreadyRegistered(String),

    /// No factory is registered for the requested type
    #[error("Deploy delegate type \"{0}\" is not recognized")]
    NotRecognized(String),

    /// The factory for a recognized type failed
    #[error("Failed to load deploy delegate \"{delegate_type}\": {cause}")]
    FailedToLoad {
        delegate_type: String,
        cause: String,
    },

    /// A backend report violates the response contract
    #[error("[Fatal]: {0}")]
    InvalidResponse(String),

    /// Options handed to a delegate could not be interpreted
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Bootstrap could not resolve its configuration
    #[error("Bootstrap failed: {0}")]
    Bootstrap(String),

    /// Serialization or deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for deploy delegate operations
pub type Result<T> = std::result::Result<T, DeployError>;

impl From<serde_json::Error> for DeployError {
    fn from(err: serde_json::Error) -> Self {
        DeployError::Serialization(err.to_string())
    }
}
