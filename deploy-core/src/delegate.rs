//! Deploy delegate interface and the handle the orchestrator calls through.
//!
//! The DeployDelegate trait defines the capability pair every backend offers.
//! DelegateHandle wraps one instance so the orchestrator can call any backend
//! uniformly, and refuses calls once the instance has been disposed.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{DeployError, Result};
use crate::options::{BootstrapOptions, DeployOptions};
use crate::reporter::Reporter;
use crate::result::DeployResult;

/// Core trait for all deploy backends.
#[async_trait]
pub trait DeployDelegate: Send + Sync {
    /// Prepare the backend's configuration for a workspace.
    ///
    /// Returns the augmented user configuration. This is the one call where
    /// validation failures are reported as errors, since nothing has been
    /// deployed yet.
    async fn bootstrap(&self, options: BootstrapOptions) -> Result<Value>;

    /// Deploy to the environment named in `options`.
    ///
    /// Deploy-domain failures must be returned as an unsuccessful
    /// [`DeployResult`]; the error channel is reserved for integration errors.
    async fn invoke(&self, reporter: &dyn Reporter, options: DeployOptions) -> Result<DeployResult>;
}

/// Validated handle over one deploy delegate instance.
pub struct DelegateHandle {
    delegate_type: String,
    instance: RwLock<Option<Arc<dyn DeployDelegate>>>,
}

impl DelegateHandle {
    /// Wrap a delegate instance.
    ///
    /// Fails at construction time when the instance or its type is missing,
    /// so integration mistakes show up when the backend is loaded rather than
    /// in the middle of a deploy.
    pub fn new(delegate_type: impl Into<String>, instance: Option<Arc<dyn DeployDelegate>>) -> Result<Self> {
        let delegate_type = delegate_type.into();
        if delegate_type.trim().is_empty() {
            return Err(DeployError::InvalidType(delegate_type));
        }

        let instance = instance.ok_or_else(|| DeployError::MissingInstance(delegate_type.clone()))?;

        Ok(Self {
            delegate_type,
            instance: RwLock::new(Some(instance)),
        })
    }

    /// The type identifier this handle was created for.
    pub fn delegate_type(&self) -> &str {
        &self.delegate_type
    }

    /// Drop the wrapped instance. Later calls fail with `NotInstantiated`.
    pub fn dispose(&self) {
        let mut instance = self.instance.write().unwrap_or_else(PoisonError::into_inner);
        *instance = None;
    }

    /// Whether the handle still holds an instance.
    pub fn is_instantiated(&self) -> bool {
        self.instance.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    fn current(&self) -> Result<Arc<dyn DeployDelegate>> {
        self.instance
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(DeployError::NotInstantiated)
    }

    /// Forward to the instance's `bootstrap`.
    pub async fn bootstrap(&self, options: BootstrapOptions) -> Result<Value> {
        let instance = self.current()?;
        instance.bootstrap(options).await
    }

    /// Forward to the instance's `invoke`.
    pub async fn invoke(&self, reporter: &dyn Reporter, options: DeployOptions) -> Result<DeployResult> {
        let instance = self.current()?;
        instance.invoke(reporter, options).await
    }
}

impl std::fmt::Debug for DelegateHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelegateHandle")
            .field("delegate_type", &self.delegate_type)
            .field("instantiated", &self.is_instantiated())
            .finish()
    }
}
