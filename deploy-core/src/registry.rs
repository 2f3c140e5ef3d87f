//! Registry for resolving deploy delegates by type identifier.
//!
//! Backends register a factory under a type string such as
//! `@ask-cli/cfn-deployer`. The orchestrator loads a handle by that string
//! without knowing which implementation sits behind it.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::delegate::{DelegateHandle, DeployDelegate};
use crate::error::{DeployError, Result};

/// Type for a function that creates a delegate instance.
pub type DelegateFactory = Arc<dyn Fn() -> anyhow::Result<Arc<dyn DeployDelegate>> + Send + Sync>;

/// Registry of delegate factories.
#[derive(Clone, Default)]
pub struct DelegateRegistry {
    /// Map of delegate types to their factories
    factories: Arc<RwLock<HashMap<String, DelegateFactory>>>,
}

impl DelegateRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for a delegate type.
    pub fn register<F>(&self, delegate_type: &str, factory: F) -> Result<()>
    where
        F: Fn() -> anyhow::Result<Arc<dyn DeployDelegate>> + Send + Sync + 'static,
    {
        if delegate_type.trim().is_empty() || delegate_type.chars().any(char::is_whitespace) {
            return Err(DeployError::InvalidType(delegate_type.to_string()));
        }

        let mut factories = self.factories.write().unwrap_or_else(PoisonError::into_inner);
        if factories.contains_key(delegate_type) {
            return Err(DeployError::AlreadyRegistered(delegate_type.to_string()));
        }

        debug!(delegate_type, "registering deploy delegate");
        factories.insert(delegate_type.to_string(), Arc::new(factory));
        Ok(())
    }

    /// Whether a factory exists for the type.
    pub fn is_registered(&self, delegate_type: &str) -> bool {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(delegate_type)
    }

    /// Registered type identifiers, sorted.
    pub fn types(&self) -> Vec<String> {
        let factories = self.factories.read().unwrap_or_else(PoisonError::into_inner);
        let mut types: Vec<String> = factories.keys().cloned().collect();
        types.sort();
        types
    }

    /// Create a new handle for a delegate type.
    pub fn load(&self, delegate_type: &str) -> Result<DelegateHandle> {
        let factory = {
            let factories = self.factories.read().unwrap_or_else(PoisonError::into_inner);
            factories
                .get(delegate_type)
                .cloned()
                .ok_or_else(|| DeployError::NotRecognized(delegate_type.to_string()))?
        };

        let instance = factory().map_err(|e| DeployError::FailedToLoad {
            delegate_type: delegate_type.to_string(),
            cause: format!("{:#}", e),
        })?;

        debug!(delegate_type, "loaded deploy delegate");
        DelegateHandle::new(delegate_type, Some(instance))
    }
}

impl std::fmt::Debug for DelegateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelegateRegistry").field("types", &self.types()).finish()
    }
}
