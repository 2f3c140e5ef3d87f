//! Mapping caller profiles to linked AWS credential profiles.

use std::collections::HashMap;

/// Caller profile that takes its credentials from the environment
pub const ENVIRONMENT_PROFILE: &str = "__ENVIRONMENT_ASK_PROFILE__";

/// AWS profile marker meaning "use credentials from environment variables"
pub const ENVIRONMENT_AWS_CREDENTIALS: &str = "__AWS_CREDENTIALS_IN_ENVIRONMENT_VARIABLE__";

/// Resolves which AWS profile a caller profile is linked to.
pub trait AwsProfileResolver: Send + Sync {
    fn aws_profile(&self, profile: &str) -> Option<String>;
}

/// Explicit profile links, usually read by the host from its own config.
#[derive(Debug, Clone, Default)]
pub struct LinkedProfiles {
    links: HashMap<String, String>,
}

impl LinkedProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link a caller profile to an AWS profile.
    pub fn link(mut self, profile: impl Into<String>, aws_profile: impl Into<String>) -> Self {
        self.links.insert(profile.into(), aws_profile.into());
        self
    }
}

impl AwsProfileResolver for LinkedProfiles {
    fn aws_profile(&self, profile: &str) -> Option<String> {
        if profile == ENVIRONMENT_PROFILE {
            let has_keys = ["AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY"]
                .iter()
                .all(|var| std::env::var(var).map(|v| !v.is_empty()).unwrap_or(false));
            return has_keys.then(|| ENVIRONMENT_AWS_CREDENTIALS.to_string());
        }

        self.links.get(profile).filter(|p| !p.is_empty()).cloned()
    }
}
