//! Environment to AWS region resolution and resource naming.

use std::path::Path;

use chrono::Utc;
use uuid::Uuid;

use crate::model::CfnUserConfig;

/// Environment used when no specific one is targeted
pub const DEFAULT_ENVIRONMENT: &str = "default";

/// Built-in environment to AWS region mapping.
const REGION_MAPPING: &[(&str, &str)] = &[
    (DEFAULT_ENVIRONMENT, "us-east-1"),
    ("NA", "us-east-1"),
    ("EU", "eu-west-1"),
    ("FE", "us-west-2"),
];

/// S3 bucket names are limited to 63 characters.
const MAX_BUCKET_NAME_LEN: usize = 63;

/// Characters of the naming hash kept in generated bucket names.
const BUCKET_HASH_LEN: usize = 12;

/// Look up the built-in AWS region for an environment.
pub fn mapped_region(environment: &str) -> Option<&'static str> {
    REGION_MAPPING
        .iter()
        .find(|(env, _)| *env == environment)
        .map(|(_, region)| *region)
}

/// Resolve the AWS region an environment deploys to.
///
/// An explicit per-environment override wins; the `default` environment then
/// honours the top-level `awsRegion`; otherwise the built-in mapping applies.
pub fn resolve_aws_region(environment: &str, config: &CfnUserConfig) -> Option<String> {
    if let Some(region) = config
        .regional_override(environment)
        .and_then(|o| o.aws_region.as_deref())
        .filter(|r| !r.is_empty())
    {
        return Some(region.to_string());
    }

    if environment == DEFAULT_ENVIRONMENT {
        if let Some(region) = config.aws_region.as_deref().filter(|r| !r.is_empty()) {
            return Some(region.to_string());
        }
    }

    mapped_region(environment).map(str::to_string)
}

/// Deterministic default bucket name for an application, profile and region.
///
/// The readable prefix is truncated to fit S3's length limit; the hash suffix
/// keeps names of different applications apart.
pub fn default_bucket_name(skill_id: &str, skill_name: &str, profile: &str, aws_region: &str) -> String {
    let seed = format!("{}/{}/{}", skill_id, profile, aws_region);
    let hash = Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes()).simple().to_string();

    let prefix = ["ask".to_string(), sanitize_lower(skill_name), sanitize_lower(profile), sanitize_lower(aws_region)]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    let budget = MAX_BUCKET_NAME_LEN - BUCKET_HASH_LEN - 1;
    let prefix: String = prefix.chars().take(budget).collect();

    format!("{}-{}", prefix.trim_end_matches('-'), &hash[..BUCKET_HASH_LEN])
}

/// Default object key for the build artifact.
pub fn default_bucket_key(build_file: &Path) -> String {
    let file_name = build_file
        .file_name()
        .and_then(|f| f.to_str())
        .filter(|f| !f.is_empty())
        .unwrap_or("build.zip");
    format!("endpoint/{}", file_name)
}

/// Name for a stack created for the first time.
pub fn default_stack_name(skill_name: &str, environment: &str) -> String {
    let mut name = sanitize_stack_part(skill_name);
    name.truncate(60);
    format!(
        "ask-{}-{}-skillStack-{}",
        name.trim_end_matches('-'),
        sanitize_stack_part(environment),
        Utc::now().timestamp_millis()
    )
}

fn sanitize_lower(value: &str) -> String {
    collapse(value.chars().map(|c| {
        if c.is_ascii_alphanumeric() {
            c.to_ascii_lowercase()
        } else {
            '-'
        }
    }))
}

fn sanitize_stack_part(value: &str) -> String {
    collapse(value.chars().map(|c| if c.is_ascii_alphanumeric() { c } else { '-' }))
}

fn collapse(chars: impl Iterator<Item = char>) -> String {
    let mut out = String::new();
    for c in chars {
        if c == '-' && (out.is_empty() || out.ends_with('-')) {
            continue;
        }
        out.push(c);
    }
    out.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RegionalOverride;

    #[test]
    fn maps_known_environments() {
        let config = CfnUserConfig::default();
        assert_eq!(resolve_aws_region("NA", &config).as_deref(), Some("us-east-1"));
        assert_eq!(resolve_aws_region("EU", &config).as_deref(), Some("eu-west-1"));
        assert_eq!(resolve_aws_region("FE", &config).as_deref(), Some("us-west-2"));
        assert_eq!(resolve_aws_region("default", &config).as_deref(), Some("us-east-1"));
        assert_eq!(resolve_aws_region("MARS", &config), None);
    }

    #[test]
    fn default_environment_uses_configured_region() {
        let config = CfnUserConfig {
            aws_region: Some("ap-southeast-2".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_aws_region("default", &config).as_deref(), Some("ap-southeast-2"));
        assert_eq!(resolve_aws_region("EU", &config).as_deref(), Some("eu-west-1"));
    }

    #[test]
    fn override_makes_unknown_environment_supported() {
        let mut config = CfnUserConfig::default();
        config.regional_overrides.insert(
            "MARS".to_string(),
            RegionalOverride {
                aws_region: Some("eu-north-1".to_string()),
                template_path: None,
            },
        );
        assert_eq!(resolve_aws_region("MARS", &config).as_deref(), Some("eu-north-1"));
    }

    #[test]
    fn bucket_name_is_deterministic_and_legal() {
        let a = default_bucket_name("amzn1.ask.skill.1", "My Skill!", "Default", "us-east-1");
        let b = default_bucket_name("amzn1.ask.skill.1", "My Skill!", "Default", "us-east-1");
        let other = default_bucket_name("amzn1.ask.skill.2", "My Skill!", "Default", "us-east-1");

        assert_eq!(a, b);
        assert_ne!(a, other);
        assert!(a.starts_with("ask-my-skill-default-us-east-1-"));
        assert!(a.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
    }

    #[test]
    fn long_names_fit_bucket_limit() {
        let name = default_bucket_name(
            "amzn1.ask.skill.1",
            &"a-very-long-skill-name".repeat(5),
            "profile",
            "ap-southeast-2",
        );
        assert!(name.len() <= MAX_BUCKET_NAME_LEN);
        assert!(!name.contains("--"));
    }

    #[test]
    fn bucket_key_uses_build_file_name() {
        assert_eq!(default_bucket_key(Path::new("/ws/.ask/lambda/build.zip")), "endpoint/build.zip");
        assert_eq!(default_bucket_key(Path::new("")), "endpoint/build.zip");
    }

    #[test]
    fn stack_name_is_cloudformation_safe() {
        let name = default_stack_name("hello world_skill", "NA");
        assert!(name.starts_with("ask-hello-world-skill-NA-skillStack-"));
        assert!(name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'));
    }
}
