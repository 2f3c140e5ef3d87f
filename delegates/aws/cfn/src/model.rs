//! Configuration and state shapes owned by the CloudFormation delegate.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::provider::StackOutput;

/// Explicit artifact location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactsS3 {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_key: Option<String>,
}

/// CloudFormation specific settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CfnSettings {
    #[serde(default, deserialize_with = "scalar_parameters")]
    pub parameters: BTreeMap<String, String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

/// Parameter values are strings at the provider; numbers and booleans are
/// accepted and stringified.
fn scalar_parameters<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(key, value)| match value {
            Value::String(s) => Ok((key, s)),
            Value::Number(n) => Ok((key, n.to_string())),
            Value::Bool(b) => Ok((key, b.to_string())),
            other => Err(serde::de::Error::custom(format!(
                "parameter \"{}\" must be a string, number or boolean, got {}",
                key, other
            ))),
        })
        .collect()
}

/// Settings that apply to one environment only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionalOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_path: Option<PathBuf>,
}

/// The delegate's view of `userConfig`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CfnUserConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifacts_s3: Option<ArtifactsS3>,
    #[serde(default)]
    pub cfn: CfnSettings,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub regional_overrides: BTreeMap<String, RegionalOverride>,
}

impl CfnUserConfig {
    /// Interpret a raw `userConfig` value; `null` means empty.
    pub fn from_value(value: &Value) -> serde_json::Result<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value.clone())
    }

    /// Override for the environment, if any.
    pub fn regional_override(&self, environment: &str) -> Option<&RegionalOverride> {
        self.regional_overrides.get(environment)
    }

    /// Template path, with the environment override taking precedence.
    pub fn template_path_for(&self, environment: &str) -> Option<&PathBuf> {
        self.regional_override(environment)
            .and_then(|o| o.template_path.as_ref())
            .or(self.template_path.as_ref())
    }

    pub fn explicit_bucket_name(&self) -> Option<&str> {
        self.artifacts_s3
            .as_ref()
            .and_then(|a| a.bucket_name.as_deref())
            .filter(|name| !name.is_empty())
    }

    pub fn explicit_bucket_key(&self) -> Option<&str> {
        self.artifacts_s3
            .as_ref()
            .and_then(|a| a.bucket_key.as_deref())
            .filter(|key| !key.is_empty())
    }
}

/// Where the artifact was staged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Artifact {
    pub bucket: String,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_version: Option<String>,
}

/// State persisted per environment between invocations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CfnDeployState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<StackOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3: Option<S3Artifact>,
}

impl CfnDeployState {
    /// Interpret prior state field by field.
    ///
    /// A field that does not parse is dropped on its own, so a recorded stack
    /// id survives a damaged artifact entry.
    pub fn from_prior(value: Option<&Value>) -> Self {
        let Some(Value::Object(fields)) = value else {
            return Self::default();
        };

        let stack_id = fields
            .get("stackId")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        Self {
            stack_id,
            outputs: prior_field(fields.get("outputs"), "outputs").unwrap_or_default(),
            s3: prior_field(fields.get("s3"), "s3"),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Default::default()))
    }
}

fn prior_field<T: serde::de::DeserializeOwned>(value: Option<&Value>, name: &str) -> Option<T> {
    let value = value.filter(|v| !v.is_null())?;
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!(field = name, error = %e, "ignoring unreadable deploy state field");
            None
        }
    }
}
