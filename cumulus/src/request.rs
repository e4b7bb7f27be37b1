//! Projection of an effective stack configuration into a deployment request.
//!
//! [`RequestNormalizer::normalize`] turns one [`StackConfig`] into the
//! [`DeployRequest`] a deployment client submits to the provider: it picks
//! the stack name, resolves the template reference (remote URL, packaged
//! local path, or inline body), looks up canned stack policies, and
//! canonicalizes parameters and tags into the provider's key/value record
//! shape. Fields never set in the configuration are absent from the request,
//! not null.

use std::env;
use std::fs;
use std::path::{Component, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::config::StackConfig;
use crate::error::{Error, Result};
use crate::policy::{canned_policy, CANNED_POLICY_NAMES};

/// A parameter record in the provider's key/value shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Parameter {
    /// The parameter name.
    pub parameter_key: String,
    /// The parameter value, canonicalized to a string.
    pub parameter_value: String,
}

/// A tag record in the provider's key/value shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    /// The tag name.
    pub key: String,
    /// The tag value, canonicalized to a string.
    pub value: String,
}

/// Dispatch fields the deployment client needs that are not part of the
/// provider's create/update call signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RequestMetadata {
    /// Credential profile to dispatch the request under.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// Target region.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Whether local artifacts are uploaded by reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<bool>,
    /// Artifact storage location used when packaging.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_store: Option<String>,
    /// Deployment ordering weight of the stack.
    pub order: i64,
}

/// A normalized, provider-ready deployment request for one stack.
///
/// Serialization uses the provider's field names and omits every field whose
/// value was never set, as well as empty lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeployRequest {
    /// Client dispatch metadata; not part of the provider call.
    pub metadata: RequestMetadata,
    /// The stack's name (falls back to its identifier).
    pub stack_name: String,
    /// Remote template reference or packaged local path.
    #[serde(rename = "TemplateURL", skip_serializing_if = "Option::is_none")]
    pub template_url: Option<String>,
    /// Inline template content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_body: Option<String>,
    /// Whether rollback on failure is disabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_rollback: Option<bool>,
    /// Rollback trigger configuration, passed through as declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollback_configuration: Option<Mapping>,
    /// Stack operation timeout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_in_minutes: Option<i64>,
    /// Notification target for stack events.
    #[serde(rename = "NotificationARNs", skip_serializing_if = "Option::is_none")]
    pub notification_arns: Option<String>,
    /// Capabilities acknowledged for the deployment.
    #[serde(skip_serializing_if = "skip_empty_list")]
    pub capabilities: Option<Vec<String>>,
    /// Resource types the deployment may touch.
    #[serde(skip_serializing_if = "skip_empty_list")]
    pub resource_types: Option<Vec<String>>,
    /// Service role assumed for the deployment.
    #[serde(rename = "RoleARN", skip_serializing_if = "Option::is_none")]
    pub role_arn: Option<String>,
    /// Behavior when stack creation fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_failure: Option<String>,
    /// Resolved canned stack policy document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_policy_body: Option<String>,
    /// Template parameters, sorted by key.
    #[serde(skip_serializing_if = "skip_empty_list")]
    pub parameters: Option<Vec<Parameter>>,
    /// Stack tags, sorted by key.
    #[serde(skip_serializing_if = "skip_empty_list")]
    pub tags: Option<Vec<Tag>>,
    /// Idempotency token for the provider call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_request_token: Option<String>,
    /// Whether the stack resists deletion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_termination_protection: Option<bool>,
}

fn skip_empty_list<T>(list: &Option<Vec<T>>) -> bool {
    list.as_ref().map_or(true, Vec::is_empty)
}

/// Projects effective stack configurations into deployment requests.
///
/// # Examples
///
/// ```
/// use cumulus::{DeploymentDocument, RequestNormalizer};
///
/// let document = DeploymentDocument::load_str(
///     "Stages:\n  dev:\n    web:\n      Template: https://bucket/web.yaml\n",
///     ".",
/// ).unwrap();
///
/// let request = RequestNormalizer::normalize(document.stack("dev", "web").unwrap()).unwrap();
/// assert_eq!(request.stack_name, "web");
/// assert_eq!(request.template_url.as_deref(), Some("https://bucket/web.yaml"));
/// ```
pub struct RequestNormalizer;

impl RequestNormalizer {
    /// Normalize one stack's effective configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingTemplate`] when the effective configuration
    /// has no `Template`, [`Error::InvalidStackPolicy`] for a policy name
    /// outside the canned set, [`Error::Io`] when an inline template file
    /// cannot be read, and [`Error::Schema`] when a property value cannot be
    /// converted to its expected type.
    pub fn normalize(config: &StackConfig) -> Result<DeployRequest> {
        log::debug!(
            "normalizing stack \"{}\" of stage \"{}\"",
            config.stack_id(),
            config.stage_id()
        );

        let stack_name = typed::<String>(config, "StackName")?
            .unwrap_or_else(|| config.stack_id().to_string());

        let package = typed::<bool>(config, "Package")?;
        let metadata = RequestMetadata {
            profile: typed(config, "Profile")?,
            region: typed(config, "Region")?,
            package,
            artifact_store: typed(config, "ArtifactStore")?,
            order: config.stack_order(),
        };

        let (template_url, template_body) =
            Self::resolve_template(config, package.unwrap_or(false))?;

        let stack_policy_body = match typed::<String>(config, "StackPolicy")? {
            Some(name) => match canned_policy(&name) {
                Some(body) => Some(body.to_string()),
                None => {
                    return Err(Error::InvalidStackPolicy {
                        name,
                        valid: CANNED_POLICY_NAMES.join(", "),
                    });
                }
            },
            None => None,
        };

        let parameters = config
            .property("Parameters")
            .and_then(Value::as_mapping)
            .filter(|mapping| !mapping.is_empty())
            .map(|mapping| {
                sorted_entries(mapping)
                    .into_iter()
                    .map(|(key, value)| Parameter {
                        parameter_key: key,
                        parameter_value: normalize_scalar(value),
                    })
                    .collect()
            });

        let tags = config
            .property("Tags")
            .and_then(Value::as_mapping)
            .filter(|mapping| !mapping.is_empty())
            .map(|mapping| {
                sorted_entries(mapping)
                    .into_iter()
                    .map(|(key, value)| Tag {
                        key,
                        value: normalize_scalar(value),
                    })
                    .collect()
            });

        Ok(DeployRequest {
            metadata,
            stack_name,
            template_url,
            template_body,
            disable_rollback: typed(config, "DisableRollback")?,
            rollback_configuration: typed(config, "RollbackConfiguration")?,
            timeout_in_minutes: typed(config, "TimeoutInMinutes")?,
            notification_arns: typed(config, "NotificationARNs")?,
            capabilities: typed(config, "Capabilities")?,
            resource_types: typed(config, "ResourceTypes")?,
            role_arn: typed(config, "RoleARN")?,
            on_failure: typed(config, "OnFailure")?,
            stack_policy_body,
            parameters,
            tags,
            client_request_token: typed(config, "ClientRequestToken")?,
            enable_termination_protection: typed(config, "EnableTerminationProtection")?,
        })
    }

    /// Decide whether the template is a remote reference, a packaged local
    /// path, or inline content.
    ///
    /// Remote references are taken verbatim and never touch the filesystem,
    /// whatever the `Package` flag says. Packaged templates become absolute
    /// path references for a later upload step. Everything else is read from
    /// disk relative to the document's base directory.
    fn resolve_template(
        config: &StackConfig,
        package: bool,
    ) -> Result<(Option<String>, Option<String>)> {
        let template = typed::<String>(config, "Template")?.ok_or_else(|| {
            Error::MissingTemplate {
                stack: config.stack_id().to_string(),
            }
        })?;

        if template.starts_with("http://") || template.starts_with("https://") {
            return Ok((Some(template), None));
        }

        let local = config.base_dir().join(&template);
        if package {
            let resolved = absolute_path(local)?;
            return Ok((Some(resolved.display().to_string()), None));
        }

        let body = fs::read_to_string(&local)?;
        Ok((None, Some(body)))
    }
}

/// Convert a scalar property value to its canonical string form: booleans
/// become `"true"`/`"false"`, numbers their decimal form, strings pass
/// through unchanged.
fn normalize_scalar(value: &Value) -> String {
    match value {
        Value::Bool(true) => "true".to_string(),
        Value::Bool(false) => "false".to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        other => serde_yaml::to_string(other)
            .map(|rendered| rendered.trim_end().to_string())
            .unwrap_or_default(),
    }
}

/// The mapping's entries as `(key, value)` pairs sorted by key.
fn sorted_entries(mapping: &Mapping) -> Vec<(String, &Value)> {
    let mut entries: Vec<(String, &Value)> = mapping
        .iter()
        .map(|(key, value)| (normalize_scalar(key), value))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries
}

/// Make a path absolute and resolve `.`/`..` components lexically.
fn absolute_path(path: PathBuf) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path
    } else {
        env::current_dir()?.join(path)
    };

    let mut resolved = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => resolved.push(other),
        }
    }
    Ok(resolved)
}

fn typed<T: DeserializeOwned>(config: &StackConfig, name: &str) -> Result<Option<T>> {
    match config.property(name) {
        None => Ok(None),
        Some(value) => serde_yaml::from_value(value.clone()).map(Some).map_err(|e| {
            Error::Schema {
                location: format!("{}.{}.{name}", config.stage_id(), config.stack_id()),
                message: e.to_string(),
            }
        }),
    }
}
