//! Effective per-stack configuration and the layer merge engine.
//!
//! A [`StackConfig`] is the fully merged property bag for one stack. It
//! starts with every property absent and is built up by applying override
//! layers in order: the inherited blueprint first (if any), then the stack's
//! own properties. Once the owning document finishes loading, the
//! configuration is read-only.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};

use crate::config::properties::{MergeRule, PROPERTIES};

/// The effective configuration of a single stack within a stage.
///
/// # Examples
///
/// ```
/// use cumulus::config::StackConfig;
/// use serde_yaml::Mapping;
///
/// let mut config = StackConfig::new("dev", "web", 0, ".");
/// let layer: Mapping = serde_yaml::from_str("Region: us-east-1\n").unwrap();
/// config.merge(&layer);
///
/// assert_eq!(config.property("Region").unwrap().as_str(), Some("us-east-1"));
/// assert!(config.property("Template").is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StackConfig {
    stage_id: String,
    stack_id: String,
    stack_order: i64,
    base_dir: PathBuf,
    properties: BTreeMap<&'static str, Value>,
}

impl StackConfig {
    /// Create an all-absent configuration for the stack identified by
    /// `(stage_id, stack_id)`.
    ///
    /// `base_dir` is the directory relative template paths resolve against,
    /// normally the directory containing the config document.
    pub fn new(
        stage_id: impl Into<String>,
        stack_id: impl Into<String>,
        stack_order: i64,
        base_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            stage_id: stage_id.into(),
            stack_id: stack_id.into(),
            stack_order,
            base_dir: base_dir.into(),
            properties: BTreeMap::new(),
        }
    }

    /// The identifier of the stage this stack belongs to.
    #[must_use]
    pub fn stage_id(&self) -> &str {
        &self.stage_id
    }

    /// The identifier of this stack within its stage.
    #[must_use]
    pub fn stack_id(&self) -> &str {
        &self.stack_id
    }

    /// The deployment ordering weight (ascending deploy order).
    #[must_use]
    pub fn stack_order(&self) -> i64 {
        self.stack_order
    }

    /// The directory relative template paths resolve against.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// The value of a property, or `None` if no layer has set it.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Apply one override layer on top of the current state.
    ///
    /// Only recognized schema properties are consulted; the control keys
    /// `Extends` and `Order` must already have been stripped by the loader.
    /// For each property present in `layer`:
    ///
    /// - a property no earlier layer set is taken verbatim;
    /// - an already-set property combines per its [`MergeRule`]: scalars
    ///   (and `Capabilities`) are replaced, other lists are appended to,
    ///   and mappings merge key-by-key with incoming keys winning.
    pub fn merge(&mut self, layer: &Mapping) {
        for spec in PROPERTIES {
            let Some(incoming) = layer.get(spec.name) else {
                continue;
            };
            match self.properties.entry(spec.name) {
                Entry::Vacant(slot) => {
                    slot.insert(incoming.clone());
                }
                Entry::Occupied(mut slot) => match spec.merge {
                    MergeRule::Replace => {
                        slot.insert(incoming.clone());
                    }
                    MergeRule::Extend => match (slot.get_mut(), incoming) {
                        (Value::Sequence(existing), Value::Sequence(overlay)) => {
                            existing.extend(overlay.iter().cloned());
                        }
                        // Shape validation runs before any merge, so a kind
                        // mismatch cannot arise from a loaded document.
                        (current, _) => *current = incoming.clone(),
                    },
                    MergeRule::MergeEntries => match (slot.get_mut(), incoming) {
                        (Value::Mapping(existing), Value::Mapping(overlay)) => {
                            for (key, value) in overlay {
                                existing.insert(key.clone(), value.clone());
                            }
                        }
                        (current, _) => *current = incoming.clone(),
                    },
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(yaml: &str) -> Mapping {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_new_config_has_no_properties() {
        let config = StackConfig::new("dev", "web", 0, "/tmp");
        for name in ["StackName", "Template", "Parameters", "Capabilities"] {
            assert!(config.property(name).is_none());
        }
    }

    #[test]
    fn test_first_layer_sets_values_verbatim() {
        let mut config = StackConfig::new("dev", "web", 0, "/tmp");
        config.merge(&layer("Region: us-east-1\nTimeoutInMinutes: 30\n"));

        assert_eq!(
            config.property("Region").unwrap().as_str(),
            Some("us-east-1")
        );
        assert_eq!(
            config.property("TimeoutInMinutes").unwrap().as_i64(),
            Some(30)
        );
    }

    #[test]
    fn test_scalar_last_writer_wins() {
        let mut config = StackConfig::new("dev", "web", 0, "/tmp");
        config.merge(&layer("Region: us-east-1\n"));
        config.merge(&layer("Region: eu-west-1\n"));

        assert_eq!(
            config.property("Region").unwrap().as_str(),
            Some("eu-west-1")
        );
    }

    #[test]
    fn test_list_layers_append() {
        let mut config = StackConfig::new("dev", "web", 0, "/tmp");
        config.merge(&layer(
            "ResourceTypes:\n  - AWS::EC2::*\n  - AWS::IAM::Role\n",
        ));
        config.merge(&layer("ResourceTypes:\n  - AWS::S3::Bucket\n"));

        let resolved: Vec<&str> = config
            .property("ResourceTypes")
            .unwrap()
            .as_sequence()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(
            resolved,
            ["AWS::EC2::*", "AWS::IAM::Role", "AWS::S3::Bucket"]
        );
    }

    #[test]
    fn test_list_append_preserves_duplicates() {
        let mut config = StackConfig::new("dev", "web", 0, "/tmp");
        config.merge(&layer("ResourceTypes:\n  - AWS::EC2::*\n"));
        config.merge(&layer("ResourceTypes:\n  - AWS::EC2::*\n"));

        assert_eq!(
            config
                .property("ResourceTypes")
                .unwrap()
                .as_sequence()
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn test_capabilities_replace_rather_than_append() {
        let mut config = StackConfig::new("dev", "web", 0, "/tmp");
        config.merge(&layer("Capabilities:\n  - CAPABILITY_IAM\n"));
        config.merge(&layer("Capabilities:\n  - CAPABILITY_NAMED_IAM\n"));

        let resolved: Vec<&str> = config
            .property("Capabilities")
            .unwrap()
            .as_sequence()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(resolved, ["CAPABILITY_NAMED_IAM"]);
    }

    #[test]
    fn test_mapping_layers_merge_key_by_key() {
        let mut config = StackConfig::new("dev", "web", 0, "/tmp");
        config.merge(&layer("Parameters:\n  A: 1\n  B: 2\n"));
        config.merge(&layer("Parameters:\n  B: 3\n  C: 4\n"));

        let parameters = config.property("Parameters").unwrap().as_mapping().unwrap();
        assert_eq!(parameters.get("A").unwrap().as_i64(), Some(1));
        assert_eq!(parameters.get("B").unwrap().as_i64(), Some(3));
        assert_eq!(parameters.get("C").unwrap().as_i64(), Some(4));
    }

    #[test]
    fn test_unrecognized_keys_are_ignored() {
        let mut config = StackConfig::new("dev", "web", 0, "/tmp");
        config.merge(&layer("Extends: base\nOrder: 3\nRegion: us-east-1\n"));

        assert!(config.property("Extends").is_none());
        assert!(config.property("Order").is_none());
        assert_eq!(config.stack_order(), 0);
        assert!(config.property("Region").is_some());
    }

    #[test]
    fn test_layers_do_not_share_structure() {
        // Two stacks merged from the same blueprint mapping must own
        // independent copies of list and map values.
        let blueprint = layer("Tags:\n  Team: infra\nResourceTypes:\n  - AWS::EC2::*\n");

        let mut first = StackConfig::new("dev", "a", 0, "/tmp");
        let mut second = StackConfig::new("dev", "b", 0, "/tmp");
        first.merge(&blueprint);
        second.merge(&blueprint);
        first.merge(&layer("Tags:\n  Stage: dev\nResourceTypes:\n  - AWS::S3::Bucket\n"));

        let second_tags = second.property("Tags").unwrap().as_mapping().unwrap();
        assert!(second_tags.get("Stage").is_none());
        assert_eq!(
            second
                .property("ResourceTypes")
                .unwrap()
                .as_sequence()
                .unwrap()
                .len(),
            1
        );
    }
}
