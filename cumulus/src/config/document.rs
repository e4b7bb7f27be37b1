//! Deployment document loading and the stage→stack index.
//!
//! A deployment document declares a `Version`, a set of reusable `Blueprints`,
//! and `Stages` of stacks. Loading parses the YAML text, validates its shape
//! against the declared version's schema, resolves blueprint inheritance for
//! every stack, and builds the stage→stack index of effective configurations.
//!
//! A document either loads completely or the load fails as a whole; there is
//! no per-stack isolation of failures.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};

use crate::config::stack::StackConfig;
use crate::config::validator::DocumentValidator;
use crate::error::{Error, Result};

/// Default document version when the document does not declare one.
const DEFAULT_VERSION: u64 = 1;

/// A fully loaded deployment document.
///
/// Owns one [`StackConfig`] per stack, indexed by stage then stack
/// identifier. The index iterates in lexicographic identifier order;
/// consumers that need deployment order must sort explicitly (see
/// [`DeploymentDocument::search_stacks`]).
///
/// # Examples
///
/// ```
/// use cumulus::DeploymentDocument;
///
/// let document = DeploymentDocument::load_str(
///     "Stages:\n  dev:\n    web:\n      Template: app.yaml\n",
///     ".",
/// ).unwrap();
///
/// assert_eq!(document.version(), 1);
/// assert!(document.stack("dev", "web").is_some());
/// ```
#[derive(Debug, Clone)]
pub struct DeploymentDocument {
    version: u64,
    stages: BTreeMap<String, BTreeMap<String, StackConfig>>,
}

impl DeploymentDocument {
    /// Load a deployment document from a file.
    ///
    /// The file's parent directory becomes the base directory against which
    /// relative template paths resolve.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, and any error
    /// [`DeploymentDocument::load_str`] can return.
    pub fn load_file(path: &Path) -> Result<Self> {
        log::debug!("loading config document {}", path.display());
        let text = fs::read_to_string(path)?;
        let base_dir = match path.parent() {
            Some(parent) if parent != Path::new("") => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self::load_str(&text, base_dir)
    }

    /// Load a deployment document from YAML text.
    ///
    /// An empty document is treated as an empty mapping and yields a
    /// document with no stages.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] for malformed YAML, [`Error::Schema`] or
    /// [`Error::UnsupportedVersion`] for schema violations, and
    /// [`Error::BlueprintNotFound`] when a stack extends a blueprint the
    /// document does not define.
    pub fn load_str(text: &str, base_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut document: Value = serde_yaml::from_str(text)?;
        if document.is_null() {
            document = Value::Mapping(Mapping::new());
        }

        let version = match document.get("Version") {
            Some(value) => value.as_u64().unwrap_or(DEFAULT_VERSION),
            None => DEFAULT_VERSION,
        };
        log::debug!("config document version {version}");

        DocumentValidator::validate(&document, version)?;

        let base_dir = base_dir.into();
        let stages = Self::build_index(&document, &base_dir)?;

        Ok(Self { version, stages })
    }

    /// The document's declared version (1 when undeclared).
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Iterate over stage identifiers, in lexicographic order.
    pub fn stages(&self) -> impl Iterator<Item = &str> {
        self.stages.keys().map(String::as_str)
    }

    /// Iterate over the stack identifiers of one stage, in lexicographic
    /// order. Returns `None` for an unknown stage.
    pub fn stacks(&self, stage_id: &str) -> Option<impl Iterator<Item = &str>> {
        self.stages
            .get(stage_id)
            .map(|stacks| stacks.keys().map(String::as_str))
    }

    /// The effective configuration of one stack, or `None` if the stage or
    /// stack does not exist.
    #[must_use]
    pub fn stack(&self, stage_id: &str, stack_id: &str) -> Option<&StackConfig> {
        self.stages.get(stage_id)?.get(stack_id)
    }

    pub(crate) fn stage_index(&self) -> &BTreeMap<String, BTreeMap<String, StackConfig>> {
        &self.stages
    }

    fn build_index(
        document: &Value,
        base_dir: &Path,
    ) -> Result<BTreeMap<String, BTreeMap<String, StackConfig>>> {
        let empty = Mapping::new();
        let blueprints = document
            .get("Blueprints")
            .and_then(Value::as_mapping)
            .unwrap_or(&empty);
        let stage_bags = document
            .get("Stages")
            .and_then(Value::as_mapping)
            .unwrap_or(&empty);

        let mut stages = BTreeMap::new();
        for (stage_id, stage_bag) in stage_bags {
            // Shape validation already ran; keys are strings and bags are
            // mappings here.
            let stage_id = stage_id.as_str().unwrap_or_default();
            log::debug!("loading stage \"{stage_id}\"");

            let mut stacks = BTreeMap::new();
            let stack_bags = stage_bag.as_mapping().unwrap_or(&empty);
            for (stack_id, stack_bag) in stack_bags {
                let stack_id = stack_id.as_str().unwrap_or_default();
                log::debug!("loading stage \"{stage_id}\" stack \"{stack_id}\"");

                let mut properties = stack_bag.as_mapping().cloned().unwrap_or_default();
                let blueprint = Self::resolve_blueprint(blueprints, &mut properties)?;
                let order = properties
                    .remove("Order")
                    .and_then(|v| v.as_i64())
                    .unwrap_or(0);

                let mut config = StackConfig::new(stage_id, stack_id, order, base_dir);
                if let Some(blueprint) = blueprint {
                    config.merge(blueprint);
                }
                config.merge(&properties);

                stacks.insert(stack_id.to_string(), config);
            }

            stages.insert(stage_id.to_string(), stacks);
        }

        Ok(stages)
    }

    /// Pop the `Extends` key from a stack's raw properties and resolve it to
    /// its blueprint's property bag.
    fn resolve_blueprint<'a>(
        blueprints: &'a Mapping,
        properties: &mut Mapping,
    ) -> Result<Option<&'a Mapping>> {
        let Some(reference) = properties.remove("Extends") else {
            return Ok(None);
        };
        let name = reference.as_str().unwrap_or_default();
        match blueprints.get(name).and_then(Value::as_mapping) {
            Some(blueprint) => Ok(Some(blueprint)),
            None => Err(Error::BlueprintNotFound {
                name: name.to_string(),
            }),
        }
    }
}
