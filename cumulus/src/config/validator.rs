//! Document shape validation.
//!
//! Validates a parsed document against the schema for its declared version
//! before any merging happens. Validation is purely structural: it checks
//! that the top-level keys, stage/stack nesting, and property value shapes
//! are well formed, and that no property bag carries an unrecognized key.
//! Cross-stack relationships are not this layer's concern.

use serde_yaml::{Mapping, Value};

use crate::config::properties::{PropertySpec, ValueKind};
use crate::error::{Error, Result};

/// Validates a parsed document against a version-specific schema.
///
/// # Examples
///
/// ```
/// use cumulus::config::DocumentValidator;
///
/// let document = serde_yaml::from_str("Stages:\n  dev:\n    web:\n      Template: app.yaml\n").unwrap();
/// DocumentValidator::validate(&document, 1).unwrap();
/// ```
pub struct DocumentValidator;

impl DocumentValidator {
    /// Validate `document` against the schema for `version`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedVersion`] for an unknown version and
    /// [`Error::Schema`] for any structural violation.
    pub fn validate(document: &Value, version: u64) -> Result<()> {
        match version {
            1 => Self::validate_v1(document),
            other => Err(Error::UnsupportedVersion { found: other }),
        }
    }

    fn validate_v1(document: &Value) -> Result<()> {
        let root = Self::expect_mapping("document", document)?;

        for (key, value) in root {
            let key = Self::expect_string_key("document", key)?;
            match key {
                "Version" => {
                    if value.as_u64().is_none() {
                        return Err(Self::violation("Version", "expected a positive integer"));
                    }
                }
                "Blueprints" => Self::validate_blueprints(value)?,
                "Stages" => Self::validate_stages(value)?,
                other => {
                    return Err(Self::violation(
                        "document",
                        format!("unrecognized top-level key \"{other}\""),
                    ));
                }
            }
        }

        Ok(())
    }

    fn validate_blueprints(blueprints: &Value) -> Result<()> {
        let blueprints = Self::expect_mapping("Blueprints", blueprints)?;
        for (name, bag) in blueprints {
            let name = Self::expect_string_key("Blueprints", name)?;
            let location = format!("Blueprints.{name}");
            // A blueprint is a plain property bag: it cannot itself extend
            // another blueprint, and it carries no ordering.
            Self::validate_property_bag(&location, bag, false)?;
        }
        Ok(())
    }

    fn validate_stages(stages: &Value) -> Result<()> {
        let stages = Self::expect_mapping("Stages", stages)?;
        for (stage_id, stage) in stages {
            let stage_id = Self::expect_string_key("Stages", stage_id)?;
            let stage_location = format!("Stages.{stage_id}");
            let stage = Self::expect_mapping(&stage_location, stage)?;

            for (stack_id, bag) in stage {
                let stack_id = Self::expect_string_key(&stage_location, stack_id)?;
                let location = format!("{stage_location}.{stack_id}");
                Self::validate_property_bag(&location, bag, true)?;
            }
        }
        Ok(())
    }

    fn validate_property_bag(location: &str, bag: &Value, allow_control: bool) -> Result<()> {
        let bag = Self::expect_mapping(location, bag)?;

        for (key, value) in bag {
            let key = Self::expect_string_key(location, key)?;
            let key_location = format!("{location}.{key}");

            if allow_control {
                match key {
                    "Extends" => {
                        if value.as_str().is_none() {
                            return Err(Self::violation(
                                &key_location,
                                "expected a blueprint name",
                            ));
                        }
                        continue;
                    }
                    "Order" => {
                        if value.as_i64().is_none() {
                            return Err(Self::violation(&key_location, "expected an integer"));
                        }
                        continue;
                    }
                    _ => {}
                }
            }

            let Some(spec) = PropertySpec::lookup(key) else {
                return Err(Self::violation(
                    location,
                    format!("unrecognized property \"{key}\""),
                ));
            };

            let shape_ok = match spec.kind {
                ValueKind::Scalar => {
                    matches!(value, Value::String(_) | Value::Bool(_) | Value::Number(_))
                }
                ValueKind::StringList => value.is_sequence(),
                ValueKind::StringMap => value.is_mapping(),
            };
            if !shape_ok {
                return Err(Self::violation(
                    &key_location,
                    format!("expected {}", Self::kind_name(spec.kind)),
                ));
            }
        }

        Ok(())
    }

    fn expect_mapping<'a>(location: &str, value: &'a Value) -> Result<&'a Mapping> {
        value
            .as_mapping()
            .ok_or_else(|| Self::violation(location, "expected a mapping"))
    }

    fn expect_string_key<'a>(location: &str, key: &'a Value) -> Result<&'a str> {
        key.as_str()
            .ok_or_else(|| Self::violation(location, "expected a string key"))
    }

    fn kind_name(kind: ValueKind) -> &'static str {
        match kind {
            ValueKind::Scalar => "a scalar value",
            ValueKind::StringList => "a list",
            ValueKind::StringMap => "a mapping",
        }
    }

    fn violation(location: &str, message: impl Into<String>) -> Error {
        Error::Schema {
            location: location.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_minimal_document_passes() {
        let document = parse("Stages:\n  dev:\n    web:\n      Template: app.yaml\n");
        DocumentValidator::validate(&document, 1).unwrap();
    }

    #[test]
    fn test_empty_mapping_passes() {
        let document = Value::Mapping(Mapping::new());
        DocumentValidator::validate(&document, 1).unwrap();
    }

    #[test]
    fn test_unsupported_version() {
        let document = parse("Version: 2\nStages: {}\n");
        let err = DocumentValidator::validate(&document, 2).unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion { found: 2 }));
    }

    #[test]
    fn test_unknown_top_level_key() {
        let document = parse("Stacks: {}\n");
        let err = DocumentValidator::validate(&document, 1).unwrap_err();
        assert!(format!("{err}").contains("Stacks"));
    }

    #[test]
    fn test_unrecognized_property_rejected() {
        let document = parse("Stages:\n  dev:\n    web:\n      TemplateUrl: x\n");
        let err = DocumentValidator::validate(&document, 1).unwrap_err();
        assert!(matches!(err, Error::Schema { .. }));
        assert!(format!("{err}").contains("TemplateUrl"));
    }

    #[test]
    fn test_property_shape_checked() {
        let document = parse("Stages:\n  dev:\n    web:\n      Parameters: not-a-mapping\n");
        let err = DocumentValidator::validate(&document, 1).unwrap_err();
        assert!(format!("{err}").contains("Stages.dev.web.Parameters"));
    }

    #[test]
    fn test_scalar_shape_rejects_sequence() {
        let document = parse("Stages:\n  dev:\n    web:\n      Region:\n        - us-east-1\n");
        assert!(DocumentValidator::validate(&document, 1).is_err());
    }

    #[test]
    fn test_control_keys_allowed_in_stacks_only() {
        let document = parse("Stages:\n  dev:\n    web:\n      Extends: base\n      Order: 1\n");
        DocumentValidator::validate(&document, 1).unwrap();

        let document = parse("Blueprints:\n  base:\n    Extends: other\n");
        let err = DocumentValidator::validate(&document, 1).unwrap_err();
        assert!(format!("{err}").contains("Extends"));
    }

    #[test]
    fn test_order_must_be_integer() {
        let document = parse("Stages:\n  dev:\n    web:\n      Order: soon\n");
        let err = DocumentValidator::validate(&document, 1).unwrap_err();
        assert!(format!("{err}").contains("Stages.dev.web.Order"));
    }

    #[test]
    fn test_stage_must_be_mapping() {
        let document = parse("Stages:\n  dev:\n    - web\n");
        let err = DocumentValidator::validate(&document, 1).unwrap_err();
        assert!(format!("{err}").contains("Stages.dev"));
    }
}
