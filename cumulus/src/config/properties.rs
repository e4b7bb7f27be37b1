//! The stack property schema.
//!
//! Every property a stack (or a blueprint) may carry is declared here, along
//! with its expected value shape and the rule used when a later override
//! layer supplies a value for a property an earlier layer already set. The
//! merge engine consults this table generically rather than branching per
//! field name.

/// Expected shape of a property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// A single scalar value (string, boolean, or integer).
    Scalar,
    /// A sequence of strings.
    StringList,
    /// A mapping of string keys to scalar values.
    StringMap,
}

/// How an incoming override combines with an already-set value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeRule {
    /// The incoming value wins outright.
    Replace,
    /// The incoming sequence is appended to the existing one.
    Extend,
    /// Incoming keys overwrite same-named keys; other keys are retained.
    MergeEntries,
}

/// Schema entry for one recognized stack property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertySpec {
    /// The property name as it appears in the document.
    pub name: &'static str,
    /// The expected value shape.
    pub kind: ValueKind,
    /// The override rule applied when the property is already set.
    pub merge: MergeRule,
}

/// The closed set of recognized stack properties.
///
/// `Capabilities` is list-shaped but carries [`MergeRule::Replace`]: a stack
/// declaring capabilities replaces whatever its blueprint declared instead of
/// extending it. This is a deliberately preserved irregularity in the merge
/// semantics, not a pattern to generalize.
pub const PROPERTIES: &[PropertySpec] = &[
    PropertySpec {
        name: "StackName",
        kind: ValueKind::Scalar,
        merge: MergeRule::Replace,
    },
    PropertySpec {
        name: "Profile",
        kind: ValueKind::Scalar,
        merge: MergeRule::Replace,
    },
    PropertySpec {
        name: "Region",
        kind: ValueKind::Scalar,
        merge: MergeRule::Replace,
    },
    PropertySpec {
        name: "Package",
        kind: ValueKind::Scalar,
        merge: MergeRule::Replace,
    },
    PropertySpec {
        name: "ArtifactStore",
        kind: ValueKind::Scalar,
        merge: MergeRule::Replace,
    },
    PropertySpec {
        name: "Template",
        kind: ValueKind::Scalar,
        merge: MergeRule::Replace,
    },
    PropertySpec {
        name: "Parameters",
        kind: ValueKind::StringMap,
        merge: MergeRule::MergeEntries,
    },
    PropertySpec {
        name: "DisableRollback",
        kind: ValueKind::Scalar,
        merge: MergeRule::Replace,
    },
    PropertySpec {
        name: "RollbackConfiguration",
        kind: ValueKind::StringMap,
        merge: MergeRule::MergeEntries,
    },
    PropertySpec {
        name: "TimeoutInMinutes",
        kind: ValueKind::Scalar,
        merge: MergeRule::Replace,
    },
    PropertySpec {
        name: "NotificationARNs",
        kind: ValueKind::Scalar,
        merge: MergeRule::Replace,
    },
    // List-shaped, but replaced rather than extended. See the const docs.
    PropertySpec {
        name: "Capabilities",
        kind: ValueKind::StringList,
        merge: MergeRule::Replace,
    },
    PropertySpec {
        name: "ResourceTypes",
        kind: ValueKind::StringList,
        merge: MergeRule::Extend,
    },
    PropertySpec {
        name: "RoleARN",
        kind: ValueKind::Scalar,
        merge: MergeRule::Replace,
    },
    PropertySpec {
        name: "OnFailure",
        kind: ValueKind::Scalar,
        merge: MergeRule::Replace,
    },
    PropertySpec {
        name: "StackPolicy",
        kind: ValueKind::Scalar,
        merge: MergeRule::Replace,
    },
    PropertySpec {
        name: "Tags",
        kind: ValueKind::StringMap,
        merge: MergeRule::MergeEntries,
    },
    PropertySpec {
        name: "ClientRequestToken",
        kind: ValueKind::Scalar,
        merge: MergeRule::Replace,
    },
    PropertySpec {
        name: "EnableTerminationProtection",
        kind: ValueKind::Scalar,
        merge: MergeRule::Replace,
    },
];

impl PropertySpec {
    /// Look up the schema entry for a property name.
    ///
    /// # Examples
    ///
    /// ```
    /// use cumulus::config::properties::{MergeRule, PropertySpec};
    ///
    /// let spec = PropertySpec::lookup("Tags").unwrap();
    /// assert_eq!(spec.merge, MergeRule::MergeEntries);
    /// assert!(PropertySpec::lookup("Unknown").is_none());
    /// ```
    #[must_use]
    pub fn lookup(name: &str) -> Option<&'static PropertySpec> {
        PROPERTIES.iter().find(|spec| spec.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_covers_all_recognized_properties() {
        assert_eq!(PROPERTIES.len(), 19);
    }

    #[test]
    fn test_lookup_known_property() {
        let spec = PropertySpec::lookup("Parameters").unwrap();
        assert_eq!(spec.kind, ValueKind::StringMap);
        assert_eq!(spec.merge, MergeRule::MergeEntries);
    }

    #[test]
    fn test_lookup_unknown_property() {
        assert!(PropertySpec::lookup("Extends").is_none());
        assert!(PropertySpec::lookup("Order").is_none());
        assert!(PropertySpec::lookup("stackname").is_none());
    }

    #[test]
    fn test_capabilities_replaces_despite_list_shape() {
        let spec = PropertySpec::lookup("Capabilities").unwrap();
        assert_eq!(spec.kind, ValueKind::StringList);
        assert_eq!(spec.merge, MergeRule::Replace);
    }

    #[test]
    fn test_other_lists_extend() {
        let spec = PropertySpec::lookup("ResourceTypes").unwrap();
        assert_eq!(spec.kind, ValueKind::StringList);
        assert_eq!(spec.merge, MergeRule::Extend);
    }

    #[test]
    fn test_scalars_replace() {
        for name in ["StackName", "Region", "Template", "TimeoutInMinutes"] {
            let spec = PropertySpec::lookup(name).unwrap();
            assert_eq!(spec.kind, ValueKind::Scalar);
            assert_eq!(spec.merge, MergeRule::Replace);
        }
    }

    #[test]
    fn test_no_duplicate_names() {
        for (i, spec) in PROPERTIES.iter().enumerate() {
            assert!(
                !PROPERTIES[i + 1..].iter().any(|s| s.name == spec.name),
                "duplicate schema entry for {}",
                spec.name
            );
        }
    }
}
