//! Canned stack update policies.
//!
//! A stack may name one of a fixed set of update policies instead of carrying
//! a full policy document. The names resolve to literal policy-document
//! strings understood by the provider; the set is closed and case-sensitive.

/// The valid canned policy names, in the order they are reported to users.
pub const CANNED_POLICY_NAMES: [&str; 4] =
    ["ALLOW_ALL", "ALLOW_MODIFY", "DENY_DELETE", "DENY_ALL"];

/// Resolve a canned policy name to its literal policy document.
///
/// Lookup is case-sensitive; returns `None` for any name outside the fixed
/// set.
///
/// # Examples
///
/// ```
/// use cumulus::policy::canned_policy;
///
/// assert!(canned_policy("DENY_ALL").unwrap().contains("\"Effect\":\"Deny\""));
/// assert!(canned_policy("deny_all").is_none());
/// ```
#[must_use]
pub fn canned_policy(name: &str) -> Option<&'static str> {
    match name {
        "ALLOW_ALL" => Some(
            r#"{"Statement":[{"Effect":"Allow","Action":"Update:*","Principal":"*","Resource":"*"}]}"#,
        ),
        "ALLOW_MODIFY" => Some(
            r#"{"Statement":[{"Effect":"Allow","Action":["Update:Modify"],"Principal":"*","Resource":"*"}]}"#,
        ),
        "DENY_DELETE" => Some(
            r#"{"Statement":[{"Effect":"Allow","NotAction":"Update:Delete","Principal":"*","Resource":"*"}]}"#,
        ),
        "DENY_ALL" => Some(
            r#"{"Statement":[{"Effect":"Deny","Action":"Update:*","Principal":"*","Resource":"*"}]}"#,
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_listed_name_resolves() {
        for name in CANNED_POLICY_NAMES {
            assert!(canned_policy(name).is_some(), "{name} should resolve");
        }
    }

    #[test]
    fn test_deny_all_literal() {
        assert_eq!(
            canned_policy("DENY_ALL").unwrap(),
            r#"{"Statement":[{"Effect":"Deny","Action":"Update:*","Principal":"*","Resource":"*"}]}"#
        );
    }

    #[test]
    fn test_allow_modify_uses_action_list() {
        assert!(canned_policy("ALLOW_MODIFY")
            .unwrap()
            .contains(r#""Action":["Update:Modify"]"#));
    }

    #[test]
    fn test_deny_delete_uses_not_action() {
        assert!(canned_policy("DENY_DELETE")
            .unwrap()
            .contains(r#""NotAction":"Update:Delete""#));
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        assert!(canned_policy("allow_all").is_none());
        assert!(canned_policy("Deny_All").is_none());
        assert!(canned_policy("").is_none());
    }

    #[test]
    fn test_policies_are_valid_json() {
        for name in CANNED_POLICY_NAMES {
            let body = canned_policy(name).unwrap();
            let parsed: serde_json::Value = serde_json::from_str(body).unwrap();
            assert!(parsed.get("Statement").is_some());
        }
    }
}
