//! Error types for the cumulus library.
//!
//! This module provides the error hierarchy for document loading, merging,
//! and request normalization, using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Result type alias for operations that may fail with a cumulus error.
///
/// # Examples
///
/// ```
/// use cumulus::{Error, Result};
///
/// fn example_operation() -> Result<u32> {
///     Ok(1)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the cumulus library.
///
/// Document-shape conditions (parse failures, schema violations, dangling
/// blueprint references, unknown canned policy names) are configuration
/// errors; filesystem conditions surface as [`Error::Io`] and are never
/// wrapped as configuration errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The document text is not valid YAML.
    #[error("malformed config document: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The document violates the version schema.
    #[error("schema violation at '{location}': {message}")]
    Schema {
        /// Dotted path to the offending node, e.g. `Stages.dev.web.Order`.
        location: String,
        /// A description of the violation.
        message: String,
    },

    /// The document declares a version this library does not understand.
    #[error("unsupported config version {found}")]
    UnsupportedVersion {
        /// The version declared by the document.
        found: u64,
    },

    /// A stack extends a blueprint that is not defined.
    #[error("blueprint \"{name}\" not found")]
    BlueprintNotFound {
        /// The name of the missing blueprint.
        name: String,
    },

    /// A stack names a canned policy outside the fixed set.
    #[error("invalid canned policy \"{name}\", valid values are: {valid}")]
    InvalidStackPolicy {
        /// The unrecognized policy name.
        name: String,
        /// Comma-separated list of valid policy names.
        valid: String,
    },

    /// A stack's effective configuration has no `Template` property.
    #[error("stack \"{stack}\" has no Template property")]
    MissingTemplate {
        /// The identifier of the stack.
        stack: String,
    },

    /// An I/O error occurred reading the document or a template file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check whether the error describes a configuration problem, as opposed
    /// to a filesystem condition.
    ///
    /// # Examples
    ///
    /// ```
    /// use cumulus::Error;
    ///
    /// let err = Error::BlueprintNotFound { name: "base".to_string() };
    /// assert!(err.is_config_error());
    /// ```
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}
