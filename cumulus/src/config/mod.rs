//! Deployment configuration: documents, stacks, and the merge engine.
//!
//! A deployment document groups stacks into stages and lets stacks inherit
//! from reusable blueprints:
//!
//! ```yaml
//! Version: 1
//! Blueprints:
//!   base:
//!     Region: us-east-1
//!     Tags:
//!       Team: infra
//! Stages:
//!   dev:
//!     web:
//!       Extends: base
//!       Template: web.yaml
//!       Order: 1
//! ```
//!
//! Loading resolves each stack to its effective configuration by merging the
//! blueprint layer, then the stack's own properties, per the property schema
//! in [`properties`]. The loaded document is an immutable stage→stack index
//! queried with [`DeploymentDocument::search_stacks`].

pub mod document;
pub mod properties;
pub mod query;
pub mod stack;
pub mod validator;

// Re-export key types at module root
pub use document::DeploymentDocument;
pub use properties::{MergeRule, PropertySpec, ValueKind};
pub use stack::StackConfig;
pub use validator::DocumentValidator;
