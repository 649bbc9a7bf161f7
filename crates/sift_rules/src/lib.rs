//! # sift_rules
//!
//! Built-in AWS rules for tfsift.
//!
//! Rules fall into a few families:
//!
//! - **Table rules**: the value must (or must not) appear in a static list,
//!   such as instance types or CloudWatch units
//! - **Reference rules**: the value must name a resource that exists in the
//!   account, checked against one provider query per module scope
//! - **Duplicate rules**: the value must not name a live resource, unless
//!   the deployment state shows this configuration created it
//! - **Structural rules**: required or conflicting attributes and blocks
//!
//! ```rust,ignore
//! use sift_core::{DeploymentState, LintConfig, Runner};
//!
//! let registry = sift_rules::default_registry();
//! let report = Runner::new(&registry, &config, &state).run(&root).await?;
//! ```

pub mod allowed;
pub mod catalog;
pub mod duplicate;
pub mod instance;
pub mod parameter_group;
pub mod password;
pub mod reference;
pub mod route;
pub mod tables;

pub use allowed::{Membership, TableDetector};
pub use catalog::{default_registry, RULES};
pub use duplicate::DuplicateDetector;
pub use reference::ReferenceDetector;
