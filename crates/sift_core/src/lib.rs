//! # sift_core
//!
//! Rule detection engine for tfsift.
//!
//! This crate turns a loaded module tree, an optional cloud provider oracle
//! and a deployment state snapshot into a list of positioned issues.
//!
//! # Architecture
//!
//! - **Detectors**: rule logic for one attribute of one resource type, run
//!   in two phases (`pre_process`, then `detect`) per module scope
//! - **Registry**: ordered table of detector factories
//! - **Resolver**: reduces attribute values of any shape to strings with
//!   their source positions
//! - **State**: read-only snapshot of already deployed resources
//! - **Runner**: drives every detector over every module scope
//!
//! # Example
//!
//! ```rust,ignore
//! use sift_core::{DeploymentState, DetectorRegistry, LintConfig, Runner};
//! use sift_loader::{LoaderOptions, ModuleLoader};
//! use std::path::Path;
//!
//! let config = LintConfig::default();
//! let root = ModuleLoader::new(config.loader_options()).load(Path::new("."))?;
//! let state = DeploymentState::load(&config.state_path(Path::new(".")));
//! let registry = DetectorRegistry::new().with(my_rule);
//!
//! let report = Runner::new(&registry, &config, &state).run(&root).await?;
//! for issue in &report.issues {
//!     println!("{}", issue);
//! }
//! ```

pub mod config;
pub mod detector;
pub mod error;
pub mod issue;
pub mod registry;
pub mod resolver;
pub mod runner;
pub mod state;

pub use config::{
    provider_credentials, LintConfig, RuleConfig, DEFAULT_CONFIG_FILE, DEFAULT_STATE_FILE,
};
pub use detector::{DetectScope, Detector, DetectorMeta, DetectorRun, IssueSink, Lifecycle};
pub use error::{CoreError, CoreResult};
pub use issue::{Issue, Severity};
pub use registry::{DetectorFactory, DetectorRegistry};
pub use resolver::{AttributeResolver, ResolvedValue, ValueShape};
pub use runner::{RuleOutcome, RuleReport, RunReport, Runner, ScopeReport, SkipReason};
pub use state::{DeploymentState, RecordedResource};
