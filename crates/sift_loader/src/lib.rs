//! # sift_loader
//!
//! Terraform configuration loading for tfsift.
//!
//! This crate turns a directory of `.tf` files into a tree of module scopes.
//! Each scope owns its parsed files and an [`Evaluator`] bound to that
//! scope's variables and locals.
//!
//! ## Example
//!
//! ```rust,no_run
//! use sift_loader::{LoaderOptions, ModuleLoader};
//! use std::path::Path;
//!
//! let root = ModuleLoader::new(LoaderOptions::default())
//!     .load(Path::new("."))
//!     .unwrap();
//!
//! for block in root.resources("aws_instance") {
//!     println!("{}:{} {:?}", block.file, block.line, block.resource_name());
//! }
//! ```

pub mod annotation;
pub mod ast;
pub mod error;
pub mod eval;
pub mod module;

pub use annotation::Annotation;
pub use ast::{Attribute, AttributeToken, Block, ConfigFile, SourceMap, TokenValue};
pub use error::{LoadError, LoadResult};
pub use eval::{value_kind, Evaluator};
pub use module::{load_dir, LoaderOptions, Module, ModuleLoader};

pub use hcl::{Expression, Value};
