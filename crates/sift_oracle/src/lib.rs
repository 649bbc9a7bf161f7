//! # sift_oracle
//!
//! Cloud provider queries for tfsift deep checks.
//!
//! Queries are grouped into capability traits ([`ComputeApi`],
//! [`DatabaseApi`], [`CacheApi`], ...). An [`Oracle`] bundles one
//! implementation per group, and a [`ScopedOracle`] caches results for the
//! duration of one module scope.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sift_oracle::{AwsCliOracle, AwsCredentials, Oracle, Query, ScopedOracle};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = AwsCliOracle::new(AwsCredentials::new().with_region("us-east-1"));
//!     let oracle = Oracle::from_provider(Arc::new(provider));
//!
//!     let mut scope = ScopedOracle::new(&oracle);
//!     let clusters = scope.fetch(Query::CacheClusterIds).await?;
//!     println!("{} cache clusters", clusters.len());
//!     Ok(())
//! }
//! ```

pub mod aws;
pub mod credentials;
pub mod error;
pub mod mock;
pub mod oracle;
pub mod query;
pub mod scope;

pub use aws::AwsCliOracle;
pub use credentials::AwsCredentials;
pub use error::{OracleError, OracleResult};
pub use mock::MockOracle;
pub use oracle::{
    CacheApi, ComputeApi, ContainerApi, DatabaseApi, IdentityApi, LoadBalancingApi,
    LoadBalancingV2Api, Oracle,
};
pub use query::{Capability, Query, ResourceSet};
pub use scope::ScopedOracle;
