//! Per-module-scope query cache.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{OracleError, OracleResult};
use crate::oracle::Oracle;
use crate::query::{Query, ResourceSet};

/// Oracle access for one module scope.
///
/// Every query is sent at most once per scope; later requests for the same
/// query, from any detector, are served from the cache. Failures are cached
/// too, so a failing query is not retried within the scope.
pub struct ScopedOracle<'a> {
    oracle: Option<&'a Oracle>,
    cache: HashMap<Query, Result<Arc<ResourceSet>, String>>,
    round_trips: usize,
}

impl<'a> ScopedOracle<'a> {
    pub fn new(oracle: &'a Oracle) -> Self {
        Self {
            oracle: Some(oracle),
            cache: HashMap::new(),
            round_trips: 0,
        }
    }

    /// A scope without provider access. Every query fails.
    pub fn offline() -> Self {
        Self {
            oracle: None,
            cache: HashMap::new(),
            round_trips: 0,
        }
    }

    pub fn is_available(&self) -> bool {
        self.oracle.is_some()
    }

    /// Fetch a query result, sending the query if this scope has not yet.
    pub async fn fetch(&mut self, query: Query) -> OracleResult<Arc<ResourceSet>> {
        if let Some(cached) = self.cache.get(&query) {
            debug!("Serving {} from scope cache", query);
            return cached
                .clone()
                .map_err(|message| OracleError::query_failed(query.as_str(), message));
        }

        let Some(oracle) = self.oracle else {
            return Err(OracleError::Unavailable(format!(
                "deep check is disabled, cannot run {}",
                query
            )));
        };

        self.round_trips += 1;
        let result = oracle.query(query).await.map(Arc::new);
        if let Err(e) = &result {
            warn!("Query {} failed: {}", query, e);
        }

        let entry = match &result {
            Ok(set) => Ok(set.clone()),
            Err(e) => Err(e.to_string()),
        };
        self.cache.insert(query, entry);
        result
    }

    /// The provider's default VPC, if it has one.
    pub async fn default_vpc(&mut self) -> OracleResult<Option<String>> {
        let vpcs = self.fetch(Query::DefaultVpc).await?;
        let mut ids: Vec<&String> = vpcs.iter().collect();
        ids.sort();
        Ok(ids.first().map(|id| id.to_string()))
    }

    /// Number of queries actually sent from this scope.
    pub fn round_trips(&self) -> usize {
        self.round_trips
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockOracle;

    #[tokio::test]
    async fn test_fetch_sends_each_query_once() {
        let mock = MockOracle::new().with_response(Query::CacheClusterIds, ["demo", "other"]);
        let oracle = Oracle::from_provider(Arc::new(mock.clone()));
        let mut scope = ScopedOracle::new(&oracle);

        for _ in 0..5 {
            let clusters = scope.fetch(Query::CacheClusterIds).await.unwrap();
            assert!(clusters.contains("demo"));
        }
        assert_eq!(mock.calls_for(Query::CacheClusterIds), 1);
        assert_eq!(scope.round_trips(), 1);
    }

    #[tokio::test]
    async fn test_failures_are_cached() {
        let mock = MockOracle::new().simulate_failure(Query::SubnetIds, "AccessDenied");
        let oracle = Oracle::from_provider(Arc::new(mock.clone()));
        let mut scope = ScopedOracle::new(&oracle);

        assert!(scope.fetch(Query::SubnetIds).await.is_err());
        let err = scope.fetch(Query::SubnetIds).await.unwrap_err();
        assert!(err.to_string().contains("AccessDenied"));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_scopes_do_not_share_cache() {
        let mock = MockOracle::new().with_default_vpc("vpc-default");
        let oracle = Oracle::from_provider(Arc::new(mock.clone()));

        let mut first = ScopedOracle::new(&oracle);
        assert_eq!(first.default_vpc().await.unwrap().as_deref(), Some("vpc-default"));
        assert_eq!(first.default_vpc().await.unwrap().as_deref(), Some("vpc-default"));

        let mut second = ScopedOracle::new(&oracle);
        second.default_vpc().await.unwrap();

        assert_eq!(mock.calls_for(Query::DefaultVpc), 2);
    }

    #[tokio::test]
    async fn test_offline_scope_fails() {
        let mut scope = ScopedOracle::offline();
        assert!(!scope.is_available());
        let err = scope.fetch(Query::SecurityGroupIds).await.unwrap_err();
        assert!(matches!(err, OracleError::Unavailable(_)));
        assert_eq!(scope.round_trips(), 0);
    }
}
