//! Mock oracle for testing.
//!
//! Serves canned resource sets per query, simulates failures for chosen
//! queries and records every call so tests can assert round-trip counts.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{OracleError, OracleResult};
use crate::oracle::{
    CacheApi, ComputeApi, ContainerApi, DatabaseApi, IdentityApi, LoadBalancingApi,
    LoadBalancingV2Api,
};
use crate::query::{Query, ResourceSet};

/// Mock cloud provider for testing.
///
/// Unconfigured queries return an empty set.
#[derive(Clone, Default)]
pub struct MockOracle {
    responses: Arc<RwLock<HashMap<Query, ResourceSet>>>,
    failures: Arc<RwLock<HashMap<Query, String>>>,
    calls: Arc<RwLock<Vec<Query>>>,
    call_count: Arc<AtomicUsize>,
}

impl MockOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the response for a query.
    pub fn with_response<I, S>(self, query: Query, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.responses
            .write()
            .insert(query, items.into_iter().map(Into::into).collect());
        self
    }

    /// Set the default VPC reported by the compute group.
    pub fn with_default_vpc(self, vpc_id: impl Into<String>) -> Self {
        self.with_response(Query::DefaultVpc, [vpc_id.into()])
    }

    /// Make a query fail with the given message.
    pub fn simulate_failure(self, query: Query, message: impl Into<String>) -> Self {
        self.failures.write().insert(query, message.into());
        self
    }

    /// Total number of round-trips served.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Number of round-trips served for one query.
    pub fn calls_for(&self, query: Query) -> usize {
        self.calls.read().iter().filter(|q| **q == query).count()
    }

    pub fn get_calls(&self) -> Vec<Query> {
        self.calls.read().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.write().clear();
        self.call_count.store(0, Ordering::SeqCst);
    }

    fn respond(&self, query: Query) -> OracleResult<ResourceSet> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.calls.write().push(query);

        if let Some(message) = self.failures.read().get(&query) {
            return Err(OracleError::query_failed(query.as_str(), message.clone()));
        }
        Ok(self.responses.read().get(&query).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl ComputeApi for MockOracle {
    async fn security_group_ids(&self) -> OracleResult<ResourceSet> {
        self.respond(Query::SecurityGroupIds)
    }

    async fn security_group_names(&self) -> OracleResult<ResourceSet> {
        self.respond(Query::SecurityGroupNames)
    }

    async fn subnet_ids(&self) -> OracleResult<ResourceSet> {
        self.respond(Query::SubnetIds)
    }

    async fn instance_ids(&self) -> OracleResult<ResourceSet> {
        self.respond(Query::InstanceIds)
    }

    async fn key_pair_names(&self) -> OracleResult<ResourceSet> {
        self.respond(Query::KeyPairNames)
    }

    async fn image_ids(&self) -> OracleResult<ResourceSet> {
        self.respond(Query::ImageIds)
    }

    async fn default_vpc_id(&self) -> OracleResult<Option<String>> {
        Ok(self.respond(Query::DefaultVpc)?.into_iter().next())
    }

    async fn egress_only_internet_gateway_ids(&self) -> OracleResult<ResourceSet> {
        self.respond(Query::EgressOnlyInternetGatewayIds)
    }

    async fn internet_gateway_ids(&self) -> OracleResult<ResourceSet> {
        self.respond(Query::InternetGatewayIds)
    }

    async fn nat_gateway_ids(&self) -> OracleResult<ResourceSet> {
        self.respond(Query::NatGatewayIds)
    }

    async fn network_interface_ids(&self) -> OracleResult<ResourceSet> {
        self.respond(Query::NetworkInterfaceIds)
    }

    async fn route_table_ids(&self) -> OracleResult<ResourceSet> {
        self.respond(Query::RouteTableIds)
    }

    async fn vpc_peering_connection_ids(&self) -> OracleResult<ResourceSet> {
        self.respond(Query::VpcPeeringConnectionIds)
    }
}

#[async_trait]
impl DatabaseApi for MockOracle {
    async fn db_subnet_group_names(&self) -> OracleResult<ResourceSet> {
        self.respond(Query::DbSubnetGroupNames)
    }

    async fn option_group_names(&self) -> OracleResult<ResourceSet> {
        self.respond(Query::OptionGroupNames)
    }

    async fn db_parameter_group_names(&self) -> OracleResult<ResourceSet> {
        self.respond(Query::DbParameterGroupNames)
    }

    async fn db_instance_identifiers(&self) -> OracleResult<ResourceSet> {
        self.respond(Query::DbInstanceIdentifiers)
    }
}

#[async_trait]
impl CacheApi for MockOracle {
    async fn cache_parameter_group_names(&self) -> OracleResult<ResourceSet> {
        self.respond(Query::CacheParameterGroupNames)
    }

    async fn cache_subnet_group_names(&self) -> OracleResult<ResourceSet> {
        self.respond(Query::CacheSubnetGroupNames)
    }

    async fn cache_cluster_ids(&self) -> OracleResult<ResourceSet> {
        self.respond(Query::CacheClusterIds)
    }
}

#[async_trait]
impl LoadBalancingApi for MockOracle {
    async fn load_balancer_names(&self) -> OracleResult<ResourceSet> {
        self.respond(Query::ClassicLoadBalancerNames)
    }
}

#[async_trait]
impl LoadBalancingV2Api for MockOracle {
    async fn load_balancer_names(&self) -> OracleResult<ResourceSet> {
        self.respond(Query::LoadBalancerNames)
    }
}

#[async_trait]
impl IdentityApi for MockOracle {
    async fn instance_profile_names(&self) -> OracleResult<ResourceSet> {
        self.respond(Query::InstanceProfileNames)
    }
}

#[async_trait]
impl ContainerApi for MockOracle {
    async fn cluster_names(&self) -> OracleResult<ResourceSet> {
        self.respond(Query::EcsClusterNames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::Oracle;

    #[tokio::test]
    async fn test_mock_canned_response() {
        let mock = MockOracle::new().with_response(Query::SubnetIds, ["subnet-1", "subnet-2"]);
        let oracle = Oracle::from_provider(Arc::new(mock.clone()));

        let subnets = oracle.query(Query::SubnetIds).await.unwrap();
        assert_eq!(subnets.len(), 2);
        assert!(subnets.contains("subnet-1"));

        let empty = oracle.query(Query::KeyPairNames).await.unwrap();
        assert!(empty.is_empty());
        assert_eq!(mock.call_count(), 2);
        assert_eq!(mock.get_calls(), vec![Query::SubnetIds, Query::KeyPairNames]);
    }

    #[tokio::test]
    async fn test_mock_simulated_failure() {
        let mock = MockOracle::new().simulate_failure(Query::RouteTableIds, "throttled");
        let oracle = Oracle::from_provider(Arc::new(mock.clone()));

        let err = oracle.query(Query::RouteTableIds).await.unwrap_err();
        assert!(matches!(err, OracleError::QueryFailed { .. }));
        assert_eq!(mock.calls_for(Query::RouteTableIds), 1);
    }

    #[tokio::test]
    async fn test_mock_default_vpc() {
        let mock = MockOracle::new().with_default_vpc("vpc-1");
        assert_eq!(mock.default_vpc_id().await.unwrap(), Some("vpc-1".to_string()));

        mock.clear_calls();
        assert_eq!(mock.call_count(), 0);
    }
}
