//! Capability traits and the shared oracle handle.
//!
//! Each trait covers one service group. A provider implements all of them;
//! tests can swap in a double for a single group.

use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tracing::debug;

use crate::error::OracleResult;
use crate::query::{Query, ResourceSet};

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ComputeApi: Send + Sync {
    async fn security_group_ids(&self) -> OracleResult<ResourceSet>;
    /// Group names keyed as `<vpc_id>.<group_name>`.
    async fn security_group_names(&self) -> OracleResult<ResourceSet>;
    async fn subnet_ids(&self) -> OracleResult<ResourceSet>;
    async fn instance_ids(&self) -> OracleResult<ResourceSet>;
    async fn key_pair_names(&self) -> OracleResult<ResourceSet>;
    async fn image_ids(&self) -> OracleResult<ResourceSet>;
    async fn default_vpc_id(&self) -> OracleResult<Option<String>>;
    async fn egress_only_internet_gateway_ids(&self) -> OracleResult<ResourceSet>;
    async fn internet_gateway_ids(&self) -> OracleResult<ResourceSet>;
    async fn nat_gateway_ids(&self) -> OracleResult<ResourceSet>;
    async fn network_interface_ids(&self) -> OracleResult<ResourceSet>;
    async fn route_table_ids(&self) -> OracleResult<ResourceSet>;
    async fn vpc_peering_connection_ids(&self) -> OracleResult<ResourceSet>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait DatabaseApi: Send + Sync {
    async fn db_subnet_group_names(&self) -> OracleResult<ResourceSet>;
    async fn option_group_names(&self) -> OracleResult<ResourceSet>;
    async fn db_parameter_group_names(&self) -> OracleResult<ResourceSet>;
    async fn db_instance_identifiers(&self) -> OracleResult<ResourceSet>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait CacheApi: Send + Sync {
    async fn cache_parameter_group_names(&self) -> OracleResult<ResourceSet>;
    async fn cache_subnet_group_names(&self) -> OracleResult<ResourceSet>;
    async fn cache_cluster_ids(&self) -> OracleResult<ResourceSet>;
}

/// Classic load balancers.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LoadBalancingApi: Send + Sync {
    async fn load_balancer_names(&self) -> OracleResult<ResourceSet>;
}

/// Application and network load balancers.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LoadBalancingV2Api: Send + Sync {
    async fn load_balancer_names(&self) -> OracleResult<ResourceSet>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait IdentityApi: Send + Sync {
    async fn instance_profile_names(&self) -> OracleResult<ResourceSet>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ContainerApi: Send + Sync {
    async fn cluster_names(&self) -> OracleResult<ResourceSet>;
}

/// Shared, read-only handle to every capability group.
#[derive(Clone)]
pub struct Oracle {
    compute: Arc<dyn ComputeApi>,
    database: Arc<dyn DatabaseApi>,
    cache: Arc<dyn CacheApi>,
    load_balancing: Arc<dyn LoadBalancingApi>,
    load_balancing_v2: Arc<dyn LoadBalancingV2Api>,
    identity: Arc<dyn IdentityApi>,
    container: Arc<dyn ContainerApi>,
}

impl Oracle {
    /// Build an oracle whose groups are all served by one provider.
    pub fn from_provider<P>(provider: Arc<P>) -> Self
    where
        P: ComputeApi
            + DatabaseApi
            + CacheApi
            + LoadBalancingApi
            + LoadBalancingV2Api
            + IdentityApi
            + ContainerApi
            + 'static,
    {
        Self {
            compute: provider.clone(),
            database: provider.clone(),
            cache: provider.clone(),
            load_balancing: provider.clone(),
            load_balancing_v2: provider.clone(),
            identity: provider.clone(),
            container: provider,
        }
    }

    pub fn with_compute(mut self, compute: Arc<dyn ComputeApi>) -> Self {
        self.compute = compute;
        self
    }

    pub fn with_database(mut self, database: Arc<dyn DatabaseApi>) -> Self {
        self.database = database;
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn CacheApi>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_load_balancing(mut self, load_balancing: Arc<dyn LoadBalancingApi>) -> Self {
        self.load_balancing = load_balancing;
        self
    }

    pub fn with_load_balancing_v2(mut self, load_balancing_v2: Arc<dyn LoadBalancingV2Api>) -> Self {
        self.load_balancing_v2 = load_balancing_v2;
        self
    }

    pub fn with_identity(mut self, identity: Arc<dyn IdentityApi>) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_container(mut self, container: Arc<dyn ContainerApi>) -> Self {
        self.container = container;
        self
    }

    /// Run one query against the group that owns it.
    pub async fn query(&self, query: Query) -> OracleResult<ResourceSet> {
        debug!("Querying {} ({})", query, query.capability());
        match query {
            Query::SecurityGroupIds => self.compute.security_group_ids().await,
            Query::SecurityGroupNames => self.compute.security_group_names().await,
            Query::SubnetIds => self.compute.subnet_ids().await,
            Query::InstanceIds => self.compute.instance_ids().await,
            Query::KeyPairNames => self.compute.key_pair_names().await,
            Query::ImageIds => self.compute.image_ids().await,
            Query::DefaultVpc => Ok(self.compute.default_vpc_id().await?.into_iter().collect()),
            Query::EgressOnlyInternetGatewayIds => {
                self.compute.egress_only_internet_gateway_ids().await
            }
            Query::InternetGatewayIds => self.compute.internet_gateway_ids().await,
            Query::NatGatewayIds => self.compute.nat_gateway_ids().await,
            Query::NetworkInterfaceIds => self.compute.network_interface_ids().await,
            Query::RouteTableIds => self.compute.route_table_ids().await,
            Query::VpcPeeringConnectionIds => self.compute.vpc_peering_connection_ids().await,
            Query::DbSubnetGroupNames => self.database.db_subnet_group_names().await,
            Query::OptionGroupNames => self.database.option_group_names().await,
            Query::DbParameterGroupNames => self.database.db_parameter_group_names().await,
            Query::DbInstanceIdentifiers => self.database.db_instance_identifiers().await,
            Query::CacheParameterGroupNames => self.cache.cache_parameter_group_names().await,
            Query::CacheSubnetGroupNames => self.cache.cache_subnet_group_names().await,
            Query::CacheClusterIds => self.cache.cache_cluster_ids().await,
            Query::ClassicLoadBalancerNames => self.load_balancing.load_balancer_names().await,
            Query::LoadBalancerNames => self.load_balancing_v2.load_balancer_names().await,
            Query::InstanceProfileNames => self.identity.instance_profile_names().await,
            Query::EcsClusterNames => self.container.cluster_names().await,
        }
    }
}

impl std::fmt::Debug for Oracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Oracle").finish_non_exhaustive()
    }
}
