//! Resource-existence queries and the capability groups that answer them.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Identifiers or names returned by a single query.
pub type ResourceSet = HashSet<String>;

/// Service group a query belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Compute,
    Database,
    Cache,
    LoadBalancing,
    LoadBalancingV2,
    Identity,
    Container,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compute => "compute",
            Self::Database => "database",
            Self::Cache => "cache",
            Self::LoadBalancing => "load_balancing",
            Self::LoadBalancingV2 => "load_balancing_v2",
            Self::Identity => "identity",
            Self::Container => "container",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One kind of resource-existence query.
///
/// Each variant maps to exactly one provider round-trip. Results are cached
/// per module scope under this key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    SecurityGroupIds,
    /// Security group names keyed as `<vpc_id>.<group_name>`.
    SecurityGroupNames,
    SubnetIds,
    InstanceIds,
    KeyPairNames,
    ImageIds,
    DefaultVpc,
    EgressOnlyInternetGatewayIds,
    InternetGatewayIds,
    NatGatewayIds,
    NetworkInterfaceIds,
    RouteTableIds,
    VpcPeeringConnectionIds,
    DbSubnetGroupNames,
    OptionGroupNames,
    DbParameterGroupNames,
    DbInstanceIdentifiers,
    CacheParameterGroupNames,
    CacheSubnetGroupNames,
    CacheClusterIds,
    ClassicLoadBalancerNames,
    LoadBalancerNames,
    InstanceProfileNames,
    EcsClusterNames,
}

impl Query {
    pub fn capability(&self) -> Capability {
        match self {
            Self::SecurityGroupIds
            | Self::SecurityGroupNames
            | Self::SubnetIds
            | Self::InstanceIds
            | Self::KeyPairNames
            | Self::ImageIds
            | Self::DefaultVpc
            | Self::EgressOnlyInternetGatewayIds
            | Self::InternetGatewayIds
            | Self::NatGatewayIds
            | Self::NetworkInterfaceIds
            | Self::RouteTableIds
            | Self::VpcPeeringConnectionIds => Capability::Compute,
            Self::DbSubnetGroupNames
            | Self::OptionGroupNames
            | Self::DbParameterGroupNames
            | Self::DbInstanceIdentifiers => Capability::Database,
            Self::CacheParameterGroupNames | Self::CacheSubnetGroupNames | Self::CacheClusterIds => {
                Capability::Cache
            }
            Self::ClassicLoadBalancerNames => Capability::LoadBalancing,
            Self::LoadBalancerNames => Capability::LoadBalancingV2,
            Self::InstanceProfileNames => Capability::Identity,
            Self::EcsClusterNames => Capability::Container,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SecurityGroupIds => "security_group_ids",
            Self::SecurityGroupNames => "security_group_names",
            Self::SubnetIds => "subnet_ids",
            Self::InstanceIds => "instance_ids",
            Self::KeyPairNames => "key_pair_names",
            Self::ImageIds => "image_ids",
            Self::DefaultVpc => "default_vpc",
            Self::EgressOnlyInternetGatewayIds => "egress_only_internet_gateway_ids",
            Self::InternetGatewayIds => "internet_gateway_ids",
            Self::NatGatewayIds => "nat_gateway_ids",
            Self::NetworkInterfaceIds => "network_interface_ids",
            Self::RouteTableIds => "route_table_ids",
            Self::VpcPeeringConnectionIds => "vpc_peering_connection_ids",
            Self::DbSubnetGroupNames => "db_subnet_group_names",
            Self::OptionGroupNames => "option_group_names",
            Self::DbParameterGroupNames => "db_parameter_group_names",
            Self::DbInstanceIdentifiers => "db_instance_identifiers",
            Self::CacheParameterGroupNames => "cache_parameter_group_names",
            Self::CacheSubnetGroupNames => "cache_subnet_group_names",
            Self::CacheClusterIds => "cache_cluster_ids",
            Self::ClassicLoadBalancerNames => "classic_load_balancer_names",
            Self::LoadBalancerNames => "load_balancer_names",
            Self::InstanceProfileNames => "instance_profile_names",
            Self::EcsClusterNames => "ecs_cluster_names",
        }
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
