//! Rules that check an attribute refers to a resource that exists in the
//! cloud provider account.

use std::sync::Arc;

use async_trait::async_trait;
use sift_core::{
    CoreResult, DetectScope, Detector, DetectorMeta, IssueSink, Severity, ValueShape,
};
use sift_oracle::{Query, ResourceSet, ScopedOracle};
use tracing::debug;

/// Reports values missing from the set returned by one provider query.
pub struct ReferenceDetector {
    meta: DetectorMeta,
    query: Query,
    shape: ValueShape,
    noun: &'static str,
    known: Arc<ResourceSet>,
}

impl ReferenceDetector {
    pub fn new(meta: DetectorMeta, query: Query, shape: ValueShape, noun: &'static str) -> Self {
        Self {
            meta: meta.requires_oracle(),
            query,
            shape,
            noun,
            known: Arc::default(),
        }
    }
}

#[async_trait]
impl Detector for ReferenceDetector {
    fn meta(&self) -> &DetectorMeta {
        &self.meta
    }

    async fn pre_process(&mut self, oracle: &mut ScopedOracle<'_>) -> CoreResult<()> {
        debug!("Fetching {} for {}", self.query, self.meta.name);
        self.known = oracle.fetch(self.query).await?;
        Ok(())
    }

    fn detect(&self, scope: &DetectScope<'_>, sink: &mut IssueSink) {
        for block in scope.resources(self.meta.resource_type) {
            let Some(attr) = block.attribute(self.meta.attribute) else {
                continue;
            };
            for resolved in scope.resolver.values(attr, self.shape) {
                if !self.known.contains(&resolved.value) {
                    sink.emit_at(
                        format!("\"{}\" is invalid {}.", resolved.value, self.noun),
                        &resolved.token,
                    );
                }
            }
        }
    }
}

fn reference_rule(
    name: &'static str,
    resource_type: &'static str,
    attribute: &'static str,
    query: Query,
    shape: ValueShape,
    noun: &'static str,
) -> Box<dyn Detector> {
    Box::new(ReferenceDetector::new(
        DetectorMeta::new(name, resource_type, attribute, Severity::Error),
        query,
        shape,
        noun,
    ))
}

pub fn aws_instance_invalid_ami() -> Box<dyn Detector> {
    reference_rule(
        "aws_instance_invalid_ami",
        "aws_instance",
        "ami",
        Query::ImageIds,
        ValueShape::Scalar,
        "AMI ID",
    )
}

pub fn aws_instance_invalid_vpc_security_group() -> Box<dyn Detector> {
    reference_rule(
        "aws_instance_invalid_vpc_security_group",
        "aws_instance",
        "vpc_security_group_ids",
        Query::SecurityGroupIds,
        ValueShape::List,
        "security group",
    )
}

pub fn aws_instance_invalid_subnet() -> Box<dyn Detector> {
    reference_rule(
        "aws_instance_invalid_subnet",
        "aws_instance",
        "subnet_id",
        Query::SubnetIds,
        ValueShape::Scalar,
        "subnet ID",
    )
}

pub fn aws_instance_invalid_iam_profile() -> Box<dyn Detector> {
    reference_rule(
        "aws_instance_invalid_iam_profile",
        "aws_instance",
        "iam_instance_profile",
        Query::InstanceProfileNames,
        ValueShape::Scalar,
        "IAM profile name",
    )
}

pub fn aws_instance_invalid_key_name() -> Box<dyn Detector> {
    reference_rule(
        "aws_instance_invalid_key_name",
        "aws_instance",
        "key_name",
        Query::KeyPairNames,
        ValueShape::Scalar,
        "key name",
    )
}

pub fn aws_alb_invalid_security_group() -> Box<dyn Detector> {
    reference_rule(
        "aws_alb_invalid_security_group",
        "aws_alb",
        "security_groups",
        Query::SecurityGroupIds,
        ValueShape::List,
        "security group",
    )
}

pub fn aws_alb_invalid_subnet() -> Box<dyn Detector> {
    reference_rule(
        "aws_alb_invalid_subnet",
        "aws_alb",
        "subnets",
        Query::SubnetIds,
        ValueShape::List,
        "subnet ID",
    )
}

pub fn aws_elb_invalid_security_group() -> Box<dyn Detector> {
    reference_rule(
        "aws_elb_invalid_security_group",
        "aws_elb",
        "security_groups",
        Query::SecurityGroupIds,
        ValueShape::List,
        "security group",
    )
}

pub fn aws_elb_invalid_subnet() -> Box<dyn Detector> {
    reference_rule(
        "aws_elb_invalid_subnet",
        "aws_elb",
        "subnets",
        Query::SubnetIds,
        ValueShape::List,
        "subnet ID",
    )
}

pub fn aws_elb_invalid_instance() -> Box<dyn Detector> {
    reference_rule(
        "aws_elb_invalid_instance",
        "aws_elb",
        "instances",
        Query::InstanceIds,
        ValueShape::List,
        "instance",
    )
}

pub fn aws_db_instance_invalid_db_subnet_group() -> Box<dyn Detector> {
    reference_rule(
        "aws_db_instance_invalid_db_subnet_group",
        "aws_db_instance",
        "db_subnet_group_name",
        Query::DbSubnetGroupNames,
        ValueShape::Scalar,
        "DB subnet group name",
    )
}

pub fn aws_db_instance_invalid_option_group() -> Box<dyn Detector> {
    reference_rule(
        "aws_db_instance_invalid_option_group",
        "aws_db_instance",
        "option_group_name",
        Query::OptionGroupNames,
        ValueShape::Scalar,
        "option group name",
    )
}

pub fn aws_db_instance_invalid_parameter_group() -> Box<dyn Detector> {
    reference_rule(
        "aws_db_instance_invalid_parameter_group",
        "aws_db_instance",
        "parameter_group_name",
        Query::DbParameterGroupNames,
        ValueShape::Scalar,
        "parameter group name",
    )
}

pub fn aws_db_instance_invalid_vpc_security_group() -> Box<dyn Detector> {
    reference_rule(
        "aws_db_instance_invalid_vpc_security_group",
        "aws_db_instance",
        "vpc_security_group_ids",
        Query::SecurityGroupIds,
        ValueShape::List,
        "security group",
    )
}

pub fn aws_elasticache_cluster_invalid_parameter_group() -> Box<dyn Detector> {
    reference_rule(
        "aws_elasticache_cluster_invalid_parameter_group",
        "aws_elasticache_cluster",
        "parameter_group_name",
        Query::CacheParameterGroupNames,
        ValueShape::Scalar,
        "parameter group name",
    )
}

pub fn aws_elasticache_cluster_invalid_subnet_group() -> Box<dyn Detector> {
    reference_rule(
        "aws_elasticache_cluster_invalid_subnet_group",
        "aws_elasticache_cluster",
        "subnet_group_name",
        Query::CacheSubnetGroupNames,
        ValueShape::Scalar,
        "subnet group name",
    )
}

pub fn aws_elasticache_cluster_invalid_security_group() -> Box<dyn Detector> {
    reference_rule(
        "aws_elasticache_cluster_invalid_security_group",
        "aws_elasticache_cluster",
        "security_group_ids",
        Query::SecurityGroupIds,
        ValueShape::List,
        "security group",
    )
}

pub fn aws_route_invalid_route_table() -> Box<dyn Detector> {
    reference_rule(
        "aws_route_invalid_route_table",
        "aws_route",
        "route_table_id",
        Query::RouteTableIds,
        ValueShape::Scalar,
        "route table ID",
    )
}

pub fn aws_route_invalid_gateway() -> Box<dyn Detector> {
    reference_rule(
        "aws_route_invalid_gateway",
        "aws_route",
        "gateway_id",
        Query::InternetGatewayIds,
        ValueShape::Scalar,
        "internet gateway ID",
    )
}

pub fn aws_route_invalid_egress_only_gateway() -> Box<dyn Detector> {
    reference_rule(
        "aws_route_invalid_egress_only_gateway",
        "aws_route",
        "egress_only_gateway_id",
        Query::EgressOnlyInternetGatewayIds,
        ValueShape::Scalar,
        "egress only internet gateway ID",
    )
}

pub fn aws_route_invalid_nat_gateway() -> Box<dyn Detector> {
    reference_rule(
        "aws_route_invalid_nat_gateway",
        "aws_route",
        "nat_gateway_id",
        Query::NatGatewayIds,
        ValueShape::Scalar,
        "NAT gateway ID",
    )
}

pub fn aws_route_invalid_instance() -> Box<dyn Detector> {
    reference_rule(
        "aws_route_invalid_instance",
        "aws_route",
        "instance_id",
        Query::InstanceIds,
        ValueShape::Scalar,
        "instance ID",
    )
}

pub fn aws_route_invalid_network_interface() -> Box<dyn Detector> {
    reference_rule(
        "aws_route_invalid_network_interface",
        "aws_route",
        "network_interface_id",
        Query::NetworkInterfaceIds,
        ValueShape::Scalar,
        "network interface ID",
    )
}

pub fn aws_route_invalid_vpc_peering_connection() -> Box<dyn Detector> {
    reference_rule(
        "aws_route_invalid_vpc_peering_connection",
        "aws_route",
        "vpc_peering_connection_id",
        Query::VpcPeeringConnectionIds,
        ValueShape::Scalar,
        "VPC peering connection ID",
    )
}

pub fn aws_launch_configuration_invalid_image_id() -> Box<dyn Detector> {
    reference_rule(
        "aws_launch_configuration_invalid_image_id",
        "aws_launch_configuration",
        "image_id",
        Query::ImageIds,
        ValueShape::Scalar,
        "AMI ID",
    )
}

pub fn aws_launch_configuration_invalid_iam_profile() -> Box<dyn Detector> {
    reference_rule(
        "aws_launch_configuration_invalid_iam_profile",
        "aws_launch_configuration",
        "iam_instance_profile",
        Query::InstanceProfileNames,
        ValueShape::Scalar,
        "IAM profile name",
    )
}
