//! The built-in rule set.

use sift_core::{DetectorFactory, DetectorRegistry};

use crate::{allowed, duplicate, instance, parameter_group, password, reference, route};

/// Every built-in rule, in reporting order.
pub const RULES: &[DetectorFactory] = &[
    allowed::aws_instance_invalid_type,
    allowed::aws_instance_previous_type,
    instance::aws_instance_not_specified_iam_profile,
    instance::aws_instance_default_standard_volume,
    reference::aws_instance_invalid_ami,
    reference::aws_instance_invalid_vpc_security_group,
    reference::aws_instance_invalid_subnet,
    reference::aws_instance_invalid_iam_profile,
    reference::aws_instance_invalid_key_name,
    reference::aws_alb_invalid_security_group,
    reference::aws_alb_invalid_subnet,
    duplicate::aws_alb_duplicate_name,
    reference::aws_elb_invalid_security_group,
    reference::aws_elb_invalid_subnet,
    reference::aws_elb_invalid_instance,
    duplicate::aws_elb_duplicate_name,
    allowed::aws_db_instance_invalid_type,
    allowed::aws_db_instance_previous_type,
    parameter_group::aws_db_instance_default_parameter_group,
    password::aws_db_instance_readable_password,
    reference::aws_db_instance_invalid_db_subnet_group,
    reference::aws_db_instance_invalid_option_group,
    reference::aws_db_instance_invalid_parameter_group,
    reference::aws_db_instance_invalid_vpc_security_group,
    duplicate::aws_db_instance_duplicate_identifier,
    allowed::aws_elasticache_cluster_invalid_type,
    allowed::aws_elasticache_cluster_previous_type,
    parameter_group::aws_elasticache_cluster_default_parameter_group,
    reference::aws_elasticache_cluster_invalid_parameter_group,
    reference::aws_elasticache_cluster_invalid_subnet_group,
    reference::aws_elasticache_cluster_invalid_security_group,
    duplicate::aws_elasticache_cluster_duplicate_id,
    duplicate::aws_security_group_duplicate_name,
    allowed::aws_cloudwatch_metric_alarm_invalid_unit,
    duplicate::aws_ecs_cluster_duplicate_name,
    route::aws_route_not_specified_target,
    route::aws_route_specified_multiple_targets,
    reference::aws_route_invalid_route_table,
    reference::aws_route_invalid_gateway,
    reference::aws_route_invalid_egress_only_gateway,
    reference::aws_route_invalid_nat_gateway,
    reference::aws_route_invalid_instance,
    reference::aws_route_invalid_network_interface,
    reference::aws_route_invalid_vpc_peering_connection,
    allowed::aws_launch_configuration_invalid_type,
    reference::aws_launch_configuration_invalid_image_id,
    reference::aws_launch_configuration_invalid_iam_profile,
];

/// A registry holding every built-in rule.
pub fn default_registry() -> DetectorRegistry {
    RULES
        .iter()
        .fold(DetectorRegistry::new(), |registry, factory| registry.with(*factory))
}
