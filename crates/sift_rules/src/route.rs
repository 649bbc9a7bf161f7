//! Routing target checks for `aws_route`.

use sift_core::{DetectScope, Detector, DetectorMeta, IssueSink, Severity};
use sift_loader::{Block, Expression};

const TARGET_ATTRIBUTES: [&str; 7] = [
    "egress_only_gateway_id",
    "gateway_id",
    "instance_id",
    "nat_gateway_id",
    "network_interface_id",
    "transit_gateway_id",
    "vpc_peering_connection_id",
];

/// Number of routing targets a route sets. Attributes set to `null` do not
/// count.
fn target_count(block: &Block) -> usize {
    TARGET_ATTRIBUTES
        .iter()
        .filter_map(|name| block.attribute(name))
        .filter(|attr| !matches!(attr.token.expression(), Some(Expression::Null)))
        .count()
}

pub struct RouteNotSpecifiedTarget(DetectorMeta);

impl Detector for RouteNotSpecifiedTarget {
    fn meta(&self) -> &DetectorMeta {
        &self.0
    }

    fn detect(&self, scope: &DetectScope<'_>, sink: &mut IssueSink) {
        for block in scope.resources(self.0.resource_type) {
            if target_count(block) == 0 {
                sink.emit(
                    "The routing target is not specified, each aws_route must contain either \
                     egress_only_gateway_id, gateway_id, instance_id, nat_gateway_id, \
                     network_interface_id, transit_gateway_id, or vpc_peering_connection_id.",
                    &block.file,
                    block.line,
                );
            }
        }
    }
}

pub struct RouteSpecifiedMultipleTargets(DetectorMeta);

impl Detector for RouteSpecifiedMultipleTargets {
    fn meta(&self) -> &DetectorMeta {
        &self.0
    }

    fn detect(&self, scope: &DetectScope<'_>, sink: &mut IssueSink) {
        for block in scope.resources(self.0.resource_type) {
            if target_count(block) > 1 {
                sink.emit(
                    "More than one routing target specified. It must be one.",
                    &block.file,
                    block.line,
                );
            }
        }
    }
}

pub fn aws_route_not_specified_target() -> Box<dyn Detector> {
    Box::new(RouteNotSpecifiedTarget(DetectorMeta::new(
        "aws_route_not_specified_target",
        "aws_route",
        "",
        Severity::Error,
    )))
}

pub fn aws_route_specified_multiple_targets() -> Box<dyn Detector> {
    Box::new(RouteSpecifiedMultipleTargets(DetectorMeta::new(
        "aws_route_specified_multiple_targets",
        "aws_route",
        "",
        Severity::Error,
    )))
}
