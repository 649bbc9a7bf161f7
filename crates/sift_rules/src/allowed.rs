//! Rules that check an attribute against a static table of values.

use sift_core::{DetectScope, Detector, DetectorMeta, IssueSink, Severity, ValueShape};

use crate::tables::{
    Table, CACHE_NODE_TYPES, DB_INSTANCE_CLASSES, INSTANCE_TYPES, METRIC_UNITS,
    PREVIOUS_CACHE_NODE_TYPES, PREVIOUS_DB_INSTANCE_CLASSES, PREVIOUS_INSTANCE_TYPES,
};

/// Whether a value must be in the table or must not be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    /// Values outside the table are reported.
    Required,
    /// Values inside the table are reported.
    Forbidden,
}

pub struct TableDetector {
    meta: DetectorMeta,
    table: &'static Table,
    membership: Membership,
    message: &'static str,
}

impl TableDetector {
    /// `message` follows the quoted value, e.g. `is invalid unit.`
    pub fn new(
        meta: DetectorMeta,
        table: &'static Table,
        membership: Membership,
        message: &'static str,
    ) -> Self {
        Self {
            meta,
            table,
            membership,
            message,
        }
    }

    fn violates(&self, value: &str) -> bool {
        let listed = self.table.contains(value);
        match self.membership {
            Membership::Required => !listed,
            Membership::Forbidden => listed,
        }
    }
}

impl Detector for TableDetector {
    fn meta(&self) -> &DetectorMeta {
        &self.meta
    }

    fn detect(&self, scope: &DetectScope<'_>, sink: &mut IssueSink) {
        for block in scope.resources(self.meta.resource_type) {
            let Some(attr) = block.attribute(self.meta.attribute) else {
                continue;
            };
            for resolved in scope.resolver.values(attr, ValueShape::Scalar) {
                if self.violates(&resolved.value) {
                    sink.emit_at(
                        format!("\"{}\" {}", resolved.value, self.message),
                        &resolved.token,
                    );
                }
            }
        }
    }
}

fn table_rule(
    name: &'static str,
    resource_type: &'static str,
    attribute: &'static str,
    severity: Severity,
    table: &'static Table,
    membership: Membership,
    message: &'static str,
) -> Box<dyn Detector> {
    Box::new(TableDetector::new(
        DetectorMeta::new(name, resource_type, attribute, severity),
        table,
        membership,
        message,
    ))
}

pub fn aws_instance_invalid_type() -> Box<dyn Detector> {
    table_rule(
        "aws_instance_invalid_type",
        "aws_instance",
        "instance_type",
        Severity::Error,
        &INSTANCE_TYPES,
        Membership::Required,
        "is invalid instance type.",
    )
}

pub fn aws_instance_previous_type() -> Box<dyn Detector> {
    table_rule(
        "aws_instance_previous_type",
        "aws_instance",
        "instance_type",
        Severity::Warning,
        &PREVIOUS_INSTANCE_TYPES,
        Membership::Forbidden,
        "is previous generation instance type.",
    )
}

pub fn aws_launch_configuration_invalid_type() -> Box<dyn Detector> {
    table_rule(
        "aws_launch_configuration_invalid_type",
        "aws_launch_configuration",
        "instance_type",
        Severity::Error,
        &INSTANCE_TYPES,
        Membership::Required,
        "is invalid instance type.",
    )
}

pub fn aws_db_instance_invalid_type() -> Box<dyn Detector> {
    table_rule(
        "aws_db_instance_invalid_type",
        "aws_db_instance",
        "instance_class",
        Severity::Error,
        &DB_INSTANCE_CLASSES,
        Membership::Required,
        "is invalid instance type.",
    )
}

pub fn aws_db_instance_previous_type() -> Box<dyn Detector> {
    table_rule(
        "aws_db_instance_previous_type",
        "aws_db_instance",
        "instance_class",
        Severity::Warning,
        &PREVIOUS_DB_INSTANCE_CLASSES,
        Membership::Forbidden,
        "is previous generation instance type.",
    )
}

pub fn aws_elasticache_cluster_invalid_type() -> Box<dyn Detector> {
    table_rule(
        "aws_elasticache_cluster_invalid_type",
        "aws_elasticache_cluster",
        "node_type",
        Severity::Error,
        &CACHE_NODE_TYPES,
        Membership::Required,
        "is invalid node type.",
    )
}

pub fn aws_elasticache_cluster_previous_type() -> Box<dyn Detector> {
    table_rule(
        "aws_elasticache_cluster_previous_type",
        "aws_elasticache_cluster",
        "node_type",
        Severity::Warning,
        &PREVIOUS_CACHE_NODE_TYPES,
        Membership::Forbidden,
        "is previous generation node type.",
    )
}

pub fn aws_cloudwatch_metric_alarm_invalid_unit() -> Box<dyn Detector> {
    table_rule(
        "aws_cloudwatch_metric_alarm_invalid_unit",
        "aws_cloudwatch_metric_alarm",
        "unit",
        Severity::Error,
        &METRIC_UNITS,
        Membership::Required,
        "is invalid unit.",
    )
}
