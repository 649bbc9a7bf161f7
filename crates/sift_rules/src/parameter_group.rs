//! Default parameter group checks.

use std::sync::LazyLock;

use regex::Regex;
use sift_core::{DetectScope, Detector, DetectorMeta, IssueSink, Severity, ValueShape};

static DEFAULT_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^default").expect("valid regex"));

/// Reports parameter groups managed by AWS, which cannot be edited.
pub struct DefaultParameterGroup(DetectorMeta);

impl Detector for DefaultParameterGroup {
    fn meta(&self) -> &DetectorMeta {
        &self.0
    }

    fn detect(&self, scope: &DetectScope<'_>, sink: &mut IssueSink) {
        for block in scope.resources(self.0.resource_type) {
            let Some(attr) = block.attribute(self.0.attribute) else {
                continue;
            };
            for resolved in scope.resolver.values(attr, ValueShape::Scalar) {
                if DEFAULT_GROUP.is_match(&resolved.value) {
                    sink.emit_at(
                        format!(
                            "\"{}\" is default parameter group. You cannot edit it.",
                            resolved.value
                        ),
                        &resolved.token,
                    );
                }
            }
        }
    }
}

pub fn aws_db_instance_default_parameter_group() -> Box<dyn Detector> {
    Box::new(DefaultParameterGroup(DetectorMeta::new(
        "aws_db_instance_default_parameter_group",
        "aws_db_instance",
        "parameter_group_name",
        Severity::Notice,
    )))
}

pub fn aws_elasticache_cluster_default_parameter_group() -> Box<dyn Detector> {
    Box::new(DefaultParameterGroup(DetectorMeta::new(
        "aws_elasticache_cluster_default_parameter_group",
        "aws_elasticache_cluster",
        "parameter_group_name",
        Severity::Notice,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_core::DeploymentState;
    use sift_loader::{ConfigFile, Evaluator, Module};

    #[test]
    fn test_default_parameter_group() {
        let file = ConfigFile::parse(
            "cache.tf",
            "resource \"aws_elasticache_cluster\" \"redis\" {\n  parameter_group_name = \"default.redis3.2\"\n}\n\nresource \"aws_elasticache_cluster\" \"custom\" {\n  parameter_group_name = \"application3.2\"\n}\n",
        )
        .unwrap();
        let module = Module::from_files("", vec![file], Evaluator::new());
        let state = DeploymentState::empty();
        let scope = DetectScope::new(&module, &state);

        let detector = aws_elasticache_cluster_default_parameter_group();
        let mut sink = IssueSink::new(detector.meta());
        detector.detect(&scope, &mut sink);

        let issues = sink.into_issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(
            issues[0].message,
            "\"default.redis3.2\" is default parameter group. You cannot edit it."
        );
        assert_eq!(issues[0].severity, Severity::Notice);
        assert_eq!(issues[0].line, 2);
    }
}
