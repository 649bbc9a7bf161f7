//! Structural checks on `aws_instance` blocks.

use sift_core::{DetectScope, Detector, DetectorMeta, IssueSink, Severity};

const BLOCK_DEVICES: [&str; 2] = ["root_block_device", "ebs_block_device"];

/// Block devices that leave `volume_type` to the provider default.
pub struct DefaultStandardVolume(DetectorMeta);

impl Detector for DefaultStandardVolume {
    fn meta(&self) -> &DetectorMeta {
        &self.0
    }

    fn detect(&self, scope: &DetectScope<'_>, sink: &mut IssueSink) {
        for block in scope.resources(self.0.resource_type) {
            for kind in BLOCK_DEVICES {
                for device in block.nested(kind) {
                    if !device.has_attribute("volume_type") {
                        sink.emit(
                            "\"volume_type\" is not specified. Default standard volume type is \
                             not recommended. You can use \"gp2\", \"io1\", etc instead.",
                            &device.file,
                            device.line,
                        );
                    }
                }
            }
        }
    }
}

/// Instances launched without an instance profile. Adding one later
/// replaces the instance.
pub struct NotSpecifiedIamProfile(DetectorMeta);

impl Detector for NotSpecifiedIamProfile {
    fn meta(&self) -> &DetectorMeta {
        &self.0
    }

    fn detect(&self, scope: &DetectScope<'_>, sink: &mut IssueSink) {
        for block in scope.resources(self.0.resource_type) {
            if !block.has_attribute(self.0.attribute) {
                sink.emit(
                    "\"iam_instance_profile\" is not specified. If you want to change it, you \
                     need to recreate the instance.",
                    &block.file,
                    block.line,
                );
            }
        }
    }
}

pub fn aws_instance_default_standard_volume() -> Box<dyn Detector> {
    Box::new(DefaultStandardVolume(DetectorMeta::new(
        "aws_instance_default_standard_volume",
        "aws_instance",
        "volume_type",
        Severity::Warning,
    )))
}

pub fn aws_instance_not_specified_iam_profile() -> Box<dyn Detector> {
    Box::new(NotSpecifiedIamProfile(
        DetectorMeta::new(
            "aws_instance_not_specified_iam_profile",
            "aws_instance",
            "iam_instance_profile",
            Severity::Notice,
        )
        .disabled(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_core::{DeploymentState, Issue};
    use sift_loader::{ConfigFile, Evaluator, Module};

    fn detect(detector: Box<dyn Detector>, source: &str) -> Vec<Issue> {
        let file = ConfigFile::parse("instance.tf", source).unwrap();
        let module = Module::from_files("", vec![file], Evaluator::new());
        let state = DeploymentState::empty();
        let scope = DetectScope::new(&module, &state);
        let mut sink = IssueSink::new(detector.meta());
        detector.detect(&scope, &mut sink);
        sink.into_issues()
    }

    #[test]
    fn test_block_devices_without_volume_type() {
        let source = r#"resource "aws_instance" "web" {
  instance_type = "t2.micro"

  root_block_device {
    volume_size = "24"
  }

  ebs_block_device {
    volume_size = "10"
    volume_type = "gp2"
  }

  ebs_block_device {
    volume_size = "10"
  }
}
"#;
        let issues = detect(aws_instance_default_standard_volume(), source);
        let lines: Vec<_> = issues.iter().map(|i| i.line).collect();
        assert_eq!(lines, vec![4, 13]);
        assert_eq!(issues[0].severity, Severity::Warning);
    }

    #[test]
    fn test_missing_iam_profile() {
        let detector = aws_instance_not_specified_iam_profile();
        assert!(!detector.meta().enabled);

        let issues = detect(
            detector,
            "resource \"aws_instance\" \"web\" {\n  instance_type = \"t2.micro\"\n}\n\nresource \"aws_instance\" \"app\" {\n  iam_instance_profile = \"app\"\n}\n",
        );
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].line, 1);
        assert_eq!(issues[0].severity, Severity::Notice);
    }
}
