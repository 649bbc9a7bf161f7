//! Readable master password check for `aws_db_instance`.

use std::sync::LazyLock;

use regex::Regex;
use sift_core::{DetectScope, Detector, DetectorMeta, IssueSink, Severity};
use sift_loader::{Expression, Module};

static VARIABLE_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bvar\.([A-Za-z_][A-Za-z0-9_-]*)").expect("valid variable pattern")
});

/// Reports passwords written into the configuration, either literally or
/// through variables that all carry a default.
pub struct ReadablePassword(DetectorMeta);

/// Whether `name` is declared in the module with a non-null default.
fn has_default(module: &Module, name: &str) -> bool {
    module
        .files
        .iter()
        .flat_map(|file| file.blocks_of("variable"))
        .filter(|block| block.label(0) == Some(name))
        .filter_map(|block| block.attribute("default"))
        .any(|default| !matches!(default.token.expression(), Some(Expression::Null)))
}

impl Detector for ReadablePassword {
    fn meta(&self) -> &DetectorMeta {
        &self.0
    }

    fn detect(&self, scope: &DetectScope<'_>, sink: &mut IssueSink) {
        for block in scope.resources(self.0.resource_type) {
            let Some(attr) = block.attribute(self.0.attribute) else {
                continue;
            };
            let variables: Vec<&str> = VARIABLE_REF
                .captures_iter(&attr.token.raw_text)
                .filter_map(|caps| caps.get(1))
                .map(|m| m.as_str())
                .collect();

            let readable = variables
                .iter()
                .all(|name| has_default(scope.module, name));
            if readable {
                sink.emit_at(
                    "Password for the master DB user is readable. Recommend using environment \
                     variables or variable files.",
                    &attr.token,
                );
            }
        }
    }
}

pub fn aws_db_instance_readable_password() -> Box<dyn Detector> {
    Box::new(ReadablePassword(DetectorMeta::new(
        "aws_db_instance_readable_password",
        "aws_db_instance",
        "password",
        Severity::Warning,
    )))
}
