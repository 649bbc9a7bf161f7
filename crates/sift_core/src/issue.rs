//! Issues reported by detectors.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// How serious an issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Notice,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Notice => "NOTICE",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warning" => Ok(Self::Warning),
            "notice" => Ok(Self::Notice),
            _ => Err(CoreError::UnknownVariant {
                kind: "severity",
                value: s.to_string(),
            }),
        }
    }
}

/// A single finding, tied to the file and line it was found at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub rule: String,
    pub severity: Severity,
    pub message: String,
    pub file: String,
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Issue {
    pub fn new(
        rule: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        file: impl Into<String>,
        line: usize,
    ) -> Self {
        Self {
            rule: rule.into(),
            severity,
            message: message.into(),
            file: file.into(),
            line,
            link: None,
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} {} {} ({})",
            self.file, self.line, self.severity, self.message, self.rule
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_parse() {
        assert_eq!("error".parse::<Severity>().unwrap(), Severity::Error);
        assert_eq!("WARNING".parse::<Severity>().unwrap(), Severity::Warning);
        assert_eq!("Notice".parse::<Severity>().unwrap(), Severity::Notice);

        let err = "fatal".parse::<Severity>().unwrap_err();
        assert!(matches!(err, CoreError::UnknownVariant { kind: "severity", .. }));
    }

    #[test]
    fn test_issue_display() {
        let issue = Issue::new(
            "aws_instance_invalid_type",
            Severity::Error,
            "\"t1.2xlarge\" is invalid instance type.",
            "main.tf",
            3,
        );
        assert_eq!(
            issue.to_string(),
            "main.tf:3 ERROR \"t1.2xlarge\" is invalid instance type. (aws_instance_invalid_type)"
        );
    }

    #[test]
    fn test_issue_serialization_skips_missing_link() {
        let issue = Issue::new("rule", Severity::Notice, "msg", "main.tf", 1);
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["severity"], "notice");
        assert!(json.get("link").is_none());
    }
}
