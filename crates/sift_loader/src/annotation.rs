//! Inline ignore annotations.
//!
//! A comment of the form `# tfsift-ignore: rule_a, rule_b` (or `//`)
//! silences the named rules on its own line and on the line below.
//! The rule name `all` silences every rule.

use std::sync::LazyLock;

use regex::Regex;

static ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:#|//)\s*tfsift-ignore:\s*([A-Za-z0-9_,\s]+)").expect("valid annotation pattern")
});

/// An ignore annotation found in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub rules: Vec<String>,
    pub line: usize,
}

impl Annotation {
    /// Collect every annotation in `source`.
    pub fn scan(source: &str) -> Vec<Self> {
        source
            .lines()
            .enumerate()
            .filter_map(|(idx, text)| {
                let captures = ANNOTATION.captures(text)?;
                let rules: Vec<String> = captures[1]
                    .split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|rule| !rule.is_empty())
                    .map(str::to_string)
                    .collect();
                (!rules.is_empty()).then(|| Self {
                    rules,
                    line: idx + 1,
                })
            })
            .collect()
    }

    pub fn covers(&self, rule: &str, line: usize) -> bool {
        (line == self.line || line == self.line + 1)
            && self.rules.iter().any(|r| r == "all" || r == rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_annotations() {
        let source = r#"
resource "aws_instance" "web" {
  # tfsift-ignore: aws_instance_invalid_type
  instance_type = "t1.2xlarge"
  ami = "ami-1234" // tfsift-ignore: aws_instance_invalid_ami, aws_instance_invalid_key_name
}
"#;
        let annotations = Annotation::scan(source);
        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations[0].line, 3);
        assert_eq!(annotations[0].rules, vec!["aws_instance_invalid_type"]);
        assert_eq!(annotations[1].line, 5);
        assert_eq!(annotations[1].rules.len(), 2);
    }

    #[test]
    fn test_covers_same_and_next_line() {
        let annotation = Annotation {
            rules: vec!["aws_instance_invalid_type".to_string()],
            line: 3,
        };
        assert!(annotation.covers("aws_instance_invalid_type", 3));
        assert!(annotation.covers("aws_instance_invalid_type", 4));
        assert!(!annotation.covers("aws_instance_invalid_type", 5));
        assert!(!annotation.covers("aws_instance_invalid_ami", 4));
    }

    #[test]
    fn test_all_covers_every_rule() {
        let annotations = Annotation::scan("# tfsift-ignore: all\nname = \"x\"\n");
        assert!(annotations[0].covers("anything", 2));
    }
}
