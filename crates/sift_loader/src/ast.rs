//! Position-tagged configuration tree.
//!
//! Files are parsed with `hcl-edit`, which keeps byte spans for every node,
//! and flattened into [`Block`]s and [`Attribute`]s that carry the file name
//! and 1-based line they came from. Expressions are converted to `hcl-rs`
//! expressions so they can be evaluated later.

use std::ops::Range;

use hcl_edit::expr::Expression as EditExpression;
use hcl_edit::structure::{Block as EditBlock, BlockLabel, Body, Structure};
use hcl_edit::Span;

use crate::annotation::Annotation;
use crate::error::{LoadError, LoadResult};

/// Maps byte offsets in a source file to 1-based line numbers.
#[derive(Debug, Clone)]
pub struct SourceMap {
    line_starts: Vec<usize>,
}

impl SourceMap {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(source.match_indices('\n').map(|(idx, _)| idx + 1));
        Self { line_starts }
    }

    /// Line containing the byte at `offset`.
    pub fn line_of(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|&start| start <= offset)
    }
}

/// What a token holds before resolution.
#[derive(Debug, Clone)]
pub enum TokenValue {
    /// Parsed expression, evaluated on demand.
    Expression(hcl::Expression),
    /// A string that was already produced by evaluation.
    Resolved(String),
    /// An evaluated value that is not a string; holds the value's kind.
    Unresolvable(String),
}

/// A single attribute value (or list element) with its source position.
#[derive(Debug, Clone)]
pub struct AttributeToken {
    pub raw_text: String,
    pub file: String,
    pub line: usize,
    pub value: TokenValue,
}

impl AttributeToken {
    /// Token for a value that has already been evaluated to a string.
    pub fn resolved(value: impl Into<String>, file: impl Into<String>, line: usize) -> Self {
        let value = value.into();
        Self {
            raw_text: value.clone(),
            file: file.into(),
            line,
            value: TokenValue::Resolved(value),
        }
    }

    /// Token for an evaluated value that cannot be used as a string.
    pub fn unresolvable(
        kind: impl Into<String>,
        raw_text: impl Into<String>,
        file: impl Into<String>,
        line: usize,
    ) -> Self {
        Self {
            raw_text: raw_text.into(),
            file: file.into(),
            line,
            value: TokenValue::Unresolvable(kind.into()),
        }
    }

    pub fn expression(&self) -> Option<&hcl::Expression> {
        match &self.value {
            TokenValue::Expression(expr) => Some(expr),
            _ => None,
        }
    }

    /// Whether the token is a quoted string, number or bool literal.
    pub fn is_literal(&self) -> bool {
        matches!(
            self.expression(),
            Some(hcl::Expression::String(_))
                | Some(hcl::Expression::Number(_))
                | Some(hcl::Expression::Bool(_))
        )
    }
}

/// A `name = value` attribute.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    /// The whole right-hand side.
    pub token: AttributeToken,
    /// One token per element when the value is a literal list.
    pub elements: Option<Vec<AttributeToken>>,
}

impl Attribute {
    pub fn line(&self) -> usize {
        self.token.line
    }

    pub fn file(&self) -> &str {
        &self.token.file
    }
}

/// A block such as `resource "aws_instance" "web" { ... }`.
#[derive(Debug, Clone)]
pub struct Block {
    pub kind: String,
    pub labels: Vec<String>,
    pub attributes: Vec<Attribute>,
    pub blocks: Vec<Block>,
    pub file: String,
    pub line: usize,
}

impl Block {
    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attr| attr.name == name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Nested blocks of the given kind.
    pub fn nested<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Block> + 'a {
        self.blocks.iter().filter(move |block| block.kind == kind)
    }

    pub fn is_resource_of(&self, resource_type: &str) -> bool {
        self.kind == "resource" && self.label(0) == Some(resource_type)
    }

    /// Local name of a resource block (its second label).
    pub fn resource_name(&self) -> Option<&str> {
        if self.kind == "resource" {
            self.label(1)
        } else {
            None
        }
    }
}

/// A parsed `.tf` (or `.tfvars`) file.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub path: String,
    pub attributes: Vec<Attribute>,
    pub blocks: Vec<Block>,
    pub annotations: Vec<Annotation>,
}

impl ConfigFile {
    /// Parse HCL source. `path` is the name issues will cite.
    pub fn parse(path: impl Into<String>, source: &str) -> LoadResult<Self> {
        let path = path.into();
        let body = hcl_edit::parser::parse_body(source).map_err(|e| LoadError::Parse {
            file: path.clone(),
            message: e.to_string(),
        })?;

        let converter = Converter {
            file: &path,
            source,
            map: SourceMap::new(source),
        };
        let (attributes, blocks) = converter.body(&body);

        Ok(Self {
            annotations: Annotation::scan(source),
            path,
            attributes,
            blocks,
        })
    }

    /// Top-level blocks of the given kind.
    pub fn blocks_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Block> + 'a {
        self.blocks.iter().filter(move |block| block.kind == kind)
    }

    /// Resource blocks of the given type, in source order.
    pub fn resources<'a>(&'a self, resource_type: &'a str) -> impl Iterator<Item = &'a Block> + 'a {
        self.blocks
            .iter()
            .filter(move |block| block.is_resource_of(resource_type))
    }

    /// Whether an ignore annotation in this file covers `rule` at `line`.
    pub fn is_ignored(&self, rule: &str, line: usize) -> bool {
        self.annotations.iter().any(|a| a.covers(rule, line))
    }
}

struct Converter<'a> {
    file: &'a str,
    source: &'a str,
    map: SourceMap,
}

impl Converter<'_> {
    fn line(&self, span: Option<Range<usize>>) -> Option<usize> {
        span.map(|range| self.map.line_of(range.start))
    }

    fn body(&self, body: &Body) -> (Vec<Attribute>, Vec<Block>) {
        let mut attributes = Vec::new();
        let mut blocks = Vec::new();

        for structure in body.iter() {
            match structure {
                Structure::Attribute(attr) => {
                    let line = self.line(attr.key.span()).unwrap_or(0);
                    attributes.push(self.attribute(attr.key.as_str(), &attr.value, line));
                }
                Structure::Block(block) => blocks.push(self.block(block)),
            }
        }

        (attributes, blocks)
    }

    fn block(&self, block: &EditBlock) -> Block {
        let labels = block
            .labels
            .iter()
            .map(|label| match label {
                BlockLabel::String(s) => s.value().to_string(),
                BlockLabel::Ident(ident) => ident.as_str().to_string(),
            })
            .collect();
        let (attributes, blocks) = self.body(&block.body);

        Block {
            kind: block.ident.as_str().to_string(),
            labels,
            attributes,
            blocks,
            file: self.file.to_string(),
            line: self.line(block.ident.span()).unwrap_or(0),
        }
    }

    fn attribute(&self, name: &str, value: &EditExpression, line: usize) -> Attribute {
        let elements = match value {
            EditExpression::Array(array) => Some(
                array
                    .iter()
                    .map(|element| {
                        let element_line = self.line(element.span()).unwrap_or(line);
                        self.token(element, element_line)
                    })
                    .collect(),
            ),
            _ => None,
        };

        Attribute {
            name: name.to_string(),
            token: self.token(value, line),
            elements,
        }
    }

    fn token(&self, expr: &EditExpression, line: usize) -> AttributeToken {
        let raw_text = expr
            .span()
            .and_then(|range| self.source.get(range))
            .map(|text| text.trim().to_string())
            .unwrap_or_else(|| expr.to_string().trim().to_string());

        AttributeToken {
            raw_text,
            file: self.file.to_string(),
            line,
            value: TokenValue::Expression(hcl::Expression::from(expr.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"
resource "aws_instance" "web" {
  instance_type = "t2.micro"
  vpc_security_group_ids = [
    "sg-1234abcd",
    "sg-abcd1234",
  ]

  root_block_device {
    volume_size = 16
  }
}

module "network" {
  source = "./network"
}
"#;

    #[test]
    fn test_source_map_lines() {
        let map = SourceMap::new("a\nbc\n\nd");
        assert_eq!(map.line_of(0), 1);
        assert_eq!(map.line_of(2), 2);
        assert_eq!(map.line_of(3), 2);
        assert_eq!(map.line_of(5), 3);
        assert_eq!(map.line_of(6), 4);
    }

    #[test]
    fn test_parse_blocks_and_lines() {
        let file = ConfigFile::parse("main.tf", SOURCE).unwrap();
        assert_eq!(file.blocks.len(), 2);

        let web = file.resources("aws_instance").next().unwrap();
        assert_eq!(web.line, 2);
        assert_eq!(web.resource_name(), Some("web"));
        assert_eq!(web.file, "main.tf");

        let instance_type = web.attribute("instance_type").unwrap();
        assert_eq!(instance_type.line(), 3);
        assert_eq!(instance_type.token.raw_text, "\"t2.micro\"");
        assert!(instance_type.token.is_literal());
        assert!(instance_type.elements.is_none());

        let device = web.nested("root_block_device").next().unwrap();
        assert_eq!(device.line, 9);
        assert!(device.has_attribute("volume_size"));
    }

    #[test]
    fn test_literal_list_elements_keep_own_lines() {
        let file = ConfigFile::parse("main.tf", SOURCE).unwrap();
        let web = file.resources("aws_instance").next().unwrap();
        let groups = web.attribute("vpc_security_group_ids").unwrap();

        assert_eq!(groups.line(), 4);
        let elements = groups.elements.as_ref().unwrap();
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].line, 5);
        assert_eq!(elements[1].line, 6);
        assert_eq!(elements[1].raw_text, "\"sg-abcd1234\"");
    }

    #[test]
    fn test_interpolation_is_not_literal() {
        let file = ConfigFile::parse("main.tf", "locals {\n  a = \"${var.x}\"\n  b = var.y\n}\n")
            .unwrap();
        let locals = file.blocks_of("locals").next().unwrap();
        assert!(!locals.attribute("a").unwrap().token.is_literal());
        assert!(!locals.attribute("b").unwrap().token.is_literal());
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = ConfigFile::parse("broken.tf", "resource \"x\" {").unwrap_err();
        match err {
            LoadError::Parse { file, .. } => assert_eq!(file, "broken.tf"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
