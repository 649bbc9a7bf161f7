//! Attribute value resolution.
//!
//! Attribute values come in four shapes: literal scalar, literal list,
//! interpolated scalar and interpolated list. The resolver reduces all of
//! them to strings paired with the token they came from, so an issue can
//! point at the exact line. Elements of an interpolated list have no
//! position of their own and share the attribute's line.

use sift_loader::{value_kind, Attribute, AttributeToken, Evaluator, Expression, TokenValue, Value};
use tracing::{debug, warn};

use crate::error::{CoreError, CoreResult};

/// Shape a rule expects an attribute to have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    Scalar,
    List,
}

/// A resolved string and the token it came from.
#[derive(Debug, Clone)]
pub struct ResolvedValue {
    pub value: String,
    pub token: AttributeToken,
}

/// Resolves attribute tokens against one module scope's evaluator.
#[derive(Debug, Clone, Copy)]
pub struct AttributeResolver<'a> {
    evaluator: &'a Evaluator,
}

impl<'a> AttributeResolver<'a> {
    pub fn new(evaluator: &'a Evaluator) -> Self {
        Self { evaluator }
    }

    /// Resolve a single token to a string.
    pub fn resolve(&self, token: &AttributeToken) -> CoreResult<String> {
        let expr = match &token.value {
            TokenValue::Resolved(value) => return Ok(value.clone()),
            TokenValue::Unresolvable(kind) => return Err(mismatch(token, "string", kind)),
            TokenValue::Expression(expr) => expr,
        };

        match expr {
            Expression::String(s) => Ok(s.clone()),
            Expression::Number(n) => Ok(n.to_string()),
            Expression::Bool(b) => Ok(b.to_string()),
            Expression::Array(_) => Err(mismatch(token, "string", "list")),
            Expression::Object(_) => Err(mismatch(token, "string", "map")),
            _ => match self.evaluate(token, expr)? {
                Value::String(s) => Ok(s),
                other => Err(mismatch(token, "string", value_kind(&other))),
            },
        }
    }

    /// Normalize a list-valued attribute into one token per element.
    pub fn resolve_list(&self, attribute: &Attribute) -> CoreResult<Vec<AttributeToken>> {
        if let Some(elements) = &attribute.elements {
            return Ok(elements.clone());
        }

        let token = &attribute.token;
        let expr = match &token.value {
            TokenValue::Expression(expr) => expr,
            TokenValue::Resolved(_) => return Err(mismatch(token, "list", "string")),
            TokenValue::Unresolvable(kind) => return Err(mismatch(token, "list", kind)),
        };
        if token.is_literal() {
            return Err(mismatch(token, "list", "string"));
        }

        match self.evaluate(token, expr)? {
            Value::Array(items) => Ok(items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => AttributeToken::resolved(s, &token.file, token.line),
                    other => AttributeToken::unresolvable(
                        value_kind(&other),
                        token.raw_text.clone(),
                        &token.file,
                        token.line,
                    ),
                })
                .collect()),
            other => Err(mismatch(token, "list", value_kind(&other))),
        }
    }

    /// Resolve an attribute into `(value, token)` pairs. Values that cannot
    /// be resolved are logged and left out.
    pub fn values(&self, attribute: &Attribute, shape: ValueShape) -> Vec<ResolvedValue> {
        let tokens = match shape {
            ValueShape::Scalar => vec![attribute.token.clone()],
            ValueShape::List => match self.resolve_list(attribute) {
                Ok(tokens) => tokens,
                Err(e) => {
                    log_skip(&attribute.name, &e);
                    return Vec::new();
                }
            },
        };

        tokens
            .into_iter()
            .filter_map(|token| match self.resolve(&token) {
                Ok(value) => Some(ResolvedValue { value, token }),
                Err(e) => {
                    log_skip(&attribute.name, &e);
                    None
                }
            })
            .collect()
    }

    fn evaluate(&self, token: &AttributeToken, expr: &Expression) -> CoreResult<Value> {
        self.evaluator
            .evaluate(expr)
            .map_err(|e| CoreError::Evaluation {
                file: token.file.clone(),
                line: token.line,
                message: e.to_string(),
            })
    }
}

fn mismatch(token: &AttributeToken, expected: &'static str, found: &str) -> CoreError {
    CoreError::TypeMismatch {
        file: token.file.clone(),
        line: token.line,
        expected,
        found: found.to_string(),
    }
}

fn log_skip(attribute: &str, error: &CoreError) {
    match error {
        CoreError::Evaluation { .. } => debug!("Skipping {}: {}", attribute, error),
        _ => warn!("Skipping {}: {}", attribute, error),
    }
}
