//! Expression evaluation over `var.*` and `local.*`.

use hcl::eval::{Context, Evaluate};
use hcl::{Expression, Map, Value};

use crate::error::{LoadError, LoadResult};

/// Evaluation context for one module scope.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    variables: Map<String, Value>,
    locals: Map<String, Value>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_variables(variables: Map<String, Value>) -> Self {
        Self {
            variables,
            locals: Map::new(),
        }
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    pub fn set_local(&mut self, name: impl Into<String>, value: Value) {
        self.locals.insert(name.into(), value);
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn local(&self, name: &str) -> Option<&Value> {
        self.locals.get(name)
    }

    /// Evaluate an expression. References to anything other than declared
    /// variables and locals fail.
    pub fn evaluate(&self, expr: &Expression) -> LoadResult<Value> {
        let mut ctx = Context::new();
        ctx.declare_var("var", Value::Object(self.variables.clone()));
        ctx.declare_var("local", Value::Object(self.locals.clone()));

        expr.evaluate(&ctx)
            .map_err(|e| LoadError::Evaluation(e.to_string()))
    }
}

/// Human-readable kind of a value, used in type mismatch messages.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}
