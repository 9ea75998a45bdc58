//! The function registry and the builtin scalar functions.
//!
//! Functions are resolved by lower-cased name. A registered function
//! validates its own arity through [`Function::accept`]; argument-kind
//! problems inside the body surface as `BadArgument`.

use crate::rillstream::core::context::Context;
use crate::rillstream::sql::error::SqlError;
use crate::rillstream::sql::execution::types::FieldValue;
use std::collections::HashMap;
use std::sync::Arc;

/// A callable registered under a name.
///
/// Implementations must be pure with respect to the binding; shared state
/// is reached through the Context's registry, never through captured
/// mutable references.
pub trait Function: Send + Sync {
    /// Whether this function can be called with `arity` arguments
    fn accept(&self, arity: usize) -> bool;

    fn call(&self, ctx: &Context, args: &[FieldValue]) -> Result<FieldValue, SqlError>;
}

/// Name → function mapping with lower-cased lookup
pub struct FunctionRegistry {
    functions: HashMap<String, Arc<dyn Function>>,
}

impl FunctionRegistry {
    /// Registry without any builtins
    pub fn empty() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// Register a function; the name is stored lower-cased
    pub fn register(
        &mut self,
        name: impl Into<String>,
        function: Arc<dyn Function>,
    ) -> Result<(), SqlError> {
        let key = name.into().to_lowercase();
        if self.functions.contains_key(&key) {
            return Err(SqlError::internal(format!(
                "function '{}' is already registered",
                key
            )));
        }
        self.functions.insert(key, function);
        Ok(())
    }

    /// Look a function up by name, case-insensitively
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Function>> {
        self.functions.get(&name.to_lowercase()).cloned()
    }
}

impl Default for FunctionRegistry {
    /// Registry preloaded with the builtin scalar functions
    fn default() -> Self {
        let mut registry = Self::empty();
        for builtin in builtins() {
            let name = builtin.name;
            registry
                .register(name, Arc::new(builtin))
                .unwrap_or_else(|_| unreachable!("builtin '{}' registered twice", name));
        }
        registry
    }
}

type ScalarBody = fn(&[FieldValue]) -> Result<FieldValue, SqlError>;

/// A fixed-arity-range scalar function defined by a plain fn
struct ScalarFunction {
    name: &'static str,
    min_args: usize,
    max_args: Option<usize>,
    body: ScalarBody,
}

impl Function for ScalarFunction {
    fn accept(&self, arity: usize) -> bool {
        arity >= self.min_args && self.max_args.map_or(true, |max| arity <= max)
    }

    fn call(&self, _ctx: &Context, args: &[FieldValue]) -> Result<FieldValue, SqlError> {
        (self.body)(args)
    }
}

fn builtins() -> Vec<ScalarFunction> {
    vec![
        ScalarFunction {
            name: "abs",
            min_args: 1,
            max_args: Some(1),
            body: abs_function,
        },
        ScalarFunction {
            name: "upper",
            min_args: 1,
            max_args: Some(1),
            body: upper_function,
        },
        ScalarFunction {
            name: "lower",
            min_args: 1,
            max_args: Some(1),
            body: lower_function,
        },
        ScalarFunction {
            name: "length",
            min_args: 1,
            max_args: Some(1),
            body: length_function,
        },
        ScalarFunction {
            name: "coalesce",
            min_args: 1,
            max_args: None,
            body: coalesce_function,
        },
        ScalarFunction {
            name: "power",
            min_args: 2,
            max_args: Some(2),
            body: power_function,
        },
        ScalarFunction {
            name: "sqrt",
            min_args: 1,
            max_args: Some(1),
            body: sqrt_function,
        },
    ]
}

fn abs_function(args: &[FieldValue]) -> Result<FieldValue, SqlError> {
    match &args[0] {
        FieldValue::Null => Ok(FieldValue::Null),
        FieldValue::Integer(i) => Ok(FieldValue::Integer(i.wrapping_abs())),
        FieldValue::Float(f) => Ok(FieldValue::Float(f.abs())),
        other => Err(SqlError::bad_argument(
            "abs",
            format!("expected a numeric argument, got {}", other.type_name()),
        )),
    }
}

fn upper_function(args: &[FieldValue]) -> Result<FieldValue, SqlError> {
    match &args[0] {
        FieldValue::Null => Ok(FieldValue::Null),
        FieldValue::String(s) => Ok(FieldValue::String(s.to_uppercase())),
        other => Err(SqlError::bad_argument(
            "upper",
            format!("expected a string argument, got {}", other.type_name()),
        )),
    }
}

fn lower_function(args: &[FieldValue]) -> Result<FieldValue, SqlError> {
    match &args[0] {
        FieldValue::Null => Ok(FieldValue::Null),
        FieldValue::String(s) => Ok(FieldValue::String(s.to_lowercase())),
        other => Err(SqlError::bad_argument(
            "lower",
            format!("expected a string argument, got {}", other.type_name()),
        )),
    }
}

fn length_function(args: &[FieldValue]) -> Result<FieldValue, SqlError> {
    match &args[0] {
        FieldValue::Null => Ok(FieldValue::Null),
        FieldValue::String(s) => Ok(FieldValue::Integer(s.chars().count() as i64)),
        FieldValue::Blob(b) => Ok(FieldValue::Integer(b.len() as i64)),
        FieldValue::Array(a) => Ok(FieldValue::Integer(a.len() as i64)),
        other => Err(SqlError::bad_argument(
            "length",
            format!(
                "expected a string, blob or array argument, got {}",
                other.type_name()
            ),
        )),
    }
}

fn coalesce_function(args: &[FieldValue]) -> Result<FieldValue, SqlError> {
    for arg in args {
        if !matches!(arg, FieldValue::Null) {
            return Ok(arg.clone());
        }
    }
    Ok(FieldValue::Null)
}

fn power_function(args: &[FieldValue]) -> Result<FieldValue, SqlError> {
    let base = numeric_arg("power", &args[0])?;
    let exp = numeric_arg("power", &args[1])?;
    match (base, exp) {
        (Some(b), Some(e)) => Ok(FieldValue::Float(b.powf(e))),
        _ => Ok(FieldValue::Null),
    }
}

fn sqrt_function(args: &[FieldValue]) -> Result<FieldValue, SqlError> {
    match numeric_arg("sqrt", &args[0])? {
        Some(f) => Ok(FieldValue::Float(f.sqrt())),
        None => Ok(FieldValue::Null),
    }
}

/// Extract a numeric argument as f64; None stands for NULL
fn numeric_arg(function: &str, value: &FieldValue) -> Result<Option<f64>, SqlError> {
    match value {
        FieldValue::Null => Ok(None),
        FieldValue::Integer(i) => Ok(Some(*i as f64)),
        FieldValue::Float(f) => Ok(Some(*f)),
        other => Err(SqlError::bad_argument(
            function,
            format!("expected a numeric argument, got {}", other.type_name()),
        )),
    }
}
