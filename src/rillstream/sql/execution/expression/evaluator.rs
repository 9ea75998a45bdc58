//! Expression evaluator for analyzed expression trees.
//!
//! Evaluation is pure: a row binding goes in, a value or an error comes
//! out, and neither the binding nor any engine state is mutated. NULL
//! propagates through arithmetic, comparison and concatenation;
//! AND/OR/NOT follow three-valued logic; `IS [NOT] NULL` is the only
//! operator that never yields NULL.

use super::functions::FunctionRegistry;
use crate::rillstream::core::context::Context;
use crate::rillstream::sql::ast::{BinaryOperator, Expr, LiteralValue, PathStep, UnaryOperator};
use crate::rillstream::sql::error::SqlError;
use crate::rillstream::sql::execution::types::{FieldValue, RowBinding};
use std::cmp::Ordering;
use std::sync::Arc;

/// Evaluates analyzed expression trees over a row binding
pub struct ExpressionEvaluator {
    registry: Arc<FunctionRegistry>,
}

impl ExpressionEvaluator {
    pub fn new(registry: Arc<FunctionRegistry>) -> Self {
        Self { registry }
    }

    /// Evaluate an expression to a value
    pub fn eval(
        &self,
        ctx: &Context,
        expr: &Expr,
        binding: &RowBinding,
    ) -> Result<FieldValue, SqlError> {
        match expr {
            Expr::Literal(literal) => Ok(literal_value(literal)),
            Expr::Column { name, path } => lookup_column(name, path, binding),
            Expr::EventTime => Ok(FieldValue::Timestamp(binding.timestamp)),
            Expr::Function { name, args } => self.eval_function(ctx, name, args, binding),
            Expr::UnaryOp { op, expr } => self.eval_unary(ctx, *op, expr, binding),
            Expr::BinaryOp { left, op, right } => {
                let left_val = self.eval(ctx, left, binding)?;
                let right_val = self.eval(ctx, right, binding)?;
                eval_binary(&left_val, *op, &right_val)
            }
            Expr::Cast { expr, target } => {
                let value = self.eval(ctx, expr, binding)?;
                value.cast_to(*target)
            }
            // The factory keeps wildcards out of filter position; in
            // projection position the whole row is the value.
            Expr::Wildcard => Ok(FieldValue::Map(binding.fields.clone())),
        }
    }

    /// Evaluate a filter expression with strict-boolean output.
    ///
    /// A NULL filter result treats the row as non-matching, identical to
    /// false; any non-boolean, non-NULL value is a type mismatch.
    pub fn eval_filter(
        &self,
        ctx: &Context,
        expr: &Expr,
        binding: &RowBinding,
    ) -> Result<bool, SqlError> {
        match self.eval(ctx, expr, binding)? {
            FieldValue::Boolean(b) => Ok(b),
            FieldValue::Null => Ok(false),
            other => Err(SqlError::type_mismatch("BOOLEAN filter", other.type_name())),
        }
    }

    fn eval_function(
        &self,
        ctx: &Context,
        name: &str,
        args: &[Expr],
        binding: &RowBinding,
    ) -> Result<FieldValue, SqlError> {
        let function = self
            .registry
            .lookup(name)
            .ok_or_else(|| SqlError::unknown_function(name))?;
        if !function.accept(args.len()) {
            return Err(SqlError::bad_argument(
                name,
                format!("cannot be called with {} arguments", args.len()),
            ));
        }
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval(ctx, arg, binding)?);
        }
        function.call(ctx, &values)
    }

    fn eval_unary(
        &self,
        ctx: &Context,
        op: UnaryOperator,
        expr: &Expr,
        binding: &RowBinding,
    ) -> Result<FieldValue, SqlError> {
        let value = self.eval(ctx, expr, binding)?;
        match op {
            UnaryOperator::Not => match bool3(&value)? {
                Some(b) => Ok(FieldValue::Boolean(!b)),
                None => Ok(FieldValue::Null),
            },
            UnaryOperator::Minus => value.neg(),
            UnaryOperator::Plus => match value {
                FieldValue::Null | FieldValue::Integer(_) | FieldValue::Float(_) => Ok(value),
                other => Err(SqlError::type_mismatch("numeric operand", other.type_name())),
            },
            UnaryOperator::IsNull => {
                Ok(FieldValue::Boolean(matches!(value, FieldValue::Null)))
            }
            UnaryOperator::IsNotNull => {
                Ok(FieldValue::Boolean(!matches!(value, FieldValue::Null)))
            }
        }
    }
}

fn literal_value(literal: &LiteralValue) -> FieldValue {
    match literal {
        LiteralValue::String(s) => FieldValue::String(s.clone()),
        LiteralValue::Integer(i) => FieldValue::Integer(*i),
        LiteralValue::Float(f) => FieldValue::Float(*f),
        LiteralValue::Boolean(b) => FieldValue::Boolean(*b),
        LiteralValue::Null => FieldValue::Null,
    }
}

/// Walk a column reference: the top-level field, then each path step
fn lookup_column(
    name: &str,
    path: &[PathStep],
    binding: &RowBinding,
) -> Result<FieldValue, SqlError> {
    let mut current = binding
        .fields
        .get(name)
        .ok_or_else(|| SqlError::field_not_found(name))?;
    let mut described = name.to_string();
    for step in path {
        match step {
            PathStep::Key(key) => {
                let map = match current {
                    FieldValue::Map(map) => map,
                    other => {
                        return Err(SqlError::type_mismatch(
                            format!("MAP at '{}'", described),
                            other.type_name(),
                        ));
                    }
                };
                described = format!("{}.{}", described, key);
                current = map
                    .get(key.as_str())
                    .ok_or_else(|| SqlError::field_not_found(&described))?;
            }
            PathStep::Index(idx) => {
                let arr = match current {
                    FieldValue::Array(arr) => arr,
                    other => {
                        return Err(SqlError::type_mismatch(
                            format!("ARRAY at '{}'", described),
                            other.type_name(),
                        ));
                    }
                };
                described = format!("{}[{}]", described, idx);
                current = arr
                    .get(*idx)
                    .ok_or_else(|| SqlError::field_not_found(&described))?;
            }
        }
    }
    Ok(current.clone())
}

fn eval_binary(
    left: &FieldValue,
    op: BinaryOperator,
    right: &FieldValue,
) -> Result<FieldValue, SqlError> {
    match op {
        BinaryOperator::Add => left.add(right),
        BinaryOperator::Subtract => left.subtract(right),
        BinaryOperator::Multiply => left.multiply(right),
        BinaryOperator::Divide => left.divide(right),
        BinaryOperator::Modulo => left.modulo(right),
        BinaryOperator::Concat => left.concat(right),

        BinaryOperator::Equal | BinaryOperator::NotEqual => {
            if matches!(left, FieldValue::Null) || matches!(right, FieldValue::Null) {
                return Ok(FieldValue::Null);
            }
            let equal = left.deep_equal(right);
            Ok(FieldValue::Boolean(if op == BinaryOperator::Equal {
                equal
            } else {
                !equal
            }))
        }

        BinaryOperator::LessThan => ordering_result(left, right, |ord| ord == Ordering::Less),
        BinaryOperator::LessThanOrEqual => {
            ordering_result(left, right, |ord| ord != Ordering::Greater)
        }
        BinaryOperator::GreaterThan => {
            ordering_result(left, right, |ord| ord == Ordering::Greater)
        }
        BinaryOperator::GreaterThanOrEqual => {
            ordering_result(left, right, |ord| ord != Ordering::Less)
        }

        BinaryOperator::And => {
            let l = bool3(left)?;
            let r = bool3(right)?;
            Ok(match (l, r) {
                (Some(false), _) | (_, Some(false)) => FieldValue::Boolean(false),
                (Some(true), Some(true)) => FieldValue::Boolean(true),
                _ => FieldValue::Null,
            })
        }
        BinaryOperator::Or => {
            let l = bool3(left)?;
            let r = bool3(right)?;
            Ok(match (l, r) {
                (Some(true), _) | (_, Some(true)) => FieldValue::Boolean(true),
                (Some(false), Some(false)) => FieldValue::Boolean(false),
                _ => FieldValue::Null,
            })
        }
    }
}

fn ordering_result<F>(
    left: &FieldValue,
    right: &FieldValue,
    matches_ordering: F,
) -> Result<FieldValue, SqlError>
where
    F: Fn(Ordering) -> bool,
{
    if matches!(left, FieldValue::Null) || matches!(right, FieldValue::Null) {
        return Ok(FieldValue::Null);
    }
    compare_values(left, right).map(|ord| FieldValue::Boolean(matches_ordering(ord)))
}

/// Ordering of two non-NULL values.
///
/// Defined within numerics (Integer/Float mixed), strings, blobs,
/// booleans and timestamps; any other pairing is a type mismatch.
fn compare_values(left: &FieldValue, right: &FieldValue) -> Result<Ordering, SqlError> {
    let incompatible = || {
        SqlError::type_mismatch(
            format!("comparable operands, got {}", left.type_name()),
            right.type_name(),
        )
    };
    match (left, right) {
        (FieldValue::Integer(a), FieldValue::Integer(b)) => Ok(a.cmp(b)),
        (FieldValue::Integer(_), FieldValue::Float(_))
        | (FieldValue::Float(_), FieldValue::Integer(_))
        | (FieldValue::Float(_), FieldValue::Float(_)) => {
            let a = numeric_as_f64(left);
            let b = numeric_as_f64(right);
            a.partial_cmp(&b).ok_or_else(incompatible)
        }
        (FieldValue::String(a), FieldValue::String(b)) => Ok(a.cmp(b)),
        (FieldValue::Blob(a), FieldValue::Blob(b)) => Ok(a.cmp(b)),
        (FieldValue::Boolean(a), FieldValue::Boolean(b)) => Ok(a.cmp(b)),
        (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => Ok(a.cmp(b)),
        _ => Err(incompatible()),
    }
}

fn numeric_as_f64(value: &FieldValue) -> f64 {
    match value {
        FieldValue::Integer(i) => *i as f64,
        FieldValue::Float(f) => *f,
        _ => f64::NAN,
    }
}

/// Three-valued boolean view: Some(bool) for booleans, None for NULL
fn bool3(value: &FieldValue) -> Result<Option<bool>, SqlError> {
    match value {
        FieldValue::Boolean(b) => Ok(Some(*b)),
        FieldValue::Null => Ok(None),
        other => Err(SqlError::type_mismatch("BOOLEAN operand", other.type_name())),
    }
}
