//! The non-grouping execution plan.
//!
//! After each tuple arrives, the plan
//! - computes the contents of the current window using the specified
//!   window size/type,
//! - filters and projects that data,
//! - computes the records to emit by comparison with the previous run's
//!   results.
//!
//! Because this plan has no grouping, the projected record for a buffered
//! row is a pure function of its tuple and the projection list; results
//! are cached on the row and reused for as long as the row stays in the
//! window.

use super::emission::{self, ResultRow};
use super::expression::{ExpressionEvaluator, FunctionRegistry};
use super::types::{map_content_hash, FieldMap, FieldValue, RowBinding, Tuple};
use super::window::WindowBuffer;
use crate::rillstream::core::context::Context;
use crate::rillstream::sql::ast::{Emitter, Expr, LogicalPlan, PathStep, Projection};
use crate::rillstream::sql::error::SqlError;
use std::sync::Arc;

/// A standing query bound to one input stream.
///
/// `process` is called serially by the owning topology; a plan is not
/// safe for concurrent calls.
pub trait PhysicalPlan: Send {
    /// Run one evaluation cycle for one input tuple.
    ///
    /// The returned records transfer to the caller; their order is
    /// undefined and cannot be relied on. An error aborts the cycle and
    /// leaves the plan as if the cycle had never run.
    fn process(&mut self, ctx: &Context, tuple: Arc<Tuple>) -> Result<Vec<FieldMap>, SqlError>;
}

/// Whether the analyzed plan can run on the non-grouping executor
pub fn can_build_select_plan(plan: &LogicalPlan) -> bool {
    !plan.grouping
}

/// Where one projection's value lands in the output record
enum OutputTarget {
    /// Wildcard without an alias: every row field merges into the output
    Merge,
    /// A named slot, possibly nested below the alias
    Named { alias: String, path: Vec<PathStep> },
}

struct ResolvedProjection {
    expr: Expr,
    target: OutputTarget,
}

/// The non-grouping execution plan: window buffer, optional filter,
/// projections with per-row caching, and the change-emission differ over
/// the previous and current result sets
pub struct SelectPlan {
    input_name: String,
    emitter: Emitter,
    buffer: WindowBuffer,
    filter: Option<Expr>,
    projections: Vec<ResolvedProjection>,
    evaluator: ExpressionEvaluator,
    prev: Vec<ResultRow>,
    cur: Vec<ResultRow>,
}

impl SelectPlan {
    /// Build the plan for an analyzed query without grouping.
    ///
    /// Output names are resolved here: anonymous non-wildcard projections
    /// are numbered `col_1`, `col_2`, … by a counter that advances only
    /// for such projections.
    pub fn new(plan: &LogicalPlan, registry: Arc<FunctionRegistry>) -> Result<Self, SqlError> {
        if plan.grouping {
            return Err(SqlError::internal(
                "grouping queries need a different executor",
            ));
        }
        if let Some(filter) = &plan.filter {
            if filter.contains_wildcard() {
                return Err(SqlError::internal(
                    "wildcard is only valid in projection position",
                ));
            }
        }

        let mut projections = Vec::with_capacity(plan.projections.len());
        let mut anonymous = 0usize;
        for projection in &plan.projections {
            projections.push(resolve_projection(projection, &mut anonymous));
        }

        Ok(Self {
            input_name: plan.input_name.clone(),
            emitter: plan.emitter,
            buffer: WindowBuffer::new(plan.window),
            filter: plan.filter.clone(),
            projections,
            evaluator: ExpressionEvaluator::new(registry),
            prev: Vec::new(),
            cur: Vec::new(),
        })
    }
}

fn resolve_projection(projection: &Projection, anonymous: &mut usize) -> ResolvedProjection {
    let target = match (&projection.alias, &projection.expr) {
        (None, Expr::Wildcard) => OutputTarget::Merge,
        (Some(alias), _) => OutputTarget::Named {
            alias: alias.clone(),
            path: projection.alias_path.clone(),
        },
        (None, _) => {
            *anonymous += 1;
            OutputTarget::Named {
                alias: format!("col_{}", anonymous),
                path: projection.alias_path.clone(),
            }
        }
    };
    ResolvedProjection {
        expr: projection.expr.clone(),
        target,
    }
}

impl PhysicalPlan for SelectPlan {
    fn process(&mut self, ctx: &Context, tuple: Arc<Tuple>) -> Result<Vec<FieldMap>, SqlError> {
        ctx.trace_tuple("ingest", &tuple);

        let SelectPlan {
            input_name,
            emitter,
            buffer,
            filter,
            projections,
            evaluator,
            prev,
            cur,
        } = self;

        buffer.append(tuple);

        // Project the surviving window into fresh storage. Nothing below
        // touches prev/cur until every row has succeeded, so an error
        // leaves the plan as if this cycle never ran.
        let mut output = Vec::with_capacity(buffer.len());
        for row in buffer.iter_mut() {
            let binding = RowBinding::from_tuple(&row.tuple);
            if let Some(filter) = filter {
                if !evaluator.eval_filter(ctx, filter, &binding)? {
                    continue;
                }
            }
            let result = match row.cached() {
                Some((cached, hash)) => ResultRow { row: cached, hash },
                None => {
                    let record = project_row(ctx, evaluator, projections, &binding)?;
                    let hash = map_content_hash(&record);
                    let shared = Arc::new(record);
                    row.fill_cache(shared.clone(), hash);
                    ResultRow { row: shared, hash }
                }
            };
            output.push(result);
        }

        // Swap: the current results become the previous ones. The two
        // lists never share storage.
        *prev = std::mem::replace(cur, output);

        let emitted = emission::emit(*emitter, prev, cur);
        if ctx.is_tuple_trace_enabled() {
            log::trace!(
                target: "rillstream::tuple_trace",
                "emit stream={} rows={} window={}",
                input_name,
                emitted.len(),
                buffer.len()
            );
        }
        Ok(emitted)
    }
}

/// Evaluate every projection for one row and assemble the output record
fn project_row(
    ctx: &Context,
    evaluator: &ExpressionEvaluator,
    projections: &[ResolvedProjection],
    binding: &RowBinding,
) -> Result<FieldMap, SqlError> {
    let mut record = FieldMap::with_capacity(projections.len());
    for projection in projections {
        let value = evaluator.eval(ctx, &projection.expr, binding)?;
        match &projection.target {
            OutputTarget::Merge => match value {
                FieldValue::Map(fields) => {
                    for (key, field) in fields {
                        record.insert(key, field);
                    }
                }
                other => {
                    return Err(SqlError::internal(format!(
                        "wildcard projection produced {}",
                        other.type_name()
                    )));
                }
            },
            OutputTarget::Named { alias, path } => {
                assign_output_value(&mut record, alias, path, value)?;
            }
        }
    }
    Ok(record)
}

/// Write one projected value into the output record, creating intermediate
/// maps along the alias path as needed.
///
/// Writing through a non-Map intermediate fails with `BadAssignment`;
/// indexing steps assign into existing Array slots only.
fn assign_output_value(
    record: &mut FieldMap,
    alias: &str,
    path: &[PathStep],
    value: FieldValue,
) -> Result<(), SqlError> {
    let Some((last_step, init)) = path.split_last() else {
        record.insert(alias.to_string(), value);
        return Ok(());
    };

    let mut described = alias.to_string();
    let mut current = record
        .entry(alias.to_string())
        .or_insert_with(|| FieldValue::Map(FieldMap::new()));
    for step in init {
        match step {
            PathStep::Key(key) => {
                let FieldValue::Map(map) = current else {
                    return Err(SqlError::bad_assignment(described));
                };
                described = format!("{}.{}", described, key);
                current = map
                    .entry(key.clone())
                    .or_insert_with(|| FieldValue::Map(FieldMap::new()));
            }
            PathStep::Index(idx) => {
                let FieldValue::Array(arr) = current else {
                    return Err(SqlError::bad_assignment(described));
                };
                described = format!("{}[{}]", described, idx);
                current = match arr.get_mut(*idx) {
                    Some(slot) => slot,
                    None => return Err(SqlError::bad_assignment(described)),
                };
            }
        }
    }
    match last_step {
        PathStep::Key(key) => {
            let FieldValue::Map(map) = current else {
                return Err(SqlError::bad_assignment(described));
            };
            map.insert(key.clone(), value);
        }
        PathStep::Index(idx) => {
            let FieldValue::Array(arr) = current else {
                return Err(SqlError::bad_assignment(described));
            };
            match arr.get_mut(*idx) {
                Some(slot) => *slot = value,
                None => {
                    return Err(SqlError::bad_assignment(format!(
                        "{}[{}]",
                        described, idx
                    )));
                }
            }
        }
    }
    Ok(())
}
