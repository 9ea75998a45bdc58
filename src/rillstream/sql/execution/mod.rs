//! Streaming execution.
//!
//! This module implements the streaming execution plan that sits between
//! an analyzed query and the downstream sink:
//!
//! - [`types`] - the value model, records and tuples
//! - [`expression`] - the expression evaluator and function registry
//! - [`window`] - the windowed input buffer with eviction
//! - [`emission`] - the RSTREAM/ISTREAM/DSTREAM change differ
//! - [`plan`] - the non-grouping execution plan and its factory check
//!
//! ## Usage
//!
//! ```rust,no_run
//! # use rillstream::rillstream::core::Context;
//! # use rillstream::rillstream::sql::ast::{Emitter, Expr, LogicalPlan, Projection, WindowSpec};
//! # use rillstream::rillstream::sql::execution::expression::FunctionRegistry;
//! # use rillstream::rillstream::sql::execution::plan::{can_build_select_plan, PhysicalPlan, SelectPlan};
//! # use rillstream::rillstream::sql::execution::types::{FieldMap, Tuple};
//! # use std::sync::Arc;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let analyzed = LogicalPlan {
//! #     emitter: Emitter::Istream,
//! #     window: WindowSpec::Tuples(2),
//! #     projections: vec![Projection::anonymous(Expr::column("value"))],
//! #     filter: None,
//! #     grouping: false,
//! #     input_name: "sensor".to_string(),
//! # };
//! let ctx = Context::default();
//! assert!(can_build_select_plan(&analyzed));
//! let mut plan = SelectPlan::new(&analyzed, Arc::new(FunctionRegistry::default()))?;
//!
//! let tuple = Arc::new(Tuple::new("sensor", FieldMap::new(), chrono::Utc::now()));
//! for record in plan.process(&ctx, tuple)? {
//!     println!("{:?}", record);
//! }
//! # Ok(())
//! # }
//! ```

pub mod emission;
pub mod expression;
pub mod plan;
pub mod types;
pub mod window;

// Re-export public API
pub use plan::{can_build_select_plan, PhysicalPlan, SelectPlan};
pub use types::{FieldMap, FieldValue, RowBinding, Tuple};
