//! Continuous-query engine core.
//!
//! This library evaluates standing SELECT queries over named tuple streams:
//! it maintains sliding windows (tuple-count or time based), computes
//! projections with per-row result caching, applies optional filters, and
//! derives RSTREAM/ISTREAM/DSTREAM outputs by diffing successive window
//! contents. A process-wide shared-state registry manages the lifecycle of
//! named mutable state referenced by user-defined functions.

pub mod rillstream;

// Re-export main API
pub use rillstream::core::{Configuration, Context, SharedState, SharedStateRegistry};
pub use rillstream::sql::execution::{FieldMap, FieldValue, PhysicalPlan, SelectPlan, Tuple};
pub use rillstream::sql::SqlError;
