//! Expression evaluation: the evaluator itself and the function registry
//! it resolves calls against.

pub mod evaluator;
pub mod functions;

pub use evaluator::ExpressionEvaluator;
pub use functions::{Function, FunctionRegistry};
