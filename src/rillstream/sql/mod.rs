//! The query side of the engine: analyzed-plan types, the error taxonomy
//! and the streaming execution layer.
//!
//! The query-language surface itself (lexer, parser, logical-plan
//! analyzer) lives outside this crate; execution starts from an
//! [`ast::LogicalPlan`].

pub mod ast;
pub mod error;
pub mod execution;

pub use error::{SqlError, SqlResult};
